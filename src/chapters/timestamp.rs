/// Timestamp detection for free-text chapter lines
use regex::Regex;
use std::sync::OnceLock;

fn timestamp_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"([0-9]{1,2}:)?[0-9]{1,2}:[0-9]{2}").expect("timestamp pattern is valid"))
}

/// Convert a matched `[H:]M:SS` token to seconds
fn timestamp_to_seconds(token: &str) -> Option<u32> {
    token
        .split(':')
        .rev()
        .zip([1u32, 60, 3600])
        .try_fold(0u32, |total, (part, multiplier)| {
            part.parse::<u32>().ok().map(|value| total + value * multiplier)
        })
}

/// Parse a line such as `"[05:30] - Topic Name"` into `(330, "Topic Name")`.
///
/// Returns `None` when the line has no time-like token or nothing is left
/// for a title once the token and its separators are removed.
pub fn parse_timestamp_line(line: &str) -> Option<(u32, String)> {
    let found = timestamp_regex().find(line)?;
    let seconds = timestamp_to_seconds(found.as_str())?;

    let mut remainder = String::with_capacity(line.len());
    remainder.push_str(&line[..found.start()]);
    remainder.push_str(&line[found.end()..]);

    let title = remainder
        .trim()
        .trim_start_matches(|c: char| c.is_whitespace() || matches!(c, '-' | '[' | ']' | '(' | ')' | '.'))
        .trim();

    if title.is_empty() {
        return None;
    }

    Some((seconds, title.to_string()))
}

/// Render seconds as `H:MM:SS`, or `M:SS` under an hour
pub fn format_time(seconds: u32) -> String {
    let h = seconds / 3600;
    let m = (seconds % 3600) / 60;
    let s = seconds % 60;
    if h > 0 {
        format!("{}:{:02}:{:02}", h, m, s)
    } else {
        format!("{}:{:02}", m, s)
    }
}
