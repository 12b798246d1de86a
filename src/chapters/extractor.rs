/// LLM-backed chapter extraction with fixed fallbacks
use super::{parse_timestamp_line, Chapter, LAST_CHAPTER_SECONDS};
use crate::llm::{CompletionRequest, LLM};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Sampling temperature for extraction; kept low so the list is stable
pub const EXTRACTION_TEMPERATURE: f32 = 0.1;

/// Extracts an ordered chapter list for a video from a grounded LLM
#[derive(Clone)]
pub struct ChapterExtractor {
    llm: Arc<dyn LLM>,
}

impl ChapterExtractor {
    pub fn new(llm: Arc<dyn LLM>) -> Self {
        Self { llm }
    }

    /// Detect chapters for a video.
    ///
    /// Never fails: a response without parseable timestamps yields
    /// [`placeholder_chapters`], a failed request yields
    /// [`whole_video_chapter`].
    pub async fn extract(&self, url: &str, title: &str) -> Vec<Chapter> {
        info!("🔍 Detecting chapters for: {}", title);

        let request = CompletionRequest::new(extraction_prompt(url, title))
            .with_grounding()
            .with_temperature(EXTRACTION_TEMPERATURE);

        match self.llm.generate(request).await {
            Ok(response) => {
                let text = response.text.unwrap_or_default();
                debug!("Chapter extraction response: {}", text);

                let chapters = parse_chapter_lines(&text);
                if chapters.is_empty() {
                    warn!("⚠️ No chapters parsed from model output, using placeholder segments");
                    placeholder_chapters()
                } else {
                    info!("✅ Found {} chapters", chapters.len());
                    chapters
                }
            }
            Err(e) => {
                error!("❌ Chapter extraction request failed: {}", e);
                whole_video_chapter()
            }
        }
    }
}

fn extraction_prompt(url: &str, title: &str) -> String {
    format!(
        r#"You are a YouTube Metadata Expert.
Task: Identify the chapters/segments for this video: "{title}" ({url}).

Steps:
1. Use Google Search to find the official chapters, timestamps, or a content breakdown for this specific video.
2. If official chapters exist, extract them exactly.
3. If NO official chapters exist, logically divide the video content into 4-6 distinct, meaningful segments based on typical structure for this type of content.

Output Format (strictly adhere to this list format):
0:00 - Introduction
5:30 - Topic Name
...

Do not add any conversational text. Only the list."#
    )
}

/// Parse model output into chapters, one per line that carries a timestamp.
///
/// Ids are derived from the source line index. End times are chained to
/// the next chapter's start; the last chapter runs for
/// [`LAST_CHAPTER_SECONDS`].
pub fn parse_chapter_lines(text: &str) -> Vec<Chapter> {
    let mut chapters: Vec<Chapter> = text
        .lines()
        .enumerate()
        .filter_map(|(index, line)| {
            parse_timestamp_line(line)
                .map(|(start, title)| Chapter::new(format!("ch_{}", index), title, start, start))
        })
        .collect();

    let starts: Vec<u32> = chapters.iter().map(|c| c.start_time).collect();
    for (i, chapter) in chapters.iter_mut().enumerate() {
        chapter.end_time = match starts.get(i + 1) {
            // Out-of-order model output must not produce end < start
            Some(&next) => next.max(chapter.start_time),
            None => chapter.start_time + LAST_CHAPTER_SECONDS,
        };
    }

    chapters
}

/// Fixed segments used when the model answered without any timestamps
pub fn placeholder_chapters() -> Vec<Chapter> {
    vec![
        Chapter::new("p1", "Beginning & Context", 0, 300),
        Chapter::new("p2", "Core Content", 300, 600),
        Chapter::new("p3", "Key Details", 600, 900),
        Chapter::new("p4", "Conclusion", 900, 1200),
    ]
}

/// Single segment used when the extraction request failed outright
pub fn whole_video_chapter() -> Vec<Chapter> {
    vec![Chapter::new("full", "Complete Analysis", 0, 3600)]
}
