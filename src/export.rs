/// Markdown export of an interpretation session
use crate::analysis::{AnalysisResults, AnalysisStyle, KnowledgeLevel, Language};
use crate::chapters::format_time;
use crate::error::Result;
use crate::storage::InterpretationHistoryEntry;
use crate::video::VideoInfo;
use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};
use tracing::info;

/// Render the session as a markdown document.
///
/// One `##` section per chapter that has a result, in chapter order;
/// chapters without a result are left out.
pub fn render_markdown(
    video: &VideoInfo,
    results: &AnalysisResults,
    style: AnalysisStyle,
    level: KnowledgeLevel,
    lang: Language,
    exported_at: DateTime<Local>,
) -> String {
    let mut markdown = String::new();

    markdown.push_str(&format!("# {}\n\n", video.title));
    markdown.push_str(&format!("**Source URL:** {}\n", video.url));
    markdown.push_str(&format!("**Style:** {}\n", style.label(lang)));
    markdown.push_str(&format!("**Level:** {}\n", level.label(lang)));
    markdown.push_str(&format!("**Export Date:** {}\n\n", exported_at.format("%Y-%m-%d %H:%M:%S")));
    markdown.push_str("---\n\n");

    for (idx, chapter) in video.chapters.iter().enumerate() {
        let Some(content) = results.get(&chapter.id) else {
            continue;
        };

        markdown.push_str(&format!(
            "## Phase {}: {} ({})\n\n",
            idx + 1,
            chapter.title,
            format_time(chapter.start_time)
        ));
        markdown.push_str(&format!("[Watch on YouTube]({})\n\n", video.timestamp_url(chapter.start_time)));
        markdown.push_str(content);
        markdown.push_str("\n\n---\n\n");
    }

    markdown
}

/// File name for an export: the title without path-hostile characters
pub fn export_filename(title: &str, extension: &str) -> String {
    let clean: String = title
        .chars()
        .filter(|c| !matches!(c, '\\' | '/' | ':' | '*' | '?' | '"' | '<' | '>' | '|'))
        .collect();
    format!("{}_Interpretation.{}", clean, extension)
}

/// Write the markdown export into `output_dir`, returning the file path
pub async fn write_markdown(
    output_dir: &Path,
    video: &VideoInfo,
    results: &AnalysisResults,
    style: AnalysisStyle,
    level: KnowledgeLevel,
    lang: Language,
) -> Result<PathBuf> {
    tokio::fs::create_dir_all(output_dir).await?;

    let content = render_markdown(video, results, style, level, lang, Local::now());
    let file_path = output_dir.join(export_filename(&video.title, "md"));
    tokio::fs::write(&file_path, content).await?;

    info!("📝 Exported {} chapters to: {}", results.len(), file_path.display());
    Ok(file_path)
}

/// Export a saved session with the style and level it was interpreted in
pub async fn write_history_entry(
    output_dir: &Path,
    entry: &InterpretationHistoryEntry,
    lang: Language,
) -> Result<PathBuf> {
    write_markdown(output_dir, &entry.video_info, &entry.results, entry.style, entry.level, lang).await
}
