use super::{AnalysisStyle, KnowledgeLevel, Language};
use crate::chapters::Chapter;
use crate::error::{InterpreterError, Result};
use crate::llm::{CompletionRequest, GroundingSource, LLM};
use crate::video::VideoInfo;
use std::sync::Arc;
use tracing::{debug, error, info};

/// Sampling temperature for interpretations
pub const ANALYSIS_TEMPERATURE: f32 = 0.4;

/// Body used when the model answers with no text
pub const EMPTY_ANALYSIS_TEXT: &str = "Failed to generate interpretation.";

/// Message shown to the user when the analysis request fails
pub const ANALYSIS_FAILED_MESSAGE: &str =
    "Analysis failed. The model API may be busy or the video content is restricted.";

/// Interpretation of one chapter plus the web sources it cites
#[derive(Debug, Clone, PartialEq)]
pub struct ChapterAnalysis {
    pub text: String,
    pub sources: Vec<GroundingSource>,
}

/// Generates per-chapter interpretations
#[derive(Clone)]
pub struct ChapterAnalyzer {
    llm: Arc<dyn LLM>,
}

impl ChapterAnalyzer {
    pub fn new(llm: Arc<dyn LLM>) -> Self {
        Self { llm }
    }

    /// Interpret one chapter. Request failures are returned, never retried.
    pub async fn analyze(
        &self,
        video: &VideoInfo,
        chapter: &Chapter,
        style: AnalysisStyle,
        level: KnowledgeLevel,
        lang: Language,
    ) -> Result<ChapterAnalysis> {
        info!("🧠 Interpreting chapter '{}' ({} / {})", chapter.title, style, level);

        let request = CompletionRequest::new(user_prompt(video, chapter, style, level))
            .with_system_instruction(system_prompt(video, chapter, style, level, lang))
            .with_grounding()
            .with_temperature(ANALYSIS_TEMPERATURE);

        let response = self.llm.generate(request).await.map_err(|e| {
            error!("❌ Chapter analysis failed for '{}': {}", chapter.title, e);
            InterpreterError::Analysis(ANALYSIS_FAILED_MESSAGE.to_string())
        })?;

        debug!(
            "Analysis completed with {} sources (tokens: {:?})",
            response.sources.len(),
            response.tokens_used
        );

        Ok(ChapterAnalysis {
            text: response.text.unwrap_or_else(|| EMPTY_ANALYSIS_TEXT.to_string()),
            sources: response.sources,
        })
    }
}

pub fn system_prompt(
    video: &VideoInfo,
    chapter: &Chapter,
    style: AnalysisStyle,
    level: KnowledgeLevel,
    lang: Language,
) -> String {
    format!(
        r#"ROLE: You are an Elite Video Content Analyst and Educator.
OBJECTIVE: specific, accurate, and high-value interpretation of a specific video chapter.

TARGET VIDEO:
- Title: "{video_title}"
- URL: {url}

CURRENT CHAPTER CONTEXT:
- Chapter Title: "{chapter_title}"
- Timeframe: {start}s to {end}s

{style_block}

{level_block}

CRITICAL INSTRUCTIONS:
1. **GROUNDING**: You MUST use the search tool to find the actual transcript, summary, or content discussion of THIS specific video. Do not guess.
2. **ACCURACY**: Base your interpretation strictly on the likely content of this video chapter.
3. **FORMAT**: Output strictly in Markdown. Use Bold for emphasis.
4. **LANGUAGE**: Output entirely in {language}."#,
        video_title = video.title,
        url = video.url,
        chapter_title = chapter.title,
        start = chapter.start_time,
        end = chapter.end_time,
        style_block = style.instruction(),
        level_block = level.instruction(),
        language = lang.prompt_name(),
    )
}

pub fn user_prompt(video: &VideoInfo, chapter: &Chapter, style: AnalysisStyle, level: KnowledgeLevel) -> String {
    format!(
        r#"Please interpret the chapter "{chapter_title}" of the video "{video_title}".

Using the search tool, verify what is actually discussed or shown during this segment.
Synthesize this information according to the requested "{style}" style and "{level}" level.

If the specific details of this chapter are hard to find, provide the best logical reconstruction based on the video's general topic and this chapter's title, but explicitly state you are inferring based on context."#,
        chapter_title = chapter.title,
        video_title = video.title,
    )
}
