/// Chapter detection and management module
///
/// Chapters are detected by asking a grounded LLM for a video's published
/// chapter markers and parsing the `<timestamp> - <title>` lines it returns.

pub mod timestamp;
pub mod extractor;

// Re-export main types
pub use extractor::ChapterExtractor;
pub use timestamp::{format_time, parse_timestamp_line};

use serde::{Deserialize, Serialize};

/// Default length assigned to the last chapter when nothing follows it
pub const LAST_CHAPTER_SECONDS: u32 = 900;

/// Represents a single chapter in a video
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Chapter {
    /// Identifier, unique within one video
    pub id: String,
    /// Chapter title/name
    pub title: String,
    /// Start offset in seconds
    pub start_time: u32,
    /// End offset in seconds, never before `start_time`
    pub end_time: u32,
}

impl Chapter {
    pub fn new(id: impl Into<String>, title: impl Into<String>, start_time: u32, end_time: u32) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            start_time,
            end_time,
        }
    }
}
