//! Video Interpreter
//!
//! Detects the chapters of an online video with an LLM, interprets each
//! chapter on demand in a chosen teaching style and knowledge level, and
//! keeps a local history of interpretation sessions.

pub mod analysis;
pub mod chapters;
pub mod config;
pub mod error;
pub mod export;
pub mod llm;
pub mod session;
pub mod storage;
pub mod video;

// Re-export main types for easy access
pub use crate::analysis::{AnalysisResults, AnalysisStyle, ChapterAnalysis, ChapterAnalyzer, KnowledgeLevel, Language};
pub use crate::chapters::{Chapter, ChapterExtractor};
pub use crate::config::{Config, ConfigBuilder};
pub use crate::error::{InterpreterError, Result};
pub use crate::llm::{create_llm, LLMConfig, LLMProvider, LLM};
pub use crate::session::{AnalysisStep, AnalysisTicket, ChapterStatus, Session};
pub use crate::storage::{HistoryStore, InterpretationHistoryEntry, JsonStore, Preferences, PreferencesStore};
pub use crate::video::{MetadataClient, VideoInfo};
