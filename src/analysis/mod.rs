//! Chapter interpretation: prompt templates and the analyzer that drives them

pub mod analyzer;
pub mod style;

pub use analyzer::{ChapterAnalysis, ChapterAnalyzer, ANALYSIS_FAILED_MESSAGE};
pub use style::{AnalysisStyle, KnowledgeLevel, Language};

use std::collections::BTreeMap;

/// Chapter id -> markdown interpretation
pub type AnalysisResults = BTreeMap<String, String>;
