use crate::analysis::{AnalysisResults, AnalysisStyle, ChapterAnalysis, ChapterAnalyzer, KnowledgeLevel, Language};
use crate::chapters::{Chapter, ChapterExtractor};
use crate::config::Config;
use crate::error::{InterpreterError, Result};
use crate::export;
use crate::llm::{create_llm, GroundingSource, LLM};
use crate::storage::{HistoryStore, InterpretationHistoryEntry, JsonStore, Preferences, PreferencesStore};
use crate::video::{self, MetadataClient, VideoInfo};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Client-visible state of one chapter's interpretation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChapterStatus {
    NotStarted,
    Analyzing,
    Complete,
}

/// Mutable application state owned by a [`Session`]
#[derive(Debug, Clone, Default)]
pub struct AppState {
    pub current_video: Option<VideoInfo>,
    pub active_chapter: usize,
    pub results: AnalysisResults,
    /// Citations per chapter id; session-only, never persisted
    pub sources: HashMap<String, Vec<GroundingSource>>,
    pub preferences: Preferences,
    /// Chapter id of the request the loading indicator belongs to
    pub analyzing: Option<String>,
    /// Last user-visible error message
    pub last_error: Option<String>,
}

/// An analysis request that has been started but not committed
#[derive(Debug, Clone)]
pub struct AnalysisTicket {
    pub video: VideoInfo,
    pub chapter: Chapter,
    pub style: AnalysisStyle,
    pub level: KnowledgeLevel,
    pub lang: Language,
}

/// Outcome of asking for a chapter's interpretation
#[derive(Debug, Clone)]
pub enum AnalysisStep {
    /// Result was already in the map; no request needed
    Cached(String),
    /// A request must be issued for this ticket
    Pending(AnalysisTicket),
}

/// Drives metadata lookup, chapter extraction, lazy per-chapter analysis
/// and persistence for one user
pub struct Session {
    extractor: ChapterExtractor,
    analyzer: ChapterAnalyzer,
    metadata: MetadataClient,
    history: HistoryStore,
    preferences_store: PreferencesStore,
    state: AppState,
}

impl Session {
    /// Build a session; saved preferences are loaded once here
    pub fn new(llm: Arc<dyn LLM>, metadata: MetadataClient, store: JsonStore, history_limit: usize) -> Self {
        let preferences_store = PreferencesStore::new(store.clone());
        let preferences = preferences_store.load().unwrap_or_default();

        Self {
            extractor: ChapterExtractor::new(llm.clone()),
            analyzer: ChapterAnalyzer::new(llm),
            metadata,
            history: HistoryStore::with_limit(store, history_limit),
            preferences_store,
            state: AppState {
                preferences,
                ..AppState::default()
            },
        }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let llm: Arc<dyn LLM> = Arc::from(create_llm(&config.llm)?);
        let metadata = MetadataClient::new(&config.metadata)?;
        let store = JsonStore::open(config.storage.resolve_data_dir())?;
        Ok(Self::new(llm, metadata, store, config.storage.history_limit))
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    pub fn preferences(&self) -> Preferences {
        self.state.preferences
    }

    pub fn current_video(&self) -> Option<&VideoInfo> {
        self.state.current_video.as_ref()
    }

    /// Load a new video: validate, fetch metadata, extract chapters.
    ///
    /// Unsupported URLs are rejected before any network request.
    pub async fn start(&mut self, url: &str) -> Result<&VideoInfo> {
        self.state.last_error = None;

        if let Err(e) = video::validate_url(url) {
            self.state.last_error = Some(e.to_string());
            return Err(e);
        }
        let url = &video::normalize_url(url);

        let metadata = match self.metadata.fetch(url).await {
            Ok(metadata) => metadata,
            Err(e) => {
                self.state.last_error = Some(e.to_string());
                return Err(e);
            }
        };
        let chapters = self.extractor.extract(url, &metadata.title).await;

        let video = metadata.into_video_info(chapters);
        info!("🎬 Loaded '{}' with {} chapters", video.title, video.chapters.len());

        self.state.results.clear();
        self.state.sources.clear();
        self.state.active_chapter = 0;
        self.state.analyzing = None;
        Ok(self.state.current_video.insert(video))
    }

    /// Load a video, continuing its saved session when history has one.
    ///
    /// A resumed video keeps its chapters and earlier interpretations, so
    /// neither metadata nor chapter extraction is requested again.
    pub async fn open(&mut self, url: &str) -> Result<&VideoInfo> {
        let video_id = match video::validate_url(url) {
            Ok(id) => id,
            Err(e) => {
                self.state.last_error = Some(e.to_string());
                return Err(e);
            }
        };

        if self.resume(&video_id) {
            return self.state.current_video.as_ref().ok_or(InterpreterError::NoActiveVideo);
        }
        self.start(url).await
    }

    /// Restore a saved session, including its style and level
    pub fn load_from_history(&mut self, entry: InterpretationHistoryEntry) {
        info!("📚 Restoring '{}' from history ({} results)", entry.video_info.title, entry.results.len());

        self.state.current_video = Some(entry.video_info);
        self.state.results = entry.results;
        self.state.sources.clear();
        self.state.active_chapter = 0;
        self.state.analyzing = None;
        self.state.last_error = None;

        self.state.preferences.style = entry.style;
        self.state.preferences.level = entry.level;
        self.persist_preferences();
    }

    /// Restore a saved session by video id, returning whether it existed
    pub fn resume(&mut self, video_id: &str) -> bool {
        match self.history.get(video_id) {
            Some(entry) => {
                self.load_from_history(entry);
                true
            }
            None => false,
        }
    }

    pub fn select_chapter(&mut self, index: usize) -> Result<&Chapter> {
        let video = self.state.current_video.as_ref().ok_or(InterpreterError::NoActiveVideo)?;
        let chapter = video
            .chapters
            .get(index)
            .ok_or(InterpreterError::ChapterOutOfRange(index))?;
        self.state.active_chapter = index;
        Ok(chapter)
    }

    pub fn next_chapter(&mut self) -> Result<&Chapter> {
        self.select_chapter(self.state.active_chapter + 1)
    }

    pub fn previous_chapter(&mut self) -> Result<&Chapter> {
        let index = self
            .state
            .active_chapter
            .checked_sub(1)
            .ok_or(InterpreterError::ChapterOutOfRange(0))?;
        self.select_chapter(index)
    }

    pub fn chapter_status(&self, index: usize) -> ChapterStatus {
        let Some(chapter) = self.state.current_video.as_ref().and_then(|v| v.chapters.get(index)) else {
            return ChapterStatus::NotStarted;
        };

        if self.state.results.contains_key(&chapter.id) {
            ChapterStatus::Complete
        } else if self.state.analyzing.as_deref() == Some(chapter.id.as_str()) {
            ChapterStatus::Analyzing
        } else {
            ChapterStatus::NotStarted
        }
    }

    /// Start analysis of a chapter, or return its cached result
    pub fn begin_analysis(&mut self, index: usize) -> Result<AnalysisStep> {
        let video = self.state.current_video.as_ref().ok_or(InterpreterError::NoActiveVideo)?;
        let chapter = video
            .chapters
            .get(index)
            .ok_or(InterpreterError::ChapterOutOfRange(index))?;

        if let Some(cached) = self.state.results.get(&chapter.id) {
            debug!("Using cached interpretation for chapter {}", chapter.id);
            return Ok(AnalysisStep::Cached(cached.clone()));
        }

        let ticket = AnalysisTicket {
            video: video.clone(),
            chapter: chapter.clone(),
            style: self.state.preferences.style,
            level: self.state.preferences.level,
            lang: self.state.preferences.lang,
        };

        self.state.analyzing = Some(ticket.chapter.id.clone());
        self.state.last_error = None;
        Ok(AnalysisStep::Pending(ticket))
    }

    /// Issue the request for a ticket. Does not touch session state.
    pub async fn run_analysis(&self, ticket: &AnalysisTicket) -> Result<ChapterAnalysis> {
        self.analyzer
            .analyze(&ticket.video, &ticket.chapter, ticket.style, ticket.level, ticket.lang)
            .await
    }

    /// Commit the outcome of a ticket.
    ///
    /// Results are keyed by chapter id, so they are stored even when the
    /// user has moved to another chapter; only the loading indicator is
    /// checked for staleness. Results for a video that is no longer loaded
    /// are dropped. Failures are recorded as the user-visible error and
    /// nothing is cached.
    pub fn complete_analysis(&mut self, ticket: AnalysisTicket, outcome: Result<ChapterAnalysis>) -> Result<String> {
        if self.state.analyzing.as_deref() == Some(ticket.chapter.id.as_str()) {
            self.state.analyzing = None;
        }

        let analysis = match outcome {
            Ok(analysis) => analysis,
            Err(e) => {
                self.state.last_error = Some(e.to_string());
                return Err(e);
            }
        };

        let still_current = self
            .state
            .current_video
            .as_ref()
            .is_some_and(|v| v.id == ticket.video.id);
        if !still_current {
            warn!("Dropping interpretation for '{}': video no longer loaded", ticket.video.title);
            return Ok(analysis.text);
        }

        self.state.results.insert(ticket.chapter.id.clone(), analysis.text.clone());
        self.state.sources.insert(ticket.chapter.id.clone(), analysis.sources);

        let entry = InterpretationHistoryEntry::new(
            ticket.video,
            ticket.style,
            ticket.level,
            self.state.results.clone(),
        );
        if let Err(e) = self.history.save(entry) {
            warn!("Failed to save history: {}", e);
        }

        Ok(analysis.text)
    }

    /// Interpret the active chapter, using the cache when possible
    pub async fn analyze_active(&mut self) -> Result<String> {
        match self.begin_analysis(self.state.active_chapter)? {
            AnalysisStep::Cached(text) => Ok(text),
            AnalysisStep::Pending(ticket) => {
                let outcome = self.run_analysis(&ticket).await;
                self.complete_analysis(ticket, outcome)
            }
        }
    }

    /// Interpret every chapter in order, stopping at the first failure
    pub async fn analyze_all(&mut self) -> Result<usize> {
        let count = self
            .state
            .current_video
            .as_ref()
            .ok_or(InterpreterError::NoActiveVideo)?
            .chapters
            .len();

        for index in 0..count {
            self.select_chapter(index)?;
            self.analyze_active().await?;
        }
        Ok(count)
    }

    pub fn sources_for_active(&self) -> &[GroundingSource] {
        self.state
            .current_video
            .as_ref()
            .and_then(|v| v.chapters.get(self.state.active_chapter))
            .and_then(|c| self.state.sources.get(&c.id))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn set_style(&mut self, style: AnalysisStyle) {
        self.state.preferences.style = style;
        self.persist_preferences();
    }

    pub fn set_level(&mut self, level: KnowledgeLevel) {
        self.state.preferences.level = level;
        self.persist_preferences();
    }

    pub fn set_language(&mut self, lang: Language) {
        self.state.preferences.lang = lang;
        self.persist_preferences();
    }

    fn persist_preferences(&self) {
        if let Err(e) = self.preferences_store.save(&self.state.preferences) {
            warn!("Failed to save preferences: {}", e);
        }
    }

    /// Write the current session as markdown into `output_dir`
    pub async fn export_markdown(&self, output_dir: &Path) -> Result<PathBuf> {
        let video = self.state.current_video.as_ref().ok_or(InterpreterError::NoActiveVideo)?;
        let prefs = self.state.preferences;
        export::write_markdown(output_dir, video, &self.state.results, prefs.style, prefs.level, prefs.lang).await
    }
}
