use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use video_interpreter::analysis::ANALYSIS_FAILED_MESSAGE;
use video_interpreter::config::MetadataConfig;
use video_interpreter::export;
use video_interpreter::llm::{CompletionRequest, CompletionResponse, GroundingSource, LLMProvider, LLM};
use video_interpreter::{
    AnalysisStep, AnalysisStyle, ChapterStatus, InterpreterError, JsonStore, KnowledgeLevel, Language,
    MetadataClient, Preferences, PreferencesStore, Result, Session,
};

const VIDEO_URL: &str = "https://www.youtube.com/watch?v=dQw4w9WgXcQ";

/// Replays queued responses in order and records every request
#[derive(Default)]
struct ScriptedLLM {
    replies: Mutex<VecDeque<Result<CompletionResponse>>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedLLM {
    fn reply(&self, text: &str) -> &Self {
        self.replies.lock().unwrap().push_back(Ok(CompletionResponse {
            text: Some(text.to_string()),
            ..CompletionResponse::default()
        }));
        self
    }

    fn reply_with_sources(&self, text: &str, sources: Vec<GroundingSource>) -> &Self {
        self.replies.lock().unwrap().push_back(Ok(CompletionResponse {
            text: Some(text.to_string()),
            sources,
            tokens_used: None,
        }));
        self
    }

    fn fail(&self) -> &Self {
        self.replies
            .lock()
            .unwrap()
            .push_back(Err(InterpreterError::llm(LLMProvider::Gemini, "503 Service Unavailable")));
        self
    }

    fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl LLM for ScriptedLLM {
    async fn generate(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        self.requests.lock().unwrap().push(request);
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(InterpreterError::llm(LLMProvider::Gemini, "no scripted reply")))
    }

    fn provider_type(&self) -> LLMProvider {
        LLMProvider::Gemini
    }
}

/// Metadata lookups go to a closed port so the fallback title is used
fn offline_metadata() -> MetadataClient {
    let config = MetadataConfig {
        endpoint: "http://127.0.0.1:9/embed".to_string(),
        timeout_seconds: 2,
    };
    MetadataClient::new(&config).unwrap()
}

fn new_session(temp_dir: &TempDir, llm: &Arc<ScriptedLLM>) -> Session {
    let store = JsonStore::open(temp_dir.path()).unwrap();
    Session::new(llm.clone(), offline_metadata(), store, 50)
}

const CHAPTER_LISTING: &str = "0:00 - Introduction\n5:30 - Ownership\nSome chatter without a time\n[1:02:03] Wrap-up";

#[tokio::test]
async fn test_start_builds_chapters_from_model_listing() {
    let temp_dir = TempDir::new().unwrap();
    let llm = Arc::new(ScriptedLLM::default());
    llm.reply(CHAPTER_LISTING);
    let mut session = new_session(&temp_dir, &llm);

    let video = session.start(VIDEO_URL).await.unwrap();
    assert_eq!(video.id, "dQw4w9WgXcQ");
    assert_eq!(video.title, "YouTube Video (dQw4w9WgXcQ)");

    let spans: Vec<_> = video
        .chapters
        .iter()
        .map(|c| (c.id.as_str(), c.title.as_str(), c.start_time, c.end_time))
        .collect();
    assert_eq!(
        spans,
        vec![
            ("ch_0", "Introduction", 0, 330),
            ("ch_1", "Ownership", 330, 3723),
            ("ch_3", "Wrap-up", 3723, 4623),
        ]
    );

    let requests = llm.requests.lock().unwrap();
    assert!(requests[0].grounded);
    assert!(requests[0].prompt.contains(VIDEO_URL));
}

#[tokio::test]
async fn test_unparseable_listing_yields_placeholder_segments() {
    let temp_dir = TempDir::new().unwrap();
    let llm = Arc::new(ScriptedLLM::default());
    llm.reply("I could not find any chapters for this video.");
    let mut session = new_session(&temp_dir, &llm);

    let video = session.start(VIDEO_URL).await.unwrap();
    let ids: Vec<_> = video.chapters.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, vec!["p1", "p2", "p3", "p4"]);
    assert_eq!(video.chapters.last().unwrap().end_time, 1200);
}

#[tokio::test]
async fn test_failed_extraction_yields_whole_video_chapter() {
    let temp_dir = TempDir::new().unwrap();
    let llm = Arc::new(ScriptedLLM::default());
    llm.fail();
    let mut session = new_session(&temp_dir, &llm);

    let video = session.start(VIDEO_URL).await.unwrap();
    assert_eq!(video.chapters.len(), 1);
    assert_eq!(video.chapters[0].id, "full");
    assert_eq!(video.chapters[0].end_time, 3600);
}

#[tokio::test]
async fn test_invalid_url_makes_no_requests() {
    let temp_dir = TempDir::new().unwrap();
    let llm = Arc::new(ScriptedLLM::default());
    let mut session = new_session(&temp_dir, &llm);

    let err = session.start("https://vimeo.com/123456").await.unwrap_err();
    assert!(matches!(err, InterpreterError::InvalidUrl(_)));
    assert!(session.state().last_error.is_some());
    assert!(session.current_video().is_none());
    assert_eq!(llm.calls(), 0);
}

#[tokio::test]
async fn test_cached_chapter_is_not_requested_again() {
    let temp_dir = TempDir::new().unwrap();
    let llm = Arc::new(ScriptedLLM::default());
    llm.reply(CHAPTER_LISTING).reply_with_sources(
        "## Ownership\nEvery value has one owner.",
        vec![GroundingSource {
            title: "The Book".to_string(),
            uri: "https://doc.rust-lang.org/book/".to_string(),
        }],
    );
    let mut session = new_session(&temp_dir, &llm);
    session.start(VIDEO_URL).await.unwrap();

    session.select_chapter(1).unwrap();
    let first = session.analyze_active().await.unwrap();
    assert_eq!(session.sources_for_active().len(), 1);

    session.next_chapter().unwrap();
    session.previous_chapter().unwrap();
    let second = session.analyze_active().await.unwrap();

    assert_eq!(first, second);
    assert_eq!(llm.calls(), 2);
    assert_eq!(session.chapter_status(1), ChapterStatus::Complete);
    assert_eq!(session.chapter_status(0), ChapterStatus::NotStarted);
}

#[tokio::test]
async fn test_analysis_request_uses_preferences() {
    let temp_dir = TempDir::new().unwrap();
    let llm = Arc::new(ScriptedLLM::default());
    llm.reply(CHAPTER_LISTING).reply("notes");
    let mut session = new_session(&temp_dir, &llm);
    session.set_style(AnalysisStyle::Dialogue);
    session.set_level(KnowledgeLevel::Expert);
    session.set_language(Language::En);

    session.start(VIDEO_URL).await.unwrap();
    session.analyze_active().await.unwrap();

    let requests = llm.requests.lock().unwrap();
    let system = requests[1].system_instruction.as_deref().unwrap();
    assert!(system.contains("English"));
    assert!(system.contains(AnalysisStyle::Dialogue.instruction()));
    assert!(system.contains(KnowledgeLevel::Expert.instruction()));
    assert!(requests[1].prompt.contains("Introduction"));
}

#[tokio::test]
async fn test_failed_analysis_surfaces_and_can_be_retried() {
    let temp_dir = TempDir::new().unwrap();
    let llm = Arc::new(ScriptedLLM::default());
    llm.reply(CHAPTER_LISTING).fail().reply("second attempt");
    let mut session = new_session(&temp_dir, &llm);
    session.start(VIDEO_URL).await.unwrap();

    let err = session.analyze_active().await.unwrap_err();
    assert_eq!(err.to_string(), ANALYSIS_FAILED_MESSAGE);
    assert_eq!(session.state().last_error.as_deref(), Some(ANALYSIS_FAILED_MESSAGE));
    assert_eq!(session.chapter_status(0), ChapterStatus::NotStarted);
    assert!(session.history().load().is_empty());

    assert_eq!(session.analyze_active().await.unwrap(), "second attempt");
    assert!(session.state().last_error.is_none());
}

#[tokio::test]
async fn test_history_round_trip_restores_session() {
    let temp_dir = TempDir::new().unwrap();
    let llm = Arc::new(ScriptedLLM::default());
    llm.reply(CHAPTER_LISTING).reply("intro notes");
    let mut session = new_session(&temp_dir, &llm);
    session.set_style(AnalysisStyle::Intensive);
    session.start(VIDEO_URL).await.unwrap();
    session.analyze_active().await.unwrap();

    // Fresh session over the same storage, with different preferences
    let mut restored = new_session(&temp_dir, &llm);
    restored.set_style(AnalysisStyle::Storytelling);
    assert!(restored.resume("dQw4w9WgXcQ"));

    assert_eq!(restored.preferences().style, AnalysisStyle::Intensive);
    assert_eq!(restored.current_video().unwrap().chapters.len(), 3);
    assert_eq!(restored.chapter_status(0), ChapterStatus::Complete);
    assert_eq!(restored.analyze_active().await.unwrap(), "intro notes");
    assert_eq!(llm.calls(), 2);

    assert!(!restored.resume("missing"));
}

#[tokio::test]
async fn test_stale_response_is_kept_without_moving_the_user() {
    let temp_dir = TempDir::new().unwrap();
    let llm = Arc::new(ScriptedLLM::default());
    llm.reply(CHAPTER_LISTING).reply("intro notes");
    let mut session = new_session(&temp_dir, &llm);
    session.start(VIDEO_URL).await.unwrap();

    let AnalysisStep::Pending(ticket) = session.begin_analysis(0).unwrap() else {
        panic!("expected a pending request");
    };
    let outcome = session.run_analysis(&ticket).await;

    // User navigates away before the response is committed
    session.select_chapter(2).unwrap();
    session.complete_analysis(ticket, outcome).unwrap();

    assert_eq!(session.state().active_chapter, 2);
    assert_eq!(session.chapter_status(0), ChapterStatus::Complete);
    assert!(session.state().analyzing.is_none());
}

#[tokio::test]
async fn test_preferences_survive_restart() {
    let temp_dir = TempDir::new().unwrap();
    let llm = Arc::new(ScriptedLLM::default());

    {
        let mut session = new_session(&temp_dir, &llm);
        assert_eq!(session.preferences(), Preferences::default());
        session.set_language(Language::En);
        session.set_level(KnowledgeLevel::Intermediate);
    }

    let session = new_session(&temp_dir, &llm);
    assert_eq!(session.preferences().lang, Language::En);
    assert_eq!(session.preferences().level, KnowledgeLevel::Intermediate);

    let stored = PreferencesStore::new(JsonStore::open(temp_dir.path()).unwrap()).load().unwrap();
    assert_eq!(stored, session.preferences());
}

#[tokio::test]
async fn test_export_contains_only_interpreted_chapters() {
    let temp_dir = TempDir::new().unwrap();
    let llm = Arc::new(ScriptedLLM::default());
    llm.reply(CHAPTER_LISTING).reply("wrap-up notes");
    let mut session = new_session(&temp_dir, &llm);
    session.start(VIDEO_URL).await.unwrap();
    session.select_chapter(2).unwrap();
    session.analyze_active().await.unwrap();

    let export_dir = temp_dir.path().join("exports");
    let path = session.export_markdown(&export_dir).await.unwrap();
    let markdown = std::fs::read_to_string(path).unwrap();

    assert!(markdown.contains("## Phase 3: Wrap-up (1:02:03)"));
    assert!(markdown.contains("&t=3723s"));
    assert!(!markdown.contains("## Phase 1"));
}

#[tokio::test]
async fn test_reopening_a_video_keeps_earlier_interpretations() {
    let temp_dir = TempDir::new().unwrap();
    let llm = Arc::new(ScriptedLLM::default());
    llm.reply(CHAPTER_LISTING).reply("intro notes").reply("wrap-up notes");

    let mut first_run = new_session(&temp_dir, &llm);
    first_run.open(VIDEO_URL).await.unwrap();
    first_run.analyze_active().await.unwrap();

    let mut second_run = new_session(&temp_dir, &llm);
    let video = second_run.open(VIDEO_URL).await.unwrap();
    assert_eq!(video.chapters.len(), 3);
    second_run.select_chapter(2).unwrap();
    second_run.analyze_active().await.unwrap();

    // Chapters come from history; only the new chapter is requested
    assert_eq!(llm.calls(), 3);

    let entry = second_run.history().get("dQw4w9WgXcQ").unwrap();
    let keys: Vec<_> = entry.results.keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["ch_0", "ch_3"]);
    assert_eq!(entry.results["ch_0"], "intro notes");
}

#[tokio::test]
async fn test_fresh_start_ignores_saved_session() {
    let temp_dir = TempDir::new().unwrap();
    let llm = Arc::new(ScriptedLLM::default());
    llm.reply(CHAPTER_LISTING).reply("intro notes").reply(CHAPTER_LISTING);

    let mut session = new_session(&temp_dir, &llm);
    session.open(VIDEO_URL).await.unwrap();
    session.analyze_active().await.unwrap();

    session.start(VIDEO_URL).await.unwrap();
    assert_eq!(llm.calls(), 3);
    assert_eq!(session.chapter_status(0), ChapterStatus::NotStarted);
}

#[tokio::test]
async fn test_open_accepts_url_without_scheme() {
    let temp_dir = TempDir::new().unwrap();
    let llm = Arc::new(ScriptedLLM::default());
    llm.reply(CHAPTER_LISTING);
    let mut session = new_session(&temp_dir, &llm);

    let video = session.open("www.youtube.com/watch?v=dQw4w9WgXcQ").await.unwrap();
    assert_eq!(video.url, VIDEO_URL);
    assert_eq!(video.id, "dQw4w9WgXcQ");
}

#[tokio::test]
async fn test_analyze_all_interprets_and_saves_every_chapter() {
    let temp_dir = TempDir::new().unwrap();
    let llm = Arc::new(ScriptedLLM::default());
    llm.reply(CHAPTER_LISTING).reply("one").reply("two").reply("three");
    let mut session = new_session(&temp_dir, &llm);
    session.open(VIDEO_URL).await.unwrap();

    assert_eq!(session.analyze_all().await.unwrap(), 3);
    assert_eq!(llm.calls(), 4);
    assert!((0..3).all(|i| session.chapter_status(i) == ChapterStatus::Complete));

    let entry = session.history().get("dQw4w9WgXcQ").unwrap();
    assert_eq!(entry.results.len(), 3);
    assert_eq!(entry.results["ch_3"], "three");

    // Everything is cached now
    assert_eq!(session.analyze_all().await.unwrap(), 3);
    assert_eq!(llm.calls(), 4);
}

#[tokio::test]
async fn test_analyze_all_stops_at_first_failure() {
    let temp_dir = TempDir::new().unwrap();
    let llm = Arc::new(ScriptedLLM::default());
    llm.reply(CHAPTER_LISTING).reply("one").fail().reply("never requested");
    let mut session = new_session(&temp_dir, &llm);
    session.open(VIDEO_URL).await.unwrap();

    let err = session.analyze_all().await.unwrap_err();
    assert_eq!(err.to_string(), ANALYSIS_FAILED_MESSAGE);
    assert_eq!(llm.calls(), 3);
    assert_eq!(session.state().active_chapter, 1);
    assert_eq!(session.chapter_status(0), ChapterStatus::Complete);
    assert_eq!(session.chapter_status(1), ChapterStatus::NotStarted);
    assert_eq!(session.chapter_status(2), ChapterStatus::NotStarted);

    let entry = session.history().get("dQw4w9WgXcQ").unwrap();
    assert_eq!(entry.results.len(), 1);
}

#[tokio::test]
async fn test_saved_session_exports_from_history() {
    let temp_dir = TempDir::new().unwrap();
    let llm = Arc::new(ScriptedLLM::default());
    llm.reply(CHAPTER_LISTING).reply("intro notes");
    let mut session = new_session(&temp_dir, &llm);
    session.set_style(AnalysisStyle::Storytelling);
    session.open(VIDEO_URL).await.unwrap();
    session.analyze_active().await.unwrap();

    let entry = session.history().get("dQw4w9WgXcQ").unwrap();
    let path = export::write_history_entry(&temp_dir.path().join("exports"), &entry, Language::En)
        .await
        .unwrap();

    assert!(path.ends_with("YouTube Video (dQw4w9WgXcQ)_Interpretation.md"));
    let markdown = std::fs::read_to_string(path).unwrap();
    assert!(markdown.contains(&format!("**Style:** {}", AnalysisStyle::Storytelling.label(Language::En))));
    assert!(markdown.contains("## Phase 1: Introduction (0:00)"));
    assert!(markdown.contains("intro notes"));
    assert!(!markdown.contains("## Phase 2"));
}
