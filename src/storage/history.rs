use super::JsonStore;
use crate::analysis::{AnalysisResults, AnalysisStyle, KnowledgeLevel};
use crate::error::Result;
use crate::video::VideoInfo;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Storage key of the history document
pub const HISTORY_KEY: &str = "yt_interpreter_history";

/// Maximum number of videos kept in history
pub const HISTORY_LIMIT: usize = 50;

/// Snapshot of one video's interpretation session
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InterpretationHistoryEntry {
    /// Video identifier, unique across the history
    pub id: String,
    pub video_info: VideoInfo,
    pub style: AnalysisStyle,
    pub level: KnowledgeLevel,
    /// Chapter id -> markdown body at time of save
    pub results: AnalysisResults,
    /// Save time in milliseconds since the Unix epoch
    pub timestamp: i64,
}

impl InterpretationHistoryEntry {
    pub fn new(video_info: VideoInfo, style: AnalysisStyle, level: KnowledgeLevel, results: AnalysisResults) -> Self {
        Self {
            id: video_info.id.clone(),
            video_info,
            style,
            level,
            results,
            timestamp: chrono::Utc::now().timestamp_millis(),
        }
    }
}

/// Newest-first, capped list of interpretation snapshots
#[derive(Debug, Clone)]
pub struct HistoryStore {
    store: JsonStore,
    limit: usize,
}

impl HistoryStore {
    pub fn new(store: JsonStore) -> Self {
        Self::with_limit(store, HISTORY_LIMIT)
    }

    pub fn with_limit(store: JsonStore, limit: usize) -> Self {
        Self { store, limit }
    }

    /// Stored entries, most recent first. Unreadable history is treated as
    /// empty; use this for display only.
    pub fn load(&self) -> Vec<InterpretationHistoryEntry> {
        self.read_entries().unwrap_or_else(|e| {
            warn!("Failed to read history, showing it as empty: {}", e);
            Vec::new()
        })
    }

    /// Stored entries for a read-modify-write. A document that cannot be
    /// decoded is an error so it is never overwritten.
    fn read_entries(&self) -> Result<Vec<InterpretationHistoryEntry>> {
        Ok(self.store.get::<Vec<InterpretationHistoryEntry>>(HISTORY_KEY)?.unwrap_or_default())
    }

    pub fn get(&self, id: &str) -> Option<InterpretationHistoryEntry> {
        self.load().into_iter().find(|entry| entry.id == id)
    }

    /// Upsert with promotion: any entry for the same video is removed and
    /// the new one goes to the front. The list is then cut to the limit.
    pub fn save(&self, entry: InterpretationHistoryEntry) -> Result<()> {
        let mut entries = self.read_entries()?;

        if let Some(index) = entries.iter().position(|existing| existing.id == entry.id) {
            entries.remove(index);
            debug!("Replacing history entry for {}", entry.id);
        }
        let id = entry.id.clone();
        entries.insert(0, entry);

        if entries.len() > self.limit {
            let evicted = entries.len() - self.limit;
            entries.truncate(self.limit);
            info!("🧹 Evicted {} oldest history entries", evicted);
        }

        self.store.set(HISTORY_KEY, &entries)?;
        debug!("💾 Saved history entry {} ({} total)", id, entries.len());
        Ok(())
    }

    /// Remove one entry, returning whether it was present
    pub fn delete_one(&self, id: &str) -> Result<bool> {
        let mut entries = self.read_entries()?;
        let before = entries.len();
        entries.retain(|entry| entry.id != id);

        let removed = entries.len() != before;
        self.store.set(HISTORY_KEY, &entries)?;
        if removed {
            info!("🗑️ Deleted history entry: {}", id);
        }
        Ok(removed)
    }
}
