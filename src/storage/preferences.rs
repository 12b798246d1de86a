use super::JsonStore;
use crate::analysis::{AnalysisStyle, KnowledgeLevel, Language};
use crate::error::Result;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Storage key of the preferences document
pub const PREFS_KEY: &str = "yt_interpreter_prefs";

/// Process-wide user choices
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Preferences {
    pub lang: Language,
    pub style: AnalysisStyle,
    pub level: KnowledgeLevel,
}

#[derive(Debug, Clone)]
pub struct PreferencesStore {
    store: JsonStore,
}

impl PreferencesStore {
    pub fn new(store: JsonStore) -> Self {
        Self { store }
    }

    /// Saved preferences, `None` if never saved or unreadable
    pub fn load(&self) -> Option<Preferences> {
        self.store.get(PREFS_KEY).unwrap_or_else(|e| {
            warn!("Failed to read preferences: {}", e);
            None
        })
    }

    pub fn save(&self, prefs: &Preferences) -> Result<()> {
        self.store.set(PREFS_KEY, prefs)
    }
}
