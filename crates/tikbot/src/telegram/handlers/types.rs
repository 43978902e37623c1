//! Handler types and shared dependencies

use std::sync::Arc;

use dashmap::DashMap;
use teloxide::types::ChatId;
use tikcore::{QualityPreference, ResolverChain, UsageStats, VideoFetcher};

/// Error type for handlers
pub type HandlerError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Dependencies required by handlers
#[derive(Clone)]
pub struct HandlerDeps {
    pub chain: Arc<ResolverChain>,
    pub fetcher: Arc<VideoFetcher>,
    pub stats: Arc<UsageStats>,
    /// Per-chat quality choice from the inline menu; not persisted
    pub preferences: Arc<DashMap<ChatId, QualityPreference>>,
    /// Receives reports about unexpected errors
    pub admin_chat: Option<ChatId>,
}

impl HandlerDeps {
    /// Create new handler dependencies
    pub fn new(
        chain: Arc<ResolverChain>,
        fetcher: Arc<VideoFetcher>,
        stats: Arc<UsageStats>,
        admin_chat: Option<ChatId>,
    ) -> Self {
        Self {
            chain,
            fetcher,
            stats,
            preferences: Arc::new(DashMap::new()),
            admin_chat,
        }
    }

    pub fn quality_for(&self, chat_id: ChatId) -> QualityPreference {
        self.preferences.get(&chat_id).map(|q| *q).unwrap_or_default()
    }

    pub fn set_quality(&self, chat_id: ChatId, quality: QualityPreference) {
        self.preferences.insert(chat_id, quality);
    }

    /// Upload limit in bytes, as enforced by the fetcher.
    pub fn max_file_size(&self) -> u64 {
        self.fetcher.max_bytes()
    }
}
