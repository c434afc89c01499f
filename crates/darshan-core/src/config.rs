use std::collections::HashSet;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A tracked location for which a live stream is sought.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Stable identifier, unique across the configured set.
    pub id: String,
    /// Human-readable name published in the snapshot.
    pub name: String,
    /// Search query issued against the video search provider.
    pub query: String,
    /// Channel IDs whose streams are preferred and exempt from the
    /// viewer-count floor.
    #[serde(default)]
    pub trusted_channels: Vec<String>,
}

impl SourceConfig {
    pub fn is_trusted(&self, channel_id: &str) -> bool {
        !channel_id.is_empty() && self.trusted_channels.iter().any(|c| c == channel_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceConfigError {
    #[error("Source at index {index} has an empty id")]
    EmptyId { index: usize },
    #[error("Source '{id}' has an empty display name")]
    EmptyName { id: String },
    #[error("Source '{id}' has an empty search query")]
    EmptyQuery { id: String },
    #[error("Duplicate source id: {id}")]
    DuplicateId { id: String },
}

/// Validate the configured source set before any resolution begins.
/// Any violation is fatal to the run.
pub fn validate_sources(sources: &[SourceConfig]) -> Result<(), SourceConfigError> {
    let mut seen = HashSet::new();
    for (index, source) in sources.iter().enumerate() {
        if source.id.is_empty() {
            return Err(SourceConfigError::EmptyId { index });
        }
        if source.name.is_empty() {
            return Err(SourceConfigError::EmptyName {
                id: source.id.clone(),
            });
        }
        if source.query.is_empty() {
            return Err(SourceConfigError::EmptyQuery {
                id: source.id.clone(),
            });
        }
        if !seen.insert(source.id.as_str()) {
            return Err(SourceConfigError::DuplicateId {
                id: source.id.clone(),
            });
        }
    }
    Ok(())
}

/// How to choose among candidates that survive filtering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionPolicy {
    /// First survivor in search-result (relevance) order.
    #[default]
    RankOrder,
    /// Highest concurrent viewer count; rank order breaks ties.
    MostViewers,
}

/// Configuration for a resolver run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Candidates requested per search query (default: 5).
    pub max_results: u32,
    /// HTTP request timeout for search provider calls.
    pub request_timeout: Duration,
    /// Minimum concurrent viewers for candidates from untrusted channels.
    pub min_viewers_untrusted: u64,
    /// Titles containing any of these (case-insensitive) are rejected.
    pub exclude_title_keywords: Vec<String>,
    /// Candidate selection rule among survivors.
    pub selection: SelectionPolicy,
    /// Upper bound on in-flight searches. 1 means sequential resolution;
    /// output order follows configuration order either way.
    pub max_concurrent_searches: usize,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            max_results: 5,
            request_timeout: Duration::from_secs(30),
            min_viewers_untrusted: 0,
            exclude_title_keywords: Vec::new(),
            selection: SelectionPolicy::default(),
            max_concurrent_searches: 1,
        }
    }
}

impl ResolverConfig {
    pub fn with_max_results(mut self, max_results: u32) -> Self {
        self.max_results = max_results.max(1);
        self
    }

    pub fn with_request_timeout(mut self, ms: u64) -> Self {
        self.request_timeout = Duration::from_millis(ms);
        self
    }

    pub fn with_min_viewers_untrusted(mut self, min: u64) -> Self {
        self.min_viewers_untrusted = min;
        self
    }

    pub fn with_exclude_title_keywords(mut self, keywords: Vec<String>) -> Self {
        self.exclude_title_keywords = keywords;
        self
    }

    pub fn with_selection(mut self, selection: SelectionPolicy) -> Self {
        self.selection = selection;
        self
    }

    pub fn with_max_concurrent_searches(mut self, max: usize) -> Self {
        self.max_concurrent_searches = max.max(1);
        self
    }
}
