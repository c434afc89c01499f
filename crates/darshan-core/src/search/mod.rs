mod youtube;

pub use youtube::YouTubeSearch;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("HTTP error {status} querying {url}: {message}")]
    Http {
        url: String,
        status: u16,
        message: String,
    },
    #[error("Network error querying {url}: {reason}")]
    Network { url: String, reason: String },
    #[error("Parse error for {url}: {message}")]
    Parse { url: String, message: String },
    #[error("Timeout querying {url}")]
    Timeout { url: String },
}

impl SearchError {
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// A live-video search result, in provider relevance order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawCandidate {
    pub video_id: String,
    pub title: String,
    pub channel_name: String,
    pub channel_id: String,
    pub is_live: bool,
    pub is_embeddable: bool,
    pub thumbnail_url: Option<String>,
    pub viewer_count: Option<u64>,
}

/// Trait for searching currently-live videos matching a query.
///
/// Implementations handle the provider's own protocol and return candidates
/// in relevance-ranked order. The trait is object-safe and Send + Sync for
/// use across async tasks.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    async fn search_live(
        &self,
        query: &str,
        max_results: u32,
    ) -> Result<Vec<RawCandidate>, SearchError>;
}
