use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, warn};

use super::{RawCandidate, SearchError, SearchProvider};

const DEFAULT_BASE_URL: &str = "https://www.googleapis.com/youtube/v3";

/// YouTube Data API v3 search provider.
///
/// Resolves a query in two calls: `search` (live, embeddable-hinted video
/// search) followed by a batched `videos` lookup for embeddability, live
/// status, and concurrent viewer counts. No retries: a failed call fails
/// the query.
#[derive(Debug, Clone)]
pub struct YouTubeSearch {
    client: Client,
    api_key: String,
    base_url: String,
}

impl YouTubeSearch {
    pub fn new(api_key: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: Self::build_client(timeout),
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    pub fn from_config(config: &crate::config::ResolverConfig, api_key: impl Into<String>) -> Self {
        Self::new(api_key, config.request_timeout)
    }

    /// Point the provider at a different API root. Used by tests.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn build_client(timeout: Duration) -> Client {
        Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(5))
            .user_agent(concat!("darshan-finder/", env!("CARGO_PKG_VERSION")))
            .gzip(true)
            .build()
            .expect("Failed to build HTTP client")
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&str, &str)],
    ) -> Result<T, SearchError> {
        let url = format!("{}/{}", self.base_url, endpoint);

        let response = self
            .client
            .get(&url)
            .query(params)
            .query(&[("key", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    SearchError::Timeout { url: url.clone() }
                } else {
                    SearchError::Network {
                        url: url.clone(),
                        reason: e.to_string(),
                    }
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!(url, status = status.as_u16(), "Search API returned error status");
            return Err(SearchError::Http {
                url,
                status: status.as_u16(),
                message: status.canonical_reason().unwrap_or("Unknown").to_string(),
            });
        }

        let body = response.text().await.map_err(|e| SearchError::Network {
            url: url.clone(),
            reason: e.to_string(),
        })?;

        serde_json::from_str(&body).map_err(|e| SearchError::Parse {
            url,
            message: e.to_string(),
        })
    }
}

#[async_trait]
impl SearchProvider for YouTubeSearch {
    async fn search_live(
        &self,
        query: &str,
        max_results: u32,
    ) -> Result<Vec<RawCandidate>, SearchError> {
        let max_results = max_results.to_string();
        let search: SearchResponse = self
            .get_json(
                "search",
                &[
                    ("part", "snippet"),
                    ("q", query),
                    ("type", "video"),
                    ("eventType", "live"),
                    ("videoEmbeddable", "true"),
                    ("maxResults", max_results.as_str()),
                ],
            )
            .await?;

        // Search order is the provider's relevance ranking; preserve it.
        let video_ids: Vec<String> = search
            .items
            .into_iter()
            .filter_map(|item| item.id.video_id)
            .collect();

        if video_ids.is_empty() {
            debug!(query, "Search returned no live videos");
            return Ok(Vec::new());
        }

        let details: VideosResponse = self
            .get_json(
                "videos",
                &[
                    ("part", "snippet,liveStreamingDetails,status"),
                    ("id", video_ids.join(",").as_str()),
                ],
            )
            .await?;

        let mut by_id: std::collections::HashMap<String, VideoItem> = details
            .items
            .into_iter()
            .map(|item| (item.id.clone(), item))
            .collect();

        let candidates: Vec<RawCandidate> = video_ids
            .iter()
            .filter_map(|id| by_id.remove(id).map(|item| item.into_candidate(id)))
            .collect();

        debug!(query, count = candidates.len(), "Search produced candidates");
        Ok(candidates)
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    #[serde(default)]
    id: SearchItemId,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchItemId {
    #[serde(default)]
    video_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VideosResponse {
    #[serde(default)]
    items: Vec<VideoItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoItem {
    id: String,
    #[serde(default)]
    snippet: VideoSnippet,
    #[serde(default)]
    status: VideoStatus,
    #[serde(default)]
    live_streaming_details: LiveStreamingDetails,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoSnippet {
    #[serde(default)]
    title: String,
    #[serde(default)]
    channel_title: String,
    #[serde(default)]
    channel_id: String,
    #[serde(default)]
    live_broadcast_content: String,
    #[serde(default)]
    thumbnails: Thumbnails,
}

#[derive(Debug, Default, Deserialize)]
struct Thumbnails {
    high: Option<Thumbnail>,
}

#[derive(Debug, Deserialize)]
struct Thumbnail {
    url: String,
}

#[derive(Debug, Default, Deserialize)]
struct VideoStatus {
    embeddable: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LiveStreamingDetails {
    // The API reports this as a decimal string.
    concurrent_viewers: Option<String>,
}

impl VideoItem {
    fn into_candidate(self, video_id: &str) -> RawCandidate {
        RawCandidate {
            video_id: video_id.to_string(),
            title: self.snippet.title,
            channel_name: self.snippet.channel_title,
            channel_id: self.snippet.channel_id,
            is_live: self.snippet.live_broadcast_content == "live",
            // Absent status means the owner has not restricted embedding.
            is_embeddable: self.status.embeddable.unwrap_or(true),
            thumbnail_url: self.snippet.thumbnails.high.map(|t| t.url),
            viewer_count: self
                .live_streaming_details
                .concurrent_viewers
                .and_then(|v| v.parse().ok()),
        }
    }
}
