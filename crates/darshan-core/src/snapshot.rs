use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::config::SourceConfig;
use crate::search::RawCandidate;

const WATCH_URL_BASE: &str = "https://www.youtube.com/watch?v=";
const EMBED_URL_BASE: &str = "https://www.youtube.com/embed/";

/// One published stream. Field names are the wire format consumed by
/// client applications; do not rename them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamRecord {
    pub temple_id: String,
    pub temple_name: String,
    pub video_id: String,
    pub url: String,
    pub embed_url: String,
    pub title: String,
    pub channel: String,
    pub viewer_count: Option<u64>,
    pub thumbnail: String,
}

impl StreamRecord {
    pub fn from_candidate(source: &SourceConfig, candidate: &RawCandidate) -> Self {
        let thumbnail = candidate.thumbnail_url.clone().unwrap_or_else(|| {
            format!(
                "https://img.youtube.com/vi/{}/hqdefault.jpg",
                candidate.video_id
            )
        });
        Self {
            temple_id: source.id.clone(),
            temple_name: source.name.clone(),
            video_id: candidate.video_id.clone(),
            url: format!("{WATCH_URL_BASE}{}", candidate.video_id),
            embed_url: format!("{EMBED_URL_BASE}{}", candidate.video_id),
            title: candidate.title.clone(),
            channel: candidate.channel_name.clone(),
            viewer_count: candidate.viewer_count,
            thumbnail,
        }
    }
}

/// The complete output document for one run. Wholly replaces the prior one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub last_updated: DateTime<Utc>,
    pub stream_count: usize,
    pub streams: Vec<StreamRecord>,
}

impl Snapshot {
    pub fn new(streams: Vec<StreamRecord>) -> Self {
        Self {
            last_updated: Utc::now(),
            stream_count: streams.len(),
            streams,
        }
    }
}

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("Failed to serialize snapshot: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("Failed to write snapshot to {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Writes snapshots atomically: serialize to a sibling temp file, then
/// rename over the destination. A crash mid-write leaves the previous
/// snapshot intact rather than a truncated file.
#[derive(Debug, Clone)]
pub struct SnapshotWriter {
    path: PathBuf,
}

impl SnapshotWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn write(&self, snapshot: &Snapshot) -> Result<(), SnapshotError> {
        let json = serde_json::to_vec_pretty(snapshot)?;

        let mut tmp = self.path.as_os_str().to_owned();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        tokio::fs::write(&tmp, &json)
            .await
            .map_err(|e| SnapshotError::Io {
                path: tmp.clone(),
                source: e,
            })?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| SnapshotError::Io {
                path: self.path.clone(),
                source: e,
            })?;

        info!(
            path = %self.path.display(),
            stream_count = snapshot.stream_count,
            "Snapshot written"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(id: &str, name: &str) -> SourceConfig {
        SourceConfig {
            id: id.to_string(),
            name: name.to_string(),
            query: format!("{name} live darshan"),
            trusted_channels: vec![],
        }
    }

    fn candidate(video_id: &str) -> RawCandidate {
        RawCandidate {
            video_id: video_id.to_string(),
            title: "LIVE Darshan from Tirumala".to_string(),
            channel_name: "TTD Official".to_string(),
            channel_id: "UCttd".to_string(),
            is_live: true,
            is_embeddable: true,
            thumbnail_url: None,
            viewer_count: Some(15000),
        }
    }

    #[test]
    fn record_derives_urls_and_thumbnail_fallback() {
        let record = StreamRecord::from_candidate(
            &source("tirupati", "Tirumala Tirupati"),
            &candidate("abc123xyz"),
        );
        assert_eq!(record.temple_id, "tirupati");
        assert_eq!(record.temple_name, "Tirumala Tirupati");
        assert_eq!(record.url, "https://www.youtube.com/watch?v=abc123xyz");
        assert_eq!(record.embed_url, "https://www.youtube.com/embed/abc123xyz");
        assert_eq!(
            record.thumbnail,
            "https://img.youtube.com/vi/abc123xyz/hqdefault.jpg"
        );
        assert_eq!(record.viewer_count, Some(15000));
    }

    #[test]
    fn record_prefers_provider_thumbnail() {
        let c = RawCandidate {
            thumbnail_url: Some("https://i.ytimg.com/vi/abc/hq.jpg".to_string()),
            ..candidate("abc")
        };
        let record = StreamRecord::from_candidate(&source("t", "T"), &c);
        assert_eq!(record.thumbnail, "https://i.ytimg.com/vi/abc/hq.jpg");
    }

    #[test]
    fn snapshot_count_matches_streams() {
        let records = vec![
            StreamRecord::from_candidate(&source("a", "A"), &candidate("v1")),
            StreamRecord::from_candidate(&source("b", "B"), &candidate("v2")),
        ];
        let snapshot = Snapshot::new(records);
        assert_eq!(snapshot.stream_count, snapshot.streams.len());
        assert_eq!(snapshot.stream_count, 2);
    }

    #[test]
    fn snapshot_serde_round_trip() {
        let snapshot = Snapshot::new(vec![StreamRecord::from_candidate(
            &source("tirupati", "Tirumala Tirupati"),
            &candidate("abc123xyz"),
        )]);
        let json = serde_json::to_string(&snapshot).unwrap();
        let parsed: Snapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, snapshot);
    }

    #[test]
    fn null_viewer_count_serializes_as_null() {
        let c = RawCandidate {
            viewer_count: None,
            ..candidate("abc")
        };
        let record = StreamRecord::from_candidate(&source("t", "T"), &c);
        let value = serde_json::to_value(&record).unwrap();
        assert!(value.get("viewer_count").unwrap().is_null());
    }

    #[tokio::test]
    async fn write_produces_parseable_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("live_streams.json");
        let writer = SnapshotWriter::new(&path);

        let snapshot = Snapshot::new(vec![StreamRecord::from_candidate(
            &source("tirupati", "Tirumala Tirupati"),
            &candidate("abc123xyz"),
        )]);
        writer.write(&snapshot).await.unwrap();

        let content = tokio::fs::read_to_string(&path).await.unwrap();
        let parsed: Snapshot = serde_json::from_str(&content).unwrap();
        assert_eq!(parsed, snapshot);
        // No temp file left behind.
        assert!(!dir.path().join("live_streams.json.tmp").exists());
    }

    #[tokio::test]
    async fn write_replaces_previous_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("live_streams.json");
        let writer = SnapshotWriter::new(&path);

        writer.write(&Snapshot::new(vec![])).await.unwrap();
        let second = Snapshot::new(vec![StreamRecord::from_candidate(
            &source("kashi", "Kashi Vishwanath"),
            &candidate("v2"),
        )]);
        writer.write(&second).await.unwrap();

        let content = tokio::fs::read_to_string(&path).await.unwrap();
        let parsed: Snapshot = serde_json::from_str(&content).unwrap();
        assert_eq!(parsed.stream_count, 1);
        assert_eq!(parsed.streams[0].temple_id, "kashi");
    }

    #[tokio::test]
    async fn empty_snapshot_writes_successfully() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("live_streams.json");
        let writer = SnapshotWriter::new(&path);

        writer.write(&Snapshot::new(vec![])).await.unwrap();

        let content = tokio::fs::read_to_string(&path).await.unwrap();
        let parsed: Snapshot = serde_json::from_str(&content).unwrap();
        assert_eq!(parsed.stream_count, 0);
        assert!(parsed.streams.is_empty());
    }

    #[tokio::test]
    async fn write_fails_when_directory_missing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("live_streams.json");
        let writer = SnapshotWriter::new(&path);

        let err = writer.write(&Snapshot::new(vec![])).await.unwrap_err();
        assert!(matches!(err, SnapshotError::Io { .. }));
    }
}
