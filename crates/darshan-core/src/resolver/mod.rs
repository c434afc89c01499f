mod filter;

pub use filter::RejectReason;

use std::sync::Arc;

use futures::stream::{self, StreamExt};
use tracing::{debug, info, warn};

use crate::config::{ResolverConfig, SelectionPolicy, SourceConfig};
use crate::search::{RawCandidate, SearchProvider};
use crate::snapshot::StreamRecord;

/// Resolves configured sources to their best currently-live stream.
pub struct Resolver {
    config: ResolverConfig,
    provider: Arc<dyn SearchProvider>,
}

impl Resolver {
    pub fn new(config: ResolverConfig, provider: Arc<dyn SearchProvider>) -> Self {
        Self { config, provider }
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Resolve a single source to zero or one stream record.
    ///
    /// Search failures and empty survivor sets both yield `None`: a source
    /// with no live stream right now is not an error, and one source's
    /// transport failure must not abort the rest of the run.
    pub async fn resolve(&self, source: &SourceConfig) -> Option<StreamRecord> {
        let candidates = match self
            .provider
            .search_live(&source.query, self.config.max_results)
            .await
        {
            Ok(candidates) => candidates,
            Err(e) => {
                warn!(source_id = %source.id, error = %e, "Search failed, skipping source");
                return None;
            }
        };

        let survivors: Vec<&RawCandidate> = candidates
            .iter()
            .filter(|c| {
                match filter::evaluate(c, &self.config, source.is_trusted(&c.channel_id)) {
                    Ok(()) => true,
                    Err(reason) => {
                        debug!(
                            source_id = %source.id,
                            video_id = %c.video_id,
                            %reason,
                            "Candidate rejected"
                        );
                        false
                    }
                }
            })
            .collect();

        let chosen = self.select(source, &survivors)?;
        info!(
            source_id = %source.id,
            video_id = %chosen.video_id,
            channel = %chosen.channel_name,
            viewers = chosen.viewer_count,
            "Resolved live stream"
        );
        Some(StreamRecord::from_candidate(source, chosen))
    }

    /// Resolve every source, preserving configuration order in the output.
    ///
    /// Searches run with at most `max_concurrent_searches` in flight; the
    /// buffered stream yields results in input order regardless, so the
    /// snapshot order never depends on completion order.
    pub async fn resolve_all(&self, sources: &[SourceConfig]) -> Vec<StreamRecord> {
        stream::iter(sources)
            .map(|source| self.resolve(source))
            .buffered(self.config.max_concurrent_searches.max(1))
            .filter_map(|record| async move { record })
            .collect()
            .await
    }

    fn select<'a>(
        &self,
        source: &SourceConfig,
        survivors: &[&'a RawCandidate],
    ) -> Option<&'a RawCandidate> {
        let trusted: Vec<&RawCandidate> = survivors
            .iter()
            .copied()
            .filter(|c| source.is_trusted(&c.channel_id))
            .collect();

        if trusted.is_empty() {
            self.pick(survivors)
        } else {
            self.pick(&trusted)
        }
    }

    fn pick<'a>(&self, candidates: &[&'a RawCandidate]) -> Option<&'a RawCandidate> {
        match self.config.selection {
            SelectionPolicy::RankOrder => candidates.first().copied(),
            // Strict comparison keeps the earlier (higher-ranked) candidate
            // on viewer-count ties.
            SelectionPolicy::MostViewers => candidates.iter().copied().reduce(|best, c| {
                if c.viewer_count.unwrap_or(0) > best.viewer_count.unwrap_or(0) {
                    c
                } else {
                    best
                }
            }),
        }
    }
}
