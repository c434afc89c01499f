use std::fmt;

use crate::config::ResolverConfig;
use crate::search::RawCandidate;

/// Why a candidate was rejected during filtering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    NotLive,
    NotEmbeddable,
    ExcludedKeyword(String),
    BelowViewerFloor { viewers: u64, min: u64 },
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotLive => write!(f, "not live"),
            Self::NotEmbeddable => write!(f, "not embeddable"),
            Self::ExcludedKeyword(kw) => write!(f, "title contains '{kw}'"),
            Self::BelowViewerFloor { viewers, min } => {
                write!(f, "only {viewers} viewers (min: {min})")
            }
        }
    }
}

/// Apply the filter chain to a single candidate.
///
/// A live search result being "live" at search time does not guarantee it
/// still is, nor that the owner allows embedding, so both are checked
/// explicitly. The viewer floor only applies to untrusted channels.
pub fn evaluate(
    candidate: &RawCandidate,
    config: &ResolverConfig,
    is_trusted: bool,
) -> Result<(), RejectReason> {
    if !candidate.is_live {
        return Err(RejectReason::NotLive);
    }
    if !candidate.is_embeddable {
        return Err(RejectReason::NotEmbeddable);
    }

    let title = candidate.title.to_lowercase();
    for keyword in &config.exclude_title_keywords {
        if title.contains(&keyword.to_lowercase()) {
            return Err(RejectReason::ExcludedKeyword(keyword.clone()));
        }
    }

    if !is_trusted {
        let viewers = candidate.viewer_count.unwrap_or(0);
        if viewers < config.min_viewers_untrusted {
            return Err(RejectReason::BelowViewerFloor {
                viewers,
                min: config.min_viewers_untrusted,
            });
        }
    }

    Ok(())
}
