#![forbid(unsafe_code)]

pub mod config;
pub mod resolver;
pub mod search;
pub mod snapshot;

pub use config::{validate_sources, ResolverConfig, SelectionPolicy, SourceConfig, SourceConfigError};
pub use resolver::{RejectReason, Resolver};
pub use search::{RawCandidate, SearchError, SearchProvider, YouTubeSearch};
pub use snapshot::{Snapshot, SnapshotError, SnapshotWriter, StreamRecord};
