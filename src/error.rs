//! Error taxonomy for the sync pipeline.
//!
//! Upstream failures never show up here: a source that cannot be fetched is
//! reported as [`crate::fetch::FetchOutcome::Unavailable`] and the cycle
//! moves on. Everything below escalates to a failed cycle.

use thiserror::Error;

/// Failure while turning one raw posting into a canonical document.
#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error("posting from `{source_slug}` has no id (title: {title:?})")]
    MissingId { source_slug: String, title: String },

    #[error("document `{external_id}` could not be encoded: {source}")]
    Encode {
        external_id: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Failure reported by a [`crate::store::DocumentStore`].
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("store io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("store snapshot is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// Cycle-level failure. No document staged in a failed cycle is persisted.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("normalization failed: {0}")]
    Normalization(#[from] NormalizeError),

    #[error("batch commit failed: {0}")]
    Commit(#[source] StoreError),

    #[error("reading existing documents failed: {0}")]
    Lookup(#[source] StoreError),
}

/// Invalid or unreadable configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("reading config from {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("parsing config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),

    #[error("keyword `{keyword}` does not compile: {source}")]
    Keyword {
        keyword: String,
        #[source]
        source: regex::Error,
    },
}

pub type Result<T, E = SyncError> = std::result::Result<T, E>;
