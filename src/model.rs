// src/model.rs
//! Upstream posting shape and the canonical job document.

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Upstream ids are numeric on Greenhouse, but strings are accepted too.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PostingId {
    Number(u64),
    Text(String),
}

impl PostingId {
    pub fn is_blank(&self) -> bool {
        matches!(self, PostingId::Text(s) if s.trim().is_empty())
    }
}

impl fmt::Display for PostingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PostingId::Number(n) => write!(f, "{n}"),
            PostingId::Text(s) => f.write_str(s.trim()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostingLocation {
    #[serde(default)]
    pub name: Option<String>,
}

/// One job as returned by the board API. Every field is optional on the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawPosting {
    #[serde(default)]
    pub id: Option<PostingId>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub location: Option<PostingLocation>,
    #[serde(default)]
    pub absolute_url: Option<String>,
    /// Entity-escaped HTML description.
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

impl RawPosting {
    pub fn title(&self) -> &str {
        self.title.as_deref().unwrap_or_default()
    }
}

/// `GET /v1/boards/{company}/jobs` response body.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JobsResponse {
    #[serde(default)]
    pub jobs: Vec<RawPosting>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobType {
    Internship,
    #[serde(rename = "Full-time")]
    FullTime,
}

impl JobType {
    /// "Internship" when the lower-cased title contains `intern` anywhere.
    pub fn from_title(title: &str) -> Self {
        if title.to_lowercase().contains("intern") {
            JobType::Internship
        } else {
            JobType::FullTime
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Public,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Open,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentSource {
    Scraped,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceMeta {
    pub source_id: String,
    pub external_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedFields {
    pub company_lower: String,
    pub title_lower: String,
}

/// Store-ready job record. `external_id` doubles as the store key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalJobDocument {
    pub external_id: String,
    pub title: String,
    pub company: String,
    pub location: String,
    pub job_type: JobType,
    pub apply_url: Option<String>,
    pub jd_text: String,
    pub tags: BTreeSet<String>,
    pub source: DocumentSource,
    pub source_meta: SourceMeta,
    pub visibility: Visibility,
    pub institute_id: Option<String>,
    pub owner_uid: Option<String>,
    pub status: JobStatus,
    /// Upstream timestamp passed through verbatim.
    pub posted_at: String,
    pub last_seen_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub normalized: NormalizedFields,
}
