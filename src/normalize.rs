// src/normalize.rs
//! Raw posting -> canonical job document.

use chrono::{DateTime, SecondsFormat, Utc};

use crate::config::{SourceConfig, SyncConfig};
use crate::error::{ConfigError, NormalizeError};
use crate::keywords::{KeywordMatcher, RelevanceFilter};
use crate::model::{
    CanonicalJobDocument, DocumentSource, JobStatus, JobType, NormalizedFields, RawPosting,
    SourceMeta, Visibility,
};
use crate::sanitize::clean_html_text;
use crate::tags::TagExtractor;

/// Used when the board omits a location.
pub const DEFAULT_LOCATION: &str = "Remote";

/// `<prefix>-<rawId>`; the store key of the resulting document.
pub fn external_id(prefix: &str, raw_id: &str) -> String {
    format!("{prefix}-{raw_id}")
}

/// Pure, deterministic transform: the same posting, source and `now` always
/// produce the same document.
#[derive(Debug, Clone)]
pub struct RecordNormalizer {
    filter: RelevanceFilter,
    tagger: TagExtractor,
}

impl RecordNormalizer {
    pub fn new(filter: RelevanceFilter, tagger: TagExtractor) -> Self {
        Self { filter, tagger }
    }

    /// Compile the keyword vocabulary and tag labels of `cfg`.
    pub fn from_config(cfg: &SyncConfig) -> Result<Self, ConfigError> {
        let matcher = KeywordMatcher::new(&cfg.keywords)?;
        Ok(Self::new(
            RelevanceFilter::new(matcher.clone()),
            TagExtractor::new(matcher).with_labels(cfg.tag_labels.clone()),
        ))
    }

    /// `Ok(None)` when the title is out of scope.
    pub fn normalize(
        &self,
        raw: &RawPosting,
        source: &SourceConfig,
        now: DateTime<Utc>,
    ) -> Result<Option<CanonicalJobDocument>, NormalizeError> {
        let title = raw.title();
        if !self.filter.is_relevant(title) {
            return Ok(None);
        }
        self.build(raw, source, now).map(Some)
    }

    /// Build the document without consulting the relevance gate.
    pub fn build(
        &self,
        raw: &RawPosting,
        source: &SourceConfig,
        now: DateTime<Utc>,
    ) -> Result<CanonicalJobDocument, NormalizeError> {
        let title = raw.title().to_string();
        let raw_id = match &raw.id {
            Some(id) if !id.is_blank() => id.to_string(),
            _ => {
                return Err(NormalizeError::MissingId {
                    source_slug: source.slug.clone(),
                    title,
                })
            }
        };

        let external_id = external_id(&source.key_prefix(), &raw_id);
        let company = source.company_name();
        let jd_text = clean_html_text(raw.content.as_deref());
        let tags = self.tagger.extract(&title, &jd_text);
        let location = raw
            .location
            .as_ref()
            .and_then(|l| l.name.clone())
            .unwrap_or_else(|| DEFAULT_LOCATION.to_string());
        let posted_at = raw
            .updated_at
            .clone()
            .unwrap_or_else(|| now.to_rfc3339_opts(SecondsFormat::AutoSi, true));

        Ok(CanonicalJobDocument {
            normalized: NormalizedFields {
                company_lower: source.slug.to_lowercase(),
                title_lower: title.to_lowercase(),
            },
            source_meta: SourceMeta {
                source_id: source.source_id().to_string(),
                external_id: external_id.clone(),
            },
            external_id,
            job_type: JobType::from_title(&title),
            title,
            company,
            location,
            apply_url: raw.absolute_url.clone(),
            jd_text,
            tags,
            source: DocumentSource::Scraped,
            visibility: Visibility::Public,
            institute_id: None,
            owner_uid: None,
            status: JobStatus::Open,
            posted_at,
            last_seen_at: now,
            created_at: now,
            updated_at: now,
        })
    }
}
