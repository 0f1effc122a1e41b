// src/keywords.rs
//! Whole-word keyword matching and the title relevance gate.

use regex::Regex;

use crate::error::ConfigError;

/// One vocabulary entry compiled to a word-boundary regex.
#[derive(Debug, Clone)]
struct CompiledKeyword {
    keyword: String,
    re: Regex,
}

/// Compiled keyword vocabulary. Matching is case-insensitive and requires a
/// word boundary on both ends, so `ai` never fires inside `maintain` and
/// `machine learning` only matches as a contiguous phrase.
#[derive(Debug, Clone)]
pub struct KeywordMatcher {
    keywords: Vec<CompiledKeyword>,
}

impl KeywordMatcher {
    pub fn new<S: AsRef<str>>(vocabulary: &[S]) -> Result<Self, ConfigError> {
        let keywords = vocabulary
            .iter()
            .map(|k| k.as_ref().trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .map(|keyword| {
                let pattern = format!(r"(?i)\b{}\b", regex::escape(&keyword));
                let re = Regex::new(&pattern).map_err(|source| ConfigError::Keyword {
                    keyword: keyword.clone(),
                    source,
                })?;
                Ok(CompiledKeyword { keyword, re })
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;
        Ok(Self { keywords })
    }

    /// True if any keyword whole-word-matches `text`.
    pub fn matches_any(&self, text: &str) -> bool {
        let lower = text.to_lowercase();
        self.keywords.iter().any(|k| k.re.is_match(&lower))
    }

    /// Keywords (lower-case, vocabulary order) that whole-word-match `text`.
    pub fn matched<'a>(&'a self, text: &str) -> impl Iterator<Item = &'a str> + 'a {
        let lower = text.to_lowercase();
        self.keywords
            .iter()
            .filter(move |k| k.re.is_match(&lower))
            .map(|k| k.keyword.as_str())
    }
}

/// Title-only relevance gate. Descriptions are never consulted, so a posting
/// relevant only by its body text is dropped.
#[derive(Debug, Clone)]
pub struct RelevanceFilter {
    matcher: KeywordMatcher,
}

impl RelevanceFilter {
    pub fn new(matcher: KeywordMatcher) -> Self {
        Self { matcher }
    }

    pub fn is_relevant(&self, title: &str) -> bool {
        self.matcher.matches_any(title)
    }
}
