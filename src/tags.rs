// src/tags.rs
//! Topical tags derived from title + description.

use std::collections::{BTreeMap, BTreeSet};

use crate::keywords::KeywordMatcher;

/// Title-case every word: a letter following another letter is lower-cased,
/// any other letter is upper-cased ("machine learning" -> "Machine Learning",
/// "ai" -> "Ai", "3d" -> "3D").
pub fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_is_letter = false;
    for c in s.chars() {
        if prev_is_letter {
            out.extend(c.to_lowercase());
        } else {
            out.extend(c.to_uppercase());
        }
        prev_is_letter = c.is_alphabetic();
    }
    out
}

#[derive(Debug, Clone)]
pub struct TagExtractor {
    matcher: KeywordMatcher,
    labels: BTreeMap<String, String>,
}

impl TagExtractor {
    pub fn new(matcher: KeywordMatcher) -> Self {
        Self {
            matcher,
            labels: BTreeMap::new(),
        }
    }

    /// Override the display label of specific keywords (keys are lower-case keywords).
    pub fn with_labels(mut self, labels: BTreeMap<String, String>) -> Self {
        self.labels = labels;
        self
    }

    /// Deduplicated tag set; the `BTreeSet` keeps serialization order stable.
    pub fn extract(&self, title: &str, description: &str) -> BTreeSet<String> {
        let combined = format!("{title} {description}");
        self.matcher
            .matched(&combined)
            .map(|kw| match self.labels.get(kw) {
                Some(label) => label.clone(),
                None => title_case(kw),
            })
            .collect()
    }
}
