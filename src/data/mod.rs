//! Core data models for the roast API
//!
//! Wire types for the manifest and shard documents, plus the value returned
//! to callers of [`RoastClient::get_random_roast`](crate::client::RoastClient::get_random_roast).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Top-level index of supported languages
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    /// Language code -> shard information
    pub languages: BTreeMap<String, LanguageInfo>,
}

/// Per-language entry in the manifest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageInfo {
    /// Number of shards, numbered from 1
    pub shards: u32,
}

impl Manifest {
    /// Looks up a language entry
    pub fn language(&self, code: &str) -> Option<&LanguageInfo> {
        self.languages.get(code)
    }

    /// All language codes in sorted order
    pub fn codes(&self) -> impl Iterator<Item = &str> {
        self.languages.keys().map(String::as_str)
    }
}

/// One partition of a language's corpus
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shard {
    /// Language code; some deployments omit it
    #[serde(default)]
    pub language: Option<String>,
    /// Shard number; some deployments omit it
    #[serde(default)]
    pub shard: Option<u32>,
    /// Roasts in this shard, in file order
    #[serde(default)]
    pub roasts: Vec<Roast>,
}

/// Identifier of a roast, numeric in most corpora
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RoastId {
    Number(u64),
    Text(String),
}

/// A single roast record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Roast {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RoastId>,
    pub text: String,
    /// Intensity level, 1 (mild) to 3 (brutal)
    pub intensity: u8,
    /// Text length in characters
    pub length: usize,
}

/// A roast together with where it was drawn from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RandomRoast {
    pub language: String,
    pub shard: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RoastId>,
    pub text: String,
    pub intensity: u8,
    pub length: usize,
    /// Set when filters matched nothing and the unfiltered shard was used
    #[serde(skip)]
    pub filter_ignored: bool,
}

impl RandomRoast {
    pub(crate) fn from_roast(language: &str, shard: u32, roast: &Roast, filter_ignored: bool) -> Self {
        Self {
            language: language.to_string(),
            shard,
            id: roast.id.clone(),
            text: roast.text.clone(),
            intensity: roast.intensity,
            length: roast.length,
            filter_ignored,
        }
    }
}

/// Options accepted by `get_random_roast`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoastOptions {
    /// Target language; the client's default when unset
    pub lang: Option<String>,
    /// Exact intensity to keep
    pub intensity: Option<u8>,
    /// Maximum text length to keep (inclusive)
    pub max_length: Option<usize>,
}

impl RoastOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lang(mut self, lang: impl Into<String>) -> Self {
        self.lang = Some(lang.into());
        self
    }

    pub fn intensity(mut self, intensity: u8) -> Self {
        self.intensity = Some(intensity);
        self
    }

    pub fn max_length(mut self, max_length: usize) -> Self {
        self.max_length = Some(max_length);
        self
    }

    /// True when no filter is set
    pub fn is_unfiltered(&self) -> bool {
        self.intensity.is_none() && self.max_length.is_none()
    }
}
