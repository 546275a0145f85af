//! Keyword normalization and reply lookup.
//!
//! A [`KeywordBook`] holds the canonical keyword table and the synonym table.
//! Both are validated once on construction and never change afterwards.

use std::collections::HashMap;

use crate::base::{
    config::Config,
    keywords::FALLBACK_KEYWORD_SEPARATOR,
    types::{KeywordDefinition, KeywordEntry, Res},
};

/// Immutable keyword and synonym tables.
#[derive(Debug, Clone)]
pub struct KeywordBook {
    /// Canonical keywords in declaration order.
    order: Vec<String>,
    entries: HashMap<String, KeywordEntry>,
    aliases: HashMap<String, String>,
}

impl KeywordBook {
    /// Builds a book, rejecting tables that are not closed or that contain blank keys.
    pub fn new<I, A, K, V>(definitions: I, aliases: A) -> Res<Self>
    where
        I: IntoIterator<Item = KeywordDefinition>,
        A: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut order = Vec::new();
        let mut entries = HashMap::new();

        for KeywordDefinition { keyword, file, text } in definitions {
            if keyword.trim().is_empty() {
                return Err(anyhow::anyhow!("Keyword table contains an empty keyword."));
            }

            if keyword.trim() != keyword {
                return Err(anyhow::anyhow!("Keyword `{keyword}` has surrounding whitespace and can never match."));
            }

            if file.trim().is_empty() || file.contains('/') || file.contains('\\') {
                return Err(anyhow::anyhow!("Keyword `{keyword}` has an invalid image file name `{file}`."));
            }

            if entries.insert(keyword.clone(), KeywordEntry { file, text }).is_some() {
                return Err(anyhow::anyhow!("Keyword `{keyword}` is declared more than once."));
            }

            order.push(keyword);
        }

        if order.is_empty() {
            return Err(anyhow::anyhow!("Keyword table is empty."));
        }

        let mut table = HashMap::new();

        for (alias, keyword) in aliases {
            let (alias, keyword): (String, String) = (alias.into(), keyword.into());

            if alias.trim().is_empty() || alias.trim() != alias {
                return Err(anyhow::anyhow!("Alias `{alias}` for `{keyword}` is empty or has surrounding whitespace."));
            }

            if entries.contains_key(&alias) {
                return Err(anyhow::anyhow!("Alias `{alias}` is also a canonical keyword."));
            }

            if !entries.contains_key(&keyword) {
                return Err(anyhow::anyhow!("Alias `{alias}` points at `{keyword}`, which is not a canonical keyword."));
            }

            table.insert(alias, keyword);
        }

        Ok(Self { order, entries, aliases: table })
    }

    /// Builds the book declared in the configuration.
    pub fn from_config(config: &Config) -> Res<Self> {
        Self::new(config.keywords.iter().cloned(), config.aliases.iter().map(|(k, v)| (k.clone(), v.clone())))
    }

    /// Trims the text and maps a synonym to its canonical keyword.
    ///
    /// Absent text is treated as empty.
    pub fn normalize<'a>(&'a self, raw: Option<&'a str>) -> &'a str {
        let trimmed = raw.unwrap_or_default().trim();

        self.aliases.get(trimmed).map(String::as_str).unwrap_or(trimmed)
    }

    /// Exact, case-sensitive lookup of a canonical keyword.
    pub fn resolve(&self, keyword: &str) -> Option<&KeywordEntry> {
        self.entries.get(keyword)
    }

    /// Canonical keywords in declaration order.
    pub fn canonical_keywords(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// All `(alias, canonical keyword)` pairs.
    pub fn aliases(&self) -> impl Iterator<Item = (&str, &str)> {
        self.aliases.iter().map(|(a, k)| (a.as_str(), k.as_str()))
    }

    /// The guidance text sent for an unrecognized keyword.
    pub fn fallback_text(&self, lead: &str) -> String {
        format!("{lead}{}", self.order.join(FALLBACK_KEYWORD_SEPARATOR))
    }
}

// Tests.
