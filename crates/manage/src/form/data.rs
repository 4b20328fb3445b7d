//! Submitted form values.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{ManageError, ManageResult};

/// Raw values submitted with a form, keyed by field name.
///
/// A key mapped to `None` was submitted with a null value. Fields treat that
/// the same as a missing key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormData {
    values: BTreeMap<String, Option<String>>,
}

impl FormData {
    /// Create empty form data.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from `(name, value)` pairs.
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            values: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), Some(v.into())))
                .collect(),
        }
    }

    /// Parse an `application/x-www-form-urlencoded` body.
    ///
    /// The first occurrence of a repeated key wins.
    pub fn parse_urlencoded(body: &str) -> ManageResult<Self> {
        let mut values = BTreeMap::new();
        for pair in body.split('&').filter(|p| !p.is_empty()) {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            let key = decode_component(key)?;
            let value = decode_component(value)?;
            values.entry(key).or_insert(Some(value));
        }
        Ok(Self { values })
    }

    /// Parse a JSON object of string or null values.
    pub fn from_json(json: &str) -> ManageResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| ManageError::Internal(anyhow::anyhow!("invalid form JSON: {e}")))
    }

    /// Set a value.
    pub fn insert(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(name.into(), Some(value.into()));
        self
    }

    /// Submit a key with a null value.
    pub fn insert_null(mut self, name: impl Into<String>) -> Self {
        self.values.insert(name.into(), None);
        self
    }

    /// Look up a submitted value.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).and_then(|v| v.as_deref())
    }

    /// Owned copy of a submitted value, for binding to a field.
    pub fn take(&self, name: &str) -> Option<String> {
        self.get(name).map(str::to_string)
    }

    /// Whether the key was submitted at all.
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }
}

fn decode_component(raw: &str) -> ManageResult<String> {
    let spaced = raw.replace('+', " ");
    urlencoding::decode(&spaced)
        .map(|s| s.into_owned())
        .map_err(|e| ManageError::Internal(anyhow::anyhow!("invalid form encoding: {e}")))
}
