// src/models/query.rs

//! Query specification and credential types.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Opaque bearer token attached to every outbound request.
///
/// The secret is never logged or serialized; `Debug` redacts it.
/// Rotation happens outside this crate.
#[derive(Clone)]
pub struct Credential(String);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Authorization header value for this credential.
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(***)")
    }
}

/// Result ordering requested from upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortMode {
    #[default]
    Relevance,
    Recency,
    Ascending,
    Descending,
}

impl SortMode {
    /// Wire value used as the `sort` query parameter.
    pub fn as_param(&self) -> &'static str {
        match self {
            SortMode::Relevance => "relevance",
            SortMode::Recency => "recency",
            SortMode::Ascending => "asc",
            SortMode::Descending => "desc",
        }
    }

    pub fn from_param(s: &str) -> Option<Self> {
        match s {
            "relevance" => Some(SortMode::Relevance),
            "recency" => Some(SortMode::Recency),
            "asc" => Some(SortMode::Ascending),
            "desc" => Some(SortMode::Descending),
            _ => None,
        }
    }
}

/// A filter value: upstream accepts strings and numbers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    Text(String),
    Number(i64),
}

impl fmt::Display for FilterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterValue::Text(s) => f.write_str(s),
            FilterValue::Number(n) => write!(f, "{n}"),
        }
    }
}

/// One page worth of query parameters.
///
/// Immutable once constructed; a harvest run derives the spec for each
/// subsequent page via [`QuerySpec::with_page`]. Filters use a
/// `BTreeMap` so the canonical encoding (and thus the cache key) is
/// stable across runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuerySpec {
    /// Search keyword. Must be non-empty.
    pub keyword: String,

    /// 1-based page number.
    pub page: u32,

    /// Optional upstream filters (name → value).
    #[serde(default)]
    pub filters: BTreeMap<String, FilterValue>,

    /// Result ordering.
    #[serde(default)]
    pub sort: SortMode,
}

impl QuerySpec {
    pub fn new(keyword: impl Into<String>, page: u32) -> Self {
        Self {
            keyword: keyword.into(),
            page,
            filters: BTreeMap::new(),
            sort: SortMode::default(),
        }
    }

    /// Same query aimed at a different page.
    pub fn with_page(&self, page: u32) -> Self {
        Self {
            page,
            ..self.clone()
        }
    }

    /// Reject specs the request builder cannot turn into a request.
    pub fn validate(&self) -> Result<()> {
        if self.keyword.trim().is_empty() {
            return Err(AppError::invalid_spec("keyword is empty"));
        }
        if self.page < 1 {
            return Err(AppError::invalid_spec("page must be >= 1"));
        }
        Ok(())
    }

    /// Canonical string encoding of this spec.
    ///
    /// Stable across runs; the cache key is a digest of this string.
    pub fn canonical(&self) -> String {
        let mut parts = vec![
            format!("keyword={}", self.keyword),
            format!("page={}", self.page),
            format!("sort={}", self.sort.as_param()),
        ];
        for (name, value) in &self.filters {
            parts.push(format!("filter.{name}={value}"));
        }
        parts.join("&")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_redacts_credential() {
        let cred = Credential::new("super-secret-token");
        let rendered = format!("{cred:?}");
        assert!(!rendered.contains("super-secret-token"));
        assert_eq!(rendered, "Credential(***)");
    }

    #[test]
    fn bearer_header_value() {
        let cred = Credential::new("abc123");
        assert_eq!(cred.bearer(), "Bearer abc123");
    }

    #[test]
    fn validate_rejects_blank_keyword() {
        assert!(QuerySpec::new("  ", 1).validate().is_err());
        assert!(QuerySpec::new("shoes", 1).validate().is_ok());
    }

    #[test]
    fn validate_rejects_page_zero() {
        assert!(QuerySpec::new("shoes", 0).validate().is_err());
    }

    #[test]
    fn canonical_is_stable_under_filter_order() {
        let mut a = QuerySpec::new("shoes", 2);
        a.filters
            .insert("brand".into(), FilterValue::Text("acme".into()));
        a.filters.insert("min_price".into(), FilterValue::Number(10));

        let mut b = QuerySpec::new("shoes", 2);
        b.filters.insert("min_price".into(), FilterValue::Number(10));
        b.filters
            .insert("brand".into(), FilterValue::Text("acme".into()));

        assert_eq!(a.canonical(), b.canonical());
    }

    #[test]
    fn with_page_keeps_everything_else() {
        let mut spec = QuerySpec::new("shoes", 1);
        spec.sort = SortMode::Recency;
        let next = spec.with_page(2);
        assert_eq!(next.page, 2);
        assert_eq!(next.keyword, "shoes");
        assert_eq!(next.sort, SortMode::Recency);
    }
}
