// src/models/record.rs

//! Record kinds, field schemas, and the normalized record type.
//!
//! Each record kind declares which fields upstream must provide and
//! which are optional with a documented default. The normalizer
//! projects raw payload items through these schemas so that downstream
//! consumers never see a missing field.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The kind of record a harvest run extracts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    SearchResult,
    Product,
    Article,
    Listing,
}

impl RecordKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::SearchResult => "search_result",
            RecordKind::Product => "product",
            RecordKind::Article => "article",
            RecordKind::Listing => "listing",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "search_result" => Some(RecordKind::SearchResult),
            "product" => Some(RecordKind::Product),
            "article" => Some(RecordKind::Article),
            "listing" => Some(RecordKind::Listing),
            _ => None,
        }
    }

    /// Field schema for this kind.
    pub fn schema(&self) -> &'static [FieldSpec] {
        match self {
            RecordKind::SearchResult => SEARCH_RESULT_FIELDS,
            RecordKind::Product => PRODUCT_FIELDS,
            RecordKind::Article => ARTICLE_FIELDS,
            RecordKind::Listing => LISTING_FIELDS,
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Default substituted for an absent optional field.
#[derive(Debug, Clone, Copy)]
pub enum FieldDefault {
    Text(&'static str),
    Int(i64),
    Bool(bool),
    Null,
}

impl FieldDefault {
    pub fn to_value(self) -> Value {
        match self {
            FieldDefault::Text(s) => Value::String(s.to_string()),
            FieldDefault::Int(n) => Value::from(n),
            FieldDefault::Bool(b) => Value::Bool(b),
            FieldDefault::Null => Value::Null,
        }
    }
}

/// One field in a record kind's schema.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub required: bool,
    /// Default for optional fields. Ignored for required ones.
    pub default: FieldDefault,
}

const fn required(name: &'static str) -> FieldSpec {
    FieldSpec {
        name,
        required: true,
        default: FieldDefault::Null,
    }
}

const fn optional(name: &'static str, default: FieldDefault) -> FieldSpec {
    FieldSpec {
        name,
        required: false,
        default,
    }
}

static SEARCH_RESULT_FIELDS: &[FieldSpec] = &[
    required("title"),
    required("link"),
    optional("description", FieldDefault::Text("")),
    optional("position", FieldDefault::Int(0)),
];

static PRODUCT_FIELDS: &[FieldSpec] = &[
    required("title"),
    required("link"),
    required("price"),
    optional("brand", FieldDefault::Text("")),
    optional("image", FieldDefault::Text("")),
    optional("in_stock", FieldDefault::Bool(true)),
    optional("review_count", FieldDefault::Int(0)),
];

static ARTICLE_FIELDS: &[FieldSpec] = &[
    required("title"),
    required("link"),
    optional("description", FieldDefault::Text("")),
    optional("published_at", FieldDefault::Text("")),
    optional("source", FieldDefault::Text("")),
];

static LISTING_FIELDS: &[FieldSpec] = &[
    required("title"),
    required("link"),
    required("price"),
    optional("location", FieldDefault::Text("")),
    optional("seller", FieldDefault::Text("")),
    optional("posted_at", FieldDefault::Text("")),
];

/// A schema-conformant extracted item.
///
/// Every field named by the kind's schema is present: required fields
/// straight from the payload, optional fields defaulted when absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedRecord {
    pub kind: RecordKind,
    pub fields: BTreeMap<String, Value>,
}

impl NormalizedRecord {
    /// Look up a field by name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Field as text, if it is a string.
    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(Value::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_kind_requires_title_and_link() {
        for kind in [
            RecordKind::SearchResult,
            RecordKind::Product,
            RecordKind::Article,
            RecordKind::Listing,
        ] {
            let names: Vec<_> = kind
                .schema()
                .iter()
                .filter(|f| f.required)
                .map(|f| f.name)
                .collect();
            assert!(names.contains(&"title"), "{kind} missing title");
            assert!(names.contains(&"link"), "{kind} missing link");
        }
    }

    #[test]
    fn kind_name_round_trip() {
        for kind in [
            RecordKind::SearchResult,
            RecordKind::Product,
            RecordKind::Article,
            RecordKind::Listing,
        ] {
            assert_eq!(RecordKind::from_str(kind.as_str()), Some(kind));
        }
        assert_eq!(RecordKind::from_str("unknown"), None);
    }

    #[test]
    fn defaults_materialize_as_json() {
        assert_eq!(FieldDefault::Text("").to_value(), Value::String(String::new()));
        assert_eq!(FieldDefault::Int(0).to_value(), Value::from(0));
        assert_eq!(FieldDefault::Bool(true).to_value(), Value::Bool(true));
        assert_eq!(FieldDefault::Null.to_value(), Value::Null);
    }
}
