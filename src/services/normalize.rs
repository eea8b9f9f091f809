// src/services/normalize.rs

//! Response normalizer service.
//!
//! Decodes raw response bytes to text, parses the JSON payload, and
//! projects each item through the record kind's field schema. A record
//! missing a required field is dropped and counted; the rest of the
//! batch survives. JSON `null` counts as absent.
//!
//! Upstream bodies are UTF-8 in the common case, but legacy endpoints
//! still serve EUC-KR, sometimes mislabeled. Decoding trusts the
//! declared charset first and falls back to sniffing (strict UTF-8,
//! then EUC-KR) when the declared label decodes lossily.

use std::collections::BTreeMap;

use encoding_rs::{EUC_KR, Encoding};
use serde_json::Value;

use crate::error::{AppError, Result};
use crate::events::{EventSink, HarvestEvent};
use crate::models::{NormalizedPage, NormalizedRecord, RecordKind};

/// Decode body bytes using the declared charset, with fallback sniffing.
pub fn decode_body(body: &[u8], declared: Option<&str>) -> Result<String> {
    if let Some(label) = declared {
        if let Some(encoding) = Encoding::for_label(label.as_bytes()) {
            let (text, _, had_errors) = encoding.decode(body);
            if !had_errors {
                return Ok(text.into_owned());
            }
            log::debug!("declared charset '{label}' decoded lossily, sniffing");
        }
    }

    if let Ok(text) = std::str::from_utf8(body) {
        return Ok(text.to_string());
    }

    let (text, _, had_errors) = EUC_KR.decode(body);
    if !had_errors {
        return Ok(text.into_owned());
    }

    Err(AppError::encoding(
        "body is neither valid UTF-8 nor EUC-KR",
    ))
}

/// Normalize one page of raw response bytes.
pub fn normalize(
    body: &[u8],
    charset: Option<&str>,
    kind: RecordKind,
    sink: &dyn EventSink,
) -> Result<NormalizedPage> {
    let text = decode_body(body, charset)?;
    let payload: Value = serde_json::from_str(&text)?;

    let (items, explicit_next) = split_payload(&payload);

    let mut page = NormalizedPage::default();
    for item in items {
        match project(item, kind) {
            Ok(record) => page.records.push(record),
            Err(AppError::MalformedRecord { field, .. }) => {
                page.dropped += 1;
                sink.emit(&HarvestEvent::DroppedRecord { kind, field });
            }
            Err(e) => return Err(e),
        }
    }

    // An explicit flag wins; otherwise a page that carried items is
    // assumed to have a successor and an empty page terminates.
    page.has_next = explicit_next.unwrap_or(!page.records.is_empty() || page.dropped > 0);

    Ok(page)
}

/// Pull the item list and the optional next-page flag out of the payload.
///
/// Accepts the `{"items": [...]}` envelope (or `"records"`) as well as
/// a bare top-level array.
fn split_payload(payload: &Value) -> (&[Value], Option<bool>) {
    match payload {
        Value::Array(items) => (items.as_slice(), None),
        Value::Object(map) => {
            let items = map
                .get("items")
                .or_else(|| map.get("records"))
                .and_then(Value::as_array)
                .map(Vec::as_slice)
                .unwrap_or(&[]);
            let explicit_next = map
                .get("has_next")
                .or_else(|| map.get("hasNext"))
                .and_then(Value::as_bool);
            (items, explicit_next)
        }
        _ => (&[], None),
    }
}

/// Project one payload item through the kind's schema.
fn project(item: &Value, kind: RecordKind) -> Result<NormalizedRecord> {
    let object = item
        .as_object()
        .ok_or_else(|| AppError::malformed_record(kind.as_str(), "<not an object>"))?;

    let mut fields = BTreeMap::new();
    for spec in kind.schema() {
        match object.get(spec.name) {
            Some(value) if !value.is_null() => {
                fields.insert(spec.name.to_string(), value.clone());
            }
            _ if spec.required => {
                return Err(AppError::malformed_record(kind.as_str(), spec.name));
            }
            _ => {
                fields.insert(spec.name.to_string(), spec.default.to_value());
            }
        }
    }

    Ok(NormalizedRecord { kind, fields })
}
