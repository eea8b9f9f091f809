// src/services/request.rs

//! Request builder service.
//!
//! Turns a validated [`QuerySpec`] plus [`Credential`] into a
//! fully-formed outbound request descriptor. Pure: no side effects.

use url::Url;

use crate::error::Result;
use crate::models::{Credential, QuerySpec};

/// A fully-formed outbound request, ready for the transport executor.
#[derive(Debug, Clone)]
pub struct RequestDescriptor {
    /// Target URL with all query parameters encoded.
    pub url: Url,
    /// Request headers, authorization included.
    pub headers: Vec<(String, String)>,
}

impl RequestDescriptor {
    /// Value of a named query parameter, if present.
    pub fn param(&self, name: &str) -> Option<String> {
        self.url
            .query_pairs()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.into_owned())
    }

    /// Value of a named header, if present.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Build a request descriptor for one page fetch.
///
/// Fails with `InvalidSpec` when the keyword is empty or the page is
/// below 1; the endpoint must be an absolute URL.
pub fn build(spec: &QuerySpec, credential: &Credential, endpoint: &str) -> Result<RequestDescriptor> {
    spec.validate()?;

    let mut url = Url::parse(endpoint)?;
    {
        let mut pairs = url.query_pairs_mut();
        pairs.append_pair("query", &spec.keyword);
        pairs.append_pair("page", &spec.page.to_string());
        pairs.append_pair("sort", spec.sort.as_param());
        for (name, value) in &spec.filters {
            pairs.append_pair(name, &value.to_string());
        }
    }

    let headers = vec![
        ("Authorization".to_string(), credential.bearer()),
        ("Accept".to_string(), "application/json".to_string()),
    ];

    Ok(RequestDescriptor { url, headers })
}
