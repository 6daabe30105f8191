//! Parameter decoding shared by the transports.
//!
//! The stream transport percent-decodes (`application/x-www-form-urlencoded`);
//! the datagram transport takes values verbatim. Both skip empty values.

use std::collections::HashMap;

use thiserror::Error;

use crate::model::UnknownMethod;

/// Why an incoming exchange or packet could not become a request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("empty request")]
    Empty,

    #[error("request is not valid UTF-8")]
    NotUtf8,

    #[error("missing request target in {line:?}")]
    MissingTarget { line: String },

    #[error(transparent)]
    Method(#[from] UnknownMethod),

    #[error("request body exceeds {limit} bytes")]
    BodyTooLarge { limit: usize },

    #[error("failed to read request body: {0}")]
    Body(String),
}

/// Merge `k=v&k=v` pairs into `params`, percent-decoding keys and values.
///
/// Later pairs overwrite earlier ones with the same key.
pub fn merge_form(input: &[u8], params: &mut HashMap<String, String>) {
    for (key, value) in url::form_urlencoded::parse(input) {
        if key.is_empty() || value.is_empty() {
            continue;
        }
        params.insert(key.into_owned(), value.into_owned());
    }
}

/// Merge `k=v&k=v` pairs into `params` without decoding.
///
/// Pairs missing `=` are dropped; `a=b=c` yields `a → "b=c"`.
pub fn merge_raw_query(query: &str, params: &mut HashMap<String, String>) {
    for pair in query.split('&') {
        let Some((key, value)) = pair.split_once('=') else {
            continue;
        };
        if key.is_empty() || value.is_empty() {
            continue;
        }
        params.insert(key.to_string(), value.to_string());
    }
}
