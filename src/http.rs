use reqwest::{header::HeaderMap, StatusCode};

use crate::{
    errors::{APIError, Error},
    REQUEST_ID_HEADER,
};

/// Structured header list with validation.
#[derive(Clone, Debug, Default)]
pub struct HeaderList(Vec<HeaderEntry>);

impl HeaderList {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Add a header entry.
    ///
    /// # Panics
    /// Panics if the header key or value is empty or contains only whitespace.
    pub fn push(&mut self, entry: HeaderEntry) {
        assert!(
            entry.is_valid(),
            "Invalid header: key and value must be non-empty (got key={:?}, value={:?})",
            entry.key,
            entry.value
        );
        self.0.push(entry);
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.push(HeaderEntry::new(key.into(), value.into()));
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = &HeaderEntry> {
        self.0.iter()
    }
}

#[derive(Clone, Debug)]
pub struct HeaderEntry {
    pub key: String,
    pub value: String,
}

impl HeaderEntry {
    pub fn new(key: String, value: String) -> Self {
        Self { key, value }
    }

    pub fn is_valid(&self) -> bool {
        !(self.key.trim().is_empty() || self.value.trim().is_empty())
    }
}

pub(crate) fn request_id_from_headers(headers: &HeaderMap) -> Option<String> {
    headers
        .get(REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
}

/// Build an [`APIError`] from a non-2xx response.
///
/// Unsplash reports failures as `{"errors": ["..."]}`; anything else falls
/// back to the raw body or the canonical status text.
pub(crate) fn parse_api_error_parts(status: StatusCode, headers: &HeaderMap, body: String) -> Error {
    let request_id = request_id_from_headers(headers);
    let status_code = status.as_u16();
    let status_text = status
        .canonical_reason()
        .unwrap_or("request failed")
        .to_string();

    if body.trim().is_empty() {
        return APIError {
            status: status_code,
            message: status_text,
            request_id,
            errors: Vec::new(),
            raw_body: None,
        }
        .into();
    }

    if let Ok(value) = serde_json::from_str::<serde_json::Value>(&body) {
        let errors: Vec<String> = value
            .get("errors")
            .and_then(|v| v.as_array())
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| item.as_str())
                    .map(|s| s.to_string())
                    .collect()
            })
            .unwrap_or_default();
        if !errors.is_empty() {
            return APIError {
                status: status_code,
                message: errors.join("; "),
                request_id,
                errors,
                raw_body: Some(body),
            }
            .into();
        }

        if let Some(message) = value
            .get("error")
            .or_else(|| value.get("message"))
            .and_then(|v| v.as_str())
        {
            return APIError {
                status: status_code,
                message: message.to_string(),
                request_id,
                errors: Vec::new(),
                raw_body: Some(body.clone()),
            }
            .into();
        }
    }

    APIError {
        status: status_code,
        message: body.trim().to_string(),
        request_id,
        errors: Vec::new(),
        raw_body: Some(body),
    }
    .into()
}
