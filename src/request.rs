//! Inbound request context.
//!
//! The facade never reads ambient request state. Whatever the surrounding web handler
//! knows about the current request (method, query/form parameters, raw body) is passed
//! in explicitly as a [`RequestContext`].

use reqwest::Method;
use std::collections::HashMap;

/// Parameter carrying comma separated app request ids after a request dialog.
pub const REQUEST_IDS_PARAM: &str = "request_ids";

/// Read-only snapshot of the inbound request.
#[derive(Debug, Clone)]
pub struct RequestContext {
    method: Method,
    params: HashMap<String, String>,
    body: Option<String>,
}

impl Default for RequestContext {
    fn default() -> Self {
        Self {
            method: Method::GET,
            params: HashMap::new(),
            body: None,
        }
    }
}

impl RequestContext {
    pub fn new(method: Method) -> Self {
        Self {
            method,
            ..Default::default()
        }
    }

    /// A GET request with parameters decoded from a raw query string.
    pub fn from_query(query: &str) -> Self {
        Self::default().with_query(query)
    }

    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    /// Merge parameters decoded from a urlencoded string. Later values win.
    pub fn with_query(mut self, query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        for (name, value) in url::form_urlencoded::parse(query.as_bytes()) {
            self.params.insert(name.into_owned(), value.into_owned());
        }
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn body(&self) -> Option<&str> {
        self.body.as_deref()
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    /// First non-empty value among several spellings of the same parameter.
    pub fn param_any(&self, names: &[&str]) -> Option<&str> {
        names
            .iter()
            .filter_map(|name| self.param(name))
            .find(|value| !value.is_empty())
    }

    /// Raw `request_ids` value, `None` when absent or empty.
    pub fn request_ids_raw(&self) -> Option<&str> {
        self.param(REQUEST_IDS_PARAM).filter(|ids| !ids.is_empty())
    }

    /// Individual request ids; empty segments are dropped.
    pub fn request_ids(&self) -> Vec<&str> {
        self.request_ids_raw()
            .map(|ids| {
                ids.split(',')
                    .map(str::trim)
                    .filter(|id| !id.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }
}
