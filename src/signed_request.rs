//! Signed request snapshot.
//!
//! The handle decodes and verifies the platform's signed request; this type only reads
//! the embedding context out of the decoded payload.

use crate::value::{id_number, is_blank, is_truthy};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Decoded signed request payload, captured once per session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SignedRequest(Map<String, Value>);

impl SignedRequest {
    pub fn new(payload: Map<String, Value>) -> Self {
        Self(payload)
    }

    /// Build from any JSON value; non-object payloads yield an empty request.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(map) => Self(map),
            _ => Self::default(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    fn page_field(&self, field: &str) -> Option<&Value> {
        self.0.get("page")?.as_object()?.get(field)
    }

    /// Hosting page id, 0 outside a page tab.
    pub fn page_id(&self) -> u64 {
        self.page_field("id").and_then(id_number).unwrap_or(0)
    }

    /// Whether the viewer likes the hosting page.
    pub fn page_liked(&self) -> bool {
        self.page_field("liked").map_or(false, is_truthy)
    }

    /// Whether the viewer administers the hosting page.
    pub fn page_admin(&self) -> bool {
        self.page_field("admin").map_or(false, is_truthy)
    }

    /// `app_data` passed to the tab, `None` when absent or empty.
    pub fn app_data(&self) -> Option<&Value> {
        self.0.get("app_data").filter(|value| !is_blank(value))
    }
}

impl From<Map<String, Value>> for SignedRequest {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}
