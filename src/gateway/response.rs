//! Typed results for gateway operations and the rules that normalize raw responses
//! into them.

use crate::value::{id_string, is_blank, string_or_number};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use tracing::warn;

/// Outcome of a call whose expected payload may legitimately be missing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fetched<T> {
    Present(T),
    Absent,
}

impl<T> Fetched<T> {
    pub fn from_option(value: Option<T>) -> Self {
        match value {
            Some(v) => Fetched::Present(v),
            None => Fetched::Absent,
        }
    }

    pub fn into_option(self) -> Option<T> {
        match self {
            Fetched::Present(v) => Some(v),
            Fetched::Absent => None,
        }
    }

    pub fn is_present(&self) -> bool {
        matches!(self, Fetched::Present(_))
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Fetched<U> {
        match self {
            Fetched::Present(v) => Fetched::Present(f(v)),
            Fetched::Absent => Fetched::Absent,
        }
    }
}

/// Profile fields of the current user.
pub type UserProfile = Map<String, Value>;

/// One row of a legacy query result.
pub type QueryRow = Map<String, Value>;

/// Friend record as returned by the graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Friend {
    #[serde(with = "string_or_number")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    /// Any further fields the graph returned
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Friend {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            extra: Map::new(),
        }
    }
}

/// Friends either as full records or as bare ids.
#[derive(Debug, Clone, PartialEq)]
pub enum FriendList {
    Records(Vec<Friend>),
    Ids(Vec<String>),
}

impl FriendList {
    pub fn len(&self) -> usize {
        match self {
            FriendList::Records(records) => records.len(),
            FriendList::Ids(ids) => ids.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Token exchange response fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenGrant {
    pub access_token: String,
    /// Lifetime in seconds, when the response carried one
    pub expires: Option<u64>,
    /// Every field of the response, including `access_token`
    pub fields: HashMap<String, String>,
}

/// Extended user token in the shape the caller asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtendedAccessToken {
    Token(String),
    Grant(TokenGrant),
}

impl ExtendedAccessToken {
    pub fn access_token(&self) -> &str {
        match self {
            ExtendedAccessToken::Token(token) => token,
            ExtendedAccessToken::Grant(grant) => &grant.access_token,
        }
    }
}

/// Result of subscribe/unsubscribe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubscriptionAck {
    /// Empty or literal `null` body
    Confirmed,
    /// Anything else, passed through untouched
    Raw(String),
}

/// Result of sending a notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationOutcome {
    Sent,
    /// Body mentioning an error, verbatim
    Rejected(String),
}

impl NotificationOutcome {
    pub fn is_sent(&self) -> bool {
        matches!(self, NotificationOutcome::Sent)
    }
}

/// Fields of a subscription request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionRequest {
    pub object: String,
    pub fields: String,
    pub callback_url: String,
    pub verify_token: String,
}

impl SubscriptionRequest {
    pub(crate) fn form_params(&self) -> Vec<(String, String)> {
        vec![
            ("object".to_string(), self.object.clone()),
            ("fields".to_string(), self.fields.clone()),
            ("callback_url".to_string(), self.callback_url.clone()),
            ("verify_token".to_string(), self.verify_token.clone()),
        ]
    }
}

/// Real-time update payload posted by the platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionUpdate {
    pub object: String,
    #[serde(default)]
    pub entry: Vec<UpdateEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateEntry {
    #[serde(default)]
    pub uid: Option<Value>,
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub time: Option<i64>,
    #[serde(default)]
    pub changed_fields: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

pub(crate) fn profile_from(response: Value) -> UserProfile {
    match response {
        Value::Object(map) => map,
        other => {
            warn!(response = %other, "Profile response is not a mapping");
            Map::new()
        }
    }
}

/// Permission names from `{data: [{perm: 1, ...}]}` or `{data: [{permission, status}]}`.
pub(crate) fn permission_names(response: &Value) -> Vec<String> {
    let entries = match response.get("data").and_then(Value::as_array) {
        Some(entries) => entries,
        None => return Vec::new(),
    };
    let first = match entries.first().and_then(Value::as_object) {
        Some(first) => first,
        None => return Vec::new(),
    };

    if first.contains_key("permission") {
        entries
            .iter()
            .filter_map(|entry| {
                let name = entry.get("permission")?.as_str()?;
                let granted = entry
                    .get("status")
                    .and_then(Value::as_str)
                    .map_or(true, |status| status == "granted");
                granted.then(|| name.to_string())
            })
            .collect()
    } else {
        first.keys().cloned().collect()
    }
}

pub(crate) fn friends_from(response: &Value) -> Vec<Friend> {
    let entries = match response.get("data").and_then(Value::as_array) {
        Some(entries) if !entries.is_empty() => entries,
        _ => return Vec::new(),
    };

    entries
        .iter()
        .filter_map(|entry| match Friend::deserialize(entry) {
            Ok(friend) => Some(friend),
            Err(e) => {
                warn!(error = %e, "Skipping malformed friend entry");
                None
            }
        })
        .collect()
}

pub(crate) fn rows_from(response: Value) -> Vec<QueryRow> {
    match response {
        Value::Array(rows) => rows
            .into_iter()
            .filter_map(|row| match row {
                Value::Object(map) => Some(map),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}

/// Id of a created object, absent when the response has none.
pub(crate) fn created_id(response: &Value) -> Fetched<String> {
    Fetched::from_option(
        response
            .get("id")
            .filter(|id| !is_blank(id))
            .and_then(id_string),
    )
}

/// Token response fields from a urlencoded or JSON body.
pub(crate) fn token_fields(body: &str) -> HashMap<String, String> {
    let trimmed = body.trim();
    if trimmed.starts_with('{') {
        if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(trimmed) {
            return map
                .into_iter()
                .filter_map(|(key, value)| match value {
                    Value::String(s) => Some((key, s)),
                    Value::Number(n) => Some((key, n.to_string())),
                    Value::Bool(b) => Some((key, b.to_string())),
                    _ => None,
                })
                .collect();
        }
        return HashMap::new();
    }

    url::form_urlencoded::parse(trimmed.as_bytes())
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}

pub(crate) fn token_grant(body: &str) -> Fetched<TokenGrant> {
    let fields = token_fields(body);
    let access_token = match fields.get("access_token") {
        Some(token) if !token.is_empty() => token.clone(),
        _ => return Fetched::Absent,
    };
    let expires = fields
        .get("expires")
        .or_else(|| fields.get("expires_in"))
        .and_then(|v| v.parse().ok());

    Fetched::Present(TokenGrant {
        access_token,
        expires,
        fields,
    })
}

pub(crate) fn subscription_ack(body: String) -> SubscriptionAck {
    if body.is_empty() || body == "null" {
        SubscriptionAck::Confirmed
    } else {
        SubscriptionAck::Raw(body)
    }
}

pub(crate) fn subscription_list(body: &str) -> Fetched<Vec<Value>> {
    if body.trim().is_empty() {
        return Fetched::Absent;
    }
    match serde_json::from_str::<Value>(body) {
        Ok(Value::Array(items)) => Fetched::Present(items),
        Ok(Value::Object(mut map)) => match map.remove("data") {
            Some(Value::Array(items)) => Fetched::Present(items),
            _ => Fetched::Absent,
        },
        _ => Fetched::Absent,
    }
}

pub(crate) fn notification_outcome(body: String) -> NotificationOutcome {
    if body.contains("error") {
        NotificationOutcome::Rejected(body)
    } else {
        NotificationOutcome::Sent
    }
}
