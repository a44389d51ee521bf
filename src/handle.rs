//! SDK handle abstraction.
//!
//! The facade wraps an injected SDK object it does not own. Anything that can report
//! the current user, hand over the decoded signed request, build a login URL and run
//! graph calls can back a [`Session`](crate::session::Session).

use crate::error::HandleError;
use crate::signed_request::SignedRequest;
use async_trait::async_trait;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Parameters handed to the handle's login URL builder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginUrlParams {
    /// Comma separated permission scope, empty when none configured
    pub scope: String,
    /// Where the platform sends the user back after login
    pub redirect_uri: String,
}

/// One call through the handle's `api` entry point.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiCall {
    /// REST style graph call, e.g. `GET /me/friends`
    Graph {
        path: String,
        method: Method,
        params: Map<String, Value>,
    },
    /// Legacy parameter-array call, e.g. `{method: "fql.query", query: "..."}`
    Legacy { params: Map<String, Value> },
}

impl ApiCall {
    pub fn get(path: impl Into<String>) -> Self {
        ApiCall::Graph {
            path: path.into(),
            method: Method::GET,
            params: Map::new(),
        }
    }

    pub fn post(path: impl Into<String>, params: Map<String, Value>) -> Self {
        ApiCall::Graph {
            path: path.into(),
            method: Method::POST,
            params,
        }
    }

    pub fn delete(path: impl Into<String>) -> Self {
        ApiCall::Graph {
            path: path.into(),
            method: Method::DELETE,
            params: Map::new(),
        }
    }

    /// Legacy query call carrying an opaque query string.
    pub fn query(query: impl Into<String>) -> Self {
        let mut params = Map::new();
        params.insert("method".to_string(), Value::String("fql.query".to_string()));
        params.insert("query".to_string(), Value::String(query.into()));
        ApiCall::Legacy { params }
    }

    /// Short label used in logs.
    pub fn describe(&self) -> String {
        match self {
            ApiCall::Graph { path, method, .. } => format!("{} {}", method, path),
            ApiCall::Legacy { params } => params
                .get("method")
                .and_then(Value::as_str)
                .unwrap_or("legacy")
                .to_string(),
        }
    }
}

/// Capability set the facade requires from the wrapped SDK.
#[async_trait]
pub trait SdkHandle: Send + Sync {
    /// Current user id, 0 when nobody is logged in.
    fn user(&self) -> u64;

    /// Decoded signed request of the current request, if any.
    fn signed_request(&self) -> Option<SignedRequest>;

    /// Build the platform login URL.
    fn login_url(&self, params: &LoginUrlParams) -> String;

    /// Current user access token, if the handle holds one.
    fn access_token(&self) -> Option<String>;

    /// Run a graph or legacy call. Responses may be a mapping, a string or a boolean.
    async fn api(&self, call: ApiCall) -> Result<Value, HandleError>;

    /// Invoke an additional named method the handle exposes.
    ///
    /// Returns `None` when the handle has no method of that name.
    async fn call(&self, _name: &str, _args: &[Value]) -> Option<Result<Value, HandleError>> {
        None
    }

    /// Read an additional named property of the handle.
    fn field(&self, _name: &str) -> Option<Value> {
        None
    }
}
