//! Shared test utilities for integration tests
//!
//! Provides an in-memory SDK handle with scripted responses and call recording, session
//! builders, and serialized access to process environment variables.

use async_trait::async_trait;
use graph_session::{
    ApiCall, AppConfig, GraphConfig, HandleError, LoginUrlParams, RequestContext, SdkHandle,
    Session, SignedRequest,
};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Global mutex to serialize environment variable access across all tests
static ENV_MUTEX: Mutex<()> = Mutex::new(());

pub const APP_ID: &str = "491661414218957";
pub const APP_SECRET: &str = "dd0470f1919cfe0e1a52e81c6964bf16";

pub fn app_config() -> AppConfig {
    AppConfig::new(APP_ID, APP_SECRET, "http://localhost").with_perms("email")
}

/// Scripted SDK handle.
///
/// Graph calls are keyed by `"METHOD /path"`, legacy queries by the query text.
/// Unscripted calls answer `null`.
#[derive(Default)]
pub struct MockHandle {
    user: u64,
    signed_request: Option<Value>,
    login_url: Option<String>,
    access_token: Option<String>,
    responses: HashMap<String, Result<Value, HandleError>>,
    methods: HashMap<String, Value>,
    fields: HashMap<String, Value>,
    calls: Mutex<Vec<ApiCall>>,
    login_params: Mutex<Vec<LoginUrlParams>>,
    user_reads: AtomicUsize,
}

impl MockHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(mut self, user: u64) -> Self {
        self.user = user;
        self
    }

    pub fn with_signed_request(mut self, payload: Value) -> Self {
        self.signed_request = Some(payload);
        self
    }

    pub fn with_login_url(mut self, url: &str) -> Self {
        self.login_url = Some(url.to_string());
        self
    }

    pub fn with_access_token(mut self, token: &str) -> Self {
        self.access_token = Some(token.to_string());
        self
    }

    pub fn respond(mut self, key: &str, response: Value) -> Self {
        self.responses.insert(key.to_string(), Ok(response));
        self
    }

    pub fn fail(mut self, key: &str, error: HandleError) -> Self {
        self.responses.insert(key.to_string(), Err(error));
        self
    }

    pub fn with_method(mut self, name: &str, result: Value) -> Self {
        self.methods.insert(name.to_string(), result);
        self
    }

    pub fn with_field(mut self, name: &str, value: Value) -> Self {
        self.fields.insert(name.to_string(), value);
        self
    }

    pub fn into_arc(self) -> Arc<MockHandle> {
        Arc::new(self)
    }

    pub fn calls(&self) -> Vec<ApiCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of recorded calls with the given key.
    pub fn call_count(&self, key: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|call| call_key(call) == key)
            .count()
    }

    pub fn login_params(&self) -> Vec<LoginUrlParams> {
        self.login_params.lock().unwrap().clone()
    }

    pub fn user_reads(&self) -> usize {
        self.user_reads.load(Ordering::SeqCst)
    }
}

fn call_key(call: &ApiCall) -> String {
    match call {
        ApiCall::Graph { .. } => call.describe(),
        ApiCall::Legacy { params } => params
            .get("query")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
    }
}

#[async_trait]
impl SdkHandle for MockHandle {
    fn user(&self) -> u64 {
        self.user_reads.fetch_add(1, Ordering::SeqCst);
        self.user
    }

    fn signed_request(&self) -> Option<SignedRequest> {
        self.signed_request.clone().map(SignedRequest::from_value)
    }

    fn login_url(&self, params: &LoginUrlParams) -> String {
        self.login_params.lock().unwrap().push(params.clone());
        self.login_url.clone().unwrap_or_else(|| {
            format!(
                "https://www.facebook.com/dialog/oauth?scope={}&redirect_uri={}",
                params.scope, params.redirect_uri
            )
        })
    }

    fn access_token(&self) -> Option<String> {
        self.access_token.clone()
    }

    async fn api(&self, call: ApiCall) -> Result<Value, HandleError> {
        let key = call_key(&call);
        self.calls.lock().unwrap().push(call);
        self.responses
            .get(&key)
            .cloned()
            .unwrap_or(Ok(Value::Null))
    }

    async fn call(&self, name: &str, _args: &[Value]) -> Option<Result<Value, HandleError>> {
        self.methods.get(name).cloned().map(Ok)
    }

    fn field(&self, name: &str) -> Option<Value> {
        self.fields.get(name).cloned()
    }
}

/// Session over a mock handle, pointed at an unroutable graph endpoint.
pub fn session_for(handle: &Arc<MockHandle>) -> Session {
    session_with_request(handle, RequestContext::default())
}

pub fn session_with_request(handle: &Arc<MockHandle>, request: RequestContext) -> Session {
    Session::with_graph(
        handle.clone(),
        &app_config(),
        &GraphConfig::with_base_url("http://127.0.0.1:9"),
        request,
    )
    .unwrap()
}

/// Session over a mock handle whose raw calls go to `base_url`.
pub fn session_against(handle: &Arc<MockHandle>, base_url: &str) -> Session {
    Session::with_graph(
        handle.clone(),
        &app_config(),
        &GraphConfig::with_base_url(base_url),
        RequestContext::default(),
    )
    .unwrap()
}

/// Run `f` with environment variables set, restoring the previous values afterwards.
pub fn with_env<F, R>(vars: &[(&str, Option<&str>)], f: F) -> R
where
    F: FnOnce() -> R,
{
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    let saved: Vec<(String, Option<String>)> = vars
        .iter()
        .map(|(name, _)| (name.to_string(), std::env::var(name).ok()))
        .collect();

    for (name, value) in vars {
        match value {
            Some(value) => std::env::set_var(name, value),
            None => std::env::remove_var(name),
        }
    }

    let result = f();

    for (name, value) in saved {
        match value {
            Some(value) => std::env::set_var(&name, value),
            None => std::env::remove_var(&name),
        }
    }

    result
}
