//! Raw graph HTTP primitive.
//!
//! Token exchange, subscription management and notifications bypass the handle and go
//! straight to the graph endpoints through [`GraphTransport::fetch`].

use crate::config::GraphConfig;
use crate::error::SessionError;
use reqwest::{Client, Method};
use std::time::Duration;
use tracing::debug;

pub const GRAPH_HTTP_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
pub const GRAPH_HTTP_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

const USER_AGENT: &str = concat!("graph-session/", env!("CARGO_PKG_VERSION"));

fn map_http_error(error: reqwest::Error) -> SessionError {
    let message = if error.is_timeout() {
        format!("Request timeout: {}", error)
    } else if error.is_connect() {
        format!("Connection error: {}", error)
    } else {
        format!("HTTP error: {}", error)
    };
    SessionError::SdkError {
        message,
        source: None,
    }
}

fn build_graph_http_client() -> Result<Client, SessionError> {
    Client::builder()
        .connect_timeout(GRAPH_HTTP_CONNECT_TIMEOUT)
        .timeout(GRAPH_HTTP_REQUEST_TIMEOUT)
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| SessionError::sdk(format!("Failed to create HTTP client: {}", e)))
}

/// Form parameters for a raw call, in insertion order.
pub type FormParams = Vec<(String, String)>;

/// HTTP client bound to a graph base URL.
#[derive(Debug, Clone)]
pub struct GraphTransport {
    client: Client,
    base_url: String,
}

impl GraphTransport {
    pub fn new(config: &GraphConfig) -> Result<Self, SessionError> {
        config.validate().map_err(SessionError::ConfigError)?;
        Ok(Self {
            client: build_graph_http_client()?,
            base_url: config.base().to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL for a graph path such as `oauth/access_token`.
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Perform one raw call and return the response body.
    ///
    /// Supplying `params` (even an empty set) sends a form-encoded POST, otherwise a GET.
    /// `method_override` replaces the verb last. The body is returned whatever the status
    /// code; only transport failures are errors.
    pub async fn fetch(
        &self,
        url: &str,
        params: Option<&FormParams>,
        method_override: Option<Method>,
    ) -> Result<String, SessionError> {
        let default_method = if params.is_some() {
            Method::POST
        } else {
            Method::GET
        };
        let method = method_override.unwrap_or(default_method);

        let mut request = self.client.request(method.clone(), url);
        if let Some(params) = params {
            request = request.form(params);
        }

        let response = request.send().await.map_err(map_http_error)?;
        let status = response.status();
        let body = response.text().await.map_err(map_http_error)?;

        debug!(
            method = %method,
            url = %redact_token(url),
            status = status.as_u16(),
            body_len = body.len(),
            "Raw graph call completed"
        );

        Ok(body)
    }
}

/// Strip access tokens from URLs before they reach the logs.
fn redact_token(url: &str) -> String {
    match url.find("access_token=") {
        Some(start) => {
            let value_start = start + "access_token=".len();
            let value_end = url[value_start..]
                .find('&')
                .map(|offset| value_start + offset)
                .unwrap_or(url.len());
            format!("{}***{}", &url[..value_start], &url[value_end..])
        }
        None => url.to_string(),
    }
}
