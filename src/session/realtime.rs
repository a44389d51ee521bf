//! Real-time update callback handling.

use crate::gateway::SubscriptionUpdate;
use crate::request::RequestContext;
use reqwest::Method;
use tracing::{debug, warn};

const MODE: [&str; 2] = ["hub.mode", "hub_mode"];
const VERIFY_TOKEN: [&str; 2] = ["hub.verify_token", "hub_verify_token"];
const CHALLENGE: [&str; 2] = ["hub.challenge", "hub_challenge"];

/// Challenge to echo when a GET carries `hub.mode=subscribe` and our verify token.
pub(super) fn challenge(request: &RequestContext, verify_token: &str) -> Option<String> {
    if request.method() != Method::GET {
        return None;
    }
    if request.param_any(&MODE) != Some("subscribe") {
        return None;
    }
    if request.param_any(&VERIFY_TOKEN) != Some(verify_token) {
        debug!("Subscription verification with unexpected token");
        return None;
    }
    request.param_any(&CHALLENGE).map(str::to_string)
}

pub(super) fn updates(request: &RequestContext) -> Option<SubscriptionUpdate> {
    if request.method() != Method::POST {
        return None;
    }
    let body = request.body()?;
    match serde_json::from_str(body) {
        Ok(update) => Some(update),
        Err(e) => {
            warn!(error = %e, "Ignoring malformed real-time update payload");
            None
        }
    }
}
