//! Graph Session: a session and capability facade over a social graph SDK
//!
//! Wraps an injected SDK handle and turns the current request's signed request and user
//! into typed session facts (identity, login URL, page-tab context), and delegates graph
//! calls, token exchange, real-time subscriptions and notifications through a single
//! gateway with consistent result normalization.

pub mod config;
pub mod error;
pub mod gateway;
pub mod handle;
pub mod logging;
pub mod request;
pub mod session;
pub mod signed_request;
pub mod transport;
pub mod value;

pub use config::{AppConfig, GraphConfig, SessionConfig};
pub use error::{HandleError, SessionError};
pub use handle::{ApiCall, LoginUrlParams, SdkHandle};
pub use request::RequestContext;
pub use session::Session;
pub use signed_request::SignedRequest;
