//! Session Facade
//!
//! Turns an injected SDK handle, the application configuration and the inbound request
//! into a small set of session facts: who is logged in, where to send them to log in,
//! and the page-tab context. Everything that needs the network is delegated to the
//! [`Gateway`].
//!
//! One session is built per inbound request and dropped afterwards. Caches (profile,
//! subscription URL) live on the instance and are filled at most once.

use crate::config::{AppConfig, AppCredentials, GraphConfig, SessionConfig};
use crate::error::SessionError;
use crate::gateway::{
    ExtendedAccessToken, Friend, FriendList, Gateway, NotificationOutcome, QueryRow,
    SubscriptionAck, SubscriptionRequest, SubscriptionUpdate, UserProfile,
};
use crate::handle::{LoginUrlParams, SdkHandle};
use crate::request::{RequestContext, REQUEST_IDS_PARAM};
use crate::signed_request::SignedRequest;
use crate::transport::GraphTransport;
use crate::value::is_blank;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, info, warn};

mod realtime;
mod redirect;
mod resolve;

pub use redirect::ClientRedirect;
pub use resolve::{LookupSource, RESOLUTION_ORDER};

/// Per-request facade over an SDK handle.
pub struct Session {
    handle: Arc<dyn SdkHandle>,
    transport: GraphTransport,
    app: AppCredentials,
    request: RequestContext,
    user_id: u64,
    signed_request: SignedRequest,
    login_url: String,
    user_profile: Option<UserProfile>,
    subscription_url: Option<String>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("app_id", &self.app.app_id)
            .field("user_id", &self.user_id)
            .field("login_url", &self.login_url)
            .field("profile_cached", &self.user_profile.is_some())
            .finish()
    }
}

impl Session {
    /// Build a session against the default graph endpoints.
    pub fn new(
        handle: Arc<dyn SdkHandle>,
        config: &AppConfig,
        request: RequestContext,
    ) -> Result<Self, SessionError> {
        Self::with_graph(handle, config, &GraphConfig::default(), request)
    }

    /// Build a session from a loaded [`SessionConfig`].
    pub fn from_config(
        handle: Arc<dyn SdkHandle>,
        config: &SessionConfig,
        request: RequestContext,
    ) -> Result<Self, SessionError> {
        Self::with_graph(handle, &config.app, &config.graph, request)
    }

    /// Build a session against explicit graph endpoint settings.
    ///
    /// The configuration is validated before the handle is touched.
    pub fn with_graph(
        handle: Arc<dyn SdkHandle>,
        config: &AppConfig,
        graph: &GraphConfig,
        request: RequestContext,
    ) -> Result<Self, SessionError> {
        let app = config.validate()?;
        let transport = GraphTransport::new(graph)?;

        let user_id = handle.user();
        let signed_request = handle.signed_request().unwrap_or_default();
        let login_url = handle.login_url(&login_url_params(&app, &request));

        info!(
            app_id = %app.app_id,
            logged_in = user_id != 0,
            page_tab = signed_request.page_id() != 0,
            "Session initialized"
        );

        Ok(Self {
            handle,
            transport,
            app,
            request,
            user_id,
            signed_request,
            login_url,
            user_profile: None,
            subscription_url: None,
        })
    }

    fn gateway(&self) -> Gateway<'_> {
        Gateway::new(self.handle.as_ref(), &self.transport, &self.app)
    }

    pub fn handle(&self) -> &Arc<dyn SdkHandle> {
        &self.handle
    }

    pub fn app(&self) -> &AppCredentials {
        &self.app
    }

    pub fn request(&self) -> &RequestContext {
        &self.request
    }

    pub fn is_logged_in(&self) -> bool {
        self.user_id != 0
    }

    /// Current user id, 0 when anonymous.
    pub fn id(&self) -> u64 {
        if self.is_logged_in() {
            self.user_id
        } else {
            0
        }
    }

    pub fn login_url(&self) -> &str {
        &self.login_url
    }

    pub fn signed_request(&self) -> &SignedRequest {
        &self.signed_request
    }

    /// Id of the page hosting the tab, 0 outside a page tab.
    pub fn tab_page_id(&self) -> u64 {
        self.signed_request.page_id()
    }

    /// `app_data` handed to the tab, `None` when absent or empty.
    pub fn tab_app_data(&self) -> Option<&Value> {
        self.signed_request.app_data()
    }

    pub fn is_tab_page_liked(&self) -> bool {
        self.signed_request.page_liked()
    }

    pub fn is_tab_page_admin(&self) -> bool {
        self.signed_request.page_admin()
    }

    /// Profile of the current user, fetched once and cached.
    pub async fn user_profile_data(&mut self) -> Result<&UserProfile, SessionError> {
        if self.user_profile.is_none() {
            let fetched = self.gateway().fetch_profile().await;
            match fetched {
                Ok(profile) => self.user_profile = Some(profile),
                Err(e) => {
                    self.user_profile = None;
                    warn!(error = %e, "User profile fetch failed");
                    return Err(profile_error(e));
                }
            }
        }
        Ok(&*self.user_profile.get_or_insert_with(UserProfile::new))
    }

    /// Drop the cached profile and fetch it again.
    pub async fn refresh_user_profile(&mut self) -> Result<&UserProfile, SessionError> {
        self.user_profile = None;
        self.user_profile_data().await
    }

    /// Permissions the user granted to the application.
    pub async fn given_permissions(&self) -> Result<Vec<String>, SessionError> {
        self.gateway().fetch_permissions().await
    }

    pub async fn get_friends(&self, ids_only: bool) -> Result<FriendList, SessionError> {
        self.gateway().fetch_friends(ids_only).await
    }

    pub async fn friends(&self) -> Result<Vec<Friend>, SessionError> {
        match self.get_friends(false).await? {
            FriendList::Records(records) => Ok(records),
            FriendList::Ids(_) => Ok(Vec::new()),
        }
    }

    pub async fn friend_ids(&self) -> Result<Vec<String>, SessionError> {
        match self.get_friends(true).await? {
            FriendList::Ids(ids) => Ok(ids),
            FriendList::Records(records) => Ok(records.into_iter().map(|f| f.id).collect()),
        }
    }

    /// Friends of the current user who also use this application.
    pub async fn app_user_friends(&self) -> Result<Vec<QueryRow>, SessionError> {
        self.run_query(&app_user_friends_query(false)).await
    }

    pub async fn app_user_friend_ids(&self) -> Result<Vec<String>, SessionError> {
        let rows = self.run_query(&app_user_friends_query(true)).await?;
        Ok(Gateway::uid_column(&rows))
    }

    /// Run an opaque legacy query.
    pub async fn run_query(&self, query: &str) -> Result<Vec<QueryRow>, SessionError> {
        self.gateway().run_query(query).await
    }

    /// Delete the app requests named in the inbound `request_ids` parameter and return
    /// the full ids that were deleted.
    pub async fn request_ids_after_delete(&self) -> Result<Vec<String>, SessionError> {
        if !self.is_logged_in() {
            return Err(SessionError::AuthError(
                "This action is only for logged in users".to_string(),
            ));
        }
        let ids = self.request.request_ids();
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        self.gateway().delete_requests(self.user_id, &ids).await
    }

    pub async fn application_access_token(&self) -> Result<Option<String>, SessionError> {
        Ok(self.gateway().application_access_token().await?.into_option())
    }

    pub async fn extended_access_token(
        &self,
        with_expire_time: bool,
    ) -> Result<Option<ExtendedAccessToken>, SessionError> {
        Ok(self
            .gateway()
            .extended_access_token(with_expire_time)
            .await?
            .into_option())
    }

    /// Whether the current user is a fan of `page_id`.
    pub async fn is_page_liked(&self, page_id: u64) -> Result<bool, SessionError> {
        let query = format!(
            "SELECT uid FROM page_fan WHERE page_id=\"{}\" and uid=\"{}\"",
            page_id, self.user_id
        );
        Ok(!self.run_query(&query).await?.is_empty())
    }

    /// Whether every permission in `perms` has been granted.
    pub async fn is_perm_given(&self, perms: &[&str]) -> Result<bool, SessionError> {
        if perms.is_empty() {
            return Ok(false);
        }
        let query = format!(
            "SELECT {} FROM permissions WHERE uid = me()",
            perms.join(",")
        );
        let rows = self.run_query(&query).await?;
        Ok(match rows.first() {
            Some(row) => !row.is_empty() && row.values().all(|v| !is_zero(v)),
            None => false,
        })
    }

    pub async fn is_bookmarked(&self) -> Result<bool, SessionError> {
        self.is_perm_given(&["bookmarked"]).await
    }

    /// Post to the user's wall; returns the created post id.
    pub async fn post_to_wall(
        &self,
        fields: Map<String, Value>,
    ) -> Result<Option<String>, SessionError> {
        Ok(self.gateway().post_to_wall(fields).await?.into_option())
    }

    pub async fn create_event(
        &self,
        fields: Map<String, Value>,
    ) -> Result<Option<String>, SessionError> {
        Ok(self.gateway().create_event(fields).await?.into_option())
    }

    pub async fn publish_action(
        &self,
        namespace: &str,
        action: &str,
        object_data: Map<String, Value>,
    ) -> Result<Option<String>, SessionError> {
        Ok(self
            .gateway()
            .publish_action(namespace, action, object_data)
            .await?
            .into_option())
    }

    /// Client-side redirect to the login URL when nobody is logged in.
    ///
    /// The caller must send the returned directive and stop processing the request.
    pub fn force_to_login(&self) -> Option<ClientRedirect> {
        if self.is_logged_in() {
            None
        } else {
            Some(Self::redirect_with_javascript(&self.login_url))
        }
    }

    pub fn redirect_with_javascript(url: &str) -> ClientRedirect {
        ClientRedirect::new(url)
    }

    /// Subscription endpoint, computed once per session.
    ///
    /// The embedded application token is never refreshed for the lifetime of the
    /// session. A missing token leaves the `access_token` value empty.
    pub async fn subscription_url(&mut self) -> Result<String, SessionError> {
        if let Some(url) = &self.subscription_url {
            return Ok(url.clone());
        }
        let token = self.gateway().application_access_token().await?;
        let url = self
            .gateway()
            .subscription_url(&token.into_option().unwrap_or_default());
        self.subscription_url = Some(url.clone());
        Ok(url)
    }

    /// Subscribe to real-time updates for `object`.
    pub async fn subscribe(
        &mut self,
        object: &str,
        fields: &str,
        callback_url: &str,
        verify_token: &str,
    ) -> Result<SubscriptionAck, SessionError> {
        let url = self.subscription_url().await?;
        let request = SubscriptionRequest {
            object: object.to_string(),
            fields: fields.to_string(),
            callback_url: callback_url.to_string(),
            verify_token: verify_token.to_string(),
        };
        debug!(object = %object, "Subscribing to real-time updates");
        self.gateway().subscribe(&url, &request).await
    }

    pub async fn unsubscribe(&mut self, object: Option<&str>) -> Result<SubscriptionAck, SessionError> {
        let url = self.subscription_url().await?;
        self.gateway().unsubscribe(&url, object).await
    }

    /// Current real-time update subscriptions, `None` when the response is unusable.
    pub async fn subscriptions(&mut self) -> Result<Option<Vec<Value>>, SessionError> {
        let url = self.subscription_url().await?;
        Ok(self.gateway().subscriptions(&url).await?.into_option())
    }

    /// Send an app notification; a response mentioning an error is returned verbatim.
    pub async fn send_notification(
        &self,
        user_id: &str,
        template: &str,
        href: &str,
    ) -> Result<NotificationOutcome, SessionError> {
        let gateway = self.gateway();
        let token = gateway
            .application_access_token()
            .await?
            .into_option()
            .unwrap_or_default();
        gateway
            .send_notification(&token, user_id, template, href)
            .await
    }

    /// Verification challenge to echo back when the platform confirms a subscription.
    pub fn subscription_challenge(request: &RequestContext, verify_token: &str) -> Option<String> {
        realtime::challenge(request, verify_token)
    }

    /// Real-time update payload posted to the callback, if this request carries one.
    pub fn subscribed_updates(request: &RequestContext) -> Option<SubscriptionUpdate> {
        realtime::updates(request)
    }
}

fn login_url_params(app: &AppCredentials, request: &RequestContext) -> LoginUrlParams {
    let mut redirect_uri = app.redirect_uri.clone();
    if let Some(ids) = request.request_ids_raw() {
        redirect_uri.push(if redirect_uri.contains('?') { '&' } else { '?' });
        redirect_uri.push_str(REQUEST_IDS_PARAM);
        redirect_uri.push('=');
        redirect_uri.push_str(ids);
    }
    LoginUrlParams {
        scope: app.app_perms.clone(),
        redirect_uri,
    }
}

fn app_user_friends_query(ids_only: bool) -> String {
    let columns = if ids_only { "uid" } else { "uid,name" };
    format!(
        "SELECT {} FROM user WHERE uid IN(SELECT uid2 FROM friend WHERE uid1 = me()) AND is_app_user = \"true\"",
        columns
    )
}

fn is_zero(value: &Value) -> bool {
    match value {
        Value::Bool(b) => !b,
        Value::Null => true,
        other => is_blank(other) && !matches!(other, Value::Array(_) | Value::Object(_)),
    }
}

fn profile_error(err: SessionError) -> SessionError {
    match err {
        SessionError::SdkError { message, source } => SessionError::SdkError {
            message: format!("Failed to fetch user profile: {}", message),
            source,
        },
        other => other,
    }
}
