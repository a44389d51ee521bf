//! Delegating Gateway
//!
//! Performs one network-shaped operation per call, either through the injected SDK
//! handle or through the raw graph transport, and normalizes the loosely shaped
//! responses into typed results. Hard failures are `Err`; missing payload fields are
//! [`Fetched::Absent`] or an empty list.

use crate::config::AppCredentials;
use crate::error::SessionError;
use crate::handle::{ApiCall, SdkHandle};
use crate::transport::{FormParams, GraphTransport};
use crate::value::{id_string, is_truthy};
use reqwest::Method;
use serde_json::{Map, Value};
use tracing::{debug, warn};

pub mod response;

pub use response::{
    ExtendedAccessToken, Fetched, Friend, FriendList, NotificationOutcome, QueryRow,
    SubscriptionAck, SubscriptionRequest, SubscriptionUpdate, TokenGrant, UpdateEntry,
    UserProfile,
};

/// Borrowed view over everything a delegated call needs.
pub struct Gateway<'a> {
    handle: &'a dyn SdkHandle,
    transport: &'a GraphTransport,
    app: &'a AppCredentials,
}

impl<'a> Gateway<'a> {
    pub fn new(
        handle: &'a dyn SdkHandle,
        transport: &'a GraphTransport,
        app: &'a AppCredentials,
    ) -> Self {
        Self {
            handle,
            transport,
            app,
        }
    }

    async fn api(&self, call: ApiCall) -> Result<Value, SessionError> {
        let label = call.describe();
        debug!(call = %label, "Delegating call to SDK handle");
        self.handle.api(call).await.map_err(|e| {
            warn!(call = %label, error = %e, "SDK handle call failed");
            SessionError::from(e)
        })
    }

    /// Fetch the current user's profile (`/me`).
    pub async fn fetch_profile(&self) -> Result<UserProfile, SessionError> {
        let response = self.api(ApiCall::get("/me")).await?;
        Ok(response::profile_from(response))
    }

    /// Names of the permissions granted to the application, in response order.
    pub async fn fetch_permissions(&self) -> Result<Vec<String>, SessionError> {
        let response = self.api(ApiCall::get("/me/permissions")).await?;
        Ok(response::permission_names(&response))
    }

    pub async fn fetch_friends(&self, ids_only: bool) -> Result<FriendList, SessionError> {
        let friends = response::friends_from(&self.api(ApiCall::get("/me/friends")).await?);
        if ids_only {
            Ok(FriendList::Ids(friends.into_iter().map(|f| f.id).collect()))
        } else {
            Ok(FriendList::Records(friends))
        }
    }

    /// Run an opaque legacy query through the handle.
    pub async fn run_query(&self, query: &str) -> Result<Vec<QueryRow>, SessionError> {
        let response = self.api(ApiCall::query(query)).await?;
        Ok(response::rows_from(response))
    }

    /// Delete app requests addressed to `user_id` and return the full ids that were
    /// deleted. Requests whose delete does not report success are skipped.
    pub async fn delete_requests(
        &self,
        user_id: u64,
        request_ids: &[&str],
    ) -> Result<Vec<String>, SessionError> {
        if user_id == 0 {
            return Err(SessionError::AuthError(
                "This action is only for logged in users".to_string(),
            ));
        }

        let mut deleted = Vec::new();
        for request_id in request_ids {
            let full_id = format!("{}_{}", request_id, user_id);
            let response = self.api(ApiCall::delete(format!("/{}", full_id))).await?;
            if is_truthy(&response) {
                deleted.push(full_id);
            } else {
                debug!(request_id = %full_id, "Request delete not confirmed");
            }
        }
        Ok(deleted)
    }

    fn client_credentials(&self) -> FormParams {
        vec![
            ("client_id".to_string(), self.app.app_id.clone()),
            ("client_secret".to_string(), self.app.app_secret.clone()),
            ("grant_type".to_string(), "client_credentials".to_string()),
        ]
    }

    /// Exchange the app credentials for an application access token.
    pub async fn application_access_token(&self) -> Result<Fetched<String>, SessionError> {
        let body = self
            .transport
            .fetch(
                &self.transport.url("oauth/access_token"),
                Some(&self.client_credentials()),
                None,
            )
            .await?;

        let token = response::token_grant(&body).map(|grant| grant.access_token);
        if !token.is_present() {
            warn!("No access_token in application token response");
        }
        Ok(token)
    }

    /// Exchange the handle's current user token for a long-lived one.
    pub async fn extended_access_token(
        &self,
        with_expire_time: bool,
    ) -> Result<Fetched<ExtendedAccessToken>, SessionError> {
        let mut params = self.client_credentials();
        params.push((
            "fb_exchange_token".to_string(),
            self.handle.access_token().unwrap_or_default(),
        ));

        let body = self
            .transport
            .fetch(&self.transport.url("oauth/access_token"), Some(&params), None)
            .await?;

        Ok(response::token_grant(&body).map(|grant| {
            if with_expire_time {
                ExtendedAccessToken::Grant(grant)
            } else {
                ExtendedAccessToken::Token(grant.access_token)
            }
        }))
    }

    pub async fn post_to_wall(
        &self,
        fields: Map<String, Value>,
    ) -> Result<Fetched<String>, SessionError> {
        self.create("/me/feed".to_string(), fields).await
    }

    pub async fn create_event(
        &self,
        fields: Map<String, Value>,
    ) -> Result<Fetched<String>, SessionError> {
        self.create("/me/events".to_string(), fields).await
    }

    /// Publish an open graph action `namespace:action` for the current user.
    pub async fn publish_action(
        &self,
        namespace: &str,
        action: &str,
        object_data: Map<String, Value>,
    ) -> Result<Fetched<String>, SessionError> {
        self.create(format!("/me/{}:{}", namespace, action), object_data)
            .await
    }

    async fn create(
        &self,
        path: String,
        fields: Map<String, Value>,
    ) -> Result<Fetched<String>, SessionError> {
        let response = self.api(ApiCall::post(path, fields)).await?;
        Ok(response::created_id(&response))
    }

    pub async fn subscribe(
        &self,
        subscription_url: &str,
        request: &SubscriptionRequest,
    ) -> Result<SubscriptionAck, SessionError> {
        let body = self
            .transport
            .fetch(subscription_url, Some(&request.form_params()), None)
            .await?;
        Ok(response::subscription_ack(body))
    }

    /// Remove one object's subscription, or all of them when `object` is `None`.
    pub async fn unsubscribe(
        &self,
        subscription_url: &str,
        object: Option<&str>,
    ) -> Result<SubscriptionAck, SessionError> {
        let params: FormParams = object
            .map(|o| vec![("object".to_string(), o.to_string())])
            .unwrap_or_default();
        let body = self
            .transport
            .fetch(subscription_url, Some(&params), Some(Method::DELETE))
            .await?;
        Ok(response::subscription_ack(body))
    }

    pub async fn subscriptions(
        &self,
        subscription_url: &str,
    ) -> Result<Fetched<Vec<Value>>, SessionError> {
        let body = self.transport.fetch(subscription_url, None, None).await?;
        Ok(response::subscription_list(&body))
    }

    /// Send an app notification to `user_id` using the given application token.
    pub async fn send_notification(
        &self,
        app_token: &str,
        user_id: &str,
        template: &str,
        href: &str,
    ) -> Result<NotificationOutcome, SessionError> {
        let params: FormParams = vec![
            ("access_token".to_string(), app_token.to_string()),
            ("template".to_string(), template.to_string()),
            ("href".to_string(), href.to_string()),
        ];
        let url = self.transport.url(&format!("{}/notifications", user_id));
        let body = self.transport.fetch(&url, Some(&params), None).await?;

        let outcome = response::notification_outcome(body);
        if !outcome.is_sent() {
            warn!(user_id = %user_id, "Notification rejected by graph");
        }
        Ok(outcome)
    }

    /// Subscription endpoint for the app, embedding `app_token`.
    pub fn subscription_url(&self, app_token: &str) -> String {
        let mut url = self
            .transport
            .url(&format!("{}/subscriptions", self.app.app_id));
        url.push_str("?access_token=");
        url.push_str(app_token);
        url
    }

    /// Ids (`uid` column) out of legacy query rows.
    pub fn uid_column(rows: &[QueryRow]) -> Vec<String> {
        rows.iter()
            .filter_map(|row| row.get("uid").and_then(id_string))
            .collect()
    }
}
