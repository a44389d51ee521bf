//! Fallback accessor resolution.
//!
//! Names the facade does not expose as typed methods are resolved through a fixed
//! chain of lookup sources. The first source that yields a value wins; running out of
//! sources is an [`SessionError::SdkError`].

use super::Session;
use crate::error::SessionError;
use crate::gateway::{ExtendedAccessToken, FriendList};
use crate::value::is_truthy;
use serde_json::Value;
use tracing::debug;

/// Places a name can be resolved from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupSource {
    /// A method the handle exposes under the exact name
    HandleMethod,
    /// One of the facade's own accessors, keyed by the lowercased property
    LocalMethod,
    /// A field of the (lazily fetched) user profile
    ProfileField,
    /// A property the handle exposes
    HandleField,
}

/// Order in which sources are consulted.
pub const RESOLUTION_ORDER: [LookupSource; 4] = [
    LookupSource::HandleMethod,
    LookupSource::LocalMethod,
    LookupSource::ProfileField,
    LookupSource::HandleField,
];

/// Facade accessors reachable by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LocalAccessor {
    Id,
    LoginUrl,
    SignedRequest,
    TabPageId,
    TabAppData,
    UserProfileData,
    GivenPermissions,
    Friends,
    FriendIds,
    AppUserFriends,
    AppUserFriendIds,
    ApplicationAccessToken,
    ExtendedAccessToken,
    RequestIdsAfterDelete,
    Subscriptions,
}

impl LocalAccessor {
    fn from_property(property: &str) -> Option<Self> {
        let accessor = match property {
            "id" => LocalAccessor::Id,
            "loginurl" => LocalAccessor::LoginUrl,
            "signedrequest" => LocalAccessor::SignedRequest,
            "tabpageid" => LocalAccessor::TabPageId,
            "tabappdata" => LocalAccessor::TabAppData,
            "userprofiledata" => LocalAccessor::UserProfileData,
            "givenpermissions" => LocalAccessor::GivenPermissions,
            "friends" => LocalAccessor::Friends,
            "friendids" => LocalAccessor::FriendIds,
            "appuserfriends" => LocalAccessor::AppUserFriends,
            "appuserfriendids" => LocalAccessor::AppUserFriendIds,
            "applicationaccesstoken" => LocalAccessor::ApplicationAccessToken,
            "extendedaccesstoken" => LocalAccessor::ExtendedAccessToken,
            "requestidsafterdelete" => LocalAccessor::RequestIdsAfterDelete,
            "subscriptions" => LocalAccessor::Subscriptions,
            _ => return None,
        };
        Some(accessor)
    }
}

/// `getFooBar` → `foobar`; `None` for names without the `get` prefix.
fn accessor_property(name: &str) -> Option<String> {
    name.strip_prefix("get")
        .filter(|rest| !rest.is_empty())
        .map(str::to_lowercase)
}

fn to_value<T: serde::Serialize>(value: T) -> Result<Value, SessionError> {
    serde_json::to_value(value)
        .map_err(|e| SessionError::sdk(format!("Failed to encode accessor result: {}", e)))
}

fn flag_arg(args: &[Value]) -> bool {
    args.first().map_or(false, is_truthy)
}

impl Session {
    /// Resolve an accessor by name, e.g. `getEmail` or a handle method.
    ///
    /// Sources are tried in [`RESOLUTION_ORDER`]. Only `getX` names reach the local,
    /// profile and handle-field sources, which look up the lowercased `x`.
    pub async fn resolve(&mut self, name: &str, args: &[Value]) -> Result<Value, SessionError> {
        let property = accessor_property(name);

        for source in RESOLUTION_ORDER {
            let found = match (source, property.as_deref()) {
                (LookupSource::HandleMethod, _) => match self.handle.call(name, args).await {
                    Some(result) => Some(result?),
                    None => None,
                },
                (LookupSource::LocalMethod, Some(property)) => {
                    match LocalAccessor::from_property(property) {
                        Some(accessor) => Some(self.call_local(accessor, args).await?),
                        None => None,
                    }
                }
                (LookupSource::ProfileField, Some(property)) => self
                    .user_profile_data()
                    .await?
                    .get(property)
                    .filter(|value| !value.is_null())
                    .cloned(),
                (LookupSource::HandleField, Some(property)) => self.handle.field(property),
                (_, None) => None,
            };

            if let Some(value) = found {
                debug!(name = %name, source = ?source, "Accessor resolved");
                return Ok(value);
            }
        }

        Err(SessionError::sdk(format!(
            "There is no method or property named '{}'",
            name
        )))
    }

    async fn call_local(
        &mut self,
        accessor: LocalAccessor,
        args: &[Value],
    ) -> Result<Value, SessionError> {
        match accessor {
            LocalAccessor::Id => Ok(Value::from(self.id())),
            LocalAccessor::LoginUrl => Ok(Value::from(self.login_url())),
            LocalAccessor::SignedRequest => to_value(self.signed_request()),
            LocalAccessor::TabPageId => Ok(Value::from(self.tab_page_id())),
            LocalAccessor::TabAppData => {
                Ok(self.tab_app_data().cloned().unwrap_or(Value::Bool(false)))
            }
            LocalAccessor::UserProfileData => {
                Ok(Value::Object(self.user_profile_data().await?.clone()))
            }
            LocalAccessor::GivenPermissions => to_value(self.given_permissions().await?),
            LocalAccessor::Friends => match self.get_friends(flag_arg(args)).await? {
                FriendList::Records(records) => to_value(records),
                FriendList::Ids(ids) => to_value(ids),
            },
            LocalAccessor::FriendIds => to_value(self.friend_ids().await?),
            LocalAccessor::AppUserFriends => {
                if flag_arg(args) {
                    to_value(self.app_user_friend_ids().await?)
                } else {
                    to_value(self.app_user_friends().await?)
                }
            }
            LocalAccessor::AppUserFriendIds => to_value(self.app_user_friend_ids().await?),
            LocalAccessor::ApplicationAccessToken => Ok(self
                .application_access_token()
                .await?
                .map(Value::String)
                .unwrap_or(Value::Bool(false))),
            LocalAccessor::ExtendedAccessToken => {
                let token = self.extended_access_token(flag_arg(args)).await?;
                match token {
                    Some(ExtendedAccessToken::Token(token)) => Ok(Value::String(token)),
                    Some(ExtendedAccessToken::Grant(grant)) => to_value(grant.fields),
                    None => Ok(Value::Bool(false)),
                }
            }
            LocalAccessor::RequestIdsAfterDelete => {
                to_value(self.request_ids_after_delete().await?)
            }
            LocalAccessor::Subscriptions => Ok(self
                .subscriptions()
                .await?
                .map(Value::Array)
                .unwrap_or(Value::Bool(false))),
        }
    }
}
