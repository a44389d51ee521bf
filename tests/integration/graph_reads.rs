//! Integration tests for graph reads delegated through the SDK handle

use super::test_utils::{session_for, session_with_request, MockHandle};
use graph_session::gateway::{Friend, FriendList};
use graph_session::{HandleError, RequestContext, SessionError};
use serde_json::json;

#[tokio::test]
async fn test_given_permissions() {
    let handle = MockHandle::new()
        .with_user(5)
        .respond(
            "GET /me/permissions",
            json!({ "data": [{ "installed": 1, "email": 1, "bookmarked": 1 }] }),
        )
        .into_arc();
    let session = session_for(&handle);

    let perms = session.given_permissions().await.unwrap();
    assert_eq!(perms, vec!["installed", "email", "bookmarked"]);
}

#[tokio::test]
async fn test_given_permissions_granted_entries() {
    let handle = MockHandle::new()
        .respond(
            "GET /me/permissions",
            json!({ "data": [
                { "permission": "public_profile", "status": "granted" },
                { "permission": "user_friends", "status": "declined" },
                { "permission": "email", "status": "granted" }
            ]}),
        )
        .into_arc();

    let perms = session_for(&handle).given_permissions().await.unwrap();
    assert_eq!(perms, vec!["public_profile", "email"]);
}

#[tokio::test]
async fn test_given_permissions_empty() {
    for response in [json!({ "data": [] }), json!({}), json!(null)] {
        let handle = MockHandle::new()
            .respond("GET /me/permissions", response)
            .into_arc();
        assert!(session_for(&handle).given_permissions().await.unwrap().is_empty());
    }
}

#[tokio::test]
async fn test_given_permissions_propagates_handle_error() {
    let handle = MockHandle::new()
        .fail(
            "GET /me/permissions",
            HandleError::Api {
                code: Some(190),
                message: "Invalid OAuth access token".to_string(),
            },
        )
        .into_arc();

    let err = session_for(&handle).given_permissions().await.unwrap_err();
    assert!(err.is_sdk());
    assert!(err.to_string().contains("Invalid OAuth access token"));
}

#[tokio::test]
async fn test_get_friends() {
    let handle = MockHandle::new()
        .respond(
            "GET /me/friends",
            json!({ "data": [
                { "id": "1", "name": "Friend A" },
                { "id": 2, "name": "Friend B" }
            ]}),
        )
        .into_arc();
    let session = session_for(&handle);

    assert_eq!(
        session.friends().await.unwrap(),
        vec![Friend::new("1", "Friend A"), Friend::new("2", "Friend B")]
    );
    assert_eq!(session.friend_ids().await.unwrap(), vec!["1", "2"]);
    assert_eq!(
        session.get_friends(true).await.unwrap(),
        FriendList::Ids(vec!["1".to_string(), "2".to_string()])
    );
}

#[tokio::test]
async fn test_get_friends_empty() {
    let handle = MockHandle::new()
        .respond("GET /me/friends", json!({ "data": [] }))
        .into_arc();
    let session = session_for(&handle);

    assert!(session.friends().await.unwrap().is_empty());
    assert!(session.get_friends(true).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_user_profile_data_is_cached() {
    let handle = MockHandle::new()
        .with_user(5)
        .respond("GET /me", json!({ "id": "5", "name": "Jane", "email": "jane@example.com" }))
        .into_arc();
    let mut session = session_for(&handle);

    let profile = session.user_profile_data().await.unwrap();
    assert_eq!(profile.get("name"), Some(&json!("Jane")));
    let again = session.user_profile_data().await.unwrap();
    assert_eq!(again.get("email"), Some(&json!("jane@example.com")));

    assert_eq!(handle.call_count("GET /me"), 1);
}

#[tokio::test]
async fn test_refresh_user_profile_fetches_again() {
    let handle = MockHandle::new()
        .respond("GET /me", json!({ "id": "5" }))
        .into_arc();
    let mut session = session_for(&handle);

    session.user_profile_data().await.unwrap();
    session.refresh_user_profile().await.unwrap();
    assert_eq!(handle.call_count("GET /me"), 2);
}

#[tokio::test]
async fn test_failed_profile_is_not_cached() {
    let handle = MockHandle::new()
        .fail("GET /me", HandleError::Transport("connection reset".to_string()))
        .into_arc();
    let mut session = session_for(&handle);

    let err = session.user_profile_data().await.unwrap_err();
    assert!(err.to_string().contains("Failed to fetch user profile"));
    match err {
        SessionError::SdkError { source, .. } => {
            assert_eq!(
                source,
                Some(HandleError::Transport("connection reset".to_string()))
            );
        }
        other => panic!("unexpected error: {:?}", other),
    }

    assert!(session.user_profile_data().await.is_err());
    assert_eq!(handle.call_count("GET /me"), 2);
}

#[tokio::test]
async fn test_run_query() {
    let query = "SELECT name FROM user WHERE uid = me()";
    let handle = MockHandle::new()
        .respond(query, json!([{ "name": "Jane" }]))
        .into_arc();
    let session = session_for(&handle);

    let rows = session.run_query(query).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].get("name"), Some(&json!("Jane")));

    // Non-list responses normalize to no rows
    assert!(session.run_query("SELECT nothing").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_app_user_friends() {
    let ids_query = "SELECT uid FROM user WHERE uid IN(SELECT uid2 FROM friend WHERE uid1 = me()) AND is_app_user = \"true\"";
    let full_query = "SELECT uid,name FROM user WHERE uid IN(SELECT uid2 FROM friend WHERE uid1 = me()) AND is_app_user = \"true\"";
    let handle = MockHandle::new()
        .respond(ids_query, json!([{ "uid": 11 }, { "uid": "12" }]))
        .respond(full_query, json!([{ "uid": 11, "name": "A" }]))
        .into_arc();
    let session = session_for(&handle);

    assert_eq!(session.app_user_friend_ids().await.unwrap(), vec!["11", "12"]);
    let friends = session.app_user_friends().await.unwrap();
    assert_eq!(friends[0].get("name"), Some(&json!("A")));
}

#[tokio::test]
async fn test_is_page_liked() {
    let handle = MockHandle::new()
        .with_user(5)
        .respond(
            "SELECT uid FROM page_fan WHERE page_id=\"123\" and uid=\"5\"",
            json!([{ "uid": 5 }]),
        )
        .into_arc();
    let session = session_for(&handle);

    assert!(session.is_page_liked(123).await.unwrap());
    assert!(!session.is_page_liked(456).await.unwrap());
}

#[tokio::test]
async fn test_is_perm_given() {
    let handle = MockHandle::new()
        .respond(
            "SELECT email,publish_stream FROM permissions WHERE uid = me()",
            json!([{ "email": 1, "publish_stream": 1 }]),
        )
        .respond(
            "SELECT email,user_photos FROM permissions WHERE uid = me()",
            json!([{ "email": 1, "user_photos": 0 }]),
        )
        .respond(
            "SELECT bookmarked FROM permissions WHERE uid = me()",
            json!([{ "bookmarked": "1" }]),
        )
        .into_arc();
    let session = session_for(&handle);

    assert!(session.is_perm_given(&["email", "publish_stream"]).await.unwrap());
    assert!(!session.is_perm_given(&["email", "user_photos"]).await.unwrap());
    assert!(!session.is_perm_given(&[]).await.unwrap());
    assert!(session.is_bookmarked().await.unwrap());
}

#[tokio::test]
async fn test_request_ids_after_delete_requires_login() {
    let handle = MockHandle::new().with_user(0).into_arc();
    let session = session_with_request(&handle, RequestContext::from_query("request_ids=1,2"));

    let err = session.request_ids_after_delete().await.unwrap_err();
    assert!(err.is_auth());
    assert!(handle.calls().is_empty());
}

#[tokio::test]
async fn test_request_ids_after_delete_without_ids() {
    let handle = MockHandle::new().with_user(5).into_arc();
    let session = session_for(&handle);

    assert!(session.request_ids_after_delete().await.unwrap().is_empty());
    assert!(handle.calls().is_empty());
}

#[tokio::test]
async fn test_request_ids_after_delete() {
    let handle = MockHandle::new()
        .with_user(5)
        .respond("DELETE /1_5", json!(true))
        .respond("DELETE /3_5", json!(true))
        .into_arc();
    let session =
        session_with_request(&handle, RequestContext::from_query("request_ids=1,%202,,3"));

    let deleted = session.request_ids_after_delete().await.unwrap();
    assert_eq!(deleted, vec!["1_5", "3_5"]);
    assert_eq!(handle.call_count("DELETE /2_5"), 1);
}

#[tokio::test]
async fn test_request_ids_after_delete_stops_on_handle_error() {
    let handle = MockHandle::new()
        .with_user(5)
        .fail("DELETE /1_5", HandleError::Transport("timeout".to_string()))
        .into_arc();
    let session = session_with_request(&handle, RequestContext::from_query("request_ids=1,2"));

    assert!(session.request_ids_after_delete().await.unwrap_err().is_sdk());
    assert_eq!(handle.call_count("DELETE /2_5"), 0);
}
