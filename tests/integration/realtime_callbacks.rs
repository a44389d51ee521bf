//! Integration tests for the real-time update callback helpers

use graph_session::{RequestContext, Session};
use reqwest::Method;
use serde_json::json;

#[test]
fn test_subscription_challenge() {
    let request = RequestContext::from_query(
        "hub.mode=subscribe&hub.challenge=1158201444&hub.verify_token=secret",
    );

    assert_eq!(
        Session::subscription_challenge(&request, "secret").as_deref(),
        Some("1158201444")
    );
    assert_eq!(Session::subscription_challenge(&request, "other"), None);
}

#[test]
fn test_subscription_challenge_requires_subscribe_mode() {
    let request = RequestContext::from_query("hub.mode=unsubscribe&hub.challenge=1&hub.verify_token=secret");
    assert_eq!(Session::subscription_challenge(&request, "secret"), None);

    let request = RequestContext::default();
    assert_eq!(Session::subscription_challenge(&request, "secret"), None);
}

#[test]
fn test_subscribed_updates() {
    let payload = json!({
        "object": "user",
        "entry": [
            { "uid": 1335845740, "changed_fields": ["name", "picture"], "time": 232323 },
            { "uid": 1234, "changed_fields": ["friends"], "time": 232325 }
        ]
    });
    let request = RequestContext::new(Method::POST).with_body(payload.to_string());

    let update = Session::subscribed_updates(&request).unwrap();
    assert_eq!(update.object, "user");
    assert_eq!(update.entry.len(), 2);
    assert_eq!(update.entry[0].uid, Some(json!(1335845740)));
    assert_eq!(update.entry[0].changed_fields, vec!["name", "picture"]);
    assert_eq!(update.entry[1].time, Some(232325));
}

#[test]
fn test_subscribed_updates_ignores_other_requests() {
    let get = RequestContext::default().with_body(r#"{"object":"user","entry":[]}"#);
    assert!(Session::subscribed_updates(&get).is_none());

    let empty_post = RequestContext::new(Method::POST);
    assert!(Session::subscribed_updates(&empty_post).is_none());

    let garbage = RequestContext::new(Method::POST).with_body("object=user");
    assert!(Session::subscribed_updates(&garbage).is_none());
}
