use axum::http::StatusCode;
use chrono::Duration;
use serde_json::{json, Value};

use certdesk::{auth::MeResponse, TokenKind};

mod utils;

use utils::*;

#[tokio::test]
async fn test_login_sets_both_cookies() {
    let setup = TestSetupBuilder::new().with_user("alice", "wonderland").build();
    let mut client = setup.client();

    let response = client.login("alice", "wonderland").await;

    ResponseAssertion::of(&response)
        .has_status(StatusCode::OK)
        .sets_cookie_with_max_age("access_token", 900)
        .sets_cookie_with_max_age("refresh_token", 604800);

    let body: Value = response.json();
    assert_eq!(body["subject"], "alice");
    assert!(client.cookie("access_token").is_some());
    assert!(client.cookie("refresh_token").is_some());
}

#[tokio::test]
async fn test_wrong_password_is_rejected_without_cookies() {
    let setup = TestSetupBuilder::new().with_user("alice", "wonderland").build();
    let mut client = setup.client();

    let response = client.login("alice", "looking-glass").await;
    ResponseAssertion::of(&response)
        .has_status(StatusCode::UNAUTHORIZED)
        .has_error("Invalid credentials")
        .sets_no_cookies();

    // Unknown users get the same answer
    let response = client.login("mallory", "wonderland").await;
    ResponseAssertion::of(&response)
        .has_status(StatusCode::UNAUTHORIZED)
        .has_error("Invalid credentials");
}

#[tokio::test]
async fn test_full_session_lifecycle() {
    let setup = TestSetupBuilder::new().with_user("alice", "wonderland").build();
    let mut client = setup.logged_in("alice", "wonderland").await;

    // Protected call with the access cookie, cookies untouched
    let response = client.get("/me").await;
    ResponseAssertion::of(&response)
        .has_status(StatusCode::OK)
        .sets_no_cookies();
    let me: MeResponse = response.json();
    assert_eq!(me.subject, "alice");

    // Explicit refresh rotates both cookies
    let old_access = client.cookie("access_token").map(str::to_string);
    let old_refresh = client.cookie("refresh_token").map(str::to_string);
    let response = client.post_empty("/refresh").await;
    ResponseAssertion::of(&response)
        .has_status(StatusCode::OK)
        .sets_cookie_with_max_age("access_token", 900)
        .sets_cookie_with_max_age("refresh_token", 604800);
    assert_ne!(client.cookie("access_token").map(str::to_string), old_access);
    assert_ne!(client.cookie("refresh_token").map(str::to_string), old_refresh);

    let refreshed = setup
        .state
        .token_codec
        .decode_kind(client.cookie("access_token").unwrap(), TokenKind::Access)
        .unwrap();
    assert_eq!(refreshed.sub, "alice");

    // Logout clears both cookies
    let response = client.post_empty("/logout").await;
    ResponseAssertion::of(&response)
        .has_status(StatusCode::OK)
        .clears_cookie("access_token")
        .clears_cookie("refresh_token");
    assert!(client.cookies.is_empty());

    // And the session is gone
    let response = client.get("/me").await;
    ResponseAssertion::of(&response)
        .has_status(StatusCode::UNAUTHORIZED)
        .has_error("Authentication required");
}

#[tokio::test]
async fn test_request_without_cookies_never_reaches_handler() {
    let setup = TestSetupBuilder::new().with_admin().build();
    let mut client = setup.client();

    let response = client.post("/persons", json!({"name": "Eve"})).await;
    ResponseAssertion::of(&response)
        .has_status(StatusCode::UNAUTHORIZED)
        .sets_no_cookies();

    // Nothing was created behind the guard
    let mut admin = setup.logged_in("admin", "admin-password").await;
    let persons: Vec<Value> = admin.get("/persons").await.json();
    assert!(persons.is_empty());
}

#[tokio::test]
async fn test_browser_without_cookies_is_redirected_to_login() {
    let setup = TestSetupBuilder::new().build();
    let mut client = setup.client().accepting_html();

    let response = client.get("/certs").await;
    ResponseAssertion::of(&response)
        .has_status(StatusCode::SEE_OTHER)
        .redirects_to("/login");

    // The redirect target answers a browser GET
    let response = client.get("/login").await;
    ResponseAssertion::of(&response)
        .has_status(StatusCode::OK)
        .sets_no_cookies();
    let body: Value = response.json();
    assert_eq!(body["method"], "POST");
}

#[tokio::test]
async fn test_expired_access_is_rotated_transparently() {
    let setup = TestSetupBuilder::new().with_user("alice", "wonderland").build();
    let mut client = setup.logged_in("alice", "wonderland").await;

    let expired = setup
        .state
        .token_codec
        .issue("alice", TokenKind::Access, Duration::seconds(-60))
        .unwrap();
    client.set_cookie("access_token", &expired);

    let response = client.get("/me").await;
    ResponseAssertion::of(&response)
        .has_status(StatusCode::OK)
        .sets_cookie_with_max_age("access_token", 900)
        .sets_cookie_with_max_age("refresh_token", 604800);

    let me: MeResponse = response.json();
    assert_eq!(me.subject, "alice");

    // The rotated access cookie works on its own
    let response = client.get("/me").await;
    ResponseAssertion::of(&response)
        .has_status(StatusCode::OK)
        .sets_no_cookies();
}

#[tokio::test]
async fn test_both_tokens_invalid_clears_session() {
    let setup = TestSetupBuilder::new().with_user("alice", "wonderland").build();
    let mut client = setup.client();
    client.set_cookie("access_token", "garbage");
    client.set_cookie("refresh_token", "also-garbage");

    let response = client.get("/me").await;
    ResponseAssertion::of(&response)
        .has_status(StatusCode::UNAUTHORIZED)
        .clears_cookie("access_token")
        .clears_cookie("refresh_token");
}

#[tokio::test]
async fn test_refresh_with_access_token_is_wrong_type() {
    let setup = TestSetupBuilder::new().with_user("alice", "wonderland").build();
    let mut client = setup.logged_in("alice", "wonderland").await;

    let access = client.cookie("access_token").unwrap().to_string();
    client.set_cookie("refresh_token", &access);

    let response = client.post_empty("/refresh").await;
    ResponseAssertion::of(&response)
        .has_status(StatusCode::UNAUTHORIZED)
        .has_error("Invalid token type")
        .sets_no_cookies();
}

#[tokio::test]
async fn test_refresh_for_deleted_user_is_rejected() {
    // Token signed for a user that never existed in this store
    let setup = TestSetupBuilder::new().build();
    let refresh = setup
        .state
        .token_codec
        .issue("ghost", TokenKind::Refresh, Duration::days(1))
        .unwrap();

    let mut client = setup.client();
    client.set_cookie("refresh_token", &refresh);

    let response = client.post_empty("/refresh").await;
    ResponseAssertion::of(&response)
        .has_status(StatusCode::UNAUTHORIZED)
        .sets_no_cookies();
}

#[tokio::test]
async fn test_admin_can_create_user_who_can_then_log_in() {
    let setup = TestSetupBuilder::new().with_admin().build();
    let mut admin = setup.logged_in("admin", "admin-password").await;

    let response = admin
        .post(
            "/users",
            json!({"username": "bob", "password": "builder-123", "alert_contact": "bob@example.org"}),
        )
        .await;
    ResponseAssertion::of(&response).has_status(StatusCode::CREATED);

    let mut bob = setup.logged_in("bob", "builder-123").await;
    let me: MeResponse = bob.get("/me").await.json();
    assert_eq!(me.alert_contact.as_deref(), Some("bob@example.org"));

    let response = admin
        .post("/users", json!({"username": "bob", "password": "another-pass"}))
        .await;
    ResponseAssertion::of(&response).has_status(StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_health_is_public() {
    let setup = TestSetupBuilder::new().build();
    let response = setup.client().get("/health").await;

    ResponseAssertion::of(&response)
        .has_status(StatusCode::OK)
        .sets_no_cookies();
    assert_eq!(&response.body[..], b"ok");
}
