use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use feedbackr::config::Config;
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

/// Seeded admin credentials (must match m20240101_initial.rs)
const ADMIN_USERNAME: &str = "admin";
const ADMIN_PASSWORD: &str = "change-me-now!";

async fn spawn_app() -> Router {
    let mut config = Config::default();
    config.general.database_path = "sqlite::memory:".to_string();
    config.server.secure_cookies = false;

    let state = feedbackr::api::create_app_state_from_config(config)
        .await
        .expect("Failed to create app state");
    feedbackr::api::router(state).await
}

fn request(method: &str, uri: &str, cookie: Option<&str>, body: Option<&Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);

    if let Some(cookie) = cookie {
        builder = builder.header("Cookie", cookie);
    }

    match body {
        Some(value) => builder
            .header("Content-Type", "application/json")
            .body(Body::from(serde_json::to_string(value).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

/// Run a request and return (status, parsed body, session cookie if one was
/// set on the response).
async fn send(
    app: &Router,
    req: Request<Body>,
) -> (StatusCode, Value, Option<String>) {
    let response = app.clone().oneshot(req).await.unwrap();
    let status = response.status();

    let cookie = response
        .headers()
        .get("set-cookie")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(ToString::to_string);

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body: Value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };

    (status, body, cookie)
}

fn register_payload(username: &str, email: &str) -> Value {
    json!({
        "username": username,
        "password": "Secret123!",
        "password_confirm": "Secret123!",
        "email": email,
        "first_name": "Test",
        "last_name": "User",
    })
}

/// Register a user and return the session cookie.
async fn register(app: &Router, username: &str, email: &str) -> String {
    let (status, _, cookie) = send(
        app,
        request(
            "POST",
            "/api/auth/register",
            None,
            Some(&register_payload(username, email)),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    cookie.expect("registration should establish a session")
}

async fn login(app: &Router, username: &str, password: &str) -> String {
    let (status, _, cookie) = send(
        app,
        request(
            "POST",
            "/api/auth/login",
            None,
            Some(&json!({"username": username, "password": password})),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    cookie.expect("login should establish a session")
}

#[tokio::test]
async fn test_register_login_logout_flow() {
    let app = spawn_app().await;

    let cookie = register(&app, "alice", "alice@x.com").await;

    let (status, body, _) = send(
        &app,
        request("GET", "/api/users/alice", Some(&cookie), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["username"], "alice");
    assert_eq!(body["data"]["full_name"], "Test User");
    assert_eq!(body["data"]["is_admin"], false);

    let (status, _, _) = send(
        &app,
        request("POST", "/api/auth/logout", Some(&cookie), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // Known username, wrong password
    let (status, body, _) = send(
        &app,
        request(
            "POST",
            "/api/auth/login",
            None,
            Some(&json!({"username": "alice", "password": "WrongPass1!"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid password");

    // Unknown username
    let (status, body, _) = send(
        &app,
        request(
            "POST",
            "/api/auth/login",
            None,
            Some(&json!({"username": "bob", "password": "WrongPass1!"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid username");

    // And a correct login works again
    login(&app, "alice", "Secret123!").await;
}

#[tokio::test]
async fn test_register_validation_errors() {
    let app = spawn_app().await;

    let mut payload = register_payload("alice", "alice@x.com");
    payload["password"] = json!("short!");
    payload["password_confirm"] = json!("short!");
    let (status, body, _) = send(
        &app,
        request("POST", "/api/auth/register", None, Some(&payload)),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["field"], "password");

    let mut payload = register_payload("alice", "alice@x.com");
    payload["password_confirm"] = json!("Different1!");
    let (status, body, _) = send(
        &app,
        request("POST", "/api/auth/register", None, Some(&payload)),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["field"], "password_confirm");

    let payload = register_payload("alice", "not-an-email");
    let (status, body, _) = send(
        &app,
        request("POST", "/api/auth/register", None, Some(&payload)),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["field"], "email");

    // Password without a special character
    let mut payload = register_payload("alice", "alice@x.com");
    payload["password"] = json!("abcdefghijkl");
    payload["password_confirm"] = json!("abcdefghijkl");
    let (status, body, _) = send(
        &app,
        request("POST", "/api/auth/register", None, Some(&payload)),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["field"], "password");
}

#[tokio::test]
async fn test_duplicate_registration_maps_to_field() {
    let app = spawn_app().await;

    register(&app, "alice", "alice@x.com").await;

    let (status, body, _) = send(
        &app,
        request(
            "POST",
            "/api/auth/register",
            None,
            Some(&register_payload("alice", "other@x.com")),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["field"], "username");

    let (status, body, _) = send(
        &app,
        request(
            "POST",
            "/api/auth/register",
            None,
            Some(&register_payload("alice2", "alice@x.com")),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["field"], "email");
}

#[tokio::test]
async fn test_anonymous_only_routes_reject_active_session() {
    let app = spawn_app().await;

    let cookie = register(&app, "alice", "alice@x.com").await;

    let (status, _, _) = send(
        &app,
        request(
            "POST",
            "/api/auth/register",
            Some(&cookie),
            Some(&register_payload("bob", "bob@x.com")),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _, _) = send(
        &app,
        request(
            "POST",
            "/api/auth/login",
            Some(&cookie),
            Some(&json!({"username": "alice", "password": "Secret123!"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_protected_routes_require_session() {
    let app = spawn_app().await;

    register(&app, "alice", "alice@x.com").await;

    let (status, _, _) = send(&app, request("GET", "/api/users/alice", None, None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _, _) = send(
        &app,
        request(
            "POST",
            "/api/users/alice/feedback",
            None,
            Some(&json!({"title": "t1", "content": "c1"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _, _) = send(&app, request("DELETE", "/api/users/alice", None, None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_feedback_ownership_and_admin_override() {
    let app = spawn_app().await;

    let alice = register(&app, "alice", "alice@x.com").await;
    let bob = register(&app, "bob", "bob@x.com").await;

    let (status, body, _) = send(
        &app,
        request(
            "POST",
            "/api/users/alice/feedback",
            Some(&alice),
            Some(&json!({"title": "t1", "content": "original content"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let id = body["data"]["id"].as_i64().unwrap();

    // Authenticated non-owner is forbidden, not merely unauthenticated
    let (status, _, _) = send(
        &app,
        request(
            "PUT",
            &format!("/api/feedback/{id}"),
            Some(&bob),
            Some(&json!({"title": "hijacked", "content": "hijacked"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Bob cannot read alice's list either
    let (status, _, _) = send(
        &app,
        request("GET", "/api/users/alice/feedback", Some(&bob), None),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Content is unchanged after the denied update
    let (status, body, _) = send(
        &app,
        request("GET", "/api/users/alice/feedback", Some(&alice), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"][0]["content"], "original content");

    // The seeded admin may update anyone's feedback
    let admin = login(&app, ADMIN_USERNAME, ADMIN_PASSWORD).await;
    let (status, body, _) = send(
        &app,
        request(
            "PUT",
            &format!("/api/feedback/{id}"),
            Some(&admin),
            Some(&json!({"title": "moderated", "content": "cleaned up"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["title"], "moderated");
    // Ownership never changes on update
    assert_eq!(body["data"]["username"], "alice");

    // Owner deletes their own entry
    let (status, _, _) = send(
        &app,
        request("DELETE", &format!("/api/feedback/{id}"), Some(&alice), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _, _) = send(
        &app,
        request("DELETE", &format!("/api/feedback/{id}"), Some(&admin), None),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_feedback_unknown_id_is_not_found() {
    let app = spawn_app().await;

    let cookie = register(&app, "alice", "alice@x.com").await;

    let (status, _, _) = send(
        &app,
        request(
            "PUT",
            "/api/feedback/9999",
            Some(&cookie),
            Some(&json!({"title": "t", "content": "c"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_account_cascades_and_clears_session() {
    let app = spawn_app().await;

    let alice = register(&app, "alice", "alice@x.com").await;

    for i in 0..2 {
        let (status, _, _) = send(
            &app,
            request(
                "POST",
                "/api/users/alice/feedback",
                Some(&alice),
                Some(&json!({"title": format!("t{i}"), "content": "c"})),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, _, _) = send(
        &app,
        request("DELETE", "/api/users/alice", Some(&alice), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // Self-delete cleared the session
    let (status, _, _) = send(
        &app,
        request("GET", "/api/users/alice", Some(&alice), None),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // User and their feedback are gone; a second delete is NotFound, not a crash
    let admin = login(&app, ADMIN_USERNAME, ADMIN_PASSWORD).await;
    let (status, _, _) = send(
        &app,
        request("GET", "/api/users/alice", Some(&admin), None),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _, _) = send(
        &app,
        request("DELETE", "/api/users/alice", Some(&admin), None),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_admin_can_delete_other_account_without_losing_session() {
    let app = spawn_app().await;

    register(&app, "alice", "alice@x.com").await;
    let admin = login(&app, ADMIN_USERNAME, ADMIN_PASSWORD).await;

    let (status, _, _) = send(
        &app,
        request("DELETE", "/api/users/alice", Some(&admin), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // Admin's own session survives a delete of someone else
    let (status, _, _) = send(
        &app,
        request("GET", "/api/users/admin", Some(&admin), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_password_reset_endpoints() {
    let app = spawn_app().await;

    register(&app, "alice", "alice@x.com").await;

    // Unknown address
    let (status, _, _) = send(
        &app,
        request(
            "POST",
            "/api/auth/password-reset",
            None,
            Some(&json!({"email": "nobody@x.com"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Known address issues a token (delivered by mail, not in the response)
    let (status, body, _) = send(
        &app,
        request(
            "POST",
            "/api/auth/password-reset",
            None,
            Some(&json!({"email": "alice@x.com"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    // A made-up token is rejected
    let (status, _, _) = send(
        &app,
        request(
            "POST",
            "/api/auth/password-reset/confirm",
            None,
            Some(&json!({
                "email": "alice@x.com",
                "token": "deadbeefdeadbeefdeadbeefdeadbeef",
                "password": "NewSecret99!",
                "password_confirm": "NewSecret99!",
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Mismatched confirmation never reaches the token check
    let (status, body, _) = send(
        &app,
        request(
            "POST",
            "/api/auth/password-reset/confirm",
            None,
            Some(&json!({
                "email": "alice@x.com",
                "token": "deadbeefdeadbeefdeadbeefdeadbeef",
                "password": "NewSecret99!",
                "password_confirm": "Other99!!!",
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["field"], "password_confirm");

    // The old password still works: nothing was invalidated
    login(&app, "alice", "Secret123!").await;
}

#[tokio::test]
async fn test_username_reminder() {
    let app = spawn_app().await;

    register(&app, "alice", "alice@x.com").await;

    let (status, _, _) = send(
        &app,
        request(
            "POST",
            "/api/auth/username-reminder",
            None,
            Some(&json!({"email": "alice@x.com"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _, _) = send(
        &app,
        request(
            "POST",
            "/api/auth/username-reminder",
            None,
            Some(&json!({"email": "nobody@x.com"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
