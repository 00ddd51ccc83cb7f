use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use ffe_tracker::config::Config;
use ffe_tracker::services::{AccountService, NewAccount};
use ffe_tracker::state::SharedState;
use http_body_util::BodyExt;
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;

const ADMIN_PASSWORD: &str = "admin-password-1";
const USER_PASSWORD: &str = "member-password-1";

struct TestApp {
    state: Arc<SharedState>,
    router: Router,
}

async fn spawn_app() -> TestApp {
    let mut config = Config::default();
    config.general.database_path = "sqlite::memory:".to_string();
    config.server.secure_cookies = false;
    config.security.argon2_memory_cost_kib = 64;
    config.security.argon2_time_cost = 1;
    config.bootstrap.admin_password = Some(ADMIN_PASSWORD.to_string());

    let state = Arc::new(
        SharedState::new(config)
            .await
            .expect("Failed to create state"),
    );
    ffe_tracker::cli::bootstrap(&state, false)
        .await
        .expect("Failed to bootstrap administrator");

    let app_state = ffe_tracker::api::create_app_state(state.clone(), None);
    TestApp {
        state,
        router: ffe_tracker::api::router(app_state),
    }
}

async fn add_member(app: &TestApp, username: &str) -> i32 {
    app.state
        .account_service
        .create_account(NewAccount {
            username: username.to_string(),
            nickname: None,
            email: None,
            password: USER_PASSWORD.to_string(),
            is_admin: false,
            is_active: true,
            theme: Default::default(),
            notifications_enabled: true,
            preferred_language: Default::default(),
        })
        .await
        .expect("Failed to create member")
        .id
}

async fn send(
    app: &TestApp,
    method: &str,
    uri: &str,
    cookie: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Option<String>, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .map(|v| v.to_str().unwrap().split(';').next().unwrap().to_string());
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, set_cookie, json)
}

async fn login(app: &TestApp, username: &str, password: &str) -> String {
    let (status, cookie, body) = send(
        app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({"username": username, "password": password})),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "login failed: {body}");
    cookie.expect("login did not set a session cookie")
}

#[tokio::test]
async fn test_health_endpoints() {
    let app = spawn_app().await;

    let (status, _, body) = send(&app, "GET", "/api/system/health/live", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "alive");

    let (status, _, body) = send(&app, "GET", "/api/system/health/ready", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["checks"]["database"], true);
}

#[tokio::test]
async fn test_security_headers() {
    let app = spawn_app().await;

    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/system/health/live")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(
        response.headers().get("x-content-type-options").unwrap(),
        "nosniff"
    );
    assert_eq!(response.headers().get("x-frame-options").unwrap(), "DENY");
}

#[tokio::test]
async fn test_session_login_flow() {
    let app = spawn_app().await;

    let (status, _, _) = send(&app, "GET", "/api/auth/me", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let cookie = login(&app, "admin", ADMIN_PASSWORD).await;
    assert!(cookie.starts_with("ffe_session="));

    let (status, _, body) = send(&app, "GET", "/api/auth/me", Some(&cookie), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["username"], "admin");
    assert_eq!(body["data"]["is_admin"], true);
    assert!(body["data"].get("password_hash").is_none());

    let (status, _, _) = send(&app, "POST", "/api/auth/logout", Some(&cookie), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _, _) = send(&app, "GET", "/api/auth/me", Some(&cookie), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_login_errors_do_not_reveal_usernames() {
    let app = spawn_app().await;

    let (status, _, unknown) = send(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({"username": "ghost", "password": "whatever-123"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _, wrong) = send(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({"username": "admin", "password": "whatever-123"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown["error"], wrong["error"]);

    let (status, _, _) = send(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({"username": "  ", "password": "x"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_lockout_returns_423() {
    let app = spawn_app().await;
    add_member(&app, "alice").await;

    for _ in 0..4 {
        let (status, _, _) = send(
            &app,
            "POST",
            "/api/auth/login",
            None,
            Some(json!({"username": "alice", "password": "wrong-password"})),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    let (status, _, body) = send(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({"username": "alice", "password": "wrong-password"})),
    )
    .await;
    assert_eq!(status, StatusCode::LOCKED);
    assert!(body["data"]["locked_until"].is_string());

    let (status, _, _) = send(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({"username": "alice", "password": USER_PASSWORD})),
    )
    .await;
    assert_eq!(status, StatusCode::LOCKED);
}

#[tokio::test]
async fn test_disabled_account_gets_403() {
    let app = spawn_app().await;
    let id = add_member(&app, "alice").await;
    app.state.account_service.set_active(id, false).await.unwrap();

    let (status, _, _) = send(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({"username": "alice", "password": USER_PASSWORD})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_disabling_account_ends_its_session() {
    let app = spawn_app().await;
    let id = add_member(&app, "alice").await;
    let cookie = login(&app, "alice", USER_PASSWORD).await;

    app.state.account_service.set_active(id, false).await.unwrap();

    let (status, _, _) = send(&app, "GET", "/api/auth/me", Some(&cookie), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_admin_routes_require_admin() {
    let app = spawn_app().await;
    add_member(&app, "alice").await;

    let (status, _, _) = send(&app, "GET", "/api/admin/users", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let cookie = login(&app, "alice", USER_PASSWORD).await;
    let (status, _, _) = send(&app, "GET", "/api/admin/users", Some(&cookie), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _, _) = send(&app, "GET", "/api/admin/settings", Some(&cookie), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_admin_account_management() {
    let app = spawn_app().await;
    let cookie = login(&app, "admin", ADMIN_PASSWORD).await;

    let (status, _, body) = send(
        &app,
        "POST",
        "/api/admin/users",
        Some(&cookie),
        Some(json!({
            "username": "bob",
            "nickname": "Bobby",
            "password": USER_PASSWORD,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let bob = body["data"]["id"].as_i64().unwrap();
    assert_eq!(body["data"]["theme"], "default");

    let (status, _, _) = send(
        &app,
        "POST",
        "/api/admin/users",
        Some(&cookie),
        Some(json!({"username": "bob", "password": USER_PASSWORD})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _, body) = send(&app, "GET", "/api/admin/users", Some(&cookie), None).await;
    assert_eq!(status, StatusCode::OK);
    let users = body["data"].as_array().unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0]["username"], "bob");

    let (status, _, body) = send(&app, "GET", "/api/admin/users/1", Some(&cookie), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["is_protected"], true);

    let (status, _, _) = send(&app, "DELETE", "/api/admin/users/1", Some(&cookie), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _, body) = send(
        &app,
        "PUT",
        &format!("/api/admin/users/{bob}/active"),
        Some(&cookie),
        Some(json!({"active": false})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["is_active"], false);

    let (status, _, body) = send(&app, "GET", "/api/admin/stats", Some(&cookie), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total"], 2);
    assert_eq!(body["data"]["active"], 1);

    let (status, _, _) = send(
        &app,
        "DELETE",
        &format!("/api/admin/users/{bob}"),
        Some(&cookie),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _, _) = send(
        &app,
        "GET",
        &format!("/api/admin/users/{bob}"),
        Some(&cookie),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _, _) = send(&app, "GET", "/api/admin/users/0", Some(&cookie), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_admin_settings() {
    let app = spawn_app().await;
    let cookie = login(&app, "admin", ADMIN_PASSWORD).await;

    let (status, _, body) = send(&app, "GET", "/api/admin/settings", Some(&cookie), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 12);

    let (status, _, body) = send(
        &app,
        "PUT",
        "/api/admin/settings",
        Some(&cookie),
        Some(json!({"upload_max_size_mb": 75, "unknown_key": "x"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["count"], 1);

    let (status, _, _) = send(
        &app,
        "PUT",
        "/api/admin/settings",
        Some(&cookie),
        Some(json!({"upload_max_size_mb": 2048})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _, body) = send(
        &app,
        "POST",
        "/api/admin/settings/reset",
        Some(&cookie),
        Some(json!({"key": "upload_max_size_mb"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["count"], 1);

    let (status, _, body) = send(
        &app,
        "POST",
        "/api/admin/settings/reset",
        Some(&cookie),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["count"], 12);
}

#[tokio::test]
async fn test_self_service() {
    let app = spawn_app().await;
    add_member(&app, "alice").await;
    let cookie = login(&app, "alice", USER_PASSWORD).await;

    let (status, _, body) = send(
        &app,
        "PUT",
        "/api/me/profile",
        Some(&cookie),
        Some(json!({"nickname": "Alice", "email": "alice@example.com"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["nickname"], "Alice");

    let (status, _, body) = send(
        &app,
        "PUT",
        "/api/me/preferences",
        Some(&cookie),
        Some(json!({"theme": "macaron", "preferred_language": "en"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["theme"], "macaron");
    assert_eq!(body["data"]["preferred_language"], "en");

    let (status, _, _) = send(
        &app,
        "PUT",
        "/api/me/password",
        Some(&cookie),
        Some(json!({
            "current_password": USER_PASSWORD,
            "new_password": "another-password-2",
            "confirm_password": "mismatch-password",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _, _) = send(
        &app,
        "PUT",
        "/api/me/password",
        Some(&cookie),
        Some(json!({
            "current_password": USER_PASSWORD,
            "new_password": "another-password-2",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _, _) = send(&app, "GET", "/api/auth/me", Some(&cookie), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    login(&app, "alice", "another-password-2").await;
}

#[tokio::test]
async fn test_bootstrap_is_idempotent() {
    let app = spawn_app().await;

    let outcome = ffe_tracker::cli::bootstrap(&app.state, false).await.unwrap();
    assert!(matches!(
        outcome,
        ffe_tracker::cli::BootstrapOutcome::AlreadyExists { .. }
    ));

    let outcome = ffe_tracker::cli::bootstrap(&app.state, true).await.unwrap();
    let ffe_tracker::cli::BootstrapOutcome::PasswordReset {
        account,
        generated_password,
    } = outcome
    else {
        panic!("expected a password reset");
    };
    assert_eq!(account.id, 1);
    assert!(generated_password.is_none());
    assert!(app.state.account_service.is_protected(account.id).await.unwrap());
}
