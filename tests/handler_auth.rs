mod common;

use serde_json::{Value, json};

#[tokio::test]
async fn test_login_issues_session_and_cookie() {
    let app = common::create_test_app();
    let server = common::admin_server(app.state.clone());

    let response = server
        .post("/admin/login")
        .json(&json!({ "token": common::ADMIN_TOKEN }))
        .await;

    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    let token = body["token"].as_str().unwrap();
    assert!(token.contains('.'));
    assert!(body["expires_at"].is_string());

    let cookie = response.header("set-cookie");
    let cookie = cookie.to_str().unwrap();
    assert!(cookie.starts_with(&format!("{}={}", common::COOKIE_NAME, token)));
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("SameSite=Strict"));
    assert!(cookie.contains("Max-Age=3600"));
}

#[tokio::test]
async fn test_login_wrong_token() {
    let app = common::create_test_app();
    let server = common::admin_server(app.state.clone());

    let response = server
        .post("/admin/login")
        .json(&json!({ "token": "wrong-token" }))
        .await;

    assert_eq!(response.status_code(), 401);
    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "unauthorized");
}

#[tokio::test]
async fn test_login_empty_token() {
    let app = common::create_test_app();
    let server = common::admin_server(app.state.clone());

    let response = server.post("/admin/login").json(&json!({ "token": "" })).await;

    assert_eq!(response.status_code(), 400);
}

#[tokio::test]
async fn test_logout_revokes_session() {
    let app = common::create_test_app();
    let server = common::admin_server(app.state.clone());
    let token = common::login(&server).await;

    let before = server
        .get("/admin/short-urls/1/variants")
        .authorization_bearer(&token)
        .await;
    assert_eq!(before.status_code(), 200);

    let logout = server.post("/admin/logout").authorization_bearer(&token).await;
    assert_eq!(logout.status_code(), 204);
    assert!(logout.header("set-cookie").to_str().unwrap().contains("Max-Age=0"));

    let after = server
        .get("/admin/short-urls/1/variants")
        .authorization_bearer(&token)
        .await;
    assert_eq!(after.status_code(), 401);
}

#[tokio::test]
async fn test_sessions_are_independent() {
    let app = common::create_test_app();
    let server = common::admin_server(app.state.clone());
    let first = common::login(&server).await;
    let second = common::login(&server).await;
    assert_ne!(first, second);

    server.post("/admin/logout").authorization_bearer(&first).await;

    let response = server
        .get("/admin/short-urls/1/variants")
        .authorization_bearer(&second)
        .await;
    assert_eq!(response.status_code(), 200);
}

#[tokio::test]
async fn test_logout_requires_session() {
    let app = common::create_test_app();
    let server = common::admin_server(app.state.clone());

    let response = server.post("/admin/logout").await;

    assert_eq!(response.status_code(), 401);
}
