//! HTTP-level tests for login and write-access gating.

mod common;

use axum::http::{Method, StatusCode};
use common::{body_json, json_request, TestApp, TEST_PASSWORD};
use serde_json::json;
use tdm_db::repositories::UserRepo;

#[tokio::test]
async fn login_success_returns_token() {
    let app = TestApp::new().await;
    let user = app.create_user("curator").await;

    let body = json!({ "username": "curator", "password": TEST_PASSWORD });
    let response = app
        .send(json_request(Method::POST, "/api/v1/auth/login", body, None))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert!(json["data"]["access_token"].is_string());
    assert_eq!(json["data"]["token_type"], "Bearer");
    assert_eq!(json["data"]["expires_in"], 3600);
    assert_eq!(json["data"]["user"]["id"], user.id);
    assert_eq!(json["data"]["user"]["username"], "curator");
}

#[tokio::test]
async fn login_wrong_password_is_401() {
    let app = TestApp::new().await;
    app.create_user("curator").await;

    let body = json!({ "username": "curator", "password": "incorrect" });
    let response = app
        .send(json_request(Method::POST, "/api/v1/auth/login", body, None))
        .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let json = body_json(response).await;
    assert_eq!(json["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn login_unknown_user_is_401() {
    let app = TestApp::new().await;

    let body = json!({ "username": "nobody", "password": TEST_PASSWORD });
    let response = app
        .send(json_request(Method::POST, "/api/v1/auth/login", body, None))
        .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn login_deactivated_user_is_403() {
    let app = TestApp::new().await;
    let user = app.create_user("retired").await;
    UserRepo::set_active(&app.pool, user.id, false)
        .await
        .expect("deactivate should succeed");

    let body = json!({ "username": "retired", "password": TEST_PASSWORD });
    let response = app
        .send(json_request(Method::POST, "/api/v1/auth/login", body, None))
        .await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn write_without_token_is_401() {
    let app = TestApp::new().await;

    let body = json!({ "name": "Taj Mahal" });
    let response = app
        .send(json_request(Method::POST, "/api/v1/destinations", body, None))
        .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let json = body_json(response).await;
    assert_eq!(json["error"], "Missing Authorization header");
}

#[tokio::test]
async fn write_with_garbage_token_is_401() {
    let app = TestApp::new().await;

    let body = json!({ "name": "Taj Mahal" });
    let response = app
        .send(json_request(
            Method::POST,
            "/api/v1/destinations",
            body,
            Some("not-a-jwt"),
        ))
        .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn token_of_deactivated_user_is_rejected() {
    let app = TestApp::new().await;
    let token = app.token().await;
    let user = UserRepo::find_by_username(&app.pool, "editor")
        .await
        .expect("query should succeed")
        .expect("user exists");
    UserRepo::set_active(&app.pool, user.id, false)
        .await
        .expect("deactivate should succeed");

    let body = json!({ "name": "Taj Mahal" });
    let response = app
        .send(json_request(
            Method::POST,
            "/api/v1/destinations",
            body,
            Some(&token),
        ))
        .await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn login_token_grants_write_access() {
    let app = TestApp::new().await;
    app.create_user("curator").await;

    let body = json!({ "username": "curator", "password": TEST_PASSWORD });
    let response = app
        .send(json_request(Method::POST, "/api/v1/auth/login", body, None))
        .await;
    let token = body_json(response).await["data"]["access_token"]
        .as_str()
        .expect("token is a string")
        .to_string();

    let response = app
        .send(json_request(
            Method::POST,
            "/api/v1/destinations",
            json!({ "name": "Golden Temple" }),
            Some(&token),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
}
