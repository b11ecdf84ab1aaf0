mod common;

use std::sync::Arc;
use actix_web::cookie::Cookie;
use actix_web::dev::ServiceResponse;
use actix_web::{http::StatusCode, test, web, App};
use serde_json::{json, Value};
use legal_oracle::models::chat_request::SCHEMA_HEADER;
use legal_oracle::routes::app_state::{session_middleware, AppState, SESSION_COOKIE};
use legal_oracle::routes::{auth_routes, chat_routes};
use legal_oracle::services::transport::Transport;
use common::{test_config, CannedTransport, ADMIN_EMAIL, ADMIN_PASSWORD};

const OLLAMA_REPLY: &[&str] = &[
    concat!(
        r#"{"model":"llama3","created_at":"2024-05-01T10:00:00Z","#,
        r#""message":{"role":"assistant","content":"Liability is limited "},"done":false}"#,
        "\n",
    ),
    concat!(
        r#"{"model":"llama3","created_at":"2024-05-01T10:00:01Z","message":{"role":"assistant","#,
        r#""content":"(Source: Contracts Act, Page 12)."},"done":false}"#,
        "\n",
    ),
    concat!(
        r#"{"model":"llama3","created_at":"2024-05-01T10:00:02Z","#,
        r#""message":{"role":"assistant","content":""},"done":true}"#,
        "\n",
    ),
];

macro_rules! app {
    ($transport:expr) => {
        app!(test_config(), $transport)
    };
    ($config:expr, $transport:expr) => {{
        let config = $config;
        let key = config.session_key();
        let transport: Arc<dyn Transport> = $transport;
        let state = AppState::new(config, transport);
        test::init_service(
            App::new()
                .wrap(session_middleware(key, false))
                .app_data(web::Data::new(state))
                .configure(chat_routes::init_routes)
                .configure(auth_routes::init_routes),
        )
        .await
    }};
}

fn session_cookie(resp: &ServiceResponse) -> Cookie<'static> {
    resp.response()
        .cookies()
        .find(|c| c.name() == SESSION_COOKIE)
        .map(|c| c.into_owned())
        .expect("login should set the session cookie")
}

macro_rules! login {
    ($app:expr) => {{
        let req = test::TestRequest::post()
            .uri("/api/auth/login")
            .set_json(json!({ "email": ADMIN_EMAIL, "password": ADMIN_PASSWORD }))
            .to_request();
        let resp = test::call_service($app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        session_cookie(&resp)
    }};
}

#[actix_web::test]
async fn test_chat_requires_login() {
    let transport = CannedTransport::new(OLLAMA_REPLY.to_vec());
    let app = app!(transport.clone());

    let req = test::TestRequest::post()
        .uri("/api/chat")
        .set_json(json!({ "message": "Hello", "mode": "local" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = test::read_body_json(resp).await;
    assert!(body["error"].is_string());
    assert_eq!(transport.call_count(), 0);
}

#[actix_web::test]
async fn test_chat_streams_local_reply() {
    let transport = CannedTransport::new(OLLAMA_REPLY.to_vec());
    let app = app!(transport.clone());
    let cookie = login!(&app);

    let req = test::TestRequest::post()
        .uri("/api/chat")
        .cookie(cookie)
        .set_json(json!({ "message": "Is liability limited?", "mode": "local" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let content_type = resp.headers().get("content-type").unwrap().to_str().unwrap().to_string();
    assert!(content_type.starts_with("text/plain"));

    let body = test::read_body(resp).await;
    assert_eq!(
        std::str::from_utf8(&body).unwrap(),
        "Liability is limited (Source: Contracts Act, Page 12)."
    );
    assert_eq!(transport.call_count(), 1);
}

#[actix_web::test]
async fn test_chat_without_cloud_key_is_bad_request() {
    let transport = CannedTransport::new(Vec::new());
    let app = app!(transport.clone());
    let cookie = login!(&app);

    let req = test::TestRequest::post()
        .uri("/api/chat")
        .cookie(cookie)
        .set_json(json!({
            "message": "Hello",
            "mode": "cloud",
            "apiKey": "your_cohere_api_key_here"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert!(body["error"].as_str().unwrap().contains("COHERE_API_KEY"));
    assert_eq!(transport.call_count(), 0);
}

#[actix_web::test]
async fn test_malformed_chat_body_is_bad_request() {
    let transport = CannedTransport::new(Vec::new());
    let app = app!(transport.clone());
    let cookie = login!(&app);

    let bodies = [
        r#"{"message": "#,
        r#"{"message": "Hi", "prompt": "unknown field"}"#,
        r#"{"messages": []}"#,
    ];
    for body in bodies {
        let req = test::TestRequest::post()
            .uri("/api/chat")
            .cookie(cookie.clone())
            .insert_header(("content-type", "application/json"))
            .set_payload(body)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "body: {}", body);
    }
    assert_eq!(transport.call_count(), 0);
}

#[actix_web::test]
async fn test_legacy_schema_is_migrated() {
    let transport = CannedTransport::new(OLLAMA_REPLY.to_vec());
    let app = app!(transport.clone());
    let cookie = login!(&app);

    let req = test::TestRequest::post()
        .uri("/api/chat")
        .cookie(cookie)
        .insert_header((SCHEMA_HEADER, "0"))
        .set_json(json!({ "messages": [{ "role": "user", "content": "Hello" }], "useLocal": true }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(transport.call_count(), 1);
}

#[actix_web::test]
async fn test_login_rejects_wrong_password() {
    let app = app!(CannedTransport::new(Vec::new()));

    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(json!({ "email": ADMIN_EMAIL, "password": "guess" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(json!({ "email": ADMIN_EMAIL }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn test_blank_login_is_bad_request_without_admin_configured() {
    let mut config = test_config();
    config.admin_email = None;
    config.admin_password_hash = None;
    let app = app!(config, CannedTransport::new(Vec::new()));

    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(json!({}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(json!({ "email": ADMIN_EMAIL, "password": ADMIN_PASSWORD }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[actix_web::test]
async fn test_session_status_and_logout() {
    let app = app!(CannedTransport::new(Vec::new()));

    let req = test::TestRequest::get().uri("/api/auth/session").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["isLoggedIn"], false);

    let cookie = login!(&app);
    let req = test::TestRequest::get().uri("/api/auth/session").cookie(cookie.clone()).to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["isLoggedIn"], true);
    assert_eq!(body["email"], ADMIN_EMAIL);
    assert!(body["expiresAt"].as_i64().unwrap() > 0);

    let req = test::TestRequest::post().uri("/api/auth/logout").cookie(cookie).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let cleared = resp
        .response()
        .cookies()
        .find(|c| c.name() == SESSION_COOKIE)
        .map(|c| c.value().is_empty())
        .unwrap_or(true);
    assert!(cleared);
}

#[actix_web::test]
async fn test_change_password() {
    let app = app!(CannedTransport::new(Vec::new()));

    let req = test::TestRequest::post()
        .uri("/api/auth/change-password")
        .set_json(json!({
            "currentPassword": ADMIN_PASSWORD,
            "newPassword": "a brand new password"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let cookie = login!(&app);
    let req = test::TestRequest::post()
        .uri("/api/auth/change-password")
        .cookie(cookie.clone())
        .set_json(json!({ "currentPassword": ADMIN_PASSWORD, "newPassword": "short" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::post()
        .uri("/api/auth/change-password")
        .cookie(cookie)
        .set_json(json!({
            "currentPassword": ADMIN_PASSWORD,
            "newPassword": "a brand new password"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], true);
    assert!(!body.to_string().contains("$argon2"));

    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(json!({ "email": ADMIN_EMAIL, "password": "a brand new password" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
}
