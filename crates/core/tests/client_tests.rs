//! Integration tests for the Auth Service client

use lims_portal_core::{AuthApi, AuthClient, ClientError, CredentialTransport, Credentials};
use serde_json::json;
use std::time::Duration;
use url::Url;
use wiremock::matchers::{body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn base(server: &MockServer) -> Url {
    Url::parse(&format!("{}/", server.uri())).unwrap()
}

#[tokio::test]
async fn test_ping_success() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = AuthClient::new().unwrap();
    client.ping(&base(&mock_server)).await.unwrap();
}

#[tokio::test]
async fn test_custom_user_agent_is_sent() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(header("user-agent", "lims-kiosk/2.1"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = AuthClient::builder()
        .user_agent("lims-kiosk/2.1")
        .build()
        .unwrap();
    client.ping(&base(&mock_server)).await.unwrap();
}

#[tokio::test]
async fn test_ping_error_status() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&mock_server)
        .await;

    let client = AuthClient::new().unwrap();
    let err = client.ping(&base(&mock_server)).await.unwrap_err();
    assert!(matches!(err, ClientError::ServerError { status: 503, .. }));
}

#[tokio::test]
async fn test_login_form_body_is_url_encoded() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/login"))
        .and(header("content-type", "application/x-www-form-urlencoded"))
        .and(body_string_contains("email=a%2Bb%40lab.test"))
        .and(body_string_contains("password=p%26ss+word"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "jwt-token",
            "token_type": "bearer",
            "user_id": 1,
            "email": "a+b@lab.test"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = AuthClient::builder()
        .transport(CredentialTransport::Form)
        .build()
        .unwrap();
    let response = client
        .login(&base(&mock_server), &Credentials::new("a+b@lab.test", "p&ss word"))
        .await
        .unwrap();

    assert_eq!(response.access_token, "jwt-token");
    assert_eq!(response.email.as_deref(), Some("a+b@lab.test"));
}

#[tokio::test]
async fn test_login_query_transport() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/login"))
        .and(query_param("email", "a+b@lab.test"))
        .and(query_param("password", "p&ss word"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access_token": "t"})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = AuthClient::builder()
        .transport(CredentialTransport::Query)
        .build()
        .unwrap();
    let response = client
        .login(&base(&mock_server), &Credentials::new("a+b@lab.test", "p&ss word"))
        .await
        .unwrap();

    assert_eq!(response.access_token, "t");
}

#[tokio::test]
async fn test_login_under_base_path() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access_token": "t"})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let base = Url::parse(&format!("{}/api/", mock_server.uri())).unwrap();
    let client = AuthClient::new().unwrap();
    client
        .login(&base, &Credentials::new("a@b.c", "pw"))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_login_rejected() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/login"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({"detail": "Incorrect email or password"})),
        )
        .mount(&mock_server)
        .await;

    let client = AuthClient::new().unwrap();
    let err = client
        .login(&base(&mock_server), &Credentials::new("a@b.c", "wrong"))
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::AuthenticationFailed(_)));
}

#[tokio::test]
async fn test_login_missing_token_field() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"token": "wrong-field"})))
        .mount(&mock_server)
        .await;

    let client = AuthClient::new().unwrap();
    let err = client
        .login(&base(&mock_server), &Credentials::new("a@b.c", "pw"))
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Serialization(_)));
}

#[tokio::test]
async fn test_client_timeout() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
        .mount(&mock_server)
        .await;

    let client = AuthClient::builder()
        .timeout(Duration::from_millis(200))
        .build()
        .unwrap();
    let err = client.ping(&base(&mock_server)).await.unwrap_err();
    assert!(matches!(err, ClientError::Request(ref e) if e.is_timeout()));
}
