//! Integration tests for the login flow
//!
//! A mock account host serves the login form; the tests cover token and
//! field-name discovery, submission payloads, and the verification gate
//! that protects the download workflow.

use shiori::config::{AuthConfig, HeaderConfig};
use shiori::crawler::build_http_client;
use shiori::session::{login, AuthError, Credentials};
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn header_config() -> HeaderConfig {
    HeaderConfig {
        user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) TestShell/1.0".to_string(),
        accept_language: "en-US,en;q=0.8".to_string(),
        accept: "text/html,application/xhtml+xml".to_string(),
    }
}

fn auth_config(base_url: &str) -> AuthConfig {
    let mut extra_fields = std::collections::BTreeMap::new();
    extra_fields.insert("source".to_string(), "pc".to_string());

    AuthConfig {
        login_url: format!("{}/login", base_url),
        fallback_action: format!("{}/api/login", base_url),
        verify_url: format!("{}/dashboard", base_url),
        logout_marker: "logout".to_string(),
        username: Some("someone".to_string()),
        password: Some("hunter2".to_string()),
        extra_fields,
    }
}

fn credentials() -> Credentials {
    Credentials {
        username: "someone".to_string(),
        password: "hunter2".to_string(),
    }
}

const LOGIN_FORM: &str = r#"<html><body>
    <form action="/api/login" method="post">
        <input type="hidden" name="post_key" value="token-abc-123">
        <input type="text" name="account" autocomplete="username">
        <input type="password" name="secret" autocomplete="current-password">
    </form>
</body></html>"#;

async fn mount_login_page(server: &MockServer, body: &str) {
    Mock::given(method("GET"))
        .and(path("/login"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body.to_string()))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_login_succeeds_with_declared_fields_and_token() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_login_page(&mock_server, LOGIN_FORM).await;

    // The POST must carry the discovered field names, the extra fields, and
    // the anti-forgery token under its own alias
    Mock::given(method("POST"))
        .and(path("/api/login"))
        .and(body_string_contains("account=someone"))
        .and(body_string_contains("secret=hunter2"))
        .and(body_string_contains("source=pc"))
        .and(body_string_contains("post_key=token-abc-123"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/dashboard"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("<html><body><a href='/logout'>Logout</a></body></html>"),
        )
        .mount(&mock_server)
        .await;

    let client = build_http_client(&header_config(), 5, true).unwrap();
    let session = login(client, &auth_config(&base_url), &credentials())
        .await
        .unwrap();

    assert_eq!(session.username(), "someone");
}

#[tokio::test]
async fn test_login_uses_default_field_names_without_metadata() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    // Inputs carry no autocomplete metadata and no names
    mount_login_page(
        &mock_server,
        r#"<form action="/api/login"><input type="text"><input type="password"></form>"#,
    )
    .await;

    Mock::given(method("POST"))
        .and(path("/api/login"))
        .and(body_string_contains("login_id=someone"))
        .and(body_string_contains("password=hunter2"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/dashboard"))
        .respond_with(ResponseTemplate::new(200).set_body_string("hello someone"))
        .mount(&mock_server)
        .await;

    let client = build_http_client(&header_config(), 5, true).unwrap();
    let result = login(client, &auth_config(&base_url), &credentials()).await;
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_login_falls_back_to_configured_action() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    // Form without an action attribute: submission goes to fallback-action
    mount_login_page(&mock_server, r#"<form><input name="login_id"></form>"#).await;

    Mock::given(method("POST"))
        .and(path("/api/login"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/dashboard"))
        .respond_with(ResponseTemplate::new(200).set_body_string("logout"))
        .mount(&mock_server)
        .await;

    let client = build_http_client(&header_config(), 5, true).unwrap();
    let result = login(client, &auth_config(&base_url), &credentials()).await;
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_unreachable_login_page() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/login"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;

    let client = build_http_client(&header_config(), 5, true).unwrap();
    let result = login(client, &auth_config(&base_url), &credentials()).await;

    assert!(matches!(result, Err(AuthError::PageUnreachable { .. })));
}

#[tokio::test]
async fn test_login_page_without_form() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_login_page(&mock_server, "<html><body><p>maintenance</p></body></html>").await;

    let client = build_http_client(&header_config(), 5, true).unwrap();
    let result = login(client, &auth_config(&base_url), &credentials()).await;

    assert!(matches!(result, Err(AuthError::FormNotFound)));
}

#[tokio::test]
async fn test_rejected_submission() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_login_page(&mock_server, LOGIN_FORM).await;

    Mock::given(method("POST"))
        .and(path("/api/login"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&mock_server)
        .await;

    let client = build_http_client(&header_config(), 5, true).unwrap();
    let result = login(client, &auth_config(&base_url), &credentials()).await;

    assert!(matches!(result, Err(AuthError::SubmissionRejected { .. })));
}

#[tokio::test]
async fn test_verification_failure_without_signed_in_marker() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_login_page(&mock_server, LOGIN_FORM).await;

    Mock::given(method("POST"))
        .and(path("/api/login"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock_server)
        .await;

    // The verify page shows neither a logout affordance nor the username
    Mock::given(method("GET"))
        .and(path("/dashboard"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string("<html><body>please sign in</body></html>"),
        )
        .mount(&mock_server)
        .await;

    let client = build_http_client(&header_config(), 5, true).unwrap();
    let result = login(client, &auth_config(&base_url), &credentials()).await;

    assert!(matches!(result, Err(AuthError::VerificationFailed)));
}
