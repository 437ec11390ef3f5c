//! Session handler tests through the full router

use std::sync::Arc;

use axum::http::StatusCode;
use futures::future::join_all;
use pretty_assertions::assert_eq;
use rstest::*;

use super::helpers::*;

#[fixture]
fn ok_provider() -> Arc<MockSessionProvider> {
    Arc::new(MockSessionProvider::new_success())
}

#[fixture]
fn failing_provider() -> Arc<MockSessionProvider> {
    Arc::new(MockSessionProvider::new_failure())
}

#[rstest]
#[case("/session/totp", r#"{"invalid_field":"value"}"#, "totp_secret is required")]
#[case("/session/totp", r#"{"totp_secret":""}"#, "totp_secret is required")]
#[case("/session/totp", "", "totp_secret is required")]
#[case("/session/login", r#"{"user_id":"testuser"}"#, "user_id, password, and totp_value are required")]
#[case("/session/login", r#"{"user_id":"testuser","password":"pw","totp_value":""}"#, "user_id, password, and totp_value are required")]
#[case("/session/login", "", "user_id, password, and totp_value are required")]
#[case("/session/valid", "{}", "enctoken is required")]
#[case("/session/valid", "", "enctoken is required")]
#[case("/session/totp", "{not json", "Invalid request body")]
#[case("/session/login", r#"{"user_id":42}"#, "Invalid request body")]
#[case("/session/valid", "null", "enctoken is required")]
#[case("/session/valid", r#"{"enctoken":null}"#, "enctoken is required")]
#[case("/session/login", r#"{"user_id":"testuser","password":null,"totp_value":"123456"}"#, "user_id, password, and totp_value are required")]
#[tokio::test]
async fn test_input_errors(
    ok_provider: Arc<MockSessionProvider>,
    #[case] uri: &str,
    #[case] body: &str,
    #[case] message: &str,
) {
    let (status, json) = post(test_router(Arc::clone(&ok_provider)), uri, body).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_error_envelope(&json, "InputException", message);
    assert_eq!(ok_provider.call_count(), 0, "provider must not be called on bad input");
}

#[rstest]
#[tokio::test]
async fn test_generate_totp_success(ok_provider: Arc<MockSessionProvider>) {
    let (status, json) = post(
        test_router(ok_provider),
        "/session/totp",
        r#"{"totp_secret":"JBSWY3DPEHPK3PXP"}"#,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let data = assert_success_envelope(&json);
    assert_eq!(data["totp_value"], "123456");
}

#[rstest]
#[tokio::test]
async fn test_generate_totp_provider_failure(failing_provider: Arc<MockSessionProvider>) {
    let (status, json) = post(
        test_router(failing_provider),
        "/session/totp",
        r#"{"totp_secret":"!!!"}"#,
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_error_envelope(&json, "ServerException", "Failed to generate TOTP value");
}

#[rstest]
#[tokio::test]
async fn test_generate_session_success(ok_provider: Arc<MockSessionProvider>) {
    let (status, json) = post(
        test_router(ok_provider),
        "/session/login",
        r#"{"user_id":"AB1234","password":"testpass","totp_value":"123456"}"#,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let data = assert_success_envelope(&json);
    assert_eq!(data["user_id"], "AB1234");
    assert_eq!(data["enctoken"], "enc-token");
    assert_eq!(data["public_token"], "public-token");
    assert_eq!(data["login_time"], "2024-01-15 09:15:00");
}

#[rstest]
#[tokio::test]
async fn test_generate_session_rejected(failing_provider: Arc<MockSessionProvider>) {
    let (status, json) = post(
        test_router(failing_provider),
        "/session/login",
        r#"{"user_id":"AB1234","password":"wrong","totp_value":"123456"}"#,
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_error_envelope(
        &json,
        "AuthenticationException",
        "Login failed: InputException: Invalid username or password.",
    );
}

#[rstest]
#[case(true)]
#[case(false)]
#[tokio::test]
async fn test_check_enctoken(#[case] valid: bool) {
    let provider = Arc::new(MockSessionProvider {
        enctoken_valid: valid,
        ..MockSessionProvider::default()
    });

    let (status, json) = post(
        test_router(provider),
        "/session/valid",
        r#"{"enctoken":"testenctoken"}"#,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let data = assert_success_envelope(&json);
    assert_eq!(data["is_valid"], valid);
}

#[rstest]
#[tokio::test]
async fn test_check_enctoken_provider_failure(failing_provider: Arc<MockSessionProvider>) {
    let (status, json) = post(
        test_router(failing_provider),
        "/session/valid",
        r#"{"enctoken":"testenctoken"}"#,
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_error_envelope(
        &json,
        "ServerException",
        "Failed to check enctoken: unexpected HTTP status 503",
    );
}

#[rstest]
#[tokio::test]
async fn test_unknown_route(ok_provider: Arc<MockSessionProvider>) {
    let (status, _) = post(test_router(ok_provider), "/session/logout", "{}").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[rstest]
#[tokio::test]
async fn test_wrong_method(ok_provider: Arc<MockSessionProvider>) {
    use axum::{body::Body, http::Request};
    use tower::ServiceExt;

    let response = test_router(ok_provider)
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/session/totp")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[rstest]
#[tokio::test]
async fn test_requests_are_independent(ok_provider: Arc<MockSessionProvider>) {
    let router = test_router(Arc::clone(&ok_provider));

    let requests = (0..8).map(|i| {
        let router = router.clone();
        async move {
            post(
                router,
                "/session/login",
                &format!(r#"{{"user_id":"USER{i}","password":"pw","totp_value":"123456"}}"#),
            )
            .await
        }
    });

    let results = join_all(requests).await;
    for (i, (status, json)) in results.into_iter().enumerate() {
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["user_id"], format!("USER{i}"));
    }
    assert_eq!(ok_provider.call_count(), 8);
}

#[rstest]
#[tokio::test]
async fn test_oversized_body_rejected(ok_provider: Arc<MockSessionProvider>) {
    let secret = "A".repeat(create_test_config().max_body_size + 1);
    let body = serde_json::json!({ "totp_secret": secret }).to_string();

    let (status, json) = post(test_router(Arc::clone(&ok_provider)), "/session/totp", &body).await;

    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_error_envelope(&json, "InputException", "Request body too large");
    assert_eq!(ok_provider.call_count(), 0);
}

#[rstest]
#[case(None)]
#[case(Some("text/plain"))]
#[case(Some("application/x-www-form-urlencoded"))]
#[tokio::test]
async fn test_non_json_body_rejected(
    ok_provider: Arc<MockSessionProvider>,
    #[case] content_type: Option<&str>,
) {
    let (status, json) = post_with_content_type(
        test_router(Arc::clone(&ok_provider)),
        "/session/valid",
        content_type,
        r#"{"enctoken":"testenctoken"}"#,
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_error_envelope(&json, "InputException", "Invalid request body");
    assert_eq!(ok_provider.call_count(), 0);
}

#[tokio::test]
async fn test_generate_totp_with_kite_session() {
    let server = session_api::SessionApiServer::new(create_test_config()).unwrap();

    let (status, json) = post(
        server.router(),
        "/session/totp",
        r#"{"totp_secret":"JBSWY3DPEHPK3PXP"}"#,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let data = assert_success_envelope(&json);
    let value = data["totp_value"].as_str().unwrap();
    assert_eq!(value.len(), 6);
    assert!(value.chars().all(|c| c.is_ascii_digit()));
}

struct SlowProvider;

#[async_trait::async_trait]
impl kite_session::SessionProvider for SlowProvider {
    fn generate_totp_value(&self, _totp_secret: &str) -> kite_session::Result<String> {
        Ok("123456".to_string())
    }

    async fn generate_session(
        &self,
        user_id: &str,
        _password: &str,
        _totp_value: &str,
    ) -> kite_session::Result<kite_session::Session> {
        tokio::time::sleep(std::time::Duration::from_secs(3)).await;
        Ok(test_session(user_id))
    }

    async fn check_enctoken_valid(&self, _enctoken: &str) -> kite_session::Result<bool> {
        Ok(true)
    }
}

#[tokio::test]
async fn test_request_timeout_uses_envelope() {
    let config = session_api::ServiceConfig {
        timeout_seconds: 1,
        ..create_test_config()
    };
    let router = session_api::SessionApiServer::with_provider(config, Arc::new(SlowProvider)).router();

    let (status, json) = post(
        router,
        "/session/login",
        r#"{"user_id":"AB1234","password":"testpass","totp_value":"123456"}"#,
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_error_envelope(&json, "ServerException", "Request timed out");
}

struct PanickingProvider;

#[async_trait::async_trait]
impl kite_session::SessionProvider for PanickingProvider {
    fn generate_totp_value(&self, _totp_secret: &str) -> kite_session::Result<String> {
        panic!("provider exploded");
    }

    async fn generate_session(
        &self,
        _user_id: &str,
        _password: &str,
        _totp_value: &str,
    ) -> kite_session::Result<kite_session::Session> {
        panic!("provider exploded");
    }

    async fn check_enctoken_valid(&self, _enctoken: &str) -> kite_session::Result<bool> {
        panic!("provider exploded");
    }
}

#[tokio::test]
async fn test_handler_panic_recovered() {
    let router =
        session_api::SessionApiServer::with_provider(create_test_config(), Arc::new(PanickingProvider))
            .router();

    let (status, json) = post(router, "/session/totp", r#"{"totp_secret":"JBSWY3DPEHPK3PXP"}"#).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_error_envelope(&json, "ServerException", "Internal server error");
}
