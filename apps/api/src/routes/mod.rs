pub mod health;

use axum::{
    http::{header, HeaderName, Method},
    routing::get,
    Router,
};
use serde::{de::DeserializeOwned, Deserialize};
use tower_http::cors::{Any, CorsLayer};

use crate::auth;
use crate::commerce;
use crate::errors::AppError;
use crate::state::AppState;

/// Query shape shared by the POST dispatchers: the action name alone.
#[derive(Debug, Deserialize)]
pub struct ActionQuery {
    #[serde(default)]
    pub action: String,
}

/// Parses an action body. A missing body counts as `{}` so actions whose
/// fields are all defaultable still dispatch; anything unparseable is
/// rejected uniformly, whatever the action.
pub(crate) fn parse_body<T: DeserializeOwned>(raw: &str) -> Result<T, AppError> {
    let raw = if raw.trim().is_empty() { "{}" } else { raw };
    serde_json::from_str(raw).map_err(|_| AppError::InvalidRequest)
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route(
            "/api/auth",
            get(auth::handlers::handle_get).post(auth::handlers::handle_post),
        )
        .route(
            "/api/subscriptions",
            get(commerce::handlers::handle_get).post(commerce::handlers::handle_post),
        )
        .with_state(state)
}

/// CORS policy for the mobile/web clients: any origin, GET/POST/OPTIONS,
/// Content-Type and X-User-Id request headers. Preflights are answered by the
/// layer and never reach the dispatchers.
pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, HeaderName::from_static("x-user-id")])
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{header, Method, Request, StatusCode};
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;
    use uuid::Uuid;

    use super::*;
    use crate::auth::codes::InMemoryCodeStore;
    use crate::auth::sms::LogSmsSender;
    use crate::commerce::payments::StubGateway;
    use crate::config::Config;

    /// App over a lazy pool: nothing connects until a query actually runs, so
    /// every path that stops before the database is exercisable end to end.
    fn make_state(expose_debug_code: bool) -> AppState {
        let db = PgPoolOptions::new()
            .connect_lazy("postgres://postgres@localhost/kommunalka_test")
            .expect("lazy pool");

        AppState {
            db,
            codes: Arc::new(InMemoryCodeStore::new()),
            sms: Arc::new(LogSmsSender),
            payments: Arc::new(StubGateway),
            config: Config {
                database_url: "postgres://postgres@localhost/kommunalka_test".to_string(),
                port: 8080,
                rust_log: "info".to_string(),
                expose_debug_code,
            },
        }
    }

    fn make_app(state: AppState) -> Router {
        build_router(state).layer(cors_layer())
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn read_json(response: axum::response::Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_parse_body_treats_empty_as_empty_object() {
        #[derive(Debug, Deserialize)]
        struct Payload {
            #[serde(default)]
            phone: String,
        }

        let payload: Payload = parse_body("").unwrap();
        assert_eq!(payload.phone, "");

        let payload: Payload = parse_body(r#"{"phone": "123"}"#).unwrap();
        assert_eq!(payload.phone, "123");

        let err = parse_body::<Payload>("{not json").unwrap_err();
        assert!(matches!(err, AppError::InvalidRequest));
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let app = make_app(make_state(false));

        let response = app.oneshot(get_request("/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = read_json(response).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["service"], "kommunalka-api");
    }

    #[tokio::test]
    async fn test_unknown_actions_are_rejected_uniformly() {
        let app = make_app(make_state(false));

        let posts = [
            "/api/auth?action=login",
            "/api/auth",
            "/api/subscriptions?action=refund",
            "/api/subscriptions",
        ];
        for uri in posts {
            let response = app.clone().oneshot(post_json(uri, json!({}))).await.unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{uri}");
            let body = read_json(response).await;
            assert_eq!(body["error"], "Invalid request", "{uri}");
        }

        let gets = [
            "/api/auth?action=send-code",
            "/api/auth",
            "/api/subscriptions?action=activate-trial",
            "/api/subscriptions",
        ];
        for uri in gets {
            let response = app.clone().oneshot(get_request(uri)).await.unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{uri}");
            let body = read_json(response).await;
            assert_eq!(body["error"], "Invalid request", "{uri}");
        }
    }

    #[tokio::test]
    async fn test_malformed_json_body_is_rejected() {
        let app = make_app(make_state(false));

        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/auth?action=send-code")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = read_json(response).await;
        assert_eq!(body["error"], "Invalid request");
    }

    #[tokio::test]
    async fn test_empty_body_counts_as_empty_object() {
        let app = make_app(make_state(false));

        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/auth?action=complete-registration")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = read_json(response).await;
        assert_eq!(body["error"], "user_id and full_name required");
    }

    #[tokio::test]
    async fn test_send_code_validates_phone_over_http() {
        let app = make_app(make_state(false));

        let response = app
            .oneshot(post_json("/api/auth?action=send-code", json!({"phone": "123"})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = read_json(response).await;
        assert_eq!(body["error"], "Invalid phone number");
    }

    #[tokio::test]
    async fn test_debug_code_is_hidden_by_default() {
        let app = make_app(make_state(false));

        let response = app
            .oneshot(post_json(
                "/api/auth?action=send-code",
                json!({"phone": "79991234567"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = read_json(response).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["message"], "SMS code sent");
        assert!(body.get("debug_code").is_none());
    }

    #[tokio::test]
    async fn test_send_code_then_wrong_code_keeps_entry() {
        let state = make_state(true);
        let codes = state.codes.clone();
        let app = make_app(state);

        let response = app
            .clone()
            .oneshot(post_json(
                "/api/auth?action=send-code",
                json!({"phone": "79991234567"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = read_json(response).await;
        let issued = body["debug_code"].as_str().unwrap().to_string();

        // 0000 can never be issued; the entry must survive the mismatch.
        let response = app
            .oneshot(post_json(
                "/api/auth?action=verify-code",
                json!({"phone": "79991234567", "code": "0000"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = read_json(response).await;
        assert_eq!(body["error"], "Invalid code");

        let pending = codes.get("79991234567").await.unwrap().unwrap();
        assert_eq!(pending.code, issued);
    }

    #[tokio::test]
    async fn test_verify_code_without_entry_over_http() {
        let app = make_app(make_state(false));

        let response = app
            .oneshot(post_json(
                "/api/auth?action=verify-code",
                json!({"phone": "79991234567", "code": "1234"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = read_json(response).await;
        assert_eq!(body["error"], "Code not found or expired");
    }

    #[tokio::test]
    async fn test_verify_expired_code_over_http() {
        let state = make_state(false);
        let codes = state.codes.clone();
        codes
            .set("79991234567", "1234", chrono::Duration::minutes(-5))
            .await
            .unwrap();
        let app = make_app(state);

        let response = app
            .oneshot(post_json(
                "/api/auth?action=verify-code",
                json!({"phone": "79991234567", "code": "1234"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = read_json(response).await;
        assert_eq!(body["error"], "Code expired");

        // Expiry detection also cleans the entry up.
        assert!(codes.get("79991234567").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_check_user_requires_phone_over_http() {
        let app = make_app(make_state(false));

        let response = app
            .oneshot(get_request("/api/auth?action=check-user"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = read_json(response).await;
        assert_eq!(body["error"], "Phone required");
    }

    #[tokio::test]
    async fn test_commerce_get_requires_user_id() {
        let app = make_app(make_state(false));

        for uri in [
            "/api/subscriptions?action=status",
            "/api/subscriptions?action=coins",
        ] {
            let response = app.clone().oneshot(get_request(uri)).await.unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{uri}");
            let body = read_json(response).await;
            assert_eq!(body["error"], "user_id required", "{uri}");
        }
    }

    #[tokio::test]
    async fn test_commerce_get_rejects_malformed_user_id() {
        let app = make_app(make_state(false));

        let response = app
            .oneshot(get_request("/api/subscriptions?action=status&user_id=42"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = read_json(response).await;
        assert_eq!(body["error"], "Invalid user_id");
    }

    #[tokio::test]
    async fn test_purchase_coins_rejects_unknown_package_over_http() {
        let app = make_app(make_state(false));

        let response = app
            .oneshot(post_json(
                "/api/subscriptions?action=purchase-coins",
                json!({"user_id": Uuid::new_v4(), "package": "mega"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = read_json(response).await;
        assert_eq!(body["error"], "Invalid package");
    }

    #[tokio::test]
    async fn test_declined_payment_over_http() {
        let app = make_app(make_state(false));

        let requests = [
            post_json(
                "/api/subscriptions?action=purchase-subscription",
                json!({"user_id": Uuid::new_v4(), "payment_successful": false}),
            ),
            post_json(
                "/api/subscriptions?action=purchase-coins",
                json!({"user_id": Uuid::new_v4(), "package": "basic", "payment_successful": false}),
            ),
        ];

        for request in requests {
            let response = app.clone().oneshot(request).await.unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
            let body = read_json(response).await;
            assert_eq!(body["error"], "Payment failed");
        }
    }

    #[tokio::test]
    async fn test_cors_preflight_is_answered_by_the_layer() {
        let app = make_app(make_state(false));

        let request = Request::builder()
            .method(Method::OPTIONS)
            .uri("/api/auth")
            .header(header::ORIGIN, "https://app.example")
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
            .header(
                header::ACCESS_CONTROL_REQUEST_HEADERS,
                "content-type, x-user-id",
            )
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let headers = response.headers();
        assert_eq!(
            headers
                .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
                .and_then(|v| v.to_str().ok()),
            Some("*")
        );
        let allow_headers = headers
            .get(header::ACCESS_CONTROL_ALLOW_HEADERS)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_lowercase();
        assert!(allow_headers.contains("x-user-id"), "{allow_headers}");
    }
}
