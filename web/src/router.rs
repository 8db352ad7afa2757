use crate::{
    controller::{auth_controller, health_check_controller},
    middleware::auth::require_auth,
    response::session_user::SessionUser,
    AppState,
};
use axum::{
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use domain::SESSION_COOKIE_NAME;

use utoipa::{
    openapi::security::{ApiKey, ApiKeyValue, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_rapidoc::RapiDoc;

// This is the global definition of our OpenAPI spec. To be a part
// of the rendered spec, a path and schema must be listed here.
#[derive(OpenApi)]
#[openapi(
        info(
            title = "Club Portal API"
        ),
        paths(
            auth_controller::login,
            auth_controller::callback,
            auth_controller::logout,
            auth_controller::session,
            health_check_controller::health_check,
        ),
        components(
            schemas(
                SessionUser,
            )
        ),
        modifiers(&SecurityAddon),
        tags(
            (name = "club_portal", description = "Club Portal sign-in API")
        )
    )]
struct ApiDoc;

struct SecurityAddon;

// Defines our signed session cookie authentication requirement for OpenAPI.
impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "cookie_auth",
                SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                    SESSION_COOKIE_NAME,
                    "Signed session token returned from a successful Google sign-in via Set-Cookie header",
                ))),
            )
        }
    }
}

pub fn define_routes(app_state: AppState) -> Router {
    Router::new()
        .merge(auth_routes(app_state.clone()))
        .merge(session_routes(app_state))
        .merge(health_routes())
        .merge(RapiDoc::with_openapi("/api-docs/openapi.json", ApiDoc::openapi()).path("/rapidoc"))
}

/// Routes for the Google sign-in handshake
fn auth_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/api/auth/login", get(auth_controller::login))
        .route("/api/auth/callback", get(auth_controller::callback))
        .route("/api/auth/logout", post(auth_controller::logout))
        .with_state(app_state)
}

fn session_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/api/auth/session", get(auth_controller::session))
        .route_layer(from_fn_with_state(app_state.clone(), require_auth))
        .with_state(app_state)
}

fn health_routes() -> Router {
    Router::new().route("/health", get(health_check_controller::health_check))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{to_bytes, Body},
        http::{
            header::{COOKIE, LOCATION, SET_COOKIE},
            Request, Response, StatusCode,
        },
    };
    use club_auth::http::HttpClientConfig;
    use club_auth::oauth::providers::google::GoogleOAuthUrls;
    use club_auth::SecretString;
    use domain::auth_flow::{AuthFlow, AuthSettings};
    use domain::{Cookie, Role, SessionClaims, STATE_COOKIE_NAME};
    use mockito::{Matcher, Server, ServerGuard};
    use serde_json::json;
    use tower::ServiceExt;

    const BASE_URL: &str = "http://localhost:3000";

    fn settings(server_url: &str) -> AuthSettings {
        AuthSettings {
            base_url: BASE_URL.to_string(),
            signing_secret: Some(SecretString::new("router_test_secret".to_string())),
            google_client_id: Some("client-id".to_string()),
            google_client_secret: Some(SecretString::new("client-secret".to_string())),
            google_urls: GoogleOAuthUrls {
                auth_url: format!("{server_url}/auth"),
                token_url: format!("{server_url}/token"),
                userinfo_url: format!("{server_url}/userinfo"),
            },
            secure_cookies: false,
            http: HttpClientConfig::default(),
        }
    }

    fn app_for(settings: AuthSettings) -> (AppState, Router) {
        let app_state = AppState::new(AuthFlow::new(settings));
        let router = define_routes(app_state.clone());
        (app_state, router)
    }

    fn get_request(uri: &str, cookie: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(COOKIE, cookie);
        }
        builder.body(Body::empty()).unwrap()
    }

    fn set_cookies(response: &Response<Body>) -> Vec<Cookie<'static>> {
        response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .map(|value| Cookie::parse(value.to_str().unwrap().to_string()).unwrap())
            .collect()
    }

    fn find<'a>(cookies: &'a [Cookie<'static>], name: &str) -> Option<&'a Cookie<'static>> {
        cookies.iter().find(|c| c.name() == name)
    }

    fn location(response: &Response<Body>) -> String {
        response
            .headers()
            .get(LOCATION)
            .unwrap()
            .to_str()
            .unwrap()
            .to_string()
    }

    async fn mock_google_success(server: &mut ServerGuard) {
        server
            .mock("POST", "/token")
            .match_body(Matcher::UrlEncoded("code".into(), "google-code".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"access_token":"ya29.router","token_type":"Bearer","expires_in":3599}"#)
            .create_async()
            .await;
        server
            .mock("GET", "/userinfo")
            .match_header("authorization", "Bearer ya29.router")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"sub":"1077","name":"Alex Chair","email":"alex@example.com","picture":"https://example.com/a.png"}"#,
            )
            .create_async()
            .await;
    }

    /// Runs the login step and returns (nonce, state cookie value).
    async fn start_login(router: &Router, from: &str) -> (String, String) {
        let response = router
            .clone()
            .oneshot(get_request(&format!("/api/auth/login?from={from}"), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);

        let nonce = location(&response)
            .split("state=")
            .nth(1)
            .unwrap()
            .to_string();
        let cookies = set_cookies(&response);
        let state_cookie = find(&cookies, STATE_COOKIE_NAME).unwrap();
        assert!(state_cookie.http_only().unwrap_or(false));
        assert_eq!(state_cookie.max_age().map(|d| d.whole_seconds()), Some(600));

        (nonce, state_cookie.value().to_string())
    }

    #[tokio::test]
    async fn test_health_check() {
        let (_, router) = app_for(settings("http://127.0.0.1:1"));
        let response = router.oneshot(get_request("/health", None)).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"healthy");
    }

    #[tokio::test]
    async fn test_login_redirects_to_google() {
        let (_, router) = app_for(settings("https://accounts.example"));
        let response = router
            .oneshot(get_request("/api/auth/login?from=/dashboard", None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
        let location = location(&response);
        assert!(location.starts_with("https://accounts.example/auth?client_id=client-id&"));
        assert!(location.contains("scope=openid%20email%20profile"));
        assert!(find(&set_cookies(&response), STATE_COOKIE_NAME).is_some());
    }

    #[tokio::test]
    async fn test_login_without_credentials_is_500_json() {
        let mut settings = settings("https://accounts.example");
        settings.google_client_id = None;
        let (_, router) = app_for(settings);

        let response = router
            .oneshot(get_request("/api/auth/login", None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert!(value["message"].is_string());
    }

    #[tokio::test]
    async fn test_login_then_callback_sets_session_and_returns_to_origin() {
        let mut server = Server::new_async().await;
        mock_google_success(&mut server).await;
        let (_, router) = app_for(settings(&server.url()));

        let (nonce, state_cookie) = start_login(&router, "/dashboard").await;
        let response = router
            .clone()
            .oneshot(get_request(
                &format!("/api/auth/callback?code=google-code&state={nonce}"),
                Some(&format!("{STATE_COOKIE_NAME}={state_cookie}")),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(location(&response), format!("{BASE_URL}/dashboard"));

        let cookies = set_cookies(&response);
        assert_eq!(find(&cookies, STATE_COOKIE_NAME).unwrap().value(), "");
        let session_cookie = find(&cookies, SESSION_COOKIE_NAME).unwrap();
        assert!(!session_cookie.value().is_empty());

        let response = router
            .oneshot(get_request(
                "/api/auth/session",
                Some(&format!("{SESSION_COOKIE_NAME}={}", session_cookie.value())),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["status_code"], json!(200));
        assert_eq!(value["data"]["id"], json!("1077"));
        assert_eq!(value["data"]["role"], json!("club_admin"));
        assert_eq!(value["data"]["email"], json!("alex@example.com"));
        assert_eq!(value["data"]["image"], json!("https://example.com/a.png"));
    }

    #[tokio::test]
    async fn test_callback_with_mismatched_state_reports_state_error() {
        let mut server = Server::new_async().await;
        let token_mock = server
            .mock("POST", "/token")
            .expect(0)
            .create_async()
            .await;
        let (_, router) = app_for(settings(&server.url()));

        let (_nonce, state_cookie) = start_login(&router, "/dashboard").await;
        let response = router
            .oneshot(get_request(
                "/api/auth/callback?code=google-code&state=forged",
                Some(&format!("{STATE_COOKIE_NAME}={state_cookie}")),
            ))
            .await
            .unwrap();

        token_mock.assert_async().await;
        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(
            location(&response),
            format!("{BASE_URL}/dashboard?authError=state")
        );

        let cookies = set_cookies(&response);
        assert!(find(&cookies, SESSION_COOKIE_NAME).is_none());
        assert_eq!(find(&cookies, STATE_COOKIE_NAME).unwrap().value(), "");
    }

    #[tokio::test]
    async fn test_callback_without_state_cookie_reports_state_error() {
        let (_, router) = app_for(settings("http://127.0.0.1:1"));
        let response = router
            .oneshot(get_request("/api/auth/callback?code=abc&state=xyz", None))
            .await
            .unwrap();

        assert_eq!(location(&response), format!("{BASE_URL}/?authError=state"));
    }

    #[tokio::test]
    async fn test_callback_token_exchange_failure_clears_both_cookies() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/token")
            .with_status(500)
            .with_body("upstream down")
            .create_async()
            .await;
        let (_, router) = app_for(settings(&server.url()));

        let (nonce, state_cookie) = start_login(&router, "/dashboard").await;
        let response = router
            .oneshot(get_request(
                &format!("/api/auth/callback?code=google-code&state={nonce}"),
                Some(&format!("{STATE_COOKIE_NAME}={state_cookie}")),
            ))
            .await
            .unwrap();

        assert_eq!(
            location(&response),
            format!("{BASE_URL}/dashboard?authError=callback")
        );
        let cookies = set_cookies(&response);
        assert_eq!(find(&cookies, STATE_COOKIE_NAME).unwrap().value(), "");
        assert_eq!(find(&cookies, SESSION_COOKIE_NAME).unwrap().value(), "");
    }

    #[tokio::test]
    async fn test_cross_origin_from_returns_to_root() {
        let mut server = Server::new_async().await;
        mock_google_success(&mut server).await;
        let (_, router) = app_for(settings(&server.url()));

        let (nonce, state_cookie) = start_login(&router, "http://evil.example/x").await;
        let response = router
            .oneshot(get_request(
                &format!("/api/auth/callback?code=google-code&state={nonce}"),
                Some(&format!("{STATE_COOKIE_NAME}={state_cookie}")),
            ))
            .await
            .unwrap();

        assert_eq!(location(&response), format!("{BASE_URL}/"));
    }

    #[tokio::test]
    async fn test_control_character_in_from_returns_to_root() {
        let mut server = Server::new_async().await;
        mock_google_success(&mut server).await;
        let (_, router) = app_for(settings(&server.url()));

        let (nonce, state_cookie) = start_login(&router, "/dash%0Aboard").await;
        let response = router
            .oneshot(get_request(
                &format!("/api/auth/callback?code=google-code&state={nonce}"),
                Some(&format!("{STATE_COOKIE_NAME}={state_cookie}")),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(location(&response), format!("{BASE_URL}/"));
        assert!(find(&set_cookies(&response), SESSION_COOKIE_NAME).is_some());
    }

    #[tokio::test]
    async fn test_logout_clears_session_and_redirects_home() {
        let (_, router) = app_for(settings("http://127.0.0.1:1"));
        let request = Request::builder()
            .method("POST")
            .uri("/api/auth/logout")
            .body(Body::empty())
            .unwrap();
        let response = router.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), format!("{BASE_URL}/"));
        let cookies = set_cookies(&response);
        let session_cookie = find(&cookies, SESSION_COOKIE_NAME).unwrap();
        assert_eq!(session_cookie.value(), "");
        assert_eq!(session_cookie.max_age().map(|d| d.whole_seconds()), Some(0));
    }

    #[tokio::test]
    async fn test_session_requires_valid_cookie() {
        let (app_state, router) = app_for(settings("http://127.0.0.1:1"));

        let response = router
            .clone()
            .oneshot(get_request("/api/auth/session", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let token = app_state
            .auth_flow
            .sessions()
            .mint(SessionClaims::new("member-7", Role::Member))
            .unwrap();
        let tampered = format!("{}x", token);
        let response = router
            .clone()
            .oneshot(get_request(
                "/api/auth/session",
                Some(&format!("{SESSION_COOKIE_NAME}={tampered}")),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = router
            .oneshot(get_request(
                "/api/auth/session",
                Some(&format!("{SESSION_COOKIE_NAME}={token}")),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_openapi_lists_auth_routes() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/auth/login",
            "/api/auth/callback",
            "/api/auth/logout",
            "/api/auth/session",
            "/health",
        ] {
            assert!(doc.paths.paths.contains_key(path), "{path} missing");
        }
    }
}
