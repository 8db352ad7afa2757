use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::CookieJar;
use domain::SESSION_COOKIE_NAME;

use crate::AppState;

/// Authentication middleware that returns 401 Unauthorized for requests without
/// a valid session cookie.
///
/// API endpoints answer with a status code instead of redirecting to the login route.
/// The validated claims are stored in the request extensions for `AuthenticatedUser`.
pub async fn require_auth(
    State(app_state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    let session_cookie = jar.get(SESSION_COOKIE_NAME).map(|c| c.value());

    match app_state.auth_flow.current_session(session_cookie) {
        Some(claims) => {
            request.extensions_mut().insert(claims);
            next.run(request).await
        }
        None => (StatusCode::UNAUTHORIZED, "Unauthorized").into_response(),
    }
}
