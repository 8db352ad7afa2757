//! Controller for Google sign-in, logout and the current session.
//!
//! Login and callback are reached through browser redirects, so they answer with
//! redirects rather than JSON on everything except misconfiguration.

use crate::controller::ApiResponse;
use crate::extractors::authenticated_user::AuthenticatedUser;
use crate::response::session_user::SessionUser;
use crate::{AppState, Error};

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect};
use axum::Json;
use axum_extra::extract::cookie::CookieJar;
use domain::auth_flow::CallbackParams;
use domain::{Cookie, STATE_COOKIE_NAME};
use serde::Deserialize;
use utoipa::IntoParams;

/// Query parameters for starting a login
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LoginQuery {
    /// Same-origin path to return to after sign-in
    pub from: Option<String>,
}

/// Query parameters Google appends to the callback
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
}

fn with_cookies(jar: CookieJar, cookies: Vec<Cookie<'static>>) -> CookieJar {
    cookies.into_iter().fold(jar, |jar, cookie| jar.add(cookie))
}

/// GET /api/auth/login
///
/// Starts Google sign-in by redirecting to Google's authorization endpoint.
#[utoipa::path(
    get,
    path = "/api/auth/login",
    params(LoginQuery),
    responses(
        (status = 307, description = "Redirect to Google OAuth"),
        (status = 500, description = "Server error (authentication not configured)"),
    )
)]
pub async fn login(
    State(app_state): State<AppState>,
    jar: CookieJar,
    Query(params): Query<LoginQuery>,
) -> Result<impl IntoResponse, Error> {
    let start = app_state.auth_flow.begin_login(params.from.as_deref())?;

    Ok((
        with_cookies(jar, start.cookies),
        Redirect::temporary(&start.authorization_url),
    ))
}

/// GET /api/auth/callback
///
/// Finishes Google sign-in. Failures redirect back with an `authError` query parameter.
#[utoipa::path(
    get,
    path = "/api/auth/callback",
    params(CallbackQuery),
    responses(
        (status = 307, description = "Redirect to the page the login started from"),
    )
)]
pub async fn callback(
    State(app_state): State<AppState>,
    jar: CookieJar,
    Query(params): Query<CallbackQuery>,
) -> impl IntoResponse {
    let state_cookie = jar.get(STATE_COOKIE_NAME).map(|c| c.value().to_string());

    let outcome = app_state
        .auth_flow
        .complete_callback(
            CallbackParams {
                code: params.code,
                state: params.state,
            },
            state_cookie.as_deref(),
        )
        .await;

    (
        with_cookies(jar, outcome.cookies),
        Redirect::temporary(&outcome.redirect_to),
    )
}

/// POST /api/auth/logout
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    responses(
        (status = 303, description = "Session cleared, redirect to the site root"),
    )
)]
pub async fn logout(State(app_state): State<AppState>, jar: CookieJar) -> impl IntoResponse {
    let outcome = app_state.auth_flow.logout();

    (
        with_cookies(jar, outcome.cookies),
        Redirect::to(&outcome.redirect_to),
    )
}

/// GET /api/auth/session
///
/// Returns the signed-in user.
#[utoipa::path(
    get,
    path = "/api/auth/session",
    responses(
        (status = 200, description = "Current session", body = SessionUser),
        (status = 401, description = "Unauthorized"),
    ),
    security(
        ("cookie_auth" = [])
    )
)]
pub async fn session(AuthenticatedUser(claims): AuthenticatedUser) -> impl IntoResponse {
    Json(ApiResponse::new(
        StatusCode::OK.into(),
        SessionUser::from(claims),
    ))
}
