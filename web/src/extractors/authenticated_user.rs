use crate::extractors::RejectionType;
use crate::AppState;
use axum::{
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
};
use axum_extra::extract::cookie::CookieJar;
use domain::{SessionClaims, SESSION_COOKIE_NAME};
use log::*;

pub(crate) struct AuthenticatedUser(pub SessionClaims);

impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = RejectionType;

    // Uses the claims `require_auth` already validated when the route is behind it,
    // otherwise reads and validates the session cookie. Any cookie that does not hold
    // a valid, unexpired session is treated the same as no cookie at all.
    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(claims) = parts.extensions.get::<SessionClaims>() {
            return Ok(AuthenticatedUser(claims.clone()));
        }

        let jar = CookieJar::from_headers(&parts.headers);
        let session_cookie = jar.get(SESSION_COOKIE_NAME).map(|c| c.value());

        match state.auth_flow.current_session(session_cookie) {
            Some(claims) => {
                trace!("Authenticated request for subject {}", claims.subject);
                Ok(AuthenticatedUser(claims))
            }
            None => Err((StatusCode::UNAUTHORIZED, "Unauthorized".to_string())),
        }
    }
}
