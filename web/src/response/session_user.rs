//! Session response DTOs

use domain::SessionClaims;
use serde::Serialize;
use utoipa::ToSchema;

/// The signed-in user as seen by the browser.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct SessionUser {
    /// Identity provider subject
    pub id: String,
    /// Club role, e.g. `club_admin`
    pub role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Profile picture URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Unix timestamp (seconds) at which the session ends
    pub expires_at: Option<i64>,
}

impl From<SessionClaims> for SessionUser {
    fn from(claims: SessionClaims) -> Self {
        Self {
            id: claims.subject,
            role: claims.role.to_string(),
            name: claims.name,
            email: claims.email,
            image: claims.picture,
            expires_at: claims.expires_at,
        }
    }
}
