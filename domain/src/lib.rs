//! This module re-exports the authentication types the `web` layer works with, so that
//! `web` depends on `domain` rather than reaching into `club-auth` for business rules.

pub use club_auth::cookies::{SESSION_COOKIE_NAME, STATE_COOKIE_NAME};
pub use club_auth::session::{Role, SessionClaims};
pub use club_auth::Cookie;

pub mod auth_flow;
pub mod error;
