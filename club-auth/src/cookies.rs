//! Cookie attribute definitions shared by issue and removal.
//!
//! Browsers only drop a cookie when the removal carries the same name and path
//! it was set with, so both directions are built from one `CookieAttributes`.

use cookie::{Cookie, SameSite};
use time::{Duration, OffsetDateTime};

/// Name of the long-lived identity session cookie.
pub const SESSION_COOKIE_NAME: &str = "cm_session";

/// Name of the short-lived OAuth CSRF state cookie.
pub const STATE_COOKIE_NAME: &str = "cm_oauth_state";

const COOKIE_PATH: &str = "/";

/// Attributes of one named cookie.
#[derive(Debug, Clone, PartialEq)]
pub struct CookieAttributes {
    name: &'static str,
    max_age_seconds: i64,
    secure: bool,
}

impl CookieAttributes {
    pub fn new(name: &'static str, max_age_seconds: i64, secure: bool) -> Self {
        Self {
            name,
            max_age_seconds,
            secure,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn max_age_seconds(&self) -> i64 {
        self.max_age_seconds
    }

    pub fn secure(&self) -> bool {
        self.secure
    }

    /// Cookie carrying `value` for the configured lifetime.
    pub fn issue(&self, value: String) -> Cookie<'static> {
        self.base(value)
            .max_age(Duration::seconds(self.max_age_seconds))
            .build()
    }

    /// Cookie that makes the user agent discard a previously issued one.
    pub fn expire(&self) -> Cookie<'static> {
        self.base(String::new())
            .max_age(Duration::ZERO)
            .expires(OffsetDateTime::UNIX_EPOCH)
            .build()
    }

    fn base(&self, value: String) -> cookie::CookieBuilder<'static> {
        Cookie::build((self.name, value))
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(self.secure)
            .path(COOKIE_PATH)
    }
}
