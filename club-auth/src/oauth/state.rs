//! CSRF state management for OAuth flows.
//!
//! The state record travels in a signed cookie instead of server memory, so any
//! request handler can finish a handshake another one started. Nothing records
//! that a state was consumed: a captured cookie stays usable until it expires.

use chrono::Utc;
use cookie::Cookie;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::codec;
use crate::cookies::{CookieAttributes, STATE_COOKIE_NAME};
use crate::error::Error;
use crate::token::{Claims, TokenSigner};

/// Lifetime of a pending authorization round trip, in seconds.
pub const STATE_TTL_SECONDS: i64 = 600;

const NONCE_BYTES: usize = 32;
const DEFAULT_REDIRECT: &str = "/";

/// State data bound to one login attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateRecord {
    /// Random value echoed back by the provider as the `state` parameter.
    pub nonce: String,
    /// Same-origin path to return to after authentication.
    pub redirect_to: String,
    /// When this state expires.
    #[serde(rename = "exp")]
    pub expires_at: i64,
}

impl Claims for StateRecord {
    fn expires_at(&self) -> Option<i64> {
        Some(self.expires_at)
    }

    fn is_valid(&self) -> bool {
        !self.nonce.is_empty() && is_local_path(&self.redirect_to)
    }
}

/// Manager for OAuth state parameters with expiration.
#[derive(Clone)]
pub struct StateManager {
    tokens: TokenSigner,
    cookie: CookieAttributes,
}

impl StateManager {
    pub fn new(tokens: TokenSigner, secure_cookie: bool) -> Self {
        Self {
            tokens,
            cookie: CookieAttributes::new(STATE_COOKIE_NAME, STATE_TTL_SECONDS, secure_cookie),
        }
    }

    /// Generate a new nonce and the signed state token that carries it.
    ///
    /// `redirect_target` is sanitized before it is stored.
    ///
    /// # Returns
    ///
    /// The nonce for the authorization URL and the token for the state cookie.
    pub fn mint(&self, redirect_target: Option<&str>) -> Result<(String, String), Error> {
        self.mint_at(redirect_target, Utc::now().timestamp())
    }

    pub fn mint_at(
        &self,
        redirect_target: Option<&str>,
        now: i64,
    ) -> Result<(String, String), Error> {
        let record = StateRecord {
            nonce: Self::generate_nonce(),
            redirect_to: sanitize_redirect(redirect_target),
            expires_at: now + STATE_TTL_SECONDS,
        };
        let token = self.tokens.build(&record)?;
        Ok((record.nonce, token))
    }

    /// State record of a valid, unexpired state cookie.
    pub fn read(&self, cookie_value: &str) -> Option<StateRecord> {
        self.tokens.parse(cookie_value)
    }

    pub fn read_at(&self, cookie_value: &str, now: i64) -> Option<StateRecord> {
        self.tokens.parse_at(cookie_value, now)
    }

    /// State cookie carrying `token`.
    pub fn state_cookie(&self, token: String) -> Cookie<'static> {
        self.cookie.issue(token)
    }

    /// Cookie that deletes the state cookie.
    pub fn clear_cookie(&self) -> Cookie<'static> {
        self.cookie.expire()
    }

    pub fn cookie_name(&self) -> &'static str {
        self.cookie.name()
    }

    /// Generate a cryptographically random nonce.
    fn generate_nonce() -> String {
        let random_bytes: [u8; NONCE_BYTES] = rand::thread_rng().gen();
        codec::encode(random_bytes)
    }
}

/// Return `path` when it is a same-origin relative path, `/` otherwise.
///
/// Protocol-relative forms (`//host`, `/\host`) point at another origin and are rejected,
/// as is any path containing a control character.
pub fn sanitize_redirect(path: Option<&str>) -> String {
    match path {
        Some(path) if is_local_path(path) => path.to_string(),
        _ => DEFAULT_REDIRECT.to_string(),
    }
}

fn is_local_path(path: &str) -> bool {
    path.starts_with('/')
        && !path.starts_with("//")
        && !path.starts_with("/\\")
        && !path.chars().any(char::is_control)
}
