//! Long-lived identity sessions carried in a signed cookie.

use std::fmt;
use std::str::FromStr;

use chrono::Utc;
use cookie::Cookie;
use log::*;
use serde::{Deserialize, Serialize};

use crate::cookies::{CookieAttributes, SESSION_COOKIE_NAME};
use crate::error::{token_error, Error, TokenErrorKind};
use crate::token::{Claims, TokenSigner};

/// Lifetime of a session: 30 days, in seconds.
pub const SESSION_TTL_SECONDS: i64 = 60 * 60 * 24 * 30;

/// Club roles a session may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    ClubAdmin,
    SectionAdmin,
    Coach,
    Member,
    Parent,
}

impl Role {
    /// Role given to every account created through sign-in.
    pub const DEFAULT_SIGN_UP: Role = Role::ClubAdmin;

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::ClubAdmin => "club_admin",
            Role::SectionAdmin => "section_admin",
            Role::Coach => "coach",
            Role::Member => "member",
            Role::Parent => "parent",
        }
    }

    /// Staff of the platform operator.
    pub fn is_internal(&self) -> bool {
        matches!(self, Role::Admin)
    }

    pub fn can_manage_whole_club(&self) -> bool {
        matches!(self, Role::Admin | Role::ClubAdmin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct RoleParseError;

impl FromStr for Role {
    type Err = RoleParseError;

    fn from_str(value: &str) -> Result<Role, Self::Err> {
        match value {
            "admin" => Ok(Role::Admin),
            "club_admin" => Ok(Role::ClubAdmin),
            "section_admin" => Ok(Role::SectionAdmin),
            "coach" => Ok(Role::Coach),
            "member" => Ok(Role::Member),
            "parent" => Ok(Role::Parent),
            _ => Err(RoleParseError),
        }
    }
}

/// Decoded payload of a session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Stable identifier issued by the identity provider.
    #[serde(rename = "sub")]
    pub subject: String,
    pub role: Role,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub picture: Option<String>,
    /// Unix timestamp (seconds) after which the session is void.
    #[serde(rename = "exp", default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<i64>,
}

impl SessionClaims {
    pub fn new(subject: impl Into<String>, role: Role) -> Self {
        Self {
            subject: subject.into(),
            role,
            name: None,
            email: None,
            picture: None,
            expires_at: None,
        }
    }
}

impl Claims for SessionClaims {
    fn expires_at(&self) -> Option<i64> {
        self.expires_at
    }

    fn is_valid(&self) -> bool {
        !self.subject.is_empty()
    }
}

/// Mints, reads and attaches session tokens.
#[derive(Clone)]
pub struct SessionManager {
    tokens: TokenSigner,
    cookie: CookieAttributes,
}

impl SessionManager {
    /// `secure_cookie` should be true whenever the process serves production traffic.
    pub fn new(tokens: TokenSigner, secure_cookie: bool) -> Self {
        Self {
            tokens,
            cookie: CookieAttributes::new(SESSION_COOKIE_NAME, SESSION_TTL_SECONDS, secure_cookie),
        }
    }

    /// Mint a token for `claims`, expiring 30 days from now.
    ///
    /// Any `expires_at` already on `claims` is replaced.
    pub fn mint(&self, claims: SessionClaims) -> Result<String, Error> {
        self.mint_at(claims, Utc::now().timestamp())
    }

    pub fn mint_at(&self, mut claims: SessionClaims, now: i64) -> Result<String, Error> {
        if claims.subject.is_empty() {
            return Err(token_error(
                TokenErrorKind::MissingSubject,
                "Session claims require a subject",
            ));
        }
        claims.expires_at = Some(now + SESSION_TTL_SECONDS);
        debug!("Minting session for subject with role {}", claims.role);
        self.tokens.build(&claims)
    }

    /// Claims of a valid session cookie, or `None` for anything else.
    pub fn read(&self, cookie_value: &str) -> Option<SessionClaims> {
        self.tokens.parse(cookie_value)
    }

    pub fn read_at(&self, cookie_value: &str, now: i64) -> Option<SessionClaims> {
        self.tokens.parse_at(cookie_value, now)
    }

    /// Session cookie carrying `token`.
    pub fn session_cookie(&self, token: String) -> Cookie<'static> {
        self.cookie.issue(token)
    }

    /// Cookie that clears the session.
    pub fn revocation_cookie(&self) -> Cookie<'static> {
        self.cookie.expire()
    }

    pub fn cookie_name(&self) -> &'static str {
        self.cookie.name()
    }
}
