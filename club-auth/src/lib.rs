//! # club-auth
//!
//! Stateless authentication for the club portal:
//! - URL-safe codec and HMAC-SHA256 signer
//! - Signed bearer tokens with expiry enforcement
//! - Identity sessions carried in a signed cookie
//! - OAuth CSRF state carried in a short-lived signed cookie
//! - Google authorization-code provider client
//!
//! ## Usage
//!
//! ```rust,ignore
//! use club_auth::{
//!     session::{Role, SessionClaims, SessionManager},
//!     token::TokenSigner,
//! };
//!
//! let sessions = SessionManager::new(TokenSigner::new(Some(secret)), true);
//! let token = sessions.mint(SessionClaims::new(subject, Role::DEFAULT_SIGN_UP))?;
//! ```

pub mod codec;
pub mod cookies;
pub mod error;
pub mod http;
pub mod oauth;
pub mod session;
pub mod signer;
pub mod token;

// Re-export commonly used types
pub use cookie::Cookie;
pub use error::{Error, ErrorKind};
pub use secrecy::{ExposeSecret, SecretString};
