//! OAuth 2.0 authorization-code sign-in.
//!
//! Provides the CSRF state carried across the authorization redirect and the
//! identity provider clients used to exchange the returned code.

mod provider;
mod state;

pub mod providers;

pub use provider::{Provider, ProviderKind, TokenResponse, UserInfo};
pub use state::{sanitize_redirect, StateManager, StateRecord, STATE_TTL_SECONDS};
