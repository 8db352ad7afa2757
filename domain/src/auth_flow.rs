//! Google sign-in handshake.
//!
//! The handshake spans two requests separated by a browser round trip through
//! Google. Everything carried between them lives in the signed state cookie, so
//! any instance can finish a handshake another instance started:
//!
//! `AwaitingRedirect` → (`begin_login`) → `AwaitingCallback` →
//! (`complete_callback`) → `Authenticated` | `Failed(reason)`
//!
//! Both terminal states clear the state cookie.

use std::sync::Arc;

use club_auth::error::{configuration_error, ConfigurationErrorKind};
use club_auth::http::HttpClientConfig;
use club_auth::oauth::providers::google::{self, GoogleOAuthUrls};
use club_auth::oauth::{Provider, StateManager, UserInfo};
use club_auth::session::{Role, SessionClaims, SessionManager};
use club_auth::token::TokenSigner;
use club_auth::{Cookie, SecretString};
use log::*;
use service::config::Config;
use url::Url;

use crate::error::Error;

const AUTH_ERROR_PARAM: &str = "authError";
const ROOT_PATH: &str = "/";

/// Everything the handshake needs from process configuration.
#[derive(Clone)]
pub struct AuthSettings {
    /// Public origin without a trailing slash.
    pub base_url: String,
    pub signing_secret: Option<SecretString>,
    pub google_client_id: Option<String>,
    pub google_client_secret: Option<SecretString>,
    pub google_urls: GoogleOAuthUrls,
    /// Mark cookies `Secure`. True in production and staging.
    pub secure_cookies: bool,
    pub http: HttpClientConfig,
}

impl AuthSettings {
    /// OAuth callback URL registered with Google.
    pub fn redirect_uri(&self) -> String {
        format!("{}/api/auth/callback", self.base_url)
    }
}

impl From<&Config> for AuthSettings {
    fn from(config: &Config) -> Self {
        let google_defaults = GoogleOAuthUrls::default();
        Self {
            base_url: config.auth_base_url().to_string(),
            signing_secret: config.auth_secret(),
            google_client_id: config.google_client_id(),
            google_client_secret: config.google_client_secret(),
            google_urls: GoogleOAuthUrls {
                auth_url: config
                    .google_auth_url()
                    .unwrap_or(google_defaults.auth_url),
                token_url: config
                    .google_token_url()
                    .unwrap_or(google_defaults.token_url),
                userinfo_url: config
                    .google_userinfo_url()
                    .unwrap_or(google_defaults.userinfo_url),
            },
            secure_cookies: config.is_production_like(),
            http: HttpClientConfig::default().with_timeout(config.oauth_http_timeout()),
        }
    }
}

/// Why a handshake ended without a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthFailure {
    /// Missing code or state, missing or invalid state cookie, or nonce mismatch.
    State,
    /// Code exchange or profile fetch failed.
    Callback,
}

impl AuthFailure {
    /// Value of the `authError` query parameter.
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthFailure::State => "state",
            AuthFailure::Callback => "callback",
        }
    }
}

/// Position of one login attempt in the handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowState {
    AwaitingRedirect,
    AwaitingCallback,
    Authenticated,
    Failed(AuthFailure),
}

/// Query parameters Google appends to the callback URL.
#[derive(Debug, Clone, Default)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
}

/// Redirect to the provider plus the state cookie binding it to this browser.
#[derive(Debug)]
pub struct LoginStart {
    pub authorization_url: String,
    pub cookies: Vec<Cookie<'static>>,
    pub state: FlowState,
}

/// Terminal result of a callback.
#[derive(Debug)]
pub struct CallbackOutcome {
    pub state: FlowState,
    /// Absolute URL to send the user agent to.
    pub redirect_to: String,
    /// Cookies to set on the response, including removals.
    pub cookies: Vec<Cookie<'static>>,
}

#[derive(Debug)]
pub struct LogoutOutcome {
    pub redirect_to: String,
    pub cookies: Vec<Cookie<'static>>,
}

/// Sequences the state and session managers around the provider.
pub struct AuthFlow {
    base_url: String,
    redirect_uri: String,
    sessions: SessionManager,
    states: StateManager,
    provider: Option<Arc<dyn Provider>>,
}

impl AuthFlow {
    /// Build the flow with the Google provider.
    ///
    /// Missing client credentials do not fail construction: login then answers
    /// with a configuration error and callbacks fail closed.
    pub fn new(settings: AuthSettings) -> Self {
        let provider = Self::google_provider(&settings);
        Self::build(settings, provider)
    }

    /// Build the flow around an explicit provider.
    pub fn with_provider(settings: AuthSettings, provider: Arc<dyn Provider>) -> Self {
        Self::build(settings, Some(provider))
    }

    fn build(settings: AuthSettings, provider: Option<Arc<dyn Provider>>) -> Self {
        let tokens = TokenSigner::new(settings.signing_secret.clone());
        if !tokens.is_configured() {
            warn!("No signing secret configured; sign-in is disabled");
        }
        Self {
            redirect_uri: settings.redirect_uri(),
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            sessions: SessionManager::new(tokens.clone(), settings.secure_cookies),
            states: StateManager::new(tokens, settings.secure_cookies),
            provider,
        }
    }

    fn google_provider(settings: &AuthSettings) -> Option<Arc<dyn Provider>> {
        let (Some(client_id), Some(client_secret)) = (
            settings.google_client_id.clone(),
            settings.google_client_secret.clone(),
        ) else {
            warn!("Google OAuth client credentials are not configured");
            return None;
        };

        match google::Provider::new(
            client_id,
            client_secret,
            settings.redirect_uri(),
            settings.google_urls.clone(),
            &settings.http,
        ) {
            Ok(provider) => Some(Arc::new(provider)),
            Err(e) => {
                error!("Failed to build Google OAuth client: {e:?}");
                None
            }
        }
    }

    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    pub fn redirect_uri(&self) -> &str {
        &self.redirect_uri
    }

    /// Start a login attempt that returns to `from` afterwards.
    ///
    /// Fails with a configuration error when client credentials or the signing
    /// secret are missing.
    pub fn begin_login(&self, from: Option<&str>) -> Result<LoginStart, Error> {
        let provider = self.provider()?;

        let (nonce, state_token) = self.states.mint(from)?;
        let authorization_url = provider.authorization_url(&nonce);

        info!(
            "Redirecting to {} authorization endpoint",
            provider.provider().as_str()
        );

        Ok(LoginStart {
            authorization_url,
            cookies: vec![self.states.state_cookie(state_token)],
            state: FlowState::AwaitingCallback,
        })
    }

    /// Finish a login attempt from the provider's callback.
    ///
    /// Never fails: every problem becomes a `Failed` outcome that redirects the
    /// user back with an `authError` indicator.
    pub async fn complete_callback(
        &self,
        params: CallbackParams,
        state_cookie: Option<&str>,
    ) -> CallbackOutcome {
        let stored = state_cookie.and_then(|value| self.states.read(value));
        let return_path = stored
            .as_ref()
            .map(|record| record.redirect_to.clone())
            .unwrap_or_else(|| ROOT_PATH.to_string());

        let code = match (params.code, params.state, stored) {
            (Some(code), Some(state), Some(stored)) if !code.is_empty() && state == stored.nonce => {
                code
            }
            _ => {
                info!("Rejecting OAuth callback: state did not match a pending login");
                return self.fail(AuthFailure::State, &return_path);
            }
        };

        let claims = match self.fetch_identity(&code).await {
            Ok(claims) => claims,
            Err(e) => {
                warn!("Authentication callback error: {e}");
                return self.fail(AuthFailure::Callback, &return_path);
            }
        };

        let session_token = match self.sessions.mint(claims) {
            Ok(token) => token,
            Err(e) => {
                error!("Failed to mint session token: {e}");
                return self.fail(AuthFailure::Callback, &return_path);
            }
        };

        info!("Sign-in complete, returning to {return_path}");

        CallbackOutcome {
            state: FlowState::Authenticated,
            redirect_to: self.absolute_url(&return_path, None),
            cookies: vec![
                self.sessions.session_cookie(session_token),
                self.states.clear_cookie(),
            ],
        }
    }

    /// Clear the session and return to the site root.
    pub fn logout(&self) -> LogoutOutcome {
        LogoutOutcome {
            redirect_to: self.absolute_url(ROOT_PATH, None),
            cookies: vec![self.sessions.revocation_cookie()],
        }
    }

    /// Claims of the session cookie, if it holds a valid session.
    pub fn current_session(&self, session_cookie: Option<&str>) -> Option<SessionClaims> {
        session_cookie.and_then(|value| self.sessions.read(value))
    }

    fn provider(&self) -> Result<&Arc<dyn Provider>, Error> {
        self.provider.as_ref().ok_or_else(|| {
            configuration_error(
                ConfigurationErrorKind::MissingClientCredentials,
                "Google OAuth client credentials are not set",
            )
            .into()
        })
    }

    async fn fetch_identity(&self, code: &str) -> Result<SessionClaims, Error> {
        let provider = self.provider()?;

        let tokens = provider.exchange_code(code).await?;
        let profile = provider.get_user_info(&tokens.access_token).await?;

        Ok(session_claims_for(profile))
    }

    fn fail(&self, failure: AuthFailure, return_path: &str) -> CallbackOutcome {
        let mut cookies = Vec::with_capacity(2);
        if failure == AuthFailure::Callback {
            cookies.push(self.sessions.revocation_cookie());
        }
        cookies.push(self.states.clear_cookie());

        CallbackOutcome {
            state: FlowState::Failed(failure),
            redirect_to: self.absolute_url(return_path, Some(failure)),
            cookies,
        }
    }

    fn absolute_url(&self, path: &str, failure: Option<AuthFailure>) -> String {
        let target = format!("{}{}", self.base_url, path);

        match (Url::parse(&target), failure) {
            (Ok(mut url), failure) => {
                if let Some(failure) = failure {
                    url.query_pairs_mut()
                        .append_pair(AUTH_ERROR_PARAM, failure.as_str());
                }
                url.to_string()
            }
            (Err(_), None) => target,
            (Err(_), Some(failure)) => {
                let separator = if target.contains('?') { '&' } else { '?' };
                format!("{target}{separator}{AUTH_ERROR_PARAM}={}", failure.as_str())
            }
        }
    }
}

/// Claims for a freshly signed-in user.
fn session_claims_for(profile: UserInfo) -> SessionClaims {
    SessionClaims {
        subject: profile.subject,
        role: Role::DEFAULT_SIGN_UP,
        name: profile.name,
        email: profile.email,
        picture: profile.picture,
        expires_at: None,
    }
}
