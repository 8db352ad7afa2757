//! Google OAuth provider implementation.

use async_trait::async_trait;
use log::*;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;

use crate::error::{oauth_error, Error, OAuthErrorKind};
use crate::http::HttpClientConfig;
use crate::oauth::{ProviderKind, TokenResponse, UserInfo};

/// Scopes requested at sign-in.
pub const SCOPES: &str = "openid email profile";

/// Endpoint URLs used by the Google provider.
///
/// Configurable so tests can point the provider at a local mock server.
#[derive(Debug, Clone, PartialEq)]
pub struct GoogleOAuthUrls {
    pub auth_url: String,
    pub token_url: String,
    pub userinfo_url: String,
}

impl Default for GoogleOAuthUrls {
    fn default() -> Self {
        Self {
            auth_url: "https://accounts.google.com/o/oauth2/v2/auth".to_string(),
            token_url: "https://oauth2.googleapis.com/token".to_string(),
            userinfo_url: "https://openidconnect.googleapis.com/v1/userinfo".to_string(),
        }
    }
}

/// Request to exchange authorization code for tokens
#[derive(Serialize)]
struct TokenExchangeRequest<'a> {
    code: &'a str,
    client_id: &'a str,
    client_secret: &'a str,
    redirect_uri: &'a str,
    grant_type: &'static str,
}

/// Google OAuth provider.
pub struct Provider {
    client_id: String,
    client_secret: SecretString,
    redirect_uri: String,
    urls: GoogleOAuthUrls,
    http_client: reqwest::Client,
}

impl Provider {
    /// Create a new Google OAuth provider.
    ///
    /// # Arguments
    ///
    /// * `client_id` - Google OAuth client ID
    /// * `client_secret` - Google OAuth client secret
    /// * `redirect_uri` - Callback URL registered with Google
    /// * `urls` - Authorization, token and userinfo endpoints
    /// * `http` - Timeout and user agent for outbound calls
    pub fn new(
        client_id: String,
        client_secret: SecretString,
        redirect_uri: String,
        urls: GoogleOAuthUrls,
        http: &HttpClientConfig,
    ) -> Result<Self, Error> {
        Ok(Self {
            client_id,
            client_secret,
            redirect_uri,
            urls,
            http_client: http.build()?,
        })
    }
}

#[async_trait]
impl crate::oauth::Provider for Provider {
    fn provider(&self) -> ProviderKind {
        ProviderKind::Google
    }

    fn authorization_url(&self, state: &str) -> String {
        format!(
            "{}?\
            client_id={}&\
            redirect_uri={}&\
            response_type=code&\
            scope={}&\
            access_type=offline&\
            prompt=consent&\
            state={}",
            self.urls.auth_url,
            urlencoding::encode(&self.client_id),
            urlencoding::encode(&self.redirect_uri),
            urlencoding::encode(SCOPES),
            urlencoding::encode(state)
        )
    }

    async fn exchange_code(&self, code: &str) -> Result<TokenResponse, Error> {
        let request = TokenExchangeRequest {
            code,
            client_id: &self.client_id,
            client_secret: self.client_secret.expose_secret(),
            redirect_uri: &self.redirect_uri,
            grant_type: "authorization_code",
        };

        debug!("Exchanging Google OAuth code for tokens");

        let response = self
            .http_client
            .post(&self.urls.token_url)
            .form(&request)
            .send()
            .await
            .inspect_err(|e| warn!("Failed to exchange Google OAuth code: {:?}", e))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            warn!("Google token endpoint returned {}: {}", status, error_text);
            return Err(oauth_error(
                OAuthErrorKind::TokenExchangeFailed,
                &format!("Token endpoint returned {status}"),
            ));
        }

        response.json::<TokenResponse>().await.map_err(|e| {
            warn!("Failed to parse Google token response: {:?}", e);
            Error {
                source: Some(Box::new(e)),
                error_kind: crate::error::ErrorKind::OAuth(OAuthErrorKind::InvalidResponse),
            }
        })
    }

    async fn get_user_info(&self, access_token: &str) -> Result<UserInfo, Error> {
        let response = self
            .http_client
            .get(&self.urls.userinfo_url)
            .bearer_auth(access_token)
            .send()
            .await
            .inspect_err(|e| warn!("Failed to get Google user info: {:?}", e))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            warn!("Google userinfo endpoint returned {}: {}", status, error_text);
            return Err(oauth_error(
                OAuthErrorKind::UserInfoFailed,
                &format!("Userinfo endpoint returned {status}"),
            ));
        }

        response.json::<UserInfo>().await.map_err(|e| {
            warn!("Failed to parse Google user info: {:?}", e);
            Error {
                source: Some(Box::new(e)),
                error_kind: crate::error::ErrorKind::OAuth(OAuthErrorKind::InvalidResponse),
            }
        })
    }
}
