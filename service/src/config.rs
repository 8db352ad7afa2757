use clap::builder::TypedValueParser as _;
use clap::Parser;
use dotenvy::dotenv;
use log::LevelFilter;
use secrecy::SecretString;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Public origin of the site used when `AUTH_BASE_URL` is not set.
pub const DEFAULT_BASE_URL: &str = "http://localhost:3000";

#[derive(Clone, Debug, PartialEq)]
pub enum RustEnv {
    Development,
    Production,
    Staging,
}

#[derive(Debug, PartialEq, Eq)]
pub struct RustEnvParseError;

impl FromStr for RustEnv {
    type Err = RustEnvParseError;
    fn from_str(level: &str) -> Result<RustEnv, Self::Err> {
        match level.to_lowercase().as_str() {
            "development" => Ok(RustEnv::Development),
            "production" => Ok(RustEnv::Production),
            "staging" => Ok(RustEnv::Staging),
            _ => Err(RustEnvParseError),
        }
    }
}

impl fmt::Display for RustEnv {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RustEnv::Development => write!(f, "development"),
            RustEnv::Production => write!(f, "production"),
            RustEnv::Staging => write!(f, "staging"),
        }
    }
}

#[derive(Clone, Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// A list of full CORS origin URLs that allowed to receive server responses.
    #[arg(
        long,
        env,
        value_delimiter = ',',
        use_value_delimiter = true,
        default_value = "http://localhost:3000,https://localhost:3000"
    )]
    pub allowed_origins: Vec<String>,

    /// Server-held secret used to sign session and OAuth state tokens.
    /// Without it sign-in is refused; the server still starts.
    #[arg(long, env, hide_env_values = true)]
    auth_secret: Option<String>,

    /// Public origin of the site, used to build the OAuth callback URL and
    /// post-login redirects (e.g. https://club.example.com).
    #[arg(long, env, default_value = DEFAULT_BASE_URL)]
    auth_base_url: String,

    /// The Google OAuth client ID.
    #[arg(long, env)]
    google_client_id: Option<String>,

    /// The Google OAuth client secret.
    #[arg(long, env, hide_env_values = true)]
    google_client_secret: Option<String>,

    /// Google authorization endpoint. Unset uses Google's public endpoint.
    #[arg(long, env)]
    google_auth_url: Option<String>,

    /// Google token endpoint. Unset uses Google's public endpoint.
    #[arg(long, env)]
    google_token_url: Option<String>,

    /// Google OpenID Connect userinfo endpoint. Unset uses Google's public endpoint.
    #[arg(long, env)]
    google_userinfo_url: Option<String>,

    /// Timeout in seconds for each call to the identity provider
    #[arg(long, env, default_value_t = 10)]
    pub oauth_http_timeout_secs: u64,

    /// The host interface to listen for incoming connections
    #[arg(short, long, env, default_value = "127.0.0.1")]
    pub interface: Option<String>,

    /// The host TCP port to listen for incoming connections
    #[arg(short, long, env, default_value_t = 4000)]
    pub port: u16,

    /// Set the log level verbosity threshold (level) to control what gets displayed on console output
    #[arg(
        short,
        long,
        env,
        default_value_t = LevelFilter::Info,
        value_parser = clap::builder::PossibleValuesParser::new(["OFF", "ERROR", "WARN", "INFO", "DEBUG", "TRACE"])
            .map(|s| s.parse::<LevelFilter>().unwrap()),
        )]
    pub log_level_filter: LevelFilter,

    /// Set the Rust runtime environment to use.
    #[arg(
    short,
    long,
    env,
    default_value_t = RustEnv::Development,
    value_parser = clap::builder::PossibleValuesParser::new([
        "DEVELOPMENT", "PRODUCTION", "STAGING",
        "development", "production", "staging"
    ])
        .map(|s| s.parse::<RustEnv>().unwrap()),
    )]
    pub runtime_env: RustEnv,
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    pub fn new() -> Self {
        // Load .env file first
        dotenv().ok();
        // Then parse the command line parameters and flags
        Config::parse()
    }

    /// Returns the token signing secret, if configured. An empty value counts as unset.
    pub fn auth_secret(&self) -> Option<SecretString> {
        non_empty(&self.auth_secret).map(SecretString::new)
    }

    pub fn set_auth_secret(mut self, auth_secret: Option<String>) -> Self {
        self.auth_secret = auth_secret;
        self
    }

    /// Returns the public base URL without a trailing slash.
    pub fn auth_base_url(&self) -> &str {
        self.auth_base_url.trim_end_matches('/')
    }

    pub fn google_client_id(&self) -> Option<String> {
        non_empty(&self.google_client_id)
    }

    pub fn google_client_secret(&self) -> Option<SecretString> {
        non_empty(&self.google_client_secret).map(SecretString::new)
    }

    pub fn google_auth_url(&self) -> Option<String> {
        non_empty(&self.google_auth_url)
    }

    pub fn google_token_url(&self) -> Option<String> {
        non_empty(&self.google_token_url)
    }

    pub fn google_userinfo_url(&self) -> Option<String> {
        non_empty(&self.google_userinfo_url)
    }

    pub fn oauth_http_timeout(&self) -> Duration {
        Duration::from_secs(self.oauth_http_timeout_secs)
    }

    pub fn runtime_env(&self) -> RustEnv {
        self.runtime_env.clone()
    }

    /// Production and staging both serve over HTTPS, so both mark cookies `Secure`.
    pub fn is_production_like(&self) -> bool {
        matches!(self.runtime_env, RustEnv::Production | RustEnv::Staging)
    }
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value.as_ref().filter(|v| !v.trim().is_empty()).cloned()
}
