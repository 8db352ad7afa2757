//! Error types for the `domain` layer.
use club_auth::error::{Error as ClubAuthError, ErrorKind as ClubAuthErrorKind};
use std::error::Error as StdError;
use std::fmt;

/// Top-level domain error type.
/// Errors in the Domain layer are modeled as a tree structure
/// with `domain::error::Error` as the root type holding a tree of `error_kind`
/// enums that represent the kinds of errors that can occur in the domain layer or
/// in lower layers. The `source` field holds the original error. `web` depends on
/// `domain` but never on `club-auth` error kinds directly; it maps the kinds below
/// to HTTP status codes.
#[derive(Debug)]
pub struct Error {
    pub source: Option<Box<dyn StdError + Send + Sync>>,
    pub error_kind: DomainErrorKind,
}

/// Enum representing the major categories of errors that can occur in the `domain` layer.
#[derive(Debug, PartialEq)]
pub enum DomainErrorKind {
    Internal(InternalErrorKind),
    External(ExternalErrorKind),
}

/// Enum representing the various kinds of internal errors that can occur in the `domain` layer.
#[derive(Debug, PartialEq)]
pub enum InternalErrorKind {
    /// Required configuration (signing secret, client credentials) is missing.
    Config,
    Other(String),
}

/// Enum representing failures of collaborators outside this process.
#[derive(Debug, PartialEq)]
pub enum ExternalErrorKind {
    Network,
    Other(String),
}

impl Error {
    pub fn config(message: &str) -> Self {
        Error {
            source: Some(message.to_string().into()),
            error_kind: DomainErrorKind::Internal(InternalErrorKind::Config),
        }
    }

    pub fn is_config(&self) -> bool {
        self.error_kind == DomainErrorKind::Internal(InternalErrorKind::Config)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Domain Error: {self:?}")
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn StdError + 'static))
    }
}

// This is where we translate errors from the `club-auth` layer to the `domain` layer.
impl From<ClubAuthError> for Error {
    fn from(err: ClubAuthError) -> Self {
        let error_kind = match &err.error_kind {
            ClubAuthErrorKind::Configuration(_) => {
                DomainErrorKind::Internal(InternalErrorKind::Config)
            }
            ClubAuthErrorKind::Http(_) => DomainErrorKind::External(ExternalErrorKind::Network),
            ClubAuthErrorKind::OAuth(kind) => {
                DomainErrorKind::External(ExternalErrorKind::Other(format!("OAuth {kind:?}")))
            }
            ClubAuthErrorKind::Token(_) => {
                DomainErrorKind::Internal(InternalErrorKind::Other(err.to_string()))
            }
        };
        Error {
            source: Some(Box::new(err)),
            error_kind,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use club_auth::error::{
        configuration_error, oauth_error, token_error, ConfigurationErrorKind, OAuthErrorKind,
        TokenErrorKind,
    };

    #[test]
    fn test_configuration_maps_to_internal_config() {
        let err: Error = configuration_error(
            ConfigurationErrorKind::MissingSigningSecret,
            "no secret",
        )
        .into();
        assert!(err.is_config());
    }

    #[test]
    fn test_oauth_maps_to_external() {
        let err: Error = oauth_error(OAuthErrorKind::TokenExchangeFailed, "400").into();
        assert!(matches!(
            err.error_kind,
            DomainErrorKind::External(ExternalErrorKind::Other(_))
        ));
    }

    #[test]
    fn test_token_maps_to_internal_other() {
        let err: Error = token_error(TokenErrorKind::MissingSubject, "no sub").into();
        assert!(matches!(
            err.error_kind,
            DomainErrorKind::Internal(InternalErrorKind::Other(_))
        ));
        assert!(!err.is_config());
    }
}
