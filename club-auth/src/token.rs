//! Signed, self-contained bearer tokens.
//!
//! A token is `base64url(JSON(claims)) "." base64url(HMAC-SHA256(secret, encoded_claims))`.
//! The signature covers the encoded payload segment exactly as it appears on the wire.

use chrono::Utc;
use log::*;
use secrecy::{ExposeSecret, SecretString};
use serde::{de::DeserializeOwned, Serialize};

use crate::codec;
use crate::error::{configuration_error, ConfigurationErrorKind, Error};
use crate::signer;

const SEGMENT_SEPARATOR: char = '.';

/// A claim set that can be carried inside a bearer token.
pub trait Claims: Serialize + DeserializeOwned {
    /// Absolute Unix timestamp (seconds) after which the token is rejected.
    /// `None` means the token never expires.
    fn expires_at(&self) -> Option<i64>;

    /// Claim-specific invariants checked after the signature and payload decode.
    fn is_valid(&self) -> bool {
        true
    }
}

/// Builds and parses bearer tokens with a server-held signing secret.
///
/// The secret is optional so that a process without one can still start; every
/// attempt to build a token then fails with a configuration error and every
/// parse returns `None`.
#[derive(Clone)]
pub struct TokenSigner {
    secret: Option<SecretString>,
}

impl TokenSigner {
    /// Create a signer. An empty secret is treated as absent.
    pub fn new(secret: Option<SecretString>) -> Self {
        let secret = secret.filter(|s| !s.expose_secret().is_empty());
        Self { secret }
    }

    /// True when a signing secret is configured.
    pub fn is_configured(&self) -> bool {
        self.secret.is_some()
    }

    /// Serialize, encode and sign `claims`.
    pub fn build<C: Claims>(&self, claims: &C) -> Result<String, Error> {
        let secret = self.secret.as_ref().ok_or_else(|| {
            configuration_error(
                ConfigurationErrorKind::MissingSigningSecret,
                "Missing signing secret for bearer tokens",
            )
        })?;

        let payload = serde_json::to_vec(claims)?;
        let encoded_payload = codec::encode(payload);
        let signature = signer::sign(
            encoded_payload.as_bytes(),
            secret.expose_secret().as_bytes(),
        );

        Ok(format!(
            "{}{}{}",
            encoded_payload,
            SEGMENT_SEPARATOR,
            codec::encode(signature)
        ))
    }

    /// Parse and validate `token` against the current time.
    pub fn parse<C: Claims>(&self, token: &str) -> Option<C> {
        self.parse_at(token, Utc::now().timestamp())
    }

    /// Parse and validate `token` as of the Unix timestamp `now`.
    ///
    /// Every failure collapses to `None`; the reason is only traced.
    pub fn parse_at<C: Claims>(&self, token: &str, now: i64) -> Option<C> {
        let secret = self.secret.as_ref()?;

        let mut segments = token.split(SEGMENT_SEPARATOR);
        let (encoded_payload, encoded_signature) =
            match (segments.next(), segments.next(), segments.next()) {
                (Some(payload), Some(signature), None)
                    if !payload.is_empty() && !signature.is_empty() =>
                {
                    (payload, signature)
                }
                _ => {
                    trace!("Rejecting token: expected two segments");
                    return None;
                }
            };

        let signature = codec::decode(encoded_signature)
            .inspect_err(|_| trace!("Rejecting token: signature segment is not base64url"))
            .ok()?;

        if !signer::verify(
            encoded_payload.as_bytes(),
            secret.expose_secret().as_bytes(),
            &signature,
        ) {
            trace!("Rejecting token: signature mismatch");
            return None;
        }

        let payload = codec::decode(encoded_payload)
            .inspect_err(|_| trace!("Rejecting token: payload segment is not base64url"))
            .ok()?;

        let claims: C = serde_json::from_slice(&payload)
            .inspect_err(|e| trace!("Rejecting token: malformed claims: {e}"))
            .ok()?;

        if !claims.is_valid() {
            trace!("Rejecting token: claim invariants violated");
            return None;
        }

        match claims.expires_at() {
            Some(expires_at) if expires_at <= now => {
                trace!("Rejecting token: expired at {expires_at}, now {now}");
                None
            }
            _ => Some(claims),
        }
    }
}
