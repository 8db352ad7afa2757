//! URL- and cookie-safe encoding for token segments.
//!
//! Uses the base64url alphabet without padding, so encoded values never contain
//! `+`, `/` or `=` and can be placed in cookies and query strings unescaped.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};

use crate::error::{Error, ErrorKind, TokenErrorKind};

/// Encode arbitrary bytes as unpadded base64url.
pub fn encode(bytes: impl AsRef<[u8]>) -> String {
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Decode an unpadded base64url string.
///
/// Fails for characters outside the URL-safe alphabet, padding, and non-canonical
/// trailing bits.
pub fn decode(encoded: &str) -> Result<Vec<u8>, Error> {
    URL_SAFE_NO_PAD.decode(encoded).map_err(|e| Error {
        source: Some(Box::new(e)),
        error_kind: ErrorKind::Token(TokenErrorKind::Decode),
    })
}
