//! Domain error types.

use thiserror::Error;

/// Why a request did not yield a usable credential.
///
/// These are routine: most intercepted traffic is filtered out here and
/// nothing is reported to the user.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractionError {
    /// No `Cookie` header on the request.
    #[error("Cookie header not found")]
    MissingHeader,

    /// The cookie lacks one of the required fields or cannot be decoded.
    #[error("malformed cookie: {0}")]
    MalformedCookie(String),

    /// The cookie belongs to a guest or placeholder session.
    #[error("guest cookie: {0}")]
    GuestCredential(String),
}
