use thiserror::Error;

/// Errors from the vendor REST client.
///
/// `Rejected` carries the vendor's own message verbatim — the presentation
/// layer shows it to the end user unchanged, never a guessed reason.
/// `AuthExpired` is a distinct kind so the scheduler can force
/// re-authentication instead of treating it as a generic failure.
#[derive(Debug, Error)]
pub enum VendorError {
    /// Network, TLS, or timeout failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Network(#[from] reqwest::Error),

    /// The vendor rejected the request, either via HTTP status or its own
    /// logical failure flag.
    #[error("{message}")]
    Rejected { message: String },

    /// The bearer token is missing, expired, or no longer accepted.
    #[error("vendor session expired or unauthenticated")]
    AuthExpired,

    /// The homepage payload has no category matching the caller's
    /// `user_category_id`.
    #[error("user category {0} not present in homepage payload")]
    CategoryNotFound(i64),

    /// The response body did not match any known payload shape.
    #[error("unexpected payload for {context}: {reason}")]
    Parse { context: String, reason: String },
}
