//! The acquisition seam between the scheduler and the two client paths.
//!
//! The service only ever talks to a [`PriceSource`]; whether prices come
//! from the REST API or a headless browser is decided once, at startup.
//! Implementations own their session state and expose it as one opaque
//! artifact string so both paths persist identically.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use argent_browser::{AutomationError, BrowserFallbackClient};
use argent_core::{Acquisition, AppConfig, PriceEntry, SnapshotOrigin};
use argent_vendor::{VendorClient, VendorError};

/// Unified failure taxonomy consumed by the scheduler and presentation
/// layer.
#[derive(Debug, Error)]
pub enum SourceError {
    /// Timeout or connection failure. Retried only at the next scheduled
    /// trigger, never immediately.
    #[error("network error: {0}")]
    Network(String),

    /// Vendor-reported rejection; the message is the vendor's own, verbatim,
    /// and is safe to show to the end user.
    #[error("{message}")]
    Rejected { message: String },

    /// The session is gone; re-authentication is required before the next
    /// successful refresh.
    #[error("authentication expired")]
    AuthExpired,

    /// The payload did not match any known shape, or a required part of it
    /// was missing.
    #[error("vendor payload error: {0}")]
    Payload(String),

    /// Browser automation exhausted its fallback strategies.
    #[error("browser automation failed: {0}")]
    Automation(String),
}

impl From<VendorError> for SourceError {
    fn from(err: VendorError) -> Self {
        match err {
            VendorError::Network(e) => Self::Network(e.to_string()),
            VendorError::Rejected { message } => Self::Rejected { message },
            VendorError::AuthExpired => Self::AuthExpired,
            VendorError::CategoryNotFound(id) => {
                Self::Payload(format!("user category {id} not found"))
            }
            VendorError::Parse { context, reason } => Self::Payload(format!("{context}: {reason}")),
        }
    }
}

impl From<AutomationError> for SourceError {
    fn from(err: AutomationError) -> Self {
        match err {
            AutomationError::NoSession => Self::AuthExpired,
            other => Self::Automation(other.to_string()),
        }
    }
}

/// A freshly acquired, normalized, pre-markup price list.
#[derive(Debug, Clone)]
pub struct RawPriceList {
    pub entries: Vec<PriceEntry>,
    pub origin: SnapshotOrigin,
}

/// One acquisition path: the vendor REST API or the browser fallback.
#[async_trait]
pub trait PriceSource: Send + Sync {
    /// Asks the vendor to send an OTP; returns a user-facing message.
    async fn request_verification_code(&self, mobile: &str) -> Result<String, SourceError>;

    /// Verifies the OTP and establishes a session.
    async fn verify_code(&self, mobile: &str, code: &str) -> Result<(), SourceError>;

    /// Fetches the normalized, pre-markup price list.
    async fn fetch_prices(&self) -> Result<RawPriceList, SourceError>;

    /// The current session artifact (bearer token or cookie jar), if any.
    fn session_artifact(&self) -> Option<String>;

    /// Restores a session artifact from persisted state.
    fn restore_session(&self, artifact: &str);

    /// Drops the session, forcing re-authentication.
    fn clear_session(&self);
}

#[async_trait]
impl PriceSource for VendorClient {
    async fn request_verification_code(&self, mobile: &str) -> Result<String, SourceError> {
        Ok(VendorClient::request_verification_code(self, mobile).await?)
    }

    async fn verify_code(&self, mobile: &str, code: &str) -> Result<(), SourceError> {
        Ok(VendorClient::verify_code(self, mobile, code).await?)
    }

    async fn fetch_prices(&self) -> Result<RawPriceList, SourceError> {
        let entries = VendorClient::fetch_prices(self).await?;
        Ok(RawPriceList {
            entries,
            origin: SnapshotOrigin::Api,
        })
    }

    fn session_artifact(&self) -> Option<String> {
        self.session_token()
    }

    fn restore_session(&self, artifact: &str) {
        self.restore_session_token(artifact);
    }

    fn clear_session(&self) {
        self.clear_session_token();
    }
}

#[async_trait]
impl PriceSource for BrowserFallbackClient {
    async fn request_verification_code(&self, mobile: &str) -> Result<String, SourceError> {
        Ok(BrowserFallbackClient::request_verification_code(self, mobile).await?)
    }

    async fn verify_code(&self, mobile: &str, code: &str) -> Result<(), SourceError> {
        Ok(BrowserFallbackClient::verify_code(self, mobile, code).await?)
    }

    async fn fetch_prices(&self) -> Result<RawPriceList, SourceError> {
        let scraped = BrowserFallbackClient::fetch_prices(self).await?;
        let origin = if scraped.placeholder {
            SnapshotOrigin::Placeholder
        } else {
            SnapshotOrigin::Browser
        };
        Ok(RawPriceList {
            entries: scraped.entries,
            origin,
        })
    }

    fn session_artifact(&self) -> Option<String> {
        BrowserFallbackClient::session_artifact(self)
    }

    fn restore_session(&self, artifact: &str) {
        BrowserFallbackClient::restore_session(self, artifact);
    }

    fn clear_session(&self) {
        BrowserFallbackClient::clear_session(self);
    }
}

/// Builds the acquisition source selected by configuration.
///
/// # Errors
///
/// Returns [`SourceError`] when the REST client cannot be constructed from
/// the configured URLs.
pub fn build_source(config: &AppConfig) -> Result<Arc<dyn PriceSource>, SourceError> {
    match config.acquisition {
        Acquisition::Api => {
            let client = VendorClient::new(
                &config.vendor_api_url,
                &config.vendor_site_url,
                config.request_timeout_secs,
                &config.user_agent,
            )?;
            Ok(Arc::new(client))
        }
        Acquisition::Browser => Ok(Arc::new(BrowserFallbackClient::new(
            &config.webdriver_url,
            &config.vendor_site_url,
        ))),
    }
}
