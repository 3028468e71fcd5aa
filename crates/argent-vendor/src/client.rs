//! HTTP client for the vendor's authenticated REST API.
//!
//! Wraps `reqwest` with the vendor's `{success, message, data}` envelope
//! handling and bearer-token state. Three endpoints matter: OTP initiation
//! (`auth/check-mobile-exists`), OTP verification (`auth/login`), and the
//! homepage feed (`profile/homepage`) that carries the price payload.
//!
//! Nothing in here retries: a failed call is surfaced as a typed error and
//! the scheduler simply tries again at its next trigger.

use std::sync::RwLock;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ORIGIN, REFERER};
use reqwest::{Client, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde_json::json;

use argent_core::PriceEntry;

use crate::error::VendorError;
use crate::normalize::{build_feature_map, normalize_entries, GlobalFlags};
use crate::shape::{coerce_flag, coerce_i64};
use crate::types::{Envelope, HomepageData, LoginData, MobileCheckData};

/// Message used when the vendor reports the mobile number is not registered.
const MOBILE_NOT_FOUND: &str = "شماره موبایل موجود نیست";
/// Fallback when the vendor flags a failure but sends no message of its own.
const GENERIC_FAILURE: &str = "خطا";
/// Fallback for a rejected login without a vendor message.
const CODE_REJECTED: &str = "کد اشتباه";

/// How much of an unparsable body to keep in the log.
const LOG_BODY_LIMIT: usize = 500;

/// Client for the vendor REST API.
///
/// Holds the bearer token issued by `auth/login`; every authenticated call
/// reads it at request time, so a token restored from persisted state or a
/// fresh login is picked up without rebuilding the client. Use
/// [`VendorClient::new`] for production; point `api_url` at a mock server in
/// tests.
pub struct VendorClient {
    client: Client,
    base_url: Url,
    token: RwLock<Option<String>>,
}

impl VendorClient {
    /// Creates a client for the given API base URL.
    ///
    /// `site_url` is sent as `Origin`/`Referer` on every request — the
    /// vendor rejects calls without them.
    ///
    /// # Errors
    ///
    /// Returns [`VendorError::Parse`] if the URLs cannot be used as a base
    /// or header, or [`VendorError::Network`] if the underlying
    /// `reqwest::Client` cannot be constructed.
    pub fn new(
        api_url: &str,
        site_url: &str,
        timeout_secs: u64,
        user_agent: &str,
    ) -> Result<Self, VendorError> {
        // Normalise: the base must end with exactly one slash so joins
        // append to the path rather than replacing the last segment.
        let normalised = format!("{}/", api_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised).map_err(|e| VendorError::Parse {
            context: "client configuration".to_owned(),
            reason: format!("invalid API base URL '{api_url}': {e}"),
        })?;

        let header = |value: &str| {
            HeaderValue::from_str(value).map_err(|e| VendorError::Parse {
                context: "client configuration".to_owned(),
                reason: format!("invalid header value '{value}': {e}"),
            })
        };
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json, text/plain, */*"));
        headers.insert(ORIGIN, header(site_url)?);
        headers.insert(REFERER, header(&format!("{}/", site_url.trim_end_matches('/')))?);

        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            base_url,
            token: RwLock::new(None),
        })
    }

    /// Asks the vendor to send an OTP to `mobile`.
    ///
    /// Mutates no client state; a failed request leaves the client exactly
    /// as it was.
    ///
    /// # Errors
    ///
    /// - [`VendorError::Rejected`] — non-2xx status, vendor-flagged failure
    ///   (message verbatim), or an unregistered mobile number.
    /// - [`VendorError::Network`] — connection or timeout failure.
    /// - [`VendorError::Parse`] — body is not the expected envelope.
    pub async fn request_verification_code(&self, mobile: &str) -> Result<String, VendorError> {
        let url = self.endpoint("auth/check-mobile-exists")?;
        let response = self
            .client
            .post(url)
            .json(&json!({ "mobile": mobile }))
            .send()
            .await?;

        let envelope: Envelope<MobileCheckData> =
            decode(response, "auth/check-mobile-exists", false).await?;
        let data = require_success(envelope, GENERIC_FAILURE)?;

        if !data.is_some_and(|d| d.exists) {
            return Err(VendorError::Rejected {
                message: MOBILE_NOT_FOUND.to_owned(),
            });
        }

        tracing::info!("verification code requested");
        Ok("کد ارسال شد".to_owned())
    }

    /// Verifies the OTP and stores the bearer token for subsequent calls.
    ///
    /// # Errors
    ///
    /// - [`VendorError::Rejected`] — the vendor refused the code; the
    ///   message is the vendor's own, verbatim.
    /// - [`VendorError::Network`] — connection or timeout failure.
    /// - [`VendorError::Parse`] — success response without a token, or a
    ///   body that is not the expected envelope.
    pub async fn verify_code(&self, mobile: &str, code: &str) -> Result<(), VendorError> {
        let url = self.endpoint("auth/login")?;
        let payload = json!({
            "mobile": mobile,
            "otp": code,
            "password": null,
            "type": "otp",
        });
        let response = self.client.post(url).json(&payload).send().await?;

        let envelope: Envelope<LoginData> = decode(response, "auth/login", false).await?;
        let data = require_success(envelope, CODE_REJECTED)?;

        let token = data
            .and_then(|d| d.token)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| VendorError::Parse {
                context: "auth/login".to_owned(),
                reason: "success response carried no token".to_owned(),
            })?;

        *self.token.write().expect("token lock poisoned") = Some(token);
        tracing::info!("login accepted; bearer token stored");
        Ok(())
    }

    /// Fetches and normalizes the silver price list.
    ///
    /// The homepage payload nests the caller's prices under their own
    /// category; per-product titles and enable flags come from a separate
    /// features listing and are ANDed with the global trading flags.
    ///
    /// # Errors
    ///
    /// - [`VendorError::AuthExpired`] — no token stored, or the vendor
    ///   answered 401/403.
    /// - [`VendorError::CategoryNotFound`] — no category matches
    ///   `user_category_id`.
    /// - [`VendorError::Rejected`] / [`VendorError::Network`] /
    ///   [`VendorError::Parse`] — as for the other calls.
    pub async fn fetch_prices(&self) -> Result<Vec<PriceEntry>, VendorError> {
        let token = self
            .token
            .read()
            .expect("token lock poisoned")
            .clone()
            .ok_or(VendorError::AuthExpired)?;

        let url = self.endpoint("profile/homepage")?;
        let response = self.client.get(url).bearer_auth(&token).send().await?;

        let envelope: Envelope<HomepageData> = decode(response, "profile/homepage", true).await?;
        let data = require_success(envelope, GENERIC_FAILURE)?.ok_or_else(|| {
            VendorError::Parse {
                context: "profile/homepage".to_owned(),
                reason: "envelope carried no data".to_owned(),
            }
        })?;

        let wanted = coerce_i64(data.user_category_id.as_ref()).ok_or_else(|| {
            VendorError::Parse {
                context: "profile/homepage".to_owned(),
                reason: "user_category_id missing or unreadable".to_owned(),
            }
        })?;

        let category = data
            .user_categories
            .iter()
            .find(|category| coerce_i64(category.id.as_ref()) == Some(wanted))
            .ok_or(VendorError::CategoryNotFound(wanted))?;

        let features = data
            .features_data
            .as_ref()
            .map(|f| build_feature_map(&f.silver))
            .unwrap_or_default();

        let global = GlobalFlags {
            buy_enabled: coerce_flag(data.buy_status.as_ref()),
            sell_enabled: coerce_flag(data.sell_status.as_ref()),
        };

        let entries = normalize_entries(&category.silvers, &features, global);
        tracing::info!(count = entries.len(), "fetched vendor price list");
        Ok(entries)
    }

    /// The stored bearer token, if any. This is the session artifact the
    /// service persists.
    #[must_use]
    pub fn session_token(&self) -> Option<String> {
        self.token.read().expect("token lock poisoned").clone()
    }

    /// Restores a bearer token from persisted state.
    pub fn restore_session_token(&self, token: &str) {
        *self.token.write().expect("token lock poisoned") = Some(token.to_owned());
    }

    /// Drops the stored token, forcing re-authentication.
    pub fn clear_session_token(&self) {
        *self.token.write().expect("token lock poisoned") = None;
    }

    fn endpoint(&self, path: &str) -> Result<Url, VendorError> {
        self.base_url.join(path).map_err(|e| VendorError::Parse {
            context: path.to_owned(),
            reason: format!("could not build endpoint URL: {e}"),
        })
    }
}

/// Checks the HTTP status and deserializes the vendor envelope.
///
/// On an authenticated endpoint 401/403 map to [`VendorError::AuthExpired`];
/// any other non-2xx becomes [`VendorError::Rejected`] with the status. An
/// unrecognizable body is logged with enough raw context to diagnose the
/// shape drift.
async fn decode<T: DeserializeOwned>(
    response: Response,
    context: &str,
    authed: bool,
) -> Result<Envelope<T>, VendorError> {
    let status = response.status();
    if authed && (status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN) {
        return Err(VendorError::AuthExpired);
    }
    if !status.is_success() {
        return Err(VendorError::Rejected {
            message: format!("HTTP {}", status.as_u16()),
        });
    }

    let body = response.text().await?;
    match serde_json::from_str::<Envelope<T>>(&body) {
        Ok(envelope) => Ok(envelope),
        Err(e) => {
            tracing::error!(
                context,
                body = %truncate_for_log(&body),
                "vendor payload did not match any known shape"
            );
            Err(VendorError::Parse {
                context: context.to_owned(),
                reason: e.to_string(),
            })
        }
    }
}

/// Enforces the vendor's logical success flag, surfacing its message
/// verbatim on failure.
fn require_success<T>(envelope: Envelope<T>, fallback: &str) -> Result<Option<T>, VendorError> {
    if !envelope.success {
        return Err(VendorError::Rejected {
            message: envelope.message.unwrap_or_else(|| fallback.to_owned()),
        });
    }
    Ok(envelope.data)
}

fn truncate_for_log(body: &str) -> String {
    body.chars().take(LOG_BODY_LIMIT).collect()
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;
