//! WebDriver-driven fallback acquisition.
//!
//! Each operation runs in a fresh headless session: the storefront is
//! client-rendered and half-dead sessions wedge easily, so connect-work-close
//! keeps every attempt independent. The saved cookie jar is the only state
//! carried between sessions, and it doubles as the persisted session
//! artifact.
//!
//! Every DOM step is bounded by a seconds-scale wait; an exhausted strategy
//! chain fails the one operation, never the process.

use std::sync::RwLock;
use std::time::Duration;

use fantoccini::cookies::Cookie;
use fantoccini::elements::Element;
use fantoccini::key::Key;
use fantoccini::{Client, ClientBuilder, Locator};
use serde::{Deserialize, Serialize};
use serde_json::json;

use argent_core::PriceEntry;

use crate::error::AutomationError;
use crate::extract::{extract_price_rows, placeholder_entries};
use crate::strategy::{
    first_success, MOBILE_INPUT_STRATEGIES, MODAL_CLOSE_STRATEGIES, SUBMIT_BUTTON_STRATEGIES,
};

/// Upper bound for a single element lookup.
const STEP_WAIT: Duration = Duration::from_secs(3);
/// Poll interval while waiting for an element.
const POLL_INTERVAL: Duration = Duration::from_millis(250);
/// Settle time after navigation or form submission; the storefront renders
/// client-side and needs a beat before the DOM is meaningful.
const PAGE_SETTLE: Duration = Duration::from_secs(3);

/// URL fragment that marks the login page; leaving it signals success.
const LOGIN_MARKER: &str = "login";

/// Result of a browser scrape.
#[derive(Debug)]
pub struct ScrapedPrices {
    pub entries: Vec<PriceEntry>,
    /// True when the page yielded nothing and `entries` are sample rows.
    /// Downstream must never present those as real vendor data.
    pub placeholder: bool,
}

/// Minimal serializable form of a browser cookie.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredCookie {
    name: String,
    value: String,
    path: Option<String>,
    domain: Option<String>,
    secure: bool,
}

impl StoredCookie {
    fn from_cookie(cookie: &Cookie<'_>) -> Self {
        Self {
            name: cookie.name().to_owned(),
            value: cookie.value().to_owned(),
            path: cookie.path().map(ToOwned::to_owned),
            domain: cookie.domain().map(ToOwned::to_owned),
            secure: cookie.secure().unwrap_or(false),
        }
    }

    fn into_cookie(self) -> Cookie<'static> {
        let mut cookie = Cookie::new(self.name, self.value);
        if let Some(path) = self.path {
            cookie.set_path(path);
        }
        if let Some(domain) = self.domain {
            cookie.set_domain(domain);
        }
        cookie.set_secure(self.secure);
        cookie
    }
}

/// Acquisition through a headless browser, for when no stable API contract
/// is available. Produces the same normalized rows as the REST path.
pub struct BrowserFallbackClient {
    webdriver_url: String,
    site_url: String,
    /// JSON-serialized cookie jar; the opaque session artifact.
    cookies: RwLock<Option<String>>,
}

impl BrowserFallbackClient {
    #[must_use]
    pub fn new(webdriver_url: &str, site_url: &str) -> Self {
        Self {
            webdriver_url: webdriver_url.to_owned(),
            site_url: site_url.to_owned(),
            cookies: RwLock::new(None),
        }
    }

    /// Drives the login form far enough for the vendor to send an OTP.
    ///
    /// # Errors
    ///
    /// Returns [`AutomationError`] when the session cannot be created or the
    /// mobile-input/submit chains are exhausted. A modal that refuses to
    /// close is not an error on its own.
    pub async fn request_verification_code(&self, mobile: &str) -> Result<String, AutomationError> {
        let client = self.connect().await?;
        let result = self.drive_code_request(&client, mobile).await;
        let _ = client.close().await;
        result
    }

    /// Enters the OTP, checks the login landed, and saves the cookie jar as
    /// the session artifact.
    ///
    /// # Errors
    ///
    /// Returns [`AutomationError::LoginRejected`] when the site stays on the
    /// login page, or any other [`AutomationError`] for WebDriver failures.
    pub async fn verify_code(&self, mobile: &str, code: &str) -> Result<(), AutomationError> {
        let client = self.connect().await?;
        let result = self.drive_login(&client, mobile, code).await;
        if result.is_ok() {
            self.store_cookies(&client).await?;
        }
        let _ = client.close().await;
        result
    }

    /// Scrapes the rendered homepage for silver price rows.
    ///
    /// Falls back to fixed placeholder rows — flagged as such — when nothing
    /// parses from the page.
    ///
    /// # Errors
    ///
    /// Returns [`AutomationError::NoSession`] when there is no saved cookie
    /// jar, or any other [`AutomationError`] for WebDriver failures.
    pub async fn fetch_prices(&self) -> Result<ScrapedPrices, AutomationError> {
        if self.session_artifact().is_none() {
            return Err(AutomationError::NoSession);
        }
        let client = self.connect().await?;
        let result = self.drive_price_fetch(&client).await;
        let _ = client.close().await;
        result
    }

    /// The saved cookie jar, if any.
    #[must_use]
    pub fn session_artifact(&self) -> Option<String> {
        self.cookies.read().expect("cookie lock poisoned").clone()
    }

    /// Restores a cookie jar from persisted state.
    pub fn restore_session(&self, artifact: &str) {
        *self.cookies.write().expect("cookie lock poisoned") = Some(artifact.to_owned());
    }

    /// Drops the saved cookie jar, forcing re-authentication.
    pub fn clear_session(&self) {
        *self.cookies.write().expect("cookie lock poisoned") = None;
    }

    async fn connect(&self) -> Result<Client, AutomationError> {
        let mut caps = serde_json::map::Map::new();
        caps.insert(
            "goog:chromeOptions".to_owned(),
            json!({
                "args": [
                    "--headless=new",
                    "--no-sandbox",
                    "--disable-dev-shm-usage",
                    "--disable-gpu",
                    "--window-size=1920,1080",
                ]
            }),
        );

        let client = ClientBuilder::native()
            .capabilities(caps)
            .connect(&self.webdriver_url)
            .await?;
        Ok(client)
    }

    async fn drive_code_request(
        &self,
        client: &Client,
        mobile: &str,
    ) -> Result<String, AutomationError> {
        client.goto(&self.site_url).await?;
        tokio::time::sleep(PAGE_SETTLE).await;
        dismiss_interstitial(client).await;

        let input = find_mobile_input(client).await?;
        input.clear().await?;
        input.send_keys(mobile).await?;

        submit_form(client, &input).await?;
        tokio::time::sleep(PAGE_SETTLE).await;

        tracing::info!("verification code requested through browser");
        Ok("کد ارسال شد".to_owned())
    }

    async fn drive_login(
        &self,
        client: &Client,
        mobile: &str,
        code: &str,
    ) -> Result<(), AutomationError> {
        client.goto(&self.site_url).await?;
        tokio::time::sleep(PAGE_SETTLE).await;
        dismiss_interstitial(client).await;

        // Some variants land straight on the code screen; re-entering the
        // mobile number is only needed when the form is still present.
        if let Ok(input) = find_mobile_input(client).await {
            let _ = input.clear().await;
            let _ = input.send_keys(mobile).await;
            let _ = submit_form(client, &input).await;
            tokio::time::sleep(PAGE_SETTLE).await;
        }

        enter_code(client, code).await?;
        tokio::time::sleep(PAGE_SETTLE).await;

        let url = client.current_url().await?;
        if url.as_str().contains(LOGIN_MARKER) {
            return Err(AutomationError::LoginRejected);
        }

        tracing::info!("browser login accepted");
        Ok(())
    }

    async fn drive_price_fetch(&self, client: &Client) -> Result<ScrapedPrices, AutomationError> {
        self.apply_cookies(client).await?;
        tokio::time::sleep(PAGE_SETTLE).await;

        let html = client.source().await?;
        match extract_price_rows(&html) {
            Some(entries) => {
                tracing::info!(count = entries.len(), "scraped price rows from rendered page");
                Ok(ScrapedPrices {
                    entries,
                    placeholder: false,
                })
            }
            None => {
                tracing::warn!("no price rows parsed from rendered page; serving placeholder rows");
                Ok(ScrapedPrices {
                    entries: placeholder_entries(),
                    placeholder: true,
                })
            }
        }
    }

    async fn store_cookies(&self, client: &Client) -> Result<(), AutomationError> {
        let cookies = client.get_all_cookies().await?;
        let stored: Vec<StoredCookie> = cookies.iter().map(StoredCookie::from_cookie).collect();
        let artifact = serde_json::to_string(&stored)?;
        tracing::debug!(count = stored.len(), "cookie jar saved as session artifact");
        *self.cookies.write().expect("cookie lock poisoned") = Some(artifact);
        Ok(())
    }

    /// Loads the site and replays the saved cookie jar into the fresh
    /// session, then reloads so the session takes effect.
    async fn apply_cookies(&self, client: &Client) -> Result<(), AutomationError> {
        let artifact = self.session_artifact().ok_or(AutomationError::NoSession)?;
        let stored: Vec<StoredCookie> = serde_json::from_str(&artifact)?;

        client.goto(&self.site_url).await?;
        for cookie in stored {
            let name = cookie.name.clone();
            if let Err(e) = client.add_cookie(cookie.into_cookie()).await {
                // Cookies scoped to other subdomains are rejected; skip them.
                tracing::debug!(cookie = %name, error = %e, "cookie restore skipped one cookie");
            }
        }
        client.refresh().await?;
        Ok(())
    }
}

/// Best-effort dismissal of the app-install modal that covers the login
/// form. Failure to dismiss is not fatal; the form may still be reachable.
async fn dismiss_interstitial(client: &Client) {
    let clicked = first_success("modal-dismiss", MODAL_CLOSE_STRATEGIES, |s| async move {
        let element = find_with_wait(client, s.xpath).await?;
        element.click().await.ok()
    })
    .await;

    if clicked.is_err() {
        // Last resort: Escape on <body>.
        if let Ok(body) = client.find(Locator::Css("body")).await {
            let _ = body.send_keys(&char::from(Key::Escape).to_string()).await;
            tracing::debug!(operation = "modal-dismiss", strategy = "escape-key", "fallback used");
        }
    }
}

async fn find_mobile_input(client: &Client) -> Result<Element, AutomationError> {
    first_success("mobile-input", MOBILE_INPUT_STRATEGIES, |s| async move {
        find_with_wait(client, s.xpath).await
    })
    .await
}

/// Submission chain: native click on a submit control, scripted click, then
/// Enter on the input itself.
async fn submit_form(client: &Client, input: &Element) -> Result<(), AutomationError> {
    let native = first_success("submit", SUBMIT_BUTTON_STRATEGIES, |s| async move {
        let button = find_with_wait(client, s.xpath).await?;
        button.click().await.ok()
    })
    .await;
    if native.is_ok() {
        return Ok(());
    }

    if let Ok(button) = client.find(Locator::XPath("//button[@type='submit']")).await {
        if let Ok(argument) = serde_json::to_value(&button) {
            if client
                .execute("arguments[0].click();", vec![argument])
                .await
                .is_ok()
            {
                tracing::debug!(operation = "submit", strategy = "scripted-click", "strategy succeeded");
                return Ok(());
            }
        }
    }

    input.send_keys(&char::from(Key::Enter).to_string()).await?;
    tracing::debug!(operation = "submit", strategy = "enter-key", "strategy succeeded");
    Ok(())
}

/// Fills either six discrete one-digit inputs or a single combined field,
/// selected by counting the text-like inputs on the page.
async fn enter_code(client: &Client, code: &str) -> Result<(), AutomationError> {
    let inputs = client
        .find_all(Locator::XPath(
            "//input[@type='text' or @type='tel' or @type='number']",
        ))
        .await?;

    if inputs.len() >= 6 {
        tracing::debug!(operation = "code-entry", strategy = "discrete-digits", "strategy chosen");
        for (input, digit) in inputs.iter().zip(code.chars().take(6)) {
            input.clear().await?;
            input.send_keys(&digit.to_string()).await?;
        }
    } else if let Some(input) = inputs.last() {
        tracing::debug!(operation = "code-entry", strategy = "single-field", "strategy chosen");
        input.clear().await?;
        input.send_keys(code).await?;
    } else {
        return Err(AutomationError::StrategiesExhausted {
            operation: "code-entry",
        });
    }

    // The confirm button is optional; some variants submit on the last digit.
    if let Ok(button) = client
        .find(Locator::XPath(
            "//button[contains(text(), 'تایید') or contains(text(), 'ورود')]",
        ))
        .await
    {
        let _ = button.click().await;
    }
    Ok(())
}

/// One bounded element lookup; `None` when the element never appears.
async fn find_with_wait(client: &Client, xpath: &str) -> Option<Element> {
    client
        .wait()
        .at_most(STEP_WAIT)
        .every(POLL_INTERVAL)
        .for_element(Locator::XPath(xpath))
        .await
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stored_cookie_round_trips_through_json() {
        let stored = StoredCookie {
            name: "session".to_owned(),
            value: "tok123".to_owned(),
            path: Some("/".to_owned()),
            domain: Some(".vendor.example".to_owned()),
            secure: true,
        };
        let artifact = serde_json::to_string(&vec![stored]).unwrap();
        let parsed: Vec<StoredCookie> = serde_json::from_str(&artifact).unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].name, "session");
        assert_eq!(parsed[0].value, "tok123");
        assert!(parsed[0].secure);
    }

    #[test]
    fn stored_cookie_converts_to_browser_cookie() {
        let stored = StoredCookie {
            name: "session".to_owned(),
            value: "tok123".to_owned(),
            path: Some("/".to_owned()),
            domain: None,
            secure: false,
        };
        let cookie = stored.into_cookie();
        assert_eq!(cookie.name(), "session");
        assert_eq!(cookie.value(), "tok123");
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.domain(), None);
    }

    #[test]
    fn session_artifact_lifecycle() {
        let client = BrowserFallbackClient::new("http://localhost:4444", "https://vendor.example");
        assert!(client.session_artifact().is_none());

        client.restore_session("[]");
        assert_eq!(client.session_artifact().as_deref(), Some("[]"));

        client.clear_session();
        assert!(client.session_artifact().is_none());
    }

    #[tokio::test]
    async fn fetch_without_session_is_a_distinct_error() {
        let client = BrowserFallbackClient::new("http://localhost:4444", "https://vendor.example");
        let err = client.fetch_prices().await.unwrap_err();
        assert!(matches!(err, AutomationError::NoSession));
    }
}
