use thiserror::Error;

/// Errors from the browser-automation fallback path.
///
/// All of these are contained to the operation that produced them: the
/// scheduler logs the failure and waits for its next trigger. Nothing here
/// may take the process down.
#[derive(Debug, Error)]
pub enum AutomationError {
    /// A WebDriver command failed after the session was established.
    #[error("WebDriver error: {0}")]
    WebDriver(#[from] fantoccini::error::CmdError),

    /// The WebDriver session itself could not be created.
    #[error("could not start WebDriver session: {0}")]
    Session(#[from] fantoccini::error::NewSessionError),

    /// Every strategy in an ordered fallback chain failed.
    #[error("every {operation} strategy failed")]
    StrategiesExhausted { operation: &'static str },

    /// The site did not leave the login page after code submission.
    #[error("login was not accepted by the site")]
    LoginRejected,

    /// No saved cookie jar; authentication is required first.
    #[error("no saved browser session; authentication required")]
    NoSession,

    /// The cookie jar artifact could not be serialized or restored.
    #[error("cookie jar error: {0}")]
    CookieJar(#[from] serde_json::Error),
}
