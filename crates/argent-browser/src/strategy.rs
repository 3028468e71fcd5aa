//! Ordered fallback strategies for fragile DOM interactions.
//!
//! The vendor site exposes no stable selectors, so every interaction is an
//! ordered list of named attempts consumed by one generic driver: the first
//! success wins and the winner is logged for diagnosability. Earlier
//! strategies failing is expected and never fails the overall operation on
//! its own — only exhausting the whole chain does.

use std::future::Future;

use crate::error::AutomationError;

/// Anything identifiable by a strategy name, for logging.
pub trait NamedStrategy {
    fn name(&self) -> &'static str;
}

/// An XPath locator candidate.
#[derive(Debug, Clone, Copy)]
pub struct SelectorStrategy {
    pub name: &'static str,
    pub xpath: &'static str,
}

impl NamedStrategy for SelectorStrategy {
    fn name(&self) -> &'static str {
        self.name
    }
}

/// Runs `attempt` over `candidates` in order, returning the first success.
///
/// Failures are logged at debug and the chain continues; when every
/// candidate fails the chain resolves to
/// [`AutomationError::StrategiesExhausted`].
pub async fn first_success<T, C, F, Fut>(
    operation: &'static str,
    candidates: &[C],
    mut attempt: F,
) -> Result<T, AutomationError>
where
    C: NamedStrategy + Clone,
    F: FnMut(C) -> Fut,
    Fut: Future<Output = Option<T>>,
{
    for candidate in candidates {
        let name = candidate.name();
        if let Some(value) = attempt(candidate.clone()).await {
            tracing::debug!(operation, strategy = name, "strategy succeeded");
            return Ok(value);
        }
        tracing::debug!(operation, strategy = name, "strategy failed; trying next");
    }
    Err(AutomationError::StrategiesExhausted { operation })
}

/// Dismissal candidates for the app-install modal that covers the login
/// form, in order of least collateral damage.
pub const MODAL_CLOSE_STRATEGIES: &[SelectorStrategy] = &[
    SelectorStrategy {
        name: "close-button",
        xpath: "//button[contains(@class, 'close')]",
    },
    SelectorStrategy {
        name: "aria-close",
        xpath: "//button[@aria-label='Close']",
    },
    SelectorStrategy {
        name: "modal-close",
        xpath: "//button[contains(@class, 'modal-close')]",
    },
    SelectorStrategy {
        name: "modal-button",
        xpath: "//div[contains(@class, 'modal')]//button",
    },
    SelectorStrategy {
        name: "backdrop",
        xpath: "//div[contains(@class, 'modal-backdrop') or contains(@class, 'overlay')]",
    },
];

/// Candidates for the mobile-number input on the login form.
pub const MOBILE_INPUT_STRATEGIES: &[SelectorStrategy] = &[
    SelectorStrategy {
        name: "tel-input",
        xpath: "//input[@type='tel']",
    },
    SelectorStrategy {
        name: "name-mobile",
        xpath: "//input[@name='mobile']",
    },
    SelectorStrategy {
        name: "name-phone",
        xpath: "//input[@name='phone']",
    },
    SelectorStrategy {
        name: "placeholder-mobile",
        xpath: "//input[contains(@placeholder, 'موبایل')]",
    },
    SelectorStrategy {
        name: "placeholder-number",
        xpath: "//input[contains(@placeholder, 'شماره')]",
    },
];

/// Candidates for the form's submit control.
pub const SUBMIT_BUTTON_STRATEGIES: &[SelectorStrategy] = &[
    SelectorStrategy {
        name: "submit-button",
        xpath: "//button[@type='submit']",
    },
    SelectorStrategy {
        name: "send-text",
        xpath: "//button[contains(text(), 'ارسال')]",
    },
    SelectorStrategy {
        name: "submit-input",
        xpath: "//input[@type='submit']",
    },
];
