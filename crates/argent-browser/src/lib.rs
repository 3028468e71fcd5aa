pub mod client;
pub mod error;
pub mod extract;
pub mod strategy;

pub use client::{BrowserFallbackClient, ScrapedPrices};
pub use error::AutomationError;
