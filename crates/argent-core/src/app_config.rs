use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// Which acquisition path the service drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Acquisition {
    /// The vendor REST API (default).
    Api,
    /// Headless-browser scraping, for when the API contract is unavailable.
    Browser,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    /// Path of the YAML state document.
    pub state_path: PathBuf,
    pub vendor_api_url: String,
    pub vendor_site_url: String,
    pub request_timeout_secs: u64,
    /// Seconds between scheduled refreshes. Kept coarse on purpose: the
    /// vendor serves a storefront, not a ticker feed.
    pub refresh_interval_secs: u64,
    pub acquisition: Acquisition,
    pub webdriver_url: String,
    pub user_agent: String,
}
