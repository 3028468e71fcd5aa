pub mod app_config;
mod config;
pub mod markup;
pub mod price;
pub mod state;

pub use app_config::{Acquisition, AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use markup::apply_markup;
pub use price::{PriceEntry, Snapshot, SnapshotOrigin, SNAPSHOT_ROW_LIMIT};
pub use state::PersistedState;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
