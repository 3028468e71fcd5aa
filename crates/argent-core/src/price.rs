//! Canonical price entities shared across the workspace.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Maximum number of product rows retained in a snapshot.
///
/// The vendor's homepage payload can carry more silver products than its own
/// storefront displays; only the first nine rows are meaningful.
pub const SNAPSHOT_ROW_LIMIT: usize = 9;

/// One normalized silver product.
///
/// `buy_price_base`/`sell_price_base` are toman as captured from the vendor
/// and never change for the life of the entry; `buy_price`/`sell_price` are
/// always recomputed from them whenever the markup percentage changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceEntry {
    /// Vendor-assigned product id, unique within a snapshot.
    pub id: i64,
    /// Display title; defaulted when the vendor omits it, never empty.
    pub name: String,
    pub buy_price_base: i64,
    pub sell_price_base: i64,
    pub buy_price: i64,
    pub sell_price: i64,
    /// 0/1 per the vendor's wire convention: the per-product flag ANDed with
    /// the global trading flag.
    pub buy_status: u8,
    pub sell_status: u8,
    /// True when either buying or selling is enabled.
    pub is_active: bool,
}

/// Which acquisition path produced a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapshotOrigin {
    /// Vendor REST API.
    Api,
    /// Headless-browser scrape of the rendered storefront.
    Browser,
    /// Fixed sample rows emitted when the browser scrape parsed nothing.
    /// Must never be presented as real vendor data.
    Placeholder,
}

/// The single process-wide set of normalized, markup-adjusted prices.
///
/// Replaced atomically by a successful refresh; readers may observe a stale
/// snapshot but never a partially written one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub entries: Vec<PriceEntry>,
    pub fetched_at: DateTime<Utc>,
    pub markup_percent: f64,
    pub origin: SnapshotOrigin,
    /// Whether the stored session is believed valid. Cleared when a refresh
    /// finds the session expired, forcing re-authentication.
    pub configured: bool,
}

impl Snapshot {
    /// An empty snapshot for first startup, before any successful refresh.
    #[must_use]
    pub fn empty(markup_percent: f64, configured: bool) -> Self {
        Self {
            entries: Vec::new(),
            fetched_at: Utc::now(),
            markup_percent,
            origin: SnapshotOrigin::Api,
            configured,
        }
    }
}
