//! Normalization from raw vendor records to canonical [`PriceEntry`] rows.
//!
//! Price parsing is delegated to [`crate::shape`]; this module handles the
//! structural pass: defaults, status flag combination, and truncation.

use std::collections::HashMap;

use serde_json::Value;

use argent_core::{PriceEntry, SNAPSHOT_ROW_LIMIT};

use crate::shape::{coerce_flag, coerce_i64, detect_price_shape, extract_prices};
use crate::types::SilverFeature;

/// Display title used when the features listing has no title for a product.
pub const DEFAULT_PRODUCT_TITLE: &str = "محصول نقره";

/// Global trading flags from the homepage payload.
#[derive(Debug, Clone, Copy)]
pub struct GlobalFlags {
    pub buy_enabled: bool,
    pub sell_enabled: bool,
}

/// Builds the per-product lookup from the features listing, keyed by id.
/// Features without a readable id are dropped.
#[must_use]
pub fn build_feature_map(features: &[SilverFeature]) -> HashMap<i64, SilverFeature> {
    features
        .iter()
        .filter_map(|feature| Some((coerce_i64(feature.id.as_ref())?, feature.clone())))
        .collect()
}

/// Normalizes raw category records into canonical entries.
///
/// One price shape is detected for the whole payload and applied to every
/// record. Records without a readable id are skipped; nothing here aborts
/// the pass. Per-product flags are ANDed with the global flags. The result
/// is pre-markup: `buy_price`/`sell_price` start equal to their base values
/// and are recomputed by the caller. At most [`SNAPSHOT_ROW_LIMIT`] entries
/// are returned, in payload order.
#[must_use]
pub fn normalize_entries(
    records: &[Value],
    features: &HashMap<i64, SilverFeature>,
    global: GlobalFlags,
) -> Vec<PriceEntry> {
    let shape = detect_price_shape(records);

    records
        .iter()
        .filter_map(|record| {
            let id = coerce_i64(record.get("id"))?;
            let (buy_base, sell_base) =
                shape.map_or((0, 0), |shape| extract_prices(record, shape));

            let feature = features.get(&id);
            let item_buy = feature.is_none_or(|f| coerce_flag(f.buy_status.as_ref()));
            let item_sell = feature.is_none_or(|f| coerce_flag(f.sell_status.as_ref()));

            let buy_status = u8::from(item_buy && global.buy_enabled);
            let sell_status = u8::from(item_sell && global.sell_enabled);

            let name = feature
                .and_then(|f| f.title.clone())
                .filter(|title| !title.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_PRODUCT_TITLE.to_owned());

            Some(PriceEntry {
                id,
                name,
                buy_price_base: buy_base,
                sell_price_base: sell_base,
                buy_price: buy_base,
                sell_price: sell_base,
                buy_status,
                sell_status,
                is_active: buy_status == 1 || sell_status == 1,
            })
        })
        .take(SNAPSHOT_ROW_LIMIT)
        .collect()
}
