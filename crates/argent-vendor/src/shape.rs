//! Defensive extraction from unstable vendor payloads.
//!
//! Observed vendor responses disagree on where prices live and what unit
//! they are in, so extraction is a short ordered list of shape probes: the
//! first shape any record in a payload satisfies is chosen and then applied
//! to every record in that payload. Units are never guessed per record.

use serde_json::Value;

/// Price field layouts observed across vendor API versions, in probe order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceShape {
    /// `buy_price_gheram`/`sell_price_gheram`: per-gram prices, toman.
    GramToman,
    /// `buy_price`/`sell_price`: whole-item prices, toman.
    ItemToman,
    /// `buy_price_rial`/`sell_price_rial`: whole-item prices, rial.
    ItemRial,
}

impl PriceShape {
    const PROBE_ORDER: [PriceShape; 3] = [Self::GramToman, Self::ItemToman, Self::ItemRial];

    fn field_names(self) -> (&'static str, &'static str) {
        match self {
            Self::GramToman => ("buy_price_gheram", "sell_price_gheram"),
            Self::ItemToman => ("buy_price", "sell_price"),
            Self::ItemRial => ("buy_price_rial", "sell_price_rial"),
        }
    }

    /// Converts a raw value in this shape's unit to toman, the canonical
    /// unit for everything downstream.
    fn to_toman(self, raw: i64) -> i64 {
        match self {
            Self::GramToman | Self::ItemToman => raw,
            // Rial is the minor unit: 10 rial = 1 toman.
            Self::ItemRial => raw / 10,
        }
    }
}

/// Picks the first shape in probe order that any record in the payload
/// populates. Returns `None` for an empty or entirely price-less payload.
#[must_use]
pub fn detect_price_shape(records: &[Value]) -> Option<PriceShape> {
    PriceShape::PROBE_ORDER.into_iter().find(|shape| {
        let (buy_field, sell_field) = shape.field_names();
        records.iter().any(|record| {
            coerce_i64(record.get(buy_field)).is_some()
                || coerce_i64(record.get(sell_field)).is_some()
        })
    })
}

/// Reads one record's buy/sell prices in toman under `shape`.
///
/// A missing or unparsable field yields 0 — a record with no readable price
/// must never gain a fabricated one. Negative values clamp to 0.
#[must_use]
pub fn extract_prices(record: &Value, shape: PriceShape) -> (i64, i64) {
    let (buy_field, sell_field) = shape.field_names();
    let read =
        |field: &str| coerce_i64(record.get(field)).map_or(0, |raw| shape.to_toman(raw).max(0));
    (read(buy_field), read(sell_field))
}

/// Lenient numeric coercion: integers, floats (truncated), and numeric
/// strings have all been observed in the wild for the same field.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn coerce_i64(value: Option<&Value>) -> Option<i64> {
    match value? {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => {
            let trimmed = s.trim();
            trimmed
                .parse::<i64>()
                .ok()
                .or_else(|| trimmed.parse::<f64>().ok().map(|f| f as i64))
        }
        _ => None,
    }
}

/// Reads a 0/1-style enable flag. `true`, nonzero numbers, and numeric
/// strings count as enabled; a missing or unreadable flag defaults to
/// enabled, matching the vendor's own dashboard behavior.
#[must_use]
pub fn coerce_flag(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::Bool(b)) => *b,
        Some(v) => coerce_i64(Some(v)).is_none_or(|n| n != 0),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn detects_gram_shape_first() {
        let records = vec![
            json!({"id": 1, "buy_price_gheram": 45000, "buy_price_rial": 450000}),
            json!({"id": 2, "buy_price_rial": 900000}),
        ];
        assert_eq!(detect_price_shape(&records), Some(PriceShape::GramToman));
    }

    #[test]
    fn falls_through_to_item_toman() {
        let records = vec![json!({"id": 1, "buy_price": 850_000, "sell_price": 900_000})];
        assert_eq!(detect_price_shape(&records), Some(PriceShape::ItemToman));
    }

    #[test]
    fn falls_through_to_rial() {
        let records = vec![json!({"id": 1, "sell_price_rial": 470_000})];
        assert_eq!(detect_price_shape(&records), Some(PriceShape::ItemRial));
    }

    #[test]
    fn no_shape_for_priceless_payload() {
        let records = vec![json!({"id": 1, "title": "x"})];
        assert_eq!(detect_price_shape(&records), None);
        assert_eq!(detect_price_shape(&[]), None);
    }

    #[test]
    fn chosen_shape_applies_to_records_missing_the_field() {
        // Record 2 only carries a rial price, but the payload-level probe
        // picked the gram shape, so record 2 reads as zero rather than
        // falling back to a different unit.
        let records = vec![
            json!({"id": 1, "buy_price_gheram": 45_000}),
            json!({"id": 2, "buy_price_rial": 900_000}),
        ];
        let shape = detect_price_shape(&records).unwrap();
        assert_eq!(extract_prices(&records[1], shape), (0, 0));
    }

    #[test]
    fn rial_converts_to_toman() {
        let record = json!({"buy_price_rial": 450_000, "sell_price_rial": 470_005});
        assert_eq!(
            extract_prices(&record, PriceShape::ItemRial),
            (45_000, 47_000)
        );
    }

    #[test]
    fn negative_prices_clamp_to_zero() {
        let record = json!({"buy_price": -5, "sell_price": 10});
        assert_eq!(extract_prices(&record, PriceShape::ItemToman), (0, 10));
    }

    #[test]
    fn coerce_i64_handles_observed_encodings() {
        assert_eq!(coerce_i64(Some(&json!(42))), Some(42));
        assert_eq!(coerce_i64(Some(&json!(42.9))), Some(42));
        assert_eq!(coerce_i64(Some(&json!("42"))), Some(42));
        assert_eq!(coerce_i64(Some(&json!(" 42 "))), Some(42));
        assert_eq!(coerce_i64(Some(&json!("42.5"))), Some(42));
        assert_eq!(coerce_i64(Some(&json!("abc"))), None);
        assert_eq!(coerce_i64(Some(&json!(null))), None);
        assert_eq!(coerce_i64(None), None);
    }

    #[test]
    fn coerce_flag_defaults_to_enabled() {
        assert!(coerce_flag(None));
        assert!(coerce_flag(Some(&json!(null))));
    }

    #[test]
    fn coerce_flag_reads_observed_encodings() {
        assert!(coerce_flag(Some(&json!(1))));
        assert!(coerce_flag(Some(&json!(true))));
        assert!(coerce_flag(Some(&json!("1"))));
        assert!(!coerce_flag(Some(&json!(0))));
        assert!(!coerce_flag(Some(&json!(false))));
        assert!(!coerce_flag(Some(&json!("0"))));
    }
}
