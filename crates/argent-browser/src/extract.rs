//! Price extraction from rendered storefront HTML.
//!
//! Pure string processing, so the parsing rules are testable without a
//! browser. Rows are recognized by keyword, prices by digit-stripping; the
//! storefront renders Persian digits, so those map to ASCII first.

use regex::Regex;

use argent_core::{PriceEntry, SNAPSHOT_ROW_LIMIT};

/// Keywords that mark a table row as a silver product.
const ROW_KEYWORDS: &[&str] = &["نقره", "سکه", "silver"];

/// Parses silver price rows out of rendered page HTML.
///
/// Scans every `<tr>`, keeps rows whose text mentions a silver keyword, and
/// reads name/buy/sell from the first three cells. Returns `None` when no
/// row parses, so the caller decides explicitly what to serve instead —
/// never a silent substitution.
#[must_use]
pub fn extract_price_rows(html: &str) -> Option<Vec<PriceEntry>> {
    let row_re = Regex::new(r"(?s)<tr[^>]*>(.*?)</tr>").expect("valid regex");
    let cell_re = Regex::new(r"(?s)<t[dh][^>]*>(.*?)</t[dh]>").expect("valid regex");

    let mut entries: Vec<PriceEntry> = Vec::new();
    for row in row_re.captures_iter(html) {
        let cells: Vec<String> = cell_re
            .captures_iter(&row[1])
            .map(|cell| strip_tags(&cell[1]))
            .collect();
        if cells.len() < 3 {
            continue;
        }

        let joined = cells.join(" ").to_lowercase();
        if !ROW_KEYWORDS.iter().any(|keyword| joined.contains(keyword)) {
            continue;
        }

        let name = cells[0].trim().to_owned();
        let buy = parse_price_cell(&cells[1]);
        let sell = parse_price_cell(&cells[2]);
        if name.is_empty() || (buy == 0 && sell == 0) {
            continue;
        }

        // Rendered rows carry no vendor id; number them by position.
        #[allow(clippy::cast_possible_wrap)]
        let id = entries.len() as i64 + 1;
        entries.push(PriceEntry {
            id,
            name,
            buy_price_base: buy,
            sell_price_base: sell,
            buy_price: buy,
            sell_price: sell,
            buy_status: 1,
            sell_status: 1,
            is_active: true,
        });
    }

    entries.truncate(SNAPSHOT_ROW_LIMIT);
    if entries.is_empty() {
        None
    } else {
        Some(entries)
    }
}

/// Fixed sample rows served when the rendered page yields nothing.
///
/// Callers must mark snapshots built from these as placeholder data — they
/// are illustrative figures, not vendor prices. Ids are negative so they can
/// never collide with a vendor-assigned id.
#[must_use]
pub fn placeholder_entries() -> Vec<PriceEntry> {
    [
        ("نقره 925", 45_000_i64, 47_000_i64),
        ("سکه نقره", 850_000, 900_000),
        ("شمش نقره 100 گرمی", 4_500_000, 4_700_000),
    ]
    .into_iter()
    .enumerate()
    .map(|(index, (name, buy, sell))| {
        #[allow(clippy::cast_possible_wrap)]
        let id = -(index as i64 + 1);
        PriceEntry {
            id,
            name: name.to_owned(),
            buy_price_base: buy,
            sell_price_base: sell,
            buy_price: buy,
            sell_price: sell,
            buy_status: 1,
            sell_status: 1,
            is_active: true,
        }
    })
    .collect()
}

/// Removes markup and collapses whitespace inside a table cell.
fn strip_tags(fragment: &str) -> String {
    let tag_re = Regex::new(r"<[^>]*>").expect("valid regex");
    let no_tags = tag_re.replace_all(fragment, " ");
    no_tags.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Parses a price cell by keeping digits only: separators and currency words
/// drop out, Persian and Arabic-Indic digits map to ASCII. An unparsable
/// cell reads as 0.
fn parse_price_cell(cell: &str) -> i64 {
    let digits: String = cell.chars().filter_map(ascii_digit).collect();
    digits.parse::<i64>().unwrap_or(0)
}

fn ascii_digit(c: char) -> Option<char> {
    match c {
        '0'..='9' => Some(c),
        '۰'..='۹' => char::from_u32(u32::from(c) - u32::from('۰') + u32::from('0')),
        '٠'..='٩' => char::from_u32(u32::from(c) - u32::from('٠') + u32::from('0')),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_keyword_rows_from_a_table() {
        let html = r#"
            <table>
                <tr><th>کالا</th><th>خرید</th><th>فروش</th></tr>
                <tr><td>نقره 925</td><td>45,000 تومان</td><td>47,000 تومان</td></tr>
                <tr><td>طلای 18 عیار</td><td>3,000,000</td><td>3,100,000</td></tr>
                <tr><td>سکه نقره</td><td>850,000</td><td>900,000</td></tr>
            </table>
        "#;

        let entries = extract_price_rows(html).expect("rows should parse");
        assert_eq!(entries.len(), 2, "only silver keyword rows are kept");
        assert_eq!(entries[0].name, "نقره 925");
        assert_eq!(entries[0].buy_price_base, 45_000);
        assert_eq!(entries[0].sell_price_base, 47_000);
        assert_eq!(entries[1].name, "سکه نقره");
    }

    #[test]
    fn parses_persian_digits() {
        let html = r#"
            <table>
                <tr><td>نقره 925</td><td>۴۵٬۰۰۰</td><td>۴۷٬۰۰۰</td></tr>
            </table>
        "#;
        let entries = extract_price_rows(html).unwrap();
        assert_eq!(entries[0].buy_price_base, 45_000);
        assert_eq!(entries[0].sell_price_base, 47_000);
    }

    #[test]
    fn nested_markup_inside_cells_is_stripped() {
        let html = r#"
            <table>
                <tr><td><span>نقره</span> <b>925</b></td><td><b>45000</b></td><td>47000</td></tr>
            </table>
        "#;
        let entries = extract_price_rows(html).unwrap();
        assert_eq!(entries[0].name, "نقره 925");
        assert_eq!(entries[0].buy_price_base, 45_000);
    }

    #[test]
    fn rows_with_fewer_than_three_cells_are_skipped() {
        let html = r#"<table><tr><td>نقره</td><td>45000</td></tr></table>"#;
        assert!(extract_price_rows(html).is_none());
    }

    #[test]
    fn zero_priced_rows_are_skipped() {
        let html = r#"<table><tr><td>نقره 925</td><td>-</td><td>ناموجود</td></tr></table>"#;
        assert!(extract_price_rows(html).is_none());
    }

    #[test]
    fn pageful_of_rows_truncates_to_the_row_limit() {
        let rows: String = (1..=12)
            .map(|i| format!("<tr><td>نقره {i}</td><td>{}</td><td>{}</td></tr>", i * 1000, i * 1100))
            .collect();
        let html = format!("<table>{rows}</table>");
        let entries = extract_price_rows(&html).unwrap();
        assert_eq!(entries.len(), SNAPSHOT_ROW_LIMIT);
        assert_eq!(entries[0].name, "نقره 1");
    }

    #[test]
    fn tableless_page_yields_none_not_placeholders() {
        assert!(extract_price_rows("<html><body><p>در حال بارگذاری</p></body></html>").is_none());
    }

    #[test]
    fn placeholder_entries_use_negative_ids() {
        let entries = placeholder_entries();
        assert_eq!(entries.len(), 3);
        assert!(
            entries.iter().all(|e| e.id < 0),
            "placeholder ids must never collide with vendor ids"
        );
    }

    #[test]
    fn price_cell_parsing_is_separator_agnostic() {
        assert_eq!(parse_price_cell("4,500,000 تومان"), 4_500_000);
        assert_eq!(parse_price_cell("۴٬۵۰۰٬۰۰۰"), 4_500_000);
        assert_eq!(parse_price_cell("no digits"), 0);
        assert_eq!(parse_price_cell(""), 0);
    }
}
