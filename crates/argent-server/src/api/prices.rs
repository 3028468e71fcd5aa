//! Read-side endpoints: the JSON price feed and the minimal HTML dashboard.
//!
//! Presentation stays thin on purpose — the dashboard is one rendered table
//! over the current snapshot, no templating engine involved.

use axum::{
    extract::State,
    response::{Html, IntoResponse},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;

use argent_core::{PriceEntry, Snapshot, SnapshotOrigin};

use crate::middleware::RequestId;

use super::{ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Serialize)]
pub(super) struct PricesData {
    pub prices: Vec<PriceEntry>,
    pub fetched_at: DateTime<Utc>,
    pub markup_percent: f64,
    pub origin: SnapshotOrigin,
    pub configured: bool,
    /// True when the rows are placeholder fixtures rather than vendor data.
    pub placeholder: bool,
}

impl PricesData {
    fn from_snapshot(snapshot: &Snapshot) -> Self {
        Self {
            prices: snapshot.entries.clone(),
            fetched_at: snapshot.fetched_at,
            markup_percent: snapshot.markup_percent,
            origin: snapshot.origin,
            configured: snapshot.configured,
            placeholder: snapshot.origin == SnapshotOrigin::Placeholder,
        }
    }
}

pub(super) async fn get_prices(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> impl IntoResponse {
    let snapshot = state.service.current_snapshot();
    Json(ApiResponse {
        data: PricesData::from_snapshot(&snapshot),
        meta: ResponseMeta::new(req_id.0),
    })
}

pub(super) async fn dashboard(State(state): State<AppState>) -> Html<String> {
    let snapshot = state.service.current_snapshot();
    Html(render_dashboard(&snapshot))
}

fn render_dashboard(snapshot: &Snapshot) -> String {
    let mut rows = String::new();
    for entry in &snapshot.entries {
        let status = if entry.is_active { "فعال" } else { "غیرفعال" };
        rows.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
            escape(&entry.name),
            format_toman(entry.buy_price),
            format_toman(entry.sell_price),
            status
        ));
    }

    let notice = if snapshot.origin == SnapshotOrigin::Placeholder {
        "<p class=\"notice\">داده نمونه — قیمت واقعی فروشنده در دسترس نیست</p>"
    } else if !snapshot.configured {
        "<p class=\"notice\">برای دریافت قیمت ابتدا وارد شوید</p>"
    } else {
        ""
    };

    format!(
        "<!doctype html>\n<html lang=\"fa\" dir=\"rtl\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>قیمت نقره</title>\n\
         <style>body{{font-family:sans-serif;margin:2rem}}table{{border-collapse:collapse}}\
         td,th{{border:1px solid #ccc;padding:.4rem .8rem}}.notice{{color:#a00}}</style>\n\
         </head>\n<body>\n<h1>قیمت نقره</h1>\n{notice}\n\
         <table>\n<tr><th>کالا</th><th>خرید (تومان)</th><th>فروش (تومان)</th><th>وضعیت</th></tr>\n\
         {rows}</table>\n\
         <p>بروزرسانی: {fetched_at} — درصد افزایش: {markup}%</p>\n</body>\n</html>\n",
        notice = notice,
        rows = rows,
        fetched_at = snapshot.fetched_at.format("%Y-%m-%d %H:%M:%S UTC"),
        markup = snapshot.markup_percent,
    )
}

/// Minimal HTML escaping for vendor-controlled titles.
fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Groups digits in threes for display: `4500000` → `4,500,000`.
fn format_toman(value: i64) -> String {
    let negative = value < 0;
    let digits = value.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    for (index, c) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    if negative {
        format!("-{grouped}")
    } else {
        grouped
    }
}
