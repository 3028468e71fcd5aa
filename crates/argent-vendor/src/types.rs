//! Wire types for the vendor REST API.
//!
//! The vendor wraps every response in a `{success, message, data}` envelope.
//! Fields that have drifted across observed API versions (ids, flags, the
//! product records themselves) stay as [`serde_json::Value`] and go through
//! the lenient coercion and shape probes in [`crate::shape`] rather than
//! being pinned to one historical layout.

use serde::Deserialize;
use serde_json::Value;

/// The vendor's standard response envelope.
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    pub data: Option<T>,
}

/// `auth/check-mobile-exists` payload.
#[derive(Debug, Deserialize)]
pub struct MobileCheckData {
    #[serde(default)]
    pub exists: bool,
}

/// `auth/login` payload.
#[derive(Debug, Deserialize)]
pub struct LoginData {
    pub token: Option<String>,
}

/// The `profile/homepage` payload, reduced to the fields the pipeline reads.
#[derive(Debug, Deserialize)]
pub struct HomepageData {
    pub user_category_id: Option<Value>,
    #[serde(default)]
    pub user_categories: Vec<UserCategory>,
    pub features_data: Option<FeaturesData>,
    /// Global trading flags; absent means enabled.
    pub buy_status: Option<Value>,
    pub sell_status: Option<Value>,
}

/// One price category; the caller's own category carries the silver list.
#[derive(Debug, Deserialize)]
pub struct UserCategory {
    pub id: Option<Value>,
    #[serde(default)]
    pub silvers: Vec<Value>,
}

/// Auxiliary product listing keyed by product id.
#[derive(Debug, Deserialize)]
pub struct FeaturesData {
    #[serde(default)]
    pub silver: Vec<SilverFeature>,
}

/// Per-product display metadata and enable flags from the features listing.
#[derive(Debug, Clone, Deserialize)]
pub struct SilverFeature {
    pub id: Option<Value>,
    pub title: Option<String>,
    pub buy_status: Option<Value>,
    pub sell_status: Option<Value>,
}
