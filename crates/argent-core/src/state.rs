//! State persisted across process restarts.

use serde::{Deserialize, Serialize};

use crate::price::Snapshot;

/// Everything the service persists, serialized as one YAML document.
///
/// `session` is opaque: the bearer token on the API path, a serialized
/// cookie jar on the browser path. The store treats both identically.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersistedState {
    pub mobile: Option<String>,
    pub markup_percent: f64,
    pub session: Option<String>,
    pub configured: bool,
    pub snapshot: Option<Snapshot>,
}
