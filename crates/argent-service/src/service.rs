//! The shared snapshot and its protected update cycle.
//!
//! One [`PriceService`] exists per process. Readers clone an `Arc` out of
//! the snapshot slot and never contend with a refresh; writers build the
//! replacement off to the side and swap it in whole. The refresh gate
//! collapses concurrent triggers — timer tick or manual request — into at
//! most one in-flight refresh; a trigger that loses the race is a no-op,
//! not queued.

use std::sync::{Arc, RwLock};

use chrono::Utc;
use tokio::sync::Mutex;

use argent_core::{apply_markup, PersistedState, PriceEntry, Snapshot};
use argent_store::{StateStore, StoreError};

use crate::source::{PriceSource, RawPriceList, SourceError};

/// User configuration alongside the snapshot; small and rarely written.
#[derive(Debug, Clone, Default)]
struct Settings {
    mobile: Option<String>,
    markup_percent: f64,
    configured: bool,
}

/// Owns the single process-wide [`Snapshot`] and coordinates every refresh.
pub struct PriceService {
    source: Arc<dyn PriceSource>,
    store: StateStore,
    snapshot: RwLock<Arc<Snapshot>>,
    settings: RwLock<Settings>,
    /// Held for the full fetch+normalize+markup sequence, not just the swap.
    refresh_gate: Mutex<()>,
}

impl PriceService {
    /// Builds the service, restoring any persisted snapshot and session.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the state file exists but is unreadable;
    /// a missing file is a normal first start.
    pub fn restore(source: Arc<dyn PriceSource>, store: StateStore) -> Result<Self, StoreError> {
        let (settings, snapshot) = match store.load()? {
            Some(state) => {
                if let Some(artifact) = &state.session {
                    source.restore_session(artifact);
                }
                let settings = Settings {
                    mobile: state.mobile,
                    markup_percent: state.markup_percent,
                    configured: state.configured,
                };
                let snapshot = state
                    .snapshot
                    .unwrap_or_else(|| Snapshot::empty(settings.markup_percent, settings.configured));
                (settings, snapshot)
            }
            None => (Settings::default(), Snapshot::empty(0.0, false)),
        };

        tracing::info!(
            configured = settings.configured,
            rows = snapshot.entries.len(),
            "price service restored"
        );

        Ok(Self {
            source,
            store,
            snapshot: RwLock::new(Arc::new(snapshot)),
            settings: RwLock::new(settings),
            refresh_gate: Mutex::new(()),
        })
    }

    /// Begins authentication: asks the vendor for an OTP and records the
    /// mobile number. No session state changes until the code is verified.
    ///
    /// # Errors
    ///
    /// Propagates the source's error; `Rejected` carries the vendor's own
    /// message for the user.
    pub async fn begin_authentication(&self, mobile: &str) -> Result<String, SourceError> {
        let message = self.source.request_verification_code(mobile).await?;
        self.settings
            .write()
            .expect("settings lock poisoned")
            .mobile = Some(mobile.to_owned());
        self.persist();
        Ok(message)
    }

    /// Completes authentication: verifies the OTP, stores the session, and
    /// marks the service configured.
    ///
    /// # Errors
    ///
    /// Propagates the source's error; on failure the service stays in its
    /// previous authentication state.
    pub async fn complete_authentication(&self, mobile: &str, code: &str) -> Result<(), SourceError> {
        self.source.verify_code(mobile, code).await?;
        {
            let mut settings = self.settings.write().expect("settings lock poisoned");
            settings.mobile = Some(mobile.to_owned());
            settings.configured = true;
        }
        self.swap_snapshot_flag(true);
        self.persist();
        tracing::info!("authentication completed; session stored");
        Ok(())
    }

    /// Runs one protected refresh cycle.
    ///
    /// Returns `false` without side effects when another refresh is already
    /// in flight or the service is not configured. On success the new
    /// snapshot atomically replaces the old one and is persisted. An expired
    /// session clears the stored credentials and flips the configured flag —
    /// prices are left untouched. Any other failure keeps the old snapshot
    /// and is only logged.
    pub async fn refresh_now(&self) -> bool {
        let Ok(_gate) = self.refresh_gate.try_lock() else {
            tracing::debug!("refresh trigger ignored; another refresh is in flight");
            return false;
        };

        if !self.is_configured() {
            tracing::debug!("refresh skipped; service not configured");
            return false;
        }

        match self.source.fetch_prices().await {
            Ok(raw) => {
                let snapshot = self.build_snapshot(raw);
                let rows = snapshot.entries.len();
                *self.snapshot.write().expect("snapshot lock poisoned") = Arc::new(snapshot);
                self.persist();
                tracing::info!(rows, "snapshot refreshed");
                true
            }
            Err(SourceError::AuthExpired) => {
                tracing::warn!("session expired during refresh; re-authentication required");
                self.source.clear_session();
                self.settings
                    .write()
                    .expect("settings lock poisoned")
                    .configured = false;
                self.swap_snapshot_flag(false);
                self.persist();
                false
            }
            Err(e) => {
                tracing::error!(error = %e, "refresh failed; keeping previous snapshot");
                false
            }
        }
    }

    /// The current snapshot; never blocks on an in-flight refresh.
    #[must_use]
    pub fn current_snapshot(&self) -> Arc<Snapshot> {
        Arc::clone(&self.snapshot.read().expect("snapshot lock poisoned"))
    }

    /// Updates the markup percentage and recomputes display prices from the
    /// unchanged base prices.
    pub fn set_markup(&self, percent: f64) {
        self.settings
            .write()
            .expect("settings lock poisoned")
            .markup_percent = percent;

        let current = self.current_snapshot();
        let entries = current
            .entries
            .iter()
            .cloned()
            .map(|entry| with_markup(entry, percent))
            .collect();
        let next = Snapshot {
            entries,
            markup_percent: percent,
            ..(*current).clone()
        };
        *self.snapshot.write().expect("snapshot lock poisoned") = Arc::new(next);
        self.persist();
    }

    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.settings.read().expect("settings lock poisoned").configured
    }

    /// The mobile number recorded at setup, if any.
    #[must_use]
    pub fn mobile(&self) -> Option<String> {
        self.settings
            .read()
            .expect("settings lock poisoned")
            .mobile
            .clone()
    }

    fn build_snapshot(&self, raw: RawPriceList) -> Snapshot {
        let (percent, configured) = {
            let settings = self.settings.read().expect("settings lock poisoned");
            (settings.markup_percent, settings.configured)
        };
        let entries = raw
            .entries
            .into_iter()
            .map(|entry| with_markup(entry, percent))
            .collect();
        Snapshot {
            entries,
            fetched_at: Utc::now(),
            markup_percent: percent,
            origin: raw.origin,
            configured,
        }
    }

    /// Swaps in a copy of the current snapshot with only the configured flag
    /// changed; prices stay untouched.
    fn swap_snapshot_flag(&self, configured: bool) {
        let current = self.current_snapshot();
        if current.configured == configured {
            return;
        }
        let next = Snapshot {
            configured,
            ..(*current).clone()
        };
        *self.snapshot.write().expect("snapshot lock poisoned") = Arc::new(next);
    }

    /// Writes the current state through the store. A persistence failure is
    /// logged; the in-memory state stays authoritative either way.
    fn persist(&self) {
        let snapshot = self.current_snapshot();
        let settings = self.settings.read().expect("settings lock poisoned").clone();
        let state = PersistedState {
            mobile: settings.mobile,
            markup_percent: settings.markup_percent,
            session: self.source.session_artifact(),
            configured: settings.configured,
            snapshot: Some((*snapshot).clone()),
        };
        if let Err(e) = self.store.save(&state) {
            tracing::error!(error = %e, "failed to persist service state");
        }
    }
}

/// Applies the configured markup to one entry's immutable base prices.
fn with_markup(mut entry: PriceEntry, percent: f64) -> PriceEntry {
    entry.buy_price = apply_markup(entry.buy_price_base, percent);
    entry.sell_price = apply_markup(entry.sell_price_base, percent);
    entry
}
