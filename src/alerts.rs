//! Edge-triggered momentum and valuation alerts over universe snapshots.
//!
//! The engine tracks per-symbol state across refreshes and fires only on
//! transitions. Dismissed alerts stay silent for the rest of the session via
//! the [`SessionStore`] suppression keys; the engine itself only reads those
//! keys, dismissal writes them.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use serde::Serialize;
use tracing::debug;

use crate::models::StockRecord;

/// Session-scoped key/value storage used for alert suppression. Lives as
/// long as the process; a new session starts clean.
pub trait SessionStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
}

/// In-memory session store.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries
            .lock()
            .ok()
            .and_then(|entries| entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(key.to_string(), value.to_string());
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    Info,
    Warning,
}

/// One emitted alert. The suppression key is what a dismissal must mark to
/// silence this kind of alert for the symbol.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertEvent {
    pub symbol: String,
    pub message: String,
    pub severity: AlertSeverity,
    pub suppression_key: String,
}

/// Price relative to the intrinsic-value proxy threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum IvState {
    Above,
    Below,
}

/// Multiple of FCF per share used as the intrinsic-value proxy: 70% of a
/// 10x-FCF estimate.
const IV_FCF_MULTIPLE: f64 = 7.0;

/// Stateful alert detector. Owns the per-symbol previous-state maps and a
/// reference to the latest snapshot, so a forced re-check always evaluates
/// current data.
pub struct AlertEngine {
    session: Arc<dyn SessionStore>,
    previous_momentum: HashMap<String, i32>,
    previous_iv_state: HashMap<String, IvState>,
    latest_snapshot: Vec<StockRecord>,
}

impl AlertEngine {
    pub fn new(session: Arc<dyn SessionStore>) -> Self {
        Self {
            session,
            previous_momentum: HashMap::new(),
            previous_iv_state: HashMap::new(),
            latest_snapshot: Vec::new(),
        }
    }

    /// Push a freshly built snapshot and evaluate both alert channels
    /// against it.
    pub fn observe_snapshot(&mut self, records: &[StockRecord]) -> Vec<AlertEvent> {
        self.latest_snapshot = records.to_vec();
        self.check(records)
    }

    /// Re-run both alert channels against the most recent snapshot without
    /// new data, e.g. from an external re-check trigger.
    pub fn reevaluate(&mut self) -> Vec<AlertEvent> {
        let snapshot = self.latest_snapshot.clone();
        self.check(&snapshot)
    }

    /// Mark an alert as dismissed for the rest of the session.
    pub fn dismiss(&self, suppression_key: &str) {
        self.session.set(suppression_key, "true");
    }

    fn check(&mut self, records: &[StockRecord]) -> Vec<AlertEvent> {
        let mut events = Vec::new();
        for record in records {
            if record.symbol.is_empty() {
                continue;
            }
            self.check_momentum(record, &mut events);
            self.check_intrinsic_value(record, &mut events);
        }
        events
    }

    /// Fire when momentum crosses into positive territory from non-positive
    /// or unknown. State updates happen even when the alert is suppressed.
    fn check_momentum(&mut self, record: &StockRecord, events: &mut Vec<AlertEvent>) {
        let previous = self.previous_momentum.get(&record.symbol).copied();
        let current = record.rank_momentum_63;

        if let Some(momentum) = current {
            if momentum > 0 && previous.map_or(true, |prev| prev <= 0) {
                let suppression_key = format!("momentumToast_{}", record.symbol);
                if !self.is_suppressed(&suppression_key) {
                    events.push(AlertEvent {
                        symbol: record.symbol.clone(),
                        message: format!("📈 {} momentum just turned positive", record.symbol),
                        severity: AlertSeverity::Info,
                        suppression_key,
                    });
                } else {
                    debug!("Momentum alert for {} suppressed", record.symbol);
                }
            }
            self.previous_momentum.insert(record.symbol.clone(), momentum);
        } else {
            // Unknown momentum resets the channel so the next positive
            // reading fires instead of comparing against a stale value.
            self.previous_momentum.remove(&record.symbol);
        }
    }

    /// Fire each time the price drops below the intrinsic-value proxy. The
    /// channel re-arms whenever the price moves back above the threshold.
    fn check_intrinsic_value(&mut self, record: &StockRecord, events: &mut Vec<AlertEvent>) {
        let current = match record.fcf_per_share_ttm {
            Some(fcf) if fcf > 0.0 && record.price > 0.0 => {
                let threshold = fcf * IV_FCF_MULTIPLE;
                Some(if record.price < threshold {
                    IvState::Below
                } else {
                    IvState::Above
                })
            }
            _ => None,
        };

        let previous = self.previous_iv_state.get(&record.symbol).copied();

        if current == Some(IvState::Below) && previous != Some(IvState::Below) {
            let suppression_key = format!("intrinsicValueToast_{}", record.symbol);
            if !self.is_suppressed(&suppression_key) {
                events.push(AlertEvent {
                    symbol: record.symbol.clone(),
                    message: format!(
                        "⚠️ {} is now trading at less than 70% of its intrinsic value estimate",
                        record.symbol
                    ),
                    severity: AlertSeverity::Warning,
                    suppression_key,
                });
            } else {
                debug!("Intrinsic value alert for {} suppressed", record.symbol);
            }
        }

        match current {
            Some(state) => {
                self.previous_iv_state.insert(record.symbol.clone(), state);
            }
            None => {
                self.previous_iv_state.remove(&record.symbol);
            }
        }
    }

    fn is_suppressed(&self, key: &str) -> bool {
        self.session.get(key).as_deref() == Some("true")
    }
}
