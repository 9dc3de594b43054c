//! Best-effort scan analytics: an append-only event log plus a per-caller
//! running tally. The orchestrator treats the sink as fire-and-forget; a
//! failing sink must never fail a scan.

use std::collections::BTreeMap;
use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Utc};
use serde::Serialize;

/// One recorded scan.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanEvent {
    pub code: String,
    pub product_name: String,
    pub category: String,
    pub ecoscore: u8,
    pub caller: String,
    pub recorded_at: DateTime<Utc>,
}

/// Outbound analytics hook. Implementations must tolerate concurrent
/// writers without corrupting their counters.
pub trait AnalyticsSink: Send + Sync {
    fn record(&self, event: ScanEvent) -> Result<(), AnalyticsError>;
}

#[derive(Debug, thiserror::Error)]
pub enum AnalyticsError {
    #[error("analytics transport unavailable: {0}")]
    Transport(String),
}

/// Running totals for one caller identity.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CallerTally {
    pub total_scans: u64,
    pub eco_points: u64,
    pub last_scan: DateTime<Utc>,
}

/// Scan count per product category, for the statistics endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryCount {
    pub category: String,
    pub count: u64,
}

/// Aggregate view over everything recorded so far.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsSummary {
    pub total_scans: u64,
    pub average_ecoscore: f64,
    pub categories: Vec<CategoryCount>,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct AnalyticsState {
    events: Vec<ScanEvent>,
    callers: BTreeMap<String, CallerTally>,
}

/// In-process sink backing the statistics endpoint. A single lock guards
/// both the log and the tallies, so the append and the counter bump land
/// atomically even under simultaneous scans.
#[derive(Debug, Default)]
pub struct InMemoryAnalytics {
    inner: Mutex<AnalyticsState>,
}

impl InMemoryAnalytics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn summary(&self) -> AnalyticsSummary {
        let state = self.inner.lock().unwrap_or_else(PoisonError::into_inner);

        let total_scans = state.events.len() as u64;
        let average_ecoscore = if state.events.is_empty() {
            0.0
        } else {
            let sum: u64 = state.events.iter().map(|e| u64::from(e.ecoscore)).sum();
            let average = sum as f64 / state.events.len() as f64;
            (average * 100.0).round() / 100.0
        };

        let mut counts: BTreeMap<&str, u64> = BTreeMap::new();
        for event in &state.events {
            *counts.entry(event.category.as_str()).or_default() += 1;
        }
        let mut categories: Vec<CategoryCount> = counts
            .into_iter()
            .map(|(category, count)| CategoryCount {
                category: category.to_string(),
                count,
            })
            .collect();
        categories.sort_by(|a, b| b.count.cmp(&a.count).then(a.category.cmp(&b.category)));

        AnalyticsSummary {
            total_scans,
            average_ecoscore,
            categories,
            generated_at: Utc::now(),
        }
    }

    pub fn caller_tally(&self, caller: &str) -> Option<CallerTally> {
        let state = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        state.callers.get(caller).cloned()
    }
}

impl AnalyticsSink for InMemoryAnalytics {
    fn record(&self, event: ScanEvent) -> Result<(), AnalyticsError> {
        let mut state = self.inner.lock().unwrap_or_else(PoisonError::into_inner);

        let tally = state
            .callers
            .entry(event.caller.clone())
            .or_insert(CallerTally {
                total_scans: 0,
                eco_points: 0,
                last_scan: event.recorded_at,
            });
        tally.total_scans += 1;
        tally.eco_points += u64::from(event.ecoscore) * 10;
        tally.last_scan = event.recorded_at;

        state.events.push(event);
        Ok(())
    }
}
