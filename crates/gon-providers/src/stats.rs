//! Usage accounting — one record per completed `route()` call.

use std::sync::{Mutex, PoisonError};
use std::time::Instant;

use serde::Serialize;

#[derive(Debug, Default)]
struct UsageAccumulator {
    total_requests: u64,
    success_count: u64,
    fallback_count: u64,
    rejected_count: u64,
    total_latency_ms: u64,
    total_cost: f64,
}

/// Derived view of the accumulator.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageSnapshot {
    pub total_requests: u64,
    pub success_count: u64,
    pub fallback_count: u64,
    /// Calls rejected with a contract error.
    pub rejected_count: u64,
    pub total_latency_ms: u64,
    pub average_latency_ms: f64,
    pub total_cost: f64,
    pub cost_per_request: f64,
    pub uptime_ms: u64,
}

/// Per-router counters. Each `record_*` is one locked update.
#[derive(Debug)]
pub struct UsageStats {
    started: Instant,
    inner: Mutex<UsageAccumulator>,
}

impl Default for UsageStats {
    fn default() -> Self {
        Self::new()
    }
}

impl UsageStats {
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
            inner: Mutex::new(UsageAccumulator::default()),
        }
    }

    fn update(&self, f: impl FnOnce(&mut UsageAccumulator)) {
        let mut acc = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        acc.total_requests += 1;
        f(&mut acc);
    }

    /// A model answered.
    pub fn record_success(&self, latency_ms: u64, cost: f64) {
        self.update(|acc| {
            acc.success_count += 1;
            acc.total_latency_ms += latency_ms;
            acc.total_cost += cost;
        });
    }

    /// The canned fallback was returned (failure, open circuit, cancel).
    pub fn record_fallback(&self, latency_ms: u64) {
        self.update(|acc| {
            acc.fallback_count += 1;
            acc.total_latency_ms += latency_ms;
        });
    }

    /// The call was rejected as a caller error.
    pub fn record_rejected(&self, latency_ms: u64) {
        self.update(|acc| {
            acc.rejected_count += 1;
            acc.total_latency_ms += latency_ms;
        });
    }

    pub fn snapshot(&self) -> UsageSnapshot {
        let acc = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let (average_latency_ms, cost_per_request) = if acc.total_requests > 0 {
            let n = acc.total_requests as f64;
            (acc.total_latency_ms as f64 / n, acc.total_cost / n)
        } else {
            (0.0, 0.0)
        };

        UsageSnapshot {
            total_requests: acc.total_requests,
            success_count: acc.success_count,
            fallback_count: acc.fallback_count,
            rejected_count: acc.rejected_count,
            total_latency_ms: acc.total_latency_ms,
            average_latency_ms,
            total_cost: acc.total_cost,
            cost_per_request,
            uptime_ms: self.started.elapsed().as_millis() as u64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_snapshot() {
        let snap = UsageStats::new().snapshot();
        assert_eq!(snap.total_requests, 0);
        assert_eq!(snap.average_latency_ms, 0.0);
        assert_eq!(snap.cost_per_request, 0.0);
    }

    #[test]
    fn test_counts_and_averages() {
        let stats = UsageStats::new();
        stats.record_success(100, 0.02);
        stats.record_success(300, 0.0);
        stats.record_fallback(200);
        stats.record_rejected(0);

        let snap = stats.snapshot();
        assert_eq!(snap.total_requests, 4);
        assert_eq!(snap.success_count, 2);
        assert_eq!(snap.fallback_count, 1);
        assert_eq!(snap.rejected_count, 1);
        assert_eq!(snap.total_latency_ms, 600);
        assert_eq!(snap.average_latency_ms, 150.0);
        assert!((snap.cost_per_request - 0.005).abs() < 1e-12);
    }

    #[test]
    fn test_snapshot_serializes_camel_case() {
        let json = serde_json::to_value(UsageStats::new().snapshot()).unwrap();
        assert!(json.get("fallbackCount").is_some());
        assert!(json.get("averageLatencyMs").is_some());
        assert!(json.get("uptimeMs").is_some());
    }
}
