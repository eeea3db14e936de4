// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Profiler
//!
//! Aggregates call durations per function identifier.
//!
//! ## Example
//!
//! ```
//! use profiled::{Profiler, profiled};
//!
//! profiled! {
//!     fn get_answer() -> u32 {
//!         42
//!     }
//! }
//!
//! let profiler = Profiler::new();
//! {
//!     let _active = profiler.activate();
//!     get_answer(); // recorded
//! }
//! get_answer(); // not recorded: no active profiler
//!
//! let report = profiler.compute_stats();
//! # if cfg!(feature = "profiling") {
//! assert_eq!(report["get_answer"].num, 1);
//! # }
//! ```

use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, trace};

use crate::context::{self, ActiveProfiler};
use crate::stats::{FunctionStats, StatsReport};

/// Per-function duration store shared by every clone of a [`Profiler`]
type DurationTable = HashMap<String, Vec<Duration>>;

/// Profiling context
///
/// Cloning is cheap and yields another handle to the same data, which is
/// what the active-profiler slot and instrumented calls hold on to.
#[derive(Clone, Default)]
pub struct Profiler {
    data: Arc<Mutex<DurationTable>>,
}

impl Profiler {
    /// Create a profiler with no recorded calls
    pub fn new() -> Self {
        Self::default()
    }

    /// The currently active profiler, if any
    pub fn current() -> Option<Profiler> {
        context::current()
    }

    /// Make this profiler the one profiled calls record into
    ///
    /// The previous state is restored when the returned guard is dropped.
    /// Activations nest: leaving an inner scope re-exposes the outer
    /// profiler.
    pub fn activate(&self) -> ActiveProfiler {
        context::push(self)
    }

    /// Run `f` with this profiler active
    pub fn scope<R>(&self, f: impl FnOnce() -> R) -> R {
        let _active = self.activate();
        f()
    }

    /// Whether this profiler is the one currently receiving recordings
    pub fn is_active(&self) -> bool {
        context::is_active(self)
    }

    /// Append one call duration for `function_id`
    pub fn record(&self, function_id: impl AsRef<str>, duration: Duration) {
        let function_id = function_id.as_ref();
        let mut data = self.data.lock();
        match data.get_mut(function_id) {
            Some(durations) => durations.push(duration),
            None => {
                trace!(function_id, "first call recorded");
                data.insert(function_id.to_string(), vec![duration]);
            }
        }
    }

    /// Drop every recorded duration, keeping this instance usable
    pub fn reset(&self) {
        let mut data = self.data.lock();
        debug!(functions = data.len(), "resetting profiler");
        data.clear();
    }

    /// Summary statistics for every function with at least one recorded call
    pub fn compute_stats(&self) -> StatsReport {
        let data = self.data.lock();
        data.iter()
            .filter_map(|(function_id, durations)| {
                FunctionStats::from_durations(durations)
                    .map(|stats| (function_id.clone(), stats))
            })
            .collect()
    }

    /// Recorded durations for one function, in call order
    pub fn durations(&self, function_id: &str) -> Option<Vec<Duration>> {
        self.data.lock().get(function_id).cloned()
    }

    /// Identifiers with at least one recorded call, sorted
    pub fn function_ids(&self) -> Vec<String> {
        let mut ids: Vec<_> = self.data.lock().keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Whether `other` is a handle to the same data
    pub fn same_as(&self, other: &Profiler) -> bool {
        Arc::ptr_eq(&self.data, &other.data)
    }
}

impl fmt::Debug for Profiler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Profiler")
            .field("functions", &self.data.lock().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn micros(values: &[u64]) -> Vec<Duration> {
        values.iter().copied().map(Duration::from_micros).collect()
    }

    #[test]
    fn test_record_keeps_call_order() {
        let profiler = Profiler::new();
        for duration in micros(&[300, 100, 200]) {
            profiler.record("parse", duration);
        }
        profiler.record("lower", Duration::from_micros(5));

        assert_eq!(profiler.durations("parse"), Some(micros(&[300, 100, 200])));
        assert_eq!(profiler.durations("lower"), Some(micros(&[5])));
        assert_eq!(profiler.durations("missing"), None);
        assert_eq!(profiler.function_ids(), vec!["lower", "parse"]);
    }

    #[test]
    fn test_compute_stats_empty() {
        let profiler = Profiler::new();
        assert!(profiler.compute_stats().is_empty());
    }

    #[test]
    fn test_compute_stats_is_read_only() {
        let profiler = Profiler::new();
        profiler.record("parse", Duration::from_millis(2));
        profiler.record("parse", Duration::from_millis(4));

        let first = profiler.compute_stats();
        let second = profiler.compute_stats();

        assert_eq!(first, second);
        assert_eq!(first["parse"].num, 2);
        assert_eq!(profiler.durations("parse").map(|d| d.len()), Some(2));
    }

    #[test]
    fn test_reset_clears_in_place() {
        let profiler = Profiler::new();
        let handle = profiler.clone();
        profiler.record("parse", Duration::from_millis(1));

        handle.reset();

        assert!(profiler.compute_stats().is_empty());
        assert!(profiler.function_ids().is_empty());

        profiler.record("parse", Duration::from_millis(1));
        assert_eq!(handle.compute_stats()["parse"].num, 1);
    }

    #[test]
    fn test_clones_share_data() {
        let profiler = Profiler::new();
        let clone = profiler.clone();
        clone.record("parse", Duration::from_millis(1));

        assert!(profiler.same_as(&clone));
        assert!(!profiler.same_as(&Profiler::new()));
        assert_eq!(profiler.compute_stats().len(), 1);
    }

    #[test]
    #[serial(active_profiler)]
    fn test_activate_sets_current() {
        let profiler = Profiler::new();
        assert!(Profiler::current().is_none());

        let active = profiler.activate();
        assert!(profiler.is_active());
        assert!(Profiler::current().is_some_and(|p| p.same_as(&profiler)));

        active.deactivate();
        assert!(!profiler.is_active());
        assert!(Profiler::current().is_none());
    }

    #[test]
    #[serial(active_profiler)]
    fn test_nested_activation_restores_outer() {
        let outer = Profiler::new();
        let inner = Profiler::new();

        let _outer_active = outer.activate();
        {
            let _inner_active = inner.activate();
            assert!(inner.is_active());
            assert!(!outer.is_active());
        }
        assert!(outer.is_active());
    }

    #[test]
    #[serial(active_profiler)]
    fn test_scope_restores_after_panic() {
        let profiler = Profiler::new();

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            profiler.scope(|| {
                assert!(Profiler::current().is_some());
                panic!("boom");
            })
        }));

        assert!(result.is_err());
        assert!(Profiler::current().is_none());
    }

    #[test]
    fn test_concurrent_record() {
        let profiler = Profiler::new();

        std::thread::scope(|scope| {
            for _ in 0..8 {
                let profiler = profiler.clone();
                scope.spawn(move || {
                    for _ in 0..1000 {
                        profiler.record("worker", Duration::from_nanos(10));
                    }
                });
            }
        });

        assert_eq!(profiler.compute_stats()["worker"].num, 8000);
    }
}
