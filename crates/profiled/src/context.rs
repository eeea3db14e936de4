// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Active profiler tracking
//!
//! A process-wide stack of activations. The top entry is the profiler that
//! instrumented calls record into; activating pushes, dropping the guard
//! removes that activation and exposes whatever was active before.
//!
//! Each activation carries a token so a guard only ever removes its own
//! entry, even when guards are dropped out of order or on another thread.

use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use tracing::{debug, warn};

use crate::profiler::Profiler;

struct Activation {
    token: u64,
    profiler: Profiler,
}

static ACTIVE: RwLock<Vec<Activation>> = parking_lot::const_rwlock(Vec::new());

/// Number of live activations, read without taking the lock
static DEPTH: AtomicUsize = AtomicUsize::new(0);

static NEXT_TOKEN: AtomicU64 = AtomicU64::new(1);

/// The profiler instrumented calls currently record into
pub(crate) fn current() -> Option<Profiler> {
    if DEPTH.load(Ordering::Acquire) == 0 {
        return None;
    }
    ACTIVE
        .read()
        .last()
        .map(|activation| activation.profiler.clone())
}

pub(crate) fn is_active(profiler: &Profiler) -> bool {
    if DEPTH.load(Ordering::Acquire) == 0 {
        return false;
    }
    ACTIVE
        .read()
        .last()
        .is_some_and(|activation| activation.profiler.same_as(profiler))
}

pub(crate) fn push(profiler: &Profiler) -> ActiveProfiler {
    let token = NEXT_TOKEN.fetch_add(1, Ordering::Relaxed);
    let mut stack = ACTIVE.write();
    stack.push(Activation {
        token,
        profiler: profiler.clone(),
    });
    DEPTH.store(stack.len(), Ordering::Release);
    debug!(token, depth = stack.len(), "profiler activated");

    ActiveProfiler {
        token,
        profiler: profiler.clone(),
    }
}

fn pop(token: u64) {
    let mut stack = ACTIVE.write();
    let Some(position) = stack.iter().rposition(|activation| activation.token == token) else {
        return;
    };
    if position + 1 != stack.len() {
        warn!(
            token,
            depth = stack.len(),
            "profiler scope exited out of order; outer activations stay in place"
        );
    }
    stack.remove(position);
    DEPTH.store(stack.len(), Ordering::Release);
    debug!(token, depth = stack.len(), "profiler deactivated");
}

/// Guard for an activated [`Profiler`]
///
/// While the guard lives, profiled calls record into its profiler. Dropping
/// it (including during a panic unwind) restores the previously active
/// profiler, if any.
///
/// # Example
///
/// ```
/// use profiled::Profiler;
///
/// let profiler = Profiler::new();
/// {
///     let _active = profiler.activate();
///     assert!(profiler.is_active());
/// }
/// assert!(!profiler.is_active());
/// ```
#[must_use = "the profiler is deactivated as soon as the guard is dropped"]
#[derive(Debug)]
pub struct ActiveProfiler {
    token: u64,
    profiler: Profiler,
}

impl ActiveProfiler {
    /// The profiler this guard activated
    pub fn profiler(&self) -> &Profiler {
        &self.profiler
    }

    /// End the activation now instead of at the end of the scope
    pub fn deactivate(self) {
        drop(self);
    }
}

impl Drop for ActiveProfiler {
    fn drop(&mut self) {
        pop(self.token);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial(active_profiler)]
    fn test_push_and_drop_restores_empty_slot() {
        let profiler = Profiler::new();
        assert!(current().is_none());

        let guard = push(&profiler);
        assert!(current().is_some_and(|p| p.same_as(&profiler)));
        assert!(guard.profiler().same_as(&profiler));

        drop(guard);
        assert!(current().is_none());
        assert_eq!(DEPTH.load(Ordering::Acquire), 0);
    }

    #[test]
    #[serial(active_profiler)]
    fn test_out_of_order_drop_keeps_remaining_activation() {
        let outer = Profiler::new();
        let inner = Profiler::new();

        let outer_guard = push(&outer);
        let inner_guard = push(&inner);

        drop(outer_guard);
        assert!(current().is_some_and(|p| p.same_as(&inner)));

        drop(inner_guard);
        assert!(current().is_none());
    }

    #[test]
    #[serial(active_profiler)]
    fn test_same_profiler_activated_twice() {
        let profiler = Profiler::new();

        let first = push(&profiler);
        let second = push(&profiler);
        assert_eq!(DEPTH.load(Ordering::Acquire), 2);

        second.deactivate();
        assert!(is_active(&profiler));

        first.deactivate();
        assert!(!is_active(&profiler));
    }
}
