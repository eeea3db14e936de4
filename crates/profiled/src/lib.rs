// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # profiled
//!
//! A small function-timing library. Instrumented functions record their
//! wall-clock duration into the active [`Profiler`], which aggregates them
//! per function and computes summary statistics.
//!
//! ## Overview
//!
//! ```text
//! ┌──────────────────────┐   record(id, elapsed)   ┌──────────────────┐
//! │ profiled! / Profiled │ ──────────────────────→ │ active Profiler  │
//! │      time_call       │                         │  id → [Duration] │
//! └──────────────────────┘                         └────────┬─────────┘
//!                                                           │ compute_stats
//!                                                           ↓
//!                                                  ┌──────────────────┐
//!                                                  │   StatsReport    │
//!                                                  │ avg min max num  │
//!                                                  │ tot std          │
//!                                                  └──────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust
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
//!     for _ in 0..10 {
//!         get_answer();
//!     }
//! }
//!
//! let report = profiler.compute_stats();
//! # if cfg!(feature = "profiling") {
//! let stats = &report["get_answer"];
//! assert_eq!(stats.num, 10);
//! assert!(stats.min <= stats.avg && stats.avg <= stats.max);
//! assert!(stats.std.is_some());
//! # }
//! ```
//!
//! ## Active profiler
//!
//! Activation is process-wide and nests: an inner activation shadows the
//! outer one until its guard is dropped. Calls made while no profiler is
//! active are not recorded anywhere.
//!
//! ## Features
//!
//! - `profiling` (default): timing enabled. Without it every instrumented
//!   call is a direct call.
//!
//! ## Modules
//!
//! - [`profiler`]: the aggregating [`Profiler`]
//! - [`context`]: activation guards
//! - [`wrapper`]: instrumentation primitives
//! - [`function_id`]: identifier derivation
//! - [`stats`]: statistics and reports
//! - [`config`]: report rendering options

pub mod config;
pub mod context;
pub mod error;
pub mod function_id;
pub mod profiler;
pub mod stats;
pub mod wrapper;

// Re-exports for convenience
pub use config::{ReportConfig, SortKey, TimeUnit};
pub use context::ActiveProfiler;
pub use error::{ConfigError, ConfigResult, ReportError, ReportResult};
pub use function_id::FunctionId;
pub use profiler::Profiler;
pub use stats::{FunctionStats, StatsReport};
pub use wrapper::{Callable, Profiled, profiled, profiled_as, time_call};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
