// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Statistics for profiled functions
//!
//! All times are `f64` seconds. The sample standard deviation uses Bessel's
//! correction and only exists for two or more samples.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::collections::btree_map;
use std::fmt::Write as _;
use std::ops::Index;
use std::time::Duration;

use crate::config::{ReportConfig, SortKey};
use crate::error::ReportResult;

/// Summary statistics for a single function
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionStats {
    /// Mean call time
    pub avg: f64,
    /// Fastest call
    pub min: f64,
    /// Slowest call
    pub max: f64,
    /// Number of recorded calls
    pub num: usize,
    /// Sum of all call times
    pub tot: f64,
    /// Sample standard deviation, `None` for a single call
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub std: Option<f64>,
}

impl FunctionStats {
    /// Calculate statistics from recorded durations
    ///
    /// Returns `None` for an empty slice.
    pub fn from_durations(durations: &[Duration]) -> Option<Self> {
        let seconds: Vec<f64> = durations.iter().map(Duration::as_secs_f64).collect();
        let total: Duration = durations.iter().sum();
        Self::summarize(&seconds, total.as_secs_f64())
    }

    /// Calculate statistics from samples in seconds
    ///
    /// Returns `None` for an empty slice. NaN samples propagate into the
    /// result instead of panicking.
    pub fn from_seconds(samples: &[f64]) -> Option<Self> {
        Self::summarize(samples, samples.iter().sum())
    }

    fn summarize(samples: &[f64], tot: f64) -> Option<Self> {
        let (&first, _) = samples.split_first()?;
        let num = samples.len();

        let (min, max) = samples
            .iter()
            .fold((first, first), |(min, max), &x| (min.min(x), max.max(x)));
        let mean = tot / num as f64;

        let std = (num >= 2).then(|| {
            let squares: f64 = samples.iter().map(|x| (x - mean).powi(2)).sum();
            (squares / (num - 1) as f64).sqrt()
        });

        // rounding in the sum must not push the mean outside the samples
        let avg = if min.is_finite() && max.is_finite() {
            mean.clamp(min, max)
        } else {
            mean
        };

        Some(Self {
            avg,
            min,
            max,
            num,
            tot,
            std,
        })
    }

    fn sort_value(&self, key: SortKey) -> f64 {
        match key {
            SortKey::Name => 0.0,
            SortKey::Total => self.tot,
            SortKey::Mean => self.avg,
            SortKey::Calls => self.num as f64,
            SortKey::Max => self.max,
        }
    }
}

/// Statistics for every profiled function, keyed by function identifier
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatsReport {
    functions: BTreeMap<String, FunctionStats>,
}

impl StatsReport {
    /// Statistics for one function, `None` if it was never recorded
    pub fn get(&self, function_id: &str) -> Option<&FunctionStats> {
        self.functions.get(function_id)
    }

    pub fn contains(&self, function_id: &str) -> bool {
        self.functions.contains_key(function_id)
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    /// Entries in identifier order
    pub fn iter(&self) -> btree_map::Iter<'_, String, FunctionStats> {
        self.functions.iter()
    }

    /// Sum of total time across all functions, in seconds
    pub fn total_time(&self) -> f64 {
        self.functions.values().map(|stats| stats.tot).sum()
    }

    /// Entries ordered by `key`, largest first for numeric keys
    ///
    /// Ties fall back to identifier order.
    pub fn sorted(&self, key: SortKey) -> Vec<(&str, &FunctionStats)> {
        let mut entries: Vec<_> = self
            .functions
            .iter()
            .map(|(id, stats)| (id.as_str(), stats))
            .collect();
        if key != SortKey::Name {
            entries.sort_by(|(a_id, a), (b_id, b)| {
                b.sort_value(key)
                    .partial_cmp(&a.sort_value(key))
                    .unwrap_or(Ordering::Equal)
                    .then_with(|| a_id.cmp(b_id))
            });
        }
        entries
    }

    /// Render the report as an aligned text table
    pub fn render(&self, config: &ReportConfig) -> String {
        let unit = config.unit;
        let mut out = String::from("=== Profile ===\n");

        for (id, stats) in self.sorted(config.sort_by) {
            if stats.num < config.min_calls {
                continue;
            }
            let std = stats
                .std
                .map(|std| format!("{:.3}{}", unit.convert(std), unit))
                .unwrap_or_else(|| "-".to_string());
            let _ = writeln!(
                out,
                "{:30} | calls: {:8} | avg: {:>12} | min: {:>12} | max: {:>12} | std: {:>12} | total: {:>12}",
                id,
                stats.num,
                format!("{:.3}{}", unit.convert(stats.avg), unit),
                format!("{:.3}{}", unit.convert(stats.min), unit),
                format!("{:.3}{}", unit.convert(stats.max), unit),
                std,
                format!("{:.3}{}", unit.convert(stats.tot), unit),
            );
        }

        out
    }

    /// Print a formatted summary using the default configuration
    pub fn print_summary(&self) {
        println!("\n{}", self.render(&ReportConfig::default()));
    }

    /// Serialize the report as pretty-printed JSON
    ///
    /// Functions with a single call carry no `std` key.
    pub fn to_json(&self) -> ReportResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl FromIterator<(String, FunctionStats)> for StatsReport {
    fn from_iter<I: IntoIterator<Item = (String, FunctionStats)>>(iter: I) -> Self {
        Self {
            functions: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a StatsReport {
    type Item = (&'a String, &'a FunctionStats);
    type IntoIter = btree_map::Iter<'a, String, FunctionStats>;

    fn into_iter(self) -> Self::IntoIter {
        self.functions.iter()
    }
}

impl Index<&str> for StatsReport {
    type Output = FunctionStats;

    /// # Panics
    ///
    /// Panics if `function_id` has no recorded calls.
    fn index(&self, function_id: &str) -> &FunctionStats {
        match self.functions.get(function_id) {
            Some(stats) => stats,
            None => panic!("no calls recorded for '{function_id}'"),
        }
    }
}
