// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Report configuration
//!
//! Controls how a [`StatsReport`](crate::StatsReport) is rendered: row
//! order, time unit and the minimum call count for a row to be shown.
//!
//! ## Sources
//!
//! 1. **Builder methods**
//! ```rust
//! use profiled::{ReportConfig, SortKey, TimeUnit};
//!
//! let config = ReportConfig::new()
//!     .sort_by(SortKey::Total)
//!     .unit(TimeUnit::Micros)
//!     .min_calls(10);
//! ```
//!
//! 2. **Environment variables**: `PROFILED_SORT`, `PROFILED_UNIT`,
//!    `PROFILED_MIN_CALLS`
//!
//! 3. **JSON settings**
//! ```json
//! {
//!   "profiled": {
//!     "sortBy": "mean",
//!     "unit": "ms",
//!     "minCalls": 2
//!   }
//! }
//! ```

use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use crate::error::{ConfigError, ConfigResult};

pub const ENV_SORT: &str = "PROFILED_SORT";
pub const ENV_UNIT: &str = "PROFILED_UNIT";
pub const ENV_MIN_CALLS: &str = "PROFILED_MIN_CALLS";

const SETTINGS_SECTION: &str = "profiled";

/// Row ordering for rendered reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SortKey {
    /// Alphabetical by function identifier
    #[default]
    Name,
    /// Total time, largest first
    Total,
    /// Mean time, largest first
    Mean,
    /// Number of calls, largest first
    Calls,
    /// Slowest single call, largest first
    Max,
}

impl FromStr for SortKey {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "name" => Ok(SortKey::Name),
            "total" | "tot" => Ok(SortKey::Total),
            "mean" | "avg" => Ok(SortKey::Mean),
            "calls" | "num" => Ok(SortKey::Calls),
            "max" => Ok(SortKey::Max),
            _ => Err(ConfigError::UnknownSortKey(s.to_string())),
        }
    }
}

/// Unit used when rendering durations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TimeUnit {
    /// Seconds
    Seconds,
    /// Milliseconds
    #[default]
    Millis,
    /// Microseconds
    Micros,
    /// Nanoseconds
    Nanos,
}

impl TimeUnit {
    /// Multiplier converting seconds into this unit
    pub fn scale(&self) -> f64 {
        match self {
            TimeUnit::Seconds => 1.0,
            TimeUnit::Millis => 1e3,
            TimeUnit::Micros => 1e6,
            TimeUnit::Nanos => 1e9,
        }
    }

    /// Short suffix for rendered values
    pub fn suffix(&self) -> &'static str {
        match self {
            TimeUnit::Seconds => "s",
            TimeUnit::Millis => "ms",
            TimeUnit::Micros => "µs",
            TimeUnit::Nanos => "ns",
        }
    }

    /// Convert a value in seconds into this unit
    pub fn convert(&self, seconds: f64) -> f64 {
        seconds * self.scale()
    }
}

impl fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.suffix())
    }
}

impl FromStr for TimeUnit {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "s" | "sec" | "seconds" => Ok(TimeUnit::Seconds),
            "ms" | "millis" | "milliseconds" => Ok(TimeUnit::Millis),
            "us" | "µs" | "micros" | "microseconds" => Ok(TimeUnit::Micros),
            "ns" | "nanos" | "nanoseconds" => Ok(TimeUnit::Nanos),
            _ => Err(ConfigError::UnknownTimeUnit(s.to_string())),
        }
    }
}

/// Rendering options for profiling reports
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportConfig {
    /// Row ordering
    pub sort_by: SortKey,

    /// Unit for avg/min/max/std/total columns
    pub unit: TimeUnit,

    /// Functions called fewer times than this are left out
    pub min_calls: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            sort_by: SortKey::Name,
            unit: TimeUnit::Millis,
            min_calls: 1,
        }
    }
}

impl ReportConfig {
    /// Create the default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the row ordering
    pub fn sort_by(mut self, key: SortKey) -> Self {
        self.sort_by = key;
        self
    }

    /// Set the time unit
    pub fn unit(mut self, unit: TimeUnit) -> Self {
        self.unit = unit;
        self
    }

    /// Set the minimum call count for a row to be rendered
    pub fn min_calls(mut self, min_calls: usize) -> Self {
        self.min_calls = min_calls;
        self
    }

    /// Load the configuration from `PROFILED_*` environment variables
    ///
    /// Unset variables keep their defaults.
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load the configuration through an arbitrary key lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> ConfigResult<Self> {
        let mut config = Self::default();

        if let Some(sort) = lookup(ENV_SORT) {
            config.sort_by = sort.parse()?;
        }
        if let Some(unit) = lookup(ENV_UNIT) {
            config.unit = unit.parse()?;
        }
        if let Some(min_calls) = lookup(ENV_MIN_CALLS) {
            config.min_calls = min_calls
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidValue {
                    key: ENV_MIN_CALLS.to_string(),
                    value: min_calls.clone(),
                })?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Parse the configuration from a JSON settings payload
    ///
    /// Returns the defaults when the `profiled` section is missing.
    pub fn from_settings(settings: &Value) -> ConfigResult<Self> {
        let mut config = Self::default();
        let Some(section) = settings.get(SETTINGS_SECTION) else {
            return Ok(config);
        };

        if let Some(sort) = section.get("sortBy") {
            config.sort_by = string_setting("sortBy", sort)?.parse()?;
        }
        if let Some(unit) = section.get("unit") {
            config.unit = string_setting("unit", unit)?.parse()?;
        }
        if let Some(min_calls) = section.get("minCalls") {
            let value = min_calls.as_u64().ok_or_else(|| ConfigError::InvalidType {
                key: "minCalls".to_string(),
                expected: "non-negative integer",
            })?;
            config.min_calls = usize::try_from(value).map_err(|_| ConfigError::InvalidValue {
                key: "minCalls".to_string(),
                value: value.to_string(),
            })?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    ///
    /// `min_calls` must be at least 1.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.min_calls == 0 {
            return Err(ConfigError::InvalidValue {
                key: "min_calls".to_string(),
                value: "0".to_string(),
            });
        }
        Ok(())
    }
}

fn string_setting<'a>(key: &str, value: &'a Value) -> ConfigResult<&'a str> {
    value.as_str().ok_or_else(|| ConfigError::InvalidType {
        key: key.to_string(),
        expected: "string",
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = ReportConfig::default();
        assert_eq!(config.sort_by, SortKey::Name);
        assert_eq!(config.unit, TimeUnit::Millis);
        assert_eq!(config.min_calls, 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder() {
        let config = ReportConfig::new()
            .sort_by(SortKey::Calls)
            .unit(TimeUnit::Nanos)
            .min_calls(3);
        assert_eq!(config.sort_by, SortKey::Calls);
        assert_eq!(config.unit, TimeUnit::Nanos);
        assert_eq!(config.min_calls, 3);
    }

    #[test]
    fn test_parse_sort_key_and_unit() {
        assert_eq!("TOTAL".parse::<SortKey>(), Ok(SortKey::Total));
        assert_eq!("avg".parse::<SortKey>(), Ok(SortKey::Mean));
        assert_eq!(
            "speed".parse::<SortKey>(),
            Err(ConfigError::UnknownSortKey("speed".to_string()))
        );

        assert_eq!("us".parse::<TimeUnit>(), Ok(TimeUnit::Micros));
        assert_eq!("seconds".parse::<TimeUnit>(), Ok(TimeUnit::Seconds));
        assert!("minutes".parse::<TimeUnit>().is_err());
    }

    #[test]
    fn test_time_unit_conversion() {
        assert_eq!(TimeUnit::Seconds.convert(1.5), 1.5);
        assert_eq!(TimeUnit::Millis.convert(0.25), 250.0);
        assert_eq!(TimeUnit::Nanos.to_string(), "ns");
    }

    #[test]
    fn test_from_lookup() {
        let config = ReportConfig::from_lookup(lookup_from(&[
            (ENV_SORT, "mean"),
            (ENV_UNIT, "us"),
            (ENV_MIN_CALLS, " 5 "),
        ]))
        .unwrap();

        assert_eq!(config.sort_by, SortKey::Mean);
        assert_eq!(config.unit, TimeUnit::Micros);
        assert_eq!(config.min_calls, 5);

        let config = ReportConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config, ReportConfig::default());
    }

    #[test]
    fn test_from_lookup_rejects_bad_values() {
        let result = ReportConfig::from_lookup(lookup_from(&[(ENV_MIN_CALLS, "many")]));
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));

        let result = ReportConfig::from_lookup(lookup_from(&[(ENV_MIN_CALLS, "0")]));
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));

        let result = ReportConfig::from_lookup(lookup_from(&[(ENV_UNIT, "hours")]));
        assert_eq!(
            result,
            Err(ConfigError::UnknownTimeUnit("hours".to_string()))
        );
    }

    #[test]
    fn test_from_settings() {
        let settings = json!({
            "profiled": {
                "sortBy": "calls",
                "unit": "ns",
                "minCalls": 2
            }
        });
        let config = ReportConfig::from_settings(&settings).unwrap();
        assert_eq!(config.sort_by, SortKey::Calls);
        assert_eq!(config.unit, TimeUnit::Nanos);
        assert_eq!(config.min_calls, 2);

        let config = ReportConfig::from_settings(&json!({})).unwrap();
        assert_eq!(config, ReportConfig::default());
    }

    #[test]
    fn test_from_settings_type_errors() {
        let settings = json!({ "profiled": { "unit": 3 } });
        assert!(matches!(
            ReportConfig::from_settings(&settings),
            Err(ConfigError::InvalidType { .. })
        ));

        let settings = json!({ "profiled": { "minCalls": -1 } });
        assert!(matches!(
            ReportConfig::from_settings(&settings),
            Err(ConfigError::InvalidType { .. })
        ));
    }
}
