//! Optimizer configuration.
//!
//! All fields have defaults, so an empty JSON object is a valid config:
//!
//! ```
//! use u_roster::config::{FallbackPolicy, OptimizerConfig};
//!
//! let cfg = OptimizerConfig::from_json_str(r#"{"time_limit_ms": 2000}"#).unwrap();
//! assert_eq!(cfg.time_limit_ms, Some(2000));
//! assert_eq!(cfg.fallback, FallbackPolicy::Relaxed);
//! ```

use std::path::Path;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::engine::SolveLimits;
use crate::error::{Result, RosterError};

/// What to do when the exact model (every coverable shift covered) is infeasible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackPolicy {
    /// Re-solve with coverage relaxed to at-most-one using the same engine.
    #[default]
    Relaxed,
    /// Re-solve with coverage relaxed to at-most-one using the greedy engine.
    Greedy,
    /// Report no assignments.
    Disabled,
}

/// Optimizer settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerConfig {
    /// Wall-clock limit for the engine call(s) in ms. `None` = unlimited.
    pub time_limit_ms: Option<u64>,
    /// Maximum search nodes per engine call. `None` = unlimited.
    pub node_limit: Option<u64>,
    /// Nodes between clock checks.
    pub check_interval: u64,
    /// Behaviour on infeasibility.
    pub fallback: FallbackPolicy,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            time_limit_ms: Some(30_000),
            node_limit: None,
            check_interval: 1_024,
            fallback: FallbackPolicy::default(),
        }
    }
}

impl OptimizerConfig {
    /// Creates the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the wall-clock limit.
    pub fn with_time_limit(mut self, limit: Duration) -> Self {
        self.time_limit_ms = Some(limit.as_millis().min(u64::MAX as u128) as u64);
        self
    }

    /// Removes the wall-clock limit.
    pub fn without_time_limit(mut self) -> Self {
        self.time_limit_ms = None;
        self
    }

    /// Sets the node limit.
    pub fn with_node_limit(mut self, nodes: u64) -> Self {
        self.node_limit = Some(nodes);
        self
    }

    /// Sets the clock check interval.
    pub fn with_check_interval(mut self, nodes: u64) -> Self {
        self.check_interval = nodes;
        self
    }

    /// Sets the fallback policy.
    pub fn with_fallback(mut self, fallback: FallbackPolicy) -> Self {
        self.fallback = fallback;
        self
    }

    /// Parses a JSON config document and validates it.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let cfg: Self =
            serde_json::from_str(json).map_err(|e| RosterError::Config(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Reads and parses a JSON config file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| RosterError::Config(format!("{}: {e}", path.display())))?;
        Self::from_json_str(&text)
    }

    /// Checks internal consistency.
    pub fn validate(&self) -> Result<()> {
        if self.check_interval == 0 {
            return Err(RosterError::Config("check_interval must be at least 1".into()));
        }
        if self.node_limit == Some(0) {
            return Err(RosterError::Config("node_limit must be at least 1".into()));
        }
        Ok(())
    }

    /// The wall-clock limit as a [`Duration`].
    pub fn time_limit(&self) -> Option<Duration> {
        self.time_limit_ms.map(Duration::from_millis)
    }

    /// Engine limits for a solve starting at `start`.
    pub fn limits_from(&self, start: Instant) -> SolveLimits {
        SolveLimits {
            deadline: self.time_limit().and_then(|d| start.checked_add(d)),
            node_limit: self.node_limit,
            check_interval: self.check_interval.max(1),
        }
    }
}
