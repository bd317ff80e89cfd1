//! Level predicates for the per-severity cores

use super::log_level::LogLevel;

/// Gate owned by one severity.
///
/// Accepts a record iff `record >= severity` and `severity >= min_level`.
/// This is a threshold, not an exact bucket: with `min_level = Debug`, an
/// error record passes the warn, info and debug gates as well.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThresholdFilter {
    pub severity: LogLevel,
    pub min_level: LogLevel,
}

impl ThresholdFilter {
    pub fn new(severity: LogLevel, min_level: LogLevel) -> Self {
        Self { severity, min_level }
    }

    #[inline]
    pub fn enabled(&self, level: LogLevel) -> bool {
        level >= self.severity && self.severity >= self.min_level
    }
}

/// Union of threshold gates with an optional exclusive ceiling
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelFilter {
    gates: Vec<ThresholdFilter>,
    ceiling: Option<LogLevel>,
}

impl LevelFilter {
    /// Filter made of a single gate
    pub fn threshold(severity: LogLevel, min_level: LogLevel) -> Self {
        Self {
            gates: vec![ThresholdFilter::new(severity, min_level)],
            ceiling: None,
        }
    }

    /// Accepts whatever any of the gates accepts
    pub fn any_of(gates: impl IntoIterator<Item = ThresholdFilter>) -> Self {
        Self {
            gates: gates.into_iter().collect(),
            ceiling: None,
        }
    }

    /// Reject records at `ceiling` or above
    #[must_use]
    pub fn below(mut self, ceiling: LogLevel) -> Self {
        self.ceiling = Some(ceiling);
        self
    }

    pub fn enabled(&self, level: LogLevel) -> bool {
        if self.ceiling.is_some_and(|ceiling| level >= ceiling) {
            return false;
        }
        self.gates.iter().any(|gate| gate.enabled(level))
    }

    pub fn gates(&self) -> &[ThresholdFilter] {
        &self.gates
    }
}
