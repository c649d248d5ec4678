//! Risk assessment records.
//!
//! A [`RiskReport`] condenses a [`WorldState`](crate::frame::WorldState) into
//! a single score on a fixed 0-100 scale plus a confidence (`clarity`) on the
//! same scale. Both values are clamped to the scale before the report leaves
//! the risk stage; [`RiskReport::clamped`] is the one place that happens.

use serde::{Deserialize, Serialize};

use crate::{Tick, TimestampMs};

/// Lower bound of the risk and clarity scale.
pub const SCALE_MIN: f64 = 0.0;

/// Upper bound of the risk and clarity scale.
pub const SCALE_MAX: f64 = 100.0;

// ---------------------------------------------------------------------------
// RiskLevel
// ---------------------------------------------------------------------------

/// Coarse banding of a risk score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskLevel {
    /// score < 25
    Stable,
    /// 25 <= score < 50
    Elevated,
    /// 50 <= score < 75
    High,
    /// score >= 75
    Critical,
}

impl RiskLevel {
    pub fn from_score(score: f64) -> Self {
        if score < 25.0 {
            RiskLevel::Stable
        } else if score < 50.0 {
            RiskLevel::Elevated
        } else if score < 75.0 {
            RiskLevel::High
        } else {
            RiskLevel::Critical
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RiskLevel::Stable => "STABLE",
            RiskLevel::Elevated => "ELEVATED",
            RiskLevel::High => "HIGH",
            RiskLevel::Critical => "CRITICAL",
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// RiskDriver
// ---------------------------------------------------------------------------

/// One contributing cause of a risk score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskDriver {
    /// Human-readable cause (e.g. `"environment"`).
    pub name: String,
    /// Optional contribution weight; scale is up to the risk module.
    pub weight: Option<f64>,
}

impl RiskDriver {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            weight: None,
        }
    }

    pub fn weighted(name: impl Into<String>, weight: f64) -> Self {
        Self {
            name: name.into(),
            weight: Some(weight),
        }
    }
}

// ---------------------------------------------------------------------------
// RiskReport
// ---------------------------------------------------------------------------

/// The risk stage's verdict for one tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskReport {
    pub tick: Tick,
    pub timestamp_ms: TimestampMs,
    /// Risk score in `[0, 100]`, higher is riskier.
    pub score: f64,
    /// Confidence in the assessment, `[0, 100]`.
    pub clarity: f64,
    /// Contributing causes, most significant first.
    pub drivers: Vec<RiskDriver>,
    pub notes: String,
}

impl RiskReport {
    /// Create a report with `score` and `clarity` clamped to the scale.
    pub fn new(tick: Tick, timestamp_ms: TimestampMs, score: f64, clarity: f64) -> Self {
        Self {
            tick,
            timestamp_ms,
            score,
            clarity,
            drivers: Vec::new(),
            notes: String::new(),
        }
        .clamped()
    }

    pub fn with_driver(mut self, driver: RiskDriver) -> Self {
        self.drivers.push(driver);
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }

    /// Clamp `score` and `clarity` into `[0, 100]`.
    ///
    /// NaN is left untouched; callers that need a usable report must check
    /// [`is_finite`](Self::is_finite) first.
    pub fn clamped(mut self) -> Self {
        self.score = self.score.clamp(SCALE_MIN, SCALE_MAX);
        self.clarity = self.clarity.clamp(SCALE_MIN, SCALE_MAX);
        self
    }

    /// Whether both score and clarity are real numbers. Infinities count as
    /// finite after clamping, so this only rejects NaN.
    pub fn is_finite(&self) -> bool {
        !self.score.is_nan() && !self.clarity.is_nan()
    }

    pub fn level(&self) -> RiskLevel {
        RiskLevel::from_score(self.score)
    }
}
