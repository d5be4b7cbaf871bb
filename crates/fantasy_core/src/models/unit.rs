//! Units: the schedulable scoring items on a roster (players, picks, ...).

use serde::{Deserialize, Serialize};
use std::fmt;

/// Role / position of a unit (`QB`, `RB`, `C`, `SP`, `PICK`, ...).
///
/// Stored upper-cased so that tables from different sources agree.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Role(String);

impl Role {
    pub fn new(name: &str) -> Self {
        Self(name.trim().to_ascii_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Role {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Normal scoring distribution for one unit (or a whole lineup) in one week.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ScoringDistribution {
    pub mean: f64,
    pub stdev: f64,
}

impl ScoringDistribution {
    pub fn new(mean: f64, stdev: f64) -> Self {
        Self {
            mean,
            stdev: if stdev.is_finite() { stdev.max(0.0) } else { 0.0 },
        }
    }

    /// Fixed value with no variance.
    pub fn fixed(value: f64) -> Self {
        Self::new(value, 0.0)
    }

    pub fn variance(&self) -> f64 {
        self.stdev * self.stdev
    }

    /// Sum of independent normals: means add, variances add.
    pub fn combine(self, other: Self) -> Self {
        Self::new(
            self.mean + other.mean,
            (self.variance() + other.variance()).sqrt(),
        )
    }

    /// Draw from a standard-normal deviate `z`.
    #[inline]
    pub fn at(&self, z: f64) -> f64 {
        self.mean + self.stdev * z
    }
}

impl std::iter::Sum for ScoringDistribution {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Self::combine)
    }
}

/// One scored event from a unit's history.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub points: f64,
    /// Recency weight. Negative or missing (non-finite) weights count as zero.
    #[serde(default = "default_factor")]
    pub weight: f64,
    /// Opponent / context multiplier applied to `points`.
    #[serde(default = "default_factor")]
    pub context: f64,
}

fn default_factor() -> f64 {
    1.0
}

impl Observation {
    pub fn new(points: f64) -> Self {
        Self {
            points,
            weight: 1.0,
            context: 1.0,
        }
    }

    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }

    pub fn with_context(mut self, context: f64) -> Self {
        self.context = context;
        self
    }

    /// Weight clamped to `>= 0`; NaN and infinities are treated as missing.
    pub fn effective_weight(&self) -> f64 {
        if self.weight.is_finite() {
            self.weight.max(0.0)
        } else {
            0.0
        }
    }

    pub fn adjusted_points(&self) -> f64 {
        let context = if self.context.is_finite() {
            self.context
        } else {
            1.0
        };
        self.points * context
    }
}

/// Weeks in which a unit can score.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Availability {
    /// First week the unit is eligible (inclusive).
    #[serde(default)]
    pub eligible_from: Option<u32>,
    /// Last week the unit is eligible (inclusive).
    #[serde(default)]
    pub eligible_until: Option<u32>,
    /// Injured / suspended: unavailable for every week before this one.
    #[serde(default)]
    pub out_until: Option<u32>,
    #[serde(default)]
    pub bye_week: Option<u32>,
}

impl Availability {
    pub fn plays_in(&self, week: u32) -> bool {
        if self.eligible_from.is_some_and(|w| week < w) {
            return false;
        }
        if self.eligible_until.is_some_and(|w| week > w) {
            return false;
        }
        if self.out_until.is_some_and(|w| week < w) {
            return false;
        }
        self.bye_week != Some(week)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Unit {
    pub name: String,
    pub role: Role,
    /// Explicit projection from an external source. When absent the
    /// performance model derives one from `history`.
    #[serde(default)]
    pub projection: Option<ScoringDistribution>,
    /// Oldest first.
    #[serde(default)]
    pub history: Vec<Observation>,
    #[serde(default)]
    pub availability: Availability,
}

impl Unit {
    pub fn new(name: &str, role: &str) -> Self {
        Self {
            name: name.to_string(),
            role: Role::new(role),
            projection: None,
            history: Vec::new(),
            availability: Availability::default(),
        }
    }

    pub fn with_projection(mut self, mean: f64, stdev: f64) -> Self {
        self.projection = Some(ScoringDistribution::new(mean, stdev));
        self
    }

    pub fn with_history(mut self, history: Vec<Observation>) -> Self {
        self.history = history;
        self
    }

    pub fn with_availability(mut self, availability: Availability) -> Self {
        self.availability = availability;
        self
    }
}
