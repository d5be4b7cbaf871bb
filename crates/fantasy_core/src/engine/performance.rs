//! Performance model: scoring history to a per-unit distribution.
//!
//! A unit's recent window is summarized as a weighted mean / standard
//! deviation and then shrunk toward its role baseline:
//!
//! ```text
//! w     = min(n, reference_window_size) / reference_window_size
//! mean  = w * sample_mean  + (1 - w) * role_mean
//! stdev = w * sample_stdev + (1 - w) * role_stdev
//! ```
//!
//! `n` counts observations with a positive weight. Everything here is pure:
//! the same inputs always give the same outputs.

use super::config::PerformanceConfig;
use crate::error::{Result, SimError};
use crate::models::{Observation, Role, ScoringDistribution, Unit};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, warn};

// ============================================================================
// Weighted statistics
// ============================================================================

/// Weighted mean / stdev of a window and the count of usable observations.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowStats {
    pub mean: f64,
    pub stdev: f64,
    pub observations: usize,
}

/// Weight an observation contributes; non-finite points count as zero.
fn usable_weight(obs: &Observation) -> f64 {
    if obs.adjusted_points().is_finite() {
        obs.effective_weight()
    } else {
        0.0
    }
}

/// `None` when no observation carries positive weight.
pub fn weighted_stats(window: &[Observation]) -> Option<WindowStats> {
    let mut total_weight = 0.0;
    let mut weighted_sum = 0.0;
    let mut observations = 0;
    for obs in window {
        let w = usable_weight(obs);
        if w > 0.0 {
            total_weight += w;
            weighted_sum += w * obs.adjusted_points();
            observations += 1;
        }
    }
    if observations == 0 || total_weight <= 0.0 {
        return None;
    }
    let mean = weighted_sum / total_weight;
    let weighted_sq: f64 = window
        .iter()
        .filter_map(|obs| {
            let w = usable_weight(obs);
            (w > 0.0).then(|| {
                let d = obs.adjusted_points() - mean;
                w * d * d
            })
        })
        .sum();
    Some(WindowStats {
        mean,
        stdev: (weighted_sq / total_weight).sqrt(),
        observations,
    })
}

// ============================================================================
// Role baselines
// ============================================================================

/// Role-level distributions that unit estimates shrink toward.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoleBaselines {
    baselines: BTreeMap<Role, ScoringDistribution>,
}

impl RoleBaselines {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pool every unit's windowed history by role.
    pub fn from_history<'a, I>(units: I, config: &PerformanceConfig) -> Self
    where
        I: IntoIterator<Item = &'a Unit>,
    {
        let mut pooled: BTreeMap<Role, Vec<Observation>> = BTreeMap::new();
        for unit in units {
            let window = recent_window(&unit.history, config.window_size);
            pooled
                .entry(unit.role.clone())
                .or_default()
                .extend_from_slice(window);
        }

        let baselines = pooled
            .into_iter()
            .filter_map(|(role, obs)| {
                weighted_stats(&obs).map(|s| (role, ScoringDistribution::new(s.mean, s.stdev)))
            })
            .collect();
        Self { baselines }
    }

    /// Role averages from already-resolved distributions (mean of means,
    /// root-mean-square of stdevs). Used where no history exists at all.
    pub fn from_distributions<I>(items: I) -> Self
    where
        I: IntoIterator<Item = (Role, ScoringDistribution)>,
    {
        let mut sums: BTreeMap<Role, (f64, f64, usize)> = BTreeMap::new();
        for (role, dist) in items {
            if !dist.mean.is_finite() {
                continue;
            }
            let slot = sums.entry(role).or_insert((0.0, 0.0, 0));
            slot.0 += dist.mean;
            slot.1 += dist.variance();
            slot.2 += 1;
        }
        let baselines = sums
            .into_iter()
            .map(|(role, (mean_sum, var_sum, n))| {
                let n = n as f64;
                (role, ScoringDistribution::new(mean_sum / n, (var_sum / n).sqrt()))
            })
            .collect();
        Self { baselines }
    }

    /// Fill roles missing here from `other`.
    pub fn merge_missing(&mut self, other: &RoleBaselines) {
        for (role, dist) in &other.baselines {
            self.baselines.entry(role.clone()).or_insert(*dist);
        }
    }

    pub fn insert(&mut self, role: Role, dist: ScoringDistribution) {
        self.baselines.insert(role, dist);
    }

    pub fn get(&self, role: &Role) -> Option<ScoringDistribution> {
        self.baselines.get(role).copied()
    }

    /// Baseline for `role`, or the fatal configuration error when the role
    /// has never been observed.
    pub fn require(&self, role: &Role) -> Result<ScoringDistribution> {
        self.get(role).ok_or_else(|| SimError::MissingRoleBaseline {
            role: role.to_string(),
        })
    }

    pub fn roles(&self) -> impl Iterator<Item = &Role> {
        self.baselines.keys()
    }

    pub fn is_empty(&self) -> bool {
        self.baselines.is_empty()
    }
}

/// The last `size` observations (history is stored oldest first).
pub fn recent_window(history: &[Observation], size: usize) -> &[Observation] {
    let start = history.len().saturating_sub(size);
    &history[start..]
}

// ============================================================================
// Model
// ============================================================================

#[derive(Debug, Clone, Copy, Default)]
pub struct PerformanceModel {
    config: PerformanceConfig,
}

impl PerformanceModel {
    pub fn new(config: PerformanceConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PerformanceConfig {
        &self.config
    }

    /// Shrinkage weight given to a unit's own sample.
    pub fn blend_weight(&self, observations: usize) -> f64 {
        let reference = self.config.reference_window_size.max(1);
        observations.min(reference) as f64 / reference as f64
    }

    /// Shrunk distribution of a history window. Units with no usable
    /// observations get the baseline unchanged.
    pub fn estimate(&self, history: &[Observation], baseline: ScoringDistribution) -> ScoringDistribution {
        let window = recent_window(history, self.config.window_size);
        match weighted_stats(window) {
            Some(stats) => {
                let w = self.blend_weight(stats.observations);
                ScoringDistribution::new(
                    w * stats.mean + (1.0 - w) * baseline.mean,
                    w * stats.stdev + (1.0 - w) * baseline.stdev,
                )
            }
            None => baseline,
        }
    }

    /// Distribution used for `unit` in the simulation: its explicit
    /// projection when present, otherwise the shrunk history estimate.
    pub fn project(&self, unit: &Unit, baselines: &RoleBaselines) -> Result<ScoringDistribution> {
        if let Some(projection) = unit.projection {
            if projection.mean.is_finite() {
                return Ok(projection);
            }
            warn!(unit = %unit.name, "non-finite projection ignored, using history");
        }
        let baseline = baselines.require(&unit.role)?;
        let dist = self.estimate(&unit.history, baseline);
        debug!(
            unit = %unit.name,
            role = %unit.role,
            mean = dist.mean,
            stdev = dist.stdev,
            "projected from history"
        );
        Ok(dist)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obs(points: &[f64]) -> Vec<Observation> {
        points.iter().map(|&p| Observation::new(p)).collect()
    }

    #[test]
    fn test_weighted_stats_plain() {
        let s = weighted_stats(&obs(&[10.0, 20.0])).unwrap();
        assert!((s.mean - 15.0).abs() < 1e-12);
        assert!((s.stdev - 5.0).abs() < 1e-12);
        assert_eq!(s.observations, 2);
    }

    #[test]
    fn test_zero_weight_excluded() {
        let window = vec![
            Observation::new(10.0),
            Observation::new(1000.0).with_weight(-3.0),
            Observation::new(30.0).with_weight(f64::NAN),
        ];
        let s = weighted_stats(&window).unwrap();
        assert_eq!(s.observations, 1);
        assert!((s.mean - 10.0).abs() < 1e-12);
        assert!(weighted_stats(&[Observation::new(5.0).with_weight(0.0)]).is_none());
    }

    #[test]
    fn test_non_finite_points_excluded() {
        let window = obs(&[10.0, 12.0, 14.0, f64::NAN, f64::INFINITY]);
        let s = weighted_stats(&window).unwrap();
        assert_eq!(s.observations, 3);
        assert!((s.mean - 12.0).abs() < 1e-12);
        assert!(s.stdev.is_finite());
        assert!(weighted_stats(&obs(&[f64::NAN])).is_none());
    }

    #[test]
    fn test_bad_history_does_not_poison_role() {
        let units = vec![
            Unit::new("a", "RB").with_history(obs(&[10.0, 12.0, 14.0])),
            Unit::new("b", "RB").with_history(obs(&[10.0, 12.0, 14.0, f64::NAN])),
            Unit::new("rookie", "RB"),
        ];
        let baselines = RoleBaselines::from_history(&units, &PerformanceConfig::default());
        let rb = baselines.get(&Role::new("RB")).unwrap();
        assert!((rb.mean - 12.0).abs() < 1e-12);
        let model = PerformanceModel::default();
        for unit in &units {
            let dist = model.project(unit, &baselines).unwrap();
            assert!(dist.mean.is_finite(), "{} projected to {:?}", unit.name, dist);
        }
    }

    #[test]
    fn test_non_finite_projection_falls_back_to_history() {
        let model = PerformanceModel::default();
        let mut baselines = RoleBaselines::new();
        baselines.insert(Role::new("QB"), ScoringDistribution::new(18.0, 5.0));
        let unit = Unit::new("Broken", "QB").with_projection(f64::NAN, 4.0);
        assert_eq!(model.project(&unit, &baselines).unwrap(), ScoringDistribution::new(18.0, 5.0));

        let averaged = RoleBaselines::from_distributions(vec![
            (Role::new("QB"), ScoringDistribution::new(f64::INFINITY, 1.0)),
            (Role::new("QB"), ScoringDistribution::new(20.0, 2.0)),
        ]);
        assert_eq!(averaged.get(&Role::new("QB")), Some(ScoringDistribution::new(20.0, 2.0)));
    }

    #[test]
    fn test_rookie_gets_baseline() {
        let model = PerformanceModel::default();
        let baseline = ScoringDistribution::new(12.0, 4.0);
        assert_eq!(model.estimate(&[], baseline), baseline);
    }

    #[test]
    fn test_partial_shrinkage() {
        let model = PerformanceModel::new(PerformanceConfig {
            window_size: 10,
            reference_window_size: 4,
        });
        let baseline = ScoringDistribution::new(10.0, 2.0);
        // two observations of 20 with zero spread: w = 0.5
        let dist = model.estimate(&obs(&[20.0, 20.0]), baseline);
        assert!((dist.mean - 15.0).abs() < 1e-12);
        assert!((dist.stdev - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_full_window_ignores_baseline() {
        let model = PerformanceModel::new(PerformanceConfig {
            window_size: 10,
            reference_window_size: 2,
        });
        let dist = model.estimate(&obs(&[8.0, 12.0, 10.0]), ScoringDistribution::new(100.0, 50.0));
        assert!((dist.mean - 10.0).abs() < 1e-12);
    }

    #[test]
    fn test_window_keeps_most_recent() {
        let history = obs(&[100.0, 100.0, 1.0, 1.0]);
        assert_eq!(recent_window(&history, 2), &history[2..]);
        assert_eq!(recent_window(&history, 10).len(), 4);
    }

    #[test]
    fn test_missing_role_baseline_is_fatal() {
        let model = PerformanceModel::default();
        let unit = Unit::new("Nobody", "K");
        let err = model.project(&unit, &RoleBaselines::new()).unwrap_err();
        assert_eq!(err, SimError::MissingRoleBaseline { role: "K".into() });
    }

    #[test]
    fn test_explicit_projection_bypasses_model() {
        let model = PerformanceModel::default();
        let unit = Unit::new("Star", "QB").with_projection(25.0, 6.0);
        let dist = model.project(&unit, &RoleBaselines::new()).unwrap();
        assert_eq!(dist, ScoringDistribution::new(25.0, 6.0));
    }

    #[test]
    fn test_baselines_pool_by_role() {
        let units = vec![
            Unit::new("A", "RB").with_history(obs(&[10.0, 10.0])),
            Unit::new("B", "RB").with_history(obs(&[20.0, 20.0])),
            Unit::new("C", "WR"),
        ];
        let baselines = RoleBaselines::from_history(&units, &PerformanceConfig::default());
        let rb = baselines.get(&Role::new("RB")).unwrap();
        assert!((rb.mean - 15.0).abs() < 1e-12);
        assert!(baselines.get(&Role::new("WR")).is_none());
    }

    #[test]
    fn test_baselines_from_distributions() {
        let b = RoleBaselines::from_distributions(vec![
            (Role::new("TE"), ScoringDistribution::new(8.0, 3.0)),
            (Role::new("TE"), ScoringDistribution::new(12.0, 4.0)),
        ]);
        let te = b.get(&Role::new("TE")).unwrap();
        assert!((te.mean - 10.0).abs() < 1e-12);
        assert!((te.stdev - 12.5f64.sqrt()).abs() < 1e-12);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// The shrunk mean always lies between the sample mean and the baseline.
            #[test]
            fn prop_shrunk_mean_is_between(
                points in prop::collection::vec(0.0f64..60.0, 1..12),
                base_mean in 0.0f64..60.0,
            ) {
                let model = PerformanceModel::default();
                let window = obs(&points);
                let sample = weighted_stats(recent_window(&window, 10)).unwrap().mean;
                let dist = model.estimate(&window, ScoringDistribution::new(base_mean, 5.0));
                let lo = sample.min(base_mean) - 1e-9;
                let hi = sample.max(base_mean) + 1e-9;
                prop_assert!(dist.mean >= lo && dist.mean <= hi);
            }

            /// Same inputs, same outputs.
            #[test]
            fn prop_estimate_is_pure(points in prop::collection::vec(-10.0f64..60.0, 0..15)) {
                let model = PerformanceModel::default();
                let window = obs(&points);
                let base = ScoringDistribution::new(10.0, 3.0);
                prop_assert_eq!(model.estimate(&window, base), model.estimate(&window, base));
            }
        }
    }
}
