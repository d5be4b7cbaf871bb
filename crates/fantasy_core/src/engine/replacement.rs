//! Replacement value (WAR) of a unit against a role-average lineup.
//!
//! Three lineup populations are drawn per trial:
//!
//! - `base`: every slot from its role baseline,
//! - `candidate`: `base` with the candidate's slot redrawn from the
//!   candidate's own distribution, reusing the same standard-normal deviate,
//! - `opponent`: an independent `base` population.
//!
//! `WAR = (P(candidate > opponent) - P(base > opponent)) * games_per_season`
//!
//! `P(base > opponent)` estimates the 0.5 coin flip with the same draws, which
//! cancels most of the sampling noise and makes a unit identical to its slot
//! baseline worth exactly zero.

use super::performance::RoleBaselines;
use crate::error::{Result, SimError};
use crate::models::{LineupRules, Role, ScoringDistribution};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::StandardNormal;
use rayon::prelude::*;

/// Role-average lineup the candidate is swapped into.
#[derive(Debug, Clone, PartialEq)]
pub struct BaselineLineup {
    slots: Vec<(Role, ScoringDistribution)>,
}

impl BaselineLineup {
    pub fn new(slots: Vec<(Role, ScoringDistribution)>) -> Self {
        Self { slots }
    }

    /// One slot per lineup position; flex slots use the eligible role with
    /// the highest baseline mean. Open rules get one slot per known role.
    pub fn from_rules(rules: &LineupRules, baselines: &RoleBaselines) -> Result<Self> {
        if rules.is_open() {
            let slots = baselines
                .roles()
                .map(|role| Ok((role.clone(), baselines.require(role)?)))
                .collect::<Result<Vec<_>>>()?;
            return Ok(Self { slots });
        }

        let mut slots = Vec::new();
        for slot in &rules.slots {
            let best = slot
                .eligible
                .iter()
                .filter_map(|role| baselines.get(role).map(|d| (role, d)))
                .fold(None, |best: Option<(&Role, ScoringDistribution)>, (role, d)| match best {
                    Some((_, b)) if b.mean >= d.mean => best,
                    _ => Some((role, d)),
                });
            let (role, dist) = match best {
                Some(found) => found,
                None => {
                    let role = slot
                        .eligible
                        .first()
                        .map(|r| r.to_string())
                        .unwrap_or_else(|| slot.name.clone());
                    return Err(SimError::MissingRoleBaseline { role });
                }
            };
            for _ in 0..slot.count {
                slots.push((role.clone(), dist));
            }
        }
        Ok(Self { slots })
    }

    pub fn slots(&self) -> &[(Role, ScoringDistribution)] {
        &self.slots
    }

    pub fn slot_for(&self, role: &Role) -> Option<usize> {
        self.slots.iter().position(|(r, _)| r == role)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ReplacementEstimator {
    num_trials: usize,
    batch_size: usize,
    games_per_season: f64,
    seed: u64,
}

impl ReplacementEstimator {
    pub fn new(num_trials: usize, games_per_season: u32, seed: u64) -> Self {
        Self {
            num_trials: num_trials.max(1),
            batch_size: 1_000,
            games_per_season: games_per_season as f64,
            seed,
        }
    }

    /// WAR of a unit of `role` with distribution `candidate`.
    pub fn war(&self, lineup: &BaselineLineup, role: &Role, candidate: ScoringDistribution) -> Result<f64> {
        let slot = lineup.slot_for(role).ok_or_else(|| SimError::NoSlotForRole {
            role: role.to_string(),
        })?;
        let slots = lineup.slots();
        let baseline = slots[slot].1;

        let batches = self.num_trials.div_ceil(self.batch_size);
        let (candidate_wins, base_wins) = (0..batches)
            .into_par_iter()
            .map(|batch| {
                let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
                rng.set_stream(batch as u64);
                let len = self
                    .batch_size
                    .min(self.num_trials - batch * self.batch_size);

                let mut candidate_wins = 0.0;
                let mut base_wins = 0.0;
                for _ in 0..len {
                    let mut rest = 0.0;
                    let mut z_slot = 0.0;
                    for (k, (_, dist)) in slots.iter().enumerate() {
                        let z: f64 = rng.sample(StandardNormal);
                        if k == slot {
                            z_slot = z;
                        } else {
                            rest += dist.at(z);
                        }
                    }
                    let opponent: f64 = slots
                        .iter()
                        .map(|(_, dist)| dist.at(rng.sample(StandardNormal)))
                        .sum();

                    base_wins += win_share(rest + baseline.at(z_slot), opponent);
                    candidate_wins += win_share(rest + candidate.at(z_slot), opponent);
                }
                (candidate_wins, base_wins)
            })
            .reduce(|| (0.0, 0.0), |a, b| (a.0 + b.0, a.1 + b.1));

        let n = self.num_trials as f64;
        Ok((candidate_wins - base_wins) / n * self.games_per_season)
    }
}

#[inline]
fn win_share(score: f64, opponent: f64) -> f64 {
    if score > opponent {
        1.0
    } else if score == opponent {
        0.5
    } else {
        0.0
    }
}
