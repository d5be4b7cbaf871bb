//! Hill-climbing roster optimizer.
//!
//! Each iteration proposes every single swap (drop one roster unit, add one
//! free agent that can fill the same lineup slot), evaluates all of them
//! with one shared seed and keeps the best strict improvement in the focal
//! entry's expected earnings. Equal improvements keep the earliest
//! proposal: roster order first, then free-agent order.

use super::session::Simulator;
use super::transaction::RosterMutation;
use crate::error::Result;
use crate::models::{League, LineupRules, Role};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizerConfig {
    /// Accepted moves before giving up (default: 10)
    pub max_iterations: usize,
    /// Smallest gain in expected earnings worth a move (default: 0.0)
    pub min_improvement: f64,
    /// Rostered units that are never dropped.
    #[serde(default)]
    pub include: Vec<String>,
    /// Free agents that are never added.
    #[serde(default)]
    pub exclude: Vec<String>,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            max_iterations: 10,
            min_improvement: 0.0,
            include: Vec::new(),
            exclude: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationStep {
    pub iteration: usize,
    pub drop: String,
    pub add: String,
    pub expected_earnings: f64,
    pub improvement: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OptimizationResult {
    pub entry: String,
    pub initial_earnings: f64,
    pub final_earnings: f64,
    pub steps: Vec<OptimizationStep>,
    /// League with every accepted move applied.
    pub league: League,
}

pub struct RosterOptimizer {
    simulator: Simulator,
    config: OptimizerConfig,
}

impl RosterOptimizer {
    /// The simulator is pinned to one seed for the whole search.
    pub fn new(simulator: &Simulator, config: OptimizerConfig) -> Self {
        Self {
            simulator: simulator.pinned(),
            config,
        }
    }

    pub fn optimize(&self, league: &League, entry: &str) -> Result<OptimizationResult> {
        let id = league.entry_id(entry)?;
        let mut current = league.clone();
        let initial_earnings = self.earnings(&current, id.index())?;
        let mut earnings = initial_earnings;
        let mut steps = Vec::new();

        for iteration in 1..=self.config.max_iterations {
            let proposals = self.proposals(&current, entry);
            debug!(iteration, proposals = proposals.len(), "evaluating swaps");

            let mut best: Option<(RosterMutation, f64)> = None;
            for mutation in proposals {
                let report = self.simulator.evaluate_change(&current, &mutation)?;
                let value = report.entries[id.index()].expected_earnings;
                if best.as_ref().map_or(true, |(_, b)| value > *b) {
                    best = Some((mutation, value));
                }
            }

            let Some((mutation, value)) = best else { break };
            let improvement = value - earnings;
            if improvement <= 0.0 || improvement <= self.config.min_improvement {
                break;
            }

            mutation.apply(&mut current)?;
            info!(iteration, %mutation, improvement, "accepted roster move");
            if let RosterMutation::Swap { drop, add, .. } = &mutation {
                steps.push(OptimizationStep {
                    iteration,
                    drop: drop.clone(),
                    add: add.clone(),
                    expected_earnings: value,
                    improvement,
                });
            }
            earnings = value;
        }

        Ok(OptimizationResult {
            entry: entry.to_string(),
            initial_earnings,
            final_earnings: earnings,
            steps,
            league: current,
        })
    }

    fn earnings(&self, league: &League, index: usize) -> Result<f64> {
        Ok(self.simulator.evaluate(league)?.entries[index].expected_earnings)
    }

    /// Candidate swaps for `entry`, in roster order then free-agent order.
    fn proposals(&self, league: &League, entry: &str) -> Vec<RosterMutation> {
        let Some(team) = league.entry_by_name(entry) else {
            return Vec::new();
        };
        let rules = &league.settings.lineup;
        let mut proposals = Vec::new();
        for unit in team.roster.iter().filter(|u| !self.config.include.contains(&u.name)) {
            for free in league
                .free_agents
                .iter()
                .filter(|f| !self.config.exclude.contains(&f.name))
            {
                if interchangeable(rules, &unit.role, &free.role) {
                    proposals.push(RosterMutation::swap(entry, &unit.name, &free.name));
                }
            }
        }
        proposals
    }
}

/// Same role, or some lineup slot takes both.
fn interchangeable(rules: &LineupRules, a: &Role, b: &Role) -> bool {
    a == b || rules.slots.iter().any(|s| s.accepts(a) && s.accepts(b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::SimulationConfig;
    use crate::models::{LeagueBuilder, LeagueSettings, LineupSlot, Payouts, Unit};

    fn league() -> League {
        let settings = LeagueSettings {
            season: "2024".into(),
            playoff_start_week: 4,
            num_playoff_teams: 2,
            payouts: Payouts::new(100.0, 40.0, 10.0),
            lineup: LineupRules::new(vec![
                LineupSlot::new("RB", &["RB"], 1),
                LineupSlot::new("FLEX", &["RB", "WR"], 1),
            ]),
            ..Default::default()
        };
        LeagueBuilder::new(settings)
            .entry(
                "A",
                vec![
                    Unit::new("a_rb", "RB").with_projection(40.0, 8.0),
                    Unit::new("a_wr", "WR").with_projection(30.0, 8.0),
                ],
            )
            .entry(
                "B",
                vec![
                    Unit::new("b_rb", "RB").with_projection(60.0, 8.0),
                    Unit::new("b_wr", "WR").with_projection(55.0, 8.0),
                ],
            )
            .entry(
                "C",
                vec![
                    Unit::new("c_rb", "RB").with_projection(58.0, 8.0),
                    Unit::new("c_wr", "WR").with_projection(55.0, 8.0),
                ],
            )
            .free_agent(Unit::new("fa_rb", "RB").with_projection(70.0, 8.0))
            .free_agent(Unit::new("fa_wr", "WR").with_projection(65.0, 8.0))
            .free_agent(Unit::new("fa_qb", "QB").with_projection(90.0, 8.0))
            .scheduled(1, "A", "B")
            .scheduled(2, "A", "C")
            .scheduled(3, "B", "C")
            .build()
            .unwrap()
    }

    fn simulator() -> Simulator {
        Simulator::new(SimulationConfig::default().with_trials(3_000).with_seed(17))
    }

    #[test]
    fn test_proposals_respect_slots_and_lists() {
        let league = league();
        let all = RosterOptimizer::new(&simulator(), OptimizerConfig::default()).proposals(&league, "A");
        // QB fits no slot; RB and WR share FLEX
        assert_eq!(
            all,
            vec![
                RosterMutation::swap("A", "a_rb", "fa_rb"),
                RosterMutation::swap("A", "a_rb", "fa_wr"),
                RosterMutation::swap("A", "a_wr", "fa_rb"),
                RosterMutation::swap("A", "a_wr", "fa_wr"),
            ]
        );

        let config = OptimizerConfig {
            include: vec!["a_rb".into()],
            exclude: vec!["fa_rb".into()],
            ..Default::default()
        };
        let limited = RosterOptimizer::new(&simulator(), config).proposals(&league, "A");
        assert_eq!(limited, vec![RosterMutation::swap("A", "a_wr", "fa_wr")]);
    }

    #[test]
    fn test_optimizer_improves_and_terminates() {
        let league = league();
        let result = RosterOptimizer::new(&simulator(), OptimizerConfig::default())
            .optimize(&league, "A")
            .unwrap();
        assert!(!result.steps.is_empty());
        assert!(result.steps.len() <= 2);
        assert!(result.final_earnings > result.initial_earnings);
        for step in &result.steps {
            assert!(step.improvement > 0.0);
        }
        let roster: Vec<&str> = result.league.entries[0]
            .roster
            .iter()
            .map(|u| u.name.as_str())
            .collect();
        assert!(roster.contains(&"fa_rb") || roster.contains(&"fa_wr"));
        // input league is untouched
        assert_eq!(league.entries[0].roster[0].name, "a_rb");
    }

    #[test]
    fn test_zero_iterations_changes_nothing() {
        let config = OptimizerConfig {
            max_iterations: 0,
            ..Default::default()
        };
        let result = RosterOptimizer::new(&simulator(), config)
            .optimize(&league(), "A")
            .unwrap();
        assert!(result.steps.is_empty());
        assert_eq!(result.initial_earnings, result.final_earnings);
    }

    #[test]
    fn test_unreachable_threshold_stops_immediately() {
        let config = OptimizerConfig {
            min_improvement: 1_000.0,
            ..Default::default()
        };
        let result = RosterOptimizer::new(&simulator(), config)
            .optimize(&league(), "A")
            .unwrap();
        assert!(result.steps.is_empty());
    }
}
