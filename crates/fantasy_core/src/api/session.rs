//! What-if interface: one [`Simulator`] per configuration, many leagues.
//!
//! Every call rebuilds the whole pipeline from the league snapshot it is
//! given. Nothing is cached between calls, so a mutated clone never sees
//! state from the original.

use super::transaction::RosterMutation;
use crate::engine::{
    aggregate, project_matchups, BaselineLineup, EntryDelta, MatchupProjection, PerformanceModel,
    ReplacementEstimator, ResolvedRosters, RoleBaselines, SeasonEngine, SeasonReport,
    SimulationConfig, SimulationControl, TrialSet, WeekTable,
};
use crate::error::{Result, SimError};
use crate::models::{League, Role, Unit};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Before/after reports for one roster move.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeValuation {
    pub mutation: RosterMutation,
    pub before: SeasonReport,
    pub after: SeasonReport,
    pub deltas: Vec<EntryDelta>,
}

/// Projection and replacement value of one unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitValue {
    pub name: String,
    pub role: Role,
    /// Owning entry; `None` for free agents.
    pub entry: Option<String>,
    pub mean: f64,
    pub stdev: f64,
    pub war: f64,
}

#[derive(Debug, Clone, Default)]
pub struct Simulator {
    config: SimulationConfig,
    control: SimulationControl,
}

impl Simulator {
    pub fn new(config: SimulationConfig) -> Self {
        Self {
            config,
            control: SimulationControl::unbounded(),
        }
    }

    pub fn with_control(mut self, control: SimulationControl) -> Self {
        self.control = control;
        self
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Copy of this simulator pinned to one master seed, so that several
    /// runs share their random draws.
    pub fn pinned(&self) -> Self {
        let mut pinned = self.clone();
        pinned.config.seed = Some(self.config.resolve_seed());
        pinned
    }

    pub fn model(&self) -> PerformanceModel {
        PerformanceModel::new(self.config.performance)
    }

    /// Role baselines from every unit's history, rostered or free. Roles
    /// without history fall back to the average of explicit projections.
    pub fn role_baselines(&self, league: &League) -> RoleBaselines {
        let mut baselines = RoleBaselines::from_history(league.all_units(), &self.config.performance);
        let projected = RoleBaselines::from_distributions(
            league
                .all_units()
                .filter_map(|u| u.projection.map(|p| (u.role.clone(), p))),
        );
        baselines.merge_missing(&projected);
        baselines
    }

    fn resolve(&self, league: &League) -> Result<(RoleBaselines, ResolvedRosters)> {
        self.config.validate()?;
        let baselines = self.role_baselines(league);
        let rosters = ResolvedRosters::resolve(league, &self.model(), &baselines)?;
        Ok((baselines, rosters))
    }

    /// Raw trials for callers that want more than the summary.
    pub fn run_trials(&self, league: &League) -> Result<TrialSet> {
        let (_, rosters) = self.resolve(league)?;
        SeasonEngine::new(league, &rosters)?.run(&self.config, &self.control)
    }

    pub fn evaluate(&self, league: &League) -> Result<SeasonReport> {
        let trials = self.run_trials(league)?;
        Ok(aggregate(league, &trials))
    }

    /// Report for a clone of `league` with `mutation` applied.
    pub fn evaluate_change(&self, league: &League, mutation: &RosterMutation) -> Result<SeasonReport> {
        let mut changed = league.clone();
        mutation.apply(&mut changed)?;
        self.evaluate(&changed)
    }

    /// Both reports and the per-entry delta. The two runs share one seed.
    pub fn value_change(&self, league: &League, mutation: &RosterMutation) -> Result<ChangeValuation> {
        let pinned = self.pinned();
        let before = pinned.evaluate(league)?;
        let after = pinned.evaluate_change(league, mutation)?;
        let deltas = before.diff(&after);
        info!(%mutation, trials = after.trials, "valued roster change");
        Ok(ChangeValuation {
            mutation: mutation.clone(),
            before,
            after,
            deltas,
        })
    }

    pub fn project_matchups(&self, league: &League) -> Result<Vec<MatchupProjection>> {
        let (_, rosters) = self.resolve(league)?;
        let table = WeekTable::build(league, &rosters)?;
        Ok(project_matchups(league, &table))
    }

    /// Replacement value of one unit, rostered or free.
    pub fn war(&self, league: &League, unit: &str) -> Result<UnitValue> {
        let (owner, found) = find_unit(league, unit).ok_or_else(|| SimError::UnknownUnit {
            entry: "league".to_string(),
            unit: unit.to_string(),
        })?;
        let baselines = self.role_baselines(league);
        let lineup = BaselineLineup::from_rules(&league.settings.lineup, &baselines)?;
        let estimator = self.estimator(league);
        self.value_unit(&estimator, &lineup, &baselines, owner, found)
    }

    /// Replacement value of every unit in the league. Units whose role has
    /// no lineup slot are skipped with a warning.
    pub fn unit_values(&self, league: &League) -> Result<Vec<UnitValue>> {
        self.config.validate()?;
        let baselines = self.role_baselines(league);
        let lineup = BaselineLineup::from_rules(&league.settings.lineup, &baselines)?;
        let estimator = self.estimator(league);

        let owned = league
            .entries
            .iter()
            .flat_map(|e| e.roster.iter().map(move |u| (Some(e.name.as_str()), u)));
        let free = league.free_agents.iter().map(|u| (None, u));

        let mut values = Vec::new();
        for (owner, unit) in owned.chain(free) {
            match self.value_unit(&estimator, &lineup, &baselines, owner, unit) {
                Ok(value) => values.push(value),
                Err(SimError::NoSlotForRole { role }) => {
                    warn!(unit = %unit.name, %role, "no lineup slot for role; skipped");
                }
                Err(e) => return Err(e),
            }
        }
        Ok(values)
    }

    fn estimator(&self, league: &League) -> ReplacementEstimator {
        ReplacementEstimator::new(
            self.config.war_trials,
            league.games_per_season(),
            self.config.resolve_seed(),
        )
    }

    fn value_unit(
        &self,
        estimator: &ReplacementEstimator,
        lineup: &BaselineLineup,
        baselines: &RoleBaselines,
        owner: Option<&str>,
        unit: &Unit,
    ) -> Result<UnitValue> {
        let dist = self.model().project(unit, baselines)?;
        let war = estimator.war(lineup, &unit.role, dist)?;
        Ok(UnitValue {
            name: unit.name.clone(),
            role: unit.role.clone(),
            entry: owner.map(str::to_string),
            mean: dist.mean,
            stdev: dist.stdev,
            war,
        })
    }
}

fn find_unit<'a>(league: &'a League, name: &str) -> Option<(Option<&'a str>, &'a Unit)> {
    league
        .entries
        .iter()
        .find_map(|e| {
            e.roster
                .iter()
                .find(|u| u.name == name)
                .map(|u| (Some(e.name.as_str()), u))
        })
        .or_else(|| league.free_agent(name).map(|u| (None, u)))
}
