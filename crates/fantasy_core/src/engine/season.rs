//! Season trial engine.
//!
//! ```text
//! SeasonEngine::new      -> week table, pending games, realized records
//!   -> run()             -> rayon over batches (ChaCha8 stream per batch)
//!        -> run_batch()  -> draw every pending score for the batch,
//!                           reduce to standings, resolve the bracket
//!   -> TrialSet          -> trial-major rows, one per entry
//! ```
//!
//! Recorded scores are never resampled: each row keeps the realized and
//! sampled halves of the season apart.

use super::bracket::{BracketResolver, Finish, GameSource};
use super::config::SimulationConfig;
use super::control::SimulationControl;
use super::lineup::{ResolvedRosters, WeekTable};
use crate::error::{Result, SimError};
use crate::models::{EntryId, League, MatchupTiePolicy};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::StandardNormal;
use rayon::prelude::*;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use tracing::{debug, info};

// ============================================================================
// Trial records
// ============================================================================

/// One entry's season in one trial.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrialRow {
    pub realized_wins: f64,
    pub realized_points: f64,
    pub sampled_wins: f64,
    pub sampled_points: f64,
    /// 1-based regular-season rank.
    pub rank: usize,
    /// Playoff seed, when the entry qualified.
    pub seed: Option<usize>,
    pub finish: Finish,
    pub last_place: bool,
}

impl TrialRow {
    pub fn wins(&self) -> f64 {
        self.realized_wins + self.sampled_wins
    }

    pub fn points(&self) -> f64 {
        self.realized_points + self.sampled_points
    }
}

/// Final regular-season line of one entry in one trial.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StandingsRow {
    pub entry: EntryId,
    pub wins: f64,
    pub points: f64,
    pub rank: usize,
}

/// Every completed trial, trial-major: `rows[t * entries + e]`.
#[derive(Debug, Clone, PartialEq)]
pub struct TrialSet {
    entries: usize,
    rows: Vec<TrialRow>,
    requested: usize,
    cancelled: bool,
    seed: u64,
}

impl TrialSet {
    pub fn entries(&self) -> usize {
        self.entries
    }

    /// Completed trials.
    pub fn len(&self) -> usize {
        self.rows.len() / self.entries.max(1)
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn requested(&self) -> usize {
        self.requested
    }

    /// True when the run stopped before every requested batch ran.
    pub fn cancelled(&self) -> bool {
        self.cancelled
    }

    /// Master seed the run used.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn trial(&self, trial: usize) -> &[TrialRow] {
        &self.rows[trial * self.entries..(trial + 1) * self.entries]
    }

    pub fn trials(&self) -> impl Iterator<Item = &[TrialRow]> {
        self.rows.chunks(self.entries.max(1))
    }

    pub fn row(&self, trial: usize, entry: EntryId) -> &TrialRow {
        &self.rows[trial * self.entries + entry.index()]
    }

    /// Standings of one trial, best rank first.
    pub fn standings(&self, trial: usize) -> Vec<StandingsRow> {
        let mut rows: Vec<StandingsRow> = self
            .trial(trial)
            .iter()
            .enumerate()
            .map(|(e, row)| StandingsRow {
                entry: EntryId(e),
                wins: row.wins(),
                points: row.points(),
                rank: row.rank,
            })
            .collect();
        rows.sort_by_key(|r| r.rank);
        rows
    }
}

// ============================================================================
// Engine
// ============================================================================

#[derive(Debug, Clone, Copy)]
struct PendingGame {
    week: u32,
    home: EntryId,
    away: EntryId,
}

/// Recorded bracket scores keyed by `(week, low id, high id)`, scores in key order.
type PlayoffResults = FxHashMap<(u32, EntryId, EntryId), (f64, f64)>;

pub struct SeasonEngine<'a> {
    league: &'a League,
    table: WeekTable,
    pending: Vec<PendingGame>,
    realized_wins: Vec<f64>,
    realized_points: Vec<f64>,
    playoff_results: PlayoffResults,
    resolver: BracketResolver,
}

impl<'a> SeasonEngine<'a> {
    pub fn new(league: &'a League, rosters: &ResolvedRosters) -> Result<Self> {
        league.validate()?;
        league.warn_on_stale_schedule();

        let n = league.entry_count();
        let mut realized_wins = vec![0.0; n];
        let mut realized_points = vec![0.0; n];
        let mut pending = Vec::new();

        for m in league.regular_season_matchups() {
            match m.realized {
                Some((home, away)) => {
                    realized_points[m.home.index()] += home;
                    realized_points[m.away.index()] += away;
                    let (hw, aw) = match home.partial_cmp(&away) {
                        Some(Ordering::Greater) => (1.0, 0.0),
                        Some(Ordering::Less) => (0.0, 1.0),
                        _ => (0.5, 0.5),
                    };
                    realized_wins[m.home.index()] += hw;
                    realized_wins[m.away.index()] += aw;
                }
                None => pending.push(PendingGame {
                    week: m.week,
                    home: m.home,
                    away: m.away,
                }),
            }
        }

        let playoff_results = league
            .playoff_results()
            .filter_map(|m| {
                let (home, away) = m.realized?;
                Some(if m.home < m.away {
                    ((m.week, m.home, m.away), (home, away))
                } else {
                    ((m.week, m.away, m.home), (away, home))
                })
            })
            .collect();

        debug!(
            entries = n,
            pending = pending.len(),
            "season engine prepared"
        );

        Ok(Self {
            league,
            table: WeekTable::build(league, rosters)?,
            pending,
            realized_wins,
            realized_points,
            playoff_results,
            resolver: BracketResolver::from_settings(&league.settings)?,
        })
    }

    pub fn league(&self) -> &League {
        self.league
    }

    /// Regular-season games still to be sampled.
    pub fn pending_games(&self) -> usize {
        self.pending.len()
    }

    /// Run every batch in parallel, skipping batches that start after the
    /// control says stop.
    pub fn run(&self, config: &SimulationConfig, control: &SimulationControl) -> Result<TrialSet> {
        config.validate()?;
        let seed = config.resolve_seed();
        let batch_size = config.batch_size;
        let batches = config.num_trials.div_ceil(batch_size);

        let results: Vec<Option<Vec<TrialRow>>> = (0..batches)
            .into_par_iter()
            .map(|batch| {
                if control.should_stop() {
                    return None;
                }
                let len = batch_size.min(config.num_trials - batch * batch_size);
                Some(self.run_batch(seed, batch as u64, len))
            })
            .collect();

        let cancelled = results.iter().any(Option::is_none);
        let rows: Vec<TrialRow> = results.into_iter().flatten().flatten().collect();
        if rows.is_empty() {
            return Err(SimError::NoTrialsCompleted);
        }

        let trials = TrialSet {
            entries: self.league.entry_count(),
            rows,
            requested: config.num_trials,
            cancelled,
            seed,
        };
        info!(
            trials = trials.len(),
            requested = config.num_trials,
            cancelled,
            seed,
            "season simulation complete"
        );
        Ok(trials)
    }

    /// `len` trials from stream `batch` of the master seed.
    fn run_batch(&self, seed: u64, batch: u64, len: usize) -> Vec<TrialRow> {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        rng.set_stream(batch);

        let n = self.league.entry_count();
        let games = self.pending.len();
        let draws: Vec<f64> = (0..len * games * 2)
            .map(|_| rng.sample(StandardNormal))
            .collect();

        let mut rows = Vec::with_capacity(len * n);
        let mut scores = vec![(0.0, 0.0); games];
        for trial in 0..len {
            let z = &draws[trial * games * 2..(trial + 1) * games * 2];

            let mut sampled_points = vec![0.0; n];
            for (g, game) in self.pending.iter().enumerate() {
                let home = self.table.get(game.home, game.week).at(z[2 * g]);
                let away = self.table.get(game.away, game.week).at(z[2 * g + 1]);
                sampled_points[game.home.index()] += home;
                sampled_points[game.away.index()] += away;
                scores[g] = (home, away);
            }
            let season_points: Vec<f64> = (0..n)
                .map(|e| self.realized_points[e] + sampled_points[e])
                .collect();

            let mut sampled_wins = vec![0.0; n];
            for (game, &(home, away)) in self.pending.iter().zip(&scores) {
                let (h, a) = (game.home.index(), game.away.index());
                let home_share = if home > away {
                    1.0
                } else if home < away {
                    0.0
                } else {
                    self.split_tie(season_points[h], season_points[a], &mut rng)
                };
                sampled_wins[h] += home_share;
                sampled_wins[a] += 1.0 - home_share;
            }

            let order = self.rank(&sampled_wins, &season_points, &mut rng);
            let mut rank = vec![0; n];
            for (r, entry) in order.iter().enumerate() {
                rank[entry.index()] = r + 1;
            }

            let outcome = {
                let mut source = TrialGames {
                    table: &self.table,
                    playoff_results: &self.playoff_results,
                    season_points: &season_points,
                    rng: &mut rng,
                };
                self.resolver.resolve(&order, &mut source)
            };

            let seeded = self.resolver.format().teams();
            for e in 0..n {
                let id = EntryId(e);
                let seed = (rank[e] <= seeded).then_some(rank[e]);
                let finish = if id == outcome.winner {
                    Finish::Winner
                } else if id == outcome.runner_up {
                    Finish::RunnerUp
                } else if Some(id) == outcome.third {
                    Finish::Third
                } else if seed.is_some() {
                    Finish::Eliminated
                } else {
                    Finish::MissedPlayoffs
                };
                rows.push(TrialRow {
                    realized_wins: self.realized_wins[e],
                    realized_points: self.realized_points[e],
                    sampled_wins: sampled_wins[e],
                    sampled_points: sampled_points[e],
                    rank: rank[e],
                    seed,
                    finish,
                    last_place: id == outcome.last_place,
                });
            }
        }
        rows
    }

    /// Home share of a drawn game.
    fn split_tie(&self, home_points: f64, away_points: f64, rng: &mut ChaCha8Rng) -> f64 {
        match self.league.settings.matchup_tie {
            MatchupTiePolicy::Split => 0.5,
            MatchupTiePolicy::HigherSeasonPoints => {
                if home_points > away_points {
                    1.0
                } else if home_points < away_points {
                    0.0
                } else if rng.gen_bool(0.5) {
                    1.0
                } else {
                    0.0
                }
            }
        }
    }

    /// Entries ordered by wins, then points, then a uniform draw.
    fn rank(&self, sampled_wins: &[f64], season_points: &[f64], rng: &mut ChaCha8Rng) -> Vec<EntryId> {
        let n = sampled_wins.len();
        let wins: Vec<f64> = (0..n)
            .map(|e| self.realized_wins[e] + sampled_wins[e])
            .collect();
        let lots: Vec<f64> = (0..n).map(|_| rng.gen::<f64>()).collect();
        let mut order: Vec<usize> = (0..n).collect();
        order.sort_by(|&a, &b| {
            wins[b]
                .total_cmp(&wins[a])
                .then(season_points[b].total_cmp(&season_points[a]))
                .then(lots[b].total_cmp(&lots[a]))
        });
        order.into_iter().map(EntryId).collect()
    }
}

/// Bracket scores for one trial: recorded results first, then draws from
/// the week's lineup distributions.
struct TrialGames<'a> {
    table: &'a WeekTable,
    playoff_results: &'a PlayoffResults,
    season_points: &'a [f64],
    rng: &'a mut ChaCha8Rng,
}

impl GameSource for TrialGames<'_> {
    fn scores(&mut self, week: u32, a: EntryId, b: EntryId) -> (f64, f64) {
        let key = if a < b { (week, a, b) } else { (week, b, a) };
        if let Some(&(lo, hi)) = self.playoff_results.get(&key) {
            return if a < b { (lo, hi) } else { (hi, lo) };
        }
        let sa = self.table.get(a, week).at(self.rng.sample(StandardNormal));
        let sb = self.table.get(b, week).at(self.rng.sample(StandardNormal));
        (sa, sb)
    }

    fn season_points(&self, entry: EntryId) -> f64 {
        self.season_points[entry.index()]
    }
}
