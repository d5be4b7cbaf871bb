//! Reduce a [`TrialSet`] into per-entry probabilities and expected earnings.

use super::bracket::Finish;
use super::season::TrialSet;
use crate::models::{EntryId, League, Payouts};
use serde::{Deserialize, Serialize};

/// Binomial standard error of a proportion estimated from `n` trials.
pub fn standard_error(p: f64, n: usize) -> f64 {
    if n == 0 {
        return 0.0;
    }
    (p * (1.0 - p) / n as f64).max(0.0).sqrt()
}

/// Flat per-entry summary; one row per entry in tabular output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryReport {
    pub entry: EntryId,
    pub name: String,
    pub wins_avg: f64,
    pub wins_stdev: f64,
    pub points_avg: f64,
    pub points_stdev: f64,
    pub p_playoffs: f64,
    pub p_bye: f64,
    pub p_winner: f64,
    pub p_runner_up: f64,
    pub p_third: f64,
    pub p_last: f64,
    pub expected_earnings: f64,
    pub p_playoffs_se: f64,
    pub p_winner_se: f64,
    pub p_runner_up_se: f64,
    pub p_third_se: f64,
    pub p_last_se: f64,
}

/// Change in one entry's outlook between two reports (`after - before`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryDelta {
    pub entry: EntryId,
    pub name: String,
    pub wins_avg: f64,
    pub points_avg: f64,
    pub p_playoffs: f64,
    pub p_winner: f64,
    pub p_runner_up: f64,
    pub p_third: f64,
    pub p_last: f64,
    pub expected_earnings: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonReport {
    pub season: String,
    pub trials: usize,
    pub cancelled: bool,
    pub entries: Vec<EntryReport>,
}

impl SeasonReport {
    pub fn entry(&self, id: EntryId) -> Option<&EntryReport> {
        self.entries.get(id.index())
    }

    pub fn entry_by_name(&self, name: &str) -> Option<&EntryReport> {
        self.entries.iter().find(|e| e.name == name)
    }

    /// Per-entry deltas from `self` to `after`, matched by entry id.
    pub fn diff(&self, after: &SeasonReport) -> Vec<EntryDelta> {
        self.entries
            .iter()
            .zip(&after.entries)
            .map(|(b, a)| EntryDelta {
                entry: b.entry,
                name: b.name.clone(),
                wins_avg: a.wins_avg - b.wins_avg,
                points_avg: a.points_avg - b.points_avg,
                p_playoffs: a.p_playoffs - b.p_playoffs,
                p_winner: a.p_winner - b.p_winner,
                p_runner_up: a.p_runner_up - b.p_runner_up,
                p_third: a.p_third - b.p_third,
                p_last: a.p_last - b.p_last,
                expected_earnings: a.expected_earnings - b.expected_earnings,
            })
            .collect()
    }
}

#[derive(Debug, Default)]
struct Tally {
    wins: f64,
    wins_sq: f64,
    points: f64,
    points_sq: f64,
    playoffs: usize,
    bye: usize,
    winner: usize,
    runner_up: usize,
    third: usize,
    last: usize,
}

pub fn aggregate(league: &League, trials: &TrialSet) -> SeasonReport {
    let byes = league
        .settings
        .playoff_format()
        .map(|f| f.byes())
        .unwrap_or(0);
    let mut tallies: Vec<Tally> = (0..trials.entries()).map(|_| Tally::default()).collect();

    for rows in trials.trials() {
        for (tally, row) in tallies.iter_mut().zip(rows) {
            let (w, p) = (row.wins(), row.points());
            tally.wins += w;
            tally.wins_sq += w * w;
            tally.points += p;
            tally.points_sq += p * p;
            if let Some(seed) = row.seed {
                tally.playoffs += 1;
                if seed <= byes {
                    tally.bye += 1;
                }
            }
            match row.finish {
                Finish::Winner => tally.winner += 1,
                Finish::RunnerUp => tally.runner_up += 1,
                Finish::Third => tally.third += 1,
                Finish::Eliminated | Finish::MissedPlayoffs => {}
            }
            if row.last_place {
                tally.last += 1;
            }
        }
    }

    let n = trials.len();
    let entries = league
        .entries
        .iter()
        .zip(&tallies)
        .map(|(entry, t)| summarize(entry.id, &entry.name, t, n, &league.settings.payouts))
        .collect();

    SeasonReport {
        season: league.settings.season.clone(),
        trials: n,
        cancelled: trials.cancelled(),
        entries,
    }
}

fn summarize(entry: EntryId, name: &str, t: &Tally, n: usize, payouts: &Payouts) -> EntryReport {
    let nf = n.max(1) as f64;
    let mean_sd = |sum: f64, sq: f64| {
        let mean = sum / nf;
        (mean, (sq / nf - mean * mean).max(0.0).sqrt())
    };
    let share = |count: usize| count as f64 / nf;

    let (wins_avg, wins_stdev) = mean_sd(t.wins, t.wins_sq);
    let (points_avg, points_stdev) = mean_sd(t.points, t.points_sq);
    let p_playoffs = share(t.playoffs);
    let p_winner = share(t.winner);
    let p_runner_up = share(t.runner_up);
    let p_third = share(t.third);
    let p_last = share(t.last);

    EntryReport {
        entry,
        name: name.to_string(),
        wins_avg,
        wins_stdev,
        points_avg,
        points_stdev,
        p_playoffs,
        p_bye: share(t.bye),
        p_winner,
        p_runner_up,
        p_third,
        p_last,
        expected_earnings: p_winner * payouts.first + p_runner_up * payouts.second + p_third * payouts.third,
        p_playoffs_se: standard_error(p_playoffs, n),
        p_winner_se: standard_error(p_winner, n),
        p_runner_up_se: standard_error(p_runner_up, n),
        p_third_se: standard_error(p_third, n),
        p_last_se: standard_error(p_last, n),
    }
}
