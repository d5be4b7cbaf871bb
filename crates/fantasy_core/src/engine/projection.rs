//! Analytic week-by-week matchup projections.
//!
//! The score difference of two independent normal lineups is itself normal,
//! so `P(home wins) = 1 - Phi(0; mean_h - mean_a, sqrt(var_h + var_a))`.

use super::lineup::WeekTable;
use crate::models::{EntryId, League};
use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, Normal};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchupProjection {
    pub week: u32,
    pub home: String,
    pub away: String,
    pub home_mean: f64,
    pub home_stdev: f64,
    pub away_mean: f64,
    pub away_stdev: f64,
    /// Probability the home side wins. Played games report 1, 0 or 0.5.
    pub p_home_win: f64,
    pub home_score: Option<f64>,
    pub away_score: Option<f64>,
}

/// Every matchup in the schedule, in schedule order.
pub fn project_matchups(league: &League, table: &WeekTable) -> Vec<MatchupProjection> {
    let name = |id: EntryId| {
        league
            .entry(id)
            .map(|e| e.name.clone())
            .unwrap_or_else(|| id.to_string())
    };

    league
        .matchups
        .iter()
        .map(|m| {
            let home = table.get(m.home, m.week);
            let away = table.get(m.away, m.week);
            let p_home_win = match m.realized {
                Some((h, a)) if h > a => 1.0,
                Some((h, a)) if h < a => 0.0,
                Some(_) => 0.5,
                None => win_probability(home.mean - away.mean, (home.variance() + away.variance()).sqrt()),
            };
            MatchupProjection {
                week: m.week,
                home: name(m.home),
                away: name(m.away),
                home_mean: home.mean,
                home_stdev: home.stdev,
                away_mean: away.mean,
                away_stdev: away.stdev,
                p_home_win,
                home_score: m.realized.map(|r| r.0),
                away_score: m.realized.map(|r| r.1),
            }
        })
        .collect()
}

/// `P(X > 0)` for `X ~ N(mean_diff, stdev)`.
pub fn win_probability(mean_diff: f64, stdev: f64) -> f64 {
    match Normal::new(mean_diff, stdev) {
        Ok(dist) if stdev > 0.0 => 1.0 - dist.cdf(0.0),
        _ => {
            if mean_diff > 0.0 {
                1.0
            } else if mean_diff < 0.0 {
                0.0
            } else {
                0.5
            }
        }
    }
}
