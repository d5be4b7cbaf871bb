//! Weekly lineup selection and lineup distributions.
//!
//! Slots are filled in the order the league lists them; each slot takes the
//! highest-mean unused unit that is available that week and whose role the
//! slot accepts. Equal means keep roster order.

use super::performance::{PerformanceModel, RoleBaselines};
use crate::error::Result;
use crate::models::{EntryId, League, LineupRules, ScoringDistribution, Unit};

/// Resolved distributions for every rostered unit, indexed like
/// `league.entries[e].roster[u]`.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedRosters {
    pub units: Vec<Vec<ScoringDistribution>>,
}

impl ResolvedRosters {
    pub fn resolve(league: &League, model: &PerformanceModel, baselines: &RoleBaselines) -> Result<Self> {
        let units = league
            .entries
            .iter()
            .map(|entry| {
                entry
                    .roster
                    .iter()
                    .map(|unit| model.project(unit, baselines))
                    .collect::<Result<Vec<_>>>()
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { units })
    }

    pub fn entry(&self, id: EntryId) -> &[ScoringDistribution] {
        &self.units[id.index()]
    }
}

/// Roster indices of the units that play `week`.
pub fn select_lineup(
    roster: &[Unit],
    dists: &[ScoringDistribution],
    rules: &LineupRules,
    week: u32,
) -> Vec<usize> {
    let available: Vec<usize> = (0..roster.len())
        .filter(|&i| roster[i].availability.plays_in(week))
        .collect();
    if rules.is_open() {
        return available;
    }

    let mut used = vec![false; roster.len()];
    let mut lineup = Vec::new();
    for slot in &rules.slots {
        for _ in 0..slot.count {
            let best = available
                .iter()
                .copied()
                .filter(|&i| !used[i] && slot.accepts(&roster[i].role))
                .fold(None, |best: Option<usize>, i| match best {
                    Some(b) if dists[b].mean >= dists[i].mean => Some(b),
                    _ => Some(i),
                });
            if let Some(i) = best {
                used[i] = true;
                lineup.push(i);
            }
        }
    }
    lineup
}

/// Distribution of the summed lineup score.
pub fn lineup_distribution(dists: &[ScoringDistribution], lineup: &[usize]) -> ScoringDistribution {
    lineup.iter().map(|&i| dists[i]).sum()
}

/// Per-entry, per-week lineup distributions over a contiguous week range.
#[derive(Debug, Clone, PartialEq)]
pub struct WeekTable {
    first_week: u32,
    weeks: usize,
    cells: Vec<ScoringDistribution>,
}

impl WeekTable {
    /// Covers every scheduled week and every playoff week.
    pub fn build(league: &League, rosters: &ResolvedRosters) -> Result<Self> {
        let playoff_weeks = league.playoff_weeks()?;
        let weeks = league
            .matchups
            .iter()
            .map(|m| m.week)
            .chain(playoff_weeks.iter().copied());
        let (first, last) = weeks.fold((u32::MAX, 0u32), |(lo, hi), w| (lo.min(w), hi.max(w)));
        if first > last {
            return Ok(Self {
                first_week: 0,
                weeks: 0,
                cells: Vec::new(),
            });
        }

        let span = (last - first + 1) as usize;
        let mut cells = Vec::with_capacity(span * league.entry_count());
        for entry in &league.entries {
            let dists = rosters.entry(entry.id);
            for week in first..=last {
                let lineup = select_lineup(&entry.roster, dists, &league.settings.lineup, week);
                cells.push(lineup_distribution(dists, &lineup));
            }
        }
        Ok(Self {
            first_week: first,
            weeks: span,
            cells,
        })
    }

    /// Lineup distribution of `entry` in `week`. Weeks outside the table
    /// have no scheduled games and score nothing.
    pub fn get(&self, entry: EntryId, week: u32) -> ScoringDistribution {
        if week < self.first_week || (week - self.first_week) as usize >= self.weeks {
            return ScoringDistribution::default();
        }
        self.cells[entry.index() * self.weeks + (week - self.first_week) as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Availability, LeagueBuilder, LeagueSettings, LineupSlot};

    fn roster() -> (Vec<Unit>, Vec<ScoringDistribution>) {
        let units = vec![
            Unit::new("QB1", "QB"),
            Unit::new("RB1", "RB"),
            Unit::new("RB2", "RB"),
            Unit::new("WR1", "WR"),
            Unit::new("RB3", "RB").with_availability(Availability {
                out_until: Some(5),
                ..Default::default()
            }),
        ];
        let dists = vec![
            ScoringDistribution::new(20.0, 5.0),
            ScoringDistribution::new(12.0, 4.0),
            ScoringDistribution::new(9.0, 4.0),
            ScoringDistribution::new(11.0, 5.0),
            ScoringDistribution::new(15.0, 5.0),
        ];
        (units, dists)
    }

    fn rules() -> LineupRules {
        LineupRules::new(vec![
            LineupSlot::new("QB", &["QB"], 1),
            LineupSlot::new("RB", &["RB"], 1),
            LineupSlot::new("FLEX", &["RB", "WR"], 1),
        ])
    }

    #[test]
    fn test_open_rules_play_everyone_available() {
        let (units, dists) = roster();
        assert_eq!(select_lineup(&units, &dists, &LineupRules::default(), 1), vec![0, 1, 2, 3]);
        assert_eq!(select_lineup(&units, &dists, &LineupRules::default(), 5).len(), 5);
    }

    #[test]
    fn test_slots_take_best_available() {
        let (units, dists) = roster();
        // RB3 is out: RB slot gets RB1, flex gets WR1 (11) over RB2 (9)
        assert_eq!(select_lineup(&units, &dists, &rules(), 1), vec![0, 1, 3]);
        // RB3 back: RB slot takes RB3, flex takes RB1
        assert_eq!(select_lineup(&units, &dists, &rules(), 6), vec![0, 4, 1]);
    }

    #[test]
    fn test_unfilled_slot_is_skipped() {
        let (units, dists) = roster();
        let rules = LineupRules::new(vec![LineupSlot::new("K", &["K"], 1)]);
        assert!(select_lineup(&units, &dists, &rules, 1).is_empty());
    }

    #[test]
    fn test_lineup_distribution_sums() {
        let (_, dists) = roster();
        let d = lineup_distribution(&dists, &[0, 1]);
        assert!((d.mean - 32.0).abs() < 1e-12);
        assert!((d.stdev - 41f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_week_table_lookup() {
        let settings = LeagueSettings {
            playoff_start_week: 3,
            num_playoff_teams: 2,
            ..Default::default()
        };
        let league = LeagueBuilder::new(settings)
            .entry("A", vec![Unit::new("a", "X").with_projection(10.0, 1.0)])
            .entry("B", vec![Unit::new("b", "X").with_projection(7.0, 2.0)])
            .scheduled(1, "A", "B")
            .scheduled(2, "B", "A")
            .build()
            .unwrap();
        let rosters =
            ResolvedRosters::resolve(&league, &PerformanceModel::default(), &RoleBaselines::new()).unwrap();
        let table = WeekTable::build(&league, &rosters).unwrap();
        assert_eq!(table.get(EntryId(0), 1).mean, 10.0);
        assert_eq!(table.get(EntryId(1), 3).mean, 7.0);
        assert_eq!(table.get(EntryId(1), 9), ScoringDistribution::default());
    }
}
