//! Tables to a validated [`League`].
//!
//! Name reconciliation is lenient: rows that reference unknown units or
//! entries are skipped and listed in the [`LoadReport`], never fatal.
//! Only structural problems the engine rejects fail the load.

use crate::error::{LoadError, Result};
use crate::tables::{read_records, read_records_from_path, HistoryRecord, MatchupRecord, UnitRecord};
use fantasy_core::models::{Availability, Observation};
use fantasy_core::{League, LeagueBuilder, LeagueSettings, ScoringDistribution, Unit};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Input file set of one league.
#[derive(Debug, Clone, PartialEq)]
pub struct LeagueFiles {
    pub settings: PathBuf,
    pub units: PathBuf,
    pub history: Option<PathBuf>,
    pub matchups: PathBuf,
}

impl LeagueFiles {
    /// `league.json`, `units.csv`, `matchups.csv` and, when present,
    /// `history.csv` inside `dir`.
    pub fn in_dir(dir: &Path) -> Self {
        let history = dir.join("history.csv");
        Self {
            settings: dir.join("league.json"),
            units: dir.join("units.csv"),
            history: history.exists().then_some(history),
            matchups: dir.join("matchups.csv"),
        }
    }
}

/// What the loader kept and what it had to skip.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoadReport {
    pub entries: usize,
    pub rostered: usize,
    pub free_agents: usize,
    pub history_rows: usize,
    pub matchups: usize,
    pub warnings: Vec<String>,
    /// RFC3339 timestamp of the load.
    pub loaded_at: String,
}

impl LoadReport {
    fn warn(&mut self, message: String) {
        warn!("{message}");
        self.warnings.push(message);
    }
}

pub fn read_settings(path: &Path) -> Result<LeagueSettings> {
    let text = fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.display().to_string(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| LoadError::Json {
        path: path.display().to_string(),
        source,
    })
}

pub fn load_league(files: &LeagueFiles) -> Result<(League, LoadReport)> {
    let settings = read_settings(&files.settings)?;
    let units: Vec<UnitRecord> = read_records_from_path(&files.units)?;
    let history: Vec<HistoryRecord> = match &files.history {
        Some(path) => read_records_from_path(path)?,
        None => Vec::new(),
    };
    let matchups: Vec<MatchupRecord> = read_records_from_path(&files.matchups)?;
    let (league, report) = build_league(settings, units, history, matchups)?;
    info!(
        entries = report.entries,
        rostered = report.rostered,
        free_agents = report.free_agents,
        warnings = report.warnings.len(),
        "league loaded from {}",
        files.units.display()
    );
    Ok((league, report))
}

/// In-memory variant used by tests and callers that already hold the tables.
pub fn load_league_from_readers<R: std::io::Read>(
    settings: &str,
    units: R,
    history: Option<R>,
    matchups: R,
) -> Result<(League, LoadReport)> {
    let settings: LeagueSettings = serde_json::from_str(settings).map_err(|source| LoadError::Json {
        path: "<settings>".to_string(),
        source,
    })?;
    let units = read_records(units, "<units>")?;
    let history = match history {
        Some(reader) => read_records(reader, "<history>")?,
        None => Vec::new(),
    };
    let matchups = read_records(matchups, "<matchups>")?;
    build_league(settings, units, history, matchups)
}

#[derive(Debug, Clone, Copy)]
enum Slot {
    Rostered { entry: usize, position: usize },
    Free(usize),
}

pub fn build_league(
    settings: LeagueSettings,
    units: Vec<UnitRecord>,
    history: Vec<HistoryRecord>,
    matchups: Vec<MatchupRecord>,
) -> Result<(League, LoadReport)> {
    let mut report = LoadReport {
        loaded_at: chrono::Utc::now().to_rfc3339(),
        ..Default::default()
    };

    // entries in order of first appearance
    let mut entry_names: Vec<String> = Vec::new();
    let mut entry_index: FxHashMap<String, usize> = FxHashMap::default();
    let mut rosters: Vec<Vec<Unit>> = Vec::new();
    let mut free_agents: Vec<Unit> = Vec::new();
    let mut slots: FxHashMap<String, Slot> = FxHashMap::default();

    for record in units {
        if slots.contains_key(&record.name) {
            report.warn(format!("duplicate unit {} ignored", record.name));
            continue;
        }
        let unit = unit_from_record(&record, &mut report);
        match record.entry.as_deref().map(str::trim).filter(|e| !e.is_empty()) {
            Some(name) => {
                let entry = *entry_index.entry(name.to_string()).or_insert_with(|| {
                    entry_names.push(name.to_string());
                    rosters.push(Vec::new());
                    rosters.len() - 1
                });
                slots.insert(
                    record.name.clone(),
                    Slot::Rostered {
                        entry,
                        position: rosters[entry].len(),
                    },
                );
                rosters[entry].push(unit);
            }
            None => {
                slots.insert(record.name.clone(), Slot::Free(free_agents.len()));
                free_agents.push(unit);
            }
        }
    }

    // history, oldest first per unit
    let mut history = history;
    history.sort_by_key(|h| h.week);
    let mut unknown_units = BTreeSet::new();
    for record in history {
        if !record.points.is_finite() {
            report.warn(format!(
                "non-finite points for {} in week {} ignored",
                record.name, record.week
            ));
            continue;
        }
        let unit = match slots.get(&record.name) {
            Some(Slot::Rostered { entry, position }) => &mut rosters[*entry][*position],
            Some(Slot::Free(i)) => &mut free_agents[*i],
            None => {
                unknown_units.insert(record.name);
                continue;
            }
        };
        let mut observation = Observation::new(record.points);
        if let Some(weight) = record.weight {
            observation = observation.with_weight(weight);
        }
        if let Some(context) = record.context {
            observation = observation.with_context(context);
        }
        unit.history.push(observation);
        report.history_rows += 1;
    }
    for name in unknown_units {
        report.warn(format!("history for unknown unit {name} ignored"));
    }

    report.entries = entry_names.len();
    report.rostered = rosters.iter().map(Vec::len).sum();
    report.free_agents = free_agents.len();

    let mut builder = LeagueBuilder::new(settings);
    for (name, roster) in entry_names.iter().zip(rosters) {
        builder = builder.entry(name, roster);
    }
    for unit in free_agents {
        builder = builder.free_agent(unit);
    }

    for m in matchups {
        let unknown: Vec<&str> = [m.home.as_str(), m.away.as_str()]
            .into_iter()
            .filter(|name| !entry_index.contains_key(*name))
            .collect();
        if !unknown.is_empty() {
            report.warn(format!(
                "week {} matchup {} vs {} skipped: unknown entry {}",
                m.week,
                m.home,
                m.away,
                unknown.join(", ")
            ));
            continue;
        }
        builder = match (m.home_score, m.away_score) {
            (Some(home), Some(away)) => builder.played(m.week, &m.home, &m.away, home, away),
            (None, None) => builder.scheduled(m.week, &m.home, &m.away),
            _ => {
                report.warn(format!(
                    "week {} matchup {} vs {} has one score; treated as unplayed",
                    m.week, m.home, m.away
                ));
                builder.scheduled(m.week, &m.home, &m.away)
            }
        };
        report.matchups += 1;
    }

    let league = builder.build()?;
    Ok((league, report))
}

fn unit_from_record(record: &UnitRecord, report: &mut LoadReport) -> Unit {
    let mut unit = Unit::new(&record.name, &record.role).with_availability(Availability {
        eligible_from: record.eligible_from,
        eligible_until: record.eligible_until,
        out_until: record.out_until,
        bye_week: record.bye_week,
    });
    match (record.points_avg, record.points_stdev) {
        (Some(mean), stdev) if mean.is_finite() => {
            unit.projection = Some(ScoringDistribution::new(mean, stdev.unwrap_or(0.0)));
        }
        (Some(_), _) => report.warn(format!(
            "non-finite projection for {}; using the performance model",
            record.name
        )),
        (None, Some(_)) => report.warn(format!(
            "{} has a stdev but no mean; using the performance model",
            record.name
        )),
        (None, None) => {}
    }
    unit
}

#[cfg(test)]
mod tests {
    use super::*;
    use fantasy_core::EntryId;
    use std::io::Write;

    const SETTINGS: &str = r#"{
        "season": "2024",
        "current_week": 3,
        "playoff_start_week": 5,
        "num_playoff_teams": 2,
        "payouts": {"first": 100.0, "second": 50.0, "third": 0.0}
    }"#;

    const UNITS: &str = "\
name,role,entry,points_avg,points_stdev,eligible_from,eligible_until,out_until,bye_week
qb_a,QB,Alpha,20,5,,,,
rb_a,RB,Alpha,,,,,,
qb_b,QB,Beta,18,4,,,,6
rb_b,RB,Beta,11,3,,,,
rb_free,RB,,,,,,,
qb_a,QB,Beta,1,1,,,,
";

    const HISTORY: &str = "\
name,week,points,weight,context
rb_a,2,14,,
rb_a,1,10,1,1
rb_free,1,8,,
ghost,1,30,,
";

    const MATCHUPS: &str = "\
week,home,away,home_score,away_score
1,Alpha,Beta,101.5,99
2,Beta,Alpha,,
3,Alpha,Gamma,,
4,Alpha,Beta,80,
";

    fn load() -> (League, LoadReport) {
        load_league_from_readers(
            SETTINGS,
            UNITS.as_bytes(),
            Some(HISTORY.as_bytes()),
            MATCHUPS.as_bytes(),
        )
        .unwrap()
    }

    #[test]
    fn test_entries_and_free_agents() {
        let (league, report) = load();
        assert_eq!(league.entry_count(), 2);
        assert_eq!(league.entries[0].name, "Alpha");
        assert_eq!(league.entries[1].roster.len(), 2);
        assert_eq!(league.free_agents.len(), 1);
        assert_eq!(report.rostered, 4);
        assert_eq!(report.free_agents, 1);
        assert_eq!(league.entries[1].roster[0].availability.bye_week, Some(6));
    }

    #[test]
    fn test_history_attached_oldest_first() {
        let (league, report) = load();
        let rb = &league.entries[0].roster[1];
        let points: Vec<f64> = rb.history.iter().map(|o| o.points).collect();
        assert_eq!(points, vec![10.0, 14.0]);
        assert!(rb.projection.is_none());
        assert_eq!(league.free_agents[0].history.len(), 1);
        assert_eq!(report.history_rows, 3);
    }

    #[test]
    fn test_unmatched_names_are_warnings() {
        let (league, report) = load();
        let joined = report.warnings.join("\n");
        assert!(joined.contains("duplicate unit qb_a"));
        assert!(joined.contains("unknown unit ghost"));
        assert!(joined.contains("unknown entry Gamma"));
        assert!(joined.contains("has one score"));
        // Gamma matchup skipped, half-scored one kept as unplayed
        assert_eq!(league.matchups.len(), 3);
        assert_eq!(report.matchups, 3);
        assert!(!league.matchups[2].is_resolved());
    }

    #[test]
    fn test_played_matchup_keeps_scores() {
        let (league, _) = load();
        let first = &league.matchups[0];
        assert_eq!(first.realized, Some((101.5, 99.0)));
        assert_eq!(first.home, EntryId(0));
    }

    #[test]
    fn test_structural_problem_fails() {
        let settings = r#"{"season":"x","current_week":1,"playoff_start_week":5,"num_playoff_teams":3}"#;
        let err = load_league_from_readers(settings, UNITS.as_bytes(), None, MATCHUPS.as_bytes()).unwrap_err();
        assert!(matches!(err, LoadError::League(_)));
    }

    #[test]
    fn test_load_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        let write = |name: &str, body: &str| {
            let mut f = std::fs::File::create(dir.path().join(name)).unwrap();
            f.write_all(body.as_bytes()).unwrap();
        };
        write("league.json", SETTINGS);
        write("units.csv", UNITS);
        write("matchups.csv", MATCHUPS);

        let files = LeagueFiles::in_dir(dir.path());
        assert!(files.history.is_none());
        let (league, report) = load_league(&files).unwrap();
        assert_eq!(league.entry_count(), 2);
        assert_eq!(report.history_rows, 0);
        assert!(!report.loaded_at.is_empty());
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_league(&LeagueFiles::in_dir(dir.path())).unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));
    }
}
