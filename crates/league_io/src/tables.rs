//! Raw CSV rows, exactly as they appear on disk.

use crate::error::{LoadError, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// `units.csv`. An empty `entry` marks a free agent; an empty
/// `points_avg` leaves the projection to the performance model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitRecord {
    pub name: String,
    pub role: String,
    #[serde(default)]
    pub entry: Option<String>,
    #[serde(default)]
    pub points_avg: Option<f64>,
    #[serde(default)]
    pub points_stdev: Option<f64>,
    #[serde(default)]
    pub eligible_from: Option<u32>,
    #[serde(default)]
    pub eligible_until: Option<u32>,
    #[serde(default)]
    pub out_until: Option<u32>,
    #[serde(default)]
    pub bye_week: Option<u32>,
}

/// `history.csv`: one scored event per row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub name: String,
    pub week: u32,
    pub points: f64,
    #[serde(default)]
    pub weight: Option<f64>,
    #[serde(default)]
    pub context: Option<f64>,
}

/// `matchups.csv`. Both scores empty means not yet played.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchupRecord {
    pub week: u32,
    pub home: String,
    pub away: String,
    #[serde(default)]
    pub home_score: Option<f64>,
    #[serde(default)]
    pub away_score: Option<f64>,
}

/// Deserialize every row of a headed CSV stream. `source` names the
/// stream in errors.
pub fn read_records<T, R>(reader: R, source: &str) -> Result<Vec<T>>
where
    T: DeserializeOwned,
    R: Read,
{
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    csv_reader
        .deserialize()
        .map(|row| {
            row.map_err(|source_err| LoadError::Csv {
                path: source.to_string(),
                source: source_err,
            })
        })
        .collect()
}

pub fn read_records_from_path<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let file = File::open(path).map_err(|source| LoadError::Io {
        path: path.display().to_string(),
        source,
    })?;
    read_records(file, &path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_units_with_empty_fields() {
        let data = "\
name,role,entry,points_avg,points_stdev,eligible_from,eligible_until,out_until,bye_week
Josh Allen,QB,Team A,24.5,7.1,,,,7
Free Guy,RB,,,,,,,
";
        let rows: Vec<UnitRecord> = read_records(data.as_bytes(), "units.csv").unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].entry.as_deref(), Some("Team A"));
        assert_eq!(rows[0].bye_week, Some(7));
        assert_eq!(rows[1].entry, None);
        assert_eq!(rows[1].points_avg, None);
    }

    #[test]
    fn test_optional_columns_may_be_missing() {
        let data = "name,week,points\nA,1,12.5\n";
        let rows: Vec<HistoryRecord> = read_records(data.as_bytes(), "history.csv").unwrap();
        assert_eq!(rows[0].weight, None);
        assert_eq!(rows[0].points, 12.5);
    }

    #[test]
    fn test_bad_number_is_csv_error() {
        let data = "week,home,away,home_score,away_score\nthree,A,B,,\n";
        let err = read_records::<MatchupRecord, _>(data.as_bytes(), "matchups.csv").unwrap_err();
        assert!(matches!(err, LoadError::Csv { ref path, .. } if path == "matchups.csv"));
    }
}
