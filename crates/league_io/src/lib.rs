//! League I/O
//!
//! CSV/JSON tables -> typed [`fantasy_core::League`]
//! Engine reports -> CSV rows or JSON documents

pub mod error;
pub mod loader;
pub mod report;
pub mod tables;

pub use error::{LoadError, Result};
pub use loader::{build_league, load_league, load_league_from_readers, read_settings, LeagueFiles, LoadReport};
pub use report::{write_rows, write_rows_to_path, OutputFormat, RunMetadata};
pub use tables::{HistoryRecord, MatchupRecord, UnitRecord};
