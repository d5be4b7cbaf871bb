//! Simulation engine: performance model, lineups, season trials, bracket,
//! aggregation and replacement value.

pub mod aggregate;
pub mod bracket;
pub mod config;
pub mod control;
pub mod lineup;
pub mod performance;
pub mod projection;
pub mod replacement;
pub mod season;

pub use aggregate::{aggregate, standard_error, EntryDelta, EntryReport, SeasonReport};
pub use bracket::{BracketOutcome, BracketResolver, Finish, GameSource, Seeded};
pub use config::{PerformanceConfig, SimulationConfig, MAX_TRIALS};
pub use control::{CancelHandle, SimulationControl};
pub use lineup::{lineup_distribution, select_lineup, ResolvedRosters, WeekTable};
pub use performance::{recent_window, weighted_stats, PerformanceModel, RoleBaselines, WindowStats};
pub use projection::{project_matchups, win_probability, MatchupProjection};
pub use replacement::{BaselineLineup, ReplacementEstimator};
pub use season::{SeasonEngine, StandingsRow, TrialRow, TrialSet};
