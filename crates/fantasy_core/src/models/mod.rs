pub mod entry;
pub mod league;
pub mod unit;

pub use entry::{Entry, EntryId, Matchup};
pub use league::{
    BracketTieBreak, League, LeagueBuilder, LeagueSettings, LineupRules, LineupSlot,
    MatchupTiePolicy, Payouts, PlayoffFormat,
};
pub use unit::{Availability, Observation, Role, ScoringDistribution, Unit};
