//! League snapshot: settings, entries and the matchup table.
//!
//! A [`League`] is loaded once per invocation and treated as read-only by the
//! engine. What-if callers clone it and mutate the clone.

use super::entry::{Entry, EntryId, Matchup};
use super::unit::{Role, Unit};
use crate::error::{Result, SimError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::warn;

// ============================================================================
// Settings
// ============================================================================

/// Prize money for the top three finishers.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Payouts {
    pub first: f64,
    pub second: f64,
    pub third: f64,
}

impl Payouts {
    pub fn new(first: f64, second: f64, third: f64) -> Self {
        Self {
            first,
            second,
            third,
        }
    }
}

/// One group of lineup slots, e.g. two `RB` slots or one `FLEX` accepting
/// `RB`/`WR`/`TE`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineupSlot {
    pub name: String,
    pub eligible: Vec<Role>,
    #[serde(default = "default_slot_count")]
    pub count: u32,
}

fn default_slot_count() -> u32 {
    1
}

impl LineupSlot {
    pub fn new(name: &str, eligible: &[&str], count: u32) -> Self {
        Self {
            name: name.to_string(),
            eligible: eligible.iter().map(|r| Role::new(r)).collect(),
            count,
        }
    }

    pub fn accepts(&self, role: &Role) -> bool {
        self.eligible.iter().any(|r| r == role)
    }
}

/// Starting lineup rules. Empty means every available unit plays
/// (confidence pools, pick'em, tennis draws).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LineupRules {
    pub slots: Vec<LineupSlot>,
}

impl LineupRules {
    pub fn new(slots: Vec<LineupSlot>) -> Self {
        Self { slots }
    }

    pub fn is_open(&self) -> bool {
        self.slots.is_empty()
    }
}

/// How an exact tie between two sampled scores is decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchupTiePolicy {
    /// Higher regular-season points total wins; a coin flip settles the rest.
    #[default]
    HigherSeasonPoints,
    /// Each side books half a win.
    Split,
}

/// How a tied playoff game is decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BracketTieBreak {
    /// Better seed advances.
    #[default]
    HigherSeed,
    /// Higher regular-season points advance, then the better seed.
    SeasonPoints,
}

/// Supported postseason shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayoffFormat {
    /// Regular-season leader is champion.
    None,
    /// Seeds 1 and 2 meet in a final.
    Final,
    /// Semifinals 1v4, 2v3.
    FourTeam,
    /// Seeds 1 and 2 sit out a quarterfinal round of 3v6, 4v5.
    SixTeamByes,
    /// Quarterfinals 1v8, 4v5, 2v7, 3v6.
    EightTeam,
}

impl PlayoffFormat {
    pub fn from_slots(teams: u32) -> Result<Self> {
        match teams {
            0 => Ok(Self::None),
            2 => Ok(Self::Final),
            4 => Ok(Self::FourTeam),
            6 => Ok(Self::SixTeamByes),
            8 => Ok(Self::EightTeam),
            _ => Err(SimError::UnsupportedPlayoffSize { teams }),
        }
    }

    pub fn teams(self) -> usize {
        match self {
            Self::None => 0,
            Self::Final => 2,
            Self::FourTeam => 4,
            Self::SixTeamByes => 6,
            Self::EightTeam => 8,
        }
    }

    /// Number of bracket weeks.
    pub fn rounds(self) -> u32 {
        match self {
            Self::None => 0,
            Self::Final => 1,
            Self::FourTeam => 2,
            Self::SixTeamByes | Self::EightTeam => 3,
        }
    }

    /// Seeds that skip the first round.
    pub fn byes(self) -> usize {
        match self {
            Self::SixTeamByes => 2,
            _ => 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeagueSettings {
    pub season: String,
    pub current_week: u32,
    pub playoff_start_week: u32,
    #[serde(default = "default_playoff_teams")]
    pub num_playoff_teams: u32,
    #[serde(default)]
    pub reseeding: bool,
    #[serde(default)]
    pub payouts: Payouts,
    /// Size of the loser-advances bottom bracket (0, 2 or 4).
    #[serde(default)]
    pub last_place_bracket: u32,
    #[serde(default)]
    pub lineup: LineupRules,
    #[serde(default)]
    pub matchup_tie: MatchupTiePolicy,
    #[serde(default)]
    pub bracket_tie_break: BracketTieBreak,
    /// Tie-break for reseeded brackets when it differs from the fixed one.
    #[serde(default)]
    pub reseeded_tie_break: Option<BracketTieBreak>,
    /// Season length used to scale WAR. Defaults to the regular-season week count.
    #[serde(default)]
    pub games_per_season: Option<u32>,
}

fn default_playoff_teams() -> u32 {
    4
}

impl Default for LeagueSettings {
    fn default() -> Self {
        Self {
            season: String::new(),
            current_week: 1,
            playoff_start_week: 15,
            num_playoff_teams: default_playoff_teams(),
            reseeding: false,
            payouts: Payouts::default(),
            last_place_bracket: 0,
            lineup: LineupRules::default(),
            matchup_tie: MatchupTiePolicy::default(),
            bracket_tie_break: BracketTieBreak::default(),
            reseeded_tie_break: None,
            games_per_season: None,
        }
    }
}

impl LeagueSettings {
    pub fn playoff_format(&self) -> Result<PlayoffFormat> {
        PlayoffFormat::from_slots(self.num_playoff_teams)
    }

    /// Tie-break in effect for this league's bracket.
    pub fn effective_tie_break(&self) -> BracketTieBreak {
        match (self.reseeding, self.reseeded_tie_break) {
            (true, Some(rule)) => rule,
            _ => self.bracket_tie_break,
        }
    }
}

// ============================================================================
// League
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct League {
    pub settings: LeagueSettings,
    pub entries: Vec<Entry>,
    pub matchups: Vec<Matchup>,
    /// Unrostered units available to sign.
    #[serde(default)]
    pub free_agents: Vec<Unit>,
}

impl League {
    /// Build and validate a league. Entry ids are reassigned to their index.
    pub fn new(settings: LeagueSettings, entries: Vec<Entry>, matchups: Vec<Matchup>) -> Result<Self> {
        let entries = entries
            .into_iter()
            .enumerate()
            .map(|(i, mut e)| {
                e.id = EntryId(i);
                e
            })
            .collect();
        let league = Self {
            settings,
            entries,
            matchups,
            free_agents: Vec::new(),
        };
        league.validate()?;
        Ok(league)
    }

    pub fn with_free_agents(mut self, free_agents: Vec<Unit>) -> Self {
        self.free_agents = free_agents;
        self
    }

    pub fn free_agent(&self, name: &str) -> Option<&Unit> {
        self.free_agents.iter().find(|u| u.name == name)
    }

    /// Check structural consistency. Called by [`League::new`] and again before
    /// every simulation, since callers may mutate the public fields.
    pub fn validate(&self) -> Result<()> {
        let n = self.entries.len();
        if n < 2 {
            return Err(SimError::NotEnoughEntries { needed: 2, found: n });
        }
        if let Some(e) = self.entries.iter().enumerate().find(|(i, e)| e.id.index() != *i) {
            return Err(SimError::InvalidConfig(format!(
                "entry {} has id {} at position {}",
                e.1.name, e.1.id, e.0
            )));
        }

        let format = self.settings.playoff_format()?;
        if format.teams() > n {
            return Err(SimError::NotEnoughEntries {
                needed: format.teams(),
                found: n,
            });
        }

        let bottom = self.settings.last_place_bracket as usize;
        match bottom {
            0 | 2 | 4 => {}
            other => {
                return Err(SimError::InvalidConfig(format!(
                    "last-place bracket must have 0, 2 or 4 entries, got {other}"
                )))
            }
        }
        if bottom > 0 {
            if bottom > n - format.teams() {
                return Err(SimError::InvalidConfig(format!(
                    "last-place bracket of {bottom} overlaps the {} playoff teams",
                    format.teams()
                )));
            }
            let rounds_needed = if bottom == 4 { 2 } else { 1 };
            if format.rounds() < rounds_needed {
                return Err(SimError::InvalidConfig(format!(
                    "last-place bracket of {bottom} needs {rounds_needed} playoff weeks"
                )));
            }
        }

        let payouts = self.settings.payouts;
        if ![payouts.first, payouts.second, payouts.third]
            .iter()
            .all(|p| p.is_finite())
        {
            return Err(SimError::InvalidConfig("payouts must be finite".into()));
        }

        for m in &self.matchups {
            if m.home.index() >= n || m.away.index() >= n {
                return Err(SimError::UnknownEntry(format!(
                    "matchup in week {} references {} / {}",
                    m.week, m.home, m.away
                )));
            }
            if m.home == m.away {
                return Err(SimError::InvalidConfig(format!(
                    "entry {} plays itself in week {}",
                    m.home, m.week
                )));
            }
            if let Some((h, a)) = m.realized {
                if !h.is_finite() || !a.is_finite() {
                    return Err(SimError::InvalidConfig(format!(
                        "non-finite realized score in week {}",
                        m.week
                    )));
                }
            }
        }
        Ok(())
    }

    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    pub fn entry(&self, id: EntryId) -> Option<&Entry> {
        self.entries.get(id.index())
    }

    pub fn entry_by_name(&self, name: &str) -> Option<&Entry> {
        self.entries.iter().find(|e| e.name == name)
    }

    pub fn entry_id(&self, name: &str) -> Result<EntryId> {
        self.entry_by_name(name)
            .map(|e| e.id)
            .ok_or_else(|| SimError::UnknownEntry(name.to_string()))
    }

    pub fn entry_mut(&mut self, id: EntryId) -> Option<&mut Entry> {
        self.entries.get_mut(id.index())
    }

    /// Every unit in the league, rostered or not.
    pub fn all_units(&self) -> impl Iterator<Item = &Unit> {
        self.entries
            .iter()
            .flat_map(|e| e.roster.iter())
            .chain(self.free_agents.iter())
    }

    /// Every rostered unit with its owner.
    pub fn rostered_units(&self) -> impl Iterator<Item = (EntryId, &Unit)> {
        self.entries
            .iter()
            .flat_map(|e| e.roster.iter().map(move |u| (e.id, u)))
    }

    pub fn regular_season_matchups(&self) -> impl Iterator<Item = &Matchup> {
        let start = self.settings.playoff_start_week;
        self.matchups.iter().filter(move |m| m.week < start)
    }

    /// Recorded bracket games.
    pub fn playoff_results(&self) -> impl Iterator<Item = &Matchup> {
        let start = self.settings.playoff_start_week;
        self.matchups
            .iter()
            .filter(move |m| m.week >= start && m.is_resolved())
    }

    /// Distinct regular-season weeks in the schedule.
    pub fn regular_season_weeks(&self) -> Vec<u32> {
        self.regular_season_matchups()
            .map(|m| m.week)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Weeks in which bracket rounds are played.
    pub fn playoff_weeks(&self) -> Result<Vec<u32>> {
        let rounds = self.settings.playoff_format()?.rounds();
        let start = self.settings.playoff_start_week;
        Ok((start..start + rounds).collect())
    }

    /// Season length used to scale WAR.
    pub fn games_per_season(&self) -> u32 {
        self.settings
            .games_per_season
            .unwrap_or_else(|| self.regular_season_weeks().len() as u32)
    }

    /// Regular-season games that should have been played but carry no score.
    pub fn warn_on_stale_schedule(&self) {
        let current = self.settings.current_week;
        let stale = self
            .regular_season_matchups()
            .filter(|m| m.week < current && !m.is_resolved())
            .count();
        if stale > 0 {
            warn!(
                stale,
                current_week = current,
                "unplayed matchups before the current week will be simulated"
            );
        }
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Name-based builder used by loaders and tests.
#[derive(Debug, Clone, Default)]
pub struct LeagueBuilder {
    settings: LeagueSettings,
    entries: Vec<Entry>,
    matchups: Vec<(u32, String, String, Option<(f64, f64)>)>,
    free_agents: Vec<Unit>,
}

impl LeagueBuilder {
    pub fn new(settings: LeagueSettings) -> Self {
        Self {
            settings,
            entries: Vec::new(),
            matchups: Vec::new(),
            free_agents: Vec::new(),
        }
    }

    pub fn free_agent(mut self, unit: Unit) -> Self {
        self.free_agents.push(unit);
        self
    }

    pub fn entry(mut self, name: &str, roster: Vec<Unit>) -> Self {
        let id = EntryId(self.entries.len());
        self.entries.push(Entry::new(id, name).with_roster(roster));
        self
    }

    pub fn scheduled(mut self, week: u32, home: &str, away: &str) -> Self {
        self.matchups
            .push((week, home.to_string(), away.to_string(), None));
        self
    }

    pub fn played(mut self, week: u32, home: &str, away: &str, home_score: f64, away_score: f64) -> Self {
        self.matchups.push((
            week,
            home.to_string(),
            away.to_string(),
            Some((home_score, away_score)),
        ));
        self
    }

    pub fn build(self) -> Result<League> {
        let lookup = |name: &str| -> Result<EntryId> {
            self.entries
                .iter()
                .find(|e| e.name == name)
                .map(|e| e.id)
                .ok_or_else(|| SimError::UnknownEntry(name.to_string()))
        };
        let mut matchups = Vec::with_capacity(self.matchups.len());
        for (week, home, away, realized) in &self.matchups {
            matchups.push(Matchup {
                week: *week,
                home: lookup(home)?,
                away: lookup(away)?,
                realized: *realized,
            });
        }
        Ok(League::new(self.settings, self.entries, matchups)?.with_free_agents(self.free_agents))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(playoffs: u32) -> LeagueSettings {
        LeagueSettings {
            season: "2024".into(),
            playoff_start_week: 3,
            num_playoff_teams: playoffs,
            ..Default::default()
        }
    }

    #[test]
    fn test_builder_resolves_names() {
        let league = LeagueBuilder::new(settings(0))
            .entry("A", vec![])
            .entry("B", vec![])
            .played(1, "A", "B", 100.0, 90.0)
            .scheduled(2, "B", "A")
            .build()
            .unwrap();
        assert_eq!(league.entry_count(), 2);
        assert_eq!(league.matchups[1].home, EntryId(1));
        assert_eq!(league.regular_season_weeks(), vec![1, 2]);
        assert_eq!(league.games_per_season(), 2);
        assert!(league.free_agents.is_empty());
    }

    #[test]
    fn test_free_agents_included_in_all_units() {
        let league = LeagueBuilder::new(settings(0))
            .entry("A", vec![Unit::new("a1", "RB")])
            .entry("B", vec![Unit::new("b1", "WR")])
            .free_agent(Unit::new("fa", "RB"))
            .build()
            .unwrap();
        assert_eq!(league.all_units().count(), 3);
        assert!(league.free_agent("fa").is_some());
        assert!(league.free_agent("a1").is_none());
    }

    #[test]
    fn test_unknown_entry_rejected() {
        let err = LeagueBuilder::new(settings(0))
            .entry("A", vec![])
            .entry("B", vec![])
            .scheduled(1, "A", "C")
            .build()
            .unwrap_err();
        assert_eq!(err, SimError::UnknownEntry("C".into()));
    }

    #[test]
    fn test_playoff_size_validation() {
        let err = LeagueBuilder::new(settings(5))
            .entry("A", vec![])
            .entry("B", vec![])
            .build()
            .unwrap_err();
        assert_eq!(err, SimError::UnsupportedPlayoffSize { teams: 5 });

        let err = LeagueBuilder::new(settings(4))
            .entry("A", vec![])
            .entry("B", vec![])
            .build()
            .unwrap_err();
        assert_eq!(err, SimError::NotEnoughEntries { needed: 4, found: 2 });
    }

    #[test]
    fn test_last_place_bracket_needs_weeks() {
        let mut s = settings(2);
        s.last_place_bracket = 4;
        let mut builder = LeagueBuilder::new(s);
        for name in ["A", "B", "C", "D", "E", "F"] {
            builder = builder.entry(name, vec![]);
        }
        assert!(matches!(builder.build(), Err(SimError::InvalidConfig(_))));
    }

    #[test]
    fn test_playoff_weeks() {
        let mut s = settings(6);
        s.playoff_start_week = 14;
        let mut builder = LeagueBuilder::new(s);
        for i in 0..8 {
            builder = builder.entry(&format!("T{i}"), vec![]);
        }
        let league = builder.build().unwrap();
        assert_eq!(league.playoff_weeks().unwrap(), vec![14, 15, 16]);
    }

    #[test]
    fn test_settings_deserialize_defaults() {
        let json = r#"{"season":"2024","current_week":5,"playoff_start_week":15}"#;
        let s: LeagueSettings = serde_json::from_str(json).unwrap();
        assert_eq!(s.num_playoff_teams, LeagueSettings::default().num_playoff_teams);
        assert_eq!(s.num_playoff_teams, 4);
        assert!(!s.reseeding);
        assert_eq!(s.matchup_tie, MatchupTiePolicy::HigherSeasonPoints);
        assert_eq!(s.bracket_tie_break, BracketTieBreak::HigherSeed);
        assert!(s.lineup.is_open());
    }

    #[test]
    fn test_reseeded_tie_break_only_applies_when_reseeding() {
        let mut s = settings(6);
        s.reseeded_tie_break = Some(BracketTieBreak::SeasonPoints);
        assert_eq!(s.effective_tie_break(), BracketTieBreak::HigherSeed);
        s.reseeding = true;
        assert_eq!(s.effective_tie_break(), BracketTieBreak::SeasonPoints);
    }
}
