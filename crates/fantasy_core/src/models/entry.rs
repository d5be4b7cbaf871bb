use super::unit::Unit;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Dense index of an entry inside its [`super::League`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryId(pub usize);

impl EntryId {
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A team / entrant in the league.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub id: EntryId,
    pub name: String,
    /// Ordered roster. Order is the tie-break when lineup slots compare equal.
    pub roster: Vec<Unit>,
}

impl Entry {
    pub fn new(id: EntryId, name: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            roster: Vec::new(),
        }
    }

    pub fn with_roster(mut self, roster: Vec<Unit>) -> Self {
        self.roster = roster;
        self
    }

    pub fn unit_position(&self, name: &str) -> Option<usize> {
        self.roster.iter().position(|u| u.name == name)
    }
}

/// One scheduled game between two entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Matchup {
    pub week: u32,
    pub home: EntryId,
    pub away: EntryId,
    /// `(home, away)` once the week has been played.
    #[serde(default)]
    pub realized: Option<(f64, f64)>,
}

impl Matchup {
    pub fn scheduled(week: u32, home: EntryId, away: EntryId) -> Self {
        Self {
            week,
            home,
            away,
            realized: None,
        }
    }

    pub fn played(week: u32, home: EntryId, away: EntryId, home_score: f64, away_score: f64) -> Self {
        Self {
            week,
            home,
            away,
            realized: Some((home_score, away_score)),
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.realized.is_some()
    }

    pub fn involves(&self, entry: EntryId) -> bool {
        self.home == entry || self.away == entry
    }

    /// Recorded score of `entry` in this game, if played.
    pub fn score_of(&self, entry: EntryId) -> Option<f64> {
        let (home, away) = self.realized?;
        if entry == self.home {
            Some(home)
        } else if entry == self.away {
            Some(away)
        } else {
            None
        }
    }
}
