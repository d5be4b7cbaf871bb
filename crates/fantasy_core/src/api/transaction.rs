//! Roster mutations applied to a league snapshot.
//!
//! Every variant checks all the names it touches before moving anything,
//! so a failed mutation leaves the league untouched.

use crate::error::{Result, SimError};
use crate::models::{EntryId, League, Unit};
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use std::fmt;

const FREE_AGENTS: &str = "free agents";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RosterMutation {
    /// Move a free agent onto a roster.
    Add { entry: String, unit: String },
    /// Release a rostered unit to the free-agent pool.
    Drop { entry: String, unit: String },
    /// Drop then add in one move.
    Swap { entry: String, drop: String, add: String },
    /// Put a unit that is not in the league yet onto a roster.
    Sign { entry: String, unit: Unit },
    /// Exchange units between two rosters.
    Trade {
        from: String,
        to: String,
        give: Vec<String>,
        receive: Vec<String>,
    },
}

impl RosterMutation {
    pub fn add(entry: &str, unit: &str) -> Self {
        Self::Add {
            entry: entry.to_string(),
            unit: unit.to_string(),
        }
    }

    pub fn drop(entry: &str, unit: &str) -> Self {
        Self::Drop {
            entry: entry.to_string(),
            unit: unit.to_string(),
        }
    }

    pub fn swap(entry: &str, drop: &str, add: &str) -> Self {
        Self::Swap {
            entry: entry.to_string(),
            drop: drop.to_string(),
            add: add.to_string(),
        }
    }

    pub fn trade(from: &str, to: &str, give: &[&str], receive: &[&str]) -> Self {
        Self::Trade {
            from: from.to_string(),
            to: to.to_string(),
            give: give.iter().map(|s| s.to_string()).collect(),
            receive: receive.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Apply to `league` in place.
    pub fn apply(&self, league: &mut League) -> Result<()> {
        match self {
            Self::Add { entry, unit } => {
                let id = league.entry_id(entry)?;
                let pos = free_agent_position(league, unit)?;
                let signed = league.free_agents.remove(pos);
                roster_mut(league, id).push(signed);
            }
            Self::Drop { entry, unit } => {
                let id = league.entry_id(entry)?;
                let pos = roster_position(league, id, unit)?;
                let released = roster_mut(league, id).remove(pos);
                league.free_agents.push(released);
            }
            Self::Swap { entry, drop, add } => {
                let id = league.entry_id(entry)?;
                let drop_pos = roster_position(league, id, drop)?;
                let add_pos = free_agent_position(league, add)?;
                let signed = league.free_agents.remove(add_pos);
                let released = std::mem::replace(&mut roster_mut(league, id)[drop_pos], signed);
                league.free_agents.push(released);
            }
            Self::Sign { entry, unit } => {
                let id = league.entry_id(entry)?;
                roster_mut(league, id).push(unit.clone());
            }
            Self::Trade {
                from,
                to,
                give,
                receive,
            } => {
                let from_id = league.entry_id(from)?;
                let to_id = league.entry_id(to)?;
                if from_id == to_id {
                    return Err(SimError::InvalidConfig(format!("{from} cannot trade with itself")));
                }
                reject_repeats(from, give)?;
                reject_repeats(to, receive)?;
                for name in give {
                    roster_position(league, from_id, name)?;
                }
                for name in receive {
                    roster_position(league, to_id, name)?;
                }
                let outgoing = take_units(roster_mut(league, from_id), give);
                let incoming = take_units(roster_mut(league, to_id), receive);
                roster_mut(league, from_id).extend(incoming);
                roster_mut(league, to_id).extend(outgoing);
            }
        }
        Ok(())
    }
}

impl fmt::Display for RosterMutation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Add { entry, unit } => write!(f, "{entry} adds {unit}"),
            Self::Drop { entry, unit } => write!(f, "{entry} drops {unit}"),
            Self::Swap { entry, drop, add } => write!(f, "{entry} drops {drop} for {add}"),
            Self::Sign { entry, unit } => write!(f, "{entry} signs {}", unit.name),
            Self::Trade {
                from,
                to,
                give,
                receive,
            } => write!(
                f,
                "{from} trades [{}] to {to} for [{}]",
                give.join(", "),
                receive.join(", ")
            ),
        }
    }
}

fn roster_mut(league: &mut League, id: EntryId) -> &mut Vec<Unit> {
    &mut league.entries[id.index()].roster
}

fn roster_position(league: &League, id: EntryId, unit: &str) -> Result<usize> {
    let entry = &league.entries[id.index()];
    entry.unit_position(unit).ok_or_else(|| SimError::UnknownUnit {
        entry: entry.name.clone(),
        unit: unit.to_string(),
    })
}

fn free_agent_position(league: &League, unit: &str) -> Result<usize> {
    league
        .free_agents
        .iter()
        .position(|u| u.name == unit)
        .ok_or_else(|| SimError::UnknownUnit {
            entry: FREE_AGENTS.to_string(),
            unit: unit.to_string(),
        })
}

/// Remove the named units, keeping the order they were asked for.
/// Each unit can move at most once per trade.
fn reject_repeats(entry: &str, names: &[String]) -> Result<()> {
    let mut seen = FxHashSet::default();
    match names.iter().find(|name| !seen.insert(name.as_str())) {
        Some(name) => Err(SimError::InvalidConfig(format!(
            "{entry} lists {name} more than once in a trade"
        ))),
        None => Ok(()),
    }
}

fn take_units(roster: &mut Vec<Unit>, names: &[String]) -> Vec<Unit> {
    names
        .iter()
        .filter_map(|name| {
            let pos = roster.iter().position(|u| &u.name == name)?;
            Some(roster.remove(pos))
        })
        .collect()
}
