//! Playoff bracket resolution for one trial.
//!
//! ```text
//! Seeded (top N by rank)
//!   -> Round 1      (quarterfinals; seeds 1-2 sit out in six-team brackets)
//!   -> Semifinals
//!   -> Final + Consolation (semifinal losers, decides third)
//! ```
//!
//! Fixed brackets pair winners by bracket slot. With reseeding the
//! survivors are re-paired after every round by original seed, best
//! against worst. Round `r` is played in week `playoff_start_week + r`.
//!
//! The optional last-place bracket runs the same machinery on the bottom of
//! the standings, except the loser advances.

use crate::error::Result;
use crate::models::{BracketTieBreak, EntryId, LeagueSettings, PlayoffFormat};
use serde::{Deserialize, Serialize};

/// Where an entry finished in one trial.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Finish {
    Winner,
    RunnerUp,
    Third,
    /// Made the playoffs, finished outside the top three.
    Eliminated,
    MissedPlayoffs,
}

/// Entry with its seed (1-based regular-season rank).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Seeded {
    pub entry: EntryId,
    pub seed: usize,
}

/// Supplies bracket game scores and regular-season totals for tie-breaks.
pub trait GameSource {
    /// Scores of `a` and `b` when they meet in `week`.
    fn scores(&mut self, week: u32, a: EntryId, b: EntryId) -> (f64, f64);

    fn season_points(&self, entry: EntryId) -> f64;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BracketOutcome {
    pub winner: EntryId,
    pub runner_up: EntryId,
    /// `None` only in two-entry leagues.
    pub third: Option<EntryId>,
    pub last_place: EntryId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BracketResolver {
    format: PlayoffFormat,
    reseeding: bool,
    tie_break: BracketTieBreak,
    start_week: u32,
    last_place_bracket: usize,
}

impl BracketResolver {
    pub fn from_settings(settings: &LeagueSettings) -> Result<Self> {
        Ok(Self {
            format: settings.playoff_format()?,
            reseeding: settings.reseeding,
            tie_break: settings.effective_tie_break(),
            start_week: settings.playoff_start_week,
            last_place_bracket: settings.last_place_bracket as usize,
        })
    }

    pub fn format(&self) -> PlayoffFormat {
        self.format
    }

    /// Resolve placements from a full rank ordering (`standings[0]` is first).
    pub fn resolve<S: GameSource>(&self, standings: &[EntryId], source: &mut S) -> BracketOutcome {
        let (winner, runner_up, third) = self.resolve_top(standings, source);
        let last_place = self.resolve_bottom(standings, source);
        BracketOutcome {
            winner,
            runner_up,
            third,
            last_place,
        }
    }

    fn resolve_top<S: GameSource>(
        &self,
        standings: &[EntryId],
        source: &mut S,
    ) -> (EntryId, EntryId, Option<EntryId>) {
        let seeded: Vec<Seeded> = standings
            .iter()
            .take(self.format.teams())
            .enumerate()
            .map(|(i, &entry)| Seeded { entry, seed: i + 1 })
            .collect();
        let seed = |n: usize| seeded[n - 1];

        // bracket-ordered field for the semifinal round, plus how many
        // rounds have been played to get there
        let (field, round) = match self.format {
            PlayoffFormat::None => {
                return (standings[0], standings[1], standings.get(2).copied());
            }
            PlayoffFormat::Final => {
                let (champion, loser) = self.play(0, seed(1), seed(2), source);
                return (champion.entry, loser.entry, standings.get(2).copied());
            }
            PlayoffFormat::FourTeam => (vec![seed(1), seed(4), seed(2), seed(3)], 0),
            PlayoffFormat::SixTeamByes => {
                let (w45, _) = self.play(0, seed(4), seed(5), source);
                let (w36, _) = self.play(0, seed(3), seed(6), source);
                (vec![seed(1), w45, seed(2), w36], 1)
            }
            PlayoffFormat::EightTeam => {
                let first = [
                    (seed(1), seed(8)),
                    (seed(4), seed(5)),
                    (seed(2), seed(7)),
                    (seed(3), seed(6)),
                ];
                let field: Vec<Seeded> = first
                    .into_iter()
                    .map(|(a, b)| self.play(0, a, b, source).0)
                    .collect();
                (field, 1)
            }
        };

        let semis = self.pairings(field);
        let mut finalists = Vec::with_capacity(2);
        let mut consolation = Vec::with_capacity(2);
        for (a, b) in semis {
            let (w, l) = self.play(round, a, b, source);
            finalists.push(w);
            consolation.push(l);
        }

        let (champion, runner_up) = self.play(round + 1, finalists[0], finalists[1], source);
        let (third, _) = self.play(round + 1, consolation[0], consolation[1], source);
        (champion.entry, runner_up.entry, Some(third.entry))
    }

    /// Loser-advances bracket over the bottom of the standings.
    fn resolve_bottom<S: GameSource>(&self, standings: &[EntryId], source: &mut S) -> EntryId {
        let n = standings.len();
        let ranked = |rank: usize| Seeded {
            entry: standings[rank - 1],
            seed: rank,
        };
        let last_round = self.format.rounds().saturating_sub(1);
        match self.last_place_bracket {
            2 => self.play(last_round, ranked(n - 1), ranked(n), source).1.entry,
            4 => {
                let (_, l1) = self.play(last_round - 1, ranked(n - 3), ranked(n), source);
                let (_, l2) = self.play(last_round - 1, ranked(n - 2), ranked(n - 1), source);
                let (a, b) = if l1.seed < l2.seed { (l1, l2) } else { (l2, l1) };
                self.play(last_round, a, b, source).1.entry
            }
            _ => standings[n - 1],
        }
    }

    /// Semifinal pairs from a bracket-ordered field of four.
    fn pairings(&self, mut field: Vec<Seeded>) -> Vec<(Seeded, Seeded)> {
        if self.reseeding {
            field.sort_by_key(|s| s.seed);
            let last = field.len() - 1;
            (0..field.len() / 2)
                .map(|i| (field[i], field[last - i]))
                .collect()
        } else {
            field.chunks(2).map(|pair| (pair[0], pair[1])).collect()
        }
    }

    /// Play one game; returns `(winner, loser)`.
    fn play<S: GameSource>(&self, round: u32, a: Seeded, b: Seeded, source: &mut S) -> (Seeded, Seeded) {
        let week = self.start_week + round;
        let (sa, sb) = source.scores(week, a.entry, b.entry);
        let a_wins = if sa != sb {
            sa > sb
        } else {
            match self.tie_break {
                BracketTieBreak::HigherSeed => a.seed < b.seed,
                BracketTieBreak::SeasonPoints => {
                    let (pa, pb) = (source.season_points(a.entry), source.season_points(b.entry));
                    if pa != pb {
                        pa > pb
                    } else {
                        a.seed < b.seed
                    }
                }
            }
        };
        if a_wins {
            (a, b)
        } else {
            (b, a)
        }
    }
}
