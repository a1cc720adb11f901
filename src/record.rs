//! Facts about finished games, for whatever keeps the global record.
//!
//! Nothing here performs IO. A finished [`Outcome`] is turned into
//! [`Fact`]s, and a [`RecordStore`] is what the surrounding application
//! persists them with.

use std::{sync::Mutex, time::SystemTime};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    session::{Author, Mode, Outcome},
    Result,
};

/// The best score a record holds before anybody has set one.
pub const UNSET_SCORE: u32 = 999;

/// The holder name shown before anybody has set a record.
pub const NOBODY: &str = "Personne";

/// Longest holder name kept, in characters.
pub const HOLDER_NAME_LEN: usize = 15;

/// The single, global record row.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
pub struct GlobalRecord {
    pub global_wins: u64,
    pub best_score: u32,
    pub holder_name: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub recorded_at: Option<SystemTime>,
}

impl Default for GlobalRecord {
    fn default() -> Self {
        GlobalRecord {
            global_wins: 0,
            best_score: UNSET_SCORE,
            holder_name: NOBODY.to_string(),
            recorded_at: None,
        }
    }
}

impl GlobalRecord {
    /// Returns true if `score` is at least as good as the current best, or
    /// if no best has been set yet.
    pub fn is_beaten_by(&self, score: u32) -> bool {
        self.best_score == UNSET_SCORE || score <= self.best_score
    }

    /// Returns the record with `fact` applied.
    pub fn apply(self, fact: &Fact, now: SystemTime) -> Self {
        match fact {
            Fact::Win { .. } => GlobalRecord {
                global_wins: self.global_wins + 1,
                ..self
            },
            Fact::NewBest { holder, score } => GlobalRecord {
                best_score: *score,
                holder_name: holder.clone(),
                recorded_at: Some(now),
                ..self
            },
        }
    }
}

/// Something a record store should persist.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Fact {
    /// A game was won by `author` in `guesses` guesses.
    Win { author: Author, guesses: u32 },

    /// `holder` set a new best score.
    NewBest { holder: String, score: u32 },
}

/// A best score waiting for its holder to give a name.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RecordClaim {
    pub score: u32,
}

impl RecordClaim {
    /// Names the holder, keeping at most [`HOLDER_NAME_LEN`] characters.
    pub fn with_holder(self, name: &str) -> Fact {
        Fact::NewBest {
            holder: name.trim().chars().take(HOLDER_NAME_LEN).collect(),
            score: self.score,
        }
    }
}

/// Works out what a finished game means for the global record.
///
/// Only player wins are counted. Only classic games can claim a best score,
/// and they do when the score beats `current`, or when there is no record
/// row at all.
///
/// # Examples
///
/// ```rust
/// use waifudle::{
///     record::{facts_for, Fact, GlobalRecord},
///     session::{Mode, Outcome},
///     Author,
/// };
///
/// let outcome = Outcome {
///     mode: Mode::Classic,
///     winner: Author::Player,
///     guesses: 4,
///     winner_guesses: 4,
/// };
/// let current = GlobalRecord { best_score: 5, ..GlobalRecord::default() };
///
/// let (facts, claim) = facts_for(&outcome, Some(&current));
/// assert_eq!(facts, [Fact::Win { author: Author::Player, guesses: 4 }]);
///
/// let new_best = claim.unwrap().with_holder("A very long holder name");
/// assert_eq!(
///     new_best,
///     Fact::NewBest { holder: "A very long hol".to_string(), score: 4 }
/// );
/// ```
pub fn facts_for(
    outcome: &Outcome,
    current: Option<&GlobalRecord>,
) -> (Vec<Fact>, Option<RecordClaim>) {
    if outcome.winner != Author::Player {
        return (Vec::new(), None);
    }

    let score = outcome.winner_guesses as u32;
    let facts = vec![Fact::Win {
        author: outcome.winner,
        guesses: score,
    }];

    let claim = match (outcome.mode, current) {
        (Mode::Duel, _) => None,
        (Mode::Classic, None) => Some(RecordClaim { score }),
        (Mode::Classic, Some(record)) => {
            record.is_beaten_by(score).then(|| RecordClaim { score })
        }
    };

    (facts, claim)
}

/// Persists the global record.
///
/// Implementations are expected to be slow or remote; callers hand facts
/// over and carry on.
pub trait RecordStore {
    /// Reads the current record, if one exists yet.
    fn current(&self) -> Result<Option<GlobalRecord>>;

    /// Persists one fact.
    fn record(&self, fact: &Fact) -> Result<()>;
}

/// A [`RecordStore`] that keeps the record in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Option<GlobalRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RecordStore for MemoryStore {
    fn current(&self) -> Result<Option<GlobalRecord>> {
        Ok(self.inner.lock().unwrap().clone())
    }

    fn record(&self, fact: &Fact) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        let record = inner.take().unwrap_or_default();
        *inner = Some(record.apply(fact, SystemTime::now()));
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn outcome(mode: Mode, winner: Author, winner_guesses: usize) -> Outcome {
        Outcome {
            mode,
            winner,
            guesses: winner_guesses * 2,
            winner_guesses,
        }
    }

    #[test]
    fn opponent_wins_are_not_counted() {
        let (facts, claim) = facts_for(&outcome(Mode::Duel, Author::Opponent, 3), None);
        assert!(facts.is_empty());
        assert!(claim.is_none());
    }

    #[test]
    fn duel_wins_count_but_never_claim() {
        let (facts, claim) = facts_for(&outcome(Mode::Duel, Author::Player, 1), None);
        assert_eq!(
            facts,
            [Fact::Win {
                author: Author::Player,
                guesses: 1
            }]
        );
        assert!(claim.is_none());
    }

    #[test]
    fn claims_follow_the_current_best() {
        let classic = outcome(Mode::Classic, Author::Player, 6);

        assert!(facts_for(&classic, None).1.is_some());
        assert!(facts_for(&classic, Some(&GlobalRecord::default())).1.is_some());

        let tied = GlobalRecord {
            best_score: 6,
            ..GlobalRecord::default()
        };
        assert_eq!(facts_for(&classic, Some(&tied)).1, Some(RecordClaim { score: 6 }));

        let better = GlobalRecord {
            best_score: 5,
            ..GlobalRecord::default()
        };
        assert!(facts_for(&classic, Some(&better)).1.is_none());
    }

    #[test]
    fn memory_store_accumulates() {
        let store = MemoryStore::new();
        assert_eq!(store.current().unwrap(), None);

        let win = Fact::Win {
            author: Author::Player,
            guesses: 3,
        };
        store.record(&win).unwrap();
        store.record(&win).unwrap();
        store
            .record(&RecordClaim { score: 3 }.with_holder("  Tester  "))
            .unwrap();

        let record = store.current().unwrap().unwrap();
        assert_eq!(record.global_wins, 2);
        assert_eq!(record.best_score, 3);
        assert_eq!(record.holder_name, "Tester");
        assert!(record.recorded_at.is_some());
    }
}
