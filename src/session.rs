//! One playthrough: the secret target, the guesses made so far, and whose
//! turn it is.

use std::{collections::HashSet, fmt::Display};

use log::{debug, info};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    entity::{Entity, EntityId},
    verdict::{compare, Verdict},
    SessionError,
};

/// Who made a guess.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug, Hash, Default)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate", rename_all = "lowercase")
)]
pub enum Author {
    #[default]
    Player,
    #[cfg_attr(feature = "serde", serde(alias = "computer"))]
    Opponent,
}

impl Author {
    /// The other side of a duel.
    pub fn other(self) -> Self {
        match self {
            Author::Player => Author::Opponent,
            Author::Opponent => Author::Player,
        }
    }
}

impl Display for Author {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Author::Player => write!(f, "player"),
            Author::Opponent => write!(f, "opponent"),
        }
    }
}

/// Which game is being played.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug, Hash, Default)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate", rename_all = "lowercase")
)]
pub enum Mode {
    /// A single side guesses until it finds the target.
    #[default]
    Classic,

    /// The player and the opponent take turns against the same target.
    Duel,
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate", rename_all = "lowercase")
)]
pub enum Phase {
    /// Waiting for the duel to be started by choosing who goes first.
    Rules,
    Playing,
    GameOver,
}

/// A unique identifier for a [`GuessRecord`].
///
/// Serials increase monotonically over the lifetime of a [`Session`],
/// restarts included.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
pub struct RecordId {
    pub entity: EntityId,
    pub serial: u64,
}

impl Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.entity, self.serial)
    }
}

/// One guess and the verdict it earned against the true target.
#[derive(Clone, Debug, PartialEq)]
pub struct GuessRecord {
    pub id: RecordId,
    /// Position in the history, starting at zero.
    pub seq: usize,
    pub author: Author,
    pub entity: Entity,
    pub verdict: Verdict,
}

/// The facts of a finished game, ready to be persisted by a record store.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Outcome {
    pub mode: Mode,
    pub winner: Author,
    /// Every guess made in the game, by either side.
    pub guesses: usize,
    /// The guesses made by the winner alone.
    pub winner_guesses: usize,
}

/// The state of one playthrough.
///
/// The target is fixed when the session is created. Guesses are appended to
/// the history one at a time through [`submit()`](Session::submit()), which
/// scores the guess, records it and checks for a win before returning, so
/// no other guess can interleave with it.
///
/// # Examples
///
/// ```rust
/// use waifudle::{session::Phase, Author, Entity, Session, SessionError};
///
/// let target = Entity::new(1, "Nami").source("One Piece");
/// let miss = Entity::new(2, "Robin").source("One Piece");
///
/// let mut duel = Session::duel(target.clone());
/// assert_eq!(duel.phase(), Phase::Rules);
/// duel.start(Author::Opponent)?;
///
/// assert_eq!(
///     duel.submit(Author::Player, &miss).unwrap_err(),
///     SessionError::NotYourTurn(Author::Player)
/// );
/// duel.submit(Author::Opponent, &miss)?;
/// duel.submit(Author::Player, &target)?;
///
/// assert_eq!(duel.winner(), Some(Author::Player));
/// assert_eq!(duel.phase(), Phase::GameOver);
/// #
/// # Ok::<_, waifudle::WaifudleError>(())
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct Session {
    mode: Mode,
    target: Entity,
    history: Vec<GuessRecord>,
    phase: Phase,
    turn: Author,
    winner: Option<Author>,
    next_serial: u64,
}

impl Session {
    /// Creates a classic session for the player.
    pub fn classic(target: Entity) -> Self {
        Self::solo(target, Author::Player)
    }

    /// Creates a classic session in which `solver` makes every guess.
    pub fn solo(target: Entity, solver: Author) -> Self {
        Session {
            mode: Mode::Classic,
            target,
            history: Vec::new(),
            phase: Phase::Playing,
            turn: solver,
            winner: None,
            next_serial: 0,
        }
    }

    /// Creates a duel waiting on the rules screen.
    pub fn duel(target: Entity) -> Self {
        Session {
            mode: Mode::Duel,
            target,
            history: Vec::new(),
            phase: Phase::Rules,
            turn: Author::Player,
            winner: None,
            next_serial: 0,
        }
    }

    pub(crate) fn from_parts(
        mode: Mode,
        target: Entity,
        history: Vec<GuessRecord>,
        phase: Phase,
        turn: Author,
        winner: Option<Author>,
    ) -> Self {
        let next_serial = history
            .iter()
            .map(|r| r.id.serial + 1)
            .max()
            .unwrap_or(0);
        Session {
            mode,
            target,
            history,
            phase,
            turn,
            winner,
            next_serial,
        }
    }

    /// Leaves the rules screen with `first` to play.
    pub fn start(&mut self, first: Author) -> Result<(), SessionError> {
        if self.phase != Phase::Rules {
            return Err(SessionError::AlreadyStarted);
        }
        info!("duel started, {first} goes first");
        self.phase = Phase::Playing;
        self.turn = first;
        Ok(())
    }

    /// Scores `guess`, appends it to the history, and checks for a win.
    ///
    /// Only the side holding the turn may guess, and only while playing.
    pub fn submit(&mut self, author: Author, guess: &Entity) -> Result<&GuessRecord, SessionError> {
        if self.phase != Phase::Playing {
            return Err(SessionError::NotPlaying);
        }
        if author != self.turn {
            return Err(SessionError::NotYourTurn(author));
        }

        let record = GuessRecord {
            id: RecordId {
                entity: guess.id,
                serial: self.next_serial,
            },
            seq: self.history.len(),
            author,
            entity: guess.clone(),
            verdict: compare(guess, &self.target),
        };
        self.next_serial += 1;
        debug!("{author} guessed {guess}: {}", record.verdict);
        self.history.push(record);

        if guess.id == self.target.id {
            info!(
                "{author} found {} after {} guesses",
                self.target,
                self.history.len()
            );
            self.phase = Phase::GameOver;
            self.winner = Some(author);
        } else if self.mode == Mode::Duel {
            self.turn = author.other();
        }

        Ok(&self.history[self.history.len() - 1])
    }

    /// Starts over against `target`, discarding the history.
    pub fn restart(&mut self, target: Entity) {
        self.target = target;
        self.history.clear();
        self.winner = None;
        match self.mode {
            Mode::Classic => self.phase = Phase::Playing,
            Mode::Duel => {
                self.phase = Phase::Rules;
                self.turn = Author::Player;
            }
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn target(&self) -> &Entity {
        &self.target
    }

    pub fn history(&self) -> &[GuessRecord] {
        &self.history
    }

    /// The guesses made by `author`.
    pub fn guesses_by(&self, author: Author) -> impl Iterator<Item = &GuessRecord> {
        self.history.iter().filter(move |r| r.author == author)
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// The side that may guess next.
    pub fn turn(&self) -> Author {
        self.turn
    }

    pub fn winner(&self) -> Option<Author> {
        self.winner
    }

    pub fn is_over(&self) -> bool {
        self.phase == Phase::GameOver
    }

    /// Identifiers guessed so far, by either side.
    pub fn used_ids(&self) -> HashSet<EntityId> {
        self.history.iter().map(|r| r.entity.id).collect()
    }

    /// The result of the game, once somebody has won.
    pub fn outcome(&self) -> Option<Outcome> {
        let winner = self.winner?;
        Some(Outcome {
            mode: self.mode,
            winner,
            guesses: self.history.len(),
            winner_guesses: self.history.iter().filter(|r| r.author == winner).count(),
        })
    }
}
