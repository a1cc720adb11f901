#![doc = include_str!("../README.md")]

// Required to rename serde
#[cfg(feature = "serde")]
extern crate serde_crate as serde;

use thiserror::Error;

pub mod entity;
pub use entity::{Entity, EntityId, Pool};

pub mod source;
pub use source::CandidateSource;

pub mod verdict;
pub use verdict::{compare, Grade, Verdict};

pub mod opponent;
pub use opponent::Opponent;

pub mod session;
pub use session::{Author, Session};

#[cfg(feature = "serde")]
pub mod snapshot;

pub mod game;
pub use game::Game;

pub mod record;

#[cfg(feature = "harness")]
pub mod harness;
#[cfg(feature = "harness")]
pub use harness::Harness;

#[cfg(feature = "harness")]
pub mod perf;
#[cfg(feature = "harness")]
pub use perf::{Perf, Summary};

#[cfg(test)]
mod mock;

pub type Result<T, E = WaifudleError> = std::result::Result<T, E>;

/// The errors that `waifudle` can produce.
#[derive(Debug, Error)]
pub enum WaifudleError {
    #[error("candidate pool error")]
    Pool {
        #[from]
        kind: PoolError,
    },

    #[error("session rejected the request")]
    Session {
        #[from]
        kind: SessionError,
    },

    #[error("general IO error")]
    Io(#[from] std::io::Error),

    #[cfg(feature = "serde")]
    #[error("trouble serializing or deserializing")]
    Serde(#[from] serde_json::Error),

    #[error("no opponents have been added to the harness")]
    NoOpponentsAdded,

    #[error("cannot compare an opponent with itself")]
    SelfComparison,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PoolError {
    /// A pool cannot be built from zero entities.
    #[error("the candidate pool is empty")]
    Empty,

    /// An entity from a candidate source lacks what the game needs to show
    /// it or tell it apart from the others.
    #[error("entity #{index} is malformed: {reason}")]
    MalformedEntity { index: usize, reason: String },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    /// Guesses are only accepted while the session is playing.
    #[error("the session is not accepting guesses")]
    NotPlaying,

    /// The other side holds the turn.
    #[error("it is not the turn of the {0}")]
    NotYourTurn(Author),

    /// A guess is still being revealed, so nothing else may be submitted.
    #[error("another guess is still being processed")]
    Busy,

    /// The session already left the rules screen.
    #[error("the session has already started")]
    AlreadyStarted,

    /// A scheduled opponent turn belongs to a session that has since been
    /// reset.
    #[error("the scheduled turn belongs to a previous session")]
    Stale,

    /// The guess names an identifier outside the candidate pool.
    #[error("no entity with id {0} in the pool")]
    UnknownEntity(EntityId),
}
