//! Tools for defining computer opponents, and the deduction engine itself.

use std::fmt::{Debug, Display};

use log::{debug, warn};
use rand::RngCore;

use crate::{
    entity::{Entity, Pool},
    session::GuessRecord,
    verdict::compare,
};

pub mod stupid;
pub use stupid::Stupid;

/// An opponent's choice of guess.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Pick<'p> {
    /// The entity to guess.
    pub entity: &'p Entity,

    /// How many candidates the opponent chose among.
    pub candidates: usize,

    /// Set when the opponent could not narrow the pool and fell back to a
    /// uniform choice over all of it. This should never happen in a correct
    /// game and is logged as a warning whenever it does.
    pub fallback: bool,
}

/// Trait defining a computer opponent.
///
/// Opponents receive the whole candidate pool and the current history every
/// time it is their turn, and never keep state between turns.
///
/// # How to implement
///
/// ```rust
/// use std::fmt::Display;
///
/// use rand::RngCore;
/// use waifudle::{
///     opponent::{Opponent, Pick},
///     session::GuessRecord,
///     Pool,
/// };
///
/// #[derive(Debug)]
/// struct AlwaysFirst;
///
/// impl Display for AlwaysFirst {
///     fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
///         write!(f, "AlwaysFirst")
///     }
/// }
///
/// impl Opponent for AlwaysFirst {
///     fn choose<'p>(
///         &self,
///         pool: &'p Pool,
///         _history: &[GuessRecord],
///         _rng: &mut dyn RngCore,
///     ) -> Pick<'p> {
///         Pick {
///             entity: &pool[0],
///             candidates: 1,
///             fallback: false,
///         }
///     }
///
///     fn version(&self) -> &'static str {
///         "0.1.0"
///     }
/// }
/// ```
pub trait Opponent: Display + Debug + Sync {
    /// Chooses the next guess given everything guessed so far.
    fn choose<'p>(
        &self,
        pool: &'p Pool,
        history: &[GuessRecord],
        rng: &mut dyn RngCore,
    ) -> Pick<'p>;

    /// Provides a version for this opponent.
    ///
    /// Change this whenever the logic changes so that harness reports stay
    /// meaningful.
    fn version(&self) -> &'static str;
}

/// Returns the entities of `pool` that could still be the target.
///
/// A candidate survives if replaying every guess of `history` against it
/// reproduces the recorded verdict on every
/// [tracked](crate::verdict::Attribute::TRACKED) attribute. Adding to
/// `history` can only ever remove candidates.
///
/// # Examples
///
/// ```rust
/// use waifudle::{opponent::filter_consistent, session::Session, Author, Entity, Pool};
///
/// let pool = Pool::new(vec![
///     Entity::new(1, "Nami").source("One Piece").age(20.),
///     Entity::new(2, "Robin").source("One Piece").age(30.),
///     Entity::new(3, "Bulma").source("Dragon Ball").age(16.),
/// ])?;
///
/// let mut session = Session::classic(pool[1].clone());
/// session.submit(Author::Player, &pool[0])?;
///
/// let left = filter_consistent(&pool, session.history());
/// assert_eq!(left.len(), 1);
/// assert_eq!(left[0].name(), "Robin");
/// #
/// # Ok::<_, waifudle::WaifudleError>(())
/// ```
pub fn filter_consistent<'p>(pool: &'p [Entity], history: &[GuessRecord]) -> Vec<&'p Entity> {
    pool.iter()
        .filter(|candidate| {
            history.iter().all(|record| {
                compare(&record.entity, candidate).is_consistent_with(&record.verdict)
            })
        })
        .collect()
}

/// Picks uniformly over the whole pool, flagging the pick as a fallback.
pub fn fallback_pick<'p>(pool: &'p Pool, rng: &mut dyn RngCore, reason: &str) -> Pick<'p> {
    warn!(
        "opponent fell back to a random pick over {} entities: {reason}",
        pool.len()
    );
    Pick {
        entity: pool.random(rng),
        candidates: pool.len(),
        fallback: true,
    }
}

/// The versus-mode opponent.
///
/// Each turn it discards every entity that contradicts a verdict seen so far
/// and guesses uniformly among what is left. It is not trying to play
/// optimally, only plausibly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Deduction;

impl Opponent for Deduction {
    fn choose<'p>(
        &self,
        pool: &'p Pool,
        history: &[GuessRecord],
        rng: &mut dyn RngCore,
    ) -> Pick<'p> {
        let candidates = filter_consistent(pool, history);
        let entity = match pool.random_among(&candidates, rng) {
            Some(entity) => entity,
            None => {
                return fallback_pick(pool, rng, "no candidate is consistent with the history")
            }
        };

        debug!(
            "{} possibilities left after {} guesses",
            candidates.len(),
            history.len()
        );
        Pick {
            entity,
            candidates: candidates.len(),
            fallback: false,
        }
    }

    fn version(&self) -> &'static str {
        "1.0.0"
    }
}

impl Display for Deduction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "waifudle::Deduction")
    }
}
