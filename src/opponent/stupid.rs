//! A single bad opponent to compare the others against.

use std::fmt::Display;

use rand::RngCore;

use crate::{
    entity::Pool,
    opponent::{Opponent, Pick},
    session::GuessRecord,
};

/// An opponent that ignores every verdict and guesses at random.
///
/// This exists as a baseline for the [test harness](crate::Harness).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Stupid;

impl Opponent for Stupid {
    fn choose<'p>(
        &self,
        pool: &'p Pool,
        _history: &[GuessRecord],
        rng: &mut dyn RngCore,
    ) -> Pick<'p> {
        Pick {
            entity: pool.random(rng),
            candidates: pool.len(),
            fallback: false,
        }
    }

    fn version(&self) -> &'static str {
        "1.0.0"
    }
}

impl Display for Stupid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "waifudle::Stupid")
    }
}
