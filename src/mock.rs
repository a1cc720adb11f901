use std::fmt::Display;

use rand::RngCore;

use crate::{
    entity::{EntityId, Pool},
    opponent::{Opponent, Pick},
    session::{Author, GuessRecord},
};

/// An opponent that plays a fixed script of identifiers, one per turn.
#[derive(Debug, Clone)]
pub(crate) struct Mock {
    guesses: Vec<EntityId>,
    panics: bool,
}

impl Mock {
    pub(crate) fn new(guesses: Vec<u32>) -> Self {
        Self {
            guesses: guesses.into_iter().map(EntityId).collect(),
            panics: false,
        }
    }

    pub(crate) fn panicking() -> Self {
        Self {
            guesses: Vec::new(),
            panics: true,
        }
    }
}

impl Opponent for Mock {
    fn choose<'p>(
        &self,
        pool: &'p Pool,
        history: &[GuessRecord],
        _rng: &mut dyn RngCore,
    ) -> Pick<'p> {
        if self.panics {
            panic!("mock opponent asked to panic");
        }

        let turn = history
            .iter()
            .filter(|r| r.author == Author::Opponent)
            .count();
        let id = self.guesses[turn % self.guesses.len()];
        Pick {
            entity: pool.get(id).unwrap(),
            candidates: 1,
            fallback: false,
        }
    }

    fn version(&self) -> &'static str {
        "0.1.0"
    }
}

impl Display for Mock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Mock {:?}", self.guesses)
    }
}
