//! The test harness for running computer opponents headlessly.

use std::{
    ops::Deref,
    panic::{self, AssertUnwindSafe},
    sync::Mutex,
};

use indicatif::ParallelProgressIterator;
use log::{error, info};
use rand::seq::index::sample;
use rayon::prelude::*;

use crate::{
    entity::{Entity, Pool},
    opponent::Opponent,
    perf::{Attempt, Perf},
    session::{Author, Session},
    Summary, WaifudleError,
};

/// A test harness that can run many opponents against many targets.
///
/// Each opponent plays a solo game against every chosen target, guessing
/// until it finds the target or runs out of guesses. Create a harness with
/// [`new()`](Harness::new()) and configure it with the other methods. Note
/// that these configuration methods consume the existing [`Harness`] and
/// return a new one.
///
/// # Examples
///
/// ```rust
/// use waifudle::{opponent::Stupid, Entity, Harness, Pool};
///
/// let pool = Pool::new(vec![
///     Entity::new(1, "Nami").source("One Piece"),
///     Entity::new(2, "Bulma").source("Dragon Ball"),
/// ])?;
///
/// let harness = Harness::new()
///     .quiet()
///     .add_opponent(Box::new(Stupid))
///     .test_num(50);
///
/// let report = harness.run(&pool)?;
/// assert_eq!(report[0].num_tried(), 2);
/// #
/// # Ok::<_, waifudle::WaifudleError>(())
/// ```
#[derive(Debug)]
pub struct Harness {
    opponents: Vec<Box<dyn Opponent>>,
    verbose: bool,
    num_games: Option<usize>,
    baseline: Option<usize>,
    max_guesses: usize,
}

impl Default for Harness {
    fn default() -> Self {
        Harness {
            opponents: Vec::new(),
            verbose: false,
            num_games: Some(100),
            baseline: None,
            max_guesses: 50,
        }
    }
}

impl Harness {
    /// Creates a new test harness with default configuration.
    ///
    /// Defaults:
    /// 1. tests no opponents
    /// 2. quiet mode
    /// 3. plays each opponent against 100 targets chosen at random
    /// 4. gives up on a game after 50 guesses
    /// 5. does not compare against a baseline
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the harness show a progress bar while testing.
    pub fn verbose(self) -> Self {
        Harness {
            verbose: true,
            ..self
        }
    }

    /// Makes the harness silent while testing.
    pub fn quiet(self) -> Self {
        Harness {
            verbose: false,
            ..self
        }
    }

    /// Adds an opponent to the harness for testing.
    pub fn add_opponent(self, opponent: Box<dyn Opponent>) -> Self {
        let mut opponents = self.opponents;
        opponents.push(opponent);
        Harness { opponents, ..self }
    }

    /// Adds a [`Vec`] of opponents to the harness for testing.
    pub fn add_opponents(self, more: Vec<Box<dyn Opponent>>) -> Self {
        let mut opponents = self.opponents;
        opponents.extend(more);
        Harness { opponents, ..self }
    }

    /// Adds an opponent to the harness for testing and sets it as the
    /// baseline for comparison.
    pub fn add_baseline(self, opponent: Box<dyn Opponent>) -> Self {
        self.add_opponent(opponent).and_baseline()
    }

    /// Sets the most recently added opponent as the baseline for comparisons.
    ///
    /// Does nothing if no opponent has been added yet.
    pub fn and_baseline(self) -> Self {
        Self {
            baseline: self.opponents.len().checked_sub(1),
            ..self
        }
    }

    /// Sets the harness to play against every target in the pool.
    pub fn test_all(self) -> Self {
        Harness {
            num_games: None,
            ..self
        }
    }

    /// Sets the harness to play against `n` random targets, or the whole
    /// pool if it is smaller.
    pub fn test_num(self, n: usize) -> Self {
        Harness {
            num_games: Some(n),
            ..self
        }
    }

    /// Sets how many guesses an opponent gets before a game counts as lost.
    pub fn max_guesses(self, max_guesses: usize) -> Self {
        Harness {
            max_guesses: max_guesses.max(1),
            ..self
        }
    }

    /// Runs the harness over `pool` and produces performances for each
    /// opponent.
    ///
    /// The [`Perf`]s will be in the same order as the opponents were added
    /// to the harness.
    pub fn run(&self, pool: &Pool) -> Result<Report, WaifudleError> {
        if self.opponents.is_empty() {
            return Err(WaifudleError::NoOpponentsAdded);
        }

        let perfs = Mutex::new(
            self.opponents
                .iter()
                .map(|o| Perf::new(o.as_ref()))
                .collect::<Vec<_>>(),
        );

        let targets: Vec<usize> = match self.num_games {
            Some(n) => sample(&mut rand::thread_rng(), pool.len(), n.min(pool.len())).into_vec(),
            None => (0..pool.len()).collect(),
        };
        info!(
            "running {} opponents against {} targets",
            self.opponents.len(),
            targets.len()
        );

        if self.verbose {
            targets
                .par_iter()
                .progress_count(targets.len() as u64)
                .for_each(|&i| self.run_inner(pool, &pool[i], &perfs));
        } else {
            targets
                .par_iter()
                .for_each(|&i| self.run_inner(pool, &pool[i], &perfs));
        }

        let perfs = perfs.into_inner().unwrap_or_else(|poisoned| poisoned.into_inner());
        Ok(Report::new(perfs, self.baseline))
    }

    fn run_inner(&self, pool: &Pool, target: &Entity, perfs: &Mutex<Vec<Perf>>) {
        for (i, opponent) in self.opponents.iter().enumerate() {
            let attempt = panic::catch_unwind(AssertUnwindSafe(|| {
                self.solve(opponent.as_ref(), pool, target)
            }))
            .unwrap_or_else(|_| {
                error!("opponent {opponent} panicked on target {target}");
                Attempt {
                    target: target.id,
                    target_name: target.name().to_string(),
                    guesses: self.max_guesses as u32,
                    solved: false,
                    fallbacks: 0,
                }
            });

            let mut perfs = perfs.lock().unwrap();
            perfs[i].tries.push(attempt);
        }
    }

    fn solve(&self, opponent: &dyn Opponent, pool: &Pool, target: &Entity) -> Attempt {
        let mut rng = rand::thread_rng();
        let mut session = Session::solo(target.clone(), Author::Opponent);
        let mut fallbacks = 0;

        while !session.is_over() && session.history().len() < self.max_guesses {
            let pick = opponent.choose(pool, session.history(), &mut rng);
            if pick.fallback {
                fallbacks += 1;
            }
            if let Err(e) = session.submit(Author::Opponent, pick.entity) {
                error!("{opponent} could not guess {}: {e}", pick.entity);
                break;
            }
        }

        Attempt {
            target: target.id,
            target_name: target.name().to_string(),
            guesses: session.history().len() as u32,
            solved: session.winner() == Some(Author::Opponent),
            fallbacks,
        }
    }

    /// Runs the harness (see [`run()`](Harness::run())) and prints performance
    /// summaries of each opponent.
    pub fn run_and_summarize(&self, pool: &Pool) -> Result<Report, WaifudleError> {
        let report = self.run(pool)?;
        for perf in report.iter() {
            println!("{}", perf);
        }
        Ok(report)
    }
}

/// The performances produced by one run of the [`Harness`].
#[derive(Debug, Clone, Default)]
pub struct Report {
    perfs: Vec<Perf>,
    baseline: Option<usize>,
}

impl Deref for Report {
    type Target = [Perf];

    fn deref(&self) -> &Self::Target {
        &self.perfs
    }
}

impl Report {
    fn new(perfs: Vec<Perf>, baseline: impl Into<Option<usize>>) -> Self {
        Self {
            perfs,
            baseline: baseline.into(),
        }
    }

    pub fn baseline(&self) -> Option<&Perf> {
        self.baseline.map(|n| &self.perfs[n])
    }

    /// Prints a summary and histogram for each opponent, compared against
    /// the baseline when there is one.
    pub fn print_report(&self) -> Result<(), WaifudleError> {
        let baseline = self.baseline().map(Perf::to_summary);

        for perf in self.perfs.iter() {
            let summary = perf.to_summary();
            let options = Summary::print_options().histogram(true);
            match &baseline {
                Some(baseline) => match summary.print(options.clone().compare(baseline)) {
                    Ok(()) => {}
                    Err(WaifudleError::SelfComparison) => summary.print(options)?,
                    Err(e) => return Err(e),
                },
                None => summary.print(options)?,
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        entity::test::sample_pool,
        mock::Mock,
        opponent::{Deduction, Stupid},
    };

    #[test]
    fn no_opponents_is_an_error() {
        assert!(matches!(
            Harness::new().run(&sample_pool()),
            Err(WaifudleError::NoOpponentsAdded)
        ));
    }

    #[test]
    fn every_target_is_played() {
        let pool = sample_pool();
        let report = Harness::new()
            .add_opponent(Box::new(Deduction))
            .add_baseline(Box::new(Stupid))
            .test_all()
            .run(&pool)
            .unwrap();

        assert_eq!(report.len(), 2);
        assert_eq!(report.baseline().map(Perf::opponent_name), Some("waifudle::Stupid v1.0.0"));

        let deduction = &report[0];
        assert_eq!(deduction.num_tried() as usize, pool.len());
        assert_eq!(deduction.num_solved(), deduction.num_tried());
        assert_eq!(deduction.fallbacks(), 0);
        assert!(deduction.tries().iter().all(|a| a.guesses as usize <= pool.len()));
    }

    #[test]
    fn sample_size_is_clamped() {
        let report = Harness::new()
            .add_opponent(Box::new(Deduction))
            .test_num(1000)
            .run(&sample_pool())
            .unwrap();
        assert_eq!(report[0].num_tried(), 6);

        let report = Harness::new()
            .add_opponent(Box::new(Deduction))
            .test_num(3)
            .run(&sample_pool())
            .unwrap();
        assert_eq!(report[0].num_tried(), 3);
    }

    #[test]
    fn games_stop_at_the_limit() {
        // always guesses Hinata, so every other target is lost
        let report = Harness::new()
            .add_opponent(Box::new(Mock::new(vec![1])))
            .max_guesses(5)
            .test_all()
            .run(&sample_pool())
            .unwrap();

        let perf = &report[0];
        assert_eq!(perf.num_solved(), 1);
        assert!(perf
            .tries()
            .iter()
            .filter(|a| !a.solved)
            .all(|a| a.guesses == 5));
    }

    #[test]
    fn panicking_opponent_loses() {
        let report = Harness::new()
            .add_opponent(Box::new(Mock::panicking()))
            .add_opponent(Box::new(Deduction))
            .test_num(2)
            .run(&sample_pool())
            .unwrap();

        assert_eq!(report[0].num_solved(), 0);
        assert_eq!(report[0].num_tried(), 2);
        assert_eq!(report[1].num_solved(), 2);
    }
}
