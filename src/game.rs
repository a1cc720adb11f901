//! Driving a session in real time.
//!
//! A [`Session`] on its own is instantaneous. A [`Game`] layers the pacing of
//! the real thing on top of it: every guess is revealed over a fixed window
//! during which nothing else may be submitted, and the opponent waits out a
//! thinking delay before it plays. Time only moves when the caller says so
//! through [`advance()`](Game::advance()), so the game never acts behind the
//! caller's back.
//!
//! Opponent turns are scheduled as [`Ticket`]s. Restarting the game bumps an
//! epoch, which makes every ticket handed out before the restart stale.

use std::{
    collections::HashSet,
    panic::{self, AssertUnwindSafe},
    time::Duration,
};

use log::{debug, error, info, warn};
use rand::{rngs::StdRng, SeedableRng};

use crate::{
    entity::{Entity, EntityId, Pool, SUGGESTIONS},
    opponent::{fallback_pick, Opponent},
    session::{Author, GuessRecord, Outcome, Phase, RecordId, Session},
    SessionError,
};

/// How long a guess takes to be revealed.
pub const REVEAL_DELAY: Duration = Duration::from_millis(3500);

/// How long the opponent waits before guessing.
pub const THINK_DELAY: Duration = Duration::from_millis(2000);

/// The right to play one scheduled opponent turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Ticket {
    epoch: u64,
    seq: usize,
}

/// Something that happened while time advanced.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// A reveal finished and `0` now holds the turn.
    TurnPassed(Author),

    /// The opponent was scheduled to play.
    OpponentThinking(Ticket),

    /// The opponent guessed.
    Guessed { id: RecordId, author: Author },

    /// The winning guess finished revealing.
    GameOver(Outcome),
}

#[derive(Clone, Copy, Debug)]
struct Pending {
    ticket: Ticket,
    remaining: Duration,
}

/// A classic game or a duel against a computer opponent, paced in time.
///
/// # Examples
///
/// ```rust
/// use std::time::Duration;
///
/// use waifudle::{
///     game::{Event, Game},
///     opponent::Deduction,
///     Author, Entity, Pool,
/// };
///
/// let pool = Pool::new(vec![
///     Entity::new(1, "Nami").source("One Piece").age(20.),
///     Entity::new(2, "Robin").source("One Piece").age(30.),
/// ])?;
///
/// let mut game = Game::duel(pool, Box::new(Deduction)).seed(7);
/// game.start(Author::Opponent)?;
///
/// let events = game.advance(Duration::from_secs(2));
/// assert!(matches!(events[0], Event::OpponentThinking(_)));
/// assert!(matches!(
///     events[1],
///     Event::Guessed { author: Author::Opponent, .. }
/// ));
/// assert_eq!(game.session().history().len(), 1);
/// #
/// # Ok::<_, waifudle::WaifudleError>(())
/// ```
#[derive(Debug)]
pub struct Game {
    pool: Pool,
    session: Session,
    opponent: Option<Box<dyn Opponent>>,
    rng: StdRng,
    reveal_delay: Duration,
    think_delay: Duration,
    epoch: u64,
    reveal: Option<Duration>,
    pending: Option<Pending>,
}

impl Game {
    /// Creates a classic game for the player against a random target.
    pub fn classic(pool: Pool) -> Self {
        let mut rng = StdRng::from_entropy();
        let session = Session::classic(pool.random(&mut rng).clone());
        Self::new(pool, session, None, rng)
    }

    /// Creates a duel between the player and `opponent`, waiting on the
    /// rules screen.
    pub fn duel(pool: Pool, opponent: Box<dyn Opponent>) -> Self {
        let mut rng = StdRng::from_entropy();
        let session = Session::duel(pool.random(&mut rng).clone());
        Self::new(pool, session, Some(opponent), rng)
    }

    /// Resumes a saved session.
    ///
    /// Without an `opponent`, any opponent turns in the session are played
    /// by a random pick over the pool.
    pub fn resume(pool: Pool, session: Session, opponent: Option<Box<dyn Opponent>>) -> Self {
        Self::new(pool, session, opponent, StdRng::from_entropy())
    }

    fn new(pool: Pool, session: Session, opponent: Option<Box<dyn Opponent>>, rng: StdRng) -> Self {
        Game {
            pool,
            session,
            opponent,
            rng,
            reveal_delay: REVEAL_DELAY,
            think_delay: THINK_DELAY,
            epoch: 0,
            reveal: None,
            pending: None,
        }
    }

    /// Reseeds the game and draws a new target from the seed.
    ///
    /// This restarts the game, so call it before playing.
    pub fn seed(self, seed: u64) -> Self {
        let mut game = Game {
            rng: StdRng::seed_from_u64(seed),
            ..self
        };
        game.restart();
        game
    }

    /// Sets how long each guess takes to reveal.
    pub fn reveal_delay(self, reveal_delay: Duration) -> Self {
        Game {
            reveal_delay,
            ..self
        }
    }

    /// Sets how long the opponent waits before guessing.
    pub fn think_delay(self, think_delay: Duration) -> Self {
        Game {
            think_delay,
            ..self
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn pool(&self) -> &Pool {
        &self.pool
    }

    /// Returns true while a guess is being revealed.
    pub fn revealing(&self) -> bool {
        self.reveal.is_some()
    }

    /// Returns true if the opponent may be scheduled right now.
    ///
    /// A game resumed without an opponent still schedules its turns; they
    /// are played by a random pick over the pool.
    pub fn ready(&self) -> bool {
        self.session.phase() == Phase::Playing
            && self.session.turn() == Author::Opponent
            && !self.revealing()
    }

    /// Leaves the rules screen with `first` to play.
    pub fn start(&mut self, first: Author) -> Result<(), SessionError> {
        self.session.start(first)
    }

    /// Suggests entities for the player to guess, skipping any already
    /// guessed.
    pub fn suggest(&self, query: &str) -> Vec<&Entity> {
        let used: HashSet<EntityId> = self.session.used_ids();
        self.pool.suggest(query, &used, SUGGESTIONS)
    }

    /// Submits the player's guess.
    ///
    /// Fails with [`SessionError::Busy`] while a previous guess is still
    /// being revealed. Callers are expected to ignore that.
    pub fn guess(&mut self, id: EntityId) -> Result<&GuessRecord, SessionError> {
        if self.revealing() {
            return Err(SessionError::Busy);
        }
        let entity = self.pool.get(id).ok_or(SessionError::UnknownEntity(id))?;

        let record = self.session.submit(Author::Player, entity)?;
        self.reveal = Some(self.reveal_delay);
        Ok(record)
    }

    /// Schedules the opponent's turn if it is ready and not already
    /// scheduled.
    pub fn poll(&mut self) -> Option<Ticket> {
        if self.pending.is_some() || !self.ready() {
            return None;
        }

        let ticket = Ticket {
            epoch: self.epoch,
            seq: self.session.history().len(),
        };
        debug!("opponent scheduled for guess #{}", ticket.seq + 1);
        self.pending = Some(Pending {
            ticket,
            remaining: self.think_delay,
        });
        Some(ticket)
    }

    /// Plays the opponent turn that `ticket` was issued for, regardless of
    /// how much of the thinking delay has passed.
    pub fn play_opponent(&mut self, ticket: Ticket) -> Result<&GuessRecord, SessionError> {
        match self.pending {
            Some(pending) if pending.ticket == ticket => {}
            _ => return Err(SessionError::Stale),
        }
        if self.revealing() {
            return Err(SessionError::Busy);
        }
        self.pending = None;

        let entity = self.opponent_pick();
        let record = self.session.submit(Author::Opponent, &entity)?;
        self.reveal = Some(self.reveal_delay);
        Ok(record)
    }

    fn opponent_pick(&mut self) -> Entity {
        let pool = &self.pool;
        let history = self.session.history();
        let rng = &mut self.rng;

        let opponent = match &self.opponent {
            Some(opponent) => opponent,
            None => return fallback_pick(pool, rng, "no opponent in this game").entity.clone(),
        };

        let pick = panic::catch_unwind(AssertUnwindSafe(|| {
            let pick = opponent.choose(pool, history, &mut *rng);
            (pick.entity.clone(), pick.candidates, pick.fallback)
        }));

        match pick {
            Ok((entity, candidates, fallback)) => {
                if !fallback {
                    debug!("{opponent} chose {entity} among {candidates}");
                }
                entity
            }
            Err(_) => {
                error!("{opponent} panicked while choosing a guess");
                fallback_pick(pool, rng, "the opponent panicked").entity.clone()
            }
        }
    }

    /// Moves time forward by `elapsed`, finishing reveals and playing
    /// scheduled opponent turns as their delays run out.
    pub fn advance(&mut self, elapsed: Duration) -> Vec<Event> {
        let mut events = Vec::new();
        let mut left = elapsed;

        loop {
            if let Some(remaining) = self.reveal {
                if left < remaining {
                    self.reveal = Some(remaining - left);
                    break;
                }
                left -= remaining;
                self.reveal = None;

                match self.session.outcome() {
                    Some(outcome) => {
                        events.push(Event::GameOver(outcome));
                        break;
                    }
                    None => events.push(Event::TurnPassed(self.session.turn())),
                }
            }

            if self.pending.is_none() {
                match self.poll() {
                    Some(ticket) => events.push(Event::OpponentThinking(ticket)),
                    None => break,
                }
            }

            let pending = match self.pending.as_mut() {
                Some(pending) => pending,
                None => break,
            };
            if left < pending.remaining {
                pending.remaining -= left;
                break;
            }
            left -= pending.remaining;
            let ticket = pending.ticket;

            let played = self.play_opponent(ticket).map(|record| Event::Guessed {
                id: record.id,
                author: record.author,
            });
            match played {
                Ok(event) => events.push(event),
                Err(e) => {
                    warn!("scheduled opponent turn could not be played: {e}");
                    self.pending = None;
                    break;
                }
            }
        }

        events
    }

    /// Starts over with a new target, cancelling anything scheduled.
    pub fn restart(&mut self) {
        self.epoch += 1;
        self.pending = None;
        self.reveal = None;
        let target = self.pool.random(&mut self.rng).clone();
        info!("game restarted");
        self.session.restart(target);
    }

    /// Leaves the game, discarding the session and anything scheduled.
    pub fn exit(self) {
        info!("left the game after {} guesses", self.session.history().len());
    }
}
