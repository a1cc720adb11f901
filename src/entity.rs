//! Characters and the pools they are drawn from.

use std::{collections::HashSet, fmt::Display, ops::Deref};

use itertools::Itertools;
use log::warn;
use rand::{seq::SliceRandom, Rng};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{PoolError, Result};

/// The themes offered when starting a filtered classic game.
pub const THEMES: [&str; 7] = [
    "Dragon Ball",
    "Fairy Tail",
    "High School DxD",
    "My Hero Academia",
    "Naruto",
    "One Piece",
    "Overwatch",
];

/// Default number of name suggestions returned by [`Pool::suggest()`].
pub const SUGGESTIONS: usize = 10;

/// The stable identifier of an [`Entity`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate", transparent)
)]
pub struct EntityId(pub u32);

impl Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for EntityId {
    fn from(id: u32) -> Self {
        EntityId(id)
    }
}

/// A character that can be guessed.
///
/// Categorical attributes are strings and numeric attributes are numbers;
/// each one may be unknown. Entities are never mutated once they have been
/// loaded.
///
/// # Examples
///
/// ```rust
/// use waifudle::Entity;
///
/// let hinata = Entity::new(1, "Hinata Hyuga")
///     .source("Naruto")
///     .hair_color("Dark Blue")
///     .age(16.)
///     .height(160.);
///
/// assert_eq!(hinata.name(), "Hinata Hyuga");
/// assert_eq!(hinata.affiliations, None);
/// ```
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
pub struct Entity {
    pub id: EntityId,
    name: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub image: Option<String>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub source: Option<String>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub hair_color: Option<String>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub eyes_color: Option<String>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub affiliations: Option<String>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub age: Option<f64>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub height: Option<f64>,
}

impl Entity {
    /// Creates an entity with a name and no known attributes.
    pub fn new(id: u32, name: impl Into<String>) -> Self {
        Entity {
            id: EntityId(id),
            name: name.into(),
            image: None,
            source: None,
            hair_color: None,
            eyes_color: None,
            affiliations: None,
            age: None,
            height: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn image(self, image: impl Into<String>) -> Self {
        Entity {
            image: Some(image.into()),
            ..self
        }
    }

    pub fn source(self, source: impl Into<String>) -> Self {
        Entity {
            source: Some(source.into()),
            ..self
        }
    }

    pub fn hair_color(self, hair_color: impl Into<String>) -> Self {
        Entity {
            hair_color: Some(hair_color.into()),
            ..self
        }
    }

    pub fn eyes_color(self, eyes_color: impl Into<String>) -> Self {
        Entity {
            eyes_color: Some(eyes_color.into()),
            ..self
        }
    }

    pub fn affiliations(self, affiliations: impl Into<String>) -> Self {
        Entity {
            affiliations: Some(affiliations.into()),
            ..self
        }
    }

    pub fn age(self, age: f64) -> Self {
        Entity {
            age: Some(age),
            ..self
        }
    }

    pub fn height(self, height: f64) -> Self {
        Entity {
            height: Some(height),
            ..self
        }
    }
}

impl Display for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// The entities available to a session.
///
/// A pool is never empty: [`new()`](Pool::new()) refuses zero entities and
/// [`themed()`](Pool::themed()) falls back to the whole pool when a theme
/// matches nothing.
#[derive(Clone, Debug, PartialEq)]
pub struct Pool {
    entities: Vec<Entity>,
}

impl Pool {
    /// Creates a pool, failing if `entities` is empty.
    pub fn new(entities: Vec<Entity>) -> Result<Self> {
        if entities.is_empty() {
            return Err(PoolError::Empty.into());
        }
        Ok(Pool { entities })
    }

    /// Restricts the pool to the entities whose source is exactly `theme`.
    ///
    /// When no entity matches, the unfiltered pool is returned instead.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use waifudle::{Entity, Pool};
    ///
    /// let pool = Pool::new(vec![
    ///     Entity::new(1, "Sakura Haruno").source("Naruto"),
    ///     Entity::new(2, "Nami").source("One Piece"),
    /// ])?;
    ///
    /// assert_eq!(pool.themed("Naruto").len(), 1);
    /// assert_eq!(pool.themed("Overwatch").len(), 2);
    /// #
    /// # Ok::<_, waifudle::WaifudleError>(())
    /// ```
    pub fn themed(&self, theme: &str) -> Pool {
        let entities: Vec<_> = self
            .entities
            .iter()
            .filter(|e| e.source.as_deref() == Some(theme))
            .cloned()
            .collect();

        if entities.is_empty() {
            warn!("theme {theme:?} matches no entity, using the full pool");
            self.clone()
        } else {
            Pool { entities }
        }
    }

    /// Every distinct source present in the pool, sorted.
    pub fn sources(&self) -> Vec<&str> {
        self.entities
            .iter()
            .filter_map(|e| e.source.as_deref())
            .unique()
            .sorted_unstable()
            .collect()
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.iter().find(|e| e.id == id)
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.get(id).is_some()
    }

    /// Picks an entity uniformly at random.
    pub fn random<R: Rng + ?Sized>(&self, rng: &mut R) -> &Entity {
        // a pool is never empty
        &self.entities[rng.gen_range(0..self.entities.len())]
    }

    /// Picks an entity uniformly at random from `subset`.
    ///
    /// Returns `None` when `subset` is empty; opponents then fall back with
    /// [`fallback_pick()`](crate::opponent::fallback_pick()), which flags
    /// and logs the pick.
    pub fn random_among<'p, R: Rng + ?Sized>(
        &'p self,
        subset: &[&'p Entity],
        rng: &mut R,
    ) -> Option<&'p Entity> {
        subset.choose(rng).copied()
    }

    /// Suggests up to `limit` entities whose name contains `query`,
    /// ignoring case and skipping identifiers in `used`.
    pub fn suggest<'p>(
        &'p self,
        query: &str,
        used: &HashSet<EntityId>,
        limit: usize,
    ) -> Vec<&'p Entity> {
        if query.is_empty() {
            return Vec::new();
        }

        let query = query.to_lowercase();
        self.entities
            .iter()
            .filter(|e| !used.contains(&e.id))
            .filter(|e| e.name.to_lowercase().contains(&query))
            .take(limit)
            .collect()
    }
}

impl Deref for Pool {
    type Target = [Entity];

    fn deref(&self) -> &Self::Target {
        &self.entities
    }
}
