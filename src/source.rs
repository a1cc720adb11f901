//! Where candidate pools come from.

use std::collections::HashSet;
#[cfg(feature = "serde")]
use std::{fs::File, io::BufReader, path::Path};

use crate::{
    entity::{Entity, Pool},
    PoolError, Result,
};

/// Supplies the entities a game is played with.
///
/// Implementations must hand out well-formed entities: a unique identifier
/// and a non-empty name each. [`pool()`](CandidateSource::pool()) checks
/// this with [`validate()`] before anything reaches a session.
pub trait CandidateSource {
    /// Produces every entity this source knows about.
    fn entities(&self) -> Result<Vec<Entity>>;

    /// Produces a validated pool, optionally restricted to `theme`.
    ///
    /// A theme that matches nothing yields the unfiltered pool.
    fn pool(&self, theme: Option<&str>) -> Result<Pool> {
        let entities = self.entities()?;
        validate(&entities)?;
        let pool = Pool::new(entities)?;
        Ok(match theme {
            Some(theme) => pool.themed(theme),
            None => pool,
        })
    }
}

impl CandidateSource for Vec<Entity> {
    fn entities(&self) -> Result<Vec<Entity>> {
        Ok(self.clone())
    }
}

/// Rejects entities with a blank name or a duplicated identifier.
pub fn validate(entities: &[Entity]) -> Result<(), PoolError> {
    let mut seen = HashSet::new();
    for (index, entity) in entities.iter().enumerate() {
        if entity.name().trim().is_empty() {
            return Err(PoolError::MalformedEntity {
                index,
                reason: format!("entity {} has no name", entity.id),
            });
        }
        if !seen.insert(entity.id) {
            return Err(PoolError::MalformedEntity {
                index,
                reason: format!("id {} is used more than once", entity.id),
            });
        }
    }
    Ok(())
}

/// A dataset stored as a JSON array of entities.
///
/// # Examples
///
/// ```rust
/// use waifudle::{source::JsonSource, CandidateSource};
///
/// let source = JsonSource::from_str(r#"[
///     {"id": 1, "name": "Nami", "source": "One Piece", "age": 20},
///     {"id": 2, "name": "Bulma", "source": "Dragon Ball", "height": null}
/// ]"#)?;
///
/// let pool = source.pool(Some("One Piece"))?;
/// assert_eq!(pool.len(), 1);
/// assert_eq!(pool[0].age, Some(20.));
/// #
/// # Ok::<_, waifudle::WaifudleError>(())
/// ```
#[cfg(feature = "serde")]
#[derive(Clone, Debug, PartialEq)]
pub struct JsonSource {
    entities: Vec<Entity>,
}

#[cfg(feature = "serde")]
impl JsonSource {
    /// Reads a dataset from a JSON file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let entities = serde_json::from_reader(BufReader::new(file))?;
        Ok(JsonSource { entities })
    }

    /// Reads a dataset from a JSON string.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(json: &str) -> Result<Self> {
        let entities = serde_json::from_str(json)?;
        Ok(JsonSource { entities })
    }
}

#[cfg(feature = "serde")]
impl CandidateSource for JsonSource {
    fn entities(&self) -> Result<Vec<Entity>> {
        Ok(self.entities.clone())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::WaifudleError;

    #[test]
    fn blank_names_are_malformed() {
        let entities = vec![Entity::new(1, "Nami"), Entity::new(2, "  ")];
        assert!(matches!(
            validate(&entities),
            Err(PoolError::MalformedEntity { index: 1, .. })
        ));
    }

    #[test]
    fn duplicate_ids_are_malformed() {
        let entities = vec![Entity::new(1, "Nami"), Entity::new(1, "Robin")];
        assert!(matches!(
            entities.pool(None),
            Err(WaifudleError::Pool {
                kind: PoolError::MalformedEntity { index: 1, .. }
            })
        ));
    }

    #[test]
    fn empty_source_is_an_error() {
        assert!(matches!(
            Vec::<Entity>::new().pool(None),
            Err(WaifudleError::Pool {
                kind: PoolError::Empty
            })
        ));
    }

    #[test]
    fn unknown_theme_gets_everything() {
        let entities = vec![
            Entity::new(1, "Nami").source("One Piece"),
            Entity::new(2, "Bulma").source("Dragon Ball"),
        ];
        assert_eq!(entities.pool(Some("Overwatch")).unwrap().len(), 2);
        assert_eq!(entities.pool(Some("Dragon Ball")).unwrap().len(), 1);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn bundled_dataset_loads() {
        let source = JsonSource::from_str(include_str!("../data/pool.json")).unwrap();
        let pool = source.pool(None).unwrap();
        assert!(pool.len() >= 20);
        assert!(pool.iter().any(|e| e.age.is_none()));
        assert!(pool.iter().any(|e| e.affiliations.is_none()));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn missing_name_fails_to_parse() {
        assert!(matches!(
            JsonSource::from_str(r#"[{"id": 1, "source": "Naruto"}]"#),
            Err(WaifudleError::Serde(_))
        ));
    }
}
