//! Plain structural snapshots of a [`Session`], for saving and restoring.
//!
//! Older saves are accepted too: records without an identifier get one
//! synthesized from their position, classic saves that stored bare entities
//! instead of records are understood, and verdicts are always recomputed
//! from the target so a restored history grades exactly as it did live.

use log::warn;
use serde::{Deserialize, Serialize};

use crate::{
    entity::Entity,
    session::{Author, GuessRecord, Mode, Phase, RecordId, Session},
    verdict::{compare, Verdict},
    Result,
};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(crate = "serde_crate")]
pub struct SessionSnapshot {
    #[serde(default)]
    pub mode: Mode,
    pub target: Entity,
    #[serde(default, alias = "guesses")]
    pub history: Vec<SavedGuess>,
    #[serde(default, alias = "hasWon")]
    pub has_won: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase: Option<Phase>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub turn: Option<Author>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub winner: Option<Author>,
}

/// A saved guess, in either the current or the bare-entity layout.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(crate = "serde_crate", untagged)]
pub enum SavedGuess {
    Record(RecordSnapshot),
    Bare(Entity),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(crate = "serde_crate")]
pub struct RecordSnapshot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    #[serde(default)]
    pub author: Author,
    #[serde(alias = "waifu")]
    pub entity: Entity,
    #[serde(default, alias = "comparison", skip_serializing_if = "Option::is_none")]
    pub verdict: Option<Verdict>,
}

impl SavedGuess {
    fn into_parts(self) -> (Option<RecordId>, Author, Entity, Option<Verdict>) {
        match self {
            SavedGuess::Record(r) => (r.id, r.author, r.entity, r.verdict),
            SavedGuess::Bare(entity) => (None, Author::Player, entity, None),
        }
    }
}

impl SessionSnapshot {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Rebuilds the session this snapshot describes.
    pub fn restore(self) -> Session {
        let SessionSnapshot {
            mode,
            target,
            history,
            has_won,
            phase,
            turn,
            winner,
        } = self;

        let parts: Vec<_> = history.into_iter().map(SavedGuess::into_parts).collect();

        // identifiers synthesized for old records never collide with saved ones
        let base = parts
            .iter()
            .filter_map(|(id, ..)| id.map(|id| id.serial + 1))
            .max()
            .unwrap_or(0);

        let records: Vec<GuessRecord> = parts
            .into_iter()
            .enumerate()
            .map(|(seq, (id, author, entity, saved))| {
                let verdict = compare(&entity, &target);
                if saved.map_or(false, |saved| saved != verdict) {
                    warn!("saved verdict for {entity} disagrees with the target, regrading");
                }
                GuessRecord {
                    id: id.unwrap_or(RecordId {
                        entity: entity.id,
                        serial: base + seq as u64,
                    }),
                    seq,
                    author,
                    entity,
                    verdict,
                }
            })
            .collect();

        let found = records.last().filter(|r| r.entity.id == target.id);
        let winner = winner
            .or_else(|| found.map(|r| r.author))
            .or_else(|| has_won.then(|| records.last().map_or(Author::Player, |r| r.author)));

        let phase = phase.unwrap_or(match (winner, mode) {
            (Some(_), _) => Phase::GameOver,
            (None, Mode::Duel) if records.is_empty() => Phase::Rules,
            (None, _) => Phase::Playing,
        });

        let turn = turn.unwrap_or(match (mode, records.last()) {
            (Mode::Duel, Some(last)) if winner.is_none() => last.author.other(),
            (_, Some(last)) => last.author,
            (_, None) => Author::Player,
        });

        Session::from_parts(mode, target, records, phase, turn, winner)
    }
}

impl From<&Session> for SessionSnapshot {
    fn from(session: &Session) -> Self {
        SessionSnapshot {
            mode: session.mode(),
            target: session.target().clone(),
            history: session
                .history()
                .iter()
                .map(|r| {
                    SavedGuess::Record(RecordSnapshot {
                        id: Some(r.id),
                        author: r.author,
                        entity: r.entity.clone(),
                        verdict: Some(r.verdict),
                    })
                })
                .collect(),
            has_won: session.winner().is_some(),
            phase: Some(session.phase()),
            turn: Some(session.turn()),
            winner: session.winner(),
        }
    }
}

impl Session {
    /// Takes a snapshot of this session.
    pub fn snapshot(&self) -> SessionSnapshot {
        self.into()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        entity::{test::sample_pool, EntityId},
        opponent::filter_consistent,
    };

    #[test]
    fn live_session_restores_verbatim() {
        let pool = sample_pool();
        let mut session = Session::duel(pool[3].clone());
        session.start(Author::Opponent).unwrap();
        session.submit(Author::Opponent, &pool[0]).unwrap();
        session.submit(Author::Player, &pool[4]).unwrap();

        let json = session.snapshot().to_json().unwrap();
        let restored = SessionSnapshot::from_json(&json).unwrap().restore();
        assert_eq!(restored, session);

        // serials keep counting after a restore
        let mut restored = restored;
        let id = restored.submit(Author::Opponent, &pool[1]).unwrap().id;
        assert_eq!(id.serial, 2);
    }

    #[test]
    fn won_session_restores_as_over() {
        let pool = sample_pool();
        let mut session = Session::classic(pool[1].clone());
        session.submit(Author::Player, &pool[0]).unwrap();
        session.submit(Author::Player, &pool[1]).unwrap();

        let restored = SessionSnapshot::from_json(&session.snapshot().to_json().unwrap())
            .unwrap()
            .restore();
        assert!(restored.is_over());
        assert_eq!(restored.winner(), Some(Author::Player));
    }

    #[test]
    fn records_without_ids_are_synthesized() {
        let json = r#"{
            "mode": "duel",
            "target": {"id": 3, "name": "Nami", "source": "One Piece", "age": 20},
            "guesses": [
                {"waifu": {"id": 1, "name": "Hinata", "source": "Naruto", "age": 16},
                 "author": "computer",
                 "comparison": {"source": "wrong", "hair_color": "wrong", "eyes_color": "wrong",
                                "affiliations": "wrong", "age": "higher", "height": "wrong"},
                 "uniqueId": "1-1712345678"},
                {"entity": {"id": 2, "name": "Robin", "source": "One Piece", "age": 30},
                 "author": "player",
                 "id": {"entity": 2, "serial": 7}}
            ]
        }"#;

        let session = SessionSnapshot::from_json(json).unwrap().restore();
        let ids: Vec<_> = session.history().iter().map(|r| r.id).collect();
        assert_eq!(
            ids,
            [
                RecordId {
                    entity: EntityId(1),
                    serial: 8
                },
                RecordId {
                    entity: EntityId(2),
                    serial: 7
                },
            ]
        );
        assert_eq!(session.history()[0].author, Author::Opponent);
        assert_eq!(session.phase(), Phase::Playing);
        assert_eq!(session.turn(), Author::Opponent);

        // grading is unchanged, so the target is still a candidate
        let pool = [session.target().clone()];
        assert_eq!(filter_consistent(&pool, session.history()).len(), 1);
    }

    #[test]
    fn legacy_classic_save_restores() {
        let json = r#"{
            "target": {"id": 5, "name": "Bulma", "source": "Dragon Ball"},
            "guesses": [
                {"id": 1, "name": "Nami", "source": "One Piece"},
                {"id": 5, "name": "Bulma", "source": "Dragon Ball"}
            ],
            "hasWon": true
        }"#;

        let session = SessionSnapshot::from_json(json).unwrap().restore();
        assert_eq!(session.mode(), Mode::Classic);
        assert_eq!(session.history().len(), 2);
        assert_eq!(session.history()[1].id.serial, 1);
        assert_eq!(session.history()[0].verdict.source, crate::Grade::Wrong);
        assert!(session.is_over());
        assert_eq!(session.winner(), Some(Author::Player));
    }

    #[test]
    fn fresh_duel_restores_to_rules() {
        let json = r#"{"mode": "duel", "target": {"id": 5, "name": "Bulma"}}"#;
        let session = SessionSnapshot::from_json(json).unwrap().restore();
        assert_eq!(session.phase(), Phase::Rules);
        assert!(session.history().is_empty());
    }
}
