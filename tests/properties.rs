use std::collections::HashSet;

use proptest::prelude::*;
use waifudle::{
    compare,
    opponent::filter_consistent,
    session::{Author, Session},
    verdict::{compare_categorical, compare_numeric, Attribute},
    Entity, EntityId, Grade,
};

fn category() -> impl Strategy<Value = Option<String>> {
    proptest::option::of(
        prop_oneof![Just("red"), Just("Red"), Just("blue"), Just(""), Just("Konoha")]
            .prop_map(String::from),
    )
}

fn number() -> impl Strategy<Value = Option<f64>> {
    proptest::option::of(prop_oneof![
        8 => (10u8..14).prop_map(f64::from),
        1 => Just(f64::NAN),
    ])
}

prop_compose! {
    fn entity(id: u32)(
        name in "[a-z]{1,4}",
        source in category(),
        hair_color in category(),
        eyes_color in category(),
        affiliations in category(),
        age in number(),
        height in number(),
    ) -> Entity {
        let mut entity = Entity::new(id, name);
        entity.source = source;
        entity.hair_color = hair_color;
        entity.eyes_color = eyes_color;
        entity.affiliations = affiliations;
        entity.age = age;
        entity.height = height;
        entity
    }
}

prop_compose! {
    fn complete_entity()(
        name in "[a-z]{1,8}",
        source in "[A-Za-z]{1,8}",
        hair_color in "[a-z]{1,8}",
        eyes_color in "[a-z]{1,8}",
        affiliations in "[a-z]{1,8}",
        age in 1u16..1000,
        height in 50u16..250,
    ) -> Entity {
        Entity::new(1, name)
            .source(source)
            .hair_color(hair_color)
            .eyes_color(eyes_color)
            .affiliations(affiliations)
            .age(age.into())
            .height(height.into())
    }
}

/// A pool with unique ids, a target drawn from it, and a sequence of guesses.
fn game() -> impl Strategy<Value = (Vec<Entity>, usize, Vec<usize>)> {
    (2usize..10)
        .prop_flat_map(|n| {
            (0..n as u32)
                .map(entity)
                .collect::<Vec<_>>()
        })
        .prop_flat_map(|pool| {
            let n = pool.len();
            (Just(pool), 0..n, proptest::collection::vec(0..n, 0..8))
        })
}

proptest! {
    #[test]
    fn complete_entity_matches_itself(e in complete_entity()) {
        let verdict = compare(&e, &e);
        prop_assert!(verdict.all_correct());
        prop_assert_eq!(verdict.name_length, Grade::Correct);
        prop_assert!(verdict.is_consistent_with(&verdict));
    }

    #[test]
    fn unknown_values_are_wrong(value in category(), known in number()) {
        prop_assert_eq!(compare_categorical(None, value.as_deref()), Grade::Wrong);
        prop_assert_eq!(compare_categorical(value.as_deref(), None), Grade::Wrong);
        prop_assert_eq!(compare_categorical(Some(""), value.as_deref()), Grade::Wrong);
        prop_assert_eq!(compare_numeric(None, known), Grade::Wrong);
        prop_assert_eq!(compare_numeric(Some(f64::NAN), known), Grade::Wrong);
        prop_assert_eq!(compare_numeric(known, None), Grade::Wrong);
    }

    #[test]
    fn numeric_grades_point_at_target(guess in -1e6f64..1e6, target in -1e6f64..1e6) {
        let expected = if target > guess {
            Grade::Higher
        } else if target < guess {
            Grade::Lower
        } else {
            Grade::Correct
        };
        prop_assert_eq!(compare_numeric(Some(guess), Some(target)), expected);
    }

    #[test]
    fn nothing_is_ever_partial(a in entity(1), b in entity(2)) {
        let verdict = compare(&a, &b);
        for attribute in Attribute::DISPLAYED {
            prop_assert_ne!(verdict[attribute], Grade::Partial);
        }
    }

    #[test]
    fn target_always_survives((pool, target, guesses) in game()) {
        let mut session = Session::classic(pool[target].clone());
        for &g in guesses.iter() {
            if session.is_over() {
                break;
            }
            session.submit(Author::Player, &pool[g]).unwrap();
            let left = filter_consistent(&pool, session.history());
            prop_assert!(left.iter().any(|e| e.id == pool[target].id));
        }
    }

    #[test]
    fn more_history_never_widens((pool, target, guesses) in game()) {
        let mut session = Session::classic(pool[target].clone());
        let mut before: HashSet<EntityId> = filter_consistent(&pool, session.history())
            .iter()
            .map(|e| e.id)
            .collect();
        prop_assert_eq!(before.len(), pool.len());

        for &g in guesses.iter() {
            if session.is_over() {
                break;
            }
            session.submit(Author::Player, &pool[g]).unwrap();
            let after: HashSet<EntityId> = filter_consistent(&pool, session.history())
                .iter()
                .map(|e| e.id)
                .collect();
            prop_assert!(after.is_subset(&before), "{:?} is not within {:?}", after, before);
            before = after;
        }
    }
}
