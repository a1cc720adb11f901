//! Scoring a guess against a target, attribute by attribute.

use std::{cmp::Ordering, fmt::Display, ops::Index};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::entity::Entity;

/// How one attribute of a guess relates to the same attribute of the target.
///
/// Categorical attributes only ever grade [`Correct`](Grade::Correct) or
/// [`Wrong`](Grade::Wrong). Numeric attributes grade
/// [`Correct`](Grade::Correct), [`Higher`](Grade::Higher) or
/// [`Lower`](Grade::Lower), or [`Wrong`](Grade::Wrong) when either side is
/// unknown.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate", rename_all = "lowercase")
)]
pub enum Grade {
    /// The attribute matches the target.
    Correct,

    /// The attribute does not match, or one side of it is unknown.
    Wrong,

    /// Reserved. Nothing currently grades partial matches.
    Partial,

    /// The target's value lies above the guessed one.
    Higher,

    /// The target's value lies below the guessed one.
    Lower,
}

impl Display for Grade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Grade::Correct => "correct",
            Grade::Wrong => "wrong",
            Grade::Partial => "partial",
            Grade::Higher => "higher",
            Grade::Lower => "lower",
        };
        write!(f, "{}", s)
    }
}

/// One graded signal of a [`Verdict`].
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug, Hash)]
pub enum Attribute {
    Source,
    HairColor,
    EyesColor,
    Affiliations,
    Age,
    Height,
    /// Whether the guessed name has as many characters as the target's.
    /// Tracked by the opponent, never displayed.
    NameLength,
}

impl Attribute {
    pub const COUNT: usize = 7;

    /// Attributes in display order.
    pub const DISPLAYED: [Attribute; 6] = [
        Attribute::Source,
        Attribute::HairColor,
        Attribute::EyesColor,
        Attribute::Affiliations,
        Attribute::Age,
        Attribute::Height,
    ];

    /// Attributes the opponent requires to match when replaying history.
    /// Affiliations are deliberately absent.
    pub const TRACKED: [Attribute; 6] = [
        Attribute::Source,
        Attribute::HairColor,
        Attribute::EyesColor,
        Attribute::Age,
        Attribute::Height,
        Attribute::NameLength,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Attribute::Source => "source",
            Attribute::HairColor => "hair_color",
            Attribute::EyesColor => "eyes_color",
            Attribute::Affiliations => "affiliations",
            Attribute::Age => "age",
            Attribute::Height => "height",
            Attribute::NameLength => "name_length",
        }
    }
}

impl Display for Attribute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// The grades of one guess against one target.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
pub struct Verdict {
    pub source: Grade,
    pub hair_color: Grade,
    pub eyes_color: Grade,
    pub affiliations: Grade,
    pub age: Grade,
    pub height: Grade,
    #[cfg_attr(feature = "serde", serde(default = "Verdict::unknown_name_length"))]
    pub name_length: Grade,
}

impl Verdict {
    #[cfg(feature = "serde")]
    fn unknown_name_length() -> Grade {
        Grade::Wrong
    }

    /// Returns true if every displayed attribute is correct.
    pub fn all_correct(&self) -> bool {
        Attribute::DISPLAYED
            .iter()
            .all(|&a| self[a] == Grade::Correct)
    }

    /// Returns true if `other` agrees with this verdict on every
    /// [tracked](Attribute::TRACKED) attribute.
    pub fn is_consistent_with(&self, other: &Verdict) -> bool {
        Attribute::TRACKED.iter().all(|&a| self[a] == other[a])
    }

    /// The displayed grades, in display order.
    pub fn displayed(&self) -> [(Attribute, Grade); 6] {
        Attribute::DISPLAYED.map(|a| (a, self[a]))
    }
}

impl Index<Attribute> for Verdict {
    type Output = Grade;

    fn index(&self, attribute: Attribute) -> &Self::Output {
        match attribute {
            Attribute::Source => &self.source,
            Attribute::HairColor => &self.hair_color,
            Attribute::EyesColor => &self.eyes_color,
            Attribute::Affiliations => &self.affiliations,
            Attribute::Age => &self.age,
            Attribute::Height => &self.height,
            Attribute::NameLength => &self.name_length,
        }
    }
}

impl Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for (attribute, grade) in self.displayed() {
            if !first {
                write!(f, " ")?;
            }
            write!(f, "{}={}", attribute, grade)?;
            first = false;
        }
        Ok(())
    }
}

/// Grades `guess` against `target`.
///
/// This is the only way verdicts are produced, both when scoring a live guess
/// and when the opponent replays history against a hypothetical target.
///
/// # Examples
///
/// ```rust
/// use waifudle::{compare, Entity, Grade};
///
/// let target = Entity::new(1, "Naruto Girl").source("Naruto").age(17.);
/// let guess = Entity::new(2, "Older Girl").source("Naruto").age(20.);
///
/// let verdict = compare(&guess, &target);
/// assert_eq!(verdict.source, Grade::Correct);
/// assert_eq!(verdict.age, Grade::Lower);
/// assert_eq!(verdict.hair_color, Grade::Wrong);
/// ```
pub fn compare(guess: &Entity, target: &Entity) -> Verdict {
    Verdict {
        source: compare_categorical(guess.source.as_deref(), target.source.as_deref()),
        hair_color: compare_categorical(
            guess.hair_color.as_deref(),
            target.hair_color.as_deref(),
        ),
        eyes_color: compare_categorical(
            guess.eyes_color.as_deref(),
            target.eyes_color.as_deref(),
        ),
        affiliations: compare_categorical(
            guess.affiliations.as_deref(),
            target.affiliations.as_deref(),
        ),
        age: compare_numeric(guess.age, target.age),
        height: compare_numeric(guess.height, target.height),
        name_length: if guess.name().chars().count() == target.name().chars().count() {
            Grade::Correct
        } else {
            Grade::Wrong
        },
    }
}

/// Grades a categorical attribute by whole-string, case-sensitive equality.
///
/// Unknown or empty values are never correct.
pub fn compare_categorical(guess: Option<&str>, target: Option<&str>) -> Grade {
    match (guess, target) {
        (Some(g), Some(t)) if !g.is_empty() && !t.is_empty() && g == t => Grade::Correct,
        _ => Grade::Wrong,
    }
}

/// Grades a numeric attribute, pointing from the guess toward the target.
///
/// # Examples
///
/// ```rust
/// use waifudle::{verdict::compare_numeric, Grade};
///
/// assert_eq!(compare_numeric(Some(10.), Some(17.)), Grade::Higher);
/// assert_eq!(compare_numeric(Some(20.), Some(17.)), Grade::Lower);
/// assert_eq!(compare_numeric(Some(17.), Some(17.)), Grade::Correct);
/// assert_eq!(compare_numeric(None, Some(17.)), Grade::Wrong);
/// ```
pub fn compare_numeric(guess: Option<f64>, target: Option<f64>) -> Grade {
    let (guess, target) = match (guess, target) {
        (Some(g), Some(t)) => (g, t),
        _ => return Grade::Wrong,
    };

    match target.partial_cmp(&guess) {
        Some(Ordering::Equal) => Grade::Correct,
        Some(Ordering::Greater) => Grade::Higher,
        Some(Ordering::Less) => Grade::Lower,
        // NaN is as good as unknown
        None => Grade::Wrong,
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use Grade::*;

    fn target() -> Entity {
        Entity::new(1, "Naruto Uzumaki")
            .source("Naruto")
            .hair_color("blonde")
            .eyes_color("blue")
            .affiliations("Konoha")
            .age(17.)
            .height(166.)
    }

    #[test]
    fn same_entity_is_all_correct() {
        let t = target();
        let verdict = compare(&t, &t);
        assert!(verdict.all_correct());
        assert_eq!(verdict.name_length, Correct);
    }

    #[test]
    fn numeric_points_toward_target() {
        let older = Entity::new(2, "Someone").age(20.);
        let younger = Entity::new(3, "Someone").age(10.);
        assert_eq!(compare(&older, &target()).age, Lower);
        assert_eq!(compare(&younger, &target()).age, Higher);
    }

    #[test]
    fn unknown_values_are_wrong() {
        let blank = Entity::new(2, "Blank");
        let verdict = compare(&blank, &target());
        assert_eq!(verdict.source, Wrong);
        assert_eq!(verdict.age, Wrong);
        assert_eq!(verdict.height, Wrong);

        let verdict = compare(&target(), &blank);
        assert_eq!(verdict.source, Wrong);
        assert_eq!(verdict.height, Wrong);

        // even an unknown compared with itself
        assert_eq!(compare(&blank, &blank).source, Wrong);
    }

    #[test]
    fn empty_strings_are_unknown() {
        assert_eq!(compare_categorical(Some(""), Some("")), Wrong);
        assert_eq!(compare_categorical(Some("a"), Some("a")), Correct);
        assert_eq!(compare_categorical(Some("a"), Some("A")), Wrong);
    }

    #[test]
    fn affiliations_use_whole_string_equality() {
        let both = Entity::new(2, "x").affiliations("Konoha, Akatsuki");
        let one = Entity::new(3, "y").affiliations("Konoha");
        assert_eq!(compare(&both, &one).affiliations, Wrong);
        assert_eq!(compare(&one, &target()).affiliations, Correct);
    }

    #[test]
    fn nan_is_wrong() {
        assert_eq!(compare_numeric(Some(f64::NAN), Some(1.)), Wrong);
    }

    #[test]
    fn name_length_counts_chars() {
        let a = Entity::new(1, "Émilia");
        let b = Entity::new(2, "Emilia");
        let c = Entity::new(3, "Emily");
        assert_eq!(compare(&a, &b).name_length, Correct);
        assert_eq!(compare(&a, &c).name_length, Wrong);
    }

    #[test]
    fn consistency_ignores_affiliations() {
        let t = target();
        let base = compare(&t, &t);
        let other = Verdict {
            affiliations: Wrong,
            ..base
        };
        assert!(base.is_consistent_with(&other));

        let other = Verdict {
            name_length: Wrong,
            ..base
        };
        assert!(!base.is_consistent_with(&other));
    }

    #[test]
    fn never_partial() {
        let guess = Entity::new(2, "Sasuke Uchiha")
            .source("Naru")
            .affiliations("Konoha, Taka");
        let verdict = compare(&guess, &target());
        assert!(Attribute::DISPLAYED.iter().all(|&a| verdict[a] != Partial));
    }
}
