//! Critique domain model.
//!
//! # Responsibility
//! - Define critiques, their per-section scores and per-dish votes.
//! - Own grade-range validation and mean computations.
//!
//! # Invariants
//! - Section grades are finite and within `MIN_GRADE..=MAX_GRADE`.
//! - Dish votes graded `0` mean "not rated" and are dropped on construction;
//!   every kept dish grade is within `MIN_GRADE..=MAX_GRADE`.
//! - A built critique is immutable.

use crate::model::oid::Oid;
use crate::model::restaurant::MenuEntry;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use thiserror::Error;

/// Lowest accepted grade for sections and rated dishes.
pub const MIN_GRADE: f64 = 1.0;
/// Highest accepted grade for sections and rated dishes.
pub const MAX_GRADE: f64 = 5.0;
/// Dish grade meaning "not rated".
pub const UNRATED_GRADE: f64 = 0.0;

/// Scored aspect of a visit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CritiqueSection {
    Service,
    Ambience,
    Value,
}

impl CritiqueSection {
    pub const COUNT: usize = 3;
    pub const ALL: [Self; Self::COUNT] = [Self::Service, Self::Ambience, Self::Value];

    fn index(self) -> usize {
        match self {
            Self::Service => 0,
            Self::Ambience => 1,
            Self::Value => 2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Service => "service",
            Self::Ambience => "ambience",
            Self::Value => "value",
        }
    }
}

impl Display for CritiqueSection {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CritiqueValidationError {
    #[error("critic username must not be blank")]
    BlankCritic,
    #[error("{section} grade {grade} is outside {min}..={max}", min = MIN_GRADE, max = MAX_GRADE)]
    SectionGradeOutOfRange {
        section: CritiqueSection,
        grade: f64,
    },
    #[error("grade {grade} for dish {dish} is outside {min}..={max}", min = MIN_GRADE, max = MAX_GRADE)]
    DishGradeOutOfRange { dish: Oid, grade: f64 },
}

/// One grade per `CritiqueSection`, in `CritiqueSection::ALL` order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SectionScores([f64; CritiqueSection::COUNT]);

impl SectionScores {
    pub fn new(scores: [f64; CritiqueSection::COUNT]) -> Self {
        Self(scores)
    }

    pub fn get(&self, section: CritiqueSection) -> f64 {
        self.0[section.index()]
    }

    pub fn as_array(&self) -> [f64; CritiqueSection::COUNT] {
        self.0
    }

    /// Arithmetic mean of all section grades.
    pub fn mean(&self) -> f64 {
        self.0.iter().sum::<f64>() / CritiqueSection::COUNT as f64
    }

    pub fn validate(&self) -> Result<(), CritiqueValidationError> {
        for section in CritiqueSection::ALL {
            let grade = self.get(section);
            if !is_valid_grade(grade) {
                return Err(CritiqueValidationError::SectionGradeOutOfRange { section, grade });
            }
        }
        Ok(())
    }
}

/// A rated dish inside a critique.
#[derive(Debug, Clone, PartialEq)]
pub struct DishVote {
    pub dish: Arc<MenuEntry>,
    pub grade: f64,
}

/// Critic input before an identifier is assigned.
///
/// Dish grades reference menu entries by id; the critique catalogue resolves
/// them against the reviewed restaurant.
#[derive(Debug, Clone, PartialEq)]
pub struct CritiqueDraft {
    pub critic: String,
    pub restaurant_id: Oid,
    pub sections: SectionScores,
    pub dish_grades: BTreeMap<Oid, f64>,
    pub comment: String,
}

impl CritiqueDraft {
    pub fn new(critic: impl Into<String>, restaurant_id: Oid, sections: SectionScores) -> Self {
        Self {
            critic: critic.into(),
            restaurant_id,
            sections,
            dish_grades: BTreeMap::new(),
            comment: String::new(),
        }
    }

    pub fn with_dish_grade(mut self, dish_id: Oid, grade: f64) -> Self {
        self.dish_grades.insert(dish_id, grade);
        self
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = comment.into();
        self
    }

    /// Dish grades that carry an actual rating.
    pub fn rated_dishes(&self) -> impl Iterator<Item = (Oid, f64)> + '_ {
        self.dish_grades
            .iter()
            .filter(|(_, grade)| **grade != UNRATED_GRADE)
            .map(|(dish, grade)| (*dish, *grade))
    }

    /// Validates everything that can be checked before storage lookups.
    pub fn validate(&self) -> Result<(), CritiqueValidationError> {
        if self.critic.trim().is_empty() {
            return Err(CritiqueValidationError::BlankCritic);
        }
        self.sections.validate()?;
        for (dish, grade) in self.rated_dishes() {
            if !is_valid_grade(grade) {
                return Err(CritiqueValidationError::DishGradeOutOfRange { dish, grade });
            }
        }
        Ok(())
    }
}

/// A published critique.
#[derive(Debug, Clone, PartialEq)]
pub struct Critique {
    id: Oid,
    critic: String,
    restaurant_id: Oid,
    sections: SectionScores,
    dishes: BTreeMap<Oid, DishVote>,
    comment: String,
}

impl Critique {
    /// Builds a validated critique, dropping unrated dish votes.
    pub fn new(
        id: Oid,
        critic: impl Into<String>,
        restaurant_id: Oid,
        sections: SectionScores,
        votes: impl IntoIterator<Item = DishVote>,
        comment: impl Into<String>,
    ) -> Result<Self, CritiqueValidationError> {
        let critic = critic.into();
        if critic.trim().is_empty() {
            return Err(CritiqueValidationError::BlankCritic);
        }
        sections.validate()?;

        let mut dishes = BTreeMap::new();
        for vote in votes {
            if vote.grade == UNRATED_GRADE {
                continue;
            }
            if !is_valid_grade(vote.grade) {
                return Err(CritiqueValidationError::DishGradeOutOfRange {
                    dish: vote.dish.id(),
                    grade: vote.grade,
                });
            }
            dishes.insert(vote.dish.id(), vote);
        }

        Ok(Self {
            id,
            critic,
            restaurant_id,
            sections,
            dishes,
            comment: comment.into(),
        })
    }

    pub fn id(&self) -> Oid {
        self.id
    }

    pub fn critic(&self) -> &str {
        &self.critic
    }

    pub fn restaurant_id(&self) -> Oid {
        self.restaurant_id
    }

    pub fn sections(&self) -> &SectionScores {
        &self.sections
    }

    pub fn section_grade(&self, section: CritiqueSection) -> f64 {
        self.sections.get(section)
    }

    /// Rated dishes keyed by menu entry id.
    pub fn dishes(&self) -> &BTreeMap<Oid, DishVote> {
        &self.dishes
    }

    pub fn comment(&self) -> &str {
        &self.comment
    }

    /// Mean of the section grades.
    pub fn mean_grade(&self) -> f64 {
        self.sections.mean()
    }
}

/// Restaurant rating: mean of each critique's section mean.
///
/// Returns `None` for an empty input. Callers pass critiques in a stable
/// order so repeated computation yields bit-identical results.
pub fn mean_vote<'a>(critiques: impl IntoIterator<Item = &'a Critique>) -> Option<f64> {
    mean_of_section_means(critiques.into_iter().map(|critique| *critique.sections()))
}

/// Same fold as `mean_vote`, over bare section scores.
///
/// Storage reads that only have score rows use this so a loaded rating
/// matches a recomputed one bit for bit.
pub fn mean_of_section_means(scores: impl IntoIterator<Item = SectionScores>) -> Option<f64> {
    let (sum, count) = scores
        .into_iter()
        .fold((0.0_f64, 0_usize), |(sum, count), sections| {
            (sum + sections.mean(), count + 1)
        });
    (count > 0).then(|| sum / count as f64)
}

fn is_valid_grade(grade: f64) -> bool {
    grade.is_finite() && (MIN_GRADE..=MAX_GRADE).contains(&grade)
}
