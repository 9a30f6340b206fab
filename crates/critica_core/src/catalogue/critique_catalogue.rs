//! Critique catalogue.
//!
//! # Responsibility
//! - Publish critiques and keep restaurant ratings current.
//! - Serve per-restaurant, per-critic and threshold-filtered listings.
//!
//! # Invariants
//! - A critique only rates dishes listed on the reviewed restaurant's menu.
//! - Unrated (zero) dish grades are never persisted.
//! - Listings are ordered by critique id, so rating computation over them is
//!   deterministic.

use crate::mapper::PersistError;
use crate::model::critique::{
    mean_vote, Critique, CritiqueDraft, CritiqueSection, CritiqueValidationError, DishVote,
};
use crate::model::oid::{EntityCategory, Oid};
use crate::model::restaurant::{MenuEntry, Restaurant, SharedRestaurant};
use crate::oid::OidGenerator;
use crate::persistence::PersistenceFacade;
use log::{info, warn};
use parking_lot::Mutex;
use std::sync::Arc;
use thiserror::Error;

pub type CritiqueResult<T> = Result<T, CritiqueError>;

#[derive(Debug, Error)]
pub enum CritiqueError {
    #[error("restaurant not found: {0}")]
    RestaurantNotFound(Oid),
    #[error("dish not found: {0}")]
    DishNotFound(Oid),
    #[error("dish {dish} is not on the menu of restaurant {restaurant}")]
    DishNotInMenu { restaurant: Oid, dish: Oid },
    #[error("no critiques found")]
    NoCritiques,
    #[error(transparent)]
    InvalidCritique(#[from] CritiqueValidationError),
    #[error(transparent)]
    Persistence(PersistError),
}

impl From<PersistError> for CritiqueError {
    fn from(value: PersistError) -> Self {
        match value {
            PersistError::NotFound {
                category: EntityCategory::Restaurant,
                id,
            } => Self::RestaurantNotFound(id),
            PersistError::NotFound {
                category: EntityCategory::MenuEntry,
                id,
            } => Self::DishNotFound(id),
            other => Self::Persistence(other),
        }
    }
}

pub struct CritiqueCatalogue {
    persistence: Arc<PersistenceFacade>,
    oids: Arc<OidGenerator>,
    write_lock: Mutex<()>,
}

impl CritiqueCatalogue {
    pub fn new(persistence: Arc<PersistenceFacade>, oids: Arc<OidGenerator>) -> Self {
        Self {
            persistence,
            oids,
            write_lock: Mutex::new(()),
        }
    }

    /// Publishes a critique and refreshes the restaurant rating.
    ///
    /// # Errors
    /// - `InvalidCritique` for a blank critic or an out-of-range grade.
    /// - `RestaurantNotFound` / `DishNotFound` for unresolved references.
    /// - `DishNotInMenu` when a rated dish belongs to another restaurant.
    pub fn add_new_critique(&self, draft: CritiqueDraft) -> CritiqueResult<Oid> {
        draft.validate()?;

        let _guard = self.write_lock.lock();
        let restaurant = self.restaurant(draft.restaurant_id)?;
        let votes = self.resolve_votes(&draft)?;

        let id = self.oids.next_id(EntityCategory::Critique)?;
        let critique = Arc::new(Critique::new(
            id,
            draft.critic,
            draft.restaurant_id,
            draft.sections,
            votes,
            draft.comment,
        )?);
        self.persistence.put::<Critique>(id, &critique)?;

        let rating = self.refresh_mean_vote(&restaurant, draft.restaurant_id)?;
        info!(
            "event=critique_add module=catalogue status=ok oid={id} restaurant={} dishes={} mean_vote={}",
            draft.restaurant_id,
            critique.dishes().len(),
            rating.map_or_else(|| "none".to_string(), |value| format!("{value:.3}"))
        );
        Ok(id)
    }

    /// Recomputes, stores and returns the restaurant rating.
    ///
    /// Returns `None` while the restaurant has no critiques. Repeated calls
    /// without new critiques return the identical value.
    pub fn restaurant_mean_vote(&self, restaurant_id: Oid) -> CritiqueResult<Option<f64>> {
        let _guard = self.write_lock.lock();
        let restaurant = self.restaurant(restaurant_id)?;
        self.refresh_mean_vote(&restaurant, restaurant_id)
    }

    /// Every critique of one restaurant; empty when none were written.
    pub fn restaurant_critiques(&self, restaurant_id: Oid) -> CritiqueResult<Vec<Arc<Critique>>> {
        self.restaurant(restaurant_id)?;
        self.critiques_where(|critique| critique.restaurant_id() == restaurant_id)
    }

    /// Every critique written by `critic`.
    ///
    /// # Errors
    /// - `NoCritiques` when the critic has written none.
    pub fn critiques_by_user(&self, critic: &str) -> CritiqueResult<Vec<Arc<Critique>>> {
        non_empty(self.critiques_where(|critique| critique.critic() == critic)?)
    }

    /// Critiques of one restaurant whose `section` grade is `>= min_grade`.
    ///
    /// # Errors
    /// - `NoCritiques` when nothing meets the threshold.
    pub fn critiques_by_section_grade(
        &self,
        restaurant_id: Oid,
        section: CritiqueSection,
        min_grade: f64,
    ) -> CritiqueResult<Vec<Arc<Critique>>> {
        let matching = self
            .restaurant_critiques(restaurant_id)?
            .into_iter()
            .filter(|critique| critique.section_grade(section) >= min_grade)
            .collect();
        non_empty(matching)
    }

    /// Critiques of one restaurant whose section mean is `>= min_grade`.
    ///
    /// # Errors
    /// - `NoCritiques` when nothing meets the threshold.
    pub fn critiques_by_mean_grade(
        &self,
        restaurant_id: Oid,
        min_grade: f64,
    ) -> CritiqueResult<Vec<Arc<Critique>>> {
        let matching = self
            .restaurant_critiques(restaurant_id)?
            .into_iter()
            .filter(|critique| critique.mean_grade() >= min_grade)
            .collect();
        non_empty(matching)
    }

    fn resolve_votes(&self, draft: &CritiqueDraft) -> CritiqueResult<Vec<DishVote>> {
        draft
            .rated_dishes()
            .map(|(dish_id, grade)| {
                let dish = self.persistence.get::<MenuEntry>(dish_id)?;
                if dish.restaurant_id() != draft.restaurant_id {
                    warn!(
                        "event=critique_add module=catalogue status=rejected reason=dish_not_in_menu restaurant={} dish={dish_id}",
                        draft.restaurant_id
                    );
                    return Err(CritiqueError::DishNotInMenu {
                        restaurant: draft.restaurant_id,
                        dish: dish_id,
                    });
                }
                Ok(DishVote { dish, grade })
            })
            .collect()
    }

    // Caller holds `write_lock`.
    fn refresh_mean_vote(
        &self,
        restaurant: &SharedRestaurant,
        restaurant_id: Oid,
    ) -> CritiqueResult<Option<f64>> {
        let critiques = self.critiques_where(|critique| critique.restaurant_id() == restaurant_id)?;
        let rating = mean_vote(critiques.iter().map(Arc::as_ref));
        restaurant.write().set_mean_vote(rating);
        Ok(rating)
    }

    fn critiques_where(
        &self,
        predicate: impl Fn(&Critique) -> bool,
    ) -> CritiqueResult<Vec<Arc<Critique>>> {
        Ok(self
            .persistence
            .get_all::<Critique>()?
            .into_values()
            .filter(|critique| predicate(critique.as_ref()))
            .collect())
    }

    fn restaurant(&self, restaurant_id: Oid) -> CritiqueResult<SharedRestaurant> {
        Ok(self.persistence.get::<Restaurant>(restaurant_id)?)
    }
}

fn non_empty(critiques: Vec<Arc<Critique>>) -> CritiqueResult<Vec<Arc<Critique>>> {
    if critiques.is_empty() {
        return Err(CritiqueError::NoCritiques);
    }
    Ok(critiques)
}
