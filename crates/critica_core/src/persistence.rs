//! Persistence facade.
//!
//! # Responsibility
//! - Be the single entry point catalogues use for entity access.
//! - Route `get`/`put`/`get_all` to the mapper of the requested entity type.
//!
//! # Invariants
//! - Category → mapper routing is fixed at compile time by `Persistent`.
//! - The facade owns every mapper and therefore every identity map; callers
//!   only hold the handles it returns.

use crate::db::SharedConnection;
use crate::mapper::{
    CritiqueMapper, DishVoteMapper, EntityMapper, MenuEntryMapper, PersistResult,
    RestaurantMapper,
};
use crate::model::critique::{Critique, DishVote};
use crate::model::oid::{EntityCategory, Oid};
use crate::model::restaurant::{MenuEntry, Restaurant, SharedRestaurant};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Entity types stored through the facade.
pub trait Persistent {
    const CATEGORY: EntityCategory;
    type Handle: Clone;
    type Mapper: EntityMapper<Handle = Self::Handle>;

    fn mapper(facade: &PersistenceFacade) -> &Self::Mapper;
}

impl Persistent for Restaurant {
    const CATEGORY: EntityCategory = EntityCategory::Restaurant;
    type Handle = SharedRestaurant;
    type Mapper = RestaurantMapper;

    fn mapper(facade: &PersistenceFacade) -> &Self::Mapper {
        &facade.restaurants
    }
}

impl Persistent for MenuEntry {
    const CATEGORY: EntityCategory = EntityCategory::MenuEntry;
    type Handle = Arc<MenuEntry>;
    type Mapper = MenuEntryMapper;

    fn mapper(facade: &PersistenceFacade) -> &Self::Mapper {
        &facade.menu_entries
    }
}

impl Persistent for Critique {
    const CATEGORY: EntityCategory = EntityCategory::Critique;
    type Handle = Arc<Critique>;
    type Mapper = CritiqueMapper;

    fn mapper(facade: &PersistenceFacade) -> &Self::Mapper {
        &facade.critiques
    }
}

/// Dish votes are addressed by the id of the critique that owns them.
impl Persistent for DishVote {
    const CATEGORY: EntityCategory = EntityCategory::DishVote;
    type Handle = Vec<DishVote>;
    type Mapper = DishVoteMapper;

    fn mapper(facade: &PersistenceFacade) -> &Self::Mapper {
        &facade.dish_votes
    }
}

pub struct PersistenceFacade {
    restaurants: RestaurantMapper,
    menu_entries: Arc<MenuEntryMapper>,
    critiques: CritiqueMapper,
    dish_votes: Arc<DishVoteMapper>,
}

impl PersistenceFacade {
    /// Wires every mapper over one shared, migrated connection.
    pub fn new(conn: SharedConnection) -> Self {
        let menu_entries = Arc::new(MenuEntryMapper::new(conn.clone()));
        let dish_votes = Arc::new(DishVoteMapper::new(conn.clone(), Arc::clone(&menu_entries)));
        Self {
            restaurants: RestaurantMapper::new(conn.clone(), Arc::clone(&menu_entries)),
            critiques: CritiqueMapper::new(conn, Arc::clone(&dish_votes)),
            menu_entries,
            dish_votes,
        }
    }

    pub fn get<E: Persistent>(&self, id: Oid) -> PersistResult<E::Handle> {
        E::mapper(self).get(id)
    }

    pub fn put<E: Persistent>(&self, id: Oid, handle: &E::Handle) -> PersistResult<()> {
        E::mapper(self).put(id, handle)
    }

    pub fn get_all<E: Persistent>(&self) -> PersistResult<BTreeMap<Oid, E::Handle>> {
        E::mapper(self).get_all()
    }

    /// Number of materialized handles for `E`; 0 for uncached categories.
    pub fn cached_len<E: Persistent>(&self) -> usize {
        E::mapper(self).cached_len()
    }

    pub fn category_of<E: Persistent>() -> EntityCategory {
        E::CATEGORY
    }
}
