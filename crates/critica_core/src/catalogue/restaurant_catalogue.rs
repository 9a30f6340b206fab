//! Restaurant and menu catalogue.
//!
//! # Responsibility
//! - Register restaurants and menu entries.
//! - Expose read-through menu and overview queries.
//!
//! # Invariants
//! - No two restaurants share an identical (name, address) pair.
//! - Dish names are unique within one restaurant's full menu.
//! - Both comparisons are exact: no case or whitespace normalization.

use crate::mapper::PersistError;
use crate::model::oid::{EntityCategory, Oid};
use crate::model::restaurant::{
    DishCategory, MenuEntry, MenuEntryValidationError, Restaurant, RestaurantOverview,
    RestaurantValidationError, SharedRestaurant,
};
use crate::oid::OidGenerator;
use crate::persistence::PersistenceFacade;
use log::{info, warn};
use parking_lot::{Mutex, RwLock};
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;

pub type RestaurantResult<T> = Result<T, RestaurantError>;

#[derive(Debug, Error)]
pub enum RestaurantError {
    #[error("restaurant `{name}` at `{address}` is already registered")]
    DuplicateRestaurant { name: String, address: String },
    #[error("dish `{name}` is already on the menu of restaurant {restaurant}")]
    DuplicateDish { restaurant: Oid, name: String },
    #[error("restaurant not found: {0}")]
    RestaurantNotFound(Oid),
    #[error("dish {dish} not found on the menu of restaurant {restaurant}")]
    DishNotFound { restaurant: Oid, dish: Oid },
    #[error("no restaurants found for owner `{0}`")]
    NoRestaurantsFound(String),
    #[error(transparent)]
    InvalidRestaurant(#[from] RestaurantValidationError),
    #[error(transparent)]
    InvalidMenuEntry(#[from] MenuEntryValidationError),
    #[error(transparent)]
    Persistence(PersistError),
}

impl From<PersistError> for RestaurantError {
    fn from(value: PersistError) -> Self {
        match value {
            PersistError::NotFound {
                category: EntityCategory::Restaurant,
                id,
            } => Self::RestaurantNotFound(id),
            other => Self::Persistence(other),
        }
    }
}

pub struct RestaurantCatalogue {
    persistence: Arc<PersistenceFacade>,
    oids: Arc<OidGenerator>,
    write_lock: Mutex<()>,
}

impl RestaurantCatalogue {
    pub fn new(persistence: Arc<PersistenceFacade>, oids: Arc<OidGenerator>) -> Self {
        Self {
            persistence,
            oids,
            write_lock: Mutex::new(()),
        }
    }

    /// Registers a restaurant and returns its new id.
    ///
    /// # Errors
    /// - `InvalidRestaurant` when a field is blank.
    /// - `DuplicateRestaurant` when (name, address) is already registered.
    pub fn add_restaurant(
        &self,
        name: &str,
        address: &str,
        city: &str,
        owner: &str,
    ) -> RestaurantResult<Oid> {
        Restaurant::validate_details(name, address, city, owner)?;

        let _guard = self.write_lock.lock();
        let existing = self.persistence.get_all::<Restaurant>()?;
        if existing
            .values()
            .any(|restaurant| restaurant.read().is_located_at(name, address))
        {
            warn!("event=restaurant_add module=catalogue status=rejected reason=duplicate_restaurant");
            return Err(RestaurantError::DuplicateRestaurant {
                name: name.to_string(),
                address: address.to_string(),
            });
        }

        let id = self.oids.next_id(EntityCategory::Restaurant)?;
        let restaurant: SharedRestaurant =
            Arc::new(RwLock::new(Restaurant::new(id, name, address, city, owner)?));
        self.persistence.put::<Restaurant>(id, &restaurant)?;

        info!("event=restaurant_add module=catalogue status=ok oid={id}");
        Ok(id)
    }

    /// Adds a dish to a restaurant menu and returns the dish id.
    ///
    /// # Errors
    /// - `RestaurantNotFound` when `restaurant_id` does not resolve.
    /// - `DuplicateDish` when any category already lists `dish_name`.
    /// - `InvalidMenuEntry` for a blank name or an invalid price.
    pub fn add_menu_entry(
        &self,
        restaurant_id: Oid,
        category: DishCategory,
        dish_name: &str,
        price: f64,
    ) -> RestaurantResult<Oid> {
        MenuEntry::validate_details(dish_name, price)?;

        let _guard = self.write_lock.lock();
        let handle = self.restaurant(restaurant_id)?;
        let mut restaurant = handle.write();
        if restaurant.has_dish_named(dish_name) {
            warn!(
                "event=menu_entry_add module=catalogue status=rejected reason=duplicate_dish restaurant={restaurant_id}"
            );
            return Err(RestaurantError::DuplicateDish {
                restaurant: restaurant_id,
                name: dish_name.to_string(),
            });
        }

        let id = self.oids.next_id(EntityCategory::MenuEntry)?;
        let entry = Arc::new(MenuEntry::new(
            id,
            restaurant_id,
            category,
            dish_name,
            price,
        )?);
        self.persistence.put::<MenuEntry>(id, &entry)?;
        restaurant.push_menu_entry(entry);

        info!(
            "event=menu_entry_add module=catalogue status=ok restaurant={restaurant_id} oid={id} category={}",
            category.as_str()
        );
        Ok(id)
    }

    /// Every registered restaurant, id → name.
    pub fn all_restaurant_names(&self) -> RestaurantResult<BTreeMap<Oid, String>> {
        Ok(self
            .persistence
            .get_all::<Restaurant>()?
            .into_iter()
            .map(|(id, restaurant)| (id, restaurant.read().name().to_string()))
            .collect())
    }

    /// Restaurants owned by `owner`, id → name.
    ///
    /// # Errors
    /// - `NoRestaurantsFound` when `owner` owns none.
    pub fn my_restaurants(&self, owner: &str) -> RestaurantResult<BTreeMap<Oid, String>> {
        let owned: BTreeMap<Oid, String> = self
            .persistence
            .get_all::<Restaurant>()?
            .into_iter()
            .filter_map(|(id, handle)| {
                let restaurant = handle.read();
                let name = (restaurant.owner() == owner).then(|| restaurant.name().to_string());
                name.map(|name| (id, name))
            })
            .collect();

        if owned.is_empty() {
            return Err(RestaurantError::NoRestaurantsFound(owner.to_string()));
        }
        Ok(owned)
    }

    /// Ordered dish id → dish name pairs for one restaurant.
    pub fn menu_info(&self, restaurant_id: Oid) -> RestaurantResult<Vec<(Oid, String)>> {
        Ok(self.restaurant(restaurant_id)?.read().menu_info())
    }

    pub fn menu_codes(&self, restaurant_id: Oid) -> RestaurantResult<Vec<Oid>> {
        Ok(self.restaurant(restaurant_id)?.read().menu_codes())
    }

    /// Printable menu grouped by category.
    pub fn menu_listing(
        &self,
        restaurant_id: Oid,
    ) -> RestaurantResult<BTreeMap<DishCategory, Vec<String>>> {
        Ok(self.restaurant(restaurant_id)?.read().menu_listing())
    }

    /// One dish of one restaurant's menu.
    ///
    /// # Errors
    /// - `DishNotFound` when the dish is not on that restaurant's menu.
    pub fn dish(&self, restaurant_id: Oid, dish_id: Oid) -> RestaurantResult<Arc<MenuEntry>> {
        self.restaurant(restaurant_id)?
            .read()
            .dish(dish_id)
            .ok_or(RestaurantError::DishNotFound {
                restaurant: restaurant_id,
                dish: dish_id,
            })
    }

    pub fn overview(&self, restaurant_id: Oid) -> RestaurantResult<RestaurantOverview> {
        Ok(self.restaurant(restaurant_id)?.read().overview())
    }

    pub fn restaurant_name(&self, restaurant_id: Oid) -> RestaurantResult<String> {
        Ok(self.restaurant(restaurant_id)?.read().name().to_string())
    }

    /// `address, city` of one restaurant.
    pub fn restaurant_address(&self, restaurant_id: Oid) -> RestaurantResult<String> {
        Ok(self.restaurant(restaurant_id)?.read().city_address())
    }

    /// Last computed rating; `None` while the restaurant has no critiques.
    pub fn mean_vote(&self, restaurant_id: Oid) -> RestaurantResult<Option<f64>> {
        Ok(self.restaurant(restaurant_id)?.read().mean_vote())
    }

    fn restaurant(&self, restaurant_id: Oid) -> RestaurantResult<SharedRestaurant> {
        Ok(self.persistence.get::<Restaurant>(restaurant_id)?)
    }
}
