//! Restaurant and menu domain model.
//!
//! # Responsibility
//! - Define `Restaurant`, `MenuEntry` and the `DishCategory` menu sections.
//! - Provide the read projections served by the restaurant catalogue.
//!
//! # Invariants
//! - A restaurant menu always holds all four categories, in menu order.
//! - Menu entries keep insertion order within their category.
//! - `MenuEntry` price is finite and non-negative; names are never blank.

use crate::model::oid::Oid;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;

/// Shared, identity-mapped restaurant handle.
///
/// Every holder observes menu additions and mean-vote updates.
pub type SharedRestaurant = Arc<RwLock<Restaurant>>;

/// Menu section of a dish, ordered as served.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DishCategory {
    Starter,
    FirstCourse,
    MainCourse,
    Dessert,
}

impl DishCategory {
    pub const ALL: [Self; 4] = [
        Self::Starter,
        Self::FirstCourse,
        Self::MainCourse,
        Self::Dessert,
    ];

    /// Stable storage key (`menu_entries.category`).
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Starter => "starter",
            Self::FirstCourse => "first_course",
            Self::MainCourse => "main_course",
            Self::Dessert => "dessert",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "starter" => Some(Self::Starter),
            "first_course" => Some(Self::FirstCourse),
            "main_course" => Some(Self::MainCourse),
            "dessert" => Some(Self::Dessert),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RestaurantValidationError {
    #[error("restaurant {0} must not be blank")]
    BlankField(&'static str),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum MenuEntryValidationError {
    #[error("dish name must not be blank")]
    BlankName,
    #[error("dish price must be a finite non-negative number, got {0}")]
    InvalidPrice(f64),
}

/// One dish on a restaurant menu.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MenuEntry {
    id: Oid,
    restaurant_id: Oid,
    category: DishCategory,
    name: String,
    price: f64,
}

impl MenuEntry {
    /// Builds a validated menu entry.
    ///
    /// # Errors
    /// - `BlankName` when `name` is empty after trim.
    /// - `InvalidPrice` when `price` is negative, NaN or infinite.
    pub fn new(
        id: Oid,
        restaurant_id: Oid,
        category: DishCategory,
        name: impl Into<String>,
        price: f64,
    ) -> Result<Self, MenuEntryValidationError> {
        let name = name.into();
        Self::validate_details(&name, price)?;
        Ok(Self {
            id,
            restaurant_id,
            category,
            name,
            price,
        })
    }

    /// Checks name and price without allocating an identifier.
    pub fn validate_details(name: &str, price: f64) -> Result<(), MenuEntryValidationError> {
        if name.trim().is_empty() {
            return Err(MenuEntryValidationError::BlankName);
        }
        if !price.is_finite() || price < 0.0 {
            return Err(MenuEntryValidationError::InvalidPrice(price));
        }
        Ok(())
    }

    pub fn id(&self) -> Oid {
        self.id
    }

    /// Restaurant whose menu lists this dish.
    pub fn restaurant_id(&self) -> Oid {
        self.restaurant_id
    }

    pub fn category(&self) -> DishCategory {
        self.category
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn price(&self) -> f64 {
        self.price
    }
}

/// Summary card for one restaurant.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RestaurantOverview {
    pub id: Oid,
    pub name: String,
    pub address: String,
    pub city: String,
    pub owner: String,
    pub dish_count: usize,
    /// `None` until at least one critique exists.
    pub mean_vote: Option<f64>,
}

/// A registered restaurant with its menu and derived rating.
#[derive(Debug, Clone)]
pub struct Restaurant {
    id: Oid,
    name: String,
    address: String,
    city: String,
    owner: String,
    menu: BTreeMap<DishCategory, Vec<Arc<MenuEntry>>>,
    mean_vote: Option<f64>,
}

impl Restaurant {
    /// Builds a restaurant with an empty menu and no rating.
    ///
    /// # Errors
    /// - `BlankField` when any descriptive field is blank.
    pub fn new(
        id: Oid,
        name: impl Into<String>,
        address: impl Into<String>,
        city: impl Into<String>,
        owner: impl Into<String>,
    ) -> Result<Self, RestaurantValidationError> {
        let (name, address, city, owner) = (name.into(), address.into(), city.into(), owner.into());
        Self::validate_details(&name, &address, &city, &owner)?;
        Ok(Self {
            id,
            name,
            address,
            city,
            owner,
            menu: DishCategory::ALL
                .into_iter()
                .map(|category| (category, Vec::new()))
                .collect(),
            mean_vote: None,
        })
    }

    /// Checks registration fields without allocating an identifier.
    pub fn validate_details(
        name: &str,
        address: &str,
        city: &str,
        owner: &str,
    ) -> Result<(), RestaurantValidationError> {
        for (field, value) in [
            ("name", name),
            ("address", address),
            ("city", city),
            ("owner", owner),
        ] {
            if value.trim().is_empty() {
                return Err(RestaurantValidationError::BlankField(field));
            }
        }
        Ok(())
    }

    pub fn id(&self) -> Oid {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn city(&self) -> &str {
        &self.city
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Address line followed by city, e.g. `Via Roma 1, Rome`.
    pub fn city_address(&self) -> String {
        format!("{}, {}", self.address, self.city)
    }

    /// Exact (case and whitespace sensitive) identity check used for
    /// registration uniqueness.
    pub fn is_located_at(&self, name: &str, address: &str) -> bool {
        self.name == name && self.address == address
    }

    pub fn menu(&self) -> &BTreeMap<DishCategory, Vec<Arc<MenuEntry>>> {
        &self.menu
    }

    /// Iterates dishes in menu order.
    pub fn dishes(&self) -> impl Iterator<Item = &Arc<MenuEntry>> {
        self.menu.values().flatten()
    }

    /// Exact-match lookup across every category.
    pub fn has_dish_named(&self, name: &str) -> bool {
        self.dishes().any(|entry| entry.name() == name)
    }

    pub fn dish(&self, dish_id: Oid) -> Option<Arc<MenuEntry>> {
        self.dishes().find(|entry| entry.id() == dish_id).cloned()
    }

    /// Appends an entry to the end of its category.
    ///
    /// Uniqueness is the caller's responsibility (see `has_dish_named`).
    pub fn push_menu_entry(&mut self, entry: Arc<MenuEntry>) {
        self.menu.entry(entry.category()).or_default().push(entry);
    }

    /// Ordered dish id → dish name pairs.
    pub fn menu_info(&self) -> Vec<(Oid, String)> {
        self.dishes()
            .map(|entry| (entry.id(), entry.name().to_string()))
            .collect()
    }

    pub fn menu_codes(&self) -> Vec<Oid> {
        self.dishes().map(|entry| entry.id()).collect()
    }

    /// Printable menu lines grouped by category (`Carbonara - 12.50`).
    pub fn menu_listing(&self) -> BTreeMap<DishCategory, Vec<String>> {
        self.menu
            .iter()
            .map(|(category, entries)| {
                let lines = entries
                    .iter()
                    .map(|entry| format!("{} - {:.2}", entry.name(), entry.price()))
                    .collect();
                (*category, lines)
            })
            .collect()
    }

    pub fn mean_vote(&self) -> Option<f64> {
        self.mean_vote
    }

    pub fn set_mean_vote(&mut self, mean_vote: Option<f64>) {
        self.mean_vote = mean_vote;
    }

    pub fn overview(&self) -> RestaurantOverview {
        RestaurantOverview {
            id: self.id,
            name: self.name.clone(),
            address: self.address.clone(),
            city: self.city.clone(),
            owner: self.owner.clone(),
            dish_count: self.dishes().count(),
            mean_vote: self.mean_vote,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{DishCategory, MenuEntry, MenuEntryValidationError, Restaurant};
    use crate::model::oid::Oid;
    use std::sync::Arc;

    fn oid(value: i64) -> Oid {
        Oid::new(value).expect("positive oid")
    }

    fn sample_restaurant() -> Restaurant {
        Restaurant::new(oid(1), "Trattoria Roma", "Via Roma 1", "Rome", "u1")
            .expect("valid restaurant")
    }

    #[test]
    fn new_restaurant_has_every_category_and_no_rating() {
        let restaurant = sample_restaurant();
        assert_eq!(restaurant.menu().len(), DishCategory::ALL.len());
        assert!(restaurant.menu().values().all(Vec::is_empty));
        assert_eq!(restaurant.mean_vote(), None);
    }

    #[test]
    fn menu_keeps_category_order_then_insertion_order() {
        let mut restaurant = sample_restaurant();
        let dessert = MenuEntry::new(oid(10), oid(1), DishCategory::Dessert, "Tiramisu", 6.0)
            .expect("valid entry");
        let first = MenuEntry::new(oid(11), oid(1), DishCategory::FirstCourse, "Carbonara", 12.5)
            .expect("valid entry");
        let starter = MenuEntry::new(oid(12), oid(1), DishCategory::Starter, "Bruschetta", 5.0)
            .expect("valid entry");
        restaurant.push_menu_entry(Arc::new(dessert));
        restaurant.push_menu_entry(Arc::new(first));
        restaurant.push_menu_entry(Arc::new(starter));

        assert_eq!(restaurant.menu_codes(), vec![oid(12), oid(11), oid(10)]);
        assert!(restaurant.has_dish_named("Carbonara"));
        assert!(!restaurant.has_dish_named("carbonara"));

        let listing = restaurant.menu_listing();
        assert_eq!(
            listing[&DishCategory::FirstCourse],
            vec!["Carbonara - 12.50".to_string()]
        );
    }

    #[test]
    fn menu_entry_rejects_negative_and_non_finite_prices() {
        let negative = MenuEntry::new(oid(1), oid(1), DishCategory::Starter, "Olives", -1.0);
        assert_eq!(negative, Err(MenuEntryValidationError::InvalidPrice(-1.0)));
        assert!(MenuEntry::new(oid(1), oid(1), DishCategory::Starter, "Olives", f64::NAN).is_err());
        assert!(MenuEntry::new(oid(1), oid(1), DishCategory::Starter, "Olives", 0.0).is_ok());
    }

    #[test]
    fn restaurant_rejects_blank_fields() {
        let err = Restaurant::new(oid(1), "Roma", "  ", "Rome", "u1").expect_err("blank address");
        assert_eq!(err.to_string(), "restaurant address must not be blank");
    }

    #[test]
    fn location_match_is_exact() {
        let restaurant = sample_restaurant();
        assert!(restaurant.is_located_at("Trattoria Roma", "Via Roma 1"));
        assert!(!restaurant.is_located_at("Trattoria Roma", "via roma 1"));
        assert!(!restaurant.is_located_at("Trattoria Roma ", "Via Roma 1"));
    }
}
