//! Persistence and caching core for restaurant reviews.
//!
//! Restaurants, menu entries, critiques and per-dish votes are stored in
//! SQLite and served through identity-mapped handles: within one
//! `ReviewCore`, every lookup of an id returns the same shared object.

pub mod app;
pub mod catalogue;
pub mod config;
pub mod db;
pub mod logging;
pub mod mapper;
pub mod model;
pub mod oid;
pub mod persistence;

pub use app::ReviewCore;
pub use catalogue::critique_catalogue::{CritiqueCatalogue, CritiqueError, CritiqueResult};
pub use catalogue::restaurant_catalogue::{
    RestaurantCatalogue, RestaurantError, RestaurantResult,
};
pub use config::CoreConfig;
pub use db::{DbError, DbResult};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use mapper::{EntityMapper, PersistError, PersistResult};
pub use model::critique::{
    Critique, CritiqueDraft, CritiqueSection, CritiqueValidationError, DishVote, SectionScores,
};
pub use model::oid::{EntityCategory, Oid};
pub use model::restaurant::{
    DishCategory, MenuEntry, Restaurant, RestaurantOverview, SharedRestaurant,
};
pub use oid::OidGenerator;
pub use persistence::{PersistenceFacade, Persistent};
