//! Mapper for the `restaurants` table.
//!
//! Loading a restaurant also resolves its menu through `MenuEntryMapper` and
//! seeds the derived mean vote from stored critique scores, folded the same
//! way the critique catalogue recomputes it. Writing a restaurant
//! only touches its own row; menu entries are persisted by their own mapper.

use crate::db::SharedConnection;
use crate::mapper::{
    ensure_same_id, oid_column, query_ids, EntityMapper, IdentityMap, MenuEntryMapper,
    PersistError, PersistResult,
};
use crate::model::critique::{mean_of_section_means, SectionScores};
use crate::model::oid::{EntityCategory, Oid};
use crate::model::restaurant::{Restaurant, SharedRestaurant};
use log::debug;
use parking_lot::RwLock;
use rusqlite::{params, Connection, Row};
use std::sync::Arc;

const RESTAURANT_SELECT_SQL: &str = "SELECT
    code,
    name,
    address,
    city,
    owner
FROM restaurants";

// Critique-id order, as the critique catalogue folds them.
const RESTAURANT_SCORES_SQL: &str = "SELECT service, ambience, value
FROM critiques
WHERE restaurant_code = ?1
ORDER BY code ASC;";

/// Identity-mapped access to restaurants.
pub struct RestaurantMapper {
    conn: SharedConnection,
    cache: IdentityMap<SharedRestaurant>,
    menu: Arc<MenuEntryMapper>,
}

impl RestaurantMapper {
    pub fn new(conn: SharedConnection, menu: Arc<MenuEntryMapper>) -> Self {
        Self {
            conn,
            cache: IdentityMap::new(),
            menu,
        }
    }

    fn load(&self, id: Oid) -> PersistResult<SharedRestaurant> {
        let mut restaurant = self.load_row(id)?;
        for entry in self.menu.entries_for_restaurant(id)? {
            restaurant.push_menu_entry(entry);
        }

        debug!(
            "event=mapper_load module=mapper status=ok category=restaurant oid={id} dishes={}",
            restaurant.dishes().count()
        );
        Ok(Arc::new(RwLock::new(restaurant)))
    }

    fn load_row(&self, id: Oid) -> PersistResult<Restaurant> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&format!("{RESTAURANT_SELECT_SQL} WHERE code = ?1;"))?;
        let mut rows = stmt.query([id.get()])?;
        let Some(row) = rows.next()? else {
            return Err(PersistError::NotFound {
                category: EntityCategory::Restaurant,
                id,
            });
        };

        let mut restaurant = parse_restaurant_row(row)?;
        restaurant.set_mean_vote(mean_of_section_means(load_scores(&conn, id)?));
        Ok(restaurant)
    }
}

fn load_scores(conn: &Connection, restaurant_id: Oid) -> PersistResult<Vec<SectionScores>> {
    let mut stmt = conn.prepare(RESTAURANT_SCORES_SQL)?;
    let mut rows = stmt.query([restaurant_id.get()])?;
    let mut scores = Vec::new();
    while let Some(row) = rows.next()? {
        scores.push(SectionScores::new([
            row.get("service")?,
            row.get("ambience")?,
            row.get("value")?,
        ]));
    }
    Ok(scores)
}

impl EntityMapper for RestaurantMapper {
    type Handle = SharedRestaurant;

    fn category(&self) -> EntityCategory {
        EntityCategory::Restaurant
    }

    fn get(&self, id: Oid) -> PersistResult<SharedRestaurant> {
        self.cache.get_or_try_load(id, || self.load(id))
    }

    /// Must not be called while the caller holds a guard on `handle`.
    fn put(&self, id: Oid, handle: &SharedRestaurant) -> PersistResult<()> {
        {
            let restaurant = handle.read();
            ensure_same_id(self.category(), id, restaurant.id())?;

            self.conn.lock().execute(
                "INSERT INTO restaurants (
                    code,
                    name,
                    address,
                    city,
                    owner
                ) VALUES (?1, ?2, ?3, ?4, ?5)
                ON CONFLICT(code) DO UPDATE SET
                    name = excluded.name,
                    address = excluded.address,
                    city = excluded.city,
                    owner = excluded.owner;",
                params![
                    id.get(),
                    restaurant.name(),
                    restaurant.address(),
                    restaurant.city(),
                    restaurant.owner(),
                ],
            )?;
        }

        self.cache.insert(id, Arc::clone(handle));
        debug!("event=mapper_put module=mapper status=ok category=restaurant oid={id}");
        Ok(())
    }

    fn stored_ids(&self) -> PersistResult<Vec<Oid>> {
        query_ids(
            &self.conn,
            "SELECT code FROM restaurants ORDER BY code ASC;",
            [],
            "code",
            EntityCategory::Restaurant,
        )
    }

    fn cached_len(&self) -> usize {
        self.cache.len()
    }
}

fn parse_restaurant_row(row: &Row<'_>) -> PersistResult<Restaurant> {
    let category = EntityCategory::Restaurant;
    let id = oid_column(row, "code", category)?;
    let name: String = row.get("name")?;
    let address: String = row.get("address")?;
    let city: String = row.get("city")?;
    let owner: String = row.get("owner")?;

    Restaurant::new(id, name, address, city, owner).map_err(|err| PersistError::InvalidData {
        category,
        message: err.to_string(),
    })
}
