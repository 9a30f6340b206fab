//! Mapper for the `menu_entries` table.

use crate::db::SharedConnection;
use crate::mapper::{
    ensure_same_id, oid_column, query_ids, EntityMapper, IdentityMap, PersistError,
    PersistResult,
};
use crate::model::oid::{EntityCategory, Oid};
use crate::model::restaurant::{DishCategory, MenuEntry};
use log::debug;
use rusqlite::{params, Row};
use std::sync::Arc;

const MENU_ENTRY_SELECT_SQL: &str = "SELECT
    code,
    restaurant_code,
    category,
    name,
    price
FROM menu_entries";

/// Identity-mapped access to menu entries.
pub struct MenuEntryMapper {
    conn: SharedConnection,
    cache: IdentityMap<Arc<MenuEntry>>,
}

impl MenuEntryMapper {
    pub fn new(conn: SharedConnection) -> Self {
        Self {
            conn,
            cache: IdentityMap::new(),
        }
    }

    /// Dish ids listed by one restaurant, in insertion (id) order.
    pub fn ids_for_restaurant(&self, restaurant_id: Oid) -> PersistResult<Vec<Oid>> {
        query_ids(
            &self.conn,
            "SELECT code FROM menu_entries WHERE restaurant_code = ?1 ORDER BY code ASC;",
            [restaurant_id.get()],
            "code",
            EntityCategory::MenuEntry,
        )
    }

    /// Resolves every dish of one restaurant through the identity map.
    pub fn entries_for_restaurant(&self, restaurant_id: Oid) -> PersistResult<Vec<Arc<MenuEntry>>> {
        self.ids_for_restaurant(restaurant_id)?
            .into_iter()
            .map(|id| self.get(id))
            .collect()
    }

    fn load(&self, id: Oid) -> PersistResult<Arc<MenuEntry>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&format!("{MENU_ENTRY_SELECT_SQL} WHERE code = ?1;"))?;
        let mut rows = stmt.query([id.get()])?;
        if let Some(row) = rows.next()? {
            debug!("event=mapper_load module=mapper status=ok category=menu_entry oid={id}");
            return Ok(Arc::new(parse_menu_entry_row(row)?));
        }

        Err(PersistError::NotFound {
            category: EntityCategory::MenuEntry,
            id,
        })
    }
}

impl EntityMapper for MenuEntryMapper {
    type Handle = Arc<MenuEntry>;

    fn category(&self) -> EntityCategory {
        EntityCategory::MenuEntry
    }

    fn get(&self, id: Oid) -> PersistResult<Arc<MenuEntry>> {
        self.cache.get_or_try_load(id, || self.load(id))
    }

    fn put(&self, id: Oid, handle: &Arc<MenuEntry>) -> PersistResult<()> {
        ensure_same_id(self.category(), id, handle.id())?;

        self.conn.lock().execute(
            "INSERT INTO menu_entries (
                code,
                restaurant_code,
                category,
                name,
                price
            ) VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(code) DO UPDATE SET
                restaurant_code = excluded.restaurant_code,
                category = excluded.category,
                name = excluded.name,
                price = excluded.price;",
            params![
                id.get(),
                handle.restaurant_id().get(),
                handle.category().as_str(),
                handle.name(),
                handle.price(),
            ],
        )?;

        self.cache.insert(id, Arc::clone(handle));
        debug!("event=mapper_put module=mapper status=ok category=menu_entry oid={id}");
        Ok(())
    }

    fn stored_ids(&self) -> PersistResult<Vec<Oid>> {
        query_ids(
            &self.conn,
            "SELECT code FROM menu_entries ORDER BY code ASC;",
            [],
            "code",
            EntityCategory::MenuEntry,
        )
    }

    fn cached_len(&self) -> usize {
        self.cache.len()
    }
}

fn parse_menu_entry_row(row: &Row<'_>) -> PersistResult<MenuEntry> {
    let category = EntityCategory::MenuEntry;
    let id = oid_column(row, "code", category)?;
    let restaurant_id = oid_column(row, "restaurant_code", category)?;

    let category_text: String = row.get("category")?;
    let dish_category =
        DishCategory::parse(&category_text).ok_or_else(|| PersistError::InvalidData {
            category,
            message: format!("invalid dish category `{category_text}` in menu_entries.category"),
        })?;

    let name: String = row.get("name")?;
    let price: f64 = row.get("price")?;
    MenuEntry::new(id, restaurant_id, dish_category, name, price).map_err(|err| {
        PersistError::InvalidData {
            category,
            message: err.to_string(),
        }
    })
}
