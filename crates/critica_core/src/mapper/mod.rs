//! Entity mappers between SQLite rows and identity-mapped domain objects.
//!
//! # Responsibility
//! - Define the per-category mapper contract (`EntityMapper`).
//! - Keep SQL details for every table inside this module.
//!
//! # Invariants
//! - At most one live handle per `Oid` and category (`IdentityMap`).
//! - The shared connection lock is never held while another mapper is
//!   called, so nested resolution (critique → dish vote → menu entry) cannot
//!   self-deadlock.
//! - Read paths reject malformed rows (`InvalidData`) instead of masking them.

use crate::db::{DbError, SharedConnection};
use crate::model::oid::{EntityCategory, Oid};
use rusqlite::{Params, Row};
use std::collections::BTreeMap;
use thiserror::Error;

pub mod critique_mapper;
pub mod dish_vote_mapper;
pub mod identity_map;
pub mod menu_entry_mapper;
pub mod restaurant_mapper;

pub use critique_mapper::CritiqueMapper;
pub use dish_vote_mapper::DishVoteMapper;
pub use identity_map::IdentityMap;
pub use menu_entry_mapper::MenuEntryMapper;
pub use restaurant_mapper::RestaurantMapper;

pub type PersistResult<T> = Result<T, PersistError>;

/// Mapper-level failure.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("{category} not found: {id}")]
    NotFound { category: EntityCategory, id: Oid },
    #[error(transparent)]
    Db(#[from] DbError),
    #[error("invalid persisted {category} data: {message}")]
    InvalidData {
        category: EntityCategory,
        message: String,
    },
    #[error("{category} handle with id {actual} cannot be stored under oid {expected}")]
    IdMismatch {
        category: EntityCategory,
        expected: Oid,
        actual: Oid,
    },
}

impl From<rusqlite::Error> for PersistError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl PersistError {
    /// Whether this error is an infrastructure failure rather than a lookup
    /// miss.
    pub fn is_infrastructure(&self) -> bool {
        !matches!(self, Self::NotFound { .. })
    }
}

/// Bridge between one table family and one entity category.
pub trait EntityMapper {
    /// Shared handle handed out to callers.
    type Handle: Clone;

    fn category(&self) -> EntityCategory;

    /// Returns the cached handle or loads, caches and returns it.
    fn get(&self, id: Oid) -> PersistResult<Self::Handle>;

    /// Writes the handle's persistable state and caches the same handle.
    ///
    /// Repeating a put for an unchanged handle leaves storage unchanged.
    fn put(&self, id: Oid, handle: &Self::Handle) -> PersistResult<()>;

    /// Every stored id of this category, ascending.
    fn stored_ids(&self) -> PersistResult<Vec<Oid>>;

    /// Number of handles currently held by the identity map.
    ///
    /// Mappers without an identity map (dish votes, owned by their critique)
    /// always report 0.
    fn cached_len(&self) -> usize;

    /// Every stored entity, resolved through `get`.
    fn get_all(&self) -> PersistResult<BTreeMap<Oid, Self::Handle>> {
        self.stored_ids()?
            .into_iter()
            .map(|id| self.get(id).map(|handle| (id, handle)))
            .collect()
    }
}

pub(crate) fn oid_column(
    row: &Row<'_>,
    column: &str,
    category: EntityCategory,
) -> PersistResult<Oid> {
    let value: i64 = row.get(column)?;
    Oid::new(value).ok_or_else(|| PersistError::InvalidData {
        category,
        message: format!("non-positive id `{value}` in column `{column}`"),
    })
}

pub(crate) fn ensure_same_id(
    category: EntityCategory,
    expected: Oid,
    actual: Oid,
) -> PersistResult<()> {
    if expected != actual {
        return Err(PersistError::IdMismatch {
            category,
            expected,
            actual,
        });
    }
    Ok(())
}

pub(crate) fn query_ids<P: Params>(
    conn: &SharedConnection,
    sql: &str,
    params: P,
    column: &str,
    category: EntityCategory,
) -> PersistResult<Vec<Oid>> {
    let conn = conn.lock();
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query(params)?;
    let mut ids = Vec::new();
    while let Some(row) = rows.next()? {
        ids.push(oid_column(row, column, category)?);
    }
    Ok(ids)
}
