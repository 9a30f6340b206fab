//! Persisted per-category OID generator.
//!
//! # Responsibility
//! - Issue strictly increasing identifiers for each `EntityCategory`.
//! - Persist the last issued value before returning it, so numbering resumes
//!   after a restart.
//!
//! # Invariants
//! - Issuance is one atomic upsert under the shared connection lock; two
//!   callers can never observe the same value for one category.
//! - Identifiers are never released or reused.

use crate::db::SharedConnection;
use crate::mapper::{PersistError, PersistResult};
use crate::model::oid::{EntityCategory, Oid};
use log::{debug, error};
use rusqlite::OptionalExtension;

const NEXT_ID_SQL: &str = "INSERT INTO oid_counters (category, last_value)
VALUES (?1, 1)
ON CONFLICT(category) DO UPDATE SET last_value = last_value + 1
RETURNING last_value;";

pub struct OidGenerator {
    conn: SharedConnection,
}

impl OidGenerator {
    pub fn new(conn: SharedConnection) -> Self {
        Self { conn }
    }

    /// Increments, persists and returns the next id for `category`.
    ///
    /// # Errors
    /// - `Db` when the counter table cannot be read or written; no id is
    ///   issued in that case.
    pub fn next_id(&self, category: EntityCategory) -> PersistResult<Oid> {
        let issued = self
            .conn
            .lock()
            .query_row(NEXT_ID_SQL, [category.as_str()], |row| row.get::<_, i64>(0));

        let value = match issued {
            Ok(value) => value,
            Err(err) => {
                error!(
                    "event=oid_issue module=oid status=error category={category} error_code=counter_unavailable error={err}"
                );
                return Err(err.into());
            }
        };

        let oid = counter_to_oid(category, value)?;
        debug!("event=oid_issue module=oid status=ok category={category} oid={oid}");
        Ok(oid)
    }

    /// Last id issued for `category`, if any.
    pub fn current(&self, category: EntityCategory) -> PersistResult<Option<Oid>> {
        let value = self
            .conn
            .lock()
            .query_row(
                "SELECT last_value FROM oid_counters WHERE category = ?1;",
                [category.as_str()],
                |row| row.get::<_, i64>(0),
            )
            .optional()?;

        value
            .map(|value| counter_to_oid(category, value))
            .transpose()
    }
}

fn counter_to_oid(category: EntityCategory, value: i64) -> PersistResult<Oid> {
    Oid::new(value).ok_or_else(|| PersistError::InvalidData {
        category,
        message: format!("non-positive counter value `{value}` in oid_counters"),
    })
}

#[cfg(test)]
mod tests {
    use super::OidGenerator;
    use crate::db::{open_db_in_memory, share};
    use crate::model::oid::EntityCategory;

    #[test]
    fn first_id_is_one_and_categories_are_independent() {
        let generator = OidGenerator::new(share(open_db_in_memory().unwrap()));

        assert_eq!(generator.current(EntityCategory::Restaurant).unwrap(), None);
        assert_eq!(generator.next_id(EntityCategory::Restaurant).unwrap().get(), 1);
        assert_eq!(generator.next_id(EntityCategory::Restaurant).unwrap().get(), 2);
        assert_eq!(generator.next_id(EntityCategory::MenuEntry).unwrap().get(), 1);
        assert_eq!(
            generator
                .current(EntityCategory::Restaurant)
                .unwrap()
                .map(|oid| oid.get()),
            Some(2)
        );
    }

    #[test]
    fn unreachable_counter_table_propagates_as_db_error() {
        let conn = open_db_in_memory().unwrap();
        conn.execute_batch("DROP TABLE oid_counters;").unwrap();
        let generator = OidGenerator::new(share(conn));

        let err = generator
            .next_id(EntityCategory::Critique)
            .expect_err("missing counter table must fail");
        assert!(err.is_infrastructure());
    }
}
