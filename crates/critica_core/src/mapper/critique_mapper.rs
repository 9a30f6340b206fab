//! Mapper for the `critiques` table.
//!
//! A critique row carries the section scores; its rated dishes live in
//! `critique_dish` and are read and written through `DishVoteMapper`.

use crate::db::SharedConnection;
use crate::mapper::{
    ensure_same_id, oid_column, query_ids, DishVoteMapper, EntityMapper, IdentityMap,
    PersistError, PersistResult,
};
use crate::model::critique::{Critique, DishVote, SectionScores};
use crate::model::oid::{EntityCategory, Oid};
use log::debug;
use rusqlite::{params, Row};
use std::sync::Arc;

const CRITIQUE_SELECT_SQL: &str = "SELECT
    code,
    critic,
    restaurant_code,
    service,
    ambience,
    value,
    comment
FROM critiques";

struct CritiqueRow {
    id: Oid,
    critic: String,
    restaurant_id: Oid,
    sections: SectionScores,
    comment: String,
}

/// Identity-mapped access to critiques.
pub struct CritiqueMapper {
    conn: SharedConnection,
    cache: IdentityMap<Arc<Critique>>,
    votes: Arc<DishVoteMapper>,
}

impl CritiqueMapper {
    pub fn new(conn: SharedConnection, votes: Arc<DishVoteMapper>) -> Self {
        Self {
            conn,
            cache: IdentityMap::new(),
            votes,
        }
    }

    fn load(&self, id: Oid) -> PersistResult<Arc<Critique>> {
        let row = self.load_row(id)?;
        let votes = self.votes.get(id)?;
        let critique = Critique::new(
            row.id,
            row.critic,
            row.restaurant_id,
            row.sections,
            votes,
            row.comment,
        )
        .map_err(|err| PersistError::InvalidData {
            category: EntityCategory::Critique,
            message: err.to_string(),
        })?;

        debug!(
            "event=mapper_load module=mapper status=ok category=critique oid={id} dishes={}",
            critique.dishes().len()
        );
        Ok(Arc::new(critique))
    }

    fn load_row(&self, id: Oid) -> PersistResult<CritiqueRow> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&format!("{CRITIQUE_SELECT_SQL} WHERE code = ?1;"))?;
        let mut rows = stmt.query([id.get()])?;
        if let Some(row) = rows.next()? {
            return parse_critique_row(row);
        }

        Err(PersistError::NotFound {
            category: EntityCategory::Critique,
            id,
        })
    }
}

impl EntityMapper for CritiqueMapper {
    type Handle = Arc<Critique>;

    fn category(&self) -> EntityCategory {
        EntityCategory::Critique
    }

    fn get(&self, id: Oid) -> PersistResult<Arc<Critique>> {
        self.cache.get_or_try_load(id, || self.load(id))
    }

    /// Writes the critique row, then replaces its dish-vote rows.
    fn put(&self, id: Oid, handle: &Arc<Critique>) -> PersistResult<()> {
        ensure_same_id(self.category(), id, handle.id())?;

        let [service, ambience, value] = handle.sections().as_array();
        self.conn.lock().execute(
            "INSERT INTO critiques (
                code,
                critic,
                restaurant_code,
                service,
                ambience,
                value,
                comment
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ON CONFLICT(code) DO UPDATE SET
                critic = excluded.critic,
                restaurant_code = excluded.restaurant_code,
                service = excluded.service,
                ambience = excluded.ambience,
                value = excluded.value,
                comment = excluded.comment;",
            params![
                id.get(),
                handle.critic(),
                handle.restaurant_id().get(),
                service,
                ambience,
                value,
                handle.comment(),
            ],
        )?;

        let votes: Vec<DishVote> = handle.dishes().values().cloned().collect();
        self.votes.put(id, &votes)?;

        self.cache.insert(id, Arc::clone(handle));
        debug!("event=mapper_put module=mapper status=ok category=critique oid={id}");
        Ok(())
    }

    fn stored_ids(&self) -> PersistResult<Vec<Oid>> {
        query_ids(
            &self.conn,
            "SELECT code FROM critiques ORDER BY code ASC;",
            [],
            "code",
            EntityCategory::Critique,
        )
    }

    fn cached_len(&self) -> usize {
        self.cache.len()
    }
}

fn parse_critique_row(row: &Row<'_>) -> PersistResult<CritiqueRow> {
    let category = EntityCategory::Critique;
    Ok(CritiqueRow {
        id: oid_column(row, "code", category)?,
        critic: row.get("critic")?,
        restaurant_id: oid_column(row, "restaurant_code", category)?,
        sections: SectionScores::new([
            row.get("service")?,
            row.get("ambience")?,
            row.get("value")?,
        ]),
        comment: row.get("comment")?,
    })
}
