//! Mapper for the `critique_dish` table.
//!
//! Rows are keyed by critique id: `get` returns every vote of one critique
//! (possibly none) and `put` replaces that set. Votes are owned by their
//! critique, so there is no identity map here.

use crate::db::SharedConnection;
use crate::mapper::{query_ids, EntityMapper, MenuEntryMapper, PersistError, PersistResult};
use crate::model::critique::{DishVote, UNRATED_GRADE};
use crate::model::oid::{EntityCategory, Oid};
use log::debug;
use rusqlite::{params, TransactionBehavior};
use std::sync::Arc;

pub struct DishVoteMapper {
    conn: SharedConnection,
    menu: Arc<MenuEntryMapper>,
}

impl DishVoteMapper {
    pub fn new(conn: SharedConnection, menu: Arc<MenuEntryMapper>) -> Self {
        Self { conn, menu }
    }

    fn load_rows(&self, critique_id: Oid) -> PersistResult<Vec<(i64, f64)>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT dish_code, vote
             FROM critique_dish
             WHERE critique_code = ?1
             ORDER BY dish_code ASC;",
        )?;
        let mut rows = stmt.query([critique_id.get()])?;
        let mut votes = Vec::new();
        while let Some(row) = rows.next()? {
            votes.push((row.get("dish_code")?, row.get("vote")?));
        }
        Ok(votes)
    }
}

impl EntityMapper for DishVoteMapper {
    type Handle = Vec<DishVote>;

    fn category(&self) -> EntityCategory {
        EntityCategory::DishVote
    }

    fn get(&self, critique_id: Oid) -> PersistResult<Vec<DishVote>> {
        let category = self.category();
        self.load_rows(critique_id)?
            .into_iter()
            .map(|(dish_code, grade)| {
                let dish_id = Oid::new(dish_code).ok_or_else(|| PersistError::InvalidData {
                    category,
                    message: format!("non-positive dish code `{dish_code}` in critique_dish"),
                })?;
                let dish = self.menu.get(dish_id).map_err(|err| match err {
                    PersistError::NotFound { .. } => PersistError::InvalidData {
                        category,
                        message: format!(
                            "critique {critique_id} references missing dish {dish_id}"
                        ),
                    },
                    other => other,
                })?;
                Ok::<_, PersistError>(DishVote { dish, grade })
            })
            .collect()
    }

    /// Replaces the stored vote set of one critique in a single transaction.
    fn put(&self, critique_id: Oid, votes: &Vec<DishVote>) -> PersistResult<()> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        tx.execute(
            "DELETE FROM critique_dish WHERE critique_code = ?1;",
            [critique_id.get()],
        )?;

        let mut written = 0_usize;
        for vote in votes.iter().filter(|vote| vote.grade != UNRATED_GRADE) {
            tx.execute(
                "INSERT INTO critique_dish (critique_code, dish_code, vote)
                 VALUES (?1, ?2, ?3)
                 ON CONFLICT(critique_code, dish_code) DO UPDATE SET vote = excluded.vote;",
                params![critique_id.get(), vote.dish.id().get(), vote.grade],
            )?;
            written += 1;
        }
        tx.commit()?;

        debug!(
            "event=mapper_put module=mapper status=ok category=dish_vote oid={critique_id} rows={written}"
        );
        Ok(())
    }

    fn stored_ids(&self) -> PersistResult<Vec<Oid>> {
        query_ids(
            &self.conn,
            "SELECT DISTINCT critique_code FROM critique_dish ORDER BY critique_code ASC;",
            [],
            "critique_code",
            EntityCategory::DishVote,
        )
    }

    // No identity map: votes are re-read with their critique.
    fn cached_len(&self) -> usize {
        0
    }
}
