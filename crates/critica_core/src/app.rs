//! Review core wiring.
//!
//! `ReviewCore` owns one shared connection, one OID generator and one
//! persistence facade, and hands them to both catalogues. Hosts create a
//! single instance and pass it (or its catalogues) around explicitly.

use crate::catalogue::critique_catalogue::CritiqueCatalogue;
use crate::catalogue::restaurant_catalogue::RestaurantCatalogue;
use crate::config::CoreConfig;
use crate::db::{open_db, open_db_in_memory, share, DbResult};
use crate::oid::OidGenerator;
use crate::persistence::PersistenceFacade;
use log::info;
use std::sync::Arc;

pub struct ReviewCore {
    persistence: Arc<PersistenceFacade>,
    oids: Arc<OidGenerator>,
    restaurants: RestaurantCatalogue,
    critiques: CritiqueCatalogue,
}

impl ReviewCore {
    /// Opens the configured database, or an in-memory one when no path is set.
    ///
    /// Logging is not started here; see `CoreConfig::init_logging`.
    pub fn open(config: &CoreConfig) -> DbResult<Self> {
        let conn = match config.db_path.as_deref() {
            Some(path) => open_db(path)?,
            None => open_db_in_memory()?,
        };
        Ok(Self::from_connection(conn))
    }

    pub fn open_in_memory() -> DbResult<Self> {
        Ok(Self::from_connection(open_db_in_memory()?))
    }

    /// Wires the core over an already bootstrapped connection.
    pub fn from_connection(conn: rusqlite::Connection) -> Self {
        let conn = share(conn);
        let persistence = Arc::new(PersistenceFacade::new(conn.clone()));
        let oids = Arc::new(OidGenerator::new(conn));
        info!("event=core_open module=app status=ok");
        Self {
            restaurants: RestaurantCatalogue::new(Arc::clone(&persistence), Arc::clone(&oids)),
            critiques: CritiqueCatalogue::new(Arc::clone(&persistence), Arc::clone(&oids)),
            persistence,
            oids,
        }
    }

    pub fn restaurants(&self) -> &RestaurantCatalogue {
        &self.restaurants
    }

    pub fn critiques(&self) -> &CritiqueCatalogue {
        &self.critiques
    }

    pub fn persistence(&self) -> &Arc<PersistenceFacade> {
        &self.persistence
    }

    pub fn oids(&self) -> &Arc<OidGenerator> {
        &self.oids
    }
}

#[cfg(test)]
mod tests {
    use super::ReviewCore;
    use crate::config::CoreConfig;
    use crate::model::oid::EntityCategory;
    use crate::model::restaurant::Restaurant;

    #[test]
    fn catalogues_share_one_persistence_and_generator() {
        let core = ReviewCore::open(&CoreConfig::default()).expect("in-memory core");
        let id = core
            .restaurants()
            .add_restaurant("Osteria", "Via Po 3", "Turin", "u1")
            .expect("registration");

        assert_eq!(core.oids().current(EntityCategory::Restaurant).unwrap(), Some(id));
        assert_eq!(core.persistence().cached_len::<Restaurant>(), 1);
        assert!(core.critiques().restaurant_critiques(id).unwrap().is_empty());
    }

    #[test]
    fn file_backed_core_keeps_data_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let config = CoreConfig::default().with_db_path(dir.path().join("critica.db"));

        let id = {
            let core = ReviewCore::open(&config).unwrap();
            core.restaurants()
                .add_restaurant("Osteria", "Via Po 3", "Turin", "u1")
                .unwrap()
        };

        let core = ReviewCore::open(&config).unwrap();
        assert_eq!(core.restaurants().restaurant_name(id).unwrap(), "Osteria");
    }
}
