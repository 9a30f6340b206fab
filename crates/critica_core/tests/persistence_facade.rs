use critica_core::db::{open_db, open_db_in_memory, share};
use critica_core::{
    Critique, DishCategory, DishVote, EntityCategory, MenuEntry, Oid, PersistError,
    PersistenceFacade, Restaurant, SectionScores, SharedRestaurant,
};
use parking_lot::RwLock;
use std::path::Path;
use std::sync::Arc;

fn oid(value: i64) -> Oid {
    Oid::new(value).unwrap()
}

fn in_memory_facade() -> PersistenceFacade {
    PersistenceFacade::new(share(open_db_in_memory().unwrap()))
}

fn file_facade(path: &Path) -> PersistenceFacade {
    PersistenceFacade::new(share(open_db(path).unwrap()))
}

fn restaurant(id: i64, name: &str) -> SharedRestaurant {
    Arc::new(RwLock::new(
        Restaurant::new(oid(id), name, "Via Roma 1", "Rome", "u1").unwrap(),
    ))
}

fn menu_entry(id: i64, restaurant_id: i64, name: &str) -> Arc<MenuEntry> {
    Arc::new(
        MenuEntry::new(
            oid(id),
            oid(restaurant_id),
            DishCategory::FirstCourse,
            name,
            11.0,
        )
        .unwrap(),
    )
}

#[test]
fn put_then_get_returns_the_same_handle() {
    let facade = in_memory_facade();
    let handle = restaurant(1, "Roma");
    facade.put::<Restaurant>(oid(1), &handle).unwrap();

    let first = facade.get::<Restaurant>(oid(1)).unwrap();
    let second = facade.get::<Restaurant>(oid(1)).unwrap();
    assert!(Arc::ptr_eq(&handle, &first));
    assert!(Arc::ptr_eq(&first, &second));
}

#[test]
fn loaded_handles_are_materialized_once() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("critica.db");
    {
        let facade = file_facade(&path);
        facade.put::<Restaurant>(oid(1), &restaurant(1, "Roma")).unwrap();
        facade.put::<MenuEntry>(oid(1), &menu_entry(1, 1, "Carbonara")).unwrap();
    }

    let facade = file_facade(&path);
    assert_eq!(facade.cached_len::<Restaurant>(), 0);

    let first = facade.get::<Restaurant>(oid(1)).unwrap();
    let second = facade.get::<Restaurant>(oid(1)).unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(facade.cached_len::<Restaurant>(), 1);

    let dish = facade.get::<MenuEntry>(oid(1)).unwrap();
    let from_menu = first.read().dish(oid(1)).unwrap();
    assert!(Arc::ptr_eq(&dish, &from_menu));
}

#[test]
fn missing_id_is_not_found_and_not_cached() {
    let facade = in_memory_facade();

    let err = facade.get::<Restaurant>(oid(9)).unwrap_err();
    assert!(matches!(
        err,
        PersistError::NotFound {
            category: EntityCategory::Restaurant,
            id,
        } if id == oid(9)
    ));
    assert!(!err.is_infrastructure());
    assert_eq!(facade.cached_len::<Restaurant>(), 0);
}

#[test]
fn put_under_a_different_id_is_rejected() {
    let facade = in_memory_facade();
    let err = facade
        .put::<Restaurant>(oid(2), &restaurant(1, "Roma"))
        .unwrap_err();

    assert!(matches!(err, PersistError::IdMismatch { .. }));
    assert!(facade.get::<Restaurant>(oid(1)).is_err());
}

#[test]
fn get_all_is_ordered_by_id() {
    let facade = in_memory_facade();
    for (id, name) in [(3, "Terzo"), (1, "Primo"), (2, "Secondo")] {
        facade.put::<Restaurant>(oid(id), &restaurant(id, name)).unwrap();
    }

    let all = facade.get_all::<Restaurant>().unwrap();
    let names: Vec<String> = all
        .values()
        .map(|handle| handle.read().name().to_string())
        .collect();
    assert_eq!(names, vec!["Primo", "Secondo", "Terzo"]);
}

#[test]
fn dish_votes_put_is_idempotent_and_skips_unrated() {
    let facade = in_memory_facade();
    facade.put::<Restaurant>(oid(1), &restaurant(1, "Roma")).unwrap();
    let first = menu_entry(1, 1, "Carbonara");
    let second = menu_entry(2, 1, "Amatriciana");
    facade.put::<MenuEntry>(oid(1), &first).unwrap();
    facade.put::<MenuEntry>(oid(2), &second).unwrap();

    let critique = Arc::new(
        Critique::new(
            oid(1),
            "critic",
            oid(1),
            SectionScores::new([4.0, 4.0, 4.0]),
            [],
            "",
        )
        .unwrap(),
    );
    facade.put::<Critique>(oid(1), &critique).unwrap();

    let votes = vec![
        DishVote {
            dish: Arc::clone(&first),
            grade: 0.0,
        },
        DishVote {
            dish: Arc::clone(&second),
            grade: 4.0,
        },
    ];
    facade.put::<DishVote>(oid(1), &votes).unwrap();
    facade.put::<DishVote>(oid(1), &votes).unwrap();

    let stored = facade.get::<DishVote>(oid(1)).unwrap();
    assert_eq!(stored.len(), 1);
    assert!(Arc::ptr_eq(&stored[0].dish, &second));
    assert_eq!(stored[0].grade, 4.0);

    let by_critique = facade.get_all::<DishVote>().unwrap();
    assert_eq!(by_critique.keys().copied().collect::<Vec<_>>(), vec![oid(1)]);

    // Votes are owned by their critique and never cached on their own.
    assert_eq!(facade.cached_len::<DishVote>(), 0);
    assert_eq!(facade.cached_len::<Critique>(), 1);
}

#[test]
fn critique_reloads_with_its_dish_votes() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("critica.db");
    {
        let facade = file_facade(&path);
        facade.put::<Restaurant>(oid(1), &restaurant(1, "Roma")).unwrap();
        let dish = menu_entry(1, 1, "Carbonara");
        facade.put::<MenuEntry>(oid(1), &dish).unwrap();
        let critique = Critique::new(
            oid(1),
            "critic",
            oid(1),
            SectionScores::new([2.0, 3.0, 4.0]),
            [DishVote { dish, grade: 5.0 }],
            "buona",
        )
        .unwrap();
        facade.put::<Critique>(oid(1), &Arc::new(critique)).unwrap();
    }

    let facade = file_facade(&path);
    let critique = facade.get::<Critique>(oid(1)).unwrap();
    assert_eq!(critique.critic(), "critic");
    assert_eq!(critique.comment(), "buona");
    assert_eq!(critique.mean_grade(), 3.0);
    assert_eq!(critique.dishes()[&oid(1)].grade, 5.0);

    let restaurant = facade.get::<Restaurant>(oid(1)).unwrap();
    assert_eq!(restaurant.read().mean_vote(), Some(3.0));
}

#[test]
fn category_routing_is_fixed_per_type() {
    assert_eq!(
        PersistenceFacade::category_of::<Restaurant>(),
        EntityCategory::Restaurant
    );
    assert_eq!(
        PersistenceFacade::category_of::<DishVote>(),
        EntityCategory::DishVote
    );
}
