use critica_core::{DishCategory, Oid, RestaurantError, ReviewCore};

fn core() -> ReviewCore {
    ReviewCore::open_in_memory().unwrap()
}

#[test]
fn duplicate_name_and_address_is_rejected() {
    let core = core();
    let catalogue = core.restaurants();
    catalogue
        .add_restaurant("Trattoria Roma", "Via Roma 1", "Rome", "u1")
        .unwrap();

    let err = catalogue
        .add_restaurant("Trattoria Roma", "Via Roma 1", "Milan", "u2")
        .unwrap_err();
    assert!(matches!(err, RestaurantError::DuplicateRestaurant { .. }));

    let other = catalogue
        .add_restaurant("Trattoria Roma", "Via Roma 2", "Rome", "u1")
        .unwrap();
    assert_eq!(other.get(), 2);
    assert_eq!(catalogue.all_restaurant_names().unwrap().len(), 2);
}

#[test]
fn blank_fields_are_rejected_without_consuming_ids() {
    let core = core();
    let err = core
        .restaurants()
        .add_restaurant("Roma", "", "Rome", "u1")
        .unwrap_err();
    assert!(matches!(err, RestaurantError::InvalidRestaurant(_)));

    let id = core
        .restaurants()
        .add_restaurant("Roma", "Via Roma 1", "Rome", "u1")
        .unwrap();
    assert_eq!(id.get(), 1);
}

#[test]
fn dish_names_are_unique_per_restaurant() {
    let core = core();
    let catalogue = core.restaurants();
    let roma = catalogue
        .add_restaurant("Trattoria Roma", "Via Roma 1", "Rome", "u1")
        .unwrap();
    let napoli = catalogue
        .add_restaurant("Da Michele", "Via Cesare Sersale 1", "Naples", "u2")
        .unwrap();

    catalogue
        .add_menu_entry(roma, DishCategory::FirstCourse, "Carbonara", 12.5)
        .unwrap();
    let err = catalogue
        .add_menu_entry(roma, DishCategory::MainCourse, "Carbonara", 14.0)
        .unwrap_err();
    assert!(matches!(
        err,
        RestaurantError::DuplicateDish { restaurant, ref name }
            if restaurant == roma && name == "Carbonara"
    ));

    catalogue
        .add_menu_entry(napoli, DishCategory::FirstCourse, "Carbonara", 11.0)
        .unwrap();
}

#[test]
fn menu_queries_follow_category_order() {
    let core = core();
    let catalogue = core.restaurants();
    let id = catalogue
        .add_restaurant("Trattoria Roma", "Via Roma 1", "Rome", "u1")
        .unwrap();

    let tiramisu = catalogue
        .add_menu_entry(id, DishCategory::Dessert, "Tiramisu", 6.0)
        .unwrap();
    let bruschetta = catalogue
        .add_menu_entry(id, DishCategory::Starter, "Bruschetta", 5.0)
        .unwrap();
    let carbonara = catalogue
        .add_menu_entry(id, DishCategory::FirstCourse, "Carbonara", 12.5)
        .unwrap();

    assert_eq!(
        catalogue.menu_codes(id).unwrap(),
        vec![bruschetta, carbonara, tiramisu]
    );
    assert_eq!(
        catalogue.menu_info(id).unwrap()[1],
        (carbonara, "Carbonara".to_string())
    );

    let listing = catalogue.menu_listing(id).unwrap();
    assert_eq!(listing[&DishCategory::Dessert], vec!["Tiramisu - 6.00"]);
    assert!(listing[&DishCategory::MainCourse].is_empty());

    let dish = catalogue.dish(id, carbonara).unwrap();
    assert_eq!(dish.price(), 12.5);
    assert_eq!(dish.category(), DishCategory::FirstCourse);

    let overview = catalogue.overview(id).unwrap();
    assert_eq!(overview.dish_count, 3);
    assert_eq!(overview.mean_vote, None);
    assert_eq!(
        catalogue.restaurant_address(id).unwrap(),
        "Via Roma 1, Rome"
    );
}

#[test]
fn dish_of_another_restaurant_is_not_found() {
    let core = core();
    let catalogue = core.restaurants();
    let roma = catalogue
        .add_restaurant("Trattoria Roma", "Via Roma 1", "Rome", "u1")
        .unwrap();
    let napoli = catalogue
        .add_restaurant("Da Michele", "Via Cesare Sersale 1", "Naples", "u2")
        .unwrap();
    let pizza = catalogue
        .add_menu_entry(napoli, DishCategory::MainCourse, "Margherita", 5.0)
        .unwrap();

    let err = catalogue.dish(roma, pizza).unwrap_err();
    assert!(matches!(err, RestaurantError::DishNotFound { .. }));
}

#[test]
fn my_restaurants_filters_by_owner() {
    let core = core();
    let catalogue = core.restaurants();
    let first = catalogue
        .add_restaurant("Trattoria Roma", "Via Roma 1", "Rome", "u1")
        .unwrap();
    catalogue
        .add_restaurant("Da Michele", "Via Cesare Sersale 1", "Naples", "u2")
        .unwrap();
    let third = catalogue
        .add_restaurant("Osteria", "Via Po 3", "Turin", "u1")
        .unwrap();

    let owned = catalogue.my_restaurants("u1").unwrap();
    assert_eq!(owned.keys().copied().collect::<Vec<_>>(), vec![first, third]);
    assert_eq!(owned[&third], "Osteria");

    let err = catalogue.my_restaurants("nobody").unwrap_err();
    assert!(matches!(err, RestaurantError::NoRestaurantsFound(owner) if owner == "nobody"));
}

#[test]
fn unknown_restaurant_is_reported_by_id() {
    let core = core();
    let missing = Oid::new(77).unwrap();

    let err = core
        .restaurants()
        .add_menu_entry(missing, DishCategory::Starter, "Olives", 3.0)
        .unwrap_err();
    assert!(matches!(err, RestaurantError::RestaurantNotFound(id) if id == missing));
    assert!(matches!(
        core.restaurants().menu_info(missing),
        Err(RestaurantError::RestaurantNotFound(_))
    ));
}

#[test]
fn menu_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let config = critica_core::CoreConfig::default().with_db_path(dir.path().join("critica.db"));

    let (id, dish) = {
        let core = ReviewCore::open(&config).unwrap();
        let id = core
            .restaurants()
            .add_restaurant("Trattoria Roma", "Via Roma 1", "Rome", "u1")
            .unwrap();
        let dish = core
            .restaurants()
            .add_menu_entry(id, DishCategory::FirstCourse, "Carbonara", 12.5)
            .unwrap();
        (id, dish)
    };

    let core = ReviewCore::open(&config).unwrap();
    assert_eq!(
        core.restaurants().menu_info(id).unwrap(),
        vec![(dish, "Carbonara".to_string())]
    );
    let err = core
        .restaurants()
        .add_menu_entry(id, DishCategory::MainCourse, "Carbonara", 9.0)
        .unwrap_err();
    assert!(matches!(err, RestaurantError::DuplicateDish { .. }));
    let next = core
        .restaurants()
        .add_menu_entry(id, DishCategory::Dessert, "Tiramisu", 6.0)
        .unwrap();
    assert!(next > dish);
}

#[test]
fn racing_registrations_of_one_restaurant_admit_exactly_one() {
    let core = core();
    let barrier = std::sync::Barrier::new(8);

    let outcomes: Vec<_> = std::thread::scope(|scope| {
        let workers: Vec<_> = (0..8)
            .map(|index| {
                let (core, barrier) = (&core, &barrier);
                scope.spawn(move || {
                    barrier.wait();
                    core.restaurants().add_restaurant(
                        "Trattoria Roma",
                        "Via Roma 1",
                        "Rome",
                        &format!("u{index}"),
                    )
                })
            })
            .collect();
        workers
            .into_iter()
            .map(|worker| worker.join().unwrap())
            .collect()
    });

    assert_eq!(outcomes.iter().filter(|outcome| outcome.is_ok()).count(), 1);
    assert_eq!(
        outcomes
            .iter()
            .filter(|outcome| matches!(outcome, Err(RestaurantError::DuplicateRestaurant { .. })))
            .count(),
        7
    );
    assert_eq!(core.restaurants().all_restaurant_names().unwrap().len(), 1);
}

#[test]
fn racing_additions_of_one_dish_admit_exactly_one() {
    let core = core();
    let id = core
        .restaurants()
        .add_restaurant("Trattoria Roma", "Via Roma 1", "Rome", "u1")
        .unwrap();
    let barrier = std::sync::Barrier::new(8);

    let outcomes: Vec<_> = std::thread::scope(|scope| {
        let workers: Vec<_> = (0..8)
            .map(|index| {
                let (core, barrier) = (&core, &barrier);
                let category = DishCategory::ALL[index % DishCategory::ALL.len()];
                scope.spawn(move || {
                    barrier.wait();
                    core.restaurants()
                        .add_menu_entry(id, category, "Carbonara", 12.5)
                })
            })
            .collect();
        workers
            .into_iter()
            .map(|worker| worker.join().unwrap())
            .collect()
    });

    assert_eq!(outcomes.iter().filter(|outcome| outcome.is_ok()).count(), 1);
    assert_eq!(
        outcomes
            .iter()
            .filter(|outcome| matches!(outcome, Err(RestaurantError::DuplicateDish { .. })))
            .count(),
        7
    );
    assert_eq!(core.restaurants().menu_codes(id).unwrap().len(), 1);
}
