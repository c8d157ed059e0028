use route_guide::{
    store::ROUTES_KEY, FileStore, GeoPoint, KeyValueStore, Route, RouteError, RouteStore,
};

fn route(name: &str) -> Route {
    Route::new(
        name,
        vec![
            GeoPoint::new(52.5200, 13.4050, 0, Some(4.0)).unwrap(),
            GeoPoint::new(52.5210, 13.4070, 1_000, Some(3.5)).unwrap(),
            GeoPoint::new(52.5225, 13.4090, 2_000, None).unwrap(),
        ],
        2,
    )
    .unwrap()
}

#[test]
fn routes_survive_reopening_the_store() {
    let dir = tempfile::tempdir().unwrap();

    let saved = {
        let mut store = RouteStore::new(FileStore::new(dir.path()).unwrap());
        store.save_route(route("Spree loop")).unwrap()
    };

    let store = RouteStore::new(FileStore::new(dir.path()).unwrap());
    let loaded = store.get_route(saved.id).unwrap();
    assert_eq!(loaded, saved);
    assert!(dir.path().join(format!("{}.json", ROUTES_KEY)).exists());
}

#[test]
fn missing_file_means_no_routes() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = RouteStore::new(FileStore::new(dir.path().join("nested")).unwrap());

    assert!(store.list_routes().unwrap().is_empty());
    assert!(matches!(store.delete_route(1), Err(RouteError::NotFound(1))));
    store.clear_all().unwrap();
}

#[test]
fn failed_import_leaves_file_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = RouteStore::new(FileStore::new(dir.path()).unwrap());
    store.save_route(route("Keep me")).unwrap();

    let before = store.backend().get(ROUTES_KEY).unwrap();
    let result = store.import_json("this is not json");

    assert!(matches!(result, Err(RouteError::Persistence(_))));
    assert_eq!(store.backend().get(ROUTES_KEY).unwrap(), before);
    assert_eq!(store.list_routes().unwrap().len(), 1);
}

#[test]
fn import_accepts_browser_export_format() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = RouteStore::new(FileStore::new(dir.path()).unwrap());

    let exported = r#"[
      {
        "id": 1700000000000,
        "name": "Route 11/14/2023, 11:13:20 PM",
        "points": [
          {"lat": 52.52, "lon": 13.405, "timestamp": 1700000000000, "accuracy": 12.5},
          {"lat": 52.521, "lon": 13.407, "timestamp": 1700000001000, "accuracy": 9}
        ],
        "distance": 0.17,
        "duration": 1,
        "created": "2023-11-14T22:13:20.000Z"
      }
    ]"#;

    assert_eq!(store.import_json(exported).unwrap(), 1);
    let route = store.get_route(1_700_000_000_000).unwrap();
    assert_eq!(route.points.len(), 2);
    assert_eq!(route.points[1].accuracy, Some(9.0));
}
