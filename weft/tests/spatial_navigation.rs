use indexmap::IndexMap;
use proptest::prelude::*;
use weft::algorithms::navigation::within_window;
use weft::{
    build_spatial_hash, navigate, query_nearby_objects, CanvasIndex, Direction, NavigationStage, Navigator, NavigatorEvent, NavigatorState,
    ObjectKind, PendingMove, PositionedObject,
};

fn node(id: &str, x: f64, y: f64) -> PositionedObject {
    PositionedObject::new(id, ObjectKind::Node, x, y).with_size(32.0, 32.0)
}

fn index_of(objs: &[PositionedObject], cell: f64) -> CanvasIndex {
    let map: IndexMap<String, PositionedObject> = objs.iter().map(|o| (o.id.clone(), o.clone())).collect();
    CanvasIndex::build(map, cell)
}

#[test]
fn negative_coordinates_floor_into_lower_cells() {
    let idx = index_of(&[node("a", -1.0, -0.5), node("b", 99.9, 100.0)], 100.0);
    assert!(idx.hash.bucket((-1, -1)).unwrap().contains("a"));
    assert!(idx.hash.bucket((0, 1)).unwrap().contains("b"));
    assert_eq!(idx.hash.len(), 2);
}

#[test]
fn nearby_query_skips_reference_and_far_cells() {
    let idx = index_of(&[node("a", 0.0, 0.0), node("far", 450.0, 0.0), node("b", 150.0, 50.0)], 100.0);
    let a = idx.get("a").unwrap();
    let hit = query_nearby_objects(a, &idx.objects, &idx.hash, |_, _| true).unwrap();
    assert_eq!(hit.id, "b");
    assert!(query_nearby_objects(a, &idx.objects, &idx.hash, |_, c| c.id == "far").is_none());
}

#[test]
fn directional_hit_prefers_on_axis_candidates() {
    let idx = index_of(&[node("a", 0.0, 0.0), node("diag", 60.0, 60.0), node("right", 90.0, 0.0)], 100.0);
    let hit = navigate(idx.get("a").unwrap(), Direction::Right, &idx).unwrap();
    assert_eq!((hit.id.as_str(), hit.stage), ("right", NavigationStage::Directional));
    let back = navigate(idx.get("right").unwrap(), Direction::Left, &idx).unwrap();
    assert_eq!(back.id, "a");
}

#[test]
fn falls_back_to_nearby_then_first_object() {
    let idx = index_of(&[node("a", 0.0, 0.0), node("b", 60.0, 0.0)], 100.0);
    let hit = navigate(idx.get("a").unwrap(), Direction::Top, &idx).unwrap();
    assert_eq!((hit.id.as_str(), hit.stage), ("b", NavigationStage::Nearby));

    let sparse = index_of(&[node("z", 1000.0, 1000.0), node("a", 0.0, 0.0)], 100.0);
    let hit = navigate(sparse.get("a").unwrap(), Direction::Bottom, &sparse).unwrap();
    assert_eq!((hit.id.as_str(), hit.stage), ("z", NavigationStage::FirstObject));

    let alone = index_of(&[node("a", 0.0, 0.0)], 100.0);
    assert!(navigate(alone.get("a").unwrap(), Direction::Left, &alone).is_none());
}

#[test]
fn within_window_is_an_overlap_test() {
    let test = within_window(100.0);
    let a = node("a", 0.0, 0.0);
    assert!(test(&a, &node("b", 232.0, 0.0)));
    assert!(!test(&a, &node("c", 240.0, 0.0)));
}

#[test]
fn far_corner_of_the_window_counts_as_nearby() {
    // origin (0, 0) and origin (199, 199) share the 3x3 window at cell 100
    let idx = index_of(&[node("a", 0.0, 0.0), node("b", 199.0, 199.0)], 100.0);
    let hit = navigate(idx.get("b").unwrap(), Direction::Right, &idx).unwrap();
    assert_eq!((hit.id.as_str(), hit.stage), ("a", NavigationStage::Nearby));
}

#[test]
fn navigator_waits_for_graph() {
    let mut nav = Navigator::new();
    let m = PendingMove { direction: Direction::Right, from: Some("a".into()) };
    assert!(matches!(nav.handle(NavigatorEvent::MoveRequested(m)), NavigatorState::AwaitingGraph(_)));
    assert!(matches!(nav.handle(NavigatorEvent::GraphReady), NavigatorState::Searching(_)));
    let idx = index_of(&[node("a", 0.0, 0.0), node("b", 50.0, 0.0)], 100.0);
    match nav.advance(&idx) {
        NavigatorState::Done(Some(hit)) => assert_eq!(hit.id, "b"),
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(nav.handle(NavigatorEvent::Teardown), &NavigatorState::Idle);
}

proptest! {
    #[test]
    fn every_object_lands_in_its_floor_cell(
        pts in prop::collection::vec((-5000.0f64..5000.0, -5000.0f64..5000.0), 1..40),
        cell in 10.0f64..500.0,
    ) {
        let objs: IndexMap<String, PositionedObject> = pts
            .iter()
            .enumerate()
            .map(|(i, &(x, y))| (format!("n{i}"), node(&format!("n{i}"), x, y)))
            .collect();
        let hash = build_spatial_hash(&objs, cell);
        prop_assert_eq!(hash.len(), objs.len());
        for (id, o) in &objs {
            let key = ((o.x / cell).floor() as i64, (o.y / cell).floor() as i64);
            prop_assert!(hash.bucket(key).map_or(false, |b| b.contains(id.as_str())));
        }
    }
}
