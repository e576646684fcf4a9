use proptest::prelude::*;
use weft::{connector_path, find_nodes_inside_of_rectangle, port_shift, ConnectorGeometry, ObjectKind, Point, PortGeometry, PortSide, PositionedObject};

fn pt(x: f64, y: f64) -> Point {
    Point { x, y }
}

#[test]
fn port_column_for_single_data_port() {
    let [dx, dy] = port_shift(1, 2);
    assert_eq!(dx, 9.0);
    assert_eq!(dy, 16.0);
}

#[test]
fn custom_node_size_scales_slots() {
    let g = PortGeometry { node_size: 64.0, port_size: 9.0 };
    assert_eq!(g.shift(1, 2), [9.0, 32.0]);
    assert_eq!(g.shift(2, 3), [9.0, 48.0]);
}

#[test]
fn connector_between_two_flow_ports() {
    assert_eq!(connector_path(38.5, 7.5, 7.5, 40.5), "M42.5,7.5 C60.5,7.5 -14.5,40.5 3.5,40.5");
}

#[test]
fn straight_connector_has_flat_controls() {
    let c = ConnectorGeometry::default().curve(0.0, 10.0, 100.0, 10.0, false, false);
    assert_eq!(c.start, pt(4.0, 10.0));
    assert_eq!(c.end, pt(96.0, 10.0));
    assert_eq!(c.c1, pt(27.0, 10.0));
    assert_eq!(c.c2, pt(73.0, 10.0));
}

proptest! {
    #[test]
    fn selection_ignores_drag_direction(
        objs in prop::collection::vec((-500.0f64..500.0, -500.0f64..500.0, 0.0f64..80.0), 0..30),
        a in (-600.0f64..600.0, -600.0f64..600.0),
        b in (-600.0f64..600.0, -600.0f64..600.0),
    ) {
        let objs: Vec<PositionedObject> = objs
            .iter()
            .enumerate()
            .map(|(i, &(x, y, s))| PositionedObject::new(format!("o{i}"), ObjectKind::Node, x, y).with_size(s, s))
            .collect();
        let forward = find_nodes_inside_of_rectangle(pt(a.0, a.1), pt(b.0, b.1), &objs);
        let backward = find_nodes_inside_of_rectangle(pt(b.0, b.1), pt(a.0, a.1), &objs);
        let crossed = find_nodes_inside_of_rectangle(pt(a.0, b.1), pt(b.0, a.1), &objs);
        prop_assert_eq!(&forward, &backward);
        prop_assert_eq!(&forward, &crossed);
        prop_assert_eq!(forward.inside.len() + forward.outside.len(), objs.len());
    }

    #[test]
    fn port_shift_is_finite_and_on_the_port_column(count in 1u32..12, index in 0u32..12) {
        let [dx, dy] = port_shift(index, count);
        prop_assert!(dx.is_finite() && dy.is_finite());
        if index > 0 {
            prop_assert_eq!(dx, 9.0);
        }
    }

    #[test]
    fn port_layout_never_overflows(index in any::<u32>(), count in any::<u32>(), flow_port in any::<bool>()) {
        let [dx, dy] = PortGeometry::default().shift_for(index, count, PortSide::Out, flow_port);
        prop_assert!(dx.is_finite() && dy.is_finite());
    }

    #[test]
    fn connector_paths_are_well_formed(
        x1 in -1e4f64..1e4, y1 in -1e4f64..1e4, x2 in -1e4f64..1e4, y2 in -1e4f64..1e4,
    ) {
        let d = connector_path(x1, y1, x2, y2);
        prop_assert!(d.starts_with('M'));
        prop_assert!(d.contains(" C"));
        prop_assert!(!d.contains("NaN") && !d.contains("Infinity"));
        let c = ConnectorGeometry::default().curve(x1, y1, x2, y2, false, false);
        prop_assert!(c.c1.x >= c.start.x);
        prop_assert!(c.c2.x <= c.end.x);
    }
}
