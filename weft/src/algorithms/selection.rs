use crate::model::{Bounds, Point, PositionedObject};
use indexmap::IndexMap;
use serde::Serialize;

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct RectangleSelection {
    pub inside: Vec<String>,
    pub outside: Vec<String>,
}

/// Normalized marquee rectangle regardless of drag direction.
pub fn marquee(start: Point, end: Point) -> Bounds {
    let (x1, x2) = (start.x.min(end.x), start.x.max(end.x));
    let (y1, y2) = (start.y.min(end.y), start.y.max(end.y));
    Bounds { x: x1, y: y1, width: x2 - x1, height: y2 - y1 }
}

/// Classify every object by overlap with the marquee. Full scan; ids keep
/// canvas order within each list.
pub fn find_nodes_inside_of_rectangle<'a, I>(start: Point, end: Point, objects: I) -> RectangleSelection
where
    I: IntoIterator<Item = &'a PositionedObject>,
{
    let rect = marquee(start, end);
    let mut out = RectangleSelection::default();
    for o in objects {
        if rect.intersects(&o.bounds()) {
            out.inside.push(o.id.clone());
        } else {
            out.outside.push(o.id.clone());
        }
    }
    out
}

pub fn select_in_map(start: Point, end: Point, objects: &IndexMap<String, PositionedObject>) -> RectangleSelection {
    find_nodes_inside_of_rectangle(start, end, objects.values())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ObjectKind;

    #[test]
    fn overlap_not_containment() {
        let objs = vec![
            PositionedObject::new("partial", ObjectKind::Node, 90.0, 90.0).with_size(32.0, 32.0),
            PositionedObject::new("away", ObjectKind::Node, 300.0, 300.0).with_size(32.0, 32.0),
            PositionedObject::new("edge", ObjectKind::Annotation, 100.0, 0.0).with_size(10.0, 10.0),
        ];
        let sel = find_nodes_inside_of_rectangle(Point { x: 0.0, y: 0.0 }, Point { x: 100.0, y: 100.0 }, &objs);
        assert_eq!(sel.inside, vec!["partial", "edge"]);
        assert_eq!(sel.outside, vec!["away"]);
    }

    #[test]
    fn zero_sized_marquee_still_hits_point() {
        let objs = vec![PositionedObject::new("p", ObjectKind::Placeholder, 5.0, 5.0)];
        let sel = find_nodes_inside_of_rectangle(Point { x: 5.0, y: 5.0 }, Point { x: 5.0, y: 5.0 }, &objs);
        assert_eq!(sel.inside, vec!["p"]);
    }
}
