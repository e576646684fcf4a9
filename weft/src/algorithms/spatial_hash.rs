use crate::geometry::limits;
use crate::model::PositionedObject;
use indexmap::{IndexMap, IndexSet};
use std::collections::HashMap;

pub type CellKey = (i64, i64);

/// Point-in-time grid index over object origins. Not maintained
/// incrementally: rebuild when positions change.
#[derive(Clone, Debug)]
pub struct SpatialHash {
    pub cell_size: f64,
    pub buckets: HashMap<CellKey, IndexSet<String>>,
}

#[inline]
fn cell_ix(cell: f64, v: f64) -> i64 {
    // `as` saturates and maps NaN to 0
    (v / cell).floor() as i64
}

impl SpatialHash {
    pub fn build(objects: &IndexMap<String, PositionedObject>, cell_size: f64) -> SpatialHash {
        let cell_size = if cell_size.is_finite() && cell_size > 0.0 {
            cell_size.clamp(limits::MIN_CELL_SIZE, limits::MAX_CELL_SIZE)
        } else {
            limits::MIN_CELL_SIZE
        };
        let mut buckets: HashMap<CellKey, IndexSet<String>> = HashMap::new();
        for (id, o) in objects.iter().take(limits::MAX_INDEXED_OBJECTS) {
            let key = (cell_ix(cell_size, o.x), cell_ix(cell_size, o.y));
            buckets.entry(key).or_default().insert(id.clone());
        }
        if objects.len() > limits::MAX_INDEXED_OBJECTS {
            tracing::warn!(objects = objects.len(), max = limits::MAX_INDEXED_OBJECTS, "spatial hash truncated");
        }
        tracing::debug!(objects = objects.len(), buckets = buckets.len(), cell_size, "spatial hash built");
        SpatialHash { cell_size, buckets }
    }

    pub fn cell_of(&self, x: f64, y: f64) -> CellKey {
        (cell_ix(self.cell_size, x), cell_ix(self.cell_size, y))
    }

    pub fn bucket(&self, key: CellKey) -> Option<&IndexSet<String>> {
        self.buckets.get(&key)
    }

    /// Ids in the 3x3 block of cells around (x, y), row by row from the
    /// top-left cell, each bucket in insertion order.
    pub fn neighborhood(&self, x: f64, y: f64) -> impl Iterator<Item = &str> + '_ {
        let (cx, cy) = self.cell_of(x, y);
        (-1i64..=1)
            .flat_map(move |dy| (-1i64..=1).map(move |dx| (cx.saturating_add(dx), cy.saturating_add(dy))))
            .filter_map(move |key| self.buckets.get(&key))
            .flat_map(|bucket| bucket.iter().map(String::as_str))
    }

    pub fn len(&self) -> usize {
        self.buckets.values().map(IndexSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}

pub fn build_spatial_hash(objects: &IndexMap<String, PositionedObject>, cell_size: f64) -> SpatialHash {
    SpatialHash::build(objects, cell_size)
}

/// First object in the reference's 3x3 cell neighborhood accepted by
/// `aabb_test`. This is "a" nearby match, not necessarily the closest one.
pub fn query_nearby_objects<'a, F>(
    reference: &PositionedObject,
    objects: &'a IndexMap<String, PositionedObject>,
    hash: &SpatialHash,
    mut aabb_test: F,
) -> Option<&'a PositionedObject>
where
    F: FnMut(&PositionedObject, &PositionedObject) -> bool,
{
    for id in hash.neighborhood(reference.x, reference.y) {
        if id == reference.id {
            continue;
        }
        // ids can outlive their object if the hash is stale
        let Some(candidate) = objects.get(id) else { continue };
        if aabb_test(reference, candidate) {
            return Some(candidate);
        }
    }
    None
}

/// Objects plus the hash built over them.
#[derive(Clone, Debug)]
pub struct CanvasIndex {
    pub objects: IndexMap<String, PositionedObject>,
    pub hash: SpatialHash,
}

impl CanvasIndex {
    pub fn build(objects: IndexMap<String, PositionedObject>, cell_size: f64) -> CanvasIndex {
        let hash = SpatialHash::build(&objects, cell_size);
        CanvasIndex { objects, hash }
    }

    pub fn get(&self, id: &str) -> Option<&PositionedObject> {
        self.objects.get(id)
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ObjectKind;

    fn objs(list: &[(&str, f64, f64)]) -> IndexMap<String, PositionedObject> {
        list.iter()
            .map(|(id, x, y)| (id.to_string(), PositionedObject::new(*id, ObjectKind::Node, *x, *y)))
            .collect()
    }

    #[test]
    fn negative_coordinates_floor_into_negative_cells() {
        let o = objs(&[("a", -0.5, -150.0), ("b", 99.9, 100.0)]);
        let h = SpatialHash::build(&o, 100.0);
        assert!(h.bucket((-1, -2)).unwrap().contains("a"));
        assert!(h.bucket((0, 1)).unwrap().contains("b"));
        assert_eq!(h.len(), 2);
    }

    #[test]
    fn neighborhood_is_three_by_three() {
        let o = objs(&[("near", 150.0, 150.0), ("far", 350.0, 50.0)]);
        let h = SpatialHash::build(&o, 100.0);
        let ids: Vec<&str> = h.neighborhood(50.0, 50.0).collect();
        assert_eq!(ids, vec!["near"]);
    }

    #[test]
    fn query_skips_reference_and_stale_ids() {
        let mut o = objs(&[("a", 10.0, 10.0), ("b", 20.0, 20.0), ("c", 30.0, 30.0)]);
        let h = SpatialHash::build(&o, 100.0);
        o.shift_remove("b");
        let reference = o["a"].clone();
        let hit = query_nearby_objects(&reference, &o, &h, |_, _| true).map(|p| p.id.as_str());
        assert_eq!(hit, Some("c"));
    }

    #[test]
    fn bad_cell_size_does_not_panic() {
        let o = objs(&[("a", 10.0, 10.0)]);
        let h = SpatialHash::build(&o, 0.0);
        assert!(h.cell_size > 0.0);
        let h = SpatialHash::build(&o, f64::NAN);
        assert_eq!(h.len(), 1);
    }
}
