//! Keyboard navigation over the canvas.
//!
//! A move looks for the best candidate in the requested direction inside the
//! reference's 3x3 cell neighborhood. When that window has nothing in the
//! right direction it takes any nearby object, and on very sparse canvases it
//! finally takes the first object in canvas order, so a non-empty canvas
//! always yields a target.

use crate::algorithms::spatial_hash::{query_nearby_objects, CanvasIndex};
use crate::model::{Direction, PositionedObject};
use serde::Serialize;

/// Weight of the off-axis offset relative to the on-axis distance.
const ORTHOGONAL_WEIGHT: f64 = 2.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum NavigationStage {
    Directional,
    Nearby,
    FirstObject,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct NavigationHit {
    pub id: String,
    pub stage: NavigationStage,
}

/// (on-axis distance, off-axis offset) from `reference` to `candidate`,
/// or None when the candidate is not strictly in `direction`.
fn directional_offsets(reference: &PositionedObject, candidate: &PositionedObject, direction: Direction) -> Option<(f64, f64)> {
    let r = reference.bounds().center();
    let c = candidate.bounds().center();
    let (along, across) = match direction {
        Direction::Right => (c.x - r.x, c.y - r.y),
        Direction::Left => (r.x - c.x, c.y - r.y),
        Direction::Bottom => (c.y - r.y, c.x - r.x),
        Direction::Top => (r.y - c.y, c.x - r.x),
    };
    if along > 0.0 { Some((along, across.abs())) } else { None }
}

fn directional_score(reference: &PositionedObject, candidate: &PositionedObject, direction: Direction) -> Option<f64> {
    directional_offsets(reference, candidate, direction).map(|(along, across)| along + ORTHOGONAL_WEIGHT * across)
}

/// Best-scoring object in `direction` within the reference's neighborhood.
/// Ties keep the earlier candidate in scan order.
pub fn find_in_direction<'a>(reference: &PositionedObject, direction: Direction, index: &'a CanvasIndex) -> Option<&'a PositionedObject> {
    let mut best: Option<(&PositionedObject, f64)> = None;
    for id in index.hash.neighborhood(reference.x, reference.y) {
        if id == reference.id {
            continue;
        }
        let Some(candidate) = index.objects.get(id) else { continue };
        if let Some(score) = directional_score(reference, candidate, direction) {
            if best.map_or(true, |(_, bs)| score < bs) {
                best = Some((candidate, score));
            }
        }
    }
    best.map(|(o, _)| o)
}

/// Overlap with the reference grown by two cells. Origins in the 3x3 window
/// can sit up to two cells from the reference origin, so every candidate
/// the window yields passes.
pub fn within_window(cell_size: f64) -> impl Fn(&PositionedObject, &PositionedObject) -> bool {
    move |reference, candidate| reference.bounds().expanded(2.0 * cell_size).intersects(&candidate.bounds())
}

pub fn navigate(reference: &PositionedObject, direction: Direction, index: &CanvasIndex) -> Option<NavigationHit> {
    if let Some(o) = find_in_direction(reference, direction, index) {
        return Some(NavigationHit { id: o.id.clone(), stage: NavigationStage::Directional });
    }
    if let Some(o) = query_nearby_objects(reference, &index.objects, &index.hash, within_window(index.hash.cell_size)) {
        tracing::trace!(from = %reference.id, to = %o.id, "navigation fell back to nearby object");
        return Some(NavigationHit { id: o.id.clone(), stage: NavigationStage::Nearby });
    }
    let first = index.objects.values().find(|o| o.id != reference.id)?;
    tracing::trace!(from = %reference.id, to = %first.id, "navigation fell back to first object");
    Some(NavigationHit { id: first.id.clone(), stage: NavigationStage::FirstObject })
}

/// A move waiting to be resolved.
#[derive(Clone, Debug, PartialEq)]
pub struct PendingMove {
    pub direction: Direction,
    /// Object the move starts from; None selects the first object.
    pub from: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Default)]
pub enum NavigatorState {
    #[default]
    Idle,
    AwaitingGraph(PendingMove),
    Searching(PendingMove),
    Done(Option<NavigationHit>),
}

#[derive(Clone, Debug, PartialEq)]
pub enum NavigatorEvent {
    MoveRequested(PendingMove),
    GraphReady,
    Teardown,
}

/// Drives a keyboard move that may arrive before the canvas is populated.
/// Moves requested while no graph is loaded wait for `GraphReady` instead
/// of polling on a timer.
#[derive(Clone, Debug, Default)]
pub struct Navigator {
    state: NavigatorState,
    graph_ready: bool,
}

impl Navigator {
    pub fn new() -> Self {
        Navigator::default()
    }

    pub fn state(&self) -> &NavigatorState {
        &self.state
    }

    pub fn handle(&mut self, event: NavigatorEvent) -> &NavigatorState {
        let state = std::mem::take(&mut self.state);
        self.state = match (state, event) {
            (_, NavigatorEvent::Teardown) => {
                self.graph_ready = false;
                NavigatorState::Idle
            }
            (_, NavigatorEvent::MoveRequested(m)) => {
                if self.graph_ready { NavigatorState::Searching(m) } else { NavigatorState::AwaitingGraph(m) }
            }
            (NavigatorState::AwaitingGraph(m), NavigatorEvent::GraphReady) => {
                self.graph_ready = true;
                NavigatorState::Searching(m)
            }
            (other, NavigatorEvent::GraphReady) => {
                self.graph_ready = true;
                other
            }
        };
        &self.state
    }

    /// Resolve a `Searching` move against `index`. Other states are left
    /// unchanged.
    pub fn advance(&mut self, index: &CanvasIndex) -> &NavigatorState {
        if let NavigatorState::Searching(m) = &self.state {
            let hit = match m.from.as_deref().and_then(|id| index.get(id)) {
                Some(reference) => navigate(reference, m.direction, index),
                None => index.objects.values().next().map(|o| NavigationHit {
                    id: o.id.clone(),
                    stage: NavigationStage::FirstObject,
                }),
            };
            self.state = NavigatorState::Done(hit);
        }
        &self.state
    }
}
