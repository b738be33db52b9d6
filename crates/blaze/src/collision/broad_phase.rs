//! Broad phase: find every overlapping pair of boxes.
//!
//! Sweep-and-prune sorts boxes by their left edge and only compares a box
//! against the boxes that start before it ends. For the mostly-spread-out
//! scenes of a 2D game this is close to linear. The naive all-pairs pass is
//! kept as a reference and for tiny scenes; both return the same pairs in the
//! same order.

use serde::{Deserialize, Serialize};

use crate::ecs::Entity;
use crate::math::Rect;

/// Pair-finding strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BroadPhase {
    /// Sort along x, compare only boxes whose x-intervals overlap.
    #[default]
    SweepAndPrune,
    /// Compare every box with every other box.
    Naive,
}

/// A collision pair, ordered so that `a < b`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CollisionPair {
    pub a: Entity,
    pub b: Entity,
}

impl CollisionPair {
    pub fn new(x: Entity, y: Entity) -> Self {
        if x < y { Self { a: x, b: y } } else { Self { a: y, b: x } }
    }

    pub fn contains(&self, entity: Entity) -> bool {
        self.a == entity || self.b == entity
    }
}

/// All pairs of overlapping boxes, sorted by `(a, b)`.
pub fn overlapping_pairs(boxes: &[(Entity, Rect)], strategy: BroadPhase) -> Vec<CollisionPair> {
    let mut pairs = match strategy {
        BroadPhase::SweepAndPrune => sweep_and_prune(boxes),
        BroadPhase::Naive => naive(boxes),
    };
    pairs.sort_unstable();
    pairs
}

fn naive(boxes: &[(Entity, Rect)]) -> Vec<CollisionPair> {
    let mut pairs = Vec::new();
    for (i, (ea, ra)) in boxes.iter().enumerate() {
        for (eb, rb) in &boxes[i + 1..] {
            if ra.intersects(rb) {
                pairs.push(CollisionPair::new(*ea, *eb));
            }
        }
    }
    pairs
}

fn sweep_and_prune(boxes: &[(Entity, Rect)]) -> Vec<CollisionPair> {
    let mut sorted: Vec<&(Entity, Rect)> = boxes.iter().collect();
    sorted.sort_by(|(ea, ra), (eb, rb)| ra.left().total_cmp(&rb.left()).then(ea.cmp(eb)));

    let mut pairs = Vec::new();
    for (i, (ea, ra)) in sorted.iter().enumerate() {
        for (eb, rb) in &sorted[i + 1..] {
            // Everything further along starts at or after our right edge.
            if rb.left() >= ra.right() {
                break;
            }
            if ra.intersects(rb) {
                pairs.push(CollisionPair::new(*ea, *eb));
            }
        }
    }
    pairs
}
