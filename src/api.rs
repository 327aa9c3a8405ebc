use std::collections::BTreeSet;

use glam::DVec2;

use crate::error::Result;
use crate::events::{ModelEvent, SubscriptionId};
use crate::compound::Hull;
use crate::types::*;
use crate::world::CollisionReport;

/// Contract shared by every transformable shape.
///
/// Placement is absolute: each `set_position_rotation` recomputes the world
/// state from the stored local baseline, so repeated identical calls are
/// idempotent and never accumulate drift.
pub trait Shape {
    /// Place the local baseline at `(tx, tz)` rotated by `yaw` radians.
    fn set_position_rotation(&mut self, tx: f64, tz: f64, yaw: f64);

    /// Bake the current world state into the local baseline; reset the pose to identity.
    fn freeze(&mut self);

    /// World-frame bounds as of the latest placement.
    fn bounding_box(&self) -> Aabb;

    /// Pose last passed to `set_position_rotation`.
    fn pose(&self) -> Pose;

    fn place(&mut self, pose: Pose) {
        self.set_position_rotation(pose.translation.x, pose.translation.y, pose.yaw);
    }

    /// Rotate by `delta` on top of the current pose (still absolute w.r.t. the baseline).
    fn rotate(&mut self, delta: f64) {
        let p = self.pose();
        self.set_position_rotation(p.translation.x, p.translation.y, p.yaw + delta);
    }

    /// Translate by `(dx, dz)` on top of the current pose.
    fn translate(&mut self, dx: f64, dz: f64) {
        let p = self.pose();
        self.set_position_rotation(p.translation.x + dx, p.translation.y + dz, p.yaw);
    }

    fn bounding_box_intersects<S: Shape + ?Sized>(&self, other: &S) -> bool {
        self.bounding_box().overlaps(&other.bounding_box())
    }
}

/// Primitive segment tests on raw endpoints.
pub trait NarrowphaseApi {
    /// Exact intersection of segments `a0-a1` and `b0-b1`, evaluated in the frame of `b`.
    fn segment_segment(a0: DVec2, a1: DVec2, b0: DVec2, b1: DVec2) -> Option<DVec2>;

    /// Earliest time `t >= 0` at which segment `a` (velocity `va`) touches segment `b`
    /// (velocity `vb`), with the world contact point at that time.
    fn sweep_segment_segment(
        a0: DVec2,
        a1: DVec2,
        va: DVec2,
        b0: DVec2,
        b1: DVec2,
        vb: DVec2,
    ) -> Option<SweepHit>;
}

/// Time-of-impact result for continuous detection.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SweepHit {
    /// Time (in the velocity's time unit) of first contact; 0 when already touching.
    pub toi: f64,
    /// World contact point at `toi`.
    pub contact: DVec2,
}

/// Public API contract for the per-tick collision world.
pub trait CollisionWorldApi {
    /// Construct a new world with the given configuration.
    fn new(cfg: WorldConfig) -> Self
    where
        Self: Sized;

    // --- Lifecycle ---------------------------------------------------------

    /// Register a body, place its hull and index it.
    fn spawn(&mut self, id: BodyId, kinematics: Kinematics, hull: Hull) -> Result<()>;

    /// Replace a body's kinematic state (entity layer is the owner) and reindex it.
    fn update(&mut self, id: BodyId, kinematics: Kinematics) -> Result<()>;

    /// Remove a body and its index entries.
    fn despawn(&mut self, id: BodyId) -> Result<()>;

    /// Advance, reindex, pair, detect and respond; reports accumulate until drained.
    fn tick(&mut self, dt: f64) -> Result<()>;

    /// Drain and return the accumulated collision reports.
    fn drain_reports(&mut self) -> Vec<CollisionReport>;

    // --- Queries -----------------------------------------------------------

    fn kinematics(&self, id: BodyId) -> Option<&Kinematics>;

    fn bounding_box(&self, id: BodyId) -> Option<Aabb>;

    /// Bodies sharing at least one quadrant with `id`, excluding `id`.
    fn other_models(&self, id: BodyId) -> BTreeSet<BodyId>;

    /// Candidate pairs for the narrow phase, canonical `(a < b)` and sorted.
    fn candidate_pairs(&self) -> Vec<(BodyId, BodyId)>;

    // --- Events ------------------------------------------------------------

    fn subscribe(&mut self, f: Box<dyn FnMut(&ModelEvent)>) -> SubscriptionId;

    fn unsubscribe(&mut self, id: SubscriptionId);
}
