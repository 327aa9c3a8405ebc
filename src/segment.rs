//! Transformable line segment.
//!
//! A segment keeps an immutable local ("design") endpoint pair and a world
//! pair derived from it by rotation-then-translation. Every placement is
//! recomputed from the local pair, never composed onto the previous world
//! state.

use glam::DVec2;

use crate::api::{NarrowphaseApi, Shape};
use crate::narrowphase::Narrowphase;
use crate::types::{Aabb, Pose};

#[derive(Clone, Debug, PartialEq)]
pub struct Segment {
    local: [DVec2; 2],
    world: [DVec2; 2],
    pose: Pose,
    bounds: Aabb,
}

impl Segment {
    pub fn new(a: DVec2, b: DVec2) -> Self {
        Self { local: [a, b], world: [a, b], pose: Pose::IDENTITY, bounds: Aabb::from_points(a, b) }
    }

    /// `(x1, y1) - (x2, y2)` in local coordinates.
    pub fn from_coords(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self::new(DVec2::new(x1, y1), DVec2::new(x2, y2))
    }

    pub fn local(&self) -> [DVec2; 2] {
        self.local
    }

    pub fn world(&self) -> [DVec2; 2] {
        self.world
    }

    pub fn start(&self) -> DVec2 {
        self.world[0]
    }

    pub fn end(&self) -> DVec2 {
        self.world[1]
    }

    pub fn length(&self) -> f64 {
        self.world[0].distance(self.world[1])
    }

    pub fn midpoint(&self) -> DVec2 {
        (self.world[0] + self.world[1]) * 0.5
    }

    /// World-frame direction angle of the segment (radians).
    pub fn angle(&self) -> f64 {
        let d = self.world[1] - self.world[0];
        d.y.atan2(d.x)
    }

    pub fn is_degenerate(&self) -> bool {
        self.world[0] == self.world[1]
    }

    /// Exact intersection with `other`, or `None`.
    ///
    /// Works on copies rotated into `other`'s frame, so neither segment's
    /// stored state is touched.
    pub fn intersection_point(&self, other: &Segment) -> Option<DVec2> {
        Narrowphase::segment_segment(self.world[0], self.world[1], other.world[0], other.world[1])
    }
}

impl Shape for Segment {
    fn set_position_rotation(&mut self, tx: f64, tz: f64, yaw: f64) {
        self.pose = Pose::new(tx, tz, yaw);
        self.world = [self.pose.apply(self.local[0]), self.pose.apply(self.local[1])];
        self.bounds = Aabb::from_points(self.world[0], self.world[1]);
    }

    fn freeze(&mut self) {
        self.local = self.world;
        self.pose = Pose::IDENTITY;
    }

    fn bounding_box(&self) -> Aabb {
        self.bounds
    }

    fn pose(&self) -> Pose {
        self.pose
    }
}
