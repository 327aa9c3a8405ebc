use glam::{DVec2, DVec3};
use serde::{Deserialize, Serialize};

use crate::error::{GeomError, Result};

/// Opaque entity handle owned by the entity layer (e.g., pack your network id).
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BodyId(pub u64);

/// Stable identifier of one sub-polygon inside a compound shape.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PartId(pub u32);

/// Integer grid cell `(qx, qz)` used by the spatial index.
pub type Quadrant = (i32, i32);

/// Absolute placement of a shape: translation on the x/z plane plus yaw (radians).
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Pose {
    pub translation: DVec2,
    pub yaw: f64,
}

impl Pose {
    pub const IDENTITY: Self = Self { translation: DVec2::ZERO, yaw: 0.0 };

    pub fn new(tx: f64, tz: f64, yaw: f64) -> Self {
        Self { translation: DVec2::new(tx, tz), yaw }
    }

    /// `R(yaw) · p + translation`.
    pub fn apply(self, p: DVec2) -> DVec2 {
        DVec2::from_angle(self.yaw).rotate(p) + self.translation
    }
}

/// Axis-aligned bounds on the x/z plane.
///
/// `left/right` are the x extrema, `bottom/top` the z extrema. The `EMPTY`
/// box has inverted infinite extrema, so it overlaps nothing and is the
/// identity for `union`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Aabb {
    pub min: DVec2,
    pub max: DVec2,
}

impl Aabb {
    pub const EMPTY: Self = Self { min: DVec2::INFINITY, max: DVec2::NEG_INFINITY };

    pub fn new(min: DVec2, max: DVec2) -> Self {
        Self { min, max }
    }

    /// Smallest box containing both points.
    pub fn from_points(a: DVec2, b: DVec2) -> Self {
        Self { min: a.min(b), max: a.max(b) }
    }

    pub fn left(&self) -> f64 { self.min.x }
    pub fn right(&self) -> f64 { self.max.x }
    pub fn bottom(&self) -> f64 { self.min.y }
    pub fn top(&self) -> f64 { self.max.y }

    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y
    }

    pub fn center(&self) -> DVec2 {
        (self.min + self.max) * 0.5
    }

    pub fn union(&self, other: &Aabb) -> Aabb {
        Aabb { min: self.min.min(other.min), max: self.max.max(other.max) }
    }

    /// Four-comparison overlap test, inclusive on touching edges.
    pub fn overlaps(&self, other: &Aabb) -> bool {
        !(self.max.x < other.min.x
            || self.min.x > other.max.x
            || self.max.y < other.min.y
            || self.min.y > other.max.y)
    }

    /// Grow only toward the direction of travel: `min + min(0, d)`, `max + max(0, d)`.
    pub fn swept(&self, displacement: DVec2) -> Aabb {
        if self.is_empty() {
            return *self;
        }
        Aabb {
            min: self.min + displacement.min(DVec2::ZERO),
            max: self.max + displacement.max(DVec2::ZERO),
        }
    }
}

/// Per-entity kinematic state as supplied by the entity layer.
///
/// Rotation is `(pitch, yaw, roll)` in degrees; only yaw reaches the planar
/// core. Angular velocity is yaw degrees per second.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Kinematics {
    pub position: DVec3,
    pub rotation: DVec3,
    pub velocity: DVec3,
    pub angular_velocity: f64,
    pub mass: f64,
}

impl Default for Kinematics {
    fn default() -> Self {
        Self {
            position: DVec3::ZERO,
            rotation: DVec3::ZERO,
            velocity: DVec3::ZERO,
            angular_velocity: 0.0,
            mass: 1.0,
        }
    }
}

impl Kinematics {
    /// Convenience constructor for a body at rest.
    pub fn at(position: DVec3, mass: f64) -> Self {
        Self { position, mass, ..Default::default() }
    }

    pub fn with_velocity(mut self, velocity: DVec3) -> Self {
        self.velocity = velocity;
        self
    }

    pub fn with_yaw(mut self, yaw_degrees: f64) -> Self {
        self.rotation.y = yaw_degrees;
        self
    }

    pub fn yaw_radians(&self) -> f64 {
        self.rotation.y.to_radians()
    }

    /// Planar placement for the geometry core (world x/z, yaw).
    pub fn pose(&self) -> Pose {
        Pose::new(self.position.x, self.position.z, self.yaw_radians())
    }

    /// Planar velocity (world x/z).
    pub fn planar_velocity(&self) -> DVec2 {
        DVec2::new(self.velocity.x, self.velocity.z)
    }
}

/// World-level configuration for the collision core.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Quadrant edge length in world units (typ. the scale of one ship).
    pub quadrant_size: f64,
    /// At or below this many bodies, pairs are enumerated directly.
    pub brute_force_threshold: usize,
    /// Coefficient of restitution for the collision impulse (1.0 = elastic).
    pub restitution: f64,
    /// If true, bodies are indexed by swept bounds and tunneling contacts are searched.
    pub continuous: bool,
    /// Maximum number of reports to emit per tick; extra are dropped.
    pub max_reports: usize,
    /// Enable internal timing instrumentation (adds small overhead when true).
    pub enable_timing: bool,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            quadrant_size: 1.0,
            brute_force_threshold: 8,
            restitution: 1.0,
            continuous: true,
            max_reports: 1024,
            enable_timing: false,
        }
    }
}

impl WorldConfig {
    /// Parse a JSON document; missing fields fall back to defaults.
    pub fn from_json_str(s: &str) -> Result<Self> {
        let cfg: WorldConfig = serde_json::from_str(s)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.quadrant_size.is_finite() && self.quadrant_size > 0.0) {
            return Err(GeomError::InvalidConfig(format!(
                "quadrant_size must be finite and positive, got {}",
                self.quadrant_size
            )));
        }
        if !(0.0..=1.0).contains(&self.restitution) {
            return Err(GeomError::InvalidConfig(format!(
                "restitution must lie in [0, 1], got {}",
                self.restitution
            )));
        }
        Ok(())
    }
}

/// Debug/performance statistics for the current index state.
#[derive(Copy, Clone, Debug, Default)]
pub struct WorldStats {
    pub bodies: usize,
    pub quadrants: usize,
    /// Sum of per-quadrant pair counts (n*(n-1)/2), counts duplicates across quadrants.
    pub candidate_pairs: usize,
    /// Unique pairs encountered when deduplicated across quadrants.
    pub unique_pairs: usize,
}

/// Timing breakdown for the last completed tick.
#[derive(Copy, Clone, Debug, Default)]
pub struct WorldTiming {
    pub tick_ms: f64,
    pub advance_ms: f64,
    pub index_ms: f64,
    pub pairs_ms: f64,
    pub narrowphase_ms: f64,

    pub reports_emitted: usize,
}
