//! Compound shapes: independently offset sub-polygons ("parts") that move as one.
//!
//! Each part's offset is baked into its polygon's local baseline when the part
//! is added, so placing the compound places every part with the same pose and
//! a part's world position is always `compound pose ∘ part offset`.

use std::collections::BTreeSet;
use std::f64::consts::{PI, TAU};

use glam::DVec2;
use tracing::{debug, warn};

use crate::api::Shape;
use crate::error::{GeomError, Result};
use crate::narrowphase::EPS;
use crate::polygon::Polygon;
use crate::types::{Aabb, PartId, Pose};

#[derive(Clone, Debug, PartialEq)]
pub struct PolygonPart {
    id: PartId,
    offset: DVec2,
    rotation: f64,
    polygon: Polygon,
}

impl PolygonPart {
    pub fn id(&self) -> PartId {
        self.id
    }

    /// Offset from the compound origin, in the compound's local frame.
    pub fn offset(&self) -> DVec2 {
        self.offset
    }

    pub fn rotation(&self) -> f64 {
        self.rotation
    }

    /// The part's polygon, placed in the world.
    pub fn polygon(&self) -> &Polygon {
        &self.polygon
    }

    /// The part's polygon in the compound's local frame.
    fn local_polygon(&self) -> Polygon {
        let mut p = self.polygon.clone();
        p.set_position_rotation(0.0, 0.0, 0.0);
        p
    }
}

/// Geometric limits for a circular-arc connector between two parts.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ArcLimits {
    pub radius: f64,
    /// Number of straight segments approximating the arc.
    pub segments: usize,
    /// Longest allowed chord between the two part centroids.
    pub max_span: f64,
}

impl Default for ArcLimits {
    fn default() -> Self {
        Self { radius: 1.0, segments: 8, max_span: f64::INFINITY }
    }
}

/// An installed connector part joining `a` and `b`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Connection {
    pub a: PartId,
    pub b: PartId,
    pub connector: PartId,
}

#[derive(Clone, Debug, PartialEq)]
pub struct MultiPolygon {
    parts: Vec<PolygonPart>,
    connections: Vec<Connection>,
    next_id: u32,
    pose: Pose,
    bounds: Aabb,
}

impl Default for MultiPolygon {
    fn default() -> Self {
        Self::new()
    }
}

impl MultiPolygon {
    pub fn new() -> Self {
        Self { parts: Vec::new(), connections: Vec::new(), next_id: 0, pose: Pose::IDENTITY, bounds: Aabb::EMPTY }
    }

    /// Add `polygon` at `offset`/`rotation` relative to the compound origin.
    pub fn add_part(&mut self, mut polygon: Polygon, offset: DVec2, rotation: f64) -> PartId {
        polygon.set_position_rotation(offset.x, offset.y, rotation);
        polygon.freeze();
        polygon.place(self.pose);
        let id = PartId(self.next_id);
        self.next_id += 1;
        self.bounds = self.bounds.union(&polygon.bounding_box());
        self.parts.push(PolygonPart { id, offset, rotation, polygon });
        id
    }

    pub fn with_part(mut self, polygon: Polygon, offset: DVec2) -> Self {
        self.add_part(polygon, offset, 0.0);
        self
    }

    pub fn parts(&self) -> &[PolygonPart] {
        &self.parts
    }

    pub fn part(&self, id: PartId) -> Option<&PolygonPart> {
        self.parts.iter().find(|p| p.id == id)
    }

    pub fn part_ids(&self) -> impl Iterator<Item = PartId> + '_ {
        self.parts.iter().map(|p| p.id)
    }

    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// World-frame centroid of one part.
    pub fn part_centroid(&self, id: PartId) -> Option<DVec2> {
        self.part(id).map(|p| p.polygon.centroid())
    }

    /// Remove a part together with any connector attached to it.
    pub fn detach(&mut self, id: PartId) -> Option<PolygonPart> {
        let idx = self.parts.iter().position(|p| p.id == id)?;
        let removed = self.parts.remove(idx);
        let (dropped, kept): (Vec<Connection>, Vec<Connection>) =
            self.connections.iter().partition(|c| c.a == id || c.b == id || c.connector == id);
        self.connections = kept;
        for c in dropped {
            if c.connector != id {
                self.parts.retain(|p| p.id != c.connector);
            }
        }
        self.recompute_bounds();
        Some(removed)
    }

    fn recompute_bounds(&mut self) {
        self.bounds = self.parts.iter().fold(Aabb::EMPTY, |acc, p| acc.union(&p.polygon.bounding_box()));
    }

    /// All parts concatenated in the compound's local frame.
    pub fn outline(&self) -> Polygon {
        self.parts.iter().fold(Polygon::empty(), |acc, p| acc + &p.local_polygon())
    }

    /// All parts concatenated in the world frame (frozen).
    pub fn hull(&self) -> Polygon {
        self.parts.iter().fold(Polygon::empty(), |acc, p| acc + &p.polygon)
    }

    /// Mass is shared between parts by enclosed area (evenly when no part encloses any).
    pub fn moment_of_inertia(&self, mass: f64) -> f64 {
        let areas: Vec<f64> = self.parts.iter().map(|p| p.polygon.area()).collect();
        let total: f64 = areas.iter().sum();
        self.parts
            .iter()
            .zip(&areas)
            .map(|(p, area)| {
                let share = if total > EPS { area / total } else { 1.0 / self.parts.len() as f64 };
                p.polygon.moment_of_inertia(mass * share)
            })
            .sum()
    }

    /// Mean of every segment crossing between any part of `self` and any part of `other`.
    pub fn intersection_point(&self, other: &MultiPolygon) -> Option<DVec2> {
        mean_crossing(self.parts.iter().map(|p| &p.polygon), || other.parts.iter().map(|p| &p.polygon))
    }

    /// Parts of `self` hit by `other`, and parts of `other` hit by `self`.
    ///
    /// Reversing the call swaps the two sets and nothing else.
    pub fn intersected_polygons(&self, other: &MultiPolygon) -> (BTreeSet<PartId>, BTreeSet<PartId>) {
        let mut mine = BTreeSet::new();
        let mut theirs = BTreeSet::new();
        if !self.bounding_box_intersects(other) {
            return (mine, theirs);
        }
        for a in &self.parts {
            for b in &other.parts {
                if mine.contains(&a.id) && theirs.contains(&b.id) {
                    continue;
                }
                if a.polygon.intersection_point(&b.polygon).is_some() {
                    mine.insert(a.id);
                    theirs.insert(b.id);
                }
            }
        }
        (mine, theirs)
    }

    /// Parts of `self` hit by a single polygon.
    pub fn intersected_parts(&self, other: &Polygon) -> BTreeSet<PartId> {
        if !self.bounding_box_intersects(other) {
            return BTreeSet::new();
        }
        self.parts
            .iter()
            .filter(|p| p.polygon.intersection_point(other).is_some())
            .map(|p| p.id)
            .collect()
    }

    /// Install a circular-arc connector between the centroids of parts `a` and `b`.
    ///
    /// Nothing is installed on failure.
    pub fn connect_parts(&mut self, a: PartId, b: PartId, limits: ArcLimits) -> Result<PartId> {
        let invalid = |reason: String| GeomError::InvalidConnection { a, b, reason };
        let pa = self.part(a).ok_or(GeomError::UnknownPart(a))?;
        let pb = self.part(b).ok_or(GeomError::UnknownPart(b))?;
        if a == b {
            return Err(invalid("a part cannot connect to itself".into()));
        }
        let ca = pa.local_polygon().centroid();
        let cb = pb.local_polygon().centroid();
        let chord = cb - ca;
        let span = chord.length();
        if span <= EPS {
            return Err(invalid("parts share a centroid".into()));
        }
        if span > limits.max_span {
            return Err(invalid(format!("span {span:.3} exceeds limit {:.3}", limits.max_span)));
        }
        if limits.radius < span * 0.5 {
            return Err(invalid(format!("radius {:.3} cannot reach across span {span:.3}", limits.radius)));
        }

        // Minor arc, bulging to the left of a -> b.
        let half = span * 0.5;
        let sagitta_base = (limits.radius * limits.radius - half * half).sqrt();
        let center = (ca + cb) * 0.5 - chord.perp() / span * sagitta_base;
        let start = (ca - center).to_angle();
        let sweep = ((cb - center).to_angle() - start + PI).rem_euclid(TAU) - PI;
        let n = limits.segments.max(1);
        let points: Vec<DVec2> = (0..=n)
            .map(|i| center + DVec2::from_angle(start + sweep * i as f64 / n as f64) * limits.radius)
            .collect();
        let arc = Polygon::from_points(&points, false);

        // Connectors already anchored at `a` or `b` share an arc endpoint with this one.
        let anchored: Vec<PartId> = self
            .connections
            .iter()
            .filter(|c| c.a == a || c.b == a || c.a == b || c.b == b)
            .map(|c| c.connector)
            .collect();
        if let Some(blocker) = self
            .parts
            .iter()
            .filter(|p| p.id != a && p.id != b && !anchored.contains(&p.id))
            .find(|p| arc.intersection_point(&p.local_polygon()).is_some())
        {
            return Err(invalid(format!("arc cuts through part {:?}", blocker.id)));
        }

        let connector = self.add_part(arc, DVec2::ZERO, 0.0);
        self.connections.push(Connection { a, b, connector });
        debug!(?a, ?b, ?connector, "connected compound parts");
        Ok(connector)
    }

    /// Like `connect_parts`, but an invalid connection detaches the attached part `b`.
    pub fn connect_or_detach(&mut self, a: PartId, b: PartId, limits: ArcLimits) -> Result<PartId> {
        match self.connect_parts(a, b, limits) {
            Ok(id) => Ok(id),
            Err(err) => {
                warn!(%err, "detaching part after failed connection");
                self.detach(b);
                Err(err)
            }
        }
    }
}

impl Shape for MultiPolygon {
    fn set_position_rotation(&mut self, tx: f64, tz: f64, yaw: f64) {
        self.pose = Pose::new(tx, tz, yaw);
        for p in &mut self.parts {
            p.polygon.set_position_rotation(tx, tz, yaw);
        }
        self.recompute_bounds();
    }

    fn freeze(&mut self) {
        for p in &mut self.parts {
            p.polygon.freeze();
        }
        self.pose = Pose::IDENTITY;
    }

    fn bounding_box(&self) -> Aabb {
        self.bounds
    }

    fn pose(&self) -> Pose {
        self.pose
    }
}

fn mean_crossing<'a, A, B, F>(left: A, right: F) -> Option<DVec2>
where
    A: Iterator<Item = &'a Polygon>,
    B: Iterator<Item = &'a Polygon>,
    F: Fn() -> B,
{
    let mut sum = DVec2::ZERO;
    let mut n = 0usize;
    for a in left {
        for b in right() {
            let (s, k) = a.intersection_sum(b);
            sum += s;
            n += k;
        }
    }
    (n > 0).then(|| sum / n as f64)
}

/// Collision shape of one body: a single polygon or a compound of parts.
#[derive(Clone, Debug, PartialEq)]
pub enum Hull {
    Simple(Polygon),
    Compound(MultiPolygon),
}

impl From<Polygon> for Hull {
    fn from(p: Polygon) -> Self {
        Hull::Simple(p)
    }
}

impl From<MultiPolygon> for Hull {
    fn from(m: MultiPolygon) -> Self {
        Hull::Compound(m)
    }
}

impl Hull {
    fn polygons(&self) -> Vec<&Polygon> {
        match self {
            Hull::Simple(p) => vec![p],
            Hull::Compound(m) => m.parts.iter().map(|p| &p.polygon).collect(),
        }
    }

    pub fn is_compound(&self) -> bool {
        matches!(self, Hull::Compound(_))
    }

    pub fn intersection_point(&self, other: &Hull) -> Option<DVec2> {
        if !self.bounding_box_intersects(other) {
            return None;
        }
        let theirs = other.polygons();
        mean_crossing(self.polygons().into_iter(), || theirs.iter().copied())
    }

    /// Two-sided hit report. A simple hull has no parts, so its side is always empty.
    pub fn hit_parts(&self, other: &Hull) -> (BTreeSet<PartId>, BTreeSet<PartId>) {
        match (self, other) {
            (Hull::Compound(a), Hull::Compound(b)) => a.intersected_polygons(b),
            (Hull::Compound(a), Hull::Simple(b)) => (a.intersected_parts(b), BTreeSet::new()),
            (Hull::Simple(a), Hull::Compound(b)) => (BTreeSet::new(), b.intersected_parts(a)),
            (Hull::Simple(_), Hull::Simple(_)) => (BTreeSet::new(), BTreeSet::new()),
        }
    }

    pub fn part_centroid(&self, id: PartId) -> Option<DVec2> {
        match self {
            Hull::Simple(_) => None,
            Hull::Compound(m) => m.part_centroid(id),
        }
    }

    /// World-frame centroid of the whole hull.
    pub fn centroid(&self) -> DVec2 {
        match self {
            Hull::Simple(p) => p.centroid(),
            Hull::Compound(m) => m.hull().centroid(),
        }
    }

    /// Outline in the body's local frame.
    pub fn outline(&self) -> Polygon {
        match self {
            Hull::Simple(p) => {
                let mut local = p.clone();
                local.set_position_rotation(0.0, 0.0, 0.0);
                local
            }
            Hull::Compound(m) => m.outline(),
        }
    }

    pub fn moment_of_inertia(&self, mass: f64) -> f64 {
        match self {
            Hull::Simple(p) => p.moment_of_inertia(mass),
            Hull::Compound(m) => m.moment_of_inertia(mass),
        }
    }

    /// Copy placed at `pose`.
    pub fn placed_at(&self, pose: Pose) -> Hull {
        let mut h = self.clone();
        h.place(pose);
        h
    }
}

impl Shape for Hull {
    fn set_position_rotation(&mut self, tx: f64, tz: f64, yaw: f64) {
        match self {
            Hull::Simple(p) => p.set_position_rotation(tx, tz, yaw),
            Hull::Compound(m) => m.set_position_rotation(tx, tz, yaw),
        }
    }

    fn freeze(&mut self) {
        match self {
            Hull::Simple(p) => p.freeze(),
            Hull::Compound(m) => m.freeze(),
        }
    }

    fn bounding_box(&self) -> Aabb {
        match self {
            Hull::Simple(p) => p.bounding_box(),
            Hull::Compound(m) => m.bounding_box(),
        }
    }

    fn pose(&self) -> Pose {
        match self {
            Hull::Simple(p) => p.pose(),
            Hull::Compound(m) => m.pose(),
        }
    }
}
