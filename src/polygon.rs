//! Polygon: an ordered run of segments, open (path) or closed (loop).

use std::ops::{Add, AddAssign};

use glam::DVec2;

use crate::api::Shape;
use crate::narrowphase::EPS;
use crate::segment::Segment;
use crate::types::{Aabb, Pose};

#[derive(Clone, Debug, PartialEq)]
pub struct Polygon {
    segments: Vec<Segment>,
    closed: bool,
    pose: Pose,
    bounds: Aabb,
}

impl Polygon {
    pub fn empty() -> Self {
        Self { segments: Vec::new(), closed: false, pose: Pose::IDENTITY, bounds: Aabb::EMPTY }
    }

    /// Connect consecutive points; a closed polygon also joins the last point to the first.
    pub fn from_points(points: &[DVec2], closed: bool) -> Self {
        let mut segments: Vec<Segment> = points.windows(2).map(|w| Segment::new(w[0], w[1])).collect();
        let closed = closed && points.len() >= 3;
        if closed {
            segments.push(Segment::new(points[points.len() - 1], points[0]));
        }
        Self::from_segments(segments, closed)
    }

    pub fn from_segments(segments: Vec<Segment>, closed: bool) -> Self {
        let mut p = Self { segments, closed, pose: Pose::IDENTITY, bounds: Aabb::EMPTY };
        p.recompute_bounds();
        p
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// World-frame vertices in boundary order.
    pub fn vertices(&self) -> Vec<DVec2> {
        let mut out: Vec<DVec2> = self.segments.iter().map(Segment::start).collect();
        if !self.closed {
            if let Some(last) = self.segments.last() {
                out.push(last.end());
            }
        }
        out
    }

    fn recompute_bounds(&mut self) {
        self.bounds = self.segments.iter().fold(Aabb::EMPTY, |acc, s| acc.union(&s.bounding_box()));
    }

    /// Twice the signed area, summed per segment so concatenated loops add up.
    fn signed_area2(&self) -> f64 {
        self.segments.iter().map(|s| s.start().perp_dot(s.end())).sum()
    }

    /// Enclosed area; zero for open paths.
    pub fn area(&self) -> f64 {
        if !self.closed {
            return 0.0;
        }
        (self.signed_area2() * 0.5).abs()
    }

    /// World-frame centroid.
    ///
    /// Area-weighted for closed polygons with non-zero area, otherwise the
    /// mean of the vertices. An empty polygon reports its translation.
    pub fn centroid(&self) -> DVec2 {
        if self.closed {
            let a2 = self.signed_area2();
            if a2.abs() > EPS {
                let sum = self.segments.iter().fold(DVec2::ZERO, |acc, s| {
                    let (a, b) = (s.start(), s.end());
                    acc + (a + b) * a.perp_dot(b)
                });
                return sum / (3.0 * a2);
            }
        }
        let verts = self.vertices();
        if verts.is_empty() {
            return self.pose.translation;
        }
        verts.iter().copied().sum::<DVec2>() / verts.len() as f64
    }

    /// Even-odd point containment; always false for open paths.
    pub fn contains_point(&self, p: DVec2) -> bool {
        if !self.closed {
            return false;
        }
        let mut inside = false;
        for s in &self.segments {
            let (a, b) = (s.start(), s.end());
            if (a.y > p.y) != (b.y > p.y) {
                let x = a.x + (p.y - a.y) * (b.x - a.x) / (b.y - a.y);
                if p.x < x {
                    inside = !inside;
                }
            }
        }
        inside
    }

    /// Mean of every pairwise segment intersection, or `None`.
    ///
    /// Segment pairs are pre-filtered by their own bounding boxes. For
    /// concave or multi-lobed overlaps the mean can fall outside the actual
    /// overlap region; callers rely on it as a single stable contact point.
    pub fn intersection_point(&self, other: &Polygon) -> Option<DVec2> {
        let (sum, n) = self.intersection_sum(other);
        (n > 0).then(|| sum / n as f64)
    }

    /// Sum and count of pairwise segment intersections.
    pub(crate) fn intersection_sum(&self, other: &Polygon) -> (DVec2, usize) {
        let mut sum = DVec2::ZERO;
        let mut n = 0usize;
        if !self.bounding_box_intersects(other) {
            return (sum, n);
        }
        for a in &self.segments {
            if !a.bounding_box().overlaps(&other.bounds) {
                continue;
            }
            for b in &other.segments {
                if !a.bounding_box_intersects(b) {
                    continue;
                }
                if let Some(p) = a.intersection_point(b) {
                    sum += p;
                    n += 1;
                }
            }
        }
        (sum, n)
    }

    /// True if two non-adjacent edges cross.
    pub fn self_intersects(&self) -> bool {
        let n = self.segments.len();
        for i in 0..n {
            for j in (i + 2)..n {
                if self.closed && i == 0 && j == n - 1 {
                    continue;
                }
                let (a, b) = (&self.segments[i], &self.segments[j]);
                if a.bounding_box_intersects(b) && a.intersection_point(b).is_some() {
                    return true;
                }
            }
        }
        false
    }

    /// Moment of inertia about the local origin for a uniform body of `mass`.
    ///
    /// Zero-area outlines fall back to `mass` times the mean squared vertex radius.
    pub fn moment_of_inertia(&self, mass: f64) -> f64 {
        let mut numerator = 0.0;
        let mut denominator = 0.0;
        for s in &self.segments {
            let [a, b] = s.local();
            let cross = a.perp_dot(b).abs();
            numerator += cross * (a.dot(a) + a.dot(b) + b.dot(b));
            denominator += cross;
        }
        if self.closed && denominator > EPS {
            return mass * numerator / (6.0 * denominator);
        }
        let radii: Vec<f64> = self.segments.iter().flat_map(|s| s.local()).map(|p| p.length_squared()).collect();
        if radii.is_empty() {
            return 0.0;
        }
        mass * radii.iter().sum::<f64>() / radii.len() as f64
    }
}

impl Shape for Polygon {
    fn set_position_rotation(&mut self, tx: f64, tz: f64, yaw: f64) {
        self.pose = Pose::new(tx, tz, yaw);
        for s in &mut self.segments {
            s.set_position_rotation(tx, tz, yaw);
        }
        self.recompute_bounds();
    }

    fn freeze(&mut self) {
        for s in &mut self.segments {
            s.freeze();
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

/// Concatenation: both sides are frozen into the result, so the merged
/// baseline is the current world state of each.
impl AddAssign<&Polygon> for Polygon {
    fn add_assign(&mut self, rhs: &Polygon) {
        self.freeze();
        self.closed = if self.segments.is_empty() { rhs.closed } else { self.closed && rhs.closed };
        self.segments.extend(rhs.segments.iter().cloned().map(|mut s| {
            s.freeze();
            s
        }));
        self.recompute_bounds();
    }
}

impl Add<&Polygon> for Polygon {
    type Output = Polygon;

    fn add(mut self, rhs: &Polygon) -> Polygon {
        self += rhs;
        self
    }
}
