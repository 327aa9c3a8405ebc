//! Swept (continuous) variants of segments and polygons.
//!
//! A moving shape is a shape paired with a planar velocity. Sweeps are
//! straight-line translations over one timeframe; rotation during the frame
//! is not swept.

use glam::DVec2;

use crate::api::{NarrowphaseApi, Shape, SweepHit};
use crate::narrowphase::{EPS, Narrowphase};
use crate::polygon::Polygon;
use crate::segment::Segment;
use crate::types::Aabb;

#[derive(Clone, Debug, PartialEq)]
pub struct Moving<S> {
    pub shape: S,
    /// Units per unit of time (the same unit `dt` is expressed in).
    pub velocity: DVec2,
}

/// Result of a timeframe query.
#[derive(Clone, Debug, PartialEq)]
pub struct TimeframeHit {
    /// Earliest contact time within the frame.
    pub toi: f64,
    /// Mean world contact point among the contacts at `toi`.
    pub contact: DVec2,
    /// Every distinct contact time found, ascending.
    pub times: Vec<f64>,
}

impl<S> Moving<S> {
    pub fn new(shape: S, velocity: DVec2) -> Self {
        Self { shape, velocity }
    }
}

impl<S: Shape> Moving<S> {
    /// Current bounds grown toward the displacement `velocity * dt`.
    pub fn bounding_box_in_timeframe(&self, dt: f64) -> Aabb {
        self.shape.bounding_box().swept(self.velocity * dt)
    }

    /// Conservative pre-filter: may report false positives, never false negatives.
    pub fn bounding_box_intersects_in_timeframe<T: Shape>(&self, other: &Moving<T>, dt: f64) -> bool {
        self.bounding_box_in_timeframe(dt).overlaps(&other.bounding_box_in_timeframe(dt))
    }
}

/// Area traced by translating `seg` by `d`.
fn swept_quad(seg: &Segment, d: DVec2) -> Polygon {
    let (a, b) = (seg.start(), seg.end());
    Polygon::from_points(&[a, b, b + d, a + d], true)
}

fn quads_overlap(a: &Polygon, b: &Polygon) -> bool {
    if !a.bounding_box_intersects(b) {
        return false;
    }
    a.intersection_point(b).is_some()
        || a.vertices().first().is_some_and(|v| b.contains_point(*v))
        || b.vertices().first().is_some_and(|v| a.contains_point(*v))
}

fn sweep_segments(a: &Segment, va: DVec2, b: &Segment, vb: DVec2) -> Option<SweepHit> {
    Narrowphase::sweep_segment_segment(a.start(), a.end(), va, b.start(), b.end(), vb)
}

fn collect_hits(hits: Vec<SweepHit>) -> Option<TimeframeHit> {
    let toi = hits.iter().map(|h| h.toi).reduce(f64::min)?;
    let earliest: Vec<DVec2> = hits.iter().filter(|h| h.toi - toi <= EPS).map(|h| h.contact).collect();
    let contact = earliest.iter().copied().sum::<DVec2>() / earliest.len() as f64;
    let mut times: Vec<f64> = hits.iter().map(|h| h.toi).collect();
    times.sort_by(f64::total_cmp);
    times.dedup_by(|x, y| (*x - *y).abs() <= EPS);
    Some(TimeframeHit { toi, contact, times })
}

impl Moving<Segment> {
    /// Earliest contact time with `other` (0 if touching now), or `None`.
    pub fn time_to_impact(&self, other: &Moving<Segment>) -> Option<f64> {
        self.sweep(other).map(|h| h.toi)
    }

    pub fn sweep(&self, other: &Moving<Segment>) -> Option<SweepHit> {
        sweep_segments(&self.shape, self.velocity, &other.shape, other.velocity)
    }

    pub fn swept_quad(&self, dt: f64) -> Polygon {
        swept_quad(&self.shape, self.velocity * dt)
    }

    pub fn intersection_point_in_timeframe(&self, other: &Moving<Segment>, dt: f64) -> Option<TimeframeHit> {
        if !quads_overlap(&self.swept_quad(dt), &other.swept_quad(dt)) {
            return None;
        }
        let hit = self.sweep(other).filter(|h| h.toi <= dt + EPS)?;
        collect_hits(vec![hit])
    }
}

impl Moving<Polygon> {
    /// Earliest contact time with `other` (0 if already intersecting), or `None`.
    pub fn time_to_impact(&self, other: &Moving<Polygon>) -> Option<f64> {
        if self.shape.intersection_point(&other.shape).is_some() {
            return Some(0.0);
        }
        let mut best: Option<f64> = None;
        for a in self.shape.segments() {
            for b in other.shape.segments() {
                if let Some(hit) = sweep_segments(a, self.velocity, b, other.velocity) {
                    best = Some(best.map_or(hit.toi, |t| t.min(hit.toi)));
                }
            }
        }
        best
    }

    /// One swept quadrilateral per edge.
    pub fn swept_quads(&self, dt: f64) -> Vec<Polygon> {
        let d = self.velocity * dt;
        self.shape.segments().iter().map(|s| swept_quad(s, d)).collect()
    }

    /// Test every pair of edge quads; for each overlapping pair solve the exact
    /// contact time and keep those inside `[0, dt]`.
    pub fn intersection_point_in_timeframe(&self, other: &Moving<Polygon>, dt: f64) -> Option<TimeframeHit> {
        if !self.bounding_box_intersects_in_timeframe(other, dt) {
            return None;
        }
        let quads_a = self.swept_quads(dt);
        let quads_b = other.swept_quads(dt);
        let mut hits = Vec::new();
        for (a, qa) in self.shape.segments().iter().zip(&quads_a) {
            for (b, qb) in other.shape.segments().iter().zip(&quads_b) {
                if !quads_overlap(qa, qb) {
                    continue;
                }
                if let Some(hit) = sweep_segments(a, self.velocity, b, other.velocity) {
                    if hit.toi <= dt + EPS {
                        hits.push(hit);
                    }
                }
            }
        }
        collect_hits(hits)
    }
}
