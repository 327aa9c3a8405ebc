use glam::DVec2;

use crate::api::{NarrowphaseApi, SweepHit};

/// Decimal places used when deciding that a rotated segment is vertical or parallel.
pub const ALIGNMENT_DECIMALS: i32 = 8;

/// Slack for range checks, so shared endpoints count as contact.
pub(crate) const EPS: f64 = 1e-9;

pub(crate) fn round_decimals(v: f64) -> f64 {
    let scale = 10f64.powi(ALIGNMENT_DECIMALS);
    (v * scale).round() / scale
}

/// Frame in which an edge lies along the x axis at height `y`, spanning `lo..=hi`.
struct EdgeFrame {
    to_local: DVec2,
    to_world: DVec2,
    y: f64,
    lo: f64,
    hi: f64,
}

impl EdgeFrame {
    fn of(e0: DVec2, e1: DVec2) -> Option<Self> {
        let d = e1 - e0;
        if d.length_squared() <= EPS * EPS {
            return None;
        }
        let angle = d.y.atan2(d.x);
        let to_local = DVec2::from_angle(-angle);
        let q0 = to_local.rotate(e0);
        let q1 = to_local.rotate(e1);
        Some(Self {
            to_local,
            to_world: DVec2::from_angle(angle),
            y: (q0.y + q1.y) * 0.5,
            lo: q0.x.min(q1.x),
            hi: q0.x.max(q1.x),
        })
    }

    fn local(&self, p: DVec2) -> DVec2 {
        self.to_local.rotate(p)
    }

    fn world(&self, x: f64) -> DVec2 {
        self.to_world.rotate(DVec2::new(x, self.y))
    }

    fn spans(&self, x: f64) -> bool {
        x >= self.lo - EPS && x <= self.hi + EPS
    }
}

/// Earliest time at which one of `points`, moving with `v`, crosses the static edge `e0-e1`.
/// The returned point lies on the edge at its original placement.
fn endpoints_crossing(points: [DVec2; 2], v: DVec2, e0: DVec2, e1: DVec2) -> Option<(f64, DVec2)> {
    let frame = EdgeFrame::of(e0, e1)?;
    let lv = frame.to_local.rotate(v);
    // No motion across the edge's line: the crossing time is undefined.
    if round_decimals(lv.y) == 0.0 {
        return None;
    }
    let mut best: Option<(f64, DVec2)> = None;
    for p in points {
        let lp = frame.local(p);
        let t = (frame.y - lp.y) / lv.y;
        if t < 0.0 {
            continue;
        }
        let x = lp.x + lv.x * t;
        if !frame.spans(x) {
            continue;
        }
        match best {
            Some((bt, _)) if t >= bt => {}
            _ => best = Some((t, frame.world(x))),
        }
    }
    best
}

/// Narrowphase primitive tests.
pub struct Narrowphase;

impl NarrowphaseApi for Narrowphase {
    fn segment_segment(a0: DVec2, a1: DVec2, b0: DVec2, b1: DVec2) -> Option<DVec2> {
        if (a1 - a0).length_squared() <= EPS * EPS {
            return None;
        }
        let frame = EdgeFrame::of(b0, b1)?;
        let p0 = frame.local(a0);
        let p1 = frame.local(a1);

        let x = if round_decimals(p0.x) == round_decimals(p1.x) {
            // Vertical in b's frame: no slope, compare x directly.
            let (lo, hi) = (p0.y.min(p1.y), p0.y.max(p1.y));
            if frame.y < lo - EPS || frame.y > hi + EPS {
                return None;
            }
            p0.x
        } else if round_decimals(p0.y) == round_decimals(p1.y) {
            // Parallel segments never intersect, collinear overlap included.
            return None;
        } else {
            let t = (frame.y - p0.y) / (p1.y - p0.y);
            if t < -EPS || t > 1.0 + EPS {
                return None;
            }
            p0.x + t * (p1.x - p0.x)
        };

        if frame.spans(x) { Some(frame.world(x)) } else { None }
    }

    fn sweep_segment_segment(
        a0: DVec2,
        a1: DVec2,
        va: DVec2,
        b0: DVec2,
        b1: DVec2,
        vb: DVec2,
    ) -> Option<SweepHit> {
        if let Some(contact) = Self::segment_segment(a0, a1, b0, b1) {
            return Some(SweepHit { toi: 0.0, contact });
        }
        let rel = va - vb;
        // a's endpoints against b, then b's endpoints against a; the edge point
        // found is advanced with its owner's velocity to the impact time.
        let forward = endpoints_crossing([a0, a1], rel, b0, b1).map(|(t, p)| (t, p + vb * t));
        let backward = endpoints_crossing([b0, b1], -rel, a0, a1).map(|(t, p)| (t, p + va * t));
        let (toi, contact) = match (forward, backward) {
            (Some(f), Some(b)) => if b.0 < f.0 { b } else { f },
            (Some(f), None) => f,
            (None, Some(b)) => b,
            (None, None) => return None,
        };
        Some(SweepHit { toi, contact })
    }
}
