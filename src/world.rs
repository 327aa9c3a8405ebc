use glam::{DVec2, DVec3};
use tracing::{debug, trace};

use std::collections::{BTreeMap, BTreeSet};
use std::time::Instant;

use crate::api::{CollisionWorldApi, Shape};
use crate::compound::Hull;
use crate::error::{GeomError, Result};
use crate::events::{ModelEvent, SubscriptionId, Subscriptions};
use crate::force::{Force, Impulse, apply_global_force, planar, spatial};
use crate::narrowphase::EPS;
use crate::space::SpaceIndex;
use crate::sweep::Moving;
use crate::types::*;

/// One registered body: the entity layer's kinematic snapshot plus the
/// geometry the core derives from it.
#[derive(Clone, Debug)]
pub struct Body {
    kinematics: Kinematics,
    previous: Kinematics,
    hull: Hull,
    inertia: f64,
    /// Bounds the index was last fed (swept when continuous detection is on).
    broad: Aabb,
}

impl Body {
    fn new(kinematics: Kinematics, mut hull: Hull) -> Self {
        hull.place(kinematics.pose());
        let inertia = hull.moment_of_inertia(kinematics.mass);
        let broad = hull.bounding_box();
        Self { kinematics, previous: kinematics, hull, inertia, broad }
    }

    pub fn kinematics(&self) -> &Kinematics {
        &self.kinematics
    }

    pub fn hull(&self) -> &Hull {
        &self.hull
    }

    pub fn inertia(&self) -> f64 {
        self.inertia
    }

    /// Pose along this tick's straight-line motion, `t` after the previous pose.
    fn pose_at(&self, t: f64) -> (Pose, DVec3) {
        let mut k = self.previous;
        k.position += k.velocity * t;
        (k.pose(), k.position)
    }
}

/// Narrow-phase result for one pair, with the response already computed.
#[derive(Clone, Debug, PartialEq)]
pub struct CollisionReport {
    pub a: BodyId,
    pub b: BodyId,
    /// World contact point (x/z).
    pub contact: DVec2,
    /// Set when the contact was found by the sweep rather than at the end-of-tick pose.
    pub toi: Option<f64>,
    pub impulse_a: Impulse,
    pub impulse_b: Impulse,
    /// Parts to damage, front-most first.
    pub damaged_a: Vec<PartId>,
    pub damaged_b: Vec<PartId>,
}

/// One side of a contact as seen by the response step.
struct Side<'a> {
    hull: &'a Hull,
    kinematics: &'a Kinematics,
    inertia: f64,
    center: DVec3,
    hit: BTreeSet<PartId>,
}

impl Side<'_> {
    /// A simple hull counts as one damageable unit.
    fn damage_capacity(&self) -> usize {
        if self.hull.is_compound() { self.hit.len() } else { 1 }
    }

    /// Hit parts ordered by centroid projection onto `axis`, largest first.
    fn front_parts(&self, axis: DVec2, n: usize) -> Vec<PartId> {
        let mut ranked: Vec<(f64, PartId)> = self
            .hit
            .iter()
            .filter_map(|id| self.hull.part_centroid(*id).map(|c| (c.dot(axis), *id)))
            .collect();
        ranked.sort_by(|x, y| y.0.total_cmp(&x.0).then(x.1.cmp(&y.1)));
        ranked.into_iter().take(n).map(|(_, id)| id).collect()
    }
}

/// Per-tick collision world: owns the spatial index and all derived bounds.
pub struct CollisionWorld {
    pub cfg: WorldConfig,
    pub tick_counter: u64,

    bodies: BTreeMap<BodyId, Body>,
    index: SpaceIndex<BodyId>,

    // Report buffer, drained by the caller
    reports: Vec<CollisionReport>,
    subscribers: Subscriptions<ModelEvent>,

    // Timing for last tick (optional)
    last_timing: Option<WorldTiming>,
}

impl CollisionWorldApi for CollisionWorld {
    /// Takes `cfg` as given; use `CollisionWorld::try_new` to validate it first.
    /// A degenerate `quadrant_size` is clamped by the index.
    fn new(cfg: WorldConfig) -> Self {
        let index = SpaceIndex::new(cfg.quadrant_size);
        Self {
            cfg,
            tick_counter: 0,
            bodies: BTreeMap::new(),
            index,
            reports: Vec::new(),
            subscribers: Subscriptions::new(),
            last_timing: None,
        }
    }

    fn spawn(&mut self, id: BodyId, kinematics: Kinematics, hull: Hull) -> Result<()> {
        if self.bodies.contains_key(&id) {
            return Err(GeomError::DuplicateBody(id));
        }
        let body = Body::new(kinematics, hull);
        self.index.init_model(id, &body.broad)?;
        self.bodies.insert(id, body);
        self.subscribers.publish(&ModelEvent::Spawned { id });
        Ok(())
    }

    fn update(&mut self, id: BodyId, kinematics: Kinematics) -> Result<()> {
        let body = self.bodies.get_mut(&id).ok_or(GeomError::UnknownBody(id))?;
        if body.kinematics.mass != kinematics.mass {
            body.inertia = body.hull.moment_of_inertia(kinematics.mass);
        }
        // An external update is a teleport: nothing to sweep.
        body.kinematics = kinematics;
        body.previous = kinematics;
        body.hull.place(kinematics.pose());
        body.broad = body.hull.bounding_box();
        let bounds = body.broad;
        self.index.reindex(id, &bounds)?;
        self.subscribers.publish(&ModelEvent::Moved { id, bounds });
        Ok(())
    }

    fn despawn(&mut self, id: BodyId) -> Result<()> {
        if !self.bodies.contains_key(&id) {
            return Err(GeomError::UnknownBody(id));
        }
        self.index.remove(id)?;
        self.bodies.remove(&id);
        self.subscribers.publish(&ModelEvent::Despawned { id });
        Ok(())
    }

    fn tick(&mut self, dt: f64) -> Result<()> {
        let enable_timing = self.cfg.enable_timing;
        let timed = move || if enable_timing { Some(Instant::now()) } else { None };
        let elapsed = |t: Option<Instant>| t.map(|t| t.elapsed().as_secs_f64() * 1000.0).unwrap_or(0.0);
        let t_all = timed();
        self.tick_counter = self.tick_counter.wrapping_add(1);

        // 1. Advance every body by its own velocity.
        let t0 = timed();
        let continuous = self.cfg.continuous;
        let mut moved: Vec<(BodyId, Aabb)> = Vec::with_capacity(self.bodies.len());
        for (id, body) in self.bodies.iter_mut() {
            body.previous = body.kinematics;
            let k = &mut body.kinematics;
            k.position += k.velocity * dt;
            k.rotation.y += k.angular_velocity * dt;
            body.hull.place(k.pose());
            let bounds = body.hull.bounding_box();
            body.broad = if continuous {
                // Grow back toward where the body started the tick.
                bounds.swept(-planar(k.position - body.previous.position))
            } else {
                bounds
            };
            moved.push((*id, body.broad));
        }
        let advance_ms = elapsed(t0);

        // 2. Refresh the index.
        let t1 = timed();
        for (id, bounds) in &moved {
            self.index.reindex(*id, bounds)?;
        }
        let index_ms = elapsed(t1);

        // 3. Candidate pairs.
        let t2 = timed();
        let pairs = self.candidate_pairs();
        let pairs_ms = elapsed(t2);

        // 4. Narrow phase and response; nothing is applied until every pair is done.
        let t3 = timed();
        let mut found: Vec<CollisionReport> = Vec::new();
        let budget = self.cfg.max_reports.saturating_sub(self.reports.len());
        for (a, b) in &pairs {
            if found.len() >= budget {
                break;
            }
            if let Some(report) = self.narrow_phase(*a, *b, dt) {
                trace!(a = ?report.a, b = ?report.b, contact = ?report.contact, toi = ?report.toi, "contact");
                found.push(report);
            }
        }
        for r in &found {
            self.apply_impulse(r.a, &r.impulse_a);
            self.apply_impulse(r.b, &r.impulse_b);
        }
        let narrowphase_ms = elapsed(t3);

        for (id, bounds) in moved {
            self.subscribers.publish(&ModelEvent::Moved { id, bounds });
        }
        for r in &found {
            self.subscribers.publish(&ModelEvent::Collided { id: r.a, other: r.b });
            self.subscribers.publish(&ModelEvent::Collided { id: r.b, other: r.a });
        }

        debug!(
            tick = self.tick_counter,
            bodies = self.bodies.len(),
            pairs = pairs.len(),
            reports = found.len(),
            "tick complete"
        );
        let reports_emitted = found.len();
        self.reports.extend(found);

        if let Some(t_all) = t_all {
            self.last_timing = Some(WorldTiming {
                tick_ms: t_all.elapsed().as_secs_f64() * 1000.0,
                advance_ms,
                index_ms,
                pairs_ms,
                narrowphase_ms,
                reports_emitted,
            });
        }
        Ok(())
    }

    fn drain_reports(&mut self) -> Vec<CollisionReport> {
        std::mem::take(&mut self.reports)
    }

    fn kinematics(&self, id: BodyId) -> Option<&Kinematics> {
        self.bodies.get(&id).map(|b| &b.kinematics)
    }

    fn bounding_box(&self, id: BodyId) -> Option<Aabb> {
        self.bodies.get(&id).map(|b| b.hull.bounding_box())
    }

    fn other_models(&self, id: BodyId) -> BTreeSet<BodyId> {
        self.index.other_models(id)
    }

    fn candidate_pairs(&self) -> Vec<(BodyId, BodyId)> {
        let ids: Vec<BodyId> = self.bodies.keys().copied().collect();
        let raw = if ids.len() <= self.cfg.brute_force_threshold {
            let mut out = Vec::new();
            for (i, a) in ids.iter().enumerate() {
                for b in &ids[i + 1..] {
                    out.push((*a, *b));
                }
            }
            out
        } else {
            self.index.all_pairs_deduplicated(ids)
        };
        raw.into_iter()
            .filter(|(a, b)| match (self.bodies.get(a), self.bodies.get(b)) {
                (Some(ba), Some(bb)) => ba.broad.overlaps(&bb.broad),
                _ => false,
            })
            .collect()
    }

    fn subscribe(&mut self, f: Box<dyn FnMut(&ModelEvent)>) -> SubscriptionId {
        self.subscribers.subscribe(f)
    }

    fn unsubscribe(&mut self, id: SubscriptionId) {
        self.subscribers.unsubscribe(id);
    }
}

impl CollisionWorld {
    /// Like `new`, but rejects an invalid configuration.
    pub fn try_new(cfg: WorldConfig) -> Result<Self> {
        cfg.validate()?;
        Ok(<Self as CollisionWorldApi>::new(cfg))
    }

    pub fn body(&self, id: BodyId) -> Option<&Body> {
        self.bodies.get(&id)
    }

    pub fn index(&self) -> &SpaceIndex<BodyId> {
        &self.index
    }

    fn narrow_phase(&self, a: BodyId, b: BodyId, dt: f64) -> Option<CollisionReport> {
        let ba = self.bodies.get(&a)?;
        let bb = self.bodies.get(&b)?;

        if let Some(contact) = ba.hull.intersection_point(&bb.hull) {
            let (hit_a, hit_b) = ba.hull.hit_parts(&bb.hull);
            let side_a = Side { hull: &ba.hull, kinematics: &ba.kinematics, inertia: ba.inertia, center: ba.kinematics.position, hit: hit_a };
            let side_b = Side { hull: &bb.hull, kinematics: &bb.kinematics, inertia: bb.inertia, center: bb.kinematics.position, hit: hit_b };
            return Some(self.respond(a, &side_a, b, &side_b, contact, None));
        }

        if !self.cfg.continuous || dt <= 0.0 {
            return None;
        }
        // Sweep both outlines from where the tick started.
        let mut oa = ba.hull.outline();
        oa.place(ba.previous.pose());
        let mut ob = bb.hull.outline();
        ob.place(bb.previous.pose());
        // Overlap at the start of the tick was already reported by the previous tick.
        if oa.intersection_point(&ob).is_some() {
            return None;
        }
        let ma = Moving::new(oa, ba.previous.planar_velocity());
        let mb = Moving::new(ob, bb.previous.planar_velocity());
        if !ma.bounding_box_intersects_in_timeframe(&mb, dt) {
            return None;
        }
        let hit = ma.intersection_point_in_timeframe(&mb, dt)?;

        let (pose_a, center_a) = ba.pose_at(hit.toi);
        let (pose_b, center_b) = bb.pose_at(hit.toi);
        let ha = ba.hull.placed_at(pose_a);
        let hb = bb.hull.placed_at(pose_b);
        let (hit_a, hit_b) = ha.hit_parts(&hb);
        let side_a = Side { hull: &ha, kinematics: &ba.kinematics, inertia: ba.inertia, center: center_a, hit: hit_a };
        let side_b = Side { hull: &hb, kinematics: &bb.kinematics, inertia: bb.inertia, center: center_b, hit: hit_b };
        Some(self.respond(a, &side_a, b, &side_b, hit.contact, Some(hit.toi)))
    }

    /// Elastic-style impulse split by the other body's mass share, plus damage selection.
    fn respond(
        &self,
        a: BodyId,
        side_a: &Side<'_>,
        b: BodyId,
        side_b: &Side<'_>,
        contact: DVec2,
        toi: Option<f64>,
    ) -> CollisionReport {
        let rel = side_a.kinematics.planar_velocity() - side_b.kinematics.planar_velocity();
        let (mass_a, mass_b) = (side_a.kinematics.mass, side_b.kinematics.mass);
        let total = mass_a + mass_b;
        let approaching = rel.dot(planar(side_b.center - side_a.center)) > 0.0;

        let (impulse_a, impulse_b) = if approaching && total > EPS {
            let k = 1.0 + self.cfg.restitution;
            let point = spatial(contact);
            let fa = Force::at_world_point(point, spatial(-rel * (mass_b / total) * mass_a * k), side_a.center);
            let fb = Force::at_world_point(point, spatial(rel * (mass_a / total) * mass_b * k), side_b.center);
            (apply_global_force(&fa, mass_a, side_a.inertia), apply_global_force(&fb, mass_b, side_b.inertia))
        } else {
            (Impulse::ZERO, Impulse::ZERO)
        };

        let n = side_a.damage_capacity().min(side_b.damage_capacity());
        CollisionReport {
            a,
            b,
            contact,
            toi,
            impulse_a,
            impulse_b,
            damaged_a: side_a.front_parts(rel, n),
            damaged_b: side_b.front_parts(-rel, n),
        }
    }

    fn apply_impulse(&mut self, id: BodyId, impulse: &Impulse) {
        if let Some(body) = self.bodies.get_mut(&id) {
            body.kinematics.velocity += impulse.linear;
            body.kinematics.angular_velocity += impulse.angular.to_degrees();
        }
    }

    /// Return debug/perf stats for the current index state.
    pub fn debug_stats(&self) -> WorldStats {
        self.index.debug_stats()
    }

    /// Return timing breakdown for the last `tick`.
    pub fn timing(&self) -> Option<WorldTiming> {
        self.last_timing
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compound::MultiPolygon;
    use crate::hulls::{rectangle, unit_square};
    use approx::assert_abs_diff_eq;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn cfg() -> WorldConfig {
        WorldConfig { quadrant_size: 1.0, ..Default::default() }
    }

    fn at(x: f64, vx: f64, mass: f64) -> Kinematics {
        Kinematics::at(DVec3::new(x, 0.0, 0.0), mass).with_velocity(DVec3::new(vx, 0.0, 0.0))
    }

    #[test]
    fn test_spawn_indexes_and_lifecycle_errors() {
        let mut w = CollisionWorld::new(cfg());
        w.spawn(BodyId(1), Kinematics::default(), unit_square().into()).unwrap();
        assert_eq!(w.index().quadrants_of(BodyId(1)).unwrap().len(), 4);
        assert!(matches!(
            w.spawn(BodyId(1), Kinematics::default(), unit_square().into()),
            Err(GeomError::DuplicateBody(_))
        ));
        assert!(matches!(w.update(BodyId(9), Kinematics::default()), Err(GeomError::UnknownBody(_))));
        w.despawn(BodyId(1)).unwrap();
        assert!(!w.index().contains(BodyId(1)));
        assert!(w.despawn(BodyId(1)).is_err());
    }

    #[test]
    fn test_update_moves_bounds_and_index() {
        let mut w = CollisionWorld::new(cfg());
        w.spawn(BodyId(1), Kinematics::default(), unit_square().into()).unwrap();
        w.update(BodyId(1), Kinematics::at(DVec3::new(10.5, 0.0, 10.5), 1.0)).unwrap();
        let bb = w.bounding_box(BodyId(1)).unwrap();
        assert_eq!((bb.left(), bb.bottom()), (10.0, 10.0));
        let qs: Vec<Quadrant> = w.index().quadrants_of(BodyId(1)).unwrap().iter().copied().collect();
        assert_eq!(qs, vec![(10, 10), (10, 11), (11, 10), (11, 11)]);
    }

    #[test]
    fn test_equal_masses_swap_velocities() {
        let mut w = CollisionWorld::new(cfg());
        w.spawn(BodyId(1), at(-0.55, 1.0, 1.0), unit_square().into()).unwrap();
        w.spawn(BodyId(2), at(0.55, -1.0, 1.0), unit_square().into()).unwrap();
        w.tick(0.1).unwrap();
        let reports = w.drain_reports();
        assert_eq!(reports.len(), 1);
        let r = &reports[0];
        assert_eq!((r.a, r.b), (BodyId(1), BodyId(2)));
        assert_eq!(r.toi, None);
        assert_abs_diff_eq!(r.contact.x, 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(r.contact.y, 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(w.kinematics(BodyId(1)).unwrap().velocity.x, -1.0, epsilon = 1e-9);
        assert_abs_diff_eq!(w.kinematics(BodyId(2)).unwrap().velocity.x, 1.0, epsilon = 1e-9);
        assert_abs_diff_eq!(w.kinematics(BodyId(1)).unwrap().angular_velocity, 0.0, epsilon = 1e-9);
        assert!(w.drain_reports().is_empty());
    }

    #[test]
    fn test_mass_share_conserves_momentum() {
        let mut w = CollisionWorld::new(cfg());
        w.spawn(BodyId(1), at(-0.55, 1.0, 3.0), unit_square().into()).unwrap();
        w.spawn(BodyId(2), at(0.55, -1.0, 1.0), unit_square().into()).unwrap();
        w.tick(0.1).unwrap();
        let va = w.kinematics(BodyId(1)).unwrap().velocity.x;
        let vb = w.kinematics(BodyId(2)).unwrap().velocity.x;
        assert_abs_diff_eq!(va, 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(vb, 2.0, epsilon = 1e-9);
        assert_abs_diff_eq!(3.0 * va + vb, 2.0, epsilon = 1e-9);
    }

    #[test]
    fn test_separating_contact_gets_no_impulse() {
        let mut w = CollisionWorld::new(cfg());
        w.spawn(BodyId(1), at(-0.55, 1.0, 1.0), unit_square().into()).unwrap();
        w.spawn(BodyId(2), at(0.55, -1.0, 1.0), unit_square().into()).unwrap();
        w.tick(0.1).unwrap();
        w.drain_reports();
        // Still overlapping but now moving apart.
        w.tick(0.01).unwrap();
        let reports = w.drain_reports();
        assert_eq!(reports.len(), 1);
        assert!(reports[0].impulse_a.is_zero());
        assert!(reports[0].impulse_b.is_zero());
    }

    #[test]
    fn test_separation_after_contact_is_not_reported_again() {
        let mut w = CollisionWorld::new(cfg());
        w.spawn(BodyId(1), at(-0.55, 1.0, 1.0), unit_square().into()).unwrap();
        w.spawn(BodyId(2), at(0.55, -1.0, 1.0), unit_square().into()).unwrap();
        w.tick(0.1).unwrap();
        assert_eq!(w.drain_reports().len(), 1);
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&log);
        w.subscribe(Box::new(move |e: &ModelEvent| sink.borrow_mut().push(*e)));
        // Velocities swapped; this tick ends with the squares apart.
        w.tick(0.2).unwrap();
        assert!(!w.bounding_box(BodyId(1)).unwrap().overlaps(&w.bounding_box(BodyId(2)).unwrap()));
        assert!(w.drain_reports().is_empty());
        assert!(!log.borrow().iter().any(|e| matches!(e, ModelEvent::Collided { .. })));
        assert_abs_diff_eq!(w.kinematics(BodyId(1)).unwrap().velocity.x, -1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_sweep_catches_tunneling_only_when_continuous() {
        let dt = 1.0 / 60.0;
        for continuous in [true, false] {
            let mut w = CollisionWorld::new(WorldConfig { continuous, ..cfg() });
            w.spawn(BodyId(1), at(-1.0, 120.0, 0.1), rectangle(0.1, 0.1).into()).unwrap();
            w.spawn(BodyId(2), Kinematics::at(DVec3::ZERO, 10.0), rectangle(0.05, 2.0).into()).unwrap();
            w.tick(dt).unwrap();
            let reports = w.drain_reports();
            if continuous {
                assert_eq!(reports.len(), 1);
                let toi = reports[0].toi.unwrap();
                assert!(toi > 0.0 && toi < dt);
                assert!(w.kinematics(BodyId(1)).unwrap().velocity.x < 120.0);
            } else {
                assert!(reports.is_empty());
            }
        }
    }

    #[test]
    fn test_damage_front_parts_first() {
        let mut ship = MultiPolygon::new();
        let back = ship.add_part(unit_square(), DVec2::new(-0.5, 0.0), 0.0);
        let front = ship.add_part(unit_square(), DVec2::new(0.5, 0.0), 0.0);
        // Staggered so the rail further along the wall's impact direction is added last.
        let mut rails = MultiPolygon::new();
        let bottom = rails.add_part(rectangle(3.0, 0.2), DVec2::new(0.2, -0.45), 0.0);
        let top = rails.add_part(rectangle(3.0, 0.2), DVec2::new(-0.2, 0.45), 0.0);

        let mut w = CollisionWorld::new(cfg());
        w.spawn(BodyId(1), at(0.0, 1.0, 1.0), ship.into()).unwrap();
        w.spawn(BodyId(2), Kinematics::default(), rails.into()).unwrap();
        w.tick(0.01).unwrap();
        let reports = w.drain_reports();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].damaged_a, vec![front, back]);
        assert_eq!(reports[0].damaged_b, vec![top, bottom]);
    }

    #[test]
    fn test_simple_side_caps_damage_at_one() {
        let mut ship = MultiPolygon::new();
        let back = ship.add_part(unit_square(), DVec2::new(-0.5, 0.0), 0.0);
        let front = ship.add_part(unit_square(), DVec2::new(0.5, 0.0), 0.0);
        let mut w = CollisionWorld::new(cfg());
        w.spawn(BodyId(1), at(0.0, 1.0, 1.0), ship.into()).unwrap();
        w.spawn(BodyId(2), Kinematics::default(), rectangle(3.0, 0.2).into()).unwrap();
        w.tick(0.01).unwrap();
        let r = &w.drain_reports()[0];
        assert_eq!(r.damaged_a, vec![front]);
        assert!(r.damaged_b.is_empty());
        assert_ne!(front, back);
    }

    #[test]
    fn test_brute_force_and_index_agree() {
        let positions = [(0.0, 0.0), (0.6, 0.0), (5.0, 5.0), (5.5, 5.2), (20.0, 0.0), (0.3, 0.4)];
        let mut small = CollisionWorld::new(WorldConfig { brute_force_threshold: 100, ..cfg() });
        let mut indexed = CollisionWorld::new(WorldConfig { brute_force_threshold: 0, ..cfg() });
        for (i, (x, z)) in positions.iter().enumerate() {
            let k = Kinematics::at(DVec3::new(*x, 0.0, *z), 1.0);
            small.spawn(BodyId(i as u64), k, unit_square().into()).unwrap();
            indexed.spawn(BodyId(i as u64), k, unit_square().into()).unwrap();
        }
        let pairs = small.candidate_pairs();
        assert_eq!(pairs, indexed.candidate_pairs());
        assert!(pairs.contains(&(BodyId(0), BodyId(1))));
        assert!(pairs.contains(&(BodyId(2), BodyId(3))));
        assert!(!pairs.iter().any(|(a, b)| *a == BodyId(4) || *b == BodyId(4)));
        assert!(pairs.iter().all(|(a, b)| a < b));
    }

    #[test]
    fn test_events_and_timing() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut w = CollisionWorld::new(WorldConfig { enable_timing: true, ..cfg() });
        let sink = Rc::clone(&log);
        let sub = w.subscribe(Box::new(move |e: &ModelEvent| sink.borrow_mut().push(*e)));
        w.spawn(BodyId(1), at(-0.55, 1.0, 1.0), unit_square().into()).unwrap();
        w.spawn(BodyId(2), at(0.55, -1.0, 1.0), unit_square().into()).unwrap();
        w.tick(0.1).unwrap();
        {
            let log = log.borrow();
            assert!(matches!(log[0], ModelEvent::Spawned { id: BodyId(1) }));
            assert_eq!(log.iter().filter(|e| matches!(e, ModelEvent::Moved { .. })).count(), 2);
            assert!(log.contains(&ModelEvent::Collided { id: BodyId(2), other: BodyId(1) }));
        }
        let timing = w.timing().unwrap();
        assert_eq!(timing.reports_emitted, 1);
        w.unsubscribe(sub);
        w.despawn(BodyId(2)).unwrap();
        assert!(!log.borrow().iter().any(|e| matches!(e, ModelEvent::Despawned { .. })));
    }

    #[test]
    fn test_unvalidated_config_only_through_new() {
        let bad = WorldConfig { quadrant_size: 0.0, ..cfg() };
        assert!(matches!(CollisionWorld::try_new(bad.clone()), Err(GeomError::InvalidConfig(_))));
        let mut w = CollisionWorld::new(bad);
        assert_eq!(w.index().quadrant_size(), crate::space::MIN_QUADRANT_SIZE);
        w.spawn(BodyId(1), Kinematics::default(), rectangle(1e-5, 1e-5).into()).unwrap();
        assert!(w.index().contains(BodyId(1)));
    }

    #[test]
    fn test_max_reports_caps_buffer() {
        let mut w = CollisionWorld::new(WorldConfig { max_reports: 1, ..cfg() });
        for i in 0..3 {
            w.spawn(BodyId(i), Kinematics::at(DVec3::new(i as f64 * 0.5, 0.0, 0.0), 1.0), unit_square().into()).unwrap();
        }
        w.tick(0.0).unwrap();
        assert_eq!(w.drain_reports().len(), 1);
    }
}
