use glam::{DVec2, DVec3};
use hullbonk::*;
use proptest::prelude::*;
use std::f64::consts::TAU;

fn point() -> impl Strategy<Value = DVec2> {
    (-5.0..5.0f64, -5.0..5.0f64).prop_map(|(x, y)| DVec2::new(x, y))
}

fn pose() -> impl Strategy<Value = Pose> {
    (-20.0..20.0f64, -20.0..20.0f64, -TAU..TAU).prop_map(|(x, z, yaw)| Pose::new(x, z, yaw))
}

fn polygon() -> impl Strategy<Value = Polygon> {
    (prop::collection::vec(point(), 3..7), pose()).prop_map(|(pts, pose)| {
        let mut p = Polygon::from_points(&pts, true);
        p.place(pose);
        p
    })
}

fn regular(n: usize, radius: f64) -> Polygon {
    let pts: Vec<DVec2> = (0..n).map(|i| DVec2::from_angle(TAU * i as f64 / n as f64) * radius).collect();
    Polygon::from_points(&pts, true)
}

fn close(a: DVec2, b: DVec2) -> bool {
    a.distance(b) <= 1e-6 * (1.0 + a.length().max(b.length()))
}

proptest! {
    #[test]
    fn freeze_resets_the_origin(a in point(), b in point(), pose in pose()) {
        let mut s = Segment::new(a, b);
        s.place(pose);
        s.freeze();
        prop_assert_eq!(s.pose(), Pose::IDENTITY);
        s.place(pose);
        let [wa, wb] = s.world();
        prop_assert!(close(wa, pose.apply(pose.apply(a))));
        prop_assert!(close(wb, pose.apply(pose.apply(b))));
    }

    #[test]
    fn intersection_is_symmetric(a in polygon(), b in polygon()) {
        let ab = a.intersection_point(&b);
        let ba = b.intersection_point(&a);
        prop_assert_eq!(ab.is_some(), ba.is_some());
        if let (Some(p), Some(q)) = (ab, ba) {
            prop_assert!(close(p, q), "{:?} vs {:?}", p, q);
        }
    }

    #[test]
    fn intersection_leaves_shapes_untouched(a in polygon(), b in polygon()) {
        let (a0, b0) = (a.clone(), b.clone());
        let _ = a.intersection_point(&b);
        let _ = a.self_intersects();
        prop_assert_eq!(&a, &a0);
        prop_assert_eq!(&b, &b0);
        prop_assert_eq!(a.bounding_box(), a0.bounding_box());
    }

    #[test]
    fn convex_polygon_never_self_intersects(n in 3usize..12, radius in 0.1..10.0f64, pose in pose()) {
        let mut p = regular(n, radius);
        p.place(pose);
        prop_assert!(!p.self_intersects());
    }

    #[test]
    fn disjoint_bounds_mean_no_contact(a in polygon(), b in polygon()) {
        if !a.bounding_box_intersects(&b) {
            prop_assert!(a.intersection_point(&b).is_none());
        }
    }

    #[test]
    fn swept_bounds_cover_both_ends(p in polygon(), v in point(), dt in 0.0..2.0f64) {
        let moving = Moving::new(p.clone(), v);
        let swept = moving.bounding_box_in_timeframe(dt);
        let mut end = p;
        end.translate(v.x * dt, v.y * dt);
        let (start, end) = (moving.shape.bounding_box(), end.bounding_box());
        prop_assert_eq!(swept.union(&start), swept);
        prop_assert!(swept.union(&end).min.abs_diff_eq(swept.min, 1e-9));
        prop_assert!(swept.union(&end).max.abs_diff_eq(swept.max, 1e-9));
    }

    #[test]
    fn index_stays_consistent(moves in prop::collection::vec((0u32..6, point(), 0.05..3.0f64), 1..40)) {
        let mut idx = SpaceIndex::new(1.0);
        for (key, c, half) in moves {
            let bounds = Aabb::new(c - DVec2::splat(half), c + DVec2::splat(half));
            if idx.contains(key) {
                idx.reindex(key, &bounds).unwrap();
            } else {
                idx.init_model(key, &bounds).unwrap();
            }
            prop_assert!(idx.is_consistent());
            let expected = idx.quadrants_for(&bounds);
            prop_assert_eq!(idx.quadrants_of(key), Some(&expected));
        }
        let pairs = idx.all_pairs_deduplicated(0..6);
        prop_assert!(pairs.iter().all(|(a, b)| a < b));
        prop_assert!(pairs.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn force_parts_are_complementary(r in point(), f in point()) {
        prop_assume!(r.length() > 1e-3 && f.length() > 1e-3);
        let force = Force::new(DVec3::new(r.x, 0.0, r.y), DVec3::new(f.x, 0.0, f.y));
        let (t, s) = (force.translation_part(), force.rotation_part());
        prop_assert!((0.0..=1.0).contains(&t));
        prop_assert!((t * t + s * s - 1.0).abs() < 1e-9);
    }
}
