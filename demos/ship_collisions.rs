use glam::{DVec2, DVec3};
use hullbonk::hulls::{rectangle, ship_hull};
use hullbonk::*;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("hullbonk=debug")))
        .init();

    let mut world = CollisionWorld::try_new(WorldConfig {
        quadrant_size: 1.0,
        brute_force_threshold: 8,
        restitution: 1.0,
        continuous: true,
        max_reports: 1024,
        enable_timing: true,
    })?;

    world.subscribe(Box::new(|ev: &ModelEvent| {
        if let ModelEvent::Collided { id, other } = ev {
            println!("event: {:?} collided with {:?}", id, other);
        }
    }));

    // A frigate built from three sections held together by arc connectors.
    let mut frigate = MultiPolygon::new();
    let bow = frigate.add_part(ship_hull(), DVec2::new(0.8, 0.0), 0.0);
    let mid = frigate.add_part(rectangle(0.6, 0.5), DVec2::ZERO, 0.0);
    let stern = frigate.add_part(rectangle(0.4, 0.7), DVec2::new(-0.8, 0.0), 0.0);
    let limits = ArcLimits { radius: 1.0, segments: 6, max_span: 2.0 };
    frigate.connect_or_detach(mid, bow, limits)?;
    frigate.connect_or_detach(stern, mid, limits)?;
    // An outrigger too far out for the arc radius is refused and dropped.
    let outrigger = frigate.add_part(rectangle(0.2, 0.2), DVec2::new(0.0, 3.0), 0.0);
    if let Err(err) = frigate.connect_or_detach(mid, outrigger, limits) {
        println!("outrigger detached: {err}");
    }

    world.spawn(
        BodyId(1),
        Kinematics::at(DVec3::new(-3.0, 0.0, 0.0), 4.0).with_velocity(DVec3::new(5.0, 0.0, 0.0)),
        frigate.into(),
    )?;
    world.spawn(
        BodyId(2),
        Kinematics::at(DVec3::new(3.0, 0.0, 0.1), 1.0)
            .with_velocity(DVec3::new(-5.0, 0.0, 0.0))
            .with_yaw(180.0),
        ship_hull().into(),
    )?;
    // A thin buoy that a fast ship would tunnel through without the sweep.
    world.spawn(BodyId(3), Kinematics::at(DVec3::new(6.0, 0.0, 0.0), 50.0), rectangle(0.05, 2.0).into())?;

    println!("Inserted frigate parts bow={:?} mid={:?} stern={:?}", bow, mid, stern);

    let dt = 1.0 / 60.0;
    for frame in 0..120 {
        world.tick(dt)?;
        for r in world.drain_reports() {
            println!(
                "frame {}: {:?} vs {:?} at ({:.3},{:.3}) toi={:?} dv_a=({:.2},{:.2}) dv_b=({:.2},{:.2}) damage a={:?} b={:?}",
                frame,
                r.a,
                r.b,
                r.contact.x,
                r.contact.y,
                r.toi,
                r.impulse_a.linear.x,
                r.impulse_a.linear.z,
                r.impulse_b.linear.x,
                r.impulse_b.linear.z,
                r.damaged_a,
                r.damaged_b
            );
        }
    }

    if let Some(t) = world.timing() {
        println!(
            "timing: tick={:.3}ms (advance={:.3}ms index={:.3}ms pairs={:.3}ms narrow={:.3}ms)",
            t.tick_ms, t.advance_ms, t.index_ms, t.pairs_ms, t.narrowphase_ms
        );
    }
    let stats = world.debug_stats();
    println!(
        "stats: bodies={} quadrants={} candidate_pairs={} unique_pairs={}",
        stats.bodies, stats.quadrants, stats.candidate_pairs, stats.unique_pairs
    );
    for id in [BodyId(1), BodyId(2), BodyId(3)] {
        if let Some(k) = world.kinematics(id) {
            println!("{:?}: pos=({:.2},{:.2}) vel=({:.2},{:.2}) yaw={:.1}", id, k.position.x, k.position.z, k.velocity.x, k.velocity.z, k.rotation.y);
        }
    }
    Ok(())
}
