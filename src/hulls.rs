//! Preset outlines, centred on the local origin.

use glam::DVec2;

use crate::polygon::Polygon;

/// Default ship outline: a dart with its nose on +x, inside the unit box.
pub fn ship_hull() -> Polygon {
    Polygon::from_points(
        &[
            DVec2::new(0.45, 0.0),
            DVec2::new(-0.45, 0.35),
            DVec2::new(-0.25, 0.0),
            DVec2::new(-0.45, -0.35),
        ],
        true,
    )
}

/// Axis-aligned square with half-extent 0.5.
pub fn unit_square() -> Polygon {
    rectangle(1.0, 1.0)
}

/// Axis-aligned `width` x `height` rectangle (x by z).
pub fn rectangle(width: f64, height: f64) -> Polygon {
    let (hx, hz) = (width * 0.5, height * 0.5);
    Polygon::from_points(
        &[DVec2::new(-hx, -hz), DVec2::new(hx, -hz), DVec2::new(hx, hz), DVec2::new(-hx, hz)],
        true,
    )
}
