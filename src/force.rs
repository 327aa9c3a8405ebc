//! Force decomposition into translational and rotational parts.
//!
//! Vectors are 3D for the entity layer's benefit, but only x/z take part;
//! y is reserved and passed through as zero. The split is a pure function of
//! the angle between the force's direction and the direction from the body
//! centre to the contact point: a force whose line passes through the centre
//! is fully translational, a tangential force fully rotational.

use glam::{DVec2, DVec3};

use crate::narrowphase::EPS;

/// Projection onto the x/z plane.
pub fn planar(v: DVec3) -> DVec2 {
    DVec2::new(v.x, v.z)
}

/// Lift an x/z vector back into 3D with y = 0.
pub fn spatial(v: DVec2) -> DVec3 {
    DVec3::new(v.x, 0.0, v.y)
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Force {
    /// Contact point relative to the body centre.
    pub position: DVec3,
    pub vector: DVec3,
}

/// Velocity change produced by a force.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Impulse {
    pub linear: DVec3,
    /// Yaw rate change, radians per unit time.
    pub angular: f64,
}

impl Impulse {
    pub const ZERO: Self = Self { linear: DVec3::ZERO, angular: 0.0 };

    pub fn is_zero(&self) -> bool {
        self.linear == DVec3::ZERO && self.angular == 0.0
    }
}

impl Force {
    pub fn new(position: DVec3, vector: DVec3) -> Self {
        Self { position, vector }
    }

    /// Force acting at a world point on a body centred at `center`.
    pub fn at_world_point(point: DVec3, vector: DVec3, center: DVec3) -> Self {
        Self { position: point - center, vector }
    }

    /// Signed angle from the contact direction to the force direction, or
    /// `None` when either has zero planar length.
    pub fn angle_between(&self) -> Option<f64> {
        let r = planar(self.position);
        let f = planar(self.vector);
        if r.length_squared() <= EPS * EPS || f.length_squared() <= EPS * EPS {
            return None;
        }
        Some(r.angle_to(f))
    }

    /// Share of the force that pushes the centre of mass, in `[0, 1]`.
    ///
    /// A force applied at the centre has no lever arm and is fully translational.
    pub fn translation_part(&self) -> f64 {
        if planar(self.vector).length_squared() <= EPS * EPS {
            return 0.0;
        }
        self.angle_between().map_or(1.0, |a| a.cos().abs())
    }

    /// Signed share of the force that turns the body, in `[-1, 1]`; positive
    /// turns toward positive yaw.
    pub fn rotation_part(&self) -> f64 {
        self.angle_between().map_or(0.0, f64::sin)
    }

    /// Translational component of the force vector.
    pub fn translation(&self) -> DVec3 {
        spatial(planar(self.vector) * self.translation_part())
    }

    /// Planar torque `r x F` about the body centre.
    pub fn torque(&self) -> f64 {
        if self.angle_between().is_none() {
            return 0.0;
        }
        let r = planar(self.position);
        let f = planar(self.vector);
        r.length() * f.length() * self.rotation_part()
    }

    /// Same force expressed in a frame rotated by `yaw` about the y axis.
    pub fn in_frame(&self, yaw: f64) -> Force {
        let rot = DVec2::from_angle(-yaw);
        Force {
            position: spatial(rot.rotate(planar(self.position))),
            vector: spatial(rot.rotate(planar(self.vector))),
        }
    }
}

/// Convert a force at a world point into velocity changes for a body.
///
/// Linear change is the translational part over `mass`; angular change is the
/// torque over `inertia`. Non-positive mass or inertia zeroes that side.
pub fn apply_global_force(force: &Force, mass: f64, inertia: f64) -> Impulse {
    let linear = if mass > EPS { force.translation() / mass } else { DVec3::ZERO };
    let angular = if inertia > EPS { force.torque() / inertia } else { 0.0 };
    Impulse { linear, angular }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_force_through_centre_is_translational() {
        let f = Force::new(DVec3::new(1.0, 0.0, 0.0), DVec3::new(-2.0, 0.0, 0.0));
        assert_abs_diff_eq!(f.translation_part(), 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(f.rotation_part(), 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(f.torque(), 0.0, epsilon = 1e-12);
        let imp = apply_global_force(&f, 2.0, 1.0);
        assert_abs_diff_eq!(imp.linear.x, -1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(imp.angular, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_tangential_force_is_rotational() {
        // Push +z at a point on +x: counter-clockwise in the x/z plane.
        let f = Force::new(DVec3::new(2.0, 0.0, 0.0), DVec3::new(0.0, 0.0, 3.0));
        assert_abs_diff_eq!(f.translation_part(), 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(f.rotation_part(), 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(f.torque(), 6.0, epsilon = 1e-12);
        let imp = apply_global_force(&f, 1.0, 3.0);
        assert_abs_diff_eq!(imp.linear.length(), 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(imp.angular, 2.0, epsilon = 1e-12);
        let opposite = Force::new(DVec3::new(2.0, 0.0, 0.0), DVec3::new(0.0, 0.0, -3.0));
        assert!(opposite.torque() < 0.0);
    }

    #[test]
    fn test_parts_are_complementary() {
        let f = Force::new(DVec3::new(1.0, 0.0, 1.0), DVec3::new(0.0, 0.0, 1.0));
        let t = f.translation_part();
        let r = f.rotation_part();
        assert_abs_diff_eq!(t * t + r * r, 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(t, 0.5f64.sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn test_degenerate_inputs_have_no_rotation() {
        let at_centre = Force::new(DVec3::ZERO, DVec3::new(1.0, 0.0, 0.0));
        assert_eq!(at_centre.translation_part(), 1.0);
        assert_eq!(at_centre.torque(), 0.0);
        let nothing = Force::new(DVec3::new(1.0, 0.0, 0.0), DVec3::ZERO);
        assert!(apply_global_force(&nothing, 1.0, 1.0).is_zero());
        let massless = apply_global_force(&at_centre, 0.0, 0.0);
        assert!(massless.is_zero());
    }

    #[test]
    fn test_world_point_and_frame_change() {
        let f = Force::at_world_point(DVec3::new(11.0, 0.0, 10.0), DVec3::new(0.0, 0.0, 1.0), DVec3::new(10.0, 0.0, 10.0));
        assert_eq!(f.position, DVec3::new(1.0, 0.0, 0.0));
        let local = f.in_frame(FRAC_PI_2);
        assert_abs_diff_eq!(local.position.z, -1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(local.vector.x, 1.0, epsilon = 1e-12);
        // The split does not depend on the frame.
        assert_abs_diff_eq!(local.torque(), f.torque(), epsilon = 1e-12);
    }
}
