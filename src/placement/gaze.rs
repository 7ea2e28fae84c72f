// src/placement/gaze.rs
//! Resolves the point a reference transform is looking at on the floor.

use bevy::prelude::*;

use crate::room::boundary::BoundaryMesh;

/// How far ahead of the reference to fall back when the gaze ray misses the
/// floor entirely.
pub const DEFAULT_GAZE_FALLBACK: f32 = 2.0;

pub struct GazeResolver {
    pub fallback_distance: f32,
}

impl Default for GazeResolver {
    fn default() -> Self {
        Self {
            fallback_distance: DEFAULT_GAZE_FALLBACK,
        }
    }
}

impl GazeResolver {
    /// Cast the reference's forward ray against the floor mesh. A miss
    /// yields a point `fallback_distance` ahead instead of failing.
    pub fn resolve(&self, reference: &Transform, floor: &BoundaryMesh) -> Vec3 {
        let origin = reference.translation;
        let dir = reference.forward().as_vec3();
        match floor.raycast(origin, dir, f32::INFINITY) {
            Some(t) => origin + dir * t,
            None => origin + dir * self.fallback_distance,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::room::boundary::{build_boundary_mesh, NormalHint};
    use crate::room::scan::SurfaceBoundary;
    use std::f32::consts::FRAC_PI_2;

    fn floor_mesh(side: f32) -> BoundaryMesh {
        build_boundary_mesh(
            &SurfaceBoundary {
                points: vec![
                    Vec2::new(0.0, 0.0),
                    Vec2::new(side, 0.0),
                    Vec2::new(side, -side),
                    Vec2::new(0.0, -side),
                ],
                frame: Transform::from_rotation(Quat::from_rotation_x(-FRAC_PI_2)),
            },
            NormalHint::Up,
        )
        .unwrap()
    }

    #[test]
    fn gaze_hits_the_floor() {
        let floor = floor_mesh(10.0);
        // standing at (5, 1.7, 5) looking down at 45 degrees toward +z
        let reference = Transform::from_xyz(5.0, 1.7, 5.0)
            .looking_at(Vec3::new(5.0, 0.0, 6.7), Vec3::Y);
        let hit = GazeResolver::default().resolve(&reference, &floor);
        assert!(hit.y.abs() < 1e-3);
        assert!((hit.x - 5.0).abs() < 1e-3);
        assert!((hit.z - 6.7).abs() < 1e-2);
    }

    #[test]
    fn missing_gaze_falls_back_ahead() {
        let floor = floor_mesh(10.0);
        // looking up and away from the floor
        let reference =
            Transform::from_xyz(5.0, 1.0, 5.0).looking_at(Vec3::new(5.0, 3.0, 4.0), Vec3::Y);
        let point = GazeResolver::default().resolve(&reference, &floor);
        let expected =
            reference.translation + reference.forward().as_vec3() * DEFAULT_GAZE_FALLBACK;
        assert!((point - expected).length() < 1e-4);
    }
}
