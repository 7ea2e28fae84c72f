// src/placement/overlap.rs
//! The two interchangeable overlap strategies.

use std::sync::Arc;

use bevy::prelude::*;

use super::core::{BoundingVolume, OverlapQuery, OverlapTester};
use crate::room::boundary::BoundaryMesh;
use crate::room::scan::SurfaceLabelMask;

/// Cheap containment test: the candidate's axis-aligned world box against
/// every obstacle vertex. Rotation is ignored.
///
/// Conservative by design: an obstacle face can pass through the candidate
/// box without any obstacle vertex entering it, and such overlaps are
/// missed. That is a known approximation of this strategy, not a bug to fix
/// here — callers wanting accuracy use [`OrientedBoxOverlap`].
pub struct VertexContainment;

impl OverlapTester for VertexContainment {
    fn is_free(
        &self,
        position: Vec3,
        _rotation: Quat,
        bounds: &BoundingVolume,
        obstacles: &[&BoundaryMesh],
    ) -> bool {
        let lo = position + bounds.min;
        let hi = position + bounds.max;
        for mesh in obstacles {
            for v in &mesh.vertices {
                if v.x >= lo.x
                    && v.x <= hi.x
                    && v.y >= lo.y
                    && v.y <= hi.y
                    && v.z >= lo.z
                    && v.z <= hi.z
                {
                    return false;
                }
            }
        }
        true
    }
}

/// Accurate strategy: one oriented-box query against the whole scene,
/// delegated to the [`OverlapQuery`] capability. The passed obstacle list is
/// unused — the scene query owns the geometry set.
pub struct OrientedBoxOverlap {
    pub query: Arc<dyn OverlapQuery>,
    pub labels: SurfaceLabelMask,
    pub ignore_non_solid: bool,
}

impl OrientedBoxOverlap {
    pub fn new(query: Arc<dyn OverlapQuery>) -> Self {
        Self {
            query,
            labels: SurfaceLabelMask::ALL,
            ignore_non_solid: false,
        }
    }
}

impl OverlapTester for OrientedBoxOverlap {
    fn is_free(
        &self,
        position: Vec3,
        rotation: Quat,
        bounds: &BoundingVolume,
        _obstacles: &[&BoundaryMesh],
    ) -> bool {
        let center = position + rotation * bounds.center();
        !self.query.check_box_overlap(
            center,
            bounds.half_extents(),
            rotation,
            self.labels,
            self.ignore_non_solid,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::room::boundary::build_volume_mesh;
    use crate::room::scan::AnchorVolume;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn box_mesh(center: Vec3, size: Vec3) -> BoundaryMesh {
        build_volume_mesh(
            &AnchorVolume {
                center: Vec3::ZERO,
                size,
            },
            &Transform::from_translation(center),
        )
    }

    #[test]
    fn vertex_containment_rejects_near_corners() {
        let obstacle = box_mesh(Vec3::new(5.0, 1.0, 5.0), Vec3::splat(2.0));
        let bounds = BoundingVolume::from_half_extents(Vec3::splat(0.25));
        let tester = VertexContainment;
        let obstacles = [&obstacle];

        // corner of the obstacle at (4, 0, 4) falls inside this candidate box
        assert!(!tester.is_free(
            Vec3::new(4.1, 0.2, 4.1),
            Quat::IDENTITY,
            &bounds,
            &obstacles
        ));
        // well away from every corner
        assert!(tester.is_free(
            Vec3::new(1.0, 0.25, 1.0),
            Quat::IDENTITY,
            &bounds,
            &obstacles
        ));
    }

    #[test]
    fn vertex_containment_misses_face_only_overlap() {
        // candidate sits at the obstacle's center, far from all 8 corners:
        // the documented conservative gap of this strategy
        let obstacle = box_mesh(Vec3::new(5.0, 1.0, 5.0), Vec3::splat(2.0));
        let bounds = BoundingVolume::from_half_extents(Vec3::splat(0.25));
        assert!(VertexContainment.is_free(
            Vec3::new(5.0, 0.25, 5.0),
            Quat::IDENTITY,
            &bounds,
            &[&obstacle]
        ));
    }

    struct CountingQuery {
        hit: bool,
        calls: AtomicUsize,
    }

    impl OverlapQuery for CountingQuery {
        fn check_box_overlap(
            &self,
            _center: Vec3,
            _half_extents: Vec3,
            _rotation: Quat,
            _labels: SurfaceLabelMask,
            _ignore_non_solid: bool,
        ) -> bool {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.hit
        }
    }

    #[test]
    fn oriented_box_delegates_once_per_check() {
        let query = Arc::new(CountingQuery {
            hit: false,
            calls: AtomicUsize::new(0),
        });
        let tester = OrientedBoxOverlap::new(query.clone());
        let bounds = BoundingVolume::from_half_extents(Vec3::splat(0.5));
        assert!(tester.is_free(Vec3::ZERO, Quat::IDENTITY, &bounds, &[]));
        assert_eq!(query.calls.load(Ordering::SeqCst), 1);

        let hitting = Arc::new(CountingQuery {
            hit: true,
            calls: AtomicUsize::new(0),
        });
        let tester = OrientedBoxOverlap::new(hitting);
        assert!(!tester.is_free(Vec3::ZERO, Quat::IDENTITY, &bounds, &[]));
    }
}
