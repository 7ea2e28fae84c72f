// src/placement/sampling.rs
//! Iterative randomized surface sampling search.

use std::sync::Arc;

use bevy::prelude::*;

use super::core::{
    BoundingVolume, OverlapTester, PlacementQuery, PlacementResult, PoseSearch, RoomProbe,
    SpawnConstraint, SurfaceSampler,
};
use super::facing::{compute_facing, compute_facing_on_surface};
use crate::room::boundary::BoundaryMesh;
use crate::room::registry::RoomGeometry;

/// Samples up to `constraint.max_iterations` candidate points — free-floating
/// or projected onto surfaces of the requested class — and keeps the
/// collision-free candidate nearest the target point.
///
/// The loop never returns early: the invariant is "minimum distance among
/// all checked candidates", so the whole budget is spent even after a
/// perfect hit. A sampler that yields nothing ends the loop quietly; "no
/// pose found" is a normal outcome.
pub struct SurfaceSamplingSearch {
    constraint: SpawnConstraint,
    override_radius: Option<f32>,
    tester: Arc<dyn OverlapTester>,
    probe: Arc<dyn RoomProbe>,
    sampler: Arc<dyn SurfaceSampler>,
}

impl SurfaceSamplingSearch {
    pub fn new(
        constraint: SpawnConstraint,
        tester: Arc<dyn OverlapTester>,
        probe: Arc<dyn RoomProbe>,
        sampler: Arc<dyn SurfaceSampler>,
    ) -> Self {
        Self {
            constraint,
            override_radius: None,
            tester,
            probe,
            sampler,
        }
    }

    /// Replace the footprint with a synthetic cylinder-equivalent box of
    /// this radius. Non-positive radii are ignored.
    pub fn with_override_radius(mut self, radius: f32) -> Self {
        if radius > 0.0 {
            self.override_radius = Some(radius);
        }
        self
    }

    /// Bounds used for the overlap gate: downward extent shrunk by the
    /// clearance so a candidate resting at its support never collides with
    /// it, or the override box when one is configured.
    fn adjusted_bounds(&self, query: &PlacementQuery) -> BoundingVolume {
        if let Some(r) = self.override_radius {
            return BoundingVolume {
                min: Vec3::new(-r, 0.0, -r),
                max: Vec3::new(r, query.clearance * 2.0, r),
            };
        }
        let mut min = query.bounds.min;
        let mut max = query.bounds.max;
        min.y += query.clearance;
        max.y = max.y.max(min.y);
        BoundingVolume { min, max }
    }
}

impl PoseSearch for SurfaceSamplingSearch {
    fn find_pose(&self, room: &RoomGeometry, query: &PlacementQuery) -> PlacementResult {
        let bounds = &query.bounds;
        let min_radius = bounds.min_horizontal_half_extent();
        let base_offset = -bounds.min.y;
        let center_offset = bounds.center().y;
        let adjusted = self.adjusted_bounds(query);
        let obstacles: Vec<&BoundaryMesh> =
            room.walls().iter().chain(room.objects().iter()).collect();

        let mut best = PlacementResult::empty();
        for _ in 0..self.constraint.max_iterations {
            let (position, rotation) = match self.constraint.location.surface_mask() {
                None => {
                    let Some(p) = self.sampler.sample_free_point(min_radius) else {
                        break;
                    };
                    (p, compute_facing(p, query.face_target))
                }
                Some(mask) => {
                    let Some((point, normal)) =
                        self.sampler
                            .sample_surface_point(mask, min_radius, self.constraint.labels)
                    else {
                        break;
                    };
                    let position = point + normal * base_offset;
                    let center = position + normal * center_offset;
                    if !self.probe.is_position_in_room(center) {
                        continue;
                    }
                    if self.probe.is_inside_solid(center) {
                        continue;
                    }
                    // clearance probe straight off the support
                    if self.probe.raycast(point, normal, query.clearance) {
                        continue;
                    }
                    (
                        position,
                        compute_facing_on_surface(position, query.face_target, normal),
                    )
                }
            };

            if !self
                .tester
                .is_free(position, rotation, &adjusted, &obstacles)
            {
                continue;
            }

            let distance = position.distance(query.target_point);
            if distance < best.distance {
                best = PlacementResult::found(position, rotation, distance);
            }
        }
        best
    }
}
