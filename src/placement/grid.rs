// src/placement/grid.rs
//! Exhaustive grid scan over the floor's planar bounds.

use std::sync::Arc;

use bevy::prelude::*;

use super::core::{OverlapTester, PlacementQuery, PlacementResult, PoseSearch};
use super::facing::compute_facing;
use crate::room::boundary::BoundaryMesh;
use crate::room::registry::RoomGeometry;

/// Deterministic floor search: steps a uniform x/z grid across the floor
/// rectangle and keeps the free cell nearest the target point.
///
/// Cost is O((width/spacing) * (depth/spacing) * obstacle vertices) and the
/// scan runs synchronously to completion — callers pick `spacing` with that
/// in mind.
pub struct GridScanSearch {
    spacing: f32,
    tester: Arc<dyn OverlapTester>,
}

impl GridScanSearch {
    pub fn new(spacing: f32, tester: Arc<dyn OverlapTester>) -> Self {
        // zero or negative spacing would never terminate
        Self {
            spacing: spacing.max(0.01),
            tester,
        }
    }
}

impl PoseSearch for GridScanSearch {
    fn find_pose(&self, room: &RoomGeometry, query: &PlacementQuery) -> PlacementResult {
        let floor = room.floor();
        let obstacles: Vec<&BoundaryMesh> =
            room.walls().iter().chain(room.objects().iter()).collect();

        // candidate rests on the floor: center raised by half its height
        let y = floor.min.y + query.bounds.size().y * 0.5;

        let mut best = PlacementResult::empty();
        let mut x = floor.min.x;
        while x <= floor.max.x {
            let mut z = floor.min.z;
            while z <= floor.max.z {
                let position = Vec3::new(x, y, z);
                if self
                    .tester
                    .is_free(position, Quat::IDENTITY, &query.bounds, &obstacles)
                {
                    let distance = position.distance(query.target_point);
                    // strictly-less: the first candidate at a distance wins
                    if distance < best.distance {
                        let rotation = compute_facing(position, query.face_target);
                        best = PlacementResult::found(position, rotation, distance);
                    }
                }
                z += self.spacing;
            }
            x += self.spacing;
        }
        best
    }
}
