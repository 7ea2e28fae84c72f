// src/room/registry.rs
//! Classified collision geometry for the active room, rebuilt wholesale from
//! a raw scan. Read-only to every consumer after the rebuild; a rescan makes
//! a new value instead of editing this one.

use bevy::prelude::*;
use thiserror::Error;

use super::boundary::{
    build_boundary_mesh, build_volume_mesh, BoundaryMesh, MeshBuildError, NormalHint,
};
use super::scan::{RawAnchor, RawRoomScan};

#[derive(Debug, Error)]
pub enum RoomGeometryError {
    #[error("scan '{0}' has no floor anchor")]
    MissingFloor(String),
    #[error("floor anchor '{0}' has neither boundary nor volume data")]
    FloorWithoutGeometry(String),
    #[error("floor anchor '{name}' is unusable")]
    BadFloor {
        name: String,
        #[source]
        source: MeshBuildError,
    },
}

/// Exactly one floor, zero-or-more walls, zero-or-more freestanding objects,
/// plus the ceiling when the scan captured one. Walls and objects are kept
/// apart; callers wanting "all obstacles" chain the two lists themselves.
#[derive(Debug)]
pub struct RoomGeometry {
    floor: BoundaryMesh,
    ceiling: Option<BoundaryMesh>,
    walls: Vec<BoundaryMesh>,
    objects: Vec<BoundaryMesh>,
}

impl RoomGeometry {
    /// Build the full mesh set from a scan. Anchors without usable geometry
    /// are skipped with a diagnostic; only a missing/unusable floor is fatal
    /// to the rebuild (and even then only to the rebuild, not the process).
    pub fn rebuild(scan: &RawRoomScan) -> Result<Self, RoomGeometryError> {
        let floor_anchor = scan
            .floor_anchor()
            .ok_or_else(|| RoomGeometryError::MissingFloor(scan.name.clone()))?;
        let floor = build_anchor_mesh(floor_anchor, NormalHint::Up)
            .map_err(|source| RoomGeometryError::BadFloor {
                name: floor_anchor.name.clone(),
                source,
            })?
            .ok_or_else(|| RoomGeometryError::FloorWithoutGeometry(floor_anchor.name.clone()))?;

        let ceiling = match scan.ceiling_anchor() {
            Some(anchor) => build_or_skip(anchor, NormalHint::Down),
            None => None,
        };

        let mut walls = Vec::new();
        for anchor in scan.wall_anchors() {
            if let Some(mesh) = build_or_skip(anchor, NormalHint::Forward) {
                walls.push(mesh);
            }
        }

        let mut objects = Vec::new();
        for anchor in scan.object_anchors() {
            if let Some(mesh) = build_or_skip(anchor, NormalHint::Up) {
                objects.push(mesh);
            }
        }

        Ok(Self {
            floor,
            ceiling,
            walls,
            objects,
        })
    }

    pub fn floor(&self) -> &BoundaryMesh {
        &self.floor
    }

    pub fn ceiling(&self) -> Option<&BoundaryMesh> {
        self.ceiling.as_ref()
    }

    pub fn walls(&self) -> &[BoundaryMesh] {
        &self.walls
    }

    pub fn objects(&self) -> &[BoundaryMesh] {
        &self.objects
    }
}

fn build_anchor_mesh(
    anchor: &RawAnchor,
    hint: NormalHint,
) -> Result<Option<BoundaryMesh>, MeshBuildError> {
    let built = if let Some(boundary) = anchor.plane_boundary() {
        Some(build_boundary_mesh(&boundary, hint)?)
    } else {
        anchor
            .volume
            .as_ref()
            .map(|volume| build_volume_mesh(volume, &anchor.frame))
    };

    Ok(built.map(|mut mesh| {
        mesh.labels = anchor.labels;
        mesh.solid = anchor.solid;
        mesh
    }))
}

fn build_or_skip(anchor: &RawAnchor, hint: NormalHint) -> Option<BoundaryMesh> {
    match build_anchor_mesh(anchor, hint) {
        Ok(Some(mesh)) => Some(mesh),
        Ok(None) => {
            warn!(
                "anchor '{}' has no boundary or volume data, skipping",
                anchor.name
            );
            None
        }
        Err(e) => {
            warn!("anchor '{}' skipped: {e}", anchor.name);
            None
        }
    }
}
