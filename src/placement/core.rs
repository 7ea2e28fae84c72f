// src/placement/core.rs
//! Core types and traits for collision-free pose search.
//! Keep this file dependency-light; it should compile before any search or
//! overlap impls.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::room::boundary::BoundaryMesh;
use crate::room::registry::RoomGeometry;
use crate::room::scan::{default_filter_labels, SurfaceLabelMask};

// ---------- Candidate footprint ----------

/// Axis-aligned min/max extents of a candidate object in its local frame.
/// Derived once from the object's visual bounds at query time, never mutated.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct BoundingVolume {
    pub min: Vec3,
    pub max: Vec3,
}

impl BoundingVolume {
    pub fn from_half_extents(half: Vec3) -> Self {
        Self {
            min: -half,
            max: half,
        }
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    pub fn half_extents(&self) -> Vec3 {
        self.size() * 0.5
    }

    /// Smallest of the four horizontal half-extents, floored at zero. Used
    /// by samplers to stay far enough from room borders for the object to
    /// fit.
    pub fn min_horizontal_half_extent(&self) -> f32 {
        (-self.min.x)
            .min(-self.min.z)
            .min(self.max.x)
            .min(self.max.z)
            .max(0.0)
    }
}

// ---------- Query / result ----------

/// One placement request: footprint, where the caller wants the object, what
/// it should visually face, and how much gap it must keep from its support.
#[derive(Clone, Copy, Debug)]
pub struct PlacementQuery {
    pub bounds: BoundingVolume,
    pub target_point: Vec3,
    pub face_target: Vec3,
    pub clearance: f32,
}

/// Search outcome. `position`/`rotation` absent means no valid pose was
/// found — an expected outcome, not an error. `distance` is the achieved
/// distance to the target point for callers that want feedback.
#[derive(Clone, Copy, Debug)]
pub struct PlacementResult {
    pub position: Option<Vec3>,
    pub rotation: Option<Quat>,
    pub distance: f32,
}

impl PlacementResult {
    pub fn empty() -> Self {
        Self {
            position: None,
            rotation: None,
            distance: f32::INFINITY,
        }
    }

    pub fn found(position: Vec3, rotation: Quat, distance: f32) -> Self {
        Self {
            position: Some(position),
            rotation: Some(rotation),
            distance,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.position.is_none()
    }
}

// ---------- Surface constraints ----------

/// Directional classes of room surfaces, as a bitmask for samplers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SurfaceMask(pub u8);

impl SurfaceMask {
    pub const UP: Self = Self(1);
    pub const DOWN: Self = Self(1 << 1);
    pub const VERTICAL: Self = Self(1 << 2);
    pub const ANY: Self = Self(0b111);

    pub fn any(self, other: Self) -> bool {
        (self.0 & other.0) != 0
    }
}

/// Where the iterative search is allowed to put an object.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SurfacePreference {
    /// Free space anywhere inside the room.
    Floating,
    AnySurface,
    VerticalSurfaces,
    UpwardSurfaces,
    DownwardSurfaces,
}

impl SurfacePreference {
    /// `None` means free-space sampling rather than surface sampling.
    pub fn surface_mask(self) -> Option<SurfaceMask> {
        match self {
            SurfacePreference::Floating => None,
            SurfacePreference::AnySurface => Some(SurfaceMask::ANY),
            SurfacePreference::VerticalSurfaces => Some(SurfaceMask::VERTICAL),
            SurfacePreference::UpwardSurfaces => Some(SurfaceMask::UP),
            SurfacePreference::DownwardSurfaces => Some(SurfaceMask::DOWN),
        }
    }
}

/// Constraint bundle for the iterative search: directional preference,
/// semantic label filter, and the sampling budget.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct SpawnConstraint {
    pub location: SurfacePreference,
    #[serde(default = "default_filter_labels")]
    pub labels: SurfaceLabelMask,
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,
}

fn default_max_iterations() -> u32 {
    64
}

impl Default for SpawnConstraint {
    fn default() -> Self {
        Self {
            location: SurfacePreference::AnySurface,
            labels: SurfaceLabelMask::ALL,
            max_iterations: default_max_iterations(),
        }
    }
}

// ---------- Traits: search, overlap, delegated capabilities ----------

/// A pose search strategy. Runs synchronously to completion; geometry is
/// read-only for the duration of the call.
pub trait PoseSearch: Send + Sync + 'static {
    fn find_pose(&self, room: &RoomGeometry, query: &PlacementQuery) -> PlacementResult;
}

/// Decides whether a candidate bounding volume at a pose is collision-free
/// against a set of obstacle meshes. Read-only, side-effect-free.
pub trait OverlapTester: Send + Sync + 'static {
    fn is_free(
        &self,
        position: Vec3,
        rotation: Quat,
        bounds: &BoundingVolume,
        obstacles: &[&BoundaryMesh],
    ) -> bool;
}

/// Room-membership and short-range probing, answered by the room model.
pub trait RoomProbe: Send + Sync + 'static {
    fn is_position_in_room(&self, point: Vec3) -> bool;
    fn is_inside_solid(&self, point: Vec3) -> bool;
    /// True when anything lies within `max_dist` along `dir` from `origin`.
    fn raycast(&self, origin: Vec3, dir: Vec3, max_dist: f32) -> bool;
}

/// Random candidate-point source. Returning `None` means the room offers no
/// matching point at all; searches treat that as a normal "no pose" outcome.
pub trait SurfaceSampler: Send + Sync + 'static {
    fn sample_free_point(&self, min_radius: f32) -> Option<Vec3>;
    fn sample_surface_point(
        &self,
        mask: SurfaceMask,
        min_radius: f32,
        labels: SurfaceLabelMask,
    ) -> Option<(Vec3, Vec3)>;
}

/// Scene-level oriented-box overlap query (the accurate strategy's backend).
pub trait OverlapQuery: Send + Sync + 'static {
    fn check_box_overlap(
        &self,
        center: Vec3,
        half_extents: Vec3,
        rotation: Quat,
        labels: SurfaceLabelMask,
        ignore_non_solid: bool,
    ) -> bool;
}
