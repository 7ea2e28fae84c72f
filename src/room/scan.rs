// src/room/scan.rs
//! Raw scanned-room data: anchors carrying boundary polygons or box volumes.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

// ---------- Semantic labels ----------

/// Bitmask of semantic surface labels (fast filter). Filters default to
/// `ALL`; anchors without an explicit label fall back to `OTHER`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SurfaceLabelMask(pub u32);

impl SurfaceLabelMask {
    pub const NONE: Self = Self(0);
    pub const FLOOR: Self = Self(1 << 0);
    pub const CEILING: Self = Self(1 << 1);
    pub const WALL_FACE: Self = Self(1 << 2);
    pub const TABLE: Self = Self(1 << 3);
    pub const COUCH: Self = Self(1 << 4);
    pub const STORAGE: Self = Self(1 << 5);
    pub const SCREEN: Self = Self(1 << 6);
    pub const OTHER: Self = Self(1 << 7);
    pub const ALL: Self = Self(u32::MAX);

    pub fn any(self, other: Self) -> bool {
        (self.0 & other.0) != 0
    }

    pub fn contains(self, other: Self) -> bool {
        (self.0 & other.0) == other.0
    }
}

pub(crate) fn default_anchor_labels() -> SurfaceLabelMask {
    SurfaceLabelMask::OTHER
}

pub(crate) fn default_filter_labels() -> SurfaceLabelMask {
    SurfaceLabelMask::ALL
}

// ---------- Anchor geometry ----------

/// Closed 2D outline of a planar surface, in the anchor's local frame.
/// Points live at local z = 0; `frame` carries them into world space.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SurfaceBoundary {
    pub points: Vec<Vec2>,
    pub frame: Transform,
}

/// Box extent for anchors scanned as volumes rather than planes (local frame).
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct AnchorVolume {
    pub center: Vec3,
    pub size: Vec3,
}

/// One scanned surface or object record, as delivered by the scanner.
/// Immutable once read; an anchor may expose a boundary polygon, a box
/// volume, both, or (for degraded scans) neither.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RawAnchor {
    pub name: String,
    pub frame: Transform,
    #[serde(default = "default_anchor_labels")]
    pub labels: SurfaceLabelMask,
    #[serde(default)]
    pub boundary: Option<Vec<Vec2>>,
    #[serde(default)]
    pub volume: Option<AnchorVolume>,
    /// Physically blocking. Non-solid anchors (door/window frames) can be
    /// skipped by overlap queries on request.
    #[serde(default = "default_solid")]
    pub solid: bool,
}

fn default_solid() -> bool {
    true
}

impl RawAnchor {
    /// The anchor's boundary polygon paired with its frame, if it has one.
    pub fn plane_boundary(&self) -> Option<SurfaceBoundary> {
        let points = self.boundary.as_ref()?;
        if points.is_empty() {
            return None;
        }
        Some(SurfaceBoundary {
            points: points.clone(),
            frame: self.frame,
        })
    }
}

// ---------- Room snapshot ----------

/// Snapshot of one scanned room. `floor`, `ceiling`, and `walls` index into
/// `anchors`; every anchor not referenced by them counts as a freestanding
/// object, matching the scanner's own classification.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RawRoomScan {
    pub name: String,
    pub anchors: Vec<RawAnchor>,
    #[serde(default)]
    pub floor: Option<usize>,
    #[serde(default)]
    pub ceiling: Option<usize>,
    #[serde(default)]
    pub walls: Vec<usize>,
}

impl RawRoomScan {
    pub fn floor_anchor(&self) -> Option<&RawAnchor> {
        self.floor.and_then(|i| self.anchors.get(i))
    }

    pub fn ceiling_anchor(&self) -> Option<&RawAnchor> {
        self.ceiling.and_then(|i| self.anchors.get(i))
    }

    pub fn wall_anchors(&self) -> impl Iterator<Item = &RawAnchor> {
        self.walls.iter().filter_map(|&i| self.anchors.get(i))
    }

    /// Everything that is not floor, ceiling, or wall.
    pub fn object_anchors(&self) -> impl Iterator<Item = &RawAnchor> {
        self.anchors.iter().enumerate().filter_map(|(i, anchor)| {
            let classified =
                Some(i) == self.floor || Some(i) == self.ceiling || self.walls.contains(&i);
            (!classified).then_some(anchor)
        })
    }
}
