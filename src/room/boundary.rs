// src/room/boundary.rs
//! Scan boundaries -> world-space collision meshes.
//!
//! Polygons are fan-triangulated from vertex 0. That is O(n) and correct for
//! the convex/near-convex boundaries room scans produce; it is NOT a general
//! polygon triangulator, and concave boundaries can emit overlapping
//! triangles. Kept as-is deliberately so triangle topology stays predictable
//! (count = n - 2) for downstream consumers.

use bevy::prelude::*;
use thiserror::Error;

use super::scan::{AnchorVolume, SurfaceBoundary, SurfaceLabelMask};

/// Uniform normal assigned to every vertex of a built mesh.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NormalHint {
    /// Floor, object tops.
    Up,
    /// Ceiling-like faces.
    Down,
    /// Vertical wall faces.
    Forward,
}

impl NormalHint {
    pub fn vector(self) -> Vec3 {
        match self {
            NormalHint::Up => Vec3::Y,
            NormalHint::Down => Vec3::NEG_Y,
            NormalHint::Forward => Vec3::NEG_Z,
        }
    }
}

#[derive(Debug, Error)]
pub enum MeshBuildError {
    #[error("boundary needs at least 3 points, got {0}")]
    DegenerateBoundary(usize),
}

/// World-space triangle mesh built from one scanned anchor.
///
/// These are collision/query meshes, not shading meshes: every vertex shares
/// the same hint normal. `plane_normal` is the anchor frame's actual facing
/// in world space (local +Z for planes, +Y for volumes) and is what surface
/// samplers report. When `ring` is true the vertices keep the boundary's
/// outline order, so consecutive pairs are the rim edges.
#[derive(Clone, Debug)]
pub struct BoundaryMesh {
    pub vertices: Vec<Vec3>,
    pub triangles: Vec<[u32; 3]>,
    pub normals: Vec<Vec3>,
    pub plane_normal: Vec3,
    pub labels: SurfaceLabelMask,
    pub solid: bool,
    pub ring: bool,
    pub min: Vec3,
    pub max: Vec3,
}

impl BoundaryMesh {
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    /// Axis-aligned containment against the recomputed bounds.
    pub fn contains_point(&self, p: Vec3) -> bool {
        p.x >= self.min.x
            && p.x <= self.max.x
            && p.y >= self.min.y
            && p.y <= self.max.y
            && p.z >= self.min.z
            && p.z <= self.max.z
    }

    pub fn triangle(&self, index: usize) -> (Vec3, Vec3, Vec3) {
        let [a, b, c] = self.triangles[index];
        (
            self.vertices[a as usize],
            self.vertices[b as usize],
            self.vertices[c as usize],
        )
    }

    /// Nearest hit distance along `dir` within `max_dist`, if any.
    pub fn raycast(&self, origin: Vec3, dir: Vec3, max_dist: f32) -> Option<f32> {
        let mut best: Option<f32> = None;
        for i in 0..self.triangles.len() {
            let (a, b, c) = self.triangle(i);
            if let Some(t) = ray_triangle(origin, dir, a, b, c) {
                if t <= max_dist && best.map_or(true, |prev| t < prev) {
                    best = Some(t);
                }
            }
        }
        best
    }
}

/// Möller–Trumbore. Returns the hit distance for t > epsilon, so a ray
/// starting exactly on a surface does not report its own support.
pub fn ray_triangle(origin: Vec3, dir: Vec3, a: Vec3, b: Vec3, c: Vec3) -> Option<f32> {
    const EPS: f32 = 1e-6;
    let e1 = b - a;
    let e2 = c - a;
    let p = dir.cross(e2);
    let det = e1.dot(p);
    if det.abs() < EPS {
        return None;
    }
    let inv = 1.0 / det;
    let s = origin - a;
    let u = s.dot(p) * inv;
    if !(0.0..=1.0).contains(&u) {
        return None;
    }
    let q = s.cross(e1);
    let v = dir.dot(q) * inv;
    if v < 0.0 || u + v > 1.0 {
        return None;
    }
    let t = e2.dot(q) * inv;
    (t > EPS).then_some(t)
}

fn bounds_of(vertices: &[Vec3]) -> (Vec3, Vec3) {
    let mut min = Vec3::splat(f32::INFINITY);
    let mut max = Vec3::splat(f32::NEG_INFINITY);
    for v in vertices {
        min = min.min(*v);
        max = max.max(*v);
    }
    (min, max)
}

/// Build a collision mesh from a boundary polygon.
///
/// Fan triangulation from vertex 0: triangles (0, i, i+1), exactly n - 2 of
/// them. Fewer than 3 points is a reportable error, never a silent empty
/// mesh.
pub fn build_boundary_mesh(
    boundary: &SurfaceBoundary,
    hint: NormalHint,
) -> Result<BoundaryMesh, MeshBuildError> {
    let n = boundary.points.len();
    if n < 3 {
        return Err(MeshBuildError::DegenerateBoundary(n));
    }

    let vertices: Vec<Vec3> = boundary
        .points
        .iter()
        .map(|p| boundary.frame.transform_point(Vec3::new(p.x, p.y, 0.0)))
        .collect();

    let mut triangles = Vec::with_capacity(n - 2);
    for i in 1..(n - 1) {
        triangles.push([0u32, i as u32, (i + 1) as u32]);
    }

    let normal = hint.vector();
    let plane_normal = (boundary.frame.rotation * Vec3::Z).normalize_or_zero();
    let (min, max) = bounds_of(&vertices);

    Ok(BoundaryMesh {
        normals: vec![normal; n],
        vertices,
        triangles,
        plane_normal,
        labels: SurfaceLabelMask::OTHER,
        solid: true,
        ring: true,
        min,
        max,
    })
}

/// Build a 12-triangle box mesh from a volume anchor's 8 corners.
/// Normals are uniform +Y across all corners, matching the plane meshes'
/// single-normal convention.
pub fn build_volume_mesh(volume: &AnchorVolume, frame: &Transform) -> BoundaryMesh {
    let c = volume.center;
    let h = volume.size * 0.5;

    let corners = [
        c + Vec3::new(-h.x, -h.y, -h.z),
        c + Vec3::new(h.x, -h.y, -h.z),
        c + Vec3::new(h.x, -h.y, h.z),
        c + Vec3::new(-h.x, -h.y, h.z),
        c + Vec3::new(-h.x, h.y, -h.z),
        c + Vec3::new(h.x, h.y, -h.z),
        c + Vec3::new(h.x, h.y, h.z),
        c + Vec3::new(-h.x, h.y, h.z),
    ];
    let vertices: Vec<Vec3> = corners.iter().map(|&p| frame.transform_point(p)).collect();

    let triangles = vec![
        // bottom
        [0, 2, 1],
        [0, 3, 2],
        // top
        [4, 5, 6],
        [4, 6, 7],
        // front
        [0, 1, 5],
        [0, 5, 4],
        // back
        [2, 3, 7],
        [2, 7, 6],
        // left
        [0, 4, 7],
        [0, 7, 3],
        // right
        [1, 2, 6],
        [1, 6, 5],
    ];

    let plane_normal = (frame.rotation * Vec3::Y).normalize_or_zero();
    let (min, max) = bounds_of(&vertices);

    BoundaryMesh {
        normals: vec![Vec3::Y; vertices.len()],
        vertices,
        triangles,
        plane_normal,
        labels: SurfaceLabelMask::OTHER,
        solid: true,
        ring: false,
        min,
        max,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    /// Frame that maps local (x, y) onto the world ground plane at `y`.
    fn floor_frame(y: f32) -> Transform {
        Transform {
            translation: Vec3::new(0.0, y, 0.0),
            rotation: Quat::from_rotation_x(-FRAC_PI_2),
            ..Default::default()
        }
    }

    fn square_boundary(side: f32, frame: Transform) -> SurfaceBoundary {
        SurfaceBoundary {
            points: vec![
                Vec2::new(0.0, 0.0),
                Vec2::new(side, 0.0),
                Vec2::new(side, -side),
                Vec2::new(0.0, -side),
            ],
            frame,
        }
    }

    #[test]
    fn fan_emits_n_minus_two_triangles() {
        for n in 3..10 {
            let points: Vec<Vec2> = (0..n)
                .map(|i| {
                    let a = i as f32 / n as f32 * std::f32::consts::TAU;
                    Vec2::new(a.cos(), a.sin())
                })
                .collect();
            let boundary = SurfaceBoundary {
                points,
                frame: Transform::IDENTITY,
            };
            let mesh = build_boundary_mesh(&boundary, NormalHint::Up).unwrap();
            assert_eq!(mesh.vertices.len(), n);
            assert_eq!(mesh.triangles.len(), n - 2);
            assert!(mesh.normals.iter().all(|&nrm| nrm == Vec3::Y));
        }
    }

    #[test]
    fn degenerate_boundary_is_an_error() {
        let boundary = SurfaceBoundary {
            points: vec![Vec2::ZERO, Vec2::X],
            frame: Transform::IDENTITY,
        };
        assert!(matches!(
            build_boundary_mesh(&boundary, NormalHint::Up),
            Err(MeshBuildError::DegenerateBoundary(2))
        ));
    }

    #[test]
    fn frame_carries_points_into_world_space() {
        let mesh = build_boundary_mesh(&square_boundary(4.0, floor_frame(1.5)), NormalHint::Up)
            .unwrap();
        assert!((mesh.min - Vec3::new(0.0, 1.5, 0.0)).length() < 1e-4);
        assert!((mesh.max - Vec3::new(4.0, 1.5, 4.0)).length() < 1e-4);
        // the frame's local +Z faces world up
        assert!((mesh.plane_normal - Vec3::Y).length() < 1e-5);
    }

    #[test]
    fn forward_hint_sets_wall_normals() {
        let boundary = SurfaceBoundary {
            points: vec![
                Vec2::new(-1.0, -1.0),
                Vec2::new(1.0, -1.0),
                Vec2::new(1.0, 1.0),
                Vec2::new(-1.0, 1.0),
            ],
            frame: Transform::IDENTITY,
        };
        let mesh = build_boundary_mesh(&boundary, NormalHint::Forward).unwrap();
        assert!(mesh.normals.iter().all(|&n| n == Vec3::NEG_Z));
    }

    #[test]
    fn volume_mesh_has_box_shape() {
        let volume = AnchorVolume {
            center: Vec3::ZERO,
            size: Vec3::new(2.0, 1.0, 4.0),
        };
        let frame = Transform::from_xyz(10.0, 0.5, -3.0);
        let mesh = build_volume_mesh(&volume, &frame);
        assert_eq!(mesh.vertices.len(), 8);
        assert_eq!(mesh.triangles.len(), 12);
        assert_eq!(mesh.min, Vec3::new(9.0, 0.0, -5.0));
        assert_eq!(mesh.max, Vec3::new(11.0, 1.0, -1.0));
        assert!(mesh.contains_point(Vec3::new(10.0, 0.5, -3.0)));
        assert!(!mesh.contains_point(Vec3::new(10.0, 1.5, -3.0)));
    }

    #[test]
    fn raycast_hits_floor_from_above() {
        let mesh = build_boundary_mesh(&square_boundary(4.0, floor_frame(0.0)), NormalHint::Up)
            .unwrap();
        let t = mesh
            .raycast(Vec3::new(2.0, 3.0, 2.0), Vec3::NEG_Y, f32::INFINITY)
            .expect("ray should hit the floor");
        assert!((t - 3.0).abs() < 1e-4);

        // ray pointed away misses
        assert!(mesh
            .raycast(Vec3::new(2.0, 3.0, 2.0), Vec3::Y, f32::INFINITY)
            .is_none());
        // range-limited ray stops short
        assert!(mesh
            .raycast(Vec3::new(2.0, 3.0, 2.0), Vec3::NEG_Y, 2.0)
            .is_none());
    }
}
