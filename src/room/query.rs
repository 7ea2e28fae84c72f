// src/room/query.rs
//! Reference implementations of the delegated placement capabilities,
//! answered directly from a `RoomGeometry` snapshot. The searches only ever
//! see the traits, so a physics-backed scene query can replace any of these
//! without touching search code.

use std::sync::{Arc, Mutex};

use bevy::prelude::*;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::placement::core::{OverlapQuery, RoomProbe, SurfaceMask, SurfaceSampler};
use crate::room::boundary::BoundaryMesh;
use crate::room::registry::RoomGeometry;
use crate::room::scan::SurfaceLabelMask;

/// Attempts per sampling call before giving up on a usable point.
const SAMPLE_ATTEMPTS: usize = 32;

/// Vertical band assumed for rooms scanned without walls or ceiling.
const FREE_SAMPLE_HEADROOM: f32 = 2.0;

const POINT_EPS: f32 = 1e-3;

/// Top of the room's usable vertical band: ceiling, else highest wall edge,
/// else a fixed headroom above the floor.
fn room_top(room: &RoomGeometry) -> f32 {
    if let Some(ceiling) = room.ceiling() {
        return ceiling.min.y;
    }
    let walls_top = room
        .walls()
        .iter()
        .map(|w| w.max.y)
        .fold(f32::NEG_INFINITY, f32::max);
    if walls_top.is_finite() {
        walls_top
    } else {
        room.floor().max.y + FREE_SAMPLE_HEADROOM
    }
}

fn all_meshes(room: &RoomGeometry) -> impl Iterator<Item = &BoundaryMesh> {
    std::iter::once(room.floor())
        .chain(room.ceiling())
        .chain(room.walls().iter())
        .chain(room.objects().iter())
}

// ---------- Geometry helpers ----------

/// Crossing-number containment of `p` (XZ projection) in a vertex ring.
pub(crate) fn point_in_ring_xz(ring: &[Vec3], p: Vec3) -> bool {
    let n = ring.len();
    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let (a, b) = (ring[i], ring[j]);
        if (a.z > p.z) != (b.z > p.z) {
            let t = (p.z - a.z) / (b.z - a.z);
            if p.x < a.x + t * (b.x - a.x) {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

pub(crate) fn point_segment_distance(p: Vec3, a: Vec3, b: Vec3) -> f32 {
    let ab = b - a;
    let len2 = ab.length_squared();
    if len2 <= f32::EPSILON {
        return p.distance(a);
    }
    let t = ((p - a).dot(ab) / len2).clamp(0.0, 1.0);
    p.distance(a + ab * t)
}

/// Distance from `p` to the nearest rim of the mesh's sampled face.
fn surface_clearance(mesh: &BoundaryMesh, p: Vec3) -> f32 {
    if mesh.ring {
        let n = mesh.vertices.len();
        let mut best = f32::INFINITY;
        for i in 0..n {
            let a = mesh.vertices[i];
            let b = mesh.vertices[(i + 1) % n];
            best = best.min(point_segment_distance(p, a, b));
        }
        best
    } else {
        // box face: distance to the bounds rim along the in-plane axes
        let n = mesh.plane_normal.abs();
        let mut best = f32::INFINITY;
        if n.x < 0.9 {
            best = best.min((p.x - mesh.min.x).min(mesh.max.x - p.x));
        }
        if n.y < 0.9 {
            best = best.min((p.y - mesh.min.y).min(mesh.max.y - p.y));
        }
        if n.z < 0.9 {
            best = best.min((p.z - mesh.min.z).min(mesh.max.z - p.z));
        }
        best
    }
}

fn aabb_distance(mesh: &BoundaryMesh, p: Vec3) -> f32 {
    let d = (mesh.min - p).max(p - mesh.max).max(Vec3::ZERO);
    d.length()
}

/// Directional class of a surface, from its plane normal.
fn direction_class(normal: Vec3) -> SurfaceMask {
    if normal.y >= 0.7 {
        SurfaceMask::UP
    } else if normal.y <= -0.7 {
        SurfaceMask::DOWN
    } else {
        SurfaceMask::VERTICAL
    }
}

// ---------- Room probe ----------

/// Room-membership, solid-volume, and short-range ray queries.
pub struct RoomQuery {
    room: Arc<RoomGeometry>,
}

impl RoomQuery {
    pub fn new(room: Arc<RoomGeometry>) -> Self {
        Self { room }
    }
}

impl RoomProbe for RoomQuery {
    fn is_position_in_room(&self, point: Vec3) -> bool {
        let floor = self.room.floor();
        if point.y < floor.min.y - POINT_EPS {
            return false;
        }
        if point.y > room_top(&self.room) + POINT_EPS {
            return false;
        }
        if floor.ring {
            point_in_ring_xz(&floor.vertices, point)
        } else {
            point.x >= floor.min.x
                && point.x <= floor.max.x
                && point.z >= floor.min.z
                && point.z <= floor.max.z
        }
    }

    fn is_inside_solid(&self, point: Vec3) -> bool {
        self.room
            .objects()
            .iter()
            .filter(|m| m.solid)
            .any(|m| m.contains_point(point))
    }

    fn raycast(&self, origin: Vec3, dir: Vec3, max_dist: f32) -> bool {
        all_meshes(&self.room).any(|m| m.raycast(origin, dir, max_dist).is_some())
    }
}

// ---------- Surface sampler ----------

/// Deterministic random point source over the room's surfaces and free
/// volume. Rebuilt per request with a seed mixed from the room's shape, so
/// identical requests reproduce identical candidate sequences.
pub struct GeometrySampler {
    room: Arc<RoomGeometry>,
    rng: Mutex<ChaCha8Rng>,
}

impl GeometrySampler {
    pub fn new(room: Arc<RoomGeometry>, seed: u64) -> Self {
        let mix = seed
            ^ ((room.walls().len() as u64) << 16)
            ^ ((room.objects().len() as u64) << 32)
            ^ 0x9E37_79B9_7F4A_7C15u64;
        Self {
            room,
            rng: Mutex::new(ChaCha8Rng::seed_from_u64(mix)),
        }
    }

    fn surfaces_matching(&self, mask: SurfaceMask, labels: SurfaceLabelMask) -> Vec<&BoundaryMesh> {
        all_meshes(&self.room)
            .filter(|m| mask.any(direction_class(m.plane_normal)) && labels.any(m.labels))
            .collect()
    }
}

impl SurfaceSampler for GeometrySampler {
    fn sample_free_point(&self, min_radius: f32) -> Option<Vec3> {
        let floor = self.room.floor();
        let x_lo = floor.min.x + min_radius;
        let x_hi = floor.max.x - min_radius;
        let z_lo = floor.min.z + min_radius;
        let z_hi = floor.max.z - min_radius;
        let y_lo = floor.max.y + min_radius;
        let y_hi = room_top(&self.room) - min_radius;
        if x_lo >= x_hi || z_lo >= z_hi || y_lo >= y_hi {
            return None;
        }

        let mut rng = self.rng.lock().expect("sampler rng mutex poisoned");
        for _ in 0..SAMPLE_ATTEMPTS {
            let p = Vec3::new(
                rng.random_range(x_lo..x_hi),
                rng.random_range(y_lo..y_hi),
                rng.random_range(z_lo..z_hi),
            );
            if floor.ring {
                if !point_in_ring_xz(&floor.vertices, p) {
                    continue;
                }
                let rim: f32 = (0..floor.vertices.len())
                    .map(|i| {
                        let a = floor.vertices[i];
                        let b = floor.vertices[(i + 1) % floor.vertices.len()];
                        point_segment_distance(Vec3::new(p.x, a.y, p.z), a, b)
                    })
                    .fold(f32::INFINITY, f32::min);
                if rim < min_radius {
                    continue;
                }
            }
            if self
                .room
                .objects()
                .iter()
                .filter(|m| m.solid)
                .any(|m| aabb_distance(m, p) < min_radius)
            {
                continue;
            }
            return Some(p);
        }
        None
    }

    fn sample_surface_point(
        &self,
        mask: SurfaceMask,
        min_radius: f32,
        labels: SurfaceLabelMask,
    ) -> Option<(Vec3, Vec3)> {
        let surfaces = self.surfaces_matching(mask, labels);
        if surfaces.is_empty() {
            return None;
        }

        let mut rng = self.rng.lock().expect("sampler rng mutex poisoned");
        for _ in 0..SAMPLE_ATTEMPTS {
            let mesh = surfaces[rng.random_range(0..surfaces.len())];
            let Some(point) = sample_point_on(mesh, &mut rng) else {
                continue;
            };
            if surface_clearance(mesh, point) < min_radius {
                continue;
            }
            return Some((point, mesh.plane_normal));
        }
        None
    }
}

/// Area-weighted triangle pick + barycentric point. Volume meshes sample
/// only the face that looks along the plane normal (an object's top, a
/// hanging volume's underside).
fn sample_point_on(mesh: &BoundaryMesh, rng: &mut ChaCha8Rng) -> Option<Vec3> {
    let candidates: Vec<usize> = if mesh.ring {
        (0..mesh.triangles.len()).collect()
    } else {
        facing_face_triangles(mesh)
    };

    let mut cumulative = Vec::with_capacity(candidates.len());
    let mut total = 0.0f32;
    for &i in &candidates {
        let (a, b, c) = mesh.triangle(i);
        total += 0.5 * (b - a).cross(c - a).length();
        cumulative.push(total);
    }
    if total <= f32::EPSILON {
        return None;
    }

    let pick = rng.random_range(0.0..total);
    let slot = cumulative.iter().position(|&cum| pick < cum)?;
    let (a, b, c) = mesh.triangle(candidates[slot]);

    let (mut u, mut v) = (rng.random::<f32>(), rng.random::<f32>());
    if u + v > 1.0 {
        u = 1.0 - u;
        v = 1.0 - v;
    }
    Some(a + (b - a) * u + (c - a) * v)
}

/// Triangles of the box face farthest along the plane normal.
fn facing_face_triangles(mesh: &BoundaryMesh) -> Vec<usize> {
    let n = mesh.plane_normal;
    let mut info = Vec::with_capacity(mesh.triangles.len());
    let mut max_d = f32::NEG_INFINITY;
    for i in 0..mesh.triangles.len() {
        let (a, b, c) = mesh.triangle(i);
        let geom = (b - a).cross(c - a).normalize_or_zero();
        let aligned = geom.dot(n).abs() > 0.9;
        let d = ((a + b + c) / 3.0).dot(n);
        if aligned && d > max_d {
            max_d = d;
        }
        info.push((aligned, d));
    }
    info.into_iter()
        .enumerate()
        .filter_map(|(i, (aligned, d))| (aligned && d > max_d - 1e-3).then_some(i))
        .collect()
}

// ---------- Scene overlap query ----------

/// Oriented-box overlap against the room's obstacle meshes, via a
/// separating-axis test per mesh AABB. The floor is support rather than an
/// obstacle and is excluded; exact touching counts as free so resting
/// contact never rejects a pose.
pub struct SceneOverlapQuery {
    room: Arc<RoomGeometry>,
}

impl SceneOverlapQuery {
    pub fn new(room: Arc<RoomGeometry>) -> Self {
        Self { room }
    }
}

impl OverlapQuery for SceneOverlapQuery {
    fn check_box_overlap(
        &self,
        center: Vec3,
        half_extents: Vec3,
        rotation: Quat,
        labels: SurfaceLabelMask,
        ignore_non_solid: bool,
    ) -> bool {
        let room = &self.room;
        room.walls()
            .iter()
            .chain(room.ceiling())
            .chain(room.objects().iter())
            .any(|m| {
                if ignore_non_solid && !m.solid {
                    return false;
                }
                if !labels.any(m.labels) {
                    return false;
                }
                obb_intersects_aabb(center, half_extents, rotation, m.min, m.max)
            })
    }
}

/// Gottschalk separating-axis test of an oriented box against an AABB.
/// Separation uses `>=`, so exact contact reads as non-overlapping.
pub fn obb_intersects_aabb(
    center: Vec3,
    half: Vec3,
    rotation: Quat,
    bmin: Vec3,
    bmax: Vec3,
) -> bool {
    let a_center = (bmin + bmax) * 0.5;
    let a_half = ((bmax - bmin) * 0.5).max(Vec3::ZERO);
    let b_axes = [rotation * Vec3::X, rotation * Vec3::Y, rotation * Vec3::Z];
    let t = center - a_center;

    // r[i][j] = world axis i dot box axis j
    let mut r = [[0.0f32; 3]; 3];
    for (j, axis) in b_axes.iter().enumerate() {
        r[0][j] = axis.x;
        r[1][j] = axis.y;
        r[2][j] = axis.z;
    }
    let t_arr = [t.x, t.y, t.z];
    let a_arr = [a_half.x, a_half.y, a_half.z];
    let b_arr = [half.x, half.y, half.z];

    // AABB face axes
    for i in 0..3 {
        let rb = b_arr[0] * r[i][0].abs() + b_arr[1] * r[i][1].abs() + b_arr[2] * r[i][2].abs();
        if t_arr[i].abs() >= a_arr[i] + rb {
            return false;
        }
    }

    // OBB face axes
    for j in 0..3 {
        let ra = a_arr[0] * r[0][j].abs() + a_arr[1] * r[1][j].abs() + a_arr[2] * r[2][j].abs();
        let dist = (t_arr[0] * r[0][j] + t_arr[1] * r[1][j] + t_arr[2] * r[2][j]).abs();
        if dist >= ra + b_arr[j] {
            return false;
        }
    }

    // cross-product axes; the epsilon keeps near-parallel edge pairs from
    // claiming a bogus separation
    const EPS: f32 = 1e-5;
    for i in 0..3 {
        let (i1, i2) = ((i + 1) % 3, (i + 2) % 3);
        for j in 0..3 {
            let (j1, j2) = ((j + 1) % 3, (j + 2) % 3);
            let ra = a_arr[i1] * r[i2][j].abs() + a_arr[i2] * r[i1][j].abs();
            let rb = b_arr[j1] * r[i][j2].abs() + b_arr[j2] * r[i][j1].abs();
            let dist = (t_arr[i2] * r[i1][j] - t_arr[i1] * r[i2][j]).abs();
            if dist >= ra + rb + EPS {
                return false;
            }
        }
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::room::scan::{AnchorVolume, RawAnchor, RawRoomScan};
    use std::f32::consts::FRAC_PI_2;

    /// 6x4 room: floor at y=0 spanning x in [-3,3], z in [-2,2], one wall at
    /// z=-2, ceiling at y=2.5, a table volume near (1.5, _, -1).
    fn demo_room() -> Arc<RoomGeometry> {
        let floor = RawAnchor {
            name: "floor".into(),
            frame: Transform::from_rotation(Quat::from_rotation_x(-FRAC_PI_2)),
            labels: SurfaceLabelMask::FLOOR,
            boundary: Some(vec![
                Vec2::new(-3.0, -2.0),
                Vec2::new(3.0, -2.0),
                Vec2::new(3.0, 2.0),
                Vec2::new(-3.0, 2.0),
            ]),
            volume: None,
            solid: true,
        };
        let wall = RawAnchor {
            name: "wall".into(),
            frame: Transform::from_xyz(0.0, 1.25, -2.0),
            labels: SurfaceLabelMask::WALL_FACE,
            boundary: Some(vec![
                Vec2::new(-3.0, -1.25),
                Vec2::new(3.0, -1.25),
                Vec2::new(3.0, 1.25),
                Vec2::new(-3.0, 1.25),
            ]),
            volume: None,
            solid: true,
        };
        let ceiling = RawAnchor {
            name: "ceiling".into(),
            frame: Transform {
                translation: Vec3::new(0.0, 2.5, 0.0),
                rotation: Quat::from_rotation_x(FRAC_PI_2),
                ..Default::default()
            },
            labels: SurfaceLabelMask::CEILING,
            boundary: Some(vec![
                Vec2::new(-3.0, -2.0),
                Vec2::new(3.0, -2.0),
                Vec2::new(3.0, 2.0),
                Vec2::new(-3.0, 2.0),
            ]),
            volume: None,
            solid: true,
        };
        let table = RawAnchor {
            name: "table".into(),
            frame: Transform::from_xyz(1.5, 0.45, -1.0),
            labels: SurfaceLabelMask::TABLE,
            boundary: None,
            volume: Some(AnchorVolume {
                center: Vec3::ZERO,
                size: Vec3::new(1.2, 0.9, 0.8),
            }),
            solid: true,
        };
        let scan = RawRoomScan {
            name: "demo".into(),
            anchors: vec![floor, wall, ceiling, table],
            floor: Some(0),
            ceiling: Some(2),
            walls: vec![1],
        };
        Arc::new(RoomGeometry::rebuild(&scan).unwrap())
    }

    #[test]
    fn point_in_ring_basics() {
        let ring = vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(4.0, 0.0, 0.0),
            Vec3::new(4.0, 0.0, 4.0),
            Vec3::new(0.0, 0.0, 4.0),
        ];
        assert!(point_in_ring_xz(&ring, Vec3::new(2.0, 1.0, 2.0)));
        assert!(!point_in_ring_xz(&ring, Vec3::new(5.0, 0.0, 2.0)));
        assert!(!point_in_ring_xz(&ring, Vec3::new(2.0, 0.0, -0.1)));
    }

    #[test]
    fn probe_room_membership() {
        let probe = RoomQuery::new(demo_room());
        assert!(probe.is_position_in_room(Vec3::new(0.0, 1.0, 0.0)));
        assert!(!probe.is_position_in_room(Vec3::new(4.0, 1.0, 0.0)));
        assert!(!probe.is_position_in_room(Vec3::new(0.0, 3.5, 0.0)));
        assert!(!probe.is_position_in_room(Vec3::new(0.0, -0.5, 0.0)));
    }

    #[test]
    fn probe_solid_volumes() {
        let probe = RoomQuery::new(demo_room());
        assert!(probe.is_inside_solid(Vec3::new(1.5, 0.45, -1.0)));
        assert!(!probe.is_inside_solid(Vec3::new(-2.0, 0.45, 1.0)));
    }

    #[test]
    fn probe_raycast_hits_wall() {
        let probe = RoomQuery::new(demo_room());
        assert!(probe.raycast(Vec3::new(0.0, 1.0, 0.0), Vec3::NEG_Z, 5.0));
        assert!(!probe.raycast(Vec3::new(0.0, 1.0, 0.0), Vec3::NEG_Z, 1.0));
    }

    #[test]
    fn upward_samples_lie_on_upward_surfaces() {
        let sampler = GeometrySampler::new(demo_room(), 7);
        for _ in 0..16 {
            let (p, n) = sampler
                .sample_surface_point(SurfaceMask::UP, 0.05, SurfaceLabelMask::ALL)
                .expect("room has upward surfaces");
            assert!(n.y > 0.9);
            // floor level or table top
            assert!(p.y.abs() < 1e-3 || (p.y - 0.9).abs() < 1e-3, "y = {}", p.y);
        }
    }

    #[test]
    fn label_filter_restricts_to_the_table() {
        let sampler = GeometrySampler::new(demo_room(), 11);
        let (p, _) = sampler
            .sample_surface_point(SurfaceMask::UP, 0.0, SurfaceLabelMask::TABLE)
            .expect("table is sampleable");
        assert!((p.y - 0.9).abs() < 1e-3);
        assert!(p.x >= 0.9 && p.x <= 2.1);
        assert!(p.z >= -1.4 && p.z <= -0.6);
    }

    #[test]
    fn vertical_samples_sit_on_the_wall_plane() {
        let sampler = GeometrySampler::new(demo_room(), 3);
        let (p, n) = sampler
            .sample_surface_point(SurfaceMask::VERTICAL, 0.1, SurfaceLabelMask::ALL)
            .expect("room has a wall");
        assert!((p.z + 2.0).abs() < 1e-3);
        assert!(n.y.abs() < 0.1);
    }

    #[test]
    fn downward_sampling_without_matching_labels_is_none() {
        let sampler = GeometrySampler::new(demo_room(), 5);
        assert!(sampler
            .sample_surface_point(SurfaceMask::DOWN, 0.0, SurfaceLabelMask::TABLE)
            .is_none());
    }

    #[test]
    fn free_points_stay_inside_the_room() {
        let sampler = GeometrySampler::new(demo_room(), 13);
        let probe = RoomQuery::new(demo_room());
        for _ in 0..8 {
            let p = sampler.sample_free_point(0.2).expect("room has free volume");
            assert!(probe.is_position_in_room(p));
        }
    }

    #[test]
    fn oversized_radius_short_circuits_free_sampling() {
        let sampler = GeometrySampler::new(demo_room(), 1);
        assert!(sampler.sample_free_point(10.0).is_none());
    }

    #[test]
    fn obb_aabb_overlap_cases() {
        let bmin = Vec3::ZERO;
        let bmax = Vec3::ONE;
        let half = Vec3::splat(0.5);

        // clear overlap
        assert!(obb_intersects_aabb(
            Vec3::new(0.5, 0.5, 0.5),
            half,
            Quat::IDENTITY,
            bmin,
            bmax
        ));
        // clear separation
        assert!(!obb_intersects_aabb(
            Vec3::new(3.0, 0.5, 0.5),
            half,
            Quat::IDENTITY,
            bmin,
            bmax
        ));
        // exact touch counts as free
        assert!(!obb_intersects_aabb(
            Vec3::new(1.5, 0.5, 0.5),
            half,
            Quat::IDENTITY,
            bmin,
            bmax
        ));
        // 45-degree yaw: diagonal reach ~0.707 still misses at 2.0 ...
        let yaw = Quat::from_rotation_y(std::f32::consts::FRAC_PI_4);
        assert!(!obb_intersects_aabb(
            Vec3::new(2.0, 0.5, 0.5),
            half,
            yaw,
            bmin,
            bmax
        ));
        // ... but reaches in at 1.6
        assert!(obb_intersects_aabb(
            Vec3::new(1.6, 0.5, 0.5),
            half,
            yaw,
            bmin,
            bmax
        ));
    }

    #[test]
    fn scene_query_respects_labels_and_skips_floor() {
        let query = SceneOverlapQuery::new(demo_room());
        // box around the table overlaps
        assert!(query.check_box_overlap(
            Vec3::new(1.5, 0.45, -1.0),
            Vec3::splat(0.2),
            Quat::IDENTITY,
            SurfaceLabelMask::ALL,
            false
        ));
        // label filter that excludes the table sees nothing there
        assert!(!query.check_box_overlap(
            Vec3::new(1.5, 0.45, -1.0),
            Vec3::splat(0.2),
            Quat::IDENTITY,
            SurfaceLabelMask::COUCH,
            false
        ));
        // hovering just above the floor in open space is free
        assert!(!query.check_box_overlap(
            Vec3::new(-2.0, 0.3, 1.0),
            Vec3::splat(0.25),
            Quat::IDENTITY,
            SurfaceLabelMask::ALL,
            false
        ));
    }
}
