// src/room/plugin.rs
//! Room plugin wiring (glue).
//! - scan capture loading
//! - geometry rebuild on scan events
//! - debug rendering of the built meshes

use std::sync::Arc;

use bevy::prelude::*;
use bevy::render::mesh::{Indices, Mesh, PrimitiveTopology};
use bevy::render::render_asset::RenderAssetUsages;

use super::boundary::BoundaryMesh;
use super::loader::{begin_scan_load, poll_scan_load, ScanLoadTask};
use super::registry::RoomGeometry;
use super::scan::RawRoomScan;

/// Where the scan capture lives and which mesh classes get rendered.
/// Wall/object collision meshes stay invisible by default.
#[derive(Resource, Clone)]
pub struct RoomScanSettings {
    pub scan_path: String,
    pub show_floor: bool,
    pub show_walls: bool,
    pub show_objects: bool,
}

impl Default for RoomScanSettings {
    fn default() -> Self {
        Self {
            scan_path: "assets/rooms/studio.room.ron".to_string(),
            show_floor: true,
            show_walls: false,
            show_objects: false,
        }
    }
}

/// The scan snapshot currently driving the room.
#[derive(Resource, Clone)]
pub struct ActiveScan(pub Arc<RawRoomScan>);

/// The rebuilt collision geometry. Replaced wholesale on rescans.
#[derive(Resource, Clone)]
pub struct ActiveRoom(pub Arc<RoomGeometry>);

/// Fired when a scan snapshot becomes available.
#[derive(Event, Clone, Copy)]
pub struct RoomScanned;

/// Fired when `ActiveRoom` holds freshly rebuilt geometry.
#[derive(Event, Clone, Copy)]
pub struct RoomGeometryReady;

/// Tag for spawned room mesh entities so rescans can clear them.
#[derive(Component)]
pub struct RoomMeshTag;

pub struct RoomPlugin;

impl Plugin for RoomPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<RoomScanSettings>()
            .init_resource::<ScanLoadTask>()
            .add_event::<RoomScanned>()
            .add_event::<RoomGeometryReady>()
            .add_systems(Startup, begin_scan_load)
            .add_systems(Update, poll_scan_load)
            .add_systems(Update, rebuild_room_geometry.after(poll_scan_load))
            .add_systems(Update, spawn_room_meshes.after(rebuild_room_geometry));
    }
}

/// Rebuild collision geometry whenever a scan lands. A bad scan logs a
/// diagnostic and leaves the previous geometry (if any) in place.
fn rebuild_room_geometry(
    mut commands: Commands,
    mut scanned: EventReader<RoomScanned>,
    mut ready: EventWriter<RoomGeometryReady>,
    scan: Option<Res<ActiveScan>>,
) {
    for _ in scanned.read() {
        let Some(scan) = scan.as_ref() else {
            continue;
        };
        match RoomGeometry::rebuild(&scan.0) {
            Ok(room) => {
                info!(
                    "room '{}': {} walls, {} objects, ceiling: {}",
                    scan.0.name,
                    room.walls().len(),
                    room.objects().len(),
                    room.ceiling().is_some(),
                );
                commands.insert_resource(ActiveRoom(Arc::new(room)));
                ready.write(RoomGeometryReady);
            }
            Err(e) => error!("room geometry rebuild failed: {e}"),
        }
    }
}

/// Convert a collision mesh into a renderable one (positions + the uniform
/// normals + fan indices).
pub fn to_render_mesh(mesh: &BoundaryMesh) -> Mesh {
    let positions: Vec<[f32; 3]> = mesh.vertices.iter().map(|v| [v.x, v.y, v.z]).collect();
    let normals: Vec<[f32; 3]> = mesh.normals.iter().map(|n| [n.x, n.y, n.z]).collect();
    let indices: Vec<u32> = mesh.triangles.iter().flatten().copied().collect();

    let mut out = Mesh::new(PrimitiveTopology::TriangleList, RenderAssetUsages::default());
    out.insert_attribute(Mesh::ATTRIBUTE_POSITION, positions);
    out.insert_attribute(Mesh::ATTRIBUTE_NORMAL, normals);
    out.insert_indices(Indices::U32(indices));
    out
}

/// Spawn render meshes for freshly rebuilt geometry, clearing the previous
/// room's entities first.
fn spawn_room_meshes(
    mut commands: Commands,
    mut ready: EventReader<RoomGeometryReady>,
    room: Option<Res<ActiveRoom>>,
    settings: Res<RoomScanSettings>,
    previous: Query<Entity, With<RoomMeshTag>>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    if ready.is_empty() {
        return;
    }
    ready.clear();
    let Some(room) = room else {
        return;
    };

    for entity in previous.iter() {
        commands.entity(entity).despawn();
    }

    let floor_mat = materials.add(StandardMaterial {
        base_color: Color::linear_rgb(0.35, 0.37, 0.4),
        perceptual_roughness: 0.95,
        ..default()
    });
    let wall_mat = materials.add(StandardMaterial {
        base_color: Color::linear_rgb(0.55, 0.53, 0.5),
        perceptual_roughness: 0.9,
        ..default()
    });
    let object_mat = materials.add(StandardMaterial {
        base_color: Color::linear_rgb(0.45, 0.4, 0.3),
        perceptual_roughness: 0.8,
        ..default()
    });

    let mut spawn = |mesh: &BoundaryMesh, mat: &Handle<StandardMaterial>, visible: bool, name: String| {
        let handle = meshes.add(to_render_mesh(mesh));
        commands.spawn((
            RoomMeshTag,
            Transform::default(),
            if visible {
                Visibility::Visible
            } else {
                Visibility::Hidden
            },
            Mesh3d(handle),
            MeshMaterial3d(mat.clone()),
            Name::new(name),
        ));
    };

    spawn(room.0.floor(), &floor_mat, settings.show_floor, "FloorMesh".into());
    for (i, wall) in room.0.walls().iter().enumerate() {
        spawn(wall, &wall_mat, settings.show_walls, format!("WallMesh {i}"));
    }
    for (i, object) in room.0.objects().iter().enumerate() {
        spawn(object, &object_mat, settings.show_objects, format!("ObjectMesh {i}"));
    }
    if let Some(ceiling) = room.0.ceiling() {
        spawn(ceiling, &wall_mat, false, "CeilingMesh".into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::room::boundary::{build_boundary_mesh, NormalHint};
    use crate::room::scan::SurfaceBoundary;

    #[test]
    fn render_mesh_mirrors_collision_mesh() {
        let boundary = SurfaceBoundary {
            points: vec![
                Vec2::new(0.0, 0.0),
                Vec2::new(2.0, 0.0),
                Vec2::new(2.0, 2.0),
                Vec2::new(0.0, 2.0),
                Vec2::new(-0.5, 1.0),
            ],
            frame: Transform::IDENTITY,
        };
        let mesh = build_boundary_mesh(&boundary, NormalHint::Up).unwrap();
        let render = to_render_mesh(&mesh);

        let positions = render
            .attribute(Mesh::ATTRIBUTE_POSITION)
            .and_then(|a| a.as_float3())
            .expect("positions present");
        assert_eq!(positions.len(), 5);
        match render.indices() {
            Some(Indices::U32(idx)) => assert_eq!(idx.len(), (5 - 2) * 3),
            other => panic!("unexpected indices {other:?}"),
        }
    }
}
