// src/placement/plugin.rs
//! Placement runtime wiring (glue).
//! - catalog asset/loader
//! - placement request/completion events
//! - synchronous search runs + spawning of accepted poses

use bevy::prelude::*;

use super::catalog::{PlaceableCatalog, PlaceableCatalogAssetPlugin};
use super::core::{PlacementQuery, PlacementResult};
use super::gaze::GazeResolver;
use super::make_search;
use crate::room::plugin::{ActiveRoom, RoomGeometryReady};
use crate::setup::MainCamera;

/// Configure where the catalog manifest lives and the sampling seed.
#[derive(Resource, Clone)]
pub struct PlacementSettings {
    pub catalog_path: String,
    pub sample_seed: u64,
}

impl Default for PlacementSettings {
    fn default() -> Self {
        Self {
            catalog_path: "placeables/catalog.place.ron".to_string(),
            sample_seed: 1337,
        }
    }
}

/// Handle to the loaded PlaceableCatalog asset.
#[derive(Resource, Default)]
pub struct PlaceableCatalogHandle(pub Handle<PlaceableCatalog>);

/// Ask for one placement. Without an explicit target the gaze point of the
/// main camera is used.
#[derive(Event, Clone)]
pub struct PlaceRequest {
    pub placeable: String,
    pub target: Option<Vec3>,
}

/// Outcome report for one request; an empty result is a normal outcome.
#[derive(Event, Clone)]
pub struct PlacementCompleted {
    pub placeable: String,
    pub result: PlacementResult,
}

/// Marks entities spawned from accepted poses.
#[derive(Component)]
pub struct PlacedObject {
    pub name: String,
}

pub struct PlacementPlugin;

impl Plugin for PlacementPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins(PlaceableCatalogAssetPlugin)
            .init_resource::<PlacementSettings>()
            .init_resource::<PlaceableCatalogHandle>()
            .add_event::<PlaceRequest>()
            .add_event::<PlacementCompleted>()
            .add_systems(Startup, load_catalog)
            .add_systems(
                Update,
                (monitor_catalog_ready, queue_demo_requests, handle_place_requests).chain(),
            );
    }
}

/// Startup: request loading the catalog manifest, store handle.
fn load_catalog(
    mut handle_res: ResMut<PlaceableCatalogHandle>,
    settings: Res<PlacementSettings>,
    assets: Res<AssetServer>,
) {
    if handle_res.0.is_strong() {
        return;
    }
    let h: Handle<PlaceableCatalog> = assets.load(settings.catalog_path.as_str());
    handle_res.0 = h;
    info!(
        "placement: loading catalog from '{}', sample_seed={}",
        settings.catalog_path, settings.sample_seed
    );
}

/// Update: log once when the catalog becomes available.
fn monitor_catalog_ready(
    handle_res: Res<PlaceableCatalogHandle>,
    catalogs: Res<Assets<PlaceableCatalog>>,
    mut logged: Local<bool>,
) {
    if *logged {
        return;
    }
    if catalogs.get(&handle_res.0).is_some() {
        *logged = true;
        info!("placement: catalog loaded and ready");
    }
}

/// Menus and input bindings are out of scope; fire a handful of showcase
/// placements once both the geometry and the catalog are ready.
fn queue_demo_requests(
    mut ready: EventReader<RoomGeometryReady>,
    catalogs: Res<Assets<PlaceableCatalog>>,
    handle: Res<PlaceableCatalogHandle>,
    mut requests: EventWriter<PlaceRequest>,
    mut pending: Local<bool>,
) {
    if !ready.is_empty() {
        ready.clear();
        *pending = true;
    }
    if !*pending || catalogs.get(&handle.0).is_none() {
        return;
    }
    *pending = false;

    for name in ["console", "crate", "wall_panel", "drone"] {
        requests.write(PlaceRequest {
            placeable: name.to_string(),
            target: None,
        });
    }
}

fn handle_place_requests(
    mut commands: Commands,
    mut requests: EventReader<PlaceRequest>,
    mut completed: EventWriter<PlacementCompleted>,
    room: Option<Res<ActiveRoom>>,
    catalogs: Res<Assets<PlaceableCatalog>>,
    handle: Res<PlaceableCatalogHandle>,
    settings: Res<PlacementSettings>,
    cam_q: Query<&Transform, With<MainCamera>>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    if requests.is_empty() {
        return;
    }
    // geometry and catalog land via commands/assets; until both exist, leave
    // the requests buffered and pick them up on a later frame
    let Some(room) = room.as_ref() else {
        debug!("placement requests pending: no room geometry yet");
        return;
    };
    let Some(catalog) = catalogs.get(&handle.0) else {
        debug!("placement requests pending: catalog still loading");
        return;
    };

    for request in requests.read() {
        let Some(def) = catalog.get(&request.placeable) else {
            warn!("unknown placeable '{}'", request.placeable);
            completed.write(PlacementCompleted {
                placeable: request.placeable.clone(),
                result: PlacementResult::empty(),
            });
            continue;
        };

        let Ok(cam_tf) = cam_q.single() else {
            continue;
        };
        let target = request
            .target
            .unwrap_or_else(|| GazeResolver::default().resolve(cam_tf, room.0.floor()));

        let query = PlacementQuery {
            bounds: def.bounds(),
            target_point: target,
            face_target: cam_tf.translation,
            clearance: def.clearance,
        };
        let search = make_search(&def.search, room.0.clone(), settings.sample_seed);
        let result = search.find_pose(&room.0, &query);

        match (result.position, result.rotation) {
            (Some(position), Some(rotation)) => {
                info!(
                    "placed '{}' at {position} (distance to target {:.2})",
                    request.placeable, result.distance
                );
                let mesh = meshes.add(Cuboid::from_size(def.bounds().size()));
                let material = materials.add(StandardMaterial {
                    base_color: Color::linear_rgb(def.tint[0], def.tint[1], def.tint[2]),
                    perceptual_roughness: 0.7,
                    ..default()
                });
                commands.spawn((
                    PlacedObject {
                        name: request.placeable.clone(),
                    },
                    Transform {
                        translation: position + rotation * def.bounds().center(),
                        rotation,
                        ..Default::default()
                    },
                    Visibility::Visible,
                    Mesh3d(mesh),
                    MeshMaterial3d(material),
                    Name::new(format!("Placed {}", request.placeable)),
                ));
            }
            _ => {
                warn!("no valid pose found for '{}'", request.placeable);
            }
        }

        completed.write(PlacementCompleted {
            placeable: request.placeable.clone(),
            result,
        });
    }
}
