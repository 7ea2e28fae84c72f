// src/placement/mod.rs
//! Pose search strategies and their wiring.

pub mod catalog;
pub mod core;
pub mod facing;
pub mod gaze;
pub mod grid;
pub mod overlap;
pub mod plugin;
pub mod sampling;

use std::sync::Arc;

use crate::room::query::{GeometrySampler, RoomQuery, SceneOverlapQuery};
use crate::room::registry::RoomGeometry;

use self::catalog::SearchStrategyDef;
use self::core::PoseSearch;
use self::grid::GridScanSearch;
use self::overlap::{OrientedBoxOverlap, VertexContainment};
use self::sampling::SurfaceSamplingSearch;

/// Factory: build a boxed search from a catalog `SearchStrategyDef`, wired
/// to the shipped capability implementations. Grid scans pair with the
/// cheap vertex-containment test, sampling searches with the oriented-box
/// scene query.
pub fn make_search(
    def: &SearchStrategyDef,
    room: Arc<RoomGeometry>,
    seed: u64,
) -> Box<dyn PoseSearch> {
    match def {
        SearchStrategyDef::Grid { spacing } => {
            Box::new(GridScanSearch::new(*spacing, Arc::new(VertexContainment)))
        }
        SearchStrategyDef::Sampling {
            constraint,
            override_radius,
        } => {
            let tester = Arc::new(OrientedBoxOverlap::new(Arc::new(SceneOverlapQuery::new(
                room.clone(),
            ))));
            let probe = Arc::new(RoomQuery::new(room.clone()));
            let sampler = Arc::new(GeometrySampler::new(room, seed));
            let mut search = SurfaceSamplingSearch::new(*constraint, tester, probe, sampler);
            if let Some(radius) = override_radius {
                search = search.with_override_radius(*radius);
            }
            Box::new(search)
        }
    }
}
