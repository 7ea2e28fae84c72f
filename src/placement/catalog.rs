// src/placement/catalog.rs
//! Data-driven placeable catalog + loader.

use bevy::asset::{io::Reader, AssetLoader, LoadContext};
use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::core::{BoundingVolume, SpawnConstraint};

// ---------- Public plugin to register asset+loader ----------

pub struct PlaceableCatalogAssetPlugin;

impl Plugin for PlaceableCatalogAssetPlugin {
    fn build(&self, app: &mut App) {
        app.init_asset::<PlaceableCatalog>()
            .register_asset_loader(PlaceableCatalogLoader);
    }
}

// ---------- Search strategy (data form) ----------

#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum SearchStrategyDef {
    Grid {
        #[serde(default = "default_grid_spacing")]
        spacing: f32,
    },
    Sampling {
        #[serde(default)]
        constraint: SpawnConstraint,
        #[serde(default)]
        override_radius: Option<f32>,
    },
}

fn default_grid_spacing() -> f32 {
    0.2
}

// ---------- Placeable definition (data form) ----------

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PlaceableDef {
    /// Unique human-readable name (used for lookup).
    pub name: String,

    /// Local-frame visual bounds; the placement footprint derives from these.
    pub bounds_min: Vec3,
    pub bounds_max: Vec3,

    /// Minimum gap kept above the supporting surface.
    #[serde(default = "default_clearance")]
    pub clearance: f32,

    /// Which pose search places this object and with what knobs.
    pub search: SearchStrategyDef,

    /// Demo render color.
    #[serde(default = "default_tint")]
    pub tint: [f32; 3],
}

fn default_clearance() -> f32 {
    0.1
}

fn default_tint() -> [f32; 3] {
    [0.8, 0.8, 0.8]
}

impl PlaceableDef {
    pub fn bounds(&self) -> BoundingVolume {
        BoundingVolume {
            min: self.bounds_min,
            max: self.bounds_max,
        }
    }
}

// ---------- Runtime catalog asset ----------

#[derive(Asset, TypePath, Clone)]
pub struct PlaceableCatalog {
    pub placeables: Vec<PlaceableDef>,
    /// Name → index for quick lookups.
    pub name_to_index: HashMap<String, u32>,
}

impl PlaceableCatalog {
    pub fn from_defs(defs: Vec<PlaceableDef>) -> Result<Self, CatalogLoadError> {
        let mut name_to_index = HashMap::with_capacity(defs.len());
        for (i, def) in defs.iter().enumerate() {
            if let Some(prev) = name_to_index.insert(def.name.clone(), i as u32) {
                return Err(CatalogLoadError::DuplicateName {
                    name: def.name.clone(),
                    first: prev,
                    second: i as u32,
                });
            }
        }
        Ok(Self {
            placeables: defs,
            name_to_index,
        })
    }

    pub fn get(&self, name: &str) -> Option<&PlaceableDef> {
        self.name_to_index
            .get(name)
            .and_then(|&i| self.placeables.get(i as usize))
    }
}

// ---------- Asset loader for `.place.ron` ----------

#[derive(Default)]
pub struct PlaceableCatalogLoader;

impl AssetLoader for PlaceableCatalogLoader {
    type Asset = PlaceableCatalog;
    type Settings = ();
    type Error = CatalogLoadError;

    fn extensions(&self) -> &[&str] {
        &["place.ron"]
    }

    async fn load(
        &self,
        reader: &mut dyn Reader,
        _settings: &Self::Settings,
        _load_context: &mut LoadContext<'_>,
    ) -> Result<Self::Asset, Self::Error> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes).await?;
        let defs: Vec<PlaceableDef> =
            ron::de::from_bytes(&bytes).map_err(|e| CatalogLoadError::Ron(e.to_string()))?;
        PlaceableCatalog::from_defs(defs)
    }
}

// ---------- Loader errors ----------

#[derive(thiserror::Error, Debug)]
pub enum CatalogLoadError {
    #[error("I/O while reading catalog: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON parse error: {0}")]
    Ron(String),
    #[error("Duplicate placeable name '{name}' (first idx {first}, second idx {second})")]
    DuplicateName {
        name: String,
        first: u32,
        second: u32,
    },
}
