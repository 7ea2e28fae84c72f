// src/room/loader.rs
//! Loads `.room.ron` scan captures off the main thread.
//!
//! The live scanning subsystem is an external collaborator; this replays one
//! of its captures so the rest of the pipeline behaves exactly as it would
//! on a scan-completed callback.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use bevy::prelude::*;
use bevy::tasks::{AsyncComputeTaskPool, Task};
use futures_lite::future;
use thiserror::Error;

use super::plugin::{ActiveScan, RoomScanSettings, RoomScanned};
use super::scan::RawRoomScan;

#[derive(Debug, Error)]
pub enum ScanLoadError {
    #[error("I/O while reading scan '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("RON parse error in scan '{path}': {message}")]
    Ron { path: PathBuf, message: String },
}

/// Parse one scan capture from disk.
pub fn load_scan_file(path: &Path) -> Result<RawRoomScan, ScanLoadError> {
    let bytes = std::fs::read(path).map_err(|source| ScanLoadError::Io {
        path: path.to_owned(),
        source,
    })?;
    ron::de::from_bytes(&bytes).map_err(|e| ScanLoadError::Ron {
        path: path.to_owned(),
        message: e.to_string(),
    })
}

// ---------- Resource to track async work ----------

#[derive(Resource, Default)]
pub struct ScanLoadTask(pub Option<Task<Result<RawRoomScan, ScanLoadError>>>);

// ---------- Systems ----------

/// (Startup) Kick off the background parse of the configured capture.
pub fn begin_scan_load(settings: Res<RoomScanSettings>, mut task: ResMut<ScanLoadTask>) {
    let path = PathBuf::from(settings.scan_path.clone());
    info!("loading room scan from '{}'", path.display());
    task.0 = Some(AsyncComputeTaskPool::get().spawn(async move { load_scan_file(&path) }));
}

/// (Update) Collect the finished parse, publish the scan, fire `RoomScanned`.
pub fn poll_scan_load(
    mut commands: Commands,
    mut task: ResMut<ScanLoadTask>,
    mut scanned: EventWriter<RoomScanned>,
) {
    let Some(pending) = task.0.as_mut() else {
        return;
    };
    if !pending.is_finished() {
        return;
    }
    let Some(result) = future::block_on(future::poll_once(pending)) else {
        return;
    };
    task.0 = None;

    match result {
        Ok(scan) => {
            info!("scan '{}' ready: {} anchors", scan.name, scan.anchors.len());
            commands.insert_resource(ActiveScan(Arc::new(scan)));
            scanned.write(RoomScanned);
        }
        Err(e) => error!("room scan load failed: {e}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scan_document_parses() {
        let doc = r#"(
            name: "unit",
            anchors: [
                (
                    name: "floor",
                    frame: (
                        translation: (0.0, 0.0, 0.0),
                        rotation: (-0.70710678, 0.0, 0.0, 0.70710678),
                        scale: (1.0, 1.0, 1.0),
                    ),
                    labels: (1),
                    boundary: Some([(0.0, 0.0), (4.0, 0.0), (4.0, -4.0), (0.0, -4.0)]),
                ),
            ],
            floor: Some(0),
        )"#;
        let scan: RawRoomScan = ron::de::from_str(doc).unwrap();
        assert_eq!(scan.name, "unit");
        assert!(scan.floor_anchor().is_some());
        assert_eq!(scan.walls.len(), 0);
        // defaulted fields
        assert!(scan.anchors[0].solid);
        assert!(scan.anchors[0].volume.is_none());
    }

    #[test]
    fn missing_file_reports_io_error() {
        let result = load_scan_file(Path::new("/definitely/not/here.room.ron"));
        assert!(matches!(result, Err(ScanLoadError::Io { .. })));
    }
}
