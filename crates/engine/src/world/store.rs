use serde::Deserialize;
use tracing::{debug, info};

use super::fortress::{Fortress, FortressId, FortressMap};
use crate::app::Vec3;
use super::snapshot::{decode_json, SnapshotError, WorldSnapshot, WorldView};

/// Push messages the server sends after the initial snapshot.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ServerEvent {
    UpdateMap(FortressMap),
    UpdateFaceColors(Vec<u32>),
    FocusCamera { position: [f32; 3] },
}

impl ServerEvent {
    pub fn from_json_str(raw: &str) -> Result<Self, SnapshotError> {
        decode_json(raw)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::UpdateMap(_) => "update_map",
            Self::UpdateFaceColors(_) => "update_face_colors",
            Self::FocusCamera { .. } => "focus_camera",
        }
    }
}

/// What a push event changed, for callers that react beyond the store.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StoreUpdate {
    FortressesReplaced,
    FaceColorsReplaced,
    FocusCamera(Vec3),
}

impl StoreUpdate {
    pub fn fortresses_changed(self) -> bool {
        matches!(self, Self::FortressesReplaced)
    }
}

type FortressListener = Box<dyn FnMut(&FortressMap)>;

/// Holds the current snapshot and fans out fortress map replacements.
///
/// Single-threaded: one writer (the event handler) and readers on the same
/// event loop.
pub struct SnapshotStore {
    snapshot: WorldSnapshot,
    revision: u64,
    listeners: Vec<FortressListener>,
}

impl SnapshotStore {
    pub fn new(snapshot: WorldSnapshot) -> Self {
        Self {
            snapshot,
            revision: 0,
            listeners: Vec::new(),
        }
    }

    pub fn snapshot(&self) -> &WorldSnapshot {
        &self.snapshot
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn subscribe<F>(&mut self, listener: F)
    where
        F: FnMut(&FortressMap) + 'static,
    {
        self.listeners.push(Box::new(listener));
    }

    pub fn replace_fortresses(&mut self, fortresses: FortressMap) -> Result<(), SnapshotError> {
        self.snapshot.replace_fortresses(fortresses)?;
        self.revision = self.revision.saturating_add(1);
        info!(
            revision = self.revision,
            fortress_count = self.snapshot.fortresses().len(),
            "snapshot_replaced"
        );
        let fortresses = self.snapshot.fortresses();
        for listener in &mut self.listeners {
            listener(fortresses);
        }
        Ok(())
    }

    /// Applies one push event. Camera focus leaves the snapshot untouched and
    /// is handed back for the view.
    pub fn apply_event(&mut self, event: ServerEvent) -> Result<StoreUpdate, SnapshotError> {
        match event {
            ServerEvent::UpdateMap(fortresses) => {
                self.replace_fortresses(fortresses)?;
                Ok(StoreUpdate::FortressesReplaced)
            }
            ServerEvent::UpdateFaceColors(colors) => {
                debug!(face_count = colors.len(), "face_colors_replaced");
                self.snapshot.replace_face_colors(colors);
                Ok(StoreUpdate::FaceColorsReplaced)
            }
            ServerEvent::FocusCamera { position: [x, y, z] } => {
                Ok(StoreUpdate::FocusCamera(Vec3::new(x, y, z)))
            }
        }
    }
}

impl WorldView for SnapshotStore {
    fn fortress(&self, id: FortressId) -> Option<&Fortress> {
        self.snapshot.fortress(id)
    }

    fn neighbors(&self, id: FortressId) -> &[FortressId] {
        self.snapshot.neighbors(id)
    }

    fn valid_structures(&self, land_type: Option<&str>) -> Vec<String> {
        self.snapshot.valid_structures(land_type)
    }
}
