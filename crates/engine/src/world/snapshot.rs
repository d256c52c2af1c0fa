use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::fortress::{Fortress, FortressId, FortressMap};

const DEFAULT_BUILD_OPTION_KEY: &str = "Default";
const FALLBACK_STRUCTURE: &str = "Keep";

/// Read access to the latest world state.
///
/// Implementors must answer from the newest snapshot on every call; callers do
/// not hold on to returned references across input events.
pub trait WorldView {
    fn fortress(&self, id: FortressId) -> Option<&Fortress>;
    fn neighbors(&self, id: FortressId) -> &[FortressId];

    fn are_adjacent(&self, source: FortressId, target: FortressId) -> bool {
        self.neighbors(source).contains(&target)
    }

    fn valid_structures(&self, _land_type: Option<&str>) -> Vec<String> {
        vec![FALLBACK_STRUCTURE.to_string()]
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AdjacencyGraph {
    neighbors: BTreeMap<FortressId, Vec<FortressId>>,
}

impl AdjacencyGraph {
    pub fn new(neighbors: BTreeMap<FortressId, Vec<FortressId>>) -> Self {
        Self { neighbors }
    }

    /// Builds an undirected graph, keeping first-seen neighbor order.
    pub fn from_edges(edges: &[(FortressId, FortressId)]) -> Self {
        let mut neighbors: BTreeMap<FortressId, Vec<FortressId>> = BTreeMap::new();
        for &(a, b) in edges {
            for (from, to) in [(a, b), (b, a)] {
                let list = neighbors.entry(from).or_default();
                if !list.contains(&to) {
                    list.push(to);
                }
            }
        }
        Self { neighbors }
    }

    pub fn neighbors(&self, id: FortressId) -> &[FortressId] {
        self.neighbors.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains_edge(&self, source: FortressId, target: FortressId) -> bool {
        self.neighbors(source).contains(&target)
    }

    pub fn node_count(&self) -> usize {
        self.neighbors.len()
    }

    fn iter(&self) -> impl Iterator<Item = (&FortressId, &Vec<FortressId>)> {
        self.neighbors.iter()
    }
}

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("failed to read snapshot file {path}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid snapshot json at '{path}': {message}")]
    Json { path: String, message: String },
    #[error("fortress keyed as {key} carries id {id}")]
    KeyMismatch { key: FortressId, id: FortressId },
    #[error("fortress {id} has tier 0")]
    ZeroTier { id: FortressId },
    #[error("fortress {id} has invalid unit count {units}")]
    InvalidUnits { id: FortressId, units: f64 },
    #[error("adjacency of fortress {source_id} names unknown fortress {neighbor}")]
    UnknownNeighbor {
        source_id: FortressId,
        neighbor: FortressId,
    },
}

pub(crate) fn decode_json<T>(raw: &str) -> Result<T, SnapshotError>
where
    T: for<'de> Deserialize<'de>,
{
    let mut deserializer = serde_json::Deserializer::from_str(raw);
    serde_path_to_error::deserialize(&mut deserializer).map_err(|error| SnapshotError::Json {
        path: error.path().to_string(),
        message: error.inner().to_string(),
    })
}

/// Checks a fortress map as it arrives from the server, before it replaces
/// anything the controller reads.
pub fn validate_fortress_map(fortresses: &FortressMap) -> Result<(), SnapshotError> {
    for (key, fortress) in fortresses {
        if *key != fortress.id {
            return Err(SnapshotError::KeyMismatch {
                key: *key,
                id: fortress.id,
            });
        }
        if fortress.tier == 0 {
            return Err(SnapshotError::ZeroTier { id: fortress.id });
        }
        if !fortress.units.is_finite() || fortress.units < 0.0 {
            return Err(SnapshotError::InvalidUnits {
                id: fortress.id,
                units: fortress.units,
            });
        }
    }
    Ok(())
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct WorldSnapshot {
    #[serde(default)]
    fortresses: FortressMap,
    #[serde(default, rename = "adj", alias = "adjacency")]
    adjacency: AdjacencyGraph,
    #[serde(default)]
    vertices: Vec<[f32; 3]>,
    #[serde(default)]
    faces: Vec<[u32; 3]>,
    #[serde(default)]
    face_colors: Vec<u32>,
    #[serde(default)]
    terrain_build_options: BTreeMap<String, Vec<String>>,
}

impl WorldSnapshot {
    pub fn new(fortresses: FortressMap, adjacency: AdjacencyGraph) -> Self {
        Self {
            fortresses,
            adjacency,
            ..Self::default()
        }
    }

    pub fn from_json_str(raw: &str) -> Result<Self, SnapshotError> {
        let snapshot: WorldSnapshot = decode_json(raw)?;
        snapshot.validate()?;
        Ok(snapshot)
    }

    pub fn load_from_path(path: &Path) -> Result<Self, SnapshotError> {
        let raw = fs::read_to_string(path).map_err(|source| SnapshotError::ReadFile {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    pub fn validate(&self) -> Result<(), SnapshotError> {
        validate_fortress_map(&self.fortresses)?;
        // Geometry-only payloads carry adjacency before any fortress exists.
        if self.fortresses.is_empty() {
            return Ok(());
        }
        for (source_id, neighbors) in self.adjacency.iter() {
            for neighbor in neighbors {
                if !self.fortresses.contains_key(neighbor) {
                    return Err(SnapshotError::UnknownNeighbor {
                        source_id: *source_id,
                        neighbor: *neighbor,
                    });
                }
            }
        }
        Ok(())
    }

    pub fn fortresses(&self) -> &FortressMap {
        &self.fortresses
    }

    pub fn adjacency(&self) -> &AdjacencyGraph {
        &self.adjacency
    }

    pub fn vertices(&self) -> &[[f32; 3]] {
        &self.vertices
    }

    pub fn faces(&self) -> &[[u32; 3]] {
        &self.faces
    }

    pub fn face_colors(&self) -> &[u32] {
        &self.face_colors
    }

    /// Swaps in a new fortress map wholesale. Partial patches are not supported.
    pub fn replace_fortresses(&mut self, fortresses: FortressMap) -> Result<(), SnapshotError> {
        validate_fortress_map(&fortresses)?;
        self.fortresses = fortresses;
        Ok(())
    }

    pub fn replace_face_colors(&mut self, colors: Vec<u32>) {
        self.face_colors = colors;
    }

    pub fn fortresses_owned_by<'a>(
        &'a self,
        player: &'a str,
    ) -> impl Iterator<Item = &'a Fortress> + 'a {
        self.fortresses
            .values()
            .filter(move |fortress| fortress.is_owned_by(player))
    }
}

impl WorldView for WorldSnapshot {
    fn fortress(&self, id: FortressId) -> Option<&Fortress> {
        self.fortresses.get(&id)
    }

    fn neighbors(&self, id: FortressId) -> &[FortressId] {
        self.adjacency.neighbors(id)
    }

    fn valid_structures(&self, land_type: Option<&str>) -> Vec<String> {
        land_type
            .and_then(|land| self.terrain_build_options.get(land))
            .or_else(|| self.terrain_build_options.get(DEFAULT_BUILD_OPTION_KEY))
            .cloned()
            .unwrap_or_else(|| vec![FALLBACK_STRUCTURE.to_string()])
    }
}
