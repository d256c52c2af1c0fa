mod fortress;
mod snapshot;
mod store;

pub use fortress::{Fortress, FortressId, FortressIdError, FortressMap};
pub use snapshot::{validate_fortress_map, AdjacencyGraph, SnapshotError, WorldSnapshot, WorldView};
pub use store::{ServerEvent, SnapshotStore, StoreUpdate};
