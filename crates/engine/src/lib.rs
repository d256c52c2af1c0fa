pub mod app;
pub mod world;

pub use app::{
    ChannelError, CommandChannel, LineCommandChannel, OrderCommand, PickTarget, PickTargetError,
    ProjectedFortress, ProjectedPath, ProjectedScenePicker, ScenePicker, Vec2, Vec3,
    DEFAULT_FORTRESS_PICK_RADIUS_PX, DEFAULT_PATH_PICK_THRESHOLD_PX,
};
pub use world::{
    validate_fortress_map, AdjacencyGraph, Fortress, FortressId, FortressIdError, FortressMap,
    ServerEvent, SnapshotError, SnapshotStore, StoreUpdate, WorldSnapshot, WorldView,
};
