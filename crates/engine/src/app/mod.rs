mod channel;
mod input;
mod picking;

pub use channel::{ChannelError, CommandChannel, LineCommandChannel, OrderCommand};
pub use input::{PickTarget, PickTargetError, Vec2, Vec3};
pub use picking::{
    ProjectedFortress, ProjectedPath, ProjectedScenePicker, ScenePicker,
    DEFAULT_FORTRESS_PICK_RADIUS_PX, DEFAULT_PATH_PICK_THRESHOLD_PX,
};
