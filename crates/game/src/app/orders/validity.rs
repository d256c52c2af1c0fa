use engine::{FortressId, WorldView};
use thiserror::Error;

/// What a valid order does to the source's outgoing paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderKind {
    OpenPath,
    HaltPath,
}

impl OrderKind {
    pub fn as_token(self) -> &'static str {
        match self {
            Self::OpenPath => "open",
            Self::HaltPath => "halt",
        }
    }
}

/// Why an order was refused locally. The message is shown to the player as-is.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidOrder {
    #[error("Pick a different target!")]
    SameFortress { id: FortressId },
    #[error("Fortress #{id} does not exist!")]
    UnknownSource { id: FortressId },
    #[error("You do not control fortress #{id}!")]
    NotOwned { id: FortressId },
    #[error("Not connected directly!")]
    NotConnected {
        source_id: FortressId,
        target_id: FortressId,
    },
    #[error("Too many paths! Tier {tier} allows {tier} at once.")]
    TierCapacity { source_id: FortressId, tier: u32 },
}

/// Shared validity rule for click and drag orders.
///
/// The tier cap only applies when the order would open a new path; toggling an
/// existing path off is always allowed. The server re-checks everything.
pub fn validate_order(
    source: FortressId,
    target: FortressId,
    world: &dyn WorldView,
    local_player: &str,
) -> Result<OrderKind, InvalidOrder> {
    if source == target {
        return Err(InvalidOrder::SameFortress { id: source });
    }
    let fortress = world
        .fortress(source)
        .ok_or(InvalidOrder::UnknownSource { id: source })?;
    if !fortress.is_owned_by(local_player) {
        return Err(InvalidOrder::NotOwned { id: source });
    }
    if !world.are_adjacent(source, target) {
        return Err(InvalidOrder::NotConnected {
            source_id: source,
            target_id: target,
        });
    }
    if fortress.has_path_to(target) {
        return Ok(OrderKind::HaltPath);
    }
    if !fortress.has_free_path_slot() {
        return Err(InvalidOrder::TierCapacity {
            source_id: source,
            tier: fortress.tier,
        });
    }
    Ok(OrderKind::OpenPath)
}

pub fn is_valid_order(
    source: FortressId,
    target: FortressId,
    world: &dyn WorldView,
    local_player: &str,
) -> bool {
    validate_order(source, target, world, local_player).is_ok()
}
