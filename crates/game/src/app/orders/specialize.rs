use engine::{FortressId, OrderCommand};
use thiserror::Error;
use tracing::info;

use super::{OrderContext, OrderController};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub(crate) enum InvalidSpecialization {
    #[error("Fortress #{id} does not exist!")]
    UnknownFortress { id: FortressId },
    #[error("You do not control fortress #{id}!")]
    NotOwned { id: FortressId },
    #[error("{structure} cannot be built on {land}!")]
    NotAllowed { structure: String, land: String },
    #[error("Fortress #{id} is already a {structure}.")]
    AlreadyBuilt { id: FortressId, structure: String },
}

impl OrderController {
    /// Asks the server to convert an owned fortress into another structure
    /// type allowed by its land.
    pub(crate) fn request_specialization(
        &mut self,
        id: FortressId,
        structure: &str,
        ctx: &mut OrderContext<'_>,
    ) -> Result<(), InvalidSpecialization> {
        let result = check_specialization(id, structure, ctx, &self.local_player);
        match &result {
            Ok(()) => {
                ctx.channel.send(OrderCommand::SpecializeFortress {
                    id,
                    structure: structure.to_string(),
                });
                info!(fortress = %id, structure, "specialization_requested");
            }
            Err(reason) => ctx.view.show_status(&reason.to_string()),
        }
        result
    }
}

fn check_specialization(
    id: FortressId,
    structure: &str,
    ctx: &OrderContext<'_>,
    local_player: &str,
) -> Result<(), InvalidSpecialization> {
    let fortress = ctx
        .world
        .fortress(id)
        .ok_or(InvalidSpecialization::UnknownFortress { id })?;
    if !fortress.is_owned_by(local_player) {
        return Err(InvalidSpecialization::NotOwned { id });
    }
    if fortress.structure.as_deref() == Some(structure) {
        return Err(InvalidSpecialization::AlreadyBuilt {
            id,
            structure: structure.to_string(),
        });
    }
    let land_type = fortress.land_type.as_deref();
    let allowed = ctx.world.valid_structures(land_type);
    if !allowed.iter().any(|option| option == structure) {
        return Err(InvalidSpecialization::NotAllowed {
            structure: structure.to_string(),
            land: land_type.unwrap_or("this land").to_string(),
        });
    }
    Ok(())
}
