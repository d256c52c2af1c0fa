use engine::{FortressId, PickTarget, ScenePicker, Vec2};
use tracing::debug;

use super::{
    validate_order, ConfirmPolicy, InvalidOrder, OrderContext, OrderController, OrderKind,
    SelectionState,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum SelectionOutcome {
    /// Nothing known under the pointer; state untouched.
    Ignored,
    InfoShown,
    SourceSelected(FortressId),
    SourceSwitched {
        from: FortressId,
        to: FortressId,
    },
    TargetSelected {
        source: FortressId,
        target: FortressId,
        kind: OrderKind,
    },
    Deselected,
    Cleared,
    Rejected(InvalidOrder),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ConfirmOutcome {
    NothingToConfirm,
    AlreadySubmitted,
    Submitted {
        source: FortressId,
        target: FortressId,
        kind: OrderKind,
    },
    Rejected(InvalidOrder),
}

impl OrderController {
    pub(crate) fn on_click(
        &mut self,
        pointer_px: Vec2,
        picker: &dyn ScenePicker,
        ctx: &mut OrderContext<'_>,
    ) -> SelectionOutcome {
        let target = picker.pick(pointer_px);
        self.handle_pick(target, ctx)
    }

    pub(crate) fn handle_pick(
        &mut self,
        target: PickTarget,
        ctx: &mut OrderContext<'_>,
    ) -> SelectionOutcome {
        match target {
            PickTarget::None => {
                self.deselect(ctx.view);
                SelectionOutcome::Cleared
            }
            PickTarget::Fortress(id) => self.click_fortress(id, ctx),
            PickTarget::Path { source, target } => {
                ctx.view.show_path_info(source, target);
                SelectionOutcome::InfoShown
            }
            PickTarget::Face(face) => {
                ctx.view.show_face_info(face);
                SelectionOutcome::InfoShown
            }
        }
    }

    fn click_fortress(&mut self, id: FortressId, ctx: &mut OrderContext<'_>) -> SelectionOutcome {
        let world = ctx.world;
        let Some(fortress) = world.fortress(id) else {
            debug!(fortress = %id, "click_on_unknown_fortress");
            return SelectionOutcome::Ignored;
        };
        ctx.view.show_fortress_info(fortress);
        let owned = fortress.is_owned_by(&self.local_player);

        let Some(source) = self.selection.source() else {
            if !owned {
                return SelectionOutcome::InfoShown;
            }
            self.select_source(id, ctx.view);
            return SelectionOutcome::SourceSelected(id);
        };

        if id == source {
            self.deselect(ctx.view);
            return SelectionOutcome::Deselected;
        }
        if owned {
            self.select_source(id, ctx.view);
            return SelectionOutcome::SourceSwitched {
                from: source,
                to: id,
            };
        }

        match validate_order(source, id, world, &self.local_player) {
            Ok(kind) => {
                self.selection = SelectionState::TargetSelected { source, target: id };
                self.confirm_armed = true;
                ctx.view.show_confirm(source, id, kind);
                SelectionOutcome::TargetSelected {
                    source,
                    target: id,
                    kind,
                }
            }
            Err(reason) => {
                self.reject(&reason, ctx.view);
                self.selection = SelectionState::SourceSelected { source };
                self.confirm_armed = false;
                SelectionOutcome::Rejected(reason)
            }
        }
    }

    /// Explicit confirm action for a selected source/target pair.
    ///
    /// The pair is validated again against the current snapshot because
    /// ownership or paths may have changed since the target was clicked.
    pub(crate) fn confirm(&mut self, ctx: &mut OrderContext<'_>) -> ConfirmOutcome {
        let SelectionState::TargetSelected { source, target } = self.selection else {
            return ConfirmOutcome::NothingToConfirm;
        };
        if !self.confirm_armed {
            return ConfirmOutcome::AlreadySubmitted;
        }

        match validate_order(source, target, ctx.world, &self.local_player) {
            Ok(kind) => {
                self.submit_move(source, target, kind, ctx.channel);
                self.confirm_armed = false;
                if self.confirm_policy == ConfirmPolicy::ResetToIdle {
                    self.deselect(ctx.view);
                }
                ConfirmOutcome::Submitted {
                    source,
                    target,
                    kind,
                }
            }
            Err(reason) => {
                self.reject(&reason, ctx.view);
                let source_still_owned = ctx
                    .world
                    .fortress(source)
                    .is_some_and(|fortress| fortress.is_owned_by(&self.local_player));
                if source_still_owned {
                    self.selection = SelectionState::SourceSelected { source };
                    self.confirm_armed = false;
                } else {
                    self.deselect(ctx.view);
                }
                ConfirmOutcome::Rejected(reason)
            }
        }
    }
}
