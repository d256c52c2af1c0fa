use engine::{FortressId, PickTarget, ScenePicker, Vec2, Vec3};
use tracing::debug;

use super::{is_valid_order, validate_order, OrderContext, OrderController, OrderKind};

/// Live press-drag-release gesture. Exists only between pointer-down on an
/// owned fortress and the matching pointer-up.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct DragSession {
    pub(crate) source: FortressId,
    pub(crate) pointer_world: Option<Vec3>,
    pub(crate) candidate: Option<FortressId>,
    pub(crate) candidate_valid: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DragOutcome {
    Inactive,
    Started(FortressId),
    Updated {
        candidate: Option<FortressId>,
        valid: bool,
    },
    Submitted {
        source: FortressId,
        target: FortressId,
        kind: OrderKind,
    },
    Cancelled,
}

impl OrderController {
    pub(crate) fn on_pointer_down(
        &mut self,
        pointer_px: Vec2,
        picker: &dyn ScenePicker,
        ctx: &mut OrderContext<'_>,
    ) -> DragOutcome {
        if self.drag.is_some() {
            return DragOutcome::Inactive;
        }
        let Some(source) = picker.pick(pointer_px).fortress_id() else {
            return DragOutcome::Inactive;
        };
        let owned = ctx
            .world
            .fortress(source)
            .is_some_and(|fortress| fortress.is_owned_by(&self.local_player));
        if !owned {
            return DragOutcome::Inactive;
        }

        let session = DragSession {
            source,
            pointer_world: picker.world_point(pointer_px),
            candidate: None,
            candidate_valid: false,
        };
        ctx.view.set_camera_controls_enabled(false);
        ctx.view
            .show_drag_indicator(source, session.pointer_world, false);
        self.drag = Some(session);
        debug!(source = %source, "drag_started");
        DragOutcome::Started(source)
    }

    /// Outside a drag this only feeds the hover monitor.
    pub(crate) fn on_pointer_move(
        &mut self,
        pointer_px: Vec2,
        picker: &dyn ScenePicker,
        ctx: &mut OrderContext<'_>,
    ) -> DragOutcome {
        let picked = picker.pick(pointer_px);
        let Some(session) = self.drag.as_mut() else {
            ctx.view.show_hover(picked);
            return DragOutcome::Inactive;
        };

        let candidate = drop_candidate(picked, session.source);
        let valid = candidate.is_some_and(|target| {
            is_valid_order(session.source, target, ctx.world, &self.local_player)
        });
        session.pointer_world = picker.world_point(pointer_px);
        session.candidate = candidate;
        session.candidate_valid = valid;
        ctx.view
            .show_drag_indicator(session.source, session.pointer_world, valid);
        DragOutcome::Updated { candidate, valid }
    }

    /// Ends the gesture. Camera controls come back no matter what was under
    /// the pointer.
    pub(crate) fn on_pointer_up(
        &mut self,
        pointer_px: Vec2,
        picker: &dyn ScenePicker,
        ctx: &mut OrderContext<'_>,
    ) -> DragOutcome {
        let Some(session) = self.drag.take() else {
            return DragOutcome::Inactive;
        };
        ctx.view.clear_drag_indicator();
        ctx.view.set_camera_controls_enabled(true);

        let Some(target) = drop_candidate(picker.pick(pointer_px), session.source) else {
            debug!(source = %session.source, "drag_cancelled");
            return DragOutcome::Cancelled;
        };
        match validate_order(session.source, target, ctx.world, &self.local_player) {
            Ok(kind) => {
                self.submit_move(session.source, target, kind, ctx.channel);
                DragOutcome::Submitted {
                    source: session.source,
                    target,
                    kind,
                }
            }
            Err(reason) => {
                debug!(
                    source = %session.source,
                    target = %target,
                    reason = %reason,
                    "drag_dropped_on_invalid_target"
                );
                DragOutcome::Cancelled
            }
        }
    }

    /// Pointer left the canvas or the window lost focus.
    pub(crate) fn cancel_drag(&mut self, ctx: &mut OrderContext<'_>) -> DragOutcome {
        if self.drag.take().is_none() {
            return DragOutcome::Inactive;
        }
        ctx.view.clear_drag_indicator();
        ctx.view.set_camera_controls_enabled(true);
        DragOutcome::Cancelled
    }
}

fn drop_candidate(picked: PickTarget, source: FortressId) -> Option<FortressId> {
    picked.fortress_id().filter(|id| *id != source)
}
