use engine::{CommandChannel, Fortress, FortressId, OrderCommand, PickTarget, Vec3, WorldView};
use tracing::{debug, info};

mod drag;
mod selection;
mod specialize;
mod validity;

pub(crate) use drag::{DragOutcome, DragSession};
pub(crate) use selection::{ConfirmOutcome, SelectionOutcome};
pub(crate) use specialize::InvalidSpecialization;
pub(crate) use validity::{is_valid_order, validate_order, InvalidOrder, OrderKind};

/// UI collaborator the controller reports to. Every hook defaults to a no-op
/// so front-ends only implement what they draw.
pub(crate) trait SelectionView {
    fn highlight_source(&mut self, _id: FortressId, _active: bool) {}
    fn show_fortress_info(&mut self, _fortress: &Fortress) {}
    fn show_path_info(&mut self, _source: FortressId, _target: FortressId) {}
    fn show_face_info(&mut self, _face: u32) {}
    fn show_confirm(&mut self, _source: FortressId, _target: FortressId, _kind: OrderKind) {}
    fn show_status(&mut self, _message: &str) {}
    fn show_hover(&mut self, _target: PickTarget) {}
    fn hide_info(&mut self) {}
    fn clear_highlights(&mut self) {}
    fn set_camera_controls_enabled(&mut self, _enabled: bool) {}
    fn show_drag_indicator(
        &mut self,
        _source: FortressId,
        _pointer_world: Option<Vec3>,
        _valid: bool,
    ) {
    }
    fn clear_drag_indicator(&mut self) {}
    fn focus_camera(&mut self, _position: Vec3) {}
}

/// What happens to the selection after a confirmed order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) enum ConfirmPolicy {
    #[default]
    ResetToIdle,
    /// Keep source and target highlighted. Another confirm needs the target
    /// to be clicked again.
    KeepTarget,
}

impl ConfirmPolicy {
    pub(crate) fn as_token(self) -> &'static str {
        match self {
            Self::ResetToIdle => "reset",
            Self::KeepTarget => "keep",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) enum SelectionState {
    #[default]
    Idle,
    SourceSelected {
        source: FortressId,
    },
    TargetSelected {
        source: FortressId,
        target: FortressId,
    },
}

impl SelectionState {
    pub(crate) fn source(self) -> Option<FortressId> {
        match self {
            Self::Idle => None,
            Self::SourceSelected { source } | Self::TargetSelected { source, .. } => Some(source),
        }
    }
}

/// Collaborators for one input event. The world view is re-read on every
/// call and never cached by the controller.
pub(crate) struct OrderContext<'a> {
    pub(crate) world: &'a dyn WorldView,
    pub(crate) channel: &'a mut dyn CommandChannel,
    pub(crate) view: &'a mut dyn SelectionView,
}

/// Turns clicks and drags into validated move orders for one local player.
#[derive(Debug)]
pub(crate) struct OrderController {
    local_player: String,
    confirm_policy: ConfirmPolicy,
    selection: SelectionState,
    confirm_armed: bool,
    drag: Option<DragSession>,
    submitted_count: u64,
}

impl OrderController {
    pub(crate) fn new(local_player: impl Into<String>, confirm_policy: ConfirmPolicy) -> Self {
        Self {
            local_player: local_player.into(),
            confirm_policy,
            selection: SelectionState::Idle,
            confirm_armed: false,
            drag: None,
            submitted_count: 0,
        }
    }

    pub(crate) fn local_player(&self) -> &str {
        &self.local_player
    }

    pub(crate) fn selection(&self) -> SelectionState {
        self.selection
    }

    pub(crate) fn drag_session(&self) -> Option<&DragSession> {
        self.drag.as_ref()
    }

    pub(crate) fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    pub(crate) fn submitted_count(&self) -> u64 {
        self.submitted_count
    }

    pub(crate) fn request_restart(&mut self, ctx: &mut OrderContext<'_>) {
        if self.drag.take().is_some() {
            ctx.view.clear_drag_indicator();
            ctx.view.set_camera_controls_enabled(true);
        }
        self.deselect(ctx.view);
        ctx.channel.send(OrderCommand::RestartGame);
        info!(player = %self.local_player, "restart_requested");
    }

    /// Call after every snapshot replacement. Drops a selection or drag whose
    /// source changed hands; returns true when that happened.
    pub(crate) fn reconcile(&mut self, ctx: &mut OrderContext<'_>) -> bool {
        let mut lost = None;
        if let Some(session) = self.drag {
            if !self.owns(ctx.world, session.source) {
                self.drag = None;
                ctx.view.clear_drag_indicator();
                ctx.view.set_camera_controls_enabled(true);
                info!(source = %session.source, "drag_source_lost");
                lost = Some(session.source);
            }
        }
        if let Some(source) = self.selection.source() {
            if !self.owns(ctx.world, source) {
                self.deselect(ctx.view);
                info!(source = %source, "selection_source_lost");
                lost = Some(source);
            }
        }

        let Some(source) = lost else {
            return false;
        };
        ctx.view
            .show_status(&format!("Lost control of fortress #{source}!"));
        true
    }

    fn owns(&self, world: &dyn WorldView, id: FortressId) -> bool {
        world
            .fortress(id)
            .is_some_and(|fortress| fortress.is_owned_by(&self.local_player))
    }

    fn submit_move(
        &mut self,
        source: FortressId,
        target: FortressId,
        kind: OrderKind,
        channel: &mut dyn CommandChannel,
    ) {
        channel.send(OrderCommand::SubmitMove { source, target });
        self.submitted_count = self.submitted_count.saturating_add(1);
        info!(
            source = %source,
            target = %target,
            kind = kind.as_token(),
            "order_submitted"
        );
    }

    fn reject(&self, reason: &InvalidOrder, view: &mut dyn SelectionView) {
        view.show_status(&reason.to_string());
        debug!(reason = ?reason, "order_rejected");
    }

    fn select_source(&mut self, id: FortressId, view: &mut dyn SelectionView) {
        if let Some(previous) = self.selection.source() {
            view.highlight_source(previous, false);
        }
        self.selection = SelectionState::SourceSelected { source: id };
        self.confirm_armed = false;
        view.highlight_source(id, true);
    }

    fn deselect(&mut self, view: &mut dyn SelectionView) {
        if let Some(source) = self.selection.source() {
            view.highlight_source(source, false);
        }
        self.selection = SelectionState::Idle;
        self.confirm_armed = false;
        view.clear_highlights();
        view.hide_info();
    }
}
