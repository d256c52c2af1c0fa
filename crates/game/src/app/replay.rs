use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use engine::{
    CommandChannel, Fortress, FortressId, PickTarget, PickTargetError, ScenePicker, ServerEvent,
    SnapshotError, SnapshotStore, StoreUpdate, Vec2, Vec3,
};
use thiserror::Error;
use tracing::{debug, info};

use super::orders::{OrderContext, OrderController, OrderKind, SelectionView};

/// One line of a replay script.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum ReplayStep {
    Click(PickTarget),
    PointerDown(PickTarget),
    PointerMove(PickTarget),
    PointerUp(PickTarget),
    CancelDrag,
    Confirm,
    Specialize { id: FortressId, structure: String },
    Restart,
    Push(PathBuf),
}

#[derive(Debug, Error)]
pub(crate) enum ReplayError {
    #[error("failed to read {path}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("script line {line}: {message}")]
    Parse { line: usize, message: String },
    #[error("script line {line}: {source}")]
    Target {
        line: usize,
        #[source]
        source: PickTargetError,
    },
    #[error("script line {line}: failed to read {path}: {source}")]
    ReadEvent {
        line: usize,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("script line {line}: push event rejected: {source}")]
    Push {
        line: usize,
        #[source]
        source: SnapshotError,
    },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct ReplaySummary {
    pub(crate) steps: usize,
    pub(crate) orders_submitted: u64,
    pub(crate) snapshot_revision: u64,
}

pub(crate) fn load_script(path: &Path) -> Result<Vec<(usize, ReplayStep)>, ReplayError> {
    let content = fs::read_to_string(path).map_err(|source| ReplayError::ReadFile {
        path: path.to_path_buf(),
        source,
    })?;
    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
    parse_script(&content, base_dir)
}

/// Blank lines and `#` comments are skipped. Line numbers are 1-based.
pub(crate) fn parse_script(
    content: &str,
    base_dir: &Path,
) -> Result<Vec<(usize, ReplayStep)>, ReplayError> {
    let mut steps = Vec::new();
    for (index, raw) in content.lines().enumerate() {
        let line = index + 1;
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let (verb, rest) = trimmed
            .split_once(char::is_whitespace)
            .map(|(verb, rest)| (verb, rest.trim()))
            .unwrap_or((trimmed, ""));
        let target = |rest: &str| {
            rest.parse::<PickTarget>()
                .map_err(|source| ReplayError::Target { line, source })
        };
        let no_args = |step: ReplayStep| {
            if rest.is_empty() {
                Ok(step)
            } else {
                Err(ReplayError::Parse {
                    line,
                    message: format!("'{verb}' takes no arguments"),
                })
            }
        };

        let step = match verb {
            "click" => ReplayStep::Click(target(rest)?),
            "down" => ReplayStep::PointerDown(target(rest)?),
            "move" => ReplayStep::PointerMove(target(rest)?),
            "up" => ReplayStep::PointerUp(target(rest)?),
            "cancel" => no_args(ReplayStep::CancelDrag)?,
            "confirm" => no_args(ReplayStep::Confirm)?,
            "restart" => no_args(ReplayStep::Restart)?,
            "specialize" => {
                let (id, structure) = rest.split_once(char::is_whitespace).ok_or_else(|| {
                    ReplayError::Parse {
                        line,
                        message: "usage: specialize <fortress-id> <structure>".to_string(),
                    }
                })?;
                let id = id.parse::<FortressId>().map_err(|error| ReplayError::Parse {
                    line,
                    message: error.to_string(),
                })?;
                ReplayStep::Specialize {
                    id,
                    structure: structure.trim().to_string(),
                }
            }
            "push" => {
                if rest.is_empty() {
                    return Err(ReplayError::Parse {
                        line,
                        message: "usage: push <event-file>".to_string(),
                    });
                }
                ReplayStep::Push(base_dir.join(rest))
            }
            other => {
                return Err(ReplayError::Parse {
                    line,
                    message: format!("unknown command '{other}'"),
                })
            }
        };
        steps.push((line, step));
    }
    Ok(steps)
}

/// Reports whatever is scripted as being under the pointer.
#[derive(Debug, Default)]
struct ScriptPicker {
    target: PickTarget,
}

impl ScenePicker for ScriptPicker {
    fn pick(&self, _pointer_px: Vec2) -> PickTarget {
        self.target
    }
}

/// Headless view: everything the controller would draw goes to the log.
#[derive(Debug, Default)]
pub(crate) struct LogView;

impl SelectionView for LogView {
    fn highlight_source(&mut self, id: FortressId, active: bool) {
        debug!(fortress = %id, active, "highlight_source");
    }

    fn show_fortress_info(&mut self, fortress: &Fortress) {
        info!(
            fortress = %fortress.id,
            owner = fortress.owner_label(),
            units = fortress.units.floor(),
            tier = fortress.tier,
            "fortress_info"
        );
    }

    fn show_path_info(&mut self, source: FortressId, target: FortressId) {
        info!(source = %source, target = %target, "path_info");
    }

    fn show_face_info(&mut self, face: u32) {
        info!(face, "sector_info");
    }

    fn show_confirm(&mut self, source: FortressId, target: FortressId, kind: OrderKind) {
        info!(source = %source, target = %target, kind = kind.as_token(), "confirm_ready");
    }

    fn show_status(&mut self, message: &str) {
        info!(message, "status");
    }

    fn show_hover(&mut self, target: PickTarget) {
        debug!(kind = target.kind_label(), ?target, "hover");
    }

    fn set_camera_controls_enabled(&mut self, enabled: bool) {
        debug!(enabled, "camera_controls");
    }

    fn show_drag_indicator(&mut self, source: FortressId, pointer_world: Option<Vec3>, valid: bool) {
        debug!(source = %source, ?pointer_world, valid, "drag_indicator");
    }

    fn focus_camera(&mut self, position: Vec3) {
        info!(x = position.x, y = position.y, z = position.z, "camera_focus");
    }
}

pub(crate) fn run_script(
    steps: &[(usize, ReplayStep)],
    store: &mut SnapshotStore,
    controller: &mut OrderController,
    channel: &mut dyn CommandChannel,
    view: &mut dyn SelectionView,
) -> Result<ReplaySummary, ReplayError> {
    let mut picker = ScriptPicker::default();
    let pointer = Vec2::default();

    for (line, step) in steps {
        debug!(line, step = ?step, "replay_step");
        if let ReplayStep::Push(path) = step {
            let raw = fs::read_to_string(path).map_err(|source| ReplayError::ReadEvent {
                line: *line,
                path: path.clone(),
                source,
            })?;
            let update = ServerEvent::from_json_str(&raw)
                .and_then(|event| store.apply_event(event))
                .map_err(|source| ReplayError::Push {
                    line: *line,
                    source,
                })?;
            match update {
                StoreUpdate::FortressesReplaced => {
                    let mut ctx = OrderContext {
                        world: &*store,
                        channel: &mut *channel,
                        view: &mut *view,
                    };
                    controller.reconcile(&mut ctx);
                }
                StoreUpdate::FaceColorsReplaced => {}
                StoreUpdate::FocusCamera(position) => view.focus_camera(position),
            }
            continue;
        }

        let mut ctx = OrderContext {
            world: &*store,
            channel: &mut *channel,
            view: &mut *view,
        };
        match step {
            ReplayStep::Click(target) => {
                picker.target = *target;
                controller.on_click(pointer, &picker, &mut ctx);
            }
            ReplayStep::PointerDown(target) => {
                picker.target = *target;
                controller.on_pointer_down(pointer, &picker, &mut ctx);
            }
            ReplayStep::PointerMove(target) => {
                picker.target = *target;
                controller.on_pointer_move(pointer, &picker, &mut ctx);
                if let Some(session) = controller.drag_session() {
                    debug!(
                        source = %session.source,
                        candidate = ?session.candidate,
                        valid = session.candidate_valid,
                        "drag_candidate"
                    );
                }
            }
            ReplayStep::PointerUp(target) => {
                picker.target = *target;
                controller.on_pointer_up(pointer, &picker, &mut ctx);
            }
            ReplayStep::CancelDrag => {
                controller.cancel_drag(&mut ctx);
            }
            ReplayStep::Confirm => {
                controller.confirm(&mut ctx);
            }
            ReplayStep::Specialize { id, structure } => {
                if let Err(reason) = controller.request_specialization(*id, structure, &mut ctx) {
                    debug!(fortress = %id, reason = %reason, "specialization_refused");
                }
            }
            ReplayStep::Restart => controller.request_restart(&mut ctx),
            ReplayStep::Push(_) => {}
        }
    }

    let summary = ReplaySummary {
        steps: steps.len(),
        orders_submitted: controller.submitted_count(),
        snapshot_revision: store.revision(),
    };
    info!(
        player = controller.local_player(),
        steps = summary.steps,
        orders_submitted = summary.orders_submitted,
        snapshot_revision = summary.snapshot_revision,
        "replay_finished"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::orders::{ConfirmPolicy, SelectionState};
    use engine::{LineCommandChannel, WorldSnapshot};
    use serde_json::json;
    use std::io::Write;

    fn snapshot() -> WorldSnapshot {
        let value = json!({
            "fortresses": {
                "5": { "id": 5, "owner": "Alice", "units": 20.0, "tier": 2 },
                "9": { "id": 9, "units": 10.0 },
                "42": { "id": 42, "units": 10.0 }
            },
            "adj": { "5": [9], "9": [5, 42], "42": [9] }
        });
        WorldSnapshot::from_json_str(&value.to_string()).expect("snapshot")
    }

    fn run(
        script: &str,
        base_dir: &Path,
    ) -> (ReplaySummary, OrderController, Vec<String>) {
        let steps = parse_script(script, base_dir).expect("script");
        let mut store = SnapshotStore::new(snapshot());
        let mut controller = OrderController::new("Alice", ConfirmPolicy::ResetToIdle);
        let mut channel = LineCommandChannel::new(Vec::new());
        let summary = run_script(
            &steps,
            &mut store,
            &mut controller,
            &mut channel,
            &mut LogView,
        )
        .expect("replay");
        let output = String::from_utf8(channel.into_inner()).expect("utf8");
        let lines = output.lines().map(ToString::to_string).collect();
        (summary, controller, lines)
    }

    #[test]
    fn parses_commands_and_skips_comments() {
        let script = "\n# select and attack\nclick fortress:5\nclick fortress:9\nconfirm\n  \ndown fortress:5\nmove path_5_9\nup none\nspecialize 5 Grain Farm\nrestart\npush update.json\n";
        let steps = parse_script(script, Path::new("/tmp/replays")).expect("script");

        assert_eq!(steps.len(), 9);
        assert_eq!(steps[0], (3, ReplayStep::Click(PickTarget::Fortress(FortressId(5)))));
        assert_eq!(steps[2], (5, ReplayStep::Confirm));
        assert_eq!(
            steps[4].1,
            ReplayStep::PointerMove(PickTarget::Path {
                source: FortressId(5),
                target: FortressId(9),
            })
        );
        assert_eq!(
            steps[6].1,
            ReplayStep::Specialize {
                id: FortressId(5),
                structure: "Grain Farm".to_string(),
            }
        );
        assert_eq!(
            steps[8].1,
            ReplayStep::Push(PathBuf::from("/tmp/replays/update.json"))
        );
    }

    #[test]
    fn parse_errors_name_the_line() {
        let error = parse_script("click fortress:5\nfly fortress:9\n", Path::new("."))
            .expect_err("unknown verb");
        assert_eq!(error.to_string(), "script line 2: unknown command 'fly'");

        let error = parse_script("confirm now\n", Path::new(".")).expect_err("extra args");
        assert!(matches!(error, ReplayError::Parse { line: 1, .. }));

        let error = parse_script("click fortress:x\n", Path::new(".")).expect_err("bad id");
        assert!(matches!(error, ReplayError::Target { line: 1, .. }));

        let error = parse_script("specialize 5\n", Path::new(".")).expect_err("usage");
        assert!(matches!(error, ReplayError::Parse { line: 1, .. }));
    }

    #[test]
    fn click_flow_emits_one_move_line() {
        let (summary, controller, lines) = run(
            "click fortress:5\nclick fortress:42\nclick fortress:9\nconfirm\nconfirm\n",
            Path::new("."),
        );

        assert_eq!(
            lines,
            vec![r#"{"event":"submit_move","data":{"source":5,"target":9}}"#.to_string()]
        );
        assert_eq!(summary.orders_submitted, 1);
        assert_eq!(controller.selection(), SelectionState::Idle);
    }

    #[test]
    fn drag_flow_emits_only_for_valid_release() {
        let (_, controller, lines) = run(
            "down fortress:5\nmove fortress:42\nup none\ndown fortress:5\nmove fortress:9\nup fortress:9\n",
            Path::new("."),
        );

        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains(r#""source":5,"target":9"#));
        assert!(!controller.is_dragging());
    }

    #[test]
    fn push_event_replaces_map_and_reconciles_selection() {
        let dir = tempfile::tempdir().expect("temp dir");
        let mut file = fs::File::create(dir.path().join("capture.json")).expect("event file");
        let event = json!({
            "event": "update_map",
            "data": {
                "5": { "id": 5, "owner": "Bob", "units": 1.0 },
                "9": { "id": 9, "owner": "Bob", "units": 4.0 },
                "42": { "id": 42, "units": 10.0 }
            }
        });
        write!(file, "{event}").expect("write event");

        let (summary, controller, lines) = run(
            "click fortress:5\npush capture.json\nclick fortress:9\nconfirm\n",
            dir.path(),
        );

        assert_eq!(summary.snapshot_revision, 1);
        assert_eq!(controller.selection(), SelectionState::Idle);
        assert!(lines.is_empty());
    }

    #[test]
    fn push_with_bad_event_fails_with_line() {
        let dir = tempfile::tempdir().expect("temp dir");
        fs::write(dir.path().join("bad.json"), r#"{"event":"teleport"}"#).expect("write");
        let steps = parse_script("push bad.json\n", dir.path()).expect("script");
        let mut store = SnapshotStore::new(snapshot());
        let mut controller = OrderController::new("Alice", ConfirmPolicy::ResetToIdle);
        let mut channel = LineCommandChannel::new(Vec::new());

        let error = run_script(
            &steps,
            &mut store,
            &mut controller,
            &mut channel,
            &mut LogView,
        )
        .expect_err("bad event");

        assert!(matches!(error, ReplayError::Push { line: 1, .. }));
    }

    #[derive(Default)]
    struct CameraView {
        focused: Vec<Vec3>,
    }

    impl SelectionView for CameraView {
        fn focus_camera(&mut self, position: Vec3) {
            self.focused.push(position);
        }
    }

    #[test]
    fn pushed_focus_camera_reaches_the_view() {
        let dir = tempfile::tempdir().expect("temp dir");
        let event = json!({ "event": "focus_camera", "data": { "position": [0.0, 1.0, 0.25] } });
        fs::write(dir.path().join("focus.json"), event.to_string()).expect("write");
        let steps = parse_script("push focus.json\n", dir.path()).expect("script");
        let mut store = SnapshotStore::new(snapshot());
        let mut controller = OrderController::new("Alice", ConfirmPolicy::ResetToIdle);
        let mut channel = LineCommandChannel::new(Vec::new());
        let mut view = CameraView::default();

        let summary = run_script(
            &steps,
            &mut store,
            &mut controller,
            &mut channel,
            &mut view,
        )
        .expect("replay");

        assert_eq!(view.focused, vec![Vec3::new(0.0, 1.0, 0.25)]);
        assert_eq!(summary.snapshot_revision, 0);
    }

    #[test]
    fn missing_push_file_names_the_line() {
        let dir = tempfile::tempdir().expect("temp dir");
        let steps = parse_script("confirm\npush absent.json\n", dir.path()).expect("script");
        let mut store = SnapshotStore::new(snapshot());
        let mut controller = OrderController::new("Alice", ConfirmPolicy::ResetToIdle);
        let mut channel = LineCommandChannel::new(Vec::new());

        let error = run_script(
            &steps,
            &mut store,
            &mut controller,
            &mut channel,
            &mut LogView,
        )
        .expect_err("missing file");

        assert!(matches!(error, ReplayError::ReadEvent { line: 2, .. }));
        assert!(error.to_string().starts_with("script line 2: failed to read"));
    }
}
