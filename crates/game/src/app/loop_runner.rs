use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use engine::{
    ChannelError, CommandChannel, LineCommandChannel, SnapshotError, SnapshotStore, WorldSnapshot,
};
use thiserror::Error;
use tracing::{error, info};

use super::bootstrap::{ClientConfig, ConfigError};
use super::orders::OrderController;
use super::replay::{load_script, run_script, LogView, ReplayError, ReplayStep, ReplaySummary};

/// Everything the command line decided before the client starts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct LaunchOptions {
    pub(crate) snapshot_path: PathBuf,
    pub(crate) script_path: PathBuf,
    pub(crate) player: Option<String>,
    pub(crate) server_addr: Option<String>,
}

#[derive(Debug, Error)]
pub(crate) enum RunError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
    #[error(transparent)]
    Channel(#[from] ChannelError),
    #[error(transparent)]
    Replay(#[from] ReplayError),
}

pub(crate) fn run(options: LaunchOptions) -> ExitCode {
    match run_session(&options) {
        Ok(summary) => {
            info!(
                steps = summary.steps,
                orders_submitted = summary.orders_submitted,
                "session_finished"
            );
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!(error = %err, "session_failed");
            ExitCode::FAILURE
        }
    }
}

fn run_session(options: &LaunchOptions) -> Result<ReplaySummary, RunError> {
    let config = ClientConfig::from_env(options.player.clone())?;
    let snapshot = WorldSnapshot::load_from_path(&options.snapshot_path)?;
    info!(
        player = %config.local_player,
        confirm_policy = config.confirm_policy.as_token(),
        fortresses = snapshot.fortresses().len(),
        faces = snapshot.faces().len(),
        "client_ready"
    );
    let steps = load_script(&options.script_path)?;

    match &options.server_addr {
        Some(addr) => {
            let mut channel = LineCommandChannel::connect(addr)?;
            let summary = replay(&config, snapshot, &steps, &mut channel)?;
            report_channel(channel.sent_count(), channel.failed_count());
            Ok(summary)
        }
        None => {
            let mut channel = LineCommandChannel::new(io::stdout());
            let summary = replay(&config, snapshot, &steps, &mut channel)?;
            report_channel(channel.sent_count(), channel.failed_count());
            Ok(summary)
        }
    }
}

fn replay(
    config: &ClientConfig,
    snapshot: WorldSnapshot,
    steps: &[(usize, ReplayStep)],
    channel: &mut dyn CommandChannel,
) -> Result<ReplaySummary, ReplayError> {
    let mut store = SnapshotStore::new(snapshot);
    let mut controller = OrderController::new(config.local_player.clone(), config.confirm_policy);
    run_script(steps, &mut store, &mut controller, channel, &mut LogView)
}

fn report_channel(sent: u64, failed: u64) {
    if failed > 0 {
        error!(sent, failed, "commands_lost");
    } else {
        info!(sent, "commands_flushed");
    }
}
