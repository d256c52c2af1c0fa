use std::io::{self, Write};
use std::net::TcpStream;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::world::FortressId;

/// Messages the client emits to the game server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum OrderCommand {
    SubmitMove {
        source: FortressId,
        target: FortressId,
    },
    SpecializeFortress {
        id: FortressId,
        #[serde(rename = "type")]
        structure: String,
    },
    RestartGame,
}

impl OrderCommand {
    pub fn name(&self) -> &'static str {
        match self {
            Self::SubmitMove { .. } => "submit_move",
            Self::SpecializeFortress { .. } => "specialize_fortress",
            Self::RestartGame => "restart_game",
        }
    }
}

/// Fire-and-forget sink for server commands. Nothing is acknowledged.
pub trait CommandChannel {
    fn send(&mut self, command: OrderCommand);
}

#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("failed to connect command channel to {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: io::Error,
    },
}

/// Writes one JSON object per line. Write failures are logged and dropped.
#[derive(Debug)]
pub struct LineCommandChannel<W: Write> {
    writer: W,
    sent_count: u64,
    failed_count: u64,
}

impl<W: Write> LineCommandChannel<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            sent_count: 0,
            failed_count: 0,
        }
    }

    pub fn sent_count(&self) -> u64 {
        self.sent_count
    }

    pub fn failed_count(&self) -> u64 {
        self.failed_count
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    fn write_line(&mut self, command: &OrderCommand) -> io::Result<()> {
        let line = serde_json::to_string(command).map_err(io::Error::other)?;
        self.writer.write_all(line.as_bytes())?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()
    }
}

impl LineCommandChannel<TcpStream> {
    pub fn connect(addr: &str) -> Result<Self, ChannelError> {
        let stream = TcpStream::connect(addr).map_err(|source| ChannelError::Connect {
            addr: addr.to_string(),
            source,
        })?;
        if let Err(error) = stream.set_nodelay(true) {
            warn!(error = %error, "command_channel_nodelay_failed");
        }
        Ok(Self::new(stream))
    }
}

impl<W: Write> CommandChannel for LineCommandChannel<W> {
    fn send(&mut self, command: OrderCommand) {
        match self.write_line(&command) {
            Ok(()) => {
                self.sent_count = self.sent_count.saturating_add(1);
                debug!(event = command.name(), "command_sent");
            }
            Err(error) => {
                self.failed_count = self.failed_count.saturating_add(1);
                warn!(event = command.name(), error = %error, "command_send_failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct BrokenWriter;

    impl Write for BrokenWriter {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn commands_serialize_as_event_lines() {
        let mut channel = LineCommandChannel::new(Vec::new());
        channel.send(OrderCommand::SubmitMove {
            source: FortressId(5),
            target: FortressId(9),
        });
        channel.send(OrderCommand::SpecializeFortress {
            id: FortressId(5),
            structure: "Tower".to_string(),
        });
        channel.send(OrderCommand::RestartGame);

        assert_eq!(channel.sent_count(), 3);
        let output = String::from_utf8(channel.into_inner()).expect("utf8");
        let lines = output.lines().collect::<Vec<_>>();
        assert_eq!(
            lines,
            vec![
                r#"{"event":"submit_move","data":{"source":5,"target":9}}"#,
                r#"{"event":"specialize_fortress","data":{"id":5,"type":"Tower"}}"#,
                r#"{"event":"restart_game"}"#,
            ]
        );
    }

    #[test]
    fn write_failures_are_counted_not_raised() {
        let mut channel = LineCommandChannel::new(BrokenWriter);
        channel.send(OrderCommand::RestartGame);
        assert_eq!(channel.sent_count(), 0);
        assert_eq!(channel.failed_count(), 1);
    }
}
