//! Messages exchanged between the registry and terminal clients, plus the
//! in-process channel plumbing that carries them.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, trace, warn};

use crate::registry::{Outcome, SessionRegistry};

pub mod codec;

/// Client → registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TerminalCommand {
    Create { id: String },
    Destroy { id: String },
    Input { id: String, data: String },
    Resize { id: String, cols: u16, rows: u16 },
}

impl TerminalCommand {
    pub fn session_id(&self) -> &str {
        match self {
            Self::Create { id }
            | Self::Destroy { id }
            | Self::Input { id, .. }
            | Self::Resize { id, .. } => id,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Create { .. } => "create",
            Self::Destroy { .. } => "destroy",
            Self::Input { .. } => "input",
            Self::Resize { .. } => "resize",
        }
    }
}

/// Registry → client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TerminalEvent {
    Output { id: String, data: String },
}

impl TerminalEvent {
    pub fn output(id: impl Into<String>, data: impl Into<String>) -> Self {
        Self::Output {
            id: id.into(),
            data: data.into(),
        }
    }

    pub fn session_id(&self) -> &str {
        match self {
            Self::Output { id, .. } => id,
        }
    }
}

pub type CommandSender = mpsc::UnboundedSender<TerminalCommand>;
pub type CommandReceiver = mpsc::UnboundedReceiver<TerminalCommand>;
pub type EventSender = mpsc::UnboundedSender<TerminalEvent>;
pub type EventReceiver = mpsc::UnboundedReceiver<TerminalEvent>;

pub fn command_channel() -> (CommandSender, CommandReceiver) {
    mpsc::unbounded_channel()
}

pub fn event_channel() -> (EventSender, EventReceiver) {
    mpsc::unbounded_channel()
}

/// Apply one command to the registry.
pub fn dispatch(registry: &SessionRegistry, command: TerminalCommand) -> Outcome {
    match command {
        TerminalCommand::Create { id } => registry.create(&id),
        TerminalCommand::Destroy { id } => registry.destroy(&id),
        TerminalCommand::Input { id, data } => registry.write_input(&id, &data),
        TerminalCommand::Resize { id, cols, rows } => registry.resize(&id, cols, rows),
    }
}

/// Dispatch commands until every sender is gone, then sweep the remaining
/// sessions. Returns how many sessions the sweep destroyed.
pub async fn serve(registry: SessionRegistry, mut commands: CommandReceiver) -> usize {
    while let Some(command) = commands.recv().await {
        let name = command.name();
        let id = command.session_id().to_owned();
        match dispatch(&registry, command) {
            Outcome::Reported(err) => {
                warn!(target: "ptydeck.transport", command = name, id = %id, error = %err, "command failed");
            }
            Outcome::Absorbed(err) => {
                debug!(target: "ptydeck.transport", command = name, id = %id, error = %err, "ignored failure");
            }
            outcome => {
                trace!(target: "ptydeck.transport", command = name, id = %id, ?outcome, "command handled");
            }
        }
    }
    registry.shutdown()
}
