//! Core of ptydeck: the PTY session registry and everything it stands on.
//!
//! - [`shell`] and [`env`] decide what to launch and with which environment.
//! - [`process`] abstracts the pseudo-terminal backend.
//! - [`registry`] owns live sessions and relays their output in batches.
//! - [`transport`] defines the command/event messages and their framing.

pub mod coalesce;
pub mod env;
pub mod error;
pub mod platform;
pub mod process;
pub mod registry;
pub mod shell;
pub mod transport;
pub mod utf8;

pub use coalesce::OutputCoalescer;
pub use error::ProcessError;
pub use platform::HostPlatform;
pub use process::{
    ExitReason, MemoryHandle, MemorySpawner, NativePtySpawner, ProcessEvent, PtyProcess, PtySize,
    PtySpawner, SpawnRequest, SpawnedProcess,
};
pub use registry::{Outcome, SPAWN_FAILURE_NOTICE, SessionInfo, SessionRegistry};
pub use shell::{ShellKind, ShellProbe, SystemProbe};
pub use transport::{TerminalCommand, TerminalEvent};
pub use utf8::Utf8Decoder;
