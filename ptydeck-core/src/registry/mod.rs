//! Session registry: owns every live shell process, keyed by session id.
//!
//! The session map sits behind one mutex that is only held for bookkeeping.
//! Calls into a process (spawn, write, resize, kill) happen after the lock
//! is released, so one unresponsive shell cannot stall the others.
//! Per-session tokio tasks (the output pump, pending flushes and the legacy
//! `cmd.exe` setup) hold a weak reference and re-check the session
//! generation before touching anything, so work left over from a destroyed
//! session never reaches a newer session created under the same id.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use parking_lot::Mutex;
use ptydeck_config::{PtyConfig, PtydeckConfig, ShellConfig};
use tracing::{debug, info, warn};

use crate::coalesce::OutputCoalescer;
use crate::env::build_shell_environment;
use crate::error::ProcessError;
use crate::platform::HostPlatform;
use crate::process::{PtyProcess, PtySize, PtySpawner, SpawnRequest, SpawnedProcess};
use crate::shell::{
    ShellKind, ShellProbe, SystemProbe, launch_args, resolve_shell, resolve_working_dir,
};
use crate::transport::{EventSender, TerminalEvent};

mod output;
mod session;

use session::Session;
pub use session::SessionInfo;

pub const SPAWN_FAILURE_NOTICE: &str = "\r\nError creating terminal session.\r\n";

/// Result of a registry operation. Nothing is raised across the channel;
/// callers may log the outcome and move on.
#[derive(Debug)]
pub enum Outcome {
    Applied,
    /// `create` on an id that already has a live session.
    AlreadyLive,
    /// No session for the id.
    Missing,
    /// A best-effort step failed and was ignored.
    Absorbed(ProcessError),
    /// Spawn failed; the client was told through its output stream.
    Reported(ProcessError),
    /// `create` was overtaken by `destroy` or `shutdown` while the shell was
    /// starting; the new process has been killed.
    Cancelled,
}

impl Outcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied)
    }

    pub fn error(&self) -> Option<&ProcessError> {
        match self {
            Self::Absorbed(err) | Self::Reported(err) => Some(err),
            _ => None,
        }
    }
}

#[derive(Clone)]
pub struct SessionRegistry {
    inner: Arc<RegistryState>,
}

pub(crate) struct RegistryState {
    pty: PtyConfig,
    shell: ShellConfig,
    platform: HostPlatform,
    probe: Arc<dyn ShellProbe>,
    spawner: Arc<dyn PtySpawner>,
    events: EventSender,
    sessions: Mutex<HashMap<String, Session>>,
    /// Ids whose `create` is spawning, mapped to "cancelled".
    /// Lock order: `sessions` before `starting`.
    starting: Mutex<HashMap<String, bool>>,
    next_serial: AtomicU64,
}

pub struct RegistryBuilder {
    pty: PtyConfig,
    shell: ShellConfig,
    platform: HostPlatform,
    probe: Arc<dyn ShellProbe>,
    spawner: Arc<dyn PtySpawner>,
    events: EventSender,
}

impl RegistryBuilder {
    pub fn pty_config(mut self, pty: PtyConfig) -> Self {
        self.pty = pty;
        self
    }

    pub fn shell_config(mut self, shell: ShellConfig) -> Self {
        self.shell = shell;
        self
    }

    pub fn platform(mut self, platform: HostPlatform) -> Self {
        self.platform = platform;
        self
    }

    pub fn probe(mut self, probe: impl ShellProbe + 'static) -> Self {
        self.probe = Arc::new(probe);
        self
    }

    pub fn build(self) -> SessionRegistry {
        SessionRegistry {
            inner: Arc::new(RegistryState {
                pty: self.pty,
                shell: self.shell,
                platform: self.platform,
                probe: self.probe,
                spawner: self.spawner,
                events: self.events,
                sessions: Mutex::new(HashMap::new()),
                starting: Mutex::new(HashMap::new()),
                next_serial: AtomicU64::new(1),
            }),
        }
    }
}

impl SessionRegistry {
    pub fn builder(spawner: impl PtySpawner + 'static, events: EventSender) -> RegistryBuilder {
        RegistryBuilder {
            pty: PtyConfig::default(),
            shell: ShellConfig::default(),
            platform: HostPlatform::current(),
            probe: Arc::new(SystemProbe),
            spawner: Arc::new(spawner),
            events,
        }
    }

    pub fn new(
        config: &PtydeckConfig,
        spawner: impl PtySpawner + 'static,
        events: EventSender,
    ) -> Self {
        Self::builder(spawner, events)
            .pty_config(config.pty.clone())
            .shell_config(config.shell.clone())
            .build()
    }

    /// Start a shell for `id`. Must run inside a tokio runtime: the output
    /// pump and timers are spawned onto it.
    ///
    /// The id is reserved while the shell starts, so a concurrent `create`
    /// for the same id reports `AlreadyLive` and a concurrent `destroy`
    /// cancels the start.
    pub fn create(&self, id: &str) -> Outcome {
        let state = &self.inner;
        {
            let sessions = state.sessions.lock();
            let mut starting = state.starting.lock();
            if sessions.contains_key(id) || starting.contains_key(id) {
                debug!(target: "ptydeck.registry", id, "session already live");
                return Outcome::AlreadyLive;
            }
            starting.insert(id.to_owned(), false);
        }

        let shell = resolve_shell(&state.shell, state.platform, state.probe.as_ref());
        let kind = ShellKind::detect(&shell);
        let working_dir = resolve_working_dir(state.probe.as_ref());
        let size = PtySize::new(state.pty.default_cols, state.pty.default_rows);
        let request = SpawnRequest {
            program: shell.clone(),
            args: launch_args(kind, &state.shell),
            cwd: working_dir.clone(),
            env: build_shell_environment(state.platform, &state.shell),
            size,
        };

        let SpawnedProcess { process, events } = match state.spawner.spawn(request) {
            Ok(spawned) => spawned,
            Err(err) => {
                state.starting.lock().remove(id);
                warn!(
                    target: "ptydeck.registry",
                    id,
                    shell = %shell.display(),
                    error = %err,
                    "failed to create session"
                );
                state.emit(id, SPAWN_FAILURE_NOTICE);
                return Outcome::Reported(err);
            }
        };
        let process: Arc<dyn PtyProcess> = Arc::from(process);

        let serial = state.next_serial.fetch_add(1, Ordering::Relaxed);
        let pid = process.pid();
        let mut sessions = state.sessions.lock();
        let cancelled = state.starting.lock().remove(id).unwrap_or(true);
        if cancelled {
            drop(sessions);
            info!(target: "ptydeck.registry", id, pid = ?pid, "session destroyed while starting");
            if let Err(err) = process.kill() {
                debug!(target: "ptydeck.registry", id, error = %err, "kill failed");
            }
            return Outcome::Cancelled;
        }
        sessions.insert(
            id.to_owned(),
            Session {
                serial,
                shell: shell.clone(),
                working_dir,
                process,
                output: OutputCoalescer::new(),
                size,
                pid,
                started_at: Instant::now(),
            },
        );
        drop(sessions);

        output::spawn_pump(&self.inner, id, serial, events);
        if kind.needs_legacy_init(state.platform) {
            output::spawn_legacy_init(&self.inner, id, serial, state.pty.legacy_init_delay());
        }

        info!(
            target: "ptydeck.registry",
            id,
            shell = %shell.display(),
            pid = ?pid,
            "session created"
        );
        Outcome::Applied
    }

    /// Kill and forget the session. Kill failures are absorbed. A session
    /// that is still starting is cancelled.
    pub fn destroy(&self, id: &str) -> Outcome {
        let mut sessions = self.inner.sessions.lock();
        let Some(mut session) = sessions.remove(id) else {
            return match self.inner.starting.lock().get_mut(id) {
                Some(cancelled) => {
                    *cancelled = true;
                    Outcome::Applied
                }
                None => Outcome::Missing,
            };
        };
        drop(sessions);

        session.output.clear();
        info!(target: "ptydeck.registry", id, "session destroyed");
        match session.process.kill() {
            Ok(()) => Outcome::Applied,
            Err(err) => {
                debug!(target: "ptydeck.registry", id, error = %err, "kill failed");
                Outcome::Absorbed(err)
            }
        }
    }

    /// Forward bytes to the shell verbatim.
    pub fn write_input(&self, id: &str, data: &str) -> Outcome {
        let Some(process) = self.inner.process(id, None) else {
            return Outcome::Missing;
        };
        match process.write(data.as_bytes()) {
            Ok(()) => Outcome::Applied,
            Err(err) => {
                debug!(target: "ptydeck.registry", id, error = %err, "input dropped");
                Outcome::Absorbed(err)
            }
        }
    }

    pub fn resize(&self, id: &str, cols: u16, rows: u16) -> Outcome {
        let Some((process, serial)) = self.inner.sessions.lock().get(id).map(|session| {
            (Arc::clone(&session.process), session.serial)
        }) else {
            return Outcome::Missing;
        };
        let size = PtySize::new(cols, rows);
        match process.resize(size) {
            Ok(()) => {
                if let Some(session) = self
                    .inner
                    .sessions
                    .lock()
                    .get_mut(id)
                    .filter(|session| session.matches(serial))
                {
                    session.size = size;
                }
                Outcome::Applied
            }
            Err(err) => {
                debug!(target: "ptydeck.registry", id, cols, rows, error = %err, "resize failed");
                Outcome::Absorbed(err)
            }
        }
    }

    /// Application-exit sweep: destroy every remaining session and cancel
    /// the ones still starting.
    pub fn shutdown(&self) -> usize {
        let drained: Vec<(String, Session)> = {
            let mut sessions = self.inner.sessions.lock();
            for cancelled in self.inner.starting.lock().values_mut() {
                *cancelled = true;
            }
            sessions.drain().collect()
        };
        let count = drained.len();
        for (id, session) in drained {
            if let Err(err) = session.process.kill() {
                debug!(target: "ptydeck.registry", id = %id, error = %err, "kill failed during shutdown");
            }
        }
        if count > 0 {
            info!(target: "ptydeck.registry", count, "destroyed remaining sessions");
        }
        count
    }

    pub fn session_info(&self, id: &str) -> Option<SessionInfo> {
        self.inner
            .sessions
            .lock()
            .get(id)
            .map(|session| session.info(id))
    }

    pub fn active_session_count(&self) -> usize {
        self.inner.sessions.lock().len()
    }

    /// Live ids in sorted order.
    pub fn session_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.inner.sessions.lock().keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn is_live(&self, id: &str) -> bool {
        self.inner.sessions.lock().contains_key(id)
    }
}

impl RegistryState {
    /// The process of the live session for `id`, optionally only if it is
    /// still generation `serial`. The map lock is released on return.
    fn process(&self, id: &str, serial: Option<u64>) -> Option<Arc<dyn PtyProcess>> {
        self.sessions
            .lock()
            .get(id)
            .filter(|session| serial.is_none_or(|serial| session.matches(serial)))
            .map(|session| Arc::clone(&session.process))
    }

    /// Flushes and exit notices are emitted under the session lock so they
    /// reach the channel in order.
    fn emit(&self, id: &str, data: impl Into<String>) {
        if self.events.send(TerminalEvent::output(id, data)).is_err() {
            debug!(target: "ptydeck.registry", id, "event receiver closed");
        }
    }
}
