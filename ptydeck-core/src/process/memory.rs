use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use parking_lot::{Condvar, Mutex};
use tokio::sync::mpsc;

use super::{
    ExitReason, ProcessEvent, PtyProcess, PtySize, PtySpawner, SpawnRequest, SpawnedProcess,
};
use crate::error::ProcessError;

const FIRST_FAKE_PID: u32 = 4000;

/// In-memory backend that records every request and lets callers script
/// output and exits. Used by tests and by hosts embedding the registry
/// without a real PTY.
#[derive(Debug, Clone, Default)]
pub struct MemorySpawner {
    state: Arc<Mutex<SpawnerState>>,
    spawn_gate: Arc<Gate>,
}

#[derive(Debug, Default)]
struct SpawnerState {
    requests: Vec<SpawnRequest>,
    handles: Vec<MemoryHandle>,
    fail_next: Option<String>,
}

impl MemorySpawner {
    pub fn new() -> Self {
        Self::default()
    }

    /// The next spawn fails with `message`; later spawns succeed again.
    pub fn fail_next_spawn(&self, message: impl Into<String>) {
        self.state.lock().fail_next = Some(message.into());
    }

    /// Number of spawn attempts, including failed ones.
    pub fn spawn_count(&self) -> usize {
        self.state.lock().requests.len()
    }

    pub fn requests(&self) -> Vec<SpawnRequest> {
        self.state.lock().requests.clone()
    }

    /// Handles of successfully spawned processes, oldest first.
    pub fn handles(&self) -> Vec<MemoryHandle> {
        self.state.lock().handles.clone()
    }

    pub fn last_handle(&self) -> Option<MemoryHandle> {
        self.state.lock().handles.last().cloned()
    }

    /// Hold every `spawn` call until [`resume_spawns`](Self::resume_spawns),
    /// like an exec that takes a long time.
    pub fn pause_spawns(&self) {
        self.spawn_gate.close();
    }

    pub fn resume_spawns(&self) {
        self.spawn_gate.open();
    }

    /// Spawn calls currently held by [`pause_spawns`](Self::pause_spawns).
    pub fn blocked_spawns(&self) -> usize {
        self.spawn_gate.waiting()
    }
}

impl PtySpawner for MemorySpawner {
    fn spawn(&self, request: SpawnRequest) -> Result<SpawnedProcess, ProcessError> {
        self.spawn_gate.pass(|| false);
        let mut state = self.state.lock();
        let shell = request.program.display().to_string();
        state.requests.push(request.clone());
        if let Some(message) = state.fail_next.take() {
            return Err(ProcessError::spawn(shell, message));
        }

        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let pid = FIRST_FAKE_PID + state.handles.len() as u32;
        let handle = MemoryHandle::new(pid, request.size, events_tx);
        state.handles.push(handle.clone());

        Ok(SpawnedProcess {
            process: Box::new(MemoryProcess { handle }),
            events: events_rx,
        })
    }
}

/// Test-side view of one fake process.
#[derive(Debug, Clone)]
pub struct MemoryHandle {
    inner: Arc<HandleState>,
}

#[derive(Debug)]
struct HandleState {
    pid: u32,
    events: Mutex<Option<mpsc::UnboundedSender<ProcessEvent>>>,
    writes: Mutex<Vec<Vec<u8>>>,
    sizes: Mutex<Vec<PtySize>>,
    kills: AtomicUsize,
    fail_writes: AtomicBool,
    fail_resizes: AtomicBool,
    fail_kills: AtomicBool,
    write_gate: Gate,
}

impl MemoryHandle {
    fn new(pid: u32, size: PtySize, events: mpsc::UnboundedSender<ProcessEvent>) -> Self {
        Self {
            inner: Arc::new(HandleState {
                pid,
                events: Mutex::new(Some(events)),
                writes: Mutex::new(Vec::new()),
                sizes: Mutex::new(vec![size]),
                kills: AtomicUsize::new(0),
                fail_writes: AtomicBool::new(false),
                fail_resizes: AtomicBool::new(false),
                fail_kills: AtomicBool::new(false),
                write_gate: Gate::default(),
            }),
        }
    }

    pub fn pid(&self) -> u32 {
        self.inner.pid
    }

    /// Push output as if the shell had printed it. Returns false once the
    /// process has exited.
    pub fn emit(&self, data: &str) -> bool {
        self.inner
            .events
            .lock()
            .as_ref()
            .is_some_and(|events| events.send(ProcessEvent::Data(data.to_owned())).is_ok())
    }

    /// End the process; the event stream closes after the exit event.
    /// Writes held by [`pause_writes`](Self::pause_writes) fail.
    pub fn exit(&self, reason: ExitReason) -> bool {
        let sent = self
            .inner
            .events
            .lock()
            .take()
            .is_some_and(|events| events.send(ProcessEvent::Exit(reason)).is_ok());
        self.inner.write_gate.wake();
        sent
    }

    pub fn is_running(&self) -> bool {
        self.inner.events.lock().is_some()
    }

    /// Every write, one entry per call.
    pub fn writes(&self) -> Vec<Vec<u8>> {
        self.inner.writes.lock().clone()
    }

    pub fn written_text(&self) -> String {
        self.inner
            .writes
            .lock()
            .iter()
            .map(|chunk| String::from_utf8_lossy(chunk))
            .collect()
    }

    /// Initial geometry followed by every successful resize.
    pub fn sizes(&self) -> Vec<PtySize> {
        self.inner.sizes.lock().clone()
    }

    pub fn kill_count(&self) -> usize {
        self.inner.kills.load(Ordering::SeqCst)
    }

    pub fn fail_writes(&self, fail: bool) {
        self.inner.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn fail_resizes(&self, fail: bool) {
        self.inner.fail_resizes.store(fail, Ordering::SeqCst);
    }

    pub fn fail_kills(&self, fail: bool) {
        self.inner.fail_kills.store(fail, Ordering::SeqCst);
    }

    /// Make writes block, as a shell that stopped reading its input would.
    pub fn pause_writes(&self) {
        self.inner.write_gate.close();
    }

    pub fn resume_writes(&self) {
        self.inner.write_gate.open();
    }

    /// Writes currently held by [`pause_writes`](Self::pause_writes).
    pub fn blocked_writes(&self) -> usize {
        self.inner.write_gate.waiting()
    }
}

/// A barrier that callers wait at while it is closed.
#[derive(Debug, Default)]
struct Gate {
    state: Mutex<GateState>,
    changed: Condvar,
}

#[derive(Debug, Default)]
struct GateState {
    closed: bool,
    waiting: usize,
}

impl Gate {
    fn close(&self) {
        self.state.lock().closed = true;
    }

    fn open(&self) {
        self.state.lock().closed = false;
        self.changed.notify_all();
    }

    /// Re-evaluate abort conditions of waiting callers.
    fn wake(&self) {
        let _state = self.state.lock();
        self.changed.notify_all();
    }

    fn waiting(&self) -> usize {
        self.state.lock().waiting
    }

    /// Wait while closed. Returns false when `abort` turned true first.
    fn pass(&self, abort: impl Fn() -> bool) -> bool {
        let mut state = self.state.lock();
        while state.closed {
            if abort() {
                return false;
            }
            state.waiting += 1;
            self.changed.wait(&mut state);
            state.waiting -= 1;
        }
        true
    }
}

struct MemoryProcess {
    handle: MemoryHandle,
}

impl PtyProcess for MemoryProcess {
    fn write(&self, data: &[u8]) -> Result<(), ProcessError> {
        let inner = &self.handle.inner;
        if !inner.write_gate.pass(|| !self.handle.is_running()) {
            return Err(ProcessError::Write("process exited".to_owned()));
        }
        if inner.fail_writes.load(Ordering::SeqCst) {
            return Err(ProcessError::Write("broken pipe".to_owned()));
        }
        inner.writes.lock().push(data.to_vec());
        Ok(())
    }

    fn resize(&self, size: PtySize) -> Result<(), ProcessError> {
        let inner = &self.handle.inner;
        if inner.fail_resizes.load(Ordering::SeqCst) {
            return Err(ProcessError::Resize("pty closed".to_owned()));
        }
        inner.sizes.lock().push(size);
        Ok(())
    }

    fn kill(&self) -> Result<(), ProcessError> {
        let inner = &self.handle.inner;
        inner.kills.fetch_add(1, Ordering::SeqCst);
        if inner.fail_kills.load(Ordering::SeqCst) {
            return Err(ProcessError::Kill("no such process".to_owned()));
        }
        self.handle.exit(ExitReason::Signal("SIGKILL".to_owned()));
        Ok(())
    }

    fn pid(&self) -> Option<u32> {
        Some(self.handle.pid())
    }
}
