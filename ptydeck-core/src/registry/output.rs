use std::sync::{Arc, Weak};
use std::time::Duration;

use tracing::debug;

use super::RegistryState;
use crate::process::{ExitReason, ProcessEvent, ProcessEvents};

const LEGACY_INIT_COMMANDS: [&str; 2] = ["chcp 65001\r\n", "cls\r\n"];

pub(super) fn spawn_pump(
    state: &Arc<RegistryState>,
    id: &str,
    serial: u64,
    events: ProcessEvents,
) {
    tokio::spawn(pump(Arc::downgrade(state), id.to_owned(), serial, events));
}

pub(super) fn spawn_legacy_init(
    state: &Arc<RegistryState>,
    id: &str,
    serial: u64,
    delay: Duration,
) {
    tokio::spawn(legacy_init(Arc::downgrade(state), id.to_owned(), serial, delay));
}

async fn pump(state: Weak<RegistryState>, id: String, serial: u64, mut events: ProcessEvents) {
    while let Some(event) = events.recv().await {
        let Some(state) = state.upgrade() else {
            return;
        };
        match event {
            ProcessEvent::Data(chunk) => {
                if !state.append_output(&id, serial, &chunk) {
                    debug!(
                        target: "ptydeck.registry",
                        id = %id,
                        serial,
                        "output from a retired session"
                    );
                    return;
                }
            }
            ProcessEvent::Exit(reason) => {
                state.finish(&id, serial, &reason);
                return;
            }
        }
    }
    debug!(target: "ptydeck.registry", id = %id, serial, "process event stream closed");
}

async fn flush_after(state: Weak<RegistryState>, id: String, serial: u64, interval: Duration) {
    if interval.is_zero() {
        tokio::task::yield_now().await;
    } else {
        tokio::time::sleep(interval).await;
    }
    if let Some(state) = state.upgrade() {
        state.flush(&id, serial);
    }
}

async fn legacy_init(state: Weak<RegistryState>, id: String, serial: u64, delay: Duration) {
    tokio::time::sleep(delay).await;
    let Some(state) = state.upgrade() else {
        return;
    };
    let Some(process) = state.process(&id, Some(serial)) else {
        return;
    };
    for command in LEGACY_INIT_COMMANDS {
        if let Err(err) = process.write(command.as_bytes()) {
            debug!(target: "ptydeck.registry", id = %id, error = %err, "legacy shell setup failed");
            break;
        }
    }
}

impl RegistryState {
    /// Returns false when the session is gone or belongs to a newer generation.
    fn append_output(self: &Arc<Self>, id: &str, serial: u64, chunk: &str) -> bool {
        let needs_flush = {
            let mut sessions = self.sessions.lock();
            match sessions.get_mut(id) {
                Some(session) if session.matches(serial) => session.output.push(chunk),
                _ => return false,
            }
        };
        if needs_flush {
            tokio::spawn(flush_after(
                Arc::downgrade(self),
                id.to_owned(),
                serial,
                self.pty.coalesce_interval(),
            ));
        }
        true
    }

    fn flush(&self, id: &str, serial: u64) {
        let mut sessions = self.sessions.lock();
        let Some(session) = sessions.get_mut(id).filter(|session| session.matches(serial)) else {
            return;
        };
        if let Some(batch) = session.output.take() {
            self.emit(id, batch);
        }
    }

    /// Drain pending output, report the exit, drop the session.
    fn finish(&self, id: &str, serial: u64, reason: &ExitReason) {
        let mut sessions = self.sessions.lock();
        if !sessions.get(id).is_some_and(|session| session.matches(serial)) {
            debug!(target: "ptydeck.registry", id, serial, %reason, "exit from a retired session");
            return;
        }
        let Some(mut session) = sessions.remove(id) else {
            return;
        };
        if let Some(rest) = session.output.take() {
            self.emit(id, rest);
        }
        self.emit(id, reason.notice());
        debug!(target: "ptydeck.registry", id, %reason, "session process exited");
    }
}
