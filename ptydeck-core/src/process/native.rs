use std::io::{Read, Write};
use std::sync::mpsc as std_mpsc;
use std::thread;
use std::time::Duration;

use parking_lot::Mutex;
use portable_pty::{ChildKiller, CommandBuilder, MasterPty, native_pty_system};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::{
    ExitReason, ProcessEvent, PtyProcess, PtySize, PtySpawner, SpawnRequest, SpawnedProcess,
};
use crate::error::ProcessError;
use crate::utf8::Utf8Decoder;

/// How long the waiter thread lets the reader drain after the child exits.
const READER_DRAIN_GRACE_PERIOD_MS: u64 = 500;
const READ_BUFFER_SIZE: usize = 8192;

/// Spawns shells on the host's native PTY implementation.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativePtySpawner;

impl NativePtySpawner {
    pub fn new() -> Self {
        Self
    }
}

impl PtySpawner for NativePtySpawner {
    fn spawn(&self, request: SpawnRequest) -> Result<SpawnedProcess, ProcessError> {
        let shell = request.program.display().to_string();
        let pair = native_pty_system()
            .openpty(request.size.into())
            .map_err(|err| {
                ProcessError::spawn(&shell, format!("failed to allocate PTY pair: {err}"))
            })?;

        let mut builder = CommandBuilder::new(&request.program);
        for arg in &request.args {
            builder.arg(arg);
        }
        builder.cwd(&request.cwd);
        builder.env_clear();
        for (key, value) in &request.env {
            builder.env(key, value);
        }

        let mut child = pair
            .slave
            .spawn_command(builder)
            .map_err(|err| ProcessError::spawn(&shell, err))?;
        drop(pair.slave);

        let pid = child.process_id();
        let mut killer = child.clone_killer();
        let master = pair.master;

        let handles = master
            .try_clone_reader()
            .and_then(|reader| Ok((reader, master.take_writer()?)));
        let (reader, writer) = match handles {
            Ok(handles) => handles,
            Err(err) => {
                let _ = killer.kill();
                return Err(ProcessError::spawn(
                    &shell,
                    format!("failed to open PTY streams: {err}"),
                ));
            }
        };

        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (drained_tx, drained_rx) = std_mpsc::channel::<()>();

        let reader_events = events_tx.clone();
        let reader_thread = thread::Builder::new()
            .name(format!("ptydeck-pty-reader-{}", pid.unwrap_or_default()))
            .spawn(move || {
                pump_reader(reader, &reader_events);
                let _ = drained_tx.send(());
            });
        if let Err(err) = reader_thread {
            let _ = killer.kill();
            return Err(ProcessError::Io(err));
        }

        // Writes go through a dedicated thread: a shell that stops reading
        // fills the tty buffer, and only that thread blocks on it.
        let (input_tx, input_rx) = std_mpsc::channel::<Vec<u8>>();
        let writer_thread = thread::Builder::new()
            .name(format!("ptydeck-pty-writer-{}", pid.unwrap_or_default()))
            .spawn(move || pump_writer(writer, input_rx));
        if let Err(err) = writer_thread {
            let _ = killer.kill();
            return Err(ProcessError::Io(err));
        }

        let waiter_thread = thread::Builder::new()
            .name(format!("ptydeck-pty-waiter-{}", pid.unwrap_or_default()))
            .spawn(move || {
                let reason = match child.wait() {
                    Ok(status) => match status.signal() {
                        Some(signal) => ExitReason::Signal(signal.to_owned()),
                        None => ExitReason::Code(status.exit_code()),
                    },
                    Err(err) => {
                        warn!(target: "ptydeck.pty", error = %err, "failed to wait for PTY child");
                        ExitReason::Code(1)
                    }
                };
                // Output produced right before exit must reach the stream first.
                if drained_rx
                    .recv_timeout(Duration::from_millis(READER_DRAIN_GRACE_PERIOD_MS))
                    .is_err()
                {
                    debug!(target: "ptydeck.pty", "PTY reader still open after child exit");
                }
                let _ = events_tx.send(ProcessEvent::Exit(reason));
            });
        if let Err(err) = waiter_thread {
            let _ = killer.kill();
            return Err(ProcessError::Io(err));
        }

        debug!(target: "ptydeck.pty", shell = %shell, pid = ?pid, "spawned PTY process");

        Ok(SpawnedProcess {
            process: Box::new(NativePtyProcess {
                master: Mutex::new(master),
                input: input_tx,
                killer: Mutex::new(killer),
                pid,
            }),
            events: events_rx,
        })
    }
}

fn pump_reader(mut reader: Box<dyn Read + Send>, events: &mpsc::UnboundedSender<ProcessEvent>) {
    let mut buffer = [0u8; READ_BUFFER_SIZE];
    let mut decoder = Utf8Decoder::default();
    let mut total_bytes = 0usize;

    loop {
        match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(read) => {
                total_bytes += read;
                let text = decoder.push(&buffer[..read]);
                if !text.is_empty() && events.send(ProcessEvent::Data(text)).is_err() {
                    break;
                }
            }
            Err(err) if err.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(err) => {
                // EIO is how Linux reports a closed slave side.
                debug!(target: "ptydeck.pty", error = %err, "PTY reader stopped");
                break;
            }
        }
    }

    let tail = decoder.finish();
    if !tail.is_empty() {
        let _ = events.send(ProcessEvent::Data(tail));
    }
    debug!(target: "ptydeck.pty", total_bytes, "PTY reader reached EOF");
}

fn pump_writer(mut writer: Box<dyn Write + Send>, input: std_mpsc::Receiver<Vec<u8>>) {
    for chunk in input {
        if let Err(err) = writer.write_all(&chunk).and_then(|()| writer.flush()) {
            debug!(target: "ptydeck.pty", error = %err, "PTY writer stopped");
            return;
        }
    }
}

struct NativePtyProcess {
    master: Mutex<Box<dyn MasterPty + Send>>,
    input: std_mpsc::Sender<Vec<u8>>,
    killer: Mutex<Box<dyn ChildKiller + Send + Sync>>,
    pid: Option<u32>,
}

impl PtyProcess for NativePtyProcess {
    /// Queues the bytes for the writer thread; never blocks on the tty.
    fn write(&self, data: &[u8]) -> Result<(), ProcessError> {
        self.input
            .send(data.to_vec())
            .map_err(|_| ProcessError::Write("PTY writer closed".to_owned()))
    }

    fn resize(&self, size: PtySize) -> Result<(), ProcessError> {
        self.master
            .lock()
            .resize(size.into())
            .map_err(|err| ProcessError::Resize(err.to_string()))
    }

    fn kill(&self) -> Result<(), ProcessError> {
        self.killer
            .lock()
            .kill()
            .map_err(|err| ProcessError::Kill(err.to_string()))
    }

    fn pid(&self) -> Option<u32> {
        self.pid
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(unix)]
    #[test]
    fn spawns_and_reports_exit_code() {
        let request = SpawnRequest {
            program: "/bin/sh".into(),
            args: vec!["-c".to_owned(), "printf ready; exit 3".to_owned()],
            cwd: std::env::temp_dir(),
            env: std::iter::once(("PATH".to_owned(), "/usr/bin:/bin".to_owned())).collect(),
            size: PtySize::new(80, 24),
        };
        let SpawnedProcess { mut events, .. } =
            NativePtySpawner::new().spawn(request).expect("spawn /bin/sh");

        let mut output = String::new();
        let reason = loop {
            match events.blocking_recv().expect("exit event") {
                ProcessEvent::Data(chunk) => output.push_str(&chunk),
                ProcessEvent::Exit(reason) => break reason,
            }
        };
        assert!(output.contains("ready"));
        assert_eq!(reason, ExitReason::Code(3));
    }

    #[cfg(unix)]
    #[test]
    fn writes_return_while_the_child_ignores_stdin() {
        let request = SpawnRequest {
            program: "/bin/sleep".into(),
            args: vec!["30".to_owned()],
            cwd: std::env::temp_dir(),
            env: std::iter::once(("PATH".to_owned(), "/usr/bin:/bin".to_owned())).collect(),
            size: PtySize::new(80, 24),
        };
        let SpawnedProcess { process, mut events } =
            NativePtySpawner::new().spawn(request).expect("spawn /bin/sleep");

        let line = format!("{}\n", "y".repeat(1023));
        let started = std::time::Instant::now();
        for _ in 0..1600 {
            process.write(line.as_bytes()).expect("write queued");
        }
        assert!(started.elapsed() < Duration::from_secs(2));

        process.kill().expect("kill sleeping child");
        loop {
            match events.blocking_recv().expect("exit event") {
                ProcessEvent::Data(_) => continue,
                ProcessEvent::Exit(_) => break,
            }
        }
    }
}
