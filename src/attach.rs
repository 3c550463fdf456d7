//! `ptydeck attach`: one session drawn straight onto the controlling terminal.

use std::io::{self, IsTerminal, Read, Write};
use std::rc::Rc;
use std::thread;
use std::time::Instant;

use anyhow::{Context, Result, bail};
use crossterm::cursor::{MoveTo, SetCursorStyle};
use crossterm::terminal::{self, Clear, ClearType};
use crossterm::{execute, queue};
use ptydeck_client::{DisplayOptions, DisplaySurface, SurfaceSize, TerminalClient, ThemePalette};
use ptydeck_config::PtydeckConfig;
use ptydeck_core::transport::{self, CommandReceiver, TerminalCommand};
use ptydeck_core::{NativePtySpawner, Outcome, ProcessError, SessionRegistry, Utf8Decoder};
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// Ctrl-]
const DETACH_KEY: u8 = 0x1d;
const FALLBACK_SESSION_ID: &str = "TERMINAL_1";
/// Restores the palette, foreground, background and cursor colors.
const PALETTE_RESET: &str = "\x1b]104\x07\x1b]110\x07\x1b]111\x07\x1b]112\x07";

pub async fn run(config: &PtydeckConfig, id: Option<String>) -> Result<()> {
    if !io::stdin().is_terminal() || !io::stdout().is_terminal() {
        bail!("attach needs an interactive terminal; use `ptydeck serve` for piped I/O");
    }

    let id = id
        .or_else(|| config.terminals.first().map(|slot| slot.id.clone()))
        .unwrap_or_else(|| FALLBACK_SESSION_ID.to_owned());

    let (event_tx, mut event_rx) = transport::event_channel();
    let (command_tx, mut command_rx) = transport::command_channel();
    let registry = SessionRegistry::new(config, NativePtySpawner::new(), event_tx);
    let mut client = TerminalClient::new(config, command_tx);

    let guard = RawModeGuard::enable()?;
    let surface = Rc::new(StdoutSurface);
    client.attach(&id, &surface);
    info!(target: "ptydeck.client", id = %id, "attached");

    let mut input_rx = spawn_stdin_reader();
    let mut ticker = tokio::time::interval(config.client.frame_interval());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let mut decoder = Utf8Decoder::default();
    let mut last_size = surface.dimensions();
    let mut seen_live = false;
    let mut failure: Option<ProcessError> = None;

    loop {
        tokio::select! {
            Some(command) = command_rx.recv() => {
                let is_create = matches!(command, TerminalCommand::Create { .. });
                if let Outcome::Reported(err) = transport::dispatch(&registry, command) {
                    if is_create {
                        failure = Some(err);
                    } else {
                        debug!(target: "ptydeck.client", error = %err, "command failed");
                    }
                }
            }
            Some(event) = event_rx.recv() => client.handle_event(event),
            input = input_rx.recv() => {
                let Some(bytes) = input else {
                    debug!(target: "ptydeck.client", "stdin closed");
                    break;
                };
                let (bytes, detach) = match bytes.iter().position(|byte| *byte == DETACH_KEY) {
                    Some(index) => (&bytes[..index], true),
                    None => (&bytes[..], false),
                };
                let text = decoder.push(bytes);
                if !text.is_empty()
                    && let Err(err) = client.input(&id, &text)
                {
                    warn!(target: "ptydeck.client", error = %err, "input dropped");
                }
                if detach {
                    info!(target: "ptydeck.client", id = %id, "detach requested");
                    break;
                }
            }
            _ = ticker.tick() => {
                client.run_due(Instant::now());
                client.render_frame();

                let size = surface.dimensions();
                if size != last_size {
                    last_size = size;
                    client.resize(&id);
                }

                let live = registry.is_live(&id);
                seen_live |= live;
                if (seen_live && !live) || failure.is_some() {
                    while let Ok(event) = event_rx.try_recv() {
                        client.handle_event(event);
                    }
                    client.render_frame();
                    break;
                }
            }
        }
    }

    client.detach(&id);
    client.cleanup_all();
    let swept = drain_commands(&registry, &mut command_rx) + registry.shutdown();
    debug!(target: "ptydeck.client", swept, "sessions shut down");
    drop(guard);

    if let Some(err) = failure {
        return Err(err).with_context(|| format!("Failed to start session {id}"));
    }
    println!();
    Ok(())
}

/// Apply commands queued during teardown. Returns how many sessions they destroyed.
fn drain_commands(registry: &SessionRegistry, commands: &mut CommandReceiver) -> usize {
    let mut destroyed = 0;
    while let Ok(command) = commands.try_recv() {
        let is_destroy = matches!(command, TerminalCommand::Destroy { .. });
        if transport::dispatch(registry, command).is_applied() && is_destroy {
            destroyed += 1;
        }
    }
    destroyed
}

/// Raw stdin chunks from a dedicated thread; a blocking read never stalls
/// the event loop.
fn spawn_stdin_reader() -> mpsc::UnboundedReceiver<Vec<u8>> {
    let (tx, rx) = mpsc::unbounded_channel();
    let spawned = thread::Builder::new()
        .name("ptydeck-stdin".to_owned())
        .spawn(move || {
            let mut stdin = io::stdin().lock();
            let mut buf = [0u8; 4096];
            loop {
                match stdin.read(&mut buf) {
                    Ok(0) => break,
                    Ok(read) => {
                        if tx.send(buf[..read].to_vec()).is_err() {
                            break;
                        }
                    }
                    Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                    Err(err) => {
                        debug!(target: "ptydeck.client", error = %err, "stdin read failed");
                        break;
                    }
                }
            }
        });
    if let Err(err) = spawned {
        warn!(target: "ptydeck.client", error = %err, "failed to spawn stdin reader");
    }
    rx
}

struct RawModeGuard;

impl RawModeGuard {
    fn enable() -> Result<Self> {
        terminal::enable_raw_mode().context("Failed to enable raw mode")?;
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        if let Err(err) = terminal::disable_raw_mode() {
            warn!(target: "ptydeck.client", error = %err, "failed to restore terminal mode");
        }
    }
}

/// The controlling terminal as a display surface.
struct StdoutSurface;

impl StdoutSurface {
    fn emit(&self, write: impl FnOnce(&mut io::StdoutLock<'static>) -> io::Result<()>) {
        let mut out = io::stdout().lock();
        if let Err(err) = write(&mut out).and_then(|()| out.flush()) {
            debug!(target: "ptydeck.client", error = %err, "terminal write failed");
        }
    }
}

impl DisplaySurface for StdoutSurface {
    fn dimensions(&self) -> Option<SurfaceSize> {
        terminal::size()
            .ok()
            .map(|(cols, rows)| SurfaceSize::new(cols, rows))
    }

    fn write(&self, data: &str) {
        self.emit(|out| out.write_all(data.as_bytes()));
    }

    fn repaint(&self, snapshot: &[u8]) {
        self.emit(|out| {
            queue!(out, Clear(ClearType::All), MoveTo(0, 0))?;
            out.write_all(snapshot)
        });
    }

    fn apply_theme(&self, palette: &ThemePalette) {
        self.emit(|out| out.write_all(palette.osc_sequences().as_bytes()));
    }

    fn configure(&self, options: &DisplayOptions) {
        let style = if options.cursor_blink {
            SetCursorStyle::BlinkingBlock
        } else {
            SetCursorStyle::SteadyBlock
        };
        self.emit(|out| execute!(out, style));
    }

    fn on_detach(&self) {
        self.emit(|out| {
            queue!(out, SetCursorStyle::DefaultUserShape)?;
            out.write_all(PALETTE_RESET.as_bytes())
        });
    }
}
