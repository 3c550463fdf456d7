use std::collections::HashMap;
use std::rc::{Rc, Weak};
use std::time::Instant;

use ptydeck_config::{ClientConfig, PasteConfig, PtydeckConfig, ThemeMode};
use ptydeck_core::transport::{CommandSender, TerminalCommand, TerminalEvent};
use tracing::{debug, trace, warn};

use crate::deferred::{DeferredQueue, DeferredTask};
use crate::error::ClientError;
use crate::instance::DisplayInstance;
use crate::paste::{PasteOptions, bracket, native_paste_payload};
use crate::surface::{DisplayOptions, DisplaySurface, SurfaceSize};
use crate::theme::ThemePalette;

/// Display side of ptydeck: one [`DisplayInstance`] per session id.
///
/// The client is single-threaded. Hosts drive it by calling
/// [`render_frame`](Self::render_frame) on their frame cadence and
/// [`run_due`](Self::run_due) for delayed fits and paste submits.
pub struct TerminalClient {
    commands: CommandSender,
    config: ClientConfig,
    paste: PasteConfig,
    default_size: SurfaceSize,
    theme: ThemeMode,
    instances: HashMap<String, DisplayInstance>,
    frame_queue: Vec<String>,
    deferred: DeferredQueue,
}

impl TerminalClient {
    pub fn new(config: &PtydeckConfig, commands: CommandSender) -> Self {
        Self {
            commands,
            config: config.client.clone(),
            paste: config.paste.clone(),
            default_size: SurfaceSize::new(config.pty.default_cols, config.pty.default_rows),
            theme: config.client.theme,
            instances: HashMap::new(),
            frame_queue: Vec::new(),
            deferred: DeferredQueue::default(),
        }
    }

    /// Existing instance for `id`, or a new one. A new instance asks the
    /// registry for its session exactly once.
    pub fn get_or_create(&mut self, id: &str) -> &DisplayInstance {
        self.ensure_instance(id)
    }

    pub fn instance(&self, id: &str) -> Option<&DisplayInstance> {
        self.instances.get(id)
    }

    pub fn instance_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.instances.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Bind `surface` to the instance for `id`, moving it off any previous
    /// surface. The surface is repainted from the render state, and a fit
    /// runs once `fit_delay` has passed.
    pub fn attach<S>(&mut self, id: &str, surface: &Rc<S>)
    where
        S: DisplaySurface + 'static,
    {
        let palette = ThemePalette::for_mode(self.theme);
        let options = DisplayOptions::from(&self.config);
        let fit_at = Instant::now() + self.config.fit_delay();

        let instance = self.ensure_instance(id);
        let weak: Weak<dyn DisplaySurface> = Rc::<S>::downgrade(surface);
        if let Some(previous) = instance.live_surface() {
            let same = instance
                .surface
                .as_ref()
                .is_some_and(|current| Weak::ptr_eq(current, &weak));
            if !same {
                debug!(target: "ptydeck.client", id, "moving display to a new surface");
                previous.on_detach();
            }
        }
        instance.surface = Some(weak);

        surface.configure(&options);
        surface.apply_theme(&palette);
        surface.repaint(&instance.render.screen().contents_formatted());

        self.deferred.schedule(fit_at, DeferredTask::Fit { id: id.to_owned() });
    }

    /// Drop the surface; the render state and the session keep running.
    pub fn detach(&mut self, id: &str) -> bool {
        let Some(instance) = self.instances.get_mut(id) else {
            return false;
        };
        let Some(weak) = instance.surface.take() else {
            return false;
        };
        if let Some(surface) = weak.upgrade() {
            surface.on_detach();
        }
        debug!(target: "ptydeck.client", id, "display detached");
        true
    }

    /// Size the render state and the session to the attached surface.
    /// Best effort: `None` on any failure.
    pub fn resize(&mut self, id: &str) -> Option<SurfaceSize> {
        match self.fit(id) {
            Ok(size) => Some(size),
            Err(err) => {
                trace!(target: "ptydeck.client", id, error = %err, "resize skipped");
                None
            }
        }
    }

    fn fit(&mut self, id: &str) -> Result<SurfaceSize, ClientError> {
        let instance = self
            .instances
            .get_mut(id)
            .ok_or_else(|| ClientError::UnknownInstance(id.to_owned()))?;
        let size = instance
            .live_surface()
            .and_then(|surface| surface.dimensions())
            .filter(|size| !size.is_empty())
            .ok_or_else(|| ClientError::SurfaceUnavailable(id.to_owned()))?;

        instance.render.screen_mut().set_size(size.rows, size.cols);
        send(
            &self.commands,
            TerminalCommand::Resize {
                id: id.to_owned(),
                cols: size.cols,
                rows: size.rows,
            },
        )?;
        Ok(size)
    }

    /// Keystrokes or pasted bytes, forwarded verbatim.
    pub fn input(&self, id: &str, data: &str) -> Result<(), ClientError> {
        send(
            &self.commands,
            TerminalCommand::Input {
                id: id.to_owned(),
                data: data.to_owned(),
            },
        )
    }

    /// Queue registry output for the next frame.
    pub fn handle_event(&mut self, event: TerminalEvent) {
        match event {
            TerminalEvent::Output { id, data } => {
                let Some(instance) = self.instances.get_mut(&id) else {
                    trace!(target: "ptydeck.client", id = %id, "output for an untracked instance");
                    return;
                };
                if instance.output.push(&data) {
                    self.frame_queue.push(id);
                }
            }
        }
    }

    /// Flush every instance with pending output, once each. Returns how many
    /// instances were rendered.
    pub fn render_frame(&mut self) -> usize {
        let mut rendered = 0;
        for id in std::mem::take(&mut self.frame_queue) {
            let Some(instance) = self.instances.get_mut(&id) else {
                continue;
            };
            if let Some(batch) = instance.output.take() {
                instance.render_batch(&batch);
                rendered += 1;
            }
        }
        rendered
    }

    pub fn has_pending_frame(&self) -> bool {
        !self.frame_queue.is_empty()
    }

    /// Inject text as a paste. With auto-submit the line ending follows as a
    /// separate input after the submit delay.
    pub fn paste(
        &mut self,
        id: &str,
        text: &str,
        options: PasteOptions,
    ) -> Result<(), ClientError> {
        let native = options.native.unwrap_or(self.paste.native);
        let auto_submit = options.auto_submit.unwrap_or(self.paste.auto_submit);
        let submit_key = options.submit_key.unwrap_or(self.paste.submit_key);
        let delay = options
            .submit_delay
            .unwrap_or_else(|| self.paste.submit_delay());

        let instance = self.ensure_instance(id);
        let payload = if native {
            native_paste_payload(text, instance.render.screen().bracketed_paste())
        } else {
            bracket(text)
        };
        self.input(id, &payload)?;

        if auto_submit {
            self.deferred.schedule(
                Instant::now() + delay,
                DeferredTask::Submit {
                    id: id.to_owned(),
                    data: submit_key.as_str().to_owned(),
                },
            );
        }
        Ok(())
    }

    /// Run deferred fits and submits whose deadline is at or before `now`.
    pub fn run_due(&mut self, now: Instant) -> usize {
        let due = self.deferred.take_due(now);
        let count = due.len();
        for task in due {
            match task {
                DeferredTask::Fit { id } => {
                    self.resize(&id);
                }
                DeferredTask::Submit { id, data } => {
                    if let Err(err) = self.input(&id, &data) {
                        debug!(target: "ptydeck.client", id = %id, error = %err, "submit dropped");
                    }
                }
            }
        }
        count
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.deferred.next_deadline()
    }

    /// Forget the instance, ending its session if one was requested.
    pub fn cleanup_instance(&mut self, id: &str) -> bool {
        let Some(instance) = self.instances.remove(id) else {
            return false;
        };
        self.frame_queue.retain(|queued| queued != id);
        self.deferred.cancel(id);
        self.dispose(instance);
        true
    }

    pub fn cleanup_all(&mut self) -> usize {
        self.frame_queue.clear();
        self.deferred.clear();
        let instances: Vec<DisplayInstance> =
            self.instances.drain().map(|(_, instance)| instance).collect();
        let count = instances.len();
        for instance in instances {
            self.dispose(instance);
        }
        count
    }

    pub fn set_theme(&mut self, mode: ThemeMode) {
        self.theme = mode;
        let palette = ThemePalette::for_mode(mode);
        for instance in self.instances.values() {
            if let Some(surface) = instance.live_surface() {
                surface.apply_theme(&palette);
            }
        }
    }

    pub fn theme(&self) -> ThemeMode {
        self.theme
    }

    fn ensure_instance(&mut self, id: &str) -> &mut DisplayInstance {
        let commands = &self.commands;
        let default_size = self.default_size;
        let scrollback = self.config.scrollback_lines;
        self.instances.entry(id.to_owned()).or_insert_with(|| {
            let mut instance = DisplayInstance::new(id, default_size, scrollback);
            match send(commands, TerminalCommand::Create { id: id.to_owned() }) {
                Ok(()) => instance.session_requested = true,
                Err(err) => {
                    warn!(target: "ptydeck.client", id, error = %err, "failed to request session");
                }
            }
            debug!(target: "ptydeck.client", id, "display instance created");
            instance
        })
    }

    fn dispose(&self, instance: DisplayInstance) {
        let id = instance.id().to_owned();
        if let Some(surface) = instance.live_surface() {
            surface.on_detach();
        }
        if instance.session_requested {
            if let Err(err) = send(&self.commands, TerminalCommand::Destroy { id: id.clone() }) {
                debug!(target: "ptydeck.client", id = %id, error = %err, "destroy not delivered");
            }
        }
        debug!(target: "ptydeck.client", id = %id, "display instance disposed");
    }
}

fn send(commands: &CommandSender, command: TerminalCommand) -> Result<(), ClientError> {
    commands.send(command).map_err(|_| ClientError::ChannelClosed)
}
