use std::rc::{Rc, Weak};

use ptydeck_core::OutputCoalescer;

use crate::surface::{DisplaySurface, SurfaceSize};

/// Client-side state for one session id. The render state outlives any
/// number of attach/detach cycles and is dropped only by cleanup.
pub struct DisplayInstance {
    id: String,
    pub(crate) render: vt100::Parser,
    pub(crate) output: OutputCoalescer,
    pub(crate) surface: Option<Weak<dyn DisplaySurface>>,
    pub(crate) session_requested: bool,
}

impl DisplayInstance {
    pub(crate) fn new(id: &str, size: SurfaceSize, scrollback: usize) -> Self {
        Self {
            id: id.to_owned(),
            render: vt100::Parser::new(size.rows, size.cols, scrollback),
            output: OutputCoalescer::new(),
            surface: None,
            session_requested: false,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn screen(&self) -> &vt100::Screen {
        self.render.screen()
    }

    /// Visible text, without formatting.
    pub fn contents(&self) -> String {
        self.render.screen().contents()
    }

    pub fn size(&self) -> SurfaceSize {
        let (rows, cols) = self.render.screen().size();
        SurfaceSize::new(cols, rows)
    }

    pub fn session_requested(&self) -> bool {
        self.session_requested
    }

    pub fn is_attached(&self) -> bool {
        self.live_surface().is_some()
    }

    /// Output received but not yet rendered.
    pub fn pending_output(&self) -> &str {
        self.output.pending()
    }

    pub(crate) fn live_surface(&self) -> Option<Rc<dyn DisplaySurface>> {
        self.surface.as_ref().and_then(Weak::upgrade)
    }

    /// Feed a flushed batch into the render state and mirror it to the surface.
    pub(crate) fn render_batch(&mut self, batch: &str) {
        self.render.process(batch.as_bytes());
        match self.live_surface() {
            Some(surface) => surface.write(batch),
            None => self.surface = None,
        }
    }
}
