use ptydeck_config::ClientConfig;

use crate::theme::ThemePalette;

/// Geometry of a display surface in character cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceSize {
    pub cols: u16,
    pub rows: u16,
}

impl SurfaceSize {
    pub fn new(cols: u16, rows: u16) -> Self {
        Self { cols, rows }
    }

    pub fn is_empty(&self) -> bool {
        self.cols == 0 || self.rows == 0
    }
}

/// Presentation settings handed to a surface when it is attached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayOptions {
    pub font_family: String,
    pub font_size: u16,
    pub cursor_blink: bool,
    pub scrollback_lines: usize,
}

impl From<&ClientConfig> for DisplayOptions {
    fn from(config: &ClientConfig) -> Self {
        Self {
            font_family: config.font_family.clone(),
            font_size: config.font_size,
            cursor_blink: config.cursor_blink,
            scrollback_lines: config.scrollback_lines,
        }
    }
}

/// Where a display instance draws. The client only keeps a weak reference,
/// so a surface going away never takes the render state with it.
pub trait DisplaySurface {
    /// Current size, or `None` before the surface has been laid out.
    fn dimensions(&self) -> Option<SurfaceSize>;

    /// Raw output bytes, escape sequences included.
    fn write(&self, data: &str);

    /// Replace whatever is shown with a snapshot of the render state.
    fn repaint(&self, snapshot: &[u8]);

    fn apply_theme(&self, palette: &ThemePalette);

    fn configure(&self, options: &DisplayOptions);

    /// The instance moved to another surface or was detached.
    fn on_detach(&self) {}
}
