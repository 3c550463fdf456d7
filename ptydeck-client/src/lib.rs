//! Display side of ptydeck.
//!
//! A [`TerminalClient`] keeps one [`DisplayInstance`] per session id. Output
//! from the registry is batched per frame and fed into a `vt100` render
//! state that survives surfaces coming and going.

mod client;
mod deferred;
pub mod error;
mod instance;
pub mod paste;
pub mod surface;
pub mod theme;

pub use client::TerminalClient;
pub use error::ClientError;
pub use instance::DisplayInstance;
pub use paste::PasteOptions;
pub use surface::{DisplayOptions, DisplaySurface, SurfaceSize};
pub use theme::ThemePalette;
