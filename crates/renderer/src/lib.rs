//! Window and GPU side of the crystal-ball slideshow: photo decoding
//! onto the canvas, double-buffered texture slots, the distortion
//! pipeline and the winit frame loop.

mod gpu;
mod loader;
mod window;

pub use loader::{CanvasImage, ImageLoader, LoadError};

use std::time::Duration;

use anyhow::Result;
use slideshow::PhotoSet;

/// Immutable renderer settings resolved by the caller before start-up.
#[derive(Debug, Clone)]
pub struct RendererConfig {
    pub display_duration: Duration,
    pub fade_duration: Duration,
    /// Extra frame cap on top of vsync; `None` renders every vblank.
    pub target_fps: Option<f32>,
    pub fullscreen: bool,
    pub show_cursor: bool,
}

pub struct Renderer {
    photos: PhotoSet,
    config: RendererConfig,
}

impl Renderer {
    pub fn new(photos: PhotoSet, config: RendererConfig) -> Self {
        Self { photos, config }
    }

    /// Runs the event loop until the user exits or a fatal GPU error
    /// occurs. Blocks the calling thread.
    pub fn run(self) -> Result<()> {
        window::run(self.photos, self.config)
    }
}
