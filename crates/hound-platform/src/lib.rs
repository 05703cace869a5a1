// SPDX-License-Identifier: CEPL-1.0
pub use winit;

use anyhow::{Context, Result};
use hound_render::{RenderSize, SurfaceTarget};
use winit::event_loop::ActiveEventLoop;
use winit::window::Window;

/// Opens the engine's main window.
pub fn create_window(event_loop: &ActiveEventLoop, title: &str) -> Result<Window> {
    let window = event_loop
        .create_window(Window::default_attributes().with_title(title))
        .context("create_window")?;
    let size = window.inner_size();
    tracing::info!("window created ({}x{})", size.width, size.height);
    Ok(window)
}

/// Window size clamped to at least 1x1; a minimised window reports zero.
pub fn render_size(window: &Window) -> RenderSize {
    let size = window.inner_size();
    RenderSize {
        width: size.width.max(1),
        height: size.height.max(1),
    }
}

/// Raw handles a renderer needs to bind a surface to `window`.
pub fn surface_target(window: &Window) -> Result<SurfaceTarget> {
    SurfaceTarget::from_handles(window, window, render_size(window))
}
