// SPDX-License-Identifier: CEPL-1.0
use anyhow::{anyhow, Result};
use raw_window_handle::{HasDisplayHandle, HasWindowHandle, RawDisplayHandle, RawWindowHandle};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RenderSize {
    pub width: u32,
    pub height: u32,
}

/// Everything a backend needs from the windowing layer to bind a
/// presentable surface: the raw native handles and the window's size.
#[derive(Clone, Copy, Debug)]
pub struct SurfaceTarget {
    pub display: RawDisplayHandle,
    pub window: RawWindowHandle,
    /// Used when the surface does not dictate its own extent.
    pub size: RenderSize,
}

impl SurfaceTarget {
    pub fn from_handles(
        window: &dyn HasWindowHandle,
        display: &dyn HasDisplayHandle,
        size: RenderSize,
    ) -> Result<Self> {
        let display = display
            .display_handle()
            .map_err(|e| anyhow!("display_handle: {e}"))?
            .as_raw();
        let window = window
            .window_handle()
            .map_err(|e| anyhow!("window_handle: {e}"))?
            .as_raw();
        Ok(Self {
            display,
            window,
            size,
        })
    }
}

pub trait Renderer {
    fn new(
        window: &dyn HasWindowHandle,
        display: &dyn HasDisplayHandle,
        size: RenderSize,
    ) -> Result<Self>
    where
        Self: Sized;

    /// Size of the presentable images currently in use.
    fn size(&self) -> RenderSize;
}
