// SPDX-License-Identifier: CEPL-1.0
//! Vulkan bootstrap for Hound.
//!
//! Bring-up runs as discrete stages over a [`RendererContext`]:
//! [`init_renderer`] (instance, physical device, logical device), then
//! [`create_surface`], [`create_swapchain`] and
//! [`create_swapchain_image_views`]. [`end_renderer`] tears down whatever
//! exists. Every stage talks to Vulkan through a [`Driver`];
//! [`AshDriver`] is the real one.

use anyhow::{Context, Result};
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use tracing::info;

use hound_render::{RenderSize, Renderer, SurfaceTarget};

mod ash_driver;
mod config;
mod context;
mod device;
mod driver;
mod error;
mod instance;
mod support;
mod surface;
mod swapchain;

pub use ash::vk;
pub use ash_driver::AshDriver;
pub use config::RendererConfig;
pub use context::{end_renderer, DebugMessenger, RendererContext, MAX_SWAPCHAIN_IMAGES};
pub use device::{
    device_desc, device_type_score, rank_devices, score_candidate, select_device, DeviceScore,
    DeviceSelection, PhysicalDeviceCandidate, REQUIRED_DEVICE_EXTENSIONS,
};
pub use driver::{
    DeviceDesc, Driver, ImageViewDesc, InstanceDesc, QueueSharing, SurfacePlatform,
    SwapchainDesc,
};
pub use error::{BootstrapError, BootstrapResult};
pub use instance::{
    debug_message_level, required_instance_extensions, API_VERSION, DEBUG_MESSAGE_TYPES,
    DEBUG_SEVERITIES,
};
pub use support::{check_extension_support, check_layer_support, SupportReport, VALIDATION_LAYER};
pub use surface::{create_surface, find_present_family};
pub use swapchain::{
    choose_present_mode, choose_surface_format, clamp_extent, create_swapchain,
    create_swapchain_image_views, image_count, image_view_desc, negotiate_surface, queue_sharing,
    surface_format_score, SurfaceNegotiation, PREFERRED_COLOR_SPACE, PREFERRED_FORMAT,
};

/// Instance, physical-device and logical-device stages, in that order.
///
/// On error the handles created so far stay in `ctx`; call [`end_renderer`]
/// to release them.
pub fn init_renderer(
    ctx: &mut RendererContext,
    driver: &mut dyn Driver,
    cfg: &RendererConfig,
) -> BootstrapResult {
    instance::create_instance(ctx, driver, cfg)?;
    device::select_physical_device(ctx, driver, cfg)?;
    device::create_logical_device(ctx, driver)?;
    Ok(())
}

/// Runs every stage up to and including the swapchain image views.
pub fn bootstrap(
    ctx: &mut RendererContext,
    driver: &mut dyn Driver,
    cfg: &RendererConfig,
    target: &SurfaceTarget,
) -> BootstrapResult {
    init_renderer(ctx, driver, cfg)?;
    create_surface(ctx, driver, target)?;
    create_swapchain(ctx, driver)?;
    create_swapchain_image_views(ctx, driver)?;
    Ok(())
}

/// A fully bootstrapped renderer over the system Vulkan loader.
///
/// Dropping it tears everything down.
pub struct VkRenderer {
    driver: AshDriver,
    ctx: RendererContext,
}

impl VkRenderer {
    pub fn with_config(target: &SurfaceTarget, cfg: &RendererConfig) -> Result<Self> {
        let platform = SurfacePlatform::from_display(&target.display)
            .unwrap_or_else(SurfacePlatform::native);
        let mut r = Self {
            driver: AshDriver::load()?,
            ctx: RendererContext::new(platform),
        };
        // `r` drops on error, which releases the partial state.
        bootstrap(&mut r.ctx, &mut r.driver, cfg, target).context("vulkan bootstrap")?;

        let fmt = r.ctx.surface_format();
        info!(
            "Vulkan swapchain ready ({}x{}, fmt 0x{:x}, {} images, {:?})",
            r.ctx.extent().width,
            r.ctx.extent().height,
            fmt.format.as_raw(),
            r.ctx.images().len(),
            r.ctx.present_mode()
        );
        Ok(r)
    }

    pub fn context(&self) -> &RendererContext {
        &self.ctx
    }
}

impl Drop for VkRenderer {
    fn drop(&mut self) {
        end_renderer(&mut self.ctx, &mut self.driver);
    }
}

impl Renderer for VkRenderer {
    fn new(window: &dyn HasWindowHandle, display: &dyn HasDisplayHandle, size: RenderSize) -> Result<Self> {
        let target = SurfaceTarget::from_handles(window, display, size)?;
        Self::with_config(&target, &RendererConfig::default().with_env_overrides())
    }

    fn size(&self) -> RenderSize {
        let extent = self.ctx.extent();
        RenderSize {
            width: extent.width,
            height: extent.height,
        }
    }
}
