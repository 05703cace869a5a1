// SPDX-License-Identifier: CEPL-1.0
use ash::vk;
use hound_render::SurfaceTarget;
use tracing::{error, info, warn};

use crate::context::RendererContext;
use crate::driver::Driver;
use crate::error::{BootstrapError, BootstrapResult};

/// First queue family of `physical` that can present to `surface`.
///
/// Falls back to `graphics_family` when the device reports no families at
/// all or none of them can present.
pub fn find_present_family(
    driver: &dyn Driver,
    physical: vk::PhysicalDevice,
    surface: vk::SurfaceKHR,
    graphics_family: u32,
) -> u32 {
    let family_count = driver.queue_family_properties(physical).len() as u32;
    if family_count == 0 {
        warn!("vk: device reports no queue families; presenting from graphics family {graphics_family}");
        return graphics_family;
    }

    for family in 0..family_count {
        match driver.surface_support(physical, family, surface) {
            Ok(true) => {
                info!("vk: queue family {family} supports presentation");
                return family;
            }
            Ok(false) => {}
            Err(e) => warn!("vk: present support query for family {family} failed: {e}"),
        }
    }

    warn!("vk: no queue family reports present support; using graphics family {graphics_family}");
    graphics_family
}

/// Binds a presentable surface to the window in `target` and picks the
/// presentation queue family. A surface already in `ctx` is destroyed first,
/// together with its swapchain.
pub fn create_surface(
    ctx: &mut RendererContext,
    driver: &mut dyn Driver,
    target: &SurfaceTarget,
) -> BootstrapResult {
    let instance = ctx
        .instance
        .ok_or(BootstrapError::MissingPrerequisite("instance"))?;
    let physical = ctx
        .physical_device
        .ok_or(BootstrapError::MissingPrerequisite("physical device"))?;

    if ctx.surface.is_some() {
        info!("vk: replacing existing surface and its swapchain");
        ctx.destroy_surface(driver);
    }

    let surface = driver.create_surface(instance, target).map_err(|e| {
        error!("vk: could not create surface: {e}");
        BootstrapError::SurfaceCreation(e)
    })?;
    ctx.surface = Some(surface);
    ctx.size_hint = target.size;
    ctx.present_family = find_present_family(&*driver, physical, surface, ctx.graphics_family);

    info!(
        "vk: surface created for {:?} (present family {})",
        ctx.platform, ctx.present_family
    );
    Ok(())
}
