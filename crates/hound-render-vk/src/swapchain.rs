// SPDX-License-Identifier: CEPL-1.0
use ash::vk;
use hound_render::RenderSize;
use tracing::{error, info};

use crate::context::{RendererContext, MAX_SWAPCHAIN_IMAGES};
use crate::driver::{Driver, ImageViewDesc, QueueSharing, SwapchainDesc};
use crate::error::{BootstrapError, BootstrapResult};

pub const PREFERRED_FORMAT: vk::Format = vk::Format::B8G8R8A8_SRGB;
pub const PREFERRED_COLOR_SPACE: vk::ColorSpaceKHR = vk::ColorSpaceKHR::SRGB_NONLINEAR;

pub fn surface_format_score(f: &vk::SurfaceFormatKHR) -> u32 {
    let mut score = 0;
    if f.format == PREFERRED_FORMAT {
        score += 10;
    }
    if f.color_space == PREFERRED_COLOR_SPACE {
        score += 10;
    }
    score
}

/// Best-scoring format, every entry scored including the first; ties keep
/// the earliest. `None` only for an empty list.
pub fn choose_surface_format(formats: &[vk::SurfaceFormatKHR]) -> Option<vk::SurfaceFormatKHR> {
    let (first, rest) = formats.split_first()?;
    let mut best = *first;
    let mut best_score = surface_format_score(first);
    for f in rest {
        let score = surface_format_score(f);
        if score > best_score {
            best = *f;
            best_score = score;
        }
    }
    Some(best)
}

/// MAILBOX when offered, otherwise the always-available FIFO.
pub fn choose_present_mode(modes: &[vk::PresentModeKHR]) -> vk::PresentModeKHR {
    if modes.contains(&vk::PresentModeKHR::MAILBOX) {
        vk::PresentModeKHR::MAILBOX
    } else {
        vk::PresentModeKHR::FIFO
    }
}

/// Clamps the surface's current extent into `[min, max]`, per axis, low
/// bound first. A surface that leaves its extent to the swapchain
/// (`u32::MAX`) gets `hint` instead.
pub fn clamp_extent(caps: &vk::SurfaceCapabilitiesKHR, hint: RenderSize) -> vk::Extent2D {
    let current = if caps.current_extent.width == u32::MAX {
        vk::Extent2D {
            width: hint.width,
            height: hint.height,
        }
    } else {
        caps.current_extent
    };
    let axis = |value: u32, min: u32, max: u32| value.max(min).min(max);
    vk::Extent2D {
        width: axis(current.width, caps.min_image_extent.width, caps.max_image_extent.width),
        height: axis(current.height, caps.min_image_extent.height, caps.max_image_extent.height),
    }
}

/// One more than the minimum, bounded by the maximum (0 means unbounded).
pub fn image_count(caps: &vk::SurfaceCapabilitiesKHR) -> u32 {
    let wanted = caps.min_image_count.saturating_add(1);
    if caps.max_image_count == 0 {
        wanted
    } else {
        wanted.min(caps.max_image_count)
    }
}

pub fn queue_sharing(graphics_family: u32, present_family: u32) -> QueueSharing {
    if graphics_family == present_family {
        QueueSharing {
            mode: vk::SharingMode::EXCLUSIVE,
            families: vec![graphics_family],
        }
    } else {
        QueueSharing {
            mode: vk::SharingMode::CONCURRENT,
            families: vec![graphics_family, present_family],
        }
    }
}

/// Everything learned from the surface and decided from it.
#[derive(Clone, Debug)]
pub struct SurfaceNegotiation {
    pub capabilities: vk::SurfaceCapabilitiesKHR,
    pub formats: Vec<vk::SurfaceFormatKHR>,
    pub present_modes: Vec<vk::PresentModeKHR>,
    pub format: vk::SurfaceFormatKHR,
    pub present_mode: vk::PresentModeKHR,
    pub extent: vk::Extent2D,
    pub image_count: u32,
}

pub fn negotiate_surface(
    driver: &dyn Driver,
    physical: vk::PhysicalDevice,
    surface: vk::SurfaceKHR,
    hint: RenderSize,
) -> BootstrapResult<SurfaceNegotiation> {
    let capabilities = driver
        .surface_capabilities(physical, surface)
        .map_err(|e| {
            error!("vk: could not query surface capabilities: {e}");
            BootstrapError::SurfaceQuery(e)
        })?;

    let formats = driver.surface_formats(physical, surface).map_err(|e| {
        error!("vk: could not query surface formats: {e}");
        BootstrapError::SurfaceQuery(e)
    })?;
    let format = choose_surface_format(&formats).ok_or_else(|| {
        error!("vk: surface reports no formats");
        BootstrapError::NoSurfaceFormats
    })?;

    let present_modes = driver
        .surface_present_modes(physical, surface)
        .map_err(|e| {
            error!("vk: could not query present modes: {e}");
            BootstrapError::SurfaceQuery(e)
        })?;
    if present_modes.is_empty() {
        error!("vk: surface reports no present modes");
        return Err(BootstrapError::NoPresentModes);
    }

    Ok(SurfaceNegotiation {
        format,
        present_mode: choose_present_mode(&present_modes),
        extent: clamp_extent(&capabilities, hint),
        image_count: image_count(&capabilities),
        capabilities,
        formats,
        present_modes,
    })
}

/// Creates the swapchain for the context's surface and fetches its images.
/// An existing swapchain and its views are destroyed first.
pub fn create_swapchain(ctx: &mut RendererContext, driver: &mut dyn Driver) -> BootstrapResult {
    let device = ctx
        .device
        .ok_or(BootstrapError::MissingPrerequisite("logical device"))?;
    let physical = ctx
        .physical_device
        .ok_or(BootstrapError::MissingPrerequisite("physical device"))?;
    let surface = ctx
        .surface
        .ok_or(BootstrapError::MissingPrerequisite("surface"))?;

    if ctx.swapchain.is_some() {
        info!("vk: replacing existing swapchain");
        ctx.destroy_swapchain(driver);
    }

    let n = negotiate_surface(&*driver, physical, surface, ctx.size_hint)?;
    let sharing = queue_sharing(ctx.graphics_family, ctx.present_family);

    let desc = SwapchainDesc {
        surface,
        min_image_count: n.image_count,
        format: n.format,
        extent: n.extent,
        usage: vk::ImageUsageFlags::COLOR_ATTACHMENT,
        sharing,
        pre_transform: n.capabilities.current_transform,
        composite_alpha: vk::CompositeAlphaFlagsKHR::OPAQUE,
        present_mode: n.present_mode,
        clipped: true,
    };

    let swapchain = driver.create_swapchain(device, &desc).map_err(|e| {
        error!("vk: could not create swapchain: {e}");
        BootstrapError::SwapchainCreation(e)
    })?;
    ctx.swapchain = Some(swapchain);
    ctx.surface_format = n.format;
    ctx.present_mode = n.present_mode;
    ctx.sharing_mode = desc.sharing.mode;
    ctx.extent = n.extent;

    ctx.images.clear();
    let images = driver.swapchain_images(device, swapchain).map_err(|e| {
        error!("vk: could not fetch swapchain images: {e}");
        BootstrapError::SwapchainCreation(e)
    })?;
    if images.len() > MAX_SWAPCHAIN_IMAGES {
        error!("vk: swapchain returned {} images", images.len());
        return Err(BootstrapError::TooManySwapchainImages {
            count: images.len(),
            max: MAX_SWAPCHAIN_IMAGES,
        });
    }
    ctx.images = images;

    info!(
        "vk: swapchain created ({}x{}, {:?}/{:?}, {:?}, {:?}, images requested={} got={})",
        n.extent.width,
        n.extent.height,
        n.format.format,
        n.format.color_space,
        n.present_mode,
        desc.sharing.mode,
        n.image_count,
        ctx.images.len()
    );
    Ok(())
}

/// 2D color view over the whole of a single-mip, single-layer image.
pub fn image_view_desc(image: vk::Image, format: vk::Format) -> ImageViewDesc {
    ImageViewDesc {
        image,
        view_type: vk::ImageViewType::TYPE_2D,
        format,
        components: vk::ComponentMapping {
            r: vk::ComponentSwizzle::IDENTITY,
            g: vk::ComponentSwizzle::IDENTITY,
            b: vk::ComponentSwizzle::IDENTITY,
            a: vk::ComponentSwizzle::IDENTITY,
        },
        subresource_range: vk::ImageSubresourceRange {
            aspect_mask: vk::ImageAspectFlags::COLOR,
            base_mip_level: 0,
            level_count: 1,
            base_array_layer: 0,
            layer_count: 1,
        },
    }
}

/// Creates one view per swapchain image. On failure the views made by this
/// call are destroyed again, so the context never holds a partial set.
pub fn create_swapchain_image_views(
    ctx: &mut RendererContext,
    driver: &mut dyn Driver,
) -> BootstrapResult {
    let device = ctx
        .device
        .ok_or(BootstrapError::MissingPrerequisite("logical device"))?;
    if ctx.swapchain.is_none() {
        return Err(BootstrapError::MissingPrerequisite("swapchain"));
    }

    ctx.destroy_image_views(driver);

    let mut views = Vec::with_capacity(ctx.images.len());
    for (index, &image) in ctx.images.iter().enumerate() {
        match driver.create_image_view(device, &image_view_desc(image, ctx.surface_format.format)) {
            Ok(view) => views.push(view),
            Err(result) => {
                error!("vk: could not create image view {index}: {result}");
                for view in views {
                    driver.destroy_image_view(device, view);
                }
                return Err(BootstrapError::ImageViewCreation { index, result });
            }
        }
    }
    ctx.image_views = views;

    info!("vk: {} swapchain image views created", ctx.image_views.len());
    Ok(())
}
