// SPDX-License-Identifier: CEPL-1.0
use std::ffi::CStr;

use ash::vk;
use tracing::{debug, error, info, warn};

use crate::config::RendererConfig;
use crate::context::RendererContext;
use crate::driver::{DeviceDesc, Driver};
use crate::error::{BootstrapError, BootstrapResult};
use crate::support::check_extension_support;

/// Device extensions a physical device must expose to be selectable.
pub const REQUIRED_DEVICE_EXTENSIONS: &[&CStr] = &[ash::khr::swapchain::NAME];

/// What the selector knows about one GPU while choosing.
#[derive(Clone, Debug)]
pub struct PhysicalDeviceCandidate {
    pub handle: vk::PhysicalDevice,
    pub name: String,
    pub device_type: vk::PhysicalDeviceType,
    pub max_image_dimension_2d: u32,
    pub geometry_shader: bool,
    pub queue_family_count: usize,
    /// First queue family with the GRAPHICS bit.
    pub graphics_family: Option<u32>,
    pub extensions_supported: bool,
    pub properties: vk::PhysicalDeviceProperties,
    pub features: vk::PhysicalDeviceFeatures,
}

impl PhysicalDeviceCandidate {
    pub fn query(driver: &dyn Driver, handle: vk::PhysicalDevice) -> Self {
        let properties = driver.physical_device_properties(handle);
        let features = driver.physical_device_features(handle);
        let families = driver.queue_family_properties(handle);

        let graphics_family = families
            .iter()
            .position(|f| f.queue_flags.contains(vk::QueueFlags::GRAPHICS))
            .map(|i| i as u32);

        let extensions_supported = match driver.device_extensions(handle) {
            Ok(supported) => check_extension_support(REQUIRED_DEVICE_EXTENSIONS, &supported).all_supported(),
            Err(e) => {
                warn!("vk: device extension query failed: {e}");
                false
            }
        };

        let name = properties
            .device_name_as_c_str()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|_| "<unnamed>".into());

        Self {
            handle,
            name,
            device_type: properties.device_type,
            max_image_dimension_2d: properties.limits.max_image_dimension2_d,
            geometry_shader: features.geometry_shader == vk::TRUE,
            queue_family_count: families.len(),
            graphics_family,
            extensions_supported,
            properties,
            features,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DeviceScore {
    pub score: u64,
    pub graphics_family: u32,
}

/// The winner of device selection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DeviceSelection {
    pub index: usize,
    pub graphics_family: u32,
    /// `None` when the device was taken without scoring (pinned or sole).
    pub score: Option<u64>,
}

pub fn device_type_score(device_type: vk::PhysicalDeviceType) -> u64 {
    match device_type {
        vk::PhysicalDeviceType::DISCRETE_GPU => 10,
        vk::PhysicalDeviceType::VIRTUAL_GPU => 5,
        vk::PhysicalDeviceType::INTEGRATED_GPU => 2,
        vk::PhysicalDeviceType::CPU => 1,
        _ => 0,
    }
}

/// Scores one candidate. `None` disqualifies it.
///
/// The score is the device-type base plus the raw max 2D image dimension,
/// so large-texture devices are strongly favoured.
pub fn score_candidate(c: &PhysicalDeviceCandidate) -> Option<DeviceScore> {
    if c.queue_family_count == 0 {
        debug!("vk: {} skipped: no queue families", c.name);
        return None;
    }
    if !c.extensions_supported {
        debug!("vk: {} skipped: missing device extensions", c.name);
        return None;
    }
    let Some(graphics_family) = c.graphics_family else {
        debug!("vk: {} skipped: no graphics queue family", c.name);
        return None;
    };
    if !c.geometry_shader {
        debug!("vk: {} skipped: no geometry shader support", c.name);
        return None;
    }
    Some(DeviceScore {
        score: device_type_score(c.device_type) + u64::from(c.max_image_dimension_2d),
        graphics_family,
    })
}

/// Keeps the highest-scoring candidate; ties keep the earlier one.
/// `None` when every candidate is disqualified.
pub fn rank_devices<F>(candidates: &[PhysicalDeviceCandidate], mut scorer: F) -> Option<DeviceSelection>
where
    F: FnMut(&PhysicalDeviceCandidate) -> Option<DeviceScore>,
{
    let mut best: Option<DeviceSelection> = None;
    let mut best_score = 0;
    for (index, candidate) in candidates.iter().enumerate() {
        let Some(scored) = scorer(candidate) else {
            continue;
        };
        debug!("vk: {} scored {}", candidate.name, scored.score);
        if best.is_none() || scored.score > best_score {
            best_score = scored.score;
            best = Some(DeviceSelection {
                index,
                graphics_family: scored.graphics_family,
                score: Some(scored.score),
            });
        }
    }
    best
}

fn graphics_family_or_default(candidate: Option<&PhysicalDeviceCandidate>) -> u32 {
    match candidate.and_then(|c| c.graphics_family) {
        Some(family) => family,
        None => {
            warn!("vk: selected device has no graphics queue family; using family 0");
            0
        }
    }
}

/// Picks the device to use: a valid pin wins outright, a single device is
/// taken as is, otherwise every candidate goes through `scorer`. `None` for
/// an empty list or when scoring disqualifies every candidate.
pub fn select_device<F>(
    candidates: &[PhysicalDeviceCandidate],
    pin: Option<usize>,
    scorer: F,
) -> Option<DeviceSelection>
where
    F: FnMut(&PhysicalDeviceCandidate) -> Option<DeviceScore>,
{
    let direct = |index: usize| DeviceSelection {
        index,
        graphics_family: graphics_family_or_default(candidates.get(index)),
        score: None,
    };

    if candidates.is_empty() {
        return None;
    }
    if let Some(index) = pin {
        if index < candidates.len() {
            info!("vk: physical device pinned to index {index}");
            return Some(direct(index));
        }
        warn!(
            "vk: pinned physical device {index} is out of range ({} found); ignoring",
            candidates.len()
        );
    }
    if candidates.len() == 1 {
        return Some(direct(0));
    }
    rank_devices(candidates, scorer)
}

/// Enumerates GPUs, selects one and records it (with its graphics family)
/// in `ctx`.
pub(crate) fn select_physical_device(
    ctx: &mut RendererContext,
    driver: &mut dyn Driver,
    cfg: &RendererConfig,
) -> BootstrapResult {
    let instance = ctx
        .instance
        .ok_or(BootstrapError::MissingPrerequisite("instance"))?;

    let handles = driver.enumerate_physical_devices(instance).map_err(|e| {
        error!("vk: could not enumerate physical devices: {e}");
        BootstrapError::DeviceQuery(e)
    })?;
    if handles.is_empty() {
        error!("vk: could not find GPUs with Vulkan support");
        return Err(BootstrapError::NoPhysicalDevices);
    }

    let candidates: Vec<PhysicalDeviceCandidate> = handles
        .iter()
        .map(|&h| PhysicalDeviceCandidate::query(&*driver, h))
        .collect();

    let selection = select_device(&candidates, cfg.pin_physical_device, score_candidate)
        .ok_or_else(|| {
            error!("vk: none of the {} GPUs meets the requirements", candidates.len());
            BootstrapError::NoSuitableDevice
        })?;
    let winner = &candidates[selection.index];

    ctx.physical_device = Some(winner.handle);
    ctx.device_properties = winner.properties;
    ctx.device_features = winner.features;
    ctx.graphics_family = selection.graphics_family;

    info!(
        "vk: physical device {} selected ({:?}, score {:?}, graphics family {}) of {}",
        winner.name,
        winner.device_type,
        selection.score,
        selection.graphics_family,
        candidates.len()
    );
    Ok(())
}

/// One queue at priority 1.0 on `family`, the required device extensions and
/// the given feature set.
pub fn device_desc(family: u32, features: vk::PhysicalDeviceFeatures) -> DeviceDesc {
    DeviceDesc {
        queue_family: family,
        queue_priorities: vec![1.0],
        extensions: REQUIRED_DEVICE_EXTENSIONS
            .iter()
            .map(|e| (*e).to_owned())
            .collect(),
        features,
    }
}

pub(crate) fn create_logical_device(
    ctx: &mut RendererContext,
    driver: &mut dyn Driver,
) -> BootstrapResult {
    let physical = ctx
        .physical_device
        .ok_or(BootstrapError::MissingPrerequisite("physical device"))?;

    let desc = device_desc(ctx.graphics_family, ctx.device_features);
    let device = driver.create_device(physical, &desc).map_err(|e| {
        error!("vk: could not create logical device: {e}");
        BootstrapError::DeviceCreation(e)
    })?;
    ctx.device = Some(device);
    ctx.graphics_queue = Some(driver.device_queue(device, ctx.graphics_family, 0));

    info!("vk: logical device created (graphics family {})", ctx.graphics_family);
    Ok(())
}
