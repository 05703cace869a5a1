// SPDX-License-Identifier: CEPL-1.0
use ash::vk;
use thiserror::Error;

/// Why a bootstrap stage stopped. Every variant is fatal for the stage that
/// returned it; resources created by earlier stages stay in the context and
/// are released by `end_renderer`.
#[derive(Debug, Error)]
pub enum BootstrapError {
    /// A stage was called before the one it depends on succeeded.
    #[error("{0} has not been created yet")]
    MissingPrerequisite(&'static str),

    /// The stage's handle already exists in the context. Tear down with
    /// `end_renderer` before running it again.
    #[error("{0} already exists")]
    AlreadyCreated(&'static str),

    /// No Vulkan loader/ICD could be found on this system.
    #[error("no Vulkan driver (ICD) found: {0}")]
    LoaderUnavailable(String),

    /// An ICD is installed but it cannot serve this instance.
    #[error("installed Vulkan driver is incompatible; make sure it supports Vulkan 1.2")]
    IncompatibleDriver,

    #[error("required instance extensions not supported: {0:?}")]
    MissingInstanceExtensions(Vec<String>),

    #[error("vkCreateInstance failed: {0}")]
    InstanceCreation(vk::Result),

    #[error("no GPU with Vulkan support found")]
    NoPhysicalDevices,

    /// GPUs exist but scoring disqualified every one of them.
    #[error("no GPU meets the requirements (graphics queue, geometry shaders, VK_KHR_swapchain)")]
    NoSuitableDevice,

    #[error("physical device query failed: {0}")]
    DeviceQuery(vk::Result),

    #[error("vkCreateDevice failed: {0}")]
    DeviceCreation(vk::Result),

    #[error("surface creation failed: {0}")]
    SurfaceCreation(vk::Result),

    #[error("surface query failed: {0}")]
    SurfaceQuery(vk::Result),

    #[error("surface reports no formats")]
    NoSurfaceFormats,

    #[error("surface reports no present modes")]
    NoPresentModes,

    #[error("vkCreateSwapchainKHR failed: {0}")]
    SwapchainCreation(vk::Result),

    #[error("swapchain returned {count} images, more than the supported {max}")]
    TooManySwapchainImages { count: usize, max: usize },

    #[error("image view {index} creation failed: {result}")]
    ImageViewCreation { index: usize, result: vk::Result },
}

pub type BootstrapResult<T = ()> = Result<T, BootstrapError>;
