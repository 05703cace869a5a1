// SPDX-License-Identifier: CEPL-1.0
//! The seam between the bootstrap stages and the native graphics driver.
//!
//! Stages never call Vulkan directly; they go through [`Driver`], which
//! [`crate::AshDriver`] implements over `ash`. Handles are passed by value
//! and owned by whoever holds the [`crate::RendererContext`].

use std::ffi::{CStr, CString};

use ash::prelude::VkResult;
use ash::vk;
use hound_render::SurfaceTarget;
use raw_window_handle::RawDisplayHandle;

#[derive(Clone, Debug)]
pub struct InstanceDesc {
    pub application_name: CString,
    pub application_version: u32,
    pub engine_name: CString,
    pub engine_version: u32,
    pub api_version: u32,
    pub extensions: Vec<CString>,
    pub layers: Vec<CString>,
}

#[derive(Clone, Debug)]
pub struct DeviceDesc {
    pub queue_family: u32,
    pub queue_priorities: Vec<f32>,
    pub extensions: Vec<CString>,
    pub features: vk::PhysicalDeviceFeatures,
}

/// Exclusive ownership lists one family; concurrent lists every family that
/// touches the images.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QueueSharing {
    pub mode: vk::SharingMode,
    pub families: Vec<u32>,
}

#[derive(Clone, Debug)]
pub struct SwapchainDesc {
    pub surface: vk::SurfaceKHR,
    pub min_image_count: u32,
    pub format: vk::SurfaceFormatKHR,
    pub extent: vk::Extent2D,
    pub usage: vk::ImageUsageFlags,
    pub sharing: QueueSharing,
    pub pre_transform: vk::SurfaceTransformFlagsKHR,
    pub composite_alpha: vk::CompositeAlphaFlagsKHR,
    pub present_mode: vk::PresentModeKHR,
    pub clipped: bool,
}

#[derive(Clone, Copy, Debug)]
pub struct ImageViewDesc {
    pub image: vk::Image,
    pub view_type: vk::ImageViewType,
    pub format: vk::Format,
    pub components: vk::ComponentMapping,
    pub subresource_range: vk::ImageSubresourceRange,
}

/// Window-system integration the instance must be able to present to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SurfacePlatform {
    Xcb,
    Xlib,
    Wayland,
    Win32,
    Metal,
    Android,
}

impl SurfacePlatform {
    /// The compile-time default: Win32 on Windows, Metal on Apple, XCB
    /// everywhere else.
    pub fn native() -> Self {
        if cfg!(windows) {
            Self::Win32
        } else if cfg!(any(target_os = "macos", target_os = "ios")) {
            Self::Metal
        } else if cfg!(target_os = "android") {
            Self::Android
        } else {
            Self::Xcb
        }
    }

    pub fn from_display(display: &RawDisplayHandle) -> Option<Self> {
        match display {
            RawDisplayHandle::Xcb(_) => Some(Self::Xcb),
            RawDisplayHandle::Xlib(_) => Some(Self::Xlib),
            RawDisplayHandle::Wayland(_) => Some(Self::Wayland),
            RawDisplayHandle::Windows(_) => Some(Self::Win32),
            RawDisplayHandle::AppKit(_) | RawDisplayHandle::UiKit(_) => Some(Self::Metal),
            RawDisplayHandle::Android(_) => Some(Self::Android),
            _ => None,
        }
    }

    /// The platform-specific surface extension.
    pub fn surface_extension(self) -> &'static CStr {
        match self {
            Self::Xcb => ash::khr::xcb_surface::NAME,
            Self::Xlib => ash::khr::xlib_surface::NAME,
            Self::Wayland => ash::khr::wayland_surface::NAME,
            Self::Win32 => ash::khr::win32_surface::NAME,
            Self::Metal => ash::ext::metal_surface::NAME,
            Self::Android => ash::khr::android_surface::NAME,
        }
    }

    /// `VK_KHR_surface` followed by the platform extension.
    pub fn instance_extensions(self) -> [&'static CStr; 2] {
        [ash::khr::surface::NAME, self.surface_extension()]
    }
}

pub trait Driver {
    // --- instance level ---
    fn instance_extensions(&self) -> VkResult<Vec<CString>>;
    fn instance_layers(&self) -> VkResult<Vec<CString>>;
    fn create_instance(&mut self, desc: &InstanceDesc) -> VkResult<vk::Instance>;
    fn destroy_instance(&mut self, instance: vk::Instance);

    fn create_debug_messenger(
        &mut self,
        instance: vk::Instance,
    ) -> VkResult<vk::DebugUtilsMessengerEXT>;
    fn destroy_debug_messenger(
        &mut self,
        instance: vk::Instance,
        messenger: vk::DebugUtilsMessengerEXT,
    );

    // --- physical devices ---
    fn enumerate_physical_devices(
        &self,
        instance: vk::Instance,
    ) -> VkResult<Vec<vk::PhysicalDevice>>;
    fn physical_device_properties(&self, pd: vk::PhysicalDevice) -> vk::PhysicalDeviceProperties;
    fn physical_device_features(&self, pd: vk::PhysicalDevice) -> vk::PhysicalDeviceFeatures;
    fn queue_family_properties(&self, pd: vk::PhysicalDevice) -> Vec<vk::QueueFamilyProperties>;
    fn device_extensions(&self, pd: vk::PhysicalDevice) -> VkResult<Vec<CString>>;

    // --- logical device ---
    fn create_device(&mut self, pd: vk::PhysicalDevice, desc: &DeviceDesc)
        -> VkResult<vk::Device>;
    fn device_queue(&self, device: vk::Device, family: u32, index: u32) -> vk::Queue;
    fn destroy_device(&mut self, device: vk::Device);

    // --- surface ---
    fn create_surface(
        &mut self,
        instance: vk::Instance,
        target: &SurfaceTarget,
    ) -> VkResult<vk::SurfaceKHR>;
    fn surface_support(
        &self,
        pd: vk::PhysicalDevice,
        family: u32,
        surface: vk::SurfaceKHR,
    ) -> VkResult<bool>;
    fn surface_capabilities(
        &self,
        pd: vk::PhysicalDevice,
        surface: vk::SurfaceKHR,
    ) -> VkResult<vk::SurfaceCapabilitiesKHR>;
    fn surface_formats(
        &self,
        pd: vk::PhysicalDevice,
        surface: vk::SurfaceKHR,
    ) -> VkResult<Vec<vk::SurfaceFormatKHR>>;
    fn surface_present_modes(
        &self,
        pd: vk::PhysicalDevice,
        surface: vk::SurfaceKHR,
    ) -> VkResult<Vec<vk::PresentModeKHR>>;
    fn destroy_surface(&mut self, instance: vk::Instance, surface: vk::SurfaceKHR);

    // --- swapchain ---
    fn create_swapchain(
        &mut self,
        device: vk::Device,
        desc: &SwapchainDesc,
    ) -> VkResult<vk::SwapchainKHR>;
    fn swapchain_images(
        &self,
        device: vk::Device,
        swapchain: vk::SwapchainKHR,
    ) -> VkResult<Vec<vk::Image>>;
    fn destroy_swapchain(&mut self, device: vk::Device, swapchain: vk::SwapchainKHR);

    fn create_image_view(
        &mut self,
        device: vk::Device,
        desc: &ImageViewDesc,
    ) -> VkResult<vk::ImageView>;
    fn destroy_image_view(&mut self, device: vk::Device, view: vk::ImageView);
}
