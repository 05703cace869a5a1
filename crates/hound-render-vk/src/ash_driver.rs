// SPDX-License-Identifier: CEPL-1.0
use std::ffi::{c_char, CStr, CString};

use ash::ext::debug_utils;
use ash::khr::{surface, swapchain};
use ash::prelude::VkResult;
use ash::{vk, Entry};
use hound_render::SurfaceTarget;
use tracing::{error, warn, Level};

use crate::driver::{DeviceDesc, Driver, ImageViewDesc, InstanceDesc, SwapchainDesc};
use crate::error::{BootstrapError, BootstrapResult};
use crate::instance::{debug_message_level, DEBUG_MESSAGE_TYPES, DEBUG_SEVERITIES};

unsafe extern "system" fn debug_callback(
    severity: vk::DebugUtilsMessageSeverityFlagsEXT,
    types: vk::DebugUtilsMessageTypeFlagsEXT,
    data: *const vk::DebugUtilsMessengerCallbackDataEXT,
    _user: *mut std::os::raw::c_void,
) -> vk::Bool32 {
    let Some(level) = debug_message_level(severity) else {
        return vk::FALSE;
    };
    if data.is_null() {
        return vk::FALSE;
    }
    let p_message = unsafe { (*data).p_message };
    if p_message.is_null() {
        return vk::FALSE;
    }
    let msg = unsafe { CStr::from_ptr(p_message) }.to_string_lossy();
    if level == Level::ERROR {
        error!("[Vulkan {types:?}] {msg}");
    } else {
        warn!("[Vulkan {types:?}] {msg}");
    }
    vk::FALSE
}

fn owned_names<'a, I>(names: I) -> Vec<CString>
where
    I: IntoIterator<Item = Result<&'a CStr, std::ffi::FromBytesUntilNulError>>,
{
    names
        .into_iter()
        .filter_map(Result::ok)
        .map(CStr::to_owned)
        .collect()
}

fn name_ptrs(names: &[CString]) -> Vec<*const c_char> {
    names.iter().map(|n| n.as_ptr()).collect()
}

/// [`Driver`] over the system Vulkan loader.
///
/// Function tables are loaded as objects are created and dropped as they are
/// destroyed; calls that need a table which is not loaded fail with
/// `ERROR_INITIALIZATION_FAILED`.
pub struct AshDriver {
    entry: Entry,
    instance: Option<ash::Instance>,
    surface_fn: Option<surface::Instance>,
    debug_fn: Option<debug_utils::Instance>,
    device: Option<ash::Device>,
    swapchain_fn: Option<swapchain::Device>,
}

impl AshDriver {
    /// Opens the Vulkan loader. Fails when no loader/ICD is installed.
    pub fn load() -> BootstrapResult<Self> {
        let entry = unsafe { Entry::load() }.map_err(|e| {
            error!("vk: could not load the Vulkan loader: {e}");
            BootstrapError::LoaderUnavailable(e.to_string())
        })?;
        Ok(Self {
            entry,
            instance: None,
            surface_fn: None,
            debug_fn: None,
            device: None,
            swapchain_fn: None,
        })
    }

    fn instance(&self) -> VkResult<&ash::Instance> {
        self.instance
            .as_ref()
            .ok_or(vk::Result::ERROR_INITIALIZATION_FAILED)
    }

    fn device(&self) -> VkResult<&ash::Device> {
        self.device
            .as_ref()
            .ok_or(vk::Result::ERROR_INITIALIZATION_FAILED)
    }

    fn surface_fn(&self) -> VkResult<&surface::Instance> {
        self.surface_fn
            .as_ref()
            .ok_or(vk::Result::ERROR_INITIALIZATION_FAILED)
    }

    fn swapchain_fn(&self) -> VkResult<&swapchain::Device> {
        self.swapchain_fn
            .as_ref()
            .ok_or(vk::Result::ERROR_INITIALIZATION_FAILED)
    }
}

impl Driver for AshDriver {
    fn instance_extensions(&self) -> VkResult<Vec<CString>> {
        let props = unsafe { self.entry.enumerate_instance_extension_properties(None)? };
        Ok(owned_names(props.iter().map(|p| p.extension_name_as_c_str())))
    }

    fn instance_layers(&self) -> VkResult<Vec<CString>> {
        let props = unsafe { self.entry.enumerate_instance_layer_properties()? };
        Ok(owned_names(props.iter().map(|p| p.layer_name_as_c_str())))
    }

    fn create_instance(&mut self, desc: &InstanceDesc) -> VkResult<vk::Instance> {
        let extensions = name_ptrs(&desc.extensions);
        let layers = name_ptrs(&desc.layers);

        let app_info = vk::ApplicationInfo::default()
            .application_name(&desc.application_name)
            .application_version(desc.application_version)
            .engine_name(&desc.engine_name)
            .engine_version(desc.engine_version)
            .api_version(desc.api_version);

        let create_info = vk::InstanceCreateInfo::default()
            .application_info(&app_info)
            .enabled_extension_names(&extensions)
            .enabled_layer_names(&layers);

        let instance = unsafe { self.entry.create_instance(&create_info, None)? };

        self.surface_fn = Some(surface::Instance::new(&self.entry, &instance));
        if desc
            .extensions
            .iter()
            .any(|e| e.as_c_str() == debug_utils::NAME)
        {
            self.debug_fn = Some(debug_utils::Instance::new(&self.entry, &instance));
        }
        let handle = instance.handle();
        self.instance = Some(instance);
        Ok(handle)
    }

    fn destroy_instance(&mut self, instance: vk::Instance) {
        self.surface_fn = None;
        self.debug_fn = None;
        if let Some(owned) = self.instance.take() {
            debug_assert_eq!(owned.handle(), instance);
            unsafe { owned.destroy_instance(None) };
        }
    }

    fn create_debug_messenger(
        &mut self,
        _instance: vk::Instance,
    ) -> VkResult<vk::DebugUtilsMessengerEXT> {
        let loader = self
            .debug_fn
            .as_ref()
            .ok_or(vk::Result::ERROR_EXTENSION_NOT_PRESENT)?;
        let create_info = vk::DebugUtilsMessengerCreateInfoEXT::default()
            .message_severity(DEBUG_SEVERITIES)
            .message_type(DEBUG_MESSAGE_TYPES)
            .pfn_user_callback(Some(debug_callback));
        unsafe { loader.create_debug_utils_messenger(&create_info, None) }
    }

    fn destroy_debug_messenger(
        &mut self,
        _instance: vk::Instance,
        messenger: vk::DebugUtilsMessengerEXT,
    ) {
        if let Some(loader) = &self.debug_fn {
            unsafe { loader.destroy_debug_utils_messenger(messenger, None) };
        }
    }

    fn enumerate_physical_devices(
        &self,
        _instance: vk::Instance,
    ) -> VkResult<Vec<vk::PhysicalDevice>> {
        unsafe { self.instance()?.enumerate_physical_devices() }
    }

    fn physical_device_properties(&self, pd: vk::PhysicalDevice) -> vk::PhysicalDeviceProperties {
        match self.instance() {
            Ok(i) => unsafe { i.get_physical_device_properties(pd) },
            Err(_) => vk::PhysicalDeviceProperties::default(),
        }
    }

    fn physical_device_features(&self, pd: vk::PhysicalDevice) -> vk::PhysicalDeviceFeatures {
        match self.instance() {
            Ok(i) => unsafe { i.get_physical_device_features(pd) },
            Err(_) => vk::PhysicalDeviceFeatures::default(),
        }
    }

    fn queue_family_properties(&self, pd: vk::PhysicalDevice) -> Vec<vk::QueueFamilyProperties> {
        match self.instance() {
            Ok(i) => unsafe { i.get_physical_device_queue_family_properties(pd) },
            Err(_) => Vec::new(),
        }
    }

    fn device_extensions(&self, pd: vk::PhysicalDevice) -> VkResult<Vec<CString>> {
        let props = unsafe { self.instance()?.enumerate_device_extension_properties(pd)? };
        Ok(owned_names(props.iter().map(|p| p.extension_name_as_c_str())))
    }

    fn create_device(
        &mut self,
        pd: vk::PhysicalDevice,
        desc: &DeviceDesc,
    ) -> VkResult<vk::Device> {
        let instance = self
            .instance
            .as_ref()
            .ok_or(vk::Result::ERROR_INITIALIZATION_FAILED)?;
        let extensions = name_ptrs(&desc.extensions);

        let queue_info = vk::DeviceQueueCreateInfo::default()
            .queue_family_index(desc.queue_family)
            .queue_priorities(&desc.queue_priorities);

        let create_info = vk::DeviceCreateInfo::default()
            .queue_create_infos(std::slice::from_ref(&queue_info))
            .enabled_extension_names(&extensions)
            .enabled_features(&desc.features);

        let device = unsafe { instance.create_device(pd, &create_info, None)? };
        self.swapchain_fn = Some(swapchain::Device::new(instance, &device));
        let handle = device.handle();
        self.device = Some(device);
        Ok(handle)
    }

    fn device_queue(&self, _device: vk::Device, family: u32, index: u32) -> vk::Queue {
        match self.device() {
            Ok(d) => unsafe { d.get_device_queue(family, index) },
            Err(_) => vk::Queue::null(),
        }
    }

    fn destroy_device(&mut self, device: vk::Device) {
        self.swapchain_fn = None;
        if let Some(owned) = self.device.take() {
            debug_assert_eq!(owned.handle(), device);
            unsafe {
                owned.device_wait_idle().ok();
                owned.destroy_device(None);
            }
        }
    }

    fn create_surface(
        &mut self,
        _instance: vk::Instance,
        target: &SurfaceTarget,
    ) -> VkResult<vk::SurfaceKHR> {
        let instance = self.instance()?;
        unsafe {
            ash_window::create_surface(&self.entry, instance, target.display, target.window, None)
        }
    }

    fn surface_support(
        &self,
        pd: vk::PhysicalDevice,
        family: u32,
        surface: vk::SurfaceKHR,
    ) -> VkResult<bool> {
        unsafe {
            self.surface_fn()?
                .get_physical_device_surface_support(pd, family, surface)
        }
    }

    fn surface_capabilities(
        &self,
        pd: vk::PhysicalDevice,
        surface: vk::SurfaceKHR,
    ) -> VkResult<vk::SurfaceCapabilitiesKHR> {
        unsafe {
            self.surface_fn()?
                .get_physical_device_surface_capabilities(pd, surface)
        }
    }

    fn surface_formats(
        &self,
        pd: vk::PhysicalDevice,
        surface: vk::SurfaceKHR,
    ) -> VkResult<Vec<vk::SurfaceFormatKHR>> {
        unsafe { self.surface_fn()?.get_physical_device_surface_formats(pd, surface) }
    }

    fn surface_present_modes(
        &self,
        pd: vk::PhysicalDevice,
        surface: vk::SurfaceKHR,
    ) -> VkResult<Vec<vk::PresentModeKHR>> {
        unsafe {
            self.surface_fn()?
                .get_physical_device_surface_present_modes(pd, surface)
        }
    }

    fn destroy_surface(&mut self, _instance: vk::Instance, surface: vk::SurfaceKHR) {
        if let Some(loader) = &self.surface_fn {
            unsafe { loader.destroy_surface(surface, None) };
        }
    }

    fn create_swapchain(
        &mut self,
        _device: vk::Device,
        desc: &SwapchainDesc,
    ) -> VkResult<vk::SwapchainKHR> {
        let create_info = vk::SwapchainCreateInfoKHR::default()
            .surface(desc.surface)
            .min_image_count(desc.min_image_count)
            .image_format(desc.format.format)
            .image_color_space(desc.format.color_space)
            .image_extent(desc.extent)
            .image_array_layers(1)
            .image_usage(desc.usage)
            .image_sharing_mode(desc.sharing.mode)
            .queue_family_indices(&desc.sharing.families)
            .pre_transform(desc.pre_transform)
            .composite_alpha(desc.composite_alpha)
            .present_mode(desc.present_mode)
            .clipped(desc.clipped);
        unsafe { self.swapchain_fn()?.create_swapchain(&create_info, None) }
    }

    fn swapchain_images(
        &self,
        _device: vk::Device,
        swapchain: vk::SwapchainKHR,
    ) -> VkResult<Vec<vk::Image>> {
        unsafe { self.swapchain_fn()?.get_swapchain_images(swapchain) }
    }

    fn destroy_swapchain(&mut self, _device: vk::Device, swapchain: vk::SwapchainKHR) {
        if let Some(loader) = &self.swapchain_fn {
            unsafe { loader.destroy_swapchain(swapchain, None) };
        }
    }

    fn create_image_view(
        &mut self,
        _device: vk::Device,
        desc: &ImageViewDesc,
    ) -> VkResult<vk::ImageView> {
        let create_info = vk::ImageViewCreateInfo::default()
            .image(desc.image)
            .view_type(desc.view_type)
            .format(desc.format)
            .components(desc.components)
            .subresource_range(desc.subresource_range);
        unsafe { self.device()?.create_image_view(&create_info, None) }
    }

    fn destroy_image_view(&mut self, _device: vk::Device, view: vk::ImageView) {
        match self.device() {
            Ok(d) => unsafe { d.destroy_image_view(view, None) },
            Err(_) => warn!("vk: image view outlived its device"),
        }
    }
}
