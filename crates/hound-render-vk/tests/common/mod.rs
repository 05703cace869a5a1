// SPDX-License-Identifier: CEPL-1.0
#![allow(dead_code)]

use std::collections::HashSet;
use std::ffi::CString;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use ash::prelude::VkResult;
use ash::vk::{self, Handle};
use hound_render::{RenderSize, SurfaceTarget};
use hound_render_vk::{
    DeviceDesc, Driver, ImageViewDesc, InstanceDesc, SurfacePlatform, SwapchainDesc,
    VALIDATION_LAYER,
};
use raw_window_handle::{RawDisplayHandle, RawWindowHandle, XcbDisplayHandle, XcbWindowHandle};
use tracing::{Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

const GPU_BASE: u64 = 0x1000;

#[derive(Clone, Debug)]
pub struct MockGpu {
    pub device_type: vk::PhysicalDeviceType,
    pub max_image_dimension_2d: u32,
    pub geometry_shader: bool,
    pub families: Vec<vk::QueueFlags>,
    /// Families for which present support is reported.
    pub present_families: Vec<u32>,
    pub extensions: Vec<CString>,
}

impl MockGpu {
    /// A discrete GPU with one graphics+present family and the swapchain
    /// extension.
    pub fn discrete() -> Self {
        Self {
            device_type: vk::PhysicalDeviceType::DISCRETE_GPU,
            max_image_dimension_2d: 16384,
            geometry_shader: true,
            families: vec![vk::QueueFlags::GRAPHICS | vk::QueueFlags::COMPUTE],
            present_families: vec![0],
            extensions: vec![ash::khr::swapchain::NAME.to_owned()],
        }
    }

    pub fn integrated() -> Self {
        Self {
            device_type: vk::PhysicalDeviceType::INTEGRATED_GPU,
            max_image_dimension_2d: 8192,
            ..Self::discrete()
        }
    }
}

/// Which driver call should fail, and with what.
#[derive(Clone, Debug, Default)]
pub struct Failures {
    pub instance: Option<vk::Result>,
    pub enumerate: Option<vk::Result>,
    pub messenger: Option<vk::Result>,
    pub device: Option<vk::Result>,
    pub surface: Option<vk::Result>,
    pub swapchain: Option<vk::Result>,
    /// Index of the image view whose creation fails.
    pub view_at: Option<usize>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Event {
    CreateInstance,
    DestroyInstance,
    CreateMessenger,
    DestroyMessenger,
    CreateDevice,
    DestroyDevice,
    CreateSurface,
    DestroySurface,
    CreateSwapchain,
    DestroySwapchain,
    CreateView,
    DestroyView,
}

impl Event {
    pub fn is_destroy(self) -> bool {
        matches!(
            self,
            Self::DestroyInstance
                | Self::DestroyMessenger
                | Self::DestroyDevice
                | Self::DestroySurface
                | Self::DestroySwapchain
                | Self::DestroyView
        )
    }
}

/// In-memory [`Driver`] that hands out fake handles and records what was
/// asked of it.
#[derive(Debug)]
pub struct MockDriver {
    pub instance_extensions: Vec<CString>,
    pub layers: Vec<CString>,
    pub gpus: Vec<MockGpu>,
    pub capabilities: vk::SurfaceCapabilitiesKHR,
    pub formats: Vec<vk::SurfaceFormatKHR>,
    pub present_modes: Vec<vk::PresentModeKHR>,
    /// Images returned per swapchain; `None` means `min_image_count`.
    pub image_count: Option<usize>,
    pub fail: Failures,

    pub events: Vec<Event>,
    pub instance_desc: Option<InstanceDesc>,
    pub device_desc: Option<(vk::PhysicalDevice, DeviceDesc)>,
    pub swapchain_desc: Option<SwapchainDesc>,
    pub view_descs: Vec<ImageViewDesc>,
    /// Raw values of every handle created and not yet destroyed.
    pub live: HashSet<u64>,
    next_handle: u64,
}

impl MockDriver {
    /// Xcb platform extensions, validation available, one discrete GPU,
    /// one sRGB format, FIFO only, 2..=4 images and an 800x600 surface.
    pub fn healthy() -> Self {
        let extent = vk::Extent2D {
            width: 800,
            height: 600,
        };
        Self {
            instance_extensions: vec![
                ash::khr::surface::NAME.to_owned(),
                ash::khr::xcb_surface::NAME.to_owned(),
                ash::ext::debug_utils::NAME.to_owned(),
            ],
            layers: vec![VALIDATION_LAYER.to_owned()],
            gpus: vec![MockGpu::discrete()],
            capabilities: vk::SurfaceCapabilitiesKHR {
                min_image_count: 2,
                max_image_count: 4,
                current_extent: extent,
                min_image_extent: vk::Extent2D {
                    width: 1,
                    height: 1,
                },
                max_image_extent: vk::Extent2D {
                    width: 4096,
                    height: 4096,
                },
                max_image_array_layers: 1,
                current_transform: vk::SurfaceTransformFlagsKHR::IDENTITY,
                ..Default::default()
            },
            formats: vec![vk::SurfaceFormatKHR {
                format: vk::Format::B8G8R8A8_SRGB,
                color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
            }],
            present_modes: vec![vk::PresentModeKHR::FIFO],
            image_count: None,
            fail: Failures::default(),
            events: Vec::new(),
            instance_desc: None,
            device_desc: None,
            swapchain_desc: None,
            view_descs: Vec::new(),
            live: HashSet::new(),
            next_handle: 1,
        }
    }

    pub fn gpu_handle(index: usize) -> vk::PhysicalDevice {
        vk::PhysicalDevice::from_raw(GPU_BASE + index as u64)
    }

    pub fn destroy_events(&self) -> Vec<Event> {
        self.events.iter().copied().filter(|e| e.is_destroy()).collect()
    }

    pub fn count(&self, event: Event) -> usize {
        self.events.iter().filter(|e| **e == event).count()
    }

    fn gpu(&self, pd: vk::PhysicalDevice) -> Option<&MockGpu> {
        let index = pd.as_raw().checked_sub(GPU_BASE)?;
        self.gpus.get(index as usize)
    }

    fn mint<H: Handle>(&mut self) -> H {
        let raw = self.next_handle;
        self.next_handle += 1;
        self.live.insert(raw);
        H::from_raw(raw)
    }

    fn release<H: Handle>(&mut self, handle: H) {
        let raw = handle.as_raw();
        assert!(
            self.live.remove(&raw),
            "handle {raw:#x} destroyed twice or never created"
        );
    }
}

impl Driver for MockDriver {
    fn instance_extensions(&self) -> VkResult<Vec<CString>> {
        Ok(self.instance_extensions.clone())
    }

    fn instance_layers(&self) -> VkResult<Vec<CString>> {
        Ok(self.layers.clone())
    }

    fn create_instance(&mut self, desc: &InstanceDesc) -> VkResult<vk::Instance> {
        self.instance_desc = Some(desc.clone());
        if let Some(e) = self.fail.instance {
            return Err(e);
        }
        self.events.push(Event::CreateInstance);
        Ok(self.mint())
    }

    fn destroy_instance(&mut self, instance: vk::Instance) {
        self.events.push(Event::DestroyInstance);
        self.release(instance);
    }

    fn create_debug_messenger(
        &mut self,
        _instance: vk::Instance,
    ) -> VkResult<vk::DebugUtilsMessengerEXT> {
        if let Some(e) = self.fail.messenger {
            return Err(e);
        }
        self.events.push(Event::CreateMessenger);
        Ok(self.mint())
    }

    fn destroy_debug_messenger(
        &mut self,
        _instance: vk::Instance,
        messenger: vk::DebugUtilsMessengerEXT,
    ) {
        self.events.push(Event::DestroyMessenger);
        self.release(messenger);
    }

    fn enumerate_physical_devices(
        &self,
        _instance: vk::Instance,
    ) -> VkResult<Vec<vk::PhysicalDevice>> {
        if let Some(e) = self.fail.enumerate {
            return Err(e);
        }
        Ok((0..self.gpus.len()).map(Self::gpu_handle).collect())
    }

    fn physical_device_properties(&self, pd: vk::PhysicalDevice) -> vk::PhysicalDeviceProperties {
        let mut props = vk::PhysicalDeviceProperties::default();
        if let Some(gpu) = self.gpu(pd) {
            props.device_type = gpu.device_type;
            props.limits.max_image_dimension2_d = gpu.max_image_dimension_2d;
        }
        props
    }

    fn physical_device_features(&self, pd: vk::PhysicalDevice) -> vk::PhysicalDeviceFeatures {
        let mut features = vk::PhysicalDeviceFeatures::default();
        if self.gpu(pd).is_some_and(|g| g.geometry_shader) {
            features.geometry_shader = vk::TRUE;
        }
        features
    }

    fn queue_family_properties(&self, pd: vk::PhysicalDevice) -> Vec<vk::QueueFamilyProperties> {
        self.gpu(pd)
            .map(|g| {
                g.families
                    .iter()
                    .map(|&queue_flags| vk::QueueFamilyProperties {
                        queue_flags,
                        queue_count: 1,
                        ..Default::default()
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    fn device_extensions(&self, pd: vk::PhysicalDevice) -> VkResult<Vec<CString>> {
        Ok(self.gpu(pd).map(|g| g.extensions.clone()).unwrap_or_default())
    }

    fn create_device(
        &mut self,
        pd: vk::PhysicalDevice,
        desc: &DeviceDesc,
    ) -> VkResult<vk::Device> {
        self.device_desc = Some((pd, desc.clone()));
        if let Some(e) = self.fail.device {
            return Err(e);
        }
        self.events.push(Event::CreateDevice);
        Ok(self.mint())
    }

    fn device_queue(&self, _device: vk::Device, family: u32, _index: u32) -> vk::Queue {
        vk::Queue::from_raw(0x9000 + u64::from(family))
    }

    fn destroy_device(&mut self, device: vk::Device) {
        self.events.push(Event::DestroyDevice);
        self.release(device);
    }

    fn create_surface(
        &mut self,
        _instance: vk::Instance,
        _target: &SurfaceTarget,
    ) -> VkResult<vk::SurfaceKHR> {
        if let Some(e) = self.fail.surface {
            return Err(e);
        }
        self.events.push(Event::CreateSurface);
        Ok(self.mint())
    }

    fn surface_support(
        &self,
        pd: vk::PhysicalDevice,
        family: u32,
        _surface: vk::SurfaceKHR,
    ) -> VkResult<bool> {
        Ok(self
            .gpu(pd)
            .is_some_and(|g| g.present_families.contains(&family)))
    }

    fn surface_capabilities(
        &self,
        _pd: vk::PhysicalDevice,
        _surface: vk::SurfaceKHR,
    ) -> VkResult<vk::SurfaceCapabilitiesKHR> {
        Ok(self.capabilities)
    }

    fn surface_formats(
        &self,
        _pd: vk::PhysicalDevice,
        _surface: vk::SurfaceKHR,
    ) -> VkResult<Vec<vk::SurfaceFormatKHR>> {
        Ok(self.formats.clone())
    }

    fn surface_present_modes(
        &self,
        _pd: vk::PhysicalDevice,
        _surface: vk::SurfaceKHR,
    ) -> VkResult<Vec<vk::PresentModeKHR>> {
        Ok(self.present_modes.clone())
    }

    fn destroy_surface(&mut self, _instance: vk::Instance, surface: vk::SurfaceKHR) {
        self.events.push(Event::DestroySurface);
        self.release(surface);
    }

    fn create_swapchain(
        &mut self,
        _device: vk::Device,
        desc: &SwapchainDesc,
    ) -> VkResult<vk::SwapchainKHR> {
        self.swapchain_desc = Some(desc.clone());
        if let Some(e) = self.fail.swapchain {
            return Err(e);
        }
        self.events.push(Event::CreateSwapchain);
        Ok(self.mint())
    }

    fn swapchain_images(
        &self,
        _device: vk::Device,
        _swapchain: vk::SwapchainKHR,
    ) -> VkResult<Vec<vk::Image>> {
        let count = self.image_count.unwrap_or_else(|| {
            self.swapchain_desc
                .as_ref()
                .map_or(0, |d| d.min_image_count as usize)
        });
        // Swapchain images are owned by the swapchain, not tracked as live.
        Ok((0..count as u64)
            .map(|i| vk::Image::from_raw(0x10_0000 + i))
            .collect())
    }

    fn destroy_swapchain(&mut self, _device: vk::Device, swapchain: vk::SwapchainKHR) {
        self.events.push(Event::DestroySwapchain);
        self.release(swapchain);
    }

    fn create_image_view(
        &mut self,
        _device: vk::Device,
        desc: &ImageViewDesc,
    ) -> VkResult<vk::ImageView> {
        let index = self.view_descs.len();
        self.view_descs.push(*desc);
        if self.fail.view_at == Some(index) {
            return Err(vk::Result::ERROR_OUT_OF_DEVICE_MEMORY);
        }
        self.events.push(Event::CreateView);
        Ok(self.mint())
    }

    fn destroy_image_view(&mut self, _device: vk::Device, view: vk::ImageView) {
        self.events.push(Event::DestroyView);
        self.release(view);
    }
}

/// An XCB target; the mock never dereferences the handles.
pub fn xcb_target(width: u32, height: u32) -> SurfaceTarget {
    let display = RawDisplayHandle::Xcb(XcbDisplayHandle::new(None, 0));
    let window = RawWindowHandle::Xcb(XcbWindowHandle::new(std::num::NonZeroU32::MIN));
    SurfaceTarget {
        display,
        window,
        size: RenderSize { width, height },
    }
}

pub fn xcb_platform() -> SurfacePlatform {
    SurfacePlatform::Xcb
}

/// Counts WARN and ERROR events seen by the subscriber it is attached to.
struct WarnCounter(Arc<AtomicUsize>);

impl<S: Subscriber> Layer<S> for WarnCounter {
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        if *event.metadata().level() <= Level::WARN {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }
}

/// Runs `f` under a subscriber that counts warnings and errors.
pub fn count_warnings<R>(f: impl FnOnce() -> R) -> (R, usize) {
    let counter = Arc::new(AtomicUsize::new(0));
    let subscriber = tracing_subscriber::registry().with(WarnCounter(counter.clone()));
    let out = tracing::subscriber::with_default(subscriber, f);
    (out, counter.load(Ordering::SeqCst))
}
