// SPDX-License-Identifier: CEPL-1.0
use ash::vk;
use hound_render::RenderSize;
use tracing::info;

use crate::driver::{Driver, SurfacePlatform};

/// Upper bound on swapchain images a context will accept.
pub const MAX_SWAPCHAIN_IMAGES: usize = 31;

/// Validation messenger state. `Disabled` is the no-op variant used when
/// validation is off or could not be set up.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DebugMessenger {
    #[default]
    Disabled,
    Active(vk::DebugUtilsMessengerEXT),
}

impl DebugMessenger {
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active(_))
    }

    fn destroy(&mut self, driver: &mut dyn Driver, instance: vk::Instance) {
        if let Self::Active(m) = std::mem::take(self) {
            driver.destroy_debug_messenger(instance, m);
        }
    }
}

/// Every handle the bootstrap pipeline creates, filled in stage by stage.
///
/// `None` means "not created (yet)". The context owns the handles but not
/// the driver; pass the same driver to [`end_renderer`] that created them.
#[derive(Debug)]
pub struct RendererContext {
    pub(crate) platform: SurfacePlatform,

    pub(crate) instance: Option<vk::Instance>,
    pub(crate) messenger: DebugMessenger,
    pub(crate) validation_enabled: bool,

    pub(crate) physical_device: Option<vk::PhysicalDevice>,
    pub(crate) device_properties: vk::PhysicalDeviceProperties,
    pub(crate) device_features: vk::PhysicalDeviceFeatures,
    pub(crate) graphics_family: u32,
    pub(crate) present_family: u32,

    pub(crate) device: Option<vk::Device>,
    pub(crate) graphics_queue: Option<vk::Queue>,

    pub(crate) surface: Option<vk::SurfaceKHR>,
    pub(crate) size_hint: RenderSize,
    pub(crate) surface_format: vk::SurfaceFormatKHR,
    pub(crate) present_mode: vk::PresentModeKHR,
    pub(crate) sharing_mode: vk::SharingMode,

    pub(crate) swapchain: Option<vk::SwapchainKHR>,
    pub(crate) extent: vk::Extent2D,
    pub(crate) images: Vec<vk::Image>,
    pub(crate) image_views: Vec<vk::ImageView>,
}

impl RendererContext {
    pub fn new(platform: SurfacePlatform) -> Self {
        Self {
            platform,
            instance: None,
            messenger: DebugMessenger::Disabled,
            validation_enabled: false,
            physical_device: None,
            device_properties: vk::PhysicalDeviceProperties::default(),
            device_features: vk::PhysicalDeviceFeatures::default(),
            graphics_family: 0,
            present_family: 0,
            device: None,
            graphics_queue: None,
            surface: None,
            size_hint: RenderSize {
                width: 0,
                height: 0,
            },
            surface_format: vk::SurfaceFormatKHR::default(),
            present_mode: vk::PresentModeKHR::FIFO,
            sharing_mode: vk::SharingMode::EXCLUSIVE,
            swapchain: None,
            extent: vk::Extent2D::default(),
            images: Vec::new(),
            image_views: Vec::new(),
        }
    }

    pub fn platform(&self) -> SurfacePlatform {
        self.platform
    }
    pub fn instance(&self) -> Option<vk::Instance> {
        self.instance
    }
    pub fn debug_messenger(&self) -> DebugMessenger {
        self.messenger
    }
    pub fn validation_enabled(&self) -> bool {
        self.validation_enabled
    }
    pub fn physical_device(&self) -> Option<vk::PhysicalDevice> {
        self.physical_device
    }
    pub fn device_properties(&self) -> &vk::PhysicalDeviceProperties {
        &self.device_properties
    }
    pub fn device_features(&self) -> &vk::PhysicalDeviceFeatures {
        &self.device_features
    }
    pub fn graphics_family(&self) -> u32 {
        self.graphics_family
    }
    pub fn present_family(&self) -> u32 {
        self.present_family
    }
    pub fn device(&self) -> Option<vk::Device> {
        self.device
    }
    pub fn graphics_queue(&self) -> Option<vk::Queue> {
        self.graphics_queue
    }
    pub fn surface(&self) -> Option<vk::SurfaceKHR> {
        self.surface
    }
    pub fn surface_format(&self) -> vk::SurfaceFormatKHR {
        self.surface_format
    }
    pub fn present_mode(&self) -> vk::PresentModeKHR {
        self.present_mode
    }
    pub fn sharing_mode(&self) -> vk::SharingMode {
        self.sharing_mode
    }
    pub fn swapchain(&self) -> Option<vk::SwapchainKHR> {
        self.swapchain
    }
    pub fn extent(&self) -> vk::Extent2D {
        self.extent
    }
    pub fn images(&self) -> &[vk::Image] {
        &self.images
    }
    pub fn image_views(&self) -> &[vk::ImageView] {
        &self.image_views
    }

    /// Destroys the views currently held, leaving the image list intact.
    pub(crate) fn destroy_image_views(&mut self, driver: &mut dyn Driver) {
        if let Some(device) = self.device {
            for view in self.image_views.drain(..) {
                driver.destroy_image_view(device, view);
            }
        } else {
            self.image_views.clear();
        }
    }

    /// Destroys the swapchain and its views; the surface stays.
    pub(crate) fn destroy_swapchain(&mut self, driver: &mut dyn Driver) {
        self.destroy_image_views(driver);
        if let Some(swapchain) = self.swapchain.take() {
            if let Some(device) = self.device {
                driver.destroy_swapchain(device, swapchain);
            }
        }
        self.images.clear();
    }

    /// Destroys the surface along with the swapchain built on it.
    pub(crate) fn destroy_surface(&mut self, driver: &mut dyn Driver) {
        self.destroy_swapchain(driver);
        if let Some(surface) = self.surface.take() {
            if let Some(instance) = self.instance {
                driver.destroy_surface(instance, surface);
            }
        }
    }
}

/// Releases everything in `ctx`, in reverse creation order:
/// debug messenger, image views, swapchain, surface, device, instance.
///
/// Safe to call after any partial failure and more than once; handles that
/// were never created are skipped.
pub fn end_renderer(ctx: &mut RendererContext, driver: &mut dyn Driver) {
    if let Some(instance) = ctx.instance {
        ctx.messenger.destroy(driver, instance);
    }
    ctx.messenger = DebugMessenger::Disabled;

    ctx.destroy_surface(driver);

    ctx.graphics_queue = None;
    if let Some(device) = ctx.device.take() {
        driver.destroy_device(device);
    }
    ctx.physical_device = None;

    if let Some(instance) = ctx.instance.take() {
        driver.destroy_instance(instance);
        info!("vk: renderer torn down");
    }
}
