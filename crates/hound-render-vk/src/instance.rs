// SPDX-License-Identifier: CEPL-1.0
use std::ffi::{CStr, CString};

use ash::vk;
use tracing::{error, info, warn, Level};

use crate::config::RendererConfig;
use crate::context::{DebugMessenger, RendererContext};
use crate::driver::{Driver, InstanceDesc};
use crate::error::{BootstrapError, BootstrapResult};
use crate::support::{check_extension_support, check_layer_support, VALIDATION_LAYER};

pub const API_VERSION: u32 = vk::API_VERSION_1_2;

pub const DEBUG_SEVERITIES: vk::DebugUtilsMessageSeverityFlagsEXT =
    vk::DebugUtilsMessageSeverityFlagsEXT::from_raw(
        vk::DebugUtilsMessageSeverityFlagsEXT::VERBOSE.as_raw()
            | vk::DebugUtilsMessageSeverityFlagsEXT::WARNING.as_raw()
            | vk::DebugUtilsMessageSeverityFlagsEXT::ERROR.as_raw(),
    );

pub const DEBUG_MESSAGE_TYPES: vk::DebugUtilsMessageTypeFlagsEXT =
    vk::DebugUtilsMessageTypeFlagsEXT::from_raw(
        vk::DebugUtilsMessageTypeFlagsEXT::GENERAL.as_raw()
            | vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION.as_raw()
            | vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE.as_raw(),
    );

/// Log level a validation message is forwarded at; `None` drops it.
pub fn debug_message_level(severity: vk::DebugUtilsMessageSeverityFlagsEXT) -> Option<Level> {
    if severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::ERROR) {
        Some(Level::ERROR)
    } else if severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::WARNING) {
        Some(Level::WARN)
    } else {
        None
    }
}

fn map_instance_error(result: vk::Result) -> BootstrapError {
    match result {
        vk::Result::ERROR_INCOMPATIBLE_DRIVER => BootstrapError::IncompatibleDriver,
        other => BootstrapError::InstanceCreation(other),
    }
}

/// Instance extension list for this context: platform surface extensions,
/// plus debug utils when validation is on.
pub fn required_instance_extensions(ctx: &RendererContext, validation: bool) -> Vec<&'static CStr> {
    let mut exts = ctx.platform.instance_extensions().to_vec();
    if validation {
        exts.push(ash::ext::debug_utils::NAME);
    }
    exts
}

fn wants_validation(driver: &dyn Driver, cfg: &RendererConfig) -> bool {
    if !cfg.validation {
        return false;
    }
    let layers = match driver.instance_layers() {
        Ok(layers) => layers,
        Err(e) => {
            warn!("vk: layer enumeration failed ({e}); validation disabled");
            return false;
        }
    };
    if !check_layer_support(&[VALIDATION_LAYER], &layers).all_supported() {
        warn!("vk: validation requested but layers are missing; continuing without");
        return false;
    }
    true
}

/// Creates the instance (and the debug messenger when validation is active)
/// and stores both in `ctx`.
pub(crate) fn create_instance(
    ctx: &mut RendererContext,
    driver: &mut dyn Driver,
    cfg: &RendererConfig,
) -> BootstrapResult {
    if ctx.instance.is_some() {
        error!("vk: instance already created; call end_renderer first");
        return Err(BootstrapError::AlreadyCreated("instance"));
    }

    let supported = driver.instance_extensions().map_err(|e| {
        error!("vk: could not enumerate instance extensions: {e}");
        map_instance_error(e)
    })?;

    let mut validation = wants_validation(driver, cfg);
    let mut required = required_instance_extensions(ctx, validation);

    let report = check_extension_support(required.as_slice(), &supported);
    if !report.all_supported() {
        let fatal: Vec<String> = report
            .missing
            .iter()
            .filter(|m| m.as_c_str() != ash::ext::debug_utils::NAME)
            .map(|m| m.to_string_lossy().into_owned())
            .collect();
        if !fatal.is_empty() {
            error!("vk: surface extensions unavailable: {fatal:?}");
            return Err(BootstrapError::MissingInstanceExtensions(fatal));
        }
        warn!("vk: debug utils unavailable; validation disabled");
        validation = false;
        required.retain(|e| *e != ash::ext::debug_utils::NAME);
    }

    let desc = InstanceDesc {
        application_name: cstring(&cfg.application_name),
        application_version: cfg.packed_application_version(),
        engine_name: cstring(&cfg.engine_name),
        engine_version: cfg.packed_engine_version(),
        api_version: API_VERSION,
        extensions: required.iter().map(|e| (*e).to_owned()).collect(),
        layers: if validation {
            vec![VALIDATION_LAYER.to_owned()]
        } else {
            Vec::new()
        },
    };

    let instance = driver.create_instance(&desc).map_err(|e| {
        match e {
            vk::Result::ERROR_INCOMPATIBLE_DRIVER => {
                error!("vk: could not find a compatible Vulkan ICD; make sure your driver supports Vulkan")
            }
            _ => error!("vk: could not create instance: {e}"),
        }
        map_instance_error(e)
    })?;
    ctx.instance = Some(instance);
    ctx.validation_enabled = validation;
    info!(
        "vk: instance created (extensions={}, validation={validation})",
        desc.extensions.len()
    );

    if validation {
        ctx.messenger = match driver.create_debug_messenger(instance) {
            Ok(m) => {
                info!("vk: debug messenger created");
                DebugMessenger::Active(m)
            }
            Err(e) => {
                warn!("vk: could not create debug messenger: {e}");
                DebugMessenger::Disabled
            }
        };
    }
    Ok(())
}

/// Config strings never contain NULs in practice; any that do are cut there.
fn cstring(s: &str) -> CString {
    let bytes: Vec<u8> = s.bytes().take_while(|b| *b != 0).collect();
    CString::new(bytes).unwrap_or_default()
}
