// SPDX-License-Identifier: CEPL-1.0
use ash::vk;
use serde::Deserialize;

/// Knobs consumed by the bootstrap pipeline. Deserialised from the
/// `[renderer]` table of the app config; every field has a default.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RendererConfig {
    pub application_name: String,
    /// `[major, minor, patch]`
    pub application_version: [u32; 3],
    pub engine_name: String,
    pub engine_version: [u32; 3],
    /// Enables the Khronos validation layer and the debug messenger.
    pub validation: bool,
    /// Forces a physical device by enumeration index, bypassing scoring.
    /// Out-of-range values are ignored.
    pub pin_physical_device: Option<usize>,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            application_name: "Project made with Hound Engine".into(),
            application_version: [0, 0, 1],
            engine_name: "Hound".into(),
            engine_version: [0, 1, 0],
            validation: cfg!(debug_assertions),
            pin_physical_device: None,
        }
    }
}

impl RendererConfig {
    /// Applies `HOUND_VALIDATION` (0/1) and `HOUND_PICK_PHYSICAL_DEVICE`
    /// (an index) on top of `self`.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(
            std::env::var("HOUND_VALIDATION").ok().as_deref(),
            std::env::var("HOUND_PICK_PHYSICAL_DEVICE").ok().as_deref(),
        )
    }

    fn with_overrides(mut self, validation: Option<&str>, pick: Option<&str>) -> Self {
        match validation {
            Some("1") => self.validation = true,
            Some("0") => self.validation = false,
            Some(other) => tracing::warn!("HOUND_VALIDATION={other:?} ignored (expected 0 or 1)"),
            None => {}
        }
        if let Some(raw) = pick {
            match raw.trim().parse::<usize>() {
                Ok(index) => self.pin_physical_device = Some(index),
                Err(_) => tracing::warn!("HOUND_PICK_PHYSICAL_DEVICE={raw:?} is not an index; ignored"),
            }
        }
        self
    }

    pub(crate) fn packed_application_version(&self) -> u32 {
        pack_version(self.application_version)
    }

    pub(crate) fn packed_engine_version(&self) -> u32 {
        pack_version(self.engine_version)
    }
}

fn pack_version([major, minor, patch]: [u32; 3]) -> u32 {
    vk::make_api_version(0, major, minor, patch)
}
