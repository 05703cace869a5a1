// SPDX-License-Identifier: CEPL-1.0
use std::ffi::{CStr, CString};

use tracing::warn;

pub const VALIDATION_LAYER: &CStr = c"VK_LAYER_KHRONOS_validation";

/// Outcome of comparing a required name set against what the driver reports.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SupportReport {
    pub missing: Vec<CString>,
}

impl SupportReport {
    pub fn all_supported(&self) -> bool {
        self.missing.is_empty()
    }

    pub fn missing_names(&self) -> Vec<String> {
        self.missing
            .iter()
            .map(|n| n.to_string_lossy().into_owned())
            .collect()
    }
}

/// Checks that every `required` extension is in `supported`. Each missing
/// name is logged as a warning; the caller decides whether that is fatal.
pub fn check_extension_support<S: AsRef<CStr>>(
    required: &[S],
    supported: &[CString],
) -> SupportReport {
    missing_from("extension", required, supported)
}

/// Same as [`check_extension_support`] for layers, except that an empty
/// supported list short-circuits to "nothing supported".
pub fn check_layer_support<S: AsRef<CStr>>(required: &[S], supported: &[CString]) -> SupportReport {
    if supported.is_empty() {
        warn!("vk: driver reports no layers; validation layers unavailable");
        return SupportReport {
            missing: required
                .iter()
                .map(|n| {
                    let name: &CStr = n.as_ref();
                    name.to_owned()
                })
                .collect(),
        };
    }
    missing_from("layer", required, supported)
}

fn missing_from<S: AsRef<CStr>>(kind: &str, required: &[S], supported: &[CString]) -> SupportReport {
    let mut missing = Vec::new();
    for name in required {
        let name: &CStr = name.as_ref();
        if !supported.iter().any(|s| s.as_c_str() == name) {
            warn!("vk: {kind} not supported: {}", name.to_string_lossy());
            missing.push(name.to_owned());
        }
    }
    SupportReport { missing }
}
