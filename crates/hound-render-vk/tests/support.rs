// SPDX-License-Identifier: CEPL-1.0
mod common;

use common::count_warnings;
use hound_render_vk::{check_extension_support, check_layer_support, VALIDATION_LAYER};

#[test]
fn every_missing_extension_is_warned() {
    let supported = vec![c"VK_KHR_surface".to_owned(), c"VK_KHR_wayland_surface".to_owned()];
    let required = [c"VK_KHR_surface", c"VK_KHR_xcb_surface", c"VK_EXT_debug_utils"];
    let (report, warnings) = count_warnings(|| check_extension_support(&required, &supported));
    assert_eq!(report.missing.len(), 2);
    assert_eq!(warnings, report.missing.len());
}

#[test]
fn supported_extensions_log_nothing() {
    let supported = vec![c"VK_KHR_surface".to_owned(), c"VK_KHR_xcb_surface".to_owned()];
    let required = [c"VK_KHR_surface", c"VK_KHR_xcb_surface"];
    let (report, warnings) = count_warnings(|| check_extension_support(&required, &supported));
    assert!(report.all_supported());
    assert_eq!(warnings, 0);
}

#[test]
fn missing_layer_is_warned() {
    let supported = vec![c"VK_LAYER_MESA_overlay".to_owned()];
    let (report, warnings) = count_warnings(|| check_layer_support(&[VALIDATION_LAYER], &supported));
    assert_eq!(report.missing.len(), 1);
    assert_eq!(warnings, 1);
}

#[test]
fn empty_layer_list_warns_once() {
    let required = [VALIDATION_LAYER, c"VK_LAYER_LUNARG_api_dump"];
    let (report, warnings) = count_warnings(|| check_layer_support(&required, &[]));
    assert_eq!(report.missing.len(), 2);
    assert_eq!(warnings, 1);
}
