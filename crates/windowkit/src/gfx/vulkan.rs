//! Vulkan surface brokering
//!
//! Only the context/surface boundary is in scope: the caller owns the
//! instance, device selection, and everything downstream. The required
//! instance extensions are a pure per-platform query so they can be fed into
//! instance creation before any window exists.

use std::ffi::CStr;

use ash::vk;
use raw_window_handle::{RawDisplayHandle, RawWindowHandle};

use crate::error::{Error, WindowKitResult};

/// Instance extensions a caller must enable for surface creation
///
/// Platform-fixed: the generic surface extension plus the platform surface
/// extension. Available before instance creation, no window required.
#[must_use]
pub fn required_instance_extensions() -> Vec<&'static CStr> {
    #[cfg(windows)]
    {
        vec![
            ash::extensions::khr::Surface::name(),
            ash::extensions::khr::Win32Surface::name(),
        ]
    }
    #[cfg(all(unix, not(target_os = "macos")))]
    {
        vec![
            ash::extensions::khr::Surface::name(),
            ash::extensions::khr::XlibSurface::name(),
        ]
    }
    #[cfg(not(any(windows, all(unix, not(target_os = "macos")))))]
    {
        Vec::new()
    }
}

/// Wrap a window's native handle pair into a `vk::SurfaceKHR`
///
/// Failure is reported to the caller and is non-fatal to the window: the
/// window persists without a surface.
pub(crate) fn create_surface(
    entry: &ash::Entry,
    instance: &ash::Instance,
    display: RawDisplayHandle,
    window: RawWindowHandle,
    allocator: Option<&vk::AllocationCallbacks>,
) -> WindowKitResult<vk::SurfaceKHR> {
    unsafe { ash_window::create_surface(entry, instance, display, window, allocator) }
    .map_err(|e| Error::NativeCall {
        call: "vkCreateSurfaceKHR",
        detail: format!("{e:?}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_extensions_include_generic_surface() {
        let names = required_instance_extensions();
        assert!(names.contains(&ash::extensions::khr::Surface::name()));
        assert_eq!(names.len(), 2);
    }
}
