//! Backend-agnostic platform traits
//!
//! This module defines the internal capability interface that all platform
//! backends implement. It is not exposed to applications; it exists purely
//! so the registry, event translation, and input tracking stay identical
//! across the two structurally different native models (the Win32
//! message-callback model and the X11 polled-event model).
//!
//! # Design Philosophy
//! - **Internal Use Only**: these traits are `pub(crate)`
//! - **Complete Interface**: every operation the public surface needs
//! - **Backend Agnostic**: no platform types cross this boundary except the
//!   `raw-window-handle` escape hatch
//! - **Testable**: core logic runs against a scripted mock backend

use std::os::raw::c_void;

use raw_window_handle::{RawDisplayHandle, RawWindowHandle};

use crate::config::WindowConfig;
use crate::cursor::CursorStyle;
use crate::error::WindowKitResult;
use crate::gfx::GlContextConfig;
use crate::input::{Key, LockKey, MouseButton};

#[cfg(windows)]
pub(crate) mod win32;

#[cfg(all(unix, not(target_os = "macos")))]
pub(crate) mod x11;

#[cfg(test)]
pub(crate) mod mock;

/// A native event, already translated to platform-neutral form
///
/// Backends emit these from [`PlatformWindow::pump`] in the order the
/// underlying native events were observed; the core applies them to input
/// state and dispatches callbacks without further platform knowledge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BackendEvent {
    /// The user asked the window to close (sets the closed flag only)
    CloseRequested,
    /// Client area dimensions as reported by the platform
    Resized {
        /// New client width in pixels
        width: u32,
        /// New client height in pixels
        height: u32,
    },
    /// Window origin moved; the core gates the callback on a real change
    Moved {
        /// Screen x of the window origin
        x: i32,
        /// Screen y of the window origin
        y: i32,
    },
    /// Input focus gained or lost
    FocusChanged(bool),
    /// Key transition; the core edge-detects against tracked state
    Key {
        /// Which key
        key: Key,
        /// Down or up
        pressed: bool,
    },
    /// Mouse button transition; dispatched immediately
    Button {
        /// Which button
        button: MouseButton,
        /// Down or up
        pressed: bool,
    },
    /// Wheel movement in ±120 units per notch
    Scroll {
        /// Signed delta
        delta: i32,
    },
    /// Current maximize/minimize state as seen by the platform
    ///
    /// Win32 derives this from the WM_SIZE reason; X11 queries the
    /// window-manager state hint once per pump. The core diffs against the
    /// last-known flags, so repeated hints never re-fire callbacks.
    StateHint {
        /// Window is maximized
        maximized: bool,
        /// Window is minimized
        minimized: bool,
    },
}

/// Process-wide platform backend
///
/// Owns whatever connection/registration state the platform needs and
/// manufactures windows. Exactly one exists per initialized
/// [`WindowSystem`](crate::system::WindowSystem).
pub(crate) trait PlatformBackend {
    /// Create a native window according to `config`
    ///
    /// Any native sub-step failure must release everything acquired for the
    /// attempt before returning the error.
    fn create_window(&mut self, config: &WindowConfig) -> WindowKitResult<Box<dyn PlatformWindow>>;

    /// Read clipboard text, if any is available
    fn clipboard_get(&mut self) -> WindowKitResult<Option<String>>;

    /// Publish clipboard text
    fn clipboard_set(&mut self, text: &str) -> WindowKitResult<()>;

    /// Resolve an OpenGL entry point by name
    ///
    /// Returns null for unknown symbols. On platforms where extension
    /// resolution needs a current context, the caller is responsible for
    /// having bound one.
    fn gl_proc_address(&self, name: &str) -> *const c_void;
}

/// Platform half of one window
///
/// Dropping the value releases the native window, its cursor resource, and
/// any graphics context still attached (unbinding first).
pub(crate) trait PlatformWindow {
    /// Drain currently-pending native events into `events`
    ///
    /// Synchronous and non-blocking: only events already queued are
    /// translated, the call never waits for new ones.
    fn pump(&mut self, events: &mut Vec<BackendEvent>);

    /// Poll the OS-global lock indicator state
    fn poll_locks(&mut self) -> [bool; LockKey::COUNT];

    /// Show the window
    fn show(&mut self);

    /// Hide the window
    fn hide(&mut self);

    /// Screen position of the window origin
    fn position(&self) -> (i32, i32);

    /// Move the window
    fn set_position(&mut self, x: i32, y: i32) -> WindowKitResult<()>;

    /// Client-area dimensions
    fn dimensions(&self) -> (u32, u32);

    /// Resize the client area (already clamped by the core)
    fn set_dimensions(&mut self, width: u32, height: u32) -> WindowKitResult<()>;

    /// Propagate min/max dimension constraints to the window manager
    fn set_size_limits(&mut self, min: Option<(u32, u32)>, max: Option<(u32, u32)>);

    /// Replace the title text
    fn set_title(&mut self, title: &str) -> WindowKitResult<()>;

    /// Request input focus
    fn focus(&mut self);

    /// Whether the window currently holds input focus
    fn is_focused(&self) -> bool;

    /// Maximize the window
    fn maximize(&mut self);

    /// Minimize (iconify) the window
    fn minimize(&mut self);

    /// Restore from maximized/minimized state
    fn restore(&mut self);

    /// Swap the native cursor resource and reassert it
    fn set_cursor_style(&mut self, style: CursorStyle) -> WindowKitResult<()>;

    /// Cursor position in client coordinates
    fn cursor_pos(&self) -> WindowKitResult<(i32, i32)>;

    /// Warp the cursor to client coordinates
    fn set_cursor_pos(&mut self, x: i32, y: i32) -> WindowKitResult<()>;

    /// Create the OpenGL context negotiated from `config`
    fn create_gl_context(&mut self, config: &GlContextConfig) -> WindowKitResult<()>;

    /// Unbind and delete the OpenGL context, if one exists
    fn destroy_gl_context(&mut self);

    /// Whether an OpenGL context is attached
    fn has_gl_context(&self) -> bool;

    /// Bind this window's context on the calling thread
    fn make_current(&mut self) -> WindowKitResult<()>;

    /// Release the current-context binding
    fn clear_current(&mut self);

    /// Present the back buffer
    fn swap_buffers(&mut self) -> WindowKitResult<()>;

    /// Native window handle for surface creation and caller escape hatch
    fn raw_window_handle(&self) -> RawWindowHandle;

    /// Native display handle for surface creation and caller escape hatch
    fn raw_display_handle(&self) -> RawDisplayHandle;
}

/// Build the backend for the running platform
pub(crate) fn native_backend() -> WindowKitResult<Box<dyn PlatformBackend>> {
    #[cfg(windows)]
    {
        Ok(Box::new(win32::Win32Backend::new()?))
    }
    #[cfg(all(unix, not(target_os = "macos")))]
    {
        Ok(Box::new(x11::X11Backend::new()?))
    }
    #[cfg(not(any(windows, all(unix, not(target_os = "macos")))))]
    {
        Err(crate::error::Error::Unsupported(
            "no windowing backend for this platform".to_string(),
        ))
    }
}
