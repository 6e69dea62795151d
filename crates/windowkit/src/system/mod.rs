//! Window registry, lifecycle, and event orchestration
//!
//! [`WindowSystem`] owns the platform backend and the window slot table.
//! All mutation on the primary path happens synchronously inside
//! [`update`](WindowSystem::update), [`create_window`](WindowSystem::create_window),
//! [`destroy_window`](WindowSystem::destroy_window), or a direct setter call;
//! there is no internal scheduler. The only background thread in the crate
//! is the X11 clipboard responder, owned by the backend.
//!
//! # Handle discipline
//!
//! Handles are generational slot-map keys. Destroying a window frees its
//! slot for reuse; a retained stale handle is reported as
//! [`Error::InvalidHandle`] by every operation (and reads as "up/off" from
//! the hot-path input getters), never aliased to a newer window.

use std::ffi::CStr;
use std::os::raw::c_void;
use std::sync::atomic::{AtomicBool, Ordering};

use ash::vk;
use log::{debug, error, warn};
use raw_window_handle::{RawDisplayHandle, RawWindowHandle};
use slotmap::SlotMap;

use crate::backend::{self, BackendEvent, PlatformBackend, PlatformWindow};
use crate::config::WindowConfig;
use crate::cursor::CursorStyle;
use crate::error::{Error, WindowKitResult};
use crate::gfx::{self, GlContextConfig, GlLoader, GraphicsConfig};
use crate::input::{Key, LockKey, MouseButton};
use crate::window::{Window, WindowFlags, WindowId};

/// Process-wide initialization guard
static INITIALIZED: AtomicBool = AtomicBool::new(false);

const LOCKS: [LockKey; LockKey::COUNT] =
    [LockKey::CapsLock, LockKey::NumLock, LockKey::ScrollLock];

pub(crate) fn claim_process_guard() -> WindowKitResult<()> {
    INITIALIZED
        .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
        .map(|_| ())
        .map_err(|_| Error::AlreadyInitialized)
}

pub(crate) fn release_process_guard() {
    INITIALIZED.store(false, Ordering::Release);
}

/// The windowing system: registry, event pump entry point, and public surface
pub struct WindowSystem {
    backend: Box<dyn PlatformBackend>,
    windows: SlotMap<WindowId, Window>,
    /// Window whose OpenGL context is current, if any
    current_gl: Option<WindowId>,
    owns_guard: bool,
}

impl WindowSystem {
    /// Initialize the windowing system
    ///
    /// Process-wide: initializing a second system while one is live is a
    /// reported error, not silently ignored.
    pub fn init() -> WindowKitResult<Self> {
        claim_process_guard()?;
        match backend::native_backend() {
            Ok(backend) => {
                debug!("window system initialized");
                Ok(Self {
                    backend,
                    windows: SlotMap::with_key(),
                    current_gl: None,
                    owns_guard: true,
                })
            }
            Err(e) => {
                release_process_guard();
                Err(e)
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn from_backend(backend: Box<dyn PlatformBackend>) -> Self {
        Self {
            backend,
            windows: SlotMap::with_key(),
            current_gl: None,
            owns_guard: false,
        }
    }

    /// Shut the system down, destroying any remaining windows
    ///
    /// Also performed on drop; the explicit form exists so shutdown has a
    /// place in the caller's control flow.
    pub fn terminate(mut self) -> WindowKitResult<()> {
        self.shutdown();
        Ok(())
    }

    fn shutdown(&mut self) {
        self.current_gl = None;
        let count = self.windows.len();
        if count > 0 {
            warn!("terminating with {count} window(s) still live");
        }
        for (_, mut window) in self.windows.drain() {
            window.native.clear_current();
            window.native.destroy_gl_context();
        }
        if self.owns_guard {
            self.owns_guard = false;
            release_process_guard();
            debug!("window system terminated");
        }
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Create a window according to `config`
    ///
    /// If an OpenGL context is requested it is created, made current, and
    /// handed to the configured loader before the handle is returned. Any
    /// sub-step failure unwinds everything acquired for this attempt; a
    /// partially-constructed window is never reachable through a handle.
    pub fn create_window(&mut self, config: &WindowConfig) -> WindowKitResult<WindowId> {
        debug!(
            "creating window '{}' ({}x{})",
            config.title, config.width, config.height
        );
        let mut native = self.backend.create_window(config)?;
        if let GraphicsConfig::OpenGl(gl_config) = config.graphics {
            // Unbind whichever context is current before the new one claims it.
            self.release_current_context();
            if let Err(e) = Self::attach_gl_context(
                self.backend.as_ref(),
                native.as_mut(),
                &gl_config,
                config.gl_loader,
            ) {
                error!("abandoning window '{}': {e}", config.title);
                return Err(e);
            }
        }
        let is_gl = config.graphics.is_opengl();
        let id = self.windows.insert(Window::new(native, config));
        if is_gl {
            self.current_gl = Some(id);
        }
        Ok(id)
    }

    fn attach_gl_context(
        backend: &dyn PlatformBackend,
        native: &mut dyn PlatformWindow,
        gl_config: &GlContextConfig,
        loader: Option<GlLoader>,
    ) -> WindowKitResult<()> {
        native.create_gl_context(gl_config)?;
        if let Err(e) = native.make_current() {
            native.destroy_gl_context();
            return Err(e);
        }
        if let Some(loader) = loader {
            let resolver = |name: &str| backend.gl_proc_address(name);
            if !loader(&resolver) {
                native.clear_current();
                native.destroy_gl_context();
                return Err(Error::LoaderFailed);
            }
        }
        Ok(())
    }

    /// Destroy a window and free its slot
    ///
    /// Unbinds the window's context if current, releases the context, the
    /// cursor resource, and the native window, then recycles the slot.
    pub fn destroy_window(&mut self, id: WindowId) -> WindowKitResult<()> {
        let mut window = self.windows.remove(id).ok_or(Error::InvalidHandle)?;
        if self.current_gl == Some(id) {
            self.current_gl = None;
            window.native.clear_current();
        }
        window.native.destroy_gl_context();
        debug!("destroyed window '{}'", window.title);
        Ok(())
    }

    /// Soft-close a window: hide it and set the closed flag
    ///
    /// The slot and native resources stay live until
    /// [`destroy_window`](Self::destroy_window).
    pub fn close_window(&mut self, id: WindowId) -> WindowKitResult<()> {
        let window = self.window_mut(id)?;
        window.native.hide();
        window.flags.remove(WindowFlags::VISIBLE);
        window.flags.insert(WindowFlags::CLOSED);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Event pump
    // ------------------------------------------------------------------

    /// Drain pending native events for a window and dispatch callbacks
    ///
    /// Synchronous and non-blocking: only already-queued events are
    /// processed. Callbacks fire in the order the underlying native events
    /// were observed; keyboard and lock callbacks fire at most once per
    /// actual bit transition. Lock-indicator state is polled globally on
    /// every call, independent of per-window event delivery.
    pub fn update(&mut self, id: WindowId) -> WindowKitResult<()> {
        let window = self.windows.get_mut(id).ok_or(Error::InvalidHandle)?;
        let mut events = Vec::new();
        window.native.pump(&mut events);
        for event in events {
            Self::apply_event(id, window, event);
        }
        let locks = window.native.poll_locks();
        for (index, &on) in locks.iter().enumerate() {
            let lock = LOCKS[index];
            if window.input.set_lock(lock, on) {
                if let Some(callback) = window.callbacks.lock.as_mut() {
                    callback(id, lock, on);
                }
            }
        }
        Ok(())
    }

    fn apply_event(id: WindowId, window: &mut Window, event: BackendEvent) {
        match event {
            BackendEvent::CloseRequested => {
                window.flags.insert(WindowFlags::CLOSED);
            }
            BackendEvent::Resized { width, height } => {
                if let Some(callback) = window.callbacks.size.as_mut() {
                    callback(id, width, height);
                }
            }
            BackendEvent::Moved { x, y } => {
                // Native move notifications are not reliably emitted only on
                // real moves; gate on an actual coordinate change.
                if (x, y) != window.last_pos {
                    window.last_pos = (x, y);
                    if let Some(callback) = window.callbacks.position.as_mut() {
                        callback(id, x, y);
                    }
                }
            }
            BackendEvent::FocusChanged(focused) => {
                window.flags.set(WindowFlags::FOCUSED, focused);
                if !focused {
                    // Flush all input to up/off. No key/button callbacks are
                    // synthesized for the flushed transitions.
                    window.input.flush();
                }
                if let Some(callback) = window.callbacks.focus.as_mut() {
                    callback(id, focused);
                }
            }
            BackendEvent::Key { key, pressed } => {
                if window.input.set_key(key, pressed) {
                    if let Some(callback) = window.callbacks.key.as_mut() {
                        callback(id, key, pressed);
                    }
                }
            }
            BackendEvent::Button { button, pressed } => {
                window.input.set_button(button, pressed);
                if let Some(callback) = window.callbacks.button.as_mut() {
                    callback(id, button, pressed);
                }
            }
            BackendEvent::Scroll { delta } => {
                window.scroll = window.scroll.saturating_add(delta);
                if let Some(callback) = window.callbacks.scroll.as_mut() {
                    callback(id, delta);
                }
            }
            BackendEvent::StateHint {
                maximized,
                minimized,
            } => {
                if maximized != window.flags.contains(WindowFlags::MAXIMIZED) {
                    window.flags.set(WindowFlags::MAXIMIZED, maximized);
                    if let Some(callback) = window.callbacks.maximize.as_mut() {
                        callback(id, maximized);
                    }
                }
                if minimized != window.flags.contains(WindowFlags::MINIMIZED) {
                    window.flags.set(WindowFlags::MINIMIZED, minimized);
                    if let Some(callback) = window.callbacks.minimize.as_mut() {
                        callback(id, minimized);
                    }
                }
            }
        }
    }

    // ------------------------------------------------------------------
    // Window state
    // ------------------------------------------------------------------

    fn window(&self, id: WindowId) -> WindowKitResult<&Window> {
        self.windows.get(id).ok_or(Error::InvalidHandle)
    }

    fn window_mut(&mut self, id: WindowId) -> WindowKitResult<&mut Window> {
        self.windows.get_mut(id).ok_or(Error::InvalidHandle)
    }

    /// Whether the window has been closed (softly or by the user)
    pub fn is_closed(&self, id: WindowId) -> WindowKitResult<bool> {
        Ok(self.window(id)?.flags.contains(WindowFlags::CLOSED))
    }

    /// Whether the window currently holds input focus
    pub fn is_focused(&self, id: WindowId) -> WindowKitResult<bool> {
        Ok(self.window(id)?.native.is_focused())
    }

    /// Whether the window is shown
    pub fn is_visible(&self, id: WindowId) -> WindowKitResult<bool> {
        Ok(self.window(id)?.flags.contains(WindowFlags::VISIBLE))
    }

    /// Show or hide the window
    pub fn set_visible(&mut self, id: WindowId, visible: bool) -> WindowKitResult<()> {
        let window = self.window_mut(id)?;
        if visible {
            window.native.show();
        } else {
            window.native.hide();
        }
        window.flags.set(WindowFlags::VISIBLE, visible);
        Ok(())
    }

    /// Last-known maximized state (refreshed by [`update`](Self::update))
    pub fn is_maximized(&self, id: WindowId) -> WindowKitResult<bool> {
        Ok(self.window(id)?.flags.contains(WindowFlags::MAXIMIZED))
    }

    /// Last-known minimized state (refreshed by [`update`](Self::update))
    pub fn is_minimized(&self, id: WindowId) -> WindowKitResult<bool> {
        Ok(self.window(id)?.flags.contains(WindowFlags::MINIMIZED))
    }

    /// Maximize the window
    ///
    /// The flag and callback follow on the next update, once the platform
    /// has actually applied the transition.
    pub fn maximize(&mut self, id: WindowId) -> WindowKitResult<()> {
        self.window_mut(id)?.native.maximize();
        Ok(())
    }

    /// Minimize (iconify) the window
    pub fn minimize(&mut self, id: WindowId) -> WindowKitResult<()> {
        self.window_mut(id)?.native.minimize();
        Ok(())
    }

    /// Restore the window from maximized/minimized state
    pub fn restore(&mut self, id: WindowId) -> WindowKitResult<()> {
        self.window_mut(id)?.native.restore();
        Ok(())
    }

    /// Screen position of the window origin
    pub fn position(&self, id: WindowId) -> WindowKitResult<(i32, i32)> {
        Ok(self.window(id)?.native.position())
    }

    /// Move the window
    pub fn set_position(&mut self, id: WindowId, x: i32, y: i32) -> WindowKitResult<()> {
        self.window_mut(id)?.native.set_position(x, y)
    }

    /// Client-area dimensions
    pub fn dimensions(&self, id: WindowId) -> WindowKitResult<(u32, u32)> {
        Ok(self.window(id)?.native.dimensions())
    }

    /// Resize the client area
    ///
    /// Requested dimensions are clamped into the window's configured
    /// min/max bounds before reaching the platform, so an out-of-range
    /// request never leaves the window below its minimum.
    pub fn set_dimensions(&mut self, id: WindowId, width: u32, height: u32) -> WindowKitResult<()> {
        let window = self.window_mut(id)?;
        let (w, h) = window.clamp_dimensions(width, height);
        if (w, h) != (width, height) {
            warn!("resize request {width}x{height} clamped to {w}x{h}");
        }
        window.native.set_dimensions(w, h)
    }

    /// The window's configured min/max dimension constraints
    pub fn size_limits(
        &self,
        id: WindowId,
    ) -> WindowKitResult<(Option<(u32, u32)>, Option<(u32, u32)>)> {
        let window = self.window(id)?;
        Ok((window.min_size, window.max_size))
    }

    /// Replace the window's min/max dimension constraints
    pub fn set_size_limits(
        &mut self,
        id: WindowId,
        min: Option<(u32, u32)>,
        max: Option<(u32, u32)>,
    ) -> WindowKitResult<()> {
        let window = self.window_mut(id)?;
        window.min_size = min;
        window.max_size = max;
        window.native.set_size_limits(min, max);
        Ok(())
    }

    /// Request input focus for the window
    pub fn focus_window(&mut self, id: WindowId) -> WindowKitResult<()> {
        self.window_mut(id)?.native.focus();
        Ok(())
    }

    /// Window title (cached copy of what was last set)
    pub fn title(&self, id: WindowId) -> WindowKitResult<String> {
        Ok(self.window(id)?.title.clone())
    }

    /// Replace the window title
    pub fn set_title(&mut self, id: WindowId, title: &str) -> WindowKitResult<()> {
        let window = self.window_mut(id)?;
        window.native.set_title(title)?;
        window.title = title.to_string();
        Ok(())
    }

    /// Cursor position in client coordinates
    pub fn cursor_pos(&self, id: WindowId) -> WindowKitResult<(i32, i32)> {
        self.window(id)?.native.cursor_pos()
    }

    /// Warp the cursor to client coordinates
    pub fn set_cursor_pos(&mut self, id: WindowId, x: i32, y: i32) -> WindowKitResult<()> {
        self.window_mut(id)?.native.set_cursor_pos(x, y)
    }

    /// Current cursor style
    pub fn cursor_style(&self, id: WindowId) -> WindowKitResult<CursorStyle> {
        Ok(self.window(id)?.cursor)
    }

    /// Swap the cursor style, releasing the previous native resource
    pub fn set_cursor_style(&mut self, id: WindowId, style: CursorStyle) -> WindowKitResult<()> {
        let window = self.window_mut(id)?;
        window.native.set_cursor_style(style)?;
        window.cursor = style;
        Ok(())
    }

    /// Signed scroll accumulator, adjusted by wheel deltas
    pub fn scroll_level(&self, id: WindowId) -> WindowKitResult<i32> {
        Ok(self.window(id)?.scroll)
    }

    /// Reset the scroll accumulator to a given level
    pub fn set_scroll_level(&mut self, id: WindowId, level: i32) -> WindowKitResult<()> {
        self.window_mut(id)?.scroll = level;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Input queries
    // ------------------------------------------------------------------

    /// Whether a key is down; `false` for an invalid handle
    #[must_use]
    pub fn key_down(&self, id: WindowId, key: Key) -> bool {
        self.windows.get(id).is_some_and(|w| w.input.key(key))
    }

    /// Whether a lock indicator is on; `false` for an invalid handle
    #[must_use]
    pub fn lock_on(&self, id: WindowId, lock: LockKey) -> bool {
        self.windows.get(id).is_some_and(|w| w.input.lock(lock))
    }

    /// Whether a mouse button is down; `false` for an invalid handle
    #[must_use]
    pub fn button_down(&self, id: WindowId, button: MouseButton) -> bool {
        self.windows.get(id).is_some_and(|w| w.input.button(button))
    }

    // ------------------------------------------------------------------
    // Callback registration
    // ------------------------------------------------------------------

    /// Set the dimensions callback
    pub fn set_size_callback(
        &mut self,
        id: WindowId,
        callback: impl FnMut(WindowId, u32, u32) + 'static,
    ) -> WindowKitResult<()> {
        self.window_mut(id)?.callbacks.size = Some(Box::new(callback));
        Ok(())
    }

    /// Set the position callback
    pub fn set_position_callback(
        &mut self,
        id: WindowId,
        callback: impl FnMut(WindowId, i32, i32) + 'static,
    ) -> WindowKitResult<()> {
        self.window_mut(id)?.callbacks.position = Some(Box::new(callback));
        Ok(())
    }

    /// Set the focus callback
    pub fn set_focus_callback(
        &mut self,
        id: WindowId,
        callback: impl FnMut(WindowId, bool) + 'static,
    ) -> WindowKitResult<()> {
        self.window_mut(id)?.callbacks.focus = Some(Box::new(callback));
        Ok(())
    }

    /// Set the maximize-transition callback
    pub fn set_maximize_callback(
        &mut self,
        id: WindowId,
        callback: impl FnMut(WindowId, bool) + 'static,
    ) -> WindowKitResult<()> {
        self.window_mut(id)?.callbacks.maximize = Some(Box::new(callback));
        Ok(())
    }

    /// Set the minimize-transition callback
    pub fn set_minimize_callback(
        &mut self,
        id: WindowId,
        callback: impl FnMut(WindowId, bool) + 'static,
    ) -> WindowKitResult<()> {
        self.window_mut(id)?.callbacks.minimize = Some(Box::new(callback));
        Ok(())
    }

    /// Set the keyboard callback (edge-triggered)
    pub fn set_key_callback(
        &mut self,
        id: WindowId,
        callback: impl FnMut(WindowId, Key, bool) + 'static,
    ) -> WindowKitResult<()> {
        self.window_mut(id)?.callbacks.key = Some(Box::new(callback));
        Ok(())
    }

    /// Set the lock-state callback (edge-triggered)
    pub fn set_lock_callback(
        &mut self,
        id: WindowId,
        callback: impl FnMut(WindowId, LockKey, bool) + 'static,
    ) -> WindowKitResult<()> {
        self.window_mut(id)?.callbacks.lock = Some(Box::new(callback));
        Ok(())
    }

    /// Set the mouse-button callback
    pub fn set_button_callback(
        &mut self,
        id: WindowId,
        callback: impl FnMut(WindowId, MouseButton, bool) + 'static,
    ) -> WindowKitResult<()> {
        self.window_mut(id)?.callbacks.button = Some(Box::new(callback));
        Ok(())
    }

    /// Set the scroll callback
    pub fn set_scroll_callback(
        &mut self,
        id: WindowId,
        callback: impl FnMut(WindowId, i32) + 'static,
    ) -> WindowKitResult<()> {
        self.window_mut(id)?.callbacks.scroll = Some(Box::new(callback));
        Ok(())
    }

    /// Drop every callback registered on the window
    pub fn clear_callbacks(&mut self, id: WindowId) -> WindowKitResult<()> {
        self.window_mut(id)?.callbacks = crate::window::Callbacks::default();
        Ok(())
    }

    // ------------------------------------------------------------------
    // Graphics
    // ------------------------------------------------------------------

    /// Present the back buffer; `Ok` no-op for non-OpenGL windows
    pub fn swap_buffers(&mut self, id: WindowId) -> WindowKitResult<()> {
        let window = self.window_mut(id)?;
        if !window.graphics.is_opengl() {
            return Ok(());
        }
        window.native.swap_buffers()
    }

    /// Bind the window's OpenGL context on the calling thread
    ///
    /// Whatever context was current is unbound first; there is never more
    /// than one current context.
    pub fn make_current(&mut self, id: WindowId) -> WindowKitResult<()> {
        if !self.window(id)?.native.has_gl_context() {
            return Err(Error::Unsupported(
                "window has no OpenGL context".to_string(),
            ));
        }
        if self.current_gl != Some(id) {
            self.release_current_context();
        }
        self.window_mut(id)?.native.make_current()?;
        self.current_gl = Some(id);
        Ok(())
    }

    /// Release the current OpenGL context binding, if any
    pub fn clear_current(&mut self) {
        self.release_current_context();
    }

    fn release_current_context(&mut self) {
        if let Some(prev) = self.current_gl.take() {
            if let Some(window) = self.windows.get_mut(prev) {
                window.native.clear_current();
            }
        }
    }

    /// Whether the window carries an OpenGL context
    pub fn has_gl_context(&self, id: WindowId) -> WindowKitResult<bool> {
        Ok(self.window(id)?.native.has_gl_context())
    }

    /// Resolve an OpenGL entry point by name; null for unknown symbols
    #[must_use]
    pub fn gl_proc_address(&self, name: &str) -> *const c_void {
        self.backend.gl_proc_address(name)
    }

    /// Instance extensions required for Vulkan surface creation
    ///
    /// A pure query, available before any window or instance exists.
    #[must_use]
    pub fn vulkan_required_extensions(&self) -> Vec<&'static CStr> {
        gfx::vulkan::required_instance_extensions()
    }

    /// Create a Vulkan surface for the window against a caller-owned instance
    ///
    /// Failure is non-fatal: the window persists without a surface.
    pub fn create_vulkan_surface(
        &self,
        id: WindowId,
        entry: &ash::Entry,
        instance: &ash::Instance,
        allocator: Option<&vk::AllocationCallbacks>,
    ) -> WindowKitResult<vk::SurfaceKHR> {
        let window = self.window(id)?;
        gfx::vulkan::create_surface(
            entry,
            instance,
            window.native.raw_display_handle(),
            window.native.raw_window_handle(),
            allocator,
        )
    }

    // ------------------------------------------------------------------
    // Native escape hatch
    // ------------------------------------------------------------------

    /// Raw native window handle for the running platform
    pub fn raw_window_handle(&self, id: WindowId) -> WindowKitResult<RawWindowHandle> {
        Ok(self.window(id)?.native.raw_window_handle())
    }

    /// Raw native display handle for the running platform
    pub fn raw_display_handle(&self, id: WindowId) -> WindowKitResult<RawDisplayHandle> {
        Ok(self.window(id)?.native.raw_display_handle())
    }

    // ------------------------------------------------------------------
    // Clipboard
    // ------------------------------------------------------------------

    /// Read clipboard text, if any is available
    ///
    /// On X11 this blocks the calling thread until the selection owner
    /// answers; the wait is unbounded when no cooperating owner exists,
    /// matching the inherited contract.
    pub fn clipboard_get(&mut self) -> WindowKitResult<Option<String>> {
        self.backend.clipboard_get()
    }

    /// Publish clipboard text
    ///
    /// On X11 this claims selection ownership and keeps a background
    /// responder alive to answer conversion requests; a subsequent call
    /// stops and joins the previous responder before starting its own.
    pub fn clipboard_set(&mut self, text: &str) -> WindowKitResult<()> {
        self.backend.clipboard_set(text)
    }
}

impl Drop for WindowSystem {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::backend::mock::{MockBackend, MockController};
    use crate::gfx::GlProfile;

    fn mock_system() -> (WindowSystem, MockController) {
        let (backend, controller) = MockBackend::new();
        (WindowSystem::from_backend(Box::new(backend)), controller)
    }

    #[test]
    fn test_process_guard_rejects_double_init() {
        claim_process_guard().expect("first claim");
        assert!(matches!(
            claim_process_guard(),
            Err(Error::AlreadyInitialized)
        ));
        release_process_guard();
        claim_process_guard().expect("claim after release");
        release_process_guard();
    }

    #[test]
    fn test_destroyed_handle_is_invalid_everywhere() {
        let (mut system, _controller) = mock_system();
        let id = system.create_window(&WindowConfig::default()).unwrap();
        system.destroy_window(id).unwrap();

        assert!(matches!(system.destroy_window(id), Err(Error::InvalidHandle)));
        assert!(matches!(system.update(id), Err(Error::InvalidHandle)));
        assert!(matches!(system.is_closed(id), Err(Error::InvalidHandle)));
        assert!(matches!(system.position(id), Err(Error::InvalidHandle)));
        assert!(matches!(
            system.set_title(id, "x"),
            Err(Error::InvalidHandle)
        ));
        // Hot-path input getters report "up" instead of erroring.
        assert!(!system.key_down(id, Key::A));
        assert!(!system.lock_on(id, LockKey::CapsLock));
        assert!(!system.button_down(id, MouseButton::Left));
    }

    #[test]
    fn test_stale_handle_never_aliases_reused_slot() {
        let (mut system, _controller) = mock_system();
        let first = system.create_window(&WindowConfig::new("first")).unwrap();
        system.destroy_window(first).unwrap();
        let second = system.create_window(&WindowConfig::new("second")).unwrap();

        assert_ne!(first, second);
        assert!(matches!(system.title(first), Err(Error::InvalidHandle)));
        assert_eq!(system.title(second).unwrap(), "second");
    }

    #[test]
    fn test_native_creation_failure_reports_error() {
        let (mut backend, _controller) = MockBackend::new();
        backend.fail_next_create = true;
        let mut system = WindowSystem::from_backend(Box::new(backend));
        assert!(matches!(
            system.create_window(&WindowConfig::default()),
            Err(Error::CreationFailed { .. })
        ));
        // A later create succeeds; the failed attempt left nothing behind.
        assert!(system.create_window(&WindowConfig::default()).is_ok());
    }

    #[test]
    fn test_close_keeps_slot_destroyable() {
        let (mut system, controller) = mock_system();
        let id = system.create_window(&WindowConfig::default()).unwrap();

        system.close_window(id).unwrap();
        assert!(system.is_closed(id).unwrap());
        assert!(!system.is_visible(id).unwrap());
        assert!(!controller.window(0).borrow().visible);
        // Still a live slot until destroy.
        assert!(system.update(id).is_ok());
        system.destroy_window(id).unwrap();
        assert!(!controller.window(0).borrow().alive);
    }

    #[test]
    fn test_repeated_key_down_fires_one_callback() {
        let (mut system, controller) = mock_system();
        let id = system.create_window(&WindowConfig::default()).unwrap();
        let log: Rc<RefCell<Vec<(Key, bool)>>> = Rc::default();
        let sink = Rc::clone(&log);
        system
            .set_key_callback(id, move |_, key, down| sink.borrow_mut().push((key, down)))
            .unwrap();

        for _ in 0..3 {
            controller.push_event(0, BackendEvent::Key { key: Key::X, pressed: true });
        }
        controller.push_event(0, BackendEvent::Key { key: Key::X, pressed: false });
        system.update(id).unwrap();

        assert_eq!(*log.borrow(), vec![(Key::X, true), (Key::X, false)]);
    }

    #[test]
    fn test_focus_loss_flushes_without_key_callbacks() {
        let (mut system, controller) = mock_system();
        let id = system.create_window(&WindowConfig::default()).unwrap();
        let keys: Rc<RefCell<Vec<(Key, bool)>>> = Rc::default();
        let focus: Rc<RefCell<Vec<bool>>> = Rc::default();
        let key_sink = Rc::clone(&keys);
        let focus_sink = Rc::clone(&focus);
        system
            .set_key_callback(id, move |_, key, down| {
                key_sink.borrow_mut().push((key, down));
            })
            .unwrap();
        system
            .set_focus_callback(id, move |_, gained| focus_sink.borrow_mut().push(gained))
            .unwrap();

        controller.push_event(0, BackendEvent::FocusChanged(true));
        controller.push_event(0, BackendEvent::Key { key: Key::W, pressed: true });
        controller.push_event(0, BackendEvent::Button {
            button: MouseButton::Left,
            pressed: true,
        });
        system.update(id).unwrap();
        assert!(system.key_down(id, Key::W));
        assert!(system.button_down(id, MouseButton::Left));

        controller.push_event(0, BackendEvent::FocusChanged(false));
        system.update(id).unwrap();

        assert!(!system.key_down(id, Key::W));
        assert!(!system.button_down(id, MouseButton::Left));
        // Exactly the one real transition; nothing synthesized by the flush.
        assert_eq!(*keys.borrow(), vec![(Key::W, true)]);
        assert_eq!(*focus.borrow(), vec![true, false]);
    }

    #[test]
    fn test_callbacks_fire_in_observation_order() {
        let (mut system, controller) = mock_system();
        let id = system.create_window(&WindowConfig::default()).unwrap();
        let order: Rc<RefCell<Vec<&'static str>>> = Rc::default();
        let a = Rc::clone(&order);
        let b = Rc::clone(&order);
        let c = Rc::clone(&order);
        system
            .set_size_callback(id, move |_, _, _| a.borrow_mut().push("size"))
            .unwrap();
        system
            .set_position_callback(id, move |_, _, _| b.borrow_mut().push("move"))
            .unwrap();
        system
            .set_scroll_callback(id, move |_, _| c.borrow_mut().push("scroll"))
            .unwrap();

        controller.push_event(0, BackendEvent::Resized { width: 640, height: 480 });
        controller.push_event(0, BackendEvent::Moved { x: 10, y: 20 });
        controller.push_event(0, BackendEvent::Scroll { delta: 120 });
        controller.push_event(0, BackendEvent::Resized { width: 320, height: 240 });
        system.update(id).unwrap();

        assert_eq!(*order.borrow(), vec!["size", "move", "scroll", "size"]);
    }

    #[test]
    fn test_position_callback_gated_on_real_moves() {
        let (mut system, controller) = mock_system();
        let id = system
            .create_window(&WindowConfig::default().position(10, 20))
            .unwrap();
        let moves: Rc<RefCell<Vec<(i32, i32)>>> = Rc::default();
        let sink = Rc::clone(&moves);
        system
            .set_position_callback(id, move |_, x, y| sink.borrow_mut().push((x, y)))
            .unwrap();

        // Same coordinates as creation: not a real move.
        controller.push_event(0, BackendEvent::Moved { x: 10, y: 20 });
        controller.push_event(0, BackendEvent::Moved { x: 30, y: 40 });
        controller.push_event(0, BackendEvent::Moved { x: 30, y: 40 });
        system.update(id).unwrap();

        assert_eq!(*moves.borrow(), vec![(30, 40)]);
    }

    #[test]
    fn test_scroll_accumulates_and_resets() {
        let (mut system, controller) = mock_system();
        let id = system.create_window(&WindowConfig::default()).unwrap();
        let deltas: Rc<RefCell<Vec<i32>>> = Rc::default();
        let sink = Rc::clone(&deltas);
        system
            .set_scroll_callback(id, move |_, delta| sink.borrow_mut().push(delta))
            .unwrap();

        controller.push_event(0, BackendEvent::Scroll { delta: 120 });
        controller.push_event(0, BackendEvent::Scroll { delta: 120 });
        controller.push_event(0, BackendEvent::Scroll { delta: -120 });
        system.update(id).unwrap();

        assert_eq!(system.scroll_level(id).unwrap(), 120);
        assert_eq!(*deltas.borrow(), vec![120, 120, -120]);

        system.set_scroll_level(id, 0).unwrap();
        assert_eq!(system.scroll_level(id).unwrap(), 0);
    }

    #[test]
    fn test_state_hints_edge_detect_transitions() {
        let (mut system, controller) = mock_system();
        let id = system.create_window(&WindowConfig::default()).unwrap();
        let transitions: Rc<RefCell<Vec<(&'static str, bool)>>> = Rc::default();
        let max_sink = Rc::clone(&transitions);
        let min_sink = Rc::clone(&transitions);
        system
            .set_maximize_callback(id, move |_, on| max_sink.borrow_mut().push(("max", on)))
            .unwrap();
        system
            .set_minimize_callback(id, move |_, on| min_sink.borrow_mut().push(("min", on)))
            .unwrap();

        controller.push_event(0, BackendEvent::StateHint { maximized: true, minimized: false });
        system.update(id).unwrap();
        // Same hint again: no transition, no callback.
        controller.push_event(0, BackendEvent::StateHint { maximized: true, minimized: false });
        system.update(id).unwrap();
        controller.push_event(0, BackendEvent::StateHint { maximized: false, minimized: true });
        system.update(id).unwrap();

        assert!(system.is_minimized(id).unwrap());
        assert!(!system.is_maximized(id).unwrap());
        assert_eq!(
            *transitions.borrow(),
            vec![("max", true), ("max", false), ("min", true)]
        );
    }

    #[test]
    fn test_lock_state_polled_edge_triggered() {
        let (mut system, controller) = mock_system();
        let id = system.create_window(&WindowConfig::default()).unwrap();
        let locks: Rc<RefCell<Vec<(LockKey, bool)>>> = Rc::default();
        let sink = Rc::clone(&locks);
        system
            .set_lock_callback(id, move |_, lock, on| sink.borrow_mut().push((lock, on)))
            .unwrap();

        controller.window(0).borrow_mut().locks = [true, false, false];
        system.update(id).unwrap();
        system.update(id).unwrap();
        controller.window(0).borrow_mut().locks = [true, true, false];
        system.update(id).unwrap();

        assert!(system.lock_on(id, LockKey::CapsLock));
        assert!(system.lock_on(id, LockKey::NumLock));
        assert!(!system.lock_on(id, LockKey::ScrollLock));
        assert_eq!(
            *locks.borrow(),
            vec![(LockKey::CapsLock, true), (LockKey::NumLock, true)]
        );
    }

    #[test]
    fn test_os_close_request_sets_flag_only() {
        let (mut system, controller) = mock_system();
        let id = system.create_window(&WindowConfig::default()).unwrap();

        controller.push_event(0, BackendEvent::CloseRequested);
        system.update(id).unwrap();

        assert!(system.is_closed(id).unwrap());
        // Not torn down: the slot answers and the native window is alive.
        assert!(controller.window(0).borrow().alive);
        system.destroy_window(id).unwrap();
    }

    #[test]
    fn test_set_dimensions_clamps_to_limits() {
        let (mut system, controller) = mock_system();
        let id = system
            .create_window(&WindowConfig::default().size(800, 600).min_size(400, 300))
            .unwrap();

        system.set_dimensions(id, 100, 100).unwrap();
        assert_eq!(system.dimensions(id).unwrap(), (400, 300));

        system
            .set_size_limits(id, Some((200, 150)), Some((640, 480)))
            .unwrap();
        system.set_dimensions(id, 5000, 5000).unwrap();
        assert_eq!(system.dimensions(id).unwrap(), (640, 480));
        assert_eq!(
            controller.window(0).borrow().min_size,
            Some((200, 150))
        );
    }

    #[test]
    fn test_gl_loader_failure_unwinds_window() {
        let (mut system, controller) = mock_system();
        let config = WindowConfig::new("gl")
            .graphics(GraphicsConfig::OpenGl(GlContextConfig::new(
                3,
                3,
                GlProfile::Core,
            )))
            .gl_loader(|_| false);

        let result = system.create_window(&config);
        assert!(matches!(result, Err(Error::LoaderFailed)));
        // The attempt's native window was released, nothing is reachable.
        assert!(!controller.window(0).borrow().alive);
        assert!(!controller.window(0).borrow().gl_context);
    }

    #[test]
    fn test_gl_context_failure_unwinds_window() {
        let (backend, controller) = MockBackend::new();
        let mut backend = backend;
        backend.fail_next_gl = true;
        let mut system = WindowSystem::from_backend(Box::new(backend));

        let config = WindowConfig::new("gl").graphics(GraphicsConfig::OpenGl(
            GlContextConfig::new(3, 3, GlProfile::Core),
        ));
        assert!(system.create_window(&config).is_err());
        assert!(!controller.window(0).borrow().alive);
    }

    #[test]
    fn test_current_context_discipline() {
        let (mut system, controller) = mock_system();
        let gl = GraphicsConfig::OpenGl(GlContextConfig::default());
        let a = system.create_window(&WindowConfig::new("a").graphics(gl)).unwrap();
        let b = system.create_window(&WindowConfig::new("b").graphics(gl)).unwrap();

        // Creation order: b's context claimed currency last.
        assert!(!controller.window(0).borrow().current);
        assert!(controller.window(1).borrow().current);

        system.make_current(a).unwrap();
        assert!(controller.window(0).borrow().current);
        assert!(!controller.window(1).borrow().current);

        system.clear_current();
        assert!(!controller.window(0).borrow().current);

        // Destroying the current window must not leave a dangling binding.
        system.make_current(b).unwrap();
        system.destroy_window(b).unwrap();
        system.make_current(a).unwrap();
        assert!(controller.window(0).borrow().current);
    }

    #[test]
    fn test_make_current_requires_a_context() {
        let (mut system, _controller) = mock_system();
        let id = system.create_window(&WindowConfig::default()).unwrap();
        assert!(matches!(system.make_current(id), Err(Error::Unsupported(_))));
    }

    #[test]
    fn test_swap_buffers_noop_without_gl() {
        let (mut system, controller) = mock_system();
        let plain = system.create_window(&WindowConfig::default()).unwrap();
        let gl = system
            .create_window(
                &WindowConfig::new("gl").graphics(GraphicsConfig::OpenGl(
                    GlContextConfig::default(),
                )),
            )
            .unwrap();

        system.swap_buffers(plain).unwrap();
        system.swap_buffers(gl).unwrap();
        assert_eq!(controller.window(0).borrow().swap_count, 0);
        assert_eq!(controller.window(1).borrow().swap_count, 1);
    }

    #[test]
    fn test_clipboard_roundtrip_preserves_utf8() {
        let (mut system, controller) = mock_system();
        let text = "héllo 👍";
        system.clipboard_set(text).unwrap();
        assert_eq!(controller.clipboard().as_deref(), Some(text));
        assert_eq!(system.clipboard_get().unwrap().as_deref(), Some(text));
    }

    #[test]
    fn test_cursor_and_title_setters() {
        let (mut system, controller) = mock_system();
        let id = system.create_window(&WindowConfig::new("before")).unwrap();

        system.set_cursor_style(id, CursorStyle::IBeam).unwrap();
        assert_eq!(system.cursor_style(id).unwrap(), CursorStyle::IBeam);
        assert_eq!(controller.window(0).borrow().cursor, CursorStyle::IBeam);

        system.set_title(id, "after").unwrap();
        assert_eq!(system.title(id).unwrap(), "after");
        assert_eq!(controller.window(0).borrow().title, "after");
    }

    #[test]
    fn test_terminate_destroys_remaining_windows() {
        let (mut system, controller) = mock_system();
        let _a = system.create_window(&WindowConfig::default()).unwrap();
        let _b = system.create_window(&WindowConfig::default()).unwrap();
        system.terminate().unwrap();
        assert!(!controller.window(0).borrow().alive);
        assert!(!controller.window(1).borrow().alive);
    }

    #[test]
    fn test_vulkan_extension_query_is_window_free() {
        let (system, _controller) = mock_system();
        let names = system.vulkan_required_extensions();
        assert_eq!(names.len(), 2);
    }
}
