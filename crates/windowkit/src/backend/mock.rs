//! Scripted backend for exercising core logic without a display server
//!
//! Tests queue translated events on a window's shared state, call
//! `WindowSystem::update`, and observe callback dispatch and input tracking.
//! The controller half keeps `Rc` handles to every window the backend
//! creates, so tests keep access after ownership moves into the registry.

use std::cell::RefCell;
use std::os::raw::c_void;
use std::rc::Rc;

use raw_window_handle::{
    RawDisplayHandle, RawWindowHandle, Win32WindowHandle, WindowsDisplayHandle,
};

use super::{BackendEvent, PlatformBackend, PlatformWindow};
use crate::config::WindowConfig;
use crate::cursor::CursorStyle;
use crate::error::{Error, WindowKitResult};
use crate::gfx::GlContextConfig;
use crate::input::LockKey;

/// Observable state of one mock window
#[derive(Debug)]
pub(crate) struct MockShared {
    pub queued: Vec<BackendEvent>,
    pub locks: [bool; LockKey::COUNT],
    pub pos: (i32, i32),
    pub size: (u32, u32),
    pub min_size: Option<(u32, u32)>,
    pub max_size: Option<(u32, u32)>,
    pub visible: bool,
    pub focused: bool,
    pub title: String,
    pub cursor: CursorStyle,
    pub gl_context: bool,
    pub current: bool,
    pub swap_count: u32,
    pub alive: bool,
}

/// Test-side handles into the backend's created windows
pub(crate) struct MockController {
    windows: Rc<RefCell<Vec<Rc<RefCell<MockShared>>>>>,
    clipboard: Rc<RefCell<Option<String>>>,
}

impl MockController {
    /// Shared state of the `index`-th created window
    pub fn window(&self, index: usize) -> Rc<RefCell<MockShared>> {
        Rc::clone(&self.windows.borrow()[index])
    }

    /// Queue an event for the `index`-th created window
    pub fn push_event(&self, index: usize, event: BackendEvent) {
        self.window(index).borrow_mut().queued.push(event);
    }

    /// Current clipboard contents
    pub fn clipboard(&self) -> Option<String> {
        self.clipboard.borrow().clone()
    }
}

/// Backend that manufactures scripted windows
pub(crate) struct MockBackend {
    windows: Rc<RefCell<Vec<Rc<RefCell<MockShared>>>>>,
    clipboard: Rc<RefCell<Option<String>>>,
    /// Fail the next window creation outright
    pub fail_next_create: bool,
    /// Fail the next OpenGL context creation
    pub fail_next_gl: bool,
}

impl MockBackend {
    pub fn new() -> (Self, MockController) {
        let windows = Rc::new(RefCell::new(Vec::new()));
        let clipboard = Rc::new(RefCell::new(None));
        let controller = MockController {
            windows: Rc::clone(&windows),
            clipboard: Rc::clone(&clipboard),
        };
        (
            Self {
                windows,
                clipboard,
                fail_next_create: false,
                fail_next_gl: false,
            },
            controller,
        )
    }
}

impl PlatformBackend for MockBackend {
    fn create_window(&mut self, config: &WindowConfig) -> WindowKitResult<Box<dyn PlatformWindow>> {
        if self.fail_next_create {
            self.fail_next_create = false;
            return Err(Error::CreationFailed {
                stage: "mock window",
                detail: "scripted failure".to_string(),
            });
        }
        let shared = Rc::new(RefCell::new(MockShared {
            queued: Vec::new(),
            locks: [false; LockKey::COUNT],
            pos: config.position.unwrap_or((0, 0)),
            size: (config.width, config.height),
            min_size: config.min_size,
            max_size: config.max_size,
            visible: config.visible,
            focused: false,
            title: config.title.clone(),
            cursor: config.cursor,
            gl_context: false,
            current: false,
            swap_count: 0,
            alive: true,
        }));
        self.windows.borrow_mut().push(Rc::clone(&shared));
        Ok(Box::new(MockWindow {
            shared,
            fail_gl: std::mem::take(&mut self.fail_next_gl),
        }))
    }

    fn clipboard_get(&mut self) -> WindowKitResult<Option<String>> {
        Ok(self.clipboard.borrow().clone())
    }

    fn clipboard_set(&mut self, text: &str) -> WindowKitResult<()> {
        *self.clipboard.borrow_mut() = Some(text.to_string());
        Ok(())
    }

    fn gl_proc_address(&self, _name: &str) -> *const c_void {
        std::ptr::null()
    }
}

pub(crate) struct MockWindow {
    shared: Rc<RefCell<MockShared>>,
    fail_gl: bool,
}

impl Drop for MockWindow {
    fn drop(&mut self) {
        let mut shared = self.shared.borrow_mut();
        shared.alive = false;
        shared.gl_context = false;
        shared.current = false;
    }
}

impl PlatformWindow for MockWindow {
    fn pump(&mut self, events: &mut Vec<BackendEvent>) {
        events.append(&mut self.shared.borrow_mut().queued);
    }

    fn poll_locks(&mut self) -> [bool; LockKey::COUNT] {
        self.shared.borrow().locks
    }

    fn show(&mut self) {
        self.shared.borrow_mut().visible = true;
    }

    fn hide(&mut self) {
        self.shared.borrow_mut().visible = false;
    }

    fn position(&self) -> (i32, i32) {
        self.shared.borrow().pos
    }

    fn set_position(&mut self, x: i32, y: i32) -> WindowKitResult<()> {
        self.shared.borrow_mut().pos = (x, y);
        Ok(())
    }

    fn dimensions(&self) -> (u32, u32) {
        self.shared.borrow().size
    }

    fn set_dimensions(&mut self, width: u32, height: u32) -> WindowKitResult<()> {
        self.shared.borrow_mut().size = (width, height);
        Ok(())
    }

    fn set_size_limits(&mut self, min: Option<(u32, u32)>, max: Option<(u32, u32)>) {
        let mut shared = self.shared.borrow_mut();
        shared.min_size = min;
        shared.max_size = max;
    }

    fn set_title(&mut self, title: &str) -> WindowKitResult<()> {
        self.shared.borrow_mut().title = title.to_string();
        Ok(())
    }

    fn focus(&mut self) {
        self.shared.borrow_mut().focused = true;
    }

    fn is_focused(&self) -> bool {
        self.shared.borrow().focused
    }

    fn maximize(&mut self) {}

    fn minimize(&mut self) {}

    fn restore(&mut self) {}

    fn set_cursor_style(&mut self, style: CursorStyle) -> WindowKitResult<()> {
        self.shared.borrow_mut().cursor = style;
        Ok(())
    }

    fn cursor_pos(&self) -> WindowKitResult<(i32, i32)> {
        Ok((0, 0))
    }

    fn set_cursor_pos(&mut self, _x: i32, _y: i32) -> WindowKitResult<()> {
        Ok(())
    }

    fn create_gl_context(&mut self, _config: &GlContextConfig) -> WindowKitResult<()> {
        if self.fail_gl {
            return Err(Error::CreationFailed {
                stage: "mock OpenGL context",
                detail: "scripted failure".to_string(),
            });
        }
        self.shared.borrow_mut().gl_context = true;
        Ok(())
    }

    fn destroy_gl_context(&mut self) {
        let mut shared = self.shared.borrow_mut();
        shared.gl_context = false;
        shared.current = false;
    }

    fn has_gl_context(&self) -> bool {
        self.shared.borrow().gl_context
    }

    fn make_current(&mut self) -> WindowKitResult<()> {
        self.shared.borrow_mut().current = true;
        Ok(())
    }

    fn clear_current(&mut self) {
        self.shared.borrow_mut().current = false;
    }

    fn swap_buffers(&mut self) -> WindowKitResult<()> {
        self.shared.borrow_mut().swap_count += 1;
        Ok(())
    }

    fn raw_window_handle(&self) -> RawWindowHandle {
        RawWindowHandle::Win32(Win32WindowHandle::empty())
    }

    fn raw_display_handle(&self) -> RawDisplayHandle {
        RawDisplayHandle::Windows(WindowsDisplayHandle::empty())
    }
}
