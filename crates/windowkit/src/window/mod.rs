//! Window entity and callback table
//!
//! The window is the central entity: lifecycle flags, dimension constraints,
//! the scroll accumulator, the per-window input state, and the optional
//! callbacks the event pump dispatches into. The native half lives behind
//! the platform backend boundary and is owned by [`Window::native`].

use bitflags::bitflags;
use slotmap::new_key_type;

use crate::backend::PlatformWindow;
use crate::cursor::CursorStyle;
use crate::gfx::GraphicsConfig;
use crate::input::{InputState, Key, LockKey, MouseButton};

new_key_type! {
    /// Opaque generational handle to a window slot
    ///
    /// A destroyed handle's slot may be reused by a later create, but the
    /// stale handle carries the old generation and is rejected with an
    /// invalid-handle error rather than silently aliasing the new window.
    pub struct WindowId;
}

bitflags! {
    /// Last-known lifecycle/visibility flags for a window
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub(crate) struct WindowFlags: u8 {
        /// Window has been soft-closed (slot still live until destroy)
        const CLOSED = 1 << 0;
        /// Window is currently shown
        const VISIBLE = 1 << 1;
        /// Window was maximized at the last update
        const MAXIMIZED = 1 << 2;
        /// Window was minimized at the last update
        const MINIMIZED = 1 << 3;
        /// Window held input focus at the last update
        const FOCUSED = 1 << 4;
    }
}

/// Dimensions callback: client width and height in pixels
pub type SizeCallback = Box<dyn FnMut(WindowId, u32, u32)>;
/// Position callback: screen coordinates of the window origin
pub type PositionCallback = Box<dyn FnMut(WindowId, i32, i32)>;
/// Focus callback: true on gain, false on loss
pub type FocusCallback = Box<dyn FnMut(WindowId, bool)>;
/// Maximize callback: true on maximize, false on unmaximize
pub type MaximizeCallback = Box<dyn FnMut(WindowId, bool)>;
/// Minimize callback: true on minimize, false on restore
pub type MinimizeCallback = Box<dyn FnMut(WindowId, bool)>;
/// Keyboard callback: fired once per actual key transition
pub type KeyCallback = Box<dyn FnMut(WindowId, Key, bool)>;
/// Lock-state callback: fired once per actual indicator transition
pub type LockCallback = Box<dyn FnMut(WindowId, LockKey, bool)>;
/// Mouse-button callback
pub type ButtonCallback = Box<dyn FnMut(WindowId, MouseButton, bool)>;
/// Scroll callback: signed wheel delta in ±120 units per notch
pub type ScrollCallback = Box<dyn FnMut(WindowId, i32)>;

/// Optional per-window callback table
#[derive(Default)]
pub(crate) struct Callbacks {
    pub size: Option<SizeCallback>,
    pub position: Option<PositionCallback>,
    pub focus: Option<FocusCallback>,
    pub maximize: Option<MaximizeCallback>,
    pub minimize: Option<MinimizeCallback>,
    pub key: Option<KeyCallback>,
    pub lock: Option<LockCallback>,
    pub button: Option<ButtonCallback>,
    pub scroll: Option<ScrollCallback>,
}

/// A live window slot
pub(crate) struct Window {
    /// Platform half of the window
    pub native: Box<dyn PlatformWindow>,
    pub flags: WindowFlags,
    pub input: InputState,
    /// Signed scroll accumulator, adjusted by wheel deltas
    pub scroll: i32,
    pub min_size: Option<(u32, u32)>,
    pub max_size: Option<(u32, u32)>,
    pub cursor: CursorStyle,
    /// Cached title; the native title query is lossy on some platforms
    pub title: String,
    pub graphics: GraphicsConfig,
    /// Last position reported to the position callback
    pub last_pos: (i32, i32),
    pub callbacks: Callbacks,
}

impl Window {
    /// Wrap a freshly created native window
    pub fn new(
        native: Box<dyn PlatformWindow>,
        config: &crate::config::WindowConfig,
    ) -> Self {
        let mut flags = WindowFlags::empty();
        if config.visible {
            flags |= WindowFlags::VISIBLE;
        }
        let last_pos = native.position();
        Self {
            native,
            flags,
            input: InputState::default(),
            scroll: 0,
            min_size: config.min_size,
            max_size: config.max_size,
            cursor: config.cursor,
            title: config.title.clone(),
            graphics: config.graphics,
            last_pos,
            callbacks: Callbacks::default(),
        }
    }

    /// Clamp requested dimensions into this window's configured bounds
    pub fn clamp_dimensions(&self, width: u32, height: u32) -> (u32, u32) {
        let (mut w, mut h) = (width, height);
        if let Some((min_w, min_h)) = self.min_size {
            w = w.max(min_w);
            h = h.max(min_h);
        }
        if let Some((max_w, max_h)) = self.max_size {
            w = w.min(max_w);
            h = h.min(max_h);
        }
        (w, h)
    }
}
