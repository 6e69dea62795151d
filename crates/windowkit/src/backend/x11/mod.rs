//! X11 platform backend (the polled-event native model)
//!
//! Xlib is loaded at runtime through `x11-dl`, so the crate builds without
//! X11 development headers. One display connection backs every window; the
//! clipboard responder thread opens its own connection because Xlib handles
//! must not cross threads.
//!
//! Event delivery is pull-based: [`X11Window::pump`] drains the queue for
//! its window only, leaving other windows' events in place. Keyboard
//! callbacks are computed from a pre/post snapshot diff after the drain
//! loop, because a single poll may coalesce several key transitions.

pub(crate) mod clipboard;
pub(crate) mod glx;
pub(crate) mod keymap;

use std::ffi::CString;
use std::os::raw::{c_char, c_int, c_long, c_uchar, c_uint, c_ulong, c_void};
use std::ptr;
use std::rc::Rc;

use log::{debug, warn};
use raw_window_handle::{
    RawDisplayHandle, RawWindowHandle, XlibDisplayHandle, XlibWindowHandle,
};
use x11_dl::xlib;

use super::{BackendEvent, PlatformBackend, PlatformWindow};
use crate::config::WindowConfig;
use crate::cursor::CursorStyle;
use crate::error::{Error, WindowKitResult};
use crate::gfx::{GlContextConfig, GraphicsConfig};
use crate::input::{InputState, Key, LockKey, MouseButton};

/// Predefined atoms from Xatom.h
const XA_ATOM: xlib::Atom = 4;
const XA_CARDINAL: xlib::Atom = 6;
const XA_STRING: xlib::Atom = 31;

/// _NET_WM_STATE client-message actions
const NET_WM_STATE_REMOVE: c_long = 0;
const NET_WM_STATE_ADD: c_long = 1;

/// XSizeHints flag bits (from Xutil.h)
const P_POSITION: c_long = 1 << 2;
const P_MIN_SIZE: c_long = 1 << 4;
const P_MAX_SIZE: c_long = 1 << 5;

/// Cursor-font glyph indices (from cursorfont.h)
const XC_LEFT_PTR: c_uint = 68;
const XC_XTERM: c_uint = 152;
const XC_CROSSHAIR: c_uint = 34;
const XC_HAND2: c_uint = 60;
const XC_SB_H_DOUBLE_ARROW: c_uint = 108;
const XC_SB_V_DOUBLE_ARROW: c_uint = 116;
const XC_FLEUR: c_uint = 52;
const XC_WATCH: c_uint = 150;

const EVENT_MASK: c_long = xlib::KeyPressMask
    | xlib::KeyReleaseMask
    | xlib::ButtonPressMask
    | xlib::ButtonReleaseMask
    | xlib::StructureNotifyMask
    | xlib::FocusChangeMask
    | xlib::ExposureMask;

/// Interned atoms used across the backend
#[derive(Clone, Copy)]
pub(crate) struct Atoms {
    pub wm_protocols: xlib::Atom,
    pub wm_delete_window: xlib::Atom,
    pub net_wm_name: xlib::Atom,
    pub utf8_string: xlib::Atom,
    pub net_wm_state: xlib::Atom,
    pub net_wm_state_maximized_horz: xlib::Atom,
    pub net_wm_state_maximized_vert: xlib::Atom,
    pub net_wm_state_hidden: xlib::Atom,
    pub net_frame_extents: xlib::Atom,
    pub clipboard: xlib::Atom,
    pub targets: xlib::Atom,
    pub incr: xlib::Atom,
    /// Property on the requestor window used for selection transfers
    pub selection_property: xlib::Atom,
}

/// One Xlib display connection plus everything interned against it
pub(crate) struct Connection {
    pub xlib: xlib::Xlib,
    pub display: *mut xlib::Display,
    pub screen: c_int,
    pub root: xlib::Window,
    pub atoms: Atoms,
}

impl Connection {
    fn open() -> WindowKitResult<Self> {
        let lib = xlib::Xlib::open()
            .map_err(|e| Error::BackendUnavailable(format!("libX11 not loadable: {e}")))?;
        let display = unsafe { (lib.XOpenDisplay)(ptr::null()) };
        if display.is_null() {
            return Err(Error::BackendUnavailable(
                "cannot open X display".to_string(),
            ));
        }
        let screen = unsafe { (lib.XDefaultScreen)(display) };
        let root = unsafe { (lib.XRootWindow)(display, screen) };
        let atoms = {
            let intern = |name: &[u8]| -> xlib::Atom {
                unsafe { (lib.XInternAtom)(display, name.as_ptr().cast::<c_char>(), 0) }
            };
            Atoms {
                wm_protocols: intern(b"WM_PROTOCOLS\0"),
                wm_delete_window: intern(b"WM_DELETE_WINDOW\0"),
                net_wm_name: intern(b"_NET_WM_NAME\0"),
                utf8_string: intern(b"UTF8_STRING\0"),
                net_wm_state: intern(b"_NET_WM_STATE\0"),
                net_wm_state_maximized_horz: intern(b"_NET_WM_STATE_MAXIMIZED_HORZ\0"),
                net_wm_state_maximized_vert: intern(b"_NET_WM_STATE_MAXIMIZED_VERT\0"),
                net_wm_state_hidden: intern(b"_NET_WM_STATE_HIDDEN\0"),
                net_frame_extents: intern(b"_NET_FRAME_EXTENTS\0"),
                clipboard: intern(b"CLIPBOARD\0"),
                targets: intern(b"TARGETS\0"),
                incr: intern(b"INCR\0"),
                selection_property: intern(b"WINDOWKIT_SELECTION\0"),
            }
        };
        Ok(Self {
            xlib: lib,
            display,
            screen,
            root,
            atoms,
        })
    }

    /// Read a window property into a `c_long` vector, best-effort
    ///
    /// Returns `None` when the property is missing or has an unexpected
    /// 8/16-bit format.
    pub(crate) fn get_property_longs(
        &self,
        window: xlib::Window,
        property: xlib::Atom,
        prop_type: xlib::Atom,
        max_items: c_long,
    ) -> Option<Vec<c_long>> {
        let mut actual_type: xlib::Atom = 0;
        let mut actual_format: c_int = 0;
        let mut item_count: c_ulong = 0;
        let mut bytes_after: c_ulong = 0;
        let mut data: *mut c_uchar = ptr::null_mut();
        let status = unsafe {
            (self.xlib.XGetWindowProperty)(
                self.display,
                window,
                property,
                0,
                max_items,
                0,
                prop_type,
                &mut actual_type,
                &mut actual_format,
                &mut item_count,
                &mut bytes_after,
                &mut data,
            )
        };
        if status != 0 || data.is_null() {
            return None;
        }
        let result = if actual_format == 32 {
            let slice =
                unsafe { std::slice::from_raw_parts(data.cast::<c_long>(), item_count as usize) };
            Some(slice.to_vec())
        } else {
            None
        };
        unsafe { (self.xlib.XFree)(data.cast::<c_void>()) };
        result
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        unsafe { (self.xlib.XCloseDisplay)(self.display) };
    }
}

/// X11 backend: shared connection, lazy GLX, and the clipboard service
pub(crate) struct X11Backend {
    conn: Rc<Connection>,
    glx: Option<Rc<glx::GlxApi>>,
    clipboard: clipboard::ClipboardService,
    /// Hidden 1x1 window used as the selection requestor
    requestor: xlib::Window,
}

impl X11Backend {
    pub(crate) fn new() -> WindowKitResult<Self> {
        let conn = Rc::new(Connection::open()?);
        let requestor = unsafe {
            (conn.xlib.XCreateSimpleWindow)(conn.display, conn.root, 0, 0, 1, 1, 0, 0, 0)
        };
        if requestor == 0 {
            return Err(Error::BackendUnavailable(
                "cannot create clipboard requestor window".to_string(),
            ));
        }
        debug!("X11 backend up (screen {})", conn.screen);
        Ok(Self {
            conn,
            glx: None,
            clipboard: clipboard::ClipboardService::default(),
            requestor,
        })
    }

    fn glx(&mut self) -> WindowKitResult<Rc<glx::GlxApi>> {
        if let Some(api) = self.glx.as_ref() {
            return Ok(Rc::clone(api));
        }
        let api = Rc::new(glx::GlxApi::open()?);
        self.glx = Some(Rc::clone(&api));
        Ok(api)
    }
}

impl Drop for X11Backend {
    fn drop(&mut self) {
        unsafe {
            (self.conn.xlib.XDestroyWindow)(self.conn.display, self.requestor);
            (self.conn.xlib.XFlush)(self.conn.display);
        }
    }
}

impl PlatformBackend for X11Backend {
    fn create_window(&mut self, config: &WindowConfig) -> WindowKitResult<Box<dyn PlatformWindow>> {
        let setup = match config.graphics {
            GraphicsConfig::OpenGl(gl_config) => {
                let api = self.glx()?;
                Some((Rc::clone(&api), api.choose_config(&self.conn, &gl_config)?))
            }
            _ => None,
        };
        let window = X11Window::create(Rc::clone(&self.conn), setup, config)?;
        Ok(Box::new(window))
    }

    fn clipboard_get(&mut self) -> WindowKitResult<Option<String>> {
        clipboard::get(&self.conn, self.requestor)
    }

    fn clipboard_set(&mut self, text: &str) -> WindowKitResult<()> {
        self.clipboard.set(text)
    }

    fn gl_proc_address(&self, name: &str) -> *const c_void {
        self.glx
            .as_ref()
            .map_or(ptr::null(), |api| api.proc_address(name))
    }
}

/// A native X11 window and its attached resources
pub(crate) struct X11Window {
    conn: Rc<Connection>,
    window: xlib::Window,
    colormap: xlib::Colormap,
    glx: Option<Rc<glx::GlxApi>>,
    fb_config: Option<glx::FbConfig>,
    gl_context: Option<glx::ContextHandle>,
    cursor: xlib::Cursor,
    /// Client-area size, updated from ConfigureNotify
    size: (u32, u32),
    /// Shadow key state used for the post-drain snapshot diff
    shadow: InputState,
    /// Decoration extents (left, right, top, bottom), discovered lazily
    frame_extents: Option<(i32, i32, i32, i32)>,
    extents_probed: bool,
}

impl X11Window {
    fn create(
        conn: Rc<Connection>,
        setup: Option<(Rc<glx::GlxApi>, glx::VisualSetup)>,
        config: &WindowConfig,
    ) -> WindowKitResult<Self> {
        let x = &conn.xlib;
        let (pos_x, pos_y) = config.position.unwrap_or((0, 0));

        let mut attrs: xlib::XSetWindowAttributes = unsafe { std::mem::zeroed() };
        attrs.event_mask = EVENT_MASK;
        attrs.background_pixel = unsafe { (x.XBlackPixel)(conn.display, conn.screen) };
        attrs.border_pixel = 0;

        let mut colormap: xlib::Colormap = 0;
        let (depth, visual, value_mask) = if let Some((_, ref visual_setup)) = setup {
            colormap = unsafe {
                (x.XCreateColormap)(conn.display, conn.root, visual_setup.visual, xlib::AllocNone)
            };
            attrs.colormap = colormap;
            (
                visual_setup.depth,
                visual_setup.visual,
                xlib::CWColormap | xlib::CWEventMask | xlib::CWBackPixel | xlib::CWBorderPixel,
            )
        } else {
            (
                xlib::CopyFromParent as c_int,
                ptr::null_mut(),
                xlib::CWEventMask | xlib::CWBackPixel | xlib::CWBorderPixel,
            )
        };

        let window = unsafe {
            (x.XCreateWindow)(
                conn.display,
                conn.root,
                pos_x,
                pos_y,
                config.width,
                config.height,
                0,
                depth,
                xlib::InputOutput as c_uint,
                visual,
                value_mask,
                &mut attrs,
            )
        };
        if window == 0 {
            if colormap != 0 {
                unsafe { (x.XFreeColormap)(conn.display, colormap) };
            }
            return Err(Error::CreationFailed {
                stage: "XCreateWindow",
                detail: "server returned no window".to_string(),
            });
        }

        let mut this = Self {
            conn,
            window,
            colormap,
            glx: setup.as_ref().map(|(api, _)| Rc::clone(api)),
            fb_config: setup.as_ref().map(|(_, s)| s.fb_config),
            gl_context: None,
            cursor: 0,
            size: (config.width, config.height),
            shadow: InputState::default(),
            frame_extents: None,
            extents_probed: false,
        };

        // Opt in to the close-request protocol so the WM asks instead of
        // killing the connection.
        let mut delete_atom = this.conn.atoms.wm_delete_window;
        unsafe {
            (this.conn.xlib.XSetWMProtocols)(this.conn.display, window, &mut delete_atom, 1);
        }

        this.set_title(&config.title)?;
        this.apply_normal_hints(config.position, config.resizable, config);
        this.set_cursor_style(config.cursor)?;

        if config.visible {
            unsafe { (this.conn.xlib.XMapWindow)(this.conn.display, window) };
        }
        unsafe { (this.conn.xlib.XFlush)(this.conn.display) };
        debug!("created X11 window 0x{window:x}");
        Ok(this)
    }

    fn apply_normal_hints(
        &self,
        position: Option<(i32, i32)>,
        resizable: bool,
        config: &WindowConfig,
    ) {
        let mut hints: xlib::XSizeHints = unsafe { std::mem::zeroed() };
        if position.is_some() {
            hints.flags |= P_POSITION;
        }
        let (min, max) = if resizable {
            (config.min_size, config.max_size)
        } else {
            // A fixed-size window pins both bounds to the creation size.
            let fixed = Some((config.width, config.height));
            (fixed, fixed)
        };
        if let Some((w, h)) = min {
            hints.flags |= P_MIN_SIZE;
            hints.min_width = w as c_int;
            hints.min_height = h as c_int;
        }
        if let Some((w, h)) = max {
            hints.flags |= P_MAX_SIZE;
            hints.max_width = w as c_int;
            hints.max_height = h as c_int;
        }
        unsafe {
            (self.conn.xlib.XSetWMNormalHints)(self.conn.display, self.window, &mut hints);
        }
    }

    /// Root-relative origin of the client area
    fn client_origin(&self) -> (i32, i32) {
        let x = &self.conn.xlib;
        let mut out_x: c_int = 0;
        let mut out_y: c_int = 0;
        let mut child: xlib::Window = 0;
        unsafe {
            (x.XTranslateCoordinates)(
                self.conn.display,
                self.window,
                self.conn.root,
                0,
                0,
                &mut out_x,
                &mut out_y,
                &mut child,
            );
        }
        (out_x, out_y)
    }

    /// Attempt the one-shot decoration-extents discovery
    ///
    /// Best-effort: some window managers never publish the property, in
    /// which case positions are reported relative to the client area.
    fn probe_frame_extents(&mut self) {
        if self.extents_probed {
            return;
        }
        self.extents_probed = true;
        if let Some(longs) = self.conn.get_property_longs(
            self.window,
            self.conn.atoms.net_frame_extents,
            XA_CARDINAL,
            4,
        ) {
            if longs.len() == 4 {
                self.frame_extents =
                    Some((longs[0] as i32, longs[1] as i32, longs[2] as i32, longs[3] as i32));
            }
        }
        if self.frame_extents.is_none() {
            // Leave the flag set: the WM either answered or never will;
            // retrying every update would not change the answer.
            warn!("window manager did not report frame extents");
        }
    }

    /// Query the WM state hint and reduce it to maximized/minimized flags
    fn query_state_hint(&self) -> (bool, bool) {
        let atoms = self.conn.atoms;
        self.conn
            .get_property_longs(self.window, atoms.net_wm_state, XA_ATOM, 32)
            .map_or((false, false), |longs| {
                let has = |atom: xlib::Atom| longs.iter().any(|&v| v as xlib::Atom == atom);
                let maximized = has(atoms.net_wm_state_maximized_horz)
                    && has(atoms.net_wm_state_maximized_vert);
                (maximized, has(atoms.net_wm_state_hidden))
            })
    }

    fn send_wm_state(&self, action: c_long, first: xlib::Atom, second: xlib::Atom) {
        let x = &self.conn.xlib;
        let mut event: xlib::XEvent = unsafe { std::mem::zeroed() };
        unsafe {
            event.client_message.type_ = xlib::ClientMessage;
            event.client_message.send_event = 1;
            event.client_message.display = self.conn.display;
            event.client_message.window = self.window;
            event.client_message.message_type = self.conn.atoms.net_wm_state;
            event.client_message.format = 32;
            event.client_message.data.set_long(0, action);
            event.client_message.data.set_long(1, first as c_long);
            event.client_message.data.set_long(2, second as c_long);
            (x.XSendEvent)(
                self.conn.display,
                self.conn.root,
                0,
                xlib::SubstructureNotifyMask | xlib::SubstructureRedirectMask,
                &mut event,
            );
            (x.XFlush)(self.conn.display);
        }
    }

    fn translate(
        &mut self,
        event: &xlib::XEvent,
        touched: &mut Vec<Key>,
        events: &mut Vec<BackendEvent>,
    ) {
        match event.get_type() {
            xlib::Expose => {
                let (width, height) = self.size;
                events.push(BackendEvent::Resized { width, height });
            }
            xlib::ConfigureNotify => {
                let configure = unsafe { event.configure };
                self.size = (configure.width as u32, configure.height as u32);
                let (origin_x, origin_y) = if configure.send_event != 0 {
                    // Synthetic configure events already carry root coordinates.
                    (configure.x, configure.y)
                } else {
                    self.client_origin()
                };
                events.push(BackendEvent::Moved {
                    x: origin_x,
                    y: origin_y,
                });
            }
            xlib::KeyPress | xlib::KeyRelease => {
                let mut key_event = unsafe { event.key };
                let pressed = event.get_type() == xlib::KeyPress;
                let keysym =
                    unsafe { (self.conn.xlib.XLookupKeysym)(&mut key_event, 0) };
                if let Some(key) = keymap::keysym_to_key(keysym as c_uint) {
                    self.shadow.set_key(key, pressed);
                    if !touched.contains(&key) {
                        touched.push(key);
                    }
                }
            }
            xlib::ButtonPress | xlib::ButtonRelease => {
                let button_event = unsafe { event.button };
                let pressed = event.get_type() == xlib::ButtonPress;
                match button_event.button {
                    // Wheel notches arrive as button presses; convert to the
                    // shared ±120 units so both platforms accumulate alike.
                    4 if pressed => events.push(BackendEvent::Scroll { delta: 120 }),
                    5 if pressed => events.push(BackendEvent::Scroll { delta: -120 }),
                    4 | 5 => {}
                    other => {
                        if let Some(button) = Self::map_button(other) {
                            events.push(BackendEvent::Button { button, pressed });
                        }
                    }
                }
            }
            xlib::FocusIn => events.push(BackendEvent::FocusChanged(true)),
            xlib::FocusOut => {
                // Mirror the core's flush so post-refocus presses re-emit.
                self.shadow.flush();
                events.push(BackendEvent::FocusChanged(false));
            }
            xlib::ClientMessage => {
                let message = unsafe { event.client_message };
                if message.message_type == self.conn.atoms.wm_protocols
                    && message.data.get_long(0) as xlib::Atom
                        == self.conn.atoms.wm_delete_window
                {
                    events.push(BackendEvent::CloseRequested);
                }
            }
            _ => {}
        }
    }

    const fn map_button(button: c_uint) -> Option<MouseButton> {
        match button {
            1 => Some(MouseButton::Left),
            2 => Some(MouseButton::Middle),
            3 => Some(MouseButton::Right),
            8 => Some(MouseButton::X1),
            9 => Some(MouseButton::X2),
            _ => None,
        }
    }

    fn free_cursor(&mut self) {
        if self.cursor != 0 {
            unsafe { (self.conn.xlib.XFreeCursor)(self.conn.display, self.cursor) };
            self.cursor = 0;
        }
    }

    fn create_native_cursor(&self, style: CursorStyle) -> xlib::Cursor {
        let x = &self.conn.xlib;
        if style == CursorStyle::Hidden {
            // A 1x1 empty bitmap cursor; there is no "no cursor" in core X.
            let bits: [c_char; 1] = [0];
            unsafe {
                let pixmap = (x.XCreateBitmapFromData)(
                    self.conn.display,
                    self.window,
                    bits.as_ptr(),
                    1,
                    1,
                );
                let mut color: xlib::XColor = std::mem::zeroed();
                let cursor = (x.XCreatePixmapCursor)(
                    self.conn.display,
                    pixmap,
                    pixmap,
                    &mut color,
                    &mut color,
                    0,
                    0,
                );
                (x.XFreePixmap)(self.conn.display, pixmap);
                cursor
            }
        } else {
            let glyph = match style {
                CursorStyle::IBeam => XC_XTERM,
                CursorStyle::Crosshair => XC_CROSSHAIR,
                CursorStyle::Hand => XC_HAND2,
                CursorStyle::ResizeEw => XC_SB_H_DOUBLE_ARROW,
                CursorStyle::ResizeNs => XC_SB_V_DOUBLE_ARROW,
                CursorStyle::Move => XC_FLEUR,
                CursorStyle::Wait => XC_WATCH,
                CursorStyle::Arrow | CursorStyle::Hidden => XC_LEFT_PTR,
            };
            unsafe { (x.XCreateFontCursor)(self.conn.display, glyph) }
        }
    }
}

impl Drop for X11Window {
    fn drop(&mut self) {
        self.destroy_gl_context();
        self.free_cursor();
        let x = &self.conn.xlib;
        unsafe {
            (x.XDestroyWindow)(self.conn.display, self.window);
            if self.colormap != 0 {
                (x.XFreeColormap)(self.conn.display, self.colormap);
            }
            (x.XFlush)(self.conn.display);
        }
    }
}

impl PlatformWindow for X11Window {
    fn pump(&mut self, events: &mut Vec<BackendEvent>) {
        let conn = Rc::clone(&self.conn);
        let pre = self.shadow.clone();
        let mut touched: Vec<Key> = Vec::new();
        let mut event: xlib::XEvent = unsafe { std::mem::zeroed() };
        loop {
            let got = unsafe {
                (conn.xlib.XCheckWindowEvent)(conn.display, self.window, EVENT_MASK, &mut event)
                    != 0
                    || (conn.xlib.XCheckTypedWindowEvent)(
                        conn.display,
                        self.window,
                        xlib::ClientMessage,
                        &mut event,
                    ) != 0
            };
            if !got {
                break;
            }
            self.translate(&event, &mut touched, events);
        }
        // Keyboard emission is the pre/post snapshot diff: coalesced
        // press/release pairs inside one drain cancel out here.
        for key in touched {
            let down = self.shadow.key(key);
            if pre.key(key) != down {
                events.push(BackendEvent::Key { key, pressed: down });
            }
        }
        let (maximized, minimized) = self.query_state_hint();
        events.push(BackendEvent::StateHint {
            maximized,
            minimized,
        });
        self.probe_frame_extents();
    }

    fn poll_locks(&mut self) -> [bool; LockKey::COUNT] {
        let mut state: xlib::XKeyboardState = unsafe { std::mem::zeroed() };
        unsafe { (self.conn.xlib.XGetKeyboardControl)(self.conn.display, &mut state) };
        [
            state.led_mask & 1 != 0,
            state.led_mask & 2 != 0,
            state.led_mask & 4 != 0,
        ]
    }

    fn show(&mut self) {
        let x = &self.conn.xlib;
        unsafe {
            (x.XMapWindow)(self.conn.display, self.window);
            (x.XFlush)(self.conn.display);
        }
    }

    fn hide(&mut self) {
        let x = &self.conn.xlib;
        unsafe {
            (x.XUnmapWindow)(self.conn.display, self.window);
            (x.XFlush)(self.conn.display);
        }
    }

    fn position(&self) -> (i32, i32) {
        let (client_x, client_y) = self.client_origin();
        // Compensate for decorations when the WM told us their size.
        self.frame_extents.map_or((client_x, client_y), |(l, _, t, _)| {
            (client_x - l, client_y - t)
        })
    }

    fn set_position(&mut self, x_pos: i32, y_pos: i32) -> WindowKitResult<()> {
        let x = &self.conn.xlib;
        unsafe {
            (x.XMoveWindow)(self.conn.display, self.window, x_pos, y_pos);
            (x.XFlush)(self.conn.display);
        }
        Ok(())
    }

    fn dimensions(&self) -> (u32, u32) {
        let x = &self.conn.xlib;
        let mut attrs: xlib::XWindowAttributes = unsafe { std::mem::zeroed() };
        let status =
            unsafe { (x.XGetWindowAttributes)(self.conn.display, self.window, &mut attrs) };
        if status == 0 {
            return self.size;
        }
        (attrs.width as u32, attrs.height as u32)
    }

    fn set_dimensions(&mut self, width: u32, height: u32) -> WindowKitResult<()> {
        let x = &self.conn.xlib;
        unsafe {
            (x.XResizeWindow)(self.conn.display, self.window, width, height);
            (x.XFlush)(self.conn.display);
        }
        self.size = (width, height);
        Ok(())
    }

    fn set_size_limits(&mut self, min: Option<(u32, u32)>, max: Option<(u32, u32)>) {
        let mut hints: xlib::XSizeHints = unsafe { std::mem::zeroed() };
        if let Some((w, h)) = min {
            hints.flags |= P_MIN_SIZE;
            hints.min_width = w as c_int;
            hints.min_height = h as c_int;
        }
        if let Some((w, h)) = max {
            hints.flags |= P_MAX_SIZE;
            hints.max_width = w as c_int;
            hints.max_height = h as c_int;
        }
        unsafe {
            (self.conn.xlib.XSetWMNormalHints)(self.conn.display, self.window, &mut hints);
            (self.conn.xlib.XFlush)(self.conn.display);
        }
    }

    fn set_title(&mut self, title: &str) -> WindowKitResult<()> {
        let x = &self.conn.xlib;
        let c_title = CString::new(title)
            .map_err(|_| Error::Unsupported("title contains interior NUL".to_string()))?;
        unsafe {
            (x.XStoreName)(self.conn.display, self.window, c_title.as_ptr());
            (x.XChangeProperty)(
                self.conn.display,
                self.window,
                self.conn.atoms.net_wm_name,
                self.conn.atoms.utf8_string,
                8,
                xlib::PropModeReplace,
                title.as_ptr(),
                title.len() as c_int,
            );
            (x.XFlush)(self.conn.display);
        }
        Ok(())
    }

    fn focus(&mut self) {
        let x = &self.conn.xlib;
        unsafe {
            (x.XRaiseWindow)(self.conn.display, self.window);
            (x.XSetInputFocus)(
                self.conn.display,
                self.window,
                xlib::RevertToParent,
                xlib::CurrentTime,
            );
            (x.XFlush)(self.conn.display);
        }
    }

    fn is_focused(&self) -> bool {
        let x = &self.conn.xlib;
        let mut focused: xlib::Window = 0;
        let mut revert: c_int = 0;
        unsafe { (x.XGetInputFocus)(self.conn.display, &mut focused, &mut revert) };
        focused == self.window
    }

    fn maximize(&mut self) {
        self.send_wm_state(
            NET_WM_STATE_ADD,
            self.conn.atoms.net_wm_state_maximized_horz,
            self.conn.atoms.net_wm_state_maximized_vert,
        );
    }

    fn minimize(&mut self) {
        let x = &self.conn.xlib;
        unsafe {
            (x.XIconifyWindow)(self.conn.display, self.window, self.conn.screen);
            (x.XFlush)(self.conn.display);
        }
    }

    fn restore(&mut self) {
        self.send_wm_state(
            NET_WM_STATE_REMOVE,
            self.conn.atoms.net_wm_state_maximized_horz,
            self.conn.atoms.net_wm_state_maximized_vert,
        );
        let x = &self.conn.xlib;
        unsafe {
            // Mapping deiconifies; harmless when already mapped.
            (x.XMapWindow)(self.conn.display, self.window);
            (x.XFlush)(self.conn.display);
        }
    }

    fn set_cursor_style(&mut self, style: CursorStyle) -> WindowKitResult<()> {
        let cursor = self.create_native_cursor(style);
        if cursor == 0 {
            return Err(Error::NativeCall {
                call: "XCreateFontCursor",
                detail: "no cursor resource".to_string(),
            });
        }
        self.free_cursor();
        self.cursor = cursor;
        let x = &self.conn.xlib;
        unsafe {
            (x.XDefineCursor)(self.conn.display, self.window, cursor);
            (x.XFlush)(self.conn.display);
        }
        Ok(())
    }

    fn cursor_pos(&self) -> WindowKitResult<(i32, i32)> {
        let x = &self.conn.xlib;
        let mut root_return: xlib::Window = 0;
        let mut child_return: xlib::Window = 0;
        let mut root_x: c_int = 0;
        let mut root_y: c_int = 0;
        let mut win_x: c_int = 0;
        let mut win_y: c_int = 0;
        let mut mask: c_uint = 0;
        let on_screen = unsafe {
            (x.XQueryPointer)(
                self.conn.display,
                self.window,
                &mut root_return,
                &mut child_return,
                &mut root_x,
                &mut root_y,
                &mut win_x,
                &mut win_y,
                &mut mask,
            )
        };
        if on_screen == 0 {
            return Err(Error::NativeCall {
                call: "XQueryPointer",
                detail: "pointer is on another screen".to_string(),
            });
        }
        Ok((win_x, win_y))
    }

    fn set_cursor_pos(&mut self, x_pos: i32, y_pos: i32) -> WindowKitResult<()> {
        let x = &self.conn.xlib;
        unsafe {
            (x.XWarpPointer)(self.conn.display, 0, self.window, 0, 0, 0, 0, x_pos, y_pos);
            (x.XFlush)(self.conn.display);
        }
        Ok(())
    }

    fn create_gl_context(&mut self, config: &GlContextConfig) -> WindowKitResult<()> {
        let api = self.glx.as_ref().ok_or_else(|| {
            Error::Unsupported("window was not created for OpenGL".to_string())
        })?;
        let fb_config = self.fb_config.ok_or_else(|| {
            Error::Unsupported("window has no framebuffer configuration".to_string())
        })?;
        let context = api.create_context(&self.conn, fb_config, config)?;
        self.gl_context = Some(context);
        Ok(())
    }

    fn destroy_gl_context(&mut self) {
        if let (Some(api), Some(context)) = (self.glx.as_ref(), self.gl_context.take()) {
            api.clear_current(&self.conn);
            api.destroy_context(&self.conn, context);
        }
    }

    fn has_gl_context(&self) -> bool {
        self.gl_context.is_some()
    }

    fn make_current(&mut self) -> WindowKitResult<()> {
        let (api, context) = match (self.glx.as_ref(), self.gl_context) {
            (Some(api), Some(context)) => (api, context),
            _ => {
                return Err(Error::Unsupported(
                    "window has no OpenGL context".to_string(),
                ))
            }
        };
        api.make_current(&self.conn, self.window, context)
    }

    fn clear_current(&mut self) {
        if let Some(api) = self.glx.as_ref() {
            api.clear_current(&self.conn);
        }
    }

    fn swap_buffers(&mut self) -> WindowKitResult<()> {
        let api = self.glx.as_ref().ok_or_else(|| {
            Error::Unsupported("window has no OpenGL context".to_string())
        })?;
        api.swap_buffers(&self.conn, self.window);
        Ok(())
    }

    fn raw_window_handle(&self) -> RawWindowHandle {
        let mut handle = XlibWindowHandle::empty();
        handle.window = self.window;
        RawWindowHandle::Xlib(handle)
    }

    fn raw_display_handle(&self) -> RawDisplayHandle {
        let mut handle = XlibDisplayHandle::empty();
        handle.display = self.conn.display.cast::<c_void>();
        handle.screen = self.conn.screen;
        RawDisplayHandle::Xlib(handle)
    }
}
