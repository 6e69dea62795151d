//! Win32 platform backend (the message-callback native model)
//!
//! Native events arrive through a process-wide window procedure. The
//! procedure resolves the HWND to its per-window buffer through a userdata
//! pointer and translates messages into [`BackendEvent`]s; `pump` then
//! dispatches the thread's pending messages for the window and hands the
//! buffered translations to the core.

pub(crate) mod clipboard;
pub(crate) mod keymap;
pub(crate) mod wgl;

use std::os::raw::c_void;
use std::ptr;

use log::debug;
use raw_window_handle::{
    RawDisplayHandle, RawWindowHandle, Win32WindowHandle, WindowsDisplayHandle,
};
use windows_sys::Win32::Foundation::{GetLastError, HINSTANCE, HWND, LPARAM, LRESULT, RECT, WPARAM};
use windows_sys::Win32::Graphics::Gdi::{ClientToScreen, GetDC, ScreenToClient};
use windows_sys::Win32::Graphics::OpenGL::SwapBuffers;
use windows_sys::Win32::System::LibraryLoader::GetModuleHandleW;
use windows_sys::Win32::UI::Input::KeyboardAndMouse::{
    GetKeyState, SetFocus, VK_CAPITAL, VK_NUMLOCK, VK_SCROLL,
};
use windows_sys::Win32::UI::WindowsAndMessaging::{
    AdjustWindowRectEx, CopyIcon, CreateWindowExW, DefWindowProcW, DestroyCursor, DestroyWindow,
    DispatchMessageW, GetClientRect, GetCursorPos, GetForegroundWindow, GetWindowLongPtrW,
    GetWindowRect, LoadCursorW, PeekMessageW, RegisterClassExW, SetCursor, SetCursorPos,
    SetForegroundWindow, SetWindowLongPtrW, SetWindowPos, SetWindowTextW, ShowWindow,
    TranslateMessage, UnregisterClassW, CS_HREDRAW, CS_OWNDC, CS_VREDRAW, CW_USEDEFAULT,
    GWLP_USERDATA, HTCLIENT, IDC_ARROW, IDC_CROSS, IDC_HAND, IDC_IBEAM, IDC_SIZEALL, IDC_SIZENS,
    IDC_SIZEWE, IDC_WAIT, MINMAXINFO, MSG, PM_REMOVE, SIZE_MAXIMIZED, SIZE_MINIMIZED,
    SWP_NOACTIVATE, SWP_NOMOVE, SWP_NOSIZE, SWP_NOZORDER, SW_HIDE, SW_MAXIMIZE, SW_MINIMIZE,
    SW_RESTORE, SW_SHOW, WM_CLOSE, WM_GETMINMAXINFO, WM_KEYDOWN, WM_KEYUP, WM_KILLFOCUS,
    WM_LBUTTONDOWN, WM_LBUTTONUP, WM_MBUTTONDOWN, WM_MBUTTONUP, WM_MOUSEWHEEL, WM_MOVE,
    WM_RBUTTONDOWN, WM_RBUTTONUP, WM_SETCURSOR, WM_SETFOCUS, WM_SIZE, WM_SYSKEYDOWN, WM_SYSKEYUP,
    WM_XBUTTONDOWN, WM_XBUTTONUP, WNDCLASSEXW, WS_MAXIMIZEBOX, WS_OVERLAPPEDWINDOW, WS_THICKFRAME,
};

use super::{BackendEvent, PlatformBackend, PlatformWindow};
use crate::config::WindowConfig;
use crate::cursor::CursorStyle;
use crate::error::{Error, WindowKitResult};
use crate::gfx::GlContextConfig;
use crate::input::{LockKey, MouseButton};

const CLASS_NAME: &str = "windowkit-window";

/// Encode a Rust string as a NUL-terminated UTF-16 buffer
pub(crate) fn wide(text: &str) -> Vec<u16> {
    text.encode_utf16().chain(std::iter::once(0)).collect()
}

const fn loword(value: isize) -> i32 {
    (value & 0xffff) as u16 as i16 as i32
}

const fn hiword(value: isize) -> i32 {
    ((value >> 16) & 0xffff) as u16 as i16 as i32
}

/// Per-window state the window procedure writes into
///
/// Reached from the procedure through GWLP_USERDATA, giving O(1) resolution
/// from HWND to window state without scanning a registry.
struct WindowShared {
    events: Vec<BackendEvent>,
    min_size: Option<(u32, u32)>,
    max_size: Option<(u32, u32)>,
    /// Active cursor resource; 0 renders the cursor hidden
    cursor: isize,
    style: u32,
    ex_style: u32,
}

/// Win32 backend: instance handle plus the registered window class
pub(crate) struct Win32Backend {
    hinstance: HINSTANCE,
    class_name: Vec<u16>,
}

impl Win32Backend {
    pub(crate) fn new() -> WindowKitResult<Self> {
        let hinstance = unsafe { GetModuleHandleW(ptr::null()) };
        let class_name = wide(CLASS_NAME);
        let class = WNDCLASSEXW {
            cbSize: std::mem::size_of::<WNDCLASSEXW>() as u32,
            style: CS_HREDRAW | CS_VREDRAW | CS_OWNDC,
            lpfnWndProc: Some(wndproc),
            cbClsExtra: 0,
            cbWndExtra: 0,
            hInstance: hinstance,
            hIcon: 0,
            hCursor: 0,
            hbrBackground: 0,
            lpszMenuName: ptr::null(),
            lpszClassName: class_name.as_ptr(),
            hIconSm: 0,
        };
        if unsafe { RegisterClassExW(&class) } == 0 {
            return Err(Error::BackendUnavailable(format!(
                "RegisterClassExW failed (error {})",
                unsafe { GetLastError() }
            )));
        }
        debug!("Win32 backend up");
        Ok(Self {
            hinstance,
            class_name,
        })
    }
}

impl Drop for Win32Backend {
    fn drop(&mut self) {
        unsafe { UnregisterClassW(self.class_name.as_ptr(), self.hinstance) };
    }
}

impl PlatformBackend for Win32Backend {
    fn create_window(&mut self, config: &WindowConfig) -> WindowKitResult<Box<dyn PlatformWindow>> {
        Win32Window::create(self, config).map(|w| Box::new(w) as Box<dyn PlatformWindow>)
    }

    fn clipboard_get(&mut self) -> WindowKitResult<Option<String>> {
        clipboard::get()
    }

    fn clipboard_set(&mut self, text: &str) -> WindowKitResult<()> {
        clipboard::set(text)
    }

    fn gl_proc_address(&self, name: &str) -> *const c_void {
        wgl::proc_address(name)
    }
}

/// The process-wide window procedure
///
/// Translates messages into buffered [`BackendEvent`]s; everything else is
/// forwarded to `DefWindowProcW`. Messages delivered before the userdata
/// pointer is installed (during `CreateWindowExW`) take the default path.
unsafe extern "system" fn wndproc(hwnd: HWND, msg: u32, wparam: WPARAM, lparam: LPARAM) -> LRESULT {
    let shared_ptr = GetWindowLongPtrW(hwnd, GWLP_USERDATA) as *mut WindowShared;
    if shared_ptr.is_null() {
        return DefWindowProcW(hwnd, msg, wparam, lparam);
    }
    let shared = &mut *shared_ptr;

    match msg {
        WM_CLOSE => {
            // Close is a request, not a teardown: flag it and keep the
            // window alive until the caller destroys it.
            shared.events.push(BackendEvent::CloseRequested);
            0
        }
        WM_SIZE => {
            shared.events.push(BackendEvent::Resized {
                width: loword(lparam) as u32,
                height: hiword(lparam) as u32,
            });
            shared.events.push(BackendEvent::StateHint {
                maximized: wparam as u32 == SIZE_MAXIMIZED,
                minimized: wparam as u32 == SIZE_MINIMIZED,
            });
            0
        }
        WM_MOVE => {
            shared.events.push(BackendEvent::Moved {
                x: loword(lparam),
                y: hiword(lparam),
            });
            0
        }
        WM_SETFOCUS => {
            shared.events.push(BackendEvent::FocusChanged(true));
            0
        }
        WM_KILLFOCUS => {
            shared.events.push(BackendEvent::FocusChanged(false));
            0
        }
        WM_KEYDOWN | WM_SYSKEYDOWN | WM_KEYUP | WM_SYSKEYUP => {
            let pressed = msg == WM_KEYDOWN || msg == WM_SYSKEYDOWN;
            if let Some(key) = keymap::vk_to_key(wparam, lparam) {
                shared.events.push(BackendEvent::Key { key, pressed });
            }
            if msg == WM_SYSKEYDOWN || msg == WM_SYSKEYUP {
                // Let the default procedure keep Alt/F10 menu behavior.
                DefWindowProcW(hwnd, msg, wparam, lparam)
            } else {
                0
            }
        }
        WM_LBUTTONDOWN | WM_LBUTTONUP => {
            shared.events.push(BackendEvent::Button {
                button: MouseButton::Left,
                pressed: msg == WM_LBUTTONDOWN,
            });
            0
        }
        WM_RBUTTONDOWN | WM_RBUTTONUP => {
            shared.events.push(BackendEvent::Button {
                button: MouseButton::Right,
                pressed: msg == WM_RBUTTONDOWN,
            });
            0
        }
        WM_MBUTTONDOWN | WM_MBUTTONUP => {
            shared.events.push(BackendEvent::Button {
                button: MouseButton::Middle,
                pressed: msg == WM_MBUTTONDOWN,
            });
            0
        }
        WM_XBUTTONDOWN | WM_XBUTTONUP => {
            let button = if (wparam >> 16) as u16 == 1 {
                MouseButton::X1
            } else {
                MouseButton::X2
            };
            shared.events.push(BackendEvent::Button {
                button,
                pressed: msg == WM_XBUTTONDOWN,
            });
            1
        }
        WM_MOUSEWHEEL => {
            let delta = i32::from((wparam >> 16) as u16 as i16);
            shared.events.push(BackendEvent::Scroll { delta });
            0
        }
        WM_GETMINMAXINFO => {
            // Answer the constraint query from the stored per-window bounds,
            // translated from client to outer dimensions.
            let info = &mut *(lparam as *mut MINMAXINFO);
            if let Some((w, h)) = shared.min_size {
                let (ow, oh) = client_to_outer(w, h, shared.style, shared.ex_style);
                info.ptMinTrackSize.x = ow;
                info.ptMinTrackSize.y = oh;
            }
            if let Some((w, h)) = shared.max_size {
                let (ow, oh) = client_to_outer(w, h, shared.style, shared.ex_style);
                info.ptMaxTrackSize.x = ow;
                info.ptMaxTrackSize.y = oh;
            }
            0
        }
        WM_SETCURSOR => {
            if loword(lparam) as u32 == HTCLIENT {
                // Reassert the per-window cursor whenever the default would
                // override it (0 keeps the cursor hidden).
                SetCursor(shared.cursor);
                1
            } else {
                DefWindowProcW(hwnd, msg, wparam, lparam)
            }
        }
        _ => DefWindowProcW(hwnd, msg, wparam, lparam),
    }
}

/// Grow a client rectangle to the outer window size for the given styles
fn client_to_outer(width: u32, height: u32, style: u32, ex_style: u32) -> (i32, i32) {
    let mut rect = RECT {
        left: 0,
        top: 0,
        right: width as i32,
        bottom: height as i32,
    };
    unsafe { AdjustWindowRectEx(&mut rect, style, 0, ex_style) };
    (rect.right - rect.left, rect.bottom - rect.top)
}

/// A native Win32 window and its attached resources
pub(crate) struct Win32Window {
    hwnd: HWND,
    hdc: isize,
    hinstance: HINSTANCE,
    shared: *mut WindowShared,
    gl_context: Option<isize>,
}

impl Win32Window {
    fn create(backend: &Win32Backend, config: &WindowConfig) -> WindowKitResult<Self> {
        let style = if config.resizable {
            WS_OVERLAPPEDWINDOW
        } else {
            WS_OVERLAPPEDWINDOW & !(WS_THICKFRAME | WS_MAXIMIZEBOX)
        };
        let ex_style = 0u32;
        let (outer_w, outer_h) = client_to_outer(config.width, config.height, style, ex_style);
        let (x, y) = config
            .position
            .unwrap_or((CW_USEDEFAULT, CW_USEDEFAULT));
        let title = wide(&config.title);

        let hwnd = unsafe {
            CreateWindowExW(
                ex_style,
                backend.class_name.as_ptr(),
                title.as_ptr(),
                style,
                x,
                y,
                outer_w,
                outer_h,
                0,
                0,
                backend.hinstance,
                ptr::null(),
            )
        };
        if hwnd == 0 {
            return Err(Error::CreationFailed {
                stage: "CreateWindowExW",
                detail: format!("error {}", unsafe { GetLastError() }),
            });
        }

        let hdc = unsafe { GetDC(hwnd) };
        if hdc == 0 {
            unsafe { DestroyWindow(hwnd) };
            return Err(Error::CreationFailed {
                stage: "GetDC",
                detail: "no device context".to_string(),
            });
        }

        let shared = Box::into_raw(Box::new(WindowShared {
            events: Vec::new(),
            min_size: config.min_size,
            max_size: config.max_size,
            cursor: create_native_cursor(config.cursor),
            style,
            ex_style,
        }));
        unsafe { SetWindowLongPtrW(hwnd, GWLP_USERDATA, shared as isize) };

        if config.visible {
            unsafe { ShowWindow(hwnd, SW_SHOW) };
        }
        debug!("created Win32 window {hwnd:#x}");
        Ok(Self {
            hwnd,
            hdc,
            hinstance: backend.hinstance,
            shared,
            gl_context: None,
        })
    }

    fn shared(&self) -> &WindowShared {
        unsafe { &*self.shared }
    }

    fn shared_mut(&mut self) -> &mut WindowShared {
        unsafe { &mut *self.shared }
    }
}

/// Build the native cursor resource for a style; 0 hides the cursor
fn create_native_cursor(style: CursorStyle) -> isize {
    if style == CursorStyle::Hidden {
        return 0;
    }
    let idc = match style {
        CursorStyle::IBeam => IDC_IBEAM,
        CursorStyle::Crosshair => IDC_CROSS,
        CursorStyle::Hand => IDC_HAND,
        CursorStyle::ResizeEw => IDC_SIZEWE,
        CursorStyle::ResizeNs => IDC_SIZENS,
        CursorStyle::Move => IDC_SIZEALL,
        CursorStyle::Wait => IDC_WAIT,
        CursorStyle::Arrow | CursorStyle::Hidden => IDC_ARROW,
    };
    // Copy the shared system cursor so this window owns a destroyable
    // resource of its own.
    unsafe { CopyIcon(LoadCursorW(0, idc)) }
}

impl Drop for Win32Window {
    fn drop(&mut self) {
        self.destroy_gl_context();
        let cursor = self.shared().cursor;
        if cursor != 0 {
            unsafe { DestroyCursor(cursor) };
        }
        unsafe {
            SetWindowLongPtrW(self.hwnd, GWLP_USERDATA, 0);
            DestroyWindow(self.hwnd);
            drop(Box::from_raw(self.shared));
        }
    }
}

impl PlatformWindow for Win32Window {
    fn pump(&mut self, events: &mut Vec<BackendEvent>) {
        let mut msg: MSG = unsafe { std::mem::zeroed() };
        // Dispatch everything currently queued for this window; the window
        // procedure buffers the translations as a side effect.
        while unsafe { PeekMessageW(&mut msg, self.hwnd, 0, 0, PM_REMOVE) } != 0 {
            unsafe {
                TranslateMessage(&msg);
                DispatchMessageW(&msg);
            }
        }
        events.append(&mut self.shared_mut().events);
    }

    fn poll_locks(&mut self) -> [bool; LockKey::COUNT] {
        unsafe {
            [
                GetKeyState(i32::from(VK_CAPITAL)) & 1 != 0,
                GetKeyState(i32::from(VK_NUMLOCK)) & 1 != 0,
                GetKeyState(i32::from(VK_SCROLL)) & 1 != 0,
            ]
        }
    }

    fn show(&mut self) {
        unsafe { ShowWindow(self.hwnd, SW_SHOW) };
    }

    fn hide(&mut self) {
        unsafe { ShowWindow(self.hwnd, SW_HIDE) };
    }

    fn position(&self) -> (i32, i32) {
        let mut rect = RECT {
            left: 0,
            top: 0,
            right: 0,
            bottom: 0,
        };
        unsafe { GetWindowRect(self.hwnd, &mut rect) };
        (rect.left, rect.top)
    }

    fn set_position(&mut self, x: i32, y: i32) -> WindowKitResult<()> {
        let ok = unsafe {
            SetWindowPos(
                self.hwnd,
                0,
                x,
                y,
                0,
                0,
                SWP_NOSIZE | SWP_NOZORDER | SWP_NOACTIVATE,
            )
        };
        if ok == 0 {
            return Err(Error::NativeCall {
                call: "SetWindowPos",
                detail: format!("error {}", unsafe { GetLastError() }),
            });
        }
        Ok(())
    }

    fn dimensions(&self) -> (u32, u32) {
        let mut rect = RECT {
            left: 0,
            top: 0,
            right: 0,
            bottom: 0,
        };
        unsafe { GetClientRect(self.hwnd, &mut rect) };
        (rect.right as u32, rect.bottom as u32)
    }

    fn set_dimensions(&mut self, width: u32, height: u32) -> WindowKitResult<()> {
        let shared = self.shared();
        let (outer_w, outer_h) = client_to_outer(width, height, shared.style, shared.ex_style);
        let ok = unsafe {
            SetWindowPos(
                self.hwnd,
                0,
                0,
                0,
                outer_w,
                outer_h,
                SWP_NOMOVE | SWP_NOZORDER | SWP_NOACTIVATE,
            )
        };
        if ok == 0 {
            return Err(Error::NativeCall {
                call: "SetWindowPos",
                detail: format!("error {}", unsafe { GetLastError() }),
            });
        }
        Ok(())
    }

    fn set_size_limits(&mut self, min: Option<(u32, u32)>, max: Option<(u32, u32)>) {
        let shared = self.shared_mut();
        shared.min_size = min;
        shared.max_size = max;
    }

    fn set_title(&mut self, title: &str) -> WindowKitResult<()> {
        let title = wide(title);
        if unsafe { SetWindowTextW(self.hwnd, title.as_ptr()) } == 0 {
            return Err(Error::NativeCall {
                call: "SetWindowTextW",
                detail: format!("error {}", unsafe { GetLastError() }),
            });
        }
        Ok(())
    }

    fn focus(&mut self) {
        unsafe {
            SetForegroundWindow(self.hwnd);
            SetFocus(self.hwnd);
        }
    }

    fn is_focused(&self) -> bool {
        unsafe { GetForegroundWindow() == self.hwnd }
    }

    fn maximize(&mut self) {
        unsafe { ShowWindow(self.hwnd, SW_MAXIMIZE) };
    }

    fn minimize(&mut self) {
        unsafe { ShowWindow(self.hwnd, SW_MINIMIZE) };
    }

    fn restore(&mut self) {
        unsafe { ShowWindow(self.hwnd, SW_RESTORE) };
    }

    fn set_cursor_style(&mut self, style: CursorStyle) -> WindowKitResult<()> {
        let cursor = create_native_cursor(style);
        let shared = self.shared_mut();
        let previous = shared.cursor;
        shared.cursor = cursor;
        if previous != 0 {
            unsafe { DestroyCursor(previous) };
        }
        unsafe { SetCursor(cursor) };
        Ok(())
    }

    fn cursor_pos(&self) -> WindowKitResult<(i32, i32)> {
        let mut point = windows_sys::Win32::Foundation::POINT { x: 0, y: 0 };
        if unsafe { GetCursorPos(&mut point) } == 0 {
            return Err(Error::NativeCall {
                call: "GetCursorPos",
                detail: format!("error {}", unsafe { GetLastError() }),
            });
        }
        unsafe { ScreenToClient(self.hwnd, &mut point) };
        Ok((point.x, point.y))
    }

    fn set_cursor_pos(&mut self, x: i32, y: i32) -> WindowKitResult<()> {
        let mut point = windows_sys::Win32::Foundation::POINT { x, y };
        unsafe {
            ClientToScreen(self.hwnd, &mut point);
            if SetCursorPos(point.x, point.y) == 0 {
                return Err(Error::NativeCall {
                    call: "SetCursorPos",
                    detail: format!("error {}", GetLastError()),
                });
            }
        }
        Ok(())
    }

    fn create_gl_context(&mut self, config: &GlContextConfig) -> WindowKitResult<()> {
        let context = wgl::create_context(self.hdc, config)?;
        self.gl_context = Some(context);
        Ok(())
    }

    fn destroy_gl_context(&mut self) {
        if let Some(context) = self.gl_context.take() {
            wgl::destroy_context(context);
        }
    }

    fn has_gl_context(&self) -> bool {
        self.gl_context.is_some()
    }

    fn make_current(&mut self) -> WindowKitResult<()> {
        let context = self.gl_context.ok_or_else(|| {
            Error::Unsupported("window has no OpenGL context".to_string())
        })?;
        wgl::make_current(self.hdc, context)
    }

    fn clear_current(&mut self) {
        wgl::clear_current();
    }

    fn swap_buffers(&mut self) -> WindowKitResult<()> {
        if unsafe { SwapBuffers(self.hdc) } == 0 {
            return Err(Error::NativeCall {
                call: "SwapBuffers",
                detail: format!("error {}", unsafe { GetLastError() }),
            });
        }
        Ok(())
    }

    fn raw_window_handle(&self) -> RawWindowHandle {
        let mut handle = Win32WindowHandle::empty();
        handle.hwnd = self.hwnd as *mut c_void;
        handle.hinstance = self.hinstance as *mut c_void;
        RawWindowHandle::Win32(handle)
    }

    fn raw_display_handle(&self) -> RawDisplayHandle {
        RawDisplayHandle::Windows(WindowsDisplayHandle::empty())
    }
}
