//! WGL pixel-format selection and context creation
//!
//! The extended entry points (`wglCreateContextAttribsARB`,
//! `wglChoosePixelFormatARB`) can only be resolved while *some* context is
//! current, but creating a proper context needs them first. The standard way
//! out is a one-time throwaway hidden window with a legacy context, used
//! purely to resolve the extended functions; the result is cached
//! process-wide, so the bootstrap runs once and is safe to hit redundantly.

use std::ffi::CString;
use std::os::raw::c_void;
use std::ptr;
use std::sync::OnceLock;

use log::{debug, warn};
use windows_sys::Win32::Foundation::GetLastError;
use windows_sys::Win32::Graphics::Gdi::{GetDC, ReleaseDC};
use windows_sys::Win32::Graphics::OpenGL::{
    ChoosePixelFormat, DescribePixelFormat, SetPixelFormat, wglCreateContext, wglDeleteContext,
    wglGetCurrentContext, wglGetProcAddress, wglMakeCurrent, PFD_DOUBLEBUFFER, PFD_DRAW_TO_WINDOW,
    PFD_SUPPORT_OPENGL, PFD_TYPE_RGBA, PIXELFORMATDESCRIPTOR,
};
use windows_sys::Win32::System::LibraryLoader::{GetModuleHandleW, GetProcAddress};
use windows_sys::Win32::UI::WindowsAndMessaging::{
    CreateWindowExW, DefWindowProcW, DestroyWindow, RegisterClassExW, UnregisterClassW,
    WNDCLASSEXW, WS_OVERLAPPED,
};

use super::wide;
use crate::error::{Error, WindowKitResult};
use crate::gfx::{GlContextConfig, GlProfile};

// WGL_ARB_pixel_format attributes.
const WGL_DRAW_TO_WINDOW_ARB: i32 = 0x2001;
const WGL_SUPPORT_OPENGL_ARB: i32 = 0x2010;
const WGL_DOUBLE_BUFFER_ARB: i32 = 0x2011;
const WGL_PIXEL_TYPE_ARB: i32 = 0x2013;
const WGL_COLOR_BITS_ARB: i32 = 0x2014;
const WGL_DEPTH_BITS_ARB: i32 = 0x2022;
const WGL_STENCIL_BITS_ARB: i32 = 0x2023;
const WGL_TYPE_RGBA_ARB: i32 = 0x202B;

// WGL_ARB_create_context attributes.
const WGL_CONTEXT_MAJOR_VERSION_ARB: i32 = 0x2091;
const WGL_CONTEXT_MINOR_VERSION_ARB: i32 = 0x2092;
const WGL_CONTEXT_PROFILE_MASK_ARB: i32 = 0x9126;
const WGL_CONTEXT_CORE_PROFILE_BIT_ARB: i32 = 0x0000_0001;
const WGL_CONTEXT_COMPATIBILITY_PROFILE_BIT_ARB: i32 = 0x0000_0002;

type CreateContextAttribsFn = unsafe extern "system" fn(isize, isize, *const i32) -> isize;
type ChoosePixelFormatFn =
    unsafe extern "system" fn(isize, *const i32, *const f32, u32, *mut i32, *mut u32) -> i32;

/// Extended entry points resolved by the bootstrap context
#[derive(Default)]
pub(crate) struct WglExt {
    create_context_attribs: Option<CreateContextAttribsFn>,
    choose_pixel_format: Option<ChoosePixelFormatFn>,
}

static EXT: OnceLock<WglExt> = OnceLock::new();

/// Resolved extended entry points, bootstrapping on first use
fn extensions() -> &'static WglExt {
    EXT.get_or_init(load_extensions)
}

fn basic_descriptor() -> PIXELFORMATDESCRIPTOR {
    let mut pfd: PIXELFORMATDESCRIPTOR = unsafe { std::mem::zeroed() };
    pfd.nSize = std::mem::size_of::<PIXELFORMATDESCRIPTOR>() as u16;
    pfd.nVersion = 1;
    pfd.dwFlags = PFD_DRAW_TO_WINDOW | PFD_SUPPORT_OPENGL | PFD_DOUBLEBUFFER;
    pfd.iPixelType = PFD_TYPE_RGBA as u8;
    pfd.cColorBits = 32;
    pfd.cDepthBits = 24;
    pfd.cStencilBits = 8;
    pfd
}

/// One-time throwaway window + legacy context, just to resolve entry points
fn load_extensions() -> WglExt {
    unsafe {
        let hinstance = GetModuleHandleW(ptr::null());
        let class_name = wide("windowkit-wgl-bootstrap");
        let class = WNDCLASSEXW {
            cbSize: std::mem::size_of::<WNDCLASSEXW>() as u32,
            style: 0,
            lpfnWndProc: Some(DefWindowProcW),
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
        if RegisterClassExW(&class) == 0 {
            warn!("WGL bootstrap class registration failed");
            return WglExt::default();
        }
        let cleanup_class = || unsafe { UnregisterClassW(class_name.as_ptr(), hinstance) };

        let hwnd = CreateWindowExW(
            0,
            class_name.as_ptr(),
            class_name.as_ptr(),
            WS_OVERLAPPED,
            0,
            0,
            1,
            1,
            0,
            0,
            hinstance,
            ptr::null(),
        );
        if hwnd == 0 {
            warn!("WGL bootstrap window creation failed");
            cleanup_class();
            return WglExt::default();
        }

        let hdc = GetDC(hwnd);
        let pfd = basic_descriptor();
        let format = ChoosePixelFormat(hdc, &pfd);
        let mut ext = WglExt::default();
        if format != 0 && SetPixelFormat(hdc, format, &pfd) != 0 {
            let context = wglCreateContext(hdc);
            if context != 0 {
                wglMakeCurrent(hdc, context);
                ext.create_context_attribs = resolve(b"wglCreateContextAttribsARB\0")
                    .map(|f| std::mem::transmute::<_, CreateContextAttribsFn>(f));
                ext.choose_pixel_format = resolve(b"wglChoosePixelFormatARB\0")
                    .map(|f| std::mem::transmute::<_, ChoosePixelFormatFn>(f));
                wglMakeCurrent(0, 0);
                wglDeleteContext(context);
            }
        }
        if ext.create_context_attribs.is_none() {
            warn!("WGL_ARB_create_context unavailable; only legacy contexts possible");
        } else {
            debug!("WGL bootstrap resolved extended entry points");
        }
        ReleaseDC(hwnd, hdc);
        DestroyWindow(hwnd);
        cleanup_class();
        ext
    }
}

/// Resolve a WGL extension symbol; requires a current context
unsafe fn resolve(name: &[u8]) -> Option<unsafe extern "system" fn() -> isize> {
    wglGetProcAddress(name.as_ptr())
}

/// Pick and apply a pixel format, preferring the extended chooser
fn apply_pixel_format(hdc: isize) -> WindowKitResult<()> {
    let ext = extensions();
    let mut format = 0i32;
    if let Some(choose) = ext.choose_pixel_format {
        let attribs = pixel_format_attribs();
        let mut count = 0u32;
        let ok = unsafe {
            choose(hdc, attribs.as_ptr(), ptr::null(), 1, &mut format, &mut count)
        };
        if ok == 0 || count == 0 {
            format = 0;
        }
    }
    let mut pfd = basic_descriptor();
    if format == 0 {
        format = unsafe { ChoosePixelFormat(hdc, &pfd) };
        if format == 0 {
            return Err(Error::CreationFailed {
                stage: "ChoosePixelFormat",
                detail: format!("error {}", unsafe { GetLastError() }),
            });
        }
    } else {
        unsafe {
            DescribePixelFormat(
                hdc,
                format,
                std::mem::size_of::<PIXELFORMATDESCRIPTOR>() as u32,
                &mut pfd,
            )
        };
    }
    if unsafe { SetPixelFormat(hdc, format, &pfd) } == 0 {
        return Err(Error::CreationFailed {
            stage: "SetPixelFormat",
            detail: format!("error {}", unsafe { GetLastError() }),
        });
    }
    Ok(())
}

/// Create a context for the negotiated version/profile
pub(crate) fn create_context(hdc: isize, config: &GlContextConfig) -> WindowKitResult<isize> {
    apply_pixel_format(hdc)?;
    let ext = extensions();
    let context = if let Some(create) = ext.create_context_attribs {
        let attribs = context_attribs(config);
        unsafe { create(hdc, 0, attribs.as_ptr()) }
    } else if config.needs_attribs() {
        return Err(Error::Unsupported(format!(
            "OpenGL {}.{} requires WGL_ARB_create_context",
            config.major, config.minor
        )));
    } else {
        unsafe { wglCreateContext(hdc) }
    };
    if context == 0 {
        return Err(Error::NativeCall {
            call: "wglCreateContextAttribsARB",
            detail: format!(
                "no context for OpenGL {}.{} {:?} (error {})",
                config.major,
                config.minor,
                config.profile,
                unsafe { GetLastError() }
            ),
        });
    }
    debug!(
        "created WGL context for OpenGL {}.{} {:?}",
        config.major, config.minor, config.profile
    );
    Ok(context)
}

pub(crate) fn destroy_context(context: isize) {
    unsafe {
        if wglGetCurrentContext() == context {
            wglMakeCurrent(0, 0);
        }
        wglDeleteContext(context);
    }
}

pub(crate) fn make_current(hdc: isize, context: isize) -> WindowKitResult<()> {
    if unsafe { wglMakeCurrent(hdc, context) } == 0 {
        return Err(Error::NativeCall {
            call: "wglMakeCurrent",
            detail: format!("error {}", unsafe { GetLastError() }),
        });
    }
    Ok(())
}

pub(crate) fn clear_current() {
    unsafe { wglMakeCurrent(0, 0) };
}

/// Resolve a GL entry point, falling back to opengl32.dll for 1.1 symbols
pub(crate) fn proc_address(name: &str) -> *const c_void {
    let Ok(c_name) = CString::new(name) else {
        return ptr::null();
    };
    let raw = unsafe { wglGetProcAddress(c_name.as_ptr().cast::<u8>()) }
        .map_or(0usize, |f| f as usize);
    // wglGetProcAddress reports failure as 0, 1, 2, 3, or -1.
    if raw == 0 || raw <= 3 || raw == usize::MAX {
        let module = unsafe { GetModuleHandleW(wide("opengl32.dll").as_ptr()) };
        return unsafe { GetProcAddress(module, c_name.as_ptr().cast::<u8>()) }
            .map_or(ptr::null(), |f| f as *const c_void);
    }
    raw as *const c_void
}

/// Attribute list for extended pixel-format selection
fn pixel_format_attribs() -> Vec<i32> {
    vec![
        WGL_DRAW_TO_WINDOW_ARB,
        1,
        WGL_SUPPORT_OPENGL_ARB,
        1,
        WGL_DOUBLE_BUFFER_ARB,
        1,
        WGL_PIXEL_TYPE_ARB,
        WGL_TYPE_RGBA_ARB,
        WGL_COLOR_BITS_ARB,
        32,
        WGL_DEPTH_BITS_ARB,
        24,
        WGL_STENCIL_BITS_ARB,
        8,
        0,
    ]
}

/// Attribute list mapping the abstract (major, minor, profile) tuple
fn context_attribs(config: &GlContextConfig) -> Vec<i32> {
    let profile_bit = match config.profile {
        GlProfile::Core => WGL_CONTEXT_CORE_PROFILE_BIT_ARB,
        GlProfile::Compatibility => WGL_CONTEXT_COMPATIBILITY_PROFILE_BIT_ARB,
    };
    vec![
        WGL_CONTEXT_MAJOR_VERSION_ARB,
        i32::from(config.major),
        WGL_CONTEXT_MINOR_VERSION_ARB,
        i32::from(config.minor),
        WGL_CONTEXT_PROFILE_MASK_ARB,
        profile_bit,
        0,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_profile_requests_core_bit() {
        let attribs = context_attribs(&GlContextConfig::new(3, 3, GlProfile::Core));
        let mask_pos = attribs
            .iter()
            .position(|&a| a == WGL_CONTEXT_PROFILE_MASK_ARB)
            .expect("profile mask present");
        assert_eq!(attribs[mask_pos + 1], WGL_CONTEXT_CORE_PROFILE_BIT_ARB);
        assert_eq!(*attribs.last().unwrap(), 0);
    }

    #[test]
    fn test_pixel_format_attribs_request_double_buffering() {
        let attribs = pixel_format_attribs();
        let pos = attribs
            .iter()
            .position(|&a| a == WGL_DOUBLE_BUFFER_ARB)
            .unwrap();
        assert_eq!(attribs[pos + 1], 1);
    }
}
