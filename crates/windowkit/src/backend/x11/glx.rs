//! GLX context negotiation
//!
//! Unlike Win32, no bootstrap context is needed here: the extended creation
//! entry point is resolved directly through `glXGetProcAddress`. The
//! framebuffer configuration must be chosen *before* the window exists,
//! because the window is created against the configuration's visual.

use std::ffi::CString;
use std::os::raw::{c_int, c_void};
use std::ptr;

use log::debug;
use x11_dl::glx::{Glx, GLXContext, GLXFBConfig};
use x11_dl::xlib;

use super::Connection;
use crate::error::{Error, WindowKitResult};
use crate::gfx::{GlContextConfig, GlProfile};

// glx.h constants, defined locally next to their use.
const GLX_WINDOW_BIT: c_int = 0x0000_0001;
const GLX_RGBA_BIT: c_int = 0x0000_0001;
const GLX_DOUBLEBUFFER: c_int = 5;
const GLX_RED_SIZE: c_int = 8;
const GLX_GREEN_SIZE: c_int = 9;
const GLX_BLUE_SIZE: c_int = 10;
const GLX_ALPHA_SIZE: c_int = 11;
const GLX_DEPTH_SIZE: c_int = 12;
const GLX_STENCIL_SIZE: c_int = 13;
const GLX_X_VISUAL_TYPE: c_int = 0x22;
const GLX_TRUE_COLOR: c_int = 0x8002;
const GLX_DRAWABLE_TYPE: c_int = 0x8010;
const GLX_RENDER_TYPE: c_int = 0x8011;
const GLX_X_RENDERABLE: c_int = 0x8012;
const GLX_RGBA_TYPE: c_int = 0x8014;

// GLX_ARB_create_context constants.
const GLX_CONTEXT_MAJOR_VERSION_ARB: c_int = 0x2091;
const GLX_CONTEXT_MINOR_VERSION_ARB: c_int = 0x2092;
const GLX_CONTEXT_PROFILE_MASK_ARB: c_int = 0x9126;
const GLX_CONTEXT_CORE_PROFILE_BIT_ARB: c_int = 0x0000_0001;
const GLX_CONTEXT_COMPATIBILITY_PROFILE_BIT_ARB: c_int = 0x0000_0002;

type CreateContextAttribsFn = unsafe extern "C" fn(
    *mut xlib::Display,
    GLXFBConfig,
    GLXContext,
    c_int,
    *const c_int,
) -> GLXContext;

pub(crate) type FbConfig = GLXFBConfig;
pub(crate) type ContextHandle = GLXContext;

/// Framebuffer configuration and visual a GL window is created against
pub(crate) struct VisualSetup {
    pub fb_config: FbConfig,
    pub visual: *mut xlib::Visual,
    pub depth: c_int,
}

/// Loaded GLX library plus the resolved extension entry point
pub(crate) struct GlxApi {
    glx: Glx,
    create_context_attribs: Option<CreateContextAttribsFn>,
}

impl GlxApi {
    pub(crate) fn open() -> WindowKitResult<Self> {
        let glx = Glx::open()
            .map_err(|e| Error::Unsupported(format!("GLX not loadable: {e}")))?;
        let create_context_attribs = unsafe {
            (glx.glXGetProcAddress)(b"glXCreateContextAttribsARB\0".as_ptr())
                .map(|f| std::mem::transmute::<_, CreateContextAttribsFn>(f))
        };
        if create_context_attribs.is_none() {
            debug!("GLX_ARB_create_context not present; only legacy contexts available");
        }
        Ok(Self {
            glx,
            create_context_attribs,
        })
    }

    /// Pick a framebuffer configuration and its visual for window creation
    pub(crate) fn choose_config(
        &self,
        conn: &Connection,
        _config: &GlContextConfig,
    ) -> WindowKitResult<VisualSetup> {
        let attribs = framebuffer_attribs();
        let mut count: c_int = 0;
        let configs = unsafe {
            (self.glx.glXChooseFBConfig)(conn.display, conn.screen, attribs.as_ptr(), &mut count)
        };
        if configs.is_null() || count == 0 {
            return Err(Error::Unsupported(
                "no matching GLX framebuffer configuration".to_string(),
            ));
        }
        let fb_config = unsafe { *configs };
        unsafe { (conn.xlib.XFree)(configs.cast::<c_void>()) };

        let visual_info = unsafe { (self.glx.glXGetVisualFromFBConfig)(conn.display, fb_config) };
        if visual_info.is_null() {
            return Err(Error::CreationFailed {
                stage: "glXGetVisualFromFBConfig",
                detail: "configuration has no visual".to_string(),
            });
        }
        let setup = unsafe {
            VisualSetup {
                fb_config,
                visual: (*visual_info).visual,
                depth: (*visual_info).depth,
            }
        };
        unsafe { (conn.xlib.XFree)(visual_info.cast::<c_void>()) };
        Ok(setup)
    }

    /// Create a context for the negotiated version/profile
    pub(crate) fn create_context(
        &self,
        conn: &Connection,
        fb_config: FbConfig,
        config: &GlContextConfig,
    ) -> WindowKitResult<ContextHandle> {
        let context = if let Some(create) = self.create_context_attribs {
            let attribs = context_attribs(config);
            unsafe { create(conn.display, fb_config, ptr::null_mut(), 1, attribs.as_ptr()) }
        } else if config.needs_attribs() {
            return Err(Error::Unsupported(format!(
                "OpenGL {}.{} requires GLX_ARB_create_context",
                config.major, config.minor
            )));
        } else {
            unsafe {
                (self.glx.glXCreateNewContext)(
                    conn.display,
                    fb_config,
                    GLX_RGBA_TYPE,
                    ptr::null_mut(),
                    1,
                )
            }
        };
        if context.is_null() {
            return Err(Error::NativeCall {
                call: "glXCreateContextAttribsARB",
                detail: format!(
                    "no context for OpenGL {}.{} {:?}",
                    config.major, config.minor, config.profile
                ),
            });
        }
        debug!(
            "created GLX context for OpenGL {}.{} {:?}",
            config.major, config.minor, config.profile
        );
        Ok(context)
    }

    pub(crate) fn destroy_context(&self, conn: &Connection, context: ContextHandle) {
        unsafe { (self.glx.glXDestroyContext)(conn.display, context) };
    }

    pub(crate) fn make_current(
        &self,
        conn: &Connection,
        window: xlib::Window,
        context: ContextHandle,
    ) -> WindowKitResult<()> {
        let ok = unsafe { (self.glx.glXMakeCurrent)(conn.display, window, context) };
        if ok == 0 {
            return Err(Error::NativeCall {
                call: "glXMakeCurrent",
                detail: "context refused to bind".to_string(),
            });
        }
        Ok(())
    }

    pub(crate) fn clear_current(&self, conn: &Connection) {
        unsafe { (self.glx.glXMakeCurrent)(conn.display, 0, ptr::null_mut()) };
    }

    pub(crate) fn swap_buffers(&self, conn: &Connection, window: xlib::Window) {
        unsafe { (self.glx.glXSwapBuffers)(conn.display, window) };
    }

    /// Resolve a GL entry point; null for unknown symbols
    pub(crate) fn proc_address(&self, name: &str) -> *const c_void {
        let Ok(c_name) = CString::new(name) else {
            return ptr::null();
        };
        unsafe {
            (self.glx.glXGetProcAddress)(c_name.as_ptr().cast::<u8>())
                .map_or(ptr::null(), |f| f as *const c_void)
        }
    }
}

/// Attribute list for framebuffer-configuration selection
fn framebuffer_attribs() -> Vec<c_int> {
    vec![
        GLX_X_RENDERABLE,
        1,
        GLX_DRAWABLE_TYPE,
        GLX_WINDOW_BIT,
        GLX_RENDER_TYPE,
        GLX_RGBA_BIT,
        GLX_X_VISUAL_TYPE,
        GLX_TRUE_COLOR,
        GLX_RED_SIZE,
        8,
        GLX_GREEN_SIZE,
        8,
        GLX_BLUE_SIZE,
        8,
        GLX_ALPHA_SIZE,
        8,
        GLX_DEPTH_SIZE,
        24,
        GLX_STENCIL_SIZE,
        8,
        GLX_DOUBLEBUFFER,
        1,
        0,
    ]
}

/// Attribute list mapping the abstract (major, minor, profile) tuple
fn context_attribs(config: &GlContextConfig) -> Vec<c_int> {
    let profile_bit = match config.profile {
        GlProfile::Core => GLX_CONTEXT_CORE_PROFILE_BIT_ARB,
        GlProfile::Compatibility => GLX_CONTEXT_COMPATIBILITY_PROFILE_BIT_ARB,
    };
    vec![
        GLX_CONTEXT_MAJOR_VERSION_ARB,
        c_int::from(config.major),
        GLX_CONTEXT_MINOR_VERSION_ARB,
        c_int::from(config.minor),
        GLX_CONTEXT_PROFILE_MASK_ARB,
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
            .position(|&a| a == GLX_CONTEXT_PROFILE_MASK_ARB)
            .expect("profile mask present");
        assert_eq!(attribs[mask_pos + 1], GLX_CONTEXT_CORE_PROFILE_BIT_ARB);
        assert_eq!(attribs[1], 3);
        assert_eq!(attribs[3], 3);
        assert_eq!(*attribs.last().unwrap(), 0, "attrib list is terminated");
    }

    #[test]
    fn test_compatibility_profile_requests_compat_bit() {
        let attribs = context_attribs(&GlContextConfig::new(3, 2, GlProfile::Compatibility));
        let mask_pos = attribs
            .iter()
            .position(|&a| a == GLX_CONTEXT_PROFILE_MASK_ARB)
            .unwrap();
        assert_eq!(
            attribs[mask_pos + 1],
            GLX_CONTEXT_COMPATIBILITY_PROFILE_BIT_ARB
        );
    }

    #[test]
    fn test_framebuffer_attribs_request_double_buffering() {
        let attribs = framebuffer_attribs();
        let pos = attribs.iter().position(|&a| a == GLX_DOUBLEBUFFER).unwrap();
        assert_eq!(attribs[pos + 1], 1);
        assert_eq!(*attribs.last().unwrap(), 0);
    }
}
