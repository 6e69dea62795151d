//! Graphics API selection and context negotiation types
//!
//! A window selects its graphics API at creation time. OpenGL windows get a
//! native context negotiated against a (major, minor, profile) tuple; Vulkan
//! windows get no context of their own — the caller brings an instance and
//! receives a surface from [`vulkan`]. Context binding follows a strict
//! process-wide current-context discipline owned by the window system:
//! binding one window's context always unbinds the previous one first.

pub mod vulkan;

use std::os::raw::c_void;

/// Graphics API requested for a window at creation time
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum GraphicsConfig {
    /// No graphics context; the window is input/lifecycle only
    #[default]
    None,
    /// Create and bind an OpenGL context with the given version/profile
    OpenGl(GlContextConfig),
    /// Prepare the window for caller-driven Vulkan surface creation
    Vulkan,
}

impl GraphicsConfig {
    /// Whether this selection carries an OpenGL context
    #[must_use]
    pub const fn is_opengl(&self) -> bool {
        matches!(self, Self::OpenGl(_))
    }
}

/// OpenGL context version and profile request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlContextConfig {
    /// Major context version
    pub major: u8,
    /// Minor context version
    pub minor: u8,
    /// Requested profile
    pub profile: GlProfile,
}

impl GlContextConfig {
    /// Request the given version and profile
    #[must_use]
    pub const fn new(major: u8, minor: u8, profile: GlProfile) -> Self {
        Self { major, minor, profile }
    }

    /// Whether this request requires the extended (attribs-based) creation
    /// path rather than a legacy context
    ///
    /// Profiles only exist from 3.2 onward; anything at or above 3.0 is
    /// created through the attribs entry point so the exact version sticks.
    #[must_use]
    pub const fn needs_attribs(&self) -> bool {
        self.major >= 3
    }
}

impl Default for GlContextConfig {
    fn default() -> Self {
        Self::new(3, 3, GlProfile::Core)
    }
}

/// OpenGL profile selector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlProfile {
    /// Core profile
    Core,
    /// Compatibility profile
    Compatibility,
}

/// Caller-supplied OpenGL loader callback
///
/// Invoked once after the context is created and made current. The callback
/// receives a resolver for API entry points (backed by
/// `wglGetProcAddress`/`glXGetProcAddress` plus platform fallbacks) and
/// returns whether loading succeeded. Returning `false` tears down the
/// context *and* the window for that `create_window` call.
pub type GlLoader = fn(&dyn Fn(&str) -> *const c_void) -> bool;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_legacy_versions_skip_attribs_path() {
        assert!(!GlContextConfig::new(2, 1, GlProfile::Compatibility).needs_attribs());
        assert!(GlContextConfig::new(3, 3, GlProfile::Core).needs_attribs());
        assert!(GlContextConfig::new(4, 6, GlProfile::Core).needs_attribs());
    }

    #[test]
    fn test_default_selection_has_no_context() {
        assert_eq!(GraphicsConfig::default(), GraphicsConfig::None);
        assert!(GraphicsConfig::OpenGl(GlContextConfig::default()).is_opengl());
        assert!(!GraphicsConfig::Vulkan.is_opengl());
    }
}
