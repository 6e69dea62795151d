//! Window creation settings
//!
//! Settings are an explicit per-call value, consumed by
//! [`WindowSystem::create_window`](crate::system::WindowSystem::create_window).
//! Two windows created back-to-back with different intents can never
//! contaminate each other: nothing here is process-global.

use crate::cursor::CursorStyle;
use crate::gfx::{GlLoader, GraphicsConfig};

/// Settings consulted once at window creation
///
/// This is a pre-creation builder, not per-window state: after creation the
/// window owns its own copies of everything it needs.
#[derive(Clone, Debug)]
pub struct WindowConfig {
    /// Window title
    pub title: String,
    /// Initial client-area width in pixels
    pub width: u32,
    /// Initial client-area height in pixels
    pub height: u32,
    /// Initial screen position; `None` lets the window manager place it
    pub position: Option<(i32, i32)>,
    /// Whether the window is shown immediately
    pub visible: bool,
    /// Whether the user may resize the window
    pub resizable: bool,
    /// Minimum client dimensions enforced for the window's lifetime
    pub min_size: Option<(u32, u32)>,
    /// Maximum client dimensions enforced for the window's lifetime
    pub max_size: Option<(u32, u32)>,
    /// Initial cursor style
    pub cursor: CursorStyle,
    /// Graphics API selection
    pub graphics: GraphicsConfig,
    /// Loader invoked after OpenGL context creation, if any
    pub gl_loader: Option<GlLoader>,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "windowkit".to_string(),
            width: 800,
            height: 600,
            position: None,
            visible: true,
            resizable: true,
            min_size: None,
            max_size: None,
            cursor: CursorStyle::Arrow,
            graphics: GraphicsConfig::None,
            gl_loader: None,
        }
    }
}

impl WindowConfig {
    /// Create a configuration with a title and defaults for everything else
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// Set the initial client-area size
    #[must_use]
    pub const fn size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Set the initial screen position
    #[must_use]
    pub const fn position(mut self, x: i32, y: i32) -> Self {
        self.position = Some((x, y));
        self
    }

    /// Set initial visibility
    #[must_use]
    pub const fn visible(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }

    /// Set whether the user may resize the window
    #[must_use]
    pub const fn resizable(mut self, resizable: bool) -> Self {
        self.resizable = resizable;
        self
    }

    /// Set the minimum client dimensions
    #[must_use]
    pub const fn min_size(mut self, width: u32, height: u32) -> Self {
        self.min_size = Some((width, height));
        self
    }

    /// Set the maximum client dimensions
    #[must_use]
    pub const fn max_size(mut self, width: u32, height: u32) -> Self {
        self.max_size = Some((width, height));
        self
    }

    /// Set the initial cursor style
    #[must_use]
    pub const fn cursor(mut self, cursor: CursorStyle) -> Self {
        self.cursor = cursor;
        self
    }

    /// Select the graphics API
    #[must_use]
    pub const fn graphics(mut self, graphics: GraphicsConfig) -> Self {
        self.graphics = graphics;
        self
    }

    /// Supply the OpenGL loader callback
    #[must_use]
    pub fn gl_loader(mut self, loader: GlLoader) -> Self {
        self.gl_loader = Some(loader);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::{GlContextConfig, GlProfile};

    #[test]
    fn test_defaults() {
        let config = WindowConfig::default();
        assert_eq!((config.width, config.height), (800, 600));
        assert!(config.visible);
        assert!(config.resizable);
        assert!(config.position.is_none());
        assert_eq!(config.graphics, GraphicsConfig::None);
        assert_eq!(config.cursor, CursorStyle::Arrow);
    }

    #[test]
    fn test_builder_chains() {
        let config = WindowConfig::new("editor")
            .size(1280, 720)
            .position(40, 40)
            .resizable(false)
            .min_size(320, 240)
            .graphics(GraphicsConfig::OpenGl(GlContextConfig::new(
                4,
                1,
                GlProfile::Core,
            )));
        assert_eq!(config.title, "editor");
        assert_eq!(config.position, Some((40, 40)));
        assert!(!config.resizable);
        assert_eq!(config.min_size, Some((320, 240)));
        assert!(config.graphics.is_opengl());
    }
}
