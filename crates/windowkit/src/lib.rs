//! # windowkit
//!
//! A cross-platform native windowing library: window lifecycle, normalized
//! keyboard/mouse/clipboard input, and OpenGL/Vulkan context brokering.
//!
//! ## Features
//!
//! - **Native Windows**: Win32 and X11 backends behind one platform-neutral surface
//! - **Normalized Input**: per-window key/lock/button state with edge-triggered callbacks
//! - **Graphics Brokering**: versioned OpenGL context negotiation and Vulkan surface creation
//! - **Clipboard**: UTF-8 text transfer, including X11 selection ownership
//! - **Generational Handles**: stale window handles are detected, never aliased
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use windowkit::prelude::*;
//!
//! fn main() -> WindowKitResult<()> {
//!     let mut system = WindowSystem::init()?;
//!     let window = system.create_window(
//!         &WindowConfig::new("demo").size(800, 600),
//!     )?;
//!
//!     while !system.is_closed(window)? {
//!         system.update(window)?;
//!         system.swap_buffers(window)?;
//!     }
//!
//!     system.destroy_window(window)?;
//!     system.terminate()
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod config;
pub mod cursor;
pub mod error;
pub mod gfx;
pub mod input;
pub mod logging;
pub mod system;
pub mod window;

mod backend;

pub use config::WindowConfig;
pub use cursor::CursorStyle;
pub use error::{Error, WindowKitResult};
pub use gfx::{GlContextConfig, GlLoader, GlProfile, GraphicsConfig};
pub use input::{Key, LockKey, MouseButton};
pub use system::WindowSystem;
pub use window::WindowId;

/// Common imports for windowkit users
pub mod prelude {
    pub use crate::{
        config::WindowConfig,
        cursor::CursorStyle,
        error::{Error, WindowKitResult},
        gfx::{GlContextConfig, GlProfile, GraphicsConfig},
        input::{Key, LockKey, MouseButton},
        system::WindowSystem,
        window::WindowId,
    };
}
