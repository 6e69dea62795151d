//! Error taxonomy shared by every public operation
//!
//! All fallible operations report through [`Error`]; nothing in the crate
//! panics on a caller mistake. Invalid-handle and unsupported-configuration
//! errors leave all state unchanged, and window-creation failures are
//! unwound before the error is returned.

use thiserror::Error;

/// Windowing system errors
#[derive(Error, Debug)]
pub enum Error {
    /// A second `WindowSystem` was initialized while one was live
    #[error("window system is already initialized")]
    AlreadyInitialized,

    /// The platform backend could not be brought up
    #[error("platform backend unavailable: {0}")]
    BackendUnavailable(String),

    /// Operation given a handle that is inactive, destroyed, or stale
    #[error("invalid window handle")]
    InvalidHandle,

    /// The underlying OS or graphics call failed
    #[error("native call {call} failed: {detail}")]
    NativeCall {
        /// Name of the failing native entry point
        call: &'static str,
        /// Platform-reported detail, when available
        detail: String,
    },

    /// Requested configuration is not available on this platform or build
    #[error("unsupported configuration: {0}")]
    Unsupported(String),

    /// Window construction failed part-way; everything acquired was released
    #[error("window creation failed during {stage}: {detail}")]
    CreationFailed {
        /// The creation sub-step that failed
        stage: &'static str,
        /// Platform-reported detail, when available
        detail: String,
    },

    /// The caller-supplied OpenGL loader reported failure
    #[error("graphics API loader callback failed")]
    LoaderFailed,

    /// Clipboard transfer failed
    #[error("clipboard error: {0}")]
    Clipboard(String),
}

/// Result type for windowkit operations
pub type WindowKitResult<T> = Result<T, Error>;
