//! Cursor styles
//!
//! Each window carries one native cursor resource. Changing the style
//! releases the previous resource, creates the new one, and reasserts it as
//! the active cursor; the resource is released with the window.

/// Cursor appearance for a window
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum CursorStyle {
    /// Default arrow cursor
    #[default]
    Arrow,
    /// Text/I-beam cursor
    IBeam,
    /// Crosshair cursor
    Crosshair,
    /// Pointing-hand cursor
    Hand,
    /// Horizontal resize cursor
    ResizeEw,
    /// Vertical resize cursor
    ResizeNs,
    /// Four-way move cursor
    Move,
    /// Busy/wait cursor
    Wait,
    /// No cursor is shown while over the window
    Hidden,
}
