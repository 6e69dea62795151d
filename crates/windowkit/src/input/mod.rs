//! Input state tracking
//!
//! Each window owns one [`InputState`]: three fixed-size bit arrays for
//! keyboard keys, keyboard lock indicators, and mouse buttons. Only the
//! platform event pump mutates them; the public getters are hot-path polling
//! calls that report "up/off" for an invalid handle instead of failing.
//!
//! The `set_*` mutators report whether the bit actually changed, which is
//! what makes keyboard and lock callbacks edge-triggered: a held key that is
//! re-reported by the platform never fires a second callback.

/// Keyboard keys, identified by position-independent symbolic name
///
/// Left/right modifier pairs are distinct keys; the platform layer
/// disambiguates them from scan-code data before events reach this enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    /// A key
    A,
    /// B key
    B,
    /// C key
    C,
    /// D key
    D,
    /// E key
    E,
    /// F key
    F,
    /// G key
    G,
    /// H key
    H,
    /// I key
    I,
    /// J key
    J,
    /// K key
    K,
    /// L key
    L,
    /// M key
    M,
    /// N key
    N,
    /// O key
    O,
    /// P key
    P,
    /// Q key
    Q,
    /// R key
    R,
    /// S key
    S,
    /// T key
    T,
    /// U key
    U,
    /// V key
    V,
    /// W key
    W,
    /// X key
    X,
    /// Y key
    Y,
    /// Z key
    Z,
    /// Top-row 0
    Digit0,
    /// Top-row 1
    Digit1,
    /// Top-row 2
    Digit2,
    /// Top-row 3
    Digit3,
    /// Top-row 4
    Digit4,
    /// Top-row 5
    Digit5,
    /// Top-row 6
    Digit6,
    /// Top-row 7
    Digit7,
    /// Top-row 8
    Digit8,
    /// Top-row 9
    Digit9,
    /// F1 key
    F1,
    /// F2 key
    F2,
    /// F3 key
    F3,
    /// F4 key
    F4,
    /// F5 key
    F5,
    /// F6 key
    F6,
    /// F7 key
    F7,
    /// F8 key
    F8,
    /// F9 key
    F9,
    /// F10 key
    F10,
    /// F11 key
    F11,
    /// F12 key
    F12,
    /// Escape key
    Escape,
    /// Enter/Return key
    Enter,
    /// Tab key
    Tab,
    /// Backspace key
    Backspace,
    /// Space bar
    Space,
    /// Insert key
    Insert,
    /// Delete key
    Delete,
    /// Home key
    Home,
    /// End key
    End,
    /// Page Up key
    PageUp,
    /// Page Down key
    PageDown,
    /// Left arrow
    Left,
    /// Right arrow
    Right,
    /// Up arrow
    Up,
    /// Down arrow
    Down,
    /// Left Shift
    LeftShift,
    /// Right Shift
    RightShift,
    /// Left Control
    LeftControl,
    /// Right Control
    RightControl,
    /// Left Alt
    LeftAlt,
    /// Right Alt
    RightAlt,
    /// Left Super (Windows/logo) key
    LeftSuper,
    /// Right Super (Windows/logo) key
    RightSuper,
    /// Caps Lock key (the key itself, not the lock indicator)
    CapsLock,
    /// Num Lock key
    NumLock,
    /// Scroll Lock key
    ScrollLock,
    /// `-` key
    Minus,
    /// `=` key
    Equal,
    /// `[` key
    LeftBracket,
    /// `]` key
    RightBracket,
    /// `\` key
    Backslash,
    /// `;` key
    Semicolon,
    /// `'` key
    Apostrophe,
    /// `` ` `` key
    Grave,
    /// `,` key
    Comma,
    /// `.` key
    Period,
    /// `/` key
    Slash,
    /// Keypad 0
    Numpad0,
    /// Keypad 1
    Numpad1,
    /// Keypad 2
    Numpad2,
    /// Keypad 3
    Numpad3,
    /// Keypad 4
    Numpad4,
    /// Keypad 5
    Numpad5,
    /// Keypad 6
    Numpad6,
    /// Keypad 7
    Numpad7,
    /// Keypad 8
    Numpad8,
    /// Keypad 9
    Numpad9,
    /// Keypad decimal point
    NumpadDecimal,
    /// Keypad divide
    NumpadDivide,
    /// Keypad multiply
    NumpadMultiply,
    /// Keypad subtract
    NumpadSubtract,
    /// Keypad add
    NumpadAdd,
    /// Keypad Enter
    NumpadEnter,
    /// Print Screen key
    PrintScreen,
    /// Pause/Break key
    Pause,
    /// Context-menu key
    Menu,
}

impl Key {
    /// Number of distinct keys tracked per window
    pub const COUNT: usize = 104;

    /// Stable index of this key into the per-window bit array
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// Toggle-style keyboard lock indicators
///
/// Tracked independently of key press/release: the platform layer polls the
/// OS-global indicator state on every update rather than deriving it from
/// key events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LockKey {
    /// Caps Lock indicator
    CapsLock,
    /// Num Lock indicator
    NumLock,
    /// Scroll Lock indicator
    ScrollLock,
}

impl LockKey {
    /// Number of lock indicators tracked per window
    pub const COUNT: usize = 3;

    /// Stable index of this lock into the per-window bit array
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// Mouse buttons
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    /// Left mouse button
    Left,
    /// Right mouse button
    Right,
    /// Middle mouse button
    Middle,
    /// First extended (side) button
    X1,
    /// Second extended (side) button
    X2,
}

impl MouseButton {
    /// Number of mouse buttons tracked per window
    pub const COUNT: usize = 5;

    /// Stable index of this button into the per-window bit array
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }
}

const KEY_WORDS: usize = Key::COUNT.div_ceil(64);

/// Per-window input bit arrays
///
/// Mutation is private to the event pump; everything else reads.
#[derive(Debug, Clone, Default)]
pub(crate) struct InputState {
    keys: [u64; KEY_WORDS],
    locks: u8,
    buttons: u8,
}

impl InputState {
    /// Whether a key is currently down
    pub(crate) fn key(&self, key: Key) -> bool {
        let idx = key.index();
        self.keys[idx / 64] & (1 << (idx % 64)) != 0
    }

    /// Record a key transition; returns true when the bit actually changed
    pub(crate) fn set_key(&mut self, key: Key, down: bool) -> bool {
        let idx = key.index();
        let mask = 1u64 << (idx % 64);
        let word = &mut self.keys[idx / 64];
        let was = *word & mask != 0;
        if down {
            *word |= mask;
        } else {
            *word &= !mask;
        }
        was != down
    }

    /// Whether a lock indicator is currently on
    pub(crate) fn lock(&self, lock: LockKey) -> bool {
        self.locks & (1 << lock.index()) != 0
    }

    /// Record a lock transition; returns true when the bit actually changed
    pub(crate) fn set_lock(&mut self, lock: LockKey, on: bool) -> bool {
        let mask = 1u8 << lock.index();
        let was = self.locks & mask != 0;
        if on {
            self.locks |= mask;
        } else {
            self.locks &= !mask;
        }
        was != on
    }

    /// Whether a mouse button is currently down
    pub(crate) fn button(&self, button: MouseButton) -> bool {
        self.buttons & (1 << button.index()) != 0
    }

    /// Record a button transition; returns true when the bit actually changed
    pub(crate) fn set_button(&mut self, button: MouseButton, down: bool) -> bool {
        let mask = 1u8 << button.index();
        let was = self.buttons & mask != 0;
        if down {
            self.buttons |= mask;
        } else {
            self.buttons &= !mask;
        }
        was != down
    }

    /// Zero all three arrays
    ///
    /// Invoked on focus loss and window destruction. Deliberately does not
    /// synthesize release transitions; callers that need per-key callbacks
    /// must not get them from a flush.
    pub(crate) fn flush(&mut self) {
        self.keys = [0; KEY_WORDS];
        self.locks = 0;
        self.buttons = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_indices_are_dense() {
        assert_eq!(Key::A.index(), 0);
        assert_eq!(Key::Menu.index(), Key::COUNT - 1);
        assert_eq!(MouseButton::X2.index(), MouseButton::COUNT - 1);
        assert_eq!(LockKey::ScrollLock.index(), LockKey::COUNT - 1);
    }

    #[test]
    fn test_set_key_reports_edges_only() {
        let mut state = InputState::default();
        assert!(state.set_key(Key::W, true));
        assert!(!state.set_key(Key::W, true), "held key is not an edge");
        assert!(state.key(Key::W));
        assert!(state.set_key(Key::W, false));
        assert!(!state.set_key(Key::W, false));
        assert!(!state.key(Key::W));
    }

    #[test]
    fn test_keys_in_separate_words_do_not_interfere() {
        let mut state = InputState::default();
        state.set_key(Key::A, true);
        state.set_key(Key::Menu, true);
        assert!(state.key(Key::A));
        assert!(state.key(Key::Menu));
        state.set_key(Key::A, false);
        assert!(!state.key(Key::A));
        assert!(state.key(Key::Menu));
    }

    #[test]
    fn test_locks_and_buttons_toggle() {
        let mut state = InputState::default();
        assert!(state.set_lock(LockKey::CapsLock, true));
        assert!(!state.set_lock(LockKey::CapsLock, true));
        assert!(state.lock(LockKey::CapsLock));
        assert!(!state.lock(LockKey::NumLock));

        assert!(state.set_button(MouseButton::Right, true));
        assert!(state.button(MouseButton::Right));
        assert!(!state.button(MouseButton::Left));
    }

    #[test]
    fn test_flush_zeroes_everything() {
        let mut state = InputState::default();
        state.set_key(Key::Space, true);
        state.set_lock(LockKey::NumLock, true);
        state.set_button(MouseButton::Middle, true);
        state.flush();
        assert!(!state.key(Key::Space));
        assert!(!state.lock(LockKey::NumLock));
        assert!(!state.button(MouseButton::Middle));
    }
}
