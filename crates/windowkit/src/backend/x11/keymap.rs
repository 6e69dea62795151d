//! Keysym translation
//!
//! Translates the unshifted keysym (group 0, index 0) into the
//! platform-neutral [`Key`]. Left/right modifier pairs arrive as distinct
//! keysyms on X11, so no scan-code disambiguation is needed here.

use std::os::raw::c_uint;

use x11_dl::keysym as ks;

use crate::input::Key;

/// Map an X11 keysym to a tracked key, if it is one we track
#[allow(clippy::too_many_lines)]
pub(crate) fn keysym_to_key(keysym: c_uint) -> Option<Key> {
    let key = match keysym {
        ks::XK_a | ks::XK_A => Key::A,
        ks::XK_b | ks::XK_B => Key::B,
        ks::XK_c | ks::XK_C => Key::C,
        ks::XK_d | ks::XK_D => Key::D,
        ks::XK_e | ks::XK_E => Key::E,
        ks::XK_f | ks::XK_F => Key::F,
        ks::XK_g | ks::XK_G => Key::G,
        ks::XK_h | ks::XK_H => Key::H,
        ks::XK_i | ks::XK_I => Key::I,
        ks::XK_j | ks::XK_J => Key::J,
        ks::XK_k | ks::XK_K => Key::K,
        ks::XK_l | ks::XK_L => Key::L,
        ks::XK_m | ks::XK_M => Key::M,
        ks::XK_n | ks::XK_N => Key::N,
        ks::XK_o | ks::XK_O => Key::O,
        ks::XK_p | ks::XK_P => Key::P,
        ks::XK_q | ks::XK_Q => Key::Q,
        ks::XK_r | ks::XK_R => Key::R,
        ks::XK_s | ks::XK_S => Key::S,
        ks::XK_t | ks::XK_T => Key::T,
        ks::XK_u | ks::XK_U => Key::U,
        ks::XK_v | ks::XK_V => Key::V,
        ks::XK_w | ks::XK_W => Key::W,
        ks::XK_x | ks::XK_X => Key::X,
        ks::XK_y | ks::XK_Y => Key::Y,
        ks::XK_z | ks::XK_Z => Key::Z,
        ks::XK_0 => Key::Digit0,
        ks::XK_1 => Key::Digit1,
        ks::XK_2 => Key::Digit2,
        ks::XK_3 => Key::Digit3,
        ks::XK_4 => Key::Digit4,
        ks::XK_5 => Key::Digit5,
        ks::XK_6 => Key::Digit6,
        ks::XK_7 => Key::Digit7,
        ks::XK_8 => Key::Digit8,
        ks::XK_9 => Key::Digit9,
        ks::XK_F1 => Key::F1,
        ks::XK_F2 => Key::F2,
        ks::XK_F3 => Key::F3,
        ks::XK_F4 => Key::F4,
        ks::XK_F5 => Key::F5,
        ks::XK_F6 => Key::F6,
        ks::XK_F7 => Key::F7,
        ks::XK_F8 => Key::F8,
        ks::XK_F9 => Key::F9,
        ks::XK_F10 => Key::F10,
        ks::XK_F11 => Key::F11,
        ks::XK_F12 => Key::F12,
        ks::XK_Escape => Key::Escape,
        ks::XK_Return => Key::Enter,
        ks::XK_Tab => Key::Tab,
        ks::XK_BackSpace => Key::Backspace,
        ks::XK_space => Key::Space,
        ks::XK_Insert => Key::Insert,
        ks::XK_Delete => Key::Delete,
        ks::XK_Home => Key::Home,
        ks::XK_End => Key::End,
        ks::XK_Prior => Key::PageUp,
        ks::XK_Next => Key::PageDown,
        ks::XK_Left => Key::Left,
        ks::XK_Right => Key::Right,
        ks::XK_Up => Key::Up,
        ks::XK_Down => Key::Down,
        ks::XK_Shift_L => Key::LeftShift,
        ks::XK_Shift_R => Key::RightShift,
        ks::XK_Control_L => Key::LeftControl,
        ks::XK_Control_R => Key::RightControl,
        ks::XK_Alt_L => Key::LeftAlt,
        ks::XK_Alt_R => Key::RightAlt,
        ks::XK_Super_L => Key::LeftSuper,
        ks::XK_Super_R => Key::RightSuper,
        ks::XK_Caps_Lock => Key::CapsLock,
        ks::XK_Num_Lock => Key::NumLock,
        ks::XK_Scroll_Lock => Key::ScrollLock,
        ks::XK_minus => Key::Minus,
        ks::XK_equal => Key::Equal,
        ks::XK_bracketleft => Key::LeftBracket,
        ks::XK_bracketright => Key::RightBracket,
        ks::XK_backslash => Key::Backslash,
        ks::XK_semicolon => Key::Semicolon,
        ks::XK_apostrophe => Key::Apostrophe,
        ks::XK_grave => Key::Grave,
        ks::XK_comma => Key::Comma,
        ks::XK_period => Key::Period,
        ks::XK_slash => Key::Slash,
        ks::XK_KP_0 | ks::XK_KP_Insert => Key::Numpad0,
        ks::XK_KP_1 | ks::XK_KP_End => Key::Numpad1,
        ks::XK_KP_2 | ks::XK_KP_Down => Key::Numpad2,
        ks::XK_KP_3 | ks::XK_KP_Next => Key::Numpad3,
        ks::XK_KP_4 | ks::XK_KP_Left => Key::Numpad4,
        ks::XK_KP_5 | ks::XK_KP_Begin => Key::Numpad5,
        ks::XK_KP_6 | ks::XK_KP_Right => Key::Numpad6,
        ks::XK_KP_7 | ks::XK_KP_Home => Key::Numpad7,
        ks::XK_KP_8 | ks::XK_KP_Up => Key::Numpad8,
        ks::XK_KP_9 | ks::XK_KP_Prior => Key::Numpad9,
        ks::XK_KP_Decimal | ks::XK_KP_Delete => Key::NumpadDecimal,
        ks::XK_KP_Divide => Key::NumpadDivide,
        ks::XK_KP_Multiply => Key::NumpadMultiply,
        ks::XK_KP_Subtract => Key::NumpadSubtract,
        ks::XK_KP_Add => Key::NumpadAdd,
        ks::XK_KP_Enter => Key::NumpadEnter,
        ks::XK_Print => Key::PrintScreen,
        ks::XK_Pause => Key::Pause,
        ks::XK_Menu => Key::Menu,
        _ => return None,
    };
    Some(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_letters_map_case_insensitively() {
        assert_eq!(keysym_to_key(ks::XK_a), Some(Key::A));
        assert_eq!(keysym_to_key(ks::XK_A), Some(Key::A));
        assert_eq!(keysym_to_key(ks::XK_z), Some(Key::Z));
    }

    #[test]
    fn test_modifier_sides_stay_distinct() {
        assert_eq!(keysym_to_key(ks::XK_Shift_L), Some(Key::LeftShift));
        assert_eq!(keysym_to_key(ks::XK_Shift_R), Some(Key::RightShift));
        assert_ne!(
            keysym_to_key(ks::XK_Control_L),
            keysym_to_key(ks::XK_Control_R)
        );
    }

    #[test]
    fn test_keypad_navigation_aliases_collapse() {
        assert_eq!(keysym_to_key(ks::XK_KP_Home), Some(Key::Numpad7));
        assert_eq!(keysym_to_key(ks::XK_KP_7), Some(Key::Numpad7));
    }

    #[test]
    fn test_unknown_keysyms_are_ignored() {
        assert_eq!(keysym_to_key(0), None);
        assert_eq!(keysym_to_key(0xffff_ffff), None);
    }
}
