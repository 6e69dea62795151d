//! Virtual-key translation
//!
//! Win32 reports generic VK_SHIFT/VK_CONTROL/VK_MENU codes; the left/right
//! distinction lives in the scan code (for Shift) and the extended-key bit
//! (for Control/Alt), so translation takes the full message pair.

use windows_sys::Win32::UI::Input::KeyboardAndMouse::{
    MapVirtualKeyW, MAPVK_VSC_TO_VK_EX, VK_ADD, VK_APPS, VK_BACK, VK_CAPITAL, VK_CONTROL,
    VK_DECIMAL, VK_DELETE, VK_DIVIDE, VK_DOWN, VK_END, VK_ESCAPE, VK_F1, VK_F10, VK_F11, VK_F12,
    VK_F2, VK_F3, VK_F4, VK_F5, VK_F6, VK_F7, VK_F8, VK_F9, VK_HOME, VK_INSERT, VK_LEFT,
    VK_LSHIFT, VK_LWIN, VK_MENU, VK_MULTIPLY, VK_NEXT, VK_NUMLOCK, VK_NUMPAD0, VK_NUMPAD1,
    VK_NUMPAD2, VK_NUMPAD3, VK_NUMPAD4, VK_NUMPAD5, VK_NUMPAD6, VK_NUMPAD7, VK_NUMPAD8,
    VK_NUMPAD9, VK_OEM_1, VK_OEM_2, VK_OEM_3, VK_OEM_4, VK_OEM_5, VK_OEM_6, VK_OEM_7,
    VK_OEM_COMMA, VK_OEM_MINUS, VK_OEM_PERIOD, VK_OEM_PLUS, VK_PAUSE, VK_PRIOR, VK_RETURN,
    VK_RIGHT, VK_RWIN, VK_SCROLL, VK_SHIFT, VK_SNAPSHOT, VK_SPACE, VK_SUBTRACT, VK_TAB, VK_UP,
};

use crate::input::Key;

const LETTERS: [Key; 26] = [
    Key::A,
    Key::B,
    Key::C,
    Key::D,
    Key::E,
    Key::F,
    Key::G,
    Key::H,
    Key::I,
    Key::J,
    Key::K,
    Key::L,
    Key::M,
    Key::N,
    Key::O,
    Key::P,
    Key::Q,
    Key::R,
    Key::S,
    Key::T,
    Key::U,
    Key::V,
    Key::W,
    Key::X,
    Key::Y,
    Key::Z,
];

const DIGITS: [Key; 10] = [
    Key::Digit0,
    Key::Digit1,
    Key::Digit2,
    Key::Digit3,
    Key::Digit4,
    Key::Digit5,
    Key::Digit6,
    Key::Digit7,
    Key::Digit8,
    Key::Digit9,
];

/// Map a WM_KEY* message pair to a tracked key, if it is one we track
#[allow(clippy::too_many_lines)]
pub(crate) fn vk_to_key(wparam: usize, lparam: isize) -> Option<Key> {
    let vk = wparam as u16;
    let scancode = ((lparam >> 16) & 0xff) as u32;
    let extended = (lparam >> 24) & 1 != 0;

    if (0x41..=0x5A).contains(&vk) {
        return Some(LETTERS[(vk - 0x41) as usize]);
    }
    if (0x30..=0x39).contains(&vk) {
        return Some(DIGITS[(vk - 0x30) as usize]);
    }

    let key = match vk {
        // Generic modifiers carry the side in scan-code/extended data.
        VK_SHIFT => {
            let resolved = unsafe { MapVirtualKeyW(scancode, MAPVK_VSC_TO_VK_EX) } as u16;
            if resolved == VK_LSHIFT {
                Key::LeftShift
            } else {
                Key::RightShift
            }
        }
        VK_CONTROL => {
            if extended {
                Key::RightControl
            } else {
                Key::LeftControl
            }
        }
        VK_MENU => {
            if extended {
                Key::RightAlt
            } else {
                Key::LeftAlt
            }
        }
        VK_RETURN => {
            if extended {
                Key::NumpadEnter
            } else {
                Key::Enter
            }
        }
        VK_F1 => Key::F1,
        VK_F2 => Key::F2,
        VK_F3 => Key::F3,
        VK_F4 => Key::F4,
        VK_F5 => Key::F5,
        VK_F6 => Key::F6,
        VK_F7 => Key::F7,
        VK_F8 => Key::F8,
        VK_F9 => Key::F9,
        VK_F10 => Key::F10,
        VK_F11 => Key::F11,
        VK_F12 => Key::F12,
        VK_ESCAPE => Key::Escape,
        VK_TAB => Key::Tab,
        VK_BACK => Key::Backspace,
        VK_SPACE => Key::Space,
        VK_INSERT => Key::Insert,
        VK_DELETE => Key::Delete,
        VK_HOME => Key::Home,
        VK_END => Key::End,
        VK_PRIOR => Key::PageUp,
        VK_NEXT => Key::PageDown,
        VK_LEFT => Key::Left,
        VK_RIGHT => Key::Right,
        VK_UP => Key::Up,
        VK_DOWN => Key::Down,
        VK_LWIN => Key::LeftSuper,
        VK_RWIN => Key::RightSuper,
        VK_CAPITAL => Key::CapsLock,
        VK_NUMLOCK => Key::NumLock,
        VK_SCROLL => Key::ScrollLock,
        VK_OEM_MINUS => Key::Minus,
        VK_OEM_PLUS => Key::Equal,
        VK_OEM_4 => Key::LeftBracket,
        VK_OEM_6 => Key::RightBracket,
        VK_OEM_5 => Key::Backslash,
        VK_OEM_1 => Key::Semicolon,
        VK_OEM_7 => Key::Apostrophe,
        VK_OEM_3 => Key::Grave,
        VK_OEM_COMMA => Key::Comma,
        VK_OEM_PERIOD => Key::Period,
        VK_OEM_2 => Key::Slash,
        VK_NUMPAD0 => Key::Numpad0,
        VK_NUMPAD1 => Key::Numpad1,
        VK_NUMPAD2 => Key::Numpad2,
        VK_NUMPAD3 => Key::Numpad3,
        VK_NUMPAD4 => Key::Numpad4,
        VK_NUMPAD5 => Key::Numpad5,
        VK_NUMPAD6 => Key::Numpad6,
        VK_NUMPAD7 => Key::Numpad7,
        VK_NUMPAD8 => Key::Numpad8,
        VK_NUMPAD9 => Key::Numpad9,
        VK_DECIMAL => Key::NumpadDecimal,
        VK_DIVIDE => Key::NumpadDivide,
        VK_MULTIPLY => Key::NumpadMultiply,
        VK_SUBTRACT => Key::NumpadSubtract,
        VK_ADD => Key::NumpadAdd,
        VK_SNAPSHOT => Key::PrintScreen,
        VK_PAUSE => Key::Pause,
        VK_APPS => Key::Menu,
        _ => return None,
    };
    Some(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_letters_and_digits_map_by_range() {
        assert_eq!(vk_to_key(0x41, 0), Some(Key::A));
        assert_eq!(vk_to_key(0x5A, 0), Some(Key::Z));
        assert_eq!(vk_to_key(0x30, 0), Some(Key::Digit0));
        assert_eq!(vk_to_key(0x39, 0), Some(Key::Digit9));
    }

    #[test]
    fn test_extended_bit_disambiguates_sides() {
        let extended = 1 << 24;
        assert_eq!(vk_to_key(usize::from(VK_CONTROL), 0), Some(Key::LeftControl));
        assert_eq!(
            vk_to_key(usize::from(VK_CONTROL), extended),
            Some(Key::RightControl)
        );
        assert_eq!(vk_to_key(usize::from(VK_MENU), extended), Some(Key::RightAlt));
        assert_eq!(
            vk_to_key(usize::from(VK_RETURN), extended),
            Some(Key::NumpadEnter)
        );
    }

    #[test]
    fn test_unknown_virtual_keys_are_ignored() {
        assert_eq!(vk_to_key(0xFF, 0), None);
    }
}
