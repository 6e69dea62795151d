//! Win32 clipboard access
//!
//! Synchronous, unlike X11: the system keeps a copy of the data, so there is
//! no ownership to maintain after `set` returns. Text crosses the boundary
//! as UTF-16 and is transcoded to the crate's UTF-8 contract.

use windows_sys::Win32::Foundation::GetLastError;
use windows_sys::Win32::System::DataExchange::{
    CloseClipboard, EmptyClipboard, GetClipboardData, OpenClipboard, SetClipboardData,
};
use windows_sys::Win32::System::Memory::{
    GlobalAlloc, GlobalFree, GlobalLock, GlobalUnlock, GMEM_MOVEABLE,
};

use crate::error::{Error, WindowKitResult};

/// CF_UNICODETEXT clipboard format
const CF_UNICODETEXT: u32 = 13;

/// Read clipboard text, transcoded to UTF-8
pub(crate) fn get() -> WindowKitResult<Option<String>> {
    unsafe {
        if OpenClipboard(0) == 0 {
            return Err(Error::Clipboard(format!(
                "OpenClipboard failed (error {})",
                GetLastError()
            )));
        }
        let handle = GetClipboardData(CF_UNICODETEXT);
        if handle == 0 {
            CloseClipboard();
            return Ok(None);
        }
        let data = GlobalLock(handle).cast::<u16>();
        if data.is_null() {
            CloseClipboard();
            return Err(Error::Clipboard("clipboard data unlockable".to_string()));
        }
        let mut len = 0usize;
        while *data.add(len) != 0 {
            len += 1;
        }
        let text = String::from_utf16_lossy(std::slice::from_raw_parts(data, len));
        GlobalUnlock(handle);
        CloseClipboard();
        Ok(Some(text))
    }
}

/// Publish clipboard text, transcoded to UTF-16
pub(crate) fn set(text: &str) -> WindowKitResult<()> {
    let wide: Vec<u16> = text.encode_utf16().chain(std::iter::once(0)).collect();
    unsafe {
        if OpenClipboard(0) == 0 {
            return Err(Error::Clipboard(format!(
                "OpenClipboard failed (error {})",
                GetLastError()
            )));
        }
        EmptyClipboard();
        let bytes = wide.len() * std::mem::size_of::<u16>();
        let handle = GlobalAlloc(GMEM_MOVEABLE, bytes);
        if handle == 0 {
            CloseClipboard();
            return Err(Error::Clipboard("clipboard allocation failed".to_string()));
        }
        let destination = GlobalLock(handle).cast::<u16>();
        if destination.is_null() {
            GlobalFree(handle);
            CloseClipboard();
            return Err(Error::Clipboard("clipboard data unlockable".to_string()));
        }
        std::ptr::copy_nonoverlapping(wide.as_ptr(), destination, wide.len());
        GlobalUnlock(handle);
        // On success the system owns the allocation; free it only on failure.
        if SetClipboardData(CF_UNICODETEXT, handle) == 0 {
            GlobalFree(handle);
            CloseClipboard();
            return Err(Error::Clipboard(format!(
                "SetClipboardData failed (error {})",
                GetLastError()
            )));
        }
        CloseClipboard();
        Ok(())
    }
}
