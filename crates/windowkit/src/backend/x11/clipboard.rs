//! X11 selection-based clipboard
//!
//! X11 never copies clipboard data out of the owning process: whoever calls
//! `set` must stay around to answer conversion requests for as long as it
//! owns the CLIPBOARD selection. That responder runs on a dedicated
//! background thread with its own display connection (Xlib handles must not
//! cross threads).
//!
//! Replacement is single-flight: a new `set` signals the previous responder
//! through an atomic stop flag, joins it, and only then spawns its own.
//! There are never two responders answering concurrently.

use std::os::raw::{c_char, c_int, c_long, c_uchar, c_ulong, c_void};
use std::ptr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use log::{debug, warn};
use x11_dl::xlib;

use super::{Connection, XA_ATOM, XA_STRING};
use crate::error::{Error, WindowKitResult};

/// How long the responder sleeps between queue polls
const RESPONDER_POLL: Duration = Duration::from_millis(10);

/// A live responder thread and its stop signal
pub(crate) struct Responder {
    stop: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

impl Responder {
    pub(crate) fn new(stop: Arc<AtomicBool>, handle: JoinHandle<()>) -> Self {
        Self { stop, handle }
    }

    /// Signal the thread and wait for it to exit
    fn stop_and_join(self) {
        self.stop.store(true, Ordering::Release);
        if self.handle.join().is_err() {
            warn!("clipboard responder thread panicked");
        }
    }
}

/// Owner-side clipboard state: at most one responder at a time
#[derive(Default)]
pub(crate) struct ClipboardService {
    responder: Option<Responder>,
}

impl ClipboardService {
    /// Replace any active responder with `responder`
    fn install(&mut self, responder: Responder) {
        self.stop_responder();
        self.responder = Some(responder);
    }

    fn stop_responder(&mut self) {
        if let Some(previous) = self.responder.take() {
            previous.stop_and_join();
        }
    }

    /// Claim the CLIPBOARD selection and start answering requests
    pub(crate) fn set(&mut self, text: &str) -> WindowKitResult<()> {
        // Cancel-then-join-then-spawn; the new thread must see the old
        // owner's window already gone.
        self.stop_responder();

        let stop = Arc::new(AtomicBool::new(false));
        let thread_stop = Arc::clone(&stop);
        let payload = text.as_bytes().to_vec();
        let (ready_tx, ready_rx) = mpsc::channel::<Result<(), String>>();

        let handle = thread::Builder::new()
            .name("windowkit-clipboard".to_string())
            .spawn(move || responder_main(&payload, &thread_stop, &ready_tx))
            .map_err(|e| Error::Clipboard(format!("cannot spawn responder: {e}")))?;

        match ready_rx.recv() {
            Ok(Ok(())) => {
                self.install(Responder::new(stop, handle));
                Ok(())
            }
            Ok(Err(detail)) => {
                let _ = handle.join();
                Err(Error::Clipboard(detail))
            }
            Err(_) => {
                let _ = handle.join();
                Err(Error::Clipboard("responder exited before claiming".to_string()))
            }
        }
    }
}

impl Drop for ClipboardService {
    fn drop(&mut self) {
        self.stop_responder();
    }
}

/// Responder thread body: own the selection, answer until stopped
fn responder_main(payload: &[u8], stop: &AtomicBool, ready: &mpsc::Sender<Result<(), String>>) {
    let lib = match xlib::Xlib::open() {
        Ok(lib) => lib,
        Err(e) => {
            let _ = ready.send(Err(format!("libX11 not loadable: {e}")));
            return;
        }
    };
    let display = unsafe { (lib.XOpenDisplay)(ptr::null()) };
    if display.is_null() {
        let _ = ready.send(Err("cannot open display for responder".to_string()));
        return;
    }
    let screen = unsafe { (lib.XDefaultScreen)(display) };
    let root = unsafe { (lib.XRootWindow)(display, screen) };
    let owner = unsafe { (lib.XCreateSimpleWindow)(display, root, 0, 0, 1, 1, 0, 0, 0) };

    let intern = |name: &[u8]| -> xlib::Atom {
        unsafe { (lib.XInternAtom)(display, name.as_ptr().cast::<c_char>(), 0) }
    };
    let clipboard = intern(b"CLIPBOARD\0");
    let utf8_string = intern(b"UTF8_STRING\0");
    let targets = intern(b"TARGETS\0");

    unsafe {
        (lib.XSetSelectionOwner)(display, clipboard, owner, xlib::CurrentTime);
    }
    let claimed = unsafe { (lib.XGetSelectionOwner)(display, clipboard) } == owner;
    if !claimed {
        unsafe {
            (lib.XDestroyWindow)(display, owner);
            (lib.XCloseDisplay)(display);
        }
        let _ = ready.send(Err("server refused selection ownership".to_string()));
        return;
    }
    let _ = ready.send(Ok(()));
    debug!("clipboard responder owns CLIPBOARD ({} bytes)", payload.len());

    let mut event: xlib::XEvent = unsafe { std::mem::zeroed() };
    'serve: while !stop.load(Ordering::Acquire) {
        while unsafe { (lib.XPending)(display) } > 0 {
            unsafe { (lib.XNextEvent)(display, &mut event) };
            match event.get_type() {
                xlib::SelectionRequest => {
                    let request = unsafe { event.selection_request };
                    answer_request(&lib, display, &request, payload, utf8_string, targets);
                }
                xlib::SelectionClear => {
                    // Another client took the selection; ownership is gone
                    // and there is nothing left to answer for.
                    debug!("clipboard ownership lost to another client");
                    break 'serve;
                }
                _ => {}
            }
        }
        thread::sleep(RESPONDER_POLL);
    }

    unsafe {
        (lib.XDestroyWindow)(display, owner);
        (lib.XCloseDisplay)(display);
    }
}

/// Answer one SelectionRequest and send the matching SelectionNotify
fn answer_request(
    lib: &xlib::Xlib,
    display: *mut xlib::Display,
    request: &xlib::XSelectionRequestEvent,
    payload: &[u8],
    utf8_string: xlib::Atom,
    targets: xlib::Atom,
) {
    // Pre-ICCCM clients may pass property None; answer into the target atom.
    let property = if request.property == 0 {
        request.target
    } else {
        request.property
    };

    let answered = if request.target == utf8_string || request.target == XA_STRING {
        unsafe {
            (lib.XChangeProperty)(
                display,
                request.requestor,
                property,
                request.target,
                8,
                xlib::PropModeReplace,
                payload.as_ptr(),
                payload.len() as c_int,
            );
        }
        true
    } else if request.target == targets {
        let list: [xlib::Atom; 3] = [targets, utf8_string, XA_STRING];
        unsafe {
            (lib.XChangeProperty)(
                display,
                request.requestor,
                property,
                XA_ATOM,
                32,
                xlib::PropModeReplace,
                list.as_ptr().cast::<c_uchar>(),
                list.len() as c_int,
            );
        }
        true
    } else {
        false
    };

    let mut notify: xlib::XEvent = unsafe { std::mem::zeroed() };
    unsafe {
        notify.selection.type_ = xlib::SelectionNotify;
        notify.selection.display = display;
        notify.selection.requestor = request.requestor;
        notify.selection.selection = request.selection;
        notify.selection.target = request.target;
        notify.selection.property = if answered { property } else { 0 };
        notify.selection.time = request.time;
        (lib.XSendEvent)(display, request.requestor, 0, 0, &mut notify);
        (lib.XFlush)(display);
    }
}

/// Predicate for the blocking SelectionNotify wait
unsafe extern "C" fn is_selection_notify(
    _display: *mut xlib::Display,
    event: *mut xlib::XEvent,
    arg: xlib::XPointer,
) -> c_int {
    let requestor = *arg.cast::<xlib::Window>();
    let event = &*event;
    (event.get_type() == xlib::SelectionNotify && event.selection.requestor == requestor) as c_int
}

/// Request the CLIPBOARD selection as UTF-8 text
///
/// Blocks the calling thread until the owner answers. The wait is unbounded
/// when an owner exists but never responds; absence of an owner returns
/// `None` immediately.
pub(crate) fn get(conn: &Connection, requestor: xlib::Window) -> WindowKitResult<Option<String>> {
    let x = &conn.xlib;
    let atoms = conn.atoms;

    let owner = unsafe { (x.XGetSelectionOwner)(conn.display, atoms.clipboard) };
    if owner == 0 {
        return Ok(None);
    }

    unsafe {
        (x.XDeleteProperty)(conn.display, requestor, atoms.selection_property);
        (x.XConvertSelection)(
            conn.display,
            atoms.clipboard,
            atoms.utf8_string,
            atoms.selection_property,
            requestor,
            xlib::CurrentTime,
        );
    }

    // Block until the owner's SelectionNotify for our requestor arrives.
    // Events for other windows stay queued; XIfEvent only removes the match.
    let mut event: xlib::XEvent = unsafe { std::mem::zeroed() };
    let mut target = requestor;
    unsafe {
        (x.XIfEvent)(
            conn.display,
            &mut event,
            Some(is_selection_notify),
            std::ptr::addr_of_mut!(target).cast::<c_char>(),
        );
    }
    let notify = unsafe { event.selection };
    if notify.property == 0 {
        // Owner exists but cannot produce text.
        return Ok(None);
    }

    read_text_property(conn, requestor, notify.property)
}

/// Read and delete the transferred property, decoding it as UTF-8
fn read_text_property(
    conn: &Connection,
    window: xlib::Window,
    property: xlib::Atom,
) -> WindowKitResult<Option<String>> {
    let x = &conn.xlib;
    let mut actual_type: xlib::Atom = 0;
    let mut actual_format: c_int = 0;
    let mut item_count: c_ulong = 0;
    let mut bytes_after: c_ulong = 0;
    let mut data: *mut c_uchar = ptr::null_mut();
    let status = unsafe {
        (x.XGetWindowProperty)(
            conn.display,
            window,
            property,
            0,
            c_long::MAX / 4,
            1,
            0, // AnyPropertyType
            &mut actual_type,
            &mut actual_format,
            &mut item_count,
            &mut bytes_after,
            &mut data,
        )
    };
    if status != 0 {
        return Err(Error::Clipboard("selection property unreadable".to_string()));
    }
    if data.is_null() {
        return Ok(None);
    }
    let result = if actual_type == conn.atoms.incr {
        // Chunked INCR transfers are not supported; treat as absent.
        warn!("selection owner offered an INCR transfer; ignoring");
        None
    } else if actual_format == 8 {
        let bytes =
            unsafe { std::slice::from_raw_parts(data.cast::<u8>(), item_count as usize) };
        Some(String::from_utf8_lossy(bytes).into_owned())
    } else {
        None
    };
    unsafe { (x.XFree)(data.cast::<c_void>()) };
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn fake_responder(active: &Arc<AtomicUsize>) -> Responder {
        let stop = Arc::new(AtomicBool::new(false));
        let thread_stop = Arc::clone(&stop);
        let counter = Arc::clone(active);
        counter.fetch_add(1, Ordering::SeqCst);
        let handle = thread::spawn(move || {
            while !thread_stop.load(Ordering::Acquire) {
                thread::sleep(Duration::from_millis(1));
            }
            counter.fetch_sub(1, Ordering::SeqCst);
        });
        Responder::new(stop, handle)
    }

    #[test]
    fn test_install_is_single_flight() {
        let active = Arc::new(AtomicUsize::new(0));
        let mut service = ClipboardService::default();

        service.install(fake_responder(&active));
        assert_eq!(active.load(Ordering::SeqCst), 1);

        // Replacing must join the previous responder before the new one is
        // recorded: never two alive at once afterwards.
        service.install(fake_responder(&active));
        assert_eq!(active.load(Ordering::SeqCst), 1);

        service.stop_responder();
        assert_eq!(active.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_drop_stops_responder() {
        let active = Arc::new(AtomicUsize::new(0));
        {
            let mut service = ClipboardService::default();
            service.install(fake_responder(&active));
            assert_eq!(active.load(Ordering::SeqCst), 1);
        }
        assert_eq!(active.load(Ordering::SeqCst), 0);
    }
}
