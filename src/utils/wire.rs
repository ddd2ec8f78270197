//! Request/response tracing for the HTTP gateway.
//!
//! Events go to the `objquery::wire` log target at TRACE. Tests can also
//! capture them on the current thread with [`capture`].

use std::cell::RefCell;
use std::fmt;

use log::Level;

/// Log target for wire events.
pub const WIRE_TARGET: &str = "objquery::wire";

/// Longest response body rendered into a trace line.
const BODY_PREVIEW: usize = 2048;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WireEvent {
    Send { method: &'static str, url: String, query: Vec<(String, String)> },
    Recv { status: u16, url: String, body: String },
}

impl fmt::Display for WireEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Send { method, url, query } => {
                write!(f, "http:send {method} {url}")?;
                for (i, (k, v)) in query.iter().enumerate() {
                    write!(f, "{}{k}={v}", if i == 0 { " ?" } else { "&" })?;
                }
                Ok(())
            }
            Self::Recv { status, url, body } => {
                let preview: String = body.chars().take(BODY_PREVIEW).collect();
                write!(f, "http:recv {status} {url} {preview}")
            }
        }
    }
}

thread_local! {
    static CAPTURED: RefCell<Option<Vec<WireEvent>>> = const { RefCell::new(None) };
}

/// Stops capturing on this thread when dropped.
#[must_use = "capture stops as soon as the guard is dropped"]
pub struct CaptureGuard(());

impl Drop for CaptureGuard {
    fn drop(&mut self) {
        CAPTURED.with(|c| *c.borrow_mut() = None);
    }
}

/// Capture wire events emitted on the current thread until the guard drops.
pub fn capture() -> CaptureGuard {
    CAPTURED.with(|c| *c.borrow_mut() = Some(Vec::new()));
    CaptureGuard(())
}

/// Events captured so far; the buffer is emptied.
pub fn take() -> Vec<WireEvent> {
    CAPTURED.with(|c| c.borrow_mut().as_mut().map(std::mem::take).unwrap_or_default())
}

fn capturing() -> bool {
    CAPTURED.with(|c| c.borrow().is_some())
}

/// Emit `event`. Nothing is built when neither the logger nor a capture wants it.
pub(crate) fn emit(event: impl FnOnce() -> WireEvent) {
    let logged = log::log_enabled!(target: WIRE_TARGET, Level::Trace);
    if !logged && !capturing() {
        return;
    }
    let event = event();
    if logged {
        log::log!(target: WIRE_TARGET, Level::Trace, "{event}");
    }
    CAPTURED.with(|c| {
        if let Some(buf) = c.borrow_mut().as_mut() {
            buf.push(event);
        }
    });
}
