//! Process signal wiring for the accept loop.
//!
//! SIGINT/SIGTERM request shutdown; SIGHUP requests a forced corpus
//! rebuild without restarting the server. Handlers are installed without
//! SA_RESTART so a blocking `accept` returns EINTR and the loop gets to
//! observe the flags.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};

static SHUTDOWN: AtomicBool = AtomicBool::new(false);
static RELOAD: AtomicBool = AtomicBool::new(false);

extern "C" fn on_signal(sig: libc::c_int) {
    if sig == libc::SIGHUP {
        RELOAD.store(true, Ordering::SeqCst);
    } else {
        SHUTDOWN.store(true, Ordering::SeqCst);
    }
}

/// Install handlers for SIGINT, SIGTERM and SIGHUP
pub fn install() -> io::Result<()> {
    for sig in [libc::SIGINT, libc::SIGTERM, libc::SIGHUP] {
        unsafe {
            let mut action: libc::sigaction = std::mem::zeroed();
            action.sa_sigaction = on_signal as usize;
            libc::sigemptyset(&mut action.sa_mask);
            action.sa_flags = 0;
            if libc::sigaction(sig, &action, std::ptr::null_mut()) != 0 {
                return Err(io::Error::last_os_error());
            }
        }
    }
    Ok(())
}

pub fn shutdown_requested() -> bool {
    SHUTDOWN.load(Ordering::SeqCst)
}

/// Consume a pending reload request, if any
pub fn take_reload_request() -> bool {
    RELOAD.swap(false, Ordering::SeqCst)
}
