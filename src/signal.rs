//! Interrupt forwarding.
//!
//! The session layer only knows about cancellation handles; this module is the
//! outer-layer glue that turns SIGINT (Ctrl-C) or, on unix, SIGTERM into
//! cancellation of whatever is in flight.

use crate::query::CancelHandle;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Spawn a task that cancels every handle each time an interrupt arrives.
///
/// While the task runs, SIGINT and SIGTERM no longer terminate the process;
/// the embedding application decides what to do after the in-flight work is
/// cancelled. The task runs until the returned handle is aborted or the
/// runtime shuts down. Must be called from within a tokio runtime.
pub fn spawn_interrupt_forwarder(handles: Vec<CancelHandle>) -> JoinHandle<()> {
    // Registered before spawning so a signal sent right after this call is seen
    let listener = Interrupts::listen();

    tokio::spawn(async move {
        let mut interrupts = match listener {
            Ok(interrupts) => interrupts,
            Err(e) => {
                warn!(error = %e, "Unable to listen for interrupts");
                return;
            }
        };

        loop {
            let signal = match interrupts.recv().await {
                Ok(signal) => signal,
                Err(e) => {
                    warn!(error = %e, "Unable to listen for interrupts");
                    return;
                }
            };
            let cancelled = forward(&handles);
            info!(signal, cancelled, "Interrupt received");
        }
    })
}

/// Cancel every handle, returning how many had an operation in flight.
fn forward(handles: &[CancelHandle]) -> usize {
    handles.iter().filter(|handle| handle.cancel()).count()
}

struct Interrupts {
    #[cfg(unix)]
    terminate: tokio::signal::unix::Signal,
}

impl Interrupts {
    fn listen() -> std::io::Result<Self> {
        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};
            Ok(Self {
                terminate: signal(SignalKind::terminate())?,
            })
        }
        #[cfg(not(unix))]
        {
            Ok(Self {})
        }
    }

    /// Wait for the next interrupt and return its name.
    #[cfg(unix)]
    async fn recv(&mut self) -> std::io::Result<&'static str> {
        tokio::select! {
            result = tokio::signal::ctrl_c() => result.map(|()| "SIGINT"),
            received = self.terminate.recv() => match received {
                Some(()) => Ok("SIGTERM"),
                None => Err(std::io::Error::new(
                    std::io::ErrorKind::Other,
                    "SIGTERM listener closed",
                )),
            },
        }
    }

    #[cfg(not(unix))]
    async fn recv(&mut self) -> std::io::Result<&'static str> {
        tokio::signal::ctrl_c().await.map(|()| "SIGINT")
    }
}
