//! Ctrl+C handling for sync runs
//!
//! The first interrupt cancels the returned token so the run stops after
//! the playlist in flight. A second one cancels the abort token, which
//! kills the running download, and then exits.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Exit status used when a second interrupt forces the process down
pub const FORCED_EXIT_CODE: i32 = 130;

/// How long a forced exit waits for the download in flight to be killed
pub const ABORT_GRACE: Duration = Duration::from_secs(2);

/// Listen for interrupts (and SIGTERM on Unix) in the background
///
/// `abort` is usually [`SyncOrchestrator::abort_token`](crate::SyncOrchestrator::abort_token).
/// Must be called from within a tokio runtime.
pub fn install_signal_handler(abort: CancellationToken) -> CancellationToken {
    let stop = CancellationToken::new();
    let handler_stop = stop.clone();
    let count = Arc::new(AtomicU32::new(0));

    tokio::spawn(async move {
        #[cfg(unix)]
        let mut sigterm = {
            use tokio::signal::unix::{signal, SignalKind};
            match signal(SignalKind::terminate()) {
                Ok(sigterm) => Some(sigterm),
                Err(e) => {
                    warn!("Could not listen for SIGTERM: {e}");
                    None
                }
            }
        };

        loop {
            #[cfg(unix)]
            let received = match sigterm.as_mut() {
                Some(sigterm) => tokio::select! {
                    r = tokio::signal::ctrl_c() => r,
                    _ = sigterm.recv() => Ok(()),
                },
                None => tokio::signal::ctrl_c().await,
            };
            #[cfg(not(unix))]
            let received = tokio::signal::ctrl_c().await;

            if let Err(e) = received {
                error!("Could not listen for Ctrl+C: {e}");
                return;
            }

            if escalate(&count, &handler_stop, &abort) == Escalation::Force {
                tokio::time::sleep(ABORT_GRACE).await;
                std::process::exit(FORCED_EXIT_CODE);
            }
        }
    });

    stop
}

#[derive(Debug, PartialEq, Eq)]
enum Escalation {
    Graceful,
    Force,
}

fn escalate(count: &AtomicU32, stop: &CancellationToken, abort: &CancellationToken) -> Escalation {
    if count.fetch_add(1, Ordering::SeqCst) == 0 {
        info!("Received shutdown signal, finishing the current playlist...");
        info!("Press Ctrl+C again to force exit");
        stop.cancel();
        Escalation::Graceful
    } else {
        warn!("Force exit requested, killing the running download");
        stop.cancel();
        abort.cancel();
        Escalation::Force
    }
}
