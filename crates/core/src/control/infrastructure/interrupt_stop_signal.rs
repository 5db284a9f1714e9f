use std::future::Future;
use std::sync::Arc;
use std::thread::JoinHandle;

use tokio::signal;

use super::atomic_stop_signal::AtomicStopSignal;

/// Exit status after a second interrupt, as shells report SIGINT.
const FORCED_EXIT_CODE: i32 = 130;

/// Turns Ctrl-C (and SIGTERM on Unix) into a stop request, so the frame
/// loop ends between frames and the output is finalized.
///
/// A second Ctrl-C exits immediately, for loops stuck on a blocking read.
pub struct InterruptStopSignal;

impl InterruptStopSignal {
    pub fn spawn(stop: Arc<AtomicStopSignal>) -> std::io::Result<JoinHandle<()>> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        std::thread::Builder::new()
            .name("interrupt-watch".into())
            .spawn(move || {
                runtime.block_on(async {
                    if !stop_on_signal(&stop, wait_for_shutdown()).await {
                        return;
                    }
                    if signal::ctrl_c().await.is_ok() {
                        log::warn!("Second interrupt, exiting without finalizing output");
                        std::process::exit(FORCED_EXIT_CODE);
                    }
                });
            })
    }
}

/// Requests a stop once `shutdown` resolves. Returns whether it did; a
/// handler that failed to install is logged and leaves the flag alone.
pub async fn stop_on_signal<F>(stop: &AtomicStopSignal, shutdown: F) -> bool
where
    F: Future<Output = std::io::Result<()>>,
{
    match shutdown.await {
        Ok(()) => {
            log::info!("Interrupt received, stopping after the current frame");
            stop.request_stop();
            true
        }
        Err(e) => {
            log::warn!("Interrupt handler unavailable: {e}");
            false
        }
    }
}

async fn wait_for_shutdown() -> std::io::Result<()> {
    #[cfg(unix)]
    {
        let mut terminate = signal::unix::signal(signal::unix::SignalKind::terminate())?;
        tokio::select! {
            result = signal::ctrl_c() => result,
            _ = terminate.recv() => Ok(()),
        }
    }

    #[cfg(not(unix))]
    {
        signal::ctrl_c().await
    }
}
