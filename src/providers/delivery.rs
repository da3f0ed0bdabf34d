//! Dedicated delivery thread shared by the in-process backends

use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::backend::FrameSink;
use crate::types::MocapFrame;

/// Longest single sleep, so cancellation is noticed promptly at low frame rates.
const MAX_SLEEP_SLICE: Duration = Duration::from_millis(20);

/// A running delivery thread.
///
/// The thread pulls frames from a source at a fixed period and hands them to
/// the sink. It belongs to the backend, never to the caller.
pub struct DeliveryThread {
    cancel: CancellationToken,
    handle: Option<JoinHandle<u64>>,
}

impl DeliveryThread {
    /// Start delivering frames from `source` every `period`.
    ///
    /// The source returns `None` when it is exhausted, which ends the thread.
    pub fn spawn<S>(period: Duration, mut source: S, sink: FrameSink) -> std::io::Result<Self>
    where
        S: FnMut() -> Option<MocapFrame> + Send + 'static,
    {
        let cancel = CancellationToken::new();
        let thread_cancel = cancel.clone();

        let handle = std::thread::Builder::new().name("mocap-delivery".to_string()).spawn(
            move || {
                info!(?period, "Delivery thread started");
                let mut delivered = 0u64;
                let mut next_due = Instant::now() + period;

                loop {
                    if !sleep_until(next_due, &thread_cancel) {
                        break;
                    }
                    next_due += period;

                    let Some(frame) = source() else {
                        debug!("Frame source exhausted");
                        break;
                    };

                    // Re-check so no frame is handed out after a stop request.
                    if thread_cancel.is_cancelled() {
                        break;
                    }

                    trace!(frame_index = frame.frame_index, "Delivering frame");
                    sink(&frame);
                    delivered += 1;

                    // Fell behind (slow sink): skip ahead instead of bursting.
                    let now = Instant::now();
                    if next_due < now {
                        next_due = now;
                    }
                }

                info!(delivered, "Delivery thread ended");
                delivered
            },
        )?;

        Ok(Self { cancel, handle: Some(handle) })
    }

    /// True once the thread has exited on its own or was stopped.
    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().is_none_or(JoinHandle::is_finished)
    }

    /// Stop the thread and wait for it to exit.
    ///
    /// The join runs on the blocking pool so the caller's runtime keeps going
    /// while an in-flight frame finishes.
    pub async fn stop(mut self) {
        self.cancel.cancel();
        let Some(handle) = self.handle.take() else {
            return;
        };

        match tokio::task::spawn_blocking(move || handle.join()).await {
            Ok(Ok(delivered)) => debug!(delivered, "Delivery thread joined"),
            Ok(Err(_)) => warn!("Delivery thread panicked"),
            Err(e) => warn!("Failed to join delivery thread: {}", e),
        }
    }
}

impl Drop for DeliveryThread {
    fn drop(&mut self) {
        // Detached stop: the thread exits at its next check.
        self.cancel.cancel();
    }
}

/// Sleep until `deadline` in short slices. Returns false if cancelled.
fn sleep_until(deadline: Instant, cancel: &CancellationToken) -> bool {
    loop {
        if cancel.is_cancelled() {
            return false;
        }
        let now = Instant::now();
        if now >= deadline {
            return true;
        }
        std::thread::sleep((deadline - now).min(MAX_SLEEP_SLICE));
    }
}
