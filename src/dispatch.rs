//! Frame dispatcher: routes frames from the backend's delivery thread to the user
//!
//! The dispatcher owns a single callback slot. The backend is handed a
//! [`FrameSink`] once, at session construction; every frame it delivers goes
//! through the slot. Registering, replacing, or clearing the callback happens
//! on the caller's side, independently of the backend.
//!
//! The slot is a mutex held for the duration of one callback. Clearing it
//! therefore waits for an in-flight callback to return, and no callback runs
//! after [`FrameDispatcher::close`] returns.

use futures::Stream;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, trace, warn};

use crate::ClientError;
use crate::backend::FrameSink;
use crate::types::MocapFrame;

/// User callback invoked once per frame on the backend's delivery thread.
///
/// Must return quickly: at 100 Hz the budget is about 10 ms. It must not call
/// back into the session that owns the dispatcher.
pub type FrameCallback = Box<dyn FnMut(&MocapFrame) + Send>;

/// Counters describing what happened to delivered frames.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchStats {
    /// Frames handed to a callback (or queued for a stream).
    pub delivered: u64,
    /// Frames discarded: no callback registered or stream queue full.
    pub dropped: u64,
    /// Callback invocations that panicked.
    pub faulted: u64,
}

#[derive(Debug, Default)]
struct Counters {
    delivered: AtomicU64,
    dropped: AtomicU64,
    faulted: AtomicU64,
}

impl Counters {
    fn snapshot(&self) -> DispatchStats {
        DispatchStats {
            delivered: self.delivered.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
            faulted: self.faulted.load(Ordering::Relaxed),
        }
    }
}

type Slot = Arc<Mutex<Option<FrameCallback>>>;

/// Single-callback registration point between backend and user.
pub struct FrameDispatcher {
    slot: Slot,
    counters: Arc<Counters>,
}

impl Default for FrameDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameDispatcher {
    pub fn new() -> Self {
        Self { slot: Arc::new(Mutex::new(None)), counters: Arc::new(Counters::default()) }
    }

    /// Sink to install in the backend. Every call routes through the slot.
    pub fn sink(&self) -> FrameSink {
        let slot = Arc::clone(&self.slot);
        let counters = Arc::clone(&self.counters);
        Arc::new(move |frame: &MocapFrame| deliver(&slot, &counters, frame))
    }

    /// Register `callback`, replacing any previous one.
    ///
    /// Waits for an in-flight call of the previous callback to finish.
    pub fn register(&self, callback: FrameCallback) {
        let previous = lock(&self.slot).replace(callback);
        if previous.is_some() {
            debug!("Frame callback replaced");
        }
    }

    /// Register a callback that forwards frames into a bounded queue.
    ///
    /// A full queue drops the frame instead of blocking the delivery thread.
    /// The returned stream ends once the callback is cleared or replaced.
    pub fn register_channel(&self, capacity: usize) -> FrameStream {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let counters = Arc::clone(&self.counters);

        self.register(Box::new(move |frame: &MocapFrame| {
            match tx.try_send(Arc::new(frame.clone())) {
                Ok(()) => {}
                Err(TrySendError::Full(_)) => {
                    counters.dropped.fetch_add(1, Ordering::Relaxed);
                    counters.delivered.fetch_sub(1, Ordering::Relaxed);
                    trace!(frame_index = frame.frame_index, "Frame queue full, dropping frame");
                }
                Err(TrySendError::Closed(_)) => {
                    counters.dropped.fetch_add(1, Ordering::Relaxed);
                    counters.delivered.fetch_sub(1, Ordering::Relaxed);
                }
            }
        }));

        FrameStream { inner: ReceiverStream::new(rx) }
    }

    /// Clear the callback. Returns once no callback is running; none runs afterwards.
    pub fn close(&self) {
        if lock(&self.slot).take().is_some() {
            debug!("Frame callback cleared");
        }
    }

    /// True while a callback is registered.
    pub fn is_registered(&self) -> bool {
        lock(&self.slot).is_some()
    }

    pub fn stats(&self) -> DispatchStats {
        self.counters.snapshot()
    }
}

/// Deliver one frame to the registered callback, if any.
fn deliver(slot: &Slot, counters: &Counters, frame: &MocapFrame) {
    let mut guard = lock(slot);
    let Some(callback) = guard.as_mut() else {
        counters.dropped.fetch_add(1, Ordering::Relaxed);
        return;
    };

    counters.delivered.fetch_add(1, Ordering::Relaxed);
    if let Err(panic) = catch_unwind(AssertUnwindSafe(|| callback(frame))) {
        counters.faulted.fetch_add(1, Ordering::Relaxed);
        let error = ClientError::Callback {
            frame_index: frame.frame_index,
            message: panic_message(panic.as_ref()),
        };
        warn!(error = %error, "Frame callback panicked");
    }
}

// Callback panics are caught inside the guard, so poisoning only follows a panic in this module.
fn lock(slot: &Slot) -> MutexGuard<'_, Option<FrameCallback>> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// Frames forwarded through a bounded queue, consumed on the caller's side.
pub struct FrameStream {
    inner: ReceiverStream<Arc<MocapFrame>>,
}

impl FrameStream {
    /// Stop accepting frames; already queued frames can still be read.
    pub fn close(&mut self) {
        self.inner.close();
    }
}

impl Stream for FrameStream {
    type Item = Arc<MocapFrame>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}
