//! Stream throttling utilities

use futures::{Stream, ready};
use pin_project_lite::pin_project;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::time::{Interval, MissedTickBehavior, interval};

use crate::types::UpdateRate;

/// Extension trait to add throttling to any Stream
pub trait ThrottleExt: Stream {
    /// Throttle the stream to emit at most once per interval
    ///
    /// Uses "latest-wins" semantics - if multiple items arrive
    /// during an interval, only the latest is emitted.
    fn throttle(self, duration: Duration) -> Throttle<Self>
    where
        Self: Sized,
    {
        Throttle::new(self, Some(duration))
    }

    /// Throttle to `rate` given a source producing `frame_rate` items per second.
    ///
    /// `UpdateRate::Native`, or a cap at or above the source rate, passes
    /// every item through.
    fn throttle_rate(self, rate: UpdateRate, frame_rate: f64) -> Throttle<Self>
    where
        Self: Sized,
    {
        Throttle::new(self, rate.throttle_interval(frame_rate))
    }
}

impl<T: Stream> ThrottleExt for T {}

pin_project! {
    /// A stream combinator that throttles emission rate
    pub struct Throttle<S: Stream> {
        #[pin]
        stream: S,
        interval: Option<Interval>,
        pending: Option<S::Item>,
        exhausted: bool,
        coalesced: u64,
    }
}

impl<S: Stream> Throttle<S> {
    /// Create a throttled stream; `None` passes every item through.
    ///
    /// Must be called within a tokio runtime when an interval is given.
    pub fn new(stream: S, duration: Option<Duration>) -> Self {
        let interval = duration.map(|duration| {
            let mut interval = interval(duration);
            // Don't burst after a slow consumer
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            interval
        });

        Self { stream, interval, pending: None, exhausted: false, coalesced: 0 }
    }

    /// Items replaced by a newer one before they could be emitted.
    pub fn coalesced(&self) -> u64 {
        self.coalesced
    }
}

impl<S: Stream> Stream for Throttle<S> {
    type Item = S::Item;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let mut this = self.project();

        let Some(interval) = this.interval.as_mut() else {
            return this.stream.poll_next(cx);
        };

        // Drain everything available, keeping only the latest
        while !*this.exhausted {
            match this.stream.as_mut().poll_next(cx) {
                Poll::Ready(Some(item)) => {
                    if this.pending.replace(item).is_some() {
                        *this.coalesced += 1;
                    }
                }
                Poll::Ready(None) => *this.exhausted = true,
                Poll::Pending => break,
            }
        }

        if *this.exhausted {
            // Flush the last item, then end
            return Poll::Ready(this.pending.take());
        }
        if this.pending.is_none() {
            return Poll::Pending;
        }

        ready!(interval.poll_tick(cx));
        Poll::Ready(this.pending.take())
    }
}
