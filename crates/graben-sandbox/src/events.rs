// ── Sandbox event streams ──
//
// Lifecycle events broadcast by the worker, a `Stream` adapter for
// consuming them, and the pass-through cursor broadcaster.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll, ready};

use futures_core::Stream;
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tracing::warn;

use graben_model::{GeoPoint, LogRecord};

const CURSOR_CHANNEL_SIZE: usize = 64;

/// Lifecycle events emitted by the sandbox worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SandboxEvent {
    /// The active scene model was replaced. Always precedes the
    /// `ModelUpdated` that the swap also emits.
    ModelChanged,
    /// The scene's source collection (or its parameters) changed.
    ModelUpdated,
    /// A long-running scene computation began.
    ProcessingStarted { message: String },
    /// The computation ended. Emitted on the error path too.
    ProcessingFinished,
    /// A record forwarded from the scene's log sink.
    Log(Arc<LogRecord>),
}

/// `Stream` adapter over a broadcast subscription.
///
/// Yields each event in order; a lagged subscriber skips the overwritten
/// events with a warning instead of erroring out.
pub struct EventStream<T> {
    inner: BroadcastStream<T>,
}

impl<T: Clone + Send + 'static> EventStream<T> {
    pub(crate) fn new(receiver: broadcast::Receiver<T>) -> Self {
        Self {
            inner: BroadcastStream::new(receiver),
        }
    }
}

impl<T: Clone + Send + 'static> Stream for EventStream<T> {
    type Item = T;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        loop {
            match ready!(Pin::new(&mut this.inner).poll_next(cx)) {
                Some(Ok(item)) => return Poll::Ready(Some(item)),
                Some(Err(BroadcastStreamRecvError::Lagged(skipped))) => {
                    warn!(skipped, "event subscriber lagged, skipping");
                }
                None => return Poll::Ready(None),
            }
        }
    }
}

/// Pass-through broadcaster for cursor and pointer positions.
///
/// Carries no business logic: whoever tracks input announces positions,
/// whoever renders overlays subscribes.
#[derive(Debug, Clone)]
pub struct CursorTracker {
    cursor: broadcast::Sender<GeoPoint>,
    pointer: broadcast::Sender<GeoPoint>,
}

impl CursorTracker {
    pub fn new() -> Self {
        let (cursor, _) = broadcast::channel(CURSOR_CHANNEL_SIZE);
        let (pointer, _) = broadcast::channel(CURSOR_CHANNEL_SIZE);
        Self { cursor, pointer }
    }

    pub fn announce_cursor(&self, position: GeoPoint) {
        let _ = self.cursor.send(position);
    }

    pub fn announce_pointer(&self, position: GeoPoint) {
        let _ = self.pointer.send(position);
    }

    pub fn cursor_moved(&self) -> broadcast::Receiver<GeoPoint> {
        self.cursor.subscribe()
    }

    pub fn pointer_moved(&self) -> broadcast::Receiver<GeoPoint> {
        self.pointer.subscribe()
    }
}

impl Default for CursorTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn cursor_positions_pass_through() {
        let tracker = CursorTracker::new();
        let mut cursor_rx = tracker.cursor_moved();
        let mut pointer_rx = tracker.pointer_moved();

        tracker.announce_cursor(GeoPoint { easting: 10.0, northing: -5.0 });
        tracker.announce_pointer(GeoPoint { easting: 1.0, northing: 2.0 });

        assert_eq!(cursor_rx.try_recv().unwrap().easting, 10.0);
        assert_eq!(pointer_rx.try_recv().unwrap().northing, 2.0);
    }

    #[test]
    fn channels_are_independent() {
        let tracker = CursorTracker::new();
        let mut pointer_rx = tracker.pointer_moved();

        tracker.announce_cursor(GeoPoint { easting: 0.0, northing: 0.0 });

        assert!(pointer_rx.try_recv().is_err());
    }
}
