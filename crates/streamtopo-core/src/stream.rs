// ── Reactive topology stream ──
//
// Subscription type for consuming published topology snapshots.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures_core::Stream;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

use crate::render::TopologySnapshot;

/// A subscription to the published topology.
///
/// Holds the snapshot current at subscription time; later publications
/// arrive through [`into_stream()`](Self::into_stream).
pub struct TopologyStream {
    current: Arc<TopologySnapshot>,
    receiver: watch::Receiver<Arc<TopologySnapshot>>,
}

impl TopologyStream {
    pub fn new(receiver: watch::Receiver<Arc<TopologySnapshot>>) -> Self {
        let current = receiver.borrow().clone();
        Self { current, receiver }
    }

    /// Snapshot captured at subscription time.
    pub fn current(&self) -> &Arc<TopologySnapshot> {
        &self.current
    }

    /// Convert into a `Stream` of the snapshots published after
    /// subscription. Ends once the publisher is gone.
    pub fn into_stream(self) -> TopologyWatchStream {
        TopologyWatchStream {
            inner: WatchStream::from_changes(self.receiver),
        }
    }
}

/// `Stream` adapter backed by a `watch::Receiver`. Yields one item per
/// publish; intermediate snapshots may be skipped by a slow reader.
pub struct TopologyWatchStream {
    inner: WatchStream<Arc<TopologySnapshot>>,
}

impl Stream for TopologyWatchStream {
    type Item = Arc<TopologySnapshot>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use tokio_stream::StreamExt;

    use super::*;
    use crate::render::{Renderer, WatchRenderer};
    use crate::store::EntityStore;
    use crate::streams::StreamBindings;

    #[tokio::test]
    async fn stream_yields_only_later_generations() {
        let (mut renderer, rx) = WatchRenderer::new();
        let topology = TopologyStream::new(rx);
        assert_eq!(topology.current().generation, 0);

        let mut updates = topology.into_stream();
        renderer.refresh(&EntityStore::new(), &StreamBindings::new());
        let snap = updates.next().await.unwrap();
        assert_eq!(snap.generation, 1);

        drop(renderer);
        assert!(updates.next().await.is_none());
    }
}
