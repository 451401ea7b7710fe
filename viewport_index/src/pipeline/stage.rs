/// Stage boundaries of the indexing pipeline.
///
/// Awaiting a `StageBoundary` suspends the current invocation exactly once,
/// which lets a newer `index_view` call start (and stamp a newer generation)
/// between two stages of an older one.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

/// Future that is pending on its first poll and ready on the second.
#[derive(Debug, Default)]
pub struct StageBoundary {
    yielded: bool,
}

impl Future for StageBoundary {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        if self.yielded {
            Poll::Ready(())
        } else {
            self.yielded = true;
            cx.waker().wake_by_ref();
            Poll::Pending
        }
    }
}

/// Yield once to the executor.
pub fn stage_boundary() -> StageBoundary {
    StageBoundary::default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::task::Wake;

    struct CountingWaker(std::sync::atomic::AtomicUsize);

    impl Wake for CountingWaker {
        fn wake(self: Arc<Self>) {
            self.0.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        }

        fn wake_by_ref(self: &Arc<Self>) {
            self.0.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        }
    }

    #[test]
    fn test_stage_boundary_yields_once_and_wakes() {
        let counter = Arc::new(CountingWaker(Default::default()));
        let waker = std::task::Waker::from(counter.clone());
        let mut cx = Context::from_waker(&waker);
        let mut boundary = stage_boundary();

        assert_eq!(Pin::new(&mut boundary).poll(&mut cx), Poll::Pending);
        assert_eq!(counter.0.load(std::sync::atomic::Ordering::SeqCst), 1);
        assert_eq!(Pin::new(&mut boundary).poll(&mut cx), Poll::Ready(()));
    }

    #[test]
    fn test_stage_boundary_completes_under_block_on() {
        pollster::block_on(async {
            stage_boundary().await;
            stage_boundary().await;
        });
    }
}
