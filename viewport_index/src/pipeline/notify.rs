/// Pipeline reports and change notifications.
///
/// Every `index_scene` / `index_view` invocation ends with an `IndexReport`.
/// Subscribed observers additionally receive an `IndexEvent` when an index
/// is committed or a stale result is discarded.

use std::time::Duration;

/// Which index an invocation rebuilds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexTarget {
    Scene,
    View,
}

/// How an invocation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexOutcome {
    /// The result replaced the live index
    Committed,
    /// A newer request was issued; the result was discarded unwritten
    Superseded,
}

/// Result of one pipeline invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexReport {
    pub target: IndexTarget,
    /// Generation stamped at call start
    pub generation: u64,
    /// Objects looked at (scene objects, or candidate owners for a view)
    pub objects_considered: usize,
    /// Entries written to the index (0 when superseded)
    pub samples_indexed: usize,
    /// Objects that produced nothing usable (malformed, or fully off-screen)
    pub objects_skipped: usize,
    /// View only: samples of visible objects that did not project
    pub samples_dropped: usize,
    pub elapsed: Duration,
    pub outcome: IndexOutcome,
}

impl IndexReport {
    pub fn is_committed(&self) -> bool {
        self.outcome == IndexOutcome::Committed
    }
}

/// Notification payload.
#[derive(Debug, Clone, PartialEq)]
pub enum IndexEvent {
    SceneIndexed(IndexReport),
    ViewIndexed(IndexReport),
    Superseded { target: IndexTarget, generation: u64 },
}

/// Receives pipeline events.
///
/// Closures `Fn(&IndexEvent) + Send + Sync` implement this directly.
pub trait IndexObserver: Send + Sync {
    fn on_event(&self, event: &IndexEvent);
}

impl<F> IndexObserver for F
where
    F: Fn(&IndexEvent) + Send + Sync,
{
    fn on_event(&self, event: &IndexEvent) {
        self(event)
    }
}

/// Handle returned by `IndexingPipeline::subscribe()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub(crate) u64);
