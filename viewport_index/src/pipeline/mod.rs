//! Pipeline module
//!
//! Staged, generation-checked rebuilds of the scene and view indices.

mod stage;
mod job;
mod notify;
mod pipeline;

pub use stage::{StageBoundary, stage_boundary};
pub use job::{CandidateRecord, IndexingJob};
pub use notify::{
    IndexEvent, IndexObserver, IndexOutcome, IndexReport, IndexTarget, SubscriptionId,
};
pub use pipeline::IndexingPipeline;
