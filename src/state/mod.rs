//! State tracking for frontier entries and fetch workers
//!
//! `PageState` is the lifecycle of a single frontier entry; `WorkerState` carries
//! the per-worker politeness bookkeeping.

mod page_state;
mod worker_state;

pub use page_state::PageState;
pub use worker_state::WorkerState;
