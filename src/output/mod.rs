//! Output module for the corpus and the run summary
//!
//! This module handles:
//! - Rendering documents into the streaming corpus
//! - Restoring discovery order for pages that complete out of order
//! - Formatting the end-of-run summary

mod assembler;
mod sequencer;
pub mod summary;

pub use assembler::{render_block, render_document, DocumentAssembler, TRUNCATION_NOTICE};
pub use sequencer::Sequencer;
pub use summary::{format_summary, print_summary, FailedUrl, RunSummary, SkippedUrl};
