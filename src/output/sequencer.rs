//! Sequencing buffer that restores discovery order
//!
//! Workers finish pages in whatever order the network allows. Each page carries
//! the discovery ordinal the frontier assigned to it; the sequencer holds early
//! arrivals back until every lower ordinal has been resolved, so the corpus is
//! always written in discovery order.

use super::assembler::DocumentAssembler;
use crate::extract::Document;
use std::collections::BTreeMap;
use std::io::{self, Write};

/// Reorders completed pages by discovery ordinal before appending them
pub struct Sequencer<W: Write> {
    assembler: DocumentAssembler<W>,
    pending: BTreeMap<u64, Option<Document>>,
    next: u64,
}

impl<W: Write> Sequencer<W> {
    /// Creates a sequencer expecting ordinal 0 first
    pub fn new(assembler: DocumentAssembler<W>) -> Self {
        Self {
            assembler,
            pending: BTreeMap::new(),
            next: 0,
        }
    }

    /// Resolves one ordinal and writes everything that is now contiguous
    ///
    /// `None` marks an ordinal that produced no document (fetch failure or
    /// extraction skip) so it no longer holds back later pages.
    pub fn submit(&mut self, sequence: u64, document: Option<Document>) -> io::Result<()> {
        self.pending.insert(sequence, document);

        while let Some(document) = self.pending.remove(&self.next) {
            if let Some(document) = document {
                self.assembler.append(&document)?;
            }
            self.next += 1;
        }

        Ok(())
    }

    /// Number of resolved ordinals still waiting on a gap
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Writes held-back documents in ordinal order, skipping unresolved gaps
    ///
    /// Used on cancellation, when some ordinals will never be resolved.
    pub fn drain(&mut self) -> io::Result<()> {
        let pending = std::mem::take(&mut self.pending);
        for (sequence, document) in pending {
            if let Some(document) = document {
                self.assembler.append(&document)?;
            }
            self.next = sequence + 1;
        }
        Ok(())
    }

    /// Mutable access to the underlying assembler
    pub fn assembler_mut(&mut self) -> &mut DocumentAssembler<W> {
        &mut self.assembler
    }

    /// Returns the underlying assembler
    pub fn into_assembler(self) -> DocumentAssembler<W> {
        self.assembler
    }
}
