//! Run summary
//!
//! Every URL that did not make it into the corpus is listed here with its
//! reason, so a narrower follow-up run can be planned from the summary alone.

use std::time::Duration;

/// A URL whose fetch failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedUrl {
    pub url: String,
    pub reason: String,
    /// Whether a later run could reasonably succeed
    pub transient: bool,
}

/// A URL that was fetched but produced no document, or was refused
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedUrl {
    pub url: String,
    pub reason: String,
}

/// Outcome counts and per-URL problems of one harvest
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// URLs accepted into the frontier
    pub discovered: usize,

    /// URLs fetched successfully
    pub fetched: usize,

    /// Documents written to the corpus
    pub extracted: usize,

    /// URLs whose fetch failed
    pub failed: usize,

    /// URLs fetched but not extracted, plus enqueues refused by the page cap
    pub skipped: usize,

    /// Failed URLs with their reasons, in discovery order
    pub failures: Vec<FailedUrl>,

    /// Skipped URLs with their reasons
    pub skips: Vec<SkippedUrl>,

    /// True if the run was cancelled before the frontier drained
    pub truncated: bool,

    /// Wall-clock duration of the run
    pub duration: Duration,
}

impl RunSummary {
    /// Creates an empty summary
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of failures worth retrying in a later run
    pub fn transient_failures(&self) -> usize {
        self.failures.iter().filter(|f| f.transient).count()
    }

    /// Returns the extraction rate over fetched pages as a percentage
    pub fn extraction_rate(&self) -> f64 {
        if self.fetched == 0 {
            return 0.0;
        }
        (self.extracted as f64 / self.fetched as f64) * 100.0
    }

    /// True if every discovered URL ended up in the corpus
    pub fn is_clean(&self) -> bool {
        self.failed == 0 && self.skipped == 0 && !self.truncated
    }
}

/// Formats a run summary as human-readable text
pub fn format_summary(summary: &RunSummary) -> String {
    let mut out = String::new();

    out.push_str("=== Harvest Summary ===\n\n");
    if summary.truncated {
        out.push_str("Run was cancelled; the corpus is partial.\n\n");
    }

    out.push_str("Overview:\n");
    out.push_str(&format!("  Discovered: {}\n", summary.discovered));
    out.push_str(&format!("  Fetched:    {}\n", summary.fetched));
    out.push_str(&format!(
        "  Extracted:  {} ({:.1}% of fetched)\n",
        summary.extracted,
        summary.extraction_rate()
    ));
    out.push_str(&format!(
        "  Failed:     {} ({} transient)\n",
        summary.failed,
        summary.transient_failures()
    ));
    out.push_str(&format!("  Skipped:    {}\n", summary.skipped));
    out.push_str(&format!(
        "  Duration:   {:.2}s\n",
        summary.duration.as_secs_f64()
    ));

    if !summary.failures.is_empty() {
        out.push_str(&format!("\nFailed URLs ({}):\n", summary.failures.len()));
        for failure in &summary.failures {
            let kind = if failure.transient {
                "transient"
            } else {
                "permanent"
            };
            out.push_str(&format!(
                "  - {} [{}] {}\n",
                failure.url, kind, failure.reason
            ));
        }
    }

    if !summary.skips.is_empty() {
        out.push_str(&format!("\nSkipped URLs ({}):\n", summary.skips.len()));
        for skip in &summary.skips {
            out.push_str(&format!("  - {} {}\n", skip.url, skip.reason));
        }
    }

    out
}

/// Prints a run summary to stdout
pub fn print_summary(summary: &RunSummary) {
    print!("{}", format_summary(summary));
}
