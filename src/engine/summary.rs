//! Per-cycle summary counters

use chrono::{DateTime, Utc};

/// Counters recorded over one detection cycle
///
/// Recoverable failures land in `errors` instead of aborting the cycle;
/// a cycle with zero news or zero markets is a normal, empty summary.
#[derive(Debug, Clone, Default)]
pub struct CycleSummary {
    /// Cycle sequence number, starting at 1
    pub cycle: u64,
    /// When the cycle began
    pub started_at: Option<DateTime<Utc>>,
    /// When the cycle finished its last stage
    pub finished_at: Option<DateTime<Utc>>,
    /// New articles ingested this cycle
    pub news_fetched: usize,
    /// News items entering the pairing stage
    pub news_processed: usize,
    /// Markets entering the pairing stage
    pub markets_evaluated: usize,
    /// Impact assessments produced
    pub assessments: usize,
    /// Assessments served by the fallback heuristic
    pub fallback_assessments: usize,
    /// Opportunities that cleared the detector gates
    pub opportunities: usize,
    /// Alerts emitted past cooldown
    pub alerts_emitted: usize,
    /// Recoverable errors absorbed during the cycle
    pub errors: Vec<String>,
}

impl CycleSummary {
    /// Start a summary for the given cycle number
    pub fn new(cycle: u64, started_at: DateTime<Utc>) -> Self {
        Self {
            cycle,
            started_at: Some(started_at),
            ..Self::default()
        }
    }

    /// Record a recoverable error
    pub fn record_error(&mut self, error: impl Into<String>) {
        self.errors.push(error.into());
    }

    /// Render the summary as a console block
    pub fn render(&self) -> String {
        let mut out = format!(
            "Cycle {} summary\n\
             News fetched:      {}\n\
             News processed:    {}\n\
             Markets evaluated: {}\n\
             Assessments:       {} ({} fallback)\n\
             Opportunities:     {}\n\
             Alerts emitted:    {}",
            self.cycle,
            self.news_fetched,
            self.news_processed,
            self.markets_evaluated,
            self.assessments,
            self.fallback_assessments,
            self.opportunities,
            self.alerts_emitted,
        );
        if !self.errors.is_empty() {
            out.push_str(&format!("\nErrors:            {}", self.errors.len()));
            for error in &self.errors {
                out.push_str(&format!("\n  - {error}"));
            }
        }
        out
    }
}
