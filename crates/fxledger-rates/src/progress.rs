//! Progress reporting for list-oriented operations.

/// Receives percent-done updates. Results never depend on it.
pub trait ProgressSink {
    /// Report that `percent` (0–100) of the work is done.
    fn report_fraction_done(&mut self, percent: f64);
}

/// A sink that ignores every update.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn report_fraction_done(&mut self, _percent: f64) {}
}

impl<F: FnMut(f64)> ProgressSink for F {
    fn report_fraction_done(&mut self, percent: f64) {
        self(percent);
    }
}

/// Maps step `done` of `total` into the window `[start, start + delta]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressWindow {
    /// Percent reported before the first step.
    pub start: f64,
    /// Width of the window in percent.
    pub delta: f64,
}

impl Default for ProgressWindow {
    fn default() -> Self {
        Self {
            start: 0.0,
            delta: 100.0,
        }
    }
}

impl ProgressWindow {
    /// Percent done after `done` of `total` steps.
    #[must_use]
    pub fn percent(&self, done: usize, total: usize) -> f64 {
        if total == 0 {
            return self.start + self.delta;
        }
        self.start + self.delta * (done as f64) / (total as f64)
    }
}
