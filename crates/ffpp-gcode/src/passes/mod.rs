//! Rewrite passes over a whole file.
//!
//! Each pass consumes the complete line buffer and returns the next one.
//! Opaque lines are always passed through as they are.

mod legacy;
mod m109;
mod toolchange;

pub use legacy::{StartCodeM109Suppressor, ZFeedCorrector};
pub use m109::M109Splitter;
pub use toolchange::ToolChangeStripper;

use crate::error::Result;
use crate::line::SourceLine;

/// A whole-file rewrite step.
pub trait Pass {
    /// Short name for logs and run reports.
    fn name(&self) -> &'static str;

    /// Rewrite all lines.
    fn run(&mut self, lines: Vec<SourceLine>) -> Result<Vec<SourceLine>>;
}
