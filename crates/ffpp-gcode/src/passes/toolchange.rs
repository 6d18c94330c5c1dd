//! Bare tool-change removal.
//!
//! `T<n>` on its own does nothing on FlashForge firmware; tool switching is
//! driven by the toolchange command the slicer template inserts instead.

use tracing::{debug, trace};

use super::Pass;
use crate::error::Result;
use crate::line::SourceLine;

/// Drops every bare `T<n>` line, commented or not.
#[derive(Debug, Clone, Copy, Default)]
pub struct ToolChangeStripper;

impl Pass for ToolChangeStripper {
    fn name(&self) -> &'static str {
        "tool-change-strip"
    }

    fn run(&mut self, lines: Vec<SourceLine>) -> Result<Vec<SourceLine>> {
        let before = lines.len();
        let out: Vec<SourceLine> = lines
            .into_iter()
            .filter(|line| {
                let bare = line
                    .classify()
                    .is_some_and(|cmd| cmd.is_bare_tool_change());
                if bare {
                    trace!("line {}: dropping `{}`", line.number, line.text);
                }
                !bare
            })
            .collect();
        debug!("removed {} bare tool change(s)", before - out.len());
        Ok(out)
    }
}
