//! Pass orchestration.

use serde::Serialize;
use tracing::debug;

use crate::error::Result;
use crate::line::{join_lines, split_lines, SourceLine};
use crate::macros::{MacroValueTable, Substitutor};
use crate::passes::{
    M109Splitter, Pass, StartCodeM109Suppressor, ToolChangeStripper, ZFeedCorrector,
};
use crate::settings::{PipelineMode, PostProcessSettings};
use crate::validate::{validate, ValidationIssue};

/// Line counts for one pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PassReport {
    /// Pass name.
    pub pass: &'static str,
    /// Lines handed to the pass.
    pub lines_in: usize,
    /// Lines the pass produced.
    pub lines_out: usize,
}

/// Summary of a pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineReport {
    /// Mode the pipeline ran in.
    pub mode: PipelineMode,
    /// Number of distinct macros collected.
    pub macros_collected: usize,
    /// Passes in the order they ran.
    pub passes: Vec<PassReport>,
    /// Problems found in the output.
    pub issues: Vec<ValidationIssue>,
}

/// Rewritten file plus run summary.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    /// Rewritten lines.
    pub lines: Vec<SourceLine>,
    /// Run summary.
    pub report: PipelineReport,
}

impl PipelineOutput {
    /// Did the output pass validation?
    pub fn passed(&self) -> bool {
        self.report.issues.is_empty()
    }

    /// Rewritten file contents.
    pub fn to_gcode(&self) -> String {
        join_lines(&self.lines)
    }
}

/// Runs the passes for one mode over a whole file.
///
/// Every run starts from fresh state; nothing carries over between files.
#[derive(Debug, Clone)]
pub struct Pipeline {
    settings: PostProcessSettings,
}

impl Pipeline {
    /// Create a pipeline, validating the settings.
    pub fn new(settings: PostProcessSettings) -> Result<Self> {
        settings.validate()?;
        Ok(Self { settings })
    }

    /// Settings in use.
    pub fn settings(&self) -> &PostProcessSettings {
        &self.settings
    }

    /// Process file contents.
    pub fn run_str(&self, contents: &str) -> Result<PipelineOutput> {
        self.run(split_lines(contents))
    }

    /// Process lines.
    ///
    /// Substitution runs before the command passes so that commands built
    /// from placeholders (`M109 S<FFPP-temp> T0`) are rewritten too.
    pub fn run(&self, lines: Vec<SourceLine>) -> Result<PipelineOutput> {
        let settings = &self.settings;
        let table = match settings.mode {
            PipelineMode::LegacyZFeed => MacroValueTable::new(),
            _ => MacroValueTable::collect(&lines),
        };
        debug!(
            "{} mode: collected {} macro(s)",
            settings.mode.as_str(),
            table.len()
        );

        let mut passes: Vec<Box<dyn Pass + '_>> = match settings.mode {
            PipelineMode::Standard => vec![
                Box::new(Substitutor::new(&table, &settings.config_start_marker)),
                Box::new(M109Splitter::new(settings.feed_rates)),
                Box::new(ToolChangeStripper),
            ],
            PipelineMode::LegacyStartCode => vec![
                Box::new(Substitutor::new(&table, &settings.config_start_marker)),
                Box::new(StartCodeM109Suppressor::new(
                    settings.start_code_end_marker.as_str(),
                )),
                Box::new(ToolChangeStripper),
            ],
            PipelineMode::LegacyZFeed => vec![Box::new(ZFeedCorrector::new(settings.feed_rates))],
        };

        let mut lines = lines;
        let mut reports = Vec::with_capacity(passes.len());
        for pass in passes.iter_mut() {
            let lines_in = lines.len();
            lines = pass.run(lines)?;
            debug!("{}: {} -> {} lines", pass.name(), lines_in, lines.len());
            reports.push(PassReport {
                pass: pass.name(),
                lines_in,
                lines_out: lines.len(),
            });
        }

        let issues = validate(&lines, settings);
        Ok(PipelineOutput {
            lines,
            report: PipelineReport {
                mode: settings.mode,
                macros_collected: table.len(),
                passes: reports,
                issues,
            },
        })
    }
}
