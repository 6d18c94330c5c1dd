//! Post-run checks on the rewritten file.
//!
//! Issues are not errors: the file is still written, but under a name that
//! tells the user not to print it blindly.

use serde::Serialize;
use tracing::warn;

use crate::line::SourceLine;
use crate::macros::find_placeholder;
use crate::settings::{PipelineMode, PostProcessSettings};

/// Kind of problem found in the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum IssueKind {
    /// An `<FFPP-...>` placeholder survived substitution, e.g. one that came
    /// in through a macro value.
    UnresolvedPlaceholder,
    /// An M109 survived because the start-code end marker never appeared.
    RemainingM109,
}

/// A problem found in the output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    /// Input line number (1-indexed).
    pub line: usize,
    /// What is wrong.
    pub kind: IssueKind,
    /// Output line text.
    pub text: String,
}

/// Check the output of a pipeline run.
pub fn validate(lines: &[SourceLine], settings: &PostProcessSettings) -> Vec<ValidationIssue> {
    if settings.mode == PipelineMode::LegacyZFeed {
        return Vec::new();
    }

    let config_marker = settings.config_start_marker.trim_end();
    let body = lines
        .iter()
        .position(|line| line.text.trim_end() == config_marker)
        .map_or(lines, |end| &lines[..end]);

    let mut issues = Vec::new();
    let mut report = |line: &SourceLine, kind: IssueKind| {
        warn!("line {}: {:?} in `{}`", line.number, kind, line.text);
        issues.push(ValidationIssue {
            line: line.number,
            kind,
            text: line.text.clone(),
        });
    };

    for line in body {
        if find_placeholder(&line.text).is_some() {
            report(line, IssueKind::UnresolvedPlaceholder);
        }
    }

    if settings.mode == PipelineMode::LegacyStartCode {
        let start_code_marker = settings.start_code_end_marker.trim_end();
        if !body.iter().any(|line| line.text.trim_end() == start_code_marker) {
            for line in body {
                if line.classify().is_some_and(|cmd| cmd.is('M', 109)) {
                    report(line, IssueKind::RemainingM109);
                }
            }
        }
    }

    issues
}
