//! One post-processing job: read, rewrite, write.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use ffpp_gcode::{output_path, render_header, Pipeline, PipelineReport, PostProcessSettings};
use tempfile::NamedTempFile;
use tracing::info;

/// Tool name written into the output header.
pub const TOOL_NAME: &str = concat!("ffpp ", env!("CARGO_PKG_VERSION"));

/// Result of a finished job.
#[derive(Debug)]
pub struct JobOutcome {
    /// Where the output was written.
    pub path: PathBuf,
    /// Pipeline summary.
    pub report: PipelineReport,
}

impl JobOutcome {
    /// Did the output pass validation?
    pub fn passed(&self) -> bool {
        self.report.issues.is_empty()
    }
}

/// Rewrite `input` and write the result next to `destination`.
///
/// Nothing is written when the pipeline fails.
pub fn run_job(
    input: &Path,
    destination: &Path,
    settings: PostProcessSettings,
) -> Result<JobOutcome> {
    let contents = fs::read_to_string(input)
        .with_context(|| format!("failed to read {}", input.display()))?;

    let add_header = settings.add_header;
    let pipeline = Pipeline::new(settings)?;
    let output = pipeline
        .run_str(&contents)
        .with_context(|| format!("failed to post-process {}", input.display()))?;

    let path = output_path(destination, output.passed())?;

    let mut text = String::with_capacity(contents.len() + 256);
    if add_header {
        let original = fs::canonicalize(input).unwrap_or_else(|_| input.to_path_buf());
        text.push_str(&render_header(TOOL_NAME, &original));
    }
    text.push_str(&output.to_gcode());

    write_atomic(&path, &text).with_context(|| format!("failed to write {}", path.display()))?;
    info!("wrote {} lines to {}", output.lines.len(), path.display());

    Ok(JobOutcome {
        path,
        report: output.report,
    })
}

/// Write `contents` to a temporary file next to `path`, then rename it into
/// place. A failed write never leaves a partial file under `path`.
fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let parent = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    let mut temp = NamedTempFile::new_in(parent)?;
    temp.write_all(contents.as_bytes())?;
    temp.flush()?;
    temp.persist(path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ffpp_gcode::naming::{FAILURE_PREFIX, SUCCESS_PREFIX};

    #[test]
    fn test_writes_prefixed_file_with_header() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("cube.gcode");
        fs::write(&input, "M109 S200 T0\nG1 X10 Y10\nT0\n").unwrap();

        let outcome = run_job(&input, &input, PostProcessSettings::default()).unwrap();
        assert!(outcome.passed());
        assert_eq!(outcome.path, dir.path().join(format!("{SUCCESS_PREFIX}cube.g")));

        let written = fs::read_to_string(&outcome.path).unwrap();
        let lines: Vec<&str> = written.lines().collect();
        assert!(lines[0].starts_with("; This file has been post-processed by ffpp"));
        assert!(lines[1].starts_with("; Original File Location: "));
        assert_eq!(
            &lines[4..],
            &[
                "M104 S200 T0 ; set extruder temperature",
                "M6 T0 ; wait for extruder temperature to be reached",
                "G1 X10 Y10 F7800",
            ]
        );
    }

    #[test]
    fn test_without_header() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.gcode");
        let destination = dir.path().join("plate_1.gcode");
        fs::write(&input, "G28\n").unwrap();

        let settings = PostProcessSettings {
            add_header: false,
            ..PostProcessSettings::default()
        };
        let outcome = run_job(&input, &destination, settings).unwrap();
        assert_eq!(outcome.path, dir.path().join("FFpp_plate_1.g"));
        assert_eq!(fs::read_to_string(&outcome.path).unwrap(), "G28\n");
    }

    #[test]
    fn test_fatal_error_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("bad.gcode");
        fs::write(&input, "M109 S200\n").unwrap();

        assert!(run_job(&input, &input, PostProcessSettings::default()).is_err());
        let entries: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
        assert!(!dir.path().join(format!("{FAILURE_PREFIX}bad.g")).exists());
    }

    #[test]
    fn test_write_replaces_existing_output() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("FFpp_cube.g");
        fs::write(&target, "old contents that are longer than the new ones\n").unwrap();

        write_atomic(&target, "G28\n").unwrap();
        assert_eq!(fs::read_to_string(&target).unwrap(), "G28\n");
        let entries: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn test_failed_write_leaves_no_output() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("cube.gcode");
        fs::write(&input, "G28\n").unwrap();
        let destination = dir.path().join("missing").join("cube.gcode");

        let err = run_job(&input, &destination, PostProcessSettings::default()).unwrap_err();
        assert!(err.to_string().contains("failed to write"));
        assert!(!dir.path().join("missing").exists());
        let entries: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn test_missing_input() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("missing.gcode");
        let err = run_job(&input, &input, PostProcessSettings::default()).unwrap_err();
        assert!(err.to_string().contains("failed to read"));
    }
}
