//! Output file naming.
//!
//! FlashPrint and the printer's file browser only handle short names, so
//! the output name is limited to [`FILE_NAME_LIMIT`] characters.

use std::path::{Path, PathBuf};

use crate::error::{PostProcessError, Result};

/// Maximum file name length in characters, extension included.
pub const FILE_NAME_LIMIT: usize = 36;

/// Prefix of a file that passed validation.
pub const SUCCESS_PREFIX: &str = "FFpp_";

/// Prefix of a file that failed validation.
pub const FAILURE_PREFIX: &str = "FFpp_FAILED_";

/// Extension FlashForge firmware expects.
pub const OUTPUT_EXTENSION: &str = "g";

/// Build `<prefix><stem>.<extension>`, shortening the stem to fit `limit`.
pub fn fit_file_name(prefix: &str, stem: &str, extension: &str, limit: usize) -> Result<String> {
    let fixed = prefix.chars().count() + 1 + extension.chars().count();
    if fixed > limit {
        return Err(PostProcessError::FileNameTooLong {
            name: format!("{prefix}{stem}.{extension}"),
            limit,
        });
    }
    let stem: String = stem.chars().take(limit - fixed).collect();
    Ok(format!("{prefix}{stem}.{extension}"))
}

/// Output path next to `destination`, named after its stem.
///
/// `destination` is the path the slicer would have written to.
pub fn output_path(destination: &Path, passed: bool) -> Result<PathBuf> {
    let prefix = if passed { SUCCESS_PREFIX } else { FAILURE_PREFIX };
    let stem = destination
        .file_stem()
        .map(|s| s.to_string_lossy())
        .unwrap_or_default();
    let name = fit_file_name(prefix, &stem, OUTPUT_EXTENSION, FILE_NAME_LIMIT)?;
    Ok(destination.with_file_name(name))
}
