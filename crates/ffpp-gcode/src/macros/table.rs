//! Collected FFPP macro values.

use std::collections::BTreeMap;

use tracing::trace;

use crate::error::{PostProcessError, Result};
use crate::line::SourceLine;

/// Marker keyword shared by collection lines and placeholders.
pub const MACRO_KEYWORD: &str = "FFPP-";

/// Macro names are `[A-Za-z0-9_]+`.
pub(crate) fn is_name_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// Parse a collection line `; FFPP-<name>: <value>`.
///
/// Anything after a second `;` is a comment and not part of the value.
/// Returns `(name, value)`.
pub fn parse_marker(line: &str) -> Option<(&str, &str)> {
    let rest = line
        .trim_start()
        .strip_prefix(';')?
        .trim_start()
        .strip_prefix(MACRO_KEYWORD)?;

    let name_len = rest.bytes().take_while(|&b| is_name_byte(b)).count();
    if name_len == 0 {
        return None;
    }
    let (name, rest) = rest.split_at(name_len);
    let rest = rest.strip_prefix(':')?;

    let value = match rest.find(';') {
        Some(end) => &rest[..end],
        None => rest,
    }
    .trim();

    if value.is_empty() {
        None
    } else {
        Some((name, value))
    }
}

/// Macro name to values, in file order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MacroValueTable {
    values: BTreeMap<String, Vec<String>>,
}

impl MacroValueTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Scan all lines and collect every marker. Lines are not modified.
    pub fn collect(lines: &[SourceLine]) -> Self {
        let mut table = Self::new();
        for line in lines {
            if let Some((name, value)) = parse_marker(&line.text) {
                trace!("line {}: collected {} = {}", line.number, name, value);
                table.push(name, value);
            }
        }
        table
    }

    /// Append a value under `name`.
    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.entry(name.into()).or_default().push(value.into());
    }

    /// All values collected under `name`, in file order.
    pub fn values(&self, name: &str) -> Option<&[String]> {
        self.values.get(name).map(Vec::as_slice)
    }

    /// The single value of a plain macro.
    ///
    /// Returns `Ok(None)` when the macro was never collected, and an error
    /// when it was collected with different values.
    pub fn single_value(&self, name: &str) -> Result<Option<&str>> {
        let Some((first, rest)) = self.values(name).and_then(<[String]>::split_first) else {
            return Ok(None);
        };
        if let Some(conflicting) = rest.iter().find(|v| *v != first) {
            return Err(PostProcessError::MacroConsistency {
                name: name.to_string(),
                first: first.clone(),
                conflicting: conflicting.clone(),
            });
        }
        Ok(Some(first))
    }

    /// Collected macro names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// Number of distinct macro names.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True if nothing was collected.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
