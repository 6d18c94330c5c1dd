//! Placeholder substitution.
//!
//! Placeholders look like `<FFPP-name>` or `<FFPP-calculated-name>`. Plain
//! names resolve to their single collected value; calculated names are
//! derived from collected values, some of them through a cursor that
//! advances on every occurrence.

use std::ops::Range;

use tracing::{debug, trace};

use super::table::{is_name_byte, MacroValueTable, MACRO_KEYWORD};
use crate::error::{PostProcessError, Result};
use crate::line::SourceLine;
use crate::passes::Pass;

/// Prefix that selects a derived value.
pub const CALCULATED_PREFIX: &str = "calculated-";

/// Collected once per layer by the slicer template.
pub const LAYER_Z_HEIGHT: &str = "layer_z_height";

/// Number of `layer_z_height` values.
pub const TOTAL_LAYER_COUNT: &str = "total_layer_count";

/// Height of the next layer, one `layer_z_height` step per occurrence.
pub const NEXT_LAYER_HEIGHT: &str = "next_layer_height";

/// A placeholder found in a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placeholder<'a> {
    /// `<FFPP-name>`.
    Plain(&'a str),
    /// `<FFPP-calculated-name>`.
    Calculated(&'a str),
}

/// Find the first placeholder in `text`, with its byte range.
pub fn find_placeholder(text: &str) -> Option<(Range<usize>, Placeholder<'_>)> {
    let opener = format!("<{MACRO_KEYWORD}");
    let mut from = 0;
    while let Some(offset) = text[from..].find(&opener) {
        let start = from + offset;
        let body_start = start + opener.len();
        if let Some((len, placeholder)) = parse_body(&text[body_start..]) {
            return Some((start..body_start + len, placeholder));
        }
        from = start + 1;
    }
    None
}

/// Parse `name>` or `calculated-name>`; returns consumed length.
fn parse_body(body: &str) -> Option<(usize, Placeholder<'_>)> {
    let (skip, calculated) = match body.strip_prefix(CALCULATED_PREFIX) {
        Some(_) => (CALCULATED_PREFIX.len(), true),
        None => (0, false),
    };
    let rest = &body[skip..];
    let name_len = rest.bytes().take_while(|&b| is_name_byte(b)).count();
    if name_len == 0 || rest.as_bytes().get(name_len) != Some(&b'>') {
        return None;
    }
    let name = &rest[..name_len];
    let placeholder = if calculated {
        Placeholder::Calculated(name)
    } else {
        Placeholder::Plain(name)
    };
    Some((skip + name_len + 1, placeholder))
}

/// Substitution pass.
///
/// Holds the per-run cursors, so a fresh one is needed for every file.
pub struct Substitutor<'a> {
    table: &'a MacroValueTable,
    config_start_marker: &'a str,
    config_reached: bool,
    next_layer_cursor: usize,
}

impl<'a> Substitutor<'a> {
    /// Create a substitutor over a collected table.
    pub fn new(table: &'a MacroValueTable, config_start_marker: &'a str) -> Self {
        Self {
            table,
            config_start_marker: config_start_marker.trim_end(),
            config_reached: false,
            next_layer_cursor: 0,
        }
    }

    /// Substitute every placeholder in one line.
    ///
    /// Returns the line untouched once the config-start marker was seen.
    pub fn substitute_line(&mut self, line: SourceLine) -> Result<SourceLine> {
        if self.config_reached {
            return Ok(line);
        }
        if line.text.trim_end() == self.config_start_marker {
            debug!("line {}: config section starts, substitution stops", line.number);
            self.config_reached = true;
            return Ok(line);
        }
        if find_placeholder(&line.text).is_none() {
            return Ok(line);
        }

        let mut out = String::with_capacity(line.text.len());
        let mut rest = line.text.as_str();
        while let Some((range, placeholder)) = find_placeholder(rest) {
            out.push_str(&rest[..range.start]);
            out.push_str(&self.resolve(placeholder, line.number)?);
            rest = &rest[range.end..];
        }
        out.push_str(rest);

        trace!("line {}: `{}` -> `{}`", line.number, line.text, out);
        Ok(SourceLine::new(line.number, out))
    }

    fn resolve(&mut self, placeholder: Placeholder<'_>, line: usize) -> Result<String> {
        match placeholder {
            Placeholder::Plain(name) => match self.table.single_value(name)? {
                Some(value) => Ok(value.to_string()),
                None => Err(PostProcessError::UnknownMacro {
                    line,
                    name: name.to_string(),
                }),
            },
            Placeholder::Calculated(TOTAL_LAYER_COUNT) => Ok(self.layer_heights().len().to_string()),
            Placeholder::Calculated(NEXT_LAYER_HEIGHT) => self.next_layer_height(line),
            Placeholder::Calculated(name) => Err(PostProcessError::UnimplementedCalculation {
                line,
                name: name.to_string(),
            }),
        }
    }

    fn layer_heights(&self) -> &'a [String] {
        self.table.values(LAYER_Z_HEIGHT).unwrap_or_default()
    }

    fn next_layer_height(&mut self, line: usize) -> Result<String> {
        let heights = self.layer_heights();
        let cursor = self.next_layer_cursor;
        if cursor >= heights.len() {
            return Err(PostProcessError::CursorOutOfRange {
                line,
                name: NEXT_LAYER_HEIGHT.to_string(),
                cursor,
                available: heights.len(),
            });
        }

        let current = parse_height(&heights[cursor])?;
        let previous = match cursor {
            0 => 0.0,
            _ => parse_height(&heights[cursor - 1])?,
        };
        self.next_layer_cursor += 1;

        Ok(format!("{:.3}", current - previous))
    }
}

fn parse_height(raw: &str) -> Result<f64> {
    raw.parse().map_err(|_| PostProcessError::InvalidMacroValue {
        name: LAYER_Z_HEIGHT.to_string(),
        value: raw.to_string(),
    })
}

impl Pass for Substitutor<'_> {
    fn name(&self) -> &'static str {
        "macro-substitution"
    }

    fn run(&mut self, lines: Vec<SourceLine>) -> Result<Vec<SourceLine>> {
        lines
            .into_iter()
            .map(|line| self.substitute_line(line))
            .collect()
    }
}
