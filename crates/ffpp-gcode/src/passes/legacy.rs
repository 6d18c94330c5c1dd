//! Passes kept for older slicer templates.
//!
//! [`StartCodeM109Suppressor`] predates [`super::M109Splitter`]: it simply
//! drops M109 after the start code. [`ZFeedCorrector`] forces the Z feed rate
//! on pure Z moves for templates that never emitted one.

use tracing::{debug, trace};

use super::Pass;
use crate::error::Result;
use crate::line::{format_number, SourceLine};
use crate::settings::FeedRates;

/// Comment on the feed-rate restore line emitted after a Z move.
pub const RESET_FEED_COMMENT: &str = "; reset to previous feedrate before z-move";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StartCode {
    BeforeMarker,
    AfterMarker,
}

/// Drops M109 lines once the start code is over.
///
/// M109 inside the start code is intentional (print mode selection) and is
/// preserved.
#[derive(Debug, Clone)]
pub struct StartCodeM109Suppressor {
    marker: String,
}

impl StartCodeM109Suppressor {
    /// Create a suppressor; `marker` is the line closing the start code.
    pub fn new(marker: impl Into<String>) -> Self {
        Self {
            marker: marker.into().trim_end().to_string(),
        }
    }
}

impl Pass for StartCodeM109Suppressor {
    fn name(&self) -> &'static str {
        "legacy-m109-suppress"
    }

    fn run(&mut self, lines: Vec<SourceLine>) -> Result<Vec<SourceLine>> {
        let before = lines.len();
        let (_, out) = lines.into_iter().fold(
            (StartCode::BeforeMarker, Vec::with_capacity(before)),
            |(state, mut out), line| {
                let state = match state {
                    StartCode::BeforeMarker if line.text.trim_end() == self.marker => {
                        debug!("line {}: start code ends", line.number);
                        StartCode::AfterMarker
                    }
                    StartCode::AfterMarker
                        if line.classify().is_some_and(|cmd| cmd.is('M', 109)) =>
                    {
                        trace!("line {}: dropping `{}`", line.number, line.text);
                        return (state, out);
                    }
                    other => other,
                };
                out.push(line);
                (state, out)
            },
        );
        debug!("dropped {} M109 command(s) after start code", before - out.len());
        Ok(out)
    }
}

/// Forces the Z travel feed on pure Z moves and restores the previous feed
/// afterwards.
///
/// A G1 that mixes X, Y or E with Z is left alone.
#[derive(Debug, Clone)]
pub struct ZFeedCorrector {
    feed_rates: FeedRates,
}

impl ZFeedCorrector {
    /// Create a corrector with the given travel feed rates.
    pub fn new(feed_rates: FeedRates) -> Self {
        Self { feed_rates }
    }
}

impl Pass for ZFeedCorrector {
    fn name(&self) -> &'static str {
        "legacy-z-feed"
    }

    fn run(&mut self, lines: Vec<SourceLine>) -> Result<Vec<SourceLine>> {
        let z_feed = format_number(self.feed_rates.z_travel);
        let mut last_travel_speed = format_number(self.feed_rates.xy_travel);
        let mut out = Vec::with_capacity(lines.len());
        let mut corrected = 0usize;

        for line in lines {
            let Some(cmd) = line.classify().filter(|cmd| cmd.is('G', 1)) else {
                out.push(line);
                continue;
            };

            if let Some(feed) = cmd.param('F') {
                last_travel_speed = feed.raw.clone();
            }

            let z_only = cmd.params.iter().all(|p| matches!(p.letter, 'Z' | 'F'));
            let Some(z) = cmd.param('Z').filter(|_| z_only) else {
                out.push(line);
                continue;
            };

            let mut z_move = format!("{}G1 {} F{}", cmd.prefix, z, z_feed);
            if let Some(comment) = &cmd.comment {
                z_move.push(' ');
                z_move.push_str(comment);
            }
            trace!("line {}: `{}` -> `{}`", line.number, line.text, z_move);
            out.push(SourceLine::new(line.number, z_move));
            out.push(SourceLine::new(
                line.number,
                format!(
                    "{}G1 F{} {}",
                    cmd.prefix, last_travel_speed, RESET_FEED_COMMENT
                ),
            ));
            corrected += 1;
        }

        debug!("corrected feed rate on {} Z move(s)", corrected);
        Ok(out)
    }
}
