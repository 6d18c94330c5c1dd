//! M109 splitting and G1 feed-rate backfill.
//!
//! FlashForge firmware reads M109 as a print mode selector (normal, mirror,
//! duplicate), not as "heat and wait". Every `M109 S<t> T<e>` is therefore
//! rewritten to `M104` (set temperature) plus `M6` (wait for it).
//!
//! After a split the next qualifying G1 must carry an explicit feed rate,
//! so the first one that lacks it gets the configured travel feed.

use tracing::{debug, trace};

use super::Pass;
use crate::error::{PostProcessError, Result};
use crate::line::{ParsedCommand, SourceLine, Token};
use crate::settings::FeedRates;

/// Comment on the emitted `M104` line.
pub const SET_TEMPERATURE_COMMENT: &str = "; set extruder temperature";

/// Comment on the emitted `M6` line.
pub const WAIT_TEMPERATURE_COMMENT: &str = "; wait for extruder temperature to be reached";

/// Fold state threaded through the pass.
#[derive(Debug, Default)]
struct SplitState {
    /// The next qualifying G1 needs an explicit feed rate.
    pending_feed: bool,
    splits: usize,
    backfills: usize,
    out: Vec<SourceLine>,
}

/// What backfill decided for one G1.
enum Backfill {
    /// The move already has a feed rate.
    AlreadySet,
    /// No X, Y or Z; keep waiting for a later move.
    NotApplicable,
    /// Feed rate appended.
    Rewritten(String),
}

/// Splits `M109 S<t> T<e>` and backfills the feed rate of the next move.
#[derive(Debug, Clone)]
pub struct M109Splitter {
    feed_rates: FeedRates,
}

impl M109Splitter {
    /// Create a splitter using the given travel feed rates for backfill.
    pub fn new(feed_rates: FeedRates) -> Self {
        Self { feed_rates }
    }

    fn step(&self, mut state: SplitState, line: SourceLine) -> Result<SplitState> {
        let Some(cmd) = line.classify() else {
            state.out.push(line);
            return Ok(state);
        };

        if cmd.is('M', 109) {
            let (temperature, extruder) = m109_params(&cmd).ok_or_else(|| {
                PostProcessError::malformed(
                    line.number,
                    &line.text,
                    "expected `M109 S<temperature> T<extruder>`",
                )
            })?;
            trace!("line {}: splitting `{}`", line.number, line.text);
            state.out.push(SourceLine::new(
                line.number,
                format!(
                    "{}M104 {} {} {}",
                    cmd.prefix, temperature, extruder, SET_TEMPERATURE_COMMENT
                ),
            ));
            state.out.push(SourceLine::new(
                line.number,
                format!("{}M6 {} {}", cmd.prefix, extruder, WAIT_TEMPERATURE_COMMENT),
            ));
            state.pending_feed = true;
            state.splits += 1;
            return Ok(state);
        }

        if state.pending_feed && cmd.is('G', 1) {
            match self.backfill(&cmd, line.number)? {
                Backfill::AlreadySet => {
                    state.pending_feed = false;
                    state.out.push(line);
                }
                Backfill::NotApplicable => state.out.push(line),
                Backfill::Rewritten(text) => {
                    trace!("line {}: `{}` -> `{}`", line.number, line.text, text);
                    state.pending_feed = false;
                    state.backfills += 1;
                    state.out.push(SourceLine::new(line.number, text));
                }
            }
            return Ok(state);
        }

        state.out.push(line);
        Ok(state)
    }

    fn backfill(&self, cmd: &ParsedCommand, line: usize) -> Result<Backfill> {
        if cmd.has('F') {
            return Ok(Backfill::AlreadySet);
        }
        if !cmd.params.iter().any(|p| matches!(p.letter, 'X' | 'Y' | 'Z')) {
            return Ok(Backfill::NotApplicable);
        }

        // XY wins over Z when both are present.
        let feed = if cmd.has('X') || cmd.has('Y') {
            self.feed_rates.xy_travel
        } else if cmd.has('Z') {
            self.feed_rates.z_travel
        } else {
            return Err(PostProcessError::invariant(
                line,
                "G1 selected for backfill has neither XY nor Z",
            ));
        };

        let mut rewritten = cmd.clone();
        rewritten.params.push(Token::new('F', feed));
        Ok(Backfill::Rewritten(rewritten.to_line()))
    }
}

/// `(S, T)` of a well-formed `M109 S<t> T<e>`.
fn m109_params(cmd: &ParsedCommand) -> Option<(&Token, &Token)> {
    match cmd.params.as_slice() {
        [s, t]
            if s.letter == 'S'
                && !s.raw.starts_with('-')
                && t.letter == 'T'
                && t.is_integral() =>
        {
            Some((s, t))
        }
        _ => None,
    }
}

impl Pass for M109Splitter {
    fn name(&self) -> &'static str {
        "m109-split"
    }

    fn run(&mut self, lines: Vec<SourceLine>) -> Result<Vec<SourceLine>> {
        let initial = SplitState {
            out: Vec::with_capacity(lines.len() + lines.len() / 64),
            ..SplitState::default()
        };
        let state = lines
            .into_iter()
            .try_fold(initial, |state, line| self.step(state, line))?;

        debug!(
            "split {} M109 command(s), backfilled {} feed rate(s)",
            state.splits, state.backfills
        );
        if state.pending_feed {
            debug!("file ended with a feed rate backfill still pending");
        }
        Ok(state.out)
    }
}
