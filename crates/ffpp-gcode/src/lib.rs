#![warn(missing_docs)]

//! G-code post-processing for FlashForge printers.
//!
//! Rewrites slicer output into the dialect FlashForge firmware understands
//! and resolves FFPP macros embedded in slicer templates:
//! - `M109 S<t> T<e>` becomes `M104` + `M6`, and the next move gets an
//!   explicit feed rate
//! - bare `T<n>` tool selects are removed
//! - `; FFPP-<name>: <value>` lines are collected and `<FFPP-<name>>`
//!   placeholders substituted
//!
//! Commented-out commands (`;M109 S200 T0`) are rewritten too, because the
//! firmware still parses them.
//!
//! # Example
//!
//! ```
//! use ffpp_gcode::{Pipeline, PostProcessSettings};
//!
//! let pipeline = Pipeline::new(PostProcessSettings::default()).unwrap();
//! let output = pipeline.run_str("M109 S200 T0\nG1 X10 Y10\n").unwrap();
//!
//! assert_eq!(
//!     output.to_gcode(),
//!     "M104 S200 T0 ; set extruder temperature\n\
//!      M6 T0 ; wait for extruder temperature to be reached\n\
//!      G1 X10 Y10 F7800\n"
//! );
//! ```

pub mod error;
pub mod header;
pub mod lexer;
pub mod line;
pub mod macros;
pub mod naming;
pub mod passes;
pub mod pipeline;
pub mod settings;
pub mod validate;

pub use error::{PostProcessError, Result};
pub use header::render_header;
pub use line::{join_lines, split_lines, ParsedCommand, SourceLine, Token};
pub use macros::{MacroValueTable, Substitutor};
pub use naming::{output_path, FILE_NAME_LIMIT};
pub use passes::Pass;
pub use pipeline::{PassReport, Pipeline, PipelineOutput, PipelineReport};
pub use settings::{FeedRates, PipelineMode, PostProcessSettings};
pub use validate::{validate, IssueKind, ValidationIssue};
