//! Source lines and the command classifier.
//!
//! A line is either a [`ParsedCommand`] or opaque text. Opaque lines are
//! copied verbatim by every pass, so classification only has to be right
//! about the lines it claims.

use std::fmt;

use tracing::trace;

use crate::lexer::{GrammarMismatch, Lexeme, Lexer};

/// Letters that may start a command.
pub const COMMAND_LETTERS: &[char] = &['G', 'M', 'T'];

/// Letters that may follow a command as parameters.
pub const PARAM_LETTERS: &[char] = &['X', 'Y', 'Z', 'E', 'F', 'S', 'T'];

/// One line of G-code with the input line it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLine {
    /// Line number in the input file (1-indexed). Lines produced by a
    /// rewrite keep the number of the line they replaced.
    pub number: usize,
    /// Line text without terminator.
    pub text: String,
}

impl SourceLine {
    /// Create a line.
    pub fn new(number: usize, text: impl Into<String>) -> Self {
        Self {
            number,
            text: text.into(),
        }
    }

    /// Classify this line.
    pub fn classify(&self) -> Option<ParsedCommand> {
        match ParsedCommand::parse(&self.text) {
            Ok(cmd) => Some(cmd),
            Err(mismatch) => {
                trace!("line {} is opaque ({})", self.number, mismatch);
                None
            }
        }
    }
}

/// Split file contents into numbered lines.
///
/// Both `\n` and `\r\n` terminators are accepted.
pub fn split_lines(contents: &str) -> Vec<SourceLine> {
    contents
        .lines()
        .enumerate()
        .map(|(i, text)| SourceLine::new(i + 1, text))
        .collect()
}

/// Join lines back into file contents, `\n`-terminated.
pub fn join_lines(lines: &[SourceLine]) -> String {
    let mut out = String::with_capacity(lines.iter().map(|l| l.text.len() + 1).sum());
    for line in lines {
        out.push_str(&line.text);
        out.push('\n');
    }
    out
}

/// A letter with a numeric value.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    /// Upper-case letter.
    pub letter: char,
    /// Parsed value.
    pub value: f64,
    /// Numeric text as written in the source.
    pub raw: String,
}

impl Token {
    /// Create a token from a value, formatted with [`format_number`].
    pub fn new(letter: char, value: f64) -> Self {
        Self {
            letter,
            value,
            raw: format_number(value),
        }
    }

    fn from_lexeme(letter: char, number: &str) -> Self {
        Self {
            letter,
            // The lexer only hands out `-?\d+(\.\d+)?`.
            value: number.parse().unwrap_or_default(),
            raw: number.to_string(),
        }
    }

    /// Is the value written as a non-negative integer?
    pub fn is_integral(&self) -> bool {
        self.raw.bytes().all(|b| b.is_ascii_digit())
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.letter, self.raw)
    }
}

/// A classified command line.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedCommand {
    /// Leading `;`, `:` and whitespace.
    pub prefix: String,
    /// Command word (`G1`, `M109`, `T0`, ...).
    pub command: Token,
    /// Parameters in source order.
    pub params: Vec<Token>,
    /// Trailing comment including its `;`.
    pub comment: Option<String>,
}

impl ParsedCommand {
    /// Parse a line, anchored at its start.
    pub fn parse(line: &str) -> Result<Self, GrammarMismatch> {
        let mut lexer = Lexer::new(line);
        let prefix = lexer.prefix();
        let lexemes = lexer.tokenize()?;
        let mut lexemes = lexemes.into_iter();

        let command = match lexemes.next() {
            Some(Lexeme::Word { letter, number })
                if COMMAND_LETTERS.contains(&letter) && !number.starts_with('-') =>
            {
                Token::from_lexeme(letter, number)
            }
            _ => return Err(mismatch(prefix, "expected a G, M or T command")),
        };

        let mut params = Vec::new();
        let mut comment = None;
        for lexeme in lexemes {
            match lexeme {
                Lexeme::Word { letter, number } if PARAM_LETTERS.contains(&letter) => {
                    params.push(Token::from_lexeme(letter, number));
                }
                Lexeme::Word { .. } => {
                    return Err(mismatch(prefix, "unsupported parameter letter"));
                }
                Lexeme::Comment(text) => comment = Some(text.to_string()),
            }
        }

        Ok(Self {
            prefix: prefix.to_string(),
            command,
            params,
            comment,
        })
    }

    /// Does the command word match `letter` and `number` (e.g. `'G', 1`)?
    pub fn is(&self, letter: char, number: u32) -> bool {
        self.command.letter == letter && self.command.value == f64::from(number)
    }

    /// First parameter with the given letter.
    pub fn param(&self, letter: char) -> Option<&Token> {
        self.params.iter().find(|p| p.letter == letter)
    }

    /// Does the command carry a parameter with the given letter?
    pub fn has(&self, letter: char) -> bool {
        self.param(letter).is_some()
    }

    /// Is this a bare tool select (`T<n>` with no parameters)?
    pub fn is_bare_tool_change(&self) -> bool {
        self.command.letter == 'T' && self.command.is_integral() && self.params.is_empty()
    }

    /// Serialize back to a line.
    pub fn to_line(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ParsedCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.prefix, self.command)?;
        for param in &self.params {
            write!(f, " {}", param)?;
        }
        if let Some(comment) = &self.comment {
            write!(f, " {}", comment)?;
        }
        Ok(())
    }
}

fn mismatch(prefix: &str, reason: &'static str) -> GrammarMismatch {
    GrammarMismatch {
        col: prefix.len() + 1,
        reason,
    }
}

/// Decimal places written for generated values.
pub const NUMBER_PRECISION: usize = 3;

/// Format a number the way slicers write feed rates: at most
/// [`NUMBER_PRECISION`] decimals, trailing zeros dropped.
pub fn format_number(value: f64) -> String {
    let text = format!("{:.prec$}", value, prec = NUMBER_PRECISION);
    let text = text.trim_end_matches('0').trim_end_matches('.');
    match text {
        "-0" => "0".to_string(),
        _ => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(line: &str) -> ParsedCommand {
        ParsedCommand::parse(line).unwrap()
    }

    #[test]
    fn test_parse_move() {
        let cmd = parse("G1 X10.5 Y-3 E0.02 ; perimeter");
        assert!(cmd.is('G', 1));
        assert_eq!(cmd.prefix, "");
        assert_eq!(cmd.params.len(), 3);
        assert_eq!(cmd.param('Y').map(|t| t.value), Some(-3.0));
        assert_eq!(cmd.comment.as_deref(), Some("; perimeter"));
    }

    #[test]
    fn test_disabled_command_is_classified() {
        let cmd = parse(";M109 S210 T1");
        assert_eq!(cmd.prefix, ";");
        assert!(cmd.is('M', 109));
        assert_eq!(cmd.param('T').map(|t| t.raw.as_str()), Some("1"));
    }

    #[test]
    fn test_opaque_lines() {
        for line in [
            "",
            "   ",
            "; just a comment",
            ";LAYER_CHANGE",
            "G1 X10 P3",
            "X10 Y10",
            "G-1 X10",
            "G1 Z<FFPP-calculated-next_layer_height>",
            "M117 Printing...",
        ] {
            assert!(ParsedCommand::parse(line).is_err(), "{line:?} should be opaque");
        }
    }

    #[test]
    fn test_parameter_order_preserved() {
        let cmd = parse("G1 F1800 Z0.3 X1");
        let letters: Vec<char> = cmd.params.iter().map(|p| p.letter).collect();
        assert_eq!(letters, vec!['F', 'Z', 'X']);
    }

    #[test]
    fn test_display_round_trip() {
        let cmd = parse(";  G1 X10.50 Y-3 ;move");
        assert_eq!(cmd.to_line(), ";  G1 X10.50 Y-3 ;move");
    }

    #[test]
    fn test_bare_tool_change() {
        assert!(parse("T1").is_bare_tool_change());
        assert!(parse(";T0 ; tool").is_bare_tool_change());
        assert!(!parse("T1 S200").is_bare_tool_change());
        assert!(!parse("T1.5").is_bare_tool_change());
        assert!(!parse("M6 T1").is_bare_tool_change());
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(7800.0), "7800");
        assert_eq!(format_number(420.0), "420");
        assert_eq!(format_number(1500.5), "1500.5");
        assert_eq!(format_number(130.3 * 60.0), "7818");
        assert_eq!(format_number(7.77 * 60.0), "466.2");
        assert_eq!(format_number(0.12345), "0.123");
        assert_eq!(format_number(-0.0001), "0");
    }

    #[test]
    fn test_split_and_join() {
        let lines = split_lines("G28\r\n; comment\nG1 Z5\n");
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1], SourceLine::new(2, "; comment"));
        assert_eq!(join_lines(&lines), "G28\n; comment\nG1 Z5\n");
    }
}
