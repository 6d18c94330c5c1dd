//! G-code line lexer.
//!
//! Splits one line of slicer output into lexemes. Handles:
//! - The leading prefix of `;`, `:` and whitespace that FlashForge firmware
//!   skips over (so `;M109 S200 T0` is still a command to it)
//! - Words: one upper-case ASCII letter followed by a number
//!   (e.g. `G1`, `X-10.5`, `T0`)
//! - Trailing comments (`;` to end of line)
//!
//! The lexer knows nothing about which letters are valid where; that is the
//! classifier's job in [`crate::line`].

use std::fmt;

/// A lexeme in a G-code line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lexeme<'a> {
    /// Letter plus numeric text (e.g. `X` and `-10.5`).
    Word {
        /// Upper-case ASCII letter.
        letter: char,
        /// Numeric text exactly as written, sign included.
        number: &'a str,
    },
    /// Comment from the `;` to the end of the line, `;` included.
    Comment(&'a str),
}

/// Why a line does not follow the G-code grammar.
///
/// Never fatal: the line is treated as opaque text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrammarMismatch {
    /// Column number (1-indexed, in bytes).
    pub col: usize,
    /// Reason for the mismatch.
    pub reason: &'static str,
}

impl fmt::Display for GrammarMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "column {}: {}", self.col, self.reason)
    }
}

impl GrammarMismatch {
    fn at(pos: usize, reason: &'static str) -> Self {
        Self { col: pos + 1, reason }
    }
}

/// Lexer for a single G-code line.
pub struct Lexer<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Lexer<'a> {
    /// Create a new lexer for the given line (without its terminator).
    pub fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    /// Consume the leading run of `;`, `:` and whitespace.
    ///
    /// Must be called before the first [`Lexer::next_lexeme`].
    pub fn prefix(&mut self) -> &'a str {
        let start = self.pos;
        while let Some(ch) = self.peek_byte() {
            if ch == b';' || ch == b':' || ch.is_ascii_whitespace() {
                self.pos += 1;
            } else {
                break;
            }
        }
        &self.input[start..self.pos]
    }

    /// Tokenize the rest of the line.
    pub fn tokenize(&mut self) -> Result<Vec<Lexeme<'a>>, GrammarMismatch> {
        let mut lexemes = Vec::new();
        while let Some(lexeme) = self.next_lexeme()? {
            lexemes.push(lexeme);
        }
        Ok(lexemes)
    }

    /// Get the next lexeme, or `None` at end of line.
    pub fn next_lexeme(&mut self) -> Result<Option<Lexeme<'a>>, GrammarMismatch> {
        self.skip_whitespace();

        let Some(ch) = self.peek_byte() else {
            return Ok(None);
        };

        match ch {
            b';' => {
                let comment = &self.input[self.pos..];
                self.pos = self.input.len();
                Ok(Some(Lexeme::Comment(comment)))
            }
            b'A'..=b'Z' => self.read_word().map(Some),
            _ => Err(GrammarMismatch::at(self.pos, "expected a word or comment")),
        }
    }

    fn peek_byte(&self) -> Option<u8> {
        self.input.as_bytes().get(self.pos).copied()
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.peek_byte() {
            if ch.is_ascii_whitespace() {
                self.pos += 1;
            } else {
                break;
            }
        }
    }

    fn read_word(&mut self) -> Result<Lexeme<'a>, GrammarMismatch> {
        let letter = char::from(self.input.as_bytes()[self.pos]);
        self.pos += 1;

        let start = self.pos;
        if self.peek_byte() == Some(b'-') {
            self.pos += 1;
        }

        if self.read_digits() == 0 {
            return Err(GrammarMismatch::at(self.pos, "expected digits after letter"));
        }

        // Decimal part
        if self.peek_byte() == Some(b'.') {
            self.pos += 1;
            if self.read_digits() == 0 {
                return Err(GrammarMismatch::at(self.pos, "expected digits after '.'"));
            }
        }

        // Words must be separated by whitespace or end at a comment.
        match self.peek_byte() {
            None | Some(b';') => {}
            Some(ch) if ch.is_ascii_whitespace() => {}
            Some(_) => {
                return Err(GrammarMismatch::at(self.pos, "unexpected character after number"));
            }
        }

        Ok(Lexeme::Word {
            letter,
            number: &self.input[start..self.pos],
        })
    }

    fn read_digits(&mut self) -> usize {
        let start = self.pos;
        while let Some(ch) = self.peek_byte() {
            if ch.is_ascii_digit() {
                self.pos += 1;
            } else {
                break;
            }
        }
        self.pos - start
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(input: &str) -> (&str, Vec<Lexeme<'_>>) {
        let mut lexer = Lexer::new(input);
        let prefix = lexer.prefix();
        (prefix, lexer.tokenize().unwrap())
    }

    fn lex_err(input: &str) -> GrammarMismatch {
        let mut lexer = Lexer::new(input);
        lexer.prefix();
        lexer.tokenize().unwrap_err()
    }

    #[test]
    fn test_words() {
        let (prefix, lexemes) = lex("G1 X-10.5 Y3");
        assert_eq!(prefix, "");
        assert_eq!(
            lexemes,
            vec![
                Lexeme::Word { letter: 'G', number: "1" },
                Lexeme::Word { letter: 'X', number: "-10.5" },
                Lexeme::Word { letter: 'Y', number: "3" },
            ]
        );
    }

    #[test]
    fn test_prefix() {
        let (prefix, lexemes) = lex(";: M109 S200 T0");
        assert_eq!(prefix, ";: ");
        assert_eq!(lexemes.len(), 3);
    }

    #[test]
    fn test_comment() {
        let (_, lexemes) = lex("M104 S200; heat   up ");
        assert_eq!(
            lexemes,
            vec![
                Lexeme::Word { letter: 'M', number: "104" },
                Lexeme::Word { letter: 'S', number: "200" },
                Lexeme::Comment("; heat   up "),
            ]
        );
    }

    #[test]
    fn test_glued_words_rejected() {
        assert_eq!(lex_err("G1X10").col, 3);
    }

    #[test]
    fn test_malformed_numbers() {
        assert_eq!(lex_err("G1 X").reason, "expected digits after letter");
        assert_eq!(lex_err("G1 X1.").reason, "expected digits after '.'");
        assert_eq!(lex_err("G1 X.5").reason, "expected digits after letter");
    }

    #[test]
    fn test_lower_case_is_not_a_word() {
        let err = lex_err("; generated by slicer");
        assert_eq!(err.col, 3);
    }

    #[test]
    fn test_empty_line() {
        let (prefix, lexemes) = lex("");
        assert_eq!(prefix, "");
        assert!(lexemes.is_empty());
    }
}
