//! Logos-based lexer for the compact history text DSL (§6, "line- or
//! collection-structured textual form").
//!
//! The DSL describes a flat stream of op records. Each record is one line:
//! a `:type` tag, a process id, an index, a wall-clock time in nanoseconds,
//! and a bracketed sequence of mops. Records for different processes may be
//! freely interleaved; session separators (`---`) are accepted but purely
//! cosmetic, carried over from the teacher's grouped-by-session layout.
//!
//! # Example input
//!
//! ```text
//! // process 0 appends 1 to x, then commits having read [1]
//! :invoke 0 0 0 [[:append x 1]]
//! :ok     0 1 50 [[:append x 1]]
//! :invoke 0 2 60 [[:r x nil]]
//! :ok     0 3 90 [[:r x [1]]]
//! ---
//! :invoke 1 4 10 [[:r y nil]]
//! :fail   1 5 20 [[:r y nil]]
//! ```

use std::ops::Range;

/// All token kinds produced by the DSL lexer.
#[cfg_attr(feature = "serde", derive(::serde::Serialize, ::serde::Deserialize))]
#[derive(::logos::Logos, Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    /// A line comment starting with `//` and running to end of line.
    #[regex(r"//[^\n]*")]
    Comment,

    /// One or more `-` characters on their own (cosmetic session separator).
    #[regex(r"-+")]
    Dash,

    /// Opening bracket `[`.
    #[token("[")]
    BracketOpen,

    /// Closing bracket `]`.
    #[token("]")]
    BracketClose,

    /// `:`, introducing a symbolic tag (`:ok`, `:r`, `:append`, ...).
    #[token(":")]
    Colon,

    /// An identifier: starts with a letter or underscore, followed by
    /// letters, digits, or underscores. Doubles as a symbolic tag's name
    /// (following a `Colon`) and as a bare string key.
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*")]
    Ident,

    /// An unsigned integer literal: one or more ASCII digits.
    #[regex(r"[0-9]+")]
    Integer,

    /// A newline (`\n` or `\r\n`).
    #[regex(r"\r?\n")]
    Newline,

    /// Spaces or tabs.
    #[regex(r"[ \t]+")]
    Whitespace,
}

/// A single token with its kind and the byte-offset span in the source.
#[cfg_attr(feature = "serde", derive(::serde::Serialize, ::serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// What kind of token this is.
    pub kind: TokenKind,
    /// Byte range `start..end` into the original input string.
    pub span: Range<usize>,
}

impl Token {
    /// Construct a new [`Token`].
    #[must_use]
    pub const fn new(kind: TokenKind, span: Range<usize>) -> Self {
        Self { kind, span }
    }

    /// Return the source text for this token given the original input.
    #[must_use]
    pub fn text<'a>(&self, input: &'a str) -> &'a str {
        &input[self.span.clone()]
    }
}

/// Tokenize `input` and return all valid tokens.
///
/// Tokens that the lexer cannot recognise are silently skipped.
/// Use [`tokenize_with_text`] if you also need the source slice for each token.
#[must_use]
pub fn tokenize(input: &str) -> Vec<Token> {
    use logos::Logos as _;
    TokenKind::lexer(input)
        .spanned()
        .filter_map(|(result, span)| result.ok().map(|kind| Token { kind, span }))
        .collect()
}

/// Tokenize `input` and return tokens paired with their source text slices.
///
/// Tokens that the lexer cannot recognise are silently skipped.
#[must_use]
pub fn tokenize_with_text(input: &str) -> Vec<(Token, &str)> {
    use logos::Logos as _;
    TokenKind::lexer(input)
        .spanned()
        .filter_map(|(result, span)| {
            result.ok().map(|kind| {
                let text = &input[span.clone()];
                (Token { kind, span }, text)
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{tokenize, tokenize_with_text, TokenKind};

    fn kinds(input: &str) -> Vec<TokenKind> {
        tokenize(input).into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_basic_record() {
        let input = ":ok 0 1 50 [[:append x 1]]\n";
        let ks = kinds(input);
        assert_eq!(ks[0], TokenKind::Colon);
        assert_eq!(ks[1], TokenKind::Ident); // ok
        assert_eq!(ks[3], TokenKind::Integer); // 0
    }

    #[test]
    fn test_separator_tokenization() {
        let ks = kinds("---\n");
        assert_eq!(ks[0], TokenKind::Dash);
        assert_eq!(ks[1], TokenKind::Newline);
    }

    #[test]
    fn test_comment_tokenization() {
        let ks = kinds("// a comment\n:ok 0 0 0 []\n");
        assert_eq!(ks[0], TokenKind::Comment);
        assert_eq!(ks[1], TokenKind::Newline);
        assert_eq!(ks[2], TokenKind::Colon);
    }

    #[test]
    fn test_nested_brackets() {
        let ks = kinds("[[:r x [1 2]]]");
        assert_eq!(ks[0], TokenKind::BracketOpen);
        assert_eq!(ks[1], TokenKind::BracketOpen);
    }

    #[test]
    fn test_tokenize_with_text_spans() {
        let pairs = tokenize_with_text(":w");
        let texts: Vec<&str> = pairs.iter().map(|(_, s)| *s).collect();
        assert_eq!(texts, &[":", "w"]);
    }
}
