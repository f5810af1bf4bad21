//! # Lexer - Tokenizing Inline Style Attributes
//!
//! First stage of style parsing: breaking a `style="..."` attribute value into
//! tokens using the [Logos] lexer generator.
//!
//! [Logos]: https://docs.rs/logos
//!
//! ## The Lossless Guarantee
//!
//! Every byte of the input appears in exactly one token. Pasted markup is
//! frequently malformed (unclosed quotes, stray braces, office-suite
//! `mso-*` garbage), so nothing is ever dropped here; the declaration parser
//! decides what to ignore.
//!
//! ```
//! use folio_css::lexer::lex;
//!
//! let input = "font-weight: 700; color: rgb(0, 0, 0)";
//! let tokens = lex(input);
//! let reconstructed: String = tokens.iter().map(|t| t.text).collect();
//! assert_eq!(input, reconstructed);
//! ```
//!
//! ## Why Two Token Enums?
//!
//! Logos derives on [`RawToken`]; unrecognised input comes back as a lexer
//! error. [`TokenKind`] is the public kind set and adds [`TokenKind::Delim`]
//! for those error bytes, so callers never deal with `Result`s.

use logos::Logos;

/// Token kinds produced by the Logos lexer.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawToken {
    #[regex(r"[ \t\r\n\f]+")]
    Whitespace,

    #[token(":")]
    Colon,

    #[token(";")]
    Semicolon,

    #[token(",")]
    Comma,

    #[token("(")]
    LParen,

    #[token(")")]
    RParen,

    #[token("!")]
    Bang,

    /// Quoted string, either quote style
    #[regex(r#""([^"\\]|\\.)*""#)]
    #[regex(r#"'([^'\\]|\\.)*'"#)]
    String,

    /// Unitless number (`700`, `.5`, `-1`)
    #[regex(r"[+-]?([0-9]+(\.[0-9]+)?|\.[0-9]+)")]
    Number,

    /// Number with a unit (`12pt`, `1.5em`)
    #[regex(r"[+-]?([0-9]+(\.[0-9]+)?|\.[0-9]+)[a-zA-Z]+")]
    Dimension,

    /// Number with a percent sign (`80%`)
    #[regex(r"[+-]?([0-9]+(\.[0-9]+)?|\.[0-9]+)%")]
    Percentage,

    /// Hex colours and other `#`-prefixed words
    #[regex(r"#[0-9a-zA-Z_-]+")]
    Hash,

    /// Identifiers, including vendor prefixes and custom properties
    #[regex(r"-{0,2}[a-zA-Z_][a-zA-Z0-9_-]*")]
    Ident,
}

/// Public token kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Whitespace,
    Colon,
    Semicolon,
    Comma,
    LParen,
    RParen,
    Bang,
    String,
    Number,
    Dimension,
    Percentage,
    Hash,
    Ident,
    /// Any byte sequence the lexer does not recognise
    Delim,
}

impl RawToken {
    pub fn to_token_kind(self) -> TokenKind {
        match self {
            RawToken::Whitespace => TokenKind::Whitespace,
            RawToken::Colon => TokenKind::Colon,
            RawToken::Semicolon => TokenKind::Semicolon,
            RawToken::Comma => TokenKind::Comma,
            RawToken::LParen => TokenKind::LParen,
            RawToken::RParen => TokenKind::RParen,
            RawToken::Bang => TokenKind::Bang,
            RawToken::String => TokenKind::String,
            RawToken::Number => TokenKind::Number,
            RawToken::Dimension => TokenKind::Dimension,
            RawToken::Percentage => TokenKind::Percentage,
            RawToken::Hash => TokenKind::Hash,
            RawToken::Ident => TokenKind::Ident,
        }
    }
}

/// A lexed token with its kind and text slice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub text: &'a str,
}

impl Token<'_> {
    pub fn is_trivia(&self) -> bool {
        self.kind == TokenKind::Whitespace
    }
}

/// Lex the input into a sequence of tokens.
///
/// Guarantees that all bytes from the input appear in the output tokens.
pub fn lex(input: &str) -> Vec<Token<'_>> {
    lex_with_spans(input)
        .into_iter()
        .map(|(token, _)| token)
        .collect()
}

/// Lex and return tokens along with their byte spans.
pub fn lex_with_spans(input: &str) -> Vec<(Token<'_>, std::ops::Range<usize>)> {
    let mut tokens: Vec<(Token<'_>, std::ops::Range<usize>)> = Vec::new();
    let mut lexer = RawToken::lexer(input);

    while let Some(result) = lexer.next() {
        let span = lexer.span();
        let kind = match result {
            Ok(raw) => raw.to_token_kind(),
            Err(()) => TokenKind::Delim,
        };

        // Glue runs of unrecognised bytes into a single delimiter token
        if kind == TokenKind::Delim
            && let Some((last, last_span)) = tokens.last_mut()
            && last.kind == TokenKind::Delim
            && last_span.end == span.start
        {
            last_span.end = span.end;
            last.text = &input[last_span.clone()];
            continue;
        }

        tokens.push((
            Token {
                kind,
                text: &input[span.clone()],
            },
            span,
        ));
    }

    tokens
}
