//! Declaration parsing: `property: value [!important]` pairs separated by `;`.
//!
//! The parser is deliberately forgiving. Anything that does not look like a
//! declaration (missing colon, empty property, empty value) is skipped
//! instead of failing the whole attribute.

use crate::lexer::{Token, TokenKind, lex};

/// One parsed declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    /// Lowercased property name
    pub property: String,
    /// Value text with whitespace runs collapsed and `!important` removed
    pub value: String,
    pub important: bool,
}

impl Declaration {
    pub fn new(property: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            value: value.into(),
            important: false,
        }
    }
}

/// Parse an inline style attribute into declarations, in source order.
pub fn parse_declarations(style: &str) -> Vec<Declaration> {
    let tokens = lex(style);
    split_top_level(&tokens, TokenKind::Semicolon)
        .into_iter()
        .filter_map(parse_declaration)
        .collect()
}

/// Look up the last declaration for `property` (later declarations win).
pub fn find<'a>(declarations: &'a [Declaration], property: &str) -> Option<&'a Declaration> {
    declarations.iter().rev().find(|d| d.property == property)
}

fn parse_declaration(tokens: &[Token<'_>]) -> Option<Declaration> {
    let colon = tokens.iter().position(|t| t.kind == TokenKind::Colon)?;
    let (name_tokens, rest) = tokens.split_at(colon);

    let mut name_iter = name_tokens.iter().filter(|t| !t.is_trivia());
    let name = name_iter.next()?;
    if name.kind != TokenKind::Ident || name_iter.next().is_some() {
        return None;
    }

    let mut value_tokens: Vec<&Token<'_>> = rest[1..].iter().collect();
    let important = strip_important(&mut value_tokens);
    let value = join_value(&value_tokens);
    if value.is_empty() {
        return None;
    }

    Some(Declaration {
        property: name.text.to_ascii_lowercase(),
        value,
        important,
    })
}

/// Remove a trailing `! important` from the value tokens.
fn strip_important(value: &mut Vec<&Token<'_>>) -> bool {
    while value.last().is_some_and(|t| t.is_trivia()) {
        value.pop();
    }
    let Some(last) = value.last() else {
        return false;
    };
    if last.kind != TokenKind::Ident || !last.text.eq_ignore_ascii_case("important") {
        return false;
    }

    let mut cut = value.len() - 1;
    while cut > 0 && value[cut - 1].is_trivia() {
        cut -= 1;
    }
    if cut == 0 || value[cut - 1].kind != TokenKind::Bang {
        return false;
    }
    value.truncate(cut - 1);
    true
}

fn join_value(tokens: &[&Token<'_>]) -> String {
    let mut out = String::new();
    let mut pending_space = false;
    for token in tokens {
        if token.is_trivia() {
            pending_space = !out.is_empty();
            continue;
        }
        if pending_space {
            out.push(' ');
            pending_space = false;
        }
        out.push_str(token.text);
    }
    out
}

/// Split tokens on `separator`, ignoring separators nested in parentheses.
pub(crate) fn split_top_level<'t, 'a>(
    tokens: &'t [Token<'a>],
    separator: TokenKind,
) -> Vec<&'t [Token<'a>]> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (index, token) in tokens.iter().enumerate() {
        match token.kind {
            TokenKind::LParen => depth += 1,
            TokenKind::RParen => depth = depth.saturating_sub(1),
            kind if kind == separator && depth == 0 => {
                parts.push(&tokens[start..index]);
                start = index + 1;
            }
            _ => {}
        }
    }
    parts.push(&tokens[start..]);
    parts
}
