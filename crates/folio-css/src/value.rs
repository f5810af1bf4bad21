//! Typed readers for the handful of value shapes the clipboard importer cares
//! about: lengths (font sizes), font weights, keyword lists and font-family
//! lists.

use crate::declaration::split_top_level;
use crate::lexer::{TokenKind, lex};

/// Points per CSS pixel.
const PT_PER_PX: f32 = 0.75;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LengthUnit {
    Px,
    Pt,
    Em,
    Rem,
    Percent,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Length {
    pub value: f32,
    pub unit: LengthUnit,
}

impl Length {
    /// Parse a single length token (`12pt`, `16px`, `1.2em`, `80%`, `0`).
    pub fn parse(value: &str) -> Option<Self> {
        let tokens = lex(value.trim());
        let [token] = tokens.as_slice() else {
            return None;
        };
        match token.kind {
            TokenKind::Dimension => {
                let split = token
                    .text
                    .find(|c: char| c.is_ascii_alphabetic())
                    .unwrap_or(token.text.len());
                let (number, unit) = token.text.split_at(split);
                let unit = match unit.to_ascii_lowercase().as_str() {
                    "px" => LengthUnit::Px,
                    "pt" => LengthUnit::Pt,
                    "em" => LengthUnit::Em,
                    "rem" => LengthUnit::Rem,
                    _ => return None,
                };
                Some(Self {
                    value: number.parse().ok()?,
                    unit,
                })
            }
            TokenKind::Percentage => Some(Self {
                value: token.text.trim_end_matches('%').parse().ok()?,
                unit: LengthUnit::Percent,
            }),
            TokenKind::Number if token.text.parse::<f32>().ok()? == 0.0 => Some(Self {
                value: 0.0,
                unit: LengthUnit::Px,
            }),
            _ => None,
        }
    }

    /// Convert to points; relative units resolve against `base_pt`.
    pub fn to_points(self, base_pt: f32) -> f32 {
        match self.unit {
            LengthUnit::Px => self.value * PT_PER_PX,
            LengthUnit::Pt => self.value,
            LengthUnit::Em | LengthUnit::Rem => self.value * base_pt,
            LengthUnit::Percent => self.value * base_pt / 100.0,
        }
    }
}

/// Resolve a `font-size` value (length or absolute/relative keyword) to points.
pub fn font_size_points(value: &str, base_pt: f32) -> Option<f32> {
    if let Some(length) = Length::parse(value) {
        return Some(length.to_points(base_pt));
    }
    let points = match value.trim().to_ascii_lowercase().as_str() {
        "xx-small" => 7.0,
        "x-small" => 7.5,
        "small" => 10.0,
        "medium" => 12.0,
        "large" => 13.5,
        "x-large" => 18.0,
        "xx-large" => 24.0,
        "xxx-large" => 36.0,
        "smaller" => base_pt * 0.83,
        "larger" => base_pt * 1.2,
        _ => return None,
    };
    Some(points)
}

/// Numeric font weight for a `font-weight` value.
pub fn font_weight(value: &str) -> Option<u16> {
    match value.trim().to_ascii_lowercase().as_str() {
        "normal" => Some(400),
        "bold" | "bolder" => Some(700),
        "lighter" => Some(300),
        other => other.parse::<u16>().ok().filter(|w| (1..=1000).contains(w)),
    }
}

/// Lowercased identifier keywords of a value (`underline line-through`).
pub fn keywords(value: &str) -> Vec<String> {
    lex(value)
        .into_iter()
        .filter(|t| t.kind == TokenKind::Ident)
        .map(|t| t.text.to_ascii_lowercase())
        .collect()
}

/// Lowercased, unquoted family names of a `font-family` value.
pub fn font_families(value: &str) -> Vec<String> {
    let tokens = lex(value);
    split_top_level(&tokens, TokenKind::Comma)
        .into_iter()
        .filter_map(|part| {
            let text: Vec<&str> = part
                .iter()
                .filter(|t| !t.is_trivia())
                .map(|t| t.text.trim_matches(|c| c == '"' || c == '\''))
                .collect();
            let family = text.join(" ").to_ascii_lowercase();
            (!family.is_empty()).then_some(family)
        })
        .collect()
}
