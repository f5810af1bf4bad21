//! # folio-css
//!
//! A small, forgiving reader for inline `style` attributes found in pasted
//! HTML. Word processors, spreadsheets, IDEs and chat clients encode most of
//! their formatting as inline CSS, so the clipboard importer needs to read it
//! without ever failing on malformed input.
//!
//! ## Architecture Overview
//!
//! ```text
//! style="..." → Lexer → Tokens → Declaration parser → Vec<Declaration>
//!               (Logos)                                  ↓
//!                                          value readers (lengths, weights,
//!                                          keywords, font families)
//! ```
//!
//! ### 1. Lexer ([`lexer`] module)
//!
//! Logos-generated tokenizer. Lossless: every input byte lands in exactly one
//! token, unrecognised bytes become `Delim` tokens.
//!
//! ### 2. Declarations ([`declaration`] module)
//!
//! Splits on top-level `;`, reads `property: value`, strips `!important`.
//! Broken declarations are skipped.
//!
//! ### 3. Values ([`value`] module)
//!
//! Typed readers for the value shapes the importer maps onto formatting:
//! font sizes in points, numeric font weights, keyword lists, family lists.
//!
//! ## Quick Start
//!
//! ```
//! use folio_css::{parse_declarations, value::font_size_points};
//!
//! let decls = parse_declarations("font-size: 26pt; font-weight: 400");
//! assert_eq!(decls[0].property, "font-size");
//! assert_eq!(font_size_points(&decls[0].value, 12.0), Some(26.0));
//! ```

pub mod declaration;
pub mod lexer;
pub mod value;

pub use declaration::{Declaration, find, parse_declarations};
