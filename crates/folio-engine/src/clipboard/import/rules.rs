//! Style semantics of pasted HTML as data.
//!
//! Formatting reaches the clipboard either as presentational tags (`<b>`,
//! `<sup>`) or as inline CSS. Both are mapped through the tables below
//! rather than through per-source branching; an element's tag is applied
//! first and its `style` attribute second, so
//! `<b style="font-weight: normal">` ends up not bold.

use folio_css::value::{font_families, font_size_points, font_weight, keywords};
use folio_css::{Declaration, parse_declarations};

use super::ImportOptions;
use super::dom::Element;
use crate::model::{TextFormat, TextRun};

/// Formatting inherited from enclosing elements.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Inherited {
    pub format: TextFormat,
    /// Presentation declarations kept on runs, in first-seen order
    pub presentation: Vec<(String, String)>,
    pub font_pt: Option<f32>,
    pub monospace: bool,
    /// `white-space: pre` and friends
    pub pre: bool,
}

impl Inherited {
    /// A run of `text` carrying the inherited marks.
    pub fn run(&self, text: impl Into<String>) -> TextRun {
        TextRun {
            text: text.into(),
            format: self.format,
            style: self
                .presentation
                .iter()
                .map(|(p, v)| format!("{p}: {v}"))
                .collect::<Vec<_>>()
                .join("; "),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Test {
    Keyword(&'static str),
    WeightAtLeast(u16),
    WeightBelow(u16),
    MonospaceFamily,
    OtherFamily,
    /// Any value except the ones that only restate the default
    Meaningful,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Effect {
    Set(TextFormat),
    Clear(TextFormat),
    Monospace(bool),
    Pre(bool),
    Keep,
}

struct Rule {
    property: &'static str,
    test: Test,
    effect: Effect,
}

const fn rule(property: &'static str, test: Test, effect: Effect) -> Rule {
    Rule {
        property,
        test,
        effect,
    }
}

const DECORATIONS: TextFormat = TextFormat::UNDERLINE.union(TextFormat::STRIKETHROUGH);
const SCRIPTS: TextFormat = TextFormat::SUBSCRIPT.union(TextFormat::SUPERSCRIPT);

const STYLE_RULES: &[Rule] = &[
    rule("font-weight", Test::WeightAtLeast(600), Effect::Set(TextFormat::BOLD)),
    rule("font-weight", Test::WeightBelow(600), Effect::Clear(TextFormat::BOLD)),
    rule("font-style", Test::Keyword("italic"), Effect::Set(TextFormat::ITALIC)),
    rule("font-style", Test::Keyword("oblique"), Effect::Set(TextFormat::ITALIC)),
    rule("font-style", Test::Keyword("normal"), Effect::Clear(TextFormat::ITALIC)),
    rule("text-decoration", Test::Keyword("none"), Effect::Clear(DECORATIONS)),
    rule("text-decoration", Test::Keyword("underline"), Effect::Set(TextFormat::UNDERLINE)),
    rule("text-decoration", Test::Keyword("line-through"), Effect::Set(TextFormat::STRIKETHROUGH)),
    rule("text-decoration-line", Test::Keyword("none"), Effect::Clear(DECORATIONS)),
    rule("text-decoration-line", Test::Keyword("underline"), Effect::Set(TextFormat::UNDERLINE)),
    rule("text-decoration-line", Test::Keyword("line-through"), Effect::Set(TextFormat::STRIKETHROUGH)),
    rule("vertical-align", Test::Keyword("sub"), Effect::Set(TextFormat::SUBSCRIPT)),
    rule("vertical-align", Test::Keyword("super"), Effect::Set(TextFormat::SUPERSCRIPT)),
    rule("vertical-align", Test::Keyword("baseline"), Effect::Clear(SCRIPTS)),
    rule("font-family", Test::MonospaceFamily, Effect::Monospace(true)),
    rule("font-family", Test::OtherFamily, Effect::Monospace(false)),
    rule("white-space", Test::Keyword("pre"), Effect::Pre(true)),
    rule("white-space", Test::Keyword("pre-wrap"), Effect::Pre(true)),
    rule("white-space", Test::Keyword("break-spaces"), Effect::Pre(true)),
    rule("white-space", Test::Keyword("normal"), Effect::Pre(false)),
    rule("color", Test::Meaningful, Effect::Keep),
    rule("background-color", Test::Meaningful, Effect::Keep),
];

const TAG_FORMATS: &[(&str, TextFormat)] = &[
    ("b", TextFormat::BOLD),
    ("strong", TextFormat::BOLD),
    ("i", TextFormat::ITALIC),
    ("em", TextFormat::ITALIC),
    ("u", TextFormat::UNDERLINE),
    ("ins", TextFormat::UNDERLINE),
    ("s", TextFormat::STRIKETHROUGH),
    ("strike", TextFormat::STRIKETHROUGH),
    ("del", TextFormat::STRIKETHROUGH),
    ("sub", TextFormat::SUBSCRIPT),
    ("sup", TextFormat::SUPERSCRIPT),
    ("code", TextFormat::CODE),
    ("kbd", TextFormat::CODE),
    ("samp", TextFormat::CODE),
    ("tt", TextFormat::CODE),
];

/// Values that restate a default and are not worth keeping on a run.
const DEFAULT_COLORS: &[&str] = &[
    "transparent",
    "inherit",
    "initial",
    "unset",
    "currentcolor",
    "windowtext",
    "black",
    "#000",
    "#000000",
    "rgb(0, 0, 0)",
    "rgb(0,0,0)",
];

/// The style table bound to the configured monospace families.
#[derive(Debug, Clone)]
pub struct StyleRules {
    monospace: Vec<String>,
    base_font_pt: f32,
}

impl StyleRules {
    pub fn new(options: &ImportOptions) -> Self {
        Self {
            monospace: options
                .monospace_fonts
                .iter()
                .map(|f| f.to_ascii_lowercase())
                .collect(),
            base_font_pt: options.base_font_size,
        }
    }

    pub fn is_monospace(&self, family: &str) -> bool {
        let family = family.to_ascii_lowercase();
        self.monospace.iter().any(|m| *m == family)
    }

    /// Formatting in effect inside `el`.
    pub fn enter(&self, el: &Element, outer: &Inherited) -> Inherited {
        let mut ctx = outer.clone();
        if let Some((_, flags)) = TAG_FORMATS.iter().find(|(tag, _)| *tag == el.tag) {
            ctx.format = ctx.format.with(*flags);
            if flags.contains(TextFormat::CODE) {
                ctx.monospace = true;
            }
        }
        if el.tag == "pre" {
            ctx.pre = true;
            ctx.monospace = true;
        }
        if el.tag == "font"
            && let Some(face) = el.attr("face")
        {
            self.apply_declaration(&Declaration::new("font-family", face), &mut ctx);
        }
        if let Some(style) = el.attr("style") {
            for decl in parse_declarations(style) {
                self.apply_declaration(&decl, &mut ctx);
            }
        }
        ctx
    }

    fn apply_declaration(&self, decl: &Declaration, ctx: &mut Inherited) {
        if decl.property == "font-size" {
            let base = ctx.font_pt.unwrap_or(self.base_font_pt);
            if let Some(points) = font_size_points(&decl.value, base) {
                ctx.font_pt = Some(points);
            }
            return;
        }
        for rule in STYLE_RULES.iter().filter(|r| r.property == decl.property) {
            if !self.matches(rule.test, &decl.value) {
                continue;
            }
            log::trace!("style {}: {} -> {:?}", decl.property, decl.value, rule.effect);
            match rule.effect {
                Effect::Set(flags) => ctx.format = ctx.format.with(flags),
                Effect::Clear(flags) => ctx.format = ctx.format.without(flags),
                Effect::Monospace(on) => {
                    ctx.monospace = on;
                    ctx.format = if on {
                        ctx.format.with(TextFormat::CODE)
                    } else {
                        ctx.format.without(TextFormat::CODE)
                    };
                }
                Effect::Pre(on) => ctx.pre = on,
                Effect::Keep => {
                    let value = decl.value.trim().to_string();
                    match ctx.presentation.iter_mut().find(|(p, _)| *p == decl.property) {
                        Some(entry) => entry.1 = value,
                        None => ctx.presentation.push((decl.property.clone(), value)),
                    }
                }
            }
        }
    }

    fn matches(&self, test: Test, value: &str) -> bool {
        match test {
            Test::Keyword(keyword) => keywords(value).iter().any(|k| k == keyword),
            Test::WeightAtLeast(min) => font_weight(value).is_some_and(|w| w >= min),
            Test::WeightBelow(max) => font_weight(value).is_some_and(|w| w < max),
            Test::MonospaceFamily => font_families(value).iter().any(|f| self.is_monospace(f)),
            Test::OtherFamily => {
                let families = font_families(value);
                !families.is_empty() && !families.iter().any(|f| self.is_monospace(f))
            }
            Test::Meaningful => {
                let value = value.trim().to_ascii_lowercase();
                !DEFAULT_COLORS.contains(&value.as_str())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn element(tag: &str, style: &str) -> Element {
        Element {
            tag: tag.to_string(),
            attrs: vec![("style".to_string(), style.to_string())],
            children: Vec::new(),
        }
    }

    fn format_of(tag: &str, style: &str) -> TextFormat {
        let rules = StyleRules::new(&ImportOptions::default());
        rules.enter(&element(tag, style), &Inherited::default()).format
    }

    #[rstest]
    #[case("span", "font-weight:700", TextFormat::BOLD)]
    #[case("span", "font-weight: bold; font-style: italic", TextFormat::BOLD | TextFormat::ITALIC)]
    #[case("b", "font-weight:normal", TextFormat::empty())]
    #[case("strong", "", TextFormat::BOLD)]
    #[case("span", "text-decoration: underline line-through", TextFormat::UNDERLINE | TextFormat::STRIKETHROUGH)]
    #[case("u", "text-decoration:none", TextFormat::empty())]
    #[case("span", "vertical-align:super", TextFormat::SUPERSCRIPT)]
    #[case("sub", "vertical-align:super", TextFormat::SUPERSCRIPT)]
    #[case("span", "font-family: Consolas, 'Courier New', monospace", TextFormat::CODE)]
    #[case("code", "font-family: Arial", TextFormat::empty())]
    fn style_table(#[case] tag: &str, #[case] style: &str, #[case] expected: TextFormat) {
        assert_eq!(format_of(tag, style), expected);
    }

    #[test]
    fn presentation_is_kept_without_defaults() {
        let rules = StyleRules::new(&ImportOptions::default());
        let ctx = rules.enter(
            &element("span", "color:#000000;background-color:yellow;color:red"),
            &Inherited::default(),
        );
        assert_eq!(ctx.run("x").style, "background-color: yellow; color: red");
    }

    #[test]
    fn font_sizes_resolve_against_the_parent() {
        let rules = StyleRules::new(&ImportOptions::default());
        let outer = rules.enter(&element("div", "font-size: 20pt"), &Inherited::default());
        assert_eq!(outer.font_pt, Some(20.0));
        let inner = rules.enter(&element("span", "font-size: 150%"), &outer);
        assert_eq!(inner.font_pt, Some(30.0));
        assert!(rules.enter(&element("pre", ""), &outer).pre);
    }
}
