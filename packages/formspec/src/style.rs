//! Cascading element styles.
//!
//! `style_type[...]` and `style[...]` statements accumulate partial property
//! records into two cascades, keyed by element type and by element name. An
//! element's effective style overlays parent type, own type, then own name,
//! so name-level settings always have final say.

use crate::{
    color::parse_color,
    text::is_yes,
};
use std::collections::{HashMap, HashSet};
use vek::*;


/// Style property names understood by the protocol.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Property {
    TextColor,
    BgColor,
    BgColorHovered,
    BgColorPressed,
    NoClip,
    Border,
    BgImg,
    BgImgHovered,
    BgImgPressed,
    Alpha,
}

const PROPERTY_COUNT: usize = 10;

impl Property {
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "textcolor" => Property::TextColor,
            "bgcolor" => Property::BgColor,
            "bgcolor_hovered" => Property::BgColorHovered,
            "bgcolor_pressed" => Property::BgColorPressed,
            "noclip" => Property::NoClip,
            "border" => Property::Border,
            "bgimg" => Property::BgImg,
            "bgimg_hovered" => Property::BgImgHovered,
            "bgimg_pressed" => Property::BgImgPressed,
            "alpha" => Property::Alpha,
            _ => return None,
        })
    }
}

/// Partial record of style properties. Unset properties pass through when
/// records are overlaid.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StyleSpec {
    props: [Option<String>; PROPERTY_COUNT],
}

impl StyleSpec {
    pub fn set(&mut self, prop: Property, value: impl Into<String>) {
        self.props[prop as usize] = Some(value.into());
    }

    pub fn is_set(&self, prop: Property) -> bool {
        self.props[prop as usize].is_some()
    }

    pub fn get<'a>(&'a self, prop: Property, default: &'a str) -> &'a str {
        self.props[prop as usize].as_deref().unwrap_or(default)
    }

    /// Color-typed read; an unset or unparsable value yields the default.
    pub fn get_color(&self, prop: Property, default: Rgba<u8>) -> Rgba<u8> {
        self.props[prop as usize].as_deref()
            .and_then(|s| parse_color(s, 0xFF))
            .unwrap_or(default)
    }

    pub fn try_color(&self, prop: Property) -> Option<Rgba<u8>> {
        self.props[prop as usize].as_deref()
            .and_then(|s| parse_color(s, 0xFF))
    }

    pub fn get_bool(&self, prop: Property, default: bool) -> bool {
        self.props[prop as usize].as_deref()
            .map(is_yes)
            .unwrap_or(default)
    }

    /// Overlay another record onto this one; set properties of `other` win.
    pub fn merge(&mut self, other: &StyleSpec) {
        for (slot, value) in self.props.iter_mut().zip(&other.props) {
            if let Some(value) = value {
                *slot = Some(value.clone());
            }
        }
    }
}

/// The two style cascades of one layout session.
#[derive(Debug, Clone, Default)]
pub struct Theme {
    by_type: HashMap<String, StyleSpec>,
    by_name: HashMap<String, StyleSpec>,
    // unknown property names only warn once each
    warned: HashSet<String>,
}

impl Theme {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one parsed `style`/`style_type` statement.
    ///
    /// `pairs` are the raw `key=value` parts after the selector. An unknown
    /// property name or missing `=` rejects the whole statement.
    pub fn apply_statement(
        &mut self,
        selector: &str,
        pairs: &[(String, String)],
        by_type: bool,
    ) -> bool {
        let mut spec = StyleSpec::default();
        for (key, value) in pairs {
            let prop = match Property::from_name(key) {
                Some(prop) => prop,
                None => {
                    if self.warned.insert(key.clone()) {
                        warn!("invalid style element (unknown property {})", key);
                    }
                    return false;
                }
            };
            spec.set(prop, value.clone());
        }
        let map = if by_type { &mut self.by_type } else { &mut self.by_name };
        map.entry(selector.to_owned()).or_default().merge(&spec);
        true
    }

    /// Effective style for one element. Overlay order: parent type cascade,
    /// own type cascade, own name cascade.
    pub fn resolve(&self, ty: &str, name: &str, parent_type: Option<&str>) -> StyleSpec {
        let mut out = StyleSpec::default();
        if let Some(parent) = parent_type {
            if let Some(spec) = self.by_type.get(parent) {
                out.merge(spec);
            }
        }
        if let Some(spec) = self.by_type.get(ty) {
            out.merge(spec);
        }
        if let Some(spec) = self.by_name.get(name) {
            out.merge(spec);
        }
        out
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(kv: &[(&str, &str)]) -> Vec<(String, String)> {
        kv.iter().map(|&(k, v)| (k.to_owned(), v.to_owned())).collect()
    }

    #[test]
    fn name_beats_type() {
        let mut theme = Theme::new();
        assert!(theme.apply_statement("button", &pairs(&[("bgcolor", "#fff")]), true));
        assert!(theme.apply_statement("mybtn", &pairs(&[("bgcolor", "#000")]), false));

        let style = theme.resolve("button", "mybtn", None);
        assert_eq!(style.get_color(Property::BgColor, Rgba::zero()), Rgba::new(0, 0, 0, 255));

        let style = theme.resolve("button", "other", None);
        assert_eq!(style.get_color(Property::BgColor, Rgba::zero()), Rgba::new(255, 255, 255, 255));
    }

    #[test]
    fn parent_type_is_weakest() {
        let mut theme = Theme::new();
        theme.apply_statement("button", &pairs(&[("border", "false"), ("alpha", "false")]), true);
        theme.apply_statement("button_exit", &pairs(&[("border", "true")]), true);

        let style = theme.resolve("button_exit", "x", Some("button"));
        assert_eq!(style.get_bool(Property::Border, false), true);
        assert_eq!(style.get_bool(Property::Alpha, true), false);
    }

    #[test]
    fn unknown_property_rejects_statement() {
        let mut theme = Theme::new();
        let ok = theme.apply_statement(
            "button",
            &pairs(&[("bgcolor", "#fff"), ("wavy", "very")]),
            true,
        );
        assert!(!ok);
        let style = theme.resolve("button", "x", None);
        assert!(!style.is_set(Property::BgColor));
    }

    #[test]
    fn repeated_statements_accumulate() {
        let mut theme = Theme::new();
        theme.apply_statement("f", &pairs(&[("textcolor", "red")]), false);
        theme.apply_statement("f", &pairs(&[("border", "false")]), false);
        let style = theme.resolve("field", "f", None);
        assert!(style.is_set(Property::TextColor));
        assert_eq!(style.get_bool(Property::Border, true), false);
    }
}
