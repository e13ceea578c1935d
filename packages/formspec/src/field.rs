//! Interactive field descriptors.

use crate::style::StyleSpec;
use vek::*;


/// Field id of the implicit accept ("Proceed") button. Ids at or below this
/// are reserved for built-ins; parsed fields start just above.
pub const ACCEPT_BUTTON_ID: u32 = 257;

/// First id handed to a parsed field.
pub const FIELD_ID_BASE: u32 = 258;

/// Kind tag plus the live value state a field needs at submit time.
///
/// Widget toolkits recover this by probing runtime types; here it is a closed
/// union so submit-time value extraction is exhaustive matching.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    Button,
    CheckBox {
        checked: bool,
    },
    DropDown {
        /// Unescaped item values, reported verbatim on submit.
        items: Vec<String>,
        /// Zero-based selection, `None` when nothing is selected.
        selected: Option<usize>,
    },
    ScrollBar {
        horizontal: bool,
        /// Position in the fixed 0..=1000 range.
        pos: i32,
        /// Set while reporting a user-driven change, making the submit value
        /// `CHG:`-prefixed rather than `VAL:`-prefixed.
        changed: bool,
    },
    TabHeader {
        captions: Vec<String>,
        /// Zero-based active tab.
        active: usize,
    },
    /// Tabular widget; live state is in the form's table registry, keyed by
    /// field name.
    Table,
    Text {
        content: String,
        multiline: bool,
    },
    /// Non-value elements that still occupy the registry (labels, hypertext).
    Unknown,
}

/// One interactive element of the current layout.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    /// Submit name. Empty for elements that never submit.
    pub name: String,
    /// Display label (buttons, checkboxes) after unescape/translate.
    pub label: String,
    /// Default value as parsed from the element body.
    pub default_value: String,
    /// Stable numeric id, assigned in registration order from `FIELD_ID_BASE`.
    pub id: u32,
    pub kind: FieldKind,
    /// Whether this field's value is included in submitted field maps.
    pub send: bool,
    /// Whether activating this field closes the dialog.
    pub is_exit: bool,
    /// Pixel rectangle, relative to the dialog rect.
    pub rect: Rect<f32, f32>,
    /// Resolved style cascade for this element, kept for the renderer.
    pub style: StyleSpec,
}

impl FieldSpec {
    pub fn new(name: impl Into<String>, label: impl Into<String>, id: u32) -> Self {
        FieldSpec {
            name: name.into(),
            label: label.into(),
            default_value: String::new(),
            id,
            kind: FieldKind::Unknown,
            send: false,
            is_exit: false,
            rect: Rect::new(0.0, 0.0, 0.0, 0.0),
            style: StyleSpec::default(),
        }
    }
}
