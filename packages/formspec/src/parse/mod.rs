//! Formspec document parsing and the per-regeneration layout session.
//!
//! A regeneration runs the whole protocol in one call: scan the leading
//! directives in their fixed order, derive pixel metrics and the dialog rect,
//! parse the prepend under legacy coordinates, parse the document body, then
//! apply the auto-size and focus fallbacks. The caller observes only the
//! finished [`Form`]; a partial layout is never visible.

mod elements;

use crate::{
    field::{FieldKind, FieldSpec, ACCEPT_BUTTON_ID},
    geom::{
        self,
        dialog_rect,
        FormMetrics,
        FontMetrics,
        FALLBACK_DIALOG_SIZE,
        LOCK_SCREEN_SIZE,
    },
    inventory::{InventoryLocation, ItemDefs},
    settings::Settings,
    style::Theme,
    table::{DynamicData, TableColumn},
    text::{is_yes, split_escaped, stof, is_number, TextResolver},
    tree::FormTree,
};
use std::collections::HashMap;
use vek::*;


/// Newest format version this parser fully understands. Documents declaring a
/// newer version get the forward-compatibility escape valve: extra trailing
/// element parts are tolerated and ignored.
pub const FORMSPEC_API_VERSION: u16 = 3;

/// Everything a regeneration needs from the outside.
pub struct ParseInput<'a> {
    pub form_text: &'a str,
    /// Styling/branding prepend, parsed before the document body under legacy
    /// coordinates unless the document says `no_prepend[]`.
    pub prepend: &'a str,
    pub screensize: Extent2<f32>,
    /// Substituted for `context`/`current_name` inventory locations.
    pub current_location: InventoryLocation,
    pub settings: &'a Settings,
    pub font: &'a dyn FontMetrics,
    pub resolver: &'a dyn TextResolver,
    pub defs: &'a dyn ItemDefs,
    /// Name of the field focus should return to, carried across regenerations.
    pub focused_field: Option<String>,
    /// Table scroll/selection carried across regenerations, keyed by name.
    pub table_dyndata: HashMap<String, DynamicData>,
}

/// A fully parsed and laid out form.
#[derive(Debug, Clone)]
pub struct Form {
    pub tree: FormTree,
    pub metrics: FormMetrics,
    /// Dialog rectangle in screen pixels.
    pub rect: Rect<f32, f32>,
    pub version: u16,
    /// Final coordinate mode of the document body.
    pub real_coordinates: bool,
    pub explicit_size: bool,
    /// Requested grid size, meaningful when `explicit_size`.
    pub invsize: Extent2<f32>,
    /// Field id holding initial focus, if any.
    pub focused: Option<u32>,
}

/// Mutable context threaded through one parse pass. Single owner, discarded
/// when regeneration returns.
pub(crate) struct Session<'a> {
    pub settings: &'a Settings,
    pub font: &'a dyn FontMetrics,
    pub resolver: &'a dyn TextResolver,
    pub defs: &'a dyn ItemDefs,
    pub current_location: InventoryLocation,

    pub tree: FormTree,
    pub theme: Theme,
    pub version: u16,
    pub real_coordinates: bool,
    pub explicit_size: bool,
    pub invsize: Extent2<f32>,
    pub screensize: Extent2<f32>,
    /// `position[]` fractions.
    pub offset: Vec2<f32>,
    /// `anchor[]` fractions.
    pub anchor: Vec2<f32>,
    pub metrics: FormMetrics,
    pub rect: Rect<f32, f32>,
    pub lock: bool,

    /// Running container offset in grid units.
    pub pos_offset: Vec2<f32>,
    pub container_stack: Vec<Vec2<f32>>,

    /// Pending `tableoptions[]`/`tablecolumns[]` for the next table element.
    pub table_options: Vec<(String, String)>,
    pub table_columns: Vec<TableColumn>,
    pub table_dyndata: HashMap<String, DynamicData>,

    pub focused_fieldname: Option<String>,
    pub focused: Option<u32>,
}

impl<'a> Session<'a> {
    fn new(input: &ParseInput<'a>) -> Self {
        let mut tree = FormTree::default();
        tree.bgcolor = input.settings.default_bg_rgba();
        tree.fullscreen_bgcolor = input.settings.fullscreen_bg_rgba();
        Session {
            settings: input.settings,
            font: input.font,
            resolver: input.resolver,
            defs: input.defs,
            current_location: input.current_location.clone(),
            tree,
            theme: Theme::new(),
            version: 1,
            real_coordinates: false,
            explicit_size: false,
            invsize: Extent2::new(100.0, 100.0),
            screensize: input.screensize,
            offset: Vec2::new(0.5, 0.5),
            anchor: Vec2::new(0.5, 0.5),
            metrics: FormMetrics::fallback(input.font),
            rect: Rect::new(0.0, 0.0, 0.0, 0.0),
            lock: false,
            pos_offset: Vec2::zero(),
            container_stack: Vec::new(),
            table_options: Vec::new(),
            table_columns: Vec::new(),
            table_dyndata: input.table_dyndata.clone(),
            focused_fieldname: input.focused_field.clone(),
            focused: None,
        }
    }

    /// Arity check for an element body: the exact documented part counts, or
    /// more than the documented maximum under a newer-than-known version.
    pub fn check_parts(&self, ty: &str, body: &str, len: usize, allowed: &[usize]) -> bool {
        let max = allowed.iter().copied().max().unwrap_or(0);
        if allowed.contains(&len) || (len > max && self.version > FORMSPEC_API_VERSION) {
            true
        } else {
            error!("invalid {} element ({}): '{}'", ty, len, body);
            false
        }
    }

    /// Two-component decimal field, or a logged per-element parse error.
    pub fn parse_v2(&self, ty: &str, what: &str, part: &str) -> Option<Vec2<f32>> {
        let comps = split_escaped(part, ',');
        if comps.len() != 2 {
            error!("invalid {} for element {} specified: '{}'", what, ty, part);
            return None;
        }
        Some(Vec2::new(stof(&comps[0]), stof(&comps[1])))
    }

    /// Screen-space origin for absolute element positions.
    pub fn origin(&self) -> Vec2<f32> {
        Vec2::new(self.rect.x, self.rect.y)
    }

    /// Record initial focus if this field is the one we are looking for.
    pub fn wire_focus(&mut self, spec: &FieldSpec) {
        if !spec.name.is_empty()
            && self.focused_fieldname.as_deref() == Some(spec.name.as_str())
        {
            self.focused = Some(spec.id);
        }
    }

    /// Substitute the session context for the wire location grammar.
    pub fn parse_location(&self, s: &str) -> InventoryLocation {
        if s == "context" || s == "current_name" {
            self.current_location.clone()
        } else {
            InventoryLocation::deserialize(s)
        }
    }
}

// ==== leading directives ====

/// `formspec_version[n]`, accepted anywhere but only honored as a version
/// change when encountered.
fn parse_version_direct(session: &mut Session, element: &str) -> bool {
    if element.is_empty() {
        return false;
    }
    let parts = split_escaped(element, '[');
    if parts.len() < 2 || parts[0] != "formspec_version" {
        return false;
    }
    if is_number(&parts[1]) {
        session.version = parts[1].parse().unwrap_or(1);
        return true;
    }
    false
}

fn parse_size_direct(session: &mut Session, element: &str) -> bool {
    if element.is_empty() {
        return false;
    }
    let parts = split_escaped(element, '[');
    if parts.len() < 2 {
        return false;
    }
    let ty = parts[0].trim();
    if ty != "size" && ty != "invsize" {
        return false;
    }
    if ty == "invsize" {
        warn!("deprecated formspec element \"invsize\" is used");
    }
    session.parse_size(parts[1].trim());
    true
}

fn parse_position_direct(session: &mut Session, element: &str) -> bool {
    if element.is_empty() {
        return false;
    }
    let parts = split_escaped(element, '[');
    if parts.len() != 2 || parts[0].trim() != "position" {
        return false;
    }
    session.parse_position(parts[1].trim());
    true
}

fn parse_anchor_direct(session: &mut Session, element: &str) -> bool {
    if element.is_empty() {
        return false;
    }
    let parts = split_escaped(element, '[');
    if parts.len() != 2 || parts[0].trim() != "anchor" {
        return false;
    }
    session.parse_anchor(parts[1].trim());
    true
}

/// One document element: dispatch to the element parser by type tag.
fn parse_element(session: &mut Session, element: &str) {
    if element.is_empty() {
        return;
    }
    if parse_version_direct(session, element) {
        return;
    }

    let mut parts = split_escaped(element, '[');

    // texture names may legitimately contain unescaped brackets; re-join for
    // the image element, drop anything else with too many parts
    if parts.len() > 2 {
        if parts[0].trim() == "image" {
            let rest = parts[2..].join("[");
            parts[1] = format!("{}[{}", parts[1], rest);
            parts.truncate(2);
        } else {
            return;
        }
    }
    if parts.len() < 2 {
        return;
    }

    let ty = parts[0].trim().to_owned();
    let body = parts[1].trim().to_owned();

    match ty.as_str() {
        "container" => session.parse_container(&body),
        "container_end" => session.parse_container_end(),
        "list" => session.parse_list(&body),
        "listring" => session.parse_listring(&body),
        "checkbox" => session.parse_checkbox(&body),
        "image" => session.parse_image(&body),
        "item_image" => session.parse_item_image(&body),
        "button" | "button_exit" => session.parse_button(&body, &ty),
        "background" | "background9" => session.parse_background(&body),
        "tableoptions" => session.parse_table_options(&body),
        "tablecolumns" => session.parse_table_columns(&body),
        "table" => session.parse_table(&body),
        "textlist" => session.parse_textlist(&body),
        "dropdown" => session.parse_dropdown(&body),
        "field_close_on_enter" => session.parse_field_close_on_enter(&body),
        "pwdfield" => session.parse_pwdfield(&body),
        "field" | "textarea" => session.parse_field(&body, &ty),
        "hypertext" => session.parse_hypertext(&body),
        "label" => session.parse_label(&body),
        "vertlabel" => session.parse_vertlabel(&body),
        "item_image_button" => session.parse_item_image_button(&body),
        "image_button" | "image_button_exit" => session.parse_image_button(&body, &ty),
        "tabheader" => session.parse_tabheader(&body),
        "box" => session.parse_box(&body),
        "bgcolor" => session.parse_bgcolor(&body),
        "listcolors" => session.parse_listcolors(&body),
        "tooltip" => session.parse_tooltip(&body),
        "scrollbar" => session.parse_scrollbar(&body),
        "real_coordinates" => session.real_coordinates = is_yes(&body),
        "style" => session.parse_style(&body, false),
        "style_type" => session.parse_style(&body, true),
        // forward compatibility: unknown elements are ignored
        _ => info!("unknown element: type={}, data=\"{}\"", ty, body),
    }
}

/// Run the full regeneration protocol over one document.
pub fn regenerate(input: ParseInput) -> Form {
    let mut session = Session::new(&input);

    let elements = split_escaped(input.form_text, ']');
    let mut i = 0;

    // version directive is only honored as the first element
    if !elements.is_empty() && parse_version_direct(&mut session, &elements[0]) {
        i += 1;
    }

    // size is needed first to derive image scale
    while i < elements.len() && parse_size_direct(&mut session, &elements[i]) {
        i += 1;
    }

    // "position" always follows "size" when used
    while i < elements.len() && parse_position_direct(&mut session, &elements[i]) {
        i += 1;
    }

    // "anchor" always follows "position" (or "size") when used
    while i < elements.len() && parse_anchor_direct(&mut session, &elements[i]) {
        i += 1;
    }

    let mut enable_prepends = true;
    while i < elements.len() && !elements[i].is_empty() {
        let parts = split_escaped(&elements[i], '[');
        if parts[0].trim() == "no_prepend" {
            enable_prepends = false;
            i += 1;
        } else {
            break;
        }
    }

    // coordinate mode defaults on for version >= 2, then an early
    // real_coordinates[] directive may override it for the whole body
    session.real_coordinates = session.version >= 2;
    while i < elements.len() {
        let parts = split_escaped(&elements[i], '[');
        if parts[0].trim() != "real_coordinates" || parts.len() != 2 {
            break;
        }
        session.real_coordinates = is_yes(parts[1].trim());
        i += 1;
    }

    // metrics and the dialog rect
    let mut shift = Vec2::zero();
    if session.explicit_size {
        if session.lock {
            shift = geom::lock_offset(session.screensize, LOCK_SCREEN_SIZE);
            session.screensize = LOCK_SCREEN_SIZE;
            session.metrics = FormMetrics::fixed(session.settings);
        } else {
            session.metrics =
                FormMetrics::variable(session.settings, session.screensize, session.invsize);
        }
        let size = session.metrics.form_size(session.invsize, session.real_coordinates);
        session.rect =
            dialog_rect(session.screensize, size, session.offset, session.anchor, shift);
    } else {
        session.metrics = FormMetrics::fallback(session.font);
        session.rect = dialog_rect(
            session.screensize,
            FALLBACK_DIALOG_SIZE,
            session.offset,
            session.anchor,
            Vec2::zero(),
        );
    }

    session.pos_offset = Vec2::zero();

    if enable_prepends {
        // prepends pick their own coordinates; parse them under the legacy
        // default and restore the document's mode and version afterwards
        let rc_backup = session.real_coordinates;
        let version_backup = session.version;
        session.real_coordinates = false;
        for element in split_escaped(input.prepend, ']') {
            parse_element(&mut session, &element);
        }
        session.version = version_backup;
        session.real_coordinates = rc_backup;
    }

    for element in &elements[i.min(elements.len())..] {
        parse_element(&mut session, element);
    }

    if !session.container_stack.is_empty() {
        error!("invalid formspec string: container was never closed!");
    }

    // fields without an explicit size[] stack vertically in a fallback rect
    // with an implicit accept button appended
    if !session.tree.fields.is_empty() && !session.explicit_size {
        let h = 300.0 / 2.0 + 240.0 / 2.0 + session.tree.fields.len() as f32 * 60.0;
        session.rect = Rect::new(
            session.screensize.w / 2.0 - 580.0 / 2.0,
            session.screensize.h / 2.0 - 300.0 / 2.0,
            580.0,
            h,
        );

        let y = (session.tree.fields.len() + 2) as f32 * 60.0;
        let mut proceed =
            FieldSpec::new("", session.resolver.translate("Proceed"), ACCEPT_BUTTON_ID);
        proceed.kind = FieldKind::Button;
        proceed.rect = Rect::new(
            session.rect.w / 2.0 - 70.0,
            y,
            140.0,
            session.metrics.btn_height * 2.0,
        );
        session.tree.fields.push(proceed);
    }

    let focused = session.focused.or_else(|| fallback_focus(&session.tree));

    Form {
        tree: session.tree,
        metrics: session.metrics,
        rect: session.rect,
        version: session.version,
        real_coordinates: session.real_coordinates,
        explicit_size: session.explicit_size,
        invsize: session.invsize,
        focused,
    }
}

/// Deterministic focus when the document wired none: first empty text field,
/// first text field, first table, last button, then any focusable element
/// that is not static text or a tab header.
fn fallback_focus(tree: &FormTree) -> Option<u32> {
    let fields = &tree.fields;
    fields.iter()
        .find(|f| matches!(&f.kind, FieldKind::Text { content, .. } if content.is_empty()))
        .or_else(|| fields.iter().find(|f| matches!(f.kind, FieldKind::Text { .. })))
        .or_else(|| fields.iter().find(|f| matches!(f.kind, FieldKind::Table)))
        .or_else(|| fields.iter().rev().find(|f| matches!(f.kind, FieldKind::Button)))
        .or_else(|| {
            fields.iter().find(|f| {
                !matches!(f.kind, FieldKind::Unknown | FieldKind::TabHeader { .. })
            })
        })
        .map(|f| f.id)
}
