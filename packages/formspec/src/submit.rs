//! Building the submitted field map.
//!
//! On submit every sending field contributes one name/value pair, extracted
//! by exhaustive match on the field kind. Synthetic keys carry pending
//! key-navigation events and the quit flag.

use crate::{
    field::FieldKind,
    parse::Form,
};
use std::collections::BTreeMap;


/// Submitted field values, name to string.
pub type Fields = BTreeMap<String, String>;

/// Why a submit is happening.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum QuitMode {
    /// Ordinary value report; the dialog stays open.
    No,
    /// The dialog is closing and accepting its values.
    Accept,
    /// The dialog is closing without accepting; only `quit` is sent.
    Cancel,
}

/// Key-navigation events pending for the next submit. Consumed when built
/// into a field map.
#[derive(Debug, Clone, Copy, Default)]
pub struct PendingKeys {
    pub key_up: bool,
    pub key_down: bool,
    pub key_enter: bool,
    pub key_escape: bool,
}

/// Where submitted field maps go.
pub trait FieldSink {
    fn got_fields(&self, fields: Fields);

    /// Out-of-band notices (`MenuQuit`, `ExitButton`) for dialogs that are
    /// not allowed to close themselves.
    fn got_message(&self, _message: &str) {}
}

/// Build the field map for one submit, consuming pending key events and
/// per-table pending events.
pub fn collect_fields(
    form: &mut Form,
    pending: &mut PendingKeys,
    enter_field: &mut Option<String>,
    quit: QuitMode,
) -> Fields {
    let mut fields = Fields::new();

    if quit == QuitMode::Accept {
        fields.insert("quit".to_owned(), "true".to_owned());
    }
    if quit == QuitMode::Cancel {
        fields.insert("quit".to_owned(), "true".to_owned());
        return fields;
    }

    if pending.key_down {
        fields.insert("key_down".to_owned(), "true".to_owned());
        pending.key_down = false;
    }
    if pending.key_up {
        fields.insert("key_up".to_owned(), "true".to_owned());
        pending.key_up = false;
    }
    if pending.key_enter {
        fields.insert("key_enter".to_owned(), "true".to_owned());
        pending.key_enter = false;
    }
    if let Some(name) = enter_field.take() {
        fields.insert("key_enter_field".to_owned(), name);
    }
    if pending.key_escape {
        fields.insert("key_escape".to_owned(), "true".to_owned());
        pending.key_escape = false;
    }

    // only sending tables consume their pending event; collect those first
    // since the values are produced under a mutable borrow
    let sending_tables = form.tree.fields.iter()
        .filter(|s| s.send && !s.name.is_empty() && matches!(s.kind, FieldKind::Table))
        .map(|s| s.name.clone())
        .collect::<Vec<_>>();
    let mut table_events = Vec::new();
    for name in sending_tables {
        if let Some(table) = form.tree.table_mut(&name) {
            let event = table.take_event();
            table_events.push((name, event));
        }
    }

    for spec in &form.tree.fields {
        if !spec.send || spec.name.is_empty() {
            continue;
        }
        let value = match &spec.kind {
            FieldKind::Button => spec.label.clone(),
            FieldKind::CheckBox { checked } => {
                if *checked { "true".to_owned() } else { "false".to_owned() }
            }
            FieldKind::DropDown { items, selected } => {
                match selected.and_then(|i| items.get(i)) {
                    Some(value) => value.clone(),
                    None => continue,
                }
            }
            FieldKind::ScrollBar { pos, changed, .. } => {
                if *changed {
                    format!("CHG:{}", pos)
                } else {
                    format!("VAL:{}", pos)
                }
            }
            FieldKind::TabHeader { active, .. } => (active + 1).to_string(),
            FieldKind::Table => {
                match table_events.iter_mut().find(|(name, _)| *name == spec.name) {
                    Some((_, event)) => std::mem::replace(event, "INV".to_owned()),
                    None => continue,
                }
            }
            FieldKind::Text { content, .. } => content.clone(),
            FieldKind::Unknown => spec.default_value.clone(),
        };
        fields.insert(spec.name.clone(), value);
    }

    fields
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        geom::NominalFont,
        inventory::{InventoryLocation, UniformItemDefs},
        parse::{regenerate, ParseInput},
        settings::Settings,
        text::NoTranslation,
    };
    use std::collections::HashMap;
    use vek::*;

    fn form(text: &str) -> Form {
        let settings = Settings::default();
        let font = NominalFont::default();
        regenerate(ParseInput {
            form_text: text,
            prepend: "",
            screensize: Extent2::new(4000.0, 1500.0),
            current_location: InventoryLocation::CurrentPlayer,
            settings: &settings,
            font: &font,
            resolver: &NoTranslation,
            defs: &UniformItemDefs(99),
            focused_field: None,
            table_dyndata: HashMap::new(),
        })
    }

    fn collect(form: &mut Form, quit: QuitMode) -> Fields {
        collect_fields(form, &mut PendingKeys::default(), &mut None, quit)
    }

    #[test]
    fn sending_fields_appear_once_each() {
        let mut form = form(
            "size[8,8]\
             field[0,0;2,1;name;L;hello]\
             dropdown[0,1;3;dd;a,b;2]\
             scrollbar[0,2;4,0.5;horizontal;sb;250]\
             button[0,3;2,1;btn;Press]",
        );
        let fields = collect(&mut form, QuitMode::No);
        assert_eq!(fields.get("name").map(String::as_str), Some("hello"));
        assert_eq!(fields.get("dd").map(String::as_str), Some("b"));
        assert_eq!(fields.get("sb").map(String::as_str), Some("VAL:250"));
        // buttons only report eventfully
        assert!(!fields.contains_key("btn"));
        assert_eq!(fields.len(), 3);
    }

    #[test]
    fn send_gated_button_contributes_label() {
        let mut form = form("size[8,8]button[0,0;2,1;btn;Press Me]");
        let id = form.tree.field_by_name("btn").unwrap().id;
        form.tree.field_by_id_mut(id).unwrap().send = true;
        let fields = collect(&mut form, QuitMode::No);
        assert_eq!(fields.get("btn").map(String::as_str), Some("Press Me"));
    }

    #[test]
    fn cancel_quit_sends_only_quit() {
        let mut form = form("size[8,8]field[0,0;2,1;name;L;v]");
        let fields = collect(&mut form, QuitMode::Cancel);
        assert_eq!(fields.len(), 1);
        assert_eq!(fields.get("quit").map(String::as_str), Some("true"));
    }

    #[test]
    fn accept_quit_includes_values() {
        let mut form = form("size[8,8]field[0,0;2,1;name;L;v]");
        let fields = collect(&mut form, QuitMode::Accept);
        assert_eq!(fields.get("quit").map(String::as_str), Some("true"));
        assert_eq!(fields.get("name").map(String::as_str), Some("v"));
    }

    #[test]
    fn pending_keys_are_consumed() {
        let mut form = form("size[8,8]");
        let mut pending = PendingKeys { key_enter: true, ..PendingKeys::default() };
        let mut enter_field = Some("f".to_owned());
        let fields = collect_fields(&mut form, &mut pending, &mut enter_field, QuitMode::No);
        assert_eq!(fields.get("key_enter").map(String::as_str), Some("true"));
        assert_eq!(fields.get("key_enter_field").map(String::as_str), Some("f"));
        assert!(!pending.key_enter);
        assert!(enter_field.is_none());

        let fields = collect_fields(&mut form, &mut pending, &mut enter_field, QuitMode::No);
        assert!(fields.is_empty());
    }

    #[test]
    fn table_event_is_consumed_on_submit() {
        let mut form = form("size[8,8]textlist[0,0;4,4;tl;a,b,c;]");
        form.tree.table_mut("tl").unwrap().row_clicked(2, false);
        let id = form.tree.field_by_name("tl").unwrap().id;
        form.tree.field_by_id_mut(id).unwrap().send = true;

        let fields = collect(&mut form, QuitMode::No);
        assert_eq!(fields.get("tl").map(String::as_str), Some("CHG:2"));

        let fields = collect(&mut form, QuitMode::No);
        assert_eq!(fields.get("tl").map(String::as_str), Some("INV"));
    }

    #[test]
    fn dropdown_without_selection_is_omitted() {
        let mut form = form("size[8,8]dropdown[0,1;3;dd;a,b;]");
        let fields = collect(&mut form, QuitMode::No);
        assert!(!fields.contains_key("dd"));
    }
}
