use super::*;
use crate::{
    geom::NominalFont,
    interact::PointerEvent,
    inventory::{InventoryAction, LocalInventory, UniformItemDefs},
    submit::Fields,
    text::NoTranslation,
};
use std::cell::RefCell;


struct NullActions;

impl ActionSink for NullActions {
    fn send_action(&self, _action: InventoryAction) {}
}

#[derive(Default)]
struct RecFields {
    maps: RefCell<Vec<Fields>>,
    messages: RefCell<Vec<String>>,
}

impl RecFields {
    fn take(&self) -> Vec<Fields> {
        std::mem::take(&mut *self.maps.borrow_mut())
    }

    fn last(&self) -> Fields {
        self.maps.borrow().last().cloned().expect("no submit happened")
    }
}

impl FieldSink for RecFields {
    fn got_fields(&self, fields: Fields) {
        self.maps.borrow_mut().push(fields);
    }

    fn got_message(&self, message: &str) {
        self.messages.borrow_mut().push(message.to_owned());
    }
}

struct Host {
    settings: Settings,
    font: NominalFont,
    defs: UniformItemDefs,
    store: LocalInventory,
    actions: NullActions,
    fields: RecFields,
}

impl Host {
    fn new() -> Self {
        Host {
            settings: Settings::default(),
            font: NominalFont::default(),
            defs: UniformItemDefs(99),
            store: LocalInventory::new(),
            actions: NullActions,
            fields: RecFields::default(),
        }
    }

    fn ctx(&self) -> MenuCtx {
        MenuCtx {
            settings: &self.settings,
            font: &self.font,
            resolver: &NoTranslation,
            defs: &self.defs,
            store: &self.store,
            actions: &self.actions,
            fields: &self.fields,
        }
    }

    fn menu(&self, text: &str) -> FormMenu {
        FormMenu::new(
            &self.ctx(),
            Extent2::new(4000.0, 1500.0),
            text,
            "",
            InventoryLocation::CurrentPlayer,
        )
    }
}

#[test]
fn button_press_reports_only_that_button() {
    let host = Host::new();
    let mut menu = host.menu("size[8,8]button[0,0;2,1;btn;Do It]field[0,1;2,1;f;L;v]");
    let id = menu.form().tree.field_by_name("btn").unwrap().id;

    menu.button_clicked(&host.ctx(), id);
    let fields = host.fields.last();
    assert_eq!(fields.get("btn").map(String::as_str), Some("Do It"));
    assert_eq!(fields.get("f").map(String::as_str), Some("v"));
    assert!(!fields.contains_key("quit"));
    assert!(!menu.wants_close());

    // the send flag does not stick
    host.fields.take();
    menu.on_key(&host.ctx(), KeyEvent::Up);
    assert!(!host.fields.last().contains_key("btn"));
}

#[test]
fn accept_button_closes_with_values() {
    let host = Host::new();
    let mut menu = host.menu("field[name;Label;typed]");
    menu.button_clicked(&host.ctx(), ACCEPT_BUTTON_ID);
    let fields = host.fields.last();
    assert_eq!(fields.get("quit").map(String::as_str), Some("true"));
    assert_eq!(fields.get("name").map(String::as_str), Some("typed"));
    assert!(menu.wants_close());
}

#[test]
fn exit_button_closes() {
    let host = Host::new();
    let mut menu = host.menu("size[8,8]button_exit[0,0;2,1;bye;Bye]");
    let id = menu.form().tree.field_by_name("bye").unwrap().id;
    menu.button_clicked(&host.ctx(), id);
    let fields = host.fields.last();
    assert_eq!(fields.get("quit").map(String::as_str), Some("true"));
    assert_eq!(fields.get("bye").map(String::as_str), Some("Bye"));
    assert!(menu.wants_close());
}

#[test]
fn escape_cancels_with_only_quit() {
    let host = Host::new();
    let mut menu = host.menu("size[8,8]field[0,0;2,1;f;L;v]");
    menu.on_key(&host.ctx(), KeyEvent::Escape);
    let fields = host.fields.last();
    assert_eq!(fields.len(), 1);
    assert_eq!(fields.get("quit").map(String::as_str), Some("true"));
    assert!(menu.wants_close());
}

#[test]
fn unclosable_menu_reports_quit_attempts() {
    let host = Host::new();
    let mut menu = host.menu("size[8,8]button[0,0;2,1;b;B]");
    menu.allow_close = false;
    menu.on_key(&host.ctx(), KeyEvent::Escape);
    assert!(host.fields.take().is_empty());
    assert_eq!(host.fields.messages.borrow().as_slice(), &["MenuQuit".to_owned()]);
    assert!(!menu.wants_close());
}

#[test]
fn dropdown_change_silences_other_dropdowns() {
    let host = Host::new();
    let mut menu = host.menu(
        "size[8,8]dropdown[0,0;3;one;a,b;1]dropdown[0,1;3;two;x,y;1]field[0,2;2,1;f;L;v]",
    );
    let id = menu.form().tree.field_by_name("one").unwrap().id;

    menu.dropdown_changed(&host.ctx(), id, 1);
    let fields = host.fields.last();
    assert_eq!(fields.get("one").map(String::as_str), Some("b"));
    assert!(!fields.contains_key("two"));
    assert_eq!(fields.get("f").map(String::as_str), Some("v"));

    // ordinary submits include both dropdowns again
    menu.on_key(&host.ctx(), KeyEvent::Up);
    let fields = host.fields.last();
    assert!(fields.contains_key("one"));
    assert!(fields.contains_key("two"));
}

#[test]
fn scrollbar_reports_change_then_value() {
    let host = Host::new();
    let mut menu = host.menu("size[8,8]scrollbar[0,0;4,0.5;horizontal;sb;100]");
    let id = menu.form().tree.field_by_name("sb").unwrap().id;

    menu.scrollbar_changed(&host.ctx(), id, 640);
    assert_eq!(host.fields.last().get("sb").map(String::as_str), Some("CHG:640"));

    menu.on_key(&host.ctx(), KeyEvent::Down);
    assert_eq!(host.fields.last().get("sb").map(String::as_str), Some("VAL:640"));
}

#[test]
fn tab_change_reports_one_based_index() {
    let host = Host::new();
    let mut menu = host.menu("size[8,8]tabheader[0,0;tabs;One,Two,Three;1]");
    let id = menu.form().tree.field_by_name("tabs").unwrap().id;
    menu.tab_changed(&host.ctx(), id, 2);
    assert_eq!(host.fields.last().get("tabs").map(String::as_str), Some("3"));
}

#[test]
fn table_click_reports_event_string() {
    let host = Host::new();
    let mut menu = host.menu("size[8,8]textlist[0,0;4,4;tl;a,b,c;]");
    let id = menu.form().tree.field_by_name("tl").unwrap().id;
    menu.table_row_clicked(&host.ctx(), id, 2, false);
    assert_eq!(host.fields.last().get("tl").map(String::as_str), Some("CHG:2"));

    menu.table_row_clicked(&host.ctx(), id, 2, true);
    assert_eq!(host.fields.last().get("tl").map(String::as_str), Some("DCL:2"));
}

#[test]
fn field_enter_respects_close_on_enter() {
    let host = Host::new();
    let mut menu = host.menu(
        "size[8,8]field[0,0;2,1;stay;L;v]field_close_on_enter[stay;false]",
    );
    let id = menu.form().tree.field_by_name("stay").unwrap().id;
    menu.field_enter(&host.ctx(), id);
    let fields = host.fields.last();
    assert_eq!(fields.get("key_enter").map(String::as_str), Some("true"));
    assert_eq!(fields.get("key_enter_field").map(String::as_str), Some("stay"));
    assert!(!fields.contains_key("quit"));
    assert!(!menu.wants_close());

    // without the override, enter accepts and closes
    let mut menu = host.menu("size[8,8]field[0,0;2,1;go;L;v]");
    let id = menu.form().tree.field_by_name("go").unwrap().id;
    menu.field_enter(&host.ctx(), id);
    assert_eq!(host.fields.last().get("quit").map(String::as_str), Some("true"));
    assert!(menu.wants_close());
}

#[test]
fn text_edits_are_submitted() {
    let host = Host::new();
    let mut menu = host.menu("size[8,8]field[0,0;2,1;f;L;old]");
    let id = menu.form().tree.field_by_name("f").unwrap().id;
    menu.text_changed(id, "new text");
    menu.on_key(&host.ctx(), KeyEvent::Down);
    assert_eq!(host.fields.last().get("f").map(String::as_str), Some("new text"));
}

#[test]
fn focus_carries_across_regeneration_by_name() {
    let host = Host::new();
    let mut menu = host.menu("size[8,8]button[0,0;1,1;a;A]button[0,1;1,1;b;B]");
    let id_b = menu.form().tree.field_by_name("b").unwrap().id;
    menu.focus_changed(Some(id_b));

    menu.set_form_text(
        &host.ctx(),
        "size[8,8]button[0,0;1,1;extra;E]button[0,1;1,1;a;A]button[0,2;1,1;b;B]",
    );
    let new_id_b = menu.form().tree.field_by_name("b").unwrap().id;
    assert_ne!(id_b, new_id_b);
    assert_eq!(menu.focused_id(), Some(new_id_b));
}

#[test]
fn table_state_survives_regeneration() {
    let host = Host::new();
    let mut menu = host.menu("size[8,8]textlist[0,0;4,4;tl;a,b,c;]");
    let id = menu.form().tree.field_by_name("tl").unwrap().id;
    menu.table_row_clicked(&host.ctx(), id, 3, false);

    menu.set_form_text(&host.ctx(), "size[8,8]label[0,0;hi]textlist[0,1;4,4;tl;a,b,c;]");
    assert_eq!(menu.form().tree.table("tl").unwrap().selected(), 3);
}

#[test]
fn double_click_outside_closes_when_remapped() {
    let host = Host::new();
    let mut menu = host.menu("size[8,8]button[0,0;1,1;a;A]");
    menu.remap_double_click = true;
    let pos = Vec2::new(1.0, 1.0);

    menu.outside_click(&host.ctx(), true, pos, 1000);
    menu.outside_click(&host.ctx(), false, pos, 1050);
    assert!(!menu.wants_close());

    menu.outside_click(&host.ctx(), true, pos, 1100);
    menu.outside_click(&host.ctx(), false, pos, 1150);
    assert!(menu.wants_close());
}

#[test]
fn slow_or_far_double_clicks_do_not_close() {
    let host = Host::new();
    let mut menu = host.menu("size[8,8]button[0,0;1,1;a;A]");
    menu.remap_double_click = true;

    let pos = Vec2::new(1.0, 1.0);
    menu.outside_click(&host.ctx(), true, pos, 1000);
    menu.outside_click(&host.ctx(), false, pos, 1010);
    menu.outside_click(&host.ctx(), true, pos, 2000);
    menu.outside_click(&host.ctx(), false, pos, 2010);
    assert!(!menu.wants_close());

    menu.outside_click(&host.ctx(), true, Vec2::new(500.0, 500.0), 2100);
    menu.outside_click(&host.ctx(), false, Vec2::new(500.0, 500.0), 2150);
    assert!(!menu.wants_close());
}

#[test]
fn field_tooltip_waits_for_hover_delay() {
    let host = Host::new();
    let mut menu = host.menu(
        "size[8,8]button[1,1;2,1;btn;B]tooltip[btn;helpful words]",
    );
    let rect = menu.form().tree.field_by_name("btn").unwrap().rect;
    let pos = Vec2::new(
        menu.form().rect.x + rect.x + rect.w / 2.0,
        menu.form().rect.y + rect.y + rect.h / 2.0,
    );
    menu.handle_pointer(&host.ctx(), PointerEvent::Move { pos, right_held: false });

    assert!(menu.tooltip_at(5000).is_none());
    let delay = host.settings.tooltip_show_delay_ms;
    let tip = menu.tooltip_at(5000 + delay).expect("tooltip after delay");
    assert_eq!(tip.text, "helpful words");
}

#[test]
fn rect_tooltip_shows_immediately() {
    let host = Host::new();
    let mut menu = host.menu("size[8,8]tooltip[1,1;2,2;area words]");
    let (rect, _) = menu.form().tree.tooltip_rects[0].clone();
    let pos = Vec2::new(rect.x + 1.0, rect.y + 1.0);
    menu.handle_pointer(&host.ctx(), PointerEvent::Move { pos, right_held: false });
    let tip = menu.tooltip_at(1).expect("rect tooltips have no delay");
    assert_eq!(tip.text, "area words");
}
