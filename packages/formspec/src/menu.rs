//! The dialog itself: one open formspec menu.
//!
//! `FormMenu` ties the pieces together: it re-runs the layout pass when the
//! upstream text or the screen changes (carrying table state and focus
//! across), routes pointer events into the interaction machine, applies
//! host-reported widget events to field state, and builds submits with the
//! original's send-gating (a button press reports only that button, a
//! dropdown change only that dropdown).

use crate::{
    field::{FieldKind, ACCEPT_BUTTON_ID},
    geom::{rect_contains, FontMetrics},
    interact::{InteractState, PointerEvent},
    inventory::{ActionSink, InventoryLocation, InventoryStore, ItemDefs},
    parse::{regenerate, Form, ParseInput},
    settings::Settings,
    submit::{collect_fields, FieldSink, PendingKeys, QuitMode},
    text::TextResolver,
    tree::TooltipSpec,
};
use std::collections::HashMap;
use vek::*;


/// Maximum delay between the two clicks of a double click, milliseconds.
const DOUBLE_CLICK_TIME_MS: u64 = 400;

/// Maximum pointer travel between the two clicks of a double click, pixels.
const DOUBLE_CLICK_DISTANCE: f32 = 30.0;

/// Collaborators a menu call needs. Borrowed per call, never stored.
#[derive(Copy, Clone)]
pub struct MenuCtx<'a> {
    pub settings: &'a Settings,
    pub font: &'a dyn FontMetrics,
    pub resolver: &'a dyn TextResolver,
    pub defs: &'a dyn ItemDefs,
    pub store: &'a dyn InventoryStore,
    pub actions: &'a dyn ActionSink,
    pub fields: &'a dyn FieldSink,
}

/// Key events the menu reacts to directly.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum KeyEvent {
    Escape,
    Enter,
    Up,
    Down,
}

#[derive(Debug, Copy, Clone, Default)]
struct ClickRecord {
    pos: Vec2<f32>,
    time_ms: u64,
}

/// One open formspec dialog.
pub struct FormMenu {
    form_text: String,
    prepend: String,
    current_location: InventoryLocation,
    screensize: Extent2<f32>,

    form: Form,
    interact: InteractState,

    pending: PendingKeys,
    field_enter_pending: Option<String>,

    /// Explicit focus override by name, strongest focus carry source.
    focused_override: Option<String>,
    /// Live focused field id as reported by the host.
    focused_id: Option<u32>,

    /// Whether this dialog may close itself.
    pub allow_close: bool,
    /// Whether a double click outside the dialog closes it.
    pub remap_double_click: bool,
    want_close: bool,

    tooltip_show_delay_ms: u64,
    hovered_field: Option<u32>,
    hovered_since_ms: u64,

    // last two button-down records for double click detection
    double_click: [ClickRecord; 2],
}

impl FormMenu {
    /// Build the menu and run the initial layout pass.
    pub fn new(
        ctx: &MenuCtx,
        screensize: Extent2<f32>,
        form_text: impl Into<String>,
        prepend: impl Into<String>,
        current_location: InventoryLocation,
    ) -> Self {
        let mut menu = FormMenu {
            form_text: form_text.into(),
            prepend: prepend.into(),
            current_location,
            screensize,
            form: regenerate(ParseInput {
                form_text: "",
                prepend: "",
                screensize,
                current_location: InventoryLocation::Undefined,
                settings: ctx.settings,
                font: ctx.font,
                resolver: ctx.resolver,
                defs: ctx.defs,
                focused_field: None,
                table_dyndata: HashMap::new(),
            }),
            interact: InteractState::new(),
            pending: PendingKeys::default(),
            field_enter_pending: None,
            focused_override: None,
            focused_id: None,
            allow_close: true,
            remap_double_click: false,
            want_close: false,
            tooltip_show_delay_ms: ctx.settings.tooltip_show_delay_ms,
            hovered_field: None,
            hovered_since_ms: 0,
            double_click: [ClickRecord::default(); 2],
        };
        menu.regenerate(ctx);
        menu
    }

    pub fn form(&self) -> &Form {
        &self.form
    }

    pub fn interact(&self) -> &InteractState {
        &self.interact
    }

    /// Whether the dialog asked to be closed; the host tears it down.
    pub fn wants_close(&self) -> bool {
        self.want_close
    }

    pub fn focused_id(&self) -> Option<u32> {
        self.focused_id
    }

    /// Override focus by field name, surviving regenerations.
    pub fn set_focused_field(&mut self, name: impl Into<String>) {
        self.focused_override = Some(name.into());
    }

    /// Host-reported focus movement. Ids in the reserved range are ignored
    /// for focus carrying.
    pub fn focus_changed(&mut self, id: Option<u32>) {
        self.focused_id = id;
    }

    // ==== regeneration ====

    /// Replace the upstream form text, re-laying out if it changed.
    pub fn set_form_text(&mut self, ctx: &MenuCtx, text: &str) {
        if text != self.form_text {
            self.form_text = text.to_owned();
            self.regenerate(ctx);
        }
    }

    pub fn set_prepend(&mut self, ctx: &MenuCtx, prepend: &str) {
        if prepend != self.prepend {
            self.prepend = prepend.to_owned();
            self.regenerate(ctx);
        }
    }

    pub fn screen_resized(&mut self, ctx: &MenuCtx, screensize: Extent2<f32>) {
        if screensize != self.screensize {
            self.screensize = screensize;
            self.regenerate(ctx);
        }
    }

    /// Full layout pass. Table scroll/selection state and the focused field
    /// name survive; everything else is rebuilt from the text.
    pub fn regenerate(&mut self, ctx: &MenuCtx) {
        if self.screensize.w <= 0.0 || self.screensize.h <= 0.0 {
            return;
        }

        // snapshot state that outlives the old tree
        let mut table_dyndata = HashMap::new();
        for (name, table) in &self.form.tree.tables {
            table_dyndata.insert(name.clone(), table.dynamic_data());
        }

        let mut focused_field = self.focused_override.clone();
        if focused_field.is_none() {
            if let Some(id) = self.focused_id.filter(|&id| id > ACCEPT_BUTTON_ID) {
                focused_field = self.form.tree.field_by_id(id).map(|f| f.name.clone());
            }
        }

        self.form = regenerate(ParseInput {
            form_text: &self.form_text,
            prepend: &self.prepend,
            screensize: self.screensize,
            current_location: self.current_location.clone(),
            settings: ctx.settings,
            font: ctx.font,
            resolver: ctx.resolver,
            defs: ctx.defs,
            focused_field,
            table_dyndata,
        });
        self.focused_id = self.form.focused;
    }

    // ==== pointer and keys ====

    pub fn handle_pointer(&mut self, ctx: &MenuCtx, event: PointerEvent) {
        self.interact.handle_pointer(&self.form, ctx.store, ctx.defs, ctx.actions, event);
    }

    /// Run the validation pass; hosts call this once per frame before
    /// drawing the held stack.
    pub fn update_selected(&mut self, ctx: &MenuCtx) {
        self.interact.update_selected(&self.form, ctx.store);
    }

    pub fn on_key(&mut self, ctx: &MenuCtx, key: KeyEvent) {
        match key {
            KeyEvent::Escape => self.try_close(ctx),
            KeyEvent::Enter => {
                self.pending.key_enter = true;
                if self.allow_close {
                    self.submit(ctx, QuitMode::Accept);
                    self.want_close = true;
                } else {
                    self.submit(ctx, QuitMode::No);
                }
            }
            KeyEvent::Up => {
                self.pending.key_up = true;
                self.submit(ctx, QuitMode::No);
            }
            KeyEvent::Down => {
                self.pending.key_down = true;
                self.submit(ctx, QuitMode::No);
            }
        }
    }

    /// Close if allowed, else tell the destination the user tried.
    pub fn try_close(&mut self, ctx: &MenuCtx) {
        if self.allow_close {
            self.submit(ctx, QuitMode::Cancel);
            self.want_close = true;
        } else {
            ctx.fields.got_message("MenuQuit");
        }
    }

    /// Track clicks landing outside the dialog; a quick double click there
    /// closes the menu when remapping is enabled.
    pub fn outside_click(&mut self, ctx: &MenuCtx, down: bool, pos: Vec2<f32>, now_ms: u64) {
        if !self.remap_double_click {
            return;
        }
        if down {
            self.double_click[0] = self.double_click[1];
            self.double_click[1] = ClickRecord { pos, time_ms: now_ms };
        } else {
            let first = self.double_click[0];
            if now_ms.saturating_sub(first.time_ms) > DOUBLE_CLICK_TIME_MS {
                return;
            }
            if (first.pos - self.double_click[1].pos).magnitude_squared()
                > DOUBLE_CLICK_DISTANCE * DOUBLE_CLICK_DISTANCE
            {
                return;
            }
            self.try_close(ctx);
        }
    }

    // ==== tooltips ====

    /// Tooltip to show for the current pointer position, honoring the hover
    /// delay for field tooltips. Rect tooltips show immediately.
    pub fn tooltip_at(&mut self, now_ms: u64) -> Option<TooltipSpec> {
        let pointer = self.interact.pointer();

        for (rect, spec) in &self.form.tree.tooltip_rects {
            if rect_contains(*rect, pointer) && !spec.text.is_empty() {
                return Some(spec.clone());
            }
        }

        // field rects are dialog-relative
        let rel = pointer - Vec2::new(self.form.rect.x, self.form.rect.y);
        let hovered = self.form.tree.fields.iter()
            .find(|f| rect_contains(f.rect, rel))
            .map(|f| (f.id, f.name.clone()));
        match hovered {
            Some((id, name)) => {
                if self.hovered_field != Some(id) {
                    self.hovered_field = Some(id);
                    self.hovered_since_ms = now_ms;
                    return None;
                }
                if now_ms.saturating_sub(self.hovered_since_ms) < self.tooltip_show_delay_ms {
                    return None;
                }
                self.form.tree.tooltips.get(&name)
                    .filter(|spec| !spec.text.is_empty())
                    .cloned()
            }
            None => {
                self.hovered_field = None;
                None
            }
        }
    }

    // ==== widget events from the host ====

    /// A button field was activated.
    pub fn button_clicked(&mut self, ctx: &MenuCtx, id: u32) {
        if id == ACCEPT_BUTTON_ID {
            if self.allow_close {
                self.submit(ctx, QuitMode::Accept);
                self.want_close = true;
            } else {
                self.submit(ctx, QuitMode::No);
                ctx.fields.got_message("ExitButton");
            }
            return;
        }

        let (is_exit, found) = match self.form.tree.field_by_id(id) {
            Some(spec) if matches!(spec.kind, FieldKind::Button) => (spec.is_exit, true),
            _ => (false, false),
        };
        if !found {
            return;
        }
        if is_exit {
            if self.allow_close {
                self.submit_with_send(ctx, id, QuitMode::Accept);
                self.want_close = true;
            } else {
                ctx.fields.got_message("ExitButton");
            }
            return;
        }
        self.submit_with_send(ctx, id, QuitMode::No);
    }

    /// A checkbox flipped; reports only that checkbox.
    pub fn checkbox_changed(&mut self, ctx: &MenuCtx, id: u32, checked: bool) {
        if let Some(spec) = self.form.tree.field_by_id_mut(id) {
            if let FieldKind::CheckBox { checked: state } = &mut spec.kind {
                *state = checked;
                self.submit_with_send(ctx, id, QuitMode::No);
            }
        }
    }

    /// A dropdown changed; only the changed dropdown reports.
    pub fn dropdown_changed(&mut self, ctx: &MenuCtx, id: u32, selected: usize) {
        let mut valid = false;
        if let Some(spec) = self.form.tree.field_by_id_mut(id) {
            if let FieldKind::DropDown { items, selected: state } = &mut spec.kind {
                if selected < items.len() {
                    *state = Some(selected);
                    valid = true;
                }
            }
        }
        if !valid {
            return;
        }
        // silence the other dropdowns for this one submit
        for spec in &mut self.form.tree.fields {
            if matches!(spec.kind, FieldKind::DropDown { .. }) {
                spec.send = spec.id == id;
            }
        }
        self.submit(ctx, QuitMode::No);
        for spec in &mut self.form.tree.fields {
            if matches!(spec.kind, FieldKind::DropDown { .. }) {
                spec.send = true;
            }
        }
    }

    /// A scrollbar moved by the user; reports `CHG:` for this one submit.
    pub fn scrollbar_changed(&mut self, ctx: &MenuCtx, id: u32, pos: i32) {
        let mut found = false;
        if let Some(spec) = self.form.tree.field_by_id_mut(id) {
            if let FieldKind::ScrollBar { pos: state, changed, .. } = &mut spec.kind {
                *state = pos.clamp(0, 1000);
                *changed = true;
                found = true;
            }
        }
        if !found {
            return;
        }
        self.submit(ctx, QuitMode::No);
        if let Some(spec) = self.form.tree.field_by_id_mut(id) {
            if let FieldKind::ScrollBar { changed, .. } = &mut spec.kind {
                *changed = false;
            }
        }
    }

    /// The active tab changed; reports only that tab header.
    pub fn tab_changed(&mut self, ctx: &MenuCtx, id: u32, active: usize) {
        let mut found = false;
        if let Some(spec) = self.form.tree.field_by_id_mut(id) {
            if let FieldKind::TabHeader { captions, active: state } = &mut spec.kind {
                if active < captions.len() {
                    *state = active;
                    found = true;
                }
            }
        }
        if found {
            self.submit_with_send(ctx, id, QuitMode::No);
        }
    }

    /// A table row was clicked; reports only that table's event.
    pub fn table_row_clicked(&mut self, ctx: &MenuCtx, id: u32, row: usize, double: bool) {
        let name = match self.form.tree.field_by_id(id) {
            Some(spec) if matches!(spec.kind, FieldKind::Table) => spec.name.clone(),
            _ => return,
        };
        if let Some(table) = self.form.tree.table_mut(&name) {
            table.row_clicked(row, double);
        }
        self.submit_with_send(ctx, id, QuitMode::No);
    }

    /// Live edit-box content as typed. No submit.
    pub fn text_changed(&mut self, id: u32, content: &str) {
        if let Some(spec) = self.form.tree.field_by_id_mut(id) {
            if let FieldKind::Text { content: state, .. } = &mut spec.kind {
                *state = content.to_owned();
            }
        }
    }

    /// Enter pressed inside an edit box.
    pub fn field_enter(&mut self, ctx: &MenuCtx, id: u32) {
        if id <= ACCEPT_BUTTON_ID {
            return;
        }
        let mut close_on_enter = true;
        if let Some(spec) = self.form.tree.field_by_id(id) {
            if matches!(spec.kind, FieldKind::Text { .. }) {
                self.field_enter_pending = Some(spec.name.clone());
                if let Some(&configured) = self.form.tree.close_on_enter.get(&spec.name) {
                    close_on_enter = configured;
                }
            }
        }

        self.pending.key_enter = true;
        if self.allow_close && close_on_enter {
            self.submit(ctx, QuitMode::Accept);
            self.want_close = true;
        } else {
            self.submit(ctx, QuitMode::No);
        }
    }

    // ==== submit ====

    fn submit(&mut self, ctx: &MenuCtx, quit: QuitMode) {
        let fields = collect_fields(
            &mut self.form,
            &mut self.pending,
            &mut self.field_enter_pending,
            quit,
        );
        ctx.fields.got_fields(fields);
    }

    /// Submit with one field's send flag forced on for the duration.
    fn submit_with_send(&mut self, ctx: &MenuCtx, id: u32, quit: QuitMode) {
        if let Some(spec) = self.form.tree.field_by_id_mut(id) {
            spec.send = true;
        }
        self.submit(ctx, quit);
        if let Some(spec) = self.form.tree.field_by_id_mut(id) {
            spec.send = false;
        }
    }
}


#[cfg(test)]
mod tests;
