//! Per-element parsing routines.
//!
//! Every routine follows the same shape: split the body on `;`, check the
//! part count against the documented arities (plus the version escape valve),
//! resolve geometry under the session's coordinate mode, then register draw
//! specs and fields. A routine that fails logs and returns, dropping only its
//! own element.

use crate::{
    color::parse_color,
    field::{FieldKind, FieldSpec},
    style::{Property, StyleSpec},
    table::{self, TableState},
    text::{is_yes, split_escaped, stof, stoi},
    tree::{
        BackgroundSpec,
        BoxSpec,
        ImageDrawSpec,
        ItemImageSpec,
        ListDrawSpec,
        ListRingSpec,
        StaticTextSpec,
        TooltipSpec,
    },
};
use super::Session;
use vek::*;


impl<'a> Session<'a> {
    fn resolve_style(&self, ty: &str, name: &str, parent: Option<&str>) -> StyleSpec {
        self.theme.resolve(ty, name, parent)
    }

    fn register_field(&mut self, spec: FieldSpec) {
        self.wire_focus(&spec);
        self.tree.fields.push(spec);
    }

    // ==== leading directives ====

    pub(super) fn parse_size(&mut self, body: &str) {
        let mut parts = split_escaped(body, ',');
        if !(matches!(parts.len(), 2 | 3)
            || (parts.len() > 3 && self.version > super::FORMSPEC_API_VERSION))
        {
            error!("invalid size element ({}): '{}'", parts.len(), body);
            return;
        }
        // tolerate a stray trailing ";..." on the second component
        if let Some(semi) = parts[1].find(';') {
            parts[1].truncate(semi);
        }

        self.invsize.w = stof(&parts[0]).max(0.0);
        self.invsize.h = stof(&parts[1]).max(0.0);
        self.lock = parts.len() == 3 && parts[2] == "true";
        self.explicit_size = true;
    }

    pub(super) fn parse_position(&mut self, body: &str) {
        let parts = split_escaped(body, ',');
        if parts.len() == 2 {
            self.offset = Vec2::new(stof(&parts[0]), stof(&parts[1]));
        } else {
            error!("invalid position element ({}): '{}'", parts.len(), body);
        }
    }

    pub(super) fn parse_anchor(&mut self, body: &str) {
        let parts = split_escaped(body, ',');
        if parts.len() == 2 {
            self.anchor = Vec2::new(stof(&parts[0]), stof(&parts[1]));
        } else {
            error!("invalid anchor element ({}): '{}'", parts.len(), body);
        }
    }

    // ==== containers ====

    pub(super) fn parse_container(&mut self, body: &str) {
        let mut parts = split_escaped(body, ',');
        if parts.len() >= 2 {
            if let Some(semi) = parts[1].find(';') {
                parts[1].truncate(semi);
            }
            self.container_stack.push(self.pos_offset);
            self.pos_offset.x += stof(&parts[0]);
            self.pos_offset.y += stof(&parts[1]);
        } else {
            error!("invalid container start element ({}): '{}'", parts.len(), body);
        }
    }

    pub(super) fn parse_container_end(&mut self) {
        match self.container_stack.pop() {
            Some(offset) => self.pos_offset = offset,
            None => {
                error!("invalid container end element, no matching container start element");
            }
        }
    }

    // ==== inventory lists ====

    pub(super) fn parse_list(&mut self, body: &str) {
        let parts = split_escaped(body, ';');
        if !self.check_parts("list", body, parts.len(), &[4, 5]) {
            return;
        }
        let location = self.parse_location(&parts[0]);
        let list = parts[1].clone();
        let v_pos = match self.parse_v2("list", "pos", &parts[2]) {
            Some(v) => v,
            None => return,
        };
        let v_geom = split_escaped(&parts[3], ',');
        if v_geom.len() != 2 {
            error!("invalid geometry for element list specified: '{}'", parts[3]);
            return;
        }

        let pos = if self.real_coordinates {
            self.metrics.real_base_pos(Some(self.origin()), self.pos_offset, v_pos)
        } else {
            self.metrics.legacy_base_pos(Some(self.origin()), self.pos_offset, Some(v_pos))
        };
        let geom = Vec2::new(stoi(&v_geom[0]), stoi(&v_geom[1]));
        let start_i = if parts.len() == 5 { stoi(&parts[4]) } else { 0 };

        if geom.x < 0 || geom.y < 0 || start_i < 0 {
            error!("invalid list element: '{}'", body);
            return;
        }
        if !self.explicit_size {
            warn!("invalid use of list without a size[] element");
        }
        self.tree.lists.push(ListDrawSpec {
            location,
            list,
            pos,
            geom,
            start_index: start_i as usize,
            real_coordinates: self.real_coordinates,
        });
    }

    pub(super) fn parse_listring(&mut self, body: &str) {
        let parts = split_escaped(body, ';');
        if parts.len() == 2 {
            let location = self.parse_location(&parts[0]);
            self.tree.rings.push(ListRingSpec { location, list: parts[1].clone() });
            return;
        }
        if body.is_empty() && self.tree.lists.len() > 1 {
            // implicitly link the last two declared lists
            let len = self.tree.lists.len();
            for spec in &self.tree.lists[len - 2..] {
                self.tree.rings.push(ListRingSpec {
                    location: spec.location.clone(),
                    list: spec.list.clone(),
                });
            }
            return;
        }
        error!(
            "invalid list ring element ({}, {}): '{}'",
            parts.len(),
            self.tree.lists.len(),
            body,
        );
    }

    // ==== widgets ====

    pub(super) fn parse_checkbox(&mut self, body: &str) {
        let parts = split_escaped(body, ';');
        if !self.check_parts("checkbox", body, parts.len(), &[3, 4]) {
            return;
        }
        let v_pos = match self.parse_v2("checkbox", "pos", &parts[0]) {
            Some(v) => v,
            None => return,
        };
        let name = parts[1].clone();
        let label = self.resolver.translate(&crate::text::unescape(&parts[2]));
        let checked = parts.len() >= 4 && parts[3] == "true";

        let label_width = self.font.text_width(&label);
        let cb_size = self.font.line_height();
        let y_center = (self.font.line_height().max(cb_size) + 1.0) / 2.0;

        let rect = if self.real_coordinates {
            let pos = self.metrics.real_base_pos(None, self.pos_offset, v_pos);
            Rect::new(
                pos.x,
                pos.y - y_center,
                label_width + cb_size + 7.0,
                y_center * 2.0,
            )
        } else {
            let pos = self.metrics.legacy_base_pos(None, self.pos_offset, Some(v_pos));
            Rect::new(
                pos.x,
                pos.y + self.metrics.imgsize.h / 2.0 - y_center,
                label_width + cb_size + 7.0,
                y_center * 2.0,
            )
        };

        let mut spec = FieldSpec::new(name.clone(), label, self.tree.next_field_id());
        spec.kind = FieldKind::CheckBox { checked };
        spec.rect = rect;
        spec.style = self.resolve_style("checkbox", &name, None);
        self.register_field(spec);
    }

    pub(super) fn parse_scrollbar(&mut self, body: &str) {
        let parts = split_escaped(body, ';');
        if parts.len() < 5 {
            error!("invalid scrollbar element ({}): '{}'", parts.len(), body);
            return;
        }
        let v_pos = match self.parse_v2("scrollbar", "pos", &parts[0]) {
            Some(v) => v,
            None => return,
        };
        let v_geom = match self.parse_v2("scrollbar", "geometry", &parts[1]) {
            Some(v) => v,
            None => return,
        };
        let name = parts[3].clone();

        let (pos, dim) = if self.real_coordinates {
            (
                self.metrics.real_base_pos(None, self.pos_offset, v_pos),
                self.metrics.real_geom(v_geom),
            )
        } else {
            (
                self.metrics.legacy_base_pos(None, self.pos_offset, Some(v_pos)),
                self.metrics.legacy_geom(v_geom),
            )
        };

        let mut spec = FieldSpec::new(name.clone(), "", self.tree.next_field_id());
        spec.kind = FieldKind::ScrollBar {
            horizontal: parts[2] != "vertical",
            pos: stoi(&parts[4]).clamp(0, 1000),
            changed: false,
        };
        spec.send = true;
        spec.rect = Rect::new(pos.x, pos.y, dim.w, dim.h);
        spec.style = self.resolve_style("scrollbar", &name, None);
        self.register_field(spec);
    }

    pub(super) fn parse_image(&mut self, body: &str) {
        let parts = split_escaped(body, ';');
        if matches!(parts.len(), 3)
            || (parts.len() > 3 && self.version > super::FORMSPEC_API_VERSION)
        {
            let v_pos = match self.parse_v2("image", "pos", &parts[0]) {
                Some(v) => v,
                None => return,
            };
            let v_geom = match self.parse_v2("image", "geometry", &parts[1]) {
                Some(v) => v,
                None => return,
            };
            let texture = crate::text::unescape(&parts[2]);

            let (pos, geom) = if self.real_coordinates {
                (
                    self.metrics.real_base_pos(Some(self.origin()), self.pos_offset, v_pos),
                    self.metrics.real_geom(v_geom),
                )
            } else {
                (
                    self.metrics.legacy_base_pos(Some(self.origin()), self.pos_offset, Some(v_pos)),
                    // plain images scale by imgsize, not slot spacing
                    Extent2::new(
                        v_geom.x * self.metrics.imgsize.w,
                        v_geom.y * self.metrics.imgsize.h,
                    ),
                )
            };
            if !self.explicit_size {
                warn!("invalid use of image without a size[] element");
            }
            self.tree.images.push(ImageDrawSpec { texture, pos, geom: Some(geom) });
            return;
        }

        if parts.len() == 2 {
            // position-only form draws at natural texture size
            let v_pos = match self.parse_v2("image", "pos", &parts[0]) {
                Some(v) => v,
                None => return,
            };
            let texture = crate::text::unescape(&parts[1]);
            let pos =
                self.metrics.legacy_base_pos(Some(self.origin()), self.pos_offset, Some(v_pos));
            if !self.explicit_size {
                warn!("invalid use of image without a size[] element");
            }
            self.tree.images.push(ImageDrawSpec { texture, pos, geom: None });
            return;
        }
        error!("invalid image element ({}): '{}'", parts.len(), body);
    }

    pub(super) fn parse_item_image(&mut self, body: &str) {
        let parts = split_escaped(body, ';');
        if !self.check_parts("item_image", body, parts.len(), &[3]) {
            return;
        }
        let v_pos = match self.parse_v2("item_image", "pos", &parts[0]) {
            Some(v) => v,
            None => return,
        };
        let v_geom = match self.parse_v2("item_image", "geometry", &parts[1]) {
            Some(v) => v,
            None => return,
        };

        let (pos, geom) = if self.real_coordinates {
            (
                self.metrics.real_base_pos(Some(self.origin()), self.pos_offset, v_pos),
                self.metrics.real_geom(v_geom),
            )
        } else {
            (
                self.metrics.legacy_base_pos(Some(self.origin()), self.pos_offset, Some(v_pos)),
                Extent2::new(
                    v_geom.x * self.metrics.imgsize.w,
                    v_geom.y * self.metrics.imgsize.h,
                ),
            )
        };
        if !self.explicit_size {
            warn!("invalid use of item_image without a size[] element");
        }
        self.tree.item_images.push(ItemImageSpec {
            item_name: parts[2].clone(),
            pos,
            geom,
            parent_field: None,
        });
    }

    pub(super) fn parse_button(&mut self, body: &str, ty: &str) {
        let parts = split_escaped(body, ';');
        if !self.check_parts(ty, body, parts.len(), &[4]) {
            return;
        }
        let v_pos = match self.parse_v2(ty, "pos", &parts[0]) {
            Some(v) => v,
            None => return,
        };
        let v_geom = match self.parse_v2(ty, "geometry", &parts[1]) {
            Some(v) => v,
            None => return,
        };
        let name = parts[2].clone();
        let label = self.resolver.translate(&crate::text::unescape(&parts[3]));

        let rect = if self.real_coordinates {
            let pos = self.metrics.real_base_pos(None, self.pos_offset, v_pos);
            let geom = self.metrics.real_geom(v_geom);
            Rect::new(pos.x, pos.y, geom.w, geom.h)
        } else {
            let mut pos = self.metrics.legacy_base_pos(None, self.pos_offset, Some(v_pos));
            let width =
                v_geom.x * self.metrics.spacing.w - (self.metrics.spacing.w - self.metrics.imgsize.w);
            // buttons center on the nominal row, with a fixed height
            pos.y += v_geom.y * self.metrics.imgsize.h / 2.0;
            Rect::new(
                pos.x,
                pos.y - self.metrics.btn_height,
                width,
                self.metrics.btn_height * 2.0,
            )
        };

        if !self.explicit_size {
            warn!("invalid use of button without a size[] element");
        }

        let mut spec = FieldSpec::new(name.clone(), label, self.tree.next_field_id());
        spec.kind = FieldKind::Button;
        spec.is_exit = ty == "button_exit";
        spec.rect = rect;
        let parent = if ty != "button" { Some("button") } else { None };
        spec.style = self.resolve_style(ty, &name, parent);
        self.register_field(spec);
    }

    pub(super) fn parse_background(&mut self, body: &str) {
        let parts = split_escaped(body, ';');
        if !self.check_parts("background", body, parts.len(), &[3, 4, 5]) {
            return;
        }
        let v_pos = match self.parse_v2("background", "pos", &parts[0]) {
            Some(v) => v,
            None => return,
        };
        let v_geom = match self.parse_v2("background", "geometry", &parts[1]) {
            Some(v) => v,
            None => return,
        };
        let texture = crate::text::unescape(&parts[2]);

        let (mut pos, mut geom);
        if self.real_coordinates {
            pos = self.metrics.real_base_pos(Some(self.origin()), self.pos_offset, v_pos);
            geom = self.metrics.real_geom(v_geom);
        } else {
            pos = self.metrics.legacy_base_pos(Some(self.origin()), self.pos_offset, Some(v_pos));
            pos.x -= (self.metrics.spacing.w - self.metrics.imgsize.w) / 2.0;
            pos.y -= (self.metrics.spacing.h - self.metrics.imgsize.h) / 2.0;
            geom = self.metrics.legacy_geom(v_geom);
        }

        let clip = parts.len() >= 4 && is_yes(&parts[3]);
        if clip {
            // position becomes an offset from the dialog edges
            if self.real_coordinates {
                pos = self.metrics.real_base_pos(None, self.pos_offset, v_pos) * -1.0;
            } else {
                let v = split_escaped(&parts[0], ',');
                pos = Vec2::new(stoi(&v[0]) as f32, stoi(&v[1]) as f32);
            }
            geom = Extent2::zero();
        }

        let mut middle = None;
        if parts.len() >= 5 {
            let v_middle = split_escaped(&parts[4], ',');
            middle = match v_middle.len() {
                1 => {
                    let x = stoi(&v_middle[0]);
                    Some(Aabr { min: Vec2::new(x, x), max: Vec2::new(-x, -x) })
                }
                2 => {
                    let x = stoi(&v_middle[0]);
                    let y = stoi(&v_middle[1]);
                    // negative max components read as size minus the component
                    Some(Aabr { min: Vec2::new(x, y), max: Vec2::new(-x, -y) })
                }
                4 => Some(Aabr {
                    min: Vec2::new(stoi(&v_middle[0]), stoi(&v_middle[1])),
                    max: Vec2::new(stoi(&v_middle[2]), stoi(&v_middle[3])),
                }),
                _ => {
                    warn!("invalid rectangle given to middle param of background[] element");
                    None
                }
            };
        }

        if !self.explicit_size && !clip {
            warn!("invalid use of unclipped background without a size[] element");
        }
        self.tree.backgrounds.push(BackgroundSpec { texture, pos, geom, middle, clip });
    }

    // ==== tables ====

    pub(super) fn parse_table_options(&mut self, body: &str) {
        self.table_options = split_escaped(body, ';').iter()
            .map(|part| table::split_option(&crate::text::unescape(part)))
            .collect();
    }

    pub(super) fn parse_table_columns(&mut self, body: &str) {
        self.table_columns = table::parse_columns(body);
    }

    fn parse_table_common(&mut self, body: &str, textlist: bool) {
        let ty = if textlist { "textlist" } else { "table" };
        let allowed: &[usize] = if textlist { &[4, 5, 6] } else { &[4, 5] };
        let parts = split_escaped(body, ';');
        if !self.check_parts(ty, body, parts.len(), allowed) {
            return;
        }
        let v_pos = match self.parse_v2(ty, "pos", &parts[0]) {
            Some(v) => v,
            None => return,
        };
        let v_geom = match self.parse_v2(ty, "geometry", &parts[1]) {
            Some(v) => v,
            None => return,
        };
        let name = parts[2].clone();
        let items = split_escaped(&parts[3], ',').iter()
            .map(|item| self.resolver.translate(&crate::text::unescape(item)))
            .collect::<Vec<_>>();
        let initial_selection = parts.get(4).cloned().unwrap_or_default();

        let (pos, geom) = if self.real_coordinates {
            (
                self.metrics.real_base_pos(None, self.pos_offset, v_pos),
                self.metrics.real_geom(v_geom),
            )
        } else {
            (
                self.metrics.legacy_base_pos(None, self.pos_offset, Some(v_pos)),
                self.metrics.legacy_geom(v_geom),
            )
        };

        let mut spec = FieldSpec::new(name.clone(), "", self.tree.next_field_id());
        spec.kind = FieldKind::Table;
        spec.rect = Rect::new(pos.x, pos.y, geom.w, geom.h);
        spec.style = self.resolve_style(ty, &name, None);

        let mut state = if textlist {
            TableState::text_rows(items)
        } else {
            let mut state = TableState::default();
            state.options = self.table_options.clone();
            state.columns = self.table_columns.clone();
            state.set_cells(items);
            state
        };
        if let Some(data) = self.table_dyndata.get(&name) {
            state.set_dynamic_data(data.clone());
        }
        if !initial_selection.is_empty() && initial_selection != "0" {
            state.set_selected(stoi(&initial_selection).max(0) as usize);
        }

        self.register_field(spec);
        self.tree.tables.push((name, state));
    }

    pub(super) fn parse_table(&mut self, body: &str) {
        self.parse_table_common(body, false);
    }

    pub(super) fn parse_textlist(&mut self, body: &str) {
        self.parse_table_common(body, true);
    }

    // ==== dropdowns, fields ====

    pub(super) fn parse_dropdown(&mut self, body: &str) {
        let parts = split_escaped(body, ';');
        if !self.check_parts("dropdown", body, parts.len(), &[5]) {
            return;
        }
        let v_pos = match self.parse_v2("dropdown", "pos", &parts[0]) {
            Some(v) => v,
            None => return,
        };
        let name = parts[2].clone();
        let items = split_escaped(&parts[3], ',').iter()
            .map(|item| crate::text::unescape(item))
            .collect::<Vec<_>>();
        let initial_selection = parts[4].clone();

        let rect = if self.real_coordinates {
            let mut v_geom = split_escaped(&parts[1], ',');
            if v_geom.len() == 1 {
                v_geom.push("1".to_owned());
            }
            if v_geom.len() != 2 {
                error!("invalid geometry for element dropdown specified: '{}'", parts[1]);
                return;
            }
            let pos = self.metrics.real_base_pos(None, self.pos_offset, v_pos);
            let geom =
                self.metrics.real_geom(Vec2::new(stof(&v_geom[0]), stof(&v_geom[1])));
            Rect::new(pos.x, pos.y, geom.w, geom.h)
        } else {
            let pos = self.metrics.legacy_base_pos(None, self.pos_offset, Some(v_pos));
            let width = stof(&parts[1]) * self.metrics.spacing.h;
            Rect::new(pos.x, pos.y, width, self.metrics.btn_height * 2.0)
        };

        let selected = if initial_selection.is_empty() {
            None
        } else {
            let idx = stoi(&initial_selection) - 1;
            (idx >= 0 && (idx as usize) < items.len()).then(|| idx as usize)
        };

        let mut spec = FieldSpec::new(name.clone(), "", self.tree.next_field_id());
        spec.kind = FieldKind::DropDown { items, selected };
        spec.send = true;
        spec.rect = rect;
        spec.style = self.resolve_style("dropdown", &name, None);
        self.register_field(spec);
    }

    pub(super) fn parse_field_close_on_enter(&mut self, body: &str) {
        let parts = split_escaped(body, ';');
        if parts.len() == 2
            || (parts.len() > 2 && self.version > super::FORMSPEC_API_VERSION)
        {
            self.tree.close_on_enter.insert(parts[0].clone(), is_yes(&parts[1]));
        }
    }

    /// Shared tail of all edit-box producing elements.
    fn create_text_field(&mut self, mut spec: FieldSpec, rect: Rect<f32, f32>, multiline: bool) {
        let is_editable = !spec.name.is_empty();
        if !is_editable && !multiline {
            // pure display text; registering the field keeps id assignment
            // stable but nothing is ever submitted for it
            self.tree.static_texts.push(StaticTextSpec {
                text: spec.label.clone(),
                rect,
                color: spec.style.get_color(Property::TextColor, Rgba::white()),
                parent_field: None,
            });
            self.register_field(spec);
            return;
        }

        if is_editable {
            spec.send = true;
        } else if multiline && spec.default_value.is_empty() && !spec.label.is_empty() {
            // multiline textareas historically swap default and label
            std::mem::swap(&mut spec.default_value, &mut spec.label);
        }

        spec.kind = FieldKind::Text {
            content: spec.default_value.clone(),
            multiline,
        };

        if !spec.label.is_empty() {
            let font_height = self.font.line_height();
            self.tree.static_texts.push(StaticTextSpec {
                text: spec.label.clone(),
                rect: Rect::new(rect.x, rect.y - font_height, rect.w, font_height),
                color: spec.style.get_color(Property::TextColor, Rgba::white()),
                parent_field: None,
            });
        }

        spec.rect = rect;
        self.register_field(spec);
    }

    pub(super) fn parse_pwdfield(&mut self, body: &str) {
        let parts = split_escaped(body, ';');
        if !self.check_parts("pwdfield", body, parts.len(), &[4, 5]) {
            return;
        }
        let v_pos = match self.parse_v2("pwdfield", "pos", &parts[0]) {
            Some(v) => v,
            None => return,
        };
        let v_geom = match self.parse_v2("pwdfield", "geometry", &parts[1]) {
            Some(v) => v,
            None => return,
        };
        let name = parts[2].clone();
        let label = self.resolver.translate(&crate::text::unescape(&parts[3]));

        let rect = if self.real_coordinates {
            let pos = self.metrics.real_base_pos(None, self.pos_offset, v_pos);
            let geom = self.metrics.real_geom(v_geom);
            Rect::new(pos.x, pos.y, geom.w, geom.h)
        } else {
            let mut pos = self.metrics.legacy_base_pos(None, self.pos_offset, Some(v_pos));
            pos -= self.metrics.padding;
            let width =
                v_geom.x * self.metrics.spacing.w - (self.metrics.spacing.w - self.metrics.imgsize.w);
            pos.y += v_geom.y * self.metrics.imgsize.h / 2.0;
            pos.y -= self.metrics.btn_height;
            Rect::new(pos.x, pos.y, width, self.metrics.btn_height * 2.0)
        };

        let mut spec = FieldSpec::new(name.clone(), label, self.tree.next_field_id());
        spec.style = self.resolve_style("pwdfield", &name, Some("field"));
        // passwords start blank regardless of any default in the body
        self.create_text_field(spec, rect, false);

        if parts.len() >= 5 {
            warn!("pwdfield: use field_close_on_enter[name, enabled] instead of the 5th param");
            self.tree.close_on_enter.insert(name, is_yes(&parts[4]));
        }
    }

    fn parse_simple_field(&mut self, parts: &[String]) {
        let name = parts[0].clone();
        let label = self.resolver.translate(&crate::text::unescape(&parts[1]));
        let default_value = self.resolver.resolve_text(&crate::text::unescape(&parts[2]));

        if self.explicit_size {
            warn!("invalid use of unpositioned \"field\" in inventory");
        }

        let y = (self.tree.fields.len() + 2) as f32 * 60.0;
        let rect = Rect::new(
            self.rect.w / 2.0 - 150.0,
            y,
            300.0,
            self.metrics.btn_height * 2.0,
        );

        let mut spec = FieldSpec::new(name.clone(), label, self.tree.next_field_id());
        spec.default_value = default_value;
        spec.style = self.resolve_style("field", &name, None);
        self.create_text_field(spec, rect, false);

        if parts.len() >= 4 {
            warn!("field/simple: use field_close_on_enter[name, enabled] instead of the 4th param");
            self.tree.close_on_enter.insert(name, is_yes(&parts[3]));
        }
    }

    fn parse_text_area(&mut self, parts: &[String], ty: &str) {
        let v_pos = match self.parse_v2(ty, "pos", &parts[0]) {
            Some(v) => v,
            None => return,
        };
        let v_geom = match self.parse_v2(ty, "geometry", &parts[1]) {
            Some(v) => v,
            None => return,
        };
        let name = parts[2].clone();
        let label = self.resolver.translate(&crate::text::unescape(&parts[3]));
        let default_value = self.resolver.resolve_text(&crate::text::unescape(&parts[4]));
        let multiline = ty == "textarea";

        let rect = if self.real_coordinates {
            let pos = self.metrics.real_base_pos(None, self.pos_offset, v_pos);
            let geom = self.metrics.real_geom(v_geom);
            Rect::new(pos.x, pos.y, geom.w, geom.h)
        } else {
            let mut pos = self.metrics.legacy_base_pos(None, self.pos_offset, Some(v_pos));
            pos -= self.metrics.padding;
            let width =
                v_geom.x * self.metrics.spacing.w - (self.metrics.spacing.w - self.metrics.imgsize.w);
            let height;
            if multiline {
                height = v_geom.y * self.metrics.imgsize.h
                    - (self.metrics.spacing.h - self.metrics.imgsize.h);
                pos.y += self.metrics.btn_height;
            } else {
                pos.y += v_geom.y * self.metrics.imgsize.h / 2.0;
                pos.y -= self.metrics.btn_height;
                height = self.metrics.btn_height * 2.0;
            }
            Rect::new(pos.x, pos.y, width, height)
        };

        if !self.explicit_size {
            warn!("invalid use of positioned {} without a size[] element", ty);
        }

        let mut spec = FieldSpec::new(name.clone(), label, self.tree.next_field_id());
        spec.default_value = default_value;
        spec.style = self.resolve_style(if multiline { "textarea" } else { "field" }, &name, None);
        self.create_text_field(spec, rect, multiline);

        if parts.len() >= 6 {
            warn!("field/textarea: use field_close_on_enter[name, enabled] instead of the 6th param");
            self.tree.close_on_enter.insert(name, is_yes(&parts[5]));
        }
    }

    pub(super) fn parse_field(&mut self, body: &str, ty: &str) {
        let parts = split_escaped(body, ';');
        match parts.len() {
            3 | 4 => self.parse_simple_field(&parts),
            5 | 6 => self.parse_text_area(&parts, ty),
            n if n > 6 && self.version > super::FORMSPEC_API_VERSION => {
                self.parse_text_area(&parts, ty);
            }
            n => error!("invalid field element ({}): '{}'", n, body),
        }
    }

    pub(super) fn parse_hypertext(&mut self, body: &str) {
        let parts = split_escaped(body, ';');
        if parts.len() != 4 && self.version < super::FORMSPEC_API_VERSION {
            error!("invalid text element ({}): '{}'", parts.len(), body);
            return;
        }
        if parts.len() < 4 {
            error!("invalid text element ({}): '{}'", parts.len(), body);
            return;
        }
        let v_pos = match self.parse_v2("hypertext", "pos", &parts[0]) {
            Some(v) => v,
            None => return,
        };
        let v_geom = match self.parse_v2("hypertext", "geometry", &parts[1]) {
            Some(v) => v,
            None => return,
        };
        let name = parts[2].clone();
        let text = self.resolver.resolve_text(&crate::text::unescape(&parts[3]));

        let rect = if self.real_coordinates {
            let pos = self.metrics.real_base_pos(None, self.pos_offset, v_pos);
            let geom = self.metrics.real_geom(v_geom);
            Rect::new(pos.x, pos.y, geom.w, geom.h)
        } else {
            let mut pos = self.metrics.legacy_base_pos(None, self.pos_offset, Some(v_pos));
            pos -= self.metrics.padding;
            pos.x += v_pos.x * self.metrics.spacing.w;
            pos.y += v_pos.y * self.metrics.spacing.h + self.metrics.btn_height * 2.0;
            Rect::new(
                pos.x,
                pos.y,
                v_geom.x * self.metrics.spacing.w
                    - (self.metrics.spacing.w - self.metrics.imgsize.w),
                v_geom.y * self.metrics.imgsize.h
                    - (self.metrics.spacing.h - self.metrics.imgsize.h),
            )
        };

        let mut spec = FieldSpec::new(name, text, self.tree.next_field_id());
        spec.kind = FieldKind::Unknown;
        spec.rect = rect;
        self.register_field(spec);
    }

    // ==== labels ====

    pub(super) fn parse_label(&mut self, body: &str) {
        let parts = split_escaped(body, ';');
        if !self.check_parts("label", body, parts.len(), &[2]) {
            return;
        }
        let v_pos = match self.parse_v2("label", "pos", &parts[0]) {
            Some(v) => v,
            None => return,
        };
        if !self.explicit_size {
            warn!("invalid use of label without a size[] element");
        }

        for (i, line) in split_escaped(&parts[1], '\n').iter().enumerate() {
            let text = self.resolver.translate(&crate::text::unescape(line));
            let width = self.font.text_width(&text);

            let rect = if self.real_coordinates {
                // lines are spaced at half an imgsize so multi-line labels
                // line up with elements without wasting vertical room
                let mut pos = self.metrics.real_base_pos(None, self.pos_offset, v_pos);
                pos.y += self.metrics.imgsize.h / -2.0
                    + self.metrics.imgsize.h * i as f32 / 2.0;
                Rect::new(pos.x, pos.y, width, self.metrics.imgsize.h)
            } else {
                // legacy line pitch is exactly 2/5 of a slot
                let mut pos = self.metrics.legacy_base_pos(None, self.pos_offset, None);
                pos.x += v_pos.x * self.metrics.spacing.w;
                pos.y += (v_pos.y + 7.0 / 30.0) * self.metrics.spacing.h;
                pos.y += i as f32 * self.metrics.spacing.h * 2.0 / 5.0;
                Rect::new(
                    pos.x,
                    pos.y - self.metrics.btn_height,
                    width,
                    self.metrics.btn_height * 2.0,
                )
            };

            let mut spec = FieldSpec::new("", text.clone(), self.tree.next_field_id());
            spec.rect = rect;
            spec.style = self.resolve_style("label", "", None);
            self.tree.static_texts.push(StaticTextSpec {
                text,
                rect,
                color: spec.style.get_color(Property::TextColor, Rgba::white()),
                parent_field: None,
            });
            self.register_field(spec);
        }
    }

    pub(super) fn parse_vertlabel(&mut self, body: &str) {
        let parts = split_escaped(body, ';');
        if !self.check_parts("vertlabel", body, parts.len(), &[2]) {
            return;
        }
        let v_pos = match self.parse_v2("vertlabel", "pos", &parts[0]) {
            Some(v) => v,
            None => return,
        };
        let text = self.resolver.translate(&crate::text::unescape(&parts[1]));
        let line_height = self.font.line_height();
        // one extra line keeps the last glyph from being clipped
        let height = line_height * (text.chars().count() + 1) as f32;

        let rect = if self.real_coordinates {
            let mut pos = self.metrics.real_base_pos(None, self.pos_offset, v_pos);
            // vertlabels position by their horizontal center
            pos.x -= self.metrics.imgsize.w / 2.0;
            Rect::new(pos.x, pos.y, self.metrics.imgsize.w, height)
        } else {
            let pos = self.metrics.legacy_base_pos(None, self.pos_offset, Some(v_pos));
            Rect::new(
                pos.x,
                pos.y + self.metrics.imgsize.h / 2.0 - self.metrics.btn_height,
                15.0,
                height,
            )
        };

        if !self.explicit_size {
            warn!("invalid use of label without a size[] element");
        }

        let mut label = String::new();
        for c in text.chars() {
            label.push(c);
            label.push('\n');
        }

        let mut spec = FieldSpec::new("", label.clone(), self.tree.next_field_id());
        spec.rect = rect;
        spec.style = self.resolve_style("vertlabel", "", Some("label"));
        self.tree.static_texts.push(StaticTextSpec {
            text: label,
            rect,
            color: spec.style.get_color(Property::TextColor, Rgba::white()),
            parent_field: None,
        });
        self.register_field(spec);
    }

    // ==== image buttons, tab headers ====

    pub(super) fn parse_image_button(&mut self, body: &str, ty: &str) {
        let parts = split_escaped(body, ';');
        if !((parts.len() >= 5 && parts.len() <= 8 && parts.len() != 6)
            || (parts.len() > 8 && self.version > super::FORMSPEC_API_VERSION))
        {
            error!("invalid imagebutton element ({}): '{}'", parts.len(), body);
            return;
        }
        let v_pos = match self.parse_v2("imagebutton", "pos", &parts[0]) {
            Some(v) => v,
            None => return,
        };
        let v_geom = match self.parse_v2("imagebutton", "geometry", &parts[1]) {
            Some(v) => v,
            None => return,
        };
        let image = crate::text::unescape(&parts[2]);
        let name = parts[3].clone();
        let label = crate::text::unescape(&parts[4]);

        let rect = if self.real_coordinates {
            let pos = self.metrics.real_base_pos(None, self.pos_offset, v_pos);
            let geom = self.metrics.real_geom(v_geom);
            Rect::new(pos.x, pos.y, geom.w, geom.h)
        } else {
            let pos = self.metrics.legacy_base_pos(None, self.pos_offset, Some(v_pos));
            Rect::new(
                pos.x,
                pos.y,
                v_geom.x * self.metrics.spacing.w
                    - (self.metrics.spacing.w - self.metrics.imgsize.w),
                v_geom.y * self.metrics.spacing.h
                    - (self.metrics.spacing.h - self.metrics.imgsize.h),
            )
        };

        if !self.explicit_size {
            warn!("invalid use of image_button without a size[] element");
        }

        let mut spec = FieldSpec::new(name.clone(), label, self.tree.next_field_id());
        spec.kind = FieldKind::Button;
        spec.is_exit = ty == "image_button_exit";
        spec.default_value = image.clone();
        spec.rect = rect;

        let mut style = self.resolve_style("image_button", &name, None);
        // the element's own textures and flags override the cascade
        style.set(Property::BgImg, image);
        if parts.len() >= 8 && !parts[7].is_empty() {
            style.set(Property::BgImgPressed, crate::text::unescape(&parts[7]));
        }
        if parts.len() >= 7 {
            style.set(Property::NoClip, if parts[5] == "true" { "true" } else { "false" });
            style.set(Property::Border, if parts[6] == "false" { "false" } else { "true" });
        }
        spec.style = style;
        self.register_field(spec);
    }

    pub(super) fn parse_tabheader(&mut self, body: &str) {
        let parts = split_escaped(body, ';');
        if !(matches!(parts.len(), 4 | 6)
            || (parts.len() == 7 && self.real_coordinates)
            || (parts.len() > 6 && self.version > super::FORMSPEC_API_VERSION))
        {
            error!("invalid tabheader element ({}): '{}'", parts.len(), body);
            return;
        }
        let v_pos = match self.parse_v2("tabheader", "pos", &parts[0]) {
            Some(v) => v,
            None => return,
        };

        // with real coordinates a seventh part supplies the tab height; width
        // stays automatic unless given explicitly
        let mut i = 0;
        let mut v_geom = Vec2::new(1.0, 0.75);
        let mut auto_width = true;
        if parts.len() == 7 {
            i = 1;
            let comps = split_escaped(&parts[1], ',');
            match comps.len() {
                1 => v_geom.y = stof(&comps[0]),
                2 => {
                    v_geom = Vec2::new(stof(&comps[0]), stof(&comps[1]));
                    auto_width = false;
                }
                _ => {
                    error!("invalid geometry for element tabheader specified: '{}'", parts[1]);
                    return;
                }
            }
        }

        let name = parts[i + 1].clone();
        let captions = split_escaped(&parts[i + 2], ',').iter()
            .map(|caption| self.resolver.translate(&crate::text::unescape(caption)))
            .collect::<Vec<_>>();
        let tab_index = stoi(&parts[i + 3]) - 1;

        let rect = if self.real_coordinates {
            let mut pos = self.metrics.real_base_pos(None, self.pos_offset, v_pos);
            let mut geom = self.metrics.real_geom(v_geom);
            // tab headers anchor at their bottom edge
            pos.y -= geom.h;
            if auto_width {
                geom.w = self.rect.w;
            }
            Rect::new(pos.x, pos.y, geom.w, geom.h)
        } else {
            let pos = self.pos_offset * Vec2::new(self.metrics.spacing.w, self.metrics.spacing.h)
                + v_pos * Vec2::new(self.metrics.spacing.w, self.metrics.spacing.h);
            Rect::new(
                pos.x,
                pos.y - self.metrics.btn_height * 2.0,
                self.rect.w,
                self.metrics.btn_height * 2.0,
            )
        };

        let active = if tab_index >= 0 && (tab_index as usize) < captions.len() {
            tab_index as usize
        } else {
            0
        };

        let mut spec = FieldSpec::new(name.clone(), "", self.tree.next_field_id());
        spec.kind = FieldKind::TabHeader { captions, active };
        spec.rect = rect;
        spec.style = self.resolve_style("tabheader", &name, None);
        self.register_field(spec);
    }

    pub(super) fn parse_item_image_button(&mut self, body: &str) {
        let parts = split_escaped(body, ';');
        if !self.check_parts("itemimagebutton", body, parts.len(), &[5]) {
            return;
        }
        let v_pos = match self.parse_v2("itemimagebutton", "pos", &parts[0]) {
            Some(v) => v,
            None => return,
        };
        let v_geom = match self.parse_v2("itemimagebutton", "geometry", &parts[1]) {
            Some(v) => v,
            None => return,
        };
        let item_name = crate::text::unescape(&parts[2]);
        let name = parts[3].clone();
        let label = crate::text::unescape(&parts[4]);

        let (pos, geom) = if self.real_coordinates {
            (
                self.metrics.real_base_pos(None, self.pos_offset, v_pos),
                self.metrics.real_geom(v_geom),
            )
        } else {
            (
                self.metrics.legacy_base_pos(None, self.pos_offset, Some(v_pos)),
                Extent2::new(
                    v_geom.x * self.metrics.spacing.w
                        - (self.metrics.spacing.w - self.metrics.imgsize.w),
                    v_geom.y * self.metrics.spacing.h
                        - (self.metrics.spacing.h - self.metrics.imgsize.h),
                ),
            )
        };
        let rect = Rect::new(pos.x, pos.y, geom.w, geom.h);

        if !self.explicit_size {
            warn!("invalid use of item_image_button without a size[] element");
        }

        // the item description becomes the button's tooltip
        self.tree.tooltips.insert(name.clone(), TooltipSpec {
            text: self.defs.description(&item_name),
            bgcolor: self.tree.default_tooltip_bgcolor,
            color: self.tree.default_tooltip_color,
        });

        let mut spec = FieldSpec::new(name.clone(), label.clone(), self.tree.next_field_id());
        spec.kind = FieldKind::Button;
        spec.default_value = item_name.clone();
        spec.rect = rect;
        spec.style = self.resolve_style("item_image_button", &name, Some("image_button"));
        let id = spec.id;
        self.register_field(spec);

        let abs_pos = if self.real_coordinates {
            self.metrics.real_base_pos(Some(self.origin()), self.pos_offset, v_pos)
        } else {
            self.metrics.legacy_base_pos(Some(self.origin()), self.pos_offset, Some(v_pos))
        };
        self.tree.item_images.push(ItemImageSpec {
            item_name,
            pos: abs_pos,
            geom,
            parent_field: Some(id),
        });
        self.tree.static_texts.push(StaticTextSpec {
            text: label,
            rect,
            color: Rgba::white(),
            parent_field: Some(id),
        });
    }

    // ==== boxes, colors, tooltips ====

    pub(super) fn parse_box(&mut self, body: &str) {
        let parts = split_escaped(body, ';');
        if !self.check_parts("box", body, parts.len(), &[3]) {
            return;
        }
        let v_pos = match self.parse_v2("box", "pos", &parts[0]) {
            Some(v) => v,
            None => return,
        };
        let v_geom = match self.parse_v2("box", "geometry", &parts[1]) {
            Some(v) => v,
            None => return,
        };

        let (pos, geom) = if self.real_coordinates {
            (
                self.metrics.real_base_pos(Some(self.origin()), self.pos_offset, v_pos),
                self.metrics.real_geom(v_geom),
            )
        } else {
            (
                self.metrics.legacy_base_pos(Some(self.origin()), self.pos_offset, Some(v_pos)),
                self.metrics.legacy_geom(v_geom),
            )
        };

        match parse_color(&parts[2], 0x8C) {
            Some(color) => self.tree.boxes.push(BoxSpec { pos, geom, color }),
            None => {
                error!("invalid box element ({}): '{}' INVALID COLOR", parts.len(), body);
            }
        }
    }

    pub(super) fn parse_bgcolor(&mut self, body: &str) {
        let parts = split_escaped(body, ';');
        if !self.check_parts("bgcolor", body, parts.len(), &[1, 2]) {
            return;
        }
        if let Some(color) = parse_color(&parts[0], 0xFF) {
            self.tree.bgcolor = color;
        }
        if parts.len() == 2 {
            self.tree.bgfullscreen = is_yes(&parts[1]);
        }
    }

    pub(super) fn parse_listcolors(&mut self, body: &str) {
        let parts = split_escaped(body, ';');
        if !self.check_parts("listcolors", body, parts.len(), &[2, 3, 5]) {
            return;
        }
        if let Some(color) = parse_color(&parts[0], 0xFF) {
            self.tree.slotbg_normal = color;
        }
        if let Some(color) = parse_color(&parts[1], 0xFF) {
            self.tree.slotbg_hover = color;
        }
        if parts.len() >= 3 {
            if let Some(color) = parse_color(&parts[2], 0xFF) {
                self.tree.slotborder_color = color;
                self.tree.slotborder = true;
            }
        }
        if parts.len() == 5 {
            if let Some(color) = parse_color(&parts[3], 0xFF) {
                self.tree.default_tooltip_bgcolor = color;
            }
            if let Some(color) = parse_color(&parts[4], 0xFF) {
                self.tree.default_tooltip_color = color;
            }
        }
    }

    pub(super) fn parse_tooltip(&mut self, body: &str) {
        let parts = split_escaped(body, ';');
        if parts.len() < 2 {
            error!("invalid tooltip element ({}): '{}'", parts.len(), body);
            return;
        }

        // rect mode is recognized by a comma in the first part
        let rect_mode = parts[0].contains(',');
        let base_size = if rect_mode { 3 } else { 2 };
        if parts.len() != base_size && parts.len() != base_size + 2 {
            error!("invalid tooltip element ({}): '{}'", parts.len(), body);
            return;
        }

        let mut bgcolor = self.tree.default_tooltip_bgcolor;
        let mut color = self.tree.default_tooltip_color;
        if parts.len() == base_size + 2 {
            match (
                parse_color(&parts[base_size], 0xFF),
                parse_color(&parts[base_size + 1], 0xFF),
            ) {
                (Some(bg), Some(fg)) => {
                    bgcolor = bg;
                    color = fg;
                }
                _ => {
                    error!("invalid color in tooltip element ({}): '{}'", parts.len(), body);
                    return;
                }
            }
        }

        let text = crate::text::unescape(&parts[if rect_mode { 2 } else { 1 }]);
        let spec = TooltipSpec { text, bgcolor, color };

        if rect_mode {
            let v_pos = match self.parse_v2("tooltip", "pos", &parts[0]) {
                Some(v) => v,
                None => return,
            };
            let v_geom = match self.parse_v2("tooltip", "geometry", &parts[1]) {
                Some(v) => v,
                None => return,
            };
            let (pos, geom) = if self.real_coordinates {
                (
                    self.metrics.real_base_pos(Some(self.origin()), self.pos_offset, v_pos),
                    self.metrics.real_geom(v_geom),
                )
            } else {
                (
                    self.metrics.legacy_base_pos(Some(self.origin()), self.pos_offset, Some(v_pos)),
                    self.metrics.legacy_geom(v_geom),
                )
            };
            self.tree.tooltip_rects.push((Rect::new(pos.x, pos.y, geom.w, geom.h), spec));
        } else {
            self.tree.tooltips.insert(parts[0].clone(), spec);
        }
    }

    // ==== styles ====

    pub(super) fn parse_style(&mut self, body: &str, by_type: bool) {
        let parts = split_escaped(body, ';');
        if parts.len() < 2 {
            error!("invalid style element ({}): '{}'", parts.len(), body);
            return;
        }
        let selector = parts[0].trim();
        if selector.is_empty() {
            error!("invalid style element (selector required): '{}'", body);
            return;
        }

        let mut pairs = Vec::with_capacity(parts.len() - 1);
        for part in &parts[1..] {
            let (key, value) = match part.split_once('=') {
                Some(kv) => kv,
                None => {
                    error!("invalid style element (property missing value): '{}'", body);
                    return;
                }
            };
            pairs.push((
                key.trim().to_ascii_lowercase(),
                crate::text::unescape(value.trim()),
            ));
        }
        self.theme.apply_statement(selector, &pairs, by_type);
    }
}
