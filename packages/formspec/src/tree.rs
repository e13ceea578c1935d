//! The element tree: typed draw-spec records plus the field registry.
//!
//! Parsing one formspec document produces one `FormTree`. Renderers walk the
//! per-kind vectors in insertion order (insertion order is paint order within
//! a kind); the interaction machine hit-tests inventory slots against the
//! list specs. Records refer to fields by id, never by live widget pointers.

use crate::{
    field::{FieldSpec, FIELD_ID_BASE},
    geom::{rect_contains, FormMetrics},
    inventory::{InventoryLocation, SlotRef},
    table::TableState,
};
use std::collections::HashMap;
use vek::*;


// ==== draw specs ====


/// An inventory grid bound to a slice of an inventory list.
#[derive(Debug, Clone, PartialEq)]
pub struct ListDrawSpec {
    pub location: InventoryLocation,
    pub list: String,
    /// Absolute pixel position of the first slot.
    pub pos: Vec2<f32>,
    /// Grid size in slots, columns by rows.
    pub geom: Vec2<i32>,
    pub start_index: usize,
    /// Slot pitch differs between the coordinate systems, so each list
    /// remembers which one laid it out.
    pub real_coordinates: bool,
}

impl ListDrawSpec {
    /// Pixel rectangle of the grid-local slot `i`.
    pub fn slot_rect(&self, i: i32, metrics: &FormMetrics) -> Rect<f32, f32> {
        let (sx, sy) = if self.real_coordinates {
            (metrics.imgsize.w * 1.25, metrics.imgsize.h * 1.25)
        } else {
            (metrics.spacing.w, metrics.spacing.h)
        };
        Rect::new(
            self.pos.x + (i % self.geom.x) as f32 * sx,
            self.pos.y + (i / self.geom.x) as f32 * sy,
            metrics.imgsize.w,
            metrics.imgsize.h,
        )
    }
}

/// A `listring[]` link: shift-clicks chain through these cyclically.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ListRingSpec {
    pub location: InventoryLocation,
    pub list: String,
}

/// A plain image; `geom` of `None` means natural texture size.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageDrawSpec {
    pub texture: String,
    pub pos: Vec2<f32>,
    pub geom: Option<Extent2<f32>>,
}

/// An item rendered by its inventory appearance. `parent_field` links the
/// image of an `item_image_button[]` to its button field.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemImageSpec {
    pub item_name: String,
    pub pos: Vec2<f32>,
    pub geom: Extent2<f32>,
    pub parent_field: Option<u32>,
}

/// Dialog background image, optionally 9-sliced and/or clipped to the dialog
/// rect (in clip mode `pos` is an offset from the dialog edges).
#[derive(Debug, Clone, PartialEq)]
pub struct BackgroundSpec {
    pub texture: String,
    pub pos: Vec2<f32>,
    pub geom: Extent2<f32>,
    /// 9-slice middle rect in texture pixels; negative max components are
    /// interpreted as texture size minus the component.
    pub middle: Option<Aabr<i32>>,
    pub clip: bool,
}

/// Filled rectangle.
#[derive(Debug, Clone, PartialEq)]
pub struct BoxSpec {
    pub pos: Vec2<f32>,
    pub geom: Extent2<f32>,
    pub color: Rgba<u8>,
}

/// Tooltip payload.
#[derive(Debug, Clone, PartialEq)]
pub struct TooltipSpec {
    pub text: String,
    pub bgcolor: Rgba<u8>,
    pub color: Rgba<u8>,
}

/// Non-interactive text at a fixed rect.
#[derive(Debug, Clone, PartialEq)]
pub struct StaticTextSpec {
    pub text: String,
    pub rect: Rect<f32, f32>,
    pub color: Rgba<u8>,
    /// Field id of the button this text is overlaid on, if any.
    pub parent_field: Option<u32>,
}


// ==== the tree ====


/// Everything one parse pass produces. Replaced wholesale per regeneration.
#[derive(Debug, Clone)]
pub struct FormTree {
    pub lists: Vec<ListDrawSpec>,
    pub rings: Vec<ListRingSpec>,
    pub images: Vec<ImageDrawSpec>,
    pub item_images: Vec<ItemImageSpec>,
    pub backgrounds: Vec<BackgroundSpec>,
    pub boxes: Vec<BoxSpec>,
    pub static_texts: Vec<StaticTextSpec>,
    /// Field-name keyed tooltips.
    pub tooltips: HashMap<String, TooltipSpec>,
    /// Rect-keyed tooltips, checked in insertion order.
    pub tooltip_rects: Vec<(Rect<f32, f32>, TooltipSpec)>,
    pub fields: Vec<FieldSpec>,
    /// Live table state, keyed by field name.
    pub tables: Vec<(String, TableState)>,
    pub close_on_enter: HashMap<String, bool>,

    // session-wide visuals set by bgcolor[]/listcolors[]
    pub bgcolor: Rgba<u8>,
    pub fullscreen_bgcolor: Rgba<u8>,
    pub bgfullscreen: bool,
    pub slotbg_normal: Rgba<u8>,
    pub slotbg_hover: Rgba<u8>,
    pub slotborder_color: Rgba<u8>,
    pub slotborder: bool,
    pub default_tooltip_bgcolor: Rgba<u8>,
    pub default_tooltip_color: Rgba<u8>,
}

impl Default for FormTree {
    fn default() -> Self {
        FormTree {
            lists: Vec::new(),
            rings: Vec::new(),
            images: Vec::new(),
            item_images: Vec::new(),
            backgrounds: Vec::new(),
            boxes: Vec::new(),
            static_texts: Vec::new(),
            tooltips: HashMap::new(),
            tooltip_rects: Vec::new(),
            fields: Vec::new(),
            tables: Vec::new(),
            close_on_enter: HashMap::new(),
            bgcolor: Rgba::new(0, 0, 0, 140),
            fullscreen_bgcolor: Rgba::new(0, 0, 0, 140),
            bgfullscreen: false,
            slotbg_normal: Rgba::new(128, 128, 128, 255),
            slotbg_hover: Rgba::new(192, 192, 192, 255),
            slotborder_color: Rgba::new(0, 0, 0, 200),
            slotborder: false,
            default_tooltip_bgcolor: Rgba::new(110, 130, 60, 255),
            default_tooltip_color: Rgba::new(255, 255, 255, 255),
        }
    }
}

impl FormTree {
    /// Next id for a newly registered field.
    pub fn next_field_id(&self) -> u32 {
        FIELD_ID_BASE + self.fields.len() as u32
    }

    pub fn field_by_id(&self, id: u32) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.id == id)
    }

    pub fn field_by_id_mut(&mut self, id: u32) -> Option<&mut FieldSpec> {
        self.fields.iter_mut().find(|f| f.id == id)
    }

    pub fn field_by_name(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn table(&self, name: &str) -> Option<&TableState> {
        self.tables.iter()
            .find(|(n, _)| n == name)
            .map(|(_, t)| t)
    }

    pub fn table_mut(&mut self, name: &str) -> Option<&mut TableState> {
        self.tables.iter_mut()
            .find(|(n, _)| n == name)
            .map(|(_, t)| t)
    }

    /// Hit-test an absolute pixel position against every inventory slot.
    pub fn slot_at(&self, pos: Vec2<f32>, metrics: &FormMetrics) -> Option<SlotRef> {
        for spec in &self.lists {
            for i in 0..spec.geom.x * spec.geom.y {
                if rect_contains(spec.slot_rect(i, metrics), pos) {
                    return Some(SlotRef {
                        location: spec.location.clone(),
                        list: spec.list.clone(),
                        index: spec.start_index + i as usize,
                    });
                }
            }
        }
        None
    }

    /// Ring entry following the one that matches the slot, cyclically.
    pub fn ring_target_after(&self, slot: &SlotRef) -> Option<&ListRingSpec> {
        let i = self.rings.iter()
            .position(|ring| ring.location == slot.location && ring.list == slot.list)?;
        Some(&self.rings[(i + 1) % self.rings.len()])
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    fn metrics() -> FormMetrics {
        FormMetrics {
            imgsize: Extent2::new(40.0, 40.0),
            spacing: Extent2::new(50.0, 50.0),
            padding: Vec2::new(15.0, 15.0),
            btn_height: 15.0,
        }
    }

    fn list(real: bool) -> ListDrawSpec {
        ListDrawSpec {
            location: InventoryLocation::CurrentPlayer,
            list: "main".to_owned(),
            pos: Vec2::new(100.0, 100.0),
            geom: Vec2::new(3, 2),
            start_index: 0,
            real_coordinates: real,
        }
    }

    #[test]
    fn legacy_slot_pitch_is_spacing() {
        let spec = list(false);
        let rect = spec.slot_rect(4, &metrics());
        assert_eq!(rect, Rect::new(150.0, 150.0, 40.0, 40.0));
    }

    #[test]
    fn real_slot_pitch_is_five_fourths_imgsize() {
        let spec = list(true);
        let rect = spec.slot_rect(1, &metrics());
        assert_eq!(rect, Rect::new(150.0, 100.0, 40.0, 40.0));
    }

    #[test]
    fn slot_hit_testing_respects_start_index() {
        let mut tree = FormTree::default();
        tree.lists.push(ListDrawSpec { start_index: 10, ..list(false) });
        let hit = tree.slot_at(Vec2::new(155.0, 155.0), &metrics()).unwrap();
        assert_eq!(hit.index, 14);
        assert!(tree.slot_at(Vec2::new(95.0, 95.0), &metrics()).is_none());
        // gaps between slots are not slots
        assert!(tree.slot_at(Vec2::new(145.0, 105.0), &metrics()).is_none());
    }

    #[test]
    fn ring_wraps_around() {
        let mut tree = FormTree::default();
        tree.rings.push(ListRingSpec {
            location: InventoryLocation::CurrentPlayer,
            list: "main".to_owned(),
        });
        tree.rings.push(ListRingSpec {
            location: InventoryLocation::Detached(
                "chest".to_owned()),
            list: "box".to_owned(),
        });
        let slot = SlotRef {
            location: InventoryLocation::Detached("chest".to_owned()),
            list: "box".to_owned(),
            index: 0,
        };
        let target = tree.ring_target_after(&slot).unwrap();
        assert_eq!(target.list, "main");
    }
}
