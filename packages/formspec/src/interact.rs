//! The inventory pointer-interaction state machine.
//!
//! State is fully characterized by the selection: which slot is picked up,
//! how many items of it, whether the pointer is dragging them, and whether a
//! swap is in flight. Button and wheel events resolve against a hit-tested
//! slot and produce move/drop/craft/shift-move actions for the sink.
//!
//! Actions are optimistic and fire-and-forget. The authority may apply them
//! late or not at all, so [`InteractState::update_selected`] re-validates the
//! selection against live inventory state before every event and draw.

use crate::{
    geom::rect_contains,
    inventory::{
        ActionSink,
        InventoryAction,
        InventoryStore,
        ItemDefs,
        ItemStack,
        SlotRef,
    },
    parse::Form,
};
use std::cmp::min;
use vek::*;


/// List name of the non-interactive crafting output preview slot.
const CRAFT_PREVIEW_LIST: &'static str = "craftpreview";

/// List name of the real crafting output slot actions target.
const CRAFT_RESULT_LIST: &'static str = "craftresult";

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
    WheelUp,
    WheelDown,
}

/// One pointer event, already in screen pixels.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum PointerEvent {
    ButtonDown {
        button: MouseButton,
        pos: Vec2<f32>,
        shift: bool,
    },
    ButtonUp {
        button: MouseButton,
        pos: Vec2<f32>,
    },
    /// Pointer motion; `right_held` drives auto-place drags.
    Move {
        pos: Vec2<f32>,
        right_held: bool,
    },
    Wheel {
        down: bool,
        pos: Vec2<f32>,
        shift: bool,
    },
}

// internal event classification, one axis for which button and one for edge
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
enum Edge {
    Down,
    Up,
    Moved,
}

/// Pointer interaction state for one open dialog.
#[derive(Debug, Clone, Default)]
pub struct InteractState {
    pointer: Vec2<f32>,
    old_pointer: Vec2<f32>,
    selected: Option<SlotRef>,
    selected_amount: u32,
    selected_dragging: bool,
    /// Stack pending re-validation after a move degenerated into a swap.
    /// While set, the validation pass leaves `selected_amount` alone.
    selected_swap: Option<ItemStack>,
    /// Click-then-click (rather than drag) switches right-drags into
    /// place-one-per-slot mode.
    auto_place: bool,
}

impl InteractState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pointer(&self) -> Vec2<f32> {
        self.pointer
    }

    /// Currently held slot and amount, if anything is picked up.
    pub fn selected(&self) -> Option<(&SlotRef, u32)> {
        self.selected.as_ref().map(|slot| (slot, self.selected_amount))
    }

    pub fn is_dragging(&self) -> bool {
        self.selected_dragging
    }

    pub fn swap_pending(&self) -> bool {
        self.selected_swap.is_some()
    }

    fn deselect(&mut self) {
        self.selected = None;
        self.selected_amount = 0;
        self.selected_dragging = false;
    }

    /// Re-validate the selection against live inventory state and return the
    /// selected stack.
    ///
    /// A selection whose slot disappeared or emptied is cleared. Otherwise
    /// the held amount is clamped to the live count, except while a swap is
    /// pending: the pending stack is compared against the live one and the
    /// swap flag cleared once they match.
    pub fn verify_selected(&mut self, store: &dyn InventoryStore) -> ItemStack {
        if let Some(selected) = self.selected.clone() {
            let list = store.inventory(&selected.location)
                .and_then(|inv| inv.list(&selected.list));
            if let Some(list) = list {
                if selected.index < list.size() {
                    let stack = list.item(selected.index);
                    match &self.selected_swap {
                        Some(swap) => {
                            if swap.name == stack.name && swap.count == stack.count {
                                self.selected_swap = None;
                            }
                        }
                        None => {
                            self.selected_amount = min(self.selected_amount, stack.count);
                        }
                    }
                    if !stack.is_empty() {
                        return stack;
                    }
                }
            }
            // selection no longer validates
            self.deselect();
        }
        ItemStack::default()
    }

    /// Validation plus craft-result auto-selection, run before every event
    /// and before each draw.
    pub fn update_selected(&mut self, form: &Form, store: &dyn InventoryStore) {
        self.verify_selected(store);

        // a nonempty craft result with nothing else held selects itself
        if self.selected.is_none() {
            for spec in &form.tree.lists {
                if spec.list != CRAFT_PREVIEW_LIST {
                    continue;
                }
                let item = store.inventory(&spec.location)
                    .and_then(|inv| inv.list(CRAFT_RESULT_LIST))
                    .filter(|list| list.size() > 0)
                    .map(|list| list.item(0));
                match item {
                    Some(item) if !item.is_empty() => {
                        self.selected = Some(SlotRef {
                            location: spec.location.clone(),
                            list: CRAFT_RESULT_LIST.to_owned(),
                            index: 0,
                        });
                        self.selected_amount = item.count;
                        self.selected_dragging = false;
                        break;
                    }
                    _ => continue,
                }
            }
        }

        // the craft result is all-or-nothing: hold the whole stack
        if self.selected.as_ref().map(|s| s.list.as_str()) == Some(CRAFT_RESULT_LIST) {
            self.selected_amount = self.verify_selected(store).count;
        }
    }

    /// Feed one pointer event through the machine.
    pub fn handle_pointer(
        &mut self,
        form: &Form,
        store: &dyn InventoryStore,
        defs: &dyn ItemDefs,
        sink: &dyn ActionSink,
        event: PointerEvent,
    ) {
        let pos = match event {
            PointerEvent::ButtonDown { pos, .. }
            | PointerEvent::ButtonUp { pos, .. }
            | PointerEvent::Move { pos, .. }
            | PointerEvent::Wheel { pos, .. } => pos,
        };
        self.pointer = pos;

        // plain motion only matters while a right-drag crosses into a new
        // slot; everything else always runs the inventory logic
        if let PointerEvent::Move { right_held, .. } = event {
            let crossed = slot_index(form, self.pointer) != slot_index(form, self.old_pointer);
            if !right_held || !crossed {
                return;
            }
        }

        self.update_selected(form, store);

        // hit-test and validate the hovered slot
        let mut hovered = form.tree.slot_at(self.pointer, &form.metrics);
        let mut hovered_count = 0;
        let mut hovered_valid = false;
        if let Some(slot) = &hovered {
            match store.inventory(&slot.location).and_then(|inv| inv.list(&slot.list)) {
                None => {
                    error!("inventory menu: hovered inventory or list missing: {}:{}",
                        slot.location, slot.list);
                }
                Some(list) if slot.index >= list.size() => {
                    info!("inventory menu: hovered list {} too small (i={}, size={})",
                        slot.list, slot.index, list.size());
                }
                Some(list) => {
                    hovered_count = list.item(slot.index).count;
                    hovered_valid = true;
                }
            }
        }
        if !hovered_valid {
            hovered = None;
        }

        let identical = match (&self.selected, &hovered) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        };

        let (button, edge, shift) = match event {
            PointerEvent::ButtonDown { button, shift, .. } => (button, Edge::Down, shift),
            PointerEvent::ButtonUp { button, .. } => (button, Edge::Up, false),
            PointerEvent::Move { .. } => (MouseButton::Right, Edge::Moved, false),
            PointerEvent::Wheel { down, shift, .. } => (
                if down { MouseButton::WheelDown } else { MouseButton::WheelUp },
                Edge::Down,
                shift,
            ),
        };

        // a positive amount in one of these generates the matching action
        let mut move_amount = 0u32;
        let mut shift_move_amount = 0u32;
        let mut drop_amount = 0u32;
        let mut craft_amount = 0u32;

        match edge {
            Edge::Down => {
                self.selected_dragging = false;

                let on_craft_preview = hovered.as_ref()
                    .map(|s| s.list == CRAFT_PREVIEW_LIST)
                    .unwrap_or(false);

                if on_craft_preview {
                    // craft preview clicked: craft
                    craft_amount = if button == MouseButton::Middle { 10 } else { 1 };
                } else if self.selected.is_none() {
                    if hovered_count > 0 && button != MouseButton::WheelUp {
                        // non-empty stack clicked: select or shift-move it
                        self.selected = hovered.clone();

                        let count = match button {
                            MouseButton::Right => (hovered_count + 1) / 2,
                            MouseButton::Middle => min(hovered_count, 10),
                            MouseButton::WheelDown => 1,
                            _ => hovered_count,
                        };

                        if !shift {
                            self.selected_amount = count;
                            self.selected_dragging = button != MouseButton::WheelDown;
                            self.auto_place = false;
                        } else {
                            // shift: move immediately, right moves one
                            shift_move_amount =
                                if button == MouseButton::Right { 1 } else { count };
                        }
                    }
                } else if hovered.is_some() {
                    // slot clicked while holding: move into it
                    move_amount = match button {
                        MouseButton::Right | MouseButton::WheelUp => 1,
                        MouseButton::Middle => min(self.selected_amount, 10),
                        MouseButton::Left => self.selected_amount,
                        MouseButton::WheelDown => 0,
                    };

                    if identical {
                        if button == MouseButton::WheelDown {
                            // grow the held amount out of the same slot
                            if self.selected_amount < hovered_count {
                                self.selected_amount += 1;
                            }
                        } else {
                            // put part of the held amount back down
                            if move_amount >= self.selected_amount {
                                self.selected_amount = 0;
                            } else {
                                self.selected_amount -= move_amount;
                            }
                        }
                        move_amount = 0;
                    }
                } else if !rect_contains(form.rect, self.pointer)
                    && button != MouseButton::WheelDown
                {
                    // clicked outside of the window: drop
                    drop_amount = match button {
                        MouseButton::Right | MouseButton::WheelUp => 1,
                        MouseButton::Middle => min(self.selected_amount, 10),
                        _ => self.selected_amount,
                    };
                }
            }
            Edge::Up => {
                if self.selected_dragging && self.selected.is_some() {
                    if hovered.is_some() {
                        if !identical {
                            // dragged to a different slot: move all selected
                            move_amount = self.selected_amount;
                        }
                    } else if !rect_contains(form.rect, self.pointer) {
                        // dragged outside of the window: drop all selected
                        drop_amount = self.selected_amount;
                    }
                }
                self.selected_dragging = false;
                // click then release then click switches to auto-place
                if self.selected.is_some() {
                    self.auto_place = true;
                }
            }
            Edge::Moved => {
                // right-drag crossed into a new slot while auto-placing:
                // move one, but only onto empty or same-typed stacks
                if self.auto_place && self.selected.is_some() {
                    if let Some(slot) = &hovered {
                        if slot.list != CRAFT_PREVIEW_LIST {
                            let stack_from = read_stack(store, self.selected.as_ref().unwrap());
                            let stack_to = read_stack(store, slot);
                            if stack_to.is_empty() || stack_to.name == stack_from.name {
                                move_amount = 1;
                            }
                        }
                    }
                }
            }
        }

        if move_amount > 0 {
            self.resolve_move(store, defs, sink, hovered.as_ref().unwrap(), move_amount);
        } else if shift_move_amount > 0 {
            self.resolve_shift_move(form, store, sink, hovered.as_ref().unwrap(), shift_move_amount);
        } else if drop_amount > 0 {
            self.resolve_drop(store, sink, drop_amount);
        } else if craft_amount > 0 {
            self.resolve_craft(sink, hovered.as_ref().unwrap(), craft_amount);
        }

        // a zeroed amount clears the selection atomically
        if self.selected_amount == 0 {
            self.selected_swap = None;
            self.deselect();
        }

        self.old_pointer = self.pointer;
    }

    /// Move part of the selection into the hovered slot, degrading to a full
    /// swap when the destination rejects the merge entirely.
    fn resolve_move(
        &mut self,
        store: &dyn InventoryStore,
        defs: &dyn ItemDefs,
        sink: &dyn ActionSink,
        hovered: &SlotRef,
        amount: u32,
    ) {
        let selected = match self.selected.clone() {
            Some(selected) => selected,
            None => return,
        };
        let stack_from = read_stack(store, &selected);
        let stack_to = read_stack(store, hovered);

        let move_amount = min(amount, stack_from.count);
        let mut moving = stack_from.clone();
        moving.count = move_amount;

        let mut merged = stack_to.clone();
        let leftover = merged.add_item(moving.clone(), defs);

        let mut send = true;
        let mut count = move_amount;
        if leftover.count == moving.count && leftover.name == moving.name {
            // nothing merged: the stacks swap wholesale
            if self.selected_swap.is_none() {
                self.selected_amount = stack_to.count;
                self.selected_dragging = false;
                // skip the next validation clamps; the authority applies the
                // swap asynchronously
                self.selected_swap = Some(stack_to);
            } else {
                // one swap may be in flight at a time
                send = false;
            }
        } else if leftover.is_empty() {
            // source merged fully
            self.selected_amount = self.selected_amount.saturating_sub(count);
        } else {
            // source merged partly
            count -= leftover.count;
            self.selected_amount = self.selected_amount.saturating_sub(count);
        }

        if send {
            info!("handing move action to manager");
            sink.send_action(InventoryAction::Move {
                count,
                from: selected,
                to: hovered.clone(),
            });
        }
    }

    /// Move out of the hovered slot to the next list in the ring, letting the
    /// destination choose placement.
    fn resolve_shift_move(
        &mut self,
        form: &Form,
        store: &dyn InventoryStore,
        sink: &dyn ActionSink,
        hovered: &SlotRef,
        amount: u32,
    ) {
        let target = match form.tree.ring_target_after(hovered) {
            Some(target) => target,
            None => return,
        };
        // destination must exist right now; placement is up to it
        if store.inventory(&target.location)
            .and_then(|inv| inv.list(&target.list))
            .is_none()
        {
            return;
        }
        let stack_from = read_stack(store, hovered);
        if stack_from.is_empty() {
            return;
        }
        info!("handing move-somewhere action to manager");
        sink.send_action(InventoryAction::MoveSomewhere {
            count: min(amount, stack_from.count),
            from: hovered.clone(),
            to_location: target.location.clone(),
            to_list: target.list.clone(),
        });
    }

    fn resolve_drop(
        &mut self,
        store: &dyn InventoryStore,
        sink: &dyn ActionSink,
        amount: u32,
    ) {
        let selected = match self.selected.clone() {
            Some(selected) => selected,
            None => return,
        };
        let stack_from = read_stack(store, &selected);
        let drop_amount = min(amount, stack_from.count);
        if drop_amount == 0 {
            return;
        }
        self.selected_amount = self.selected_amount.saturating_sub(drop_amount);
        info!("handing drop action to manager");
        sink.send_action(InventoryAction::Drop { count: drop_amount, from: selected });
    }

    fn resolve_craft(&mut self, sink: &dyn ActionSink, hovered: &SlotRef, amount: u32) {
        // crafting proceeds only when nothing foreign is held
        let craftable = match &self.selected {
            None => true,
            Some(selected) => selected.list == CRAFT_RESULT_LIST,
        };
        if !craftable {
            return;
        }
        info!("handing craft action to manager");
        sink.send_action(InventoryAction::Craft {
            count: amount,
            craft_location: hovered.location.clone(),
        });
    }
}

fn read_stack(store: &dyn InventoryStore, slot: &SlotRef) -> ItemStack {
    store.inventory(&slot.location)
        .and_then(|inv| inv.list(&slot.list))
        .map(|list| list.item(slot.index))
        .unwrap_or_default()
}

/// Slot index under a point, `-1` when none. Crossing detection compares
/// indexes only.
fn slot_index(form: &Form, pos: Vec2<f32>) -> i64 {
    form.tree.slot_at(pos, &form.metrics)
        .map(|slot| slot.index as i64)
        .unwrap_or(-1)
}
