//! Inventory collaborator seams.
//!
//! The dialog core never owns authoritative inventory state. It reads stacks
//! through the narrow view traits here, and emits [`InventoryAction`]s into an
//! [`ActionSink`] fire-and-forget; the authority applies them at its leisure
//! and the interaction machine re-validates against whatever it later reads
//! back. [`LocalInventory`] is a plain in-memory implementation suitable for a
//! client-side mirror and for tests.

use crate::text::stoi;
use std::{
    collections::HashMap,
    fmt::{self, Formatter, Display},
    cmp::min,
};
use vek::*;


// ==== locations and slots ====


/// Where an inventory lives, as named on the wire.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub enum InventoryLocation {
    Undefined,
    CurrentPlayer,
    Player(String),
    NodeMeta(Vec3<i32>),
    Detached(String),
}

impl InventoryLocation {
    /// Parse the serialized location grammar. Unknown forms are `Undefined`.
    ///
    /// `context`/`current_name` are not handled here; the layout session
    /// substitutes its own context location for those before this is called.
    pub fn deserialize(s: &str) -> Self {
        if s == "current_player" {
            InventoryLocation::CurrentPlayer
        } else if let Some(name) = s.strip_prefix("player:") {
            InventoryLocation::Player(name.to_owned())
        } else if let Some(coords) = s.strip_prefix("nodemeta:") {
            let parts = coords.split(',').collect::<Vec<_>>();
            if parts.len() != 3 {
                return InventoryLocation::Undefined;
            }
            InventoryLocation::NodeMeta(Vec3::new(
                stoi(parts[0]),
                stoi(parts[1]),
                stoi(parts[2]),
            ))
        } else if let Some(name) = s.strip_prefix("detached:") {
            InventoryLocation::Detached(name.to_owned())
        } else {
            InventoryLocation::Undefined
        }
    }
}

impl Display for InventoryLocation {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            InventoryLocation::Undefined => write!(f, "undefined"),
            InventoryLocation::CurrentPlayer => write!(f, "current_player"),
            InventoryLocation::Player(name) => write!(f, "player:{}", name),
            InventoryLocation::NodeMeta(p) => write!(f, "nodemeta:{},{},{}", p.x, p.y, p.z),
            InventoryLocation::Detached(name) => write!(f, "detached:{}", name),
        }
    }
}

/// Reference to one slot of one list of one inventory.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct SlotRef {
    pub location: InventoryLocation,
    pub list: String,
    pub index: usize,
}


// ==== item stacks ====


/// A stack of identical items. Empty iff `name` is empty or `count` is 0.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct ItemStack {
    pub name: String,
    pub count: u32,
}

impl ItemStack {
    pub fn new(name: impl Into<String>, count: u32) -> Self {
        ItemStack { name: name.into(), count }
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_empty() || self.count == 0
    }

    pub fn clear(&mut self) {
        self.name.clear();
        self.count = 0;
    }

    /// Merge another stack into this one, as far as the stack limit allows.
    /// Returns the part of `other` that did not fit. An incompatible item
    /// comes back whole.
    pub fn add_item(&mut self, other: ItemStack, defs: &dyn ItemDefs) -> ItemStack {
        if other.is_empty() {
            return ItemStack::default();
        }
        if self.is_empty() {
            *self = other;
            return ItemStack::default();
        }
        if self.name != other.name {
            return other;
        }
        let room = defs.max_count(&self.name).saturating_sub(self.count);
        let moved = min(room, other.count);
        self.count += moved;
        let left = other.count - moved;
        if left == 0 {
            ItemStack::default()
        } else {
            ItemStack::new(other.name, left)
        }
    }

    /// Split off up to `count` items into a new stack.
    pub fn take_item(&mut self, count: u32) -> ItemStack {
        let taken = min(count, self.count);
        self.count -= taken;
        let out = ItemStack::new(self.name.clone(), taken);
        if self.count == 0 {
            self.clear();
        }
        out
    }
}


// ==== collaborator traits ====


/// Item metadata queries.
pub trait ItemDefs {
    /// Largest stack of the named item a single slot holds.
    fn max_count(&self, item_name: &str) -> u32;

    /// Human-readable description, used for item tooltips.
    fn description(&self, item_name: &str) -> String {
        item_name.to_owned()
    }
}

/// Item defs with one uniform stack limit. Enough for tests and simple hosts.
#[derive(Debug, Copy, Clone)]
pub struct UniformItemDefs(pub u32);

impl ItemDefs for UniformItemDefs {
    fn max_count(&self, _item_name: &str) -> u32 {
        self.0
    }
}

/// Read access to the set of inventories the dialog may display.
pub trait InventoryStore {
    fn inventory(&self, location: &InventoryLocation) -> Option<&dyn InventoryView>;
}

/// Read access to one inventory's lists.
pub trait InventoryView {
    fn list(&self, name: &str) -> Option<&dyn ListView>;
}

/// Read access to one inventory list.
pub trait ListView {
    fn size(&self) -> usize;

    /// Stack at the index. Out-of-range reads are empty, not errors.
    fn item(&self, index: usize) -> ItemStack;
}


// ==== actions ====


/// Externally-visible effects of the interaction machine, fire-and-forget.
#[derive(Debug, Clone, PartialEq)]
pub enum InventoryAction {
    Move {
        count: u32,
        from: SlotRef,
        to: SlotRef,
    },
    /// Move letting the destination list choose placement, used by
    /// shift-click ring transfers.
    MoveSomewhere {
        count: u32,
        from: SlotRef,
        to_location: InventoryLocation,
        to_list: String,
    },
    Drop {
        count: u32,
        from: SlotRef,
    },
    Craft {
        count: u32,
        craft_location: InventoryLocation,
    },
}

/// Where actions go. No result is observed by the dialog core.
pub trait ActionSink {
    fn send_action(&self, action: InventoryAction);
}


// ==== in-memory implementation ====


/// One concrete inventory list.
#[derive(Debug, Clone, Default)]
pub struct InventoryList {
    items: Vec<ItemStack>,
}

impl InventoryList {
    pub fn with_size(size: usize) -> Self {
        InventoryList { items: vec![ItemStack::default(); size] }
    }

    pub fn set_item(&mut self, index: usize, stack: ItemStack) {
        if index < self.items.len() {
            self.items[index] = stack;
        }
    }

    pub fn item_mut(&mut self, index: usize) -> Option<&mut ItemStack> {
        self.items.get_mut(index)
    }

    /// Merge a stack into the first compatible slots, returning what did not fit.
    pub fn add_item_somewhere(&mut self, stack: ItemStack, defs: &dyn ItemDefs) -> ItemStack {
        let mut rest = stack;
        // fill partial stacks of the same item first, then empties
        for pass in 0..2 {
            for slot in &mut self.items {
                if rest.is_empty() {
                    return ItemStack::default();
                }
                let target = if pass == 0 { !slot.is_empty() } else { slot.is_empty() };
                if target {
                    rest = slot.add_item(rest, defs);
                }
            }
        }
        rest
    }
}

impl ListView for InventoryList {
    fn size(&self) -> usize {
        self.items.len()
    }

    fn item(&self, index: usize) -> ItemStack {
        self.items.get(index).cloned().unwrap_or_default()
    }
}

/// One concrete inventory: named lists in creation order.
#[derive(Debug, Clone, Default)]
pub struct Inventory {
    lists: Vec<(String, InventoryList)>,
}

impl Inventory {
    pub fn add_list(&mut self, name: impl Into<String>, size: usize) -> &mut InventoryList {
        self.lists.push((name.into(), InventoryList::with_size(size)));
        &mut self.lists.last_mut().unwrap().1
    }

    pub fn list_mut(&mut self, name: &str) -> Option<&mut InventoryList> {
        self.lists.iter_mut()
            .find(|(n, _)| n == name)
            .map(|(_, l)| l)
    }
}

impl InventoryView for Inventory {
    fn list(&self, name: &str) -> Option<&dyn ListView> {
        self.lists.iter()
            .find(|(n, _)| n == name)
            .map(|(_, l)| l as &dyn ListView)
    }
}

/// In-memory store of inventories, a client-side mirror of remote state.
#[derive(Debug, Clone, Default)]
pub struct LocalInventory {
    inventories: HashMap<InventoryLocation, Inventory>,
}

impl LocalInventory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inventory_mut(&mut self, location: &InventoryLocation) -> &mut Inventory {
        self.inventories.entry(location.clone()).or_default()
    }

    fn get_item(&self, slot: &SlotRef) -> ItemStack {
        self.inventories.get(&slot.location)
            .and_then(|inv| inv.lists.iter().find(|(n, _)| *n == slot.list))
            .map(|(_, l)| l.item(slot.index))
            .unwrap_or_default()
    }

    fn set_item(&mut self, slot: &SlotRef, stack: ItemStack) {
        if let Some(list) = self.inventories.get_mut(&slot.location)
            .and_then(|inv| inv.list_mut(&slot.list))
        {
            list.set_item(slot.index, stack);
        }
    }

    /// Apply an action as the authority would: merge what fits, swap whole
    /// stacks that cannot merge at all, drop by discarding.
    pub fn apply(&mut self, action: &InventoryAction, defs: &dyn ItemDefs) {
        match action {
            &InventoryAction::Move { count, ref from, ref to } => {
                let mut stack_from = self.get_item(from);
                let moving = stack_from.take_item(count);
                if moving.is_empty() {
                    return;
                }
                let mut stack_to = self.get_item(to);
                let leftover = stack_to.add_item(moving.clone(), defs);
                if leftover.count == moving.count && leftover.name == moving.name {
                    // nothing merged: swap, but only full-stack moves may swap
                    if stack_from.is_empty() {
                        self.set_item(from, stack_to);
                        self.set_item(to, moving);
                    }
                    return;
                }
                // only the amount that actually merged leaves the source
                stack_from = self.get_item(from);
                stack_from.take_item(moving.count - leftover.count);
                self.set_item(from, stack_from);
                self.set_item(to, stack_to);
            }
            &InventoryAction::MoveSomewhere { count, ref from, ref to_location, ref to_list } => {
                let mut stack_from = self.get_item(from);
                let moving = stack_from.take_item(count);
                if moving.is_empty() {
                    return;
                }
                let leftover = self.inventories.get_mut(to_location)
                    .and_then(|inv| inv.list_mut(to_list))
                    .map(|list| list.add_item_somewhere(moving.clone(), defs))
                    .unwrap_or(moving);
                if !leftover.is_empty() {
                    stack_from.add_item(leftover, defs);
                }
                self.set_item(from, stack_from);
            }
            &InventoryAction::Drop { count, ref from } => {
                let mut stack_from = self.get_item(from);
                stack_from.take_item(count);
                self.set_item(from, stack_from);
            }
            &InventoryAction::Craft { .. } => {}
        }
    }
}

impl InventoryStore for LocalInventory {
    fn inventory(&self, location: &InventoryLocation) -> Option<&dyn InventoryView> {
        self.inventories.get(location).map(|inv| inv as &dyn InventoryView)
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn location_round_trip() {
        for s in ["current_player", "player:singleplayer", "nodemeta:1,-2,3", "detached:chest"] {
            assert_eq!(InventoryLocation::deserialize(s).to_string(), s);
        }
        assert_eq!(
            InventoryLocation::deserialize("garbage"),
            InventoryLocation::Undefined,
        );
    }

    #[test]
    fn add_item_merges_to_limit() {
        let defs = UniformItemDefs(99);
        let mut a = ItemStack::new("dirt", 90);
        let left = a.add_item(ItemStack::new("dirt", 20), &defs);
        assert_eq!(a.count, 99);
        assert_eq!(left, ItemStack::new("dirt", 11));
    }

    #[test]
    fn add_item_rejects_other_kind() {
        let defs = UniformItemDefs(99);
        let mut a = ItemStack::new("dirt", 5);
        let left = a.add_item(ItemStack::new("stone", 3), &defs);
        assert_eq!(a.count, 5);
        assert_eq!(left, ItemStack::new("stone", 3));
    }

    #[test]
    fn add_item_fills_empty() {
        let defs = UniformItemDefs(99);
        let mut a = ItemStack::default();
        let left = a.add_item(ItemStack::new("stone", 3), &defs);
        assert!(left.is_empty());
        assert_eq!(a, ItemStack::new("stone", 3));
    }

    #[test]
    fn take_item_clears_at_zero() {
        let mut a = ItemStack::new("dirt", 2);
        let taken = a.take_item(5);
        assert_eq!(taken.count, 2);
        assert!(a.is_empty());
    }

    #[test]
    fn local_apply_swaps_incompatible() {
        let defs = UniformItemDefs(99);
        let mut store = LocalInventory::new();
        let loc = InventoryLocation::CurrentPlayer;
        let inv = store.inventory_mut(&loc);
        let list = inv.add_list("main", 2);
        list.set_item(0, ItemStack::new("dirt", 4));
        list.set_item(1, ItemStack::new("stone", 7));
        let from = SlotRef { location: loc.clone(), list: "main".to_owned(), index: 0 };
        let to = SlotRef { location: loc.clone(), list: "main".to_owned(), index: 1 };
        store.apply(&InventoryAction::Move { count: 4, from: from.clone(), to: to.clone() }, &defs);
        assert_eq!(store.get_item(&from), ItemStack::new("stone", 7));
        assert_eq!(store.get_item(&to), ItemStack::new("dirt", 4));
    }
}
