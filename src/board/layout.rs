use std::collections::HashMap;

use super::types::{CapabilityTag, Slot, SlotId};

/// Default number of lines on the lines page
pub const DEFAULT_LINES: u8 = 4;

/// Forward positions of a line, in display order
const FORWARD_POSITIONS: [&str; 3] = ["LW", "C", "RW"];
/// Defense positions of a pair, in display order
const DEFENSE_POSITIONS: [&str; 2] = ["LD", "RD"];
/// Goalie slots are not part of any line
const GOALIE_SLOTS: [&str; 2] = ["G1", "G2"];

/// Ordered set of slots a board is built over
#[derive(Debug, Clone)]
pub struct Layout {
    slots: Vec<Slot>,
    index: HashMap<SlotId, usize>,
}

impl Layout {
    /// Builds a layout from explicit slots. Later duplicates of a slot id are dropped.
    pub fn new(slots: Vec<Slot>) -> Self {
        let mut unique = Vec::with_capacity(slots.len());
        let mut index = HashMap::new();
        for slot in slots {
            if index.contains_key(&slot.id) {
                log::warn!("duplicate slot id {} in layout, ignoring", slot.id);
                continue;
            }
            index.insert(slot.id.clone(), unique.len());
            unique.push(slot);
        }
        Layout { slots: unique, index }
    }

    /// Lines page layout
    /// Line n = LnLW, LnC, LnRW (forwards) + DnLD, DnRD (defense)
    /// Followed by the goalie slots G1 and G2
    pub fn lines(count: u8) -> Self {
        let mut slots = Vec::new();
        for line in 1..=count {
            let group = line.to_string();
            for pos in FORWARD_POSITIONS {
                slots.push(Slot::new(format!("L{}{}", line, pos), CapabilityTag::F, Some(&group)));
            }
            for pos in DEFENSE_POSITIONS {
                slots.push(Slot::new(format!("D{}{}", line, pos), CapabilityTag::D, Some(&group)));
            }
        }
        for id in GOALIE_SLOTS {
            slots.push(Slot::new(id, CapabilityTag::G, None));
        }
        Layout::new(slots)
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    pub fn slot(&self, id: &str) -> Option<&Slot> {
        self.index.get(id).map(|&i| &self.slots[i])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Position of a slot in layout order
    pub fn position(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    /// Distinct groups in layout order
    pub fn groups(&self) -> Vec<String> {
        let mut groups: Vec<String> = Vec::new();
        for slot in &self.slots {
            if let Some(group) = &slot.group {
                if !groups.contains(group) {
                    groups.push(group.clone());
                }
            }
        }
        groups
    }

    /// Slots belonging to one group, in layout order
    pub fn slots_in_group<'a>(&'a self, group: &'a str) -> impl Iterator<Item = &'a Slot> + 'a {
        self.slots
            .iter()
            .filter(move |s| s.group.as_deref() == Some(group))
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

impl Default for Layout {
    fn default() -> Self {
        Layout::lines(DEFAULT_LINES)
    }
}
