use std::collections::{HashMap, HashSet};

/// Identifier of an orderable item (a player on the roster page, a drill on the drills page)
pub type ItemId = String;

/// Explicit user-chosen order over a subset of a listing
///
/// Every selected item carries a raw order input, the text a user typed or the
/// value the list assigned when the item was selected. The definitive order is
/// derived from those inputs, with the listing position as tie-break.
#[derive(Debug, Clone, Default)]
pub struct OrderingList {
    listing: Vec<ItemId>,
    positions: HashMap<ItemId, usize>,
    selected: Vec<ItemId>,
    inputs: HashMap<ItemId, String>,
}

/// Parses an order input the way a lenient number field does: leading
/// whitespace and an optional sign, then as many digits as there are
/// ("12th" -> 12, "" -> None, "x1" -> None)
pub fn parse_order(raw: &str) -> Option<i64> {
    let trimmed = raw.trim_start();
    let (sign, rest) = match trimmed.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };
    let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    digits.parse::<i64>().ok().map(|v| sign * v)
}

impl OrderingList {
    /// Creates an empty selection over the given listing (natural order)
    pub fn new<I, S>(listing: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<ItemId>,
    {
        let mut list = OrderingList::default();
        for item in listing {
            let item = item.into();
            if list.positions.contains_key(&item) {
                continue;
            }
            list.positions.insert(item.clone(), list.listing.len());
            list.listing.push(item);
        }
        list
    }

    pub fn listing(&self) -> &[ItemId] {
        &self.listing
    }

    pub fn is_listed(&self, item: &str) -> bool {
        self.positions.contains_key(item)
    }

    pub fn contains(&self, item: &str) -> bool {
        self.selected.iter().any(|i| i == item)
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    /// Raw order input of an item, if any
    pub fn order_input(&self, item: &str) -> Option<&str> {
        self.inputs.get(item).map(String::as_str)
    }

    /// Parsed order value of an item
    pub fn order_of(&self, item: &str) -> Option<i64> {
        self.inputs.get(item).and_then(|raw| parse_order(raw))
    }

    /// One greater than the highest valid order value, or 1 when there is none
    /// Saturates at `i64::MAX`; ties then fall back to listing position
    pub fn next_order_value(&self) -> i64 {
        self.selected
            .iter()
            .filter_map(|item| self.order_of(item))
            .max()
            .map(|max| max.saturating_add(1))
            .unwrap_or(1)
    }

    /// Adds the item at the end of the order or removes it and closes the gap
    /// Returns whether the item is selected afterwards
    pub fn toggle(&mut self, item: &str) -> bool {
        if !self.is_listed(item) {
            log::debug!("ignoring toggle of unlisted item {}", item);
            return false;
        }
        if self.contains(item) {
            self.remove(item);
            false
        } else {
            self.add(item);
            true
        }
    }

    /// Selects an item, appending it with the next order value unless it already carries a valid one
    pub fn add(&mut self, item: &str) {
        if !self.is_listed(item) || self.contains(item) {
            return;
        }
        if self.order_of(item).is_none() {
            let next = self.next_order_value();
            self.inputs.insert(item.to_string(), next.to_string());
        }
        self.selected.push(item.to_string());
    }

    /// Deselects an item, clears its input and compacts the rest
    pub fn remove(&mut self, item: &str) {
        if !self.contains(item) {
            return;
        }
        self.selected.retain(|i| i != item);
        self.inputs.remove(item);
        self.normalize();
    }

    /// Records what the user typed into an item's order field
    pub fn set_order_input(&mut self, item: &str, raw: &str) {
        if !self.is_listed(item) {
            return;
        }
        self.inputs.insert(item.to_string(), raw.to_string());
    }

    /// Selected items in definitive order
    /// Primary key: numeric order value, items without one last
    /// Tie-break: listing position
    pub fn sequence(&self) -> Vec<ItemId> {
        let mut items: Vec<(Option<i64>, usize, &ItemId)> = self
            .selected
            .iter()
            .map(|item| {
                let pos = self.positions.get(item).copied().unwrap_or(usize::MAX);
                (self.order_of(item), pos, item)
            })
            .collect();
        items.sort_by(|a, b| {
            let key_a = (a.0.is_none(), a.0.unwrap_or(0), a.1);
            let key_b = (b.0.is_none(), b.0.unwrap_or(0), b.1);
            key_a.cmp(&key_b)
        });
        items.into_iter().map(|(_, _, item)| item.clone()).collect()
    }

    /// Resolves the definitive order and rewrites the inputs as 1..N
    pub fn normalize(&mut self) {
        let sequence = self.sequence();
        for (i, item) in sequence.iter().enumerate() {
            self.inputs.insert(item.clone(), (i + 1).to_string());
        }
        self.selected = sequence;
    }

    /// Ordered item ids for form submission
    pub fn serialize(&self) -> Vec<ItemId> {
        self.sequence()
    }

    /// Joined value of the single hidden order field
    pub fn to_field_value(&self) -> String {
        self.serialize().join(",")
    }

    /// Selects the whole listing in its natural order
    pub fn select_all(&mut self) {
        self.inputs.clear();
        self.selected = self.listing.clone();
        for (i, item) in self.listing.iter().enumerate() {
            self.inputs.insert(item.clone(), (i + 1).to_string());
        }
    }

    pub fn deselect_all(&mut self) {
        self.selected.clear();
        self.inputs.clear();
    }

    /// Moves a selected item behind all others
    pub fn move_to_end(&mut self, item: &str) {
        if !self.contains(item) {
            return;
        }
        let others_max = self
            .selected
            .iter()
            .filter(|i| *i != item)
            .filter_map(|i| self.order_of(i))
            .max()
            .unwrap_or(0);
        self.inputs.insert(item.to_string(), others_max.saturating_add(1).to_string());
        self.normalize();
    }

    /// Re-syncs the order with the currently selected set: items no longer
    /// selected are pruned, newly selected ones are appended in listing order
    pub fn sync<'a, I>(&mut self, current: I)
    where
        I: IntoIterator<Item = &'a str>,
    {
        let current: HashSet<&str> = current.into_iter().collect();

        let pruned: Vec<ItemId> = self
            .selected
            .iter()
            .filter(|item| !current.contains(item.as_str()))
            .cloned()
            .collect();
        for item in &pruned {
            self.selected.retain(|i| i != item);
            self.inputs.remove(item);
        }

        let listing = self.listing.clone();
        for item in listing.iter().filter(|i| current.contains(i.as_str())) {
            if !self.contains(item) {
                self.inputs.remove(item);
                self.add(item);
            }
        }
        self.normalize();
    }

    /// Gives every selected item without a valid number the next value, then compacts
    pub fn prepare_submit(&mut self) {
        let missing: Vec<ItemId> = self
            .selected
            .iter()
            .filter(|item| self.order_of(item).is_none())
            .cloned()
            .collect();
        for item in missing {
            let next = self.next_order_value();
            self.inputs.insert(item, next.to_string());
        }
        self.normalize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn abc() -> OrderingList {
        let mut list = OrderingList::new(["a", "b", "c"]);
        list.add("a");
        list.add("b");
        list.add("c");
        list
    }

    #[test]
    fn parse_order_is_lenient() {
        assert_eq!(parse_order("3"), Some(3));
        assert_eq!(parse_order("  12th"), Some(12));
        assert_eq!(parse_order("-2"), Some(-2));
        assert_eq!(parse_order(""), None);
        assert_eq!(parse_order("abc"), None);
    }

    #[test]
    fn normalize_sorts_invalid_last_and_breaks_ties_by_listing() {
        let mut list = abc();
        list.set_order_input("a", "3");
        list.set_order_input("b", "");
        list.set_order_input("c", "1");
        list.normalize();

        assert_eq!(list.serialize(), vec!["c", "a", "b"]);
        assert_eq!(list.order_input("c"), Some("1"));
        assert_eq!(list.order_input("a"), Some("2"));
        assert_eq!(list.order_input("b"), Some("3"));
    }

    #[test]
    fn duplicate_values_keep_listing_order() {
        let mut list = abc();
        list.set_order_input("a", "2");
        list.set_order_input("b", "1");
        list.set_order_input("c", "1");
        list.normalize();
        assert_eq!(list.serialize(), vec!["b", "c", "a"]);
    }

    #[test]
    fn toggle_appends_with_next_value_and_closes_gaps() {
        let mut list = OrderingList::new(["a", "b", "c", "d"]);
        assert!(list.toggle("c"));
        assert!(list.toggle("a"));
        assert!(list.toggle("d"));
        assert_eq!(list.serialize(), vec!["c", "a", "d"]);
        assert_eq!(list.order_input("d"), Some("3"));

        assert!(!list.toggle("a"));
        assert_eq!(list.serialize(), vec!["c", "d"]);
        assert_eq!(list.order_input("d"), Some("2"));
        assert_eq!(list.order_input("a"), None);
    }

    #[test]
    fn first_item_gets_order_one() {
        let mut list = OrderingList::new(["a"]);
        assert_eq!(list.next_order_value(), 1);
        list.toggle("a");
        assert_eq!(list.order_input("a"), Some("1"));
    }

    #[test]
    fn unlisted_items_are_ignored() {
        let mut list = OrderingList::new(["a"]);
        assert!(!list.toggle("zzz"));
        assert!(list.is_empty());
    }

    #[test]
    fn select_all_uses_listing_order_and_deselect_all_empties() {
        let mut list = OrderingList::new(["x", "y", "z"]);
        list.toggle("z");
        list.select_all();
        assert_eq!(list.to_field_value(), "x,y,z");
        list.deselect_all();
        assert!(list.is_empty());
        assert_eq!(list.to_field_value(), "");
    }

    #[test]
    fn sync_prunes_and_appends() {
        let mut list = OrderingList::new(["a", "b", "c", "d"]);
        list.toggle("b");
        list.toggle("a");
        list.sync(["a", "d", "c"]);
        assert_eq!(list.serialize(), vec!["a", "c", "d"]);
        assert_eq!(list.order_input("a"), Some("1"));
        assert!(!list.contains("b"));
    }

    #[test]
    fn move_to_end_reorders() {
        let mut list = abc();
        list.move_to_end("a");
        assert_eq!(list.serialize(), vec!["b", "c", "a"]);
        assert_eq!(list.order_input("a"), Some("3"));
    }

    #[test]
    fn prepare_submit_fills_missing_orders() {
        let mut list = abc();
        list.set_order_input("a", "");
        list.set_order_input("b", "5");
        list.set_order_input("c", "oops");
        list.prepare_submit();
        assert_eq!(list.serialize(), vec!["b", "a", "c"]);
        assert_eq!(list.order_input("c"), Some("3"));
    }

    #[test]
    fn huge_order_values_do_not_overflow() {
        let mut list = OrderingList::new(["a", "b", "c"]);
        list.add("a");
        list.set_order_input("a", "9223372036854775807");
        list.add("b");
        assert_eq!(list.order_input("b"), Some("9223372036854775807"));
        assert_eq!(list.serialize(), vec!["a", "b"]);

        list.add("c");
        list.set_order_input("c", "");
        list.prepare_submit();
        assert_eq!(list.serialize(), vec!["a", "b", "c"]);

        list.set_order_input("b", "9223372036854775807");
        list.move_to_end("c");
        assert_eq!(list.serialize(), vec!["a", "b", "c"]);
        assert_eq!(list.order_input("c"), Some("3"));
    }
}
