use clickdeck_types::{ItemId, LauncherItem};
use std::collections::HashSet;

/// Ids of the selected items, kept in lockstep with each item's
/// `is_selected` flag.
///
/// Every mutation goes through this type with the owning item slice, so the
/// flag and the set cannot drift apart.
#[derive(Debug, Clone, Default)]
pub struct SelectionSet {
    ids: HashSet<ItemId>,
}

impl SelectionSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from the flags already set on `items`.
    #[must_use]
    pub fn from_items(items: &[LauncherItem]) -> Self {
        Self {
            ids: items
                .iter()
                .filter(|item| item.is_selected)
                .map(|item| item.id)
                .collect(),
        }
    }

    /// Flip the selection of `id`. Returns the new state, or `None` if the
    /// item is not in `items`.
    pub fn toggle(&mut self, items: &mut [LauncherItem], id: ItemId) -> Option<bool> {
        let item = items.iter_mut().find(|item| item.id == id)?;
        item.is_selected = !item.is_selected;
        if item.is_selected {
            self.ids.insert(id);
        } else {
            self.ids.remove(&id);
        }
        Some(item.is_selected)
    }

    /// Select `id` and nothing else.
    pub fn select_only(&mut self, items: &mut [LauncherItem], id: ItemId) {
        self.ids.clear();
        for item in items.iter_mut() {
            item.is_selected = item.id == id;
            if item.is_selected {
                self.ids.insert(item.id);
            }
        }
    }

    pub fn select_all(&mut self, items: &mut [LauncherItem]) {
        for item in items.iter_mut() {
            item.is_selected = true;
            self.ids.insert(item.id);
        }
    }

    /// Clear the selection, optionally sparing one item.
    pub fn deselect_all(&mut self, items: &mut [LauncherItem], except: Option<ItemId>) {
        self.ids.clear();
        for item in items.iter_mut() {
            item.is_selected = Some(item.id) == except && item.is_selected;
            if item.is_selected {
                self.ids.insert(item.id);
            }
        }
    }

    /// Forget ids that no longer exist in `items`.
    pub fn retain_existing(&mut self, items: &[LauncherItem]) {
        let live: HashSet<ItemId> = items.iter().map(|item| item.id).collect();
        self.ids.retain(|id| live.contains(id));
    }

    #[must_use]
    pub fn contains(&self, id: ItemId) -> bool {
        self.ids.contains(&id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = ItemId> + '_ {
        self.ids.iter().copied()
    }

    /// True when the set and the item flags agree.
    #[must_use]
    pub fn is_consistent_with(&self, items: &[LauncherItem]) -> bool {
        let flagged = items.iter().filter(|item| item.is_selected).count();
        flagged == self.ids.len()
            && items
                .iter()
                .all(|item| item.is_selected == self.ids.contains(&item.id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn items(n: usize) -> Vec<LauncherItem> {
        (0..n)
            .map(|i| LauncherItem::new(format!("Item {i}"), format!("item{i}.exe")))
            .collect()
    }

    #[test]
    fn test_toggle_adds_and_removes() {
        let mut items = items(3);
        let mut sel = SelectionSet::new();
        let id = items[1].id;

        assert_eq!(sel.toggle(&mut items, id), Some(true));
        assert!(items[1].is_selected);
        assert!(sel.contains(id));

        assert_eq!(sel.toggle(&mut items, id), Some(false));
        assert!(!items[1].is_selected);
        assert!(sel.is_empty());
        assert!(sel.is_consistent_with(&items));
    }

    #[test]
    fn test_toggle_unknown_id() {
        let mut items = items(2);
        let mut sel = SelectionSet::new();
        assert_eq!(sel.toggle(&mut items, ItemId::new()), None);
        assert!(sel.is_empty());
    }

    #[test]
    fn test_select_only_clears_others() {
        let mut items = items(3);
        let mut sel = SelectionSet::new();
        sel.select_all(&mut items);

        let third = items[2].id;
        sel.select_only(&mut items, third);
        assert_eq!(sel.len(), 1);
        assert!(items[2].is_selected);
        assert!(!items[0].is_selected && !items[1].is_selected);
        assert!(sel.is_consistent_with(&items));
    }

    #[test]
    fn test_deselect_all_with_exception() {
        let mut items = items(3);
        let mut sel = SelectionSet::new();
        sel.select_all(&mut items);
        let keep = items[0].id;

        sel.deselect_all(&mut items, Some(keep));
        assert_eq!(sel.ids().collect::<Vec<_>>(), vec![keep]);
        assert!(sel.is_consistent_with(&items));

        sel.deselect_all(&mut items, None);
        assert!(sel.is_empty());
        assert!(items.iter().all(|item| !item.is_selected));
    }

    #[test]
    fn test_deselect_all_exception_must_already_be_selected() {
        let mut items = items(2);
        let mut sel = SelectionSet::new();
        let first = items[0].id;
        sel.deselect_all(&mut items, Some(first));
        assert!(sel.is_empty());
        assert!(!items[0].is_selected);
    }

    #[test]
    fn test_retain_existing_drops_removed_ids() {
        let mut items = items(3);
        let mut sel = SelectionSet::new();
        sel.select_all(&mut items);

        items.remove(0);
        sel.retain_existing(&items);
        assert_eq!(sel.len(), 2);
        assert!(sel.is_consistent_with(&items));
    }

    #[test]
    fn test_from_items_reads_flags() {
        let mut items = items(3);
        items[1].is_selected = true;
        let sel = SelectionSet::from_items(&items);
        assert!(sel.contains(items[1].id));
        assert_eq!(sel.len(), 1);
    }
}
