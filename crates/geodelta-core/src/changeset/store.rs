use crate::changeset::item::{ChangeAction, ChangeItem, ChangeKey};
use crate::model::ItemType;
use std::collections::BTreeMap;

/// Indexed collection of change items, keyed by (identifier, type, action).
///
/// The same identifier and type may appear once per action. Well-formed
/// input has at most one action per entity, but several are accepted and
/// kept side by side; the change applier resolves them (delete wins).
///
/// The store is additive: there is no removal or retention by predicate.
/// Equality and hashing cover version, description and every item.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ChangeSetStore {
    version: String,
    description: String,
    items: BTreeMap<ChangeKey, ChangeItem>,
}

impl ChangeSetStore {
    pub fn new(version: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            description: description.into(),
            items: BTreeMap::new(),
        }
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Insert an item. An item with the same key is replaced and returned.
    pub fn add(&mut self, item: impl Into<ChangeItem>) -> Option<ChangeItem> {
        let item = item.into();
        self.items.insert(item.key(), item)
    }

    pub fn add_all<I>(&mut self, items: I)
    where
        I: IntoIterator,
        I::Item: Into<ChangeItem>,
    {
        for item in items {
            self.add(item);
        }
    }

    /// Item for (identifier, type) under any action.
    ///
    /// When several actions coexist the first in declaration order wins
    /// (create, update, delete, read).
    pub fn get(&self, identifier: i64, item_type: ItemType) -> Option<&ChangeItem> {
        ChangeAction::ALL
            .iter()
            .find_map(|action| self.get_with_action(identifier, item_type, *action))
    }

    pub fn get_with_action(
        &self,
        identifier: i64,
        item_type: ItemType,
        action: ChangeAction,
    ) -> Option<&ChangeItem> {
        self.items
            .get(&ChangeKey::new(identifier, item_type, action))
    }

    pub fn contains(&self, identifier: i64, item_type: ItemType) -> bool {
        self.get(identifier, item_type).is_some()
    }

    pub fn contains_with_action(
        &self,
        identifier: i64,
        item_type: ItemType,
        action: ChangeAction,
    ) -> bool {
        self.get_with_action(identifier, item_type, action).is_some()
    }

    /// All items, ascending by (identifier, type, action)
    pub fn iter(&self) -> impl Iterator<Item = &ChangeItem> + '_ {
        self.items.values()
    }

    /// Items matching `item_type` and `action`; `None` matches anything
    pub fn iter_filtered(
        &self,
        item_type: Option<ItemType>,
        action: Option<ChangeAction>,
    ) -> impl Iterator<Item = &ChangeItem> + '_ {
        self.items.iter().filter_map(move |(key, item)| {
            let type_ok = item_type.map_or(true, |t| t == key.item_type);
            let action_ok = action.map_or(true, |a| a == key.action);
            (type_ok && action_ok).then_some(item)
        })
    }

    /// New store with the same version and description, holding only the
    /// matching items
    pub fn sub_set(&self, item_type: Option<ItemType>, action: Option<ChangeAction>) -> Self {
        Self {
            version: self.version.clone(),
            description: self.description.clone(),
            items: self
                .iter_filtered(item_type, action)
                .map(|item| (item.key(), item.clone()))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<'s> IntoIterator for &'s ChangeSetStore {
    type Item = &'s ChangeItem;
    type IntoIter = std::collections::btree_map::Values<'s, ChangeKey, ChangeItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.values()
    }
}

impl Extend<ChangeItem> for ChangeSetStore {
    fn extend<T: IntoIterator<Item = ChangeItem>>(&mut self, iter: T) {
        self.add_all(iter);
    }
}
