//! Change sets: typed, actioned change items and the store that indexes them.

pub mod document;
pub mod item;
pub mod store;

pub use document::{ChangeRecord, ChangeSetDocument};
pub use item::{ChangeAction, ChangeItem, ChangeKey, RelationChange, Score, SimpleChange};
pub use store::ChangeSetStore;
