use indexmap::IndexSet;

use crate::{
    entity::{CrossLinkIndex, MatchIndex},
    marking::MarkType,
};

/// The marked matches and cross-links for one mark type, both in the order they were marked
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct MarkedSet {
    pub(crate) matches: IndexSet<MatchIndex>,
    pub(crate) crosslinks: IndexSet<CrossLinkIndex>,
}

impl MarkedSet {
    /// The marked matches
    pub const fn matches(&self) -> &IndexSet<MatchIndex> {
        &self.matches
    }

    /// The marked cross-links
    pub const fn crosslinks(&self) -> &IndexSet<CrossLinkIndex> {
        &self.crosslinks
    }

    /// If nothing is marked
    pub fn is_empty(&self) -> bool {
        self.matches.is_empty() && self.crosslinks.is_empty()
    }
}

/// Combine the current marks with new items. Replacing drops the current marks, adding keeps them,
/// and adding to a selection toggles every item that was already present.
pub(crate) fn merge<T: Copy + Eq + std::hash::Hash>(
    current: &IndexSet<T>,
    items: impl IntoIterator<Item = T>,
    mark_type: MarkType,
    add: bool,
) -> IndexSet<T> {
    let items: IndexSet<T> = items.into_iter().collect();
    match (add, mark_type) {
        (false, _) => items,
        (true, MarkType::Selection) => {
            let mut merged: IndexSet<T> = current
                .iter()
                .filter(|i| !items.contains(*i))
                .copied()
                .collect();
            merged.extend(items.into_iter().filter(|i| !current.contains(i)));
            merged
        }
        (true, MarkType::Highlight) => {
            let mut merged = current.clone();
            merged.extend(items);
            merged
        }
    }
}
