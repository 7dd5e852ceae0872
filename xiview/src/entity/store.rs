use std::collections::{BTreeSet, HashMap};

use crate::entity::{
    CrossLink, CrossLinkIndex, Match, MatchIndex, MetaValue, Protein, ProteinIndex,
};

/// Owns all matches, cross-links, and proteins of a session together with their back references.
/// Built with [`EntityStoreBuilder`](crate::entity::EntityStoreBuilder).
#[derive(Clone, Debug, Default)]
pub struct EntityStore {
    pub(crate) proteins: Vec<Protein>,
    pub(crate) matches: Vec<Match>,
    pub(crate) crosslinks: Vec<CrossLink>,
    pub(crate) protein_lookup: HashMap<String, ProteinIndex>,
    pub(crate) match_lookup: HashMap<String, MatchIndex>,
    pub(crate) crosslink_lookup: HashMap<String, CrossLinkIndex>,
    pub(crate) search_groups: HashMap<String, String>,
}

impl EntityStore {
    /// All proteins
    pub fn proteins(&self) -> impl ExactSizeIterator<Item = (ProteinIndex, &Protein)> {
        self.proteins
            .iter()
            .enumerate()
            .map(|(i, p)| (ProteinIndex(i), p))
    }

    /// All matches
    pub fn matches(&self) -> impl ExactSizeIterator<Item = (MatchIndex, &Match)> {
        self.matches
            .iter()
            .enumerate()
            .map(|(i, m)| (MatchIndex(i), m))
    }

    /// All cross-links, regardless of any filter
    pub fn crosslinks(&self) -> impl ExactSizeIterator<Item = (CrossLinkIndex, &CrossLink)> {
        self.crosslinks
            .iter()
            .enumerate()
            .map(|(i, l)| (CrossLinkIndex(i), l))
    }

    /// All cross-links that are not decoy, not linear, and not mono-links
    pub fn true_positive_crosslinks(&self) -> impl Iterator<Item = (CrossLinkIndex, &CrossLink)> {
        self.crosslinks().filter(|(_, l)| l.is_true_positive())
    }

    /// The number of proteins
    pub fn number_of_proteins(&self) -> usize {
        self.proteins.len()
    }

    /// The number of matches
    pub fn number_of_matches(&self) -> usize {
        self.matches.len()
    }

    /// The number of cross-links
    pub fn number_of_crosslinks(&self) -> usize {
        self.crosslinks.len()
    }

    /// Find a protein by identifier
    pub fn protein_by_id(&self, id: &str) -> Option<ProteinIndex> {
        self.protein_lookup.get(id).copied()
    }

    /// Find a match by identifier
    pub fn match_by_id(&self, id: &str) -> Option<MatchIndex> {
        self.match_lookup.get(id).copied()
    }

    /// Find a cross-link by identifier
    pub fn crosslink_by_id(&self, id: &str) -> Option<CrossLinkIndex> {
        self.crosslink_lookup.get(id).copied()
    }

    /// The group a search belongs to, a search without explicit group forms its own group
    pub fn group_of<'a>(&'a self, search_id: &'a str) -> &'a str {
        self.search_groups
            .get(search_id)
            .map_or(search_id, String::as_str)
    }

    /// Put a search in a group
    pub fn set_search_group(&mut self, search_id: impl Into<String>, group: impl Into<String>) {
        self.search_groups.insert(search_id.into(), group.into());
    }

    /// All distinct groups over all matches, sorted
    pub fn groups(&self) -> BTreeSet<&str> {
        self.matches
            .iter()
            .map(|m| self.group_of(&m.search_id))
            .collect()
    }

    /// If any end of the link lies on a manually hidden protein
    pub fn is_link_hidden(&self, link: &CrossLink) -> bool {
        link.proteins().any(|p| self[p].manually_hidden)
    }

    /// Set the manually hidden flag of a protein, returns if anything changed
    pub fn set_manually_hidden(&mut self, protein: ProteinIndex, hidden: bool) -> bool {
        let p = &mut self.proteins[protein.0];
        let changed = p.manually_hidden != hidden;
        p.manually_hidden = hidden;
        changed
    }

    /// Unhide all manually hidden proteins, returns if anything changed
    pub fn show_all_hidden(&mut self) -> bool {
        let mut changed = false;
        for protein in &mut self.proteins {
            changed |= protein.manually_hidden;
            protein.manually_hidden = false;
        }
        changed
    }

    /// Set a metadata field of a cross-link, returns the previous value of that field
    pub fn set_link_meta(
        &mut self,
        link: CrossLinkIndex,
        field: impl Into<String>,
        value: impl Into<MetaValue>,
    ) -> Option<MetaValue> {
        self.crosslinks[link.0]
            .metadata
            .insert(field.into(), value.into())
    }

    /// The minimal and maximal value of an attribute over all cross-links, regardless of any filter.
    /// The accessor can give any number of values per link (use an `Option` for single valued
    /// attributes), the extents per link are combined into the overall extent. `NaN`s are ignored.
    pub fn attribute_range<I: IntoIterator<Item = f64>>(
        &self,
        accessor: impl Fn(&CrossLink) -> I,
    ) -> Option<(f64, f64)> {
        combine_extents(self.crosslinks.iter().filter_map(|l| extent(accessor(l))))
    }

    /// The minimal and maximal score over all matches
    pub fn match_score_extent(&self) -> Option<(f64, f64)> {
        extent(self.matches.iter().filter_map(|m| m.score))
    }
}

/// The minimal and maximal value, ignoring `NaN`s
pub(crate) fn extent(values: impl IntoIterator<Item = f64>) -> Option<(f64, f64)> {
    values
        .into_iter()
        .filter(|v| !v.is_nan())
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((min, max)) => Some((min.min(v), max.max(v))),
        })
}

pub(crate) fn combine_extents(
    extents: impl IntoIterator<Item = (f64, f64)>,
) -> Option<(f64, f64)> {
    extents.into_iter().fold(None, |acc, (min, max)| match acc {
        None => Some((min, max)),
        Some((a, b)) => Some((a.min(min), b.max(max))),
    })
}

impl std::ops::Index<ProteinIndex> for EntityStore {
    type Output = Protein;
    fn index(&self, index: ProteinIndex) -> &Self::Output {
        &self.proteins[index.0]
    }
}

impl std::ops::Index<MatchIndex> for EntityStore {
    type Output = Match;
    fn index(&self, index: MatchIndex) -> &Self::Output {
        &self.matches[index.0]
    }
}

impl std::ops::Index<CrossLinkIndex> for EntityStore {
    type Output = CrossLink;
    fn index(&self, index: CrossLinkIndex) -> &Self::Output {
        &self.crosslinks[index.0]
    }
}

#[cfg(test)]
#[allow(clippy::missing_panics_doc, clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn extents() {
        assert_eq!(extent([3.0, f64::NAN, -1.0, 2.0]), Some((-1.0, 3.0)));
        assert_eq!(extent([]), None);
        assert_eq!(
            combine_extents([(1.0, 2.0), (-4.0, 0.0), (1.5, 9.0)]),
            Some((-4.0, 9.0))
        );
    }
}
