use indexmap::IndexSet;
use itertools::Itertools;

use crate::{
    entity::{CrossLinkIndex, EntityStore, MatchIndex},
    filter::FilterResult,
    marking::{MarkChange, MarkType, MarkedSet, merge},
};

/// The selection and highlight marks, keeping the marked matches and cross-links of each mark type
/// consistent with each other.
///
/// Marking matches marks the cross-links they support, marking cross-links marks their currently
/// filtered matches. Propagation goes one step in each direction and never bounces back.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Marking {
    selection: MarkedSet,
    highlight: MarkedSet,
}

impl Marking {
    /// The marks of the given type
    pub const fn get(&self, mark_type: MarkType) -> &MarkedSet {
        match mark_type {
            MarkType::Selection => &self.selection,
            MarkType::Highlight => &self.highlight,
        }
    }

    fn get_mut(&mut self, mark_type: MarkType) -> &mut MarkedSet {
        match mark_type {
            MarkType::Selection => &mut self.selection,
            MarkType::Highlight => &mut self.highlight,
        }
    }

    /// Mark matches, and unless suppressed also the cross-links they support.
    #[expect(clippy::too_many_arguments)]
    pub fn set_marked_matches(
        &mut self,
        store: &EntityStore,
        filter: &FilterResult,
        mark_type: MarkType,
        matches: impl IntoIterator<Item = MatchIndex>,
        include_alternatives: bool,
        add: bool,
        suppress_propagation: bool,
    ) -> MarkChange {
        let marked = merge(&self.get(mark_type).matches, matches, mark_type, add);
        let mut change = MarkChange::default();
        if !suppress_propagation {
            let crosslinks = marked
                .iter()
                .flat_map(|m| store[*m].crosslinks().iter().copied())
                .collect_vec();
            change = self.set_marked_crosslinks(
                store,
                filter,
                mark_type,
                crosslinks,
                include_alternatives,
                false,
                true,
            );
        }
        let set = self.get_mut(mark_type);
        change.matches_changed = set.matches != marked;
        set.matches = marked;
        change
    }

    /// Mark cross-links, and unless suppressed also their filtered matches. With alternatives, the
    /// cross-links sharing a filtered match with a marked ambiguous cross-link are marked as well.
    #[expect(clippy::too_many_arguments)]
    pub fn set_marked_crosslinks(
        &mut self,
        store: &EntityStore,
        filter: &FilterResult,
        mark_type: MarkType,
        crosslinks: impl IntoIterator<Item = CrossLinkIndex>,
        include_alternatives: bool,
        add: bool,
        suppress_propagation: bool,
    ) -> MarkChange {
        let mut crosslinks: IndexSet<CrossLinkIndex> = crosslinks.into_iter().collect();
        if include_alternatives {
            let alternatives = crosslinks
                .iter()
                .filter(|link| filter.is_ambiguous(**link))
                .flat_map(|link| filter.filtered_matches(*link))
                .flat_map(|m| store[m.match_index].crosslinks().iter().copied())
                .collect_vec();
            crosslinks.extend(alternatives);
        }

        let marked = merge(&self.get(mark_type).crosslinks, crosslinks, mark_type, add);
        let mut change = MarkChange::default();
        if !suppress_propagation {
            let matches = marked
                .iter()
                .flat_map(|link| filter.filtered_matches(*link))
                .map(|m| m.match_index)
                .collect_vec();
            change = self.set_marked_matches(store, filter, mark_type, matches, false, false, true);
        }
        let set = self.get_mut(mark_type);
        change.crosslinks_changed = set.crosslinks != marked;
        set.crosslinks = marked;
        change
    }

    /// Remove all marks of the given type
    pub fn clear(&mut self, mark_type: MarkType) -> MarkChange {
        let set = self.get_mut(mark_type);
        let change = MarkChange {
            matches_changed: !set.matches.is_empty(),
            crosslinks_changed: !set.crosslinks.is_empty(),
        };
        *set = MarkedSet::default();
        change
    }
}

#[cfg(test)]
#[expect(clippy::missing_panics_doc)]
mod tests {
    use super::*;
    use crate::{
        criteria::FilterCriteria,
        distance::NoDistances,
        entity::{EntityStoreBuilder, MatchRecord, PeptideRecord, Protein},
        filter::FilterEvaluator,
    };

    fn setup() -> (EntityStore, FilterResult) {
        let store = EntityStoreBuilder::new()
            .protein(Protein::new("P1", "Alpha"))
            .protein(Protein::new("P2", "Beta"))
            .match_record(
                MatchRecord::new("unique", "s1", Some(10.0))
                    .peptide(PeptideRecord::new("AKR", "P1", 10, Some(2)))
                    .peptide(PeptideRecord::new("GKL", "P2", 20, Some(2))),
            )
            .match_record(
                MatchRecord::new("shared", "s1", Some(9.0))
                    .peptide(PeptideRecord::new("MKV", "P1", 40, Some(2)).also_on("P2", 70))
                    .peptide(PeptideRecord::new("WKE", "P2", 90, Some(2))),
            )
            .build()
            .unwrap();
        let filter = FilterEvaluator::default().evaluate(
            &store,
            &FilterCriteria::default(),
            None,
            &mut NoDistances,
        );
        (store, filter)
    }

    #[test]
    fn matches_to_links() {
        let (store, filter) = setup();
        let mut marking = Marking::default();
        let shared = store.match_by_id("shared").unwrap();
        let change = marking.set_marked_matches(
            &store,
            &filter,
            MarkType::Highlight,
            [shared],
            false,
            false,
            false,
        );
        assert!(change.matches_changed && change.crosslinks_changed);
        let set = marking.get(MarkType::Highlight);
        assert_eq!(set.crosslinks().len(), 2);
        assert_eq!(set.matches().len(), 1);
        assert!(marking.get(MarkType::Selection).is_empty());
    }

    fn mark_link(
        marking: &mut Marking,
        (store, filter): &(EntityStore, FilterResult),
        mark_type: MarkType,
        link: CrossLinkIndex,
        include_alternatives: bool,
        add: bool,
    ) -> MarkChange {
        marking.set_marked_crosslinks(
            store,
            filter,
            mark_type,
            [link],
            include_alternatives,
            add,
            false,
        )
    }

    #[test]
    fn links_to_matches_with_alternatives() {
        let data = setup();
        let shared = data.0.match_by_id("shared").unwrap();
        let first = data.0[shared].crosslinks()[0];
        assert!(data.1.is_ambiguous(first));

        let mut marking = Marking::default();
        mark_link(&mut marking, &data, MarkType::Selection, first, false, false);
        assert_eq!(marking.get(MarkType::Selection).crosslinks().len(), 1);
        assert_eq!(
            marking
                .get(MarkType::Selection)
                .matches()
                .iter()
                .copied()
                .collect_vec(),
            vec![shared]
        );

        mark_link(&mut marking, &data, MarkType::Selection, first, true, false);
        assert_eq!(marking.get(MarkType::Selection).crosslinks().len(), 2);
    }

    #[test]
    fn toggle_and_suppress() {
        let data = setup();
        let unique = data.0.match_by_id("unique").unwrap();
        let link = data.0[unique].crosslinks()[0];
        let mut marking = Marking::default();
        mark_link(&mut marking, &data, MarkType::Selection, link, false, true);
        assert!(marking.get(MarkType::Selection).crosslinks().contains(&link));
        let change = mark_link(&mut marking, &data, MarkType::Selection, link, false, true);
        assert!(change.any());
        assert!(marking.get(MarkType::Selection).is_empty());

        mark_link(&mut marking, &data, MarkType::Highlight, link, false, true);
        let change = mark_link(&mut marking, &data, MarkType::Highlight, link, false, true);
        assert!(!change.any());
        assert_eq!(marking.get(MarkType::Highlight).crosslinks().len(), 1);

        let change = marking.set_marked_matches(
            &data.0,
            &data.1,
            MarkType::Highlight,
            [],
            false,
            false,
            true,
        );
        assert_eq!(
            change,
            MarkChange {
                matches_changed: true,
                crosslinks_changed: false
            }
        );
        assert_eq!(marking.get(MarkType::Highlight).crosslinks().len(), 1);
        assert!(marking.clear(MarkType::Highlight).crosslinks_changed);
        assert!(!marking.clear(MarkType::Highlight).any());
    }
}
