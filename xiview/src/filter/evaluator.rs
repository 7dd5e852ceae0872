use std::collections::HashMap;

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::{
    criteria::{FilterCriteria, FilterMode, NavigationFilter},
    distance::{DistanceProvider, HomomultimerChange},
    entity::{CrossLink, CrossLinkIndex, EntityStore},
    fdr::{FdrOptions, FdrResult, estimate_fdr},
    filter::{Bucket, Buckets, FilterResult, LinkState},
};

/// Applies the filter criteria to every match of every cross-link
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq, Serialize)]
pub struct FilterEvaluator {
    /// The options for the FDR estimation used in FDR mode
    pub fdr_options: FdrOptions,
}

impl FilterEvaluator {
    /// Create an evaluator with the given FDR options
    pub const fn new(fdr_options: FdrOptions) -> Self {
        Self { fdr_options }
    }

    /// Run a full filter pass and return the derived state. Nothing in the store is changed.
    ///
    /// The homomultimer state of the previous pass (none for the first pass) determines which
    /// links are handed to the distance provider for recalculation, before the distance filter is
    /// applied.
    pub fn evaluate<D: DistanceProvider + ?Sized>(
        &self,
        store: &EntityStore,
        criteria: &FilterCriteria,
        previous: Option<&FilterResult>,
        distances: &mut D,
    ) -> FilterResult {
        let fdr = (criteria.mode == FilterMode::Fdr)
            .then(|| estimate_fdr(store, criteria, criteria.fdr_threshold, &self.fdr_options));
        let navigation = criteria.navigation_filter();
        let mut fdr_pass = vec![false; store.number_of_matches()];

        let mut links = store
            .crosslinks()
            .map(|(index, link)| {
                evaluate_link(
                    store,
                    criteria,
                    &navigation,
                    fdr.as_ref(),
                    &mut fdr_pass,
                    index,
                    link,
                )
            })
            .collect_vec();
        log::trace!(
            "{} of {} links have matches passing",
            links.iter().filter(|s| !s.is_empty()).count(),
            links.len()
        );

        let homomultimer_changes = links
            .iter()
            .enumerate()
            .map(|(i, state)| (CrossLinkIndex(i), state.confirmed_homomultimer))
            .filter(|(link, flag)| {
                previous.is_some_and(|p| p.confirmed_homomultimer(*link)) != *flag
            })
            .map(|(link, confirmed_homomultimer)| HomomultimerChange {
                link,
                confirmed_homomultimer,
            })
            .collect_vec();
        if !homomultimer_changes.is_empty() {
            distances.recalculate(store, &homomultimer_changes);
        }

        for (i, state) in links.iter_mut().enumerate() {
            if !state.is_empty()
                && !criteria.distance_filter(distances.distance(store, CrossLinkIndex(i)))
            {
                state.filtered_matches.clear();
            }
        }

        if !criteria.multiple_group {
            for state in &mut links {
                let groups = state
                    .match_indices()
                    .map(|m| store.group_of(&store[m].search_id))
                    .unique()
                    .count();
                if groups > 1 {
                    state.filtered_matches.clear();
                }
            }
        }

        if criteria.urp_ppi > 1 {
            remove_sparse_protein_pairs(store, &mut links, criteria.urp_ppi as usize);
        }

        let mut buckets = Buckets::default();
        let mut protein_hidden = vec![true; store.number_of_proteins()];
        for (index, link) in store.crosslinks() {
            if links[index.0].is_empty() {
                continue;
            }
            buckets.push(index, link);
            if !link.is_decoy_link() && !link.is_linear_link() {
                for protein in link.proteins() {
                    protein_hidden[protein.0] = false;
                }
            }
        }

        log::debug!(
            "Filter pass ({:?} mode): {} links, {} targets, {} linear targets, {} TD, {} DD, cutoffs inter {:?} intra {:?}, {} homomultimer changes",
            criteria.mode,
            buckets.get(Bucket::All).len(),
            buckets.get(Bucket::Targets).len(),
            buckets.get(Bucket::LinearTargets).len(),
            buckets.get(Bucket::DecoysTD).len(),
            buckets.get(Bucket::DecoysDD).len(),
            fdr.as_ref().and_then(|f| f.inter.cutoff),
            fdr.as_ref().and_then(|f| f.intra.cutoff),
            homomultimer_changes.len(),
        );

        FilterResult {
            links,
            fdr_pass,
            buckets,
            fdr,
            protein_hidden,
            homomultimer_changes,
        }
    }
}

/// Decide the filtered matches of a single link
fn evaluate_link(
    store: &EntityStore,
    criteria: &FilterCriteria,
    navigation: &NavigationFilter,
    fdr: Option<&FdrResult>,
    fdr_pass: &mut [bool],
    index: CrossLinkIndex,
    link: &CrossLink,
) -> LinkState {
    let mut state = LinkState::default();
    if store.is_link_hidden(link) {
        return state;
    }
    if fdr.is_some_and(|fdr| !fdr.passes(index, link)) {
        return state;
    }

    for linked in &link.matches_pp {
        let m = &store[linked.match_index];
        let passes = if fdr.is_some() {
            criteria.subset_filter(m, link)
        } else {
            criteria.subset_filter(m, link)
                && criteria.validation_status_filter(m)
                && criteria.score_filter(m)
                && criteria.decoy_filter(m)
        };
        if !passes {
            continue;
        }
        if fdr.is_some() {
            fdr_pass[linked.match_index.0] = true;
        }
        if m.crosslinks().len() == 1 {
            state.ambiguous = false;
        }
        if navigation.matches(store, m) && criteria.group_filter(store, m) {
            if link.is_self_link() && m.confirmed_homomultimer() {
                state.confirmed_homomultimer = true;
            }
            state.filtered_matches.push(linked.clone());
        }
    }
    state
}

/// Clear all links of protein pairs that have fewer than `minimum` links with filtered matches
fn remove_sparse_protein_pairs(store: &EntityStore, links: &mut [LinkState], minimum: usize) {
    let mut counts = HashMap::new();
    for (index, link) in store.crosslinks() {
        if !links[index.0].is_empty() {
            *counts.entry(link.protein_pair()).or_insert(0_usize) += 1;
        }
    }
    for (index, link) in store.crosslinks() {
        if counts.get(&link.protein_pair()).is_some_and(|n| *n < minimum) {
            links[index.0].filtered_matches.clear();
        }
    }
}

#[cfg(test)]
#[expect(clippy::missing_panics_doc)]
mod tests {
    use super::*;
    use crate::{
        criteria::ScoreRange,
        distance::{DistanceTable, LinkDistances, NoDistances},
        entity::{EntityStoreBuilder, MatchRecord, PeptideRecord, Protein, ValidationStatus},
    };

    fn store() -> EntityStore {
        EntityStoreBuilder::new()
            .protein(Protein::new("P1", "Alpha"))
            .protein(Protein::new("P2", "Beta"))
            .protein(Protein::new("D1", "Decoy").decoy(true))
            .match_record(
                MatchRecord::new("between", "s1", Some(10.0))
                    .peptide(PeptideRecord::new("AKR", "P1", 10, Some(2)))
                    .peptide(PeptideRecord::new("GKL", "P2", 20, Some(2))),
            )
            .match_record(
                MatchRecord::new("self", "s2", Some(8.0))
                    .peptide(PeptideRecord::new("AKR", "P1", 10, Some(2)))
                    .peptide(PeptideRecord::new("MKV", "P1", 40, Some(2))),
            )
            .match_record(
                MatchRecord::new("decoy", "s1", Some(3.0))
                    .peptide(PeptideRecord::new("AKR", "P1", 10, Some(2)))
                    .peptide(PeptideRecord::new("LKE", "D1", 5, Some(2))),
            )
            .match_record(
                MatchRecord::new("linear", "s1", Some(6.0))
                    .peptide(PeptideRecord::new("PEPTIDE", "P2", 60, None)),
            )
            .match_record(
                MatchRecord::new("questionable", "s1", Some(9.0))
                    .validation(ValidationStatus::Questionable)
                    .peptide(PeptideRecord::new("QKR", "P2", 80, Some(2)))
                    .peptide(PeptideRecord::new("WKE", "P2", 90, Some(2))),
            )
            .build()
            .unwrap()
    }

    fn evaluate(store: &EntityStore, criteria: &FilterCriteria) -> FilterResult {
        FilterEvaluator::default().evaluate(store, criteria, None, &mut NoDistances)
    }

    fn ids<'a>(store: &'a EntityStore, result: &FilterResult, bucket: Bucket) -> Vec<&'a str> {
        result
            .bucket(bucket)
            .iter()
            .map(|l| store[*l].id.as_str())
            .collect()
    }

    #[test]
    fn manual_buckets() {
        let store = store();
        let result = evaluate(&store, &FilterCriteria::default());
        assert_eq!(result.bucket(Bucket::All).len(), 4);
        assert_eq!(result.bucket(Bucket::Targets).len(), 2);
        assert_eq!(result.bucket(Bucket::LinearTargets).len(), 1);
        assert_eq!(result.bucket(Bucket::Linears).len(), 1);
        assert_eq!(result.bucket(Bucket::DecoysTD).len(), 1);
        assert!(result.bucket(Bucket::DecoysDD).is_empty());
        assert!(result.fdr().is_none());
        let hidden = result.hidden_proteins().collect_vec();
        assert_eq!(hidden, vec![store.protein_by_id("D1").unwrap()]);
        assert!(!result.is_ambiguous(result.bucket(Bucket::Targets)[0]));
    }

    #[test]
    fn manually_hidden() {
        let mut store = store();
        store.set_manually_hidden(store.protein_by_id("P2").unwrap(), true);
        let result = evaluate(&store, &FilterCriteria::default());
        assert_eq!(ids(&store, &result, Bucket::All).len(), 2);
        assert!(result.is_protein_hidden(store.protein_by_id("P2").unwrap()));
        assert!(!result.is_protein_hidden(store.protein_by_id("P1").unwrap()));
    }

    #[test]
    fn score_and_distance() {
        let store = store();
        let criteria = FilterCriteria::default().match_score_cutoff(ScoreRange::new(7.0, 100.0));
        assert_eq!(evaluate(&store, &criteria).bucket(Bucket::All).len(), 2);

        let self_link = store[store.match_by_id("self").unwrap()].crosslinks()[0];
        let mut table =
            DistanceTable::new().with(self_link, LinkDistances::new(Some(50.0), None));
        let criteria = FilterCriteria::default().distance_cutoff(ScoreRange::new(0.0, 30.0));
        let result = FilterEvaluator::default().evaluate(&store, &criteria, None, &mut table);
        assert!(result.filtered_matches(self_link).is_empty());
        assert_eq!(result.bucket(Bucket::All).len(), 3);

        let criteria = FilterCriteria {
            distance_undefined: false,
            ..FilterCriteria::default()
        }
        .distance_cutoff(ScoreRange::new(0.0, 60.0));
        let result = FilterEvaluator::default().evaluate(&store, &criteria, None, &mut table);
        assert_eq!(result.bucket(Bucket::All), &[self_link]);
    }

    #[test]
    fn multiple_groups() {
        let store = EntityStoreBuilder::new()
            .protein(Protein::new("P1", "Alpha"))
            .protein(Protein::new("P2", "Beta"))
            .match_record(
                MatchRecord::new("m1", "s1", Some(10.0))
                    .peptide(PeptideRecord::new("AKR", "P1", 10, Some(2)))
                    .peptide(PeptideRecord::new("GKL", "P2", 20, Some(2))),
            )
            .match_record(
                MatchRecord::new("m2", "s2", Some(10.0))
                    .peptide(PeptideRecord::new("AKR", "P1", 10, Some(2)))
                    .peptide(PeptideRecord::new("GKL", "P2", 20, Some(2))),
            )
            .search_group("s1", "g1")
            .search_group("s2", "g2")
            .build()
            .unwrap();
        let criteria = FilterCriteria::default();
        assert_eq!(evaluate(&store, &criteria).bucket(Bucket::Targets).len(), 1);
        let criteria = FilterCriteria {
            multiple_group: false,
            ..FilterCriteria::default()
        };
        assert!(evaluate(&store, &criteria).bucket(Bucket::Targets).is_empty());
        let criteria = FilterCriteria {
            multiple_group: false,
            groups: ["g1".to_string()].into(),
            ..FilterCriteria::default()
        };
        let result = evaluate(&store, &criteria);
        assert_eq!(result.bucket(Bucket::Targets).len(), 1);
        assert_eq!(result.filtered_matches(result.bucket(Bucket::Targets)[0]).len(), 1);
    }

    #[test]
    fn fdr_mode_marks_matches() {
        let store = store();
        let criteria = FilterCriteria::default().fdr(0.5);
        let result = evaluate(&store, &criteria);
        let fdr = result.fdr().unwrap();
        assert!(fdr.inter.threshold_met);
        let between = store.match_by_id("between").unwrap();
        assert!(result.fdr_pass(between));
        // Validation is not applied in FDR mode
        let questionable = store.match_by_id("questionable").unwrap();
        assert!(result.fdr_pass(questionable));
        assert!(!evaluate(&store, &FilterCriteria::default()).fdr_pass(between));
    }

    #[test]
    fn no_entities() {
        let store = EntityStore::default();
        for criteria in [FilterCriteria::default(), FilterCriteria::default().fdr(0.05)] {
            let result = evaluate(&store, &criteria);
            assert!(result.bucket(Bucket::All).is_empty());
            assert!(result.homomultimer_changes().is_empty());
        }
    }
}
