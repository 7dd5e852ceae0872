use context_error::{BasicKind, BoxedError};
use indexmap::IndexSet;
use itertools::Itertools;

use crate::{
    criteria::{CriterionValue, FilterCriteria},
    distance::{DistanceProvider, HomomultimerChange, NoDistances},
    entity::{
        CrossLinkIndex, EntityStore, MatchIndex, MetaValue, ProteinIndex, ProteinSelection, extent,
    },
    fdr::FdrOptions,
    filter::{Bucket, FilterEvaluator, FilterResult},
    marking::{MarkChange, MarkType, Marking},
    notify::Notifications,
};

/// Ties the entity store, the filter criteria, the distance provider and the marks together.
///
/// Every change that affects the filter runs a full filter pass. The new [`FilterResult`] is
/// swapped in as a whole, after which the observers in [`Notifications`] are called, so observers
/// never see a partially updated state.
#[derive(Debug)]
pub struct CompositeModel<D: DistanceProvider = NoDistances> {
    store: EntityStore,
    criteria: FilterCriteria,
    evaluator: FilterEvaluator,
    distances: D,
    result: FilterResult,
    marking: Marking,
    protein_selection: ProteinSelection,
    notifications: Notifications,
}

impl<D: DistanceProvider> CompositeModel<D> {
    /// Create a model and run the first filter pass
    pub fn new(store: EntityStore, criteria: FilterCriteria, distances: D) -> Self {
        let mut model = Self {
            store,
            criteria,
            evaluator: FilterEvaluator::default(),
            distances,
            result: FilterResult::default(),
            marking: Marking::default(),
            protein_selection: ProteinSelection::default(),
            notifications: Notifications::default(),
        };
        model.apply_filter();
        model
    }

    /// Use different FDR options, runs a filter pass
    #[must_use]
    pub fn with_fdr_options(mut self, fdr_options: FdrOptions) -> Self {
        self.set_fdr_options(fdr_options);
        self
    }

    /// Use different FDR options, runs a filter pass if they changed
    pub fn set_fdr_options(&mut self, fdr_options: FdrOptions) {
        if self.evaluator.fdr_options != fdr_options {
            self.evaluator.fdr_options = fdr_options;
            self.apply_filter();
        }
    }

    /// Run a full filter pass, then notify the observers
    pub fn apply_filter(&mut self) {
        let result = self.evaluator.evaluate(
            &self.store,
            &self.criteria,
            Some(&self.result),
            &mut self.distances,
        );
        let hidden_changed = result.hidden_differs(&self.result);
        self.result = result;
        if hidden_changed {
            self.notifications.hidden_changed();
        }
        self.notifications.filtering_done();
    }

    /// The entities
    pub const fn store(&self) -> &EntityStore {
        &self.store
    }

    /// The outcome of the last filter pass
    pub const fn filter_result(&self) -> &FilterResult {
        &self.result
    }

    /// The filtered cross-links in a bucket, [`Bucket::Targets`] is the default
    pub fn filtered_crosslinks(&self, bucket: Bucket) -> &[CrossLinkIndex] {
        self.result.bucket(bucket)
    }

    /// The observers
    pub const fn notifications_mut(&mut self) -> &mut Notifications {
        &mut self.notifications
    }

    /// The current criteria
    pub const fn criteria(&self) -> &FilterCriteria {
        &self.criteria
    }

    /// Set a single criterion by identifier, runs a filter pass if it changed.
    /// # Errors
    /// If the identifier is unknown or the value does not fit, the criteria are left as they were.
    pub fn set_criterion(
        &mut self,
        id: &str,
        value: impl Into<CriterionValue>,
    ) -> Result<bool, BoxedError<'static, BasicKind>> {
        let changed = self
            .criteria
            .set(id, value)
            .inspect_err(|_| log::warn!("Rejected an update of filter criterion '{id}'"))?;
        if changed {
            self.apply_filter();
        }
        Ok(changed)
    }

    /// Change the criteria in place, runs a filter pass if anything changed
    pub fn update_criteria(&mut self, update: impl FnOnce(&mut FilterCriteria)) -> bool {
        let mut criteria = self.criteria.clone();
        update(&mut criteria);
        self.set_criteria(criteria)
    }

    /// Replace all criteria, runs a filter pass if anything changed
    pub fn set_criteria(&mut self, criteria: FilterCriteria) -> bool {
        let changed = criteria != self.criteria;
        if changed {
            self.criteria = criteria;
            self.apply_filter();
        }
        changed
    }

    /// Set a metadata field of a cross-link, for example a colour or an annotation added in the
    /// viewer. Metadata does not take part in filtering so no filter pass is run.
    pub fn set_link_meta(
        &mut self,
        link: CrossLinkIndex,
        field: impl Into<String>,
        value: impl Into<MetaValue>,
    ) -> Option<MetaValue> {
        self.store.set_link_meta(link, field, value)
    }

    /// Assign a search to a group, runs a filter pass
    pub fn set_search_group(&mut self, search_id: impl Into<String>, group: impl Into<String>) {
        self.store.set_search_group(search_id, group);
        self.apply_filter();
    }

    /// The distance provider
    pub const fn distances(&self) -> &D {
        &self.distances
    }

    /// Swap in a new distance provider, for example after loading another structure. The new
    /// provider is told about all current homomultimers before the filter pass.
    pub fn set_distances(&mut self, distances: D) -> D {
        let old = std::mem::replace(&mut self.distances, distances);
        let current = self
            .store
            .crosslinks()
            .filter(|(link, _)| self.result.confirmed_homomultimer(*link))
            .map(|(link, _)| HomomultimerChange {
                link,
                confirmed_homomultimer: true,
            })
            .collect_vec();
        if !current.is_empty() {
            self.distances.recalculate(&self.store, &current);
        }
        self.apply_filter();
        old
    }

    /// The distances of the filtered links in a bucket, links without a distance are skipped
    pub fn filtered_distances(&self, bucket: Bucket) -> impl Iterator<Item = f64> + '_ {
        self.result
            .bucket(bucket)
            .iter()
            .filter_map(|link| self.distances.distance(&self.store, *link))
    }

    /// The range of distances over all links when every self-link is treated as a homomultimer.
    /// The distance provider is restored afterwards and the filter result is not touched.
    pub fn worst_case_distance_extent(&mut self) -> Option<(f64, f64)> {
        let forced = self
            .store
            .crosslinks()
            .filter(|(link, l)| l.is_self_link() && !self.result.confirmed_homomultimer(*link))
            .map(|(link, _)| HomomultimerChange {
                link,
                confirmed_homomultimer: true,
            })
            .collect_vec();
        if !forced.is_empty() {
            self.distances.recalculate(&self.store, &forced);
        }
        let range = extent(
            self.store
                .crosslinks()
                .filter_map(|(link, _)| self.distances.distance(&self.store, link)),
        );
        if !forced.is_empty() {
            let restore = forced
                .iter()
                .map(|change| HomomultimerChange {
                    confirmed_homomultimer: false,
                    ..*change
                })
                .collect_vec();
            self.distances.recalculate(&self.store, &restore);
        }
        range
    }

    /// The marked matches
    pub fn marked_matches(&self, mark_type: MarkType) -> &IndexSet<MatchIndex> {
        self.marking.get(mark_type).matches()
    }

    /// The marked cross-links
    pub fn marked_crosslinks(&self, mark_type: MarkType) -> &IndexSet<CrossLinkIndex> {
        self.marking.get(mark_type).crosslinks()
    }

    /// Mark matches and (unless suppressed) the cross-links they support, notifies once if anything changed
    pub fn set_marked_matches(
        &mut self,
        mark_type: MarkType,
        matches: impl IntoIterator<Item = MatchIndex>,
        include_alternatives: bool,
        add: bool,
        suppress_propagation: bool,
    ) -> MarkChange {
        let change = self.marking.set_marked_matches(
            &self.store,
            &self.result,
            mark_type,
            matches,
            include_alternatives,
            add,
            suppress_propagation,
        );
        self.notify_marked(mark_type, change)
    }

    /// Mark cross-links and (unless suppressed) their filtered matches, notifies once if anything changed
    pub fn set_marked_crosslinks(
        &mut self,
        mark_type: MarkType,
        crosslinks: impl IntoIterator<Item = CrossLinkIndex>,
        include_alternatives: bool,
        add: bool,
        suppress_propagation: bool,
    ) -> MarkChange {
        let change = self.marking.set_marked_crosslinks(
            &self.store,
            &self.result,
            mark_type,
            crosslinks,
            include_alternatives,
            add,
            suppress_propagation,
        );
        self.notify_marked(mark_type, change)
    }

    /// Remove all marks of a type
    pub fn clear_marked(&mut self, mark_type: MarkType) -> MarkChange {
        let change = self.marking.clear(mark_type);
        self.notify_marked(mark_type, change)
    }

    fn notify_marked(&mut self, mark_type: MarkType, change: MarkChange) -> MarkChange {
        if change.any() {
            log::trace!("{mark_type} marks changed: {change:?}");
            self.notifications.marked_changed(mark_type);
        }
        change
    }

    /// The selected proteins
    pub const fn selected_proteins(&self) -> &ProteinSelection {
        &self.protein_selection
    }

    /// Select proteins, replacing or adding to the current selection
    pub fn set_selected_proteins(
        &mut self,
        proteins: impl IntoIterator<Item = ProteinIndex>,
        add: bool,
    ) -> bool {
        self.protein_selection.set(proteins, add)
    }

    /// Flip the selection of a protein, returns if it is now selected
    pub fn toggle_protein_selection(&mut self, protein: ProteinIndex) -> bool {
        self.protein_selection.toggle(protein)
    }

    /// Select proteins whose name, accession, or description contains the text
    pub fn select_proteins_by_text(&mut self, text: &str, add: bool) -> bool {
        self.protein_selection.select_by_text(&self.store, text, add)
    }

    /// Add all proteins sharing a non decoy link with a selected protein to the selection
    pub fn select_protein_neighbours(&mut self) -> bool {
        self.protein_selection.select_neighbours(&self.store)
    }

    /// Hide or show a single protein, runs a filter pass if it changed
    pub fn set_protein_hidden(&mut self, protein: ProteinIndex, hidden: bool) -> bool {
        let changed = self.store.set_manually_hidden(protein, hidden);
        self.refilter_if(changed)
    }

    /// Hide the selected proteins, runs a filter pass if anything changed
    pub fn hide_selected_proteins(&mut self) -> bool {
        let changed = self.protein_selection.hide_selected(&mut self.store);
        self.refilter_if(changed)
    }

    /// Hide all proteins that are not selected, runs a filter pass if anything changed
    pub fn hide_unselected_proteins(&mut self) -> bool {
        let changed = self.protein_selection.hide_unselected(&mut self.store);
        self.refilter_if(changed)
    }

    /// Show all manually hidden proteins, runs a filter pass if anything changed
    pub fn show_hidden_proteins(&mut self) -> bool {
        let changed = self.store.show_all_hidden();
        self.refilter_if(changed)
    }

    fn refilter_if(&mut self, changed: bool) -> bool {
        if changed {
            self.apply_filter();
        }
        changed
    }
}
