use indexmap::IndexSet;
use regex::RegexBuilder;

use crate::entity::{EntityStore, ProteinIndex};

/// The set of proteins the user selected, in order of selection
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ProteinSelection {
    selected: IndexSet<ProteinIndex>,
}

impl ProteinSelection {
    /// Iterate over the selected proteins
    pub fn iter(&self) -> impl ExactSizeIterator<Item = ProteinIndex> + '_ {
        self.selected.iter().copied()
    }

    /// If the protein is selected
    pub fn contains(&self, protein: ProteinIndex) -> bool {
        self.selected.contains(&protein)
    }

    /// The number of selected proteins
    pub fn len(&self) -> usize {
        self.selected.len()
    }

    /// If nothing is selected
    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    /// Select the given proteins, either replacing or adding to the current selection. Returns if the selection changed.
    pub fn set(&mut self, proteins: impl IntoIterator<Item = ProteinIndex>, add: bool) -> bool {
        let before = self.selected.clone();
        if !add {
            self.selected.clear();
        }
        self.selected.extend(proteins);
        before != self.selected
    }

    /// Flip the selection state of a single protein, returns if it is now selected
    pub fn toggle(&mut self, protein: ProteinIndex) -> bool {
        if self.selected.shift_remove(&protein) {
            false
        } else {
            self.selected.insert(protein);
            true
        }
    }

    /// Select all proteins whose name, accession, or description contains the text (case insensitive).
    /// Empty text selects nothing. Returns if the selection changed.
    pub fn select_by_text(&mut self, store: &EntityStore, text: &str, add: bool) -> bool {
        let text = text.trim();
        let matching: Vec<ProteinIndex> = if text.is_empty() {
            Vec::new()
        } else {
            match RegexBuilder::new(&regex::escape(text))
                .case_insensitive(true)
                .build()
            {
                Ok(pattern) => store
                    .proteins()
                    .filter(|(_, p)| p.searchable_texts().any(|t| pattern.is_match(t)))
                    .map(|(i, _)| i)
                    .collect(),
                Err(err) => {
                    log::warn!("Could not use '{text}' to select proteins: {err}");
                    Vec::new()
                }
            }
        };
        self.set(matching, add)
    }

    /// Add all proteins that share a non-decoy link with any selected protein. Returns if the selection changed.
    pub fn select_neighbours(&mut self, store: &EntityStore) -> bool {
        let neighbours: Vec<ProteinIndex> = self
            .selected
            .iter()
            .flat_map(|p| store[*p].crosslinks())
            .map(|l| &store[*l])
            .filter(|l| !l.is_decoy_link())
            .flat_map(|l| l.proteins())
            .collect();
        self.set(neighbours, true)
    }

    /// Hide all selected proteins, returns if anything changed
    pub fn hide_selected(&self, store: &mut EntityStore) -> bool {
        let mut changed = false;
        for protein in &self.selected {
            changed |= store.set_manually_hidden(*protein, true);
        }
        changed
    }

    /// Hide all proteins that are not selected, returns if anything changed
    pub fn hide_unselected(&self, store: &mut EntityStore) -> bool {
        let unselected: Vec<ProteinIndex> = store
            .proteins()
            .map(|(i, _)| i)
            .filter(|i| !self.selected.contains(i))
            .collect();
        let mut changed = false;
        for protein in unselected {
            changed |= store.set_manually_hidden(protein, true);
        }
        changed
    }
}
