use serde::Serialize;

use crate::{
    distance::HomomultimerChange,
    entity::{CrossLinkIndex, LinkedMatch, MatchIndex, ProteinIndex},
    fdr::FdrResult,
    filter::{Bucket, Buckets},
};

/// The derived state of a single cross-link after a filter pass
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct LinkState {
    /// The matches that passed, in the order of the link's matches
    pub filtered_matches: Vec<LinkedMatch>,
    /// No passing match uniquely identifies this link
    pub ambiguous: bool,
    /// Any passing self-link match can only be explained by a homomultimer
    pub confirmed_homomultimer: bool,
}

impl Default for LinkState {
    fn default() -> Self {
        Self {
            filtered_matches: Vec::new(),
            ambiguous: true,
            confirmed_homomultimer: false,
        }
    }
}

impl LinkState {
    /// If no match survived the filter
    pub fn is_empty(&self) -> bool {
        self.filtered_matches.is_empty()
    }

    /// The indices of the filtered matches
    pub fn match_indices(&self) -> impl Iterator<Item = MatchIndex> + '_ {
        self.filtered_matches.iter().map(|m| m.match_index)
    }
}

/// An immutable snapshot of everything a filter pass derives from the entities and the criteria
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct FilterResult {
    pub(crate) links: Vec<LinkState>,
    pub(crate) fdr_pass: Vec<bool>,
    pub(crate) buckets: Buckets,
    pub(crate) fdr: Option<FdrResult>,
    pub(crate) protein_hidden: Vec<bool>,
    pub(crate) homomultimer_changes: Vec<HomomultimerChange>,
}

impl FilterResult {
    /// The state of a link, none if the link is not part of the evaluated store
    pub fn link(&self, link: CrossLinkIndex) -> Option<&LinkState> {
        self.links.get(link.0)
    }

    /// The matches of a link that passed the filter
    pub fn filtered_matches(&self, link: CrossLinkIndex) -> &[LinkedMatch] {
        self.link(link).map_or(&[], |s| s.filtered_matches.as_slice())
    }

    /// If no filtered match uniquely identifies this link
    pub fn is_ambiguous(&self, link: CrossLinkIndex) -> bool {
        self.link(link).is_none_or(|s| s.ambiguous)
    }

    /// If the link is treated as a homomultimer
    pub fn confirmed_homomultimer(&self, link: CrossLinkIndex) -> bool {
        self.link(link).is_some_and(|s| s.confirmed_homomultimer)
    }

    /// If the match belongs to a link that passed FDR, always false in manual mode
    pub fn fdr_pass(&self, m: MatchIndex) -> bool {
        self.fdr_pass.get(m.0).copied().unwrap_or_default()
    }

    /// The links in a bucket
    pub fn bucket(&self, bucket: Bucket) -> &[CrossLinkIndex] {
        self.buckets.get(bucket)
    }

    /// All buckets
    pub const fn buckets(&self) -> &Buckets {
        &self.buckets
    }

    /// The FDR estimation, only present in FDR mode
    pub const fn fdr(&self) -> Option<&FdrResult> {
        self.fdr.as_ref()
    }

    /// If the protein has no filtered target link, and so is hidden from display
    pub fn is_protein_hidden(&self, protein: ProteinIndex) -> bool {
        self.protein_hidden.get(protein.0).copied().unwrap_or(true)
    }

    /// All hidden proteins
    pub fn hidden_proteins(&self) -> impl Iterator<Item = ProteinIndex> + '_ {
        self.protein_hidden
            .iter()
            .enumerate()
            .filter_map(|(i, hidden)| hidden.then_some(ProteinIndex(i)))
    }

    /// The links whose homomultimer state flipped in this pass, as handed to the distance provider
    pub fn homomultimer_changes(&self) -> &[HomomultimerChange] {
        &self.homomultimer_changes
    }

    /// If the hidden state of any protein differs from the other result
    pub fn hidden_differs(&self, other: &Self) -> bool {
        self.protein_hidden != other.protein_hidden
    }
}
