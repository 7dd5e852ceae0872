use serde::{Deserialize, Serialize};
use thin_vec::ThinVec;

use crate::entity::{CrossLinkIndex, MetaData, MetaMap, ProteinIndex};

/// The manual or automatic validation of a match
#[derive(
    Clone, Copy, Debug, Default, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize,
)]
pub enum ValidationStatus {
    /// Manually validated, best category
    A,
    /// Manually validated
    B,
    /// Manually validated, lowest accepted category
    C,
    /// Manually marked as questionable
    #[serde(rename = "?")]
    Questionable,
    /// Automatically validated by the search pipeline, the state of unreviewed search results
    #[default]
    #[serde(rename = "auto")]
    Auto,
    /// Not validated
    #[serde(rename = "unvalidated")]
    Unvalidated,
}

impl std::fmt::Display for ValidationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Self::A => "A",
                Self::B => "B",
                Self::C => "C",
                Self::Questionable => "?",
                Self::Auto => "auto",
                Self::Unvalidated => "unvalidated",
            }
        )
    }
}

/// The location of a peptide on a protein
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct PeptideEvidence {
    /// The protein
    pub protein: ProteinIndex,
    /// The 1-based start position of the peptide on the protein
    pub start: u32,
}

/// A peptide of a match, possibly found on multiple locations in the database
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Peptide {
    /// The amino acid sequence
    pub sequence: String,
    /// All locations this peptide maps to
    pub evidence: ThinVec<PeptideEvidence>,
    /// The 1-based position of the linked residue in the peptide, none for linear peptides
    pub link_position: Option<u32>,
}

impl Peptide {
    /// The number of residues
    pub fn len(&self) -> usize {
        self.sequence.chars().count()
    }

    /// If the sequence is empty
    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    /// The residue on the protein that is linked for the given location, for linear peptides this is the start of the peptide
    pub fn linked_residue(&self, evidence: &PeptideEvidence) -> u32 {
        evidence
            .start
            .saturating_add(self.link_position.map_or(0, |p| p.saturating_sub(1)))
    }

    /// The last residue (inclusive) covered on the protein for the given location
    pub fn end(&self, evidence: &PeptideEvidence) -> u32 {
        evidence
            .start
            .saturating_add((self.len() as u32).saturating_sub(1))
    }
}

/// A single peptide spectrum match
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Match {
    /// The unique identifier
    pub id: String,
    /// The score, if present
    pub score: Option<f64>,
    /// The search this match came from
    pub search_id: String,
    /// The name of the raw file
    pub run_name: Option<String>,
    /// The scan number
    pub scan_number: Option<u64>,
    /// The precursor charge
    pub precursor_charge: Option<i32>,
    /// The validation status
    pub validation: ValidationStatus,
    /// The one or two peptides
    pub peptides: ThinVec<Peptide>,
    /// Any additional metadata
    pub metadata: MetaMap,
    pub(crate) crosslinks: ThinVec<CrossLinkIndex>,
    pub(crate) is_decoy: bool,
    pub(crate) could_be_self_link: bool,
    pub(crate) could_be_between_link: bool,
    pub(crate) confirmed_homomultimer: bool,
}

impl Match {
    /// All cross-links this match supports, more than one if the match is ambiguous
    pub fn crosslinks(&self) -> &[CrossLinkIndex] {
        &self.crosslinks
    }

    /// If any of the peptides only maps to decoy proteins
    pub const fn is_decoy(&self) -> bool {
        self.is_decoy
    }

    /// A single peptide without a linked residue
    pub fn is_linear(&self) -> bool {
        self.peptides.len() == 1 && self.peptides[0].link_position.is_none()
    }

    /// A single peptide with a linked residue
    pub fn is_mono_link(&self) -> bool {
        self.peptides.len() == 1 && self.peptides[0].link_position.is_some()
    }

    /// Two linked peptides
    pub fn is_crosslinked(&self) -> bool {
        self.peptides.len() == 2
    }

    /// Supports more than one cross-link
    pub fn is_ambiguous(&self) -> bool {
        self.crosslinks.len() > 1
    }

    /// At least one of the supported links joins two residues of the same protein
    pub const fn could_be_self_link(&self) -> bool {
        self.could_be_self_link
    }

    /// At least one of the supported links joins two different proteins
    pub const fn could_be_between_link(&self) -> bool {
        self.could_be_between_link
    }

    /// A self-link whose peptides overlap, which is only possible between two copies of the protein
    pub const fn confirmed_homomultimer(&self) -> bool {
        self.confirmed_homomultimer
    }

    /// Get the peptide lengths
    pub fn peptide_lengths(&self) -> impl Iterator<Item = usize> + '_ {
        self.peptides.iter().map(Peptide::len)
    }

    /// Determine if two peptides overlap on the same protein.
    pub(crate) fn peptides_overlap(&self) -> bool {
        let [a, b] = self.peptides.as_slice() else {
            return false;
        };
        a.evidence.iter().any(|ea| {
            b.evidence.iter().any(|eb| {
                ea.protein == eb.protein && ea.start <= b.end(eb) && eb.start <= a.end(ea)
            })
        })
    }
}

impl MetaData for Match {
    fn meta_map(&self) -> &MetaMap {
        &self.metadata
    }
}
