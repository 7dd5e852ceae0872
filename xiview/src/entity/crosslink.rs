use serde::{Deserialize, Serialize};
use thin_vec::ThinVec;

use crate::entity::{MatchIndex, MetaData, MetaMap, ProteinIndex};

/// What kind of link this is, determined by the matches supporting it
#[derive(
    Clone, Copy, Debug, Default, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize,
)]
pub enum LinkKind {
    /// Two residues joined by a cross-linker
    #[default]
    CrossLinked,
    /// A single residue with a hydrolysed cross-linker attached
    MonoLink,
    /// A linear peptide, no cross-linker
    Linear,
}

/// How many ends of a link map to decoy proteins
#[derive(
    Clone, Copy, Debug, Default, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize,
)]
pub enum DecoyClass {
    /// No decoy ends
    #[default]
    TargetTarget,
    /// One decoy end, linear and mono-links on a decoy protein also end up here
    TargetDecoy,
    /// Two decoy ends
    DecoyDecoy,
}

/// The position of one peptide of a match on one end of a link
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct PeptidePosition {
    /// The 1-based start on the protein
    pub start: u32,
    /// The number of residues
    pub length: u32,
}

/// A match as placed on a specific link
#[derive(Clone, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct LinkedMatch {
    /// The match
    pub match_index: MatchIndex,
    /// The positions of the peptides, ordered from the `from` to the `to` end of the link
    pub peptide_positions: ThinVec<PeptidePosition>,
}

/// All matches that support the same pair of linked residues
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct CrossLink {
    /// The unique identifier
    pub id: String,
    /// The protein on the `from` end
    pub from_protein: ProteinIndex,
    /// The protein on the `to` end, none for mono-links and linears
    pub to_protein: Option<ProteinIndex>,
    /// The residue on the `from` protein
    pub from_residue: u32,
    /// The residue on the `to` protein
    pub to_residue: Option<u32>,
    /// The kind of link
    pub kind: LinkKind,
    /// All matches supporting this link
    pub matches_pp: Vec<LinkedMatch>,
    /// Any additional metadata
    pub metadata: MetaMap,
    pub(crate) decoy_class: DecoyClass,
}

impl CrossLink {
    /// Both ends lie on the same protein
    pub fn is_self_link(&self) -> bool {
        self.to_protein == Some(self.from_protein)
    }

    /// A link made up from linear peptides
    pub fn is_linear_link(&self) -> bool {
        self.kind == LinkKind::Linear
    }

    /// A link made up from mono-linked peptides
    pub fn is_mono_link(&self) -> bool {
        self.kind == LinkKind::MonoLink
    }

    /// At least one end is a decoy protein
    pub fn is_decoy_link(&self) -> bool {
        self.decoy_class != DecoyClass::TargetTarget
    }

    /// The decoy classification
    pub const fn decoy_class(&self) -> DecoyClass {
        self.decoy_class
    }

    /// Not a decoy, not linear, and not a mono-link
    pub fn is_true_positive(&self) -> bool {
        !self.is_decoy_link() && !self.is_linear_link() && !self.is_mono_link()
    }

    /// The proteins on the ends of this link, a self-link gives its protein once
    pub fn proteins(&self) -> impl Iterator<Item = ProteinIndex> {
        std::iter::once(self.from_protein)
            .chain(self.to_protein.filter(|to| *to != self.from_protein))
    }

    /// The unordered protein pair key, single protein links pair with themselves
    pub fn protein_pair(&self) -> (ProteinIndex, ProteinIndex) {
        let to = self.to_protein.unwrap_or(self.from_protein);
        (self.from_protein.min(to), self.from_protein.max(to))
    }

    /// The distance in residues between both ends of a self-link
    pub fn residue_separation(&self) -> Option<u32> {
        self.is_self_link()
            .then(|| self.to_residue.map(|to| to.abs_diff(self.from_residue)))
            .flatten()
    }

    /// The matches in this link
    pub fn match_indices(&self) -> impl Iterator<Item = MatchIndex> + '_ {
        self.matches_pp.iter().map(|m| m.match_index)
    }
}

impl MetaData for CrossLink {
    fn meta_map(&self) -> &MetaMap {
        &self.metadata
    }
}
