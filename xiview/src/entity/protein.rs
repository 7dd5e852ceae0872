use serde::{Deserialize, Serialize};

use crate::entity::{CrossLinkIndex, MetaData, MetaMap};

/// A protein (participant) as found in the searched database
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(default)]
pub struct Protein {
    /// The unique identifier, used to refer to this protein from match records
    pub id: String,
    /// The human readable name
    pub name: String,
    /// The database accession, if different from the identifier
    pub accession: Option<String>,
    /// The free text description
    pub description: Option<String>,
    /// If this is a decoy protein
    pub is_decoy: bool,
    /// If the user hid this protein
    pub manually_hidden: bool,
    /// The length of the protein sequence, if known
    pub size: Option<u32>,
    /// Any additional metadata
    pub metadata: MetaMap,
    #[serde(skip)]
    pub(crate) crosslinks: Vec<CrossLinkIndex>,
}

impl Protein {
    /// Create a new target protein
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            ..Self::default()
        }
    }

    /// Set the decoy flag
    #[must_use]
    pub fn decoy(self, is_decoy: bool) -> Self {
        Self { is_decoy, ..self }
    }

    /// Set the description
    #[must_use]
    pub fn description(self, description: impl Into<String>) -> Self {
        Self {
            description: Some(description.into()),
            ..self
        }
    }

    /// Set the accession
    #[must_use]
    pub fn accession(self, accession: impl Into<String>) -> Self {
        Self {
            accession: Some(accession.into()),
            ..self
        }
    }

    /// Set the sequence length
    #[must_use]
    pub fn size(self, size: u32) -> Self {
        Self {
            size: Some(size),
            ..self
        }
    }

    /// All cross-links that have this protein on at least one end
    pub fn crosslinks(&self) -> &[CrossLinkIndex] {
        &self.crosslinks
    }

    /// All texts the user can search for this protein by
    pub(crate) fn searchable_texts(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.name.as_str())
            .chain(self.accession.as_deref())
            .chain(self.description.as_deref())
    }
}

impl MetaData for Protein {
    fn meta_map(&self) -> &MetaMap {
        &self.metadata
    }
}
