#![doc = include_str!("../README.md")]

/// The entities (matches, cross-links, proteins) and the store that owns them.
pub mod entity;
/// The filter criteria and the predicates built on top of them.
pub mod criteria;
/// Distance provider collaborators used by the distance filter.
pub mod distance;
pub mod fdr;
/// The filter evaluator and the derived state it produces.
pub mod filter;
/// Selection and highlight marking of matches and cross-links.
pub mod marking;
mod model;
mod notify;
/// Contains logic to parse criteria and raw entity records from JSON.
pub mod parse_json;

pub use model::CompositeModel;
pub use notify::Notifications;

/// A subset of the types and traits that are envisioned to be used the most, importing this is a good starting point for working with the crate
pub mod prelude {
    pub use crate::CompositeModel;
    pub use crate::criteria::{CriterionValue, FilterCriteria, FilterMode, ScoreRange};
    pub use crate::distance::{DistanceProvider, DistanceTable, LinkDistances, NoDistances};
    pub use crate::entity::{
        CrossLink, CrossLinkIndex, EntityStore, EntityStoreBuilder, Match, MatchIndex, MetaData,
        MetaValue, Protein, ProteinIndex, ValidationStatus,
    };
    pub use crate::fdr::{FdrCategory, FdrOptions, FdrResult, LinkScore};
    pub use crate::filter::{Bucket, FilterEvaluator, FilterResult};
    pub use crate::marking::{MarkChange, MarkType};
}
