mod marked_set;
mod reconciler;

pub use marked_set::*;
pub use reconciler::*;

use serde::{Deserialize, Serialize};

/// The independent ways entities can be marked
#[derive(
    Clone, Copy, Debug, Default, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize,
)]
#[serde(rename_all = "lowercase")]
pub enum MarkType {
    /// Persistent user selection, re-adding a selected entity deselects it
    #[default]
    Selection,
    /// Transient highlight, for example on hover
    Highlight,
}

impl std::fmt::Display for MarkType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Selection => write!(f, "selection"),
            Self::Highlight => write!(f, "highlight"),
        }
    }
}

/// Which halves of a marked set changed
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct MarkChange {
    /// The marked matches changed
    pub matches_changed: bool,
    /// The marked cross-links changed
    pub crosslinks_changed: bool,
}

impl MarkChange {
    /// If anything changed
    pub const fn any(self) -> bool {
        self.matches_changed || self.crosslinks_changed
    }
}
