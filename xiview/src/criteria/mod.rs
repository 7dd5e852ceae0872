//! The filter criteria store. All criteria live in one flat structure that can be read and
//! written through stable string identifiers (the camelCase field names), loaded from JSON
//! presets, and turned into the predicates the filter evaluator applies.

mod predicates;

pub use predicates::NavigationFilter;

use std::collections::BTreeSet;

use context_error::*;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::parse_json::{ParseJson, use_serde};

/// How matches are selected
#[derive(
    Clone, Copy, Debug, Default, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize,
)]
#[serde(rename_all = "lowercase")]
pub enum FilterMode {
    /// Apply the validation, score, and decoy filters on the individual matches
    #[default]
    Manual,
    /// Accept links based on a false discovery rate threshold
    Fdr,
}

/// An inclusive range, either end can be left open
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct ScoreRange(pub Option<f64>, pub Option<f64>);

impl ScoreRange {
    /// A range with both ends closed
    pub const fn new(min: f64, max: f64) -> Self {
        Self(Some(min), Some(max))
    }

    /// An unbounded range
    pub const fn open() -> Self {
        Self(None, None)
    }

    /// Check if the value lies inside the range
    pub fn contains(&self, value: f64) -> bool {
        self.0.is_none_or(|min| value >= min) && self.1.is_none_or(|max| value <= max)
    }
}

/// A single criterion value as exposed by the key-value interface
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CriterionValue {
    /// A toggle
    Flag(bool),
    /// A number
    Number(f64),
    /// A text pattern, or the name of a mode
    Text(String),
    /// A range of numbers
    Range(ScoreRange),
    /// A set of enabled identifiers
    Set(BTreeSet<String>),
    /// An unset optional value
    Unset,
}

impl From<CriterionValue> for Value {
    fn from(value: CriterionValue) -> Self {
        match value {
            CriterionValue::Flag(b) => Self::Bool(b),
            // Integer fields only accept integral JSON numbers
            CriterionValue::Number(n) if n.fract() == 0.0 && n.abs() < 2f64.powi(53) => {
                Self::from(n as i64)
            }
            CriterionValue::Number(n) => Self::from(n),
            CriterionValue::Text(t) => Self::String(t),
            CriterionValue::Range(ScoreRange(min, max)) => Self::Array(vec![
                min.map_or(Self::Null, Self::from),
                max.map_or(Self::Null, Self::from),
            ]),
            CriterionValue::Set(s) => Self::Array(s.into_iter().map(Self::String).collect()),
            CriterionValue::Unset => Self::Null,
        }
    }
}

impl From<bool> for CriterionValue {
    fn from(value: bool) -> Self {
        Self::Flag(value)
    }
}

impl From<f64> for CriterionValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for CriterionValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<ScoreRange> for CriterionValue {
    fn from(value: ScoreRange) -> Self {
        Self::Range(value)
    }
}

/// All filter criteria. Every criterion has a default, missing fields in JSON take the default.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FilterCriteria {
    /// Manual or FDR based filtering
    pub mode: FilterMode,
    /// The targeted false discovery rate in FDR mode
    pub fdr_threshold: f64,
    /// Show linear peptides
    pub linears: bool,
    /// Show mono-linked peptides
    pub monolinks: bool,
    /// Show cross-linked peptides
    pub crosslinks: bool,
    /// Show links between different proteins
    pub between_links: bool,
    /// Show links within a protein
    pub self_links: bool,
    /// Show links that can only be explained by a homomultimer
    pub homomultimeric_links: bool,
    /// Show matches that explain multiple links
    pub ambiguous: bool,
    /// The minimal distance in residues between both ends of a self-link
    pub aa_apart: u32,
    /// The minimal length of every peptide
    pub pep_length: u32,
    /// Show manually validated A matches
    pub a: bool,
    /// Show manually validated B matches
    pub b: bool,
    /// Show manually validated C matches
    pub c: bool,
    /// Show questionable matches
    pub questionable: bool,
    /// Show automatically validated matches
    pub auto: bool,
    /// Show unvalidated matches
    pub unvalidated: bool,
    /// Show decoy matches
    pub decoys: bool,
    /// The accepted match scores
    pub match_score_cutoff: ScoreRange,
    /// The accepted link distances
    pub distance_cutoff: ScoreRange,
    /// Show links without a known distance
    pub distance_undefined: bool,
    /// Peptide sequence text, `a-b` requires one part on each peptide
    pub pep_seq: String,
    /// Comma separated protein names or accessions
    pub prot_names: String,
    /// Protein description text
    pub prot_desc: String,
    /// Raw file name text
    pub run_name: String,
    /// An exact scan number
    pub scan_number: Option<u64>,
    /// An exact precursor charge
    pub precursor_charge: Option<i32>,
    /// The enabled search groups, empty enables all
    pub groups: BTreeSet<String>,
    /// Show links supported by matches from more than one group
    pub multiple_group: bool,
    /// The minimal number of unique residue pairs per protein pair
    pub urp_ppi: u32,
}

impl Default for FilterCriteria {
    fn default() -> Self {
        Self {
            mode: FilterMode::Manual,
            fdr_threshold: 0.05,
            linears: true,
            monolinks: true,
            crosslinks: true,
            between_links: true,
            self_links: true,
            homomultimeric_links: true,
            ambiguous: true,
            aa_apart: 0,
            pep_length: 0,
            a: true,
            b: true,
            c: true,
            questionable: false,
            auto: true,
            unvalidated: false,
            decoys: true,
            match_score_cutoff: ScoreRange::open(),
            distance_cutoff: ScoreRange::open(),
            distance_undefined: true,
            pep_seq: String::new(),
            prot_names: String::new(),
            prot_desc: String::new(),
            run_name: String::new(),
            scan_number: None,
            precursor_charge: None,
            groups: BTreeSet::new(),
            multiple_group: true,
            urp_ppi: 1,
        }
    }
}

impl FilterCriteria {
    /// Set the filter mode
    #[must_use]
    pub fn mode(self, mode: FilterMode) -> Self {
        Self { mode, ..self }
    }

    /// Switch to FDR mode with the given threshold
    #[must_use]
    pub fn fdr(self, threshold: f64) -> Self {
        Self {
            mode: FilterMode::Fdr,
            fdr_threshold: threshold,
            ..self
        }
    }

    /// Set the match score cutoff
    #[must_use]
    pub fn match_score_cutoff(self, match_score_cutoff: ScoreRange) -> Self {
        Self {
            match_score_cutoff,
            ..self
        }
    }

    /// Set the distance cutoff
    #[must_use]
    pub fn distance_cutoff(self, distance_cutoff: ScoreRange) -> Self {
        Self {
            distance_cutoff,
            ..self
        }
    }

    /// Set the minimal number of unique residue pairs per protein pair
    #[must_use]
    pub fn urp_ppi(self, urp_ppi: u32) -> Self {
        Self { urp_ppi, ..self }
    }

    /// All criterion identifiers
    pub fn ids(&self) -> Vec<String> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map.keys().cloned().collect(),
            _ => Vec::new(),
        }
    }

    /// Read a criterion by identifier
    pub fn get(&self, id: &str) -> Option<CriterionValue> {
        match serde_json::to_value(self) {
            Ok(Value::Object(mut map)) => map
                .remove(id)
                .and_then(|value| serde_json::from_value(value).ok()),
            _ => None,
        }
    }

    /// Set a criterion by identifier, returns if the value changed. On failure nothing is changed.
    /// # Errors
    /// If the identifier is unknown or the value has the wrong shape for this criterion.
    pub fn set(
        &mut self,
        id: &str,
        value: impl Into<CriterionValue>,
    ) -> Result<bool, BoxedError<'static, BasicKind>> {
        let mut map = match serde_json::to_value(&*self) {
            Ok(Value::Object(map)) => map,
            Ok(other) => {
                return Err(BoxedError::new(
                    BasicKind::Error,
                    "Invalid filter criteria",
                    "The criteria did not serialise to a map",
                    Context::show(other.to_string()),
                ));
            }
            Err(err) => {
                return Err(BoxedError::new(
                    BasicKind::Error,
                    "Invalid filter criteria",
                    err.to_string(),
                    Context::none(),
                ));
            }
        };
        let Some(slot) = map.get_mut(id) else {
            return Err(BoxedError::new(
                BasicKind::Error,
                "Unknown filter criterion",
                format!(
                    "The criterion is not known, use one of: {}",
                    self.ids().join(", ")
                ),
                Context::show(id.to_string()),
            ));
        };
        *slot = value.into().into();
        let updated: Self = use_serde(Value::Object(map))?;
        let changed = updated != *self;
        *self = updated;
        Ok(changed)
    }
}

impl ParseJson for FilterCriteria {
    fn from_json_value(value: Value) -> Result<Self, BoxedError<'static, BasicKind>> {
        use_serde(value)
    }
}
