use std::str::FromStr;

use context_error::{BasicKind, BoxedError, Context, CreateError};
use serde::{Deserialize, Serialize};

use crate::entity::{CrossLink, CrossLinkIndex, DecoyClass};

/// The named sets of filtered cross-links
#[derive(
    Clone, Copy, Debug, Default, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize,
)]
#[serde(rename_all = "camelCase")]
pub enum Bucket {
    /// Every link with at least one filtered match
    All,
    /// Non decoy links that are not linear
    #[default]
    Targets,
    /// All linear links, decoy or not
    Linears,
    /// Non decoy linear links
    LinearTargets,
    /// Links with one decoy end, decoy linear and mono-links included
    #[serde(rename = "decoysTD")]
    DecoysTD,
    /// Links with two decoy ends
    #[serde(rename = "decoysDD")]
    DecoysDD,
}

impl Bucket {
    /// All buckets
    pub const ALL: [Self; 6] = [
        Self::All,
        Self::Targets,
        Self::Linears,
        Self::LinearTargets,
        Self::DecoysTD,
        Self::DecoysDD,
    ];

    /// The canonical name
    pub const fn name(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Targets => "targets",
            Self::Linears => "linears",
            Self::LinearTargets => "linearTargets",
            Self::DecoysTD => "decoysTD",
            Self::DecoysDD => "decoysDD",
        }
    }
}

impl std::fmt::Display for Bucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Bucket {
    type Err = BoxedError<'static, BasicKind>;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|b| b.name() == s)
            .ok_or_else(|| {
                BoxedError::new(
                    BasicKind::Error,
                    "Unknown bucket",
                    format!(
                        "Use one of: {}",
                        Self::ALL.iter().map(|b| b.name()).collect::<Vec<_>>().join(", ")
                    ),
                    Context::show(s.to_string()),
                )
            })
    }
}

/// The filtered cross-links partitioned into buckets, every bucket is in store order
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct Buckets {
    all: Vec<CrossLinkIndex>,
    targets: Vec<CrossLinkIndex>,
    linears: Vec<CrossLinkIndex>,
    linear_targets: Vec<CrossLinkIndex>,
    decoys_td: Vec<CrossLinkIndex>,
    decoys_dd: Vec<CrossLinkIndex>,
}

impl Buckets {
    /// Get the links in a bucket
    pub fn get(&self, bucket: Bucket) -> &[CrossLinkIndex] {
        match bucket {
            Bucket::All => &self.all,
            Bucket::Targets => &self.targets,
            Bucket::Linears => &self.linears,
            Bucket::LinearTargets => &self.linear_targets,
            Bucket::DecoysTD => &self.decoys_td,
            Bucket::DecoysDD => &self.decoys_dd,
        }
    }

    /// Sort a link with filtered matches into its buckets. Every link ends up in `all` and in
    /// exactly one of `targets`, `linearTargets`, `decoysTD`, and `decoysDD`.
    pub(crate) fn push(&mut self, index: CrossLinkIndex, link: &CrossLink) {
        self.all.push(index);
        if link.is_linear_link() {
            self.linears.push(index);
        }
        match link.decoy_class() {
            DecoyClass::TargetTarget if link.is_linear_link() => self.linear_targets.push(index),
            DecoyClass::TargetTarget => self.targets.push(index),
            DecoyClass::TargetDecoy => self.decoys_td.push(index),
            DecoyClass::DecoyDecoy => self.decoys_dd.push(index),
        }
    }
}

#[cfg(test)]
#[allow(clippy::missing_panics_doc)]
mod tests {
    use super::*;

    #[test]
    fn names() {
        for bucket in Bucket::ALL {
            assert_eq!(bucket.to_string().parse::<Bucket>().unwrap(), bucket);
            assert_eq!(
                serde_json::to_string(&bucket).unwrap(),
                format!("\"{bucket}\"")
            );
        }
        assert_eq!(Bucket::default(), Bucket::Targets);
        assert!("decoys".parse::<Bucket>().is_err());
    }
}
