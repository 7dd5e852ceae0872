//! Link level false discovery rate estimation using target-decoy counting.
//!
//! Links are scored by combining the scores of their matches (by default the quadratic mean of
//! the matches that pass the subset filter). Per category, links are walked from the highest to
//! the lowest score, and at every distinct score the FDR is estimated as
//! `max(TD - DD, 0) / TT`. These estimates are turned into q-values by taking the running minimum
//! from the lowest score upwards, so that accepting more links never lowers the reported rate.
//! The cutoff is the lowest score whose q-value is still within the threshold.

use context_error::{BasicKind, BoxedError};
use itertools::Itertools;
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

use crate::{
    criteria::FilterCriteria,
    entity::{CrossLink, CrossLinkIndex, DecoyClass, EntityStore},
    parse_json::{ParseJson, use_serde},
};

/// How the match scores of a link are combined into a single link score
#[derive(
    Clone, Copy, Debug, Default, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize,
)]
pub enum LinkScore {
    /// The root of the mean of the squared scores
    #[default]
    QuadraticMean,
    /// The arithmetic mean
    Mean,
    /// The best score
    Max,
}

impl LinkScore {
    /// Combine the scores, gives none if there are no scores
    pub fn combine(self, scores: impl IntoIterator<Item = f64>) -> Option<f64> {
        let scores = scores.into_iter().collect_vec();
        if scores.is_empty() {
            return None;
        }
        let n = scores.len() as f64;
        Some(match self {
            Self::QuadraticMean => (scores.iter().map(|s| s * s).sum::<f64>() / n).sqrt(),
            Self::Mean => scores.iter().sum::<f64>() / n,
            Self::Max => scores.into_iter().fold(f64::NEG_INFINITY, f64::max),
        })
    }
}

/// Options for the FDR estimation
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq, Serialize)]
#[serde(default)]
pub struct FdrOptions {
    /// How link scores are calculated
    pub link_score: LinkScore,
    /// If linear links take part, if not they are never scored and so never pass in FDR mode
    pub include_linears: bool,
}

impl Default for FdrOptions {
    fn default() -> Self {
        Self {
            link_score: LinkScore::default(),
            include_linears: true,
        }
    }
}

impl FdrOptions {
    /// Set the link score function
    #[must_use]
    pub const fn link_score(self, link_score: LinkScore) -> Self {
        Self { link_score, ..self }
    }

    /// Set if linear links take part
    #[must_use]
    pub const fn include_linears(self, include_linears: bool) -> Self {
        Self {
            include_linears,
            ..self
        }
    }
}

impl ParseJson for FdrOptions {
    fn from_json_value(value: serde_json::Value) -> Result<Self, BoxedError<'static, BasicKind>> {
        use_serde(value)
    }
}

/// The link categories that each get their own FDR cutoff
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum FdrCategory {
    /// Between two different proteins
    Inter,
    /// Within a single protein, linear peptides and mono-links are counted here as well
    Intra,
}

impl FdrCategory {
    /// The category of a link
    pub fn of(link: &CrossLink) -> Self {
        if link.to_protein.is_none_or(|to| to == link.from_protein) {
            Self::Intra
        } else {
            Self::Inter
        }
    }
}

impl std::fmt::Display for FdrCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Inter => write!(f, "inter"),
            Self::Intra => write!(f, "intra"),
        }
    }
}

/// The FDR outcome for a single category
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct CategoryFdr {
    /// The lowest accepted link score, none if the threshold could not be met
    pub cutoff: Option<f64>,
    /// If any score satisfies the threshold
    pub threshold_met: bool,
    /// The q-value at the cutoff
    pub fdr: Option<f64>,
    /// The number of scored target-target links
    pub target_target: usize,
    /// The number of scored target-decoy links
    pub target_decoy: usize,
    /// The number of scored decoy-decoy links
    pub decoy_decoy: usize,
    /// The number of links at or above the cutoff
    pub passing: usize,
}

impl CategoryFdr {
    /// If a link with this score is accepted
    pub fn accepts(&self, score: f64) -> bool {
        self.threshold_met && self.cutoff.is_some_and(|cut| score >= cut)
    }
}

/// The FDR outcome for both categories together with the link scores used
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct FdrResult {
    /// The targeted threshold
    pub threshold: f64,
    /// Links between proteins
    pub inter: CategoryFdr,
    /// Links within a protein
    pub intra: CategoryFdr,
    link_scores: Vec<Option<f64>>,
}

impl FdrResult {
    /// Get the outcome for a category
    pub const fn category(&self, category: FdrCategory) -> &CategoryFdr {
        match category {
            FdrCategory::Inter => &self.inter,
            FdrCategory::Intra => &self.intra,
        }
    }

    /// The combined score of a link, none if none of its matches pass the subset filter
    pub fn link_score(&self, link: CrossLinkIndex) -> Option<f64> {
        self.link_scores.get(link.0).copied().flatten()
    }

    /// If the link reaches the cutoff of its category
    pub fn passes(&self, index: CrossLinkIndex, link: &CrossLink) -> bool {
        self.link_score(index)
            .is_some_and(|score| self.category(FdrCategory::of(link)).accepts(score))
    }
}

/// Estimate the score cutoffs that keep the false discovery rate of both link categories at or below the threshold.
/// Never fails, a category without any suitable cutoff reports `threshold_met = false`.
pub fn estimate_fdr(
    store: &EntityStore,
    criteria: &FilterCriteria,
    threshold: f64,
    options: &FdrOptions,
) -> FdrResult {
    let link_scores = store
        .crosslinks()
        .map(|(_, link)| {
            if link.is_linear_link() && !options.include_linears {
                return None;
            }
            options.link_score.combine(
                link.match_indices()
                    .map(|m| &store[m])
                    .filter(|m| criteria.subset_filter(m, link))
                    .filter_map(|m| m.score),
            )
        })
        .collect_vec();

    let (intra, inter): (Vec<_>, Vec<_>) = store
        .crosslinks()
        .filter_map(|(index, link)| {
            link_scores[index.0].map(|score| (FdrCategory::of(link), score, link.decoy_class()))
        })
        .partition(|(category, _, _)| *category == FdrCategory::Intra);
    let strip = |v: Vec<(FdrCategory, f64, DecoyClass)>| {
        v.into_iter().map(|(_, s, d)| (s, d)).collect_vec()
    };

    let result = FdrResult {
        threshold,
        inter: estimate_category(strip(inter), threshold),
        intra: estimate_category(strip(intra), threshold),
        link_scores,
    };
    for category in [FdrCategory::Inter, FdrCategory::Intra] {
        let outcome = result.category(category);
        if outcome.threshold_met {
            log::trace!(
                "{category} FDR cutoff {:?} at q {:?}, {} links pass",
                outcome.cutoff,
                outcome.fdr,
                outcome.passing
            );
        } else if outcome.target_target + outcome.target_decoy + outcome.decoy_decoy > 0 {
            log::warn!("The {category} links cannot reach an FDR of {threshold}");
        }
    }
    result
}

/// The target-decoy estimate of the false discovery rate, infinite if there are false hits but no targets.
fn false_discovery_rate(target_target: usize, target_decoy: usize, decoy_decoy: usize) -> f64 {
    let false_hits = target_decoy.saturating_sub(decoy_decoy);
    if false_hits == 0 {
        0.0
    } else if target_target == 0 {
        f64::INFINITY
    } else {
        false_hits as f64 / target_target as f64
    }
}

/// Estimate the cutoff for one category of scored links.
pub fn estimate_category(mut links: Vec<(f64, DecoyClass)>, threshold: f64) -> CategoryFdr {
    links.retain(|(score, _)| !score.is_nan());
    links.sort_unstable_by_key(|(score, _)| std::cmp::Reverse(OrderedFloat(*score)));

    let mut counts = [0_usize; 3];
    // (score, fdr, number of links at or above this score)
    let mut boundaries = Vec::new();
    for (score, chunk) in &links.iter().chunk_by(|(score, _)| OrderedFloat(*score)) {
        for (_, class) in chunk {
            counts[*class as usize] += 1;
        }
        boundaries.push((
            score.0,
            false_discovery_rate(counts[0], counts[1], counts[2]),
            counts.iter().sum::<usize>(),
        ));
    }

    let mut q_min = f64::INFINITY;
    for boundary in boundaries.iter_mut().rev() {
        q_min = q_min.min(boundary.1);
        boundary.1 = q_min;
    }

    let accepted = boundaries.iter().rev().find(|(_, q, _)| *q <= threshold);
    CategoryFdr {
        cutoff: accepted.map(|(score, _, _)| *score),
        threshold_met: accepted.is_some(),
        fdr: accepted.map(|(_, q, _)| *q),
        target_target: counts[DecoyClass::TargetTarget as usize],
        target_decoy: counts[DecoyClass::TargetDecoy as usize],
        decoy_decoy: counts[DecoyClass::DecoyDecoy as usize],
        passing: accepted.map_or(0, |(_, _, n)| *n),
    }
}
