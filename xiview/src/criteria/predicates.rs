use regex::{Regex, RegexBuilder};

use crate::{
    criteria::FilterCriteria,
    entity::{CrossLink, EntityStore, Match, ValidationStatus},
};

impl FilterCriteria {
    /// Filter on the kind of match as seen through one of its links: linear, mono-link,
    /// cross-link, self or between, homomultimeric, ambiguity, residue separation, and peptide
    /// length. An ambiguous match can support both self and between links, so the self and
    /// between toggles are decided by `link` and not by the match.
    pub fn subset_filter(&self, m: &Match, link: &CrossLink) -> bool {
        if m.is_linear() {
            if !self.linears {
                return false;
            }
        } else if m.is_mono_link() {
            if !self.monolinks {
                return false;
            }
        } else {
            if !self.crosslinks {
                return false;
            }
            if link.is_self_link() {
                if m.confirmed_homomultimer() {
                    if !self.homomultimeric_links {
                        return false;
                    }
                } else if !self.self_links
                    || (self.aa_apart > 0
                        && link
                            .residue_separation()
                            .is_some_and(|s| s < self.aa_apart))
                {
                    return false;
                }
            } else if !self.between_links {
                return false;
            }
        }
        if !self.ambiguous && m.is_ambiguous() {
            return false;
        }
        self.pep_length == 0 || m.peptide_lengths().all(|l| l >= self.pep_length as usize)
    }

    /// Filter on the validation status
    pub fn validation_status_filter(&self, m: &Match) -> bool {
        match m.validation {
            ValidationStatus::A => self.a,
            ValidationStatus::B => self.b,
            ValidationStatus::C => self.c,
            ValidationStatus::Questionable => self.questionable,
            ValidationStatus::Auto => self.auto,
            ValidationStatus::Unvalidated => self.unvalidated,
        }
    }

    /// Filter on the match score, matches without score pass
    pub fn score_filter(&self, m: &Match) -> bool {
        m.score.is_none_or(|s| self.match_score_cutoff.contains(s))
    }

    /// Filter out decoy matches if decoys are hidden
    pub fn decoy_filter(&self, m: &Match) -> bool {
        self.decoys || !m.is_decoy()
    }

    /// Filter on the group of the search the match came from
    pub fn group_filter(&self, store: &EntityStore, m: &Match) -> bool {
        self.groups.is_empty() || self.groups.contains(store.group_of(&m.search_id))
    }

    /// Filter on the distance of a link
    pub fn distance_filter(&self, distance: Option<f64>) -> bool {
        distance.map_or(self.distance_undefined, |d| self.distance_cutoff.contains(d))
    }

    /// Compile the text based navigation criteria
    pub fn navigation_filter(&self) -> NavigationFilter {
        NavigationFilter {
            pep_seq: self
                .pep_seq
                .split('-')
                .filter_map(pattern)
                .take(2)
                .collect(),
            prot_names: self.prot_names.split(',').filter_map(pattern).collect(),
            prot_desc: pattern(&self.prot_desc),
            run_name: pattern(&self.run_name),
            scan_number: self.scan_number,
            precursor_charge: self.precursor_charge,
        }
    }
}

/// A case insensitive literal pattern, empty text gives no pattern
fn pattern(text: &str) -> Option<Regex> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    RegexBuilder::new(&regex::escape(text))
        .case_insensitive(true)
        .build()
        .inspect_err(|err| log::warn!("Ignoring navigation filter text '{text}': {err}"))
        .ok()
}

/// The text based criteria compiled once per filter pass
#[derive(Clone, Debug)]
pub struct NavigationFilter {
    pep_seq: Vec<Regex>,
    prot_names: Vec<Regex>,
    prot_desc: Option<Regex>,
    run_name: Option<Regex>,
    scan_number: Option<u64>,
    precursor_charge: Option<i32>,
}

impl NavigationFilter {
    /// If no navigation criterion is set
    pub fn is_empty(&self) -> bool {
        self.pep_seq.is_empty()
            && self.prot_names.is_empty()
            && self.prot_desc.is_none()
            && self.run_name.is_none()
            && self.scan_number.is_none()
            && self.precursor_charge.is_none()
    }

    /// Check a match against all navigation criteria
    pub fn matches(&self, store: &EntityStore, m: &Match) -> bool {
        if self.is_empty() {
            return true;
        }
        if self.scan_number.is_some_and(|s| m.scan_number != Some(s))
            || self
                .precursor_charge
                .is_some_and(|c| m.precursor_charge != Some(c))
        {
            return false;
        }
        if let Some(run) = &self.run_name
            && !m.run_name.as_deref().is_some_and(|r| run.is_match(r))
        {
            return false;
        }
        let sequences: Vec<&str> = m.peptides.iter().map(|p| p.sequence.as_str()).collect();
        let sequence_pass = match (self.pep_seq.as_slice(), sequences.as_slice()) {
            ([], _) => true,
            ([single], _) => sequences.iter().any(|s| single.is_match(s)),
            ([a, b], [first, second]) => {
                (a.is_match(first) && b.is_match(second))
                    || (b.is_match(first) && a.is_match(second))
            }
            _ => false,
        };
        if !sequence_pass {
            return false;
        }
        let mut proteins = m
            .peptides
            .iter()
            .flat_map(|p| p.evidence.iter())
            .map(|e| &store[e.protein]);
        if !self.prot_names.is_empty()
            && !proteins.clone().any(|p| {
                self.prot_names.iter().any(|name| {
                    name.is_match(&p.name)
                        || name.is_match(&p.id)
                        || p.accession.as_deref().is_some_and(|a| name.is_match(a))
                })
            })
        {
            return false;
        }
        self.prot_desc.as_ref().is_none_or(|desc| {
            proteins.any(|p| p.description.as_deref().is_some_and(|d| desc.is_match(d)))
        })
    }
}

#[cfg(test)]
#[expect(clippy::missing_panics_doc)]
mod tests {
    use crate::{
        criteria::{FilterCriteria, ScoreRange},
        entity::{
            EntityStore, EntityStoreBuilder, MatchIndex, MatchRecord, PeptideRecord, Protein,
            ValidationStatus,
        },
    };

    fn store() -> EntityStore {
        EntityStoreBuilder::new()
            .protein(Protein::new("P1", "Alpha").description("Membrane kinase"))
            .protein(Protein::new("P2", "Beta").accession("Q99999"))
            .protein(Protein::new("D1", "Decoy").decoy(true))
            .search_group("s2", "g2")
            // 0: between link
            .match_record(
                MatchRecord::new("m0", "s1", Some(10.0))
                    .peptide(PeptideRecord::new("PEPKTIDE", "P1", 10, Some(4)))
                    .peptide(PeptideRecord::new("AKR", "P2", 5, Some(2)))
                    .scan("run_01", 1001)
                    .charge(3),
            )
            // 1: self link, 3 residues apart
            .match_record(
                MatchRecord::new("m1", "s2", Some(4.0))
                    .peptide(PeptideRecord::new("AAK", "P1", 47, Some(3)))
                    .peptide(PeptideRecord::new("KAR", "P1", 52, Some(1)))
                    .validation(ValidationStatus::Questionable),
            )
            // 2: linear decoy
            .match_record(
                MatchRecord::new("m2", "s1", None)
                    .peptide(PeptideRecord::new("LINEAR", "D1", 1, None)),
            )
            // 3: homomultimer
            .match_record(
                MatchRecord::new("m3", "s1", Some(2.0))
                    .peptide(PeptideRecord::new("AAKAAA", "P1", 100, Some(3)))
                    .peptide(PeptideRecord::new("AKAA", "P1", 101, Some(2))),
            )
            .build()
            .unwrap()
    }

    #[test]
    fn subsets() {
        let store = store();
        let subset = |criteria: &FilterCriteria, i| {
            let m = &store[MatchIndex(i)];
            criteria.subset_filter(m, &store[m.crosslinks()[0]])
        };
        let criteria = FilterCriteria::default();
        assert!((0..4).all(|i| subset(&criteria, i)));

        let criteria = FilterCriteria {
            between_links: false,
            ..FilterCriteria::default()
        };
        assert!(!subset(&criteria, 0));
        assert!(subset(&criteria, 1));

        let criteria = FilterCriteria {
            aa_apart: 4,
            ..FilterCriteria::default()
        };
        assert!(!subset(&criteria, 1));
        assert!(subset(&criteria, 3));

        let criteria = FilterCriteria {
            homomultimeric_links: false,
            linears: false,
            ..FilterCriteria::default()
        };
        assert!(!subset(&criteria, 2));
        assert!(!subset(&criteria, 3));
        assert!(subset(&criteria, 1));

        let criteria = FilterCriteria {
            pep_length: 4,
            ..FilterCriteria::default()
        };
        assert!(!subset(&criteria, 0));
        assert!(subset(&criteria, 3));
    }

    #[test]
    fn validation_score_decoy_group() {
        let store = store();
        let m = |i| &store[MatchIndex(i)];
        let criteria = FilterCriteria::default().match_score_cutoff(ScoreRange::new(3.0, 10.0));
        assert!(criteria.validation_status_filter(m(0)));
        assert!(!criteria.validation_status_filter(m(1)));
        assert!(criteria.score_filter(m(0)));
        assert!(criteria.score_filter(m(2)));
        assert!(!criteria.score_filter(m(3)));
        assert!(criteria.decoy_filter(m(2)));
        let criteria = FilterCriteria {
            decoys: false,
            groups: ["g2".to_string()].into_iter().collect(),
            ..criteria
        };
        assert!(!criteria.decoy_filter(m(2)));
        assert!(criteria.decoy_filter(m(0)));
        assert!(criteria.group_filter(&store, m(1)));
        assert!(!criteria.group_filter(&store, m(0)));
    }

    #[test]
    fn distances() {
        let criteria = FilterCriteria::default().distance_cutoff(ScoreRange(None, Some(30.0)));
        assert!(criteria.distance_filter(Some(12.0)));
        assert!(!criteria.distance_filter(Some(31.0)));
        assert!(criteria.distance_filter(None));
        let criteria = FilterCriteria {
            distance_undefined: false,
            ..criteria
        };
        assert!(!criteria.distance_filter(None));
    }

    #[test]
    fn navigation() {
        let store = store();
        let m = |i| &store[MatchIndex(i)];
        let navigation = |criteria: FilterCriteria| criteria.navigation_filter();
        assert!(navigation(FilterCriteria::default()).is_empty());

        let filter = navigation(FilterCriteria {
            pep_seq: "akr-pepk".to_string(),
            ..FilterCriteria::default()
        });
        assert!(filter.matches(&store, m(0)));
        assert!(!filter.matches(&store, m(1)));

        let filter = navigation(FilterCriteria {
            pep_seq: "kar".to_string(),
            ..FilterCriteria::default()
        });
        assert!(filter.matches(&store, m(1)));
        assert!(!filter.matches(&store, m(0)));

        let filter = navigation(FilterCriteria {
            prot_names: "gamma, q999".to_string(),
            ..FilterCriteria::default()
        });
        assert!(filter.matches(&store, m(0)));
        assert!(!filter.matches(&store, m(1)));

        let filter = navigation(FilterCriteria {
            prot_desc: "KINASE".to_string(),
            run_name: "run_0".to_string(),
            scan_number: Some(1001),
            precursor_charge: Some(3),
            ..FilterCriteria::default()
        });
        assert!(filter.matches(&store, m(0)));
        assert!(!filter.matches(&store, m(3)));
    }
}
