use std::collections::HashMap;

use context_error::*;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use thin_vec::ThinVec;

use crate::{
    entity::{
        CrossLink, CrossLinkIndex, DecoyClass, EntityStore, LinkKind, LinkedMatch, Match,
        MatchIndex, MetaMap, Peptide, PeptideEvidence, PeptidePosition, Protein, ProteinIndex,
        ValidationStatus,
    },
    parse_json::{ParseJson, use_serde},
};

/// A peptide as given in the raw search results, proteins are referred to by identifier
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(default)]
pub struct PeptideRecord {
    /// The amino acid sequence
    pub sequence: String,
    /// The identifiers of all proteins this peptide maps to
    pub proteins: Vec<String>,
    /// The 1-based start positions, one per protein
    pub positions: Vec<u32>,
    /// The 1-based linked residue in the peptide, none for linear peptides
    pub link_position: Option<u32>,
}

impl PeptideRecord {
    /// Create a peptide found on a single location
    pub fn new(
        sequence: impl Into<String>,
        protein: impl Into<String>,
        position: u32,
        link_position: Option<u32>,
    ) -> Self {
        Self {
            sequence: sequence.into(),
            proteins: vec![protein.into()],
            positions: vec![position],
            link_position,
        }
    }

    /// Add another location this peptide maps to
    #[must_use]
    pub fn also_on(mut self, protein: impl Into<String>, position: u32) -> Self {
        self.proteins.push(protein.into());
        self.positions.push(position);
        self
    }
}

/// A match as given in the raw search results
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(default)]
pub struct MatchRecord {
    /// The unique identifier
    pub id: String,
    /// The score
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
    pub peptides: Vec<PeptideRecord>,
    /// Any additional metadata
    pub metadata: MetaMap,
}

impl MatchRecord {
    /// Create a new match record
    pub fn new(id: impl Into<String>, search_id: impl Into<String>, score: Option<f64>) -> Self {
        Self {
            id: id.into(),
            search_id: search_id.into(),
            score,
            ..Self::default()
        }
    }

    /// Add a peptide
    #[must_use]
    pub fn peptide(mut self, peptide: PeptideRecord) -> Self {
        self.peptides.push(peptide);
        self
    }

    /// Set the validation status
    #[must_use]
    pub fn validation(self, validation: ValidationStatus) -> Self {
        Self { validation, ..self }
    }

    /// Set the run name and scan number
    #[must_use]
    pub fn scan(self, run_name: impl Into<String>, scan_number: u64) -> Self {
        Self {
            run_name: Some(run_name.into()),
            scan_number: Some(scan_number),
            ..self
        }
    }

    /// Set the precursor charge
    #[must_use]
    pub fn charge(self, charge: i32) -> Self {
        Self {
            precursor_charge: Some(charge),
            ..self
        }
    }
}

impl ParseJson for MatchRecord {
    fn from_json_value(value: serde_json::Value) -> Result<Self, BoxedError<'static, BasicKind>> {
        use_serde(value)
    }
}

impl ParseJson for Protein {
    fn from_json_value(value: serde_json::Value) -> Result<Self, BoxedError<'static, BasicKind>> {
        use_serde(value)
    }
}

/// Collects the raw entity feed and resolves it into an [`EntityStore`]: links are derived from
/// the linked residues of the matches and all back references are set up.
#[derive(Clone, Debug, Default)]
pub struct EntityStoreBuilder {
    proteins: Vec<Protein>,
    matches: Vec<MatchRecord>,
    search_groups: HashMap<String, String>,
    link_metadata: Vec<(String, MetaMap)>,
}

impl EntityStoreBuilder {
    /// Create an empty builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a protein
    #[must_use]
    pub fn protein(mut self, protein: Protein) -> Self {
        self.proteins.push(protein);
        self
    }

    /// Add a match
    #[must_use]
    pub fn match_record(mut self, record: MatchRecord) -> Self {
        self.matches.push(record);
        self
    }

    /// Put a search in a group
    #[must_use]
    pub fn search_group(mut self, search_id: impl Into<String>, group: impl Into<String>) -> Self {
        self.search_groups.insert(search_id.into(), group.into());
        self
    }

    /// Attach metadata to the cross-link with this identifier, for example a distance or an
    /// external annotation. It is added to any metadata already set for that link.
    #[must_use]
    pub fn link_metadata(mut self, link_id: impl Into<String>, metadata: MetaMap) -> Self {
        self.link_metadata.push((link_id.into(), metadata));
        self
    }

    /// Add metadata for many cross-links
    pub fn add_link_metadata(&mut self, metadata: impl IntoIterator<Item = (String, MetaMap)>) {
        self.link_metadata.extend(metadata);
    }

    /// Add many proteins
    pub fn add_proteins(&mut self, proteins: impl IntoIterator<Item = Protein>) {
        self.proteins.extend(proteins);
    }

    /// Add many matches
    pub fn add_matches(&mut self, records: impl IntoIterator<Item = MatchRecord>) {
        self.matches.extend(records);
    }

    /// Resolve all references and derive the cross-links.
    /// # Errors
    /// * If two proteins or two matches share an identifier.
    /// * If a match does not have one or two peptides.
    /// * If a peptide refers to an unknown protein or the number of positions does not match the number of proteins.
    /// * If a peptide of a two peptide match does not have a link position.
    /// * If a peptide runs past the largest representable residue number.
    /// * If link metadata is given for a cross-link that none of the matches support.
    pub fn build(self) -> Result<EntityStore, BoxedError<'static, BasicKind>> {
        let mut store = EntityStore {
            search_groups: self.search_groups,
            ..EntityStore::default()
        };

        for (index, mut protein) in self.proteins.into_iter().enumerate() {
            if store
                .protein_lookup
                .insert(protein.id.clone(), ProteinIndex(index))
                .is_some()
            {
                return Err(BoxedError::new(
                    BasicKind::Error,
                    "Duplicate protein",
                    "Every protein identifier can only be used once",
                    Context::show(protein.id),
                ));
            }
            protein.crosslinks.clear();
            store.proteins.push(protein);
        }

        for record in self.matches {
            let index = MatchIndex(store.matches.len());
            if store.match_lookup.contains_key(&record.id) {
                return Err(BoxedError::new(
                    BasicKind::Error,
                    "Duplicate match",
                    "Every match identifier can only be used once",
                    Context::show(record.id),
                ));
            }
            let m = resolve_match(&store, record)?;
            store.match_lookup.insert(m.id.clone(), index);
            store.matches.push(m);
            link_match(&mut store, index);
        }

        for link in &mut store.crosslinks {
            link.decoy_class = decoy_class(&store.proteins, link);
        }
        for m in &mut store.matches {
            if m.is_crosslinked() {
                let is_self = |l: &CrossLinkIndex| store.crosslinks[l.0].is_self_link();
                m.could_be_self_link = m.crosslinks.iter().any(is_self);
                m.could_be_between_link = !m.crosslinks.iter().all(is_self);
            }
            m.confirmed_homomultimer = m.could_be_self_link && m.peptides_overlap();
        }

        for (id, metadata) in self.link_metadata {
            let Some(link) = store.crosslink_lookup.get(&id) else {
                return Err(BoxedError::new(
                    BasicKind::Error,
                    "Unknown cross-link",
                    "Metadata can only be attached to cross-links derived from the matches",
                    Context::show(id),
                ));
            };
            store.crosslinks[link.0].metadata.extend(metadata);
        }

        log::info!(
            "Built entity store with {} proteins, {} matches, and {} cross-links",
            store.proteins.len(),
            store.matches.len(),
            store.crosslinks.len()
        );
        Ok(store)
    }
}

fn resolve_match(
    store: &EntityStore,
    record: MatchRecord,
) -> Result<Match, BoxedError<'static, BasicKind>> {
    if !(1..=2).contains(&record.peptides.len()) {
        return Err(BoxedError::new(
            BasicKind::Error,
            "Invalid match",
            format!(
                "A match needs one or two peptides, not {}",
                record.peptides.len()
            ),
            Context::show(record.id),
        ));
    }
    let crosslinked = record.peptides.len() == 2;
    let mut peptides = ThinVec::with_capacity(record.peptides.len());
    for peptide in record.peptides {
        if peptide.proteins.len() != peptide.positions.len() || peptide.proteins.is_empty() {
            return Err(BoxedError::new(
                BasicKind::Error,
                "Invalid peptide",
                "Every peptide needs at least one protein, with exactly one position per protein",
                Context::show(format!("{} in match {}", peptide.sequence, record.id)),
            ));
        }
        if crosslinked && peptide.link_position.is_none() {
            return Err(BoxedError::new(
                BasicKind::Error,
                "Invalid peptide",
                "Both peptides of a cross-linked match need a link position",
                Context::show(format!("{} in match {}", peptide.sequence, record.id)),
            ));
        }
        let evidence = peptide
            .proteins
            .iter()
            .zip(&peptide.positions)
            .map(|(protein, start)| {
                store
                    .protein_by_id(protein)
                    .map(|protein| PeptideEvidence {
                        protein,
                        start: *start,
                    })
                    .ok_or_else(|| {
                        BoxedError::new(
                            BasicKind::Error,
                            "Unknown protein",
                            format!("The protein is not defined, used in match {}", record.id),
                            Context::show(protein.clone()),
                        )
                    })
            })
            .collect::<Result<ThinVec<_>, _>>()?;
        // Furthest residue offset from the start, either the last residue or the linked one
        let last_offset = u32::try_from(peptide.sequence.chars().count())
            .ok()
            .map(|length| {
                length
                    .saturating_sub(1)
                    .max(peptide.link_position.map_or(0, |p| p.saturating_sub(1)))
            });
        if evidence
            .iter()
            .any(|e| last_offset.and_then(|offset| e.start.checked_add(offset)).is_none())
        {
            return Err(BoxedError::new(
                BasicKind::Error,
                "Invalid peptide",
                "The peptide or its linked residue runs past the largest possible residue number",
                Context::show(format!("{} in match {}", peptide.sequence, record.id)),
            ));
        }
        peptides.push(Peptide {
            sequence: peptide.sequence,
            evidence,
            link_position: peptide.link_position,
        });
    }
    let is_decoy = peptides.iter().any(|p| {
        p.evidence
            .iter()
            .all(|e| store.proteins[e.protein.0].is_decoy)
    });
    Ok(Match {
        id: record.id,
        score: record.score,
        search_id: record.search_id,
        run_name: record.run_name,
        scan_number: record.scan_number,
        precursor_charge: record.precursor_charge,
        validation: record.validation,
        peptides,
        metadata: record.metadata,
        crosslinks: ThinVec::new(),
        is_decoy,
        could_be_self_link: false,
        could_be_between_link: false,
        confirmed_homomultimer: false,
    })
}

/// One end of a link as explained by a single peptide location
#[derive(Clone, Copy)]
struct LinkEnd {
    protein: ProteinIndex,
    residue: u32,
    position: PeptidePosition,
}

/// Place the match on every link it can explain, creating links as needed.
fn link_match(store: &mut EntityStore, index: MatchIndex) {
    let m = &store.matches[index.0];
    let ends = |peptide: &Peptide| {
        peptide
            .evidence
            .iter()
            .map(|e| LinkEnd {
                protein: e.protein,
                residue: peptide.linked_residue(e),
                position: PeptidePosition {
                    start: e.start,
                    length: peptide.len() as u32,
                },
            })
            .collect_vec()
    };
    let kind = if m.is_crosslinked() {
        LinkKind::CrossLinked
    } else if m.is_mono_link() {
        LinkKind::MonoLink
    } else {
        LinkKind::Linear
    };
    let placements: Vec<(LinkEnd, Option<LinkEnd>)> = match m.peptides.as_slice() {
        [a, b] => ends(a)
            .into_iter()
            .cartesian_product(ends(b))
            .map(|(a, b)| {
                let key = |e: &LinkEnd| (store.proteins[e.protein.0].id.as_str(), e.residue);
                if key(&b) < key(&a) {
                    (b, Some(a))
                } else {
                    (a, Some(b))
                }
            })
            .collect(),
        [a] => ends(a).into_iter().map(|a| (a, None)).collect(),
        _ => Vec::new(),
    };

    for (from, to) in placements {
        let id = match (kind, to) {
            (_, Some(to)) => format!(
                "{}_{}-{}_{}",
                store.proteins[from.protein.0].id,
                from.residue,
                store.proteins[to.protein.0].id,
                to.residue
            ),
            (LinkKind::Linear, None) => {
                format!("{}_{}-linear", store.proteins[from.protein.0].id, from.residue)
            }
            (_, None) => format!("{}_{}", store.proteins[from.protein.0].id, from.residue),
        };
        let link_index = if let Some(existing) = store.crosslink_lookup.get(&id) {
            *existing
        } else {
            let link_index = CrossLinkIndex(store.crosslinks.len());
            store.crosslinks.push(CrossLink {
                id: id.clone(),
                from_protein: from.protein,
                to_protein: to.map(|t| t.protein),
                from_residue: from.residue,
                to_residue: to.map(|t| t.residue),
                kind,
                matches_pp: Vec::new(),
                metadata: MetaMap::new(),
                decoy_class: DecoyClass::default(),
            });
            store.crosslink_lookup.insert(id, link_index);
            store.proteins[from.protein.0].crosslinks.push(link_index);
            if let Some(to) = to.filter(|t| t.protein != from.protein) {
                store.proteins[to.protein.0].crosslinks.push(link_index);
            }
            link_index
        };

        let link = &mut store.crosslinks[link_index.0];
        // A symmetric placement can explain the same link twice
        if link.matches_pp.last().is_some_and(|l| l.match_index == index) {
            continue;
        }
        link.matches_pp.push(LinkedMatch {
            match_index: index,
            peptide_positions: std::iter::once(from.position)
                .chain(to.map(|t| t.position))
                .collect(),
        });
        store.matches[index.0].crosslinks.push(link_index);
    }
}

fn decoy_class(proteins: &[Protein], link: &CrossLink) -> DecoyClass {
    let from = proteins[link.from_protein.0].is_decoy;
    match link.to_protein.map(|to| proteins[to.0].is_decoy) {
        Some(true) if from => DecoyClass::DecoyDecoy,
        Some(to) if to || from => DecoyClass::TargetDecoy,
        None if from => DecoyClass::TargetDecoy,
        _ => DecoyClass::TargetTarget,
    }
}

#[cfg(test)]
#[expect(clippy::missing_panics_doc)]
mod tests {
    use super::*;
    use crate::entity::{MetaData, MetaValue};

    fn proteins() -> EntityStoreBuilder {
        EntityStoreBuilder::new()
            .protein(Protein::new("P1", "Alpha"))
            .protein(Protein::new("P2", "Beta"))
            .protein(Protein::new("D1", "Decoy alpha").decoy(true))
    }

    #[test]
    fn derive_links() {
        let store = proteins()
            .match_record(
                MatchRecord::new("m1", "s1", Some(10.0))
                    .peptide(PeptideRecord::new("PEPKR", "P2", 20, Some(4)))
                    .peptide(PeptideRecord::new("AKR", "P1", 5, Some(2))),
            )
            .match_record(
                MatchRecord::new("m2", "s1", Some(8.0))
                    .peptide(PeptideRecord::new("AKR", "P1", 5, Some(2)))
                    .peptide(PeptideRecord::new("PEPKR", "P2", 20, Some(4))),
            )
            .match_record(
                MatchRecord::new("m3", "s1", Some(3.0))
                    .peptide(PeptideRecord::new("LINEAR", "P1", 40, None)),
            )
            .build()
            .unwrap();
        assert_eq!(store.number_of_crosslinks(), 2);
        let link = &store[store.crosslink_by_id("P1_6-P2_23").unwrap()];
        assert_eq!(link.matches_pp.len(), 2);
        assert_eq!(link.matches_pp[0].peptide_positions[0].start, 5);
        assert_eq!(link.matches_pp[0].peptide_positions[1].length, 5);
        assert!(!link.is_self_link());
        assert_eq!(link.decoy_class(), DecoyClass::TargetTarget);
        let linear = &store[store.crosslink_by_id("P1_40-linear").unwrap()];
        assert!(linear.is_linear_link());
        assert_eq!(store[ProteinIndex(0)].crosslinks().len(), 2);
        assert_eq!(store[ProteinIndex(1)].crosslinks().len(), 1);
        assert!(link.meta_map().is_empty());
    }

    #[test]
    fn ambiguous_and_decoys() {
        let store = proteins()
            .match_record(
                MatchRecord::new("m1", "s1", Some(10.0))
                    .peptide(PeptideRecord::new("AKR", "P1", 5, Some(2)).also_on("D1", 8))
                    .peptide(PeptideRecord::new("PEPKR", "P2", 20, Some(4))),
            )
            .build()
            .unwrap();
        let m = &store[MatchIndex(0)];
        assert!(m.is_ambiguous());
        assert!(!m.is_decoy());
        assert_eq!(m.crosslinks().len(), 2);
        let decoy = &store[store.crosslink_by_id("D1_9-P2_23").unwrap()];
        assert_eq!(decoy.decoy_class(), DecoyClass::TargetDecoy);
    }

    #[test]
    fn homomultimer() {
        let store = proteins()
            .match_record(
                MatchRecord::new("m1", "s1", Some(10.0))
                    .peptide(PeptideRecord::new("AAKAAA", "P1", 10, Some(3)))
                    .peptide(PeptideRecord::new("AKAA", "P1", 11, Some(2))),
            )
            .build()
            .unwrap();
        let m = &store[MatchIndex(0)];
        assert!(m.could_be_self_link());
        assert!(!m.could_be_between_link());
        assert!(m.confirmed_homomultimer());
        assert_eq!(store[m.crosslinks()[0]].id, "P1_12-P1_12");
    }

    #[test]
    fn ambiguous_self_or_between() {
        let store = proteins()
            .match_record(
                MatchRecord::new("m1", "s1", Some(10.0))
                    .peptide(PeptideRecord::new("AKR", "P1", 40, Some(2)).also_on("P2", 70))
                    .peptide(PeptideRecord::new("AKR", "P2", 90, Some(2))),
            )
            .build()
            .unwrap();
        let m = &store[MatchIndex(0)];
        assert!(m.could_be_self_link());
        assert!(m.could_be_between_link());
        assert!(!m.confirmed_homomultimer());
        assert!(!store[store.crosslink_by_id("P1_41-P2_91").unwrap()].is_self_link());
        assert!(store[store.crosslink_by_id("P2_71-P2_91").unwrap()].is_self_link());
    }

    #[test]
    fn link_metadata() {
        let crosslink = || {
            MatchRecord::new("m1", "s1", Some(10.0))
                .peptide(PeptideRecord::new("AKR", "P1", 5, Some(2)))
                .peptide(PeptideRecord::new("PEPKR", "P2", 20, Some(4)))
        };
        let field = |name: &str, value: MetaValue| MetaMap::from([(name.to_string(), value)]);
        let store = proteins()
            .match_record(crosslink())
            .link_metadata("P1_6-P2_23", field("colour", MetaValue::from("red")))
            .link_metadata("P1_6-P2_23", field("distance", MetaValue::from(12.5)))
            .build()
            .unwrap();
        let link = &store[store.crosslink_by_id("P1_6-P2_23").unwrap()];
        assert_eq!(link.meta("colour").and_then(MetaValue::as_text), Some("red"));
        assert_eq!(link.meta_number("distance"), Some(12.5));

        assert!(
            proteins()
                .match_record(crosslink())
                .link_metadata("P1_6-P2_24", MetaMap::new())
                .build()
                .is_err()
        );
    }

    #[test]
    fn residue_overflow() {
        assert!(
            proteins()
                .match_record(
                    MatchRecord::new("m1", "s1", None)
                        .peptide(PeptideRecord::new("AKR", "P1", u32::MAX - 1, Some(2)))
                        .peptide(PeptideRecord::new("AKR", "P2", 5, Some(2)))
                )
                .build()
                .is_err()
        );
        assert!(
            proteins()
                .match_record(
                    MatchRecord::new("m1", "s1", None)
                        .peptide(PeptideRecord::new("K", "P1", u32::MAX, Some(1)))
                )
                .build()
                .is_ok()
        );
    }

    #[test]
    fn invalid_records() {
        assert!(
            proteins()
                .match_record(
                    MatchRecord::new("m1", "s1", None)
                        .peptide(PeptideRecord::new("AKR", "P9", 5, Some(2)))
                )
                .build()
                .is_err()
        );
        assert!(
            proteins()
                .match_record(
                    MatchRecord::new("m1", "s1", None)
                        .peptide(PeptideRecord::new("AKR", "P1", 5, None))
                        .peptide(PeptideRecord::new("AKR", "P2", 5, Some(2)))
                )
                .build()
                .is_err()
        );
        assert!(
            proteins()
                .match_record(MatchRecord::new("m1", "s1", None))
                .build()
                .is_err()
        );
        assert!(
            proteins()
                .protein(Protein::new("P1", "Again"))
                .build()
                .is_err()
        );
    }

    #[test]
    fn records_from_json() {
        let record = MatchRecord::from_json(
            r#"{"id": "m1", "score": 4.2, "search_id": "s1", "validation": "A",
                "peptides": [{"sequence": "AKR", "proteins": ["P1"], "positions": [5], "link_position": 2}]}"#,
        )
        .unwrap();
        assert_eq!(record.validation, ValidationStatus::A);
        let store = proteins().match_record(record).build().unwrap();
        assert!(store[MatchIndex(0)].is_mono_link());
        assert!(store.crosslink_by_id("P1_6").is_some());
    }
}
