//! Shared fixtures for the integration tests
#![allow(dead_code)]
use std::{cell::RefCell, rc::Rc};

use xiview::{
    distance::HomomultimerChange,
    entity::{MatchRecord, PeptideRecord},
    prelude::*,
};

/// A cross-linked match between two residues, every peptide is three residues long with the link
/// on the middle residue, so the linked residue is `position + 1`
pub(crate) fn crosslink(id: &str, score: f64, from: (&str, u32), to: (&str, u32)) -> MatchRecord {
    MatchRecord::new(id, "search", Some(score))
        .peptide(PeptideRecord::new("AKR", from.0, from.1, Some(2)))
        .peptide(PeptideRecord::new("GKL", to.0, to.1, Some(2)))
}

/// A linear match
pub(crate) fn linear(id: &str, score: f64, protein: &str, position: u32) -> MatchRecord {
    MatchRecord::new(id, "search", Some(score))
        .peptide(PeptideRecord::new("PEPTIDE", protein, position, None))
}

/// Start a builder with the given target proteins and decoy proteins
pub(crate) fn builder(targets: &[&str], decoys: &[&str]) -> EntityStoreBuilder {
    let mut builder = EntityStoreBuilder::new();
    builder.add_proteins(targets.iter().map(|id| Protein::new(*id, format!("Protein {id}"))));
    builder.add_proteins(
        decoys
            .iter()
            .map(|id| Protein::new(*id, format!("Decoy {id}")).decoy(true)),
    );
    builder
}

/// Three target links with two matches each and two decoy links with one match each
pub(crate) fn target_decoy_store() -> EntityStore {
    builder(&["P1", "P2"], &["D1"])
        .match_record(crosslink("t1a", 10.0, ("P1", 10), ("P2", 20)))
        .match_record(crosslink("t1b", 8.0, ("P1", 10), ("P2", 20)))
        .match_record(crosslink("t2a", 9.0, ("P1", 30), ("P2", 40)))
        .match_record(crosslink("t2b", 7.0, ("P1", 30), ("P2", 40)))
        .match_record(crosslink("t3a", 6.0, ("P1", 50), ("P2", 60)))
        .match_record(crosslink("t3b", 5.0, ("P1", 50), ("P2", 60)))
        .match_record(crosslink("d1", 4.0, ("P1", 70), ("D1", 10)))
        .match_record(crosslink("d2", 3.0, ("P2", 70), ("D1", 20)))
        .build()
        .unwrap()
}

/// The ids of the links in a bucket
pub(crate) fn bucket_ids<D: DistanceProvider>(model: &CompositeModel<D>, bucket: Bucket) -> Vec<String> {
    model
        .filtered_crosslinks(bucket)
        .iter()
        .map(|l| model.store()[*l].id.clone())
        .collect()
}

/// A distance provider that remembers every recalculation request
#[derive(Clone, Debug, Default)]
pub(crate) struct RecordingDistances {
    pub(crate) distances: Vec<(CrossLinkIndex, f64)>,
    pub(crate) requests: Rc<RefCell<Vec<Vec<HomomultimerChange>>>>,
}

impl DistanceProvider for RecordingDistances {
    fn distance(&self, _store: &EntityStore, link: CrossLinkIndex) -> Option<f64> {
        self.distances
            .iter()
            .find(|(l, _)| *l == link)
            .map(|(_, d)| *d)
    }

    fn recalculate(&mut self, _store: &EntityStore, changed: &[HomomultimerChange]) {
        self.requests.borrow_mut().push(changed.to_vec());
    }
}

/// Count how often a notification fires
#[derive(Clone, Debug, Default)]
pub(crate) struct Counter(Rc<RefCell<usize>>);

impl Counter {
    pub(crate) fn hit(&self) {
        *self.0.borrow_mut() += 1;
    }

    pub(crate) fn get(&self) -> usize {
        *self.0.borrow()
    }
}
