use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::entity::{CrossLinkIndex, EntityStore};

/// A cross-link whose confirmed homomultimer state flipped during a filter pass
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct HomomultimerChange {
    /// The link
    pub link: CrossLinkIndex,
    /// The new state
    pub confirmed_homomultimer: bool,
}

/// Supplies the spatial distance of cross-links, for example measured on a loaded structure.
/// Which copy of a repeated protein is used depends on the confirmed homomultimer state of the
/// link, so the provider is told whenever that state flips.
pub trait DistanceProvider {
    /// The current distance of a link, none if it cannot be measured
    fn distance(&self, store: &EntityStore, link: CrossLinkIndex) -> Option<f64>;

    /// Update the distances of the given links after their homomultimer state changed
    fn recalculate(&mut self, _store: &EntityStore, _changed: &[HomomultimerChange]) {}
}

impl<T: DistanceProvider + ?Sized> DistanceProvider for Box<T> {
    fn distance(&self, store: &EntityStore, link: CrossLinkIndex) -> Option<f64> {
        (**self).distance(store, link)
    }

    fn recalculate(&mut self, store: &EntityStore, changed: &[HomomultimerChange]) {
        (**self).recalculate(store, changed);
    }
}

/// No structure loaded, no link has a distance
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct NoDistances;

impl DistanceProvider for NoDistances {
    fn distance(&self, _store: &EntityStore, _link: CrossLinkIndex) -> Option<f64> {
        None
    }
}

/// The shortest distances of a link within one chain and between two copies of the protein
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct LinkDistances {
    /// Both ends on the same chain
    pub same_chain: Option<f64>,
    /// The ends on different chains (of the same protein for self-links)
    pub other_chain: Option<f64>,
}

impl LinkDistances {
    /// Create a new set of distances
    pub const fn new(same_chain: Option<f64>, other_chain: Option<f64>) -> Self {
        Self {
            same_chain,
            other_chain,
        }
    }

    /// The applicable distance. A confirmed homomultimer has to span two chains, otherwise the
    /// shortest known distance is taken.
    pub fn select(&self, confirmed_homomultimer: bool) -> Option<f64> {
        if confirmed_homomultimer {
            self.other_chain
        } else {
            match (self.same_chain, self.other_chain) {
                (Some(a), Some(b)) => Some(a.min(b)),
                (a, b) => a.or(b),
            }
        }
    }
}

/// Precomputed distances per link, switching between the single and multi chain distance
/// whenever the homomultimer state of a link changes
#[derive(Clone, Debug, Default)]
pub struct DistanceTable {
    distances: HashMap<CrossLinkIndex, LinkDistances>,
    homomultimer: HashSet<CrossLinkIndex>,
    recalculated: usize,
}

impl DistanceTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the distances of a link
    #[must_use]
    pub fn with(mut self, link: CrossLinkIndex, distances: LinkDistances) -> Self {
        self.insert(link, distances);
        self
    }

    /// Set the distances of a link
    pub fn insert(&mut self, link: CrossLinkIndex, distances: LinkDistances) {
        self.distances.insert(link, distances);
    }

    /// Set the distances of a link by its id, returns false if the link is unknown
    pub fn insert_by_id(
        &mut self,
        store: &EntityStore,
        id: &str,
        distances: LinkDistances,
    ) -> bool {
        store.crosslink_by_id(id).is_some_and(|link| {
            self.insert(link, distances);
            true
        })
    }

    /// If the table currently treats this link as a confirmed homomultimer
    pub fn is_homomultimer(&self, link: CrossLinkIndex) -> bool {
        self.homomultimer.contains(&link)
    }

    /// The number of link updates handled so far
    pub const fn recalculated(&self) -> usize {
        self.recalculated
    }
}

impl DistanceProvider for DistanceTable {
    fn distance(&self, _store: &EntityStore, link: CrossLinkIndex) -> Option<f64> {
        self.distances
            .get(&link)
            .and_then(|d| d.select(self.is_homomultimer(link)))
    }

    fn recalculate(&mut self, _store: &EntityStore, changed: &[HomomultimerChange]) {
        for change in changed {
            if change.confirmed_homomultimer {
                self.homomultimer.insert(change.link);
            } else {
                self.homomultimer.remove(&change.link);
            }
        }
        self.recalculated += changed.len();
        log::trace!("Recalculated the distances of {} links", changed.len());
    }
}

#[cfg(test)]
#[allow(clippy::missing_panics_doc)]
mod tests {
    use super::*;

    #[test]
    fn select_distance() {
        let d = LinkDistances::new(Some(12.0), Some(30.0));
        assert_eq!(d.select(false), Some(12.0));
        assert_eq!(d.select(true), Some(30.0));
        let d = LinkDistances::new(Some(40.0), Some(8.0));
        assert_eq!(d.select(false), Some(8.0));
        let d = LinkDistances::new(Some(40.0), None);
        assert_eq!(d.select(true), None);
        assert_eq!(LinkDistances::default().select(false), None);
    }

    #[test]
    fn table_follows_homomultimer_state() {
        let store = EntityStore::default();
        let link = CrossLinkIndex(0);
        let mut table = DistanceTable::new().with(link, LinkDistances::new(Some(10.0), Some(45.0)));
        assert_eq!(table.distance(&store, link), Some(10.0));
        table.recalculate(
            &store,
            &[HomomultimerChange {
                link,
                confirmed_homomultimer: true,
            }],
        );
        assert!(table.is_homomultimer(link));
        assert_eq!(table.distance(&store, link), Some(45.0));
        table.recalculate(
            &store,
            &[HomomultimerChange {
                link,
                confirmed_homomultimer: false,
            }],
        );
        assert_eq!(table.distance(&store, link), Some(10.0));
        assert_eq!(table.recalculated(), 2);
        assert_eq!(table.distance(&store, CrossLinkIndex(1)), None);
        assert_eq!(NoDistances.distance(&store, link), None);
    }
}
