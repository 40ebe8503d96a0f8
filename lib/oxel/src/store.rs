//! The subsumption (S) and relationship (R) stores.
//!
//! Both are sharded concurrent maps. Guards are never held across calls so that a worker can never
//! deadlock by touching two entries at once: reads either return an owned copy or visit one entry
//! under its guard with a closure that must not touch the stores.

use crate::factory::{ConceptId, RoleId};
use dashmap::DashMap;
use rustc_hash::{FxBuildHasher, FxHashSet};
use std::collections::{BTreeMap, BTreeSet};

/// A sparse set of concepts.
pub type ConceptSet = FxHashSet<ConceptId>;

type Shards<K, V> = DashMap<K, V, FxBuildHasher>;

fn initial_set(concept: ConceptId) -> ConceptSet {
    let mut set = ConceptSet::default();
    set.insert(concept);
    set.insert(ConceptId::TOP);
    set
}

/// The supersumers of each concept.
///
/// The set of `c` always contains `c` itself and the top concept.
#[derive(Debug, Default)]
pub struct SubsumptionStore {
    sets: Shards<ConceptId, ConceptSet>,
}

impl SubsumptionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Initializes the set of `concept` if it was never touched.
    ///
    /// Returns `true` if it was not touched before.
    pub fn init(&self, concept: ConceptId) -> bool {
        let mut inserted = false;
        self.sets.entry(concept).or_insert_with(|| {
            inserted = true;
            initial_set(concept)
        });
        inserted
    }

    /// Adds `parent` to the supersumers of `child`.
    ///
    /// Returns `true` if it was not there yet.
    pub fn add(&self, child: ConceptId, parent: ConceptId) -> bool {
        self.sets
            .entry(child)
            .or_insert_with(|| initial_set(child))
            .insert(parent)
    }

    pub fn contains(&self, child: ConceptId, parent: ConceptId) -> bool {
        parent == child
            || parent == ConceptId::TOP
            || self
                .sets
                .get(&child)
                .is_some_and(|set| set.contains(&parent))
    }

    /// The supersumers of `concept`.
    pub fn get(&self, concept: ConceptId) -> ConceptSet {
        self.sets
            .get(&concept)
            .map_or_else(|| initial_set(concept), |set| set.clone())
    }

    /// Calls `f` on each supersumer of `concept` without copying the set.
    ///
    /// The entry stays read-locked during the visit: `f` must not touch the store.
    pub fn for_each(&self, concept: ConceptId, mut f: impl FnMut(ConceptId)) {
        if let Some(set) = self.sets.get(&concept) {
            set.iter().copied().for_each(f);
        } else {
            f(concept);
            if concept != ConceptId::TOP {
                f(ConceptId::TOP);
            }
        }
    }

    /// Number of supersumers of `concept`.
    pub fn len_of(&self, concept: ConceptId) -> usize {
        self.sets.get(&concept).map_or_else(
            || if concept == ConceptId::TOP { 1 } else { 2 },
            |set| set.len(),
        )
    }

    /// The touched concepts, sorted.
    pub fn keys(&self) -> Vec<ConceptId> {
        let mut keys: Vec<_> = self.sets.iter().map(|entry| *entry.key()).collect();
        keys.sort_unstable();
        keys
    }

    /// The touched concepts that have `parent` as supersumer, sorted.
    pub fn subsumed_by(&self, parent: ConceptId) -> Vec<ConceptId> {
        let mut children: Vec<_> = self
            .sets
            .iter()
            .filter(|entry| entry.value().contains(&parent))
            .map(|entry| *entry.key())
            .collect();
        children.sort_unstable();
        children
    }

    /// An ordered copy of the store.
    pub fn snapshot(&self) -> BTreeMap<ConceptId, BTreeSet<ConceptId>> {
        self.sets
            .iter()
            .map(|entry| (*entry.key(), entry.value().iter().copied().collect()))
            .collect()
    }
}

/// The derived edges `A ⊑ ∃r.B`, indexed in both directions.
#[derive(Debug, Default)]
pub struct RelationshipStore {
    successors: Shards<(ConceptId, RoleId), ConceptSet>,
    predecessors: Shards<(ConceptId, RoleId), ConceptSet>,
    outgoing_roles: Shards<ConceptId, FxHashSet<RoleId>>,
    incoming_roles: Shards<ConceptId, FxHashSet<RoleId>>,
}

impl RelationshipStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `source ⊑ ∃role.target`.
    ///
    /// The successor side is written first and the predecessor side right after.
    /// Returns `true` if the edge is new.
    pub fn store(&self, source: ConceptId, role: RoleId, target: ConceptId) -> bool {
        if !self
            .successors
            .entry((source, role))
            .or_default()
            .insert(target)
        {
            return false;
        }
        self.outgoing_roles.entry(source).or_default().insert(role);
        self.predecessors
            .entry((target, role))
            .or_default()
            .insert(source);
        self.incoming_roles.entry(target).or_default().insert(role);
        true
    }

    pub fn contains(&self, source: ConceptId, role: RoleId, target: ConceptId) -> bool {
        self.successors
            .get(&(source, role))
            .is_some_and(|set| set.contains(&target))
    }

    /// The `B` such that `source ⊑ ∃role.B`.
    pub fn successors(&self, source: ConceptId, role: RoleId) -> ConceptSet {
        self.successors
            .get(&(source, role))
            .map(|set| set.clone())
            .unwrap_or_default()
    }

    /// The `A` such that `A ⊑ ∃role.target`.
    pub fn predecessors(&self, target: ConceptId, role: RoleId) -> ConceptSet {
        self.predecessors
            .get(&(target, role))
            .map(|set| set.clone())
            .unwrap_or_default()
    }

    /// Calls `f` on each `B` such that `source ⊑ ∃role.B`, under the guard of the entry.
    ///
    /// `f` must not touch the store.
    pub fn for_each_successor(&self, source: ConceptId, role: RoleId, f: impl FnMut(ConceptId)) {
        if let Some(set) = self.successors.get(&(source, role)) {
            set.iter().copied().for_each(f);
        }
    }

    /// Calls `f` on each `A` such that `A ⊑ ∃role.target`, under the guard of the entry.
    ///
    /// `f` must not touch the store.
    pub fn for_each_predecessor(&self, target: ConceptId, role: RoleId, f: impl FnMut(ConceptId)) {
        if let Some(set) = self.predecessors.get(&(target, role)) {
            set.iter().copied().for_each(f);
        }
    }

    /// The roles of the edges starting from `source`, sorted.
    pub fn outgoing_roles(&self, source: ConceptId) -> Vec<RoleId> {
        Self::sorted_roles(&self.outgoing_roles, source)
    }

    /// The roles of the edges ending at `target`, sorted.
    pub fn incoming_roles(&self, target: ConceptId) -> Vec<RoleId> {
        Self::sorted_roles(&self.incoming_roles, target)
    }

    fn sorted_roles(roles: &Shards<ConceptId, FxHashSet<RoleId>>, concept: ConceptId) -> Vec<RoleId> {
        let mut roles: Vec<_> = roles
            .get(&concept)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default();
        roles.sort_unstable();
        roles
    }

    /// All the edges starting from `source` as `(role, target)`, sorted.
    pub fn edges_from(&self, source: ConceptId) -> Vec<(RoleId, ConceptId)> {
        let mut edges = Vec::new();
        for role in self.outgoing_roles(source) {
            edges.extend(self.successors(source, role).into_iter().map(|t| (role, t)));
        }
        edges.sort_unstable();
        edges
    }

    /// The concepts that are the source of at least one edge, sorted.
    pub fn sources(&self) -> Vec<ConceptId> {
        let mut sources: Vec<_> = self.outgoing_roles.iter().map(|e| *e.key()).collect();
        sources.sort_unstable();
        sources
    }

    /// Number of edges.
    pub fn len(&self) -> usize {
        self.successors.iter().map(|entry| entry.value().len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.successors.iter().all(|entry| entry.value().is_empty())
    }

    /// An ordered copy of the successor direction: source -> role -> targets.
    pub fn snapshot(&self) -> BTreeMap<ConceptId, BTreeMap<RoleId, BTreeSet<ConceptId>>> {
        let mut snapshot: BTreeMap<_, BTreeMap<_, BTreeSet<_>>> = BTreeMap::new();
        for entry in self.successors.iter() {
            let (source, role) = *entry.key();
            if !entry.value().is_empty() {
                snapshot
                    .entry(source)
                    .or_default()
                    .entry(role)
                    .or_default()
                    .extend(entry.value().iter().copied());
            }
        }
        snapshot
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    const A: ConceptId = ConceptId::new(2);
    const B: ConceptId = ConceptId::new(3);
    const C: ConceptId = ConceptId::new(4);
    const R: RoleId = RoleId::new(0);

    #[test]
    fn subsumptions_are_lazily_initialized() {
        let store = SubsumptionStore::new();
        assert!(store.keys().is_empty());
        assert!(store.contains(A, A));
        assert!(store.contains(A, ConceptId::TOP));
        assert!(!store.contains(A, B));
        assert_eq!(store.get(A), initial_set(A));
        assert_eq!(store.len_of(A), 2);
        // reads do not touch
        assert!(store.keys().is_empty());

        assert!(store.add(A, B));
        assert!(!store.add(A, B));
        assert!(store.contains(A, B));
        assert_eq!(store.len_of(A), 3);
        assert!(store.init(B));
        assert!(!store.init(B));
        assert_eq!(store.keys(), [A, B]);
        assert_eq!(store.subsumed_by(B), [A, B]);
    }

    #[test]
    fn edges_are_stored_in_both_directions() {
        let store = RelationshipStore::new();
        assert!(store.is_empty());
        assert!(store.store(A, R, B));
        assert!(!store.store(A, R, B));
        assert!(store.store(C, R, B));
        assert!(store.contains(A, R, B));
        assert!(!store.contains(B, R, A));
        assert_eq!(store.successors(A, R), [B].into_iter().collect());
        assert_eq!(store.predecessors(B, R), [A, C].into_iter().collect());
        assert!(store.predecessors(A, R).is_empty());
        assert_eq!(store.outgoing_roles(A), [R]);
        assert_eq!(store.incoming_roles(B), [R]);
        assert_eq!(store.edges_from(A), [(R, B)]);
        assert_eq!(store.sources(), [A, C]);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn visits_do_not_copy_and_match_reads() {
        let subsumptions = SubsumptionStore::new();
        let mut visited = Vec::new();
        subsumptions.for_each(A, |parent| visited.push(parent));
        visited.sort_unstable();
        assert_eq!(visited, [ConceptId::TOP, A]);
        assert!(subsumptions.keys().is_empty());

        subsumptions.add(A, B);
        subsumptions.add(A, ConceptId::BOTTOM);
        let mut visited = ConceptSet::default();
        subsumptions.for_each(A, |parent| {
            visited.insert(parent);
        });
        assert_eq!(visited, subsumptions.get(A));

        let mut top = Vec::new();
        subsumptions.for_each(ConceptId::TOP, |parent| top.push(parent));
        assert_eq!(top, [ConceptId::TOP]);

        let relationships = RelationshipStore::new();
        relationships.store(A, R, B);
        relationships.store(A, R, C);
        relationships.store(C, R, B);
        let mut successors = ConceptSet::default();
        relationships.for_each_successor(A, R, |target| {
            successors.insert(target);
        });
        assert_eq!(successors, relationships.successors(A, R));
        let mut predecessors = ConceptSet::default();
        relationships.for_each_predecessor(B, R, |source| {
            predecessors.insert(source);
        });
        assert_eq!(predecessors, [A, C].into_iter().collect());
        let mut none = Vec::new();
        relationships.for_each_successor(B, R, |target| none.push(target));
        relationships.for_each_predecessor(A, R, |source| none.push(source));
        assert!(none.is_empty());
    }

    #[test]
    fn concurrent_writes() {
        let store = Arc::new(RelationshipStore::new());
        let handles: Vec<_> = (10..60)
            .map(|i| {
                let store = Arc::clone(&store);
                thread::spawn(move || store.store(ConceptId::new(i), R, B))
            })
            .collect();
        for handle in handles {
            assert!(handle.join().unwrap());
        }
        assert_eq!(store.predecessors(B, R).len(), 50);
    }
}
