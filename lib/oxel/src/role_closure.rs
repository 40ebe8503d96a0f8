//! Super-role closure of the role inclusions.

use crate::factory::RoleId;
use crate::index::OntologyIndex;
use dashmap::DashMap;
use rustc_hash::{FxBuildHasher, FxHashSet};
use std::collections::VecDeque;
use std::sync::Arc;

/// The sorted set of the roles reachable from a role through role inclusions, the role itself included.
pub type RoleSet = Arc<[RoleId]>;

/// Memoised reflexive transitive closure of the role inclusions.
///
/// The closure is computed by a breadth-first traversal, so inclusion cycles are fine:
/// all the roles of a cycle get the same closure.
/// Two workers may compute the closure of the same role at the same time, they get equal results.
#[derive(Debug, Default)]
pub struct RoleClosure {
    cache: DashMap<RoleId, RoleSet, FxBuildHasher>,
}

impl RoleClosure {
    /// An empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// The super roles of `role`, including `role`.
    pub fn closure(&self, index: &OntologyIndex, role: RoleId) -> RoleSet {
        if let Some(cached) = self.cache.get(&role) {
            return Arc::clone(&cached);
        }
        let computed = Self::compute(index, role);
        self.cache.insert(role, Arc::clone(&computed));
        computed
    }

    /// Is `sub ⊑* sup`?
    pub fn is_sub_role(&self, index: &OntologyIndex, sub: RoleId, sup: RoleId) -> bool {
        sub == sup || self.closure(index, sub).binary_search(&sup).is_ok()
    }

    /// The reflexive roles, including the super roles of the roles declared reflexive.
    pub fn reflexive_roles(&self, index: &OntologyIndex) -> FxHashSet<RoleId> {
        index
            .reflexive_roles()
            .iter()
            .flat_map(|role| self.closure(index, *role).to_vec())
            .collect()
    }

    /// Forgets everything, to be called once new role inclusions are indexed.
    pub fn clear(&self) {
        self.cache.clear();
    }

    /// Number of memoised closures.
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    fn compute(index: &OntologyIndex, role: RoleId) -> RoleSet {
        let mut seen = FxHashSet::default();
        seen.insert(role);
        let mut to_visit = VecDeque::from([role]);
        while let Some(current) = to_visit.pop_front() {
            for sup in index.super_roles(current) {
                if seen.insert(*sup) {
                    to_visit.push_back(*sup);
                }
            }
        }
        let mut roles: Vec<_> = seen.into_iter().collect();
        roles.sort_unstable();
        roles.into()
    }
}
