//! The rule database: normal form rules indexed by the concept, role or feature that triggers them.

use crate::datatype::Datatype;
use crate::error::ClassifyError;
use crate::factory::{ConceptId, FeatureId, RoleId};
use crate::normal_form::{
    ConjunctionEntry, FeatureEntry, NormalFormKind, NormalFormRule, RoleEntry,
};
use rustc_hash::{FxHashMap, FxHashSet};

/// How many `∃r.A ⊑ B` rules may share the same `r` and `A`.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Default)]
pub enum Nf3Discipline {
    /// Any number of rules.
    #[default]
    Multiple,
    /// At most one right-hand side per role and filler. A second, different one is an error.
    Single,
}

/// Normal form rules indexed for saturation.
///
/// The index only grows. All lookups return empty slices for unknown keys.
#[derive(Debug, Default)]
pub struct OntologyIndex {
    discipline: Nf3Discipline,
    rules: FxHashSet<NormalFormRule>,
    counts: [usize; 8],
    /// NF1, by each conjunct of the left-hand side.
    conjunctions: FxHashMap<ConceptId, Vec<ConjunctionEntry>>,
    /// NF2, by left-hand side.
    existentials: FxHashMap<ConceptId, Vec<RoleEntry>>,
    /// NF3, by filler then role.
    restrictions: FxHashMap<ConceptId, FxHashMap<RoleId, Vec<ConceptId>>>,
    /// NF4, from sub role to its direct super roles.
    super_roles: FxHashMap<RoleId, Vec<RoleId>>,
    /// NF5 `r ∘ s ⊑ t` as `r -> (s, t)`.
    chains_by_first: FxHashMap<RoleId, Vec<(RoleId, RoleId)>>,
    /// NF5 `r ∘ s ⊑ t` as `s -> (r, t)`.
    chains_by_second: FxHashMap<RoleId, Vec<(RoleId, RoleId)>>,
    /// NF6, in insertion order.
    reflexive: Vec<RoleId>,
    /// NF7, by left-hand side.
    features: FxHashMap<ConceptId, Vec<FeatureEntry>>,
    /// NF8, by feature.
    feature_rules: FxHashMap<FeatureId, Vec<(Datatype, ConceptId)>>,
}

impl OntologyIndex {
    pub fn new(discipline: Nf3Discipline) -> Self {
        Self {
            discipline,
            ..Self::default()
        }
    }

    /// Adds a rule to the index.
    ///
    /// Returns `false` if the rule was already there.
    pub fn add_rule(&mut self, rule: &NormalFormRule) -> Result<bool, ClassifyError> {
        if self.rules.contains(rule) {
            return Ok(false);
        }
        match rule {
            NormalFormRule::Nf1 { lhs1, lhs2, rhs } => {
                if let Some(lhs2) = lhs2 {
                    self.conjunctions
                        .entry(*lhs1)
                        .or_default()
                        .push(ConjunctionEntry::new(*lhs2, *rhs));
                    self.conjunctions
                        .entry(*lhs2)
                        .or_default()
                        .push(ConjunctionEntry::new(*lhs1, *rhs));
                } else {
                    self.conjunctions
                        .entry(*lhs1)
                        .or_default()
                        .push(ConjunctionEntry::unconditional(*rhs));
                }
            }
            NormalFormRule::Nf2 { lhs, role, filler } => self
                .existentials
                .entry(*lhs)
                .or_default()
                .push(RoleEntry::new(*role, *filler)),
            NormalFormRule::Nf3 { role, filler, rhs } => {
                let entries = self
                    .restrictions
                    .entry(*filler)
                    .or_default()
                    .entry(*role)
                    .or_default();
                if self.discipline == Nf3Discipline::Single {
                    if let Some(existing) = entries.first() {
                        return Err(ClassifyError::Nf3Conflict {
                            concept: *filler,
                            role: *role,
                            existing: *existing,
                            conflicting: *rhs,
                        });
                    }
                }
                entries.push(*rhs);
            }
            NormalFormRule::Nf4 { sub, sup } => {
                self.super_roles.entry(*sub).or_default().push(*sup);
            }
            NormalFormRule::Nf5 { first, second, sup } => {
                self.chains_by_first
                    .entry(*first)
                    .or_default()
                    .push((*second, *sup));
                self.chains_by_second
                    .entry(*second)
                    .or_default()
                    .push((*first, *sup));
            }
            NormalFormRule::Nf6 { role } => self.reflexive.push(*role),
            NormalFormRule::Nf7 {
                lhs,
                feature,
                datatype,
            } => self.features.entry(*lhs).or_default().push(FeatureEntry {
                feature: *feature,
                datatype: datatype.clone(),
            }),
            NormalFormRule::Nf8 {
                feature,
                datatype,
                rhs,
            } => self
                .feature_rules
                .entry(*feature)
                .or_default()
                .push((datatype.clone(), *rhs)),
        }
        self.counts[rule.kind().slot()] += 1;
        self.rules.insert(rule.clone());
        Ok(true)
    }

    /// Is this rule already indexed?
    pub fn contains(&self, rule: &NormalFormRule) -> bool {
        self.rules.contains(rule)
    }

    /// Number of distinct indexed rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Has no rule been indexed yet?
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Number of rules of the given kind.
    pub fn count(&self, kind: NormalFormKind) -> usize {
        self.counts[kind.slot()]
    }

    /// How NF3 rules are keyed.
    pub fn discipline(&self) -> Nf3Discipline {
        self.discipline
    }

    /// NF1 entries to trigger once `concept` subsumes a context.
    pub fn conjunctions(&self, concept: ConceptId) -> &[ConjunctionEntry] {
        self.conjunctions.get(&concept).map_or(&[], Vec::as_slice)
    }

    /// NF2 entries to trigger once `concept` subsumes a context.
    pub fn existentials(&self, concept: ConceptId) -> &[RoleEntry] {
        self.existentials.get(&concept).map_or(&[], Vec::as_slice)
    }

    /// Right-hand sides of the NF3 rules `∃role.filler ⊑ B`.
    pub fn restrictions(&self, filler: ConceptId, role: RoleId) -> &[ConceptId] {
        self.restrictions
            .get(&filler)
            .and_then(|by_role| by_role.get(&role))
            .map_or(&[], Vec::as_slice)
    }

    /// All the NF3 rules having `filler` as filler, grouped by role.
    pub fn restrictions_by_role(
        &self,
        filler: ConceptId,
    ) -> impl Iterator<Item = (RoleId, &[ConceptId])> + '_ {
        self.restrictions
            .get(&filler)
            .into_iter()
            .flatten()
            .map(|(role, rhs)| (*role, rhs.as_slice()))
    }

    /// Direct super roles of `role` (NF4).
    pub fn super_roles(&self, role: RoleId) -> &[RoleId] {
        self.super_roles.get(&role).map_or(&[], Vec::as_slice)
    }

    /// `(s, t)` for every `role ∘ s ⊑ t`.
    pub fn chains_by_first(&self, role: RoleId) -> &[(RoleId, RoleId)] {
        self.chains_by_first.get(&role).map_or(&[], Vec::as_slice)
    }

    /// `(r, t)` for every `r ∘ role ⊑ t`.
    pub fn chains_by_second(&self, role: RoleId) -> &[(RoleId, RoleId)] {
        self.chains_by_second.get(&role).map_or(&[], Vec::as_slice)
    }

    pub fn reflexive_roles(&self) -> &[RoleId] {
        &self.reflexive
    }

    /// NF7 entries to trigger once `concept` subsumes a context.
    pub fn features(&self, concept: ConceptId) -> &[FeatureEntry] {
        self.features.get(&concept).map_or(&[], Vec::as_slice)
    }

    /// NF8 rules on `feature`.
    pub fn feature_rules(&self, feature: FeatureId) -> &[(Datatype, ConceptId)] {
        self.feature_rules.get(&feature).map_or(&[], Vec::as_slice)
    }

    /// The rules of the given kind indexed under `concept`.
    ///
    /// Only NF1, NF2, NF3 and NF7 are indexed by concept, other kinds yield nothing.
    pub fn rules_for_concept(
        &self,
        concept: ConceptId,
        kind: NormalFormKind,
    ) -> Box<dyn Iterator<Item = NormalFormRule> + '_> {
        match kind {
            NormalFormKind::Nf1 => Box::new(self.conjunctions(concept).iter().map(move |e| {
                if e.conjunct == ConceptId::TOP {
                    NormalFormRule::subsumption(concept, e.consequence)
                } else {
                    NormalFormRule::conjunction(concept, e.conjunct, e.consequence)
                }
            })),
            NormalFormKind::Nf2 => Box::new(self.existentials(concept).iter().map(move |e| {
                NormalFormRule::Nf2 {
                    lhs: concept,
                    role: e.role,
                    filler: e.filler,
                }
            })),
            NormalFormKind::Nf3 => Box::new(self.restrictions_by_role(concept).flat_map(
                move |(role, rhs)| {
                    rhs.iter().map(move |rhs| NormalFormRule::Nf3 {
                        role,
                        filler: concept,
                        rhs: *rhs,
                    })
                },
            )),
            NormalFormKind::Nf7 => Box::new(self.features(concept).iter().map(move |e| {
                NormalFormRule::Nf7 {
                    lhs: concept,
                    feature: e.feature,
                    datatype: e.datatype.clone(),
                }
            })),
            NormalFormKind::Nf4
            | NormalFormKind::Nf5
            | NormalFormKind::Nf6
            | NormalFormKind::Nf8 => Box::new(std::iter::empty()),
        }
    }
}
