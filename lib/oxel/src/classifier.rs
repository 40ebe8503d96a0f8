//! The classification facade.

use crate::config::ClassifierConfig;
use crate::context::Context;
use crate::error::ClassifyError;
use crate::expression::Axiom;
use crate::factory::{ConceptId, Factory, RoleId};
use crate::incremental;
use crate::index::OntologyIndex;
use crate::normal_form::{NormalFormKind, NormalFormRule};
use crate::normaliser::Normaliser;
use crate::role_closure::{RoleClosure, RoleSet};
use crate::saturation::{Model, Saturation, SaturationStats};
use crate::store::{ConceptSet, RelationshipStore, SubsumptionStore};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use tracing::{debug, info};

/// An EL+ classifier.
///
/// It computes all the subsumptions entailed by the given axioms and keeps them around
/// so that new axioms can later be added without starting from scratch.
///
/// ```
/// use oxel::{Axiom, Classifier, ClassifierConfig, Concept};
///
/// let mut classifier = Classifier::new(ClassifierConfig::default());
/// let factory = classifier.factory_mut();
/// let (heart, organ, part_of) = (factory.concept("Heart")?, factory.concept("Organ")?, factory.role("partOf")?);
/// let body = factory.concept("Body")?;
/// let organ_of_body = factory.concept("BodyOrgan")?;
/// classifier.classify(&[
///     Axiom::subsumption(heart, Concept::and([Concept::atom(organ), Concept::some(part_of, body)])),
///     Axiom::equivalence(organ_of_body, Concept::and([Concept::atom(organ), Concept::some(part_of, body)])),
/// ])?;
/// assert!(classifier.is_subsumed_by(heart, organ_of_body)?);
/// # Result::<_, oxel::ClassifyError>::Ok(())
/// ```
pub struct Classifier {
    config: ClassifierConfig,
    factory: Factory,
    normaliser: Normaliser,
    index: OntologyIndex,
    contexts: Vec<Context>,
    subsumptions: SubsumptionStore,
    relationships: RelationshipStore,
    roles: RoleClosure,
    new_concepts: Vec<ConceptId>,
    affected_concepts: Vec<ConceptId>,
    stats: Option<SaturationStats>,
    poisoned: bool,
}

impl Classifier {
    /// Builds a classifier with an empty factory.
    pub fn new(config: ClassifierConfig) -> Self {
        Self::with_factory(Factory::new(), config)
    }

    /// Builds a classifier over an already filled factory.
    pub fn with_factory(factory: Factory, config: ClassifierConfig) -> Self {
        Self {
            index: OntologyIndex::new(config.nf3_discipline),
            config,
            factory,
            normaliser: Normaliser::new(),
            contexts: Vec::new(),
            subsumptions: SubsumptionStore::new(),
            relationships: RelationshipStore::new(),
            roles: RoleClosure::new(),
            new_concepts: Vec::new(),
            affected_concepts: Vec::new(),
            stats: None,
            poisoned: false,
        }
    }

    /// The configuration the classifier was built with.
    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    /// The names and ids of the concepts, roles and features.
    pub fn factory(&self) -> &Factory {
        &self.factory
    }

    /// The factory to intern the names used by the next axioms.
    pub fn factory_mut(&mut self) -> &mut Factory {
        &mut self.factory
    }

    /// The normal form rules of all the axioms classified so far.
    pub fn index(&self) -> &OntologyIndex {
        &self.index
    }

    /// Classifies the given axioms.
    ///
    /// If axioms have already been classified, the new ones are added to them
    /// like [`classify_incremental`](Self::classify_incremental) does.
    pub fn classify<'a>(
        &mut self,
        axioms: impl IntoIterator<Item = &'a Axiom>,
    ) -> Result<SaturationStats, ClassifyError> {
        self.saturate(axioms)
    }

    /// Adds axioms to the already classified ones.
    ///
    /// Only the contexts the new axioms apply to are saturated again.
    /// The result is the same as a full classification of all the axioms.
    /// [`new_concepts`](Self::new_concepts) and [`affected_concepts`](Self::affected_concepts)
    /// then tell which concepts need to be updated in a taxonomy.
    pub fn classify_incremental<'a>(
        &mut self,
        axioms: impl IntoIterator<Item = &'a Axiom>,
    ) -> Result<SaturationStats, ClassifyError> {
        self.saturate(axioms)
    }

    fn saturate<'a>(
        &mut self,
        axioms: impl IntoIterator<Item = &'a Axiom>,
    ) -> Result<SaturationStats, ClassifyError> {
        if self.poisoned {
            return Err(ClassifyError::Poisoned);
        }
        // Cleared once the run succeeded
        self.poisoned = true;
        self.new_concepts.clear();
        self.affected_concepts.clear();
        self.stats = None;

        let normalisation = self.normaliser.normalise(axioms, &mut self.factory)?;
        let mut delta = Vec::new();
        for rule in normalisation.rules {
            if self.index.add_rule(&rule)? {
                delta.push(rule);
            }
        }
        self.report(format_args!(
            "{} new normal form rules, {} new virtual concepts, {} rules in total",
            delta.len(),
            normalisation.new_virtual_concepts.len(),
            self.index.len()
        ));
        if delta.iter().any(|rule| rule.kind() == NormalFormKind::Nf4) {
            self.roles.clear();
        }

        let incremental = !self.contexts.is_empty();
        let known = self.contexts.len();
        self.grow_contexts();
        let (existing, new_concepts): (Vec<_>, Vec<_>) = self
            .factory
            .concepts()
            .partition(|concept| concept.index() < known);
        let model = Model {
            index: &self.index,
            contexts: &self.contexts,
            subsumptions: &self.subsumptions,
            relationships: &self.relationships,
            roles: &self.roles,
        };
        let saturation = Saturation::new(model, &self.config, incremental);
        if incremental {
            incremental::reprime(&saturation, &delta, &existing)?;
        }
        for concept in &new_concepts {
            saturation.prime(*concept)?;
        }
        let workers = self.config.worker_count();
        debug!("Saturating with {workers} workers");
        let stats = saturation.run(workers)?;

        for context in &mut self.contexts {
            if let Some(size) = context.untrack() {
                let concept = context.concept();
                if concept.index() < known && self.subsumptions.len_of(concept) > size {
                    self.affected_concepts.push(concept);
                }
            }
        }
        info!(
            "Classification done: {} new concepts, {} affected concepts, {stats}",
            new_concepts.len(),
            self.affected_concepts.len()
        );
        self.new_concepts = new_concepts;
        self.stats = Some(stats);
        self.factory.extend();
        self.poisoned = false;
        Ok(stats)
    }

    /// Creates the contexts of the ids allocated since the last run.
    ///
    /// Contexts are indexed by id, so the ids reserved by [`Factory::with_offsets`] get one too.
    /// They are never primed.
    fn grow_contexts(&mut self) {
        let start = u32::try_from(self.contexts.len()).unwrap_or(u32::MAX);
        for id in start..self.factory.total_concepts() {
            self.contexts.push(Context::new(ConceptId::new(id)));
        }
    }

    fn report(&self, message: fmt::Arguments<'_>) {
        if self.config.verbose {
            info!("{message}");
        } else {
            debug!("{message}");
        }
    }

    fn check_usable(&self) -> Result<(), ClassifyError> {
        if self.poisoned {
            Err(ClassifyError::Poisoned)
        } else {
            Ok(())
        }
    }

    /// Is the classifier unusable because a classification failed?
    pub fn is_poisoned(&self) -> bool {
        self.poisoned
    }

    /// Statistics of the last saturation run, `None` if it failed.
    pub fn stats(&self) -> Option<SaturationStats> {
        self.stats
    }

    /// Every concept with its supersumers.
    pub fn subsumptions(&self) -> Result<BTreeMap<ConceptId, BTreeSet<ConceptId>>, ClassifyError> {
        self.check_usable()?;
        Ok(self.subsumptions.snapshot())
    }

    /// The subsumption store itself.
    pub fn subsumption_store(&self) -> Result<&SubsumptionStore, ClassifyError> {
        self.check_usable()?;
        Ok(&self.subsumptions)
    }

    /// The derived edges `A ⊑ ∃r.B`.
    pub fn relationships(&self) -> Result<&RelationshipStore, ClassifyError> {
        self.check_usable()?;
        Ok(&self.relationships)
    }

    /// The supersumers of `concept`, including itself and the top concept.
    pub fn supersumers(&self, concept: ConceptId) -> Result<ConceptSet, ClassifyError> {
        self.check_usable()?;
        self.factory.check_concept(concept)?;
        Ok(self.subsumptions.get(concept))
    }

    /// Is `sub ⊑ sup` entailed?
    pub fn is_subsumed_by(&self, sub: ConceptId, sup: ConceptId) -> Result<bool, ClassifyError> {
        self.check_usable()?;
        Ok(self.subsumptions.contains(sub, sup))
    }

    /// The concepts created by the last run.
    ///
    /// Empty after a failed run.
    pub fn new_concepts(&self) -> &[ConceptId] {
        &self.new_concepts
    }

    /// The concepts of previous runs whose supersumers changed during the last run.
    pub fn affected_concepts(&self) -> &[ConceptId] {
        &self.affected_concepts
    }

    /// The supersumers of the concepts created by the last run.
    pub fn new_subsumptions(&self) -> Result<BTreeMap<ConceptId, BTreeSet<ConceptId>>, ClassifyError> {
        self.check_usable()?;
        Ok(self.collect_subsumptions(&self.new_concepts))
    }

    /// The supersumers of the concepts affected by the last run.
    pub fn affected_subsumptions(
        &self,
    ) -> Result<BTreeMap<ConceptId, BTreeSet<ConceptId>>, ClassifyError> {
        self.check_usable()?;
        Ok(self.collect_subsumptions(&self.affected_concepts))
    }

    fn collect_subsumptions(
        &self,
        concepts: &[ConceptId],
    ) -> BTreeMap<ConceptId, BTreeSet<ConceptId>> {
        concepts
            .iter()
            .map(|concept| {
                (
                    *concept,
                    self.subsumptions.get(*concept).into_iter().collect(),
                )
            })
            .collect()
    }

    /// The subsumptions between named concepts, by name.
    ///
    /// Virtual concepts do not depend on the order the axioms were given in, so this view does not either.
    pub fn named_subsumptions(
        &self,
    ) -> Result<BTreeMap<String, BTreeSet<String>>, ClassifyError> {
        self.check_usable()?;
        Ok(self
            .subsumptions
            .keys()
            .into_iter()
            .filter_map(|concept| {
                let name = self.named_concept(concept)?;
                let supersumers = self
                    .subsumptions
                    .get(concept)
                    .into_iter()
                    .filter_map(|parent| self.named_concept(parent).map(str::to_owned))
                    .collect();
                Some((name.to_owned(), supersumers))
            })
            .collect())
    }

    /// The edges between named concepts through named roles, as `(source, role, target)` names.
    pub fn named_relationships(&self) -> Result<BTreeSet<(String, String, String)>, ClassifyError> {
        self.check_usable()?;
        let mut named = BTreeSet::new();
        for source in self.relationships.sources() {
            let Some(source_name) = self.named_concept(source) else {
                continue;
            };
            for (role, target) in self.relationships.edges_from(source) {
                if self.factory.is_virtual_role(role) {
                    continue;
                }
                if let (Some(role_name), Some(target_name)) =
                    (self.factory.role_name(role), self.named_concept(target))
                {
                    named.insert((
                        source_name.to_owned(),
                        role_name.to_owned(),
                        target_name.to_owned(),
                    ));
                }
            }
        }
        Ok(named)
    }

    fn named_concept(&self, concept: ConceptId) -> Option<&str> {
        if self.factory.is_virtual_concept(concept) {
            return None;
        }
        self.factory.concept_name(concept)
    }

    /// The concepts subsumed by the bottom concept, except the bottom concept itself.
    pub fn unsatisfiable(&self) -> Result<Vec<ConceptId>, ClassifyError> {
        self.check_usable()?;
        let mut unsatisfiable = self.subsumptions.subsumed_by(ConceptId::BOTTOM);
        unsatisfiable.retain(|concept| *concept != ConceptId::BOTTOM);
        Ok(unsatisfiable)
    }

    /// The super roles of `role`, including itself.
    pub fn role_closure(&self, role: RoleId) -> Result<RoleSet, ClassifyError> {
        self.factory.check_role(role)?;
        Ok(self.roles.closure(&self.index, role))
    }

    /// The edges of `concept` that are not implied by another of its edges.
    ///
    /// `(r, B)` is implied by `(s, C)` if `s ⊑* r` and `C ⊑ B`.
    /// Among edges implying each other, the smallest one is kept.
    /// Self edges through reflexive roles are left out.
    pub fn distribution_form(
        &self,
        concept: ConceptId,
    ) -> Result<Vec<(RoleId, ConceptId)>, ClassifyError> {
        self.check_usable()?;
        self.factory.check_concept(concept)?;
        let reflexive = self.roles.reflexive_roles(&self.index);
        let edges: Vec<_> = self
            .relationships
            .edges_from(concept)
            .into_iter()
            .filter(|(role, target)| !(*target == concept && reflexive.contains(role)))
            .collect();
        let implies = |(s, c): (RoleId, ConceptId), (r, b): (RoleId, ConceptId)| {
            self.roles.is_sub_role(&self.index, s, r) && self.subsumptions.contains(c, b)
        };
        Ok(edges
            .iter()
            .filter(|edge| {
                !edges.iter().any(|other| {
                    other != *edge
                        && implies(*other, **edge)
                        && (!implies(**edge, *other) || other < *edge)
                })
            })
            .copied()
            .collect())
    }

    /// Number of normal form rules of each kind.
    pub fn rule_counts(&self) -> BTreeMap<NormalFormKind, usize> {
        NormalFormKind::ALL
            .into_iter()
            .map(|kind| (kind, self.index.count(kind)))
            .collect()
    }

    /// Does the index contain this rule?
    pub fn has_rule(&self, rule: &NormalFormRule) -> bool {
        self.index.contains(rule)
    }
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new(ClassifierConfig::default())
    }
}

impl fmt::Debug for Classifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Classifier")
            .field("config", &self.config)
            .field("concepts", &self.contexts.len())
            .field("rules", &self.index.len())
            .field("edges", &self.relationships.len())
            .field("poisoned", &self.poisoned)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datatype::Operator;
    use crate::expression::Concept;

    #[test]
    fn poisoned_after_failure() -> Result<(), ClassifyError> {
        let mut classifier = Classifier::new(ClassifierConfig::single_threaded().with_max_iterations(1));
        let a = classifier.factory_mut().concept("A")?;
        let b = classifier.factory_mut().concept("B")?;
        let c = classifier.factory_mut().concept("C")?;
        let error = classifier
            .classify(&[Axiom::subsumption(a, b), Axiom::subsumption(b, c)])
            .unwrap_err();
        assert!(matches!(error, ClassifyError::IterationLimitExceeded { .. }));
        assert!(classifier.is_poisoned());
        assert!(matches!(classifier.classify(&[] as &[Axiom]), Err(ClassifyError::Poisoned)));
        assert!(matches!(classifier.subsumptions(), Err(ClassifyError::Poisoned)));
        assert!(matches!(classifier.supersumers(a), Err(ClassifyError::Poisoned)));
        assert!(matches!(classifier.is_subsumed_by(a, c), Err(ClassifyError::Poisoned)));
        assert!(matches!(classifier.relationships(), Err(ClassifyError::Poisoned)));
        assert!(matches!(classifier.subsumption_store(), Err(ClassifyError::Poisoned)));
        assert!(matches!(classifier.unsatisfiable(), Err(ClassifyError::Poisoned)));
        assert!(matches!(classifier.named_subsumptions(), Err(ClassifyError::Poisoned)));
        assert!(matches!(classifier.distribution_form(a), Err(ClassifyError::Poisoned)));
        assert!(classifier.new_concepts().is_empty());
        assert!(classifier.affected_concepts().is_empty());
        assert!(classifier.stats().is_none());
        Ok(())
    }

    #[test]
    fn failed_run_clears_the_previous_reports() -> Result<(), ClassifyError> {
        let mut classifier = Classifier::new(ClassifierConfig::single_threaded());
        let a = classifier.factory_mut().concept("A")?;
        let b = classifier.factory_mut().concept("B")?;
        let flag = classifier.factory_mut().feature("flag")?;
        classifier.classify(&[Axiom::subsumption(a, b)])?;
        assert!(!classifier.new_concepts().is_empty());

        let c = classifier.factory_mut().concept("C")?;
        let error = classifier
            .classify_incremental(&[
                Axiom::subsumption(b, c),
                Axiom::subsumption(c, Concept::datatype(flag, Operator::LessThan, true)),
            ])
            .unwrap_err();
        assert!(matches!(error, ClassifyError::MalformedAxiom { .. }));
        assert!(classifier.is_poisoned());
        assert!(classifier.new_concepts().is_empty());
        assert!(classifier.affected_concepts().is_empty());
        assert!(matches!(classifier.is_subsumed_by(a, b), Err(ClassifyError::Poisoned)));
        Ok(())
    }

    #[test]
    fn new_and_affected_concepts() -> Result<(), ClassifyError> {
        let mut classifier = Classifier::new(ClassifierConfig::single_threaded());
        let a = classifier.factory_mut().concept("A")?;
        let b = classifier.factory_mut().concept("B")?;
        classifier.classify(&[Axiom::subsumption(a, b)])?;
        assert_eq!(classifier.new_concepts().len(), 4);
        assert!(classifier.affected_concepts().is_empty());

        let c = classifier.factory_mut().concept("C")?;
        classifier.classify_incremental(&[Axiom::subsumption(b, c)])?;
        assert_eq!(classifier.new_concepts(), [c]);
        assert_eq!(classifier.affected_concepts(), [a, b]);
        assert!(classifier.is_subsumed_by(a, c)?);
        let affected = classifier.affected_subsumptions()?;
        assert!(affected[&a].contains(&c));
        let new = classifier.new_subsumptions()?;
        assert_eq!(new[&c], BTreeSet::from([ConceptId::TOP, c]));
        Ok(())
    }

    #[test]
    fn unknown_ids_are_rejected() -> Result<(), ClassifyError> {
        let mut classifier = Classifier::default();
        let a = classifier.factory_mut().concept("A")?;
        classifier.classify(&[Axiom::subsumption(a, Concept::top())])?;
        assert!(matches!(
            classifier.supersumers(ConceptId::new(100)),
            Err(ClassifyError::UnknownConcept(_))
        ));
        assert!(matches!(
            classifier.role_closure(RoleId::new(3)),
            Err(ClassifyError::UnknownRole(_))
        ));
        assert!(!classifier.is_poisoned());
        Ok(())
    }
}
