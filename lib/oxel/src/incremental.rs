//! Re-priming of already saturated contexts with new rules.
//!
//! Each new rule is joined against the current state to find the contexts it applies to.
//! The matching entries are pushed to those contexts so that the next saturation run
//! reaches the fixpoint of the old and new rules together.

use crate::error::ClassifyError;
use crate::factory::ConceptId;
use crate::normal_form::{
    ConjunctionEntry, FeatureEntry, NormalFormKind, NormalFormRule, RoleEntry,
};
use crate::saturation::Saturation;
use tracing::debug;

/// Pushes to the contexts of `existing` the entries implied by the `delta` rules.
///
/// The rules must already be in the index, the role closure cache must be up to date
/// and `existing` must be the concepts of the previous runs.
///
/// Returns the number of pushed entries per rule kind.
pub(crate) fn reprime(
    saturation: &Saturation<'_>,
    delta: &[NormalFormRule],
    existing: &[ConceptId],
) -> Result<[usize; 8], ClassifyError> {
    let mut pushed = [0; 8];
    let mut role_hierarchy_changed = false;
    for rule in delta {
        role_hierarchy_changed |= rule.kind() == NormalFormKind::Nf4;
        pushed[rule.kind().slot()] += reprime_rule(saturation, rule, existing)?;
    }
    if role_hierarchy_changed {
        pushed[NormalFormKind::Nf4.slot()] = reprime_role_hierarchy(saturation, existing)?;
    }
    for kind in NormalFormKind::ALL {
        if pushed[kind.slot()] > 0 {
            debug!("Re-primed {} {kind:?} entries", pushed[kind.slot()]);
        }
    }
    Ok(pushed)
}

fn reprime_rule(
    saturation: &Saturation<'_>,
    rule: &NormalFormRule,
    existing: &[ConceptId],
) -> Result<usize, ClassifyError> {
    let model = saturation.model();
    let mut pushed = 0;
    match rule {
        NormalFormRule::Nf1 { lhs1, lhs2, rhs } => {
            let (first, second) = match lhs2 {
                Some(lhs2) => (
                    ConjunctionEntry::new(*lhs2, *rhs),
                    Some((*lhs2, ConjunctionEntry::new(*lhs1, *rhs))),
                ),
                None => (ConjunctionEntry::unconditional(*rhs), None),
            };
            for concept in model.subsumptions.subsumed_by(*lhs1) {
                saturation.push_conjunction(concept, first)?;
                pushed += 1;
            }
            if let Some((lhs2, entry)) = second {
                for concept in model.subsumptions.subsumed_by(lhs2) {
                    saturation.push_conjunction(concept, entry)?;
                    pushed += 1;
                }
            }
        }
        NormalFormRule::Nf2 { lhs, role, filler } => {
            for concept in model.subsumptions.subsumed_by(*lhs) {
                saturation.push_role(concept, RoleEntry::new(*role, *filler))?;
                pushed += 1;
            }
        }
        NormalFormRule::Nf3 { role, filler, rhs } => {
            for target in model.subsumptions.subsumed_by(*filler) {
                for source in model.relationships.predecessors(target, *role) {
                    saturation.push_conjunction(source, ConjunctionEntry::unconditional(*rhs))?;
                    pushed += 1;
                }
            }
        }
        // all the new role inclusions are handled at once by reprime_role_hierarchy
        NormalFormRule::Nf4 { .. } => (),
        NormalFormRule::Nf5 { first, second, sup } => {
            for source in model.relationships.sources() {
                for middle in model.relationships.successors(source, *first) {
                    for target in model.relationships.successors(middle, *second) {
                        if !model.relationships.contains(source, *sup, target) {
                            saturation.push_role(source, RoleEntry::new(*sup, target))?;
                            pushed += 1;
                        }
                    }
                }
            }
        }
        NormalFormRule::Nf6 { role } => {
            for concept in existing {
                if !model.relationships.contains(*concept, *role, *concept) {
                    saturation.push_role(*concept, RoleEntry::new(*role, *concept))?;
                    pushed += 1;
                }
            }
        }
        NormalFormRule::Nf7 {
            lhs,
            feature,
            datatype,
        } => {
            for concept in model.subsumptions.subsumed_by(*lhs) {
                saturation.push_feature(
                    concept,
                    FeatureEntry {
                        feature: *feature,
                        datatype: datatype.clone(),
                    },
                )?;
                pushed += 1;
            }
        }
        NormalFormRule::Nf8 {
            feature,
            datatype,
            rhs,
        } => {
            for concept in existing {
                let Some(context) = model.contexts.get(concept.index()) else {
                    return Err(ClassifyError::UnknownConcept(*concept));
                };
                let entails = context
                    .features()
                    .iter()
                    .any(|known| known.feature == *feature && known.datatype.entails(datatype));
                if entails {
                    saturation.push_conjunction(*concept, ConjunctionEntry::unconditional(*rhs))?;
                    pushed += 1;
                }
            }
        }
    }
    Ok(pushed)
}

/// Completes the existing edges with the super roles they now have.
fn reprime_role_hierarchy(
    saturation: &Saturation<'_>,
    existing: &[ConceptId],
) -> Result<usize, ClassifyError> {
    let model = saturation.model();
    let mut pushed = 0;
    for source in existing {
        for (role, target) in model.relationships.edges_from(*source) {
            for sup in &*model.roles.closure(model.index, role) {
                if !model.relationships.contains(*source, *sup, target) {
                    saturation.push_role(*source, RoleEntry::new(*sup, target))?;
                    pushed += 1;
                }
            }
        }
    }
    Ok(pushed)
}
