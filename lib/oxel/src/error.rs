//! Errors of the EL+ classifier.

use crate::factory::{ConceptId, FeatureId, RoleId};

/// An error raised while normalising, indexing or saturating an ontology.
///
/// Classification errors are never partial: once one is returned, the facts already stored by the
/// [`Classifier`](crate::Classifier) are not to be trusted and every later call fails with
/// [`ClassifyError::Poisoned`].
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ClassifyError {
    /// The axiom cannot be rewritten into the supported normal forms.
    #[error("Malformed axiom: {reason}")]
    MalformedAxiom { reason: String },
    /// Two existential left-hand rules share the same filler and role while the index only allows one.
    #[error(
        "Unsupported EL+ fragment: some {role}.{concept} is already subsumed by {existing}, cannot also be subsumed by {conflicting}"
    )]
    Nf3Conflict {
        concept: ConceptId,
        role: RoleId,
        existing: ConceptId,
        conflicting: ConceptId,
    },
    /// The concept id has not been allocated by the factory.
    #[error("The concept id {0} has not been allocated")]
    UnknownConcept(ConceptId),
    /// The role id has not been allocated by the factory.
    #[error("The role id {0} has not been allocated")]
    UnknownRole(RoleId),
    /// The feature id has not been allocated by the factory.
    #[error("The feature id {0} has not been allocated")]
    UnknownFeature(FeatureId),
    /// No more ids can be allocated.
    #[error("The {kind} id space is exhausted")]
    IdSpaceExhausted { kind: &'static str },
    /// Saturation processed more queue entries than allowed by the configuration.
    #[error("Saturation exceeded the limit of {limit} processed entries")]
    IterationLimitExceeded { limit: u64 },
    /// The worker pool could not be created.
    #[error(transparent)]
    ThreadPool(#[from] rayon_core::ThreadPoolBuildError),
    /// A saturation worker panicked.
    #[error("A saturation worker panicked")]
    WorkerPanicked,
    /// A previous classification failed and left the classifier in an unspecified state.
    #[error("The classifier state is not usable anymore because a previous classification failed")]
    Poisoned,
}

impl ClassifyError {
    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedAxiom {
            reason: reason.into(),
        }
    }
}
