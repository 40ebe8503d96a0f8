//! The saturation engine: a pool of workers applying the completion rules until a fixpoint.
//!
//! A context is pushed to the global queue when it goes from idle to active.
//! The engine is done once the global queue is empty and no context is queued or being processed.
//! Idle workers sleep on a condition variable until a context is queued or the run ends.
//!
//! A fact read by a rule may be written concurrently by another context.
//! Every such pair of rules writes its own fact before reading the other one
//! so at least one of the two sees both facts:
//! - an edge `A ⊑ ∃r.B` is stored before `S(B)` is read, and `X` is added to `S(B)` before the predecessors of `B` are read;
//! - an edge `A ⊑ ∃r.B` is stored before the successors of `B` are read, and conversely for compositions.

use crate::config::ClassifierConfig;
use crate::context::{Context, Queues};
use crate::error::ClassifyError;
use crate::factory::{ConceptId, RoleId};
use crate::index::OntologyIndex;
use crate::normal_form::{ConjunctionEntry, FeatureEntry, RoleEntry};
use crate::role_closure::RoleClosure;
use crate::store::{RelationshipStore, SubsumptionStore};
use rayon_core::ThreadPoolBuilder;
use rustc_hash::FxHashSet;
use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use std::fmt;
use tracing::trace;

/// Statistics of a saturation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SaturationStats {
    /// Number of queue entries processed.
    pub processed: u64,
    /// Number of times a context went from idle to queued.
    pub activations: u64,
    /// Number of workers.
    pub workers: usize,
    pub elapsed: Duration,
}

impl fmt::Display for SaturationStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} entries processed in {} activations by {} workers in {:.3}s",
            self.processed,
            self.activations,
            self.workers,
            self.elapsed.as_secs_f64()
        )
    }
}

/// The state saturation reads and extends.
#[derive(Clone, Copy)]
pub(crate) struct Model<'a> {
    pub index: &'a OntologyIndex,
    pub contexts: &'a [Context],
    pub subsumptions: &'a SubsumptionStore,
    pub relationships: &'a RelationshipStore,
    pub roles: &'a RoleClosure,
}

enum Visit {
    /// The context is idle again.
    Done,
    /// The context still has queued entries and goes back to the global queue.
    Requeue,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A single saturation run.
///
/// Entries are pushed first, then [`run`](Self::run) processes them and everything they imply.
pub(crate) struct Saturation<'a> {
    model: Model<'a>,
    reflexive: FxHashSet<RoleId>,
    queue: Mutex<VecDeque<ConceptId>>,
    /// Signalled when a context is queued and when the run ends.
    ready: Condvar,
    /// Number of contexts queued or being processed.
    pending: AtomicUsize,
    processed: AtomicU64,
    activations: AtomicU64,
    batch: bool,
    max_iterations: Option<u64>,
    tracking: bool,
    failure: Mutex<Option<ClassifyError>>,
    aborted: AtomicBool,
}

impl<'a> Saturation<'a> {
    /// With `tracking`, each context records the size of its supersumer set when first activated.
    pub fn new(model: Model<'a>, config: &ClassifierConfig, tracking: bool) -> Self {
        Self {
            reflexive: model.roles.reflexive_roles(model.index),
            model,
            queue: Mutex::default(),
            ready: Condvar::new(),
            pending: AtomicUsize::new(0),
            processed: AtomicU64::new(0),
            activations: AtomicU64::new(0),
            batch: config.batch_process,
            max_iterations: config.max_iterations,
            tracking,
            failure: Mutex::new(None),
            aborted: AtomicBool::new(false),
        }
    }

    #[inline]
    pub fn model(&self) -> Model<'a> {
        self.model
    }

    fn context(&self, concept: ConceptId) -> Result<&'a Context, ClassifyError> {
        self.model
            .contexts
            .get(concept.index())
            .ok_or(ClassifyError::UnknownConcept(concept))
    }

    fn activate(&self, context: &Context) {
        if context.activate() {
            if self.tracking {
                context.track(|| self.model.subsumptions.len_of(context.concept()));
            }
            trace!("Activating the context of {}", context.concept());
            self.activations.fetch_add(1, Ordering::Relaxed);
            self.pending.fetch_add(1, Ordering::SeqCst);
            self.enqueue(context.concept());
        }
    }

    fn enqueue(&self, concept: ConceptId) {
        lock(&self.queue).push_back(concept);
        self.ready.notify_one();
    }

    /// Wakes every idle worker so that it sees the end of the run.
    fn wake_all(&self) {
        // taken so that no worker is between its check and its wait
        let _queue = lock(&self.queue);
        self.ready.notify_all();
    }

    pub fn push_conjunction(
        &self,
        concept: ConceptId,
        entry: ConjunctionEntry,
    ) -> Result<(), ClassifyError> {
        let context = self.context(concept)?;
        context.push_conjunction(entry);
        self.activate(context);
        Ok(())
    }

    pub fn push_role(&self, concept: ConceptId, entry: RoleEntry) -> Result<(), ClassifyError> {
        let context = self.context(concept)?;
        context.push_role(entry);
        self.activate(context);
        Ok(())
    }

    pub fn push_feature(&self, concept: ConceptId, entry: FeatureEntry) -> Result<(), ClassifyError> {
        let context = self.context(concept)?;
        context.push_feature(entry);
        self.activate(context);
        Ok(())
    }

    /// Seeds the context of a concept that has never been saturated.
    pub fn prime(&self, concept: ConceptId) -> Result<(), ClassifyError> {
        self.model.subsumptions.init(concept);
        self.schedule_subsumption(concept, concept)?;
        if concept != ConceptId::TOP {
            self.schedule_subsumption(concept, ConceptId::TOP)?;
        }
        for role in self.model.index.reflexive_roles() {
            self.push_role(concept, RoleEntry::new(*role, concept))?;
        }
        Ok(())
    }

    /// Queues the consequences of the already stored `concept ⊑ parent`.
    pub fn schedule_subsumption(
        &self,
        concept: ConceptId,
        parent: ConceptId,
    ) -> Result<(), ClassifyError> {
        let index = self.model.index;
        for entry in index.conjunctions(parent) {
            self.push_conjunction(concept, *entry)?;
        }
        for entry in index.existentials(parent) {
            self.push_role(concept, *entry)?;
        }
        for entry in index.features(parent) {
            self.push_feature(concept, entry.clone())?;
        }
        let relationships = self.model.relationships;
        let mut predecessors = Vec::new();
        for (role, consequences) in index.restrictions_by_role(parent) {
            predecessors.clear();
            relationships.for_each_predecessor(concept, role, |source| predecessors.push(source));
            for predecessor in &predecessors {
                for consequence in consequences {
                    self.push_conjunction(*predecessor, ConjunctionEntry::unconditional(*consequence))?;
                }
            }
        }
        if parent == ConceptId::BOTTOM {
            for role in relationships.incoming_roles(concept) {
                predecessors.clear();
                relationships.for_each_predecessor(concept, role, |source| predecessors.push(source));
                for predecessor in &predecessors {
                    self.push_conjunction(
                        *predecessor,
                        ConjunctionEntry::unconditional(ConceptId::BOTTOM),
                    )?;
                }
            }
        }
        Ok(())
    }

    /// Processes every pushed entry and everything it implies.
    pub fn run(self, workers: usize) -> Result<SaturationStats, ClassifyError> {
        let start = Instant::now();
        let workers = workers.max(1);
        ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("oxel saturation worker {i}"))
            .build()?
            .scope(|s| {
                for _ in 0..workers {
                    s.spawn(|_| self.guarded_work());
                }
            });
        if let Some(error) = lock(&self.failure).take() {
            return Err(error);
        }
        Ok(SaturationStats {
            processed: self.processed.load(Ordering::SeqCst),
            activations: self.activations.load(Ordering::SeqCst),
            workers,
            elapsed: start.elapsed(),
        })
    }

    fn guarded_work(&self) {
        match panic::catch_unwind(AssertUnwindSafe(|| self.work())) {
            Ok(Ok(())) => (),
            Ok(Err(error)) => self.fail(error),
            Err(_) => self.fail(ClassifyError::WorkerPanicked),
        }
    }

    fn fail(&self, error: ClassifyError) {
        let mut failure = lock(&self.failure);
        if failure.is_none() {
            *failure = Some(error);
        }
        self.aborted.store(true, Ordering::SeqCst);
        drop(failure);
        self.wake_all();
    }

    fn work(&self) -> Result<(), ClassifyError> {
        while let Some(concept) = self.next() {
            let context = self.context(concept)?;
            match self.visit(context)? {
                Visit::Done => {
                    if self.pending.fetch_sub(1, Ordering::SeqCst) == 1 {
                        self.wake_all();
                    }
                }
                Visit::Requeue => self.enqueue(concept),
            }
        }
        Ok(())
    }

    /// Waits for a queued context, `None` once the run is over or aborted.
    fn next(&self) -> Option<ConceptId> {
        let mut queue = lock(&self.queue);
        loop {
            if self.aborted.load(Ordering::SeqCst) {
                return None;
            }
            if let Some(concept) = queue.pop_front() {
                return Some(concept);
            }
            if self.pending.load(Ordering::SeqCst) == 0 {
                return None;
            }
            queue = self
                .ready
                .wait(queue)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    fn visit(&self, context: &Context) -> Result<Visit, ClassifyError> {
        loop {
            let work = context.take_pending(self.batch);
            if work.is_empty() {
                if context.deactivate() {
                    continue;
                }
                return Ok(Visit::Done);
            }
            self.apply(context, work)?;
            if self.aborted.load(Ordering::SeqCst) {
                return Ok(Visit::Done);
            }
            if !self.batch && context.pending() > 0 {
                return Ok(Visit::Requeue);
            }
        }
    }

    fn apply(&self, context: &Context, work: Queues) -> Result<(), ClassifyError> {
        let count = u64::try_from(work.len()).unwrap_or(u64::MAX);
        let processed = self.processed.fetch_add(count, Ordering::SeqCst) + count;
        if let Some(limit) = self.max_iterations {
            if processed > limit {
                return Err(ClassifyError::IterationLimitExceeded { limit });
            }
        }
        let concept = context.concept();
        for entry in work.conjunctions {
            self.apply_conjunction(concept, entry)?;
        }
        for entry in work.roles {
            self.apply_role(concept, entry)?;
        }
        for entry in work.features {
            self.apply_feature(context, entry)?;
        }
        Ok(())
    }

    fn apply_conjunction(
        &self,
        concept: ConceptId,
        entry: ConjunctionEntry,
    ) -> Result<(), ClassifyError> {
        let subsumptions = self.model.subsumptions;
        if subsumptions.contains(concept, entry.consequence) {
            return Ok(());
        }
        if entry.conjunct != ConceptId::TOP && !subsumptions.contains(concept, entry.conjunct) {
            return Ok(());
        }
        if subsumptions.add(concept, entry.consequence) {
            self.schedule_subsumption(concept, entry.consequence)?;
        }
        Ok(())
    }

    fn apply_role(&self, concept: ConceptId, entry: RoleEntry) -> Result<(), ClassifyError> {
        if self
            .model
            .relationships
            .contains(concept, entry.role, entry.filler)
        {
            return Ok(());
        }
        self.derive_edges(concept, entry.role, entry.filler)
    }

    fn apply_feature(&self, context: &Context, entry: FeatureEntry) -> Result<(), ClassifyError> {
        let rules = self.model.index.feature_rules(entry.feature);
        if !context.record_feature(entry.clone()) {
            return Ok(());
        }
        for (datatype, consequence) in rules {
            if entry.datatype.entails(datatype) {
                self.push_conjunction(
                    context.concept(),
                    ConjunctionEntry::unconditional(*consequence),
                )?;
            }
        }
        Ok(())
    }

    /// Adds `source ⊑ ∃role.target` with all the edges it implies from `source`.
    ///
    /// Implied edges from other sources are pushed to the queues of their own contexts.
    pub(crate) fn derive_edges(
        &self,
        source: ConceptId,
        role: RoleId,
        target: ConceptId,
    ) -> Result<(), ClassifyError> {
        let mut edges = vec![(role, target)];
        while let Some((role, target)) = edges.pop() {
            for sup in &*self.model.roles.closure(self.model.index, role) {
                if self.model.relationships.store(source, *sup, target) {
                    self.on_new_edge(source, *sup, target, &mut edges)?;
                }
            }
        }
        Ok(())
    }

    fn on_new_edge(
        &self,
        source: ConceptId,
        role: RoleId,
        target: ConceptId,
        edges: &mut Vec<(RoleId, ConceptId)>,
    ) -> Result<(), ClassifyError> {
        let model = self.model;
        // only the matching restrictions are collected, S(target) is not copied
        let mut consequences = Vec::new();
        model.subsumptions.for_each(target, |parent| {
            if parent == ConceptId::BOTTOM {
                consequences.push(ConceptId::BOTTOM);
            }
            consequences.extend_from_slice(model.index.restrictions(parent, role));
        });
        for consequence in consequences {
            self.push_conjunction(source, ConjunctionEntry::unconditional(consequence))?;
        }

        if self.reflexive.contains(&role) {
            if !model.relationships.contains(source, role, source) {
                edges.push((role, source));
            }
            if !model.relationships.contains(target, role, target) {
                self.push_role(target, RoleEntry::new(role, target))?;
            }
        }

        // role ∘ next ⊑ sup
        let mut concepts = Vec::new();
        for (next, sup) in model.index.chains_by_first(role) {
            concepts.clear();
            model
                .relationships
                .for_each_successor(target, *next, |end| concepts.push(end));
            for end in &concepts {
                if !model.relationships.contains(source, *sup, *end) {
                    edges.push((*sup, *end));
                }
            }
        }
        // previous ∘ role ⊑ sup
        for (previous, sup) in model.index.chains_by_second(role) {
            concepts.clear();
            model
                .relationships
                .for_each_predecessor(source, *previous, |start| concepts.push(start));
            for start in concepts.iter().copied() {
                if start == source {
                    if !model.relationships.contains(source, *sup, target) {
                        edges.push((*sup, target));
                    }
                } else {
                    self.push_role(start, RoleEntry::new(*sup, target))?;
                }
            }
        }
        Ok(())
    }
}
