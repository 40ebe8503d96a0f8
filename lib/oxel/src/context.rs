//! Per-concept saturation state.

use crate::factory::ConceptId;
use crate::normal_form::{ConjunctionEntry, FeatureEntry, RoleEntry};
use rustc_hash::FxHashSet;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, OnceLock, PoisonError};

/// The pending work of a context.
#[derive(Debug, Default)]
pub(crate) struct Queues {
    pub conjunctions: VecDeque<ConjunctionEntry>,
    pub roles: VecDeque<RoleEntry>,
    pub features: VecDeque<FeatureEntry>,
}

impl Queues {
    pub fn is_empty(&self) -> bool {
        self.conjunctions.is_empty() && self.roles.is_empty() && self.features.is_empty()
    }

    pub fn len(&self) -> usize {
        self.conjunctions.len() + self.roles.len() + self.features.len()
    }

    /// Moves out everything, or only the oldest entry of the first non-empty queue.
    pub fn take(&mut self, batch: bool) -> Self {
        if batch {
            return std::mem::take(self);
        }
        let mut taken = Self::default();
        if let Some(entry) = self.conjunctions.pop_front() {
            taken.conjunctions.push_back(entry);
        } else if let Some(entry) = self.roles.pop_front() {
            taken.roles.push_back(entry);
        } else if let Some(entry) = self.features.pop_front() {
            taken.features.push_back(entry);
        }
        taken
    }
}

/// The saturation state of one concept.
///
/// A context is idle, queued or processing.
/// The `active` flag is set while it is queued or processing so that it sits at most once in the global queue
/// and is never processed by two workers at the same time.
#[derive(Debug)]
pub(crate) struct Context {
    concept: ConceptId,
    active: AtomicBool,
    queues: Mutex<Queues>,
    /// Datatype restrictions already known to subsume the concept.
    features: Mutex<FxHashSet<FeatureEntry>>,
    /// Size of the supersumer set when the context was first activated by an incremental run.
    tracked: OnceLock<usize>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    // Every stored fact is monotonic so a panicking holder cannot leave it inconsistent
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Context {
    pub fn new(concept: ConceptId) -> Self {
        Self {
            concept,
            active: AtomicBool::new(false),
            queues: Mutex::default(),
            features: Mutex::default(),
            tracked: OnceLock::new(),
        }
    }

    #[inline]
    pub fn concept(&self) -> ConceptId {
        self.concept
    }

    pub fn push_conjunction(&self, entry: ConjunctionEntry) {
        lock(&self.queues).conjunctions.push_back(entry);
    }

    pub fn push_role(&self, entry: RoleEntry) {
        lock(&self.queues).roles.push_back(entry);
    }

    pub fn push_feature(&self, entry: FeatureEntry) {
        lock(&self.queues).features.push_back(entry);
    }

    /// Marks the context as active.
    ///
    /// Returns `true` if it was idle, the caller is then in charge of queueing it.
    pub fn activate(&self) -> bool {
        !self.active.swap(true, Ordering::SeqCst)
    }

    /// Called by the worker once it found the queues empty.
    ///
    /// Returns `true` if entries were pushed meanwhile and the worker reacquired the context.
    pub fn deactivate(&self) -> bool {
        self.active.store(false, Ordering::SeqCst);
        !lock(&self.queues).is_empty() && self.activate()
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    pub fn take_pending(&self, batch: bool) -> Queues {
        lock(&self.queues).take(batch)
    }

    pub fn pending(&self) -> usize {
        lock(&self.queues).len()
    }

    /// Records a datatype restriction subsuming the concept.
    ///
    /// Returns `true` if it is new.
    pub fn record_feature(&self, entry: FeatureEntry) -> bool {
        lock(&self.features).insert(entry)
    }

    /// The recorded datatype restrictions.
    pub fn features(&self) -> Vec<FeatureEntry> {
        lock(&self.features).iter().cloned().collect()
    }

    /// Starts change tracking, keeping the first size given.
    pub fn track(&self, size: impl FnOnce() -> usize) {
        self.tracked.get_or_init(size);
    }

    pub fn tracked_size(&self) -> Option<usize> {
        self.tracked.get().copied()
    }

    /// Stops change tracking.
    pub fn untrack(&mut self) -> Option<usize> {
        self.tracked.take()
    }
}
