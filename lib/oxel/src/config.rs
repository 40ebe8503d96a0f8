//! Classifier configuration.

use crate::index::Nf3Discipline;
use std::num::NonZeroUsize;

/// Configuration of a [`Classifier`](crate::Classifier).
///
/// ```
/// use oxel::ClassifierConfig;
/// use std::num::NonZeroUsize;
///
/// let config = ClassifierConfig {
///     num_threads: NonZeroUsize::new(4),
///     max_iterations: Some(10_000_000),
///     ..ClassifierConfig::default()
/// };
/// assert!(config.batch_process);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifierConfig {
    /// Number of saturation workers.
    ///
    /// Default: the available hardware parallelism.
    pub num_threads: Option<NonZeroUsize>,
    /// Drain all the queued entries of a context in one visit instead of one entry per visit.
    ///
    /// Both modes reach the same fixpoint. Default: `true`.
    pub batch_process: bool,
    /// Maximum number of queue entries processed by one saturation run (None = unlimited).
    ///
    /// Saturation always terminates, the limit only guards against internal bugs.
    pub max_iterations: Option<u64>,
    /// How many `∃r.A ⊑ B` rules may share `r` and `A`.
    pub nf3_discipline: Nf3Discipline,
    /// Log per-phase statistics at the `info` level instead of `debug`.
    pub verbose: bool,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            num_threads: None,
            batch_process: true,
            max_iterations: None,
            nf3_discipline: Nf3Discipline::Multiple,
            verbose: false,
        }
    }
}

impl ClassifierConfig {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A configuration with a single worker thread.
    #[must_use]
    pub fn single_threaded() -> Self {
        Self {
            num_threads: Some(NonZeroUsize::MIN),
            ..Self::default()
        }
    }

    /// Sets the number of workers, `0` meaning the available hardware parallelism.
    #[must_use]
    pub fn with_num_threads(mut self, num_threads: usize) -> Self {
        self.num_threads = NonZeroUsize::new(num_threads);
        self
    }

    #[must_use]
    pub fn with_batch_process(mut self, batch_process: bool) -> Self {
        self.batch_process = batch_process;
        self
    }

    /// Caps the number of processed queue entries.
    #[must_use]
    pub fn with_max_iterations(mut self, max_iterations: u64) -> Self {
        self.max_iterations = Some(max_iterations);
        self
    }

    #[must_use]
    pub fn with_nf3_discipline(mut self, discipline: Nf3Discipline) -> Self {
        self.nf3_discipline = discipline;
        self
    }

    #[must_use]
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// The number of workers to spawn.
    pub(crate) fn worker_count(&self) -> usize {
        self.num_threads
            .or_else(|| std::thread::available_parallelism().ok())
            .map_or(1, NonZeroUsize::get)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = ClassifierConfig::default();
        assert_eq!(config.num_threads, None);
        assert!(config.batch_process);
        assert_eq!(config.max_iterations, None);
        assert_eq!(config.nf3_discipline, Nf3Discipline::Multiple);
        assert!(!config.verbose);
        assert!(config.worker_count() >= 1);
    }

    #[test]
    fn builders() {
        let config = ClassifierConfig::single_threaded()
            .with_batch_process(false)
            .with_max_iterations(10)
            .with_nf3_discipline(Nf3Discipline::Single);
        assert_eq!(config.worker_count(), 1);
        assert!(!config.batch_process);
        assert_eq!(config.max_iterations, Some(10));
        assert_eq!(config.nf3_discipline, Nf3Discipline::Single);
        // zero means the hardware default
        assert_eq!(ClassifierConfig::new().with_num_threads(0).num_threads, None);
    }
}
