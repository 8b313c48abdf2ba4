mod data;

pub use data::*;

use crate::error::Error;

/// Configuration accepted by [`crate::optimize`] and [`crate::execute`].
///
/// Construct with [`Options::default`] and field assignment, or with
/// [`Options::builder`] for the fluent style.
#[derive(Clone, Debug)]
pub struct Options {
    /// Items to draw for the dry-run. Default 5.
    pub sample_size: usize,

    /// Emit `info!`-level one-line decision summaries.
    ///
    /// The finer-grained `debug!`/`trace!` instrumentation that the pipeline
    /// emits at every stage is independent of this flag and controlled by
    /// the host's `log` subscriber level.
    pub verbose: bool,

    /// Override the chosen worker count. Still validated against the
    /// picklability/memory/empty-workload guards.
    pub force_n_jobs: Option<usize>,

    /// Override the chosen chunk size. Still validated.
    pub force_chunksize: Option<usize>,

    /// Route `io_bound` workloads to the thread executor. Default true.
    pub prefer_threads_for_io: bool,

    /// Fraction of available memory usable by workers. Default 0.8.
    pub memory_safety_fraction: f64,

    /// Below this estimated speedup, fall back to serial. Default 1.2.
    pub min_speedup_threshold: f64,

    /// Measure spawn cost live instead of using the start-method default.
    pub measure_spawn: bool,

    /// Per-item timeout for the dry-run. `None` disables the timeout.
    pub dry_run_item_timeout: Option<std::time::Duration>,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            sample_size: 5,
            verbose: false,
            force_n_jobs: None,
            force_chunksize: None,
            prefer_threads_for_io: true,
            memory_safety_fraction: 0.8,
            min_speedup_threshold: 1.2,
            measure_spawn: true,
            dry_run_item_timeout: None,
        }
    }
}

impl Options {
    pub fn builder() -> OptionsBuilder {
        OptionsBuilder(Options::default())
    }

    /// Validates the fields that Rust's type system cannot rule out at
    /// construction time. Returns the only [`Error`] variants this crate
    /// can produce; everything else degrades to a `Decision` warning.
    pub(crate) fn validate(&self) -> Result<(), Error> {
        if self.sample_size == 0 {
            return Err(Error::InvalidSampleSize(self.sample_size));
        }
        if self.min_speedup_threshold < 1.0 {
            return Err(Error::InvalidThreshold(self.min_speedup_threshold));
        }
        if !(self.memory_safety_fraction > 0.0 && self.memory_safety_fraction <= 1.0) {
            return Err(Error::InvalidMemoryFraction(self.memory_safety_fraction));
        }
        Ok(())
    }
}

/// Fluent builder for [`Options`].
#[derive(Clone, Debug, Default)]
pub struct OptionsBuilder(Options);

macro_rules! setter {
    ($name:ident: $ty:ty) => {
        pub fn $name(mut self, $name: $ty) -> Self {
            self.0.$name = $name;
            self
        }
    };
}

impl OptionsBuilder {
    setter!(sample_size: usize);
    setter!(verbose: bool);
    setter!(prefer_threads_for_io: bool);
    setter!(memory_safety_fraction: f64);
    setter!(min_speedup_threshold: f64);
    setter!(measure_spawn: bool);

    pub fn force_n_jobs(mut self, n: usize) -> Self {
        self.0.force_n_jobs = Some(n);
        self
    }

    pub fn force_chunksize(mut self, c: usize) -> Self {
        self.0.force_chunksize = Some(c);
        self
    }

    pub fn dry_run_item_timeout(mut self, timeout: std::time::Duration) -> Self {
        self.0.dry_run_item_timeout = Some(timeout);
        self
    }

    pub fn build(self) -> Options {
        self.0
    }
}
