//! Configuration for launching a race.

/// Configuration for a race's worker threads.
#[derive(Debug, Clone)]
pub struct RaceConfig {
    /// Number of worker threads to spawn.
    pub workers: usize,
    /// Prefix for worker thread names (the worker index is appended).
    pub thread_name: String,
    /// Stack size for worker threads (None = platform default).
    pub stack_size: Option<usize>,
}

impl Default for RaceConfig {
    fn default() -> Self {
        Self::new(num_cpus::get())
    }
}

impl RaceConfig {
    /// Config for exactly `workers` workers. Zero is kept as is and rejected
    /// at launch.
    pub fn new(workers: usize) -> Self {
        Self {
            workers,
            thread_name: "race-worker".to_string(),
            stack_size: None,
        }
    }

    /// Set the number of workers. Zero is clamped to one.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// Set the number of workers from an Option, keeping the default on None.
    pub fn with_workers_option(self, workers: Option<usize>) -> Self {
        match workers {
            Some(n) => self.with_workers(n),
            None => self,
        }
    }

    pub fn with_thread_name(mut self, prefix: impl Into<String>) -> Self {
        self.thread_name = prefix.into();
        self
    }

    pub fn with_stack_size(mut self, bytes: usize) -> Self {
        self.stack_size = Some(bytes);
        self
    }

    pub(crate) fn thread_name_for(&self, worker: usize) -> String {
        format!("{}-{}", self.thread_name, worker)
    }
}
