use rayon::{ThreadPool, ThreadPoolBuildError, ThreadPoolBuilder};
use tracing::info;

/// Worker pool for column generation. Each queued job owns exactly one
/// column, so jobs never share mutable state and can run in any order.
pub struct JobSystem {
    pool: ThreadPool,
}

impl JobSystem {
    pub fn new(num_threads: Option<usize>) -> Result<Self, ThreadPoolBuildError> {
        let mut builder = ThreadPoolBuilder::new().thread_name(|i| format!("karst-worldgen-{i}"));
        if let Some(count) = num_threads {
            builder = builder.num_threads(count);
        }

        let pool = builder.build()?;
        info!(threads = pool.current_num_threads(), "worldgen pool ready");
        Ok(Self { pool })
    }

    pub fn num_threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    pub fn spawn<F>(&self, job: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.pool.spawn(job);
    }

    /// Runs `op` with a scope that joins all spawned jobs before returning.
    pub fn scope<'scope, OP, R>(&self, op: OP) -> R
    where
        OP: FnOnce(&rayon::Scope<'scope>) -> R + Send,
        R: Send,
    {
        self.pool.scope(op)
    }
}

impl Default for JobSystem {
    fn default() -> Self {
        Self::new(None).expect("failed to create default worldgen thread pool")
    }
}
