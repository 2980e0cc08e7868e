//! The shared worker pool driving all asynchronous work.
//!
//! One [`Scheduler`] serves the whole process: the reaction engine
//! posts reactor work onto it, and every HTTP server runs its acceptor
//! and connections on it. It owns a multi-thread tokio runtime sized to
//! hardware concurrency by default.
//!
//! Components never hold the scheduler itself; they hold a cheap-clone
//! [`SchedulerHandle`], which is also how tests running under their own
//! runtime share one code path ([`SchedulerHandle::current`]).

use crate::error::SchedulerError;
use parking_lot::Mutex;
use pion_reactor::TaskSpawner;
use std::future::Future;
use std::pin::Pin;
use std::thread;
use std::time::Duration;
use tokio::runtime::{Builder, Handle, Runtime};
use tokio::task::JoinHandle;

/// How long `shutdown` waits for in-flight tasks before abandoning them.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Owner of the worker pool.
pub struct Scheduler {
    num_threads: usize,
    runtime: Mutex<Option<Runtime>>,
}

impl Scheduler {
    /// Creates a scheduler sized to hardware concurrency.
    #[must_use]
    pub fn new() -> Self {
        let threads = thread::available_parallelism().map_or(2, usize::from);
        Self::with_threads(threads)
    }

    /// Creates a scheduler with an explicit worker count.
    #[must_use]
    pub fn with_threads(num_threads: usize) -> Self {
        Self {
            num_threads: num_threads.max(1),
            runtime: Mutex::new(None),
        }
    }

    /// Number of worker threads the pool is (or will be) running.
    #[must_use]
    pub fn num_threads(&self) -> usize {
        self.num_threads
    }

    /// Whether the worker pool is running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.runtime.lock().is_some()
    }

    /// Spawns the worker pool.
    ///
    /// # Errors
    ///
    /// `SCHEDULER_ALREADY_RUNNING` on a second call, `SCHEDULER_STARTUP`
    /// when the pool cannot be built.
    pub fn startup(&self) -> Result<(), SchedulerError> {
        let mut guard = self.runtime.lock();
        if guard.is_some() {
            return Err(SchedulerError::AlreadyRunning);
        }
        let runtime = Builder::new_multi_thread()
            .worker_threads(self.num_threads)
            .thread_name("pion-worker")
            .enable_all()
            .build()
            .map_err(|err| SchedulerError::Startup(err.to_string()))?;
        *guard = Some(runtime);
        Ok(())
    }

    /// Stops the worker pool.
    ///
    /// In-flight tasks get a bounded grace period, then the workers are
    /// joined. Stopping a stopped scheduler is a no-op.
    pub fn shutdown(&self) {
        if let Some(runtime) = self.runtime.lock().take() {
            runtime.shutdown_timeout(SHUTDOWN_GRACE);
        }
    }

    /// Returns a cheap-clone handle onto the pool.
    ///
    /// # Errors
    ///
    /// `SCHEDULER_NOT_RUNNING` when stopped.
    pub fn handle(&self) -> Result<SchedulerHandle, SchedulerError> {
        self.runtime
            .lock()
            .as_ref()
            .map(|rt| SchedulerHandle {
                inner: rt.handle().clone(),
            })
            .ok_or(SchedulerError::NotRunning)
    }

    /// Posts a task onto the pool.
    ///
    /// Thread-safe; tasks run on any worker. Ordered hand-off, where it
    /// matters, is built on queues layered above this primitive.
    ///
    /// # Errors
    ///
    /// `SCHEDULER_NOT_RUNNING` when stopped.
    pub fn post<F>(&self, task: F) -> Result<(), SchedulerError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.handle()?.spawn(task);
        Ok(())
    }

    /// Runs a future to completion from outside the pool.
    ///
    /// Must not be called from a worker thread.
    ///
    /// # Errors
    ///
    /// `SCHEDULER_NOT_RUNNING` when stopped.
    pub fn block_on<F: Future>(&self, future: F) -> Result<F::Output, SchedulerError> {
        let handle = self.handle()?;
        Ok(handle.inner.block_on(future))
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        // non-blocking teardown; explicit shutdown() gives the grace period
        if let Some(runtime) = self.runtime.lock().take() {
            runtime.shutdown_background();
        }
    }
}

/// Cheap-clone handle onto the worker pool.
#[derive(Clone)]
pub struct SchedulerHandle {
    inner: Handle,
}

impl SchedulerHandle {
    /// Handle onto the runtime of the calling context.
    ///
    /// # Panics
    ///
    /// Panics outside a runtime. Intended for tests and embedders that
    /// already run under tokio.
    #[must_use]
    pub fn current() -> Self {
        Self {
            inner: Handle::current(),
        }
    }

    /// Spawns a future onto the pool.
    pub fn spawn<F>(&self, task: F) -> JoinHandle<F::Output>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        self.inner.spawn(task)
    }

    /// Spawns a synchronous closure onto the blocking pool.
    pub fn spawn_blocking<F, R>(&self, task: F) -> JoinHandle<R>
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        self.inner.spawn_blocking(task)
    }
}

impl TaskSpawner for SchedulerHandle {
    fn spawn_task(&self, task: Pin<Box<dyn Future<Output = ()> + Send>>) {
        self.inner.spawn(task);
    }

    fn spawn_blocking_task(&self, task: Box<dyn FnOnce() + Send>) {
        self.inner.spawn_blocking(task);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pion_types::ErrorCode;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{mpsc, Arc};

    #[test]
    fn startup_post_shutdown() {
        let scheduler = Scheduler::with_threads(2);
        scheduler.startup().unwrap();
        assert!(scheduler.is_running());

        let (tx, rx) = mpsc::channel();
        scheduler
            .post(async move {
                tx.send(42u32).unwrap();
            })
            .unwrap();
        assert_eq!(rx.recv_timeout(Duration::from_secs(5)).unwrap(), 42);

        scheduler.shutdown();
        assert!(!scheduler.is_running());
    }

    #[test]
    fn double_startup_rejected() {
        let scheduler = Scheduler::with_threads(1);
        scheduler.startup().unwrap();
        let err = scheduler.startup().unwrap_err();
        assert_eq!(err.code(), "SCHEDULER_ALREADY_RUNNING");
        scheduler.shutdown();
    }

    #[test]
    fn post_while_stopped_rejected() {
        let scheduler = Scheduler::with_threads(1);
        let err = scheduler.post(async {}).unwrap_err();
        assert_eq!(err.code(), "SCHEDULER_NOT_RUNNING");
    }

    #[test]
    fn shutdown_is_idempotent() {
        let scheduler = Scheduler::with_threads(1);
        scheduler.startup().unwrap();
        scheduler.shutdown();
        scheduler.shutdown();
    }

    #[test]
    fn posts_from_one_thread_all_run() {
        let scheduler = Scheduler::with_threads(4);
        scheduler.startup().unwrap();

        let counter = Arc::new(AtomicUsize::new(0));
        let (tx, rx) = mpsc::channel();
        for _ in 0..100 {
            let counter = counter.clone();
            let tx = tx.clone();
            scheduler
                .post(async move {
                    if counter.fetch_add(1, Ordering::SeqCst) == 99 {
                        tx.send(()).unwrap();
                    }
                })
                .unwrap();
        }
        rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(counter.load(Ordering::SeqCst), 100);
        scheduler.shutdown();
    }

    #[test]
    fn block_on_runs_to_completion() {
        let scheduler = Scheduler::with_threads(1);
        scheduler.startup().unwrap();
        let value = scheduler.block_on(async { 7u32 }).unwrap();
        assert_eq!(value, 7);
        scheduler.shutdown();
    }
}
