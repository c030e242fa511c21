//! Delivery scheduler for the status bar monitor.
//!
//! One named worker thread owns a piece of state `S` and runs every task
//! against it, so the state needs no locks. Tasks arrive over a channel from
//! any thread and are executed in arrival order. Keyed tasks coalesce: posting
//! a kind that is still pending replaces the pending task, so at most one task
//! per kind is ever queued.
//!
//! # Example
//!
//! ```
//! use statusbar_scheduler::DeliveryScheduler;
//!
//! let mut scheduler = DeliveryScheduler::<u32, &'static str>::spawn("demo", |_| 0).unwrap();
//! let handle = scheduler.handle();
//! handle.post(|n| *n += 1).unwrap();
//! assert_eq!(handle.call(|n| *n).unwrap(), 1);
//! scheduler.shutdown();
//! ```

mod error;
mod queue;

pub use error::SchedulerError;

use crossbeam_channel::{RecvTimeoutError, Sender};
use queue::PendingQueue;
use std::hash::Hash;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, OnceLock};
use std::thread::{self, JoinHandle, ThreadId};
use std::time::{Duration, Instant};

/// Work item executed on the delivery thread.
pub type Task<S> = Box<dyn FnOnce(&mut S) + Send + 'static>;

/// Request sent to the delivery thread.
enum Request<S, K> {
    /// Run as soon as everything queued before it has run.
    Post(Task<S>),
    /// Run after `delay`, replacing any pending task of the same kind.
    PostKeyed { kind: K, delay: Duration, task: Task<S> },
    /// Drop the pending task of a kind.
    Cancel(K),
    /// Stop the worker. Pending tasks are dropped.
    Shutdown,
}

/// Cloneable, thread-safe sender of work to the delivery thread.
pub struct SchedulerHandle<S, K> {
    tx: Sender<Request<S, K>>,
    worker: Arc<OnceLock<ThreadId>>,
}

impl<S, K> Clone for SchedulerHandle<S, K> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
            worker: Arc::clone(&self.worker),
        }
    }
}

impl<S, K> SchedulerHandle<S, K>
where
    S: 'static,
    K: Send + 'static,
{
    /// Enqueue a task for immediate execution.
    pub fn post<F>(&self, task: F) -> Result<(), SchedulerError>
    where
        F: FnOnce(&mut S) + Send + 'static,
    {
        self.send(Request::Post(Box::new(task)))
    }

    /// Enqueue a task to run after at least `delay`.
    ///
    /// A still-pending task of the same kind is replaced, not merely superseded.
    pub fn post_delayed<F>(&self, kind: K, delay: Duration, task: F) -> Result<(), SchedulerError>
    where
        F: FnOnce(&mut S) + Send + 'static,
    {
        self.send(Request::PostKeyed {
            kind,
            delay,
            task: Box::new(task),
        })
    }

    /// Coalescing post without delay.
    pub fn post_keyed<F>(&self, kind: K, task: F) -> Result<(), SchedulerError>
    where
        F: FnOnce(&mut S) + Send + 'static,
    {
        self.post_delayed(kind, Duration::ZERO, task)
    }

    /// Drop the pending task of `kind`, if any.
    pub fn cancel(&self, kind: K) -> Result<(), SchedulerError> {
        self.send(Request::Cancel(kind))
    }

    /// Run `f` on the delivery thread and wait for its result.
    ///
    /// Fails with `Reentrant` when called from the delivery thread.
    pub fn call<R, F>(&self, f: F) -> Result<R, SchedulerError>
    where
        F: FnOnce(&mut S) -> R + Send + 'static,
        R: Send + 'static,
    {
        if self.is_worker_thread() {
            return Err(SchedulerError::Reentrant);
        }
        let (tx, rx) = crossbeam_channel::bounded(1);
        self.post(move |state| {
            let _ = tx.send(f(state));
        })?;
        rx.recv().map_err(|_| SchedulerError::Closed)
    }

    /// Wait until everything posted so far has run.
    pub fn flush(&self) -> Result<(), SchedulerError> {
        self.call(|_| ())
    }

    /// Whether the caller is running on the delivery thread.
    pub fn is_worker_thread(&self) -> bool {
        self.worker.get() == Some(&thread::current().id())
    }

    fn send(&self, request: Request<S, K>) -> Result<(), SchedulerError> {
        self.tx.send(request).map_err(|_| SchedulerError::Closed)
    }
}

/// Owner of the delivery thread. Dropping it shuts the thread down.
pub struct DeliveryScheduler<S, K> {
    handle: SchedulerHandle<S, K>,
    thread: Option<JoinHandle<()>>,
    name: String,
}

impl<S, K> DeliveryScheduler<S, K>
where
    S: 'static,
    K: Hash + Eq + Clone + Send + std::fmt::Debug + 'static,
{
    /// Start the delivery thread.
    ///
    /// `init` runs on the new thread and builds the state every task operates
    /// on; it receives a handle so the state can post follow-up work.
    pub fn spawn<F>(name: &str, init: F) -> Result<Self, SchedulerError>
    where
        F: FnOnce(SchedulerHandle<S, K>) -> S + Send + 'static,
    {
        let (tx, rx) = crossbeam_channel::unbounded::<Request<S, K>>();
        let handle = SchedulerHandle {
            tx,
            worker: Arc::new(OnceLock::new()),
        };

        let worker_handle = handle.clone();
        let thread_name = name.to_string();
        let thread = thread::Builder::new()
            .name(thread_name.clone())
            .spawn(move || {
                let _ = worker_handle.worker.set(thread::current().id());
                let state = init(worker_handle);
                run_loop(&thread_name, state, rx);
            })?;

        tracing::debug!(name, "delivery scheduler started");

        Ok(Self {
            handle,
            thread: Some(thread),
            name: name.to_string(),
        })
    }

    pub fn handle(&self) -> SchedulerHandle<S, K> {
        self.handle.clone()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_running(&self) -> bool {
        self.thread.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Stop the thread and wait for it. Pending delayed tasks are dropped.
    pub fn shutdown(&mut self) {
        let Some(thread) = self.thread.take() else {
            return;
        };
        let _ = self.handle.tx.send(Request::Shutdown);
        if self.handle.is_worker_thread() {
            tracing::warn!(name = %self.name, "scheduler dropped on its own thread; not joining");
            return;
        }
        if thread.join().is_err() {
            tracing::error!(name = %self.name, "delivery thread panicked");
        }
        tracing::debug!(name = %self.name, "delivery scheduler stopped");
    }
}

impl<S, K> Drop for DeliveryScheduler<S, K> {
    fn drop(&mut self) {
        let Some(thread) = self.thread.take() else {
            return;
        };
        let _ = self.handle.tx.send(Request::Shutdown);
        if self.handle.worker.get() != Some(&thread::current().id()) {
            let _ = thread.join();
        }
    }
}

/// The loop running on the delivery thread.
fn run_loop<S, K>(name: &str, mut state: S, rx: crossbeam_channel::Receiver<Request<S, K>>)
where
    K: Hash + Eq + Clone + std::fmt::Debug,
{
    let mut queue: PendingQueue<K, Task<S>> = PendingQueue::new();

    loop {
        while let Some(task) = queue.pop_due(Instant::now()) {
            run_task(name, &mut state, task);
        }

        let request = match queue.next_deadline() {
            Some(deadline) => rx.recv_deadline(deadline),
            None => rx.recv().map_err(|_| RecvTimeoutError::Disconnected),
        };

        match request {
            Ok(Request::Post(task)) => {
                queue.push(None, Instant::now(), task);
            }
            Ok(Request::PostKeyed { kind, delay, task }) => {
                let due = Instant::now() + delay;
                if queue.push(Some(kind.clone()), due, task) {
                    tracing::trace!(?kind, "replaced pending task");
                }
            }
            Ok(Request::Cancel(kind)) => {
                if queue.cancel(&kind) {
                    tracing::trace!(?kind, "cancelled pending task");
                }
            }
            Ok(Request::Shutdown) => {
                tracing::trace!(dropped = queue.len(), "delivery thread shutting down");
                break;
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => {
                if queue.is_empty() {
                    break;
                }
                // Senders are gone; finish what is already queued.
                if let Some(deadline) = queue.next_deadline() {
                    thread::sleep(deadline.saturating_duration_since(Instant::now()));
                }
            }
        }
    }
}

fn run_task<S>(name: &str, state: &mut S, task: Task<S>) {
    if panic::catch_unwind(AssertUnwindSafe(|| task(state))).is_err() {
        tracing::error!(scheduler = name, "scheduled task panicked");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    type Log = Vec<String>;

    fn spawn_log() -> DeliveryScheduler<Log, &'static str> {
        DeliveryScheduler::spawn("test-delivery", |_| Vec::new()).unwrap()
    }

    #[test]
    fn test_post_runs_in_arrival_order() {
        let scheduler = spawn_log();
        let handle = scheduler.handle();

        for i in 0..20 {
            handle.post(move |log| log.push(format!("task-{}", i))).unwrap();
        }

        let log = handle.call(|log| log.clone()).unwrap();
        let expected: Vec<String> = (0..20).map(|i| format!("task-{}", i)).collect();
        assert_eq!(log, expected);
    }

    #[test]
    fn test_three_delayed_posts_coalesce_to_last() {
        let scheduler = spawn_log();
        let handle = scheduler.handle();

        for value in ["first", "second", "third"] {
            handle
                .post_delayed("battery", Duration::from_millis(40), move |log| {
                    log.push(value.to_string())
                })
                .unwrap();
        }

        thread::sleep(Duration::from_millis(150));
        let log = handle.call(|log| log.clone()).unwrap();
        assert_eq!(log, vec!["third".to_string()]);
    }

    #[test]
    fn test_distinct_kinds_do_not_coalesce() {
        let scheduler = spawn_log();
        let handle = scheduler.handle();

        handle.post_keyed("battery", |log| log.push("battery".into())).unwrap();
        handle.post_keyed("network", |log| log.push("network".into())).unwrap();
        handle.post(|log| log.push("plain".into())).unwrap();

        let log = handle.call(|log| log.clone()).unwrap();
        assert_eq!(log, vec!["battery", "network", "plain"]);
    }

    #[test]
    fn test_cancel_drops_pending() {
        let scheduler = spawn_log();
        let handle = scheduler.handle();

        handle
            .post_delayed("recheck", Duration::from_millis(30), |log| {
                log.push("recheck".into())
            })
            .unwrap();
        handle.cancel("recheck").unwrap();

        thread::sleep(Duration::from_millis(80));
        assert!(handle.call(|log| log.clone()).unwrap().is_empty());
    }

    #[test]
    fn test_delayed_task_waits() {
        let scheduler = spawn_log();
        let handle = scheduler.handle();
        let start = Instant::now();

        handle
            .post_delayed("late", Duration::from_millis(50), |log| log.push("late".into()))
            .unwrap();
        handle.post(|log| log.push("now".into())).unwrap();

        assert_eq!(handle.call(|log| log.clone()).unwrap(), vec!["now"]);

        while start.elapsed() < Duration::from_millis(100) {
            thread::sleep(Duration::from_millis(10));
        }
        assert_eq!(handle.call(|log| log.clone()).unwrap(), vec!["now", "late"]);
    }

    #[test]
    fn test_call_from_worker_is_reentrant_error() {
        let scheduler = spawn_log();
        let handle = scheduler.handle();
        let inner = handle.clone();
        let outcome = Arc::new(Mutex::new(None));
        let seen = outcome.clone();

        handle
            .post(move |_| {
                let result = inner.call(|log: &mut Log| log.len());
                *seen.lock().unwrap() = Some(matches!(result, Err(SchedulerError::Reentrant)));
            })
            .unwrap();
        handle.flush().unwrap();

        assert_eq!(*outcome.lock().unwrap(), Some(true));
        assert!(!handle.is_worker_thread());
    }

    #[test]
    fn test_panicking_task_does_not_kill_worker() {
        let scheduler = spawn_log();
        let handle = scheduler.handle();

        handle.post(|_| panic!("boom")).unwrap();
        handle.post(|log| log.push("after".into())).unwrap();

        assert_eq!(handle.call(|log| log.clone()).unwrap(), vec!["after"]);
    }

    #[test]
    fn test_shutdown_closes_handles() {
        let mut scheduler = spawn_log();
        let handle = scheduler.handle();
        assert!(scheduler.is_running());

        scheduler.shutdown();
        assert!(!scheduler.is_running());
        assert!(matches!(handle.post(|_| {}), Err(SchedulerError::Closed)));
        assert!(matches!(handle.flush(), Err(SchedulerError::Closed)));
    }

    #[test]
    fn test_init_runs_on_worker_and_can_post() {
        let counter = Arc::new(AtomicUsize::new(0));
        let seen = counter.clone();
        let scheduler: DeliveryScheduler<Log, &'static str> =
            DeliveryScheduler::spawn("init-test", move |handle| {
                assert!(handle.is_worker_thread());
                handle
                    .post(move |log: &mut Log| {
                        seen.fetch_add(1, Ordering::SeqCst);
                        log.push("from-init".into());
                    })
                    .unwrap();
                Vec::new()
            })
            .unwrap();

        let log = scheduler.handle().call(|log| log.clone()).unwrap();
        assert_eq!(log, vec!["from-init"]);
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert_eq!(scheduler.name(), "init-test");
    }
}
