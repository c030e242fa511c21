use thiserror::Error;

#[derive(Debug, Error)]
pub enum SchedulerError {
    /// The worker thread could not be started.
    #[error("failed to spawn delivery thread: {0}")]
    Spawn(#[from] std::io::Error),

    /// The worker has shut down; the request was not queued.
    #[error("delivery scheduler is closed")]
    Closed,

    /// A blocking call was made from the worker thread itself.
    #[error("blocking call from the delivery thread would deadlock")]
    Reentrant,
}
