//! Fixed-size worker pool that runs database writes off the caller's thread.
//!
//! Each submitted job gets a [`PendingWrite`] handle. Jobs cannot be
//! cancelled: once queued they run to completion or failure, including jobs
//! still queued when the pool shuts down.

use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{bounded, unbounded, Receiver, RecvTimeoutError, Sender, TryRecvError};
use log::{debug, info, warn};

use crate::app_response::AppResponse;
use crate::wardrobe_db::WardrobeDb;

type Job = Box<dyn FnOnce(&WardrobeDb) + Send>;

pub struct WritePool {
    sender: Mutex<Option<Sender<Job>>>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    size: usize,
}

impl std::fmt::Debug for WritePool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WritePool").field("size", &self.size).finish()
    }
}

fn worker_loop(index: usize, jobs: Receiver<Job>, db: Arc<WardrobeDb>) {
    debug!("Write worker {index} started");
    while let Ok(job) = jobs.recv() {
        job(&db);
    }
    debug!("Write worker {index} stopped");
}

impl WritePool {
    pub fn new(size: usize, db: Arc<WardrobeDb>) -> Result<Self, AppResponse> {
        if size == 0 {
            return Err(AppResponse::ValidationError(
                "Write pool needs at least one worker".to_string(),
            ));
        }
        let (tx, rx) = unbounded::<Job>();
        let mut workers = Vec::with_capacity(size);
        for index in 0..size {
            let jobs = rx.clone();
            let db = Arc::clone(&db);
            let handle = thread::Builder::new()
                .name(format!("wardrobe-writer-{index}"))
                .spawn(move || worker_loop(index, jobs, db))?;
            workers.push(handle);
        }
        info!("Write pool started with {size} workers");
        Ok(WritePool {
            sender: Mutex::new(Some(tx)),
            workers: Mutex::new(workers),
            size,
        })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Queues `op` and returns immediately.
    pub fn submit<T, F>(&self, op: F) -> PendingWrite<T>
    where
        T: Send + 'static,
        F: FnOnce(&WardrobeDb) -> Result<T, AppResponse> + Send + 'static,
    {
        let (done_tx, done_rx) = bounded(1);
        let job: Job = Box::new(move |db: &WardrobeDb| {
            let result = op(db);
            if let Err(e) = &result {
                warn!("Write failed: {e}");
            }
            // The caller may have dropped its handle; the write still happened.
            let _ = done_tx.send(result);
        });

        let sent = match self
            .sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
        {
            Some(tx) => tx.send(job).is_ok(),
            None => false,
        };
        if sent {
            PendingWrite { rx: done_rx, taken: false }
        } else {
            PendingWrite::failed(AppResponse::DatabaseError("Write pool is shut down".to_string()))
        }
    }

    /// Stops accepting work, lets queued jobs finish and joins the workers.
    pub fn shutdown(&self) {
        let sender = self
            .sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if sender.is_none() {
            return;
        }
        drop(sender);

        let workers: Vec<JoinHandle<()>> = self
            .workers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain(..)
            .collect();
        for handle in workers {
            if handle.join().is_err() {
                warn!("A write worker panicked before shutdown");
            }
        }
        info!("Write pool stopped");
    }
}

impl Drop for WritePool {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Completion handle for a queued write.
#[must_use = "a pending write reports failures only through its handle"]
pub struct PendingWrite<T> {
    rx: Receiver<Result<T, AppResponse>>,
    taken: bool,
}

impl<T> std::fmt::Debug for PendingWrite<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingWrite")
            .field("ready", &!self.rx.is_empty())
            .field("taken", &self.taken)
            .finish()
    }
}

fn lost_worker() -> AppResponse {
    AppResponse::DatabaseError("Write worker stopped before reporting a result".to_string())
}

impl<T> PendingWrite<T> {
    /// A handle that is already resolved with `err`.
    pub fn failed(err: AppResponse) -> Self {
        let (tx, rx) = bounded(1);
        let _ = tx.send(Err(err));
        PendingWrite { rx, taken: false }
    }

    /// Blocks until the write has finished.
    pub fn wait(self) -> Result<T, AppResponse> {
        self.rx.recv().unwrap_or_else(|_| Err(lost_worker()))
    }

    /// Waits up to `timeout`. The handle is handed back if the write is
    /// still running.
    pub fn wait_timeout(self, timeout: Duration) -> Result<Result<T, AppResponse>, Self> {
        match self.rx.recv_timeout(timeout) {
            Ok(result) => Ok(result),
            Err(RecvTimeoutError::Disconnected) => Ok(Err(lost_worker())),
            Err(RecvTimeoutError::Timeout) => Err(self),
        }
    }

    /// Result of the write if it has finished, without blocking. Yields
    /// `Some` only once per handle.
    pub fn try_take(&mut self) -> Option<Result<T, AppResponse>> {
        if self.taken {
            return None;
        }
        let result = match self.rx.try_recv() {
            Ok(result) => result,
            Err(TryRecvError::Empty) => return None,
            Err(TryRecvError::Disconnected) => Err(lost_worker()),
        };
        self.taken = true;
        Some(result)
    }
}
