//! [`EventLoopGroup`]: a fixed pool of [`EventLoop`]s handed out round-robin,
//! the same way a runtime distributes work across a pool of workers via a
//! shared atomic counter.

use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{mpsc, Arc, Mutex};

use crate::config::GroupConfig;
use crate::error::LoopError;
use crate::event_loop::EventLoop;

/// Owns a pool of [`EventLoop`]s and assigns work to them round-robin.
pub struct EventLoopGroup {
    loops: Vec<EventLoop>,
    next: AtomicUsize,
}

impl EventLoopGroup {
    /// Spawns `config.num_threads` event loops, each its own worker thread.
    pub fn new(config: GroupConfig) -> io::Result<Self> {
        let mut loops = Vec::with_capacity(config.num_threads);
        for index in 0..config.num_threads {
            loops.push(EventLoop::new(index, config.loop_config.clone())?);
        }
        Ok(EventLoopGroup { loops, next: AtomicUsize::new(0) })
    }

    /// The next loop in round-robin order.
    ///
    /// # Panics
    ///
    /// Panics if the group owns zero loops (only possible by constructing
    /// it from a [`GroupConfig`] with `num_threads == 0`).
    pub fn next(&self) -> &EventLoop {
        let index = self.next.fetch_add(1, Ordering::Relaxed) % self.loops.len();
        &self.loops[index]
    }

    /// Number of loops this group owns.
    pub fn len(&self) -> usize {
        self.loops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.loops.is_empty()
    }

    /// Iterates every loop the group owns, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = &EventLoop> {
        self.loops.iter()
    }

    /// Gently shuts down every owned loop concurrently, invoking `callback`
    /// exactly once after all of them have finished. Reports the first
    /// failure observed, if any, as [`LoopError::ShutdownFailed`].
    pub fn shutdown_gracefully(&self, callback: impl FnOnce(Result<(), LoopError>) + Send + 'static) {
        if self.loops.is_empty() {
            callback(Ok(()));
            return;
        }

        let remaining = Arc::new(AtomicUsize::new(self.loops.len()));
        let any_failed = Arc::new(Mutex::new(false));
        let callback = Arc::new(Mutex::new(Some(callback)));

        for event_loop in &self.loops {
            let remaining = remaining.clone();
            let any_failed = any_failed.clone();
            let callback = callback.clone();

            event_loop.shutdown_gracefully(move |result| {
                if result.is_err() {
                    *any_failed.lock().unwrap() = true;
                }

                if remaining.fetch_sub(1, Ordering::SeqCst) == 1 {
                    let outcome =
                        if *any_failed.lock().unwrap() { Err(LoopError::ShutdownFailed(None)) } else { Ok(()) };
                    if let Some(callback) = callback.lock().unwrap().take() {
                        callback(outcome);
                    }
                }
            });
        }
    }

    /// Blocking variant of [`EventLoopGroup::shutdown_gracefully`], for
    /// callers not themselves running on one of this group's loops.
    pub fn sync_shutdown_gracefully(&self) -> Result<(), LoopError> {
        let (tx, rx) = mpsc::channel();
        self.shutdown_gracefully(move |result| {
            let _ = tx.send(result);
        });
        rx.recv().expect("shutdown_gracefully callback dropped its sender without sending")
    }
}
