//! [`EventLoop`]: owns one worker thread, one [`Selector`], one
//! [`TimerQueue`]; runs the tick loop described in the module-level design
//! (compute strategy, wait on the selector, dispatch I/O, drain timers).
//!
//! The worker thread keeps its selector and registered channels in a
//! `thread_local! { static CURRENT: RefCell<Option<LoopThreadState>> }` —
//! state that only the owning thread ever touches doesn't need a mutex.

use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, OnceLock};
use std::thread::{self, JoinHandle};
use std::time::Instant;

use mio::{Token, Waker};

use crate::channel::{Channel, ChannelKind};
use crate::config::Config;
use crate::error::{LoopError, TaskError};
use crate::future::{Future, Promise, Spawner};
use crate::selector::{Interests, MioSelector, Readiness, ReadinessEvent, Selector, Strategy};
use crate::task::{ScheduledTask, TaskId, TimerQueue};
use crate::time::TimeAmount;

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Open = 0,
    Closing = 1,
    Closed = 2,
}

/// Per-worker-thread state: the selector and the channels currently
/// registered with it. Lives only on the loop's own thread.
struct LoopThreadState {
    selector: Box<dyn Selector>,
    channels: HashMap<Token, Box<dyn Channel>>,
}

thread_local! {
    static CURRENT: RefCell<Option<LoopThreadState>> = const { RefCell::new(None) };
}

struct Inner {
    id: usize,
    config: Config,
    state: AtomicU8,
    timers: Mutex<TimerQueue>,
    waker: Arc<Waker>,
    worker_thread_id: OnceLock<thread::ThreadId>,
    worker_thread: Mutex<Option<JoinHandle<()>>>,
}

impl Inner {
    fn is_worker_thread(&self) -> bool {
        self.worker_thread_id.get().copied() == Some(thread::current().id())
    }

    fn push_scheduled(&self, task: ScheduledTask) -> TaskId {
        let id = self.timers.lock().unwrap().push(task);
        wake_or_abort(&self.waker);
        id
    }
}

impl Spawner for Inner {
    fn execute(&self, task: Box<dyn FnOnce() + Send>) {
        self.push_scheduled(ScheduledTask::new(Instant::now(), task, |_| {}));
    }

    fn in_event_loop(&self) -> bool {
        self.is_worker_thread()
    }
}

/// Logs and aborts the process if a selector wakeup fails.
///
/// A failed wakeup means no future `execute`/`scheduleTask`/`cancel` call
/// from another thread can ever interrupt this loop's blocking wait again;
/// continuing would silently wedge the loop rather than fail loudly (§10.1).
fn wake_or_abort(waker: &Waker) {
    if let Err(error) = waker.wake() {
        tracing::error!(%error, "selector wakeup failed; aborting process");
        std::process::abort();
    }
}

/// A single-threaded run-to-completion event loop: one worker thread, one
/// [`Selector`], one [`TimerQueue`].
///
/// Not constructed directly by most callers — see [`crate::group::EventLoopGroup`].
pub struct EventLoop {
    inner: Arc<Inner>,
}

impl EventLoop {
    /// Spawns a new loop's worker thread. `index` only affects the worker
    /// thread's name (see [`Config::thread_name`]); the loop's own id used
    /// in diagnostics is assigned from a process-wide counter regardless of
    /// which group, if any, owns it.
    pub fn new(index: usize, config: Config) -> std::io::Result<Self> {
        static ID_GENERATOR: AtomicUsize = AtomicUsize::new(0);
        let id = ID_GENERATOR.fetch_add(1, Ordering::Relaxed);

        let selector = MioSelector::new(config.event_batch_size)?;
        let waker = selector.waker_handle();

        let inner = Arc::new(Inner {
            id,
            config: config.clone(),
            state: AtomicU8::new(State::Open as u8),
            timers: Mutex::new(TimerQueue::new()),
            waker,
            worker_thread_id: OnceLock::new(),
            worker_thread: Mutex::new(None),
        });

        let thread_inner = inner.clone();
        let thread_name = config.thread_name(index);
        let handle = thread::Builder::new()
            .name(thread_name)
            .spawn(move || run(thread_inner, Box::new(selector)))?;

        *inner.worker_thread.lock().unwrap() = Some(handle);

        Ok(EventLoop { inner })
    }

    fn spawner(&self) -> Arc<dyn Spawner> {
        self.inner.clone()
    }

    fn is_open(&self) -> bool {
        self.inner.state.load(Ordering::SeqCst) == State::Open as u8
    }

    /// True if the calling thread is this loop's worker thread.
    pub fn in_event_loop(&self) -> bool {
        self.inner.is_worker_thread()
    }

    /// Enqueues `task` as an immediate task and wakes the loop. Safe to call from any thread.
    pub fn execute(&self, task: impl FnOnce() + Send + 'static) {
        self.inner.execute(Box::new(task));
    }

    /// A fresh promise bound to this loop.
    pub fn new_promise<T, E>(&self) -> Promise<T, E>
    where
        T: Send + Sync + 'static,
        E: Send + Sync + 'static,
    {
        Promise::new_pair(self.spawner()).0
    }

    /// An already-succeeded future bound to this loop.
    pub fn new_succeeded_future<T>(&self, value: T) -> Future<T, TaskError>
    where
        T: Send + Sync + 'static,
    {
        Future::succeeded(self.spawner(), value)
    }

    /// An already-failed future bound to this loop.
    pub fn new_failed_future<T>(&self, error: TaskError) -> Future<T, TaskError>
    where
        T: Send + Sync + 'static,
    {
        Future::failed(self.spawner(), error)
    }

    /// Schedules `task` to run as soon as possible, returning a future for its result.
    ///
    /// If the loop is `closing` or `closed`, the task is not run; the
    /// returned future fails immediately with [`LoopError::Shutdown`].
    pub fn submit<T, E>(&self, task: impl FnOnce() -> Result<T, E> + Send + 'static) -> Future<T, E>
    where
        T: Send + Sync + 'static,
        E: Send + Sync + 'static,
    {
        let promise = self.new_promise::<T, E>();
        let future = promise.future();

        if !self.is_open() {
            tracing::warn!(loop_id = self.inner.id, "submit rejected: loop is closing or closed");
            promise.fail_with_loop_error(LoopError::Shutdown);
            return future;
        }

        let (run_cell, fail_cell) = split_promise(promise);
        let scheduled = ScheduledTask::new(
            Instant::now(),
            move || {
                let result = task();
                if let Some(promise) = run_cell.lock().unwrap().take() {
                    promise.complete(result);
                }
            },
            move |error| {
                if let Some(promise) = fail_cell.lock().unwrap().take() {
                    promise.fail_with_loop_error(error);
                }
            },
        );

        self.inner.push_scheduled(scheduled);
        tracing::debug!(loop_id = self.inner.id, "task submitted");
        future
    }

    /// Schedules `task` to run at or after `now + delay`.
    ///
    /// If the loop is `closing` or `closed`, the task is not scheduled; the
    /// returned handle's future fails immediately with [`LoopError::Shutdown`]
    /// and its `cancel()` is a no-op.
    pub fn schedule_task<T, E>(
        &self,
        delay: TimeAmount,
        task: impl FnOnce() -> Result<T, E> + Send + 'static,
    ) -> Scheduled<T, E>
    where
        T: Send + Sync + 'static,
        E: Send + Sync + 'static,
    {
        let promise = self.new_promise::<T, E>();
        let future = promise.future();

        if !self.is_open() {
            tracing::warn!(loop_id = self.inner.id, "scheduleTask rejected: loop is closing or closed");
            promise.fail_with_loop_error(LoopError::Shutdown);
            return Scheduled { future, task_id: None, inner: self.inner.clone() };
        }

        let (run_cell, fail_cell) = split_promise(promise);
        let ready_time = Instant::now() + delay.to_duration();
        let scheduled_task = ScheduledTask::new(
            ready_time,
            move || {
                let result = task();
                if let Some(promise) = run_cell.lock().unwrap().take() {
                    promise.complete(result);
                }
            },
            move |error| {
                if let Some(promise) = fail_cell.lock().unwrap().take() {
                    promise.fail_with_loop_error(error);
                }
            },
        );

        let task_id = self.inner.push_scheduled(scheduled_task);
        tracing::debug!(loop_id = self.inner.id, ?delay, "task scheduled");
        Scheduled { future, task_id: Some(task_id), inner: self.inner.clone() }
    }

    fn assert_in_event_loop(&self) -> Result<(), LoopError> {
        if self.in_event_loop() {
            Ok(())
        } else {
            tracing::warn!(loop_id = self.inner.id, "channel operation attempted off the loop thread");
            Err(LoopError::UnsupportedOperation)
        }
    }

    /// Registers `channel` with this loop's selector. Must be called on the loop thread.
    pub fn register(&self, mut channel: Box<dyn Channel>) -> Result<Token, LoopError> {
        self.assert_in_event_loop()?;
        let token = channel.token();
        let interests = channel.interests();

        CURRENT.with(|current| -> Result<(), LoopError> {
            let mut guard = current.borrow_mut();
            let state = guard.as_mut().expect("loop thread state missing while on loop thread");
            state.selector.register(channel.source(), token, interests)?;
            state.channels.insert(token, channel);
            Ok(())
        })?;

        tracing::debug!(loop_id = self.inner.id, ?token, "channel registered");
        Ok(token)
    }

    /// Updates `token`'s interest set. Must be called on the loop thread.
    pub fn reregister(&self, token: Token, interests: Interests) -> Result<(), LoopError> {
        self.assert_in_event_loop()?;
        CURRENT.with(|current| -> Result<(), LoopError> {
            let mut guard = current.borrow_mut();
            let state = guard.as_mut().expect("loop thread state missing while on loop thread");
            let channel = state.channels.get_mut(&token).ok_or(LoopError::UnsupportedOperation)?;
            state.selector.reregister(channel.source(), token, interests)?;
            Ok(())
        })?;
        tracing::debug!(loop_id = self.inner.id, ?token, "channel reregistered");
        Ok(())
    }

    /// Removes `token` from this loop's selector. Must be called on the loop thread.
    pub fn deregister(&self, token: Token) -> Result<(), LoopError> {
        self.assert_in_event_loop()?;
        CURRENT.with(|current| -> Result<(), LoopError> {
            let mut guard = current.borrow_mut();
            let state = guard.as_mut().expect("loop thread state missing while on loop thread");
            if let Some(mut channel) = state.channels.remove(&token) {
                state.selector.deregister(channel.source())?;
            }
            Ok(())
        })?;
        tracing::debug!(loop_id = self.inner.id, ?token, "channel deregistered");
        Ok(())
    }

    /// Transitions *open* → *closing*, deregisters every remaining channel,
    /// then transitions to *closed*. The returned future resolves once that's done.
    ///
    /// A second call on a loop that isn't *open* fails immediately with
    /// [`LoopError::AlreadyClosed`] rather than queuing behind the first.
    pub fn close_gently(&self) -> Future<(), LoopError> {
        let promise = self.new_promise::<(), LoopError>();
        let future = promise.future();

        let transitioned = self
            .inner
            .state
            .compare_exchange(State::Open as u8, State::Closing as u8, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok();

        if !transitioned {
            promise.fail_with_loop_error(LoopError::AlreadyClosed);
            return future;
        }

        tracing::debug!(loop_id = self.inner.id, "close_gently: draining channels");
        let inner = self.inner.clone();
        self.execute(move || {
            CURRENT.with(|current| {
                if let Some(state) = current.borrow_mut().as_mut() {
                    let tokens: Vec<Token> = state.channels.keys().copied().collect();
                    for token in tokens {
                        if let Some(mut channel) = state.channels.remove(&token) {
                            let _ = state.selector.deregister(channel.source());
                        }
                    }
                }
            });
            inner.state.store(State::Closed as u8, Ordering::SeqCst);
            promise.succeed(());
        });

        future
    }

    /// Drains and terminates the loop, then invokes `callback` from a
    /// dedicated thread once the worker thread has fully exited — the loop
    /// itself can't deliver this notification, since it's no longer running
    /// by the time draining completes.
    pub fn shutdown_gracefully(&self, callback: impl FnOnce(Result<(), LoopError>) + Send + 'static) {
        let future = self.close_gently();
        let inner = self.inner.clone();
        let thread_name = format!("{}-shutdown", inner.config.thread_name_base);

        let spawned = thread::Builder::new().name(thread_name).spawn(move || {
            let outcome = future.wait();
            if let Some(handle) = inner.worker_thread.lock().unwrap().take() {
                let _ = handle.join();
            }
            let result = match outcome.as_ref() {
                Ok(()) => Ok(()),
                Err(_) => Err(LoopError::ShutdownFailed(None)),
            };
            callback(result);
        });

        if let Err(error) = spawned {
            tracing::error!(%error, "failed to spawn shutdown notification thread");
            callback(Err(LoopError::ShutdownFailed(None)));
        }
    }
}

fn split_promise<T, E>(promise: Promise<T, E>) -> (Arc<Mutex<Option<Promise<T, E>>>>, Arc<Mutex<Option<Promise<T, E>>>>)
where
    T: Send + Sync + 'static,
    E: Send + Sync + 'static,
{
    let cell = Arc::new(Mutex::new(Some(promise)));
    (cell.clone(), cell)
}

/// A handle to a task scheduled for the future: its eventual result, and the
/// ability to cancel it before it runs.
pub struct Scheduled<T, E = TaskError>
where
    T: Send + Sync + 'static,
    E: Send + Sync + 'static,
{
    future: Future<T, E>,
    task_id: Option<TaskId>,
    inner: Arc<Inner>,
}

impl<T, E> Scheduled<T, E>
where
    T: Send + Sync + 'static,
    E: Send + Sync + 'static,
{
    /// The future this task will resolve.
    pub fn future_result(&self) -> Future<T, E> {
        self.future.clone()
    }

    /// Cancels the task if it hasn't run yet, failing its future with
    /// [`LoopError::Cancelled`]. A no-op if the task already ran, was
    /// already dequeued for execution, or was already cancelled.
    pub fn cancel(&self) {
        let Some(task_id) = self.task_id else { return };
        let removed = self.inner.timers.lock().unwrap().remove(task_id);
        if let Some(task) = removed {
            task.fail(LoopError::Cancelled);
            wake_or_abort(&self.inner.waker);
        }
    }
}

fn tick(inner: &Arc<Inner>) {
    let deadline = inner.timers.lock().unwrap().peek_ready_time();
    let strategy = match deadline {
        None => Strategy::Block,
        Some(deadline) => {
            let now = Instant::now();
            if deadline <= now {
                Strategy::PollNow
            } else {
                Strategy::BlockFor(deadline - now)
            }
        }
    };

    let span = tracing::trace_span!("tick", loop_id = inner.id, strategy = ?strategy);
    let _entered = span.enter();

    let events = CURRENT.with(|current| {
        let mut guard = current.borrow_mut();
        let state = guard.as_mut().expect("loop thread state missing on its own worker thread");
        state.selector.wait(strategy)
    });

    match events {
        Ok(events) => dispatch(inner, events),
        Err(error) => {
            tracing::error!(loop_id = inner.id, %error, "selector wait failed; closing loop");
            inner.state.store(State::Closed as u8, Ordering::SeqCst);
        }
    }

    drain_timers(inner);
}

fn dispatch(inner: &Arc<Inner>, events: Vec<ReadinessEvent>) {
    for event in events {
        let channel = CURRENT.with(|current| {
            current.borrow_mut().as_mut().and_then(|state| state.channels.remove(&event.token))
        });
        let Some(mut channel) = channel else { continue };

        // A listening channel only ever accepts; readiness on it means
        // "readable" regardless of what the selector actually reported, and
        // there's no writable-then-readable ordering question to make.
        match (channel.kind(), event.readiness) {
            (ChannelKind::Listening, _) => channel.handle_readable(),
            (ChannelKind::Connected, Readiness::Readable) => channel.handle_readable(),
            (ChannelKind::Connected, Readiness::Writable) => channel.handle_writable(),
            (ChannelKind::Connected, Readiness::Both) => {
                channel.handle_writable();
                if channel.is_open() {
                    channel.handle_readable();
                }
            }
        }

        let still_open = channel.is_open();
        CURRENT.with(|current| {
            let mut guard = current.borrow_mut();
            let Some(state) = guard.as_mut() else { return };
            if still_open {
                state.channels.insert(event.token, channel);
            } else {
                let _ = state.selector.deregister(channel.source());
                tracing::debug!(loop_id = inner.id, token = ?event.token, "channel deregistered (closed)");
            }
        });
    }
}

fn drain_timers(inner: &Arc<Inner>) {
    // One snapshot for the whole pass, not one per task: a task that
    // resubmits itself via `execute` pushes an immediate task whose ready_time
    // is the real current instant, strictly after this snapshot, so it defers
    // to the next tick instead of being drained in the same pass it was
    // submitted from — otherwise a self-resubmitting task would never let
    // this pass end and the loop would starve its selector wait.
    let now = Instant::now();
    let ready = inner.timers.lock().unwrap().pop_ready(now);
    for task in ready {
        task.run();
    }
}

fn run(inner: Arc<Inner>, selector: Box<dyn Selector>) {
    CURRENT.with(|current| {
        *current.borrow_mut() = Some(LoopThreadState { selector, channels: HashMap::new() });
    });
    let _ = inner.worker_thread_id.set(thread::current().id());

    while inner.state.load(Ordering::SeqCst) != State::Closed as u8 {
        tick(&inner);
    }

    let remaining = inner.timers.lock().unwrap().drain();
    for task in remaining {
        task.fail(LoopError::Shutdown);
    }

    CURRENT.with(|current| {
        if let Some(mut state) = current.borrow_mut().take() {
            let _ = state.selector.close();
        }
    });

    tracing::debug!(loop_id = inner.id, "event loop thread exiting");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::future::Failure;
    use std::sync::mpsc;
    use std::time::Duration;

    fn spawn_loop() -> EventLoop {
        EventLoop::new(0, Config::default()).expect("failed to create test event loop")
    }

    mod execute {
        use super::*;

        #[test]
        fn runs_on_a_different_thread_than_the_caller() {
            let event_loop = spawn_loop();
            let (tx, rx) = mpsc::channel();
            let caller_thread = thread::current().id();

            event_loop.execute(move || tx.send(thread::current().id()).unwrap());

            let ran_on = rx.recv_timeout(Duration::from_secs(1)).unwrap();
            assert_ne!(ran_on, caller_thread);
        }
    }

    mod submit {
        use super::*;

        #[test]
        fn resolves_with_the_callables_value() {
            let event_loop = spawn_loop();
            let future = event_loop.submit(|| Ok::<_, crate::error::Message>(21 * 2));
            assert!(matches!(future.wait().as_ref(), Ok(42)));
        }

        #[test]
        fn resolves_with_the_callables_error() {
            let event_loop = spawn_loop();
            let future = event_loop.submit(|| Err::<i32, _>(crate::error::Message::from("boom")));
            assert!(matches!(future.wait().as_ref(), Err(Failure::Task(_))));
        }

        #[test]
        fn rejected_after_close_gently() {
            let event_loop = spawn_loop();
            event_loop.close_gently().wait();

            let future = event_loop.submit(|| Ok::<_, crate::error::Message>(1));
            assert!(matches!(future.wait().as_ref(), Err(Failure::Loop(LoopError::Shutdown))));
        }
    }

    mod schedule_task {
        use super::*;

        #[test]
        fn runs_after_the_requested_delay() {
            let event_loop = spawn_loop();
            let started = Instant::now();
            let scheduled = event_loop.schedule_task(TimeAmount::ms(20), || Ok::<_, crate::error::Message>(()));
            scheduled.future_result().wait();
            assert!(started.elapsed() >= Duration::from_millis(20));
        }

        #[test]
        fn cancel_before_it_runs_fails_with_cancelled() {
            let event_loop = spawn_loop();
            let scheduled = event_loop.schedule_task(TimeAmount::s(5), || Ok::<_, crate::error::Message>(()));
            scheduled.cancel();

            let outcome = scheduled.future_result().wait();
            assert!(matches!(outcome.as_ref(), Err(Failure::Loop(LoopError::Cancelled))));
        }

        #[test]
        fn cancel_after_it_ran_is_a_no_op() {
            let event_loop = spawn_loop();
            let scheduled = event_loop.schedule_task(TimeAmount::ZERO, || Ok::<_, crate::error::Message>(7));
            let outcome = scheduled.future_result().wait();
            assert!(matches!(outcome.as_ref(), Ok(7)));

            scheduled.cancel();
        }
    }

    mod in_event_loop {
        use super::*;

        #[test]
        fn false_from_an_external_thread() {
            let event_loop = spawn_loop();
            assert!(!event_loop.in_event_loop());
        }

        #[test]
        fn true_from_inside_a_submitted_task() {
            let event_loop = spawn_loop();
            let inner = event_loop.inner.clone();
            let future = event_loop.submit(move || Ok::<_, crate::error::Message>(inner.is_worker_thread()));
            assert!(matches!(future.wait().as_ref(), Ok(true)));
        }
    }

    mod close_gently {
        use super::*;

        #[test]
        fn resolves_successfully() {
            let event_loop = spawn_loop();
            let outcome = event_loop.close_gently().wait();
            assert!(outcome.is_ok());
        }

        #[test]
        fn a_second_call_fails_with_already_closed() {
            let event_loop = spawn_loop();
            event_loop.close_gently().wait();
            let second = event_loop.close_gently().wait();
            assert!(matches!(second.as_ref(), Err(Failure::Loop(LoopError::AlreadyClosed))));
        }
    }

    mod shutdown_gracefully {
        use super::*;

        #[test]
        fn invokes_the_callback_exactly_once() {
            let event_loop = spawn_loop();
            let (tx, rx) = mpsc::channel();
            event_loop.shutdown_gracefully(move |result| tx.send(result).unwrap());

            let result = rx.recv_timeout(Duration::from_secs(1)).unwrap();
            assert!(result.is_ok());
        }
    }

    #[test]
    fn trait_implementations() {
        use impls::impls;

        assert!(impls!(EventLoop: Send & Sync & !Clone));
        assert!(impls!(Scheduled<i32>: Send & !Clone));
    }
}
