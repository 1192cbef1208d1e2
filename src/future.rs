//! [`Promise`] / [`Future`]: a single-assignment result cell with callback
//! chaining, every callback delivered on the promise's bound loop.
//!
//! Grounded in the same shape as a familiar "original error, or cancelled"
//! task-outcome enum, generalized here to the fuller
//! [`LoopError`] taxonomy, and in the broadcast-style (multiple independent
//! listeners on one outcome) `Future`/`Promise` APIs common to event-loop
//! runtimes in this space — as opposed to a single-consumer combinator chain
//! that consumes itself on every `.then()`.

use std::fmt;
use std::sync::{Arc, Condvar, Mutex};

use crate::error::LoopError;

/// Something an [`EventLoop`](crate::event_loop::EventLoop) exposes to
/// [`Promise`]/[`Future`] so they can post callbacks back onto it without
/// `future.rs` depending on the concrete `EventLoop` type.
pub trait Spawner: Send + Sync {
    /// Enqueues `task` as an immediate task and wakes the loop. Safe from any thread.
    fn execute(&self, task: Box<dyn FnOnce() + Send>);

    /// True if the calling thread is this loop's worker thread.
    fn in_event_loop(&self) -> bool;
}

/// The failure side of an [`Outcome`]: either the task's own error, or an
/// error the loop itself raised (cancellation, shutdown).
///
/// Mirrors the familiar `Error<E> { Original(E), Cancelled }` task-outcome
/// shape, widened to the complete taxonomy in [`LoopError`].
#[derive(Debug)]
pub enum Failure<E> {
    /// The submitted callable, or an upstream combinator, failed with this error.
    Task(E),
    /// The loop itself failed the task (cancelled, shutting down, ...).
    Loop(LoopError),
}

impl<E: fmt::Display> fmt::Display for Failure<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Failure::Task(e) => write!(f, "{e}"),
            Failure::Loop(e) => write!(f, "{e}"),
        }
    }
}

impl<E: std::error::Error + 'static> std::error::Error for Failure<E> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Failure::Task(e) => Some(e),
            Failure::Loop(e) => Some(e),
        }
    }
}

/// The result a [`Promise`]/[`Future`] pair eventually settles on.
pub type Outcome<T, E> = Result<T, Arc<Failure<E>>>;

type Callback<T, E> = Box<dyn FnOnce(Arc<Outcome<T, E>>) + Send>;

enum State<T, E> {
    Pending(Vec<Callback<T, E>>),
    Resolved(Arc<Outcome<T, E>>),
}

struct Shared<T, E> {
    state: Mutex<State<T, E>>,
    condvar: Condvar,
    spawner: Arc<dyn Spawner>,
}

impl<T, E> Shared<T, E>
where
    T: Send + Sync + 'static,
    E: Send + Sync + 'static,
{
    fn new(spawner: Arc<dyn Spawner>) -> Arc<Self> {
        Arc::new(Shared {
            state: Mutex::new(State::Pending(Vec::new())),
            condvar: Condvar::new(),
            spawner,
        })
    }

    /// Registers `callback`, firing it immediately (possibly synchronously,
    /// see [`Shared::deliver`]) if the outcome is already known.
    fn register(self: &Arc<Self>, callback: Callback<T, E>) {
        let mut guard = self.state.lock().unwrap();
        match &mut *guard {
            State::Pending(callbacks) => callbacks.push(callback),
            State::Resolved(outcome) => {
                let outcome = outcome.clone();
                drop(guard);
                self.deliver(callback, outcome);
            }
        }
    }

    /// Settles the cell with a ready-made [`Outcome`], firing every callback
    /// registered so far. A second call is a contract violation: it's caught
    /// by `debug_assert!` and otherwise silently ignored (first resolution wins),
    /// matching the double-fulfill policy this crate commits to (see DESIGN.md).
    fn resolve(self: &Arc<Self>, outcome: Outcome<T, E>) {
        let outcome = Arc::new(outcome);
        let callbacks = {
            let mut guard = self.state.lock().unwrap();
            if matches!(&*guard, State::Resolved(_)) {
                debug_assert!(false, "promise fulfilled twice");
                return;
            }
            match std::mem::replace(&mut *guard, State::Resolved(outcome.clone())) {
                State::Pending(callbacks) => callbacks,
                State::Resolved(_) => unreachable!("checked above"),
            }
        };
        self.condvar.notify_all();

        for callback in callbacks {
            self.deliver(callback, outcome.clone());
        }
    }

    /// Same as [`Shared::resolve`] but reusing an outcome that's already
    /// behind an `Arc` — used by `cascade`, which fulfills a differently-bound
    /// promise with literally the same outcome cell rather than cloning `T`.
    fn resolve_from_arc(self: &Arc<Self>, outcome: Arc<Outcome<T, E>>) {
        let callbacks = {
            let mut guard = self.state.lock().unwrap();
            if matches!(&*guard, State::Resolved(_)) {
                debug_assert!(false, "promise fulfilled twice");
                return;
            }
            match std::mem::replace(&mut *guard, State::Resolved(outcome.clone())) {
                State::Pending(callbacks) => callbacks,
                State::Resolved(_) => unreachable!("checked above"),
            }
        };
        self.condvar.notify_all();

        for callback in callbacks {
            self.deliver(callback, outcome.clone());
        }
    }

    /// The callback delivery rule (§4.1): synchronous if we're already on the
    /// bound loop, otherwise posted as an immediate task.
    fn deliver(self: &Arc<Self>, callback: Callback<T, E>, outcome: Arc<Outcome<T, E>>) {
        if self.spawner.in_event_loop() {
            callback(outcome);
        } else {
            self.spawner.execute(Box::new(move || callback(outcome)));
        }
    }

    fn wait(self: &Arc<Self>) -> Arc<Outcome<T, E>> {
        debug_assert!(
            !self.spawner.in_event_loop(),
            "Future::wait() must not be called on the loop thread"
        );

        let guard = self.state.lock().unwrap();
        let mut guard = self
            .condvar
            .wait_while(guard, |state| matches!(state, State::Pending(_)))
            .unwrap();

        match std::mem::replace(&mut *guard, State::Resolved(placeholder_outcome::<T, E>())) {
            State::Resolved(outcome) => outcome,
            State::Pending(_) => unreachable!("condvar only wakes once Resolved"),
        }
    }
}

/// Never actually observed: swapped into `wait()`'s guard for the instant it
/// takes to move the real resolved value out, then immediately dropped.
fn placeholder_outcome<T, E>() -> Arc<Outcome<T, E>> {
    Arc::new(Err(Arc::new(Failure::Loop(LoopError::Shutdown))))
}

/// The write side of a result cell bound to one [`EventLoop`](crate::event_loop::EventLoop).
///
/// Not `Clone`: exactly one party is meant to settle a given promise. Create
/// one with `EventLoop::new_promise`.
pub struct Promise<T, E = crate::error::TaskError>
where
    T: Send + Sync + 'static,
    E: Send + Sync + 'static,
{
    shared: Arc<Shared<T, E>>,
}

impl<T, E> Promise<T, E>
where
    T: Send + Sync + 'static,
    E: Send + Sync + 'static,
{
    /// Creates a fresh pending promise/future pair bound to `spawner`.
    pub fn new_pair(spawner: Arc<dyn Spawner>) -> (Promise<T, E>, Future<T, E>) {
        let shared = Shared::new(spawner);
        (
            Promise { shared: shared.clone() },
            Future { shared },
        )
    }

    /// A [`Future`] handle to this promise's eventual outcome.
    pub fn future(&self) -> Future<T, E> {
        Future { shared: self.shared.clone() }
    }

    /// Fulfills the promise with a success value.
    pub fn succeed(self, value: T) {
        self.shared.resolve(Ok(value));
    }

    /// Fails the promise with a task error.
    pub fn fail(self, error: E) {
        self.shared.resolve(Err(Arc::new(Failure::Task(error))));
    }

    /// Fails the promise with a loop-originated error (cancellation, shutdown).
    pub fn fail_with_loop_error(self, error: LoopError) {
        self.shared.resolve(Err(Arc::new(Failure::Loop(error))));
    }

    /// Fulfills the promise with an already-computed `Result`.
    pub fn complete(self, result: Result<T, E>) {
        match result {
            Ok(value) => self.succeed(value),
            Err(error) => self.fail(error),
        }
    }

    fn fail_arc(self, error: Arc<Failure<E>>) {
        self.shared.resolve_from_arc(Arc::new(Err(error)));
    }
}

/// The read side of a [`Promise`]'s result cell.
///
/// Cheaply shared: every method takes `&self`, so the same `Future` can be
/// handed to any number of independent observers (`whenSuccess`, `map`,
/// `cascade`, ...), all of which see the same eventual [`Outcome`].
pub struct Future<T, E = crate::error::TaskError>
where
    T: Send + Sync + 'static,
    E: Send + Sync + 'static,
{
    shared: Arc<Shared<T, E>>,
}

impl<T, E> Clone for Future<T, E>
where
    T: Send + Sync + 'static,
    E: Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Future { shared: self.shared.clone() }
    }
}

impl<T, E> Future<T, E>
where
    T: Send + Sync + 'static,
    E: Send + Sync + 'static,
{
    /// An already-succeeded future, for call sites that need a `Future` but have the value in hand.
    pub fn succeeded(spawner: Arc<dyn Spawner>, value: T) -> Self {
        let (promise, future) = Promise::new_pair(spawner);
        promise.succeed(value);
        future
    }

    /// An already-failed future.
    pub fn failed(spawner: Arc<dyn Spawner>, error: E) -> Self {
        let (promise, future) = Promise::new_pair(spawner);
        promise.fail(error);
        future
    }

    /// Registers a callback invoked with the success value, if any.
    pub fn when_success(&self, callback: impl FnOnce(&T) + Send + 'static) {
        self.shared.register(Box::new(move |outcome: Arc<Outcome<T, E>>| {
            if let Ok(value) = outcome.as_ref() {
                callback(value);
            }
        }));
    }

    /// Registers a callback invoked with the failure, if any.
    pub fn when_failure(&self, callback: impl FnOnce(&Failure<E>) + Send + 'static) {
        self.shared.register(Box::new(move |outcome: Arc<Outcome<T, E>>| {
            if let Err(error) = outcome.as_ref() {
                callback(error);
            }
        }));
    }

    /// Registers a callback invoked with the outcome either way.
    pub fn when_complete(&self, callback: impl FnOnce(&Outcome<T, E>) + Send + 'static) {
        self.shared.register(Box::new(move |outcome: Arc<Outcome<T, E>>| {
            callback(outcome.as_ref());
        }));
    }

    /// Transforms a successful value, producing a derived future on the same bound loop.
    /// A failure passes through untouched.
    pub fn map<U>(&self, f: impl FnOnce(&T) -> U + Send + 'static) -> Future<U, E>
    where
        U: Send + Sync + 'static,
    {
        let (child_promise, child_future) = Promise::new_pair(self.shared.spawner.clone());
        self.shared.register(Box::new(move |outcome: Arc<Outcome<T, E>>| {
            match outcome.as_ref() {
                Ok(value) => child_promise.succeed(f(value)),
                Err(error) => child_promise.fail_arc(error.clone()),
            }
        }));
        child_future
    }

    /// Like [`Future::map`], but `f` returns a further `Future` to chain onto rather than a plain value.
    pub fn flat_map<U>(&self, f: impl FnOnce(&T) -> Future<U, E> + Send + 'static) -> Future<U, E>
    where
        U: Send + Sync + 'static,
    {
        let (child_promise, child_future) = Promise::new_pair(self.shared.spawner.clone());
        self.shared.register(Box::new(move |outcome: Arc<Outcome<T, E>>| {
            match outcome.as_ref() {
                Ok(value) => f(value).cascade(child_promise),
                Err(error) => child_promise.fail_arc(error.clone()),
            }
        }));
        child_future
    }

    /// Fulfills `target` with this future's outcome once it resolves. `target`
    /// may be bound to a different loop than `self`.
    pub fn cascade(&self, target: Promise<T, E>) {
        self.shared.register(Box::new(move |outcome: Arc<Outcome<T, E>>| {
            target.shared.resolve_from_arc(outcome);
        }));
    }

    /// Blocks the calling thread until the outcome is known.
    ///
    /// Must only be called off the bound loop's worker thread (checked with
    /// `debug_assert!` — calling it on the loop thread would deadlock the
    /// loop against its own resolution).
    pub fn wait(&self) -> Arc<Outcome<T, E>> {
        self.shared.wait()
    }
}

impl<T, E> Future<T, E>
where
    T: Clone + Send + Sync + 'static,
    E: Send + Sync + 'static,
{
    /// A future resolving to `(self, other)` once both resolve; fails with
    /// whichever side fails first. Requires `T: Clone` since both observers
    /// need their own copy of the resolved value (see module docs on the
    /// broadcast callback model).
    pub fn and<U>(&self, other: &Future<U, E>) -> Future<(T, U), E>
    where
        U: Clone + Send + Sync + 'static,
    {
        #[derive(Default)]
        struct Joined<T, U> {
            a: Option<T>,
            b: Option<U>,
        }

        let (child_promise, child_future) = Promise::new_pair(self.shared.spawner.clone());
        let joined: Arc<Mutex<Option<Joined<T, U>>>> = Arc::new(Mutex::new(Some(Joined::default())));

        let joined_a = joined.clone();
        let child_promise_a = Arc::new(Mutex::new(Some(child_promise)));
        let child_promise_b = child_promise_a.clone();

        self.shared.register(Box::new(move |outcome: Arc<Outcome<T, E>>| {
            match outcome.as_ref() {
                Ok(value) => {
                    let mut guard = joined_a.lock().unwrap();
                    if let Some(state) = guard.as_mut() {
                        state.a = Some(value.clone());
                        if let (Some(a), Some(b)) = (state.a.clone(), state.b.clone()) {
                            if let Some(promise) = child_promise_a.lock().unwrap().take() {
                                promise.succeed((a, b));
                            }
                            *guard = None;
                        }
                    }
                }
                Err(error) => {
                    *joined_a.lock().unwrap() = None;
                    if let Some(promise) = child_promise_a.lock().unwrap().take() {
                        promise.fail_arc(error.clone());
                    }
                }
            }
        }));

        let joined_b = joined;
        other.shared.register(Box::new(move |outcome: Arc<Outcome<U, E>>| {
            match outcome.as_ref() {
                Ok(value) => {
                    let mut guard = joined_b.lock().unwrap();
                    if let Some(state) = guard.as_mut() {
                        state.b = Some(value.clone());
                        if let (Some(a), Some(b)) = (state.a.clone(), state.b.clone()) {
                            if let Some(promise) = child_promise_b.lock().unwrap().take() {
                                promise.succeed((a, b));
                            }
                            *guard = None;
                        }
                    }
                }
                Err(error) => {
                    *joined_b.lock().unwrap() = None;
                    if let Some(promise) = child_promise_b.lock().unwrap().take() {
                        promise.fail_arc(error.clone());
                    }
                }
            }
        }));

        child_future
    }

    /// A future resolving to every input's value, in input order, once all
    /// resolve; fails with the first failure observed.
    pub fn and_all(spawner: Arc<dyn Spawner>, futures: &[Future<T, E>]) -> Future<Vec<T>, E> {
        let (child_promise, child_future) = Promise::new_pair(spawner);

        if futures.is_empty() {
            child_promise.succeed(Vec::new());
            return child_future;
        }

        let remaining = Arc::new(Mutex::new(vec![None; futures.len()]));
        let outstanding = Arc::new(std::sync::atomic::AtomicUsize::new(futures.len()));
        let child_promise = Arc::new(Mutex::new(Some(child_promise)));

        for (index, future) in futures.iter().enumerate() {
            let remaining = remaining.clone();
            let outstanding = outstanding.clone();
            let child_promise = child_promise.clone();

            future.shared.register(Box::new(move |outcome: Arc<Outcome<T, E>>| {
                match outcome.as_ref() {
                    Ok(value) => {
                        remaining.lock().unwrap()[index] = Some(value.clone());
                        if outstanding.fetch_sub(1, std::sync::atomic::Ordering::SeqCst) == 1 {
                            let values = remaining
                                .lock()
                                .unwrap()
                                .iter()
                                .cloned()
                                .map(|v| v.expect("all slots filled when outstanding reaches zero"))
                                .collect();
                            if let Some(promise) = child_promise.lock().unwrap().take() {
                                promise.succeed(values);
                            }
                        }
                    }
                    Err(error) => {
                        if let Some(promise) = child_promise.lock().unwrap().take() {
                            promise.fail_arc(error.clone());
                        }
                    }
                }
            }));
        }

        child_future
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::thread;

    /// A spawner that runs everything inline and reports itself as "the loop thread" always.
    struct InlineSpawner;

    impl Spawner for InlineSpawner {
        fn execute(&self, task: Box<dyn FnOnce() + Send>) {
            task();
        }

        fn in_event_loop(&self) -> bool {
            true
        }
    }

    /// A spawner simulating cross-thread submission: `execute` runs the task
    /// on a fresh thread, and `in_event_loop` always reports false so the
    /// fast-path rule is never taken.
    struct OffThreadSpawner;

    impl Spawner for OffThreadSpawner {
        fn execute(&self, task: Box<dyn FnOnce() + Send>) {
            thread::spawn(task).join().unwrap();
        }

        fn in_event_loop(&self) -> bool {
            false
        }
    }

    fn inline() -> Arc<dyn Spawner> {
        Arc::new(InlineSpawner)
    }

    mod when_success {
        use super::*;

        #[test]
        fn fires_once_with_the_value() {
            let (promise, future) = Promise::<i32>::new_pair(inline());
            let seen = Arc::new(AtomicUsize::new(0));
            let seen_clone = seen.clone();

            future.when_success(move |value| seen_clone.store(*value as usize, Ordering::SeqCst));
            promise.succeed(7);

            assert_eq!(seen.load(Ordering::SeqCst), 7);
        }

        #[test]
        fn registered_after_resolution_still_fires() {
            let (promise, future) = Promise::<i32>::new_pair(inline());
            promise.succeed(7);

            let seen = Arc::new(AtomicUsize::new(0));
            let seen_clone = seen.clone();
            future.when_success(move |value| seen_clone.store(*value as usize, Ordering::SeqCst));

            assert_eq!(seen.load(Ordering::SeqCst), 7);
        }

        #[test]
        fn does_not_fire_on_failure() {
            let (promise, future) = Promise::<i32>::new_pair(inline());
            let fired = Arc::new(AtomicBool::new(false));
            let fired_clone = fired.clone();

            future.when_success(move |_| fired_clone.store(true, Ordering::SeqCst));
            promise.fail(crate::error::Message::from("boom"));

            assert!(!fired.load(Ordering::SeqCst));
        }

        #[test]
        fn multiple_listeners_all_observe_the_same_value() {
            let (promise, future) = Promise::<i32>::new_pair(inline());
            let a = Arc::new(AtomicUsize::new(0));
            let b = Arc::new(AtomicUsize::new(0));
            let (a2, b2) = (a.clone(), b.clone());

            future.when_success(move |v| a.store(*v as usize, Ordering::SeqCst));
            future.when_success(move |v| b.store(*v as usize, Ordering::SeqCst));
            promise.succeed(42);

            assert_eq!(a2.load(Ordering::SeqCst), 42);
            assert_eq!(b2.load(Ordering::SeqCst), 42);
        }
    }

    mod registration_order {
        use super::*;

        #[test]
        fn callbacks_fire_in_registration_order() {
            let (promise, future) = Promise::<i32>::new_pair(inline());
            let order = Arc::new(Mutex::new(Vec::new()));

            for i in 0..5 {
                let order = order.clone();
                future.when_success(move |_| order.lock().unwrap().push(i));
            }
            promise.succeed(1);

            assert_eq!(*order.lock().unwrap(), vec![0, 1, 2, 3, 4]);
        }
    }

    mod delivery_rule {
        use super::*;

        #[test]
        fn runs_off_thread_callbacks_through_execute_not_inline() {
            let spawner = Arc::new(OffThreadSpawner);
            let (promise, future): (Promise<i32>, Future<i32>) = Promise::new_pair(spawner);

            let executing_thread = Arc::new(Mutex::new(None));
            let executing_thread_clone = executing_thread.clone();
            future.when_success(move |_| {
                *executing_thread_clone.lock().unwrap() = Some(thread::current().id());
            });

            let resolving_thread = thread::current().id();
            promise.succeed(1);

            assert_ne!(*executing_thread.lock().unwrap(), Some(resolving_thread));
        }
    }

    mod map {
        use super::*;

        #[test]
        fn transforms_the_success_value() {
            let (promise, future) = Promise::<i32>::new_pair(inline());
            let mapped = future.map(|v| v * 2);

            let seen = Arc::new(AtomicUsize::new(0));
            let seen_clone = seen.clone();
            mapped.when_success(move |v| seen_clone.store(*v as usize, Ordering::SeqCst));

            promise.succeed(21);
            assert_eq!(seen.load(Ordering::SeqCst), 42);
        }

        #[test]
        fn propagates_failure_without_calling_f() {
            let (promise, future) = Promise::<i32>::new_pair(inline());
            let called = Arc::new(AtomicBool::new(false));
            let called_clone = called.clone();
            let mapped = future.map(move |v| {
                called_clone.store(true, Ordering::SeqCst);
                *v
            });

            let failed = Arc::new(AtomicBool::new(false));
            let failed_clone = failed.clone();
            mapped.when_failure(move |_| failed_clone.store(true, Ordering::SeqCst));

            promise.fail(crate::error::Message::from("boom"));

            assert!(!called.load(Ordering::SeqCst));
            assert!(failed.load(Ordering::SeqCst));
        }
    }

    mod flat_map {
        use super::*;

        #[test]
        fn chains_onto_the_returned_future() {
            let spawner = inline();
            let (promise, future) = Promise::<i32>::new_pair(spawner.clone());

            let chained = future.flat_map(move |v| {
                let (inner_promise, inner_future) = Promise::<i32, crate::error::Message>::new_pair(spawner.clone());
                inner_promise.succeed(v + 1);
                inner_future
            });

            let seen = Arc::new(AtomicUsize::new(0));
            let seen_clone = seen.clone();
            chained.when_success(move |v| seen_clone.store(*v as usize, Ordering::SeqCst));

            promise.succeed(1);
            assert_eq!(seen.load(Ordering::SeqCst), 2);
        }
    }

    mod cascade {
        use super::*;

        #[test]
        fn fulfills_the_target_with_the_same_outcome() {
            let spawner = inline();
            let (source_promise, source_future) = Promise::<i32>::new_pair(spawner.clone());
            let (target_promise, target_future) = Promise::<i32>::new_pair(spawner);

            source_future.cascade(target_promise);
            source_promise.succeed(9);

            assert!(matches!(*target_future.wait(), Ok(9)));
        }
    }

    mod and {
        use super::*;

        #[test]
        fn resolves_once_both_inputs_resolve() {
            let spawner = inline();
            let (promise_a, future_a) = Promise::<i32>::new_pair(spawner.clone());
            let (promise_b, future_b) = Promise::<i32>::new_pair(spawner);

            let joined = future_a.and(&future_b);
            promise_a.succeed(1);
            promise_b.succeed(2);

            assert!(matches!(*joined.wait(), Ok((1, 2))));
        }

        #[test]
        fn fails_if_either_input_fails() {
            let spawner = inline();
            let (promise_a, future_a) = Promise::<i32, crate::error::Message>::new_pair(spawner.clone());
            let (promise_b, future_b) = Promise::<i32, crate::error::Message>::new_pair(spawner);

            let joined = future_a.and(&future_b);
            promise_a.fail("boom".into());
            promise_b.succeed(2);

            assert!(joined.wait().is_err());
        }
    }

    mod and_all {
        use super::*;

        #[test]
        fn resolves_to_every_value_in_order() {
            let spawner = inline();
            let mut promises = Vec::new();
            let mut futures = Vec::new();
            for _ in 0..3 {
                let (p, f) = Promise::<i32>::new_pair(spawner.clone());
                promises.push(p);
                futures.push(f);
            }

            let all = Future::and_all(spawner, &futures);
            for (i, promise) in promises.into_iter().enumerate() {
                promise.succeed(i as i32);
            }

            assert!(matches!(all.wait().as_ref(), Ok(v) if v == &vec![0, 1, 2]));
        }

        #[test]
        fn empty_input_resolves_to_empty_vec() {
            let spawner = inline();
            let all = Future::<i32>::and_all(spawner, &[]);
            assert!(matches!(all.wait().as_ref(), Ok(v) if v.is_empty()));
        }
    }

    mod wait {
        use super::*;

        #[test]
        #[should_panic]
        fn panics_in_debug_when_called_on_the_loop_thread() {
            let (promise, future) = Promise::<i32>::new_pair(inline());
            promise.succeed(1);
            let _ = future.wait();
        }
    }

    #[test]
    fn trait_implementations() {
        use impls::impls;

        assert!(impls!(Future<i32>: Send & Sync & Clone));
        assert!(impls!(Promise<i32>: Send & !Clone));
    }
}
