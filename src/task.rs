//! [`ScheduledTask`] and [`TimerQueue`]: the loop's internal notion of "a
//! unit of work due at or after some instant", and the min-heap that orders
//! them.
//!
//! Identity, not the deadline, is what makes two tasks distinct — two tasks
//! scheduled for the exact same instant are still two different tasks. See
//! [`TaskId`].

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::time::Instant;

use slab::Slab;

use crate::error::LoopError;

/// Identifies one [`ScheduledTask`] for the lifetime of the [`TimerQueue`] it
/// was pushed onto. Two tasks with identical deadlines still get distinct ids.
///
/// Carries both the slab slot and the push sequence that occupied it.
/// `slab` reuses a freed slot's key on the next insert, so the slot alone
/// can't distinguish a stale id (its task already ran, was cancelled, or the
/// slot now holds an unrelated later task) from a live one; the sequence is
/// the generation check that catches slot reuse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskId {
    slot: usize,
    sequence: u64,
}

/// An immutable (run, fail, deadline) record.
///
/// `run` is invoked at most once, when the task's deadline has passed and
/// the owning loop drains it. `fail` is invoked at most once instead, if the
/// task is cancelled or the loop shuts down before the deadline arrives.
/// Exactly one of the two ever runs.
pub struct ScheduledTask {
    run: Box<dyn FnOnce() + Send>,
    fail: Box<dyn FnOnce(LoopError) + Send>,
    ready_time: Instant,
}

impl ScheduledTask {
    /// Builds a task from its run/fail callables and absolute deadline.
    pub fn new(
        ready_time: Instant,
        run: impl FnOnce() + Send + 'static,
        fail: impl FnOnce(LoopError) + Send + 'static,
    ) -> Self {
        ScheduledTask {
            run: Box::new(run),
            fail: Box::new(fail),
            ready_time,
        }
    }

    /// The absolute monotonic instant at or after which this task becomes runnable.
    pub fn ready_time(&self) -> Instant {
        self.ready_time
    }

    /// Runs the task's `run` callable, consuming it.
    pub fn run(self) {
        (self.run)();
    }

    /// Runs the task's `fail` callable with `error`, consuming it.
    pub fn fail(self, error: LoopError) {
        (self.fail)(error);
    }
}

/// A min-heap of [`ScheduledTask`]s ordered by [`ScheduledTask::ready_time`],
/// with O(1) identity removal and amortized O(log n) push/pop.
///
/// Not thread-safe: the owning [`crate::event_loop::EventLoop`] guards every
/// access with its task mutex (see §5 of the design — the mutex is held only
/// for enqueue/dequeue/remove, never across a task's execution).
///
/// Removal is lazy: [`TimerQueue::remove`] drops the task out of the slab
/// immediately but leaves its entry in the binary heap, to be discarded the
/// next time it would otherwise surface from [`TimerQueue::pop_ready`] or
/// [`TimerQueue::peek_ready_time`]. A `BinaryHeap` has no decrease-key
/// operation, so paying for the removal eagerly would mean rebuilding the
/// heap; lazy deletion keeps every operation in the same O(log n) ballpark
/// at the cost of a few stale entries sitting harmlessly in the heap until
/// they're popped past.
///
/// `slab` reuses a freed slot's key on the next insert, so the raw slot key
/// alone can't tell a stale heap entry apart from a brand new task that
/// landed in the same slot (ABA). Each slab entry also carries the sequence
/// number it was pushed with; a heap entry is stale unless that sequence
/// still matches the slot's current occupant.
#[derive(Default)]
pub struct TimerQueue {
    tasks: Slab<(u64, ScheduledTask)>,
    heap: BinaryHeap<Reverse<(Instant, u64, TaskId)>>,
    next_sequence: u64,
}

impl TimerQueue {
    /// Creates an empty queue.
    pub fn new() -> Self {
        TimerQueue::default()
    }

    /// Inserts `task`, returning the id needed to remove it later.
    pub fn push(&mut self, task: ScheduledTask) -> TaskId {
        let ready_time = task.ready_time();
        let sequence = self.next_sequence;
        self.next_sequence += 1;

        let slot = self.tasks.insert((sequence, task));
        let id = TaskId { slot, sequence };
        self.heap.push(Reverse((ready_time, sequence, id)));
        id
    }

    /// True if `id`'s sequence still matches its slot's current occupant,
    /// i.e. the task hasn't been removed (and the slot reused by a later push).
    fn is_live(&self, id: TaskId) -> bool {
        matches!(self.tasks.get(id.slot), Some((slot_sequence, _)) if *slot_sequence == id.sequence)
    }

    /// The deadline of the earliest task still present, skipping over any
    /// stale (already-removed or slot-reused) heap entries it encounters along the way.
    pub fn peek_ready_time(&mut self) -> Option<Instant> {
        while let Some(Reverse((ready_time, _, id))) = self.heap.peek().copied() {
            if self.is_live(id) {
                return Some(ready_time);
            }
            self.heap.pop();
        }
        None
    }

    /// Removes and returns every task whose deadline is `<= now`, in deadline
    /// order (ties broken by insertion order).
    pub fn pop_ready(&mut self, now: Instant) -> Vec<ScheduledTask> {
        let mut ready = Vec::new();

        while let Some(Reverse((ready_time, _, id))) = self.heap.peek().copied() {
            if ready_time > now {
                break;
            }
            self.heap.pop();

            if self.is_live(id) {
                let (_, task) = self.tasks.remove(id.slot);
                ready.push(task);
            }
            // else: stale entry for an already-removed (cancelled), or slot-reused, task.
        }

        ready
    }

    /// Removes the task identified by `id`, if it's still present, returning it.
    ///
    /// Checks the sequence as well as the slot: an `id` whose slot was freed
    /// and reused by a later push is stale and must not remove that later task.
    /// The heap entry is left in place and cleaned up lazily (see the type's docs).
    pub fn remove(&mut self, id: TaskId) -> Option<ScheduledTask> {
        if !self.is_live(id) {
            return None;
        }
        self.tasks.try_remove(id.slot).map(|(_, task)| task)
    }

    /// True if no live tasks remain (stale heap entries don't count).
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Drains every remaining live task, in arbitrary order.
    ///
    /// Used at loop termination to fail every task still pending with a
    /// shutdown error (§4.4's "on exit, fail all remaining scheduled tasks").
    pub fn drain(&mut self) -> Vec<ScheduledTask> {
        self.heap.clear();
        self.tasks.drain().map(|(_, task)| task).collect()
    }
}
