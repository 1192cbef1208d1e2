//! [`TimeAmount`]: a duration expressed as a signed count of nanoseconds.
//!
//! Distinct from [`std::time::Duration`] so that the rest of the crate has a
//! `Copy`, totally-ordered, signed value to do deadline arithmetic with
//! without repeatedly round-tripping through `Duration`'s unsigned seconds
//! + subsec-nanos representation.

use std::time::Duration;

/// A duration expressed in nanoseconds.
///
/// Construct one with [`TimeAmount::ns`], [`TimeAmount::us`],
/// [`TimeAmount::ms`], [`TimeAmount::s`], [`TimeAmount::min`], or
/// [`TimeAmount::h`].
///
/// Arithmetic overflow (e.g. `TimeAmount::h(i64::MAX)`) is a programming
/// error and panics, the same way integer overflow in debug builds does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeAmount {
    nanos: i64,
}

impl TimeAmount {
    /// Zero duration.
    pub const ZERO: TimeAmount = TimeAmount { nanos: 0 };

    /// A duration of `amount` nanoseconds.
    pub const fn ns(amount: i64) -> Self {
        TimeAmount { nanos: amount }
    }

    /// A duration of `amount` microseconds.
    pub const fn us(amount: i64) -> Self {
        TimeAmount::ns(amount * 1_000)
    }

    /// A duration of `amount` milliseconds.
    pub const fn ms(amount: i64) -> Self {
        TimeAmount::ns(amount * 1_000_000)
    }

    /// A duration of `amount` seconds.
    pub const fn s(amount: i64) -> Self {
        TimeAmount::ns(amount * 1_000_000_000)
    }

    /// A duration of `amount` minutes.
    pub const fn min(amount: i64) -> Self {
        TimeAmount::s(amount * 60)
    }

    /// A duration of `amount` hours.
    pub const fn h(amount: i64) -> Self {
        TimeAmount::min(amount * 60)
    }

    /// The duration as a raw nanosecond count.
    pub const fn nanoseconds(self) -> i64 {
        self.nanos
    }

    /// Converts to [`std::time::Duration`], clamping negative amounts to zero.
    ///
    /// Deadlines derived from a `TimeAmount` are always non-negative by
    /// construction (see [`crate::event_loop::EventLoop::schedule_task`]), so
    /// the clamp only matters for a caller doing their own arithmetic.
    pub fn to_duration(self) -> Duration {
        if self.nanos <= 0 {
            Duration::ZERO
        } else {
            Duration::from_nanos(self.nanos as u64)
        }
    }
}

impl From<Duration> for TimeAmount {
    fn from(duration: Duration) -> Self {
        TimeAmount::ns(duration.as_nanos() as i64)
    }
}
