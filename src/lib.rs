//! The event-loop core of a non-blocking network I/O runtime.
//!
//! This crate provides the reactor primitives a higher-level networking
//! library builds its channels and protocol codecs on top of: a
//! selector-driven [`EventLoop`](event_loop::EventLoop) and
//! [`EventLoopGroup`](group::EventLoopGroup), a lazily-deleted
//! [`TimerQueue`](task::TimerQueue) for delayed and scheduled work, and a
//! callback-style [`Future`](future::Future)/[`Promise`](future::Promise)
//! pair every asynchronous operation resolves through.
//!
//! Socket handling, protocol codecs, and connection pooling are out of
//! scope here; see [`channel::Channel`] for the interface a higher layer
//! implements to be driven by a loop.
//!
//! # Logging
//!
//! This crate emits structured diagnostics through [`tracing`] but never
//! installs a subscriber itself — wire one up with `tracing-subscriber` (or
//! any other `Subscriber` implementation) in the binary that uses it.

pub mod channel;
pub mod config;
pub mod error;
pub mod event_loop;
pub mod future;
pub mod group;
pub mod selector;
pub mod task;
pub mod time;

pub use channel::{Channel, ChannelKind};
pub use config::{Config, GroupConfig};
pub use error::{LoopError, Message, TaskError};
pub use event_loop::{EventLoop, Scheduled};
pub use future::{Failure, Future, Outcome, Promise, Spawner};
pub use group::EventLoopGroup;
pub use selector::{Interests, MioSelector, Readiness, ReadinessEvent, Selector, Strategy};
pub use task::{ScheduledTask, TaskId, TimerQueue};
pub use time::TimeAmount;
