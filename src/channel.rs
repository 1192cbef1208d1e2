//! The [`Channel`] interface: what a socket-like object must expose so an
//! [`EventLoop`](crate::event_loop::EventLoop) can drive it.
//!
//! A channel's internal state (buffers, the pipeline of handlers wrapping
//! its actual socket) is an external collaborator out of scope for this
//! crate — the loop only ever needs openness, a selectable handle, an
//! interest mask, and the two edge handlers below. This mirrors the way a
//! raw io_uring submission/completion layer stays separate from the run
//! loop that drives it: the loop dispatches, the channel decides what
//! dispatch means for its own state.

use mio::Token;

use crate::selector::Interests;

/// What kind of channel this is. Consulted by
/// [`EventLoop`](crate::event_loop::EventLoop)'s dispatch step to decide how
/// to interpret a readiness event: a listening channel only ever accepts, so
/// it's always treated as readable regardless of the reported readiness;
/// a connected channel's writable/readable ordering applies as usual.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelKind {
    /// Accepts new connections; typically registered for `READABLE` only.
    Listening,
    /// An established connection; may be registered for `READABLE`, `WRITABLE`, or both.
    Connected,
}

/// A socket-like object an [`EventLoop`](crate::event_loop::EventLoop) can drive.
///
/// All methods are called from the channel's bound loop thread only (§3's
/// "Selector interest changes for a channel occur only from that channel's
/// bound loop thread" invariant extends to dispatch as well).
pub trait Channel: Send {
    /// False once the channel has been closed; the loop deregisters and
    /// stops dispatching to it the first time this returns false.
    fn is_open(&self) -> bool;

    /// The registration token this channel was registered under.
    fn token(&self) -> Token;

    /// The channel's current interest set, used when (re)registering.
    fn interests(&self) -> Interests;

    /// What kind of channel this is, for dispatch-order decisions.
    fn kind(&self) -> ChannelKind;

    /// The mio event source to register/reregister/deregister with the selector.
    fn source(&mut self) -> &mut dyn mio::event::Source;

    /// Invoked when the selector reports this channel as read-ready.
    fn handle_readable(&mut self);

    /// Invoked when the selector reports this channel as write-ready.
    fn handle_writable(&mut self);
}
