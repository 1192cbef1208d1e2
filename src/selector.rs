//! The [`Selector`] trait and its `mio`-backed implementation.
//!
//! The run loop never talks to `epoll`/`kqueue`/IOCP directly; it goes
//! through this interface, keeping the run loop separate from the raw
//! readiness mechanism the same way a run loop stays separate from raw
//! io_uring submission/completion queues. The concrete backing here is
//! `mio::Poll`: it wraps the three platform readiness mechanisms behind one
//! portable API and gives us `mio::Waker` for the cross-thread wakeup
//! signal for free.

use std::io;
use std::sync::Arc;
use std::time::Duration;

use mio::{Events, Interest, Poll, Token, Waker};

/// How long the next [`Selector::wait`] call should be willing to block,
/// chosen each tick from the nearest TimerQueue deadline (§4.4 step 1).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// No scheduled work pending: block until an I/O event or wakeup arrives.
    Block,
    /// A task is already due: don't block at all.
    PollNow,
    /// The nearest deadline is `duration` away: block at most that long.
    BlockFor(Duration),
}

impl Strategy {
    fn as_timeout(self) -> Option<Duration> {
        match self {
            Strategy::Block => None,
            Strategy::PollNow => Some(Duration::ZERO),
            Strategy::BlockFor(duration) => Some(duration),
        }
    }
}

/// Which side of a channel became ready.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    Readable,
    Writable,
    Both,
}

impl Readiness {
    fn from_event(event: &mio::event::Event) -> Option<Self> {
        match (event.is_readable(), event.is_writable()) {
            (true, true) => Some(Readiness::Both),
            (true, false) => Some(Readiness::Readable),
            (false, true) => Some(Readiness::Writable),
            (false, false) => None,
        }
    }
}

/// One readiness notification, tagged with the registration token the
/// channel was registered under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadinessEvent {
    pub token: Token,
    pub readiness: Readiness,
}

/// The interest set a channel wants notifications for.
pub type Interests = Interest;

/// A source of I/O readiness events with a tunable blocking strategy and an
/// asynchronous wakeup signal, consumed exclusively by one [`EventLoop`](crate::event_loop::EventLoop).
///
/// Registration methods are documented by the crate's concurrency model
/// (§5) as callable only from the owning loop's worker thread; this trait
/// doesn't enforce that itself; the caller does.
pub trait Selector: Send {
    /// Registers `token`'s source for `interests`.
    fn register(&mut self, source: &mut dyn mio::event::Source, token: Token, interests: Interests) -> io::Result<()>;

    /// Updates the interest set for an already-registered source.
    fn reregister(&mut self, source: &mut dyn mio::event::Source, token: Token, interests: Interests) -> io::Result<()>;

    /// Removes a source from the selector.
    fn deregister(&mut self, source: &mut dyn mio::event::Source) -> io::Result<()>;

    /// Blocks according to `strategy`, then returns every readiness event observed.
    ///
    /// A reserved wakeup token (see [`MioSelector::WAKE_TOKEN`]) is filtered
    /// out of the returned events; it exists purely to interrupt the wait.
    fn wait(&mut self, strategy: Strategy) -> io::Result<Vec<ReadinessEvent>>;

    /// Interrupts a concurrent or future [`Selector::wait`] call. Safe from any thread, idempotent.
    fn wakeup(&self) -> io::Result<()>;

    /// Releases the underlying OS resources. Idempotent is not guaranteed;
    /// called exactly once, when the owning loop reaches *closed*.
    fn close(&mut self) -> io::Result<()>;
}

/// The production [`Selector`], backed by `mio::Poll`.
pub struct MioSelector {
    poll: Poll,
    events: Events,
    waker: Arc<Waker>,
}

impl MioSelector {
    /// Reserved token identifying wakeup events; never handed out to a channel registration.
    pub const WAKE_TOKEN: Token = Token(usize::MAX);

    /// Creates a selector with room for up to `event_capacity` readiness
    /// events per [`Selector::wait`] call (see [`crate::config::Config::event_batch_size`]).
    pub fn new(event_capacity: usize) -> io::Result<Self> {
        let poll = Poll::new()?;
        let waker = Arc::new(Waker::new(poll.registry(), Self::WAKE_TOKEN)?);
        Ok(MioSelector {
            poll,
            events: Events::with_capacity(event_capacity),
            waker,
        })
    }

    /// A cheaply-cloned handle that can wake this selector from any thread,
    /// independent of the `&mut self` methods that only the owning loop
    /// thread is allowed to call.
    pub fn waker_handle(&self) -> Arc<Waker> {
        self.waker.clone()
    }
}

impl Selector for MioSelector {
    fn register(&mut self, source: &mut dyn mio::event::Source, token: Token, interests: Interests) -> io::Result<()> {
        self.poll.registry().register(source, token, interests)
    }

    fn reregister(&mut self, source: &mut dyn mio::event::Source, token: Token, interests: Interests) -> io::Result<()> {
        self.poll.registry().reregister(source, token, interests)
    }

    fn deregister(&mut self, source: &mut dyn mio::event::Source) -> io::Result<()> {
        self.poll.registry().deregister(source)
    }

    fn wait(&mut self, strategy: Strategy) -> io::Result<Vec<ReadinessEvent>> {
        match self.poll.poll(&mut self.events, strategy.as_timeout()) {
            Ok(()) => {}
            // A blocking poll interrupted by a signal isn't an error condition here;
            // the next tick will recompute the strategy and wait again.
            Err(error) if error.kind() == io::ErrorKind::Interrupted => {
                tracing::warn!("selector wait interrupted by a signal; retrying next tick");
                return Ok(Vec::new());
            }
            Err(error) => return Err(error),
        }

        let mut ready = Vec::with_capacity(self.events.iter().count());
        for event in self.events.iter() {
            if event.token() == Self::WAKE_TOKEN {
                tracing::warn!("spurious selector wakeup observed");
                continue;
            }
            if let Some(readiness) = Readiness::from_event(event) {
                ready.push(ReadinessEvent { token: event.token(), readiness });
            }
        }
        Ok(ready)
    }

    fn wakeup(&self) -> io::Result<()> {
        self.waker.wake()
    }

    fn close(&mut self) -> io::Result<()> {
        // mio::Poll has no explicit close; dropping it releases the epoll/kqueue fd.
        // Nothing to flush first: channels are expected to have been deregistered
        // by the loop's drain-on-closeGently step before this is reached.
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mio::net::{TcpListener, TcpStream};
    use std::net::SocketAddr;

    fn local_listener() -> (TcpListener, SocketAddr) {
        let listener = TcpListener::bind("127.0.0.1:0".parse().unwrap()).unwrap();
        let addr = listener.local_addr().unwrap();
        (listener, addr)
    }

    #[test]
    fn poll_now_returns_immediately_with_no_events() {
        let mut selector = MioSelector::new(16).unwrap();
        let events = selector.wait(Strategy::PollNow).unwrap();
        assert!(events.is_empty());
    }

    #[test]
    fn reports_readable_on_a_connected_socket() {
        let mut selector = MioSelector::new(16).unwrap();
        let (mut listener, addr) = local_listener();
        selector.register(&mut listener, Token(1), Interest::READABLE).unwrap();

        let mut client = TcpStream::connect(addr).unwrap();
        selector.register(&mut client, Token(2), Interest::WRITABLE).unwrap();

        let events = selector.wait(Strategy::BlockFor(Duration::from_secs(5))).unwrap();
        assert!(events.iter().any(|e| e.token == Token(1) && e.readiness == Readiness::Readable));
    }

    #[test]
    fn wakeup_interrupts_a_blocking_wait() {
        let mut selector = MioSelector::new(16).unwrap();
        let waker = selector.waker_handle();

        let handle = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(20));
            waker.wake().unwrap();
        });

        let events = selector.wait(Strategy::Block).unwrap();
        handle.join().unwrap();
        assert!(events.is_empty());
    }
}
