//! Reply demultiplexing for a shared ICMP socket.
//!
//! All probes of one address family share a single socket. Each probe
//! registers a waiter and receives a unique identifier; one read loop per
//! socket decodes echo replies and hands them to the waiter whose
//! identifier they carry.

use super::error::IcmpError;
use super::packet::{EchoReply, build_echo_request, parse_echo_reply};
use super::transport::EchoTransport;
use crate::device::IpFamily;
use crate::events::{LogEvent, Module, SharedSink};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::io;
use std::net::IpAddr;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio_util::sync::CancellationToken;

/// Receive buffer size; large enough for any echo reply we send.
const RECV_BUFFER_SIZE: usize = 1500;

/// What happened to a dispatched reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// Handed to the registered waiter.
    Delivered,
    /// The waiter already holds an undelivered reply; this one was dropped.
    Dropped,
    /// No waiter is registered under the reply's identifier.
    Unexpected,
}

#[derive(Debug, Default)]
struct Waiters {
    last_id: u16,
    slots: HashMap<u16, mpsc::Sender<EchoReply>>,
}

/// Routes replies from one shared transport to registered probes.
pub struct Demultiplexer<T> {
    transport: T,
    family: IpFamily,
    waiters: Mutex<Waiters>,
    sink: SharedSink,
}

impl<T: EchoTransport> Demultiplexer<T> {
    /// Creates a demultiplexer owning `transport`.
    pub fn new(transport: T, sink: SharedSink) -> Arc<Self> {
        Arc::new(Self {
            family: transport.family(),
            transport,
            waiters: Mutex::new(Waiters::default()),
            sink,
        })
    }

    /// Address family of the underlying transport.
    #[must_use]
    pub const fn family(&self) -> IpFamily {
        self.family
    }

    #[cfg(test)]
    pub(crate) const fn transport(&self) -> &T {
        &self.transport
    }

    #[cfg(test)]
    pub(crate) fn waiting(&self) -> usize {
        self.waiters.lock().slots.len()
    }

    /// Registers a new waiter.
    ///
    /// Identifiers start at 1 and are never reused within the lifetime of
    /// the demultiplexer.
    ///
    /// # Errors
    ///
    /// Returns [`IcmpError::IdsExhausted`] once identifier 65535 is taken.
    pub fn register(self: &Arc<Self>) -> Result<Registration<T>, IcmpError> {
        let mut waiters = self.waiters.lock();
        let id = waiters
            .last_id
            .checked_add(1)
            .ok_or(IcmpError::IdsExhausted {
                family: self.family,
            })?;
        waiters.last_id = id;

        let (tx, rx) = mpsc::channel(1);
        waiters.slots.insert(id, tx);
        drop(waiters);

        Ok(Registration {
            id,
            replies: rx,
            demux: Arc::clone(self),
        })
    }

    fn deregister(&self, id: u16) {
        self.waiters.lock().slots.remove(&id);
    }

    /// Hands a decoded reply to the waiter registered under its identifier.
    ///
    /// Never blocks: a waiter with a reply still pending drops the new one.
    pub fn dispatch(&self, reply: EchoReply) -> Dispatch {
        let outcome = {
            let waiters = self.waiters.lock();
            match waiters.slots.get(&reply.id) {
                None => Dispatch::Unexpected,
                Some(slot) => match slot.try_send(reply) {
                    Ok(()) => Dispatch::Delivered,
                    Err(TrySendError::Full(_) | TrySendError::Closed(_)) => Dispatch::Dropped,
                },
            }
        };

        match outcome {
            Dispatch::Unexpected => self.sink.emit(
                LogEvent::warn(Module::Ping, "unexpected echo reply")
                    .with("peer", reply.peer)
                    .with("id", reply.id)
                    .with("seq", reply.seq),
            ),
            Dispatch::Dropped => {
                tracing::debug!(module = "ping", id = reply.id, seq = reply.seq, "Reply slot occupied, dropping reply");
            }
            Dispatch::Delivered => {}
        }
        outcome
    }

    /// Reads from the transport until cancelled, dispatching echo replies.
    ///
    /// Messages that are not echo replies are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`IcmpError::Read`] when the transport fails; the socket is
    /// considered lost.
    pub async fn run(self: Arc<Self>, cancel: CancellationToken) -> Result<(), IcmpError> {
        let mut buf = vec![0u8; RECV_BUFFER_SIZE];
        loop {
            let received = tokio::select! {
                biased;
                () = cancel.cancelled() => return Ok(()),
                received = self.transport.recv_from(&mut buf) => received,
            };
            let (len, peer) = received.map_err(|source| IcmpError::Read {
                family: self.family,
                source,
            })?;

            match parse_echo_reply(&buf[..len], peer, self.family) {
                Some(reply) => {
                    self.dispatch(reply);
                }
                None => tracing::trace!(module = "ping", %peer, len, "Ignoring non echo reply"),
            }
        }
    }
}

/// A registered probe identifier and its reply slot.
///
/// Dropping the registration removes the waiter; replies arriving for its
/// identifier afterwards are reported as unexpected.
pub struct Registration<T: EchoTransport> {
    id: u16,
    replies: mpsc::Receiver<EchoReply>,
    demux: Arc<Demultiplexer<T>>,
}

impl<T: EchoTransport> Registration<T> {
    /// Identifier assigned to this waiter.
    #[must_use]
    pub const fn id(&self) -> u16 {
        self.id
    }

    /// Sends an echo request carrying this waiter's identifier.
    ///
    /// # Errors
    ///
    /// Returns the transport's error when the send fails.
    pub async fn send(&self, seq: u16, dst: IpAddr) -> io::Result<()> {
        let packet = build_echo_request(self.id, seq, self.demux.family);
        self.demux.transport.send_to(&packet, dst).await?;
        Ok(())
    }

    /// Discards a reply left over from an earlier probe.
    pub fn discard_pending(&mut self) -> Option<EchoReply> {
        self.replies.try_recv().ok()
    }

    /// Waits for the next reply.
    ///
    /// Returns `None` if the slot has been closed.
    pub async fn recv(&mut self) -> Option<EchoReply> {
        self.replies.recv().await
    }
}

impl<T: EchoTransport> Drop for Registration<T> {
    fn drop(&mut self) {
        self.demux.deregister(self.id);
    }
}

#[cfg(test)]
#[path = "demux_tests.rs"]
mod tests;
