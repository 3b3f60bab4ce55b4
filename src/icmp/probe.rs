//! Periodic echo probing of one device.

use super::demux::{Demultiplexer, Registration};
use super::error::IcmpError;
use super::packet::EchoReply;
use super::transport::EchoTransport;
use crate::device::IcmpDevice;
use crate::events::{LogEvent, Module, SharedSink};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{Instant, sleep};
use tokio_util::sync::CancellationToken;

/// Result of a single probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// A matching reply arrived.
    Reply {
        /// The reply.
        reply: EchoReply,
        /// Time from send to receipt.
        took: Duration,
    },
    /// No matching reply arrived within the timeout.
    Timeout {
        /// Time spent waiting.
        took: Duration,
    },
    /// The request could not be sent.
    SendFailed,
    /// Cancellation was observed while waiting.
    Cancelled,
}

/// Probes one device at a fixed interval over a shared socket.
pub struct ProbeLoop<T: EchoTransport> {
    target: IcmpDevice,
    demux: Arc<Demultiplexer<T>>,
    sink: SharedSink,
}

impl<T: EchoTransport> ProbeLoop<T> {
    /// Creates a probe loop for `target`.
    pub const fn new(target: IcmpDevice, demux: Arc<Demultiplexer<T>>, sink: SharedSink) -> Self {
        Self {
            target,
            demux,
            sink,
        }
    }

    /// The device being probed.
    #[must_use]
    pub const fn target(&self) -> &IcmpDevice {
        &self.target
    }

    /// Probes until cancelled.
    ///
    /// Sequence numbers start at 0 and wrap after 65535. The same
    /// identifier is used for the lifetime of the loop.
    ///
    /// # Errors
    ///
    /// Returns an error if no identifier can be registered or the reply
    /// slot closes. Timeouts and send failures are reported as events.
    pub async fn run(self, cancel: CancellationToken) -> Result<(), IcmpError> {
        if cancel.is_cancelled() {
            return Ok(());
        }
        let mut registration = self.demux.register()?;
        tracing::debug!(
            module = "ping",
            name = %self.target.device.name,
            id = registration.id(),
            "Starting probe loop"
        );

        let mut seq: u16 = 0;
        loop {
            if self.probe(&mut registration, seq, &cancel).await? == ProbeOutcome::Cancelled {
                return Ok(());
            }

            tokio::select! {
                biased;
                () = cancel.cancelled() => return Ok(()),
                () = sleep(self.target.interval) => {}
            }
            seq = seq.wrapping_add(1);
        }
    }

    /// Sends one echo request and waits for its reply.
    ///
    /// Replies carrying another sequence number are left over from earlier
    /// probes and are discarded.
    ///
    /// # Errors
    ///
    /// Returns [`IcmpError::ChannelClosed`] if the reply slot closes.
    pub async fn probe(
        &self,
        registration: &mut Registration<T>,
        seq: u16,
        cancel: &CancellationToken,
    ) -> Result<ProbeOutcome, IcmpError> {
        let name = self.target.device.name.as_str();
        let dst = self.target.device.ip;
        let id = registration.id();

        if let Some(stale) = registration.discard_pending() {
            tracing::debug!(module = "ping", name, id, seq = stale.seq, "Discarding stale reply");
        }

        let start = Instant::now();
        if let Err(error) = registration.send(seq, dst).await {
            self.sink.emit(
                LogEvent::warn(Module::Ping, "failed")
                    .with("name", name)
                    .with("dst", dst)
                    .with("error", error),
            );
            return Ok(ProbeOutcome::SendFailed);
        }

        let deadline = sleep(self.target.timeout);
        tokio::pin!(deadline);

        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => return Ok(ProbeOutcome::Cancelled),
                reply = registration.recv() => match reply {
                    Some(reply) if reply.seq == seq => {
                        let took = start.elapsed();
                        self.sink.emit(
                            LogEvent::info(Module::Ping, "ok")
                                .with("name", name)
                                .with("peer", reply.peer)
                                .with("id", reply.id)
                                .with("seq", reply.seq)
                                .with("took", format_args!("{took:?}")),
                        );
                        return Ok(ProbeOutcome::Reply { reply, took });
                    }
                    Some(stale) => {
                        tracing::debug!(module = "ping", name, id, seq = stale.seq, expected = seq, "Discarding stale reply");
                    }
                    None => {
                        return Err(IcmpError::ChannelClosed {
                            family: self.demux.family(),
                        });
                    }
                },
                () = &mut deadline => {
                    let took = start.elapsed();
                    self.sink.emit(
                        LogEvent::warn(Module::Ping, "timeout")
                            .with("name", name)
                            .with("dst", dst)
                            .with("id", id)
                            .with("seq", seq)
                            .with("timeout", format_args!("{:?}", self.target.timeout))
                            .with("took", format_args!("{took:?}")),
                    );
                    return Ok(ProbeOutcome::Timeout { took });
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "probe_tests.rs"]
mod tests;
