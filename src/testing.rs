//! Shared test fixtures.

use crate::device::IpFamily;
use crate::events::{EventSink, LogEvent, SharedSink};
use crate::icmp::EchoTransport;
use crate::icmp::packet::reply_for;
use parking_lot::Mutex;
use std::io;
use std::net::IpAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::mpsc;

/// Sink that keeps every event for later inspection.
#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<LogEvent>>,
}

impl RecordingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn shared(self: &Arc<Self>) -> SharedSink {
        Arc::clone(self) as SharedSink
    }

    pub fn events(&self) -> Vec<LogEvent> {
        self.events.lock().clone()
    }

    pub fn messages(&self) -> Vec<&'static str> {
        self.events.lock().iter().map(|e| e.message).collect()
    }

    pub fn count(&self, message: &str) -> usize {
        self.events
            .lock()
            .iter()
            .filter(|e| e.message == message)
            .count()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: LogEvent) {
        self.events.lock().push(event);
    }
}

/// In-memory ICMP transport.
///
/// Sent packets are recorded. When echoing, every request is answered with
/// the matching reply; anything else arrives only through `inject`.
pub struct FakeTransport {
    family: IpFamily,
    echo: AtomicBool,
    fail_sends: AtomicBool,
    sent: Mutex<Vec<(Vec<u8>, IpAddr)>>,
    inbound_tx: mpsc::UnboundedSender<io::Result<(Vec<u8>, IpAddr)>>,
    inbound_rx: tokio::sync::Mutex<mpsc::UnboundedReceiver<io::Result<(Vec<u8>, IpAddr)>>>,
}

impl FakeTransport {
    pub fn echoing(family: IpFamily) -> Self {
        let transport = Self::silent(family);
        transport.set_echo(true);
        transport
    }

    pub fn silent(family: IpFamily) -> Self {
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
        Self {
            family,
            echo: AtomicBool::new(false),
            fail_sends: AtomicBool::new(false),
            sent: Mutex::new(Vec::new()),
            inbound_tx,
            inbound_rx: tokio::sync::Mutex::new(inbound_rx),
        }
    }

    pub fn set_echo(&self, echo: bool) {
        self.echo.store(echo, Ordering::SeqCst);
    }

    pub fn fail_sends(&self, fail: bool) {
        self.fail_sends.store(fail, Ordering::SeqCst);
    }

    pub fn inject(&self, packet: Vec<u8>, peer: IpAddr) {
        let _ = self.inbound_tx.send(Ok((packet, peer)));
    }

    pub fn inject_error(&self, kind: io::ErrorKind) {
        let _ = self.inbound_tx.send(Err(io::Error::new(kind, "injected failure")));
    }

    pub fn sent(&self) -> Vec<(Vec<u8>, IpAddr)> {
        self.sent.lock().clone()
    }
}

impl EchoTransport for FakeTransport {
    fn family(&self) -> IpFamily {
        self.family
    }

    async fn send_to(&self, packet: &[u8], dst: IpAddr) -> io::Result<usize> {
        if self.fail_sends.load(Ordering::SeqCst) {
            return Err(io::Error::new(io::ErrorKind::HostUnreachable, "no route to host"));
        }
        self.sent.lock().push((packet.to_vec(), dst));
        if self.echo.load(Ordering::SeqCst) {
            self.inject(reply_for(packet, self.family), dst);
        }
        Ok(packet.len())
    }

    async fn recv_from(&self, buf: &mut [u8]) -> io::Result<(usize, IpAddr)> {
        let mut inbound = self.inbound_rx.lock().await;
        match inbound.recv().await {
            Some(Ok((packet, peer))) => {
                let len = packet.len().min(buf.len());
                buf[..len].copy_from_slice(&packet[..len]);
                Ok((len, peer))
            }
            Some(Err(error)) => Err(error),
            None => std::future::pending().await,
        }
    }
}
