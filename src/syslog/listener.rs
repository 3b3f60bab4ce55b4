//! UDP syslog reception.

use std::io;
use std::net::{IpAddr, SocketAddr};

use tokio::net::UdpSocket;
use tokio_util::sync::CancellationToken;

use super::error::SyslogError;
use super::message::SyslogMessage;
use crate::device::DeviceIndex;
use crate::events::{LogEvent, Module, SharedSink};

/// Largest datagram read in full; longer ones are truncated.
pub const MAX_DATAGRAM: usize = 8192;

/// Receives syslog datagrams and reports each one as an event.
///
/// Messages from a known device address are labelled with the device
/// name. Messages from anywhere else are still reported.
pub struct SyslogListener {
    socket: UdpSocket,
    devices: DeviceIndex,
    sink: SharedSink,
}

impl SyslogListener {
    /// Binds the listening socket.
    ///
    /// # Errors
    ///
    /// Returns [`SyslogError::Bind`] if the address is in use or needs
    /// privileges the process lacks (port 514 usually does).
    pub async fn bind(
        addr: SocketAddr,
        devices: DeviceIndex,
        sink: SharedSink,
    ) -> Result<Self, SyslogError> {
        let socket = UdpSocket::bind(addr)
            .await
            .map_err(|source| SyslogError::Bind { addr, source })?;
        Ok(Self {
            socket,
            devices,
            sink,
        })
    }

    /// Address the socket is bound to.
    ///
    /// # Errors
    ///
    /// Returns the OS error if the address cannot be queried.
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    /// Receives until cancelled.
    ///
    /// # Errors
    ///
    /// Returns [`SyslogError::Read`] if the socket fails. Cancellation is
    /// not an error and returns `Ok(())`.
    pub async fn run(self, cancel: CancellationToken) -> Result<(), SyslogError> {
        tracing::debug!(module = "syslog", addr = ?self.socket.local_addr().ok(), "Syslog listener started");
        let mut buf = vec![0u8; MAX_DATAGRAM];
        loop {
            let (len, peer) = tokio::select! {
                biased;
                () = cancel.cancelled() => return Ok(()),
                received = self.socket.recv_from(&mut buf) => {
                    received.map_err(|source| SyslogError::Read { source })?
                }
            };
            self.report(&SyslogMessage::parse(&buf[..len]), peer.ip());
        }
    }

    fn report(&self, message: &SyslogMessage, peer: IpAddr) {
        let event = if message.is_warning() {
            LogEvent::warn(Module::Syslog, "syslog message")
        } else {
            LogEvent::info(Module::Syslog, "syslog message")
        };
        let mut event = event.with("peer", peer);
        if let Some(name) = self.devices.name_of(&peer) {
            event = event.with("name", name);
        }
        event = event
            .with("facility", message.facility_name())
            .with("severity", message.severity_name());
        if let Some(hostname) = &message.hostname {
            event = event.with("hostname", hostname);
        }
        if let Some(app) = &message.app {
            event = event.with("app", app);
        }
        self.sink.emit(event.with("msg", &message.msg));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::Device;
    use crate::events::Severity;
    use crate::testing::RecordingSink;
    use std::sync::Arc;
    use std::time::Duration;

    type Running = tokio::task::JoinHandle<Result<(), SyslogError>>;

    async fn start(devices: &[Device]) -> (SocketAddr, Arc<RecordingSink>, CancellationToken, Running) {
        let sink = RecordingSink::new();
        let listener = SyslogListener::bind(
            "127.0.0.1:0".parse().unwrap(),
            DeviceIndex::new(devices),
            sink.shared(),
        )
        .await
        .unwrap();
        let addr = listener.local_addr().unwrap();
        let cancel = CancellationToken::new();
        let task = tokio::spawn(listener.run(cancel.clone()));
        (addr, sink, cancel, task)
    }

    async fn send(to: SocketAddr, datagram: &[u8]) {
        let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        socket.send_to(datagram, to).await.unwrap();
    }

    async fn wait_for(sink: &RecordingSink, count: usize) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while sink.events().len() < count {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn known_device_is_named() {
        let device = Device::new("local", "127.0.0.1".parse().unwrap());
        let (addr, sink, cancel, task) = start(&[device]).await;

        send(addr, b"<30>Feb  5 01:02:03 cam01 dhcpd: lease renewed").await;
        wait_for(&sink, 1).await;
        cancel.cancel();

        assert!(task.await.unwrap().is_ok());
        let event = &sink.events()[0];
        assert_eq!(event.message, "syslog message");
        assert_eq!(event.module, Module::Syslog);
        assert_eq!(event.severity, Severity::Info);
        assert_eq!(
            event.keys(),
            vec!["peer", "name", "facility", "severity", "hostname", "app", "msg"]
        );
        assert_eq!(event.field("name"), Some("local"));
        assert_eq!(event.field("facility"), Some("daemon"));
        assert_eq!(event.field("msg"), Some("lease renewed"));
    }

    #[tokio::test]
    async fn unknown_sender_is_still_reported() {
        let (addr, sink, cancel, task) = start(&[]).await;

        send(addr, b"<11>1 - - - - - - link down").await;
        wait_for(&sink, 1).await;
        cancel.cancel();

        assert!(task.await.unwrap().is_ok());
        let event = &sink.events()[0];
        assert_eq!(event.severity, Severity::Warning);
        assert_eq!(event.field("peer"), Some("127.0.0.1"));
        assert_eq!(event.field("name"), None);
        assert_eq!(event.keys(), vec!["peer", "facility", "severity", "msg"]);
    }

    #[tokio::test]
    async fn every_datagram_is_an_event() {
        let (addr, sink, cancel, task) = start(&[]).await;

        for text in ["<14>one", "<14>two", "three"] {
            send(addr, text.as_bytes()).await;
        }
        wait_for(&sink, 3).await;
        cancel.cancel();

        assert!(task.await.unwrap().is_ok());
        let mut texts: Vec<String> = sink
            .events()
            .iter()
            .filter_map(|e| e.field("msg").map(str::to_string))
            .collect();
        texts.sort();
        assert_eq!(texts, vec!["one", "three", "two"]);
    }

    #[tokio::test]
    async fn bind_conflict_is_reported() {
        let taken = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let addr = taken.local_addr().unwrap();

        let sink = RecordingSink::new();

        let result = SyslogListener::bind(addr, DeviceIndex::default(), sink.shared()).await;

        assert!(matches!(result, Err(SyslogError::Bind { addr: failed, .. }) if failed == addr));
    }
}
