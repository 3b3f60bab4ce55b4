//! Datagram transport for ICMP echo traffic.
//!
//! [`EchoTransport`] is the seam between the correlation engine and the
//! operating system. [`IcmpSocket`] is the production implementation; tests
//! substitute an in-memory transport.

use super::error::IcmpError;
use crate::device::IpFamily;
use socket2::{Domain, Protocol, Socket, Type};
use std::future::Future;
use std::io;
use std::net::{IpAddr, SocketAddr};
use tokio::net::UdpSocket;

/// A connectionless transport carrying ICMP messages for one family.
pub trait EchoTransport: Send + Sync + 'static {
    /// Address family this transport serves.
    fn family(&self) -> IpFamily;

    /// Sends one ICMP message to `dst`.
    fn send_to(&self, packet: &[u8], dst: IpAddr)
    -> impl Future<Output = io::Result<usize>> + Send;

    /// Receives one ICMP message, returning its length and sender.
    ///
    /// For IPv4 the message may be preceded by its IP header.
    fn recv_from(&self, buf: &mut [u8])
    -> impl Future<Output = io::Result<(usize, IpAddr)>> + Send;
}

/// How an [`IcmpSocket`] was opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SocketKind {
    /// Unprivileged datagram ICMP socket.
    Dgram,
    /// Raw ICMP socket; needs elevated privileges.
    Raw,
}

/// An ICMP socket registered with the tokio reactor.
#[derive(Debug)]
pub struct IcmpSocket {
    socket: UdpSocket,
    family: IpFamily,
    kind: SocketKind,
}

impl IcmpSocket {
    /// Opens an ICMP socket for `family`.
    ///
    /// An unprivileged datagram socket is tried first, then a raw socket.
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`IcmpError::Open`] with the datagram failure when neither
    /// socket type can be created.
    pub fn open(family: IpFamily) -> Result<Self, IcmpError> {
        let (socket, kind) = match create_socket(family, Type::DGRAM) {
            Ok(socket) => (socket, SocketKind::Dgram),
            Err(dgram_error) => match create_socket(family, Type::RAW) {
                Ok(socket) => (socket, SocketKind::Raw),
                Err(raw_error) => {
                    tracing::debug!(module = "ping", %family, %raw_error, "Raw ICMP socket unavailable");
                    return Err(IcmpError::Open {
                        family,
                        source: dgram_error,
                    });
                }
            },
        };

        let socket = UdpSocket::from_std(std::net::UdpSocket::from(socket))
            .map_err(|source| IcmpError::Open { family, source })?;

        Ok(Self {
            socket,
            family,
            kind,
        })
    }

    /// Returns how the socket was opened.
    #[must_use]
    pub const fn kind(&self) -> SocketKind {
        self.kind
    }
}

fn create_socket(family: IpFamily, ty: Type) -> io::Result<Socket> {
    let (domain, protocol) = match family {
        IpFamily::V4 => (Domain::IPV4, Protocol::ICMPV4),
        IpFamily::V6 => (Domain::IPV6, Protocol::ICMPV6),
    };
    let socket = Socket::new(domain, ty, Some(protocol))?;
    socket.set_nonblocking(true)?;
    Ok(socket)
}

impl EchoTransport for IcmpSocket {
    fn family(&self) -> IpFamily {
        self.family
    }

    async fn send_to(&self, packet: &[u8], dst: IpAddr) -> io::Result<usize> {
        self.socket.send_to(packet, SocketAddr::new(dst, 0)).await
    }

    async fn recv_from(&self, buf: &mut [u8]) -> io::Result<(usize, IpAddr)> {
        let (len, from) = self.socket.recv_from(buf).await?;
        Ok((len, from.ip()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn open_reports_kind_or_family_error() {
        match IcmpSocket::open(IpFamily::V4) {
            Ok(socket) => {
                assert_eq!(socket.family(), IpFamily::V4);
                assert!(matches!(socket.kind(), SocketKind::Dgram | SocketKind::Raw));
            }
            Err(error) => {
                assert!(matches!(
                    error,
                    IcmpError::Open {
                        family: IpFamily::V4,
                        ..
                    }
                ));
            }
        }
    }
}
