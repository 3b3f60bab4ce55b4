//! ICMP echo message encoding and decoding.
//!
//! Echo requests carry the probe identifier and sequence twice: in the ICMP
//! header and at the start of the payload, followed by a fixed marker.
//!
//! ```text
//! bytes 0-1   identifier (big endian)
//! bytes 2-3   sequence (big endian)
//! bytes 4-    HELLO-R-U-THERE
//! ```
//!
//! Unprivileged datagram ICMP sockets may overwrite the header identifier
//! with a kernel-chosen value; the payload copy survives the round trip, so
//! replies carrying the marker are correlated by their payload.

use crate::device::IpFamily;
use pnet_packet::Packet;
use pnet_packet::icmp::echo_reply::EchoReplyPacket;
use pnet_packet::icmp::echo_request::MutableEchoRequestPacket;
use pnet_packet::icmp::{IcmpCode, IcmpPacket, IcmpType, IcmpTypes, checksum};
use std::net::IpAddr;

/// ICMP header size (fixed).
pub const ICMP_HEADER_SIZE: usize = 8;

/// Fixed payload marker identifying our probes.
pub const PAYLOAD_MARKER: &[u8] = b"HELLO-R-U-THERE";

/// Identifier and sequence prefix of the payload.
const PAYLOAD_PREFIX: usize = 4;

const IPV4_MIN_HEADER: usize = 20;
const ICMPV6_ECHO_REQUEST: u8 = 128;
const ICMPV6_ECHO_REPLY: u8 = 129;

/// A decoded echo reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EchoReply {
    /// Probe identifier the reply answers.
    pub id: u16,
    /// Sequence number the reply answers.
    pub seq: u16,
    /// Address the reply came from.
    pub peer: IpAddr,
}

/// Returns the echo request type for a family.
#[must_use]
pub fn request_type(family: IpFamily) -> IcmpType {
    match family {
        IpFamily::V4 => IcmpTypes::EchoRequest,
        IpFamily::V6 => IcmpType::new(ICMPV6_ECHO_REQUEST),
    }
}

/// Returns the echo reply type for a family.
#[must_use]
pub fn reply_type(family: IpFamily) -> IcmpType {
    match family {
        IpFamily::V4 => IcmpTypes::EchoReply,
        IpFamily::V6 => IcmpType::new(ICMPV6_ECHO_REPLY),
    }
}

/// Builds an echo request for the given family.
///
/// The ICMPv4 checksum is computed here; the ICMPv6 checksum covers a
/// pseudo-header only the kernel knows and is left to it.
#[must_use]
pub fn build_echo_request(id: u16, seq: u16, family: IpFamily) -> Vec<u8> {
    let mut payload = Vec::with_capacity(PAYLOAD_PREFIX + PAYLOAD_MARKER.len());
    payload.extend_from_slice(&id.to_be_bytes());
    payload.extend_from_slice(&seq.to_be_bytes());
    payload.extend_from_slice(PAYLOAD_MARKER);

    let mut buffer = vec![0u8; ICMP_HEADER_SIZE + payload.len()];
    if let Some(mut packet) = MutableEchoRequestPacket::new(&mut buffer) {
        packet.set_icmp_type(request_type(family));
        packet.set_icmp_code(IcmpCode::new(0));
        packet.set_identifier(id);
        packet.set_sequence_number(seq);
        packet.set_payload(&payload);
    }

    if family == IpFamily::V4 {
        if let Some(icmp) = IcmpPacket::new(&buffer) {
            let sum = checksum(&icmp);
            buffer[2..4].copy_from_slice(&sum.to_be_bytes());
        }
    }

    buffer
}

/// Strips a leading IPv4 header, if present.
///
/// Raw IPv4 sockets (and datagram ICMP sockets on some BSDs) deliver the IP
/// header in front of the ICMP message. No ICMP type used here has a first
/// byte whose high nibble is 4, so the version nibble identifies the header.
#[must_use]
pub fn strip_ipv4_header(data: &[u8], family: IpFamily) -> &[u8] {
    if family != IpFamily::V4 || data.len() < IPV4_MIN_HEADER || data[0] >> 4 != 4 {
        return data;
    }
    let header_len = usize::from(data[0] & 0x0f) * 4;
    if header_len < IPV4_MIN_HEADER || header_len > data.len() {
        return data;
    }
    &data[header_len..]
}

/// Decodes an echo reply.
///
/// Returns `None` for any other ICMP message or a truncated one.
#[must_use]
pub fn parse_echo_reply(data: &[u8], peer: IpAddr, family: IpFamily) -> Option<EchoReply> {
    let packet = EchoReplyPacket::new(strip_ipv4_header(data, family))?;
    if packet.get_icmp_type() != reply_type(family) || packet.get_icmp_code() != IcmpCode::new(0) {
        return None;
    }

    let (id, seq) = embedded_ids(packet.payload())
        .unwrap_or_else(|| (packet.get_identifier(), packet.get_sequence_number()));

    Some(EchoReply { id, seq, peer })
}

fn embedded_ids(payload: &[u8]) -> Option<(u16, u16)> {
    let marker = payload.get(PAYLOAD_PREFIX..PAYLOAD_PREFIX + PAYLOAD_MARKER.len())?;
    if marker != PAYLOAD_MARKER {
        return None;
    }
    let id = u16::from_be_bytes([payload[0], payload[1]]);
    let seq = u16::from_be_bytes([payload[2], payload[3]]);
    Some((id, seq))
}

/// Turns one of our echo requests into the reply a peer would send.
#[cfg(test)]
pub fn reply_for(request: &[u8], family: IpFamily) -> Vec<u8> {
    let mut reply = request.to_vec();
    reply[0] = reply_type(family).0;
    reply
}
