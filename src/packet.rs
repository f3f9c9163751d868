//! DHCP packet parsing and encoding per RFC 2131.
//!
//! A DHCP packet consists of a fixed 236-byte header followed by a 4-byte
//! magic cookie and variable-length options. This module handles parsing
//! incoming requests and constructing replies.
//!
//! # Packet Structure
//!
//! ```text
//! 0                   1                   2                   3
//! 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |     op (1)    |   htype (1)   |   hlen (1)    |   hops (1)    |
//! +---------------+---------------+---------------+---------------+
//! |                            xid (4)                            |
//! +-------------------------------+-------------------------------+
//! |           secs (2)            |           flags (2)           |
//! +-------------------------------+-------------------------------+
//! |                          ciaddr (4)                           |
//! +---------------------------------------------------------------+
//! |                          yiaddr (4)                           |
//! +---------------------------------------------------------------+
//! |                          siaddr (4)                           |
//! +---------------------------------------------------------------+
//! |                          giaddr (4)                           |
//! +---------------------------------------------------------------+
//! |                          chaddr (16)                          |
//! +---------------------------------------------------------------+
//! |                          sname (64)                           |
//! +---------------------------------------------------------------+
//! |                          file (128)                           |
//! +---------------------------------------------------------------+
//! |                    magic cookie (4) = 99.130.83.99            |
//! +---------------------------------------------------------------+
//! |                     options (variable, max 312)               |
//! +---------------------------------------------------------------+
//! ```
//!
//! # References
//!
//! - RFC 2131: Dynamic Host Configuration Protocol

use std::net::Ipv4Addr;

use crate::error::{Error, Result};
use crate::mac::MacAddr;
use crate::options::{
    DHCP_MAGIC_COOKIE, DhcpOption, MessageType, OptionCode, decode_message_type, parse_options,
};

const DHCP_CHADDR_OFFSET: usize = 28;
const DHCP_CHADDR_SIZE: usize = 16;
const DHCP_SNAME_OFFSET: usize = DHCP_CHADDR_OFFSET + DHCP_CHADDR_SIZE;
const DHCP_SNAME_SIZE: usize = 64;
const DHCP_FILE_OFFSET: usize = DHCP_SNAME_OFFSET + DHCP_SNAME_SIZE;
const DHCP_FILE_SIZE: usize = 128;

/// Size of the fixed BOOTP header, up to but excluding the magic cookie.
pub const DHCP_HEADER_SIZE: usize = DHCP_FILE_OFFSET + DHCP_FILE_SIZE;

/// Largest options area (cookie included) accepted from a client.
pub const DHCP_MAX_OPTIONS_SIZE: usize = 312;

/// Minimum reply size on the wire.
///
/// Many DHCP clients and BOOTP relays drop replies shorter than 300 bytes.
pub const DHCP_MIN_PACKET_SIZE: usize = 300;

/// Initial capacity for the encode buffer (RFC 791 minimum datagram size).
const DHCP_ENCODE_CAPACITY: usize = 576;

/// Broadcast bit of the `flags` field.
pub const BROADCAST_FLAG: u16 = 0x8000;

/// BOOTP/DHCP operation code for client requests.
pub const BOOTREQUEST: u8 = 1;

/// BOOTP/DHCP operation code for server replies.
pub const BOOTREPLY: u8 = 2;

/// Hardware type for Ethernet.
pub const HTYPE_ETHERNET: u8 = 1;

/// Hardware address length for Ethernet (6 bytes).
pub const HLEN_ETHERNET: u8 = 6;

/// Network parameters advertised in every reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplyParams {
    /// Server identifier, `siaddr`, and router.
    pub server_ip: Ipv4Addr,
    pub subnet_mask: Ipv4Addr,
    pub dns_server: Ipv4Addr,
    /// Advertised lease time. The server never expires leases itself.
    pub lease_seconds: u32,
}

impl ReplyParams {
    /// T1, half the lease time (RFC 2131 §4.4.5).
    pub fn renewal_seconds(&self) -> u32 {
        self.lease_seconds / 2
    }

    /// T2, seven eighths of the lease time (RFC 2131 §4.4.5).
    pub fn rebinding_seconds(&self) -> u32 {
        ((self.lease_seconds as u64 * 7) / 8) as u32
    }
}

impl Default for ReplyParams {
    fn default() -> Self {
        Self {
            server_ip: Ipv4Addr::new(192, 168, 4, 1),
            subnet_mask: Ipv4Addr::new(255, 255, 255, 0),
            dns_server: Ipv4Addr::new(8, 8, 8, 8),
            lease_seconds: 3600,
        }
    }
}

/// A DHCP packet.
///
/// This struct represents both client requests and server replies.
/// Use [`parse`](Self::parse) to parse incoming packets and
/// [`create_reply`](Self::create_reply) to construct responses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DhcpPacket {
    /// Operation code: [`BOOTREQUEST`] (1) or [`BOOTREPLY`] (2).
    pub op: u8,

    /// Hardware address type. [`HTYPE_ETHERNET`] (1) for Ethernet.
    pub htype: u8,

    /// Hardware address length. [`HLEN_ETHERNET`] (6) for Ethernet.
    pub hlen: u8,

    /// Hop count, incremented by relay agents.
    pub hops: u8,

    /// Transaction ID chosen by client, echoed in replies.
    pub xid: u32,

    /// Seconds elapsed since client began address acquisition.
    pub secs: u16,

    /// Flags. Bit 15 (0x8000) = broadcast flag.
    pub flags: u16,

    /// Client IP address (set by client in RENEWING/REBINDING states).
    pub ciaddr: Ipv4Addr,

    /// "Your" IP address - the address being assigned to the client.
    pub yiaddr: Ipv4Addr,

    /// Server IP address.
    pub siaddr: Ipv4Addr,

    /// Gateway IP address - set by relay agents.
    pub giaddr: Ipv4Addr,

    /// Client hardware address (MAC for Ethernet).
    pub chaddr: [u8; 16],

    /// Server host name.
    pub sname: [u8; 64],

    /// Boot file name.
    pub file: [u8; 128],

    /// DHCP options, in wire order.
    pub options: Vec<DhcpOption>,
}

impl DhcpPacket {
    /// Parses a DHCP request from a received datagram.
    ///
    /// At most [`DHCP_MAX_OPTIONS_SIZE`] bytes after the header are
    /// considered; anything beyond is ignored.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPacket`] if:
    /// - Packet is shorter than the 236-byte header
    /// - Magic cookie is missing or wrong
    /// - An option overruns the received bytes
    /// - No single-byte message type (Option 53) is present
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < DHCP_HEADER_SIZE {
            return Err(Error::InvalidPacket(format!(
                "Packet too short: {} bytes (minimum {})",
                data.len(),
                DHCP_HEADER_SIZE
            )));
        }

        let options_end = data.len().min(DHCP_HEADER_SIZE + DHCP_MAX_OPTIONS_SIZE);
        let options_area = &data[DHCP_HEADER_SIZE..options_end];

        let options = parse_options(options_area)?;
        if decode_message_type(options_area).is_none() {
            return Err(Error::InvalidPacket(
                "DHCP message type not found".to_string(),
            ));
        }

        let mut chaddr = [0u8; DHCP_CHADDR_SIZE];
        chaddr.copy_from_slice(&data[DHCP_CHADDR_OFFSET..DHCP_SNAME_OFFSET]);

        let mut sname = [0u8; DHCP_SNAME_SIZE];
        sname.copy_from_slice(&data[DHCP_SNAME_OFFSET..DHCP_FILE_OFFSET]);

        let mut file = [0u8; DHCP_FILE_SIZE];
        file.copy_from_slice(&data[DHCP_FILE_OFFSET..DHCP_HEADER_SIZE]);

        Ok(Self {
            op: data[0],
            htype: data[1],
            hlen: data[2],
            hops: data[3],
            xid: u32::from_be_bytes([data[4], data[5], data[6], data[7]]),
            secs: u16::from_be_bytes([data[8], data[9]]),
            flags: u16::from_be_bytes([data[10], data[11]]),
            ciaddr: Ipv4Addr::new(data[12], data[13], data[14], data[15]),
            yiaddr: Ipv4Addr::new(data[16], data[17], data[18], data[19]),
            siaddr: Ipv4Addr::new(data[20], data[21], data[22], data[23]),
            giaddr: Ipv4Addr::new(data[24], data[25], data[26], data[27]),
            chaddr,
            sname,
            file,
            options,
        })
    }

    /// Appends the wire encoding to `out`, which is cleared first.
    ///
    /// The result is the header, the magic cookie, every option, and an End
    /// marker, zero-padded up to [`DHCP_MIN_PACKET_SIZE`].
    pub fn encode_into(&self, out: &mut Vec<u8>) {
        out.clear();

        out.extend_from_slice(&[self.op, self.htype, self.hlen, self.hops]);
        out.extend_from_slice(&self.xid.to_be_bytes());
        out.extend_from_slice(&self.secs.to_be_bytes());
        out.extend_from_slice(&self.flags.to_be_bytes());

        out.extend_from_slice(&self.ciaddr.octets());
        out.extend_from_slice(&self.yiaddr.octets());
        out.extend_from_slice(&self.siaddr.octets());
        out.extend_from_slice(&self.giaddr.octets());

        out.extend_from_slice(&self.chaddr);
        out.extend_from_slice(&self.sname);
        out.extend_from_slice(&self.file);

        out.extend_from_slice(&DHCP_MAGIC_COOKIE);
        for option in &self.options {
            option.encode_into(out);
        }
        out.push(OptionCode::End as u8);

        if out.len() < DHCP_MIN_PACKET_SIZE {
            out.resize(DHCP_MIN_PACKET_SIZE, 0);
        }
    }

    /// Encodes the packet to a new buffer. See [`encode_into`](Self::encode_into).
    pub fn encode(&self) -> Vec<u8> {
        let mut packet = Vec::with_capacity(DHCP_ENCODE_CAPACITY);
        self.encode_into(&mut packet);
        packet
    }

    /// Returns the raw DHCP message type (Option 53) value if present.
    ///
    /// Values outside 1..=8 are returned as-is; the server decides how to
    /// treat them.
    pub fn message_type_value(&self) -> Option<u8> {
        self.options.iter().find_map(|opt| match opt {
            DhcpOption::MessageType(value) => Some(*value),
            _ => None,
        })
    }

    /// Returns the DHCP message type if present and known.
    pub fn message_type(&self) -> Option<MessageType> {
        self.message_type_value()
            .and_then(|value| MessageType::try_from(value).ok())
    }

    /// Returns the requested IP address (Option 50) if present.
    pub fn requested_ip(&self) -> Option<Ipv4Addr> {
        self.options.iter().find_map(|opt| match opt {
            DhcpOption::RequestedIpAddress(ip) => Some(*ip),
            _ => None,
        })
    }

    /// Returns the client hostname (Option 12) if present.
    pub fn hostname(&self) -> Option<&str> {
        self.options.iter().find_map(|opt| match opt {
            DhcpOption::Hostname(name) => Some(name.as_str()),
            _ => None,
        })
    }

    /// The first six bytes of `chaddr`, which key every lease lookup.
    pub fn client_mac(&self) -> MacAddr {
        let mut mac = [0u8; 6];
        mac.copy_from_slice(&self.chaddr[..6]);
        MacAddr(mac)
    }

    /// Formats the client hardware address as a colon-separated string.
    pub fn format_mac(&self) -> String {
        self.client_mac().to_string()
    }

    /// Returns true if the broadcast flag (bit 15) is set.
    pub fn is_broadcast(&self) -> bool {
        (self.flags & BROADCAST_FLAG) != 0
    }

    /// Creates an OFFER or ACK reply for `request`.
    ///
    /// `htype`, `hlen`, `xid` and the full `chaddr` are copied from the
    /// request; `hops`, `secs`, `ciaddr`, `giaddr`, `sname` and `file` are
    /// zeroed; the broadcast flag is always set. Options appear in a fixed
    /// order: client identifier, message type, server identifier, lease,
    /// renewal and rebinding times, subnet mask, router, DNS server.
    ///
    /// Identical inputs always produce an identical packet.
    pub fn create_reply(
        request: &DhcpPacket,
        message_type: MessageType,
        offered_ip: Ipv4Addr,
        params: &ReplyParams,
    ) -> Self {
        let options = vec![
            Self::client_identifier(request),
            DhcpOption::MessageType(message_type as u8),
            DhcpOption::ServerIdentifier(params.server_ip),
            DhcpOption::LeaseTime(params.lease_seconds),
            DhcpOption::RenewalTime(params.renewal_seconds()),
            DhcpOption::RebindingTime(params.rebinding_seconds()),
            DhcpOption::SubnetMask(params.subnet_mask),
            DhcpOption::Router(params.server_ip),
            DhcpOption::DnsServer(params.dns_server),
        ];

        Self::reply_with(request, offered_ip, params, options)
    }

    /// Creates the ACK for a DHCPINFORM (RFC 2131 §4.3.5).
    ///
    /// The client already has an address, so `yiaddr` stays zero and no
    /// lease, renewal or rebinding time is sent. Header handling otherwise
    /// matches [`create_reply`](Self::create_reply).
    pub fn create_inform_reply(request: &DhcpPacket, params: &ReplyParams) -> Self {
        let options = vec![
            Self::client_identifier(request),
            DhcpOption::MessageType(MessageType::Ack as u8),
            DhcpOption::ServerIdentifier(params.server_ip),
            DhcpOption::SubnetMask(params.subnet_mask),
            DhcpOption::Router(params.server_ip),
            DhcpOption::DnsServer(params.dns_server),
        ];

        Self::reply_with(request, Ipv4Addr::UNSPECIFIED, params, options)
    }

    fn client_identifier(request: &DhcpPacket) -> DhcpOption {
        let mut client_id = Vec::with_capacity(7);
        client_id.push(HTYPE_ETHERNET);
        client_id.extend_from_slice(&request.chaddr[..6]);
        DhcpOption::ClientIdentifier(client_id)
    }

    fn reply_with(
        request: &DhcpPacket,
        offered_ip: Ipv4Addr,
        params: &ReplyParams,
        options: Vec<DhcpOption>,
    ) -> Self {
        Self {
            op: BOOTREPLY,
            htype: request.htype,
            hlen: request.hlen,
            hops: 0,
            xid: request.xid,
            secs: 0,
            flags: BROADCAST_FLAG,
            ciaddr: Ipv4Addr::UNSPECIFIED,
            yiaddr: offered_ip,
            siaddr: params.server_ip,
            giaddr: Ipv4Addr::UNSPECIFIED,
            chaddr: request.chaddr,
            sname: [0u8; DHCP_SNAME_SIZE],
            file: [0u8; DHCP_FILE_SIZE],
            options,
        }
    }
}
