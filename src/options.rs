//! DHCP options as defined in RFC 2132.
//!
//! DHCP uses options to convey configuration parameters between servers and clients.
//! Each option has a code (1 byte), length (1 byte), and variable-length data,
//! except Pad (0) and End (255) which are a single byte.
//!
//! [`OptionReader`] is the single bounds-checked walk over a TLV stream. Both
//! [`decode_message_type`] and typed parsing into [`DhcpOption`] sit on top of it.
//!
//! # References
//!
//! - RFC 2132: DHCP Options and BOOTP Vendor Extensions

use std::net::Ipv4Addr;

use crate::error::{Error, Result};

/// DHCP magic cookie that starts the options area (99.130.83.99).
pub const DHCP_MAGIC_COOKIE: [u8; 4] = [0x63, 0x82, 0x53, 0x63];

/// DHCP option codes as defined in RFC 2132.
///
/// Only codes used by this server are defined; unknown codes
/// are handled via [`DhcpOption::Unknown`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum OptionCode {
    /// Padding (no operation). Used for alignment.
    Pad = 0,
    /// Subnet mask (RFC 2132 §3.3).
    SubnetMask = 1,
    /// Router/gateway addresses (RFC 2132 §3.5).
    Router = 3,
    /// DNS server addresses (RFC 2132 §3.8).
    DnsServer = 6,
    /// Client hostname (RFC 2132 §3.14).
    Hostname = 12,
    /// Requested IP address (RFC 2132 §9.1).
    RequestedIpAddress = 50,
    /// IP address lease time in seconds (RFC 2132 §9.2).
    LeaseTime = 51,
    /// DHCP message type (RFC 2132 §9.6).
    MessageType = 53,
    /// Server identifier (RFC 2132 §9.7).
    ServerIdentifier = 54,
    /// Parameter request list (RFC 2132 §9.8).
    ParameterRequestList = 55,
    /// Renewal time T1 (RFC 2132 §9.11).
    RenewalTime = 58,
    /// Rebinding time T2 (RFC 2132 §9.12).
    RebindingTime = 59,
    /// Client identifier (RFC 2132 §9.14).
    ClientIdentifier = 61,
    /// End of options marker.
    End = 255,
}

impl TryFrom<u8> for OptionCode {
    type Error = u8;

    fn try_from(value: u8) -> std::result::Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Pad),
            1 => Ok(Self::SubnetMask),
            3 => Ok(Self::Router),
            6 => Ok(Self::DnsServer),
            12 => Ok(Self::Hostname),
            50 => Ok(Self::RequestedIpAddress),
            51 => Ok(Self::LeaseTime),
            53 => Ok(Self::MessageType),
            54 => Ok(Self::ServerIdentifier),
            55 => Ok(Self::ParameterRequestList),
            58 => Ok(Self::RenewalTime),
            59 => Ok(Self::RebindingTime),
            61 => Ok(Self::ClientIdentifier),
            255 => Ok(Self::End),
            other => Err(other),
        }
    }
}

/// DHCP message types (Option 53) as defined in RFC 2132 §9.6.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum MessageType {
    /// Client broadcast to locate servers.
    Discover = 1,
    /// Server response to DISCOVER with IP offer.
    Offer = 2,
    /// Client request for offered parameters.
    Request = 3,
    /// Client indicates address is already in use.
    Decline = 4,
    /// Server acknowledgement with configuration.
    Ack = 5,
    /// Server negative acknowledgement.
    Nak = 6,
    /// Client releases IP address.
    Release = 7,
    /// Client requests config without IP allocation.
    Inform = 8,
}

impl TryFrom<u8> for MessageType {
    type Error = u8;

    fn try_from(value: u8) -> std::result::Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Discover),
            2 => Ok(Self::Offer),
            3 => Ok(Self::Request),
            4 => Ok(Self::Decline),
            5 => Ok(Self::Ack),
            6 => Ok(Self::Nak),
            7 => Ok(Self::Release),
            8 => Ok(Self::Inform),
            other => Err(other),
        }
    }
}

impl std::fmt::Display for MessageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Discover => write!(f, "DISCOVER"),
            Self::Offer => write!(f, "OFFER"),
            Self::Request => write!(f, "REQUEST"),
            Self::Decline => write!(f, "DECLINE"),
            Self::Ack => write!(f, "ACK"),
            Self::Nak => write!(f, "NAK"),
            Self::Release => write!(f, "RELEASE"),
            Self::Inform => write!(f, "INFORM"),
        }
    }
}

/// One undecoded TLV record borrowed from the options buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawOption<'a> {
    pub code: u8,
    pub data: &'a [u8],
}

/// Cursor over a TLV option stream (without the magic cookie).
///
/// Pad bytes are skipped, End terminates the stream, and a record whose
/// length byte or value would run past the buffer yields an error once and
/// then stops. Nothing is ever read beyond `data.len()`.
#[derive(Debug, Clone)]
pub struct OptionReader<'a> {
    data: &'a [u8],
    index: usize,
    done: bool,
}

impl<'a> OptionReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            index: 0,
            done: false,
        }
    }

    /// Starts a reader after a leading magic cookie, or `None` if the
    /// buffer is too short or the cookie doesn't match.
    pub fn after_cookie(data: &'a [u8]) -> Option<Self> {
        match data.split_at_checked(DHCP_MAGIC_COOKIE.len()) {
            Some((cookie, rest)) if cookie == DHCP_MAGIC_COOKIE => Some(Self::new(rest)),
            _ => None,
        }
    }
}

impl<'a> Iterator for OptionReader<'a> {
    type Item = Result<RawOption<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        while let Some(&code) = self.data.get(self.index) {
            if code == OptionCode::Pad as u8 {
                self.index += 1;
                continue;
            }

            if code == OptionCode::End as u8 {
                self.done = true;
                return None;
            }

            let Some(&length) = self.data.get(self.index + 1) else {
                self.done = true;
                return Some(Err(Error::InvalidPacket(format!(
                    "Option {} length missing",
                    code
                ))));
            };

            let start = self.index + 2;
            let end = start + length as usize;
            let Some(data) = self.data.get(start..end) else {
                self.done = true;
                return Some(Err(Error::InvalidPacket(format!(
                    "Option {} data truncated ({} bytes declared, {} available)",
                    code,
                    length,
                    self.data.len() - start
                ))));
            };

            self.index = end;
            return Some(Ok(RawOption { code, data }));
        }

        self.done = true;
        None
    }
}

/// Extracts the DHCP message type (Option 53) from an options buffer.
///
/// `options` starts with the magic cookie. Returns `None` when the buffer
/// is shorter than the cookie, the cookie is wrong, no single-byte Option 53
/// precedes End, or a truncated record is hit before one is found.
/// An Option 53 with a length other than 1 is skipped, not accepted.
pub fn decode_message_type(options: &[u8]) -> Option<u8> {
    let reader = OptionReader::after_cookie(options)?;

    for option in reader {
        let option = option.ok()?;
        if option.code == OptionCode::MessageType as u8 && option.data.len() == 1 {
            return Some(option.data[0]);
        }
    }

    None
}

/// A parsed DHCP option.
///
/// Each variant corresponds to a specific option code from RFC 2132.
/// Unknown options, and known codes carrying a payload of the wrong size,
/// are preserved as [`Unknown`](Self::Unknown).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DhcpOption {
    /// Subnet mask (Option 1).
    SubnetMask(Ipv4Addr),
    /// Router/gateway address (Option 3). Only the first address is kept.
    Router(Ipv4Addr),
    /// DNS server address (Option 6). Only the first address is kept.
    DnsServer(Ipv4Addr),
    /// Client hostname (Option 12).
    Hostname(String),
    /// Client's requested IP address (Option 50).
    RequestedIpAddress(Ipv4Addr),
    /// Lease time in seconds (Option 51).
    LeaseTime(u32),
    /// Raw DHCP message type value (Option 53).
    MessageType(u8),
    /// Server identifier - IP of the DHCP server (Option 54).
    ServerIdentifier(Ipv4Addr),
    /// List of option codes the client wants (Option 55).
    ParameterRequestList(Vec<u8>),
    /// Renewal time T1 in seconds (Option 58).
    RenewalTime(u32),
    /// Rebinding time T2 in seconds (Option 59).
    RebindingTime(u32),
    /// Client identifier (Option 61): hardware type followed by the address.
    ClientIdentifier(Vec<u8>),
    /// Unknown or malformed option with raw code and data.
    Unknown(u8, Vec<u8>),
}

fn ipv4(data: &[u8]) -> Option<Ipv4Addr> {
    let octets: [u8; 4] = data.try_into().ok()?;
    Some(Ipv4Addr::from(octets))
}

fn first_ipv4(data: &[u8]) -> Option<Ipv4Addr> {
    if data.is_empty() || !data.len().is_multiple_of(4) {
        return None;
    }
    ipv4(&data[..4])
}

fn seconds(data: &[u8]) -> Option<u32> {
    let bytes: [u8; 4] = data.try_into().ok()?;
    Some(u32::from_be_bytes(bytes))
}

impl DhcpOption {
    /// Returns the RFC 2132 option code for this option.
    pub fn option_code(&self) -> u8 {
        match self {
            Self::SubnetMask(_) => OptionCode::SubnetMask as u8,
            Self::Router(_) => OptionCode::Router as u8,
            Self::DnsServer(_) => OptionCode::DnsServer as u8,
            Self::Hostname(_) => OptionCode::Hostname as u8,
            Self::RequestedIpAddress(_) => OptionCode::RequestedIpAddress as u8,
            Self::LeaseTime(_) => OptionCode::LeaseTime as u8,
            Self::MessageType(_) => OptionCode::MessageType as u8,
            Self::ServerIdentifier(_) => OptionCode::ServerIdentifier as u8,
            Self::ParameterRequestList(_) => OptionCode::ParameterRequestList as u8,
            Self::RenewalTime(_) => OptionCode::RenewalTime as u8,
            Self::RebindingTime(_) => OptionCode::RebindingTime as u8,
            Self::ClientIdentifier(_) => OptionCode::ClientIdentifier as u8,
            Self::Unknown(code, _) => *code,
        }
    }

    /// Builds a typed option from a raw TLV record.
    ///
    /// Never fails: a payload that doesn't fit the code's type falls back to
    /// [`Unknown`](Self::Unknown) so one odd option can't sink a request.
    pub fn parse(raw: RawOption<'_>) -> Self {
        let RawOption { code, data } = raw;
        let typed = match OptionCode::try_from(code) {
            Ok(OptionCode::SubnetMask) => ipv4(data).map(Self::SubnetMask),
            Ok(OptionCode::Router) => first_ipv4(data).map(Self::Router),
            Ok(OptionCode::DnsServer) => first_ipv4(data).map(Self::DnsServer),
            Ok(OptionCode::Hostname) => {
                Some(Self::Hostname(String::from_utf8_lossy(data).into_owned()))
            }
            Ok(OptionCode::RequestedIpAddress) => ipv4(data).map(Self::RequestedIpAddress),
            Ok(OptionCode::LeaseTime) => seconds(data).map(Self::LeaseTime),
            Ok(OptionCode::MessageType) => match data {
                [value] => Some(Self::MessageType(*value)),
                _ => None,
            },
            Ok(OptionCode::ServerIdentifier) => ipv4(data).map(Self::ServerIdentifier),
            Ok(OptionCode::ParameterRequestList) => Some(Self::ParameterRequestList(data.to_vec())),
            Ok(OptionCode::RenewalTime) => seconds(data).map(Self::RenewalTime),
            Ok(OptionCode::RebindingTime) => seconds(data).map(Self::RebindingTime),
            Ok(OptionCode::ClientIdentifier) => Some(Self::ClientIdentifier(data.to_vec())),
            Ok(OptionCode::Pad) | Ok(OptionCode::End) | Err(_) => None,
        };

        typed.unwrap_or_else(|| Self::Unknown(code, data.to_vec()))
    }

    /// Appends the option's wire format (code + length + data) to `out`.
    pub fn encode_into(&self, out: &mut Vec<u8>) {
        let code = self.option_code();
        match self {
            Self::SubnetMask(addr)
            | Self::Router(addr)
            | Self::DnsServer(addr)
            | Self::RequestedIpAddress(addr)
            | Self::ServerIdentifier(addr) => {
                out.extend_from_slice(&[code, 4]);
                out.extend_from_slice(&addr.octets());
            }
            Self::LeaseTime(time) | Self::RenewalTime(time) | Self::RebindingTime(time) => {
                out.extend_from_slice(&[code, 4]);
                out.extend_from_slice(&time.to_be_bytes());
            }
            Self::MessageType(value) => out.extend_from_slice(&[code, 1, *value]),
            Self::Hostname(name) => encode_bytes(out, code, name.as_bytes()),
            Self::ParameterRequestList(data)
            | Self::ClientIdentifier(data)
            | Self::Unknown(_, data) => encode_bytes(out, code, data),
        }
    }

    /// Encodes the option to a freshly allocated buffer.
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(8);
        self.encode_into(&mut out);
        out
    }
}

fn encode_bytes(out: &mut Vec<u8>, code: u8, data: &[u8]) {
    let len = data.len().min(u8::MAX as usize);
    out.extend_from_slice(&[code, len as u8]);
    out.extend_from_slice(&data[..len]);
}

/// Parses every option in an options buffer that starts with the magic cookie.
///
/// # Errors
///
/// Returns [`Error::InvalidPacket`] if the cookie is missing or a record is
/// truncated.
pub fn parse_options(options: &[u8]) -> Result<Vec<DhcpOption>> {
    let reader = OptionReader::after_cookie(options)
        .ok_or_else(|| Error::InvalidPacket("Magic cookie not found".to_string()))?;

    reader
        .map(|raw| raw.map(DhcpOption::parse))
        .collect()
}
