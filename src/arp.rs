//! Gratuitous ARP announcements for freshly assigned addresses.
//!
//! After a reply goes out, the server broadcasts an ARP reply on the AP link
//! claiming `offered_ip is-at client_mac`, so neighbours (including the
//! gateway's own stack) learn the binding before the client speaks.
//!
//! # Frame Layout (42 bytes)
//!
//! ```text
//! Ethernet: dst ff:ff:ff:ff:ff:ff | src client MAC | type 0x0806
//! ARP:      htype 1 | ptype 0x0800 | hlen 6 | plen 4 | op 2 (reply)
//!           sha client MAC | spa offered IP | tha client MAC | tpa offered IP
//! ```

use std::io;
use std::net::Ipv4Addr;

use tracing::{error, info};

use crate::error::Result;
use crate::mac::MacAddr;

const ETH_HEADER_LEN: usize = 14;
const ARP_PAYLOAD_LEN: usize = 28;

/// Length of a gratuitous ARP frame on the wire.
pub const ARP_FRAME_LEN: usize = ETH_HEADER_LEN + ARP_PAYLOAD_LEN;

const ETHERTYPE_ARP: u16 = 0x0806;
const ETHERTYPE_IPV4: u16 = 0x0800;
const ARP_HTYPE_ETHERNET: u16 = 1;
const ARP_OP_REPLY: u16 = 2;

/// Builds the gratuitous ARP frame announcing `ip` at `mac`.
pub fn gratuitous_arp_frame(ip: Ipv4Addr, mac: MacAddr) -> [u8; ARP_FRAME_LEN] {
    let mut frame = [0u8; ARP_FRAME_LEN];
    let mac = mac.octets();
    let ip = ip.octets();

    frame[0..6].copy_from_slice(&MacAddr::BROADCAST.octets());
    frame[6..12].copy_from_slice(&mac);
    frame[12..14].copy_from_slice(&ETHERTYPE_ARP.to_be_bytes());

    let arp = &mut frame[ETH_HEADER_LEN..];
    arp[0..2].copy_from_slice(&ARP_HTYPE_ETHERNET.to_be_bytes());
    arp[2..4].copy_from_slice(&ETHERTYPE_IPV4.to_be_bytes());
    arp[4] = 6;
    arp[5] = 4;
    arp[6..8].copy_from_slice(&ARP_OP_REPLY.to_be_bytes());
    arp[8..14].copy_from_slice(&mac);
    arp[14..18].copy_from_slice(&ip);
    arp[18..24].copy_from_slice(&mac);
    arp[24..28].copy_from_slice(&ip);

    frame
}

/// Something that can put a raw Ethernet frame on the AP link.
pub trait LinkSender: Send {
    fn send_frame(&self, frame: &[u8]) -> io::Result<()>;
}

/// An `AF_PACKET` raw socket bound to one interface.
#[derive(Debug)]
pub struct PacketSocket {
    #[cfg(target_os = "linux")]
    fd: std::os::fd::OwnedFd,
    ifindex: u32,
}

#[cfg(target_os = "linux")]
impl PacketSocket {
    /// Opens a packet socket on `interface`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Socket`](crate::Error::Socket) if the interface does
    /// not exist or the socket cannot be created (usually missing
    /// `CAP_NET_RAW`).
    pub fn open(interface: &str) -> Result<Self> {
        use crate::error::Error;
        use std::ffi::CString;
        use std::os::fd::{FromRawFd, OwnedFd};

        let name = CString::new(interface).map_err(|_| {
            Error::Socket(format!("Invalid interface name '{}'", interface))
        })?;

        let ifindex = unsafe { libc::if_nametoindex(name.as_ptr()) };
        if ifindex == 0 {
            return Err(Error::Socket(format!(
                "Failed to resolve interface '{}': {}",
                interface,
                io::Error::last_os_error()
            )));
        }

        let raw_fd = unsafe {
            libc::socket(
                libc::AF_PACKET,
                libc::SOCK_RAW | libc::SOCK_CLOEXEC,
                (libc::ETH_P_ARP as u16).to_be() as i32,
            )
        };
        if raw_fd < 0 {
            return Err(Error::Socket(format!(
                "Failed to create packet socket on '{}': {}",
                interface,
                io::Error::last_os_error()
            )));
        }

        // SAFETY: raw_fd was just returned by socket(2) and is owned by nobody else.
        let fd = unsafe { OwnedFd::from_raw_fd(raw_fd) };

        Ok(Self { fd, ifindex })
    }
}

#[cfg(not(target_os = "linux"))]
impl PacketSocket {
    pub fn open(interface: &str) -> Result<Self> {
        Err(crate::error::Error::Socket(format!(
            "Packet sockets are not supported on this platform (interface '{}')",
            interface
        )))
    }
}

impl PacketSocket {
    pub fn ifindex(&self) -> u32 {
        self.ifindex
    }
}

#[cfg(target_os = "linux")]
impl LinkSender for PacketSocket {
    fn send_frame(&self, frame: &[u8]) -> io::Result<()> {
        use std::os::fd::AsRawFd;

        let mut sll: libc::sockaddr_ll = unsafe { std::mem::zeroed() };
        sll.sll_family = libc::AF_PACKET as u16;
        sll.sll_protocol = (libc::ETH_P_ARP as u16).to_be();
        sll.sll_ifindex = self.ifindex as i32;
        sll.sll_halen = 6;
        sll.sll_addr[..6].copy_from_slice(&MacAddr::BROADCAST.octets());

        let sent = unsafe {
            libc::sendto(
                self.fd.as_raw_fd(),
                frame.as_ptr() as *const libc::c_void,
                frame.len(),
                0,
                &sll as *const _ as *const libc::sockaddr,
                std::mem::size_of::<libc::sockaddr_ll>() as libc::socklen_t,
            )
        };

        if sent < 0 {
            return Err(io::Error::last_os_error());
        }
        if sent as usize != frame.len() {
            return Err(io::Error::new(
                io::ErrorKind::WriteZero,
                format!("short write: {} of {} bytes", sent, frame.len()),
            ));
        }
        Ok(())
    }
}

#[cfg(not(target_os = "linux"))]
impl LinkSender for PacketSocket {
    fn send_frame(&self, _frame: &[u8]) -> io::Result<()> {
        Err(io::Error::from(io::ErrorKind::Unsupported))
    }
}

/// Sends gratuitous ARP frames through a [`LinkSender`].
pub struct ArpAnnouncer {
    sender: Box<dyn LinkSender>,
}

impl ArpAnnouncer {
    pub fn new(sender: Box<dyn LinkSender>) -> Self {
        Self { sender }
    }

    /// Opens a [`PacketSocket`] on `interface` and wraps it.
    pub fn open(interface: &str) -> Result<Self> {
        let socket = PacketSocket::open(interface)?;
        Ok(Self::new(Box::new(socket)))
    }

    /// Announces `ip` at `mac`. Failures are logged, never returned.
    ///
    /// Returns whether the frame went out.
    pub fn announce(&self, ip: Ipv4Addr, mac: MacAddr) -> bool {
        let frame = gratuitous_arp_frame(ip, mac);
        match self.sender.send_frame(&frame) {
            Ok(()) => {
                info!("Sent gratuitous ARP: {} is-at {}", ip, mac);
                true
            }
            Err(send_error) => {
                error!("Failed to send gratuitous ARP for {}: {}", ip, send_error);
                false
            }
        }
    }
}

impl std::fmt::Debug for ArpAnnouncer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArpAnnouncer").finish_non_exhaustive()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// Records every frame it is asked to send.
    #[derive(Clone, Default)]
    pub(crate) struct RecordingSender {
        pub(crate) frames: Arc<Mutex<Vec<Vec<u8>>>>,
    }

    impl LinkSender for RecordingSender {
        fn send_frame(&self, frame: &[u8]) -> io::Result<()> {
            self.frames.lock().unwrap().push(frame.to_vec());
            Ok(())
        }
    }

    struct FailingSender;

    impl LinkSender for FailingSender {
        fn send_frame(&self, _frame: &[u8]) -> io::Result<()> {
            Err(io::Error::from(io::ErrorKind::PermissionDenied))
        }
    }

    const MAC: MacAddr = MacAddr([0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0x01]);

    #[test]
    fn test_gratuitous_frame_layout() {
        let frame = gratuitous_arp_frame(Ipv4Addr::new(192, 168, 4, 2), MAC);

        let expected: [u8; ARP_FRAME_LEN] = [
            0xff, 0xff, 0xff, 0xff, 0xff, 0xff, //
            0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0x01, //
            0x08, 0x06, //
            0x00, 0x01, 0x08, 0x00, 6, 4, 0x00, 0x02, //
            0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0x01, 192, 168, 4, 2, //
            0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0x01, 192, 168, 4, 2,
        ];
        assert_eq!(frame, expected);
    }

    #[test]
    fn test_announce_sends_one_frame() {
        let sender = RecordingSender::default();
        let announcer = ArpAnnouncer::new(Box::new(sender.clone()));

        assert!(announcer.announce(Ipv4Addr::new(192, 168, 4, 50), MAC));

        let frames = sender.frames.lock().unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].len(), ARP_FRAME_LEN);
        assert_eq!(&frames[0][28..32], &[192, 168, 4, 50]);
    }

    #[test]
    fn test_announce_failure_is_swallowed() {
        let announcer = ArpAnnouncer::new(Box::new(FailingSender));
        assert!(!announcer.announce(Ipv4Addr::new(192, 168, 4, 2), MAC));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_open_unknown_interface() {
        let result = PacketSocket::open("nosuchif0");
        assert!(matches!(result, Err(crate::error::Error::Socket(_))));
    }
}
