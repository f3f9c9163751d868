use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};

use socket2::{Domain, Protocol, Socket, Type};
use tokio::net::UdpSocket;
use tracing::{debug, error, info, warn};

use crate::arp::ArpAnnouncer;
use crate::config::{Config, ReplyPolicy};
use crate::error::{Error, Result};
use crate::lease::LeaseStore;
use crate::mac::MacAddr;
use crate::options::MessageType;
use crate::packet::{BOOTREQUEST, DhcpPacket, ReplyParams};

const DHCP_SERVER_PORT: u16 = 67;
const DHCP_CLIENT_PORT: u16 = 68;
const RECV_BUFFER_SIZE: usize = 1500;

/// Decides which reply, if any, a client message type earns.
///
/// Returns `None` when the message must not be answered.
pub fn reply_for(policy: ReplyPolicy, message_type: u8) -> Option<MessageType> {
    match (policy, MessageType::try_from(message_type)) {
        (_, Ok(MessageType::Discover)) => Some(MessageType::Offer),
        (ReplyPolicy::Legacy, _) => Some(MessageType::Ack),
        (ReplyPolicy::Strict, Ok(MessageType::Request | MessageType::Inform)) => {
            Some(MessageType::Ack)
        }
        (ReplyPolicy::Strict, _) => None,
    }
}

/// A reply ready to go on the wire, plus what the announcer needs.
#[derive(Debug, Clone)]
pub struct Reply {
    pub packet: DhcpPacket,
    pub client_mac: MacAddr,
    /// `None` for an INFORM answer, which assigns nothing.
    pub offered_ip: Option<Ipv4Addr>,
}

/// Turns one received datagram into at most one reply.
///
/// Holds the lease table; does no I/O.
#[derive(Debug)]
pub struct PacketHandler {
    policy: ReplyPolicy,
    params: ReplyParams,
    leases: LeaseStore,
}

impl PacketHandler {
    pub fn new(config: &Config, leases: LeaseStore) -> Self {
        Self {
            policy: config.reply_policy,
            params: config.reply_params(),
            leases,
        }
    }

    /// Handles one datagram.
    ///
    /// Returns `Ok(None)` for messages that are deliberately left unanswered.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidPacket`] if the datagram does not decode or is not a
    ///   BOOTREQUEST
    /// - [`Error::PoolExhausted`] if the client needs a new dynamic address
    ///   and none is left
    pub fn handle(&mut self, data: &[u8]) -> Result<Option<Reply>> {
        let request = DhcpPacket::parse(data)?;

        if request.op != BOOTREQUEST {
            return Err(Error::InvalidPacket(format!(
                "Expected BOOTREQUEST, got op {}",
                request.op
            )));
        }

        let client_mac = request.client_mac();
        let Some(type_value) = request.message_type_value() else {
            return Err(Error::InvalidPacket(
                "DHCP message type not found".to_string(),
            ));
        };

        let received = MessageType::try_from(type_value).ok();
        match received {
            Some(message_type) => info!("{} from {}", message_type, client_mac),
            None => info!("Message type {} from {}", type_value, client_mac),
        }

        let Some(reply_type) = reply_for(self.policy, type_value) else {
            match received {
                Some(MessageType::Decline) => warn!(
                    "DECLINE from {} for {:?}, lease kept",
                    client_mac,
                    request.requested_ip()
                ),
                Some(MessageType::Release) => {
                    info!("RELEASE from {} ({}), lease kept", client_mac, request.ciaddr)
                }
                _ => debug!("Ignoring message type {} from {}", type_value, client_mac),
            }
            return Ok(None);
        };

        if self.policy == ReplyPolicy::Strict && received == Some(MessageType::Inform) {
            let packet = DhcpPacket::create_inform_reply(&request, &self.params);
            info!("ACK configuration to {} ({})", client_mac, request.ciaddr);
            return Ok(Some(Reply {
                packet,
                client_mac,
                offered_ip: None,
            }));
        }

        let offered_ip = self.leases.resolve(client_mac)?;

        if let Some(hostname) = request.hostname() {
            debug!("{} identifies as '{}'", client_mac, hostname);
        }

        let packet = DhcpPacket::create_reply(&request, reply_type, offered_ip, &self.params);

        info!("{} {} to {}", reply_type, offered_ip, client_mac);

        Ok(Some(Reply {
            packet,
            client_mac,
            offered_ip: Some(offered_ip),
        }))
    }

    pub fn leases(&self) -> &LeaseStore {
        &self.leases
    }
}

pub struct DhcpServer {
    config: Config,
    handler: PacketHandler,
    socket: UdpSocket,
    reply_destination: SocketAddr,
    announcer: Option<ArpAnnouncer>,
}

impl DhcpServer {
    /// Loads reservations, binds port 67 and opens the ARP announcer.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Socket`] if the UDP socket cannot be created or bound.
    /// Reservation and announcer problems are logged and do not fail startup.
    pub fn new(config: Config) -> Result<Self> {
        let mut leases = LeaseStore::from_config(&config);
        match config.load_reservations() {
            Ok(entries) => {
                let accepted = leases.load_reservations(&entries);
                info!("Loaded {} reservation(s)", accepted);
            }
            Err(error) => warn!(
                "Failed to load reservations from {}: {}",
                config.reservations_file, error
            ),
        }

        let socket = Self::create_socket(&config)?;
        let announcer = Self::open_announcer(&config);

        info!(
            "DHCP server starting on {}:{}",
            config.server_ip, DHCP_SERVER_PORT
        );
        info!(
            "IP pool: {} - {} ({} addresses), reply policy {}",
            config.pool_start,
            config.pool_end,
            config.pool_size(),
            config.reply_policy
        );

        Ok(Self::from_parts(config, leases, socket, announcer))
    }

    /// Assembles a server from an already-bound socket.
    pub fn from_parts(
        config: Config,
        leases: LeaseStore,
        socket: UdpSocket,
        announcer: Option<ArpAnnouncer>,
    ) -> Self {
        let handler = PacketHandler::new(&config, leases);
        Self {
            config,
            handler,
            socket,
            reply_destination: SocketAddr::from((Ipv4Addr::BROADCAST, DHCP_CLIENT_PORT)),
            announcer,
        }
    }

    fn create_socket(config: &Config) -> Result<UdpSocket> {
        let socket = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))
            .map_err(|error| Error::Socket(format!("Failed to create socket: {}", error)))?;

        socket
            .set_reuse_address(true)
            .map_err(|error| Error::Socket(format!("Failed to set SO_REUSEADDR: {}", error)))?;

        socket
            .set_broadcast(true)
            .map_err(|error| Error::Socket(format!("Failed to set SO_BROADCAST: {}", error)))?;

        socket
            .set_nonblocking(true)
            .map_err(|error| Error::Socket(format!("Failed to set non-blocking: {}", error)))?;

        // A socket bound to a unicast address never sees 255.255.255.255
        // DISCOVERs on Linux, so an interface-scoped server binds the wildcard.
        let bind_ip = match &config.interface {
            Some(interface) => {
                Self::bind_to_interface(&socket, interface)?;
                Ipv4Addr::UNSPECIFIED
            }
            None => config.server_ip,
        };

        let bind_addr = SocketAddrV4::new(bind_ip, DHCP_SERVER_PORT);
        socket.bind(&bind_addr.into()).map_err(|error| {
            Error::Socket(format!("Failed to bind to {}: {}", bind_addr, error))
        })?;

        let std_socket: std::net::UdpSocket = socket.into();
        let tokio_socket = UdpSocket::from_std(std_socket).map_err(|error| {
            Error::Socket(format!("Failed to convert to tokio socket: {}", error))
        })?;

        Ok(tokio_socket)
    }

    #[cfg(any(target_os = "linux", target_os = "android"))]
    fn bind_to_interface(socket: &Socket, interface: &str) -> Result<()> {
        socket.bind_device(Some(interface.as_bytes())).map_err(|error| {
            Error::Socket(format!(
                "Failed to set SO_BINDTODEVICE on {}: {}",
                interface, error
            ))
        })
    }

    #[cfg(not(any(target_os = "linux", target_os = "android")))]
    fn bind_to_interface(_socket: &Socket, interface: &str) -> Result<()> {
        warn!(
            "Binding to interface {} is only supported on Linux and will be ignored",
            interface
        );
        Ok(())
    }

    fn open_announcer(config: &Config) -> Option<ArpAnnouncer> {
        if !config.announce_arp {
            return None;
        }

        let Some(interface) = &config.interface else {
            warn!("No interface configured, gratuitous ARP disabled");
            return None;
        };

        match ArpAnnouncer::open(interface) {
            Ok(announcer) => Some(announcer),
            Err(error) => {
                warn!("Gratuitous ARP disabled: {}", error);
                None
            }
        }
    }

    /// Serves requests until the task is dropped.
    ///
    /// Per-packet failures are logged and never end the loop.
    pub async fn run(&mut self) -> Result<()> {
        let mut buffer = [0u8; RECV_BUFFER_SIZE];
        let mut reply_buffer = Vec::with_capacity(RECV_BUFFER_SIZE);

        info!("DHCP server ready and listening");

        loop {
            match self.socket.recv_from(&mut buffer).await {
                Ok((size, source)) => {
                    self.process(&buffer[..size], source, &mut reply_buffer)
                        .await;
                }
                Err(error) => {
                    error!("Error receiving packet: {}", error);
                }
            }
        }
    }

    /// Handles one datagram end to end: decode, resolve, reply, announce.
    ///
    /// The gratuitous ARP follows every reply that assigned an address, even
    /// when the reply could not be sent, since the lease is already bound.
    /// Returns whether a reply was sent.
    pub async fn process(
        &mut self,
        data: &[u8],
        source: SocketAddr,
        reply_buffer: &mut Vec<u8>,
    ) -> bool {
        let reply = match self.handler.handle(data) {
            Ok(Some(reply)) => reply,
            Ok(None) => return false,
            Err(Error::PoolExhausted) => {
                error!("Dynamic pool exhausted, refusing request from {}", source);
                return false;
            }
            Err(error) => {
                warn!("Dropping {} byte packet from {}: {}", data.len(), source, error);
                return false;
            }
        };

        reply.packet.encode_into(reply_buffer);
        let sent = match self
            .socket
            .send_to(&reply_buffer[..], self.reply_destination)
            .await
        {
            Ok(_) => true,
            Err(error) => {
                error!("Failed to send reply to {}: {}", reply.client_mac, error);
                false
            }
        };

        if let (Some(announcer), Some(offered_ip)) = (&self.announcer, reply.offered_ip) {
            announcer.announce(offered_ip, reply.client_mac);
        }

        sent
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn leases(&self) -> &LeaseStore {
        self.handler.leases()
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.socket.local_addr()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arp::tests::RecordingSender;
    use crate::config::ReservationEntry;
    use crate::options::{DHCP_MAGIC_COOKIE, DhcpOption, OptionCode};
    use crate::packet::{BOOTREPLY, HLEN_ETHERNET, HTYPE_ETHERNET};

    const MAC_1: [u8; 6] = [0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0x01];
    const MAC_2: [u8; 6] = [0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0x02];

    #[test]
    fn test_constants() {
        assert_eq!(DHCP_SERVER_PORT, 67);
        assert_eq!(DHCP_CLIENT_PORT, 68);
        assert_eq!(RECV_BUFFER_SIZE, 1500);
    }

    fn create_dhcp_packet(message_type: u8, mac: [u8; 6], xid: u32) -> Vec<u8> {
        let mut packet = vec![0u8; 300];

        packet[0] = BOOTREQUEST;
        packet[1] = HTYPE_ETHERNET;
        packet[2] = HLEN_ETHERNET;
        packet[4..8].copy_from_slice(&xid.to_be_bytes());
        packet[28..34].copy_from_slice(&mac);
        packet[236..240].copy_from_slice(&DHCP_MAGIC_COOKIE);
        packet[240] = OptionCode::MessageType as u8;
        packet[241] = 1;
        packet[242] = message_type;
        packet[243] = OptionCode::End as u8;
        packet
    }

    fn create_handler(config: &Config) -> PacketHandler {
        let mut leases = LeaseStore::from_config(config);
        leases.load_reservations(&[ReservationEntry {
            mac: "AA:BB:CC:DD:EE:02".to_string(),
            ip: "192.168.4.50".to_string(),
        }]);
        PacketHandler::new(config, leases)
    }

    fn handle(handler: &mut PacketHandler, message_type: MessageType, mac: [u8; 6]) -> Reply {
        let data = create_dhcp_packet(message_type as u8, mac, 0x12345678);
        handler.handle(&data).unwrap().unwrap()
    }

    #[test]
    fn test_reply_for_strict() {
        let policy = ReplyPolicy::Strict;
        assert_eq!(reply_for(policy, 1), Some(MessageType::Offer));
        assert_eq!(reply_for(policy, 3), Some(MessageType::Ack));
        assert_eq!(reply_for(policy, 8), Some(MessageType::Ack));
        for ignored in [2, 4, 5, 6, 7, 0, 9, 200] {
            assert_eq!(reply_for(policy, ignored), None, "type {}", ignored);
        }
    }

    #[test]
    fn test_reply_for_legacy() {
        let policy = ReplyPolicy::Legacy;
        assert_eq!(reply_for(policy, 1), Some(MessageType::Offer));
        for other in [0, 2, 3, 4, 5, 6, 7, 8, 9, 200] {
            assert_eq!(reply_for(policy, other), Some(MessageType::Ack), "type {}", other);
        }
    }

    #[test]
    fn test_discover_then_request() {
        let config = Config::default();
        let mut handler = create_handler(&config);

        let offer = handle(&mut handler, MessageType::Discover, MAC_1);
        assert_eq!(offer.offered_ip, Some(Ipv4Addr::new(192, 168, 4, 2)));
        assert_eq!(offer.packet.message_type(), Some(MessageType::Offer));
        assert_eq!(offer.packet.op, BOOTREPLY);
        assert_eq!(offer.packet.xid, 0x12345678);
        assert_eq!(offer.client_mac, MacAddr(MAC_1));

        let ack = handle(&mut handler, MessageType::Request, MAC_1);
        assert_eq!(ack.offered_ip, Some(Ipv4Addr::new(192, 168, 4, 2)));
        assert_eq!(ack.packet.message_type(), Some(MessageType::Ack));
        assert_eq!(ack.packet.yiaddr, Ipv4Addr::new(192, 168, 4, 2));
    }

    #[test]
    fn test_reserved_client_ignores_cursor() {
        let config = Config::default();
        let mut handler = create_handler(&config);

        for last in 0x10..0x14 {
            handle(&mut handler, MessageType::Discover, [0x02, 0, 0, 0, 0, last]);
        }

        let offer = handle(&mut handler, MessageType::Discover, MAC_2);
        assert_eq!(offer.offered_ip, Some(Ipv4Addr::new(192, 168, 4, 50)));
        let ack = handle(&mut handler, MessageType::Request, MAC_2);
        assert_eq!(ack.offered_ip, Some(Ipv4Addr::new(192, 168, 4, 50)));
        assert!(handler.leases().dynamic_lease_for(MacAddr(MAC_2)).is_none());
    }

    #[test]
    fn test_strict_policy_leaves_decline_and_release_unanswered() {
        let config = Config::default();
        let mut handler = create_handler(&config);
        handle(&mut handler, MessageType::Discover, MAC_1);

        for message_type in [MessageType::Decline, MessageType::Release, MessageType::Offer] {
            let data = create_dhcp_packet(message_type as u8, MAC_1, 1);
            assert!(handler.handle(&data).unwrap().is_none());
        }

        let data = create_dhcp_packet(MessageType::Decline as u8, [0x02, 0, 0, 0, 0, 9], 1);
        assert!(handler.handle(&data).unwrap().is_none());
        assert_eq!(handler.leases().dynamic_leases().len(), 1);

        let ack = handle(&mut handler, MessageType::Request, MAC_1);
        assert_eq!(ack.offered_ip, Some(Ipv4Addr::new(192, 168, 4, 2)));
    }

    #[test]
    fn test_strict_inform_gets_configuration_without_lease() {
        let config = Config::default();
        let mut handler = create_handler(&config);

        let inform = handle(&mut handler, MessageType::Inform, [0x02, 0, 0, 0, 0, 9]);
        assert_eq!(inform.offered_ip, None);
        assert_eq!(inform.packet.message_type(), Some(MessageType::Ack));
        assert_eq!(inform.packet.yiaddr, Ipv4Addr::UNSPECIFIED);
        assert!(inform.packet.options.iter().all(|option| !matches!(
            option,
            DhcpOption::LeaseTime(_) | DhcpOption::RenewalTime(_) | DhcpOption::RebindingTime(_)
        )));
        assert!(handler.leases().dynamic_leases().is_empty());

        let reserved = handle(&mut handler, MessageType::Inform, MAC_2);
        assert_eq!(reserved.packet.yiaddr, Ipv4Addr::UNSPECIFIED);

        let offer = handle(&mut handler, MessageType::Discover, MAC_1);
        assert_eq!(offer.offered_ip, Some(Ipv4Addr::new(192, 168, 4, 2)));
    }

    #[test]
    fn test_legacy_policy_acks_everything() {
        let config = Config {
            reply_policy: ReplyPolicy::Legacy,
            ..Config::default()
        };
        let mut handler = create_handler(&config);

        let data = create_dhcp_packet(MessageType::Release as u8, MAC_1, 1);
        let reply = handler.handle(&data).unwrap().unwrap();
        assert_eq!(reply.packet.message_type(), Some(MessageType::Ack));

        let data = create_dhcp_packet(42, MAC_1, 1);
        let reply = handler.handle(&data).unwrap().unwrap();
        assert_eq!(reply.packet.message_type(), Some(MessageType::Ack));
        assert_eq!(reply.offered_ip, Some(Ipv4Addr::new(192, 168, 4, 2)));
    }

    #[test]
    fn test_invalid_packets_dropped() {
        let config = Config::default();
        let mut handler = create_handler(&config);

        let data = create_dhcp_packet(MessageType::Discover as u8, MAC_1, 1);
        assert!(matches!(
            handler.handle(&data[..200]),
            Err(Error::InvalidPacket(_))
        ));

        let mut bad_cookie = data.clone();
        bad_cookie[236] = 0;
        assert!(matches!(
            handler.handle(&bad_cookie),
            Err(Error::InvalidPacket(_))
        ));

        let mut bootreply = data.clone();
        bootreply[0] = BOOTREPLY;
        assert!(matches!(
            handler.handle(&bootreply),
            Err(Error::InvalidPacket(_))
        ));

        assert!(handler.leases().dynamic_leases().is_empty());
    }

    #[test]
    fn test_pool_exhaustion_refuses_new_clients() {
        let config = Config {
            pool_end: Ipv4Addr::new(192, 168, 4, 3),
            ..Config::default()
        };
        let mut handler = create_handler(&config);

        handle(&mut handler, MessageType::Discover, [0x02, 0, 0, 0, 0, 1]);
        handle(&mut handler, MessageType::Discover, [0x02, 0, 0, 0, 0, 2]);

        let data = create_dhcp_packet(MessageType::Discover as u8, [0x02, 0, 0, 0, 0, 3], 1);
        assert!(matches!(handler.handle(&data), Err(Error::PoolExhausted)));

        let reserved = handle(&mut handler, MessageType::Discover, MAC_2);
        assert_eq!(reserved.offered_ip, Some(Ipv4Addr::new(192, 168, 4, 50)));
    }

    #[test]
    fn test_reply_advertises_configured_parameters() {
        let config = Config {
            dns_server: Ipv4Addr::new(1, 1, 1, 1),
            lease_duration_seconds: 7200,
            ..Config::default()
        };
        let mut handler = create_handler(&config);

        let offer = handle(&mut handler, MessageType::Discover, MAC_1);
        let encoded = offer.packet.encode();
        assert!(encoded.len() >= 300);
        assert!(encoded.windows(6).any(|w| w == [6, 4, 1, 1, 1, 1]));
        assert!(encoded.windows(6).any(|w| w == [51, 4, 0, 0, 0x1c, 0x20]));
    }

    async fn create_test_server(sender: RecordingSender) -> DhcpServer {
        let config = Config::default();
        let leases = LeaseStore::new(config.pool_start, config.pool_end);
        let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let announcer = ArpAnnouncer::new(Box::new(sender));
        DhcpServer::from_parts(config, leases, socket, Some(announcer))
    }

    #[tokio::test]
    async fn test_process_drops_garbage_without_announcing() {
        let sender = RecordingSender::default();
        let mut server = create_test_server(sender.clone()).await;
        let source: SocketAddr = "127.0.0.1:68".parse().unwrap();
        let mut reply_buffer = Vec::new();

        assert!(!server.process(&[0u8; 10], source, &mut reply_buffer).await);
        assert!(sender.frames.lock().unwrap().is_empty());
        assert!(server.leases().dynamic_leases().is_empty());
    }

    #[tokio::test]
    async fn test_process_sends_offer_then_announces() {
        let sender = RecordingSender::default();
        let mut server = create_test_server(sender.clone()).await;
        let receiver = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        server.reply_destination = receiver.local_addr().unwrap();
        let source: SocketAddr = "127.0.0.1:68".parse().unwrap();
        let mut reply_buffer = Vec::new();

        let data = create_dhcp_packet(MessageType::Discover as u8, MAC_1, 7);
        assert!(server.process(&data, source, &mut reply_buffer).await);

        let mut buffer = [0u8; RECV_BUFFER_SIZE];
        let (size, from) = tokio::time::timeout(
            std::time::Duration::from_secs(2),
            receiver.recv_from(&mut buffer),
        )
        .await
        .unwrap()
        .unwrap();
        assert_eq!(from, server.local_addr().unwrap());

        let offer = DhcpPacket::parse(&buffer[..size]).unwrap();
        assert_eq!(offer.op, BOOTREPLY);
        assert_eq!(offer.xid, 7);
        assert_eq!(offer.message_type(), Some(MessageType::Offer));
        assert_eq!(offer.yiaddr, Ipv4Addr::new(192, 168, 4, 2));

        let frames = sender.frames.lock().unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(&frames[0][28..32], &[192, 168, 4, 2]);
        assert_eq!(
            server.leases().dynamic_lease_for(MacAddr(MAC_1)).map(|l| l.ip),
            Some(Ipv4Addr::new(192, 168, 4, 2))
        );
    }

    #[tokio::test]
    async fn test_process_announces_even_when_send_fails() {
        let sender = RecordingSender::default();
        let mut server = create_test_server(sender.clone()).await;
        // An IPv6 destination on an IPv4 socket always fails to send.
        server.reply_destination = "[::1]:68".parse().unwrap();
        let source: SocketAddr = "127.0.0.1:68".parse().unwrap();
        let mut reply_buffer = Vec::new();

        let data = create_dhcp_packet(MessageType::Discover as u8, MAC_1, 7);
        assert!(!server.process(&data, source, &mut reply_buffer).await);

        let frames = sender.frames.lock().unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(&frames[0][28..32], &[192, 168, 4, 2]);
        assert!(server.leases().dynamic_lease_for(MacAddr(MAC_1)).is_some());
    }

    #[tokio::test]
    async fn test_process_inform_sends_ack_without_announcing() {
        let sender = RecordingSender::default();
        let mut server = create_test_server(sender.clone()).await;
        let receiver = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        server.reply_destination = receiver.local_addr().unwrap();
        let source: SocketAddr = "127.0.0.1:68".parse().unwrap();
        let mut reply_buffer = Vec::new();

        let data = create_dhcp_packet(MessageType::Inform as u8, MAC_1, 9);
        assert!(server.process(&data, source, &mut reply_buffer).await);

        let mut buffer = [0u8; RECV_BUFFER_SIZE];
        let (size, _) = tokio::time::timeout(
            std::time::Duration::from_secs(2),
            receiver.recv_from(&mut buffer),
        )
        .await
        .unwrap()
        .unwrap();
        let ack = DhcpPacket::parse(&buffer[..size]).unwrap();
        assert_eq!(ack.message_type(), Some(MessageType::Ack));
        assert_eq!(ack.yiaddr, Ipv4Addr::UNSPECIFIED);

        assert!(sender.frames.lock().unwrap().is_empty());
        assert!(server.leases().dynamic_leases().is_empty());
    }
}
