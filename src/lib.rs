//! # apdhcpd
//!
//! A minimal DHCP server (RFC 2131/2132 subset) for an access-point gateway.
//!
//! ## Features
//!
//! - DISCOVER → OFFER and REQUEST → ACK with a fixed, RFC-conformant option set
//! - INFORM answered with configuration only, without consuming a lease
//! - Static MAC reservations loaded from a JSON file
//! - Dynamic leases minted from a monotonically increasing cursor
//! - Gratuitous ARP for every assigned address (Linux `AF_PACKET`)
//! - Async/await with Tokio, single task, no locks
//!
//! Leases are never expired or persisted; the advertised lease time is
//! cosmetic and every binding lasts until the process exits.
//!
//! ## Quick Start
//!
//! ```no_run
//! use apdhcpd::{Config, DhcpServer};
//!
//! #[tokio::main]
//! async fn main() -> apdhcpd::Result<()> {
//!     let config = Config::load_or_create("config.json")?;
//!     let mut server = DhcpServer::new(config)?;
//!     server.run().await
//! }
//! ```
//!
//! ## Architecture
//!
//! - [`options`] - Bounds-checked option TLV walk and typed options
//! - [`LeaseStore`] - Reservations plus the dynamic lease table
//! - [`DhcpPacket`] - Request parsing and reply encoding
//! - [`ArpAnnouncer`] - Gratuitous ARP on the AP link
//! - [`DhcpServer`] - The UDP port 67 receive/reply loop
//! - [`Config`] - Server configuration and the reservation file

pub mod arp;
pub mod config;
pub mod error;
pub mod lease;
pub mod mac;
pub mod options;
pub mod packet;
pub mod server;

pub use arp::{ArpAnnouncer, LinkSender};
pub use config::{Config, ReplyPolicy};
pub use error::{Error, Result};
pub use lease::{DynamicLease, LeaseStore, Reservation};
pub use mac::MacAddr;
pub use options::{DhcpOption, MessageType};
pub use packet::{DhcpPacket, ReplyParams};
pub use server::DhcpServer;
