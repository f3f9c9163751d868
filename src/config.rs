//! Server configuration and the reservation file.
//!
//! Both are JSON. The server configuration is created with defaults if the
//! file is missing; the reservation file is optional and only read once at
//! startup.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::Ipv4Addr;
use std::path::Path;
use tracing::warn;

use crate::error::{Error, Result};
use crate::packet::ReplyParams;

/// How the server answers each DHCP message type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReplyPolicy {
    /// DISCOVER gets an OFFER and REQUEST gets an ACK. INFORM gets a
    /// configuration-only ACK with no address or lease. DECLINE and RELEASE
    /// are logged without a reply. Anything else is dropped.
    #[default]
    Strict,
    /// DISCOVER gets an OFFER; every other message type gets an ACK.
    Legacy,
}

impl fmt::Display for ReplyPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Strict => write!(f, "strict"),
            Self::Legacy => write!(f, "legacy"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Address of this server on the AP segment. Also advertised as router.
    pub server_ip: Ipv4Addr,
    pub subnet_mask: Ipv4Addr,
    pub dns_server: Ipv4Addr,
    /// First address handed out by the dynamic allocator.
    pub pool_start: Ipv4Addr,
    /// Last address the dynamic allocator may hand out.
    pub pool_end: Ipv4Addr,
    /// Advertised only. Leases never expire server-side.
    pub lease_duration_seconds: u32,
    /// AP interface name. Enables `SO_BINDTODEVICE` and gratuitous ARP.
    pub interface: Option<String>,
    pub reservations_file: String,
    pub reply_policy: ReplyPolicy,
    pub announce_arp: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_ip: Ipv4Addr::new(192, 168, 4, 1),
            subnet_mask: Ipv4Addr::new(255, 255, 255, 0),
            dns_server: Ipv4Addr::new(8, 8, 8, 8),
            pool_start: Ipv4Addr::new(192, 168, 4, 2),
            pool_end: Ipv4Addr::new(192, 168, 4, 254),
            lease_duration_seconds: 3600,
            interface: None,
            reservations_file: "reservations.json".to_string(),
            reply_policy: ReplyPolicy::Strict,
            announce_arp: true,
        }
    }
}

/// One reservation as written in the reservation file.
///
/// Both fields stay text so that a single bad entry can be skipped with a
/// warning instead of failing the whole file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservationEntry {
    pub mac: String,
    pub ip: String,
}

/// The reservation file: `{"reservations": [{"mac": "...", "ip": "..."}]}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservationFile {
    #[serde(default)]
    pub reservations: Vec<ReservationEntry>,
}

impl ReservationFile {
    /// Reads the reservation file at `path`.
    ///
    /// A missing file is not an error: it is logged and yields no entries.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            warn!(
                "Reservation file {} not found, continuing without reservations",
                path.display()
            );
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let file: ReservationFile = serde_json::from_str(&content)?;
        Ok(file)
    }
}

impl Config {
    pub fn load_or_create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Config = serde_json::from_str(&content)?;
            config.validate()?;
            Ok(config)
        } else {
            let config = Config::default();
            config.save(path)?;
            Ok(config)
        }
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        let start = u32::from(self.pool_start);
        let end = u32::from(self.pool_end);

        if start > end {
            return Err(Error::InvalidConfig(
                "pool_start must be less than or equal to pool_end".to_string(),
            ));
        }

        if self.ip_in_pool(self.server_ip) {
            return Err(Error::InvalidConfig(
                "server_ip must not be within the pool range".to_string(),
            ));
        }

        let mask = u32::from(self.subnet_mask);
        let network = u32::from(self.server_ip) & mask;
        if start & mask != network || end & mask != network {
            return Err(Error::InvalidConfig(format!(
                "pool {}-{} is outside the server subnet {}/{}",
                self.pool_start, self.pool_end, self.server_ip, self.subnet_mask
            )));
        }

        if self.lease_duration_seconds == 0 {
            return Err(Error::InvalidConfig(
                "lease_duration_seconds must be greater than 0".to_string(),
            ));
        }

        if let Some(interface) = &self.interface
            && interface.is_empty()
        {
            return Err(Error::InvalidConfig(
                "interface must not be an empty string".to_string(),
            ));
        }

        Ok(())
    }

    /// Loads the configured reservation file. See [`ReservationFile::load`].
    pub fn load_reservations(&self) -> Result<Vec<ReservationEntry>> {
        Ok(ReservationFile::load(&self.reservations_file)?.reservations)
    }

    /// Network parameters advertised in every reply.
    pub fn reply_params(&self) -> ReplyParams {
        ReplyParams {
            server_ip: self.server_ip,
            subnet_mask: self.subnet_mask,
            dns_server: self.dns_server,
            lease_seconds: self.lease_duration_seconds,
        }
    }

    pub fn ip_in_pool(&self, ip: Ipv4Addr) -> bool {
        let addr = u32::from(ip);
        let start = u32::from(self.pool_start);
        let end = u32::from(self.pool_end);
        addr >= start && addr <= end
    }

    pub fn pool_size(&self) -> u32 {
        u32::from(self.pool_end) - u32::from(self.pool_start) + 1
    }
}
