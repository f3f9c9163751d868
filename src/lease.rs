//! MAC-keyed address leases.
//!
//! Two bounded tables answer one question, "which address is this MAC
//! entitled to":
//!
//! - Reservations: fixed MAC → IP bindings loaded once at startup
//! - Dynamic leases: bindings minted on first contact from a monotonically
//!   increasing cursor that starts at `pool_start`
//!
//! Leases never expire. Once a dynamic address is minted for a MAC it stays
//! bound to that MAC for the life of the process, so the table can fill up;
//! after that every new MAC is refused with [`Error::PoolExhausted`].
//!
//! # Ownership
//!
//! [`LeaseStore`] is a plain value owned by the server loop and mutated only
//! through `&mut self`; there is no interior locking.

use std::net::Ipv4Addr;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::config::{Config, ReservationEntry};
use crate::error::{Error, Result};
use crate::mac::MacAddr;

/// Maximum number of static reservations.
pub const MAX_RESERVATIONS: usize = 10;

/// Maximum number of dynamic leases held at once.
pub const MAX_DYNAMIC_LEASES: usize = 32;

/// A fixed MAC → IP binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reservation {
    pub mac: MacAddr,
    pub ip: Ipv4Addr,
}

impl Reservation {
    /// Parses a reservation from its text form.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidReservation`] if the MAC is not in strict
    /// `xx:xx:xx:xx:xx:xx` form or the IP is not a dotted quad.
    pub fn from_entry(entry: &ReservationEntry) -> Result<Self> {
        let mac = entry.mac.trim().parse::<MacAddr>()?;
        let ip = entry.ip.trim().parse::<Ipv4Addr>().map_err(|_| {
            Error::InvalidReservation(format!("invalid IPv4 address '{}'", entry.ip))
        })?;
        Ok(Self { mac, ip })
    }
}

/// A MAC → IP binding minted from the dynamic pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DynamicLease {
    pub mac: MacAddr,
    pub ip: Ipv4Addr,

    /// When the address was minted (UTC).
    pub assigned_at: DateTime<Utc>,

    /// When the client last resolved this lease (UTC).
    pub last_seen: DateTime<Utc>,
}

/// The reservation table, the dynamic lease table and the allocation cursor.
#[derive(Debug, Clone)]
pub struct LeaseStore {
    reservations: Vec<Reservation>,
    dynamic: Vec<DynamicLease>,
    /// Next address to mint, held wide so advancing past 255.255.255.255
    /// cannot wrap.
    cursor: u64,
    pool_end: u32,
    /// Server address and subnet mask that reservations must fit.
    subnet: Option<(Ipv4Addr, Ipv4Addr)>,
}

impl LeaseStore {
    /// Creates an empty store whose cursor starts at `pool_start`.
    ///
    /// Addresses past `pool_end` are never minted.
    pub fn new(pool_start: Ipv4Addr, pool_end: Ipv4Addr) -> Self {
        Self {
            reservations: Vec::with_capacity(MAX_RESERVATIONS),
            dynamic: Vec::with_capacity(MAX_DYNAMIC_LEASES),
            cursor: u32::from(pool_start) as u64,
            pool_end: u32::from(pool_end),
            subnet: None,
        }
    }

    /// Creates an empty store for `config`'s pool that only accepts
    /// reservations inside the server's subnet.
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.pool_start, config.pool_end)
            .with_subnet(config.server_ip, config.subnet_mask)
    }

    /// Restricts future reservations to usable host addresses in the subnet
    /// of `server_ip`, excluding `server_ip` itself.
    pub fn with_subnet(mut self, server_ip: Ipv4Addr, subnet_mask: Ipv4Addr) -> Self {
        self.subnet = Some((server_ip, subnet_mask));
        self
    }

    fn check_reservation_address(&self, ip: Ipv4Addr) -> Result<()> {
        let Some((server_ip, subnet_mask)) = self.subnet else {
            return Ok(());
        };

        if ip == server_ip {
            return Err(Error::InvalidReservation(format!(
                "{} is the server address",
                ip
            )));
        }

        let mask = u32::from(subnet_mask);
        let network = u32::from(server_ip) & mask;
        let address = u32::from(ip);
        if address & mask != network {
            return Err(Error::InvalidReservation(format!(
                "{} is outside {}/{}",
                ip,
                Ipv4Addr::from(network),
                subnet_mask
            )));
        }

        // /31 and /32 have no network or broadcast address to avoid.
        if mask.count_ones() <= 30 && (address == network || address == network | !mask) {
            return Err(Error::InvalidReservation(format!(
                "{} is the network or broadcast address",
                ip
            )));
        }

        Ok(())
    }

    /// Loads reservation entries into the table.
    ///
    /// Malformed entries are skipped with a warning, as are addresses that
    /// fail the subnet check set by [`with_subnet`](Self::with_subnet). A MAC
    /// that appears more
    /// than once keeps the address of its last entry. Once the table holds
    /// [`MAX_RESERVATIONS`] distinct MACs, further new MACs are dropped.
    ///
    /// Returns the number of entries accepted, counting replacements.
    pub fn load_reservations(&mut self, entries: &[ReservationEntry]) -> usize {
        let mut accepted = 0;

        for entry in entries {
            let reservation = match Reservation::from_entry(entry).and_then(|reservation| {
                self.check_reservation_address(reservation.ip)?;
                Ok(reservation)
            }) {
                Ok(reservation) => reservation,
                Err(error) => {
                    warn!("Skipping reservation: {}", error);
                    continue;
                }
            };

            if let Some(existing) = self
                .reservations
                .iter_mut()
                .find(|existing| existing.mac == reservation.mac)
            {
                warn!(
                    "Duplicate reservation for {}: {} replaces {}",
                    reservation.mac, reservation.ip, existing.ip
                );
                existing.ip = reservation.ip;
                accepted += 1;
                continue;
            }

            if self.reservations.len() >= MAX_RESERVATIONS {
                warn!(
                    "Reservation table full ({} entries), dropping {} -> {}",
                    MAX_RESERVATIONS, reservation.mac, reservation.ip
                );
                continue;
            }

            self.reservations.push(reservation);
            accepted += 1;
        }

        accepted
    }

    /// Resolves the address `mac` is entitled to.
    ///
    /// # Resolution Order
    ///
    /// 1. A reservation for this MAC
    /// 2. An existing dynamic lease for this MAC
    /// 3. A new lease minted from the cursor into the first free slot
    ///
    /// Minting skips any address held by a reservation.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PoolExhausted`] if every dynamic slot is taken or the
    /// cursor has passed `pool_end`. The store is unchanged in that case.
    pub fn resolve(&mut self, mac: MacAddr) -> Result<Ipv4Addr> {
        if let Some(reservation) = self.reservation_for(mac) {
            return Ok(reservation.ip);
        }

        let now = Utc::now();

        if let Some(lease) = self.dynamic.iter_mut().find(|lease| lease.mac == mac) {
            lease.last_seen = now;
            return Ok(lease.ip);
        }

        if self.dynamic.len() >= MAX_DYNAMIC_LEASES {
            return Err(Error::PoolExhausted);
        }

        let ip = self.next_dynamic().ok_or(Error::PoolExhausted)?;
        self.cursor = u32::from(ip) as u64 + 1;
        self.dynamic.push(DynamicLease {
            mac,
            ip,
            assigned_at: now,
            last_seen: now,
        });

        debug!("Minted dynamic lease {} for {}", ip, mac);
        Ok(ip)
    }

    /// The address the next mint would hand out, or `None` if the pool is
    /// used up.
    pub fn next_dynamic(&self) -> Option<Ipv4Addr> {
        let mut candidate = self.cursor;
        while candidate <= self.pool_end as u64 {
            let ip = Ipv4Addr::from(candidate as u32);
            if !self.is_reserved(ip) {
                return Some(ip);
            }
            candidate += 1;
        }
        None
    }

    pub fn reservation_for(&self, mac: MacAddr) -> Option<&Reservation> {
        self.reservations.iter().find(|r| r.mac == mac)
    }

    pub fn dynamic_lease_for(&self, mac: MacAddr) -> Option<&DynamicLease> {
        self.dynamic.iter().find(|lease| lease.mac == mac)
    }

    pub fn reservations(&self) -> &[Reservation] {
        &self.reservations
    }

    /// Dynamic leases in the order they were minted.
    pub fn dynamic_leases(&self) -> &[DynamicLease] {
        &self.dynamic
    }

    /// Number of dynamic slots still free.
    pub fn free_slot_count(&self) -> usize {
        MAX_DYNAMIC_LEASES - self.dynamic.len()
    }

    fn is_reserved(&self, ip: Ipv4Addr) -> bool {
        self.reservations.iter().any(|r| r.ip == ip)
    }
}
