//! Error types for the DHCP server.
//!
//! All fallible operations in this crate return [`Result<T>`], which uses
//! the [`Error`] enum for error variants.

/// Errors that can occur during DHCP server operation.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// File system or network I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error (config or reservation files).
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Malformed DHCP packet received.
    ///
    /// This includes packets shorter than the fixed header, a missing magic
    /// cookie, a missing message type, or an option that overruns the buffer.
    #[error("Invalid DHCP packet: {0}")]
    InvalidPacket(String),

    /// The dynamic lease table is full or the cursor ran past `pool_end`.
    ///
    /// Leases are never reclaimed while the process runs, so this persists
    /// until restart.
    #[error("No available IP addresses in dynamic pool")]
    PoolExhausted,

    /// Invalid server configuration.
    ///
    /// Returned by [`Config::validate`](crate::Config::validate) when the
    /// configuration contains invalid values (e.g., pool_start > pool_end).
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A reservation entry whose MAC or IP text could not be parsed.
    #[error("Invalid reservation: {0}")]
    InvalidReservation(String),

    /// Socket creation or configuration error.
    ///
    /// Typically occurs when binding to port 67 without the required
    /// privileges, or when the configured interface doesn't exist.
    #[error("Socket error: {0}")]
    Socket(String),
}

/// A specialized Result type for DHCP operations.
pub type Result<T> = std::result::Result<T, Error>;
