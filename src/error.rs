//! Error types for the cloud-config server

use std::net::IpAddr;

use thiserror::Error;

/// Main application error type
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration error (fatal at startup)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Network or IO error
    #[error("IO error")]
    Io(#[from] std::io::Error),

    /// CloudControl inventory listing failed
    #[error("Inventory error: {0}")]
    Inventory(String),

    /// Transport-level failure talking to the CloudControl API
    #[error("HTTP request error")]
    Http(#[from] reqwest::Error),

    /// No MAC address known for the client IP
    #[error("No MAC address found for IP address {0}")]
    Resolution(IpAddr),

    /// MAC address is not in the server metadata cache
    #[error("No server found with MAC address {0}")]
    LookupMiss(String),

    /// Cloud-config document could not be rendered
    #[error("Render error: {0}")]
    Render(String),

    /// Address parsing error
    #[error("Address parse error")]
    AddrParse(#[from] std::net::AddrParseError),
}

/// Convenient alias for Result with application error
pub type Result<T> = std::result::Result<T, AppError>;
