// SPDX-License-Identifier: MIT

//! Prelude module for convenient imports
//!
//! Re-exports the types most users of the library need:
//!
//! ```rust
//! use cloudconfig_server::prelude::*;
//! ```

// Core types
pub use crate::config::Config;
pub use crate::error::{AppError, Result};

// Cache and resolution
pub use crate::arp::{ArpTable, MacResolver};
pub use crate::cache::ServerCache;

// CloudControl client and records
pub use crate::compute::{ComputeClient, Server, ServerInventory, ServerPage, Vlan};
