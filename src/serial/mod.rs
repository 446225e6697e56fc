//! Serial port access for the bridge
//!
//! This module provides:
//! - Opening a port with fixed line settings (8N1, no flow control)
//! - Splitting it into independent read and write halves
//! - Listing the ports present on the host

pub mod port;

pub use port::{PortConfig, SerialConnection};
