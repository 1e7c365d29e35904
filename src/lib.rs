//! # Ponctl
//!
//! Async automation library for ZTE GPON OLTs.
//!
//! Ponctl drives the vendor CLI over SSH or Telnet with prompt-synchronized
//! command execution, and reads device state over SNMP. It covers the
//! everyday ONU lifecycle: discover unconfigured ONUs, register them with a
//! service profile, read optical power, and delete them again.
//!
//! ## Features
//!
//! - Async SSH connections via russh, plus a minimal Telnet fallback
//! - Model adapters for the ZXA10 C300 and C320 with a string-keyed factory
//! - Prompt-pattern read loop with echo stripping and in-band error detection
//! - Stop-on-first-failure command sequences for safe provisioning
//! - Read-only SNMP monitoring via the net-snmp command line tools
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use ponctl::{OltBuilder, OltType};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), ponctl::Error> {
//!     let mut olt = OltBuilder::new("192.168.1.1")
//!         .username("admin")
//!         .password("secret")
//!         .olt_type(OltType::ZteC320)
//!         .build()?;
//!
//!     olt.open().await?;
//!
//!     let onus = olt.discover().await?;
//!     for onu in &onus {
//!         println!("{} {} {}", onu.pon_port, onu.serial_number, onu.onu_type);
//!     }
//!
//!     olt.close().await;
//!     Ok(())
//! }
//! ```

pub mod channel;
pub mod error;
pub mod olt;
pub mod session;
pub mod snmp;
pub mod transport;

// Re-export main types for convenience
pub use error::{
    CommandError, Error, FactoryError, ParseError, Result, SessionError, SnmpError,
    TransportError,
};
pub use olt::{
    adapter_for, supported_types, DiscoveredOnu, OltBuilder, OltDriver, OltModel, OltType,
    OpticalReading, ProvisionRequest,
};
pub use session::{CliSession, CommandResult, SessionState};
pub use snmp::{OnuStatus, SnmpClient, SnmpConfig, SystemInfo};
pub use transport::{SessionConfig, TransportKind};
