//! SNMP OID constants for OLT monitoring.

/// MIB-II system description.
pub const SYS_DESCR: &str = "1.3.6.1.2.1.1.1.0";

/// MIB-II system uptime.
pub const SYS_UPTIME: &str = "1.3.6.1.2.1.1.3.0";

/// MIB-II system name.
pub const SYS_NAME: &str = "1.3.6.1.2.1.1.5.0";

/// ZTE enterprise OID base.
pub const ZTE_BASE: &str = "1.3.6.1.4.1.3902";

// ONU OID bases below are firmware-version-dependent: the per-ONU
// address is built by appending slot.card.port.onu_id, a construction
// observed in the field but not guaranteed by the vendor. They are
// defaults on [`SnmpConfig`](super::SnmpConfig), not fixed addresses.

/// ONU operational status table base.
pub const ONU_STATUS_BASE: &str = "1.3.6.1.4.1.3902.1012.3.28.1.1.1";

/// ONU receive power table base (tenths of a dBm).
pub const ONU_RX_POWER_BASE: &str = "1.3.6.1.4.1.3902.1012.3.50.12.1.1.10";

/// ONU transmit power table base (tenths of a dBm).
pub const ONU_TX_POWER_BASE: &str = "1.3.6.1.4.1.3902.1012.3.50.12.1.1.11";

/// PON port status table base.
pub const PON_PORT_STATUS: &str = "1.3.6.1.4.1.3902.1012.3.28.1.1.2";

/// Registered-ONU count per PON port.
pub const PON_PORT_ONU_COUNT: &str = "1.3.6.1.4.1.3902.1012.3.28.1.1.5";

/// MIB-II interface description table.
pub const IF_DESCR: &str = "1.3.6.1.2.1.2.2.1.2";

/// MIB-II interface operational status table.
pub const IF_OPER_STATUS: &str = "1.3.6.1.2.1.2.2.1.8";

/// MIB-II interface inbound octet counters.
pub const IF_IN_OCTETS: &str = "1.3.6.1.2.1.2.2.1.10";

/// MIB-II interface outbound octet counters.
pub const IF_OUT_OCTETS: &str = "1.3.6.1.2.1.2.2.1.16";
