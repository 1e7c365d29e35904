//! Read-only SNMP monitoring client.
//!
//! Shells out to the standard net-snmp utilities (`snmpget`,
//! `snmpwalk`, `snmpbulkget`) and parses their line-oriented
//! `OID = TYPE: value` output. Two invariants are non-negotiable:
//!
//! - every operation confirms the required utilities exist before any
//!   network attempt, so a missing tool never costs a network timeout;
//! - [`SnmpClient::set`] is hard-blocked and never spawns a subprocess.
//!
//! The client keeps no connection state; each call stands alone and is
//! safe to run concurrently across different devices.

pub mod oids;

use std::fmt;
use std::process::Stdio;
use std::time::Duration;

use log::{debug, trace, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use tokio::process::Command;

use crate::error::SnmpError;
use crate::olt::OpticalReading;

/// Utilities every read path depends on.
const REQUIRED_TOOLS: [&str; 2] = ["snmpget", "snmpwalk"];

/// Utility used by `get_bulk`, with `walk` as fallback.
const BULK_TOOL: &str = "snmpbulkget";

/// SNMP v2c connection parameters for one device.
#[derive(Debug, Clone)]
pub struct SnmpConfig {
    /// Target host (hostname or IP address).
    pub host: String,

    /// SNMP port (default 161).
    pub port: u16,

    /// Read-only community string. Never logged.
    pub community: SecretString,

    /// Per-request timeout passed to the utility (default 5s).
    pub timeout: Duration,

    /// Retry count passed to the utility (default 3).
    pub retries: u32,

    /// ONU status table base; firmware-dependent, override as needed.
    pub onu_status_base: String,

    /// ONU RX power table base; firmware-dependent.
    pub onu_rx_power_base: String,

    /// ONU TX power table base; firmware-dependent.
    pub onu_tx_power_base: String,
}

impl SnmpConfig {
    /// Configuration with deployment defaults.
    pub fn new(host: impl Into<String>, community: SecretString) -> Self {
        Self {
            host: host.into(),
            port: 161,
            community,
            timeout: Duration::from_secs(5),
            retries: 3,
            onu_status_base: oids::ONU_STATUS_BASE.to_string(),
            onu_rx_power_base: oids::ONU_RX_POWER_BASE.to_string(),
            onu_tx_power_base: oids::ONU_TX_POWER_BASE.to_string(),
        }
    }

    fn agent_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// ONU operational status mapped from the device's numeric code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OnuStatus {
    Online,
    Offline,
    LowSignal,
    Unknown,
}

impl OnuStatus {
    /// Map the device's status code (1/2/3, anything else unknown).
    pub fn from_code(code: &str) -> Self {
        match code.trim() {
            "1" => OnuStatus::Online,
            "2" => OnuStatus::Offline,
            "3" => OnuStatus::LowSignal,
            _ => OnuStatus::Unknown,
        }
    }
}

impl fmt::Display for OnuStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OnuStatus::Online => "online",
            OnuStatus::Offline => "offline",
            OnuStatus::LowSignal => "low_signal",
            OnuStatus::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// Basic device identity read over SNMP.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SystemInfo {
    pub description: Option<String>,
    pub uptime: Option<String>,
    pub name: Option<String>,
}

/// Read-only SNMP client for one device.
pub struct SnmpClient {
    config: SnmpConfig,
}

impl SnmpClient {
    /// Create a client. No connection is made until a read is issued.
    pub fn new(config: SnmpConfig) -> Self {
        Self { config }
    }

    /// SNMP GET for one OID.
    pub async fn get(&self, oid: &str) -> Result<String, SnmpError> {
        tools_available(&REQUIRED_TOOLS)?;

        let output = self.run_tool("snmpget", oid, &[]).await?;

        if is_no_such(&output) {
            return Err(SnmpError::NoSuchObject {
                oid: oid.to_string(),
            });
        }

        Ok(parse_value(&output))
    }

    /// SNMP WALK from a base OID. Returns `(oid, value)` pairs in
    /// device order.
    pub async fn walk(&self, oid: &str) -> Result<Vec<(String, String)>, SnmpError> {
        tools_available(&REQUIRED_TOOLS)?;

        let output = self.run_tool("snmpwalk", oid, &[]).await?;
        Ok(parse_table(&output))
    }

    /// SNMP GETBULK from a base OID, falling back to [`walk`](Self::walk)
    /// when `snmpbulkget` is unavailable or the request fails.
    pub async fn get_bulk(
        &self,
        oid: &str,
        max_repetitions: u32,
    ) -> Result<Vec<(String, String)>, SnmpError> {
        tools_available(&REQUIRED_TOOLS)?;

        if tools_available(&[BULK_TOOL]).is_err() {
            debug!("{BULK_TOOL} not installed, falling back to walk");
            return self.walk(oid).await;
        }

        let extra = ["-Cr".to_string(), max_repetitions.to_string()];
        match self.run_tool(BULK_TOOL, oid, &extra).await {
            Ok(output) => Ok(parse_table(&output)),
            Err(e) => {
                warn!("{BULK_TOOL} failed ({e}), falling back to walk");
                self.walk(oid).await
            }
        }
    }

    /// Verify the community works by reading the system description.
    /// Tool availability is confirmed first; a missing tool fails here
    /// without a single network packet.
    pub async fn test_connection(&self) -> Result<(), SnmpError> {
        tools_available(&REQUIRED_TOOLS)?;
        self.get(oids::SYS_DESCR).await.map(|_| ())
    }

    /// Read sysDescr/sysUpTime/sysName; individual failures leave the
    /// field absent.
    pub async fn system_info(&self) -> Result<SystemInfo, SnmpError> {
        tools_available(&REQUIRED_TOOLS)?;

        Ok(SystemInfo {
            description: self.get(oids::SYS_DESCR).await.ok(),
            uptime: self.get(oids::SYS_UPTIME).await.ok(),
            name: self.get(oids::SYS_NAME).await.ok(),
        })
    }

    /// One ONU's optical power. The device reports tenths of a dBm;
    /// values are converted to dBm. Unreadable values leave the field
    /// absent rather than failing the read.
    pub async fn onu_optical_power(
        &self,
        pon_port: &str,
        onu_id: u32,
    ) -> Result<OpticalReading, SnmpError> {
        tools_available(&REQUIRED_TOOLS)?;

        let rx_oid = onu_oid(&self.config.onu_rx_power_base, pon_port, onu_id);
        let tx_oid = onu_oid(&self.config.onu_tx_power_base, pon_port, onu_id);

        let rx_power = match self.get(&rx_oid).await {
            Ok(raw) => dbm_from_tenths(&raw),
            Err(e) => {
                trace!("RX power read failed for {rx_oid}: {e}");
                None
            }
        };
        let tx_power = match self.get(&tx_oid).await {
            Ok(raw) => dbm_from_tenths(&raw),
            Err(e) => {
                trace!("TX power read failed for {tx_oid}: {e}");
                None
            }
        };

        Ok(OpticalReading { rx_power, tx_power })
    }

    /// One ONU's operational status, or `None` when the agent has no
    /// answer for it.
    pub async fn onu_status(
        &self,
        pon_port: &str,
        onu_id: u32,
    ) -> Result<Option<OnuStatus>, SnmpError> {
        tools_available(&REQUIRED_TOOLS)?;

        let oid = onu_oid(&self.config.onu_status_base, pon_port, onu_id);
        match self.get(&oid).await {
            Ok(code) => Ok(Some(OnuStatus::from_code(&code))),
            Err(e) => {
                trace!("Status read failed for {oid}: {e}");
                Ok(None)
            }
        }
    }

    /// SNMP SET - blocked.
    ///
    /// Write access is denied unconditionally: this always returns
    /// [`SnmpError::WriteBlocked`] and never invokes a subprocess, no
    /// matter the arguments. Monitoring credentials must never be able
    /// to change device state.
    pub fn set(&self, _oid: &str, _value: &str) -> Result<(), SnmpError> {
        Err(SnmpError::WriteBlocked)
    }

    async fn run_tool(
        &self,
        tool: &str,
        oid: &str,
        extra_args: &[String],
    ) -> Result<String, SnmpError> {
        let mut command = Command::new(tool);
        command
            .arg("-v")
            .arg("2c")
            .arg("-c")
            .arg(self.config.community.expose_secret())
            .arg("-t")
            .arg(self.config.timeout.as_secs().to_string())
            .arg("-r")
            .arg(self.config.retries.to_string())
            .args(extra_args)
            .arg(self.config.agent_addr())
            .arg(oid)
            .stdin(Stdio::null())
            .kill_on_drop(true);

        debug!("Running {tool} against {} for {oid}", self.config.agent_addr());

        // The utility applies its own timeout/retry budget; the outer
        // deadline only covers subprocess overhead.
        let budget = self.config.timeout * (self.config.retries + 1) + Duration::from_secs(5);

        let output = tokio::time::timeout(budget, command.output())
            .await
            .map_err(|_| SnmpError::Timeout)?
            .map_err(|e| SnmpError::Spawn {
                tool: tool.to_string(),
                source: e,
            })?;

        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
            let message = if !stderr.is_empty() {
                stderr
            } else if !stdout.is_empty() {
                stdout
            } else {
                "Unknown error".to_string()
            };
            Err(SnmpError::RequestFailed(message))
        }
    }
}

/// Confirm the named binaries are on PATH. Called before every network
/// attempt so a missing tool fails fast with an install hint instead of
/// timing out.
fn tools_available(tools: &[&str]) -> Result<(), SnmpError> {
    let missing: Vec<&str> = tools
        .iter()
        .copied()
        .filter(|tool| which::which(tool).is_err())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(SnmpError::ToolUnavailable {
            missing: missing.join(", "),
        })
    }
}

/// Per-ONU OID: base + slot.card.port + onu_id. Firmware-dependent
/// construction; see the module docs on [`oids`].
fn onu_oid(base: &str, pon_port: &str, onu_id: u32) -> String {
    format!("{base}.{}.{onu_id}", pon_port.replace('/', "."))
}

/// Tenths of a dBm to dBm.
fn dbm_from_tenths(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().map(|v| v / 10.0)
}

/// The agent answered, but with a not-found marker instead of a value.
fn is_no_such(output: &str) -> bool {
    output.contains("No Such") || output.to_lowercase().contains("nosuch")
}

/// Output value formats, strictest first; the first match wins.
static VALUE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r#"(?i)=\s*STRING:\s*["']?(.+?)["']?\s*$"#,
        r"(?i)=\s*INTEGER:\s*(-?\d+)",
        r"(?i)=\s*Gauge32:\s*(\d+)",
        r"(?i)=\s*Counter32:\s*(\d+)",
        r"(?i)=\s*Counter64:\s*(\d+)",
        r"(?i)=\s*Timeticks:\s*\((\d+)\)",
        r"(?i)=\s*IpAddress:\s*(.+)",
        r"(?i)=\s*OID:\s*(.+)",
        r"(?i)=\s*Hex-STRING:\s*(.+)",
        r#"=\s*"(.+)""#,
        r"=\s*(\S+)\s*$",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("builtin value pattern"))
    .collect()
});

/// Extract the value from one `OID = TYPE: value` line.
fn parse_value(line: &str) -> String {
    for pattern in VALUE_PATTERNS.iter() {
        if let Some(caps) = pattern.captures(line) {
            return caps[1].trim().to_string();
        }
    }

    // Unrecognized type: fall back to everything after the '='.
    match line.split_once('=') {
        Some((_, value)) => value.trim().to_string(),
        None => line.trim().to_string(),
    }
}

/// Parse multi-line walk/bulk output into `(oid, value)` pairs.
fn parse_table(output: &str) -> Vec<(String, String)> {
    output
        .lines()
        .filter_map(|line| {
            let line = line.trim();
            let (oid_part, _) = line.split_once('=')?;
            Some((oid_part.trim().to_string(), parse_value(line)))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_string_value() {
        assert_eq!(
            parse_value(r#"SNMPv2-MIB::sysDescr.0 = STRING: "ZTE ZXA10 C320""#),
            "ZTE ZXA10 C320"
        );
        assert_eq!(
            parse_value(r#"iso.3.6.1.2.1.1.1.0 = STRING: "ZTE ZXA10 C320""#),
            "ZTE ZXA10 C320"
        );
    }

    #[test]
    fn test_parse_numeric_values() {
        assert_eq!(parse_value("... = INTEGER: 1"), "1");
        assert_eq!(parse_value("... = INTEGER: -250"), "-250");
        assert_eq!(parse_value("... = Gauge32: 42"), "42");
        assert_eq!(parse_value("... = Counter32: 1000"), "1000");
        assert_eq!(parse_value("... = Counter64: 123456789"), "123456789");
        assert_eq!(
            parse_value("... = Timeticks: (12345) 0:02:03.45"),
            "12345"
        );
    }

    #[test]
    fn test_parse_address_and_oid_values() {
        assert_eq!(parse_value("... = IpAddress: 10.0.0.1"), "10.0.0.1");
        assert_eq!(
            parse_value("... = OID: iso.3.6.1.4.1.3902"),
            "iso.3.6.1.4.1.3902"
        );
        assert_eq!(parse_value("... = Hex-STRING: AB CD EF"), "AB CD EF");
    }

    #[test]
    fn test_parse_unrecognized_falls_back_to_after_equals() {
        assert_eq!(parse_value("... = Opaque: something odd"), "Opaque: something odd");
    }

    #[test]
    fn test_parse_table() {
        let output = "\
iso.3.6.1.2.1.2.2.1.2.1 = STRING: \"gpon-olt_1/1/1\"
iso.3.6.1.2.1.2.2.1.2.2 = STRING: \"gpon-olt_1/1/2\"
";
        let rows = parse_table(output);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].0, "iso.3.6.1.2.1.2.2.1.2.1");
        assert_eq!(rows[1].1, "gpon-olt_1/1/2");
    }

    #[test]
    fn test_no_such_markers() {
        assert!(is_no_such("iso.3.6.1.9.9.9.0 = No Such Object available on this agent at this OID"));
        assert!(is_no_such("noSuchInstance"));
        assert!(!is_no_such("... = INTEGER: 1"));
    }

    #[test]
    fn test_status_code_mapping() {
        assert_eq!(OnuStatus::from_code("1"), OnuStatus::Online);
        assert_eq!(OnuStatus::from_code("2"), OnuStatus::Offline);
        assert_eq!(OnuStatus::from_code("3"), OnuStatus::LowSignal);
        assert_eq!(OnuStatus::from_code("17"), OnuStatus::Unknown);
        assert_eq!(OnuStatus::from_code(""), OnuStatus::Unknown);
        assert_eq!(OnuStatus::Online.to_string(), "online");
        assert_eq!(OnuStatus::LowSignal.to_string(), "low_signal");
    }

    #[test]
    fn test_power_conversion_from_tenths() {
        assert_eq!(dbm_from_tenths("-250"), Some(-25.0));
        assert_eq!(dbm_from_tenths("21"), Some(2.1));
        assert_eq!(dbm_from_tenths("not-a-number"), None);
    }

    #[test]
    fn test_onu_oid_construction() {
        assert_eq!(
            onu_oid("1.3.6.1.4.1.3902.1012.3.28.1.1.1", "1/2/3", 4),
            "1.3.6.1.4.1.3902.1012.3.28.1.1.1.1.2.3.4"
        );
    }

    #[test]
    fn test_missing_tool_fails_without_spawning() {
        let err = tools_available(&["ponctl-definitely-missing-tool"]).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("ponctl-definitely-missing-tool"));
        assert!(message.contains("install"));
    }

    #[test]
    fn test_set_is_always_blocked() {
        let client = SnmpClient::new(SnmpConfig::new(
            "10.0.0.1",
            SecretString::from("public"),
        ));

        for (oid, value) in [
            ("1.3.6.1.2.1.1.5.0", "new-name"),
            ("", ""),
            ("1.3.6.1.4.1.3902", "1"),
        ] {
            let err = client.set(oid, value).unwrap_err();
            assert!(matches!(err, SnmpError::WriteBlocked));
            assert!(err.to_string().contains("not allowed"));
        }
    }

    #[test]
    fn test_config_defaults() {
        let config = SnmpConfig::new("10.0.0.1", SecretString::from("public"));
        assert_eq!(config.port, 161);
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.retries, 3);
        assert_eq!(config.agent_addr(), "10.0.0.1:161");
    }
}
