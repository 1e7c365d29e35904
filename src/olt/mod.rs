//! Vendor adapters for GPON OLT models.
//!
//! An [`OltModel`] supplies the per-model capability set: model
//! identity, command synthesis, and output parsing. An [`OltDriver`]
//! binds one model to one [`CliSession`] and exposes the
//! discovery/provisioning/deletion operations collaborators call.

mod builder;
mod factory;
pub mod models;

pub use builder::OltBuilder;
pub use factory::{OltType, adapter_for, supported_types};

use indexmap::IndexMap;
use log::{debug, info};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{CommandError, ParseError, Result};
use crate::session::CliSession;
use crate::transport::SessionConfig;

/// An unconfigured ONU reported by the OLT during discovery.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiscoveredOnu {
    /// PON port as "slot/card/port".
    pub pon_port: String,

    /// ONU slot on that port.
    pub onu_id: u32,

    /// Vendor serial number as printed by the OLT.
    pub serial_number: String,

    /// Vendor type guessed from the serial-number prefix.
    pub onu_type: String,

    /// Raw status column ("initial", "unknown", ...).
    pub status: String,
}

/// Caller-supplied parameters for registering an ONU.
///
/// Validation (well-formed port, profile existence) happens in the
/// collaborator layer before the request reaches the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvisionRequest {
    pub pon_port: String,
    pub onu_id: u32,
    pub serial_number: String,
    /// Display name; spaces become underscores, capped at 32 chars.
    /// Empty skips the name step.
    pub name: String,
    pub line_profile: String,
    pub service_profile: String,
    pub vlan: u16,
    /// Explicit service-port id; the fixed default is used when absent.
    pub service_port: Option<u32>,
}

/// Optical power levels in dBm.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct OpticalReading {
    pub rx_power: Option<f64>,
    pub tx_power: Option<f64>,
}

/// Per-model capability set.
///
/// Implementations are stateless command/parse tables; everything
/// touching the wire lives in [`OltDriver`].
pub trait OltModel: Send + Sync {
    /// Human-readable model name.
    fn model_name(&self) -> &'static str;

    /// Command listing unconfigured ONUs.
    fn discovery_command(&self) -> &'static str;

    /// Serial-number-prefix to vendor-type table, in match order.
    fn serial_prefixes(&self) -> &'static IndexMap<&'static str, &'static str>;

    /// Command sequence registering an ONU. Order is semantically
    /// significant: the CLI nests configuration modes.
    fn register_commands(&self, request: &ProvisionRequest) -> Vec<String>;

    /// Command sequence removing an ONU binding.
    fn delete_commands(&self, pon_port: &str, onu_id: u32) -> Vec<String>;

    /// Parse the discovery table output.
    fn parse_unconfigured(&self, output: &str) -> std::result::Result<Vec<DiscoveredOnu>, ParseError> {
        parse_discovery_lines(output, self.serial_prefixes())
    }

    /// Parse one ONU's optical power out of the port-wide optical-info
    /// output. Firmware output format varies per model.
    fn parse_optical_power(
        &self,
        output: &str,
        onu_id: u32,
    ) -> std::result::Result<OpticalReading, ParseError>;

    /// Command showing optical power for a whole PON port.
    fn optical_info_command(&self, pon_port: &str) -> String {
        format!("show gpon onu optical-info gpon-olt_{pon_port}")
    }

    /// Command showing ONU states for a whole PON port.
    fn onu_state_command(&self, pon_port: &str) -> String {
        format!("show gpon onu state gpon-olt_{pon_port}")
    }

    /// Command showing one ONU's detail page.
    fn onu_detail_command(&self, pon_port: &str, onu_id: u32) -> String {
        format!("show gpon onu detail-info gpon-onu_{pon_port}:{onu_id}")
    }
}

/// Discovery line grammar shared by the ZXA10 family:
/// `gpon-onu_<slot>/<card>/<port>:<onu_id>  <serial>  <status>`.
static DISCOVERY_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"gpon-onu_(\d+/\d+/\d+):(\d+)\s+(\S+)\s+(\S+)").unwrap());

/// Parse every discovery line in document order. Zero matches is a
/// legitimate empty table, not a parse failure.
pub(crate) fn parse_discovery_lines(
    output: &str,
    prefixes: &IndexMap<&'static str, &'static str>,
) -> std::result::Result<Vec<DiscoveredOnu>, ParseError> {
    let mut onus = Vec::new();

    for caps in DISCOVERY_LINE.captures_iter(output) {
        let onu_id: u32 = caps[2].parse().map_err(|_| ParseError::Discovery {
            line: caps[0].to_string(),
        })?;
        let serial_number = caps[3].to_string();
        let onu_type = detect_onu_type(&serial_number, prefixes);

        onus.push(DiscoveredOnu {
            pon_port: caps[1].to_string(),
            onu_id,
            serial_number,
            onu_type,
            status: caps[4].to_string(),
        });
    }

    Ok(onus)
}

/// Vendor type from the serial-number prefix; first match wins.
fn detect_onu_type(serial: &str, prefixes: &IndexMap<&'static str, &'static str>) -> String {
    let upper = serial.to_uppercase();
    prefixes
        .iter()
        .find(|(prefix, _)| upper.starts_with(**prefix))
        .map(|(_, onu_type)| (*onu_type).to_string())
        .unwrap_or_else(|| "Unknown".to_string())
}

/// One OLT adapter: a CLI session bound to a model's capability set.
///
/// Owned by exactly one unit of work at a time; commands on the same
/// driver must be serialized by the caller.
pub struct OltDriver {
    session: CliSession,
    model: Box<dyn OltModel>,
}

impl std::fmt::Debug for OltDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OltDriver")
            .field("model", &self.model.model_name())
            .finish_non_exhaustive()
    }
}

impl OltDriver {
    /// Create a driver in the disconnected state.
    pub fn new(config: SessionConfig, model: Box<dyn OltModel>) -> Self {
        Self {
            session: CliSession::new(config),
            model,
        }
    }

    /// The bound model's display name.
    pub fn model_name(&self) -> &'static str {
        self.model.model_name()
    }

    /// The underlying session (state inspection only).
    pub fn session(&self) -> &CliSession {
        &self.session
    }

    /// Acquire the transport session. Fatal failures (auth rejected,
    /// transport error, connect timeout) are returned as errors.
    pub async fn open(&mut self) -> Result<()> {
        self.session.connect().await
    }

    /// Release the transport session. Idempotent, safe in any state.
    pub async fn close(&mut self) {
        self.session.disconnect().await;
    }

    /// Open, run `op`, and close on every path, including when `op`
    /// errors. The scoped-acquisition contract in helper form.
    ///
    /// ```rust,no_run
    /// # async fn example(mut driver: ponctl::OltDriver) -> ponctl::Result<()> {
    /// let onus = driver
    ///     .run_scoped(async |olt| olt.discover().await)
    ///     .await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn run_scoped<T, F>(&mut self, op: F) -> Result<T>
    where
        F: AsyncFnOnce(&mut OltDriver) -> Result<T>,
    {
        self.open().await?;
        let outcome = op(self).await;
        self.close().await;
        outcome
    }

    /// List unconfigured ONUs waiting on the OLT's PON ports.
    ///
    /// Command failure and parse failure are distinct errors so callers
    /// can tell "device said no" from "output not understood".
    pub async fn discover(&mut self) -> Result<Vec<DiscoveredOnu>> {
        let result = self.session.execute(self.model.discovery_command()).await;
        if !result.success {
            return Err(command_failed(result.error));
        }

        let onus = self.model.parse_unconfigured(&result.output)?;
        debug!("Discovered {} unconfigured ONU(s)", onus.len());
        Ok(onus)
    }

    /// Register an ONU. Stops at the first failing step; the error
    /// names the 1-based step index and the raw device message. There
    /// is no rollback, so a reported failure may leave the sequence
    /// partially applied.
    pub async fn register(&mut self, request: &ProvisionRequest) -> Result<()> {
        info!(
            "Registering ONU {} (sn {}) on gpon-olt_{}",
            request.onu_id, request.serial_number, request.pon_port
        );
        let commands = self.model.register_commands(request);
        self.run_sequence(&commands).await
    }

    /// Remove an ONU binding. Same stop-on-first-failure contract as
    /// [`register`](Self::register).
    pub async fn delete(&mut self, pon_port: &str, onu_id: u32) -> Result<()> {
        info!("Deleting ONU {onu_id} on gpon-olt_{pon_port}");
        let commands = self.model.delete_commands(pon_port, onu_id);
        self.run_sequence(&commands).await
    }

    /// Read one ONU's optical power over the CLI.
    pub async fn optical_power(&mut self, pon_port: &str, onu_id: u32) -> Result<OpticalReading> {
        let command = self.model.optical_info_command(pon_port);
        let result = self.session.execute(&command).await;
        if !result.success {
            return Err(command_failed(result.error));
        }

        Ok(self.model.parse_optical_power(&result.output, onu_id)?)
    }

    /// Validate stored credentials: open, run one harmless command,
    /// close. The session is released on every path.
    pub async fn test_connection(&mut self) -> Result<()> {
        if let Err(e) = self.open().await {
            self.close().await;
            return Err(e);
        }

        let result = self.session.execute("show version").await;
        self.close().await;

        if result.success {
            Ok(())
        } else {
            Err(command_failed(result.error))
        }
    }

    async fn run_sequence(&mut self, commands: &[String]) -> Result<()> {
        let results = self.session.execute_sequence(commands).await;

        if let Some((idx, failed)) = results.iter().enumerate().find(|(_, r)| !r.success) {
            return Err(CommandError::StepFailed {
                step: idx + 1,
                message: failed
                    .error
                    .clone()
                    .unwrap_or_else(|| "command failed".to_string()),
            }
            .into());
        }

        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn for_testing(session: CliSession, model: Box<dyn OltModel>) -> Self {
        Self { session, model }
    }
}

fn command_failed(error: Option<String>) -> crate::error::Error {
    CommandError::Failed {
        message: error.unwrap_or_else(|| "command failed".to_string()),
    }
    .into()
}

#[cfg(test)]
mod tests {
    use super::models::ZxaC300;
    use super::*;

    use std::time::Duration;

    use crate::session::CliSession;
    use crate::transport::mock::MockTransport;

    fn driver_with(responses: &[&[u8]]) -> (OltDriver, std::sync::Arc<std::sync::Mutex<Vec<String>>>) {
        let (transport, sent) = MockTransport::scripted(responses);
        let session = CliSession::for_testing(Box::new(transport), Duration::from_millis(500));
        (OltDriver::for_testing(session, Box::new(ZxaC300)), sent)
    }

    #[tokio::test]
    async fn test_discover_parses_onus() {
        let (mut driver, _) = driver_with(&[
            b"show gpon onu uncfg\r\nOnuIndex        Sn              State\r\ngpon-onu_1/1/1:1    ZTEGC1234567    initial\r\nZXAN#",
        ]);

        let onus = driver.discover().await.unwrap();
        assert_eq!(onus.len(), 1);
        assert_eq!(
            onus[0],
            DiscoveredOnu {
                pon_port: "1/1/1".to_string(),
                onu_id: 1,
                serial_number: "ZTEGC1234567".to_string(),
                onu_type: "ZTE GPON".to_string(),
                status: "initial".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_discover_empty_table() {
        let (mut driver, _) =
            driver_with(&[b"show gpon onu uncfg\r\nNo related information to show\r\nZXAN#"]);

        let onus = driver.discover().await.unwrap();
        assert!(onus.is_empty());
    }

    #[tokio::test]
    async fn test_register_reports_failing_step() {
        // Step 1 succeeds, step 2 draws in-band error text.
        let (mut driver, sent) = driver_with(&[
            b"configure terminal\r\nZXAN(config)#",
            b"interface gpon-olt_9/9/9\r\n%Error: port does not exist\r\nZXAN(config)#",
        ]);

        let request = ProvisionRequest {
            pon_port: "9/9/9".to_string(),
            onu_id: 1,
            serial_number: "ZTEGC0000001".to_string(),
            name: String::new(),
            line_profile: "default".to_string(),
            service_profile: "default".to_string(),
            vlan: 100,
            service_port: None,
        };

        let err = driver.register(&request).await.unwrap_err();
        let message = err.to_string();
        assert!(message.contains("step 2"), "got: {message}");
        assert!(message.contains("port does not exist"), "got: {message}");

        // Execution halted: only two commands ever reached the wire.
        assert_eq!(sent.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_delete_sends_full_sequence() {
        let (mut driver, sent) = driver_with(&[
            b"configure terminal\r\nZXAN(config)#",
            b"interface gpon-olt_1/1/2\r\nZXAN(gpon-olt)#",
            b"no onu 5\r\nZXAN(gpon-olt)#",
            b"exit\r\nZXAN(config)#",
            b"exit\r\nZXAN#",
        ]);

        driver.delete("1/1/2", 5).await.unwrap();

        let sent = sent.lock().unwrap();
        assert_eq!(sent.len(), 5);
        assert_eq!(sent[2], "no onu 5\n");
    }

    #[tokio::test]
    async fn test_discover_is_deterministic() {
        let output: &[u8] = b"show gpon onu uncfg\r\ngpon-onu_1/1/1:1    ZTEGC1234567    initial\r\ngpon-onu_1/1/1:2    HWTC7654321     initial\r\nZXAN#";

        let (mut first, _) = driver_with(&[output]);
        let (mut second, _) = driver_with(&[output]);

        let a = first.discover().await.unwrap();
        let b = second.discover().await.unwrap();
        assert_eq!(a, b);
        assert_eq!(a[1].onu_type, "Huawei");
    }

    #[tokio::test]
    async fn test_run_scoped_releases_session() {
        let (mut driver, _) = driver_with(&[
            b"show gpon onu uncfg\r\ngpon-onu_1/1/1:1    ZTEGC1234567    initial\r\nZXAN#",
        ]);

        let onus = driver
            .run_scoped(async |olt| olt.discover().await)
            .await
            .unwrap();

        assert_eq!(onus.len(), 1);
        assert!(!driver.session().is_ready());
    }

    #[test]
    fn test_detect_onu_type_unknown_prefix() {
        let prefixes = ZxaC300.serial_prefixes();
        assert_eq!(detect_onu_type("XXXX12345678", prefixes), "Unknown");
        assert_eq!(detect_onu_type("ztegc1234567", prefixes), "ZTE GPON");
    }
}
