//! ZTE ZXA10 C320 adapter.
//!
//! The C320 is a compact GPON OLT for smaller deployments. It shares
//! the ZXA10 command set with the C300 but its optical-info output has
//! shifted between firmware releases, so parsing tries a list of
//! formats in order.

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;

use super::{zxa10_delete_commands, zxa10_register_commands};
use crate::error::ParseError;
use crate::olt::{OltModel, OpticalReading, ProvisionRequest};

static SERIAL_PREFIXES: Lazy<IndexMap<&'static str, &'static str>> = Lazy::new(|| {
    IndexMap::from([
        ("ZTEG", "ZTE GPON"),
        ("HWTC", "Huawei"),
        ("ALCL", "Alcatel"),
        ("FHTT", "Fiberhome"),
        ("ZNTS", "ZTE Smart"),
    ])
});

/// ZTE ZXA10 C320.
pub struct ZxaC320;

impl OltModel for ZxaC320 {
    fn model_name(&self) -> &'static str {
        "ZTE ZXA10 C320"
    }

    fn discovery_command(&self) -> &'static str {
        "show gpon onu uncfg"
    }

    fn serial_prefixes(&self) -> &'static IndexMap<&'static str, &'static str> {
        &SERIAL_PREFIXES
    }

    fn register_commands(&self, request: &ProvisionRequest) -> Vec<String> {
        zxa10_register_commands(request)
    }

    fn delete_commands(&self, pon_port: &str, onu_id: u32) -> Vec<String> {
        zxa10_delete_commands(pon_port, onu_id)
    }

    /// Strict tabular format first, then the labeled RX:/TX: block some
    /// firmware prints instead. First pattern to match wins.
    fn parse_optical_power(
        &self,
        output: &str,
        onu_id: u32,
    ) -> Result<OpticalReading, ParseError> {
        let patterns = [
            format!(r":\s*{onu_id}\s+(-?\d+\.?\d*)\s+(-?\d+\.?\d*)"),
            format!(
                r"(?is)ONU\s+{onu_id}\b[^\n]*\n.*?RX:\s*(-?\d+\.?\d*).*?TX:\s*(-?\d+\.?\d*)"
            ),
        ];

        for pattern in &patterns {
            let regex = Regex::new(pattern).expect("row pattern");
            if let Some(caps) = regex.captures(output) {
                let rx_power = caps[1].parse().ok();
                let tx_power = caps[2].parse().ok();
                if rx_power.is_some() || tx_power.is_some() {
                    return Ok(OpticalReading { rx_power, tx_power });
                }
            }
        }

        Err(ParseError::OpticalPower)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_identity() {
        assert_eq!(ZxaC320.model_name(), "ZTE ZXA10 C320");
    }

    #[test]
    fn test_znts_prefix_is_c320_only() {
        assert_eq!(
            SERIAL_PREFIXES.get("ZNTS").copied(),
            Some("ZTE Smart")
        );
    }

    #[test]
    fn test_optical_power_tabular_format() {
        let output = "gpon-onu_1/2/3:4    -23.7     1.9\n";
        let reading = ZxaC320.parse_optical_power(output, 4).unwrap();
        assert_eq!(reading.rx_power, Some(-23.7));
        assert_eq!(reading.tx_power, Some(1.9));
    }

    #[test]
    fn test_optical_power_falls_back_to_labeled_format() {
        let output = "\
ONU 4 optical information
  RX: -26.2 dBm
  TX: 2.0 dBm
";
        let reading = ZxaC320.parse_optical_power(output, 4).unwrap();
        assert_eq!(reading.rx_power, Some(-26.2));
        assert_eq!(reading.tx_power, Some(2.0));
    }

    #[test]
    fn test_labeled_format_requires_exact_onu_id() {
        // A lookup for ONU 1 must not read the ONU 12 block.
        let output = "\
ONU 12 optical information
  RX: -26.2 dBm
  TX: 2.0 dBm
";
        let err = ZxaC320.parse_optical_power(output, 1).unwrap_err();
        assert!(matches!(err, ParseError::OpticalPower));

        let reading = ZxaC320.parse_optical_power(output, 12).unwrap();
        assert_eq!(reading.rx_power, Some(-26.2));
    }

    #[test]
    fn test_optical_power_exhausted_patterns() {
        let err = ZxaC320
            .parse_optical_power("Unrecognized firmware output", 1)
            .unwrap_err();
        assert!(matches!(err, ParseError::OpticalPower));
    }
}
