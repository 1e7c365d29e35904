//! ZTE ZXA10 C300 adapter.
//!
//! The C300 is a high-density GPON OLT supporting up to 64 PON ports.

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
    ])
});

/// ZTE ZXA10 C300.
pub struct ZxaC300;

impl OltModel for ZxaC300 {
    fn model_name(&self) -> &'static str {
        "ZTE ZXA10 C300"
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

    /// C300 optical-info rows read `...:<onu_id>  <rx>  <tx>`; this
    /// firmware line has kept one stable format.
    fn parse_optical_power(
        &self,
        output: &str,
        onu_id: u32,
    ) -> Result<OpticalReading, ParseError> {
        let pattern = Regex::new(&format!(
            r":\s*{onu_id}\s+(-?\d+\.?\d*)\s+(-?\d+\.?\d*)"
        ))
        .expect("row pattern");

        let caps = pattern.captures(output).ok_or(ParseError::OpticalPower)?;

        Ok(OpticalReading {
            rx_power: caps[1].parse().ok(),
            tx_power: caps[2].parse().ok(),
        })
    }
}
