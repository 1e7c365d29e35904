//! Adapter factory: device-type identifier to adapter.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::models::{ZxaC300, ZxaC320};
use super::{OltDriver, OltModel};
use crate::error::FactoryError;
use crate::transport::SessionConfig;

/// Supported OLT models.
///
/// A static table, not a plugin mechanism: adding a model means adding
/// a variant here and a row in [`OltType::model`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OltType {
    ZteC300,
    ZteC320,
}

impl OltType {
    /// Every supported type, for enumeration and error messages.
    pub const ALL: [OltType; 2] = [OltType::ZteC300, OltType::ZteC320];

    /// The wire identifier collaborators store.
    pub fn as_str(self) -> &'static str {
        match self {
            OltType::ZteC300 => "zte_c300",
            OltType::ZteC320 => "zte_c320",
        }
    }

    fn model(self) -> Box<dyn OltModel> {
        match self {
            OltType::ZteC300 => Box::new(ZxaC300),
            OltType::ZteC320 => Box::new(ZxaC320),
        }
    }
}

impl fmt::Display for OltType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OltType {
    type Err = FactoryError;

    /// Unknown identifiers fail closed, naming the supported set.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OltType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| FactoryError::UnknownOltType {
                name: s.to_string(),
                supported: supported_types(),
            })
    }
}

/// Comma-separated list of supported type identifiers.
pub fn supported_types() -> String {
    OltType::ALL
        .iter()
        .map(|t| t.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Construct the adapter for a device type, bound to the given session
/// configuration.
pub fn adapter_for(olt_type: OltType, config: SessionConfig) -> OltDriver {
    OltDriver::new(config, olt_type.model())
}

#[cfg(test)]
mod tests {
    use super::*;

    use secrecy::SecretString;

    use crate::transport::TransportKind;

    #[test]
    fn test_from_str_round_trips() {
        for olt_type in OltType::ALL {
            assert_eq!(olt_type.as_str().parse::<OltType>().unwrap(), olt_type);
        }
    }

    #[test]
    fn test_unknown_type_names_supported_set() {
        let err = "huawei_ma5800".parse::<OltType>().unwrap_err();
        let message = err.to_string();
        assert!(message.contains("huawei_ma5800"));
        assert!(message.contains("zte_c300"));
        assert!(message.contains("zte_c320"));
    }

    #[test]
    fn test_adapter_for_binds_model() {
        let config = SessionConfig::new(
            "10.0.0.1",
            TransportKind::Ssh,
            "admin",
            SecretString::from("admin"),
        );
        let driver = adapter_for(OltType::ZteC320, config);
        assert_eq!(driver.model_name(), "ZTE ZXA10 C320");
    }

    #[test]
    fn test_serde_identifiers() {
        let json = serde_json::to_string(&OltType::ZteC300).unwrap();
        assert_eq!(json, "\"zte_c300\"");
        let parsed: OltType = serde_json::from_str("\"zte_c320\"").unwrap();
        assert_eq!(parsed, OltType::ZteC320);
    }
}
