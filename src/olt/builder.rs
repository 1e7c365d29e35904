//! Builder for constructing OLT adapters.

use std::time::Duration;

use secrecy::SecretString;

use super::factory::{self, OltType};
use super::OltDriver;
use crate::error::{FactoryError, Result};
use crate::transport::{SessionConfig, TransportKind};

/// Builder for an [`OltDriver`].
///
/// # Example
///
/// ```rust,no_run
/// use ponctl::{OltBuilder, OltType};
///
/// # async fn example() -> ponctl::Result<()> {
/// let mut olt = OltBuilder::new("10.20.0.5")
///     .username("admin")
///     .password("secret")
///     .olt_type(OltType::ZteC320)
///     .build()?;
///
/// olt.open().await?;
/// let onus = olt.discover().await?;
/// olt.close().await;
/// # Ok(())
/// # }
/// ```
pub struct OltBuilder {
    host: String,
    port: Option<u16>,
    kind: TransportKind,
    username: Option<String>,
    password: Option<SecretString>,
    olt_type: Option<OltType>,
    connect_timeout: Option<Duration>,
    command_timeout: Option<Duration>,
}

impl OltBuilder {
    /// Start a builder for the given host.
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: None,
            kind: TransportKind::Ssh,
            username: None,
            password: None,
            olt_type: None,
            connect_timeout: None,
            command_timeout: None,
        }
    }

    /// CLI port (defaults to the transport's conventional port).
    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Select SSH or Telnet (default: SSH).
    pub fn transport(mut self, kind: TransportKind) -> Self {
        self.kind = kind;
        self
    }

    /// Login username.
    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Login password.
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(SecretString::from(password.into()));
        self
    }

    /// Device model.
    pub fn olt_type(mut self, olt_type: OltType) -> Self {
        self.olt_type = Some(olt_type);
        self
    }

    /// Timeout for the connect handshake (default 10s).
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Timeout to observe a prompt after each command (default 30s).
    pub fn command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = Some(timeout);
        self
    }

    /// Build the adapter. Does not connect; call
    /// [`open`](OltDriver::open) on the result.
    pub fn build(self) -> Result<OltDriver> {
        let username = self.username.ok_or_else(|| missing("username"))?;
        let password = self.password.ok_or_else(|| missing("password"))?;
        let olt_type = self.olt_type.ok_or_else(|| missing("olt_type"))?;

        let mut config = SessionConfig::new(self.host, self.kind, username, password);
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(timeout) = self.connect_timeout {
            config.connect_timeout = timeout;
        }
        if let Some(timeout) = self.command_timeout {
            config.command_timeout = timeout;
        }

        Ok(factory::adapter_for(olt_type, config))
    }
}

fn missing(field: &str) -> crate::error::Error {
    FactoryError::InvalidConfig {
        message: format!("{field} is required"),
    }
    .into()
}
