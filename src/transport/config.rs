//! CLI session configuration.

use std::time::Duration;

use secrecy::SecretString;

/// How the device's terminal is reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransportKind {
    /// SSH with password authentication (default).
    #[default]
    Ssh,

    /// Telnet with a Username:/Password: login exchange.
    Telnet,
}

impl TransportKind {
    /// Conventional CLI port for this transport.
    pub fn default_port(self) -> u16 {
        match self {
            TransportKind::Ssh => 22,
            TransportKind::Telnet => 23,
        }
    }
}

/// Configuration for one CLI session to one OLT.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Target host (hostname or IP address).
    pub host: String,

    /// CLI port.
    pub port: u16,

    /// SSH or Telnet.
    pub kind: TransportKind,

    /// Login username.
    pub username: String,

    /// Login password. Never logged.
    pub password: SecretString,

    /// Timeout for the full connect handshake (including login).
    pub connect_timeout: Duration,

    /// Timeout for observing a prompt after sending a command.
    pub command_timeout: Duration,

    /// Terminal width for the PTY.
    pub terminal_width: u32,

    /// Terminal height for the PTY.
    pub terminal_height: u32,
}

impl SessionConfig {
    /// Create a configuration with deployment defaults
    /// (connect 10s, command 30s, 200x50 terminal).
    pub fn new(
        host: impl Into<String>,
        kind: TransportKind,
        username: impl Into<String>,
        password: SecretString,
    ) -> Self {
        Self {
            host: host.into(),
            port: kind.default_port(),
            kind,
            username: username.into(),
            password,
            connect_timeout: Duration::from_secs(10),
            command_timeout: Duration::from_secs(30),
            terminal_width: 200,
            terminal_height: 50,
        }
    }

    /// Get the socket address for connection.
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
