//! Error types for ponctl.

use std::io;
use std::time::Duration;

use thiserror::Error;

/// Main error type for ponctl operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Transport-level errors (connect, authenticate, raw I/O)
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// CLI session errors (state machine, prompt synchronization)
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// Command sequence errors (a provisioning step failed on-device)
    #[error("Command error: {0}")]
    Command(#[from] CommandError),

    /// Device output could not be parsed
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    /// SNMP monitoring errors
    #[error("SNMP error: {0}")]
    Snmp(#[from] SnmpError),

    /// Adapter factory errors
    #[error("Factory error: {0}")]
    Factory(#[from] FactoryError),
}

/// Transport layer errors (SSH/Telnet connection, authentication).
#[derive(Error, Debug)]
pub enum TransportError {
    /// Failed to connect to host
    #[error("Connection failed to {host}:{port}: {source}")]
    ConnectionFailed {
        host: String,
        port: u16,
        #[source]
        source: io::Error,
    },

    /// SSH handshake or protocol error
    #[error("SSH error: {0}")]
    Ssh(#[from] russh::Error),

    /// Authentication failed
    #[error("Authentication failed for user '{user}'")]
    AuthenticationFailed { user: String },

    /// Telnet login exchange never reached a credential prompt
    #[error("Telnet login failed: expected '{expected}' prompt")]
    LoginPromptNotFound { expected: &'static str },

    /// Connection was closed by the peer
    #[error("Connection disconnected")]
    Disconnected,

    /// Connect did not complete in time
    #[error("Connection timed out after {0:?}")]
    ConnectTimeout(Duration),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// CLI session errors (state machine, prompt detection).
#[derive(Error, Debug)]
pub enum SessionError {
    /// A command was issued while the session was not Ready
    #[error("Session not ready (state: {state}) - call connect() first")]
    NotReady { state: &'static str },

    /// No known prompt observed before the command timeout
    #[error("No prompt observed within {0:?}")]
    PromptTimeout(Duration),
}

/// Command sequence errors for multi-step hardware changes.
///
/// A partially applied sequence is possible; the step index always tells
/// the caller how far execution got before stopping.
#[derive(Error, Debug)]
pub enum CommandError {
    /// A step of a command sequence failed (transport failure or
    /// in-band device error text). `step` is 1-based.
    #[error("step {step}: {message}")]
    StepFailed { step: usize, message: String },

    /// A single command round-trip failed
    #[error("{message}")]
    Failed { message: String },
}

/// Device output did not match any known format.
///
/// Kept distinct from [`CommandError`] so callers can tell "device said
/// no" from "we could not understand the device".
#[derive(Error, Debug)]
pub enum ParseError {
    /// A discovery line matched the table grammar but had a bad field
    #[error("Unparseable discovery line: {line}")]
    Discovery { line: String },

    /// No optical-power pattern matched the device output
    #[error("Optical power output did not match any known format")]
    OpticalPower,
}

/// SNMP monitoring client errors.
#[derive(Error, Debug)]
pub enum SnmpError {
    /// Required SNMP utilities are not installed on this host.
    /// Checked before any network attempt; no timeout is ever incurred
    /// for a missing tool.
    #[error(
        "SNMP tools not found on server ({missing}). \
         Please install the 'snmp' package: sudo apt install snmp"
    )]
    ToolUnavailable { missing: String },

    /// The SNMP utility exited non-zero or produced an error
    #[error("SNMP request failed: {0}")]
    RequestFailed(String),

    /// The SNMP request did not complete in time
    #[error("SNMP request timed out")]
    Timeout,

    /// The agent reported the OID does not exist
    #[error("OID not found: {oid}")]
    NoSuchObject { oid: String },

    /// SNMP SET is blocked unconditionally
    #[error("SNMP SET operations are not allowed. This is a security violation.")]
    WriteBlocked,

    /// Failed to spawn the SNMP utility
    #[error("Failed to run {tool}: {source}")]
    Spawn {
        tool: String,
        #[source]
        source: io::Error,
    },
}

/// Adapter factory errors.
#[derive(Error, Debug)]
pub enum FactoryError {
    /// The device-type identifier is not in the supported set
    #[error("Unsupported OLT type: {name}. Supported types: {supported}")]
    UnknownOltType { name: String, supported: String },

    /// Required builder field was not supplied
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },
}

/// Result type alias using ponctl's Error.
pub type Result<T> = std::result::Result<T, Error>;
