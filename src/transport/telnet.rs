//! Telnet transport over a plain TCP stream.
//!
//! OLT telnet servers negotiate a handful of options on connect; this
//! transport refuses them all (IAC DONT / IAC WONT) and strips the
//! negotiation bytes from the data stream, which is enough for the
//! line-oriented CLI the devices expose.

use async_trait::async_trait;
use bytes::BytesMut;
use log::{debug, trace, warn};
use secrecy::ExposeSecret;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use super::Transport;
use super::config::SessionConfig;
use crate::error::TransportError;

const IAC: u8 = 255;
const DONT: u8 = 254;
const DO: u8 = 253;
const WONT: u8 = 252;
const WILL: u8 = 251;
const SB: u8 = 250;
const SE: u8 = 240;

/// Telnet transport with minimal option negotiation.
pub struct TelnetTransport {
    stream: Option<TcpStream>,
    scrubber: IacScrubber,
}

impl TelnetTransport {
    /// Connect and complete the Username:/Password: login exchange, all
    /// within `connect_timeout`.
    pub async fn connect(config: &SessionConfig) -> Result<Self, TransportError> {
        let timeout = config.connect_timeout;
        tokio::time::timeout(timeout, Self::connect_inner(config))
            .await
            .map_err(|_| TransportError::ConnectTimeout(timeout))?
    }

    async fn connect_inner(config: &SessionConfig) -> Result<Self, TransportError> {
        debug!("Connecting to {} via Telnet", config.socket_addr());

        let stream = TcpStream::connect((config.host.as_str(), config.port))
            .await
            .map_err(|e| TransportError::ConnectionFailed {
                host: config.host.clone(),
                port: config.port,
                source: e,
            })?;

        let mut transport = Self {
            stream: Some(stream),
            scrubber: IacScrubber::default(),
        };

        // Credential exchange. Some firmware prints "Login:" instead of
        // "Username:"; accept either.
        transport
            .read_until_any(&["Username:", "Login:", "login:"], "Username:")
            .await?;
        transport
            .send(format!("{}\n", config.username).as_bytes())
            .await?;

        transport
            .read_until_any(&["Password:", "password:"], "Password:")
            .await?;
        transport
            .send(format!("{}\n", config.password.expose_secret()).as_bytes())
            .await?;

        debug!("Telnet login sent to {}", config.socket_addr());

        Ok(transport)
    }

    /// Accumulate cleaned output until one of `markers` appears.
    async fn read_until_any(
        &mut self,
        markers: &[&str],
        expected: &'static str,
    ) -> Result<(), TransportError> {
        let mut seen = BytesMut::with_capacity(1024);
        loop {
            let chunk = self.read_chunk().await.map_err(|e| match e {
                // EOF before the credential prompt means the login
                // banner never offered one.
                TransportError::Disconnected => {
                    TransportError::LoginPromptNotFound { expected }
                }
                other => other,
            })?;
            seen.extend_from_slice(&chunk);

            let text = String::from_utf8_lossy(&seen);
            if markers.iter().any(|m| text.contains(m)) {
                return Ok(());
            }
        }
    }

    fn stream_mut(&mut self) -> Result<&mut TcpStream, TransportError> {
        self.stream.as_mut().ok_or(TransportError::Disconnected)
    }
}

#[async_trait]
impl Transport for TelnetTransport {
    async fn send(&mut self, data: &[u8]) -> Result<(), TransportError> {
        let stream = self.stream_mut()?;
        stream.write_all(data).await?;
        stream.flush().await?;
        Ok(())
    }

    async fn read_chunk(&mut self) -> Result<Vec<u8>, TransportError> {
        let mut raw = [0u8; 4096];
        loop {
            let stream = self.stream_mut()?;
            let n = stream.read(&mut raw).await?;
            if n == 0 {
                return Err(TransportError::Disconnected);
            }
            trace!("Telnet read {n} bytes");

            let mut clean = Vec::with_capacity(n);
            let mut replies = Vec::new();
            self.scrubber.scrub(&raw[..n], &mut clean, &mut replies);

            if !replies.is_empty() {
                trace!("Refusing {} negotiation option(s)", replies.len() / 3);
                let stream = self.stream_mut()?;
                stream.write_all(&replies).await?;
                stream.flush().await?;
            }

            // A chunk may have been pure negotiation; keep reading.
            if !clean.is_empty() {
                return Ok(clean);
            }
        }
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        if let Some(mut stream) = self.stream.take() {
            if let Err(e) = stream.shutdown().await {
                warn!("Telnet shutdown failed: {e}");
            }
        }
        Ok(())
    }
}

/// Incremental IAC scrubber.
///
/// Negotiation sequences may be split across TCP reads, so the parser
/// state carries over between chunks.
#[derive(Debug, Default)]
struct IacScrubber {
    state: IacState,
}

#[derive(Debug, Default, Clone, Copy, PartialEq)]
enum IacState {
    #[default]
    Data,
    /// Saw IAC, awaiting command byte.
    Command,
    /// Saw IAC WILL/WONT/DO/DONT, awaiting option byte.
    Option(u8),
    /// Inside IAC SB ... subnegotiation.
    Subnegotiation,
    /// Saw IAC inside a subnegotiation.
    SubnegotiationIac,
}

impl IacScrubber {
    /// Split `raw` into `clean` payload bytes and negotiation `replies`.
    fn scrub(&mut self, raw: &[u8], clean: &mut Vec<u8>, replies: &mut Vec<u8>) {
        for &byte in raw {
            self.state = match (self.state, byte) {
                (IacState::Data, IAC) => IacState::Command,
                (IacState::Data, b) => {
                    clean.push(b);
                    IacState::Data
                }

                // Escaped 0xFF data byte.
                (IacState::Command, IAC) => {
                    clean.push(IAC);
                    IacState::Data
                }
                (IacState::Command, cmd @ (WILL | WONT | DO | DONT)) => IacState::Option(cmd),
                (IacState::Command, SB) => IacState::Subnegotiation,
                // NOP, GA, and friends carry no option byte.
                (IacState::Command, _) => IacState::Data,

                (IacState::Option(cmd), opt) => {
                    match cmd {
                        WILL => replies.extend_from_slice(&[IAC, DONT, opt]),
                        DO => replies.extend_from_slice(&[IAC, WONT, opt]),
                        // WONT/DONT acknowledgements need no answer.
                        _ => {}
                    }
                    IacState::Data
                }

                (IacState::Subnegotiation, IAC) => IacState::SubnegotiationIac,
                (IacState::Subnegotiation, _) => IacState::Subnegotiation,
                (IacState::SubnegotiationIac, SE) => IacState::Data,
                (IacState::SubnegotiationIac, _) => IacState::Subnegotiation,
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scrub_all(scrubber: &mut IacScrubber, raw: &[u8]) -> (Vec<u8>, Vec<u8>) {
        let mut clean = Vec::new();
        let mut replies = Vec::new();
        scrubber.scrub(raw, &mut clean, &mut replies);
        (clean, replies)
    }

    #[test]
    fn test_plain_data_passes_through() {
        let mut s = IacScrubber::default();
        let (clean, replies) = scrub_all(&mut s, b"Username:");
        assert_eq!(clean, b"Username:");
        assert!(replies.is_empty());
    }

    #[test]
    fn test_refuses_will_and_do() {
        let mut s = IacScrubber::default();
        // IAC WILL ECHO(1), IAC DO SGA(3)
        let (clean, replies) = scrub_all(&mut s, &[IAC, WILL, 1, IAC, DO, 3]);
        assert!(clean.is_empty());
        assert_eq!(replies, vec![IAC, DONT, 1, IAC, WONT, 3]);
    }

    #[test]
    fn test_negotiation_interleaved_with_data() {
        let mut s = IacScrubber::default();
        let mut raw = b"Use".to_vec();
        raw.extend_from_slice(&[IAC, WILL, 1]);
        raw.extend_from_slice(b"rname:");
        let (clean, replies) = scrub_all(&mut s, &raw);
        assert_eq!(clean, b"Username:");
        assert_eq!(replies, vec![IAC, DONT, 1]);
    }

    #[test]
    fn test_sequence_split_across_chunks() {
        let mut s = IacScrubber::default();
        let (clean, replies) = scrub_all(&mut s, &[b'a', IAC]);
        assert_eq!(clean, b"a");
        assert!(replies.is_empty());

        let (clean, replies) = scrub_all(&mut s, &[DO, 24, b'b']);
        assert_eq!(clean, b"b");
        assert_eq!(replies, vec![IAC, WONT, 24]);
    }

    #[test]
    fn test_escaped_iac_byte() {
        let mut s = IacScrubber::default();
        let (clean, replies) = scrub_all(&mut s, &[b'x', IAC, IAC, b'y']);
        assert_eq!(clean, vec![b'x', IAC, b'y']);
        assert!(replies.is_empty());
    }

    #[test]
    fn test_subnegotiation_stripped() {
        let mut s = IacScrubber::default();
        // IAC SB TERMINAL-TYPE(24) ... IAC SE
        let raw = [IAC, SB, 24, 1, 2, 3, IAC, SE, b'z'];
        let (clean, replies) = scrub_all(&mut s, &raw);
        assert_eq!(clean, b"z");
        assert!(replies.is_empty());
    }
}
