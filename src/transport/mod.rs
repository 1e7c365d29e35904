//! Transport layer for raw CLI connections.
//!
//! This module provides the low-level connection management for the two
//! ways an OLT exposes its terminal: SSH (via russh) and Telnet (a plain
//! TCP stream with minimal option negotiation). Both present the same
//! [`Transport`] interface of raw send/receive on a live connection.

pub mod config;
mod ssh;
mod telnet;

pub use config::{SessionConfig, TransportKind};
pub use ssh::SshTransport;
pub use telnet::TelnetTransport;

use async_trait::async_trait;

use crate::error::TransportError;

/// Raw byte-stream transport to one device.
///
/// Implementations own exactly one live connection. All methods must be
/// serialized by the caller; a transport is never shared.
#[async_trait]
pub trait Transport: Send {
    /// Send raw bytes to the device.
    async fn send(&mut self, data: &[u8]) -> std::result::Result<(), TransportError>;

    /// Wait for the next chunk of output from the device.
    ///
    /// Returns [`TransportError::Disconnected`] when the peer closes the
    /// connection. Never returns an empty chunk.
    async fn read_chunk(&mut self) -> std::result::Result<Vec<u8>, TransportError>;

    /// Release the underlying connection. Safe to call once; the
    /// transport is consumed by the owning session afterwards.
    async fn close(&mut self) -> std::result::Result<(), TransportError>;
}

/// Scripted in-memory transport for exercising the session and adapter
/// layers without a device.
#[cfg(test)]
pub(crate) mod mock {
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;

    use super::Transport;
    use crate::error::TransportError;

    /// Each send releases the next canned response; reads block forever
    /// once the script is exhausted so timeout paths can be exercised.
    pub(crate) struct MockTransport {
        responses: VecDeque<Vec<u8>>,
        pending: Option<Vec<u8>>,
        sent: Arc<Mutex<Vec<String>>>,
    }

    impl MockTransport {
        pub(crate) fn scripted(responses: &[&[u8]]) -> (Self, Arc<Mutex<Vec<String>>>) {
            let sent = Arc::new(Mutex::new(Vec::new()));
            (
                Self {
                    responses: responses.iter().map(|r| r.to_vec()).collect(),
                    pending: None,
                    sent: sent.clone(),
                },
                sent,
            )
        }
    }

    #[async_trait]
    impl Transport for MockTransport {
        async fn send(&mut self, data: &[u8]) -> Result<(), TransportError> {
            self.sent
                .lock()
                .unwrap()
                .push(String::from_utf8_lossy(data).into_owned());
            self.pending = self.responses.pop_front();
            Ok(())
        }

        async fn read_chunk(&mut self) -> Result<Vec<u8>, TransportError> {
            match self.pending.take() {
                Some(chunk) => Ok(chunk),
                None => std::future::pending().await,
            }
        }

        async fn close(&mut self) -> Result<(), TransportError> {
            Ok(())
        }
    }
}

/// Connect the transport selected by the session configuration.
pub(crate) async fn connect(
    config: &SessionConfig,
) -> std::result::Result<Box<dyn Transport>, TransportError> {
    match config.kind {
        TransportKind::Ssh => Ok(Box::new(SshTransport::connect(config).await?)),
        TransportKind::Telnet => Ok(Box::new(TelnetTransport::connect(config).await?)),
    }
}
