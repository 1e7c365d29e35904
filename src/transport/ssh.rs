//! SSH transport implementation using russh.

use std::sync::Arc;

use async_trait::async_trait;
use log::{debug, trace, warn};
use russh::client::{self, Handle, Msg};
use russh::keys::PublicKey;
use russh::{Channel, ChannelMsg};
use secrecy::ExposeSecret;

use super::Transport;
use super::config::SessionConfig;
use crate::error::TransportError;

/// SSH transport wrapping a russh client with an interactive PTY channel.
pub struct SshTransport {
    /// The russh session handle.
    session: Option<Handle<OltHandler>>,

    /// The interactive shell channel.
    channel: Option<Channel<Msg>>,
}

impl SshTransport {
    /// Connect, authenticate with the configured password, and open an
    /// interactive shell channel, all within `connect_timeout`.
    pub async fn connect(config: &SessionConfig) -> Result<Self, TransportError> {
        let timeout = config.connect_timeout;
        tokio::time::timeout(timeout, Self::connect_inner(config))
            .await
            .map_err(|_| TransportError::ConnectTimeout(timeout))?
    }

    async fn connect_inner(config: &SessionConfig) -> Result<Self, TransportError> {
        let ssh_config = Arc::new(client::Config {
            inactivity_timeout: None,
            ..Default::default()
        });

        debug!("Connecting to {} via SSH", config.socket_addr());

        let mut session = client::connect(
            ssh_config,
            (config.host.as_str(), config.port),
            OltHandler,
        )
        .await?;

        let authenticated = session
            .authenticate_password(&config.username, config.password.expose_secret())
            .await?
            .success();

        if !authenticated {
            return Err(TransportError::AuthenticationFailed {
                user: config.username.clone(),
            });
        }

        let channel = session.channel_open_session().await?;

        channel
            .request_pty(
                true,
                "vt100",
                config.terminal_width,
                config.terminal_height,
                0,
                0,
                &[],
            )
            .await?;

        channel.request_shell(true).await?;

        debug!("SSH shell established to {}", config.socket_addr());

        Ok(Self {
            session: Some(session),
            channel: Some(channel),
        })
    }

    fn channel_mut(&mut self) -> Result<&mut Channel<Msg>, TransportError> {
        self.channel.as_mut().ok_or(TransportError::Disconnected)
    }
}

#[async_trait]
impl Transport for SshTransport {
    async fn send(&mut self, data: &[u8]) -> Result<(), TransportError> {
        self.channel_mut()?.data(data).await?;
        Ok(())
    }

    async fn read_chunk(&mut self) -> Result<Vec<u8>, TransportError> {
        let channel = self.channel_mut()?;
        loop {
            match channel.wait().await {
                Some(ChannelMsg::Data { data }) => {
                    trace!("SSH read {} bytes", data.len());
                    return Ok(data.to_vec());
                }
                Some(ChannelMsg::ExtendedData { data, .. }) => {
                    trace!("SSH read {} extended bytes", data.len());
                    return Ok(data.to_vec());
                }
                Some(ChannelMsg::Eof) | Some(ChannelMsg::Close) | None => {
                    return Err(TransportError::Disconnected);
                }
                Some(other) => {
                    trace!("Ignoring channel message: {other:?}");
                }
            }
        }
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        if let Some(channel) = self.channel.take() {
            if let Err(e) = channel.eof().await {
                warn!("SSH channel EOF failed: {e}");
            }
        }
        if let Some(session) = self.session.take() {
            session
                .disconnect(russh::Disconnect::ByApplication, "", "en")
                .await?;
        }
        Ok(())
    }
}

/// Client handler for russh.
///
/// OLTs live on isolated management networks and ship self-signed host
/// keys that change on every firmware reflash, so host keys are accepted
/// unconditionally, matching the behavior of the field tooling this
/// replaces.
struct OltHandler;

impl client::Handler for OltHandler {
    type Error = russh::Error;

    async fn check_server_key(
        &mut self,
        server_public_key: &PublicKey,
    ) -> std::result::Result<bool, Self::Error> {
        trace!(
            "Accepting host key: {}",
            server_public_key.fingerprint(Default::default())
        );
        Ok(true)
    }
}
