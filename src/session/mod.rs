//! Prompt-synchronized command execution.
//!
//! [`CliSession`] turns the raw byte stream of a [`Transport`] into
//! discrete command/output exchanges: it sends a command, accumulates
//! output until a known prompt appears at the end of the buffer, strips
//! the command echo, and hands back a [`CommandResult`]. Everything a
//! command can do wrong - timeout, transport death, device error text -
//! is captured in the result rather than propagated.

mod result;

pub use result::{CommandResult, contains_error_text};

use std::time::Duration;

use log::{debug, trace, warn};

use crate::channel::{PatternBuffer, PromptSet};
use crate::error::{Error, Result, SessionError, TransportError};
use crate::transport::{self, SessionConfig, Transport};

/// How long to wait for unsolicited output before a command is sent.
const DRAIN_WINDOW: Duration = Duration::from_millis(50);

/// Lifecycle state of a CLI session.
///
/// `Disconnected -> Connecting -> Ready -> Disconnected`, with `Failed`
/// absorbing on fatal I/O from `Connecting` or `Ready`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Disconnected,
    Connecting,
    Ready,
    Failed,
}

impl SessionState {
    /// Short name for error messages.
    pub fn name(self) -> &'static str {
        match self {
            SessionState::Disconnected => "disconnected",
            SessionState::Connecting => "connecting",
            SessionState::Ready => "ready",
            SessionState::Failed => "failed",
        }
    }
}

/// One live CLI session to one OLT.
///
/// Not internally synchronized: one session means one sequential command
/// stream, serialized by the caller. Callers must guarantee
/// [`disconnect`](Self::disconnect) runs on every exit path.
pub struct CliSession {
    config: SessionConfig,
    transport: Option<Box<dyn Transport>>,
    state: SessionState,
    prompts: PromptSet,
    buffer: PatternBuffer,
}

impl CliSession {
    /// Create a session in the Disconnected state.
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            transport: None,
            state: SessionState::Disconnected,
            prompts: PromptSet,
            buffer: PatternBuffer::default(),
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Whether commands can be issued.
    pub fn is_ready(&self) -> bool {
        self.state == SessionState::Ready
    }

    /// The configuration this session was built with.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Perform the transport handshake and synchronize on the first
    /// prompt. This is the one operation that signals failure by error:
    /// no partial state exists to reconcile, the session is simply
    /// `Failed` for this attempt.
    pub async fn connect(&mut self) -> Result<()> {
        if self.state == SessionState::Ready {
            return Ok(());
        }

        self.state = SessionState::Connecting;

        match transport::connect(&self.config).await {
            Ok(t) => self.transport = Some(t),
            Err(e) => {
                self.state = SessionState::Failed;
                return Err(e.into());
            }
        }

        // Blind read until a known prompt: this establishes the
        // command/response synchronization everything else relies on.
        match self.read_until_prompt().await {
            Ok(banner) => {
                trace!("Synchronized after {} banner bytes", banner.len());
                self.state = SessionState::Ready;
                Ok(())
            }
            Err(e) => {
                self.state = SessionState::Failed;
                self.release_transport().await;
                Err(e)
            }
        }
    }

    /// Release the connection. Idempotent and safe to call from any
    /// state.
    pub async fn disconnect(&mut self) {
        self.release_transport().await;
        self.state = SessionState::Disconnected;
    }

    async fn release_transport(&mut self) {
        if let Some(mut t) = self.transport.take() {
            if let Err(e) = t.close().await {
                warn!("Error closing transport to {}: {e}", self.config.host);
            }
        }
    }

    /// Execute one command and wait for the prompt.
    ///
    /// Requires the Ready state; in any other state this returns a
    /// failed result rather than an error. Send/read failures are
    /// likewise captured into the result.
    pub async fn execute(&mut self, command: &str) -> CommandResult {
        if self.state != SessionState::Ready {
            return CommandResult::failed(
                SessionError::NotReady {
                    state: self.state.name(),
                }
                .to_string(),
            );
        }

        debug!("[{}] executing: {command}", self.config.host);

        self.drain_pending().await;

        if let Err(e) = self.send_line(command).await {
            return CommandResult::failed(e.to_string());
        }

        match self.read_until_prompt().await {
            Ok(raw) => CommandResult::ok(strip_echo(&raw, command)),
            Err(e) => CommandResult::failed(e.to_string()),
        }
    }

    /// Execute commands one at a time, stopping at the first failure.
    ///
    /// A step fails on a transport error, a prompt timeout, or in-band
    /// device error text in its output; no subsequent command is sent
    /// after a failed step. The returned vector holds only the results
    /// obtained so far. There is no rollback: a partial application is
    /// possible and must be surfaced to the caller as such.
    pub async fn execute_sequence(&mut self, commands: &[String]) -> Vec<CommandResult> {
        let mut results = Vec::with_capacity(commands.len());

        for command in commands {
            let mut result = self.execute(command).await;

            if result.success && contains_error_text(&result.output) {
                warn!(
                    "[{}] device rejected '{command}': {}",
                    self.config.host,
                    result.output.trim()
                );
                let message = format!("OLT error: {}", result.output.trim());
                result = CommandResult::rejected(result.output, message);
            }

            let stop = !result.success;
            results.push(result);
            if stop {
                // Stop on first failure for safe operation.
                break;
            }
        }

        results
    }

    async fn send_line(&mut self, command: &str) -> Result<()> {
        let transport = self.require_transport()?;
        let line = format!("{command}\n");
        if let Err(e) = transport.send(line.as_bytes()).await {
            self.fail_on_disconnect(&e);
            return Err(e.into());
        }
        Ok(())
    }

    /// Discard unsolicited output (alarms, log spill) sitting in the
    /// receive path so it cannot be attributed to the next command.
    async fn drain_pending(&mut self) {
        let Some(transport) = self.transport.as_mut() else {
            return;
        };
        while let Ok(Ok(chunk)) =
            tokio::time::timeout(DRAIN_WINDOW, transport.read_chunk()).await
        {
            trace!("Discarding {} unsolicited bytes", chunk.len());
        }
    }

    /// Accumulate output until a known prompt appears, or fail with
    /// [`SessionError::PromptTimeout`] after `command_timeout`. The
    /// timeout is never silently retried here.
    async fn read_until_prompt(&mut self) -> Result<String> {
        let timeout = self.config.command_timeout;
        let deadline = tokio::time::Instant::now() + timeout;

        self.buffer.clear();

        loop {
            let transport = self.require_transport()?;

            let chunk = match tokio::time::timeout_at(deadline, transport.read_chunk()).await {
                Ok(Ok(chunk)) => chunk,
                Ok(Err(e)) => {
                    self.fail_on_disconnect(&e);
                    return Err(e.into());
                }
                Err(_) => return Err(SessionError::PromptTimeout(timeout).into()),
            };

            self.buffer.extend(&chunk);

            if let Some(idx) = self.prompts.first_match(self.buffer.tail()) {
                trace!("Prompt pattern {idx} matched after {} bytes", self.buffer.len());
                let raw = self.buffer.take();
                return Ok(String::from_utf8_lossy(&raw).into_owned());
            }
        }
    }

    fn require_transport(&mut self) -> std::result::Result<&mut Box<dyn Transport>, Error> {
        let state = self.state.name();
        self.transport
            .as_mut()
            .ok_or_else(|| SessionError::NotReady { state }.into())
    }

    /// A dead peer is fatal for the session; everything else is
    /// command-level.
    fn fail_on_disconnect(&mut self, error: &TransportError) {
        if matches!(error, TransportError::Disconnected) {
            warn!("[{}] connection lost, session failed", self.config.host);
            self.state = SessionState::Failed;
        }
    }

    #[cfg(test)]
    pub(crate) fn for_testing(transport: Box<dyn Transport>, command_timeout: Duration) -> Self {
        use crate::transport::TransportKind;
        use secrecy::SecretString;

        let mut config = SessionConfig::new(
            "test-olt",
            TransportKind::Ssh,
            "admin",
            SecretString::from("admin"),
        );
        config.command_timeout = command_timeout;

        Self {
            config,
            transport: Some(transport),
            state: SessionState::Ready,
            prompts: PromptSet,
            buffer: PatternBuffer::default(),
        }
    }
}

/// Drop the first line when it echoes the sent command, then trim.
fn strip_echo(raw: &str, command: &str) -> String {
    let mut lines: Vec<&str> = raw.split('\n').collect();
    if lines
        .first()
        .is_some_and(|first| first.contains(command))
    {
        lines.remove(0);
    }
    lines.join("\n").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::{Arc, Mutex};

    use crate::transport::mock::MockTransport;

    fn session_with(responses: &[&[u8]]) -> (CliSession, Arc<Mutex<Vec<String>>>) {
        let _ = env_logger::builder().is_test(true).try_init();
        let (transport, sent) = MockTransport::scripted(responses);
        (
            CliSession::for_testing(Box::new(transport), Duration::from_millis(500)),
            sent,
        )
    }

    #[tokio::test]
    async fn test_execute_strips_command_echo() {
        let (mut session, _) =
            session_with(&[b"show version\r\nZXAN V2.1.0 software\r\nZXAN#"]);

        let result = session.execute("show version").await;
        assert!(result.success);
        assert!(!result.output.contains("show version"));
        assert!(result.output.contains("V2.1.0"));
    }

    #[tokio::test]
    async fn test_execute_requires_ready_state() {
        use crate::transport::TransportKind;
        use secrecy::SecretString;

        let config = SessionConfig::new(
            "10.0.0.1",
            TransportKind::Ssh,
            "admin",
            SecretString::from("admin"),
        );
        let mut session = CliSession::new(config);

        let result = session.execute("show version").await;
        assert!(!result.success);
        assert!(result.error.unwrap().contains("not ready"));
    }

    #[tokio::test]
    async fn test_execute_times_out_without_prompt() {
        // Response never carries a prompt, so the read loop must fail.
        let (transport, _) = MockTransport::scripted(&[]);
        let mut session =
            CliSession::for_testing(Box::new(transport), Duration::from_millis(100));

        let result = session.execute("show version").await;
        assert!(!result.success);
        assert!(result.error.unwrap().contains("No prompt"));
    }

    #[tokio::test]
    async fn test_sequence_stops_at_first_failure() {
        let (mut session, sent) = session_with(&[
            b"configure terminal\r\nZXAN(config)#",
            b"interface gpon-olt_9/9/9\r\n%Error: port does not exist\r\nZXAN(config)#",
            b"never reached\r\nZXAN#",
        ]);

        let commands = vec![
            "configure terminal".to_string(),
            "interface gpon-olt_9/9/9".to_string(),
            "onu 1 type auto sn ZTEGC0000001".to_string(),
        ];
        let results = session.execute_sequence(&commands).await;

        assert_eq!(results.len(), 2);
        assert!(results[0].success);
        assert!(!results[1].success);
        assert!(results[1].error.as_deref().unwrap().contains("OLT error"));

        // The third command was never sent to the transport.
        let sent = sent.lock().unwrap();
        assert_eq!(sent.len(), 2);
        assert!(sent[1].starts_with("interface gpon-olt_9/9/9"));
    }

    #[tokio::test]
    async fn test_sequence_all_success() {
        let (mut session, _) = session_with(&[
            b"configure terminal\r\nZXAN(config)#",
            b"exit\r\nZXAN#",
        ]);

        let commands = vec!["configure terminal".to_string(), "exit".to_string()];
        let results = session.execute_sequence(&commands).await;

        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| r.success));
    }

    #[test]
    fn test_strip_echo_without_echo_line() {
        // No echo: output passes through minus surrounding whitespace.
        let out = strip_echo("ZXAN V2.1.0\r\nZXAN#", "show version");
        assert_eq!(out, "ZXAN V2.1.0\r\nZXAN#");
    }

    #[test]
    fn test_state_names() {
        assert_eq!(SessionState::Disconnected.name(), "disconnected");
        assert_eq!(SessionState::Failed.name(), "failed");
    }
}
