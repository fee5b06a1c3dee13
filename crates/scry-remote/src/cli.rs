use std::fmt;
use std::time::Duration;

use tokio::time::Instant;

use crate::error::{Error, Result, TransportError};
use crate::remote::Remote;
use crate::transport::Transport;
use crate::wait::poll_until;

/// Answer to a remote command.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CliAnswer {
    /// Command status (0 on success, command-specific code otherwise).
    pub status: i32,

    /// Command output, or explanation of the failure.
    pub text: String,
}

impl CliAnswer {
    /// Returns whether the command succeeded.
    pub const fn is_success(&self) -> bool {
        self.status == 0
    }
}

/// Remote command registered by the program.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct CliDecl {
    /// Command name.
    pub name: String,

    /// Parameter specification (e.g. `condvalue=int`).
    pub param_spec: String,

    /// Human readable description.
    pub description: String,
}

/// Answer slot of the in-flight remote call.
#[derive(Default)]
pub(crate) struct CommandSlot {
    answer: Option<CliAnswer>,
    lost: bool,
}

impl CommandSlot {
    pub fn reset(&mut self) {
        self.answer = None;
        self.lost = false;
    }

    pub fn set_answer(&mut self, answer: CliAnswer) {
        self.answer = Some(answer);
    }

    pub fn set_lost(&mut self) {
        self.lost = true;
    }
}

/// Request answered by the program through the command answer slot.
#[derive(Clone, Copy)]
pub(crate) enum RemoteRequest<'a> {
    Cli(&'a str),
    FreezeMode(bool),
    StepContinue(u64),
    MaxLatency(Duration),
}

impl fmt::Display for RemoteRequest<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cli(command) => write!(f, "command '{command}'"),
            Self::FreezeMode(enabled) => write!(f, "freeze mode {enabled}"),
            Self::StepContinue(bitmap) => write!(f, "step continue {bitmap:#x}"),
            Self::MaxLatency(latency) => write!(f, "max latency {latency:?}"),
        }
    }
}

impl<T: Transport> Remote<T> {
    /// Calls a remote command on the program, and waits for its answer.
    ///
    /// A non-zero status is not an error: it is returned in the answer,
    /// along with its explanation.
    #[tracing::instrument(name = "Cli", skip(self))]
    pub async fn cli(&self, command: &str, timeout: Duration) -> Result<CliAnswer, T::Error> {
        self.remote_call(RemoteRequest::Cli(command), timeout).await
    }

    /// Sends a request to the program, and waits for its acknowledgement.
    ///
    /// Only one request is in flight at a time: concurrent callers wait for
    /// their turn, which counts in their timeout.
    pub(crate) async fn remote_call(
        &self,
        request: RemoteRequest<'_>,
        timeout: Duration,
    ) -> Result<CliAnswer, T::Error> {
        self.ensure_initialized()?;

        let deadline = Instant::now() + timeout;

        let Ok(_gate) = tokio::time::timeout_at(deadline, self.call_gate.lock()).await else {
            return Err(Error::CallTimeout(request.to_string(), timeout));
        };

        // Reset first: a record end landing after the check must stay visible.
        self.shared.command.lock().reset();

        if !self.shared.program.lock().connected {
            return Err(Error::NotConnected);
        }

        match request {
            RemoteRequest::Cli(command) => self.transport().send_cli_request(command),
            RemoteRequest::FreezeMode(enabled) => self.transport().set_freeze_mode(enabled),
            RemoteRequest::StepContinue(bitmap) => self.transport().step_continue(bitmap),
            RemoteRequest::MaxLatency(latency) => self.transport().set_max_latency(latency),
        }
        .map_err(TransportError)?;

        let mut outcome = None;

        poll_until(&self.shared.answer, deadline, || {
            let mut slot = self.shared.command.lock();

            if let Some(answer) = slot.answer.take() {
                outcome = Some(Ok(answer));
            } else if slot.lost {
                outcome = Some(Err(Error::ConnectionLost(request.to_string())));
            }

            outcome.is_some()
        })
        .await;

        let outcome =
            outcome.unwrap_or_else(|| Err(Error::CallTimeout(request.to_string(), timeout)));

        match &outcome {
            Ok(answer) => tracing::debug!(%request, status = answer.status, "answer received"),
            Err(e) => tracing::debug!(%request, "no answer: {e}"),
        }

        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::{CliAnswer, RemoteRequest};

    #[test]
    fn success_is_status_zero() {
        assert!(CliAnswer { status: 0, text: String::new() }.is_success());
        assert!(!CliAnswer { status: 2, text: "bad".to_owned() }.is_success());
    }

    #[test]
    fn requests_are_described() {
        assert_eq!(RemoteRequest::Cli("async_assert condvalue=0").to_string(), "command 'async_assert condvalue=0'");
        assert_eq!(RemoteRequest::StepContinue(0b101).to_string(), "step continue 0x5");
    }
}
