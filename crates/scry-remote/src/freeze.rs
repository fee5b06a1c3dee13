use std::time::Duration;

use tokio::time::Instant;

use crate::cli::RemoteRequest;
use crate::error::{Error, Result};
use crate::remote::Remote;
use crate::transport::Transport;
use crate::wait::poll_until;

/// Usual timeout of [Remote::wait_for_freeze].
pub const DEFAULT_FREEZE_TIMEOUT: Duration = Duration::from_secs(3);

/// Usual timeout of [Remote::step_continue].
pub const DEFAULT_STEP_TIMEOUT: Duration = Duration::from_secs(1);

/// Threads frozen on a freeze point, as a bitmap of thread ids.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct FrozenThreadSet {
    frozen: u64,

    /// Bits which changed since the last [reset_changes](Self::reset_changes).
    changed: u64,
}

impl FrozenThreadSet {
    pub fn update(&mut self, frozen: u64) {
        self.changed |= self.frozen ^ frozen;
        self.frozen = frozen;
    }

    pub fn reset_changes(&mut self) {
        self.changed = 0;
    }

    pub const fn frozen(&self) -> u64 {
        self.frozen
    }

    pub const fn all_changed(&self, mask: u64) -> bool {
        self.changed & mask == mask
    }

    pub const fn all_frozen(&self, mask: u64) -> bool {
        self.frozen & mask == mask
    }
}

impl<T: Transport> Remote<T> {
    /// Enables or disables the freeze points of the program.
    ///
    /// The mode is remembered and applied to the next sessions as well, so
    /// it can be set before connecting.
    pub async fn set_freeze_mode(&self, enabled: bool) -> Result<(), T::Error> {
        self.ensure_initialized()?;

        self.shared.program.lock().freeze_mode = enabled;

        match self
            .remote_call(RemoteRequest::FreezeMode(enabled), self.config().cli_timeout())
            .await
        {
            Err(e) if e.is_connection_error() => {
                tracing::debug!("freeze mode not sent: {e}");
                Ok(())
            }
            res => res.map(|_| ()),
        }
    }

    /// Returns the names of the threads currently frozen.
    pub fn frozen_threads(&self) -> Vec<String> {
        let record = self.shared.record.lock();
        let frozen = record.freeze.frozen();

        (0..u64::BITS)
            .filter(|bit| frozen & (1u64 << bit) != 0)
            .filter_map(|bit| record.threads.name(bit))
            .map(str::to_owned)
            .collect()
    }

    /// Waits until all the given threads are frozen.
    ///
    /// Returns the threads actually frozen when returning, which are all of
    /// them unless the timeout expired. Scripts without a specific bound use
    /// [DEFAULT_FREEZE_TIMEOUT].
    pub async fn wait_for_freeze<S: AsRef<str>>(
        &self,
        thread_names: &[S],
        timeout: Duration,
    ) -> Result<Vec<String>, T::Error> {
        self.ensure_initialized()?;

        let mut frozen = Vec::new();

        poll_until(&self.shared.record_wake, Instant::now() + timeout, || {
            let record = self.shared.record.lock();

            frozen = thread_names
                .iter()
                .map(AsRef::as_ref)
                .filter(|name| {
                    record
                        .threads
                        .bit_of_name(name, &record.strings)
                        .is_some_and(|bit| record.freeze.all_frozen(bit))
                })
                .map(str::to_owned)
                .collect();

            frozen.len() == thread_names.len()
        })
        .await;

        Ok(frozen)
    }

    /// Releases the given threads from their freeze point, and waits until
    /// all of them changed their frozen state (i.e. they reached the next
    /// freeze point, or they are running).
    ///
    /// Returns whether all of them changed before the timeout expired.
    /// Scripts without a specific bound use [DEFAULT_STEP_TIMEOUT].
    #[tracing::instrument(name = "StepContinue", skip_all)]
    pub async fn step_continue<S: AsRef<str>>(
        &self,
        thread_names: &[S],
        timeout: Duration,
    ) -> Result<bool, T::Error> {
        self.ensure_initialized()?;

        let deadline = Instant::now() + timeout;

        let mask = {
            let mut record = self.shared.record.lock();

            let mut mask = 0;
            for name in thread_names.iter().map(AsRef::as_ref) {
                let Some(bit) = record.threads.bit_of_name(name, &record.strings) else {
                    return Err(Error::UnknownThread(name.to_owned()));
                };
                mask |= bit;
            }

            record.freeze.reset_changes();
            mask
        };

        let remaining = deadline.saturating_duration_since(Instant::now());
        self.remote_call(RemoteRequest::StepContinue(mask), remaining)
            .await?;

        let changed = poll_until(&self.shared.record_wake, deadline, || {
            self.shared.record.lock().freeze.all_changed(mask)
        })
        .await;

        tracing::debug!(mask, changed, "step continue");

        Ok(changed)
    }
}
