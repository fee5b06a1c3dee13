use std::path::Path;
use std::sync::Arc;

use crate::cli::CliDecl;
use crate::config::RemoteConfig;
use crate::error::{Error, Result, TransportError};
use crate::event::EventKindInfo;
use crate::lookup::ExternalStrings;
use crate::notification::Notifier;
use crate::session::ProcessSlot;
use crate::state::Shared;
use crate::transport::Transport;

/// Remote control of an instrumented program.
///
/// It controls one program at a time, either launched by it or connecting
/// by itself.
pub struct Remote<T> {
    transport: T,
    config: RemoteConfig,
    pub(crate) shared: Arc<Shared>,

    /// Serializes the remote calls.
    pub(crate) call_gate: tokio::sync::Mutex<()>,

    pub(crate) process: parking_lot::Mutex<ProcessSlot>,
}

impl<T: Transport> Remote<T> {
    /// Starts listening for program connections.
    ///
    /// The external strings lookup file of the configuration, if any, is
    /// loaded.
    #[tracing::instrument(name = "RemoteInit", skip_all, fields(port = config.port))]
    pub fn initialize(transport: T, config: RemoteConfig) -> Result<Self, T::Error> {
        let remote = Self {
            transport,
            config,
            shared: Arc::new(Shared::default()),
            call_gate: tokio::sync::Mutex::new(()),
            process: parking_lot::Mutex::new(ProcessSlot::default()),
        };

        if let Some(path) = &remote.config.external_strings {
            let lookup = ExternalStrings::from_path(path)?;
            remote.shared.record.lock().strings.set_overrides(lookup);
        }

        remote
            .transport
            .start_listening(remote.config.port, Notifier::new(Arc::clone(&remote.shared)))
            .map_err(TransportError)?;

        remote.shared.program.lock().initialized = true;

        tracing::info!("listening for program connections");

        Ok(remote)
    }

    /// Stops the program, if any, and stops listening for connections.
    ///
    /// Any later call fails with [Error::NotInitialized].
    pub async fn uninitialize(&self) -> Result<(), T::Error> {
        self.ensure_initialized()?;

        self.stop().await;

        self.shared.program.lock().initialized = false;
        self.transport.stop_listening().map_err(TransportError)?;

        Ok(())
    }

    pub(crate) fn ensure_initialized(&self) -> Result<(), T::Error> {
        if self.shared.program.lock().initialized {
            Ok(())
        } else {
            Err(Error::NotInitialized)
        }
    }

    /// Returns the transport.
    pub const fn transport(&self) -> &T {
        &self.transport
    }

    /// Returns the configuration.
    pub const fn config(&self) -> &RemoteConfig {
        &self.config
    }

    /// Sets the values of the external strings.
    ///
    /// They apply from the next connection on.
    pub fn set_external_strings(&self, lookup: ExternalStrings) {
        self.shared.record.lock().strings.set_overrides(lookup);
    }

    /// Loads the values of the external strings from a lookup file.
    ///
    /// They apply from the next connection on.
    pub fn load_external_strings(&self, path: impl AsRef<Path>) -> Result<(), T::Error> {
        let lookup = ExternalStrings::from_path(path)?;
        self.set_external_strings(lookup);
        Ok(())
    }

    /// Hashes a string the way the connected program does.
    pub fn hash_string(&self, s: &str) -> u64 {
        self.shared.record.lock().strings.hash(s)
    }

    /// Returns the names of the threads of the program.
    pub fn known_threads(&self) -> Vec<String> {
        self.shared.record.lock().threads.known()
    }

    /// Returns the kinds of event the program may send.
    pub fn known_event_kinds(&self) -> Vec<EventKindInfo> {
        self.shared.record.lock().elems.kinds()
    }

    /// Returns the remote commands of the program.
    pub fn known_clis(&self) -> Vec<CliDecl> {
        self.shared.record.lock().clis.clone()
    }
}
