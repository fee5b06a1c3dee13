use std::path::Path;
use std::time::Duration;

use crate::notification::Notifier;
use crate::spec::EventSpec;

/// Trait implementing the outbound side of the connection with the
/// instrumented program.
///
/// Calls are not expected to block: they queue a request and return.
/// Answers and state changes come back as notifications, possibly from
/// inside the call itself.
pub trait Transport {
    /// Error type of the transport.
    type Error: std::error::Error;

    /// Starts accepting a program connection on the given port.
    fn start_listening(&self, port: u16, notifier: Notifier) -> Result<(), Self::Error>;

    /// Stops accepting connections.
    fn stop_listening(&self) -> Result<(), Self::Error>;

    /// Sets the file where the next sessions are recorded (no record if
    /// `None`).
    fn set_record_file(&self, path: Option<&Path>) -> Result<(), Self::Error>;

    /// Removes all the registered specs.
    fn clear_specs(&self) -> Result<(), Self::Error>;

    /// Registers a spec. Its events are reported with the given identifier.
    fn add_spec(&self, spec_id: usize, spec: &EventSpec) -> Result<(), Self::Error>;

    /// Drops the events decoded but not notified yet.
    fn clear_buffered_events(&self) -> Result<(), Self::Error>;

    /// Sends a remote command request.
    fn send_cli_request(&self, command: &str) -> Result<(), Self::Error>;

    /// Enables or disables the freeze points.
    fn set_freeze_mode(&self, enabled: bool) -> Result<(), Self::Error>;

    /// Releases the threads of the given bitmap from their freeze point.
    fn step_continue(&self, thread_bitmap: u64) -> Result<(), Self::Error>;

    /// Sets the maximum latency of notification batches.
    fn set_max_latency(&self, latency: Duration) -> Result<(), Self::Error>;
}
