use std::sync::Arc;

use crate::cli::{CliAnswer, CliDecl};
use crate::event::{ElemDecl, RawEvent};
use crate::hash::HashWidth;
use crate::registry::UnresolvedElem;
use crate::session::RecordInfo;
use crate::state::Shared;
use crate::thread::ThreadDecl;

/// Severity of a transport log message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    /// Detail, for debugging the transport.
    Detail,

    /// Information.
    Info,

    /// Warning.
    Warning,

    /// Error.
    Error,
}

/// Item pushed by the transport.
#[derive(Clone, Debug)]
pub enum Notification {
    /// A program connected and started its record.
    RecordStarted(RecordInfo),

    /// The record ended (program exited or connection lost).
    RecordEnded,

    /// Log message from the transport.
    Log {
        /// Severity.
        level: LogLevel,

        /// Message.
        message: String,
    },

    /// Answer to the in-flight request.
    CommandAnswer(CliAnswer),

    /// New bitmap of the frozen threads.
    FrozenThreads(u64),

    /// New strings, as (hash, value) pairs.
    ///
    /// An empty value denotes an external string.
    Strings(Vec<(u64, String)>),

    /// End of a notification batch.
    CollectionTick,

    /// New threads.
    Threads(Vec<ThreadDecl>),

    /// New elems.
    Elems(Vec<ElemDecl>),

    /// New remote commands.
    Clis(Vec<CliDecl>),

    /// New events, in depth-first order.
    Events(Vec<RawEvent>),

    /// Latest resolution report of the registered specs.
    Unresolved(Vec<UnresolvedElem>),
}

/// Inbound sink of the transport.
///
/// It is handed to the transport when it starts listening. Notifications
/// are never blocking, and can be pushed from any thread, including from
/// inside an outbound transport call.
#[derive(Clone)]
pub struct Notifier {
    shared: Arc<Shared>,
}

impl Notifier {
    pub(crate) const fn new(shared: Arc<Shared>) -> Self {
        Self { shared }
    }

    /// Handles a notification.
    pub fn notify(&self, notification: Notification) {
        let shared = &*self.shared;

        match notification {
            Notification::RecordStarted(info) => {
                tracing::info!(app = %info.app_name, build = %info.build_name, "record started");

                let width = if info.short_hash {
                    HashWidth::Short
                } else {
                    HashWidth::Long
                };
                shared
                    .record
                    .lock()
                    .strings
                    .configure(info.strings_external, width);

                let mut program = shared.program.lock();
                program.info = Some(info);
                program.connected = true;
                shared.connection.notify_waiters();
            }
            Notification::RecordEnded => {
                tracing::info!("record ended");

                shared.program.lock().connected = false;
                shared.connection.notify_waiters();

                shared.command.lock().set_lost();
                shared.answer.notify_waiters();

                shared.record_wake.notify_waiters();
            }
            Notification::Log { level, message } => match level {
                LogLevel::Detail => tracing::debug!(target: "scry::transport", "{message}"),
                LogLevel::Info => tracing::info!(target: "scry::transport", "{message}"),
                LogLevel::Warning => tracing::warn!(target: "scry::transport", "{message}"),
                LogLevel::Error => tracing::error!(target: "scry::transport", "{message}"),
            },
            Notification::CommandAnswer(answer) => {
                shared.command.lock().set_answer(answer);
                shared.answer.notify_waiters();
            }
            Notification::FrozenThreads(bitmap) => {
                tracing::debug!(bitmap, "frozen threads");

                shared.record.lock().freeze.update(bitmap);
                shared.record_wake.notify_waiters();
            }
            Notification::Strings(strings) => {
                tracing::debug!(count = strings.len(), "new strings");
                shared.record.lock().strings.insert_batch(strings);
            }
            Notification::CollectionTick => {
                shared.record.lock().ticks += 1;
                shared.record_wake.notify_waiters();
            }
            Notification::Threads(threads) => {
                tracing::debug!(count = threads.len(), "new threads");

                let mut record = shared.record.lock();
                let record = &mut *record;
                for decl in threads {
                    record.threads.insert(decl, &record.strings);
                }
            }
            Notification::Elems(elems) => {
                tracing::debug!(count = elems.len(), "new elems");

                let mut record = shared.record.lock();
                let record = &mut *record;
                for decl in elems {
                    record.elems.insert(decl, &record.strings, &record.threads);
                }
            }
            Notification::Clis(clis) => {
                tracing::debug!(count = clis.len(), "new clis");
                shared.record.lock().clis.extend(clis);
            }
            Notification::Events(events) => {
                tracing::debug!(count = events.len(), "new events");

                let mut record = shared.record.lock();
                let record = &mut *record;
                record
                    .events
                    .push_batch(&events, &record.elems, &record.strings);
                shared.record_wake.notify_waiters();
            }
            Notification::Unresolved(unresolved) => {
                shared.record.lock().specs.set_unresolved(unresolved);
            }
        }
    }
}
