use parking_lot::Mutex;
use tokio::sync::Notify;

use crate::cli::{CliDecl, CommandSlot};
use crate::event::{ElemTable, EventBuffer};
use crate::freeze::FrozenThreadSet;
use crate::registry::SpecRegistry;
use crate::session::RecordInfo;
use crate::strings::StringTable;
use crate::thread::ThreadTable;

/// State shared between the notification path and the public API.
///
/// Each lock has a [Notify] signaled after every change that a blocking
/// call may be waiting for. Locks are never held across an `.await`, nor
/// while calling the transport.
#[derive(Default)]
pub(crate) struct Shared {
    pub record: Mutex<RecordState>,
    pub record_wake: Notify,

    pub program: Mutex<ProgramState>,
    pub connection: Notify,

    pub command: Mutex<CommandSlot>,
    pub answer: Notify,
}

/// What the program told about its record.
#[derive(Default)]
pub(crate) struct RecordState {
    pub strings: StringTable,
    pub threads: ThreadTable,
    pub elems: ElemTable,
    pub clis: Vec<CliDecl>,
    pub events: EventBuffer,
    pub freeze: FrozenThreadSet,

    /// Number of notification batches delivered.
    pub ticks: u64,

    /// Kept across sessions.
    pub specs: SpecRegistry,
}

impl RecordState {
    /// Forgets everything tied to the previous session.
    pub fn reset(&mut self) {
        self.strings.reset();
        self.threads.reset();
        self.elems.reset();
        self.clis.clear();
        self.events.clear();
        self.freeze = FrozenThreadSet::default();
        self.ticks = 0;
    }
}

/// Connection and process state.
#[derive(Default)]
pub(crate) struct ProgramState {
    pub initialized: bool,
    pub connected: bool,
    pub info: Option<RecordInfo>,

    /// Kept across sessions.
    pub freeze_mode: bool,

    pub quit_cli: Option<String>,
    pub stdout_lines: Vec<String>,
    pub stderr_lines: Vec<String>,
}

impl ProgramState {
    pub fn reset(&mut self, quit_cli: Option<String>) {
        self.connected = false;
        self.info = None;
        self.quit_cli = quit_cli;
        self.stdout_lines.clear();
        self.stderr_lines.clear();
    }
}
