use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use scry_remote::notification::{Notification, Notifier};
use scry_remote::transport::Transport;
use scry_remote::{
    CliAnswer, CliDecl, ConnectOptions, ElemDecl, EventSpec, RawEvent, RecordInfo, Remote,
    RemoteConfig, ThreadDecl, fnv1a_64,
};

pub const CONTROL: u32 = 0;
pub const WORKER: u32 = 1;

pub const MAIN: u32 = 0;
pub const ADD_FRUIT: u32 = 1;
pub const REMOVE_FRUIT: u32 = 2;
pub const WORK: u32 = 3;

#[derive(Debug, thiserror::Error)]
#[error("fake transport failure")]
pub struct FakeError;

/// Request received by the fake transport.
#[derive(Clone, Debug, PartialEq)]
pub enum Outbound {
    StartListening(u16),
    StopListening,
    RecordFile(Option<PathBuf>),
    ClearSpecs,
    AddSpec(usize, EventSpec),
    ClearBufferedEvents,
    Cli(String),
    FreezeMode(bool),
    StepContinue(u64),
    MaxLatency(Duration),
}

type Responder = Box<dyn Fn(&Outbound, &Notifier) + Send + Sync>;

/// Transport playing the program side with a scripted responder.
#[derive(Clone)]
pub struct FakeTransport {
    inner: Arc<Inner>,
}

struct Inner {
    notifier: Mutex<Option<Notifier>>,
    sent: Mutex<Vec<Outbound>>,
    responder: Mutex<Responder>,
}

impl FakeTransport {
    /// A program which connects as soon as a session is prepared, and
    /// acknowledges every control request.
    pub fn new() -> Self {
        Self::with_responder(default_responder)
    }

    /// A program which never connects.
    pub fn silent() -> Self {
        Self::with_responder(|_, _| ())
    }

    pub fn with_responder(responder: impl Fn(&Outbound, &Notifier) + Send + Sync + 'static) -> Self {
        Self {
            inner: Arc::new(Inner {
                notifier: Mutex::new(None),
                sent: Mutex::new(Vec::new()),
                responder: Mutex::new(Box::new(responder)),
            }),
        }
    }

    pub fn notify(&self, notification: Notification) {
        let notifier = self.inner.notifier.lock().clone().expect("listening");
        notifier.notify(notification);
    }

    pub fn sent(&self) -> Vec<Outbound> {
        self.inner.sent.lock().clone()
    }

    /// Declares two threads (`Control`, `Worker`), four elems and a CLI.
    pub fn declare_record(&self) {
        self.notify(Notification::Strings(
            ["Control", "Worker", "Main", "Add fruit", "Remove fruit", "Work"]
                .into_iter()
                .map(|s| (h(s), s.to_owned()))
                .collect(),
        ));
        self.notify(Notification::Threads(vec![
            ThreadDecl { name_hash: h("Control"), thread_id: CONTROL },
            ThreadDecl { name_hash: h("Worker"), thread_id: WORKER },
        ]));
        self.notify(Notification::Elems(vec![
            elem("Main", MAIN, None, CONTROL, 0),
            elem("Add fruit", ADD_FRUIT, Some(MAIN), CONTROL, 2),
            elem("Remove fruit", REMOVE_FRUIT, Some(MAIN), CONTROL, 2),
            elem("Work", WORK, None, WORKER, 0),
        ]));
        self.notify(Notification::Clis(vec![CliDecl {
            name: "async_assert".to_owned(),
            param_spec: "condvalue=int".to_owned(),
            description: "Asserts asynchronously".to_owned(),
        }]));
        self.notify(Notification::CollectionTick);
    }

    fn handle(&self, outbound: Outbound) -> Result<(), FakeError> {
        self.inner.sent.lock().push(outbound.clone());

        let notifier = self.inner.notifier.lock().clone();
        if let Some(notifier) = notifier {
            (self.inner.responder.lock())(&outbound, &notifier);
        }

        Ok(())
    }
}

impl Transport for FakeTransport {
    type Error = FakeError;

    fn start_listening(&self, port: u16, notifier: Notifier) -> Result<(), Self::Error> {
        *self.inner.notifier.lock() = Some(notifier);
        self.handle(Outbound::StartListening(port))
    }

    fn stop_listening(&self) -> Result<(), Self::Error> {
        self.handle(Outbound::StopListening)
    }

    fn set_record_file(&self, path: Option<&Path>) -> Result<(), Self::Error> {
        self.handle(Outbound::RecordFile(path.map(Path::to_owned)))
    }

    fn clear_specs(&self) -> Result<(), Self::Error> {
        self.handle(Outbound::ClearSpecs)
    }

    fn add_spec(&self, spec_id: usize, spec: &EventSpec) -> Result<(), Self::Error> {
        self.handle(Outbound::AddSpec(spec_id, spec.clone()))
    }

    fn clear_buffered_events(&self) -> Result<(), Self::Error> {
        self.handle(Outbound::ClearBufferedEvents)
    }

    fn send_cli_request(&self, command: &str) -> Result<(), Self::Error> {
        self.handle(Outbound::Cli(command.to_owned()))
    }

    fn set_freeze_mode(&self, enabled: bool) -> Result<(), Self::Error> {
        self.handle(Outbound::FreezeMode(enabled))
    }

    fn step_continue(&self, thread_bitmap: u64) -> Result<(), Self::Error> {
        self.handle(Outbound::StepContinue(thread_bitmap))
    }

    fn set_max_latency(&self, latency: Duration) -> Result<(), Self::Error> {
        self.handle(Outbound::MaxLatency(latency))
    }
}

/// Connects on record file setup, and acknowledges control requests.
pub fn default_responder(outbound: &Outbound, notifier: &Notifier) {
    match outbound {
        Outbound::RecordFile(_) => notifier.notify(Notification::RecordStarted(record_info(false))),
        Outbound::FreezeMode(_) | Outbound::StepContinue(_) | Outbound::MaxLatency(_) => {
            notifier.notify(Notification::CommandAnswer(CliAnswer::default()))
        }
        _ => (),
    }
}

pub fn record_info(strings_external: bool) -> RecordInfo {
    RecordInfo {
        app_name: "fruits".to_owned(),
        build_name: "test".to_owned(),
        strings_external,
        short_hash: false,
        control_enabled: true,
    }
}

pub fn h(s: &str) -> u64 {
    fnv1a_64(s.as_bytes())
}

fn elem(name: &str, elem_id: u32, parent_id: Option<u32>, thread_id: u32, flags: u32) -> ElemDecl {
    ElemDecl {
        name_hash: h(name),
        elem_id,
        parent_id,
        thread_id,
        flags,
    }
}

pub fn raw(elem_id: u32, children: u32, value: u64) -> RawEvent {
    RawEvent {
        spec_id: 0,
        elem_id,
        children,
        name_hash: 0,
        date_ns: 1_000,
        value,
    }
}

pub fn config() -> RemoteConfig {
    RemoteConfig {
        cli_timeout_ms: 500,
        stop_grace_ms: 200,
        ..RemoteConfig::default()
    }
}

/// Remote connected to a program with a declared record.
pub async fn connected(transport: &FakeTransport) -> Remote<FakeTransport> {
    let remote = Remote::initialize(transport.clone(), config()).expect("initialize");

    remote
        .connect(ConnectOptions::new().connection_timeout(Duration::from_secs(1)))
        .await
        .expect("connect");

    transport.declare_record();

    remote
}
