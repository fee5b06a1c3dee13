//! This crate allows a script to observe and drive a remotely instrumented
//! program.
//!
//! The instrumented program streams trace events (scopes, data, locks,
//! markers) and exposes remote commands (CLIs) and freeze points. This crate
//! is the client-side engine on top of that stream:
//! - It turns the pushed notifications into structured [Event]s, buffered
//!   until a script collects them.
//! - It tracks which threads are frozen on a freeze point, and lets scripts
//!   step them forward.
//! - It turns asynchronous command answers into synchronous calls with a
//!   timeout.
//! - It launches (or attaches to) the program and shuts it down.
//!
//! # Plugging a transport
//!
//! Socket handling and event decoding are not part of this crate. They are
//! provided by an implementor of the [Transport](self::transport::Transport)
//! trait, which receives outbound commands and pushes inbound
//! [Notification](self::notification::Notification)s through the
//! [Notifier](self::notification::Notifier) it is handed at startup.
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use scry_remote::{CollectOptions, EventSpec, LaunchOptions, Remote, RemoteConfig};
//! # use scry_remote::transport::Transport;
//!
//! # async fn run<T: Transport>(transport: T) -> scry_remote::Result<(), T::Error> {
//! let remote = Remote::initialize(transport, RemoteConfig::default())?;
//!
//! remote.register_specs([EventSpec::new(["Add fruit"]).with_thread("Control")])?;
//! remote.launch(LaunchOptions::new("./testprogram").arg("collect")).await?;
//!
//! let events = remote
//!     .collect(
//!         CollectOptions::new()
//!             .wanted(["Add fruit"])
//!             .timeout(Duration::from_secs(2)),
//!     )
//!     .await?;
//!
//! for event in events {
//!     println!("{event}");
//! }
//!
//! remote.stop().await;
//! # Ok(())
//! # }
//! ```

mod cli;
mod collect;
mod config;
mod error;
mod event;
mod freeze;
mod hash;
mod launch;
mod lookup;
mod registry;
mod remote;
mod report;
mod session;
mod spec;
mod state;
mod strings;
mod thread;
mod wait;

/// Module containing the inbound side of the transport boundary.
pub mod notification;

/// Module containing the outbound side of the transport boundary.
pub mod transport;

pub use self::cli::{CliAnswer, CliDecl};
pub use self::collect::CollectOptions;
pub use self::config::{ConfigError, EventDecl, RemoteConfig, SpecDecl, SpecSet};
pub use self::error::{Error, Result, TransportError};
pub use self::event::{ElemDecl, Event, EventKind, EventKindInfo, EventValue, RawEvent};
pub use self::freeze::{DEFAULT_FREEZE_TIMEOUT, DEFAULT_STEP_TIMEOUT};
pub use self::hash::{HashWidth, fnv1a_32, fnv1a_64, hash_string};
pub use self::launch::LaunchOptions;
pub use self::lookup::{ExternalStrings, placeholder};
pub use self::registry::{UnresolvedElem, UnresolvedEvent, UnresolvedReason};
pub use self::remote::Remote;
pub use self::session::{ConnectOptions, RecordInfo};
pub use self::spec::{EventSpec, PathToken, display_path, parse_path};
pub use self::thread::ThreadDecl;
