use std::time::Duration;

use tokio::time::Instant;

use crate::error::{Result, TransportError};
use crate::event::Event;
use crate::remote::Remote;
use crate::state::RecordState;
use crate::transport::Transport;
use crate::wait::poll_until;

/// Extra ticks waited when exiting on frozen threads or on program exit.
///
/// Events are double-buffered by the program, so they may still be in flight
/// for up to two notification batches after the condition is observed.
const DOUBLE_BANK_TICKS: u64 = 2;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(1);
const MIN_TIMEOUT: Duration = Duration::from_millis(10);

/// Exit conditions of [collect](Remote::collect).
///
/// Collection stops on the first condition met, or when the timeout
/// expires.
#[derive(Clone, Debug)]
pub struct CollectOptions {
    wanted: Vec<String>,
    unwanted: Vec<String>,
    frozen_threads: Vec<String>,
    max_count: Option<usize>,
    timeout: Duration,
}

impl Default for CollectOptions {
    fn default() -> Self {
        Self {
            wanted: Vec::new(),
            unwanted: Vec::new(),
            frozen_threads: Vec::new(),
            max_count: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl CollectOptions {
    /// Constructs options without exit conditions, and a timeout of 1 s.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stops once an event with each of these names was collected.
    pub fn wanted<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.wanted.extend(names.into_iter().map(Into::into));
        self
    }

    /// Stops as soon as an event with one of these names is collected.
    pub fn unwanted<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.unwanted.extend(names.into_iter().map(Into::into));
        self
    }

    /// Stops once all these threads are frozen.
    pub fn frozen_threads<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.frozen_threads.extend(names.into_iter().map(Into::into));
        self
    }

    /// Stops once this many events were collected.
    pub const fn max_count(mut self, count: usize) -> Self {
        self.max_count = Some(count);
        self
    }

    /// Sets the timeout (10 ms at least).
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout.max(MIN_TIMEOUT);
        self
    }
}

/// Progress of a collection.
struct Collection {
    options: CollectOptions,
    events: Vec<Event>,

    /// Tick count after which the collection ends, once a condition is met.
    exit_tick: Option<u64>,
}

impl Collection {
    fn new(options: CollectOptions) -> Self {
        Self {
            options,
            events: Vec::new(),
            exit_tick: None,
        }
    }

    /// Drains the buffered events, and returns whether the collection ends.
    fn step(&mut self, record: &mut RecordState, is_running: bool) -> bool {
        let fresh = record.events.take_and_clear();

        if self.exit_tick.is_none() {
            self.exit_tick = self.exit_condition(record, &fresh, is_running);

            if let Some(exit_tick) = self.exit_tick {
                tracing::debug!(ticks = record.ticks, exit_tick, "exit condition met");
            }
        }

        self.events.extend(fresh);

        self.exit_tick.is_some_and(|exit_tick| exit_tick <= record.ticks)
    }

    /// Evaluates the exit conditions, by priority.
    fn exit_condition(&mut self, record: &RecordState, fresh: &[Event], is_running: bool) -> Option<u64> {
        let ticks = record.ticks;
        let opts = &mut self.options;

        if opts
            .max_count
            .is_some_and(|max| self.events.len() + fresh.len() >= max)
        {
            return Some(ticks);
        }

        if !opts.frozen_threads.is_empty() {
            let mask = opts.frozen_threads.iter().try_fold(0, |mask, name| {
                record
                    .threads
                    .bit_of_name(name, &record.strings)
                    .map(|bit| mask | bit)
            });

            if mask.is_some_and(|mask| record.freeze.all_frozen(mask)) {
                return Some(ticks + DOUBLE_BANK_TICKS);
            }
        }

        if !opts.wanted.is_empty() {
            for event in fresh {
                if let Some(idx) = opts.wanted.iter().position(|name| name == event.name()) {
                    opts.wanted.swap_remove(idx);
                }
            }

            if opts.wanted.is_empty() {
                return Some(ticks);
            }
        }

        if fresh
            .iter()
            .any(|event| opts.unwanted.iter().any(|name| name == event.name()))
        {
            return Some(ticks);
        }

        if !is_running {
            return Some(ticks + DOUBLE_BANK_TICKS);
        }

        None
    }
}

impl<T: Transport> Remote<T> {
    /// Collects the events received from the program, until an exit
    /// condition is met or the timeout expires.
    ///
    /// When a condition is met, the collection goes on until the events
    /// already sent by the program are received. The exit conditions are
    /// checked in this order:
    ///
    /// 1. The maximum count of events is reached.
    /// 2. All the given threads are frozen.
    /// 3. All the wanted events were collected.
    /// 4. An unwanted event was collected.
    /// 5. The program is not running anymore.
    #[tracing::instrument(name = "Collect", skip_all)]
    pub async fn collect(&self, options: CollectOptions) -> Result<Vec<Event>, T::Error> {
        self.ensure_initialized()?;

        let deadline = Instant::now() + options.timeout;
        let mut collection = Collection::new(options);

        poll_until(&self.shared.record_wake, deadline, || {
            let is_running = self.is_running();
            collection.step(&mut self.shared.record.lock(), is_running)
        })
        .await;

        tracing::debug!(events = collection.events.len(), "collected");

        Ok(collection.events)
    }

    /// Drops the events received but not collected yet.
    pub fn clear_buffered_events(&self) -> Result<(), T::Error> {
        self.ensure_initialized()?;

        self.shared.record.lock().events.clear();
        self.transport()
            .clear_buffered_events()
            .map_err(TransportError)?;

        Ok(())
    }
}
