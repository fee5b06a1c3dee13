use std::fmt;

use crate::error::{Result, TransportError};
use crate::remote::Remote;
use crate::spec::{EventSpec, PathToken, display_path};
use crate::transport::Transport;

/// Reason why the program could not resolve an event of a spec.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum UnresolvedReason {
    /// The record holds no event at all.
    NoEvents,

    /// The thread filter matches no thread.
    NoMatchingThread,

    /// The last token of the event path matches no event name.
    NoMatchingEventName,

    /// The event path matches no event.
    NoMatchingEventPath,

    /// The last token of the parent path matches no event name.
    NoMatchingParentName,

    /// The parent path matches no event.
    NoMatchingParentPath,

    /// The event path starts with `.` but does not match from the root.
    EventRootMismatch,

    /// The parent path starts with `.` but does not match from the root.
    ParentRootMismatch,

    /// The events of the spec resolved to different parents.
    InconsistentParent,
}

impl UnresolvedReason {
    /// Returns the explanation of this reason.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::NoEvents => "No events in record to match with",
            Self::NoMatchingThread => "No matching thread",
            Self::NoMatchingEventName => "No matching event name",
            Self::NoMatchingEventPath => "No matching event path",
            Self::NoMatchingParentName => "No matching parent event name",
            Self::NoMatchingParentPath => "No matching parent event path",
            Self::EventRootMismatch => "'.' is not matching the event's root",
            Self::ParentRootMismatch => "'.' is not matching the parent event's root",
            Self::InconsistentParent => {
                "Inconsistent parent events, it shall be the same for all events"
            }
        }
    }
}

impl fmt::Display for UnresolvedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unresolved event reported by the program.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UnresolvedElem {
    /// Index of the spec, in registration order.
    pub spec_id: u32,

    /// Index of the event path inside the spec.
    pub elem_id: u32,

    /// Why the event is unresolved.
    pub reason: UnresolvedReason,
}

/// Unresolved event, mapped back to its spec.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnresolvedEvent {
    /// Index of the spec, in registration order.
    pub spec_index: usize,

    /// Thread filter of the spec.
    pub thread: Option<String>,

    /// Parent path filter of the spec.
    pub parent: Vec<PathToken>,

    /// Unresolved event path.
    pub event: Vec<PathToken>,

    /// Why the event is unresolved.
    pub reason: UnresolvedReason,
}

impl fmt::Display for UnresolvedEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "From spec #{}, {} for event '{}'",
            self.spec_index,
            self.reason,
            display_path(&self.event)
        )?;

        if !self.parent.is_empty() {
            write!(f, " with parent '{}'", display_path(&self.parent))?;
        }

        if let Some(thread) = &self.thread {
            write!(f, " with thread '{thread}'")?;
        }

        Ok(())
    }
}

/// Registered specs, and the latest resolution report.
///
/// Both survive across sessions, the program resolving the specs again at
/// each connection.
#[derive(Default)]
pub(crate) struct SpecRegistry {
    specs: Vec<EventSpec>,
    unresolved: Vec<UnresolvedElem>,
}

impl SpecRegistry {
    pub fn replace(&mut self, specs: Vec<EventSpec>) {
        self.specs = specs;
        self.unresolved.clear();
    }

    pub fn set_unresolved(&mut self, unresolved: Vec<UnresolvedElem>) {
        self.unresolved = unresolved;
    }

    pub fn unresolved_events(&self) -> Vec<UnresolvedEvent> {
        self.unresolved
            .iter()
            .filter_map(|elem| {
                let spec_index = elem.spec_id as usize;
                let spec = self.specs.get(spec_index)?;
                let event = spec.events().get(elem.elem_id as usize)?;

                Some(UnresolvedEvent {
                    spec_index,
                    thread: spec.thread().map(str::to_owned),
                    parent: spec.parent().to_vec(),
                    event: event.clone(),
                    reason: elem.reason,
                })
            })
            .collect()
    }
}

impl<T: Transport> Remote<T> {
    /// Replaces the registered specs.
    ///
    /// Events received but not collected yet are dropped. This can be done
    /// before or during a session.
    #[tracing::instrument(name = "RegisterSpecs", skip_all)]
    pub fn register_specs(&self, specs: impl IntoIterator<Item = EventSpec>) -> Result<(), T::Error> {
        self.ensure_initialized()?;

        let specs: Vec<_> = specs.into_iter().collect();
        tracing::debug!(specs = specs.len(), "registering specs");

        self.transport().clear_specs().map_err(TransportError)?;
        self.clear_buffered_events()?;

        self.shared.record.lock().specs.replace(specs.clone());

        for (spec_id, spec) in specs.iter().enumerate() {
            self.transport()
                .add_spec(spec_id, spec)
                .map_err(TransportError)?;
        }

        Ok(())
    }

    /// Returns the events of the registered specs that the program could not
    /// resolve.
    ///
    /// Partial resolution is expected (e.g. an event kind not emitted yet),
    /// so this is reported as data.
    pub fn unresolved_events(&self) -> Vec<UnresolvedEvent> {
        self.shared.record.lock().specs.unresolved_events()
    }
}

#[cfg(test)]
mod tests {
    use super::{SpecRegistry, UnresolvedElem, UnresolvedReason};
    use crate::spec::EventSpec;

    #[test]
    fn unresolved_elems_map_to_their_spec() {
        let mut registry = SpecRegistry::default();
        registry.replace(vec![
            EventSpec::new(["Add fruit"]),
            EventSpec::new(["a/*", "b"])
                .with_thread("Control")
                .with_parent("Main"),
        ]);
        registry.set_unresolved(vec![
            UnresolvedElem { spec_id: 1, elem_id: 1, reason: UnresolvedReason::NoMatchingEventName },
            UnresolvedElem { spec_id: 7, elem_id: 0, reason: UnresolvedReason::NoEvents },
        ]);

        let unresolved = registry.unresolved_events();

        assert_eq!(unresolved.len(), 1);
        assert_eq!(
            unresolved[0].to_string(),
            "From spec #1, No matching event name for event 'b' with parent 'Main' with thread 'Control'"
        );
    }

    #[test]
    fn replacing_specs_forgets_unresolved() {
        let mut registry = SpecRegistry::default();
        registry.replace(vec![EventSpec::new(["x"])]);
        registry.set_unresolved(vec![UnresolvedElem {
            spec_id: 0,
            elem_id: 0,
            reason: UnresolvedReason::NoMatchingThread,
        }]);
        registry.replace(vec![EventSpec::new(["x"])]);

        assert!(registry.unresolved_events().is_empty());
    }
}
