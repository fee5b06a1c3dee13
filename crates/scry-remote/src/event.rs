use std::fmt;

use crate::strings::StringTable;
use crate::thread::ThreadTable;

const FLAG_TYPE_MASK: u32 = 0x1F;

const FLAG_TYPE_DATA_S32: u32 = 2;
const FLAG_TYPE_DATA_U32: u32 = 3;
const FLAG_TYPE_DATA_S64: u32 = 4;
const FLAG_TYPE_DATA_FLOAT: u32 = 6;
const FLAG_TYPE_DATA_DOUBLE: u32 = 7;
const FLAG_TYPE_DATA_STRING: u32 = 8;
const FLAG_TYPE_LOCK_WAIT: u32 = 16;
const FLAG_TYPE_LOCK_ACQUIRED: u32 = 17;
const FLAG_TYPE_LOCK_RELEASED: u32 = 18;
const FLAG_TYPE_LOCK_NOTIFIED: u32 = 19;
const FLAG_TYPE_MARKER: u32 = 20;

/// Kind of a traced event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EventKind {
    /// Scope or data event.
    Data,

    /// Wait on a lock.
    LockWait,

    /// Lock acquisition or release.
    LockUse,

    /// Lock notification.
    LockNotified,

    /// Marker event.
    Marker,
}

impl EventKind {
    fn from_flags(flags: u32) -> Self {
        match flags & FLAG_TYPE_MASK {
            FLAG_TYPE_LOCK_WAIT => Self::LockWait,
            FLAG_TYPE_LOCK_ACQUIRED | FLAG_TYPE_LOCK_RELEASED => Self::LockUse,
            FLAG_TYPE_LOCK_NOTIFIED => Self::LockNotified,
            FLAG_TYPE_MARKER => Self::Marker,
            _ => Self::Data,
        }
    }

    /// Returns the name of this kind.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Data => "data",
            Self::LockWait => "lock wait",
            Self::LockUse => "lock use",
            Self::LockNotified => "lock notified",
            Self::Marker => "marker",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// How the raw 64-bit value of an event is interpreted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ValueFormat {
    Raw,
    I32,
    U32,
    I64,
    F32,
    F64,
    StringIndex,
}

impl ValueFormat {
    fn from_flags(flags: u32) -> Self {
        match flags & FLAG_TYPE_MASK {
            FLAG_TYPE_DATA_S32 => Self::I32,
            FLAG_TYPE_DATA_U32 => Self::U32,
            FLAG_TYPE_DATA_S64 => Self::I64,
            FLAG_TYPE_DATA_FLOAT => Self::F32,
            FLAG_TYPE_DATA_DOUBLE => Self::F64,
            FLAG_TYPE_DATA_STRING | FLAG_TYPE_MARKER => Self::StringIndex,
            _ => Self::Raw,
        }
    }

    /// Decodes `raw`, truncated to the width of this format.
    #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
    fn decode(self, raw: u64, strings: &StringTable) -> EventValue {
        match self {
            Self::Raw => EventValue::Unsigned(raw),
            Self::I32 => EventValue::I32(raw as u32 as i32),
            Self::U32 => EventValue::U32(raw as u32),
            Self::I64 => EventValue::I64(raw as i64),
            Self::F32 => EventValue::F32(f32::from_bits(raw as u32)),
            Self::F64 => EventValue::F64(f64::from_bits(raw)),
            Self::StringIndex => match strings.value(raw as u32 as usize) {
                Some(s) => EventValue::Str(s.to_owned()),
                None => {
                    tracing::warn!(index = raw, "string value index out of range");
                    EventValue::Unsigned(raw)
                }
            },
        }
    }
}

/// Decoded value of an event.
#[derive(Clone, Debug, PartialEq)]
pub enum EventValue {
    /// Raw value (scopes, timestamps, unsigned 64-bit data).
    Unsigned(u64),

    /// Signed 32-bit data.
    I32(i32),

    /// Unsigned 32-bit data.
    U32(u32),

    /// Signed 64-bit data.
    I64(i64),

    /// Single precision data.
    F32(f32),

    /// Double precision data.
    F64(f64),

    /// String data, or marker message.
    Str(String),
}

impl fmt::Display for EventValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unsigned(v) => write!(f, "{v}"),
            Self::I32(v) => write!(f, "{v}"),
            Self::U32(v) => write!(f, "{v}"),
            Self::I64(v) => write!(f, "{v}"),
            Self::F32(v) => write!(f, "{v}"),
            Self::F64(v) => write!(f, "{v}"),
            Self::Str(v) => f.write_str(v),
        }
    }
}

/// Elem registration reported by the program.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ElemDecl {
    /// Hash of the elem name.
    pub name_hash: u64,

    /// Dense elem identifier.
    pub elem_id: u32,

    /// Identifier of the parent elem, if any.
    pub parent_id: Option<u32>,

    /// Identifier of the owning thread.
    pub thread_id: u32,

    /// Type flags of the elem.
    pub flags: u32,
}

/// Event tuple reported by the program.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RawEvent {
    /// Identifier of the spec this event matched.
    pub spec_id: u32,

    /// Identifier of the elem of this event.
    pub elem_id: u32,

    /// Number of the following tuples which are children of this event.
    pub children: u32,

    /// Hash of the event name.
    pub name_hash: u64,

    /// Date of the event, in nanoseconds.
    pub date_ns: i64,

    /// Raw value, decoded according to the elem type.
    pub value: u64,
}

/// Event received from the program.
#[derive(Clone, Debug, PartialEq)]
pub struct Event {
    /// Name of the thread of this event.
    pub thread: String,

    /// Kind of this event.
    pub kind: EventKind,

    /// Full path of this event, root first.
    pub path: Vec<String>,

    /// Date of this event, in nanoseconds.
    pub date_ns: i64,

    /// Decoded value.
    pub value: EventValue,

    /// Identifier of the spec this event matched.
    pub spec_id: u32,

    /// Nested events.
    pub children: Vec<Event>,
}

impl Event {
    /// Returns the name of this event (last element of its path).
    pub fn name(&self) -> &str {
        self.path.last().map_or("", String::as_str)
    }

    fn fmt_line(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        #[allow(clippy::cast_precision_loss)]
        let date_ms = self.date_ns as f64 * 0.000_001;

        write!(
            f,
            "{date_ms:10.6} ms  kind={:<9}  thread={}  path={}",
            self.kind,
            self.thread,
            self.path.join("/")
        )?;

        if !self.children.is_empty() {
            write!(f, "  children={}", self.children.len())?;
        }

        if self.value != EventValue::Str(String::new()) {
            write!(f, "  value={}", self.value)?;
        }

        Ok(())
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_line(f)?;

        for child in &self.children {
            f.write_str("\n  | ")?;
            child.fmt_line(f)?;
        }

        Ok(())
    }
}

/// Kind of event the program may send, as shown by `known_event_kinds`.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct EventKindInfo {
    /// Name of the owning thread.
    pub thread: String,

    /// Kind of the events.
    pub kind: EventKind,

    /// Full path, root first.
    pub path: Vec<String>,
}

/// Resolved description of an elem.
struct ElemDescriptor {
    thread: String,
    path: Vec<String>,
    format: ValueFormat,
    kind: EventKind,
}

/// Elems of the current record.
#[derive(Default)]
pub(crate) struct ElemTable {
    elems: Vec<Option<ElemDescriptor>>,
}

impl ElemTable {
    pub fn reset(&mut self) {
        self.elems.clear();
    }

    /// Registers an elem.
    ///
    /// The parent elem, if any, must have been registered before.
    pub fn insert(&mut self, decl: ElemDecl, strings: &StringTable, threads: &ThreadTable) {
        let mut path = match decl.parent_id.and_then(|id| self.get(id)) {
            Some(parent) => parent.path.clone(),
            None => {
                if let Some(parent_id) = decl.parent_id {
                    tracing::warn!(elem_id = decl.elem_id, parent_id, "unknown parent elem");
                }
                Vec::new()
            }
        };
        path.push(strings.resolve(decl.name_hash));

        let descriptor = ElemDescriptor {
            thread: threads.name(decl.thread_id).unwrap_or_default().to_owned(),
            path,
            format: ValueFormat::from_flags(decl.flags),
            kind: EventKind::from_flags(decl.flags),
        };

        let idx = decl.elem_id as usize;

        if self.elems.len() <= idx {
            self.elems.resize_with(idx + 1, || None);
        }

        self.elems[idx] = Some(descriptor);
    }

    fn get(&self, elem_id: u32) -> Option<&ElemDescriptor> {
        self.elems.get(elem_id as usize)?.as_ref()
    }

    pub fn kinds(&self) -> Vec<EventKindInfo> {
        self.elems
            .iter()
            .flatten()
            .map(|elem| EventKindInfo {
                thread: elem.thread.clone(),
                kind: elem.kind,
                path: elem.path.clone(),
            })
            .collect()
    }

    fn build_event(&self, raw: &RawEvent, strings: &StringTable) -> Option<Event> {
        let Some(elem) = self.get(raw.elem_id) else {
            tracing::warn!(elem_id = raw.elem_id, "event with an unknown elem");
            return None;
        };

        Some(Event {
            thread: elem.thread.clone(),
            kind: elem.kind,
            path: elem.path.clone(),
            date_ns: raw.date_ns,
            value: elem.format.decode(raw.value, strings),
            spec_id: raw.spec_id,
            children: Vec::new(),
        })
    }
}

/// Events received and not collected yet.
#[derive(Default)]
pub(crate) struct EventBuffer {
    events: Vec<Event>,
}

impl EventBuffer {
    /// Appends a batch of event tuples, in depth-first order.
    ///
    /// The tuples following an event with children are attached to it
    /// instead of being appended to the buffer. The children of an event
    /// with an unknown elem are dropped along with it.
    pub fn push_batch(&mut self, batch: &[RawEvent], elems: &ElemTable, strings: &StringTable) {
        let mut nested = 0;
        let mut skipped = 0;

        for raw in batch {
            if skipped > 0 {
                skipped -= 1;
                continue;
            }

            let event = elems.build_event(raw, strings);

            if nested == 0 {
                match event {
                    Some(event) => {
                        self.events.push(event);
                        nested = raw.children;
                    }
                    None => skipped = raw.children,
                }
            } else {
                nested -= 1;
                if let (Some(event), Some(parent)) = (event, self.events.last_mut()) {
                    parent.children.push(event);
                }
            }
        }
    }

    /// Returns all buffered events, leaving the buffer empty.
    pub fn take_and_clear(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}
