use std::borrow::Cow;
use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;
use std::sync::LazyLock;

use regex::{Captures, Regex};

/// One lookup entry: `@@<16 uppercase hex digits>@@<string>`.
#[allow(clippy::unwrap_used)]
static LOOKUP_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^@@([0-9A-F]{16})@@(.*)$").unwrap());

/// A hashed string embedded in arbitrary text.
#[allow(clippy::unwrap_used)]
static HASHED_STRING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@@([0-9A-F]{16})@@").unwrap());

/// Returns the text rendered for an external string whose value is unknown.
pub fn placeholder(hash: u64) -> String {
    format!("@@{hash:016X}@@")
}

/// Lookup resolving external strings (strings replaced by their hash in the
/// instrumented program).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExternalStrings {
    entries: HashMap<u64, String>,
}

impl ExternalStrings {
    /// Creates an empty lookup.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a lookup file.
    ///
    /// Lines which are not of the form `@@<HASH>@@<string>` are ignored.
    pub fn from_path(path: impl AsRef<Path>) -> io::Result<Self> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }

    /// Loads a lookup from a reader, with the same format as [from_path](Self::from_path).
    pub fn from_reader(reader: impl BufRead) -> io::Result<Self> {
        let mut lookup = Self::new();

        for line in reader.lines() {
            let line = line?;

            let Some(caps) = LOOKUP_LINE.captures(&line) else {
                continue;
            };

            if let Ok(hash) = u64::from_str_radix(&caps[1], 16) {
                lookup.entries.insert(hash, caps[2].to_owned());
            }
        }

        tracing::debug!(entries = lookup.entries.len(), "external strings loaded");

        Ok(lookup)
    }

    /// Adds (or replaces) the string associated with `hash`.
    pub fn insert(&mut self, hash: u64, value: impl Into<String>) {
        self.entries.insert(hash, value.into());
    }

    /// Merges `other` into this lookup, `other` taking precedence.
    pub fn merge(&mut self, other: Self) {
        self.entries.extend(other.entries);
    }

    /// Returns the string associated with `hash`, if any.
    pub fn get(&self, hash: u64) -> Option<&str> {
        self.entries.get(&hash).map(String::as_str)
    }

    /// Returns the number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns whether the lookup has no entry.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Replaces every `@@<HASH>@@` pattern found in `text` with the
    /// associated string.
    ///
    /// Patterns with an unknown hash, as well as the rest of the text, are
    /// passed through unchanged.
    pub fn decode_text<'a>(&self, text: &'a str) -> Cow<'a, str> {
        HASHED_STRING.replace_all(text, |caps: &Captures<'_>| {
            u64::from_str_radix(&caps[1], 16)
                .ok()
                .and_then(|hash| self.get(hash))
                .unwrap_or(&caps[0])
                .to_owned()
        })
    }
}

impl FromIterator<(u64, String)> for ExternalStrings {
    fn from_iter<I: IntoIterator<Item = (u64, String)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}
