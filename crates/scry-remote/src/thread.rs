use std::collections::HashMap;

use crate::strings::StringTable;

/// Thread registration reported by the program.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ThreadDecl {
    /// Hash of the thread name.
    pub name_hash: u64,

    /// Dense thread identifier, also its bit in frozen-thread bitmaps.
    pub thread_id: u32,
}

/// Threads of the current record.
#[derive(Default)]
pub(crate) struct ThreadTable {
    names: Vec<Option<String>>,
    by_hash: HashMap<u64, u32>,
}

impl ThreadTable {
    pub fn reset(&mut self) {
        self.names.clear();
        self.by_hash.clear();
    }

    pub fn insert(&mut self, decl: ThreadDecl, strings: &StringTable) {
        let idx = decl.thread_id as usize;

        if self.names.len() <= idx {
            self.names.resize(idx + 1, None);
        }

        self.names[idx] = Some(strings.resolve(decl.name_hash));
        self.by_hash.insert(decl.name_hash, decl.thread_id);

        if decl.thread_id >= u64::BITS {
            tracing::warn!(
                thread_id = decl.thread_id,
                "thread cannot be tracked in frozen-thread bitmaps"
            );
        }
    }

    pub fn name(&self, thread_id: u32) -> Option<&str> {
        self.names.get(thread_id as usize)?.as_deref()
    }

    /// Returns the bitmap bit of the thread with the given name.
    ///
    /// Threads never reported, or with an id outside the bitmap, are unknown.
    pub fn bit_of_name(&self, name: &str, strings: &StringTable) -> Option<u64> {
        let thread_id = *self.by_hash.get(&strings.hash(name))?;
        1u64.checked_shl(thread_id)
    }

    /// Returns the names of all known threads, by thread id.
    pub fn known(&self) -> Vec<String> {
        self.names.iter().flatten().cloned().collect()
    }
}
