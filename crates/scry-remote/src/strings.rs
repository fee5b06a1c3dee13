use std::collections::HashMap;

use crate::hash::{HashWidth, hash_string};
use crate::lookup::{ExternalStrings, placeholder};

/// Strings reported by the program, indexed by hash and by arrival order.
#[derive(Default)]
pub(crate) struct StringTable {
    /// Resolved strings, by hash.
    by_hash: HashMap<u64, String>,

    /// Resolved strings, by arrival order (string-valued events index it).
    values: Vec<String>,

    /// Whether the program replaced its strings by their hash.
    are_external: bool,

    /// Hash width used by the program.
    width: HashWidth,

    /// User-supplied values of the external strings.
    ///
    /// Unlike the rest of the table, it survives across sessions.
    overrides: ExternalStrings,
}

impl StringTable {
    /// Forgets everything learnt from the previous session.
    pub fn reset(&mut self) {
        self.by_hash.clear();
        self.values.clear();
        self.are_external = false;
        self.width = HashWidth::Long;
    }

    pub fn configure(&mut self, are_external: bool, width: HashWidth) {
        self.are_external = are_external;
        self.width = width;
    }

    pub fn set_overrides(&mut self, overrides: ExternalStrings) {
        self.overrides = overrides;
    }

    pub fn hash(&self, s: &str) -> u64 {
        hash_string(s, self.width)
    }

    /// Records a batch of new strings.
    ///
    /// An empty string from a program with external strings is resolved
    /// through the overrides, or rendered as a placeholder.
    pub fn insert_batch(&mut self, strings: Vec<(u64, String)>) {
        for (hash, value) in strings {
            let value = if value.is_empty() && self.are_external {
                self.overrides
                    .get(hash)
                    .map_or_else(|| placeholder(hash), str::to_owned)
            } else {
                value
            };

            self.by_hash.insert(hash, value.clone());
            self.values.push(value);
        }
    }

    pub fn resolve(&self, hash: u64) -> String {
        self.by_hash
            .get(&hash)
            .cloned()
            .unwrap_or_else(|| placeholder(hash))
    }

    /// Returns the `index`-th received string.
    pub fn value(&self, index: usize) -> Option<&str> {
        self.values.get(index).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::StringTable;
    use crate::hash::HashWidth;
    use crate::lookup::ExternalStrings;

    #[test]
    fn external_strings_without_override_render_placeholders() {
        let mut table = StringTable::default();
        table.configure(true, HashWidth::Long);
        table.insert_batch(vec![(0x2A, String::new()), (7, "plain".to_owned())]);

        assert_eq!(table.resolve(0x2A), "@@000000000000002A@@");
        assert_eq!(table.resolve(7), "plain");
        assert_eq!(table.value(0), Some("@@000000000000002A@@"));
        assert_eq!(table.value(1), Some("plain"));
    }

    #[test]
    fn overrides_survive_reset() {
        let mut table = StringTable::default();
        table.set_overrides([(0x2A, "Control".to_owned())].into_iter().collect::<ExternalStrings>());
        table.reset();
        table.configure(true, HashWidth::Short);
        table.insert_batch(vec![(0x2A, String::new())]);

        assert_eq!(table.resolve(0x2A), "Control");
        assert_eq!(table.hash("Control"), u64::from(crate::hash::fnv1a_32(b"Control")));
    }

    #[test]
    fn empty_strings_are_kept_when_not_external() {
        let mut table = StringTable::default();
        table.insert_batch(vec![(3, String::new())]);

        assert_eq!(table.resolve(3), "");
        assert_eq!(table.value(1), None);
    }
}
