//! FNV-1a string hashing.
//!
//! The instrumented program identifies strings by their hash, and lookup
//! files are generated offline with the same function. The constants and the
//! zero remapping must therefore never change.

const FNV64_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV64_PRIME: u64 = 0x0000_0100_0000_01b3;

const FNV32_OFFSET_BASIS: u32 = 0x811c_9dc5;
const FNV32_PRIME: u32 = 0x0100_0193;

/// Width of the string hashes used by a record.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum HashWidth {
    /// 64-bit hashes.
    #[default]
    Long,

    /// 32-bit hashes.
    Short,
}

/// Computes the 64-bit FNV-1a hash of `bytes`.
///
/// The value 0 is reserved for "unset" and is remapped to 1.
pub const fn fnv1a_64(bytes: &[u8]) -> u64 {
    let mut h = FNV64_OFFSET_BASIS;
    let mut i = 0;

    while i < bytes.len() {
        h = (h ^ bytes[i] as u64).wrapping_mul(FNV64_PRIME);
        i += 1;
    }

    if h == 0 { 1 } else { h }
}

/// Computes the 32-bit FNV-1a hash of `bytes`.
///
/// The value 0 is reserved for "unset" and is remapped to 1.
pub const fn fnv1a_32(bytes: &[u8]) -> u32 {
    let mut h = FNV32_OFFSET_BASIS;
    let mut i = 0;

    while i < bytes.len() {
        h = (h ^ bytes[i] as u32).wrapping_mul(FNV32_PRIME);
        i += 1;
    }

    if h == 0 { 1 } else { h }
}

/// Hashes a string with the given width.
pub fn hash_string(s: &str, width: HashWidth) -> u64 {
    match width {
        HashWidth::Long => fnv1a_64(s.as_bytes()),
        HashWidth::Short => u64::from(fnv1a_32(s.as_bytes())),
    }
}
