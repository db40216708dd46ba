//! # Codec — Fixed-Radix Offset Encoding
//!
//! Maps an integer offset in `[0, 32^length)` to a fixed-width string over the
//! 32-symbol alphabet `A-Z2-7` (RFC 4648 base32 symbols). The most significant
//! digit lands in the first position, so ascending offsets produce candidates
//! in lexicographic order of the alphabet.
//!
//! Offsets outside the keyspace are a caller bug: the high digits are silently
//! dropped and the output wraps. Nothing here checks that at runtime.

/// Candidate alphabet, indexed by digit value.
pub const CHARSET: &[u8; 32] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ234567";

/// Radix of the keyspace (`CHARSET.len()`).
pub const RADIX: u64 = 32;

/// Largest unknown-character count whose keyspace fits a `u64` offset.
pub const MAX_LENGTH: u32 = 12;

/// Number of candidates for `length` unknown characters: `32^length`.
pub fn keyspace_size(length: u32) -> u64 {
    RADIX.pow(length)
}

/// Write the base-32 digits of `offset` into `buf`, least significant digit last.
///
/// The buffer width is the key length. Reusing one buffer per worker avoids an
/// allocation per candidate.
pub fn encode_into(buf: &mut [u8], mut offset: u64) {
    for slot in buf.iter_mut().rev() {
        *slot = CHARSET[(offset % RADIX) as usize];
        offset /= RADIX;
    }
}

/// Encode `offset` as exactly `length` characters of [`CHARSET`].
pub fn encode(offset: u64, length: usize) -> String {
    let mut buf = vec![0u8; length];
    encode_into(&mut buf, offset);
    // CHARSET is pure ASCII, so every byte written is a valid char.
    buf.into_iter().map(char::from).collect()
}
