//! Address codec
//!
//! Converts between 32-byte block hashes and their 32-character display
//! addresses.
//!
//! ## Layout
//! ```text
//! hash:    [ b0 b1 b2 | b3 b4 b5 | ... | b21 b22 b23 ] [ b24 .. b31 ]
//!            24 bits    24 bits          24 bits        never encoded
//!              │
//!              ▼  6 bits per char, MSB first
//! address: [ c0 c1 c2 c3 | c4 c5 c6 c7 | ... | c28 c29 c30 c31 ]
//! ```
//!
//! Only the first 24 bytes of a hash survive encoding. Decoding always
//! zero-fills the last 8 bytes, so `decode(encode(h)) == h` holds only for
//! hashes whose tail is already zero.

use crate::error::{Result, XdagError};

/// Length of a block hash in bytes
pub const HASH_LENGTH: usize = 32;

/// Length of an encoded address in characters
pub const ADDRESS_LENGTH: usize = 32;

/// Number of leading hash bytes carried by an address
pub const ENCODED_HASH_BYTES: usize = 24;

/// 6-bit value → symbol
const BITS2MIME: &[u8; 64] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

/// Marks bytes outside the alphabet in the reverse table
const INVALID: u8 = 0xFF;

/// Symbol → 6-bit value, `INVALID` for anything not in the alphabet
const MIME2BITS: [u8; 256] = build_reverse_table();

const fn build_reverse_table() -> [u8; 256] {
    let mut table = [INVALID; 256];
    let mut i = 0;
    while i < BITS2MIME.len() {
        table[BITS2MIME[i] as usize] = i as u8;
        i += 1;
    }
    table
}

/// Encode a hash as a 32-character address
///
/// Every 3 hash bytes become 4 characters; the last 8 bytes are ignored.
pub fn encode_address(hash: &[u8; HASH_LENGTH]) -> String {
    let mut address = String::with_capacity(ADDRESS_LENGTH);
    let mut acc: u32 = 0;
    let mut bits: u32 = 0;
    let mut next = 0;

    for _ in 0..ADDRESS_LENGTH {
        if bits < 6 {
            acc = (acc << 8) | u32::from(hash[next]);
            bits += 8;
            next += 1;
        }
        bits -= 6;
        address.push(BITS2MIME[((acc >> bits) & 0x3F) as usize] as char);
    }

    address
}

/// Decode an address back into a hash
///
/// Only the first 32 characters are read. The last 8 bytes of the result are
/// always zero since the address never carried them.
pub fn decode_address(address: &str) -> Result<[u8; HASH_LENGTH]> {
    let input = address.as_bytes();
    let mut hash = [0u8; HASH_LENGTH];
    let mut acc: u32 = 0;
    let mut bits: u32 = 0;
    let mut next = 0;

    for i in 0..ADDRESS_LENGTH {
        let c = match input.get(i) {
            Some(0) | None => {
                return Err(XdagError::AddressFormat(format!(
                    "address terminated after {} of {} characters",
                    i, ADDRESS_LENGTH
                )))
            }
            Some(&c) => c,
        };

        let value = MIME2BITS[c as usize];
        if value == INVALID {
            return Err(XdagError::AddressFormat(format!(
                "invalid character 0x{:02x} at position {}",
                c, i
            )));
        }

        acc = (acc << 6) | u32::from(value);
        bits += 6;
        if bits >= 8 {
            bits -= 8;
            hash[next] = (acc >> bits) as u8;
            next += 1;
        }
    }

    debug_assert_eq!(next, ENCODED_HASH_BYTES);
    Ok(hash)
}

/// Whether `c` belongs to the address alphabet
pub fn is_address_char(c: char) -> bool {
    c.is_ascii() && MIME2BITS[c as usize] != INVALID
}
