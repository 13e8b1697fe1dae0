//! Collection-item identifiers: 24 lowercase-hex characters laid out as
//! 4 timestamp bytes, 5 process-unique random bytes and a 3-byte counter,
//! so freshly generated identifiers sort by creation time.

use chrono::Utc;
use rand::RngCore;
use regex::Regex;
use std::fmt::Write;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::OnceLock;

pub const ID_LENGTH: usize = 24;

static ID_PATTERN: OnceLock<Regex> = OnceLock::new();
static PROCESS_ENTROPY: OnceLock<[u8; 5]> = OnceLock::new();
static SEQUENCE: OnceLock<AtomicU32> = OnceLock::new();

/// New identifier satisfying [`is_valid`].
pub fn generate() -> String {
    let mut bytes = [0u8; 12];
    let seconds = Utc::now().timestamp() as u32;
    bytes[..4].copy_from_slice(&seconds.to_be_bytes());
    bytes[4..9].copy_from_slice(process_entropy());
    let count = sequence().fetch_add(1, Ordering::Relaxed) & 0x00ff_ffff;
    bytes[9..].copy_from_slice(&count.to_be_bytes()[1..]);

    let mut id = String::with_capacity(ID_LENGTH);
    for byte in bytes {
        let _ = write!(id, "{byte:02x}");
    }
    id
}

/// True iff `candidate` is exactly 24 characters, each in `[0-9a-f]`.
pub fn is_valid(candidate: &str) -> bool {
    let pattern =
        ID_PATTERN.get_or_init(|| Regex::new("^[0-9a-f]{24}$").expect("fixed id pattern"));
    pattern.is_match(candidate)
}

fn process_entropy() -> &'static [u8; 5] {
    PROCESS_ENTROPY.get_or_init(|| {
        let mut bytes = [0u8; 5];
        rand::thread_rng().fill_bytes(&mut bytes);
        bytes
    })
}

fn sequence() -> &'static AtomicU32 {
    SEQUENCE.get_or_init(|| AtomicU32::new(rand::thread_rng().next_u32() & 0x00ff_ffff))
}
