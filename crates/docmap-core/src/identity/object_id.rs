//! 12-byte object identifiers in hexadecimal form.

use super::{IdentityGenerator, Identifier};
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Length of the hex form of an object id.
const HEX_LEN: usize = 24;

/// Generates 12-byte object ids: 4-byte timestamp, 5 random bytes, 3-byte counter.
///
/// Ids are written as 24 lowercase hex digits; parsing and equality ignore case.
#[derive(Debug)]
pub struct ObjectIdGenerator {
    process: [u8; 5],
    counter: AtomicU32,
}

impl ObjectIdGenerator {
    /// Create a generator with a random process tag and counter seed.
    pub fn new() -> Self {
        Self {
            process: rand::random(),
            counter: AtomicU32::new(rand::random::<u32>() & 0x00ff_ffff),
        }
    }

    fn is_object_id(text: &str) -> bool {
        text.len() == HEX_LEN && text.bytes().all(|b| b.is_ascii_hexdigit())
    }
}

impl Default for ObjectIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl IdentityGenerator for ObjectIdGenerator {
    fn name(&self) -> &'static str {
        "object-id"
    }

    fn generate(&self) -> Identifier {
        let seconds = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as u32)
            .unwrap_or(0);
        let count = self.counter.fetch_add(1, Ordering::Relaxed) & 0x00ff_ffff;

        let mut bytes = [0u8; 12];
        bytes[..4].copy_from_slice(&seconds.to_be_bytes());
        bytes[4..9].copy_from_slice(&self.process);
        bytes[9..].copy_from_slice(&count.to_be_bytes()[1..]);

        Identifier::new(hex::encode(bytes))
    }

    fn validate(&self, id: &Identifier) -> bool {
        id.as_str().is_some_and(Self::is_object_id)
    }

    fn are_equal(&self, a: &Identifier, b: &Identifier) -> bool {
        match (a.as_str(), b.as_str()) {
            (Some(a), Some(b)) => {
                Self::is_object_id(a) && Self::is_object_id(b) && a.eq_ignore_ascii_case(b)
            }
            _ => false,
        }
    }

    fn parse(&self, text: &str) -> Option<Identifier> {
        Self::is_object_id(text).then(|| Identifier::new(text.to_ascii_lowercase()))
    }

    fn format(&self, id: &Identifier) -> String {
        match id.as_str() {
            Some(text) => text.to_ascii_lowercase(),
            None => id.to_string(),
        }
    }
}
