//! Node keys and the generators that hand them out.

use uuid::Uuid;

/// Document-unique node identifier.
pub type Key = String;

/// Source of fresh node keys.
///
/// Generators are threaded explicitly through every constructor that needs a
/// key, so a test can swap in [`CounterKeyGenerator`] and get a predictable
/// sequence.
pub trait KeyGenerator {
    fn generate_key(&mut self) -> Key;
}

/// Deterministic generator yielding `"0"`, `"1"`, `"2"`, ...
#[derive(Debug, Clone, Default)]
pub struct CounterKeyGenerator {
    next: u64,
}

impl CounterKeyGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn starting_at(next: u64) -> Self {
        Self { next }
    }
}

impl KeyGenerator for CounterKeyGenerator {
    fn generate_key(&mut self) -> Key {
        let key = self.next.to_string();
        self.next += 1;
        key
    }
}

/// Random v4 UUID keys. The default for a [`crate::Change`].
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidKeyGenerator;

impl KeyGenerator for UuidKeyGenerator {
    fn generate_key(&mut self) -> Key {
        Uuid::new_v4().simple().to_string()
    }
}
