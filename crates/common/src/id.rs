//! Identifier and credential generation.

use std::fmt;
use std::sync::{Arc, Mutex};

use ulid::{Generator, Ulid};
use uuid::Uuid;

/// Generates primary keys and bearer tokens for forum records.
///
/// Clones share one monotonic ULID generator, so IDs from one process
/// strictly increase even within the same millisecond.
#[derive(Clone, Default)]
pub struct IdGenerator {
    ulids: Arc<Mutex<Generator>>,
}

impl fmt::Debug for IdGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdGenerator").finish_non_exhaustive()
    }
}

impl IdGenerator {
    /// Create a new ID generator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Generate a lowercase ULID, greater than any ID this generator
    /// returned before.
    ///
    /// Falls back to a plain random ULID if the random part of the current
    /// millisecond is exhausted.
    #[must_use]
    pub fn generate(&self) -> String {
        let ulid = self
            .ulids
            .lock()
            .ok()
            .and_then(|mut ulids| ulids.generate().ok())
            .unwrap_or_else(Ulid::new);
        ulid.to_string().to_lowercase()
    }

    /// Generate an opaque bearer token for API authentication.
    #[must_use]
    pub fn generate_token(&self) -> String {
        Uuid::new_v4().simple().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_is_lowercase_ulid() {
        let id_gen = IdGenerator::new();
        let id = id_gen.generate();

        assert_eq!(id.len(), 26);
        assert_eq!(id, id.to_lowercase());
        assert!(Ulid::from_string(&id.to_uppercase()).is_ok());
    }

    #[test]
    fn test_generate_strictly_increasing() {
        let id_gen = IdGenerator::new();
        let shared = id_gen.clone();
        let mut previous = id_gen.generate();
        for i in 0..1000 {
            let next = if i % 2 == 0 {
                shared.generate()
            } else {
                id_gen.generate()
            };
            assert!(next > previous, "{next} <= {previous}");
            previous = next;
        }
    }

    #[test]
    fn test_generate_token() {
        let id_gen = IdGenerator::new();
        let token = id_gen.generate_token();

        assert_eq!(token.len(), 32);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
