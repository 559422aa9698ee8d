//! Identity mapping between domain and storage identifiers
//!
//! Domain objects carry opaque string identifiers; storage uses native
//! UUIDs. Mapping to storage form is a fallible parse when the domain
//! identifier is present, and a generation plus write-back when it is
//! absent: the freshly generated identifier is recorded on the domain
//! object so the entity has a stable identity from that point on.

use uuid::Uuid;

use crate::error::PersistenceError;

/// Source of fresh storage identifiers
///
/// Injectable so tests can substitute a deterministic sequence and assert
/// on the exact identifiers written back to domain objects.
pub trait IdGenerator: Send + Sync {
    /// Produce a fresh, globally unique identifier
    fn generate(&self) -> Uuid;
}

/// Default generator producing random v4 UUIDs
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidGenerator;

impl IdGenerator for UuidGenerator {
    fn generate(&self) -> Uuid {
        Uuid::new_v4()
    }
}

/// Parse a domain identifier into storage form
pub fn parse_id(raw: &str) -> Result<Uuid, PersistenceError> {
    Uuid::parse_str(raw).map_err(|_| PersistenceError::InvalidIdentifier(raw.to_string()))
}

/// Map a domain identifier slot to storage form
///
/// A present identifier is parsed; an absent one is generated and written
/// back into the slot in canonical hyphenated form.
pub fn to_storage_id<I>(slot: &mut Option<I>, ids: &dyn IdGenerator) -> Result<Uuid, PersistenceError>
where
    I: From<String> + AsRef<str>,
{
    match slot {
        Some(id) => parse_id(id.as_ref()),
        None => {
            let fresh = ids.generate();
            *slot = Some(I::from(fresh.to_string()));
            Ok(fresh)
        }
    }
}

/// Format a storage identifier in its canonical domain form
pub fn to_domain_id<I: From<String>>(id: Uuid) -> I {
    I::from(id.to_string())
}
