//! Keyed reconciliation of persisted collections
//!
//! A save merges an incoming in-memory collection into the collection
//! already persisted for the record: entries with a matching key are
//! updated in their existing slot, entries with no match are appended, and
//! persisted entries absent from the incoming set are left untouched. The
//! merge never removes anything.

use std::collections::HashMap;
use std::hash::Hash;

use crate::error::PersistenceError;

/// Merge an incoming collection into an existing persisted one by key
///
/// `existing_key` reads the key of a persisted entry; `incoming_key` reads
/// (or assigns, for keyless entries) the key of an incoming item, which is
/// why it gets mutable access. For each incoming item exactly one of
/// `on_match` or `on_insert` runs: `on_match` against the persisted entry
/// occupying the item's slot, `on_insert` to build a new entry appended at
/// the end. What "matching" does is the caller's policy - a field-by-field
/// update, a value overwrite, or nothing at all for append-only
/// collections.
pub fn merge_keyed<E, I, K, EK, IK, OM, OI>(
    existing: &mut Vec<E>,
    incoming: I,
    mut existing_key: EK,
    mut incoming_key: IK,
    mut on_match: OM,
    mut on_insert: OI,
) -> Result<(), PersistenceError>
where
    I: IntoIterator,
    K: Clone + Eq + Hash,
    EK: FnMut(&E) -> K,
    IK: FnMut(&mut I::Item) -> Result<K, PersistenceError>,
    OM: FnMut(&mut E, I::Item) -> Result<(), PersistenceError>,
    OI: FnMut(K, I::Item) -> Result<E, PersistenceError>,
{
    let mut slots: HashMap<K, usize> = existing
        .iter()
        .enumerate()
        .map(|(slot, entry)| (existing_key(entry), slot))
        .collect();

    for mut item in incoming {
        let key = incoming_key(&mut item)?;
        match slots.get(&key) {
            Some(&slot) => on_match(&mut existing[slot], item)?,
            None => {
                let entry = on_insert(key.clone(), item)?;
                slots.insert(key, existing.len());
                existing.push(entry);
            }
        }
    }

    Ok(())
}
