//! Three-state slot storage shared by the open-addressing containers.

/// A single slot of an open-addressing array.
///
/// `Deleted` (a tombstone) marks a slot that may be reused for insertion but must
/// not terminate a probe scan during lookup.
#[derive(Debug)]
pub(crate) enum Slot<K, V> {
    Empty,
    Deleted,
    Occupied(K, V),
}

impl<K, V> Slot<K, V> {
    /// Whether the slot can accept a new entry.
    #[inline]
    pub(crate) fn is_free(&self) -> bool {
        !matches!(self, Slot::Occupied(..))
    }

    /// Drop the entry and leave a tombstone behind.
    pub(crate) fn delete(&mut self) {
        debug_assert!(!self.is_free(), "only occupied slots can be deleted");

        *self = Slot::Deleted;
    }
}

impl<K: Eq, V> Slot<K, V> {
    /// Whether the slot holds an entry under `key`.
    #[inline]
    pub(crate) fn holds(&self, key: &K) -> bool {
        matches!(self, Slot::Occupied(k, _) if k == key)
    }
}

/// Allocate `len` empty slots.
///
/// `vec![...]` is unavailable here: slots are not `Clone` unless both `K` and `V` are.
pub(crate) fn empty_slots<K, V>(len: usize) -> Vec<Slot<K, V>> {
    let mut slots = Vec::with_capacity(len);
    slots.resize_with(len, || Slot::Empty);
    slots
}
