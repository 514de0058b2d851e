use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;

/// Stable small-integer identity handed out by a [`GuidAllocator`].
///
/// `Guid(0)` is never allocated and serves as the invalid identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Guid(pub u64);

impl Guid {
    pub const INVALID: Guid = Guid(0);

    pub fn is_valid(self) -> bool {
        self != Self::INVALID
    }
}

impl std::fmt::Display for Guid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "guid:{}", self.0)
    }
}

/// Maps content-derived keys to stable guids.
///
/// The same allocator type backs instance, mesh and material identities.
/// Entries accumulate until [`clear`](Self::clear); guids are assigned in
/// increasing order and never handed out twice, not even after a clear.
#[derive(Debug, Clone)]
pub struct GuidAllocator<K> {
    guids: HashMap<K, Guid>,
    elements: BTreeMap<Guid, K>,
    next: u64,
}

impl<K> Default for GuidAllocator<K> {
    fn default() -> Self {
        Self {
            guids: HashMap::new(),
            elements: BTreeMap::new(),
            next: 1,
        }
    }
}

impl<K: Clone + Eq + Hash> GuidAllocator<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `key` has been allocated. Never mutates.
    pub fn has_element(&self, key: &K) -> bool {
        self.guids.contains_key(key)
    }

    /// Return the guid of `key`, allocating the next one on first sight.
    pub fn alloc_guid(&mut self, key: &K) -> Guid {
        if let Some(guid) = self.guids.get(key) {
            return *guid;
        }
        let guid = Guid(self.next);
        self.next += 1;
        self.guids.insert(key.clone(), guid);
        self.elements.insert(guid, key.clone());
        guid
    }

    pub fn guid_of(&self, key: &K) -> Option<Guid> {
        self.guids.get(key).copied()
    }

    /// Reverse lookup: the key a guid was allocated for.
    pub fn element(&self, guid: Guid) -> Option<&K> {
        self.elements.get(&guid)
    }

    /// Allocated guids in allocation order.
    pub fn allocated_guids(&self) -> impl Iterator<Item = Guid> + '_ {
        self.elements.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.guids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.guids.is_empty()
    }

    /// Forget every key. The counter keeps running.
    pub fn clear(&mut self) {
        self.guids.clear();
        self.elements.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alloc_is_stable() {
        let mut alloc = GuidAllocator::new();
        let a = alloc.alloc_guid(&"cube.obj");
        for _ in 0..10 {
            assert_eq!(alloc.alloc_guid(&"cube.obj"), a);
        }
        assert_eq!(alloc.len(), 1);
    }

    #[test]
    fn has_element_only_after_alloc() {
        let mut alloc = GuidAllocator::new();
        assert!(!alloc.has_element(&"a"));
        assert!(!alloc.has_element(&"a"));
        assert!(alloc.is_empty());
        alloc.alloc_guid(&"a");
        assert!(alloc.has_element(&"a"));
        assert!(!alloc.has_element(&"b"));
    }

    #[test]
    fn guids_are_monotonic_and_valid() {
        let mut alloc = GuidAllocator::new();
        let a = alloc.alloc_guid(&1u32);
        let b = alloc.alloc_guid(&2u32);
        let c = alloc.alloc_guid(&3u32);
        assert!(a.is_valid());
        assert!(a < b && b < c);
        assert_eq!(alloc.allocated_guids().collect::<Vec<_>>(), vec![a, b, c]);
    }

    #[test]
    fn reverse_lookup() {
        let mut alloc = GuidAllocator::new();
        let g = alloc.alloc_guid(&("cube.obj".to_string(), 3usize));
        assert_eq!(alloc.element(g), Some(&("cube.obj".to_string(), 3usize)));
        assert_eq!(alloc.guid_of(&("cube.obj".to_string(), 3usize)), Some(g));
        assert!(alloc.element(Guid::INVALID).is_none());
    }

    #[test]
    fn clear_never_reuses_guids() {
        let mut alloc = GuidAllocator::new();
        let before = alloc.alloc_guid(&"a");
        alloc.clear();
        assert!(!alloc.has_element(&"a"));
        let after = alloc.alloc_guid(&"a");
        assert_ne!(before, after);
        assert!(after > before);
    }
}
