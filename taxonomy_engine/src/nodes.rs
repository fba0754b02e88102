/// Taxonomy Engine — Node Registry
///
/// Bijection between stable concept ids and dense internal indices.
/// Indices are compact: removal moves the last node into the freed slot.

use std::collections::HashMap;

use crate::domain::ConceptId;

#[derive(Debug, Clone, Default)]
pub struct NodeRegistry {
    ids: Vec<ConceptId>,
    index: HashMap<ConceptId, u32>,
}

impl NodeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            ids: Vec::with_capacity(capacity),
            index: HashMap::with_capacity(capacity),
        }
    }

    /// Register a concept. Returns false if it was already present.
    pub fn insert(&mut self, id: ConceptId) -> bool {
        if self.index.contains_key(&id) {
            return false;
        }
        debug_assert!(self.ids.len() < u32::MAX as usize, "node registry overflow");
        let slot = self.ids.len() as u32;
        self.ids.push(id);
        self.index.insert(id, slot);
        true
    }

    /// Unregister a concept. Returns false if it was not present.
    pub fn remove(&mut self, id: ConceptId) -> bool {
        let Some(slot) = self.index.remove(&id) else {
            return false;
        };
        self.ids.swap_remove(slot as usize);
        // The former last node now lives in `slot`.
        if let Some(&moved) = self.ids.get(slot as usize) {
            self.index.insert(moved, slot);
        }
        true
    }

    pub fn contains(&self, id: ConceptId) -> bool {
        self.index.contains_key(&id)
    }

    pub fn index_of(&self, id: ConceptId) -> Option<u32> {
        self.index.get(&id).copied()
    }

    pub fn id_at(&self, index: u32) -> Option<ConceptId> {
        self.ids.get(index as usize).copied()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Concept ids in internal index order.
    pub fn iter(&self) -> impl Iterator<Item = ConceptId> + '_ {
        self.ids.iter().copied()
    }

    pub fn clear(&mut self) {
        self.ids.clear();
        self.index.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_assigns_dense_indices() {
        let mut nodes = NodeRegistry::new();
        assert!(nodes.insert(100));
        assert!(nodes.insert(200));
        assert!(!nodes.insert(100));
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes.index_of(100), Some(0));
        assert_eq!(nodes.index_of(200), Some(1));
        assert_eq!(nodes.id_at(1), Some(200));
        assert_eq!(nodes.id_at(2), None);
    }

    #[test]
    fn remove_compacts_and_keeps_bijection() {
        let mut nodes = NodeRegistry::new();
        for id in [10, 20, 30, 40] {
            nodes.insert(id);
        }
        assert!(nodes.remove(20));
        assert!(!nodes.remove(20));
        assert_eq!(nodes.len(), 3);
        assert!(!nodes.contains(20));
        for id in [10, 30, 40] {
            let index = nodes.index_of(id).unwrap();
            assert_eq!(nodes.id_at(index), Some(id));
            assert!((index as usize) < nodes.len());
        }
    }

    #[test]
    fn remove_last_node() {
        let mut nodes = NodeRegistry::new();
        nodes.insert(1);
        nodes.insert(2);
        assert!(nodes.remove(2));
        assert_eq!(nodes.index_of(1), Some(0));
        assert_eq!(nodes.iter().collect::<Vec<_>>(), vec![1]);
    }
}
