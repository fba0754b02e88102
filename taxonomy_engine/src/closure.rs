/// Taxonomy Engine — Closure Traversal
///
/// Iterative depth-first traversal over built adjacency arrays.
/// A visited bit-vector sized to the node count guarantees each node is
/// expanded at most once, so diamonds cost nothing extra and malformed
/// cyclic input always terminates.

use std::collections::HashMap;

use bitvec::prelude::*;

use crate::adjacency::Adjacency;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Towards super-types.
    Ancestors,
    /// Towards sub-types.
    Descendants,
}

/// How a walk ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Walk {
    Completed,
    /// The guarded origin was reached; the visited set is partial.
    ReachedOrigin,
}

pub struct Traversal<'a> {
    adjacency: &'a Adjacency,
    direction: Direction,
    visited: BitVec<u64, Lsb0>,
    stack: Vec<u32>,
    origin: Option<u32>,
}

impl<'a> Traversal<'a> {
    pub fn new(adjacency: &'a Adjacency, direction: Direction) -> Self {
        Self {
            adjacency,
            direction,
            visited: bitvec![u64, Lsb0; 0; adjacency.node_count()],
            stack: Vec::new(),
            origin: None,
        }
    }

    /// Abort any walk that would add `origin` to the visited set.
    pub fn guard(mut self, origin: u32) -> Self {
        self.origin = Some(origin);
        self
    }

    fn neighbours(adjacency: &'a Adjacency, direction: Direction, index: u32) -> &'a [u32] {
        match direction {
            Direction::Ancestors => adjacency.ancestors_of(index),
            Direction::Descendants => adjacency.descendants_of(index),
        }
    }

    /// Mark every node reachable from `from`.
    ///
    /// `from` itself is only marked if it is reached again through a cycle.
    /// Visited state accumulates across calls.
    pub fn walk_from(&mut self, from: u32) -> Walk {
        let adjacency = self.adjacency;
        let direction = self.direction;
        self.stack.push(from);

        while let Some(current) = self.stack.pop() {
            for &next in Self::neighbours(adjacency, direction, current) {
                if self.visited[next as usize] {
                    continue;
                }
                if self.origin == Some(next) {
                    self.stack.clear();
                    return Walk::ReachedOrigin;
                }
                self.visited.set(next as usize, true);
                self.stack.push(next);
            }
        }
        Walk::Completed
    }

    pub fn is_visited(&self, index: u32) -> bool {
        self.visited
            .get(index as usize)
            .map(|bit| *bit)
            .unwrap_or(false)
    }

    pub fn mark(&mut self, index: u32) {
        if (index as usize) < self.visited.len() {
            self.visited.set(index as usize, true);
        }
    }

    pub fn visited_count(&self) -> usize {
        self.visited.count_ones()
    }

    /// Visited internal indices in ascending order.
    pub fn into_indices(self) -> Vec<u32> {
        self.visited.iter_ones().map(|i| i as u32).collect()
    }
}

/// Longest path (in edges) from `start` along `direction`.
///
/// Kahn-style topological pass over the closure of `start`. Nodes that sit
/// on a cycle are reached but never expanded.
pub fn longest_path(adjacency: &Adjacency, start: u32, direction: Direction) -> usize {
    let mut traversal = Traversal::new(adjacency, direction);
    traversal.walk_from(start);
    traversal.mark(start);
    let members = traversal.into_indices();

    let mut pending: HashMap<u32, u32> = members.iter().map(|&m| (m, 0)).collect();
    for &member in &members {
        for &next in Traversal::neighbours(adjacency, direction, member) {
            if let Some(count) = pending.get_mut(&next) {
                *count += 1;
            }
        }
    }

    let mut distance: HashMap<u32, usize> = HashMap::with_capacity(members.len());
    let mut ready: Vec<u32> = Vec::new();
    if pending.get(&start) == Some(&0) {
        distance.insert(start, 0);
        ready.push(start);
    }

    while let Some(current) = ready.pop() {
        let here = distance.get(&current).copied().unwrap_or(0);
        for &next in Traversal::neighbours(adjacency, direction, current) {
            let best = distance.entry(next).or_insert(0);
            *best = (*best).max(here + 1);
            if let Some(count) = pending.get_mut(&next) {
                *count -= 1;
                if *count == 0 {
                    ready.push(next);
                }
            }
        }
    }
    distance.values().copied().max().unwrap_or(0)
}
