//! Dependency tracking for recalculation

use crate::cell::CellAddress;
use std::collections::{BTreeMap, BTreeSet};

/// Cells to recalculate after a change, as computed by [`DependencyGraph::recalc_order`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecalcOrder {
    /// Downstream cells, each after every downstream cell it reads
    pub order: Vec<CellAddress>,
    /// Downstream cells in or behind a cycle, in row-major order
    pub blocked: Vec<CellAddress>,
}

/// Dependency graph for formula cells
///
/// Tracks which cells each formula reads (precedents, in reference-discovery order) and the
/// reverse relation (dependents, in row-major order). A cell's precedents always reflect
/// its current formula only.
#[derive(Debug, Default, Clone)]
pub struct DependencyGraph {
    /// Cell → Cells that depend on it (dependents)
    dependents: BTreeMap<CellAddress, BTreeSet<CellAddress>>,
    /// Cell → Cells it depends on (precedents)
    precedents: BTreeMap<CellAddress, Vec<CellAddress>>,
}

impl DependencyGraph {
    /// Create a new empty dependency graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the precedents of `cell` with `references`
    ///
    /// Repeated references are kept once, at their first position.
    pub fn set_precedents(&mut self, cell: CellAddress, references: &[CellAddress]) {
        self.clear_precedents(cell);
        if references.is_empty() {
            return;
        }

        let mut list = Vec::with_capacity(references.len());
        for &precedent in references {
            if list.contains(&precedent) {
                continue;
            }
            list.push(precedent);
            self.dependents.entry(precedent).or_default().insert(cell);
        }
        self.precedents.insert(cell, list);
    }

    /// Remove the outgoing edges of `cell`; cells reading `cell` are unaffected
    pub fn clear_precedents(&mut self, cell: CellAddress) {
        if let Some(precedents) = self.precedents.remove(&cell) {
            for precedent in precedents {
                if let Some(deps) = self.dependents.get_mut(&precedent) {
                    deps.remove(&cell);
                    if deps.is_empty() {
                        self.dependents.remove(&precedent);
                    }
                }
            }
        }
    }

    /// Get cells that depend on the given cell, in row-major order
    pub fn dependents(&self, cell: CellAddress) -> impl Iterator<Item = CellAddress> + '_ {
        self.dependents
            .get(&cell)
            .into_iter()
            .flat_map(|set| set.iter().copied())
    }

    /// Get cells that the given cell depends on, in reference order
    pub fn precedents(&self, cell: CellAddress) -> &[CellAddress] {
        self.precedents.get(&cell).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Every cell downstream of `changed`, in recalculation order
    ///
    /// Each downstream cell appears once, after all downstream cells it reads; among the
    /// cells ready at the same time the first in row-major order goes first. Cells that
    /// can never become ready because they sit on or behind a cycle end up in `blocked`.
    pub fn recalc_order(&self, changed: CellAddress) -> RecalcOrder {
        let mut downstream = BTreeSet::new();
        let mut stack: Vec<CellAddress> = self.dependents(changed).collect();
        while let Some(cell) = stack.pop() {
            if downstream.insert(cell) {
                stack.extend(self.dependents(cell));
            }
        }

        let mut waiting: BTreeMap<CellAddress, usize> = downstream
            .iter()
            .map(|&cell| {
                let count = self
                    .precedents(cell)
                    .iter()
                    .filter(|p| downstream.contains(*p))
                    .count();
                (cell, count)
            })
            .collect();
        let mut ready: BTreeSet<CellAddress> = waiting
            .iter()
            .filter(|(_, count)| **count == 0)
            .map(|(&cell, _)| cell)
            .collect();

        let mut order = Vec::with_capacity(downstream.len());
        while let Some(cell) = ready.pop_first() {
            waiting.remove(&cell);
            order.push(cell);
            for dependent in self.dependents(cell) {
                if let Some(count) = waiting.get_mut(&dependent) {
                    *count -= 1;
                    if *count == 0 {
                        ready.insert(dependent);
                    }
                }
            }
        }

        RecalcOrder {
            order,
            blocked: waiting.into_keys().collect(),
        }
    }

    /// Check if any formula reads the given cell
    pub fn is_referenced(&self, cell: CellAddress) -> bool {
        self.dependents.contains_key(&cell)
    }

    /// Detect a circular reference reachable from a cell through its precedents
    pub fn has_circular_reference(&self, cell: CellAddress) -> bool {
        let mut visited = BTreeSet::new();
        let mut in_stack = BTreeSet::new();
        self.detect_cycle(cell, &mut visited, &mut in_stack)
    }

    fn detect_cycle(
        &self,
        cell: CellAddress,
        visited: &mut BTreeSet<CellAddress>,
        in_stack: &mut BTreeSet<CellAddress>,
    ) -> bool {
        if in_stack.contains(&cell) {
            return true;
        }
        if !visited.insert(cell) {
            return false;
        }

        in_stack.insert(cell);
        for &precedent in self.precedents(cell) {
            if self.detect_cycle(precedent, visited, in_stack) {
                return true;
            }
        }
        in_stack.remove(&cell);
        false
    }

    /// Number of cells with at least one precedent
    pub fn len(&self) -> usize {
        self.precedents.len()
    }

    /// Check if no cell has precedents
    pub fn is_empty(&self) -> bool {
        self.precedents.is_empty()
    }

    /// Clear the entire graph
    pub fn clear(&mut self) {
        self.dependents.clear();
        self.precedents.clear();
    }
}
