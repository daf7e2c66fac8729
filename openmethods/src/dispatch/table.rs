//! Compiled dispatch tables.
//!
//! ```text
//! meet(Animal, Animal)          position 0 groups     position 1 groups
//!                               0: Animal             0: Animal
//!                               1: Dog|Bulldog        1: Dog|Bulldog
//!                               2: Cat                2: Cat
//!
//! cells (row-major, stride = [3, 1])
//! ┌──────────┬──────────┬──────────┐
//! │ no match │ no match │ no match │
//! ├──────────┼──────────┼──────────┤
//! │ no match │ meet#0   │ meet#1   │
//! ├──────────┼──────────┼──────────┤
//! │ no match │ meet#2   │ meet#3   │
//! └──────────┴──────────┴──────────┘
//! ```
//!
//! Classes with the same set of applicable definitions at a position share
//! a group, so the table is sized by distinct behaviors rather than by the
//! number of classes.

use std::any::TypeId;

use rustc_hash::FxHashMap;

/// One entry of a dispatch table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Cell {
    /// Index of the winning definition.
    Resolved(u32),
    /// No definition applies.
    NoMatch,
    /// Index into [`DispatchTable::ambiguities`].
    Ambiguous(u32),
}

/// Where a definition's `next` call goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum NextSlot {
    Bound(u32),
    Exhausted,
    Ambiguous(Vec<u32>),
}

/// Lookup data for one virtual position.
#[derive(Debug, Clone)]
pub(crate) struct Position {
    /// Group of each class reachable from the declared class.
    pub(crate) groups: FxHashMap<TypeId, u32>,
    /// Class names in each group, for diagnostics.
    pub(crate) members: Vec<Vec<&'static str>>,
    pub(crate) stride: usize,
}

impl Position {
    pub(crate) fn group_count(&self) -> usize {
        self.members.len()
    }

    pub(crate) fn group_label(&self, group: usize) -> String {
        self.members[group].join("|")
    }
}

/// A runtime class with no group at some position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Miss {
    pub(crate) position: usize,
    pub(crate) class: TypeId,
}

/// Per-method table from runtime class combinations to definitions.
#[derive(Debug, Clone)]
pub(crate) struct DispatchTable {
    pub(crate) positions: Vec<Position>,
    pub(crate) cells: Vec<Cell>,
    /// Maximal candidates of each ambiguous cell.
    pub(crate) ambiguities: Vec<Vec<u32>>,
}

impl DispatchTable {
    /// Find the cell for the given runtime classes.
    pub(crate) fn lookup(&self, classes: &[TypeId]) -> Result<Cell, Miss> {
        debug_assert_eq!(classes.len(), self.positions.len());

        let mut offset = 0;
        for (index, (position, class)) in self.positions.iter().zip(classes).enumerate() {
            match position.groups.get(class) {
                Some(&group) => offset += group as usize * position.stride,
                None => {
                    return Err(Miss {
                        position: index,
                        class: *class,
                    })
                }
            }
        }
        Ok(self.cells[offset])
    }

    /// Group index at each position of the cell at `offset`.
    pub(crate) fn coordinates(&self, offset: usize) -> Vec<usize> {
        self.positions
            .iter()
            .map(|p| (offset / p.stride) % p.group_count())
            .collect()
    }

    /// Human-readable label of the cell at `offset`: `(Dog|Bulldog, Cat)`.
    pub(crate) fn cell_label(&self, offset: usize) -> String {
        let labels: Vec<_> = self
            .coordinates(offset)
            .into_iter()
            .zip(&self.positions)
            .map(|(group, position)| position.group_label(group))
            .collect();
        format!("({})", labels.join(", "))
    }
}
