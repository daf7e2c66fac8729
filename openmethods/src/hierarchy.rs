//! Class hierarchy registry.
//!
//! Classes are registered in groups. Direct inheritance edges are inferred
//! only between classes that appear in the *same* group: if `Dog` derives
//! from `Animal`, some call to [`ClassRegistry::register_classes`] must list
//! both. Large hierarchies can therefore be registered piecemeal, at the
//! price of this pairing requirement. [`ClassRegistry::missing_edges`]
//! reports pairs that were registered but never grouped together.

use std::any::TypeId;
use std::fmt;

use indexmap::IndexMap;
use tracing::debug;

use crate::bitset::BitSet;
use crate::class::ClassInfo;
use crate::error::{RegistrationError, RegistrationResult};

/// Dense identity of a registered class, in registration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClassId(u32);

impl ClassId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A registered class and its direct inheritance edges.
#[derive(Debug, Clone)]
pub struct ClassRecord {
    id: ClassId,
    info: ClassInfo,
    direct_bases: Vec<ClassId>,
    direct_derived: Vec<ClassId>,
}

impl ClassRecord {
    pub fn id(&self) -> ClassId {
        self.id
    }

    pub fn info(&self) -> &ClassInfo {
        &self.info
    }

    pub fn name(&self) -> &'static str {
        self.info.name()
    }

    /// Direct bases recorded so far, sorted by id.
    pub fn direct_bases(&self) -> &[ClassId] {
        &self.direct_bases
    }

    /// Direct derived classes recorded so far, sorted by id.
    pub fn direct_derived(&self) -> &[ClassId] {
        &self.direct_derived
    }
}

/// A declared direct base that was never registered together with its
/// derived class, so the edge between them is missing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingEdge {
    pub derived: &'static str,
    pub base: &'static str,
}

impl fmt::Display for MissingEdge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "`{}` derives from `{}` but they were never registered together",
            self.derived, self.base
        )
    }
}

/// All registered classes and the edges between them.
#[derive(Debug, Clone, Default)]
pub struct ClassRegistry {
    classes: IndexMap<TypeId, ClassRecord>,
}

impl ClassRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a group of classes and the direct edges among them.
    ///
    /// The group is applied atomically: if it would close an inheritance
    /// cycle, nothing is recorded.
    pub fn register_classes(&mut self, group: &[ClassInfo]) -> RegistrationResult<()> {
        let mut edges = Vec::new();
        for derived in group {
            for base in group {
                if derived.derives_directly_from(base) {
                    edges.push((base.type_id(), derived.type_id()));
                }
            }
        }

        let mut trial = self.clone();
        for info in group {
            trial.insert(info)?;
        }
        for &(base, derived) in &edges {
            trial.add_edge(base, derived);
        }
        if let Some((base, derived)) = trial.find_cycle() {
            return Err(RegistrationError::InheritanceCycle {
                class: trial.record(derived).name(),
                base: trial.record(base).name(),
            });
        }

        debug!(
            "registered class group [{}] with {} edge(s)",
            group.iter().map(ClassInfo::name).collect::<Vec<_>>().join(", "),
            edges.len()
        );
        *self = trial;
        Ok(())
    }

    /// Record a class. A class seen before must be described the same way,
    /// since its stored bases drive the consistency check.
    fn insert(&mut self, info: &ClassInfo) -> RegistrationResult<()> {
        if let Some(existing) = self.classes.get(&info.type_id()) {
            if existing.info != *info {
                return Err(RegistrationError::ConflictingClass {
                    class: existing.name(),
                });
            }
            return Ok(());
        }
        let id = ClassId(self.classes.len() as u32);
        self.classes.insert(
            info.type_id(),
            ClassRecord {
                id,
                info: info.clone(),
                direct_bases: Vec::new(),
                direct_derived: Vec::new(),
            },
        );
        Ok(())
    }

    fn add_edge(&mut self, base: TypeId, derived: TypeId) {
        let (Some(base), Some(derived)) = (self.class_id(base), self.class_id(derived)) else {
            return;
        };
        insert_sorted(&mut self.record_mut(derived).direct_bases, base);
        insert_sorted(&mut self.record_mut(base).direct_derived, derived);
    }

    /// Find an edge `(base, derived)` that closes a cycle, if any.
    fn find_cycle(&self) -> Option<(ClassId, ClassId)> {
        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            Unvisited,
            Active,
            Done,
        }

        let mut marks = vec![Mark::Unvisited; self.classes.len()];
        for root in 0..self.classes.len() {
            if marks[root] != Mark::Unvisited {
                continue;
            }
            // Iterative DFS over derived edges: (class, next child to visit).
            let mut stack = vec![(ClassId(root as u32), 0usize)];
            marks[root] = Mark::Active;
            while let Some(top) = stack.last_mut() {
                let (class, child) = *top;
                top.1 += 1;
                if let Some(&next) = self.record(class).direct_derived.get(child) {
                    match marks[next.index()] {
                        Mark::Active => return Some((class, next)),
                        Mark::Unvisited => {
                            marks[next.index()] = Mark::Active;
                            stack.push((next, 0));
                        }
                        Mark::Done => {}
                    }
                } else {
                    marks[class.index()] = Mark::Done;
                    stack.pop();
                }
            }
        }
        None
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub fn class_id(&self, type_id: TypeId) -> Option<ClassId> {
        self.classes.get(&type_id).map(ClassRecord::id)
    }

    pub fn is_registered(&self, type_id: TypeId) -> bool {
        self.classes.contains_key(&type_id)
    }

    pub fn get(&self, id: ClassId) -> Option<&ClassRecord> {
        self.classes.get_index(id.index()).map(|(_, record)| record)
    }

    pub(crate) fn record(&self, id: ClassId) -> &ClassRecord {
        &self.classes[id.index()]
    }

    fn record_mut(&mut self, id: ClassId) -> &mut ClassRecord {
        &mut self.classes[id.index()]
    }

    /// All registered classes, in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &ClassRecord> {
        self.classes.values()
    }

    /// `id` and every class it inherits from, each once, sorted by id.
    pub fn ancestors(&self, id: ClassId) -> Vec<ClassId> {
        self.reachable(id, |record| &record.direct_bases)
    }

    /// `id` and every class inheriting from it, each once, sorted by id.
    pub fn descendants(&self, id: ClassId) -> Vec<ClassId> {
        self.reachable(id, |record| &record.direct_derived)
    }

    fn reachable(&self, start: ClassId, next: impl Fn(&ClassRecord) -> &Vec<ClassId>) -> Vec<ClassId> {
        let mut seen = BitSet::new(self.classes.len());
        let mut stack = vec![start];
        seen.insert(start.index());
        while let Some(class) = stack.pop() {
            for &other in next(self.record(class)) {
                if !seen.contains(other.index()) {
                    seen.insert(other.index());
                    stack.push(other);
                }
            }
        }
        seen.iter().map(|index| ClassId(index as u32)).collect()
    }

    /// Check whether `derived` is `base` or inherits from it.
    pub fn is_subclass(&self, derived: ClassId, base: ClassId) -> bool {
        derived == base || self.ancestors(derived).contains(&base)
    }

    /// Precompute the ancestor sets of every class.
    pub(crate) fn closure(&self) -> Closure {
        Closure {
            ancestors: (0..self.classes.len())
                .map(|index| {
                    let mut set = BitSet::new(self.classes.len());
                    for ancestor in self.ancestors(ClassId(index as u32)) {
                        set.insert(ancestor.index());
                    }
                    set
                })
                .collect(),
        }
    }

    /// Declared direct bases that are registered but not connected.
    pub fn missing_edges(&self) -> Vec<MissingEdge> {
        let mut missing = Vec::new();
        for record in self.classes.values() {
            for base in record.info.direct_bases() {
                let Some(base) = self.classes.get(base) else {
                    continue;
                };
                if !record.direct_bases.contains(&base.id) {
                    missing.push(MissingEdge {
                        derived: record.name(),
                        base: base.name(),
                    });
                }
            }
        }
        missing
    }
}

fn insert_sorted(ids: &mut Vec<ClassId>, id: ClassId) {
    if let Err(pos) = ids.binary_search(&id) {
        ids.insert(pos, id);
    }
}

/// Reflexive ancestor sets, indexed by class id.
#[derive(Debug, Clone)]
pub(crate) struct Closure {
    ancestors: Vec<BitSet>,
}

impl Closure {
    /// Check whether `derived` is `base` or inherits from it.
    pub(crate) fn is_subclass(&self, derived: ClassId, base: ClassId) -> bool {
        self.ancestors[derived.index()].contains(base.index())
    }
}
