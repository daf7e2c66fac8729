//! Dispatch table compilation.
//!
//! Each method is compiled independently against a snapshot of the class
//! hierarchy:
//!
//! 1. Map the declared class and every definition class to a [`ClassId`],
//!    checking that definitions stay inside the declared hierarchy.
//! 2. At each virtual position, compute for every class reachable from the
//!    declared class the set of definitions applicable there, and group
//!    classes with equal sets.
//! 3. For every combination of groups, intersect the sets and keep the
//!    maximal definitions.
//! 4. Bind each definition's `next` the same way, using the definition's
//!    own class tuple and excluding the definition itself.

use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use tracing::{debug, info, warn};

use crate::bitset::BitSet;
use crate::config::{AmbiguityPolicy, HierarchyCheck, RebuildOptions};
use crate::dispatcher::{CompiledDefinition, CompiledMethod, Dispatcher};
use crate::error::BuildError;
use crate::hierarchy::{ClassId, ClassRegistry, Closure};
use crate::method::MethodRecord;
use crate::report::{AmbiguityReport, BuildReport, MethodStats};

use super::resolver::DispatchResolver;
use super::result::Resolution;
use super::table::{Cell, DispatchTable, NextSlot, Position};
use super::types::Candidate;

/// Compile every method into a dispatcher.
pub(crate) fn compile(
    classes: &ClassRegistry,
    methods: &[MethodRecord],
    options: &RebuildOptions,
) -> Result<Dispatcher, BuildError> {
    let mut report = BuildReport::default();

    match options.hierarchy_check {
        HierarchyCheck::Ignore => {}
        HierarchyCheck::Warn => {
            for edge in classes.missing_edges() {
                warn!("{edge}");
                report.missing_edges.push(edge);
            }
        }
        HierarchyCheck::Deny => {
            let edges = classes.missing_edges();
            if !edges.is_empty() {
                return Err(BuildError::IncompleteHierarchy { edges });
            }
        }
    }

    let closure = classes.closure();
    let mut compiled = Vec::with_capacity(methods.len());
    for method in methods {
        let output = TableCompiler::new(classes, &closure, method).compile()?;

        if !output.ambiguities.is_empty() {
            match options.ambiguity {
                AmbiguityPolicy::Fail => {
                    return Err(BuildError::Ambiguous {
                        method: method.name(),
                        ambiguities: output.ambiguities,
                    });
                }
                AmbiguityPolicy::Defer => {
                    for ambiguity in &output.ambiguities {
                        warn!("ambiguous call: {ambiguity}");
                    }
                }
            }
        }

        if options.trace {
            info!("{}", output.method);
        }
        debug!("{}", output.stats);

        report.methods.push(output.stats);
        report.ambiguities.extend(output.ambiguities);
        compiled.push(output.method);
    }

    let registered: FxHashMap<_, _> = classes
        .iter()
        .map(|record| (record.info().type_id(), record.name()))
        .collect();

    debug!(
        "compiled {} method(s) over {} class(es)",
        compiled.len(),
        registered.len()
    );
    Ok(Dispatcher::new(
        compiled,
        registered,
        options.unknown_class,
        report,
    ))
}

/// Everything produced for one method.
struct CompiledOutput {
    method: CompiledMethod,
    stats: MethodStats,
    ambiguities: Vec<AmbiguityReport>,
}

/// Class groups of one position, before strides are known.
struct PositionGroups {
    /// Definitions applicable to each group.
    masks: Vec<BitSet>,
    /// Classes in each group, in registration order.
    members: Vec<Vec<ClassId>>,
}

/// Table compiler for a single method.
struct TableCompiler<'a> {
    classes: &'a ClassRegistry,
    closure: &'a Closure,
    resolver: DispatchResolver<'a>,
    method: &'a MethodRecord,
}

impl<'a> TableCompiler<'a> {
    fn new(classes: &'a ClassRegistry, closure: &'a Closure, method: &'a MethodRecord) -> Self {
        Self {
            classes,
            closure,
            resolver: DispatchResolver::new(closure),
            method,
        }
    }

    fn compile(&self) -> Result<CompiledOutput, BuildError> {
        let declared = self.declared_classes()?;
        let candidates = self.candidates(&declared)?;

        let groups: Vec<_> = declared
            .iter()
            .enumerate()
            .map(|(position, &root)| self.group_position(position, root, &candidates))
            .collect();

        // Row-major: the last position varies fastest.
        let mut strides = vec![1; groups.len()];
        for position in (0..groups.len().saturating_sub(1)).rev() {
            strides[position] = strides[position + 1] * groups[position + 1].members.len();
        }
        let cell_count: usize = groups.iter().map(|g| g.members.len()).product();

        let definition_count = candidates.len();
        let mut cells = Vec::with_capacity(cell_count);
        let mut ambiguous_sets: Vec<Vec<u32>> = Vec::new();
        let mut ambiguities = Vec::new();

        for offset in 0..cell_count {
            let coordinates: Vec<usize> = groups
                .iter()
                .zip(&strides)
                .map(|(g, stride)| (offset / stride) % g.members.len())
                .collect();

            let mut mask = BitSet::full(definition_count);
            for (g, &group) in groups.iter().zip(&coordinates) {
                mask.intersect_with(&g.masks[group]);
            }

            match self.select(&mask, &candidates) {
                Resolution::Resolved(definition) => cells.push(Cell::Resolved(definition as u32)),
                Resolution::NoMatch => cells.push(Cell::NoMatch),
                Resolution::Ambiguous(maximal) => {
                    ambiguities.push(AmbiguityReport {
                        method: self.method.name(),
                        classes: groups
                            .iter()
                            .zip(&coordinates)
                            .map(|(g, &group)| self.names(&g.members[group]))
                            .collect(),
                        candidates: maximal
                            .iter()
                            .map(|d| self.method.definitions[*d].name.clone())
                            .collect(),
                    });
                    cells.push(Cell::Ambiguous(ambiguous_sets.len() as u32));
                    ambiguous_sets.push(maximal.into_iter().map(|d| d as u32).collect());
                }
            }
        }

        let positions: Vec<Position> = groups
            .iter()
            .zip(&strides)
            .map(|(g, &stride)| self.position(g, stride))
            .collect();

        let definitions = self
            .method
            .definitions
            .iter()
            .zip(&candidates)
            .map(|(definition, candidate)| CompiledDefinition {
                name: definition.name.clone(),
                body: definition.body.clone(),
                next: self.next_slot(candidate, &candidates),
            })
            .collect();

        let stats = MethodStats {
            name: self.method.name(),
            signature: self.method.to_string(),
            definitions: definition_count,
            groups: positions.iter().map(Position::group_count).collect(),
            cells: cells.len(),
            resolved: cells.iter().filter(|c| matches!(c, Cell::Resolved(_))).count(),
            no_match: cells.iter().filter(|c| matches!(c, Cell::NoMatch)).count(),
            ambiguous: cells.iter().filter(|c| matches!(c, Cell::Ambiguous(_))).count(),
        };

        Ok(CompiledOutput {
            method: CompiledMethod {
                name: self.method.name(),
                signature: self.method.key.signature,
                table: DispatchTable {
                    positions,
                    cells,
                    ambiguities: ambiguous_sets,
                },
                definitions,
            },
            stats,
            ambiguities,
        })
    }

    /// The registered class of each declared virtual parameter.
    fn declared_classes(&self) -> Result<Vec<ClassId>, BuildError> {
        self.method
            .virtuals
            .iter()
            .map(|info| {
                self.classes
                    .class_id(info.type_id())
                    .ok_or(BuildError::UnregisteredClass {
                        method: self.method.name(),
                        class: info.name(),
                    })
            })
            .collect()
    }

    /// Convert definitions to resolver candidates, checking each class
    /// against the declared parameter class.
    fn candidates(&self, declared: &[ClassId]) -> Result<Vec<Candidate>, BuildError> {
        let mut candidates = Vec::with_capacity(self.method.definitions.len());

        for (index, definition) in self.method.definitions.iter().enumerate() {
            let mut classes = Vec::with_capacity(declared.len());
            for (position, (info, &root)) in definition.classes.iter().zip(declared).enumerate() {
                let class = self
                    .classes
                    .class_id(info.type_id())
                    .ok_or(BuildError::UnregisteredClass {
                        method: self.method.name(),
                        class: info.name(),
                    })?;
                if !self.closure.is_subclass(class, root) {
                    return Err(BuildError::DefinitionOutsideHierarchy {
                        method: self.method.name(),
                        definition: definition.name.clone(),
                        position,
                        class: info.name(),
                        declared: self.classes.record(root).name(),
                    });
                }
                classes.push(class);
            }
            candidates.push(Candidate::new(index, classes));
        }

        Ok(candidates)
    }

    /// Group the classes reachable from `root` by their applicable
    /// definitions at `position`.
    fn group_position(&self, position: usize, root: ClassId, candidates: &[Candidate]) -> PositionGroups {
        let mut groups: IndexMap<BitSet, Vec<ClassId>> = IndexMap::new();

        for class in self.classes.descendants(root) {
            let mut mask = BitSet::new(candidates.len());
            for candidate in candidates {
                if self.closure.is_subclass(class, candidate.classes[position]) {
                    mask.insert(candidate.index);
                }
            }
            groups.entry(mask).or_default().push(class);
        }

        let (masks, members): (Vec<_>, Vec<_>) = groups.into_iter().unzip();
        PositionGroups { masks, members }
    }

    fn position(&self, groups: &PositionGroups, stride: usize) -> Position {
        let mut lookup = FxHashMap::default();
        for (group, members) in groups.members.iter().enumerate() {
            for &class in members {
                lookup.insert(self.classes.record(class).info().type_id(), group as u32);
            }
        }
        Position {
            groups: lookup,
            members: groups.members.iter().map(|m| self.names(m)).collect(),
            stride,
        }
    }

    /// Pick the maximal definitions among those in `mask`.
    fn select(&self, mask: &BitSet, candidates: &[Candidate]) -> Resolution {
        if mask.is_empty() {
            return Resolution::NoMatch;
        }
        let applicable: Vec<&Candidate> = mask.iter().map(|d| &candidates[d]).collect();
        let maximal = self.resolver.find_maximal(&applicable);
        Resolution::from_maximal(maximal.iter().map(|c| c.index).collect())
    }

    /// The definitions `candidate` delegates to: the maximal ones among all
    /// others applicable to its own classes.
    fn next_slot(&self, candidate: &Candidate, candidates: &[Candidate]) -> NextSlot {
        let applicable: Vec<&Candidate> = candidates
            .iter()
            .filter(|other| other.index != candidate.index)
            .filter(|other| self.resolver.is_applicable(other, &candidate.classes))
            .collect();
        let maximal = self.resolver.find_maximal(&applicable);
        match Resolution::from_maximal(maximal.iter().map(|c| c.index).collect()) {
            Resolution::Resolved(next) => NextSlot::Bound(next as u32),
            Resolution::NoMatch => NextSlot::Exhausted,
            Resolution::Ambiguous(candidates) => {
                NextSlot::Ambiguous(candidates.into_iter().map(|d| d as u32).collect())
            }
        }
    }

    fn names(&self, classes: &[ClassId]) -> Vec<&'static str> {
        classes.iter().map(|c| self.classes.record(*c).name()).collect()
    }
}
