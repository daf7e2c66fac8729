//! Call-site dispatch over compiled tables.
//!
//! A [`Dispatcher`] is the immutable result of `update_methods`. It is
//! `Send + Sync`; any number of threads may call through it without
//! locking. Registering more classes or definitions does not affect an
//! existing dispatcher; rebuild to get a new one.

use std::any::{Any, TypeId};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use rustc_hash::FxHashMap;
use tracing::error;

use crate::class::Class;
use crate::config::UnknownClassPolicy;
use crate::dispatch::table::{Cell, DispatchTable, Miss, NextSlot};
use crate::error::DispatchError;
use crate::method::{signature_of, Body, DefinitionHandle, Method, MethodId};
use crate::report::BuildReport;

/// A compiled method.
pub(crate) struct CompiledMethod {
    pub(crate) name: &'static str,
    pub(crate) signature: TypeId,
    pub(crate) table: DispatchTable,
    pub(crate) definitions: Vec<CompiledDefinition>,
}

/// A definition with its `next` binding resolved.
pub(crate) struct CompiledDefinition {
    pub(crate) name: String,
    pub(crate) body: Arc<dyn Any + Send + Sync>,
    pub(crate) next: NextSlot,
}

/// Where a definition delegates to, as bound by the last rebuild.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NextTarget {
    Definition(DefinitionHandle),
    /// No less specific definition applies.
    Exhausted,
    /// Several less specific definitions are maximal.
    Ambiguous(Vec<DefinitionHandle>),
}

/// Compiled dispatch tables for every method of a registry.
pub struct Dispatcher {
    methods: Vec<CompiledMethod>,
    /// Every registered class, for telling unregistered classes apart from
    /// classes outside a method's hierarchy.
    registered: FxHashMap<TypeId, &'static str>,
    unknown_class: UnknownClassPolicy,
    report: BuildReport,
}

impl Dispatcher {
    pub(crate) fn new(
        methods: Vec<CompiledMethod>,
        registered: FxHashMap<TypeId, &'static str>,
        unknown_class: UnknownClassPolicy,
        report: BuildReport,
    ) -> Self {
        Self {
            methods,
            registered,
            unknown_class,
            report,
        }
    }

    pub fn report(&self) -> &BuildReport {
        &self.report
    }

    pub fn method_count(&self) -> usize {
        self.methods.len()
    }

    /// Display name of a definition, e.g. `kick(Bulldog)`.
    pub fn definition_name(&self, definition: DefinitionHandle) -> Option<&str> {
        self.methods
            .get(definition.method().index())?
            .definitions
            .get(definition.index())
            .map(|d| d.name.as_str())
    }

    /// The delegate bound to a definition's `next`.
    pub fn next_of(&self, definition: DefinitionHandle) -> Result<NextTarget, DispatchError> {
        let method = definition.method();
        let compiled = self.compiled(method)?;
        let slot = &compiled
            .definitions
            .get(definition.index())
            .ok_or(DispatchError::UnknownMethod {
                index: method.index(),
            })?
            .next;
        Ok(match slot {
            NextSlot::Bound(next) => NextTarget::Definition(DefinitionHandle::new(method, *next)),
            NextSlot::Exhausted => NextTarget::Exhausted,
            NextSlot::Ambiguous(candidates) => NextTarget::Ambiguous(
                candidates
                    .iter()
                    .map(|c| DefinitionHandle::new(method, *c))
                    .collect(),
            ),
        })
    }

    /// Render every compiled table.
    pub fn describe(&self) -> String {
        self.methods.iter().map(ToString::to_string).collect()
    }

    pub(crate) fn compiled(&self, method: MethodId) -> Result<&CompiledMethod, DispatchError> {
        self.methods
            .get(method.index())
            .ok_or(DispatchError::UnknownMethod {
                index: method.index(),
            })
    }

    /// Select the definition for the given runtime classes.
    pub(crate) fn select(&self, method: MethodId, classes: &[TypeId]) -> Result<u32, DispatchError> {
        self.select_named(method, classes, &[])
    }

    /// Like [`select`](Self::select), with the runtime class names used to
    /// describe a class missing from the table.
    pub(crate) fn select_named(
        &self,
        method: MethodId,
        classes: &[TypeId],
        names: &[&'static str],
    ) -> Result<u32, DispatchError> {
        let compiled = self.compiled(method)?;
        match compiled.table.lookup(classes) {
            Ok(Cell::Resolved(definition)) => Ok(definition),
            Ok(Cell::NoMatch) => Err(DispatchError::NoDefinition {
                method: compiled.name,
                classes: self.class_names(classes),
            }),
            Ok(Cell::Ambiguous(index)) => Err(DispatchError::Ambiguous {
                method: compiled.name,
                classes: self.class_names(classes),
                candidates: compiled.table.ambiguities[index as usize]
                    .iter()
                    .map(|d| compiled.definitions[*d as usize].name.clone())
                    .collect(),
            }),
            Err(miss) => {
                let name = names.get(miss.position).copied();
                Err(self.unknown_class(compiled, miss, name))
            }
        }
    }

    fn unknown_class(&self, compiled: &CompiledMethod, miss: Miss, name: Option<&'static str>) -> DispatchError {
        let err = match self.registered.get(&miss.class) {
            Some(&name) => DispatchError::ClassOutsideHierarchy {
                method: compiled.name,
                position: miss.position,
                class: name,
            },
            None => DispatchError::UnregisteredClass {
                method: compiled.name,
                position: miss.position,
                class: match name {
                    Some(name) => name.to_string(),
                    None => format!("{:?}", miss.class),
                },
            },
        };
        if self.unknown_class == UnknownClassPolicy::Abort {
            error!("{err}");
            panic!("{err}");
        }
        err
    }

    fn class_names(&self, classes: &[TypeId]) -> String {
        classes
            .iter()
            .map(|c| self.registered.get(c).copied().unwrap_or("<unregistered>"))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// The compiled method, provided it was declared with this signature.
    pub(crate) fn typed<V, A, R, const N: usize>(&self, method: MethodId) -> Result<&CompiledMethod, DispatchError>
    where
        V: ?Sized + Class,
        A: 'static,
        R: 'static,
    {
        let compiled = self.compiled(method)?;
        if compiled.signature != signature_of::<V, A, R, N>() {
            return Err(DispatchError::SignatureMismatch {
                method: compiled.name,
            });
        }
        Ok(compiled)
    }

    /// Invoke a definition with its `next` accessor.
    pub(crate) fn invoke<V, A, R, const N: usize>(
        &self,
        method: MethodId,
        definition: u32,
        virtuals: [&V; N],
        args: A,
    ) -> Result<R, DispatchError>
    where
        V: ?Sized + Class,
        A: 'static,
        R: 'static,
    {
        let compiled = self.typed::<V, A, R, N>(method)?;
        let body = compiled.definitions[definition as usize]
            .body
            .as_ref()
            .downcast_ref::<Body<V, A, R, N>>()
            .ok_or(DispatchError::SignatureMismatch {
                method: compiled.name,
            })?;
        let next = Next {
            dispatcher: self,
            method,
            definition,
            _marker: PhantomData,
        };
        Ok((body.0)(&next, virtuals, args))
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("methods", &self.methods.len())
            .field("classes", &self.registered.len())
            .field("unknown_class", &self.unknown_class)
            .finish()
    }
}

impl fmt::Display for CompiledMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let table = &self.table;
        writeln!(
            f,
            "{}: {} position(s), {} cell(s)",
            self.name,
            table.positions.len(),
            table.cells.len()
        )?;
        for (index, position) in table.positions.iter().enumerate() {
            let groups: Vec<_> = (0..position.group_count())
                .map(|g| format!("[{}]", position.group_label(g)))
                .collect();
            writeln!(f, "  position {index}: {}", groups.join(" "))?;
        }
        for (offset, cell) in table.cells.iter().enumerate() {
            let target = match cell {
                Cell::Resolved(d) => self.definitions[*d as usize].name.clone(),
                Cell::NoMatch => "no definition".to_string(),
                Cell::Ambiguous(a) => format!(
                    "ambiguous: {}",
                    table.ambiguities[*a as usize]
                        .iter()
                        .map(|d| self.definitions[*d as usize].name.as_str())
                        .collect::<Vec<_>>()
                        .join(", ")
                ),
            };
            writeln!(f, "  {} -> {}", table.cell_label(offset), target)?;
        }
        for definition in &self.definitions {
            let next = match &definition.next {
                NextSlot::Bound(d) => self.definitions[*d as usize].name.clone(),
                NextSlot::Exhausted => "none".to_string(),
                NextSlot::Ambiguous(candidates) => format!(
                    "ambiguous: {}",
                    candidates
                        .iter()
                        .map(|d| self.definitions[*d as usize].name.as_str())
                        .collect::<Vec<_>>()
                        .join(", ")
                ),
            };
            writeln!(f, "  {} next -> {}", definition.name, next)?;
        }
        Ok(())
    }
}

impl<V, A, R, const N: usize> Method<V, A, R, N>
where
    V: ?Sized + Class,
    A: 'static,
    R: 'static,
{
    /// Call the method: select a definition from the runtime classes of
    /// `virtuals` and invoke it with the original arguments.
    pub fn call(&self, dispatcher: &Dispatcher, virtuals: [&V; N], args: A) -> Result<R, DispatchError> {
        let classes = virtuals.map(|v| v.dynamic_class());
        let names = virtuals.map(|v| v.class_name());
        let definition = dispatcher.select_named(self.id, &classes, &names)?;
        dispatcher.invoke(self.id, definition, virtuals, args)
    }

    /// The definition a call with these runtime classes would run.
    pub fn resolve(
        &self,
        dispatcher: &Dispatcher,
        classes: [TypeId; N],
    ) -> Result<DefinitionHandle, DispatchError> {
        dispatcher.typed::<V, A, R, N>(self.id)?;
        dispatcher
            .select(self.id, &classes)
            .map(|definition| DefinitionHandle::new(self.id, definition))
    }
}

/// Delegation accessor handed to every running definition.
///
/// `next.call(..)` runs the next most specific definition, with the same
/// meaning as calling an overridden base method.
pub struct Next<'d, V: ?Sized, A, R, const N: usize> {
    dispatcher: &'d Dispatcher,
    method: MethodId,
    definition: u32,
    _marker: PhantomData<fn(&V, A) -> R>,
}

impl<'d, V, A, R, const N: usize> Next<'d, V, A, R, N>
where
    V: ?Sized + Class,
    A: 'static,
    R: 'static,
{
    /// The definition currently running.
    pub fn current(&self) -> DefinitionHandle {
        DefinitionHandle::new(self.method, self.definition)
    }

    /// Whether a unique next definition is bound.
    pub fn exists(&self) -> bool {
        matches!(self.slot(), Ok(NextSlot::Bound(_)))
    }

    /// Run the next most specific definition with the given arguments.
    pub fn call(&self, virtuals: [&V; N], args: A) -> Result<R, DispatchError> {
        let compiled = self.dispatcher.compiled(self.method)?;
        let current = &compiled.definitions[self.definition as usize];
        match &current.next {
            NextSlot::Bound(next) => self.dispatcher.invoke(self.method, *next, virtuals, args),
            NextSlot::Exhausted => Err(DispatchError::NoNextDefinition {
                method: compiled.name,
                definition: current.name.clone(),
            }),
            NextSlot::Ambiguous(candidates) => Err(DispatchError::AmbiguousNext {
                method: compiled.name,
                definition: current.name.clone(),
                candidates: candidates
                    .iter()
                    .map(|c| compiled.definitions[*c as usize].name.clone())
                    .collect(),
            }),
        }
    }

    fn slot(&self) -> Result<&'d NextSlot, DispatchError> {
        let compiled = self.dispatcher.compiled(self.method)?;
        Ok(&compiled.definitions[self.definition as usize].next)
    }
}
