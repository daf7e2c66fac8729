//! Method descriptors, typed method handles and definition records.

use std::any::{Any, TypeId};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::class::{display_type_name, Class, ClassInfo};
use crate::dispatcher::Next;

/// Index of a method within its registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MethodId(pub(crate) u32);

impl MethodId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Handle to one definition of a method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DefinitionHandle {
    method: MethodId,
    index: u32,
}

impl DefinitionHandle {
    pub(crate) fn new(method: MethodId, index: u32) -> Self {
        Self { method, index }
    }

    pub fn method(&self) -> MethodId {
        self.method
    }

    /// Position of the definition in its method, in definition order.
    pub fn index(&self) -> usize {
        self.index as usize
    }
}

/// Identity of a method: two methods may share a name if their signatures
/// differ.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MethodKey {
    pub name: &'static str,
    pub signature: TypeId,
}

/// The kind of one method parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamKind {
    /// Takes part in dispatch; bound to a class of the hierarchy.
    Virtual(ClassInfo),
    /// Passed through unchanged; holds the full Rust type name.
    Ordinary(&'static str),
}

impl fmt::Display for ParamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamKind::Virtual(class) => write!(f, "virtual {}", class.name()),
            ParamKind::Ordinary(ty) => f.write_str(&display_type_name(ty)),
        }
    }
}

/// Typed handle to a declared method.
///
/// `N` polymorphic arguments of type `&V` select the definition; the
/// ordinary arguments `A` (a tuple, `()` when there are none) are passed
/// through; definitions return `R`.
pub struct Method<V: ?Sized, A, R, const N: usize> {
    pub(crate) id: MethodId,
    pub(crate) name: &'static str,
    _marker: PhantomData<fn(&V, A) -> R>,
}

impl<V: ?Sized, A, R, const N: usize> Method<V, A, R, N> {
    pub(crate) fn new(id: MethodId, name: &'static str) -> Self {
        Self {
            id,
            name,
            _marker: PhantomData,
        }
    }

    pub fn id(&self) -> MethodId {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl<V: ?Sized, A, R, const N: usize> Clone for Method<V, A, R, N> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<V: ?Sized, A, R, const N: usize> Copy for Method<V, A, R, N> {}

impl<V: ?Sized, A, R, const N: usize> fmt::Debug for Method<V, A, R, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Method")
            .field("id", &self.id)
            .field("name", &self.name)
            .finish()
    }
}

/// The signature identity of `Method<V, A, R, N>`.
pub(crate) fn signature_of<V, A, R, const N: usize>() -> TypeId
where
    V: ?Sized + Class,
    A: 'static,
    R: 'static,
{
    TypeId::of::<Method<V, A, R, N>>()
}

/// A definition's entry point, stored type-erased in the registry and
/// recovered by downcasting at the call site.
#[allow(clippy::type_complexity)]
pub(crate) struct Body<V: ?Sized + 'static, A: 'static, R: 'static, const N: usize>(
    pub(crate) Box<dyn for<'n, 'd, 'v> Fn(&'n Next<'d, V, A, R, N>, [&'v V; N], A) -> R + Send + Sync>,
);

/// A declared method and its candidate definitions.
pub struct MethodRecord {
    pub(crate) key: MethodKey,
    pub(crate) params: Vec<ParamKind>,
    pub(crate) virtuals: Vec<ClassInfo>,
    pub(crate) return_type: &'static str,
    pub(crate) definitions: Vec<DefinitionRecord>,
}

impl MethodRecord {
    pub fn key(&self) -> MethodKey {
        self.key
    }

    pub fn name(&self) -> &'static str {
        self.key.name
    }

    /// Parameter kinds in order: the virtual ones first, then the ordinary
    /// argument tuple if it is not `()`.
    pub fn params(&self) -> &[ParamKind] {
        &self.params
    }

    pub fn return_type(&self) -> &'static str {
        self.return_type
    }

    pub fn definition_count(&self) -> usize {
        self.definitions.len()
    }

    /// The class tuples of the definitions, in definition order.
    pub fn definition_classes(&self) -> impl Iterator<Item = &[ClassInfo]> {
        self.definitions.iter().map(|d| d.classes.as_slice())
    }
}

impl fmt::Debug for MethodRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodRecord")
            .field("key", &self.key)
            .field("params", &self.params)
            .field("return_type", &self.return_type)
            .field("definitions", &self.definitions.len())
            .finish()
    }
}

impl fmt::Display for MethodRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.key.name)?;
        for (i, param) in self.params.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{param}")?;
        }
        write!(f, ") -> {}", display_type_name(self.return_type))
    }
}

/// One candidate implementation of a method.
pub(crate) struct DefinitionRecord {
    pub(crate) name: String,
    pub(crate) classes: Vec<ClassInfo>,
    pub(crate) body: Arc<dyn Any + Send + Sync>,
}

/// Default display name of a definition: `kick(Bulldog)`.
pub(crate) fn definition_name(method: &str, classes: &[ClassInfo]) -> String {
    format!("{}({})", method, class_list(classes))
}

pub(crate) fn class_list(classes: &[ClassInfo]) -> String {
    classes
        .iter()
        .map(ClassInfo::name)
        .collect::<Vec<_>>()
        .join(", ")
}
