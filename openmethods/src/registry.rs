//! The registration front end.
//!
//! A [`Registry`] accumulates classes, methods and definitions. Nothing is
//! validated against the hierarchy until [`Registry::update_methods`], so
//! the three kinds of facts may be registered in any order.

use std::any::{type_name, TypeId};
use std::sync::Arc;

use rustc_hash::FxHashMap;
use tracing::debug;

use crate::class::{Class, ClassInfo};
use crate::config::RebuildOptions;
use crate::dispatch;
use crate::dispatcher::{Dispatcher, Next};
use crate::error::{BuildError, RegistrationError, RegistrationResult};
use crate::hierarchy::ClassRegistry;
use crate::method::{
    class_list, definition_name, signature_of, Body, DefinitionHandle, DefinitionRecord, Method,
    MethodId, MethodKey, MethodRecord, ParamKind,
};

/// Classes, methods and definitions awaiting compilation.
#[derive(Default)]
pub struct Registry {
    classes: ClassRegistry,
    methods: Vec<MethodRecord>,
    keys: FxHashMap<MethodKey, MethodId>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a group of classes. See [`ClassRegistry::register_classes`]
    /// for how inheritance edges are inferred.
    pub fn register_classes(&mut self, group: &[ClassInfo]) -> RegistrationResult<()> {
        self.classes.register_classes(group)
    }

    pub fn classes(&self) -> &ClassRegistry {
        &self.classes
    }

    /// Declare a method taking `N` polymorphic arguments declared as
    /// `virtuals`, ordinary arguments `A`, and returning `R`.
    pub fn declare<V, A, R, const N: usize>(
        &mut self,
        name: &'static str,
        virtuals: [ClassInfo; N],
    ) -> RegistrationResult<Method<V, A, R, N>>
    where
        V: ?Sized + Class,
        A: 'static,
        R: 'static,
    {
        let key = MethodKey {
            name,
            signature: signature_of::<V, A, R, N>(),
        };
        if self.keys.contains_key(&key) {
            return Err(RegistrationError::DuplicateMethod { name });
        }

        let mut params: Vec<ParamKind> = virtuals.iter().cloned().map(ParamKind::Virtual).collect();
        if TypeId::of::<A>() != TypeId::of::<()>() {
            params.push(ParamKind::Ordinary(type_name::<A>()));
        }

        let id = MethodId(self.methods.len() as u32);
        let record = MethodRecord {
            key,
            params,
            virtuals: virtuals.into(),
            return_type: type_name::<R>(),
            definitions: Vec::new(),
        };
        debug!("declared method {record}");
        self.methods.push(record);
        self.keys.insert(key, id);

        Ok(Method::new(id, name))
    }

    /// Add a definition of `method` for the given classes.
    ///
    /// The definition is named after the method and its classes, e.g.
    /// `kick(Bulldog)`.
    pub fn define<V, A, R, F, const N: usize>(
        &mut self,
        method: &Method<V, A, R, N>,
        classes: [ClassInfo; N],
        body: F,
    ) -> RegistrationResult<DefinitionHandle>
    where
        V: ?Sized + Class,
        A: 'static,
        R: 'static,
        F: for<'n, 'd, 'v> Fn(&'n Next<'d, V, A, R, N>, [&'v V; N], A) -> R + Send + Sync + 'static,
    {
        let name = definition_name(method.name, &classes);
        self.add_definition(method, name, classes, Body(Box::new(body)))
    }

    /// Add a definition with an explicit display name.
    pub fn define_named<V, A, R, F, const N: usize>(
        &mut self,
        method: &Method<V, A, R, N>,
        name: impl Into<String>,
        classes: [ClassInfo; N],
        body: F,
    ) -> RegistrationResult<DefinitionHandle>
    where
        V: ?Sized + Class,
        A: 'static,
        R: 'static,
        F: for<'n, 'd, 'v> Fn(&'n Next<'d, V, A, R, N>, [&'v V; N], A) -> R + Send + Sync + 'static,
    {
        self.add_definition(method, name.into(), classes, Body(Box::new(body)))
    }

    fn add_definition<V, A, R, const N: usize>(
        &mut self,
        method: &Method<V, A, R, N>,
        name: String,
        classes: [ClassInfo; N],
        body: Body<V, A, R, N>,
    ) -> RegistrationResult<DefinitionHandle>
    where
        V: ?Sized + Class,
        A: 'static,
        R: 'static,
    {
        let record = self
            .methods
            .get_mut(method.id.index())
            .filter(|record| {
                record.key.name == method.name
                    && record.key.signature == signature_of::<V, A, R, N>()
            })
            .ok_or(RegistrationError::UnknownMethod { name: method.name })?;

        let duplicate = record.definitions.iter().any(|existing| {
            existing
                .classes
                .iter()
                .zip(&classes)
                .all(|(a, b)| a.type_id() == b.type_id())
        });
        if duplicate {
            return Err(RegistrationError::DuplicateDefinition {
                method: method.name,
                classes: class_list(&classes),
            });
        }

        let handle = DefinitionHandle::new(method.id, record.definitions.len() as u32);
        debug!("defined {name}");
        record.definitions.push(DefinitionRecord {
            name,
            classes: classes.into(),
            body: Arc::new(body),
        });
        Ok(handle)
    }

    pub fn method(&self, id: MethodId) -> Option<&MethodRecord> {
        self.methods.get(id.index())
    }

    /// All declared methods, in declaration order.
    pub fn methods(&self) -> impl Iterator<Item = &MethodRecord> {
        self.methods.iter()
    }

    /// Compile the dispatch tables with default options, overlaid from the
    /// environment.
    pub fn update_methods(&self) -> Result<Dispatcher, BuildError> {
        self.update_methods_with(&RebuildOptions::from_env())
    }

    /// Compile the dispatch tables.
    ///
    /// Every call recomputes everything from the registered facts; the
    /// result is a fresh snapshot independent of earlier ones.
    pub fn update_methods_with(&self, options: &RebuildOptions) -> Result<Dispatcher, BuildError> {
        debug!(
            "updating {} method(s) over {} class(es)",
            self.methods.len(),
            self.classes.len()
        );
        dispatch::compile(&self.classes, &self.methods, options)
    }
}
