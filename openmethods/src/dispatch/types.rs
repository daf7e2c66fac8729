//! Core type definitions for dispatch resolution.

use crate::hierarchy::ClassId;

/// A definition as seen by the resolver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Candidate {
    /// Position of the definition in its method.
    pub(crate) index: usize,
    /// The class the definition was written against, per virtual position.
    pub(crate) classes: Vec<ClassId>,
}

impl Candidate {
    pub(crate) fn new(index: usize, classes: Vec<ClassId>) -> Self {
        Self { index, classes }
    }

    pub(crate) fn arity(&self) -> usize {
        self.classes.len()
    }
}
