//! Error types for registration, table compilation and dispatch.

use thiserror::Error;

use crate::hierarchy::MissingEdge;
use crate::report::AmbiguityReport;

/// Errors raised while registering classes, methods or definitions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistrationError {
    #[error("inheritance cycle: `{class}` cannot derive from `{base}`")]
    InheritanceCycle {
        class: &'static str,
        base: &'static str,
    },

    #[error("class `{class}` is already registered with a different name or base list")]
    ConflictingClass { class: &'static str },

    #[error("method `{name}` is already declared with this signature")]
    DuplicateMethod { name: &'static str },

    #[error("method `{method}` already has a definition for ({classes})")]
    DuplicateDefinition {
        method: &'static str,
        classes: String,
    },

    #[error("method `{name}` is not declared in this registry")]
    UnknownMethod { name: &'static str },
}

/// Errors raised by `update_methods`.
///
/// A failed build produces no dispatcher.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    #[error("class `{class}` used by method `{method}` is not registered")]
    UnregisteredClass {
        method: &'static str,
        class: &'static str,
    },

    #[error(
        "definition `{definition}` of method `{method}` takes `{class}` at position {position}, \
         which does not derive from the declared `{declared}`"
    )]
    DefinitionOutsideHierarchy {
        method: &'static str,
        definition: String,
        position: usize,
        class: &'static str,
        declared: &'static str,
    },

    #[error(
        "method `{method}` has {} ambiguous combination(s); first: {}",
        .ambiguities.len(),
        first_ambiguity(.ambiguities)
    )]
    Ambiguous {
        method: &'static str,
        ambiguities: Vec<AmbiguityReport>,
    },

    #[error(
        "incomplete hierarchy: {}",
        join_edges(.edges)
    )]
    IncompleteHierarchy { edges: Vec<MissingEdge> },
}

/// Errors raised at a call site.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error("method #{index} is not part of this dispatcher")]
    UnknownMethod { index: usize },

    #[error("method `{method}`: runtime class `{class}` of argument {position} was never registered")]
    UnregisteredClass {
        method: &'static str,
        position: usize,
        class: String,
    },

    #[error(
        "method `{method}`: class `{class}` of argument {position} is registered but not \
         connected to the declared parameter class"
    )]
    ClassOutsideHierarchy {
        method: &'static str,
        position: usize,
        class: &'static str,
    },

    #[error("method `{method}` has no definition for ({classes})")]
    NoDefinition {
        method: &'static str,
        classes: String,
    },

    #[error(
        "method `{method}` is ambiguous for ({classes}): {}",
        .candidates.join(", ")
    )]
    Ambiguous {
        method: &'static str,
        classes: String,
        candidates: Vec<String>,
    },

    #[error("`{definition}` has no next definition in method `{method}`")]
    NoNextDefinition {
        method: &'static str,
        definition: String,
    },

    #[error(
        "next definition of `{definition}` in method `{method}` is ambiguous: {}",
        .candidates.join(", ")
    )]
    AmbiguousNext {
        method: &'static str,
        definition: String,
        candidates: Vec<String>,
    },

    #[error("method `{method}` was called with a signature it was not declared with")]
    SignatureMismatch { method: &'static str },
}

fn first_ambiguity(ambiguities: &[AmbiguityReport]) -> String {
    ambiguities
        .first()
        .map(ToString::to_string)
        .unwrap_or_default()
}

fn join_edges(edges: &[MissingEdge]) -> String {
    edges
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Result alias for registration calls.
pub type RegistrationResult<T> = Result<T, RegistrationError>;
