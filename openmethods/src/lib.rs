//! Open Multi-Methods
//!
//! Runtime selection of a function implementation from the dynamic classes
//! of several arguments at once, without the classes declaring the
//! operation as a member.
//!
//! # Features
//!
//! - Class hierarchies with multiple and repeated inheritance
//! - Methods dispatching on any number of polymorphic arguments
//! - Ahead-of-call table compilation with ambiguity detection
//! - Delegation to the next most specific definition
//! - Structured build reports and `tracing` diagnostics
//!
//! # Example
//!
//! ```rust,ignore
//! use std::any::TypeId;
//! use openmethods::{Class, ClassInfo, Registry};
//!
//! struct Animal;
//! struct Dog;
//! impl Class for Animal {}
//! impl Class for Dog {
//!     fn direct_bases() -> Vec<TypeId> {
//!         vec![TypeId::of::<Animal>()]
//!     }
//! }
//!
//! let mut registry = Registry::new();
//! registry.register_classes(&[ClassInfo::of::<Animal>(), ClassInfo::of::<Dog>()])?;
//!
//! let kick = registry.declare::<dyn Class, (), String, 1>("kick", [ClassInfo::of::<Animal>()])?;
//! registry.define(&kick, [ClassInfo::of::<Dog>()], |_, [_dog], ()| "bark".to_string())?;
//!
//! let dispatcher = registry.update_methods()?;
//! assert_eq!(kick.call(&dispatcher, [&Dog], ())?, "bark");
//! ```
//!
//! Registration is a distinct phase: `update_methods` takes a snapshot of
//! the registry and later registrations only show up after a rebuild.

mod bitset;
pub mod class;
pub mod config;
mod dispatch;
pub mod dispatcher;
pub mod error;
pub mod hierarchy;
pub mod method;
pub mod registry;
pub mod report;

pub use class::{Class, ClassInfo};
pub use config::{AmbiguityPolicy, ConfigError, HierarchyCheck, RebuildOptions, UnknownClassPolicy};
pub use dispatcher::{Dispatcher, Next, NextTarget};
pub use error::{BuildError, DispatchError, RegistrationError, RegistrationResult};
pub use hierarchy::{ClassId, ClassRecord, ClassRegistry, MissingEdge};
pub use method::{DefinitionHandle, Method, MethodId, MethodKey, MethodRecord, ParamKind};
pub use registry::Registry;
pub use report::{AmbiguityReport, BuildReport, MethodStats};
