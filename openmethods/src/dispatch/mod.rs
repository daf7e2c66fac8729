//! Multiple dispatch resolution and table compilation.
//!
//! This module turns the registered definitions of each method into a
//! dense table indexed by the runtime classes of the virtual arguments.
//!
//! # Algorithm Overview
//!
//! 1. **Collect candidates**: Map every definition to the class ids it was written against
//! 2. **Filter applicable**: A definition applies when each argument class derives from its class
//! 3. **Order by specificity**: A definition dominates another if it is at least as specific everywhere and strictly more specific somewhere
//! 4. **Select best**: Keep the unique maximal definition, or record the combination as ambiguous
//!
//! Steps 2-4 run once per group of equivalent classes at build time, so a
//! call only pays for one hash lookup per argument plus an array index.
//!
//! # Module Structure
//!
//! - [`types`] - Core type definitions (Candidate)
//! - [`result`] - Resolution outcomes
//! - [`resolver`] - Specificity ordering and maximal-candidate selection
//! - [`table`] - Compiled table layout and lookup
//! - [`compiler`] - Per-method table construction and `next` binding

mod compiler;
mod resolver;
mod result;
pub(crate) mod table;
mod types;


pub(crate) use compiler::compile;
