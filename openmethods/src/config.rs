//! Rebuild options.
//!
//! Options can be built in code, read from a TOML file, or overlaid from
//! the environment:
//!
//! ```toml
//! ambiguity = "fail"
//! unknown-class = "error"
//! hierarchy-check = "deny"
//! trace = true
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Environment variable enabling table tracing when set to a non-empty
/// value other than `0`.
pub const TRACE_ENV: &str = "OPENMETHODS_TRACE";

/// Errors loading rebuild options.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid options: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Options for `update_methods`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct RebuildOptions {
    /// What to do with combinations matched by several maximal definitions.
    pub ambiguity: AmbiguityPolicy,

    /// What a call site does with a runtime class missing from the table.
    ///
    /// The lookup is checked whichever policy is chosen; the policy only
    /// decides between panicking and returning the error.
    pub unknown_class: UnknownClassPolicy,

    /// How to treat declared bases never registered with their derived class.
    pub hierarchy_check: HierarchyCheck,

    /// Log every compiled table at `info` level.
    pub trace: bool,
}

impl Default for RebuildOptions {
    fn default() -> Self {
        Self {
            ambiguity: AmbiguityPolicy::Defer,
            unknown_class: UnknownClassPolicy::default(),
            hierarchy_check: HierarchyCheck::Warn,
            trace: false,
        }
    }
}

impl RebuildOptions {
    /// Default options, with tracing taken from [`TRACE_ENV`].
    pub fn from_env() -> Self {
        Self::default().with_env()
    }

    /// Overlay settings from the environment.
    pub fn with_env(mut self) -> Self {
        if let Ok(value) = std::env::var(TRACE_ENV) {
            self.trace = !value.is_empty() && value != "0";
        }
        self
    }

    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(source)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }

    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string(self)
    }

    pub fn with_ambiguity(mut self, policy: AmbiguityPolicy) -> Self {
        self.ambiguity = policy;
        self
    }

    pub fn with_unknown_class(mut self, policy: UnknownClassPolicy) -> Self {
        self.unknown_class = policy;
        self
    }

    pub fn with_hierarchy_check(mut self, check: HierarchyCheck) -> Self {
        self.hierarchy_check = check;
        self
    }

    pub fn with_trace(mut self, trace: bool) -> Self {
        self.trace = trace;
        self
    }
}

/// Ambiguity policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AmbiguityPolicy {
    /// Fail the build on the first method with an ambiguous combination.
    Fail,
    /// Build anyway; calls hitting an ambiguous combination fail.
    Defer,
}

/// Unknown runtime class policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UnknownClassPolicy {
    /// Log the diagnostic and panic at the call site.
    Abort,
    /// Return the error to the caller.
    Error,
}

impl Default for UnknownClassPolicy {
    /// `Abort` when `openmethods` itself is built with debug assertions,
    /// `Error` otherwise.
    ///
    /// The default follows the profile this crate was compiled with, which
    /// need not match the calling crate's. Set the policy explicitly (through
    /// [`RebuildOptions::with_unknown_class`] or the `unknown-class` key) to
    /// pin it.
    fn default() -> Self {
        if cfg!(debug_assertions) {
            UnknownClassPolicy::Abort
        } else {
            UnknownClassPolicy::Error
        }
    }
}

/// Hierarchy consistency check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HierarchyCheck {
    /// Skip the check.
    Ignore,
    /// Log and report missing edges.
    Warn,
    /// Fail the build on missing edges.
    Deny,
}
