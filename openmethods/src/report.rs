//! Build diagnostics.

use std::fmt;

use crate::hierarchy::MissingEdge;

/// Summary of one `update_methods` run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildReport {
    /// Per-method table statistics, in declaration order.
    pub methods: Vec<MethodStats>,
    /// Combinations left ambiguous (only with a deferring policy).
    pub ambiguities: Vec<AmbiguityReport>,
    /// Declared bases never registered together with their derived class.
    pub missing_edges: Vec<MissingEdge>,
}

impl BuildReport {
    pub fn is_clean(&self) -> bool {
        self.ambiguities.is_empty() && self.missing_edges.is_empty()
    }

    pub fn method(&self, name: &str) -> Option<&MethodStats> {
        self.methods.iter().find(|m| m.name == name)
    }
}

impl fmt::Display for BuildReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} method(s) compiled", self.methods.len())?;
        for method in &self.methods {
            writeln!(f, "  {method}")?;
        }
        if !self.ambiguities.is_empty() {
            writeln!(f, "{} ambiguous combination(s):", self.ambiguities.len())?;
            for ambiguity in &self.ambiguities {
                writeln!(f, "  {ambiguity}")?;
            }
        }
        if !self.missing_edges.is_empty() {
            writeln!(f, "{} missing hierarchy edge(s):", self.missing_edges.len())?;
            for edge in &self.missing_edges {
                writeln!(f, "  {edge}")?;
            }
        }
        Ok(())
    }
}

/// Table statistics for one method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodStats {
    pub name: &'static str,
    /// The declared signature, e.g. `kick(virtual Animal) -> String`.
    pub signature: String,
    pub definitions: usize,
    /// Number of class groups at each virtual position.
    pub groups: Vec<usize>,
    pub cells: usize,
    pub resolved: usize,
    pub no_match: usize,
    pub ambiguous: usize,
}

impl fmt::Display for MethodStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} definition(s), groups {:?}, {} cell(s) ({} resolved, {} without definition, {} ambiguous)",
            self.signature,
            self.definitions,
            self.groups,
            self.cells,
            self.resolved,
            self.no_match,
            self.ambiguous
        )
    }
}

/// A combination of classes for which several definitions are maximal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AmbiguityReport {
    pub method: &'static str,
    /// The classes at each virtual position that share this cell.
    pub classes: Vec<Vec<&'static str>>,
    /// Display names of the maximal definitions.
    pub candidates: Vec<String>,
}

impl fmt::Display for AmbiguityReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let classes: Vec<_> = self.classes.iter().map(|group| group.join("|")).collect();
        write!(
            f,
            "{}({}) matches {}",
            self.method,
            classes.join(", "),
            self.candidates.join(" and ")
        )
    }
}
