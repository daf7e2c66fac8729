//! Dispatch resolution results.

/// Outcome of resolving one combination of classes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Resolution {
    /// A unique most specific definition was found.
    Resolved(usize),
    /// No definition applies.
    NoMatch,
    /// Several maximal definitions apply; none dominates the others.
    Ambiguous(Vec<usize>),
}

impl Resolution {
    /// Classify a set of maximal candidate indices.
    pub(crate) fn from_maximal(maximal: Vec<usize>) -> Self {
        match maximal.as_slice() {
            [] => Resolution::NoMatch,
            [single] => Resolution::Resolved(*single),
            _ => Resolution::Ambiguous(maximal),
        }
    }
}
