//! Specificity ordering and selection of the most specific definition.

use crate::hierarchy::{ClassId, Closure};

#[cfg(test)]
use super::result::Resolution;
use super::types::Candidate;

/// Dispatch resolution context.
pub(crate) struct DispatchResolver<'a> {
    /// Reflexive ancestor sets of the registered classes.
    closure: &'a Closure,
}

impl<'a> DispatchResolver<'a> {
    pub(crate) fn new(closure: &'a Closure) -> Self {
        Self { closure }
    }

    /// Resolve dispatch for one combination of runtime classes.
    ///
    /// Given the classes of the virtual arguments, finds the unique most
    /// specific applicable candidate or reports why there is none. Compiled
    /// tables are checked against this.
    #[cfg(test)]
    pub(crate) fn resolve(&self, classes: &[ClassId], candidates: &[Candidate]) -> Resolution {
        // Step 1: Filter to applicable candidates
        let applicable: Vec<_> = candidates
            .iter()
            .filter(|c| self.is_applicable(c, classes))
            .collect();

        // Step 2: Keep the maximal ones and classify
        let maximal = self.find_maximal(&applicable);
        Resolution::from_maximal(maximal.iter().map(|c| c.index).collect())
    }

    /// Check if a candidate is applicable to the given classes.
    ///
    /// A candidate is applicable if:
    /// - It has the same arity as the combination
    /// - Each class is the candidate's class at that position, or derives from it
    pub(crate) fn is_applicable(&self, candidate: &Candidate, classes: &[ClassId]) -> bool {
        if candidate.arity() != classes.len() {
            return false;
        }

        classes
            .iter()
            .zip(&candidate.classes)
            .all(|(class, param)| self.closure.is_subclass(*class, *param))
    }

    /// Find the maximally specific candidates from the applicable set.
    ///
    /// A candidate is maximal if no other candidate is strictly more specific.
    pub(crate) fn find_maximal<'c>(&self, applicable: &[&'c Candidate]) -> Vec<&'c Candidate> {
        let mut maximal = Vec::new();

        for &m in applicable {
            let is_maximal = !applicable
                .iter()
                .any(|other| other.index != m.index && self.is_more_specific(other, m));

            if is_maximal {
                maximal.push(m);
            }
        }

        maximal
    }

    /// Check if candidate c1 is more specific than candidate c2.
    ///
    /// c1 is more specific than c2 if:
    /// - Every class of c1 is c2's class at that position or derives from it
    /// - At least one class of c1 strictly derives from c2's
    pub(crate) fn is_more_specific(&self, c1: &Candidate, c2: &Candidate) -> bool {
        if c1.arity() != c2.arity() {
            return false;
        }

        let mut some_strictly = false;

        for (p1, p2) in c1.classes.iter().zip(&c2.classes) {
            if !self.closure.is_subclass(*p1, *p2) {
                return false;
            }

            if !self.closure.is_subclass(*p2, *p1) {
                some_strictly = true;
            }
        }

        some_strictly
    }
}
