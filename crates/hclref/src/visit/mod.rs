//! visitor pattern helpers
mod visit_traversals;
pub use visit_traversals::{SpecBody, VisitTraversals};

use crate::{lower::TraversalSource, spec::DecodeSpec};
use hcl::Traversal;

/// Visitor that visits its subjects
pub trait Visit<T> {
    fn visit(&mut self, value: &T);
}

// blanket impl for FnMut
impl<T, F> Visit<T> for F
where
    F: FnMut(&T),
{
    fn visit(&mut self, value: &T) {
        self(value)
    }
}

impl TraversalSource for hcl::Body {
    fn traversals(&self, spec: &DecodeSpec) -> Vec<Traversal> {
        let mut found = vec![];
        let mut collect = |traversal: &Traversal| found.push(traversal.clone());
        SpecBody::new(self, spec).visit_traversals(&mut collect);
        found
    }
}
