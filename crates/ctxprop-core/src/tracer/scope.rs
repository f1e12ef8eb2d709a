//! Candidates visible inside one declaration body

use super::patch::{EditId, Patch};
use crate::parser::Span;

/// A value of the propagated type that call arguments may be rewritten to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropagationCandidate {
    /// Current name, after any rename
    pub name: String,
    /// Span of the declaring identifier
    pub span: Span,
    /// Where the candidate came from: a parameter list or a rendered statement
    pub provenance: String,
    /// Whether some argument was rewritten to this candidate
    pub used: bool,
    /// Name before any rename; `_` for an un-ignored discard
    pub original_name: String,
    /// The rename edit to withdraw if the candidate stays unused
    pub rename: Option<EditId>,
}

impl PropagationCandidate {
    /// A parameter of the declaration being walked
    pub fn parameter(name: impl Into<String>, span: Span, declaration: &str) -> Self {
        let name = name.into();
        Self {
            original_name: name.clone(),
            name,
            span,
            provenance: format!("Parameter for {}", declaration),
            used: true,
            rename: None,
        }
    }

    /// A left-hand side identifier that already has the propagated type
    pub fn binding(name: impl Into<String>, span: Span, provenance: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            original_name: name.clone(),
            name,
            span,
            provenance: provenance.into(),
            used: false,
            rename: None,
        }
    }

    /// A discard target renamed through `rename`
    pub fn unignored(
        name: impl Into<String>,
        span: Span,
        provenance: impl Into<String>,
        rename: EditId,
    ) -> Self {
        Self {
            name: name.into(),
            span,
            provenance: provenance.into(),
            used: false,
            original_name: "_".to_string(),
            rename: Some(rename),
        }
    }
}

/// Ordered candidates of the declaration currently being walked
///
/// Discovery order is kept; the most recent candidate is the default choice.
#[derive(Debug, Default)]
pub struct Scope {
    candidates: Vec<PropagationCandidate>,
}

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, candidate: PropagationCandidate) {
        self.candidates.push(candidate);
    }

    pub fn candidates(&self) -> &[PropagationCandidate] {
        &self.candidates
    }

    pub fn get(&self, idx: usize) -> Option<&PropagationCandidate> {
        self.candidates.get(idx)
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn last_index(&self) -> Option<usize> {
        self.candidates.len().checked_sub(1)
    }

    pub fn mark_used(&mut self, idx: usize) {
        if let Some(candidate) = self.candidates.get_mut(idx) {
            candidate.used = true;
        }
    }

    /// Discard the scope, withdrawing renames nothing used
    ///
    /// Returns how many renames were withdrawn. The scope is empty afterwards,
    /// so a second call does nothing.
    pub fn cleanup(&mut self, patch: &mut Patch) -> usize {
        let mut reverted = 0;
        for candidate in self.candidates.drain(..) {
            if candidate.used {
                continue;
            }
            if let Some(id) = candidate.rename {
                if patch.revert(id).is_some() {
                    reverted += 1;
                }
            }
        }
        reverted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracer::patch::Edit;

    #[test]
    fn test_parameter_is_used() {
        let candidate = PropagationCandidate::parameter("ctx", Span::new(7, 10), "handle");
        assert!(candidate.used);
        assert_eq!(candidate.provenance, "Parameter for handle");
        assert_eq!(candidate.original_name, "ctx");
    }

    #[test]
    fn test_cleanup_reverts_unused_renames() {
        let mut patch = Patch::new();
        let kept = patch.push(Edit::rename(Span::new(0, 1), "childCtx"));
        let dropped = patch.push(Edit::rename(Span::new(20, 21), "spanCtx"));

        let mut scope = Scope::new();
        scope.register(PropagationCandidate::parameter("ctx", Span::new(40, 43), "f"));
        scope.register(PropagationCandidate::unignored("childCtx", Span::new(0, 1), "a", kept));
        scope.register(PropagationCandidate::unignored("spanCtx", Span::new(20, 21), "b", dropped));
        scope.mark_used(1);
        assert_eq!(scope.last_index(), Some(2));

        assert_eq!(scope.cleanup(&mut patch), 1);
        assert!(scope.is_empty());
        assert!(patch.get(kept).is_some());
        assert!(patch.get(dropped).is_none());

        // idempotent
        assert_eq!(scope.cleanup(&mut patch), 0);
        assert!(patch.get(kept).is_some());
    }
}
