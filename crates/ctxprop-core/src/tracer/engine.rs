/*!
# Rewrite Decision Engine

Looks at the arguments of one call, decides which of them should be replaced by
a visible candidate and produces [`RewriteAction`]s. Actions are applied to the
file's [`Patch`] once the statement holding the call has been analysed.
*/

use tracing::debug;
use tree_sitter::Node;

use super::decision::{DecisionProvider, Replacement, ReplacementRequest, Selection};
use super::patch::{Edit, Patch};
use super::scope::Scope;
use crate::classify::TypeClassifier;
use crate::notifier::PropagationNotifier;
use crate::parser::{named_children, SourceFile, Span};
use crate::symbols::{Symbol, SymbolTable};
use crate::Result;

/// What an argument is, as far as propagation is concerned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgumentKind {
    /// A call into the propagated type's package, e.g. `context.Background()`
    FreshInstance,
    /// A plain reference to a variable of the propagated type
    Binding,
    Unrelated,
}

/// A call under inspection
#[derive(Debug, Clone)]
pub struct CallSite<'t> {
    pub call: Node<'t>,
    pub arguments: Vec<Node<'t>>,
}

impl<'t> CallSite<'t> {
    pub fn from_call(call: Node<'t>) -> Option<Self> {
        if call.kind() != "call_expression" {
            return None;
        }
        let arguments = call
            .child_by_field_name("arguments")
            .map(named_children)
            .unwrap_or_default()
            .into_iter()
            .filter(|arg| arg.kind() != "comment")
            .collect();
        Some(Self { call, arguments })
    }
}

/// Replacement of one call argument by a candidate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewriteAction {
    pub argument: Span,
    /// Zero-based argument position in the call
    pub position: usize,
    /// Index of the chosen candidate in the scope
    pub candidate: usize,
    /// Name the argument is rewritten to
    pub replacement: String,
    pub selection: Selection,
}

/// Decides argument rewrites for one file
pub struct RewriteEngine<'e> {
    classifier: &'e TypeClassifier,
    decider: &'e mut dyn DecisionProvider,
    notifier: &'e dyn PropagationNotifier,
}

impl<'e> RewriteEngine<'e> {
    pub fn new(
        classifier: &'e TypeClassifier,
        decider: &'e mut dyn DecisionProvider,
        notifier: &'e dyn PropagationNotifier,
    ) -> Self {
        Self {
            classifier,
            decider,
            notifier,
        }
    }

    pub fn classifier(&self) -> &TypeClassifier {
        self.classifier
    }

    pub fn decider(&mut self) -> &mut dyn DecisionProvider {
        &mut *self.decider
    }

    pub fn notifier(&self) -> &dyn PropagationNotifier {
        self.notifier
    }

    /// Classify an argument, with the identifier its name check uses
    pub fn classify_argument<'t>(
        &self,
        argument: Node<'t>,
        table: &SymbolTable,
    ) -> (ArgumentKind, Option<Node<'t>>) {
        match argument.kind() {
            "call_expression" => {
                let Some(operand) = argument
                    .child_by_field_name("function")
                    .filter(|f| f.kind() == "selector_expression")
                    .and_then(|f| f.child_by_field_name("operand"))
                    .filter(|o| o.kind() == "identifier")
                else {
                    return (ArgumentKind::Unrelated, None);
                };
                match table.symbol_at(operand) {
                    Some(symbol @ Symbol::Package { .. }) if self.classifier.is_propagated(symbol) => {
                        (ArgumentKind::FreshInstance, Some(operand))
                    }
                    _ => (ArgumentKind::Unrelated, None),
                }
            }
            "identifier" => match table.symbol_at(argument) {
                Some(symbol @ Symbol::Var { .. }) if self.classifier.is_propagated(symbol) => {
                    (ArgumentKind::Binding, Some(argument))
                }
                _ => (ArgumentKind::Unrelated, None),
            },
            _ => (ArgumentKind::Unrelated, None),
        }
    }

    /// Decide whether argument `position` of `site` should be rewritten
    ///
    /// `statement` is the rendered statement holding the call, used for the
    /// audit line and any prompt.
    pub fn consider_argument(
        &mut self,
        site: &CallSite<'_>,
        position: usize,
        statement: &str,
        scope: &Scope,
        file: &SourceFile,
        table: &SymbolTable,
    ) -> Result<Option<RewriteAction>> {
        if scope.is_empty() {
            return Ok(None);
        }
        let Some(argument) = site.arguments.get(position).copied() else {
            return Ok(None);
        };

        let (kind, ident) = self.classify_argument(argument, table);
        let Some(ident) = ident else {
            return Ok(None);
        };
        let ident_text = file.text(ident);

        if let [only] = scope.candidates() {
            if only.name == ident_text {
                return Ok(None);
            }
        }

        self.notifier.on_candidates(statement, scope.candidates());

        let argument_text = file.text(argument);
        let request = ReplacementRequest {
            statement,
            argument: argument_text,
            candidates: scope.candidates(),
        };
        let idx = match self.decider.choose_replacement(&request)? {
            Replacement::Keep => {
                debug!(argument = argument_text, "argument kept");
                return Ok(None);
            }
            Replacement::Candidate(idx) => idx,
        };
        let Some(candidate) = scope.get(idx) else {
            return Ok(None);
        };

        debug!(
            ?kind,
            argument = argument_text,
            replacement = %candidate.name,
            "argument rewrite chosen"
        );
        Ok(Some(RewriteAction {
            argument: Span::from(argument),
            position,
            candidate: idx,
            replacement: candidate.name.clone(),
            selection: self.decider.selection(),
        }))
    }

    /// Decide every argument of a call
    pub fn consider_call(
        &mut self,
        site: &CallSite<'_>,
        statement: &str,
        scope: &Scope,
        file: &SourceFile,
        table: &SymbolTable,
    ) -> Result<Vec<RewriteAction>> {
        let mut actions = Vec::new();
        for position in 0..site.arguments.len() {
            if let Some(action) =
                self.consider_argument(site, position, statement, scope, file, table)?
            {
                actions.push(action);
            }
        }
        Ok(actions)
    }
}

/// Apply an action: mark the candidate used and record the edit
///
/// An argument that already reads as the chosen name gets no edit. Returns
/// whether the source changes.
pub fn apply_action(
    action: &RewriteAction,
    source: &str,
    scope: &mut Scope,
    patch: &mut Patch,
) -> bool {
    scope.mark_used(action.candidate);
    if source[action.argument.start..action.argument.end] == action.replacement {
        return false;
    }
    patch.push(Edit::argument(action.argument, action.replacement.clone()));
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{default_signatures, PropagatedType};
    use crate::notifier::SilentNotifier;
    use crate::parser::GoParser;
    use crate::symbols::{resolve_file, PackageIndex};
    use crate::tracer::decision::AutomaticDecider;
    use crate::tracer::scope::PropagationCandidate;

    const SOURCE: &str = r#"package svc

import "context"

func f(ctx context.Context, name string) error {
	return g(context.Background(), ctx, name, len(name))
}
"#;

    struct Fixture {
        file: SourceFile,
        table: SymbolTable,
    }

    fn fixture() -> Fixture {
        let file = GoParser::new()
            .unwrap()
            .parse("svc.go", SOURCE.to_string())
            .unwrap();
        let mut index = PackageIndex::new("svc", &default_signatures());
        index.add_file(&file);
        let table = resolve_file(&file, &index);
        Fixture { file, table }
    }

    fn call_site(file: &SourceFile) -> CallSite<'_> {
        fn find(node: Node<'_>) -> Option<Node<'_>> {
            if node.kind() == "call_expression" {
                return Some(node);
            }
            named_children(node).into_iter().find_map(find)
        }
        CallSite::from_call(find(file.root()).unwrap()).unwrap()
    }

    #[test]
    fn test_classify_arguments() {
        let fx = fixture();
        let classifier = TypeClassifier::new(&PropagatedType::default());
        let mut decider = AutomaticDecider;
        let engine = RewriteEngine::new(&classifier, &mut decider, &SilentNotifier);
        let site = call_site(&fx.file);

        let kinds: Vec<ArgumentKind> = site
            .arguments
            .iter()
            .map(|arg| engine.classify_argument(*arg, &fx.table).0)
            .collect();
        assert_eq!(
            kinds,
            vec![
                ArgumentKind::FreshInstance,
                ArgumentKind::Binding,
                ArgumentKind::Unrelated,
                ArgumentKind::Unrelated,
            ]
        );
    }

    #[test]
    fn test_single_identical_candidate_is_skipped() {
        let fx = fixture();
        let classifier = TypeClassifier::new(&PropagatedType::default());
        let mut decider = AutomaticDecider;
        let mut engine = RewriteEngine::new(&classifier, &mut decider, &SilentNotifier);
        let site = call_site(&fx.file);

        let mut scope = Scope::new();
        scope.register(PropagationCandidate::parameter("ctx", Span::new(0, 0), "f"));

        let actions = engine
            .consider_call(&site, "stmt", &scope, &fx.file, &fx.table)
            .unwrap();
        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0].position, 0);
        assert_eq!(actions[0].replacement, "ctx");
        assert_eq!(actions[0].selection, Selection::Automatic);
    }

    #[test]
    fn test_apply_identical_name_records_no_edit() {
        let fx = fixture();
        let classifier = TypeClassifier::new(&PropagatedType::default());
        let mut decider = AutomaticDecider;
        let mut engine = RewriteEngine::new(&classifier, &mut decider, &SilentNotifier);
        let site = call_site(&fx.file);

        let mut scope = Scope::new();
        scope.register(PropagationCandidate::binding("other", Span::new(0, 0), "x"));
        scope.register(PropagationCandidate::binding("ctx", Span::new(0, 0), "y"));

        let actions = engine
            .consider_call(&site, "stmt", &scope, &fx.file, &fx.table)
            .unwrap();
        assert_eq!(actions.len(), 2);

        let mut patch = Patch::new();
        let changed: Vec<bool> = actions
            .iter()
            .map(|action| apply_action(action, &fx.file.source, &mut scope, &mut patch))
            .collect();
        assert_eq!(changed, vec![true, false]);
        assert_eq!(patch.argument_rewrites(), 1);
        assert!(scope.candidates()[1].used);
        assert!(!scope.candidates()[0].used);
    }

    #[test]
    fn test_empty_scope_never_rewrites() {
        let fx = fixture();
        let classifier = TypeClassifier::new(&PropagatedType::default());
        let mut decider = AutomaticDecider;
        let mut engine = RewriteEngine::new(&classifier, &mut decider, &SilentNotifier);
        let site = call_site(&fx.file);

        let actions = engine
            .consider_call(&site, "stmt", &Scope::new(), &fx.file, &fx.table)
            .unwrap();
        assert!(actions.is_empty());
    }
}
