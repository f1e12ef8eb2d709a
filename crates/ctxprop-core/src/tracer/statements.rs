//! Assignment and return statement analysis

use tracing::info;
use tree_sitter::Node;

use super::decision::UnignoreRequest;
use super::engine::{apply_action, CallSite};
use super::patch::{Edit, EditId};
use super::scope::PropagationCandidate;
use super::visitor::PropagationVisitor;
use crate::parser::{expression_list, is_blank, named_children, Span};
use crate::Result;

impl<'v> PropagationVisitor<'v> {
    /// `=`, `:=` and compound assignments
    pub(super) fn analyze_assignment(&mut self, statement: Node<'v>) -> Result<()> {
        let right = expression_list(statement, "right");
        let positions = self.analyze_call(statement, &right)?;
        let left = expression_list(statement, "left");
        self.analyze_targets(statement, &left, &positions)
    }

    /// Results are checked like a right-hand side; nothing is bound
    pub(super) fn analyze_return(&mut self, statement: Node<'v>) -> Result<()> {
        let results = match named_children(statement).into_iter().next() {
            Some(list) if list.kind() == "expression_list" => named_children(list),
            Some(expr) => vec![expr],
            None => return Ok(()),
        };
        self.analyze_call(statement, &results).map(|_| ())
    }

    /// Rewrite the arguments of the first expression when it is a call
    ///
    /// Returns the result positions of that call holding the propagated type.
    fn analyze_call(&mut self, statement: Node<'v>, exprs: &[Node<'v>]) -> Result<Vec<usize>> {
        let Some(site) = exprs.first().copied().and_then(CallSite::from_call) else {
            return Ok(Vec::new());
        };

        if !self.scope.is_empty() {
            let rendered = self.render(statement);
            let actions = self.engine.consider_call(
                &site,
                &rendered,
                &self.scope,
                self.file,
                self.table,
            )?;
            for action in actions {
                if apply_action(&action, &self.file.source, &mut self.scope, &mut self.patch) {
                    self.actions.push(action);
                }
            }
        }

        Ok(self.propagated_results(site.call))
    }

    fn propagated_results(&self, call: Node<'v>) -> Vec<usize> {
        let Some(results) = self.table.call_results(call) else {
            let function = call
                .child_by_field_name("function")
                .map(|f| self.file.text(f))
                .unwrap_or_default();
            info!(
                file = %self.file.path.display(),
                line = call.start_position().row + 1,
                function,
                "call target unresolved, result check skipped"
            );
            return Vec::new();
        };

        let classifier = self.engine.classifier();
        results
            .iter()
            .enumerate()
            .filter(|(_, ty)| {
                ty.as_deref()
                    .map(|ty| classifier.is_propagated_type(ty))
                    .unwrap_or(false)
            })
            .map(|(idx, _)| idx)
            .collect()
    }

    /// Register left-hand identifiers of the propagated type as candidates
    ///
    /// A discard target at a propagated result position of a `:=` may be
    /// named first, by a helper pattern or by the decision provider.
    fn analyze_targets(
        &mut self,
        statement: Node<'v>,
        targets: &[Node<'v>],
        positions: &[usize],
    ) -> Result<()> {
        let declares = statement.kind() == "short_var_declaration";
        let mut found: Vec<(Span, String, Option<EditId>)> = Vec::new();

        for (idx, target) in targets.iter().enumerate() {
            if is_blank(*target, &self.file.source) {
                // a plain `=` has nothing to declare the new name
                if !declares || !positions.contains(&idx) {
                    continue;
                }
                if let Some(name) = self.unignore_name(statement, idx)? {
                    let span = Span::from(*target);
                    let id = self.patch.push(Edit::rename(span, name.clone()));
                    found.push((span, name, Some(id)));
                }
                continue;
            }
            if target.kind() != "identifier" {
                continue;
            }

            let propagated = self
                .table
                .symbol_at(*target)
                .map(|symbol| self.engine.classifier().is_propagated(symbol))
                .unwrap_or(false);
            if propagated {
                found.push((Span::from(*target), self.file.text(*target).to_string(), None));
            }
        }

        if found.is_empty() {
            return Ok(());
        }
        let provenance = self.render(statement);
        for (span, name, rename) in found {
            let candidate = match rename {
                Some(id) => PropagationCandidate::unignored(name, span, provenance.clone(), id),
                None => PropagationCandidate::binding(name, span, provenance.clone()),
            };
            self.scope.register(candidate);
        }
        Ok(())
    }

    fn unignore_name(&mut self, statement: Node<'v>, position: usize) -> Result<Option<String>> {
        let rendered = self.render(statement);
        if let Some(name) = self.helpers.name_for(&rendered) {
            return Ok(Some(name.to_string()));
        }
        self.engine.decider().name_discarded(&UnignoreRequest {
            statement: &rendered,
            position,
        })
    }
}
