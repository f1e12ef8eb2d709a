/*!
# Declaration Visitor

Walks one file top-down. Function and method declarations, and `var` bindings of
a single function literal, open a fresh [`Scope`] seeded with the parameters of
the propagated type; assignment and return statements are handed to the
statement analysis in `statements.rs`.
*/

use tree_sitter::Node;

use super::engine::{RewriteAction, RewriteEngine};
use super::patch::Patch;
use super::patterns::HelperMatcher;
use super::scope::{PropagationCandidate, Scope};
use crate::parser::{expression_list, field_children, is_blank, named_children, SourceFile, Span};
use crate::symbols::{index::var_specs, SymbolTable};
use crate::Result;

/// Result of walking one file
#[derive(Debug, Default)]
pub struct FileOutcome {
    pub patch: Patch,
    /// Rewrites that changed the source, in discovery order
    pub actions: Vec<RewriteAction>,
    /// Un-ignore renames withdrawn because nothing used them
    pub reverted_renames: usize,
}

impl FileOutcome {
    pub fn modified(&self) -> bool {
        self.patch.has_rewrites()
    }

    pub fn argument_rewrites(&self) -> usize {
        self.patch.argument_rewrites()
    }

    pub fn render(&self, source: &str) -> String {
        self.patch.render(source)
    }
}

pub struct PropagationVisitor<'v> {
    pub(super) file: &'v SourceFile,
    pub(super) table: &'v SymbolTable,
    pub(super) helpers: &'v HelperMatcher,
    pub(super) engine: RewriteEngine<'v>,
    pub(super) scope: Scope,
    pub(super) patch: Patch,
    pub(super) actions: Vec<RewriteAction>,
    reverted: usize,
}

impl<'v> PropagationVisitor<'v> {
    pub fn new(
        file: &'v SourceFile,
        table: &'v SymbolTable,
        helpers: &'v HelperMatcher,
        engine: RewriteEngine<'v>,
    ) -> Self {
        Self {
            file,
            table,
            helpers,
            engine,
            scope: Scope::new(),
            patch: Patch::new(),
            actions: Vec::new(),
            reverted: 0,
        }
    }

    pub fn run(mut self) -> Result<FileOutcome> {
        self.visit(self.file.root())?;
        self.close_scope();

        Ok(FileOutcome {
            patch: self.patch,
            actions: self.actions,
            reverted_renames: self.reverted,
        })
    }

    /// Candidates of the declaration being walked
    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    fn visit(&mut self, node: Node<'v>) -> Result<()> {
        if self.patch.is_replaced(Span::from(node)) {
            return Ok(());
        }

        match node.kind() {
            "function_declaration" | "method_declaration" => self.enter_function(node),
            "var_declaration" => self.enter_function_binding(node),
            "short_var_declaration" | "assignment_statement" => self.analyze_assignment(node)?,
            "return_statement" => self.analyze_return(node)?,
            _ => {}
        }

        for child in named_children(node) {
            self.visit(child)?;
        }
        Ok(())
    }

    fn enter_function(&mut self, decl: Node<'v>) {
        let Some(params) = decl.child_by_field_name("parameters") else {
            return;
        };
        let name = decl
            .child_by_field_name("name")
            .map(|n| self.file.text(n))
            .unwrap_or_default();
        self.open_scope(name, decl, params);
    }

    /// `var name = func(...) {...}`; any other var declaration is ignored
    fn enter_function_binding(&mut self, decl: Node<'v>) {
        let specs = var_specs(decl);
        let [spec] = specs.as_slice() else {
            return;
        };
        let values = expression_list(*spec, "value");
        let [literal] = values.as_slice() else {
            return;
        };
        if literal.kind() != "func_literal" {
            return;
        }
        let Some(name) = field_children(*spec, "name").into_iter().next() else {
            return;
        };
        let Some(params) = literal.child_by_field_name("parameters") else {
            return;
        };
        self.open_scope(self.file.text(name), *literal, params);
    }

    fn open_scope(&mut self, name: &str, function: Node<'v>, params: Node<'v>) {
        self.close_scope();
        self.engine
            .notifier()
            .on_declaration(name, &self.signature(function, params));

        for param in named_children(params) {
            if param.kind() != "parameter_declaration" {
                continue;
            }
            // Only the first name of `a, b context.Context` is tracked.
            let Some(first) = field_children(param, "name").into_iter().next() else {
                continue;
            };
            if is_blank(first, &self.file.source) {
                continue;
            }
            let propagated = self
                .table
                .symbol_at(first)
                .map(|symbol| self.engine.classifier().is_propagated(symbol))
                .unwrap_or(false);
            if propagated {
                self.scope.register(PropagationCandidate::parameter(
                    self.file.text(first),
                    Span::from(first),
                    name,
                ));
            }
        }
    }

    /// `func(ctx context.Context) error`, from the parameters up to the body
    fn signature(&self, function: Node<'v>, params: Node<'v>) -> String {
        let end = function
            .child_by_field_name("body")
            .map(|body| body.start_byte())
            .unwrap_or_else(|| function.end_byte());
        format!("func{}", self.file.source[params.start_byte()..end].trim_end())
    }

    pub(super) fn close_scope(&mut self) {
        self.reverted += self.scope.cleanup(&mut self.patch);
    }

    /// Statement text with the edits made so far
    pub(super) fn render(&self, node: Node<'_>) -> String {
        self.patch.render_range(&self.file.source, Span::from(node))
    }
}
