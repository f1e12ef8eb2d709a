//! Scoped resolution of identifiers and call results for one file

use std::collections::HashMap;

use tree_sitter::Node;

use super::index::{literal_type, var_specs, Imports, PackageIndex, TypeResolver};
use super::{Results, Symbol, SymbolTable};
use crate::parser::{expression_list, field_children, is_blank, named_children, SourceFile, Span};

/// Resolve every identifier and call of `file` against its package index
pub fn resolve_file(file: &SourceFile, index: &PackageIndex) -> SymbolTable {
    let imports = Imports::collect(file);
    let mut resolver = Resolver {
        file,
        index,
        imports: &imports,
        scopes: Vec::new(),
        table: SymbolTable::new(),
    };
    resolver.visit(file.root());
    resolver.table
}

/// Lexical scope stack over one file
///
/// Package-level names come from the index and imports, so the stack is
/// empty outside function bodies.
struct Resolver<'a> {
    file: &'a SourceFile,
    index: &'a PackageIndex,
    imports: &'a Imports,
    scopes: Vec<HashMap<String, Symbol>>,
    table: SymbolTable,
}

impl<'a> Resolver<'a> {
    fn types(&self) -> TypeResolver<'_> {
        TypeResolver::new(self.index.name(), self.imports, &self.file.source)
    }

    fn text(&self, node: Node<'_>) -> &'a str {
        &self.file.source[node.byte_range()]
    }

    fn lookup(&self, name: &str) -> Option<Symbol> {
        for scope in self.scopes.iter().rev() {
            if let Some(symbol) = scope.get(name) {
                return Some(symbol.clone());
            }
        }
        if let Some(results) = self.index.function(name) {
            return Some(Symbol::Func {
                results: results.clone(),
            });
        }
        if let Some(ty) = self.index.variable(name) {
            return Some(Symbol::Var { ty: ty.clone() });
        }
        self.imports.path(name).map(|path| Symbol::Package {
            path: path.to_string(),
        })
    }

    fn declare(&mut self, ident: Node<'a>, ty: Option<String>) {
        if ident.kind() != "identifier" || is_blank(ident, &self.file.source) {
            return;
        }
        let symbol = Symbol::Var { ty };
        self.table.record_symbol(Span::from(ident), symbol.clone());
        let name = self.text(ident).to_string();
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name, symbol);
        }
    }

    fn scoped(&mut self, node: Node<'a>) {
        self.scopes.push(HashMap::new());
        self.visit_children(node);
        self.scopes.pop();
    }

    fn visit_children(&mut self, node: Node<'a>) {
        for child in named_children(node) {
            self.visit(child);
        }
    }

    fn visit(&mut self, node: Node<'a>) {
        match node.kind() {
            "package_clause" | "import_declaration" | "comment" | "field_identifier"
            | "type_identifier" | "label_name" => {}

            "function_declaration" | "method_declaration" | "func_literal" => {
                self.visit_function(node)
            }

            // Every case clause is an implicit block in Go.
            "block" | "if_statement" | "for_statement" | "expression_switch_statement"
            | "type_switch_statement" | "select_statement" | "expression_case"
            | "type_case" | "default_case" | "communication_case" => self.scoped(node),

            "short_var_declaration" => self.visit_short_var(node),
            "var_declaration" => self.visit_specs(var_specs(node)),
            "const_declaration" => {
                let specs = named_children(node)
                    .into_iter()
                    .filter(|spec| spec.kind() == "const_spec")
                    .collect();
                self.visit_specs(specs)
            }
            "range_clause" | "receive_statement" => self.visit_binding_clause(node),

            "identifier" => {
                if is_blank(node, &self.file.source) {
                    return;
                }
                if let Some(symbol) = self.lookup(self.text(node)) {
                    self.table.record_symbol(Span::from(node), symbol);
                }
            }
            "package_identifier" => {
                if let Some(path) = self.imports.path(self.text(node)) {
                    self.table.record_symbol(
                        Span::from(node),
                        Symbol::Package {
                            path: path.to_string(),
                        },
                    );
                }
            }
            "selector_expression" => {
                if let Some(operand) = node.child_by_field_name("operand") {
                    self.visit(operand);
                }
            }
            "keyed_element" => {
                let children = named_children(node);
                let skip_key = children
                    .first()
                    .map(|key| is_field_key(*key))
                    .unwrap_or(false);
                for child in children.into_iter().skip(usize::from(skip_key)) {
                    self.visit(child);
                }
            }
            "call_expression" => {
                self.visit_children(node);
                if let Some(results) = self.call_results(node) {
                    self.table.record_call(Span::from(node), results);
                }
            }
            _ => self.visit_children(node),
        }
    }

    fn visit_function(&mut self, node: Node<'a>) {
        self.scopes.push(HashMap::new());

        for field in ["receiver", "parameters"] {
            if let Some(list) = node.child_by_field_name(field) {
                self.declare_parameters(list);
            }
        }
        if let Some(result) = node.child_by_field_name("result") {
            if result.kind() == "parameter_list" {
                self.declare_parameters(result);
            } else {
                self.visit(result);
            }
        }
        if let Some(body) = node.child_by_field_name("body") {
            self.visit(body);
        }

        self.scopes.pop();
    }

    fn declare_parameters(&mut self, list: Node<'a>) {
        for param in named_children(list) {
            let ty_node = param.child_by_field_name("type");
            let mut ty = ty_node.and_then(|t| self.types().resolve(t));
            if param.kind() == "variadic_parameter_declaration" {
                ty = ty.map(|t| format!("[]{}", t));
            }
            if let Some(t) = ty_node {
                self.visit(t);
            }
            for name in field_children(param, "name") {
                self.declare(name, ty.clone());
            }
        }
    }

    fn visit_short_var(&mut self, node: Node<'a>) {
        let right = expression_list(node, "right");
        for expr in &right {
            self.visit(*expr);
        }
        let left = expression_list(node, "left");
        let types = self.infer_all(&right, left.len());
        for (ident, ty) in left.into_iter().zip(types) {
            self.declare(ident, ty);
        }
    }

    fn visit_specs(&mut self, specs: Vec<Node<'a>>) {
        for spec in specs {
            let values = expression_list(spec, "value");
            for value in &values {
                self.visit(*value);
            }
            let declared = spec.child_by_field_name("type");
            if let Some(ty) = declared {
                self.visit(ty);
            }

            let names = field_children(spec, "name");
            let types = match declared.and_then(|t| self.types().resolve(t)) {
                Some(ty) => vec![Some(ty); names.len()],
                None => self.infer_all(&values, names.len()),
            };
            for (name, ty) in names.into_iter().zip(types) {
                self.declare(name, ty);
            }
        }
    }

    /// `range` clauses and `select` receives: `:=` declares, `=` assigns
    fn visit_binding_clause(&mut self, node: Node<'a>) {
        if let Some(right) = node.child_by_field_name("right") {
            self.visit(right);
        }
        let mut cursor = node.walk();
        let declares = node.children(&mut cursor).any(|child| child.kind() == ":=");
        for target in expression_list(node, "left") {
            if declares {
                self.declare(target, None);
            } else {
                self.visit(target);
            }
        }
    }

    /// Types bound to `arity` targets by a right-hand side
    fn infer_all(&self, right: &[Node<'a>], arity: usize) -> Vec<Option<String>> {
        if right.len() == 1 && arity > 1 {
            let mut results = self.infer(right[0]);
            results.resize(arity, None);
            return results;
        }
        (0..arity)
            .map(|idx| {
                right
                    .get(idx)
                    .and_then(|expr| self.infer(*expr).into_iter().next().flatten())
            })
            .collect()
    }

    fn infer(&self, expr: Node<'a>) -> Vec<Option<String>> {
        match expr.kind() {
            "call_expression" => self
                .table
                .call_results(expr)
                .map(<[Option<String>]>::to_vec)
                .unwrap_or_else(|| vec![None]),
            "identifier" => vec![self
                .lookup(self.text(expr))
                .and_then(|symbol| symbol.var_type().map(str::to_string))],
            "parenthesized_expression" => match named_children(expr).into_iter().next() {
                Some(inner) => self.infer(inner),
                None => vec![None],
            },
            "type_assertion_expression" => vec![expr
                .child_by_field_name("type")
                .and_then(|ty| self.types().resolve(ty))],
            "func_literal" => vec![Some("func".to_string())],
            "interpreted_string_literal" | "raw_string_literal" => {
                vec![Some("string".to_string())]
            }
            "int_literal" => vec![Some("int".to_string())],
            "float_literal" => vec![Some("float64".to_string())],
            "true" | "false" => vec![Some("bool".to_string())],
            _ => vec![literal_type(expr, &self.types())],
        }
    }

    /// Result types of a call whose target can be identified
    fn call_results(&self, call: Node<'a>) -> Option<Results> {
        let function = call.child_by_field_name("function")?;
        match function.kind() {
            "identifier" => match self.lookup(self.text(function))? {
                Symbol::Func { results } => Some(results),
                _ => None,
            },
            "selector_expression" => {
                let operand = function.child_by_field_name("operand")?;
                let field = self.text(function.child_by_field_name("field")?);
                if operand.kind() != "identifier" {
                    return None;
                }
                match self.lookup(self.text(operand))? {
                    Symbol::Package { path } => {
                        self.index.external(&format!("{}.{}", path, field)).cloned()
                    }
                    Symbol::Var { ty: Some(ty) } => self.index.method(&ty, field).cloned(),
                    _ => None,
                }
            }
            _ => None,
        }
    }
}

/// Struct literal keys name fields, not variables
fn is_field_key(key: Node<'_>) -> bool {
    match key.kind() {
        "field_identifier" | "identifier" => true,
        "literal_element" => {
            let inner = named_children(key);
            inner.len() == 1 && inner[0].kind() == "identifier"
        }
        _ => false,
    }
}
