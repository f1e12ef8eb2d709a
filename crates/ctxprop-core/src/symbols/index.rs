//! Package-level declarations and type-expression resolution

use std::collections::HashMap;

use tree_sitter::Node;

use super::Results;
use crate::config::ExternalSignature;
use crate::parser::{field_children, named_children, SourceFile, SourcePackage};

const BUILTIN_TYPES: &[&str] = &[
    "any", "bool", "byte", "comparable", "complex64", "complex128", "error", "float32",
    "float64", "int", "int8", "int16", "int32", "int64", "rune", "string", "uint", "uint8",
    "uint16", "uint32", "uint64", "uintptr",
];

/// Import table of one file: local package name to import path
#[derive(Debug, Default, Clone)]
pub struct Imports {
    names: HashMap<String, String>,
}

impl Imports {
    pub fn collect(file: &SourceFile) -> Self {
        let mut imports = Self::default();
        for decl in named_children(file.root()) {
            if decl.kind() != "import_declaration" {
                continue;
            }
            for spec in import_specs(decl) {
                imports.add_spec(spec, &file.source);
            }
        }
        imports
    }

    /// Import path bound to a local package name
    pub fn path(&self, name: &str) -> Option<&str> {
        self.names.get(name).map(String::as_str)
    }

    pub fn insert(&mut self, name: impl Into<String>, path: impl Into<String>) {
        self.names.insert(name.into(), path.into());
    }

    fn add_spec(&mut self, spec: Node<'_>, source: &str) {
        let Some(path_node) = spec.child_by_field_name("path") else {
            return;
        };
        let path = source[path_node.byte_range()]
            .trim_matches(|c| c == '"' || c == '`')
            .to_string();

        match spec.child_by_field_name("name") {
            // Dot and blank imports bind no usable name.
            Some(name) if name.kind() != "package_identifier" => {}
            Some(name) => self.insert(&source[name.byte_range()], path),
            None => {
                let name = default_import_name(&path);
                self.insert(name, path);
            }
        }
    }
}

fn import_specs(decl: Node<'_>) -> Vec<Node<'_>> {
    let mut specs = Vec::new();
    for child in named_children(decl) {
        match child.kind() {
            "import_spec" => specs.push(child),
            "import_spec_list" => specs.extend(
                named_children(child)
                    .into_iter()
                    .filter(|spec| spec.kind() == "import_spec"),
            ),
            _ => {}
        }
    }
    specs
}

/// Package name an import is referred to by when it has no alias
///
/// Uses the last path element, skipping a trailing major-version element and
/// dropping `.vN` and `go-` decorations (`gopkg.in/yaml.v3` is `yaml`).
pub fn default_import_name(path: &str) -> String {
    let mut segments = path.rsplit('/');
    let mut last = segments.next().unwrap_or(path);
    if is_major_version(last) {
        if let Some(previous) = segments.next() {
            last = previous;
        }
    }
    let last = last.split('.').next().unwrap_or(last);
    let last = last.strip_prefix("go-").unwrap_or(last);
    last.replace('-', "_")
}

fn is_major_version(segment: &str) -> bool {
    segment.len() > 1
        && segment.starts_with('v')
        && segment[1..].chars().all(|c| c.is_ascii_digit())
}

/// Resolves type expressions of one file to qualified type names
pub struct TypeResolver<'a> {
    package: &'a str,
    imports: &'a Imports,
    source: &'a str,
}

impl<'a> TypeResolver<'a> {
    pub fn new(package: &'a str, imports: &'a Imports, source: &'a str) -> Self {
        Self {
            package,
            imports,
            source,
        }
    }

    pub fn resolve(&self, node: Node<'_>) -> Option<String> {
        match node.kind() {
            "type_identifier" => {
                let name = self.text(node);
                if BUILTIN_TYPES.contains(&name) {
                    Some(name.to_string())
                } else {
                    Some(format!("{}.{}", self.package, name))
                }
            }
            "qualified_type" => {
                let package = self.text(node.child_by_field_name("package")?);
                let name = self.text(node.child_by_field_name("name")?);
                let path = self.imports.path(package).unwrap_or(package);
                Some(format!("{}.{}", path, name))
            }
            "pointer_type" => {
                let inner = named_children(node).into_iter().next()?;
                self.resolve(inner).map(|ty| format!("*{}", ty))
            }
            "generic_type" => self.resolve(node.child_by_field_name("type")?),
            "parenthesized_type" => self.resolve(named_children(node).into_iter().next()?),
            _ => Some(self.text(node).to_string()),
        }
    }

    /// Result types declared by a function, method or func literal
    pub fn results(&self, decl: Node<'_>) -> Results {
        let Some(result) = decl.child_by_field_name("result") else {
            return Vec::new();
        };
        if result.kind() != "parameter_list" {
            return vec![self.resolve(result)];
        }

        let mut results = Vec::new();
        for param in named_children(result) {
            let ty = param
                .child_by_field_name("type")
                .and_then(|ty| self.resolve(ty));
            let count = field_children(param, "name").len().max(1);
            results.extend(std::iter::repeat(ty).take(count));
        }
        results
    }

    fn text(&self, node: Node<'_>) -> &'a str {
        &self.source[node.byte_range()]
    }
}

/// Package-level declarations of one package
#[derive(Debug, Default)]
pub struct PackageIndex {
    name: String,
    functions: HashMap<String, Results>,
    methods: HashMap<(String, String), Results>,
    variables: HashMap<String, Option<String>>,
    external: Vec<ExternalSignature>,
}

impl PackageIndex {
    /// An index with no declarations yet
    pub fn new(name: impl Into<String>, external: &[ExternalSignature]) -> Self {
        Self {
            name: name.into(),
            external: external.to_vec(),
            ..Default::default()
        }
    }

    /// Index every file of a package
    pub fn build(package: &SourcePackage, external: &[ExternalSignature]) -> Self {
        let mut index = Self::new(&package.name, external);
        for file in &package.files {
            index.add_file(file);
        }
        index
    }

    pub fn add_file(&mut self, file: &SourceFile) {
        let imports = Imports::collect(file);
        let package = self.name.clone();
        let types = TypeResolver::new(&package, &imports, &file.source);

        for decl in named_children(file.root()) {
            match decl.kind() {
                "function_declaration" => {
                    if let Some(name) = decl.child_by_field_name("name") {
                        self.functions
                            .insert(file.text(name).to_string(), types.results(decl));
                    }
                }
                "method_declaration" => {
                    let receiver = decl
                        .child_by_field_name("receiver")
                        .and_then(|r| receiver_type_name(r, &file.source));
                    if let (Some(receiver), Some(name)) =
                        (receiver, decl.child_by_field_name("name"))
                    {
                        self.methods.insert(
                            (receiver, file.text(name).to_string()),
                            types.results(decl),
                        );
                    }
                }
                "var_declaration" => {
                    for spec in var_specs(decl) {
                        self.add_variables(spec, &types, file);
                    }
                }
                _ => {}
            }
        }
    }

    fn add_variables(&mut self, spec: Node<'_>, types: &TypeResolver<'_>, file: &SourceFile) {
        let declared = spec
            .child_by_field_name("type")
            .and_then(|ty| types.resolve(ty));
        let values = crate::parser::expression_list(spec, "value");

        for (idx, name) in field_children(spec, "name").into_iter().enumerate() {
            let ty = declared
                .clone()
                .or_else(|| values.get(idx).and_then(|v| literal_type(*v, types)));
            self.variables.insert(file.text(name).to_string(), ty);
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Results of a package-level function
    pub fn function(&self, name: &str) -> Option<&Results> {
        self.functions.get(name)
    }

    /// Results of a method, given the qualified type of its receiver value
    ///
    /// Only receivers declared in this package resolve.
    pub fn method(&self, receiver_type: &str, name: &str) -> Option<&Results> {
        let bare = receiver_type.trim_start_matches('*');
        let local = bare.strip_prefix(&format!("{}.", self.name))?;
        self.methods.get(&(local.to_string(), name.to_string()))
    }

    /// Declared type of a package-level variable
    pub fn variable(&self, name: &str) -> Option<&Option<String>> {
        self.variables.get(name)
    }

    /// Results of a function outside the package, by `<import path>.<Func>`
    pub fn external(&self, qualified_function: &str) -> Option<&Results> {
        self.external
            .iter()
            .find(|sig| qualified_function.ends_with(&sig.function))
            .map(|sig| &sig.results)
    }
}

/// `var_spec` nodes of a var declaration, grouped or not
pub fn var_specs(decl: Node<'_>) -> Vec<Node<'_>> {
    let mut specs = Vec::new();
    for child in named_children(decl) {
        match child.kind() {
            "var_spec" => specs.push(child),
            "var_spec_list" => specs.extend(
                named_children(child)
                    .into_iter()
                    .filter(|spec| spec.kind() == "var_spec"),
            ),
            _ => {}
        }
    }
    specs
}

/// Type of `T{...}` or `&T{...}`
pub(crate) fn literal_type(expr: Node<'_>, types: &TypeResolver<'_>) -> Option<String> {
    match expr.kind() {
        "composite_literal" => types.resolve(expr.child_by_field_name("type")?),
        "unary_expression" => {
            let operand = expr.child_by_field_name("operand")?;
            let operator = expr.child_by_field_name("operator")?;
            if operator.kind() == "&" && operand.kind() == "composite_literal" {
                literal_type(operand, types).map(|ty| format!("*{}", ty))
            } else {
                None
            }
        }
        _ => None,
    }
}

fn receiver_type_name(receiver: Node<'_>, source: &str) -> Option<String> {
    let param = named_children(receiver).into_iter().next()?;
    let mut ty = param.child_by_field_name("type")?;
    loop {
        match ty.kind() {
            "pointer_type" | "parenthesized_type" => {
                ty = named_children(ty).into_iter().next()?;
            }
            "generic_type" => ty = ty.child_by_field_name("type")?,
            "type_identifier" => return Some(source[ty.byte_range()].to_string()),
            _ => return None,
        }
    }
}
