//! Go source parsing on top of tree-sitter-go
//!
//! Parsing never mutates a tree: rewrites are expressed as byte-span edits
//! against the original text (see [`crate::tracer::Patch`]), so a parsed
//! [`SourceFile`] stays valid for the whole run.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;
use tree_sitter::{Node, Tree};

use crate::config::FileFilter;
use crate::{PropagateError, Result};

/// Byte range of a node in its source text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Whether `other` lies entirely inside this span
    pub fn contains(&self, other: Span) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

impl From<Node<'_>> for Span {
    fn from(node: Node<'_>) -> Self {
        Self::new(node.start_byte(), node.end_byte())
    }
}

/// One parsed Go file
pub struct SourceFile {
    pub path: PathBuf,
    pub source: String,
    pub tree: Tree,
    /// Name from the `package` clause
    pub package: String,
}

impl SourceFile {
    pub fn root(&self) -> Node<'_> {
        self.tree.root_node()
    }

    /// Source text covered by a node
    pub fn text(&self, node: Node<'_>) -> &str {
        &self.source[node.byte_range()]
    }

    pub fn span_text(&self, span: Span) -> &str {
        &self.source[span.start..span.end]
    }
}

impl std::fmt::Debug for SourceFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceFile")
            .field("path", &self.path)
            .field("package", &self.package)
            .field("len", &self.source.len())
            .finish()
    }
}

/// All files of a directory that share a `package` clause
#[derive(Debug)]
pub struct SourcePackage {
    pub name: String,
    pub files: Vec<SourceFile>,
}

/// Go parser using tree-sitter-go
pub struct GoParser {
    parser: tree_sitter::Parser,
}

impl GoParser {
    pub fn new() -> Result<Self> {
        let mut parser = tree_sitter::Parser::new();
        let language: tree_sitter::Language = tree_sitter_go::LANGUAGE.into();
        parser.set_language(&language)?;

        Ok(Self { parser })
    }

    /// Parse source text that claims to come from `path`
    ///
    /// A tree containing error or missing nodes is rejected: rewriting a file
    /// the parser only partially understood risks corrupting it.
    pub fn parse(&mut self, path: impl Into<PathBuf>, source: String) -> Result<SourceFile> {
        let path = path.into();
        let tree = self
            .parser
            .parse(&source, None)
            .ok_or_else(|| PropagateError::Syntax {
                path: path.clone(),
                line: 1,
                column: 1,
            })?;

        if let Some(broken) = first_error(tree.root_node()) {
            let position = broken.start_position();
            return Err(PropagateError::Syntax {
                path,
                line: position.row + 1,
                column: position.column + 1,
            });
        }

        let package = package_name(tree.root_node(), &source).ok_or_else(|| {
            PropagateError::Syntax {
                path: path.clone(),
                line: 1,
                column: 1,
            }
        })?;

        Ok(SourceFile {
            path,
            source,
            tree,
            package,
        })
    }

    /// Parse a file from disk
    pub fn parse_file(&mut self, path: &Path) -> Result<SourceFile> {
        let source = fs::read_to_string(path).map_err(|e| PropagateError::io(path, e))?;
        self.parse(path, source)
    }
}

/// Parse every source file directly inside `dir`, grouped by package
///
/// Test and mock files are parsed too so that the package index sees every
/// declaration; `filter` only decides what counts as a source file. Packages
/// come back in name order, files in path order.
pub fn parse_directory(dir: &Path, filter: &FileFilter) -> Result<Vec<SourcePackage>> {
    let entries = fs::read_dir(dir).map_err(|e| PropagateError::io(dir, e))?;

    let mut paths = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| PropagateError::io(dir, e))?;
        let path = entry.path();
        if path.is_file() && filter.is_source(&path) {
            paths.push(path);
        }
    }
    paths.sort();

    let mut parser = GoParser::new()?;
    let mut packages: BTreeMap<String, Vec<SourceFile>> = BTreeMap::new();
    for path in paths {
        let file = parser.parse_file(&path)?;
        debug!(path = %path.display(), package = %file.package, "parsed");
        packages.entry(file.package.clone()).or_default().push(file);
    }

    Ok(packages
        .into_iter()
        .map(|(name, files)| SourcePackage { name, files })
        .collect())
}

/// Named children of a node, collected so callers can recurse freely
pub fn named_children<'t>(node: Node<'t>) -> Vec<Node<'t>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor).collect()
}

/// All children stored under a field name
pub fn field_children<'t>(node: Node<'t>, field: &str) -> Vec<Node<'t>> {
    let mut cursor = node.walk();
    node.children_by_field_name(field, &mut cursor).collect()
}

/// Expressions of the `expression_list` stored under `field`
///
/// A field holding a single bare expression yields just that expression.
pub fn expression_list<'t>(node: Node<'t>, field: &str) -> Vec<Node<'t>> {
    match node.child_by_field_name(field) {
        Some(list) if list.kind() == "expression_list" => named_children(list),
        Some(expr) => vec![expr],
        None => Vec::new(),
    }
}

/// Whether an expression node is the blank identifier
pub fn is_blank(node: Node<'_>, source: &str) -> bool {
    matches!(node.kind(), "identifier" | "blank_identifier") && &source[node.byte_range()] == "_"
}

fn package_name(root: Node<'_>, source: &str) -> Option<String> {
    named_children(root)
        .into_iter()
        .find(|child| child.kind() == "package_clause")
        .and_then(|clause| {
            named_children(clause)
                .into_iter()
                .find(|child| child.kind() == "package_identifier")
        })
        .map(|ident| source[ident.byte_range()].to_string())
}

fn first_error(node: Node<'_>) -> Option<Node<'_>> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    if !node.has_error() {
        return None;
    }
    let mut cursor = node.walk();
    let children: Vec<Node<'_>> = node.children(&mut cursor).collect();
    children.into_iter().find_map(first_error)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_package_name() {
        let mut parser = GoParser::new().unwrap();
        let file = parser
            .parse("a.go", "package handlers\n\nfunc f() {}\n".to_string())
            .unwrap();
        assert_eq!(file.package, "handlers");
        assert_eq!(file.root().kind(), "source_file");
    }

    #[test]
    fn test_syntax_error_location() {
        let mut parser = GoParser::new().unwrap();
        let err = parser
            .parse("bad.go", "package bad\n\nfunc f( {\n".to_string())
            .unwrap_err();
        match err {
            PropagateError::Syntax { path, line, .. } => {
                assert_eq!(path, PathBuf::from("bad.go"));
                assert!(line >= 3, "unexpected line {line}");
            }
            other => panic!("Expected syntax error, got {other:?}"),
        }
    }

    #[test]
    fn test_span_contains() {
        let outer = Span::new(10, 20);
        assert!(outer.contains(Span::new(10, 20)));
        assert!(outer.contains(Span::new(12, 15)));
        assert!(!outer.contains(Span::new(5, 15)));
        assert_eq!(outer.len(), 10);
    }

    #[test]
    fn test_parse_directory_groups_packages() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b.go"), "package svc\n").unwrap();
        fs::write(dir.path().join("a.go"), "package svc\n").unwrap();
        fs::write(dir.path().join("a_test.go"), "package svc_test\n").unwrap();
        fs::write(dir.path().join("notes.txt"), "not go").unwrap();

        let packages = parse_directory(dir.path(), &FileFilter::default()).unwrap();
        let names: Vec<&str> = packages.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["svc", "svc_test"]);

        let files: Vec<String> = packages[0]
            .files
            .iter()
            .map(|f| f.path.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(files, vec!["a.go", "b.go"]);
    }
}
