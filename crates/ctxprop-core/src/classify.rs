//! Classification of values against the propagated type

use crate::config::PropagatedType;
use crate::symbols::Symbol;

/// Decides whether a variable, type or package is the propagated one
///
/// Matching is by suffix of the qualified name, so
/// `vendor/golang.org/x/net/context.Context` counts as `context.Context`, and so
/// does `mycontext.Context`.
#[derive(Debug, Clone)]
pub struct TypeClassifier {
    qualified: String,
    package_suffix: String,
}

impl TypeClassifier {
    pub fn new(propagated: &PropagatedType) -> Self {
        Self {
            qualified: propagated.qualified_name(),
            package_suffix: propagated.package_suffix.clone(),
        }
    }

    /// Whether a symbol is the propagated type's package or a variable of
    /// the propagated type
    pub fn is_propagated(&self, symbol: &Symbol) -> bool {
        match symbol {
            Symbol::Package { path } => self.is_propagated_package(path),
            Symbol::Var { ty: Some(ty) } => self.is_propagated_type(ty),
            _ => false,
        }
    }

    /// Whether a qualified type name is the propagated type
    ///
    /// Pointers do not match: a `*context.Context` is not itself a context.
    pub fn is_propagated_type(&self, ty: &str) -> bool {
        !ty.starts_with('*') && ty.ends_with(&self.qualified)
    }

    /// Whether an import path is the propagated type's package
    pub fn is_propagated_package(&self, path: &str) -> bool {
        path.ends_with(&self.package_suffix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier() -> TypeClassifier {
        TypeClassifier::new(&PropagatedType::default())
    }

    #[test]
    fn test_propagated_types() {
        let classifier = classifier();
        assert!(classifier.is_propagated_type("context.Context"));
        assert!(classifier.is_propagated_type("golang.org/x/net/context.Context"));
        assert!(classifier.is_propagated_type("vendor/golang.org/x/net/context.Context"));

        assert!(!classifier.is_propagated_type("context.CancelFunc"));
        assert!(!classifier.is_propagated_type("*context.Context"));
        assert!(!classifier.is_propagated_type("svc.Context"));
        // shared suffix
        assert!(classifier.is_propagated_type("mycontext.Context"));
    }

    #[test]
    fn test_propagated_packages() {
        let classifier = classifier();
        assert!(classifier.is_propagated_package("context"));
        assert!(classifier.is_propagated_package("golang.org/x/net/context"));
        assert!(!classifier.is_propagated_package("time"));
        assert!(!classifier.is_propagated_package("context/internal"));
    }

    #[test]
    fn test_symbols() {
        let classifier = classifier();
        assert!(classifier.is_propagated(&Symbol::var("context.Context")));
        assert!(!classifier.is_propagated(&Symbol::Var { ty: None }));
        assert!(classifier.is_propagated(&Symbol::Package {
            path: "golang.org/x/net/context".to_string()
        }));
        assert!(!classifier.is_propagated(&Symbol::Func {
            results: vec![Some("context.Context".to_string())]
        }));
    }
}
