use serde::{Deserialize, Serialize};

/// How to treat a `Set` or `Map` key nobody contributes to or declares
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UndeclaredMultibindings {
    /// The key has no binding
    #[default]
    Missing,
    /// The key is bound to an empty set or map
    Empty,
}

/// How a validation finding is reported
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Error,
    Warning,
    Off,
}

/// Options for resolving and validating a binding graph
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverOptions {
    /// Also resolve every key declared by a component's modules, not only those reachable
    /// from its entry points
    pub full_binding_graph: bool,
    pub undeclared_multibindings: UndeclaredMultibindings,
    /// Bindings scoped to a scope their owning component does not declare
    pub scope_validation: Severity,
    /// Dependency cycles not broken by a `Provider`, `Lazy` or `Producer`
    pub cycle_validation: Severity,
}

impl ResolverOptions {
    pub fn with_full_binding_graph(mut self, full: bool) -> Self {
        self.full_binding_graph = full;
        self
    }

    pub fn with_undeclared_multibindings(mut self, policy: UndeclaredMultibindings) -> Self {
        self.undeclared_multibindings = policy;
        self
    }

    pub fn with_scope_validation(mut self, severity: Severity) -> Self {
        self.scope_validation = severity;
        self
    }

    pub fn with_cycle_validation(mut self, severity: Severity) -> Self {
        self.cycle_validation = severity;
        self
    }
}
