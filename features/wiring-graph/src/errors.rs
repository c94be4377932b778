use thiserror::Error;

use crate::{
    key::BindingKey,
    types::{MapKey, Qualifier, Scope, SiteRef, TypeRef},
};

/// Problems with the declarations themselves.
///
/// These are recorded on the descriptor, module or registry that found them
/// and resolution carries on without the offending element.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("The type '{0}' is not known to the element model")]
    UnknownType(TypeRef),
    #[error("The type '{0}' has been registered twice")]
    DuplicateType(TypeRef),
    #[error("'{site}' may have at most one qualifier, found {qualifiers:?}")]
    MultipleQualifiers {
        site: SiteRef,
        qualifiers: Vec<Qualifier>,
    },
    #[error("'{site}' may have at most one scope, found {scopes:?}")]
    MultipleScopes { site: SiteRef, scopes: Vec<Scope> },
    #[error("'{ty}' must carry exactly one component annotation, found {found}")]
    ComponentAnnotation { ty: TypeRef, found: usize },
    #[error("'{0}' is a subcomponent and cannot be the root of a binding graph")]
    NotTopLevelComponent(TypeRef),
    #[error("'{0}' is not annotated as a module")]
    NotAModule(TypeRef),
    #[error("The module '{0}' includes itself")]
    ModuleIncludeCycle(TypeRef),
    #[error("'{0}' is included through a subcomponent cycle")]
    SubcomponentCycle(TypeRef),
    #[error("Invalid component method '{method}': {reason}")]
    InvalidComponentMethod { method: SiteRef, reason: String },
    #[error("Invalid binding method '{method}': {reason}")]
    InvalidBindingMethod { method: SiteRef, reason: String },
    #[error("'{0}' contributes to a map but declares no map key")]
    MissingMapKey(SiteRef),
    #[error("'{site}' may have at most one map key, found {keys:?}")]
    MultipleMapKeys { site: SiteRef, keys: Vec<MapKey> },
    #[error("'{0}' declares more than one @Inject constructor")]
    MultipleInjectConstructors(TypeRef),
    #[error("Members injection of '{0}' may not be qualified")]
    QualifiedMembersInjection(SiteRef),
    #[error("'{0}' declares more than one builder")]
    MultipleBuilders(TypeRef),
    #[error("Subcomponent '{0}' is declared by a module but has no builder")]
    MissingSubcomponentBuilder(TypeRef),
}

/// Problems found while validating a resolved graph
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BindingGraphError {
    #[error("'{key}' is not bound in '{component}', requested by {requested_by:?}")]
    MissingBinding {
        key: BindingKey,
        component: TypeRef,
        requested_by: Vec<String>,
    },
    #[error("'{key}' is bound multiple times in '{component}': {bindings:?}")]
    DuplicateBindings {
        key: BindingKey,
        component: TypeRef,
        bindings: Vec<String>,
    },
    #[error("A dependency cycle exists in '{component}' through {chain:?} - Consider requesting a `Provider` or `Lazy`")]
    DependencyCycle {
        component: TypeRef,
        chain: Vec<BindingKey>,
    },
    #[error("'{key}' is scoped {scope} but '{component}' does not declare that scope")]
    IncompatiblyScopedBinding {
        key: BindingKey,
        scope: Scope,
        component: TypeRef,
    },
    #[error("The map '{key}' in '{component}' has more than one contribution for {map_key}")]
    DuplicateMapKeys {
        key: BindingKey,
        map_key: MapKey,
        component: TypeRef,
    },
    #[error("The provision '{key}' in '{component}' depends on the production '{dependency}'")]
    ProvisionDependsOnProduction {
        key: BindingKey,
        dependency: BindingKey,
        component: TypeRef,
    },
    #[error(transparent)]
    Declaration(#[from] ModelError),
}

#[derive(Error, Debug, Clone)]
pub struct BindingGraphErrors {
    pub errors: Vec<BindingGraphError>,
}
impl std::fmt::Display for BindingGraphErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut display = Vec::new();
        display.push("The binding graph had one or more errors:".to_string());
        for error in &self.errors {
            display.push(format!("- {}", error));
        }
        f.write_str(&display.join("\n"))
    }
}
