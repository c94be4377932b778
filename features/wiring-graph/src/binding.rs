use std::{fmt::Display, sync::Arc};

use indexmap::IndexMap;

use crate::{
    key::{BindingKey, Key},
    model::Annotation,
    request::DependencyRequest,
    types::{names, MapKey, Scope, SiteRef, TypeRef},
};

/// Whether a binding provides synchronously or produces asynchronously
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BindingType {
    Provision,
    Production,
}
impl BindingType {
    /// The framework type instances are requested through
    pub fn framework_type(self) -> &'static str {
        match self {
            BindingType::Provision => names::PROVIDER,
            BindingType::Production => names::PRODUCER,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ContributionType {
    Unique,
    Set,
    Map,
    SetValues,
}
impl ContributionType {
    pub fn from_annotations(annotations: &[Annotation]) -> Self {
        for annotation in annotations {
            match annotation {
                Annotation::IntoSet => return ContributionType::Set,
                Annotation::ElementsIntoSet => return ContributionType::SetValues,
                Annotation::IntoMap => return ContributionType::Map,
                _ => {}
            }
        }
        ContributionType::Unique
    }

    pub fn is_multibinding(self) -> bool {
        self != ContributionType::Unique
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BindingKind {
    /// An `@Inject` constructor
    Injection,
    /// A `@Provides` module method
    Provision,
    /// A `@Produces` module method
    Production,
    /// The component instance itself
    Component,
    /// An instance of a component dependency
    ComponentDependency,
    /// A provision method of a component dependency
    ComponentProvision,
    /// A production method of a component dependency
    ComponentProduction,
    /// An instance bound on the component builder
    BoundInstance,
    SubcomponentBuilder,
    /// A `@Binds` alias
    Delegate,
    MultiboundSet,
    MultiboundMap,
    Optional,
    /// A `MembersInjector<T>`
    MembersInjector,
}
impl BindingKind {
    pub fn is_synthetic(self) -> bool {
        matches!(
            self,
            BindingKind::MultiboundSet
                | BindingKind::MultiboundMap
                | BindingKind::Optional
                | BindingKind::MembersInjector
        )
    }

    pub fn is_multibinding(self) -> bool {
        matches!(self, BindingKind::MultiboundSet | BindingKind::MultiboundMap)
    }
}
impl Display for BindingKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            BindingKind::Injection => "injection",
            BindingKind::Provision => "provision",
            BindingKind::Production => "production",
            BindingKind::Component => "component",
            BindingKind::ComponentDependency => "component dependency",
            BindingKind::ComponentProvision => "component provision",
            BindingKind::ComponentProduction => "component production",
            BindingKind::BoundInstance => "bound instance",
            BindingKind::SubcomponentBuilder => "subcomponent builder",
            BindingKind::Delegate => "delegate",
            BindingKind::MultiboundSet => "multibound set",
            BindingKind::MultiboundMap => "multibound map",
            BindingKind::Optional => "optional",
            BindingKind::MembersInjector => "members injector",
        };
        f.write_str(name)
    }
}

/// How to produce an instance of a key
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContributionBinding {
    key: Key,
    binding_type: BindingType,
    kind: BindingKind,
    contribution_type: ContributionType,
    binding_element: Option<SiteRef>,
    contributing_module: Option<TypeRef>,
    scope: Option<Scope>,
    dependencies: Vec<DependencyRequest>,
    map_key: Option<MapKey>,
    requires_module_instance: bool,
    unresolved: Option<Arc<ContributionBinding>>,
}

impl ContributionBinding {
    pub(crate) fn new(key: Key, kind: BindingKind, binding_type: BindingType) -> Self {
        Self {
            key,
            binding_type,
            kind,
            contribution_type: ContributionType::Unique,
            binding_element: None,
            contributing_module: None,
            scope: None,
            dependencies: Vec::new(),
            map_key: None,
            requires_module_instance: false,
            unresolved: None,
        }
    }

    pub(crate) fn contribution_type_of(mut self, contribution_type: ContributionType) -> Self {
        self.contribution_type = contribution_type;
        self
    }

    pub(crate) fn declared_at(mut self, element: SiteRef) -> Self {
        self.binding_element = Some(element);
        self
    }

    pub(crate) fn contributed_by(mut self, module: TypeRef) -> Self {
        self.contributing_module = Some(module);
        self
    }

    pub(crate) fn scoped(mut self, scope: Option<Scope>) -> Self {
        self.scope = scope;
        self
    }

    pub(crate) fn depending_on(mut self, dependencies: Vec<DependencyRequest>) -> Self {
        self.dependencies = dependencies;
        self
    }

    pub(crate) fn keyed_by(mut self, map_key: Option<MapKey>) -> Self {
        self.map_key = map_key;
        self
    }

    pub(crate) fn needing_module_instance(mut self, requires: bool) -> Self {
        self.requires_module_instance = requires;
        self
    }

    pub(crate) fn unresolved_from(mut self, unresolved: ContributionBinding) -> Self {
        self.unresolved = Some(Arc::new(unresolved));
        self
    }

    pub fn key(&self) -> &Key {
        &self.key
    }

    pub fn binding_type(&self) -> BindingType {
        self.binding_type
    }

    pub fn kind(&self) -> BindingKind {
        self.kind
    }

    pub fn contribution_type(&self) -> ContributionType {
        self.contribution_type
    }

    pub fn binding_element(&self) -> Option<&SiteRef> {
        self.binding_element.as_ref()
    }

    pub fn contributing_module(&self) -> Option<&TypeRef> {
        self.contributing_module.as_ref()
    }

    pub fn scope(&self) -> Option<&Scope> {
        self.scope.as_ref()
    }

    pub fn dependencies(&self) -> &[DependencyRequest] {
        &self.dependencies
    }

    pub fn map_key(&self) -> Option<&MapKey> {
        self.map_key.as_ref()
    }

    /// Whether an instance of the contributing module is needed to call the binding method
    pub fn requires_module_instance(&self) -> bool {
        self.requires_module_instance
    }

    /// The binding with unsubstituted type parameters, for bindings of generic types
    pub fn unresolved(&self) -> Option<&ContributionBinding> {
        self.unresolved.as_deref()
    }

    /// The aliased request, for delegate bindings
    pub fn delegate_request(&self) -> Option<&DependencyRequest> {
        match self.kind {
            BindingKind::Delegate => self.dependencies.first(),
            _ => None,
        }
    }

    /// Bindings that produce their value without depending on other keys
    pub fn is_terminal(&self) -> bool {
        self.dependencies.is_empty()
    }

    pub fn is_production(&self) -> bool {
        self.binding_type == BindingType::Production
    }

    /// Requests grouped by binding key. Several requests for one key share one framework instance.
    pub fn framework_dependencies(&self) -> Vec<FrameworkDependency> {
        let mut grouped: IndexMap<BindingKey, Vec<DependencyRequest>> = IndexMap::new();
        for dependency in &self.dependencies {
            grouped
                .entry(dependency.binding_key())
                .or_default()
                .push(dependency.clone());
        }
        grouped
            .into_iter()
            .map(|(binding_key, requests)| FrameworkDependency {
                binding_key,
                requests,
            })
            .collect()
    }
}

impl Display for ContributionBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.binding_element {
            Some(element) => write!(f, "{} {} at {}", self.kind, self.key, element),
            None => write!(f, "{} {}", self.kind, self.key),
        }
    }
}

/// One framework instance standing for every request of a binding for the same key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameworkDependency {
    pub binding_key: BindingKey,
    pub requests: Vec<DependencyRequest>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InjectionSiteKind {
    Field,
    Method,
}

/// An `@Inject` field or method
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InjectionSite {
    pub kind: InjectionSiteKind,
    pub element: SiteRef,
    pub dependencies: Vec<DependencyRequest>,
}

/// How to inject the members of an existing instance
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MembersInjectionBinding {
    key: Key,
    injection_sites: Vec<InjectionSite>,
}
impl MembersInjectionBinding {
    pub(crate) fn new(key: Key, injection_sites: Vec<InjectionSite>) -> Self {
        Self {
            key,
            injection_sites,
        }
    }

    pub fn key(&self) -> &Key {
        &self.key
    }

    /// Sites ordered from the root of the class hierarchy down
    pub fn injection_sites(&self) -> &[InjectionSite] {
        &self.injection_sites
    }

    pub fn dependencies(&self) -> impl Iterator<Item = &DependencyRequest> {
        self.injection_sites
            .iter()
            .flat_map(|site| site.dependencies.iter())
    }

    pub fn has_injection_sites(&self) -> bool {
        !self.injection_sites.is_empty()
    }
}

/// Common surface of every declaration a module can make
pub trait BindingDeclaration {
    fn key(&self) -> &Key;
    fn binding_element(&self) -> Option<&SiteRef>;
    fn contributing_module(&self) -> Option<&TypeRef>;
}

/// `@Multibinds`: a set or map that may be empty
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MultibindingDeclaration {
    pub key: Key,
    pub contribution_type: ContributionType,
    pub binding_element: SiteRef,
    pub contributing_module: TypeRef,
}

/// `@Binds`: the key is satisfied by whatever binds `delegate_request`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DelegateDeclaration {
    pub key: Key,
    pub contribution_type: ContributionType,
    pub delegate_request: DependencyRequest,
    pub binding_element: SiteRef,
    pub contributing_module: TypeRef,
    pub scope: Option<Scope>,
    pub map_key: Option<MapKey>,
}

/// `@BindsOptionalOf`: `Optional<key>` is bound, present iff `key` is
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OptionalBindingDeclaration {
    pub key: Key,
    pub binding_element: SiteRef,
    pub contributing_module: TypeRef,
}

/// `@Module(subcomponents = ..)`: the key is the subcomponent's builder
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SubcomponentDeclaration {
    pub key: Key,
    pub subcomponent_type: TypeRef,
    pub contributing_module: TypeRef,
}

impl BindingDeclaration for MultibindingDeclaration {
    fn key(&self) -> &Key {
        &self.key
    }
    fn binding_element(&self) -> Option<&SiteRef> {
        Some(&self.binding_element)
    }
    fn contributing_module(&self) -> Option<&TypeRef> {
        Some(&self.contributing_module)
    }
}
impl BindingDeclaration for DelegateDeclaration {
    fn key(&self) -> &Key {
        &self.key
    }
    fn binding_element(&self) -> Option<&SiteRef> {
        Some(&self.binding_element)
    }
    fn contributing_module(&self) -> Option<&TypeRef> {
        Some(&self.contributing_module)
    }
}
impl BindingDeclaration for OptionalBindingDeclaration {
    fn key(&self) -> &Key {
        &self.key
    }
    fn binding_element(&self) -> Option<&SiteRef> {
        Some(&self.binding_element)
    }
    fn contributing_module(&self) -> Option<&TypeRef> {
        Some(&self.contributing_module)
    }
}
impl BindingDeclaration for SubcomponentDeclaration {
    fn key(&self) -> &Key {
        &self.key
    }
    fn binding_element(&self) -> Option<&SiteRef> {
        None
    }
    fn contributing_module(&self) -> Option<&TypeRef> {
        Some(&self.contributing_module)
    }
}
impl BindingDeclaration for ContributionBinding {
    fn key(&self) -> &Key {
        &self.key
    }
    fn binding_element(&self) -> Option<&SiteRef> {
        self.binding_element.as_ref()
    }
    fn contributing_module(&self) -> Option<&TypeRef> {
        self.contributing_module.as_ref()
    }
}

/// Indexes declarations by key, keeping declaration order
pub fn index_by_key<D>(declarations: impl IntoIterator<Item = Arc<D>>) -> IndexMap<Key, Vec<Arc<D>>>
where
    D: BindingDeclaration,
{
    let mut index: IndexMap<Key, Vec<Arc<D>>> = IndexMap::new();
    for declaration in declarations {
        index
            .entry(declaration.key().clone())
            .or_default()
            .push(declaration);
    }
    index
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{request::RequestKind, types::TypeRef};

    fn request(ty: &str, kind: RequestKind) -> DependencyRequest {
        DependencyRequest::new(Key::new(TypeRef::declared(ty)), kind)
    }

    #[test]
    fn framework_dependencies_merge_requests_for_one_key() {
        let binding = ContributionBinding::new(
            Key::new(TypeRef::declared("Foo")),
            BindingKind::Injection,
            BindingType::Provision,
        )
        .depending_on(vec![
            request("Bar", RequestKind::Instance),
            request("Baz", RequestKind::Instance),
            request("Bar", RequestKind::Provider),
            request("Bar", RequestKind::Lazy),
        ]);

        let dependencies = binding.framework_dependencies();
        assert_eq!(dependencies.len(), 2);
        assert_eq!(dependencies[0].requests.len(), 3);
        assert_eq!(
            dependencies[1].binding_key,
            BindingKey::contribution(Key::new(TypeRef::declared("Baz")))
        );
    }

    #[test]
    fn declarations_index_by_key_in_order() {
        let module = TypeRef::declared("M");
        let declaration = |method: &str| {
            Arc::new(MultibindingDeclaration {
                key: Key::new(TypeRef::set_of(TypeRef::declared("Foo"))),
                contribution_type: ContributionType::Set,
                binding_element: SiteRef::method(&module, method),
                contributing_module: module.clone(),
            })
        };
        let index = index_by_key([declaration("a"), declaration("b")]);
        assert_eq!(index.len(), 1);
        let elements: Vec<String> = index[0]
            .iter()
            .map(|d| d.binding_element.to_string())
            .collect();
        assert_eq!(elements, ["M.a()", "M.b()"]);
    }
}
