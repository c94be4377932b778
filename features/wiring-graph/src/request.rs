use std::fmt::Display;

use crate::{
    binding::{BindingType, ContributionBinding},
    errors::ModelError,
    key::{BindingKey, Key},
    model::{qualifier_of, FieldElement, MemberMethod, ParameterElement},
    types::{names, SiteRef, TypeRef},
};

/// How a dependency is requested
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RequestKind {
    Instance,
    Provider,
    Lazy,
    ProviderOfLazy,
    Producer,
    Produced,
    Future,
    MembersInjector,
}

impl RequestKind {
    /// Splits a declared type into its request kind and the requested type,
    /// e.g. `Provider<Lazy<Foo>>` into (`ProviderOfLazy`, `Foo`)
    pub fn extract(ty: &TypeRef) -> (RequestKind, TypeRef) {
        if let Some(inner) = ty.unwrap_if(names::PROVIDER) {
            if let Some(lazy) = inner.unwrap_if(names::LAZY) {
                return (RequestKind::ProviderOfLazy, lazy.clone());
            }
            return (RequestKind::Provider, inner.clone());
        }
        let wrappers = [
            (names::LAZY, RequestKind::Lazy),
            (names::PRODUCER, RequestKind::Producer),
            (names::PRODUCED, RequestKind::Produced),
        ];
        for (wrapper, kind) in wrappers {
            if let Some(inner) = ty.unwrap_if(wrapper) {
                return (kind, inner.clone());
            }
        }
        (RequestKind::Instance, ty.clone())
    }

    /// Requests that do not need the dependency while constructing the dependent.
    /// Cycles through such edges are legal.
    pub fn breaks_cycles(self) -> bool {
        matches!(
            self,
            RequestKind::Provider
                | RequestKind::Lazy
                | RequestKind::ProviderOfLazy
                | RequestKind::Producer
        )
    }

    /// Whether satisfying the request needs a production binding
    pub fn is_production_request(self) -> bool {
        matches!(
            self,
            RequestKind::Producer | RequestKind::Produced | RequestKind::Future
        )
    }
}

impl Display for RequestKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            RequestKind::Instance => "instance",
            RequestKind::Provider => "provider",
            RequestKind::Lazy => "lazy",
            RequestKind::ProviderOfLazy => "provider of lazy",
            RequestKind::Producer => "producer",
            RequestKind::Produced => "produced",
            RequestKind::Future => "future",
            RequestKind::MembersInjector => "members injector",
        };
        f.write_str(name)
    }
}

/// A single requested edge of the graph
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DependencyRequest {
    key: Key,
    kind: RequestKind,
    origin: Option<SiteRef>,
}

impl DependencyRequest {
    pub fn new(key: Key, kind: RequestKind) -> Self {
        Self {
            key,
            kind,
            origin: None,
        }
    }

    pub fn with_origin(mut self, origin: SiteRef) -> Self {
        self.origin = Some(origin);
        self
    }

    pub fn key(&self) -> &Key {
        &self.key
    }

    pub fn kind(&self) -> RequestKind {
        self.kind
    }

    /// Where the request was written, absent for synthetic requests
    pub fn origin(&self) -> Option<&SiteRef> {
        self.origin.as_ref()
    }

    pub fn binding_key(&self) -> BindingKey {
        match self.kind {
            RequestKind::MembersInjector => BindingKey::members_injection(self.key.clone()),
            _ => BindingKey::contribution(self.key.clone()),
        }
    }

    /// A constructor or method parameter
    pub fn for_parameter(parameter: &ParameterElement, site: SiteRef) -> Result<Self, ModelError> {
        let qualifier = qualifier_of(&parameter.annotations, &site)?;
        let (kind, ty) = RequestKind::extract(&parameter.ty);
        Ok(Self::new(Key::qualified(qualifier, ty), kind).with_origin(site))
    }

    /// An injected field
    pub fn for_field(field: &FieldElement, site: SiteRef) -> Result<Self, ModelError> {
        let qualifier = qualifier_of(&field.annotations, &site)?;
        let (kind, ty) = RequestKind::extract(&field.ty);
        Ok(Self::new(Key::qualified(qualifier, ty), kind).with_origin(site))
    }

    /// A zero-argument component method of a provision component
    pub fn for_component_provision_method(method: &MemberMethod) -> Result<Self, ModelError> {
        let site = method.site();
        let qualifier = qualifier_of(&method.method.annotations, &site)?;
        let (kind, ty) = RequestKind::extract(&method.method.return_type);
        Ok(Self::new(Key::qualified(qualifier, ty), kind).with_origin(site))
    }

    /// A zero-argument component method of a production component. `Future<T>` requests `T`.
    pub fn for_component_production_method(method: &MemberMethod) -> Result<Self, ModelError> {
        let site = method.site();
        let qualifier = qualifier_of(&method.method.annotations, &site)?;
        let return_type = &method.method.return_type;
        let (kind, ty) = match return_type.unwrap_if(names::FUTURE) {
            Some(inner) => (RequestKind::Future, inner.clone()),
            None => RequestKind::extract(return_type),
        };
        Ok(Self::new(Key::qualified(qualifier, ty), kind).with_origin(site))
    }

    /// `void inject(T)` or `T inject(T)`
    pub fn for_component_members_injection_method(
        method: &MemberMethod,
    ) -> Result<Self, ModelError> {
        let site = method.site();
        let Some(parameter) = method.method.parameters.first() else {
            return Err(ModelError::InvalidComponentMethod {
                method: site,
                reason: "members injection methods take exactly one parameter".to_string(),
            });
        };
        let parameter_site = method.parameter_site(0);
        if qualifier_of(&parameter.annotations, &parameter_site)?.is_some() {
            return Err(ModelError::QualifiedMembersInjection(parameter_site));
        }
        Ok(Self::new(Key::new(parameter.ty.clone()), RequestKind::MembersInjector).with_origin(site))
    }

    /// `MembersInjector<T> injector()`
    pub fn for_members_injector_method(method: &MemberMethod) -> Result<Self, ModelError> {
        let site = method.site();
        if qualifier_of(&method.method.annotations, &site)?.is_some() {
            return Err(ModelError::QualifiedMembersInjection(site));
        }
        let Some(ty) = method.method.return_type.unwrap_if(names::MEMBERS_INJECTOR) else {
            return Err(ModelError::InvalidComponentMethod {
                method: site,
                reason: "expected a MembersInjector return type".to_string(),
            });
        };
        Ok(Self::new(Key::new(ty.clone()), RequestKind::MembersInjector).with_origin(site))
    }

    /// The members injection an injected constructor needs after construction
    pub fn for_members_injected_type(ty: &TypeRef, site: SiteRef) -> Self {
        Self::new(Key::new(ty.clone()), RequestKind::MembersInjector).with_origin(site)
    }

    /// The edge from a synthetic multibinding to one of its contributions
    pub fn for_multibinding_contribution(
        multibinding_key: &Key,
        contribution: &ContributionBinding,
    ) -> Self {
        let kind = match multibinding_key.ty().map_entry() {
            Some((_, value)) if value.is_type_of(names::PROVIDER) => RequestKind::Provider,
            Some((_, value)) if value.is_type_of(names::PRODUCER) => RequestKind::Producer,
            Some((_, value)) if value.is_type_of(names::PRODUCED) => RequestKind::Produced,
            _ => RequestKind::Instance,
        };
        let request = Self::new(contribution.key().clone(), kind);
        match contribution.binding_element() {
            Some(element) => request.with_origin(element.clone()),
            None => request,
        }
    }

    /// The edge from a present `Optional<T>` to `T`
    pub fn for_present_optional(optional_key: &Key, binding_type: BindingType) -> Option<Self> {
        let value = optional_key.ty().unwrap_if(names::OPTIONAL)?;
        let (kind, ty) = RequestKind::extract(value);
        let kind = match (kind, binding_type) {
            (RequestKind::Instance, BindingType::Production) => RequestKind::Producer,
            (kind, _) => kind,
        };
        Some(Self::new(
            Key::qualified(optional_key.qualifier().cloned(), ty),
            kind,
        ))
    }
}

impl Display for DependencyRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.origin {
            Some(origin) => write!(f, "{} ({}) at {}", self.key, self.kind, origin),
            None => write!(f, "{} ({})", self.key, self.kind),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Annotation, MethodElement};

    fn foo() -> TypeRef {
        TypeRef::declared("Foo")
    }

    fn site() -> SiteRef {
        SiteRef::parameter(&TypeRef::declared("Bar"), "<init>", 0)
    }

    #[test]
    fn framework_wrappers_are_unwrapped() {
        let cases = [
            (foo(), RequestKind::Instance),
            (TypeRef::provider_of(foo()), RequestKind::Provider),
            (TypeRef::lazy_of(foo()), RequestKind::Lazy),
            (
                TypeRef::provider_of(TypeRef::lazy_of(foo())),
                RequestKind::ProviderOfLazy,
            ),
            (TypeRef::producer_of(foo()), RequestKind::Producer),
            (TypeRef::produced_of(foo()), RequestKind::Produced),
        ];
        for (ty, expected) in cases {
            let request =
                DependencyRequest::for_parameter(&ParameterElement::new("foo", ty), site())
                    .unwrap();
            assert_eq!(request.kind(), expected);
            assert_eq!(request.key(), &Key::new(foo()));
        }
    }

    #[test]
    fn parameter_with_two_qualifiers_fails() {
        let parameter = ParameterElement::new("foo", foo())
            .annotated(Annotation::named("a"))
            .annotated(Annotation::named("b"));
        assert!(matches!(
            DependencyRequest::for_parameter(&parameter, site()),
            Err(ModelError::MultipleQualifiers { .. })
        ));
    }

    #[test]
    fn instance_provider_and_lazy_share_a_binding_key() {
        let instance = DependencyRequest::new(Key::new(foo()), RequestKind::Instance);
        let provider = DependencyRequest::new(Key::new(foo()), RequestKind::Provider);
        let lazy = DependencyRequest::new(Key::new(foo()), RequestKind::Lazy);
        assert_eq!(instance.binding_key(), provider.binding_key());
        assert_eq!(instance.binding_key(), lazy.binding_key());
    }

    #[test]
    fn members_injection_requests_use_members_injection_keys() {
        let method = MemberMethod {
            declaring_type: TypeRef::declared("C"),
            method: MethodElement::abstract_method("inject", TypeRef::Void).with_param("foo", foo()),
        };
        let request = DependencyRequest::for_component_members_injection_method(&method).unwrap();
        assert_eq!(
            request.binding_key(),
            BindingKey::members_injection(Key::new(foo()))
        );
    }

    #[test]
    fn production_methods_unwrap_futures() {
        let method = MemberMethod {
            declaring_type: TypeRef::declared("C"),
            method: MethodElement::abstract_method("foo", TypeRef::future_of(foo())),
        };
        let request = DependencyRequest::for_component_production_method(&method).unwrap();
        assert_eq!(request.kind(), RequestKind::Future);
        assert_eq!(request.key(), &Key::new(foo()));
    }
}
