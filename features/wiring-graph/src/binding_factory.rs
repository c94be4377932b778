//! Builds bindings and declarations from elements, plus the synthetic
//! bindings the resolver creates while looking up keys.

use std::sync::Arc;

use crate::{
    binding::{
        BindingKind, BindingType, ContributionBinding, ContributionType, DelegateDeclaration,
        InjectionSite, InjectionSiteKind, MembersInjectionBinding, MultibindingDeclaration,
        OptionalBindingDeclaration, SubcomponentDeclaration,
    },
    component::DependencyMethod,
    errors::ModelError,
    key::{ContributionId, Key},
    model::{
        map_key_of, qualifier_of, scope_of, Annotation, ElementModel, MemberMethod, MethodElement,
        TypeElement,
    },
    request::DependencyRequest,
    types::{names, MapKey, SiteRef, TypeRef},
};

fn invalid(member: &MemberMethod, reason: &str) -> ModelError {
    ModelError::InvalidBindingMethod {
        method: member.site(),
        reason: reason.to_string(),
    }
}

/// Key, contribution type and map key of a binding method.
///
/// `framework` wraps map values (`Map<K, Provider<V>>`), `None` leaves them bare.
fn binding_method_key(
    member: &MemberMethod,
    module: &TypeRef,
    framework: Option<BindingType>,
) -> Result<(Key, ContributionType, Option<MapKey>), ModelError> {
    let site = member.site();
    let annotations = &member.method.annotations;
    let contribution_type = ContributionType::from_annotations(annotations);
    let qualifier = qualifier_of(annotations, &site)?;
    let map_key = map_key_of(annotations, &site)?;

    let mut return_type = member.method.return_type.clone();
    if return_type.is_void() {
        return Err(invalid(member, "binding methods must return a value"));
    }
    if framework == Some(BindingType::Production) {
        if let Some(inner) = return_type.unwrap_if(names::FUTURE) {
            return_type = inner.clone();
        }
        if let Some(inner) = return_type
            .set_element()
            .and_then(|element| element.unwrap_if(names::FUTURE))
        {
            return_type = TypeRef::set_of(inner.clone());
        }
    }

    let key_type = match contribution_type {
        ContributionType::Unique => return_type,
        ContributionType::Set => TypeRef::set_of(return_type),
        ContributionType::SetValues => {
            if return_type.set_element().is_none() {
                return Err(invalid(member, "@ElementsIntoSet methods must return a Set"));
            }
            return_type
        }
        ContributionType::Map => {
            let Some(map_key) = &map_key else {
                return Err(ModelError::MissingMapKey(site));
            };
            let value = match framework {
                Some(binding_type) => TypeRef::wrap(binding_type.framework_type(), return_type),
                None => return_type,
            };
            TypeRef::map_of(map_key.key_type().clone(), value)
        }
    };

    let mut key = Key::qualified(qualifier, key_type);
    if contribution_type.is_multibinding() {
        key = key.with_contribution_id(ContributionId {
            module: module.clone(),
            element: site,
        });
    }
    Ok((key, contribution_type, map_key))
}

fn parameter_requests(member: &MemberMethod) -> Result<Vec<DependencyRequest>, ModelError> {
    member
        .method
        .parameters
        .iter()
        .enumerate()
        .map(|(index, parameter)| {
            DependencyRequest::for_parameter(parameter, member.parameter_site(index))
        })
        .collect()
}

/// `@Provides`
pub(crate) fn provides_method(
    module: &TypeElement,
    member: &MemberMethod,
) -> Result<ContributionBinding, ModelError> {
    let (key, contribution_type, map_key) =
        binding_method_key(member, &module.ty, Some(BindingType::Provision))?;
    let site = member.site();
    let scope = scope_of(&member.method.annotations, &site)?;
    Ok(
        ContributionBinding::new(key, BindingKind::Provision, BindingType::Provision)
            .contribution_type_of(contribution_type)
            .scoped(scope)
            .depending_on(parameter_requests(member)?)
            .keyed_by(map_key)
            .needing_module_instance(!member.method.is_static && !module.is_abstract)
            .contributed_by(module.ty.clone())
            .declared_at(site),
    )
}

/// `@Produces`
pub(crate) fn produces_method(
    module: &TypeElement,
    member: &MemberMethod,
) -> Result<ContributionBinding, ModelError> {
    let (key, contribution_type, map_key) =
        binding_method_key(member, &module.ty, Some(BindingType::Production))?;
    Ok(
        ContributionBinding::new(key, BindingKind::Production, BindingType::Production)
            .contribution_type_of(contribution_type)
            .depending_on(parameter_requests(member)?)
            .keyed_by(map_key)
            .needing_module_instance(!member.method.is_static && !module.is_abstract)
            .contributed_by(module.ty.clone())
            .declared_at(member.site()),
    )
}

/// `@Binds`
pub(crate) fn delegate_declaration(
    module: &TypeElement,
    member: &MemberMethod,
) -> Result<DelegateDeclaration, ModelError> {
    let [parameter] = member.method.parameters.as_slice() else {
        return Err(invalid(member, "@Binds methods must have exactly one parameter"));
    };
    let (key, contribution_type, map_key) = binding_method_key(member, &module.ty, None)?;
    let site = member.site();
    Ok(DelegateDeclaration {
        key,
        contribution_type,
        delegate_request: DependencyRequest::for_parameter(parameter, member.parameter_site(0))?,
        scope: scope_of(&member.method.annotations, &site)?,
        map_key,
        binding_element: site,
        contributing_module: module.ty.clone(),
    })
}

/// `@Multibinds`. Map declarations are keyed like the framework maps contributions use.
pub(crate) fn multibinds_declaration(
    module: &TypeElement,
    member: &MemberMethod,
    binding_type: BindingType,
) -> Result<MultibindingDeclaration, ModelError> {
    if !member.method.parameters.is_empty() {
        return Err(invalid(member, "@Multibinds methods may not have parameters"));
    }
    let site = member.site();
    let qualifier = qualifier_of(&member.method.annotations, &site)?;
    let return_type = &member.method.return_type;
    let (ty, contribution_type) = if return_type.set_element().is_some() {
        (return_type.clone(), ContributionType::Set)
    } else if let Some((key, value)) = return_type.map_entry() {
        let value = TypeRef::wrap(binding_type.framework_type(), value.clone());
        (TypeRef::map_of(key.clone(), value), ContributionType::Map)
    } else {
        return Err(invalid(member, "@Multibinds methods must return a Set or a Map"));
    };
    Ok(MultibindingDeclaration {
        key: Key::qualified(qualifier, ty),
        contribution_type,
        binding_element: site,
        contributing_module: module.ty.clone(),
    })
}

/// `@BindsOptionalOf`
pub(crate) fn optional_declaration(
    module: &TypeElement,
    member: &MemberMethod,
) -> Result<OptionalBindingDeclaration, ModelError> {
    if !member.method.parameters.is_empty() || member.method.return_type.is_void() {
        return Err(invalid(
            member,
            "@BindsOptionalOf methods take no parameters and return a value",
        ));
    }
    let site = member.site();
    let qualifier = qualifier_of(&member.method.annotations, &site)?;
    Ok(OptionalBindingDeclaration {
        key: Key::qualified(qualifier, member.method.return_type.clone()),
        binding_element: site,
        contributing_module: module.ty.clone(),
    })
}

pub(crate) fn subcomponent_declaration(
    module: &TypeRef,
    subcomponent: &TypeRef,
    builder: &TypeRef,
) -> SubcomponentDeclaration {
    SubcomponentDeclaration {
        key: Key::new(builder.clone()),
        subcomponent_type: subcomponent.clone(),
        contributing_module: module.clone(),
    }
}

/// An `@Inject` constructor of `element`, bound for `requested`.
///
/// Generic types keep the unsubstituted binding as `unresolved`.
pub(crate) fn injection_binding(
    element: &TypeElement,
    constructor: &MethodElement,
    requested: &TypeRef,
    has_injected_members: bool,
) -> Result<ContributionBinding, ModelError> {
    let substitution = element.substitution_for(requested);
    let site = SiteRef::of_type(&element.ty);
    let mut dependencies = Vec::with_capacity(constructor.parameters.len() + 1);
    for (index, parameter) in constructor.parameters.iter().enumerate() {
        let mut parameter = parameter.clone();
        parameter.ty = parameter.ty.substitute(&substitution);
        let parameter_site = SiteRef::parameter(&element.ty, &constructor.name, index);
        dependencies.push(DependencyRequest::for_parameter(&parameter, parameter_site)?);
    }
    if has_injected_members {
        dependencies.push(DependencyRequest::for_members_injected_type(
            requested,
            site.clone(),
        ));
    }

    let binding = ContributionBinding::new(
        Key::new(requested.clone()),
        BindingKind::Injection,
        BindingType::Provision,
    )
    .scoped(scope_of(&element.annotations, &site)?)
    .depending_on(dependencies)
    .declared_at(site);

    if requested != &element.ty && element.ty.has_variables() {
        let unresolved =
            injection_binding(element, constructor, &element.ty, has_injected_members)?;
        return Ok(binding.unresolved_from(unresolved));
    }
    Ok(binding)
}

/// Injected fields and methods of `ty` and its superclasses, root class first
pub(crate) fn members_injection_binding(
    model: &dyn ElementModel,
    ty: &TypeRef,
) -> Result<MembersInjectionBinding, ModelError> {
    let mut hierarchy: Vec<(TypeRef, &TypeElement)> = Vec::new();
    let mut current = Some(ty.clone());
    while let Some(current_ty) = current {
        let Some(element) = model.type_element(&current_ty) else {
            break;
        };
        if hierarchy.iter().any(|(seen, _)| seen.erasure() == current_ty.erasure()) {
            break;
        }
        let substitution = element.substitution_for(&current_ty);
        current = element
            .superclass
            .as_ref()
            .map(|superclass| superclass.substitute(&substitution));
        hierarchy.push((current_ty, element));
    }

    let mut sites = Vec::new();
    for (owner, element) in hierarchy.into_iter().rev() {
        let substitution = element.substitution_for(&owner);
        let injected_fields = element
            .fields
            .iter()
            .filter(|f| f.annotations.contains(&Annotation::Inject));
        for field in injected_fields {
            let mut field = field.clone();
            field.ty = field.ty.substitute(&substitution);
            let site = SiteRef::field(&owner, &field.name);
            sites.push(InjectionSite {
                kind: InjectionSiteKind::Field,
                dependencies: vec![DependencyRequest::for_field(&field, site.clone())?],
                element: site,
            });
        }
        for method in element.methods.iter().filter(|m| m.has(&Annotation::Inject)) {
            let member = MemberMethod {
                declaring_type: owner.clone(),
                method: method.clone(),
            };
            let mut dependencies = Vec::new();
            for (index, parameter) in method.parameters.iter().enumerate() {
                let mut parameter = parameter.clone();
                parameter.ty = parameter.ty.substitute(&substitution);
                dependencies.push(DependencyRequest::for_parameter(
                    &parameter,
                    member.parameter_site(index),
                )?);
            }
            sites.push(InjectionSite {
                kind: InjectionSiteKind::Method,
                element: member.site(),
                dependencies,
            });
        }
    }
    Ok(MembersInjectionBinding::new(Key::new(ty.clone()), sites))
}

pub(crate) fn component_binding(component: &TypeRef) -> ContributionBinding {
    ContributionBinding::new(
        Key::new(component.clone()),
        BindingKind::Component,
        BindingType::Provision,
    )
    .declared_at(SiteRef::of_type(component))
}

pub(crate) fn component_dependency_binding(dependency: &TypeRef) -> ContributionBinding {
    ContributionBinding::new(
        Key::new(dependency.clone()),
        BindingKind::ComponentDependency,
        BindingType::Provision,
    )
    .declared_at(SiteRef::of_type(dependency))
}

pub(crate) fn component_method_binding(method: &DependencyMethod) -> ContributionBinding {
    let (kind, binding_type) = match method.is_production {
        true => (BindingKind::ComponentProduction, BindingType::Production),
        false => (BindingKind::ComponentProvision, BindingType::Provision),
    };
    ContributionBinding::new(method.key.clone(), kind, binding_type).declared_at(method.method.clone())
}

pub(crate) fn bound_instance_binding(key: &Key, method: &SiteRef) -> ContributionBinding {
    ContributionBinding::new(key.clone(), BindingKind::BoundInstance, BindingType::Provision)
        .declared_at(method.clone())
}

/// A component method returning a subcomponent builder
pub(crate) fn subcomponent_builder_binding(key: &Key, method: &SiteRef) -> ContributionBinding {
    ContributionBinding::new(
        key.clone(),
        BindingKind::SubcomponentBuilder,
        BindingType::Provision,
    )
    .declared_at(method.clone())
}

/// The builder of a subcomponent declared by one or more modules
pub(crate) fn module_subcomponent_builder_binding(
    declarations: &[Arc<SubcomponentDeclaration>],
) -> Option<ContributionBinding> {
    let declaration = declarations.first()?;
    Some(
        ContributionBinding::new(
            declaration.key.clone(),
            BindingKind::SubcomponentBuilder,
            BindingType::Provision,
        )
        .declared_at(SiteRef::of_type(&declaration.subcomponent_type)),
    )
}

/// The one binding standing for every contribution to a set or map
pub(crate) fn synthetic_multibinding(
    key: &Key,
    contributions: &[Arc<ContributionBinding>],
) -> ContributionBinding {
    let ty = key.ty();
    let kind = match ty.set_element() {
        Some(_) => BindingKind::MultiboundSet,
        None => BindingKind::MultiboundMap,
    };
    let production_values = ty.map_entry().is_some_and(|(_, value)| {
        value.is_type_of(names::PRODUCER) || value.is_type_of(names::PRODUCED)
    });
    let produced_elements = ty
        .set_element()
        .is_some_and(|element| element.is_type_of(names::PRODUCED));
    let binding_type = if contributions.iter().any(|c| c.is_production())
        || production_values
        || produced_elements
    {
        BindingType::Production
    } else {
        BindingType::Provision
    };
    let dependencies = contributions
        .iter()
        .map(|contribution| DependencyRequest::for_multibinding_contribution(key, contribution))
        .collect();
    ContributionBinding::new(key.clone(), kind, binding_type).depending_on(dependencies)
}

/// `Optional<T>`, present when `underlying` is the binding type of `T`
pub(crate) fn synthetic_optional_binding(
    key: &Key,
    underlying: Option<BindingType>,
) -> ContributionBinding {
    match underlying {
        None => ContributionBinding::new(key.clone(), BindingKind::Optional, BindingType::Provision),
        Some(binding_type) => {
            let dependencies = DependencyRequest::for_present_optional(key, binding_type)
                .into_iter()
                .collect();
            ContributionBinding::new(key.clone(), BindingKind::Optional, binding_type)
                .depending_on(dependencies)
        }
    }
}

/// A delegate whose target resolved to a binding of `binding_type`
pub(crate) fn delegate_binding(
    declaration: &DelegateDeclaration,
    binding_type: BindingType,
) -> ContributionBinding {
    let key = match declaration.contribution_type {
        ContributionType::Map => declaration
            .key
            .wrap_map_value(binding_type.framework_type())
            .unwrap_or_else(|| declaration.key.clone()),
        _ => declaration.key.clone(),
    };
    ContributionBinding::new(key, BindingKind::Delegate, binding_type)
        .contribution_type_of(declaration.contribution_type)
        .scoped(declaration.scope.clone())
        .depending_on(vec![declaration.delegate_request.clone()])
        .keyed_by(declaration.map_key.clone())
        .contributed_by(declaration.contributing_module.clone())
        .declared_at(declaration.binding_element.clone())
}

/// A delegate whose target has no binding. The missing binding is then reported
/// where the delegate asked for it.
pub(crate) fn unresolved_delegate_binding(declaration: &DelegateDeclaration) -> ContributionBinding {
    delegate_binding(declaration, BindingType::Provision)
}

/// `MembersInjector<T>`
pub(crate) fn members_injector_binding(
    key: &Key,
    binding: &MembersInjectionBinding,
) -> ContributionBinding {
    let site = SiteRef::of_type(binding.key().ty());
    ContributionBinding::new(key.clone(), BindingKind::MembersInjector, BindingType::Provision)
        .depending_on(vec![DependencyRequest::for_members_injected_type(
            binding.key().ty(),
            site.clone(),
        )])
        .declared_at(site)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{model::ParameterElement, request::RequestKind};

    fn module() -> TypeElement {
        TypeElement::class("M").annotated(Annotation::module(vec![]))
    }

    fn member(method: MethodElement) -> MemberMethod {
        MemberMethod {
            declaring_type: TypeRef::declared("M"),
            method,
        }
    }

    fn foo() -> TypeRef {
        TypeRef::declared("Foo")
    }

    #[test]
    fn into_set_keys_carry_contribution_ids() {
        let method = member(
            MethodElement::new("foo", foo())
                .annotated(Annotation::Provides)
                .annotated(Annotation::IntoSet),
        );
        let binding = provides_method(&module(), &method).unwrap();
        assert_eq!(binding.key().ty(), &TypeRef::set_of(foo()));
        assert_eq!(
            binding.key().contribution_id().map(|id| id.element.clone()),
            Some(method.site())
        );
        assert!(binding.requires_module_instance());
    }

    #[test]
    fn into_map_keys_wrap_values_in_the_framework_type() {
        let method = member(
            MethodElement::new("foo", foo())
                .annotated(Annotation::Produces)
                .annotated(Annotation::IntoMap)
                .annotated(Annotation::MapKey(MapKey::string("a"))),
        );
        let binding = produces_method(&module(), &method).unwrap();
        assert_eq!(
            binding.key().ty().to_string(),
            "Map<String, Producer<Foo>>"
        );
        assert_eq!(binding.binding_type(), BindingType::Production);
    }

    #[test]
    fn into_map_without_map_key_fails() {
        let method = member(
            MethodElement::new("foo", foo())
                .annotated(Annotation::Provides)
                .annotated(Annotation::IntoMap),
        );
        assert_eq!(
            provides_method(&module(), &method).unwrap_err(),
            ModelError::MissingMapKey(method.site())
        );
    }

    #[test]
    fn binds_needs_exactly_one_parameter() {
        let method = member(MethodElement::abstract_method("bind", foo()).annotated(Annotation::Binds));
        assert!(matches!(
            delegate_declaration(&module(), &method),
            Err(ModelError::InvalidBindingMethod { .. })
        ));
    }

    #[test]
    fn generic_injection_keeps_unresolved_binding() {
        let element = TypeElement::generic_class("Box", &["T"]).with_inject_constructor(vec![
            ParameterElement::new("value", TypeRef::provider_of(TypeRef::variable("T"))),
        ]);
        let constructor = element.constructors[0].clone();
        let requested = TypeRef::generic("Box", vec![foo()]);
        let binding = injection_binding(&element, &constructor, &requested, false).unwrap();

        assert_eq!(binding.dependencies()[0].key(), &Key::new(foo()));
        assert_eq!(binding.dependencies()[0].kind(), RequestKind::Provider);
        let unresolved = binding.unresolved().unwrap();
        assert_eq!(unresolved.key().ty(), &element.ty);
        assert!(unresolved.unresolved().is_none());
    }

    #[test]
    fn multibinding_with_a_production_contribution_is_production() {
        let key = Key::new(TypeRef::set_of(foo()));
        let provision = Arc::new(
            ContributionBinding::new(key.clone(), BindingKind::Provision, BindingType::Provision)
                .contribution_type_of(ContributionType::Set),
        );
        let production = Arc::new(
            ContributionBinding::new(key.clone(), BindingKind::Production, BindingType::Production)
                .contribution_type_of(ContributionType::Set),
        );

        let binding = synthetic_multibinding(&key, &[provision.clone()]);
        assert_eq!(binding.binding_type(), BindingType::Provision);
        assert_eq!(binding.dependencies().len(), 1);

        let binding = synthetic_multibinding(&key, &[provision, production]);
        assert_eq!(binding.binding_type(), BindingType::Production);
        assert_eq!(binding.kind(), BindingKind::MultiboundSet);
    }
}
