use std::{
    hash::{Hash, Hasher},
    sync::Arc,
};

use indexmap::{IndexMap, IndexSet};

use crate::{
    errors::ModelError,
    key::Key,
    model::{
        all_methods, is_object_method, qualifier_of, unimplemented_methods, Annotation,
        ElementModel, MemberMethod, TypeElement,
    },
    module::{ModuleDescriptor, ModuleDescriptorFactory},
    request::{DependencyRequest, RequestKind},
    types::{names, Scope, SiteRef, TypeRef},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentKind {
    Component,
    Subcomponent,
    ProductionComponent,
    ProductionSubcomponent,
}
impl ComponentKind {
    pub fn is_top_level(self) -> bool {
        matches!(
            self,
            ComponentKind::Component | ComponentKind::ProductionComponent
        )
    }

    pub fn is_producer(self) -> bool {
        matches!(
            self,
            ComponentKind::ProductionComponent | ComponentKind::ProductionSubcomponent
        )
    }

    /// Kind, modules and dependencies declared by a component annotation
    fn of(annotation: &Annotation) -> Option<(ComponentKind, &[TypeRef], &[TypeRef])> {
        let none: &[TypeRef] = &[];
        match annotation {
            Annotation::Component {
                modules,
                dependencies,
            } => Some((ComponentKind::Component, modules.as_slice(), dependencies.as_slice())),
            Annotation::ProductionComponent {
                modules,
                dependencies,
            } => Some((
                ComponentKind::ProductionComponent,
                modules.as_slice(),
                dependencies.as_slice(),
            )),
            Annotation::Subcomponent { modules } => {
                Some((ComponentKind::Subcomponent, modules.as_slice(), none))
            }
            Annotation::ProductionSubcomponent { modules } => {
                Some((ComponentKind::ProductionSubcomponent, modules.as_slice(), none))
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentMethodKind {
    Provision,
    Production,
    MembersInjection,
    Subcomponent,
    SubcomponentBuilder,
}

/// An abstract method of a component and what it asks for
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ComponentMethodDescriptor {
    pub kind: ComponentMethodKind,
    /// Absent for subcomponent factory methods
    pub request: Option<DependencyRequest>,
    pub method: SiteRef,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentRequirementKind {
    Dependency,
    Module,
    BoundInstance,
}

/// Something the instantiator of a component must supply
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ComponentRequirement {
    pub kind: ComponentRequirementKind,
    pub ty: TypeRef,
    /// The bound key, for bound instances
    pub key: Option<Key>,
}
impl ComponentRequirement {
    pub fn module(ty: TypeRef) -> Self {
        Self {
            kind: ComponentRequirementKind::Module,
            ty,
            key: None,
        }
    }

    pub fn dependency(ty: TypeRef) -> Self {
        Self {
            kind: ComponentRequirementKind::Dependency,
            ty,
            key: None,
        }
    }

    pub fn bound_instance(key: Key) -> Self {
        Self {
            kind: ComponentRequirementKind::BoundInstance,
            ty: key.ty().clone(),
            key: Some(key),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuilderRequirementMethod {
    pub method: SiteRef,
    pub requirement: ComponentRequirement,
}

/// The nested builder of a component
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuilderSpec {
    pub builder_type: TypeRef,
    pub build_method: Option<SiteRef>,
    pub requirement_methods: Vec<BuilderRequirementMethod>,
}

/// A contribution method of a component dependency
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyMethod {
    pub dependency: TypeRef,
    pub method: SiteRef,
    pub key: Key,
    pub is_production: bool,
}

/// A component and, recursively, its subcomponents. Equal by component type.
#[derive(Debug, Clone)]
pub struct ComponentDescriptor {
    kind: ComponentKind,
    component_type: TypeRef,
    scopes: IndexSet<Scope>,
    dependencies: IndexSet<TypeRef>,
    dependency_methods: Vec<DependencyMethod>,
    modules: IndexSet<Arc<ModuleDescriptor>>,
    transitive_modules: IndexSet<Arc<ModuleDescriptor>>,
    component_methods: Vec<ComponentMethodDescriptor>,
    subcomponents: IndexMap<ComponentMethodDescriptor, Arc<ComponentDescriptor>>,
    subcomponents_from_modules: Vec<Arc<ComponentDescriptor>>,
    builder_spec: Option<BuilderSpec>,
    errors: Vec<ModelError>,
}

impl PartialEq for ComponentDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.component_type == other.component_type
    }
}
impl Eq for ComponentDescriptor {}
impl Hash for ComponentDescriptor {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.component_type.hash(state);
    }
}

impl ComponentDescriptor {
    pub fn kind(&self) -> ComponentKind {
        self.kind
    }

    pub fn component_type(&self) -> &TypeRef {
        &self.component_type
    }

    pub fn scopes(&self) -> &IndexSet<Scope> {
        &self.scopes
    }

    pub fn dependencies(&self) -> &IndexSet<TypeRef> {
        &self.dependencies
    }

    pub fn dependency_methods(&self) -> &[DependencyMethod] {
        &self.dependency_methods
    }

    /// Modules named on the component annotation
    pub fn modules(&self) -> &IndexSet<Arc<ModuleDescriptor>> {
        &self.modules
    }

    /// `modules` and everything they include
    pub fn transitive_modules(&self) -> &IndexSet<Arc<ModuleDescriptor>> {
        &self.transitive_modules
    }

    pub fn component_methods(&self) -> &[ComponentMethodDescriptor] {
        &self.component_methods
    }

    /// Subcomponents by the factory or builder method that creates them, in declaration order
    pub fn subcomponents(&self) -> &IndexMap<ComponentMethodDescriptor, Arc<ComponentDescriptor>> {
        &self.subcomponents
    }

    /// Subcomponents declared by `@Module(subcomponents = ..)`
    pub fn subcomponents_from_modules(&self) -> &[Arc<ComponentDescriptor>] {
        &self.subcomponents_from_modules
    }

    pub fn builder_spec(&self) -> Option<&BuilderSpec> {
        self.builder_spec.as_ref()
    }

    pub fn errors(&self) -> &[ModelError] {
        &self.errors
    }

    pub fn is_production(&self) -> bool {
        self.kind.is_producer()
    }

    /// Requests made by the component methods
    pub fn entry_points(&self) -> impl Iterator<Item = &DependencyRequest> {
        self.component_methods
            .iter()
            .filter_map(|method| method.request.as_ref())
    }

    /// Keys bound by `@BindsInstance` builder methods, with the method binding each
    pub fn bound_instances(&self) -> impl Iterator<Item = (&Key, &SiteRef)> {
        self.builder_spec
            .iter()
            .flat_map(|spec| spec.requirement_methods.iter())
            .filter_map(|m| m.requirement.key.as_ref().map(|key| (key, &m.method)))
    }

    /// The child component built by `builder`
    pub fn subcomponent_for_builder(&self, builder: &TypeRef) -> Option<&Arc<ComponentDescriptor>> {
        self.subcomponents
            .values()
            .chain(&self.subcomponents_from_modules)
            .find(|child| {
                child
                    .builder_spec
                    .as_ref()
                    .is_some_and(|spec| &spec.builder_type == builder)
            })
    }
}

/// Builds component descriptors. Subcomponents are built eagerly with their parent.
pub struct ComponentDescriptorFactory<'m> {
    model: &'m dyn ElementModel,
    modules: ModuleDescriptorFactory<'m>,
    in_progress: Vec<TypeRef>,
}

impl<'m> ComponentDescriptorFactory<'m> {
    pub fn new(model: &'m dyn ElementModel) -> Self {
        Self {
            model,
            modules: ModuleDescriptorFactory::new(model),
            in_progress: Vec::new(),
        }
    }

    pub fn module_factory(&mut self) -> &mut ModuleDescriptorFactory<'m> {
        &mut self.modules
    }

    /// Describes the root component `ty`
    pub fn for_component(&mut self, ty: &TypeRef) -> Result<Arc<ComponentDescriptor>, ModelError> {
        let element = self
            .model
            .type_element(ty)
            .ok_or_else(|| ModelError::UnknownType(ty.clone()))?;
        let kinds: Vec<_> = element
            .annotations
            .iter()
            .filter_map(ComponentKind::of)
            .collect();
        let [(kind, _, _)] = kinds.as_slice() else {
            return Err(ModelError::ComponentAnnotation {
                ty: ty.clone(),
                found: kinds.len(),
            });
        };
        if !kind.is_top_level() {
            return Err(ModelError::NotTopLevelComponent(ty.clone()));
        }
        self.create(ty)
    }

    fn create(&mut self, ty: &TypeRef) -> Result<Arc<ComponentDescriptor>, ModelError> {
        if self.in_progress.contains(ty) {
            return Err(ModelError::SubcomponentCycle(ty.clone()));
        }
        let model = self.model;
        let element = model
            .type_element(ty)
            .ok_or_else(|| ModelError::UnknownType(ty.clone()))?;
        let Some((kind, modules, dependencies)) =
            element.annotations.iter().find_map(ComponentKind::of)
        else {
            return Err(ModelError::ComponentAnnotation {
                ty: ty.clone(),
                found: 0,
            });
        };

        self.in_progress.push(ty.clone());
        let descriptor = self.build(element, ty, kind, modules, dependencies);
        self.in_progress.pop();

        tracing::debug!(
            "Described component '{}' with {} methods and {} subcomponents",
            ty,
            descriptor.component_methods.len(),
            descriptor.subcomponents.len() + descriptor.subcomponents_from_modules.len()
        );
        Ok(Arc::new(descriptor))
    }

    fn build(
        &mut self,
        element: &TypeElement,
        ty: &TypeRef,
        kind: ComponentKind,
        module_types: &[TypeRef],
        dependency_types: &[TypeRef],
    ) -> ComponentDescriptor {
        let mut errors = Vec::new();

        let mut scopes: IndexSet<Scope> = element
            .annotations
            .iter()
            .filter_map(|a| match a {
                Annotation::Scope(scope) => Some(scope.clone()),
                _ => None,
            })
            .collect();
        if kind.is_producer() {
            scopes.insert(Scope::production());
        }

        let mut modules = IndexSet::new();
        for module in module_types {
            match self.modules.create(module) {
                Ok(descriptor) => {
                    modules.insert(descriptor);
                }
                Err(error) => errors.push(error),
            }
        }
        let transitive_modules = ModuleDescriptor::transitive_closure(&modules);

        let dependencies: IndexSet<TypeRef> = dependency_types.iter().cloned().collect();
        let dependency_methods = self.dependency_methods(kind, &dependencies, &mut errors);

        let mut component_methods = Vec::new();
        let mut subcomponents = IndexMap::new();
        for member in unimplemented_methods(self.model, ty) {
            let (descriptor, child) = match self.classify(kind, &member) {
                Ok(classified) => classified,
                Err(error) => {
                    tracing::warn!("Skipping component method: {}", error);
                    errors.push(error);
                    continue;
                }
            };
            if let Some(child) = child {
                match self.create(&child) {
                    Ok(child) => {
                        subcomponents.insert(descriptor.clone(), child);
                    }
                    Err(error) => {
                        errors.push(error);
                        continue;
                    }
                }
            }
            component_methods.push(descriptor);
        }

        let builder_spec = self.builder_spec(ty, &mut errors);

        let mut subcomponents_from_modules: Vec<Arc<ComponentDescriptor>> = Vec::new();
        let declared = transitive_modules
            .iter()
            .flat_map(|m| m.subcomponent_declarations().iter());
        for declaration in declared {
            let subcomponent = &declaration.subcomponent_type;
            let known = subcomponents_from_modules
                .iter()
                .any(|c| &c.component_type == subcomponent);
            if known {
                continue;
            }
            match self.create(subcomponent) {
                Ok(child) => subcomponents_from_modules.push(child),
                Err(error) => errors.push(error),
            }
        }

        ComponentDescriptor {
            kind,
            component_type: ty.clone(),
            scopes,
            dependencies,
            dependency_methods,
            modules,
            transitive_modules,
            component_methods,
            subcomponents,
            subcomponents_from_modules,
            builder_spec,
            errors,
        }
    }

    fn dependency_methods(
        &self,
        kind: ComponentKind,
        dependencies: &IndexSet<TypeRef>,
        errors: &mut Vec<ModelError>,
    ) -> Vec<DependencyMethod> {
        let mut methods = Vec::new();
        for dependency in dependencies {
            if self.model.type_element(dependency).is_none() {
                errors.push(ModelError::UnknownType(dependency.clone()));
                continue;
            }
            for member in all_methods(self.model, dependency) {
                if !is_component_contribution_method(&member) {
                    continue;
                }
                let is_production =
                    kind.is_producer() && member.method.return_type.is_type_of(names::FUTURE);
                let request = match is_production {
                    true => DependencyRequest::for_component_production_method(&member),
                    false => DependencyRequest::for_component_provision_method(&member),
                };
                match request {
                    Ok(request) => methods.push(DependencyMethod {
                        dependency: dependency.clone(),
                        method: member.site(),
                        key: request.key().clone(),
                        is_production,
                    }),
                    Err(error) => errors.push(error),
                }
            }
        }
        methods
    }

    /// Classifies a component method. Subcomponent methods also return the child type.
    fn classify(
        &self,
        kind: ComponentKind,
        member: &MemberMethod,
    ) -> Result<(ComponentMethodDescriptor, Option<TypeRef>), ModelError> {
        let site = member.site();
        let method = &member.method;
        let return_type = &method.return_type;
        let descriptor = |kind, request| ComponentMethodDescriptor {
            kind,
            request,
            method: site.clone(),
        };

        if return_type.is_type_of(names::PROVIDER) || return_type.is_type_of(names::LAZY) {
            let request = DependencyRequest::for_component_provision_method(member)?;
            return Ok((descriptor(ComponentMethodKind::Provision, Some(request)), None));
        }
        if return_type.is_type_of(names::MEMBERS_INJECTOR) {
            let request = DependencyRequest::for_members_injector_method(member)?;
            return Ok((
                descriptor(ComponentMethodKind::MembersInjection, Some(request)),
                None,
            ));
        }

        let qualifier = qualifier_of(&method.annotations, &site)?;
        if let Some(returned) = self.model.type_element(return_type) {
            if qualifier.is_none() && returned.is_subcomponent() {
                return Ok((
                    descriptor(ComponentMethodKind::Subcomponent, None),
                    Some(return_type.clone()),
                ));
            }
            if returned.has(&Annotation::SubcomponentBuilder) {
                let Some(subcomponent) = returned.enclosing.clone() else {
                    return Err(ModelError::InvalidComponentMethod {
                        method: site,
                        reason: "the returned builder is not nested in a subcomponent".to_string(),
                    });
                };
                let request =
                    DependencyRequest::new(Key::new(return_type.clone()), RequestKind::Instance)
                        .with_origin(site.clone());
                return Ok((
                    descriptor(ComponentMethodKind::SubcomponentBuilder, Some(request)),
                    Some(subcomponent),
                ));
            }
        }

        let parameters = &method.parameters;
        if parameters.is_empty() && !return_type.is_void() {
            let (kind, request) = match kind.is_producer() {
                true => (
                    ComponentMethodKind::Production,
                    DependencyRequest::for_component_production_method(member)?,
                ),
                false => (
                    ComponentMethodKind::Provision,
                    DependencyRequest::for_component_provision_method(member)?,
                ),
            };
            return Ok((descriptor(kind, Some(request)), None));
        }
        if let [parameter] = parameters.as_slice() {
            if return_type.is_void() || return_type == &parameter.ty {
                let request = DependencyRequest::for_component_members_injection_method(member)?;
                return Ok((
                    descriptor(ComponentMethodKind::MembersInjection, Some(request)),
                    None,
                ));
            }
        }
        Err(ModelError::InvalidComponentMethod {
            method: site,
            reason: format!(
                "{} parameters returning '{}' is neither a provision nor a members injection",
                parameters.len(),
                return_type
            ),
        })
    }

    fn builder_spec(&self, ty: &TypeRef, errors: &mut Vec<ModelError>) -> Option<BuilderSpec> {
        let builders: Vec<&TypeElement> = self
            .model
            .enclosed_types(ty)
            .into_iter()
            .filter(|t| {
                t.has(&Annotation::ComponentBuilder) || t.has(&Annotation::SubcomponentBuilder)
            })
            .collect();
        if builders.len() > 1 {
            errors.push(ModelError::MultipleBuilders(ty.clone()));
        }
        let builder = builders.first()?;

        let mut spec = BuilderSpec {
            builder_type: builder.ty.clone(),
            build_method: None,
            requirement_methods: Vec::new(),
        };
        for member in unimplemented_methods(self.model, &builder.ty) {
            let site = member.site();
            match member.method.parameters.as_slice() {
                [] if &member.method.return_type == ty => spec.build_method = Some(site),
                [parameter] => {
                    let binds_instance = member.method.has(&Annotation::BindsInstance)
                        || parameter.annotations.contains(&Annotation::BindsInstance);
                    let requirement = if binds_instance {
                        let qualifier = qualifier_of(&parameter.annotations, &site)
                            .and_then(|q| match q {
                                Some(q) => Ok(Some(q)),
                                None => qualifier_of(&member.method.annotations, &site),
                            });
                        match qualifier {
                            Ok(qualifier) => ComponentRequirement::bound_instance(Key::qualified(
                                qualifier,
                                parameter.ty.clone(),
                            )),
                            Err(error) => {
                                errors.push(error);
                                continue;
                            }
                        }
                    } else if self
                        .model
                        .type_element(&parameter.ty)
                        .is_some_and(TypeElement::is_module)
                    {
                        ComponentRequirement::module(parameter.ty.clone())
                    } else {
                        ComponentRequirement::dependency(parameter.ty.clone())
                    };
                    spec.requirement_methods.push(BuilderRequirementMethod {
                        method: site,
                        requirement,
                    });
                }
                _ => errors.push(ModelError::InvalidComponentMethod {
                    method: site,
                    reason: "builder methods set one requirement or build the component"
                        .to_string(),
                }),
            }
        }
        Some(spec)
    }
}

/// Zero parameters, a return value and not one of the root object's methods
pub fn is_component_contribution_method(member: &MemberMethod) -> bool {
    member.method.parameters.is_empty()
        && !member.method.return_type.is_void()
        && !is_object_method(&member.method.name)
        && !member.declaring_type.is_type_of(names::OBJECT)
}
