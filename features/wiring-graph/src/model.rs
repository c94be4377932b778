use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

use indexmap::IndexMap;

use crate::{
    errors::ModelError,
    types::{MapKey, Qualifier, Scope, SiteRef, TypeRef},
};

//////////////////////////////////////////////////////////////////////
///
/// The source model is what a front end hands to the resolver:
/// types with their annotations, constructors, methods and fields.
/// Anything able to answer `ElementModel` can drive resolution.

/// Annotations the resolver understands
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Annotation {
    Component {
        modules: Vec<TypeRef>,
        dependencies: Vec<TypeRef>,
    },
    ProductionComponent {
        modules: Vec<TypeRef>,
        dependencies: Vec<TypeRef>,
    },
    Subcomponent {
        modules: Vec<TypeRef>,
    },
    ProductionSubcomponent {
        modules: Vec<TypeRef>,
    },
    ComponentBuilder,
    SubcomponentBuilder,
    Module {
        includes: Vec<TypeRef>,
        subcomponents: Vec<TypeRef>,
    },
    ProducerModule {
        includes: Vec<TypeRef>,
        subcomponents: Vec<TypeRef>,
    },
    Inject,
    Provides,
    Produces,
    Binds,
    Multibinds,
    BindsOptionalOf,
    BindsInstance,
    IntoSet,
    ElementsIntoSet,
    IntoMap,
    MapKey(MapKey),
    Qualifier(Qualifier),
    Scope(Scope),
}
impl Annotation {
    pub fn component(modules: Vec<TypeRef>) -> Self {
        Annotation::Component {
            modules,
            dependencies: Vec::new(),
        }
    }

    pub fn subcomponent(modules: Vec<TypeRef>) -> Self {
        Annotation::Subcomponent { modules }
    }

    pub fn module(includes: Vec<TypeRef>) -> Self {
        Annotation::Module {
            includes,
            subcomponents: Vec::new(),
        }
    }

    pub fn named(value: &str) -> Self {
        Annotation::Qualifier(Qualifier::named(value))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterElement {
    pub name: Arc<str>,
    pub ty: TypeRef,
    pub annotations: Vec<Annotation>,
}
impl ParameterElement {
    pub fn new(name: &str, ty: TypeRef) -> Self {
        Self {
            name: Arc::from(name),
            ty,
            annotations: Vec::new(),
        }
    }

    pub fn annotated(mut self, annotation: Annotation) -> Self {
        self.annotations.push(annotation);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldElement {
    pub name: Arc<str>,
    pub ty: TypeRef,
    pub annotations: Vec<Annotation>,
}
impl FieldElement {
    pub fn new(name: &str, ty: TypeRef) -> Self {
        Self {
            name: Arc::from(name),
            ty,
            annotations: Vec::new(),
        }
    }

    pub fn annotated(mut self, annotation: Annotation) -> Self {
        self.annotations.push(annotation);
        self
    }
}

/// A method or constructor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodElement {
    pub name: Arc<str>,
    pub parameters: Vec<ParameterElement>,
    pub return_type: TypeRef,
    pub annotations: Vec<Annotation>,
    pub is_abstract: bool,
    pub is_static: bool,
}
impl MethodElement {
    pub const CONSTRUCTOR: &'static str = "<init>";

    pub fn new(name: &str, return_type: TypeRef) -> Self {
        Self {
            name: Arc::from(name),
            parameters: Vec::new(),
            return_type,
            annotations: Vec::new(),
            is_abstract: false,
            is_static: false,
        }
    }

    pub fn abstract_method(name: &str, return_type: TypeRef) -> Self {
        Self {
            is_abstract: true,
            ..Self::new(name, return_type)
        }
    }

    pub fn constructor() -> Self {
        Self::new(Self::CONSTRUCTOR, TypeRef::Void)
    }

    pub fn with_param(self, name: &str, ty: TypeRef) -> Self {
        self.with_parameter(ParameterElement::new(name, ty))
    }

    pub fn with_parameter(mut self, parameter: ParameterElement) -> Self {
        self.parameters.push(parameter);
        self
    }

    pub fn annotated(mut self, annotation: Annotation) -> Self {
        self.annotations.push(annotation);
        self
    }

    pub fn static_method(mut self) -> Self {
        self.is_static = true;
        self
    }

    pub fn has(&self, annotation: &Annotation) -> bool {
        self.annotations.contains(annotation)
    }

    /// Same name and parameter types
    pub fn overrides(&self, other: &MethodElement) -> bool {
        self.name == other.name
            && self.parameters.len() == other.parameters.len()
            && self
                .parameters
                .iter()
                .zip(&other.parameters)
                .all(|(a, b)| a.ty == b.ty)
    }

    fn substitute(&self, bindings: &HashMap<Arc<str>, TypeRef>) -> MethodElement {
        let mut method = self.clone();
        method.return_type = self.return_type.substitute(bindings);
        for parameter in &mut method.parameters {
            parameter.ty = parameter.ty.substitute(bindings);
        }
        method
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeElement {
    /// The declared type, with its type parameters as variables
    pub ty: TypeRef,
    pub superclass: Option<TypeRef>,
    pub interfaces: Vec<TypeRef>,
    pub enclosing: Option<TypeRef>,
    pub is_abstract: bool,
    pub annotations: Vec<Annotation>,
    pub constructors: Vec<MethodElement>,
    pub methods: Vec<MethodElement>,
    pub fields: Vec<FieldElement>,
}
impl TypeElement {
    pub fn class(name: &str) -> Self {
        Self::of(TypeRef::declared(name))
    }

    pub fn generic_class(name: &str, parameters: &[&str]) -> Self {
        Self::of(TypeRef::generic(
            name,
            parameters.iter().map(|p| TypeRef::variable(p)).collect(),
        ))
    }

    pub fn interface(name: &str) -> Self {
        Self {
            is_abstract: true,
            ..Self::class(name)
        }
    }

    fn of(ty: TypeRef) -> Self {
        Self {
            ty,
            superclass: None,
            interfaces: Vec::new(),
            enclosing: None,
            is_abstract: false,
            annotations: Vec::new(),
            constructors: Vec::new(),
            methods: Vec::new(),
            fields: Vec::new(),
        }
    }

    pub fn annotated(mut self, annotation: Annotation) -> Self {
        self.annotations.push(annotation);
        self
    }

    pub fn extends(mut self, superclass: TypeRef) -> Self {
        self.superclass = Some(superclass);
        self
    }

    pub fn implements(mut self, interface: TypeRef) -> Self {
        self.interfaces.push(interface);
        self
    }

    pub fn enclosed_in(mut self, enclosing: TypeRef) -> Self {
        self.enclosing = Some(enclosing);
        self
    }

    pub fn abstract_type(mut self) -> Self {
        self.is_abstract = true;
        self
    }

    pub fn with_constructor(mut self, constructor: MethodElement) -> Self {
        self.constructors.push(constructor);
        self
    }

    /// Adds an `@Inject` constructor taking `parameters`
    pub fn with_inject_constructor(self, parameters: Vec<ParameterElement>) -> Self {
        let mut constructor = MethodElement::constructor().annotated(Annotation::Inject);
        constructor.parameters = parameters;
        self.with_constructor(constructor)
    }

    pub fn with_method(mut self, method: MethodElement) -> Self {
        self.methods.push(method);
        self
    }

    pub fn with_field(mut self, field: FieldElement) -> Self {
        self.fields.push(field);
        self
    }

    pub fn has(&self, annotation: &Annotation) -> bool {
        self.annotations.contains(annotation)
    }

    pub fn name(&self) -> &str {
        self.ty.name().unwrap_or_default()
    }

    /// Maps this element's type parameters onto the arguments of `ty`
    pub fn substitution_for(&self, ty: &TypeRef) -> HashMap<Arc<str>, TypeRef> {
        self.ty
            .args()
            .iter()
            .zip(ty.args())
            .filter_map(|(parameter, argument)| match parameter {
                TypeRef::Variable(name) => Some((name.clone(), argument.clone())),
                _ => None,
            })
            .collect()
    }

    pub fn is_subcomponent(&self) -> bool {
        self.annotations.iter().any(|a| {
            matches!(
                a,
                Annotation::Subcomponent { .. } | Annotation::ProductionSubcomponent { .. }
            )
        })
    }

    pub fn is_module(&self) -> bool {
        self.annotations
            .iter()
            .any(|a| matches!(a, Annotation::Module { .. } | Annotation::ProducerModule { .. }))
    }
}

/// Read access to the declared types of a program
pub trait ElementModel {
    /// The element declaring `ty`, ignoring type arguments
    fn type_element(&self, ty: &TypeRef) -> Option<&TypeElement>;

    /// Types declared inside `ty`
    fn enclosed_types(&self, ty: &TypeRef) -> Vec<&TypeElement>;
}

/// A method as a member of some type, with type variables substituted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberMethod {
    pub declaring_type: TypeRef,
    pub method: MethodElement,
}
impl MemberMethod {
    pub fn site(&self) -> SiteRef {
        SiteRef::method(&self.declaring_type, &self.method.name)
    }

    pub fn parameter_site(&self, index: usize) -> SiteRef {
        SiteRef::parameter(&self.declaring_type, &self.method.name, index)
    }
}

/// Methods of `ty` and its supertypes, most derived first. Overridden methods are left out.
pub fn all_methods(model: &dyn ElementModel, ty: &TypeRef) -> Vec<MemberMethod> {
    let mut methods: Vec<MemberMethod> = Vec::new();
    for member in hierarchy_methods(model, ty) {
        if !methods.iter().any(|m| m.method.overrides(&member.method)) {
            methods.push(member);
        }
    }
    methods
}

/// Abstract methods of `ty` for which no concrete override exists anywhere in its hierarchy
pub fn unimplemented_methods(model: &dyn ElementModel, ty: &TypeRef) -> Vec<MemberMethod> {
    let members = hierarchy_methods(model, ty);
    let mut unimplemented: Vec<MemberMethod> = Vec::new();
    for member in &members {
        if !member.method.is_abstract {
            continue;
        }
        let implemented = members
            .iter()
            .any(|m| !m.method.is_abstract && m.method.overrides(&member.method));
        let seen = unimplemented
            .iter()
            .any(|m| m.method.overrides(&member.method));
        if !implemented && !seen {
            unimplemented.push(member.clone());
        }
    }
    unimplemented
}

/// Methods inherited from the root object type
pub fn is_object_method(name: &str) -> bool {
    matches!(
        name,
        "toString" | "hashCode" | "equals" | "clone" | "getClass" | "finalize"
    )
}

fn hierarchy_methods(model: &dyn ElementModel, ty: &TypeRef) -> Vec<MemberMethod> {
    let mut methods = Vec::new();
    let mut visited = HashSet::new();
    collect(model, ty, &mut methods, &mut visited);
    return methods;

    fn collect(
        model: &dyn ElementModel,
        ty: &TypeRef,
        methods: &mut Vec<MemberMethod>,
        visited: &mut HashSet<TypeRef>,
    ) {
        let Some(element) = model.type_element(ty) else {
            return;
        };
        if !visited.insert(ty.erasure()) {
            return;
        }
        let substitution = element.substitution_for(ty);
        for method in &element.methods {
            methods.push(MemberMethod {
                declaring_type: ty.clone(),
                method: method.substitute(&substitution),
            });
        }
        for supertype in element.superclass.iter().chain(&element.interfaces) {
            collect(model, &supertype.substitute(&substitution), methods, visited);
        }
    }
}

/// Reads the single qualifier of a site
pub fn qualifier_of(
    annotations: &[Annotation],
    site: &SiteRef,
) -> Result<Option<Qualifier>, ModelError> {
    let mut qualifiers = annotations.iter().filter_map(|a| match a {
        Annotation::Qualifier(q) => Some(q.clone()),
        _ => None,
    });
    let first = qualifiers.next();
    let rest: Vec<_> = qualifiers.collect();
    if rest.is_empty() {
        return Ok(first);
    }
    Err(ModelError::MultipleQualifiers {
        site: site.clone(),
        qualifiers: first.into_iter().chain(rest).collect(),
    })
}

/// Reads the single scope of a site
pub fn scope_of(annotations: &[Annotation], site: &SiteRef) -> Result<Option<Scope>, ModelError> {
    let scopes: Vec<Scope> = annotations
        .iter()
        .filter_map(|a| match a {
            Annotation::Scope(s) => Some(s.clone()),
            _ => None,
        })
        .collect();
    match scopes.len() {
        0 | 1 => Ok(scopes.into_iter().next()),
        _ => Err(ModelError::MultipleScopes {
            site: site.clone(),
            scopes,
        }),
    }
}

pub fn map_key_of(annotations: &[Annotation], site: &SiteRef) -> Result<Option<MapKey>, ModelError> {
    let keys: Vec<MapKey> = annotations
        .iter()
        .filter_map(|a| match a {
            Annotation::MapKey(k) => Some(k.clone()),
            _ => None,
        })
        .collect();
    match keys.len() {
        0 | 1 => Ok(keys.into_iter().next()),
        _ => Err(ModelError::MultipleMapKeys {
            site: site.clone(),
            keys,
        }),
    }
}

/// An in-memory element model
#[derive(Debug, Clone, Default)]
pub struct SourceModel {
    types: IndexMap<Arc<str>, TypeElement>,
}
impl SourceModel {
    pub fn builder() -> SourceModelBuilder {
        SourceModelBuilder::new()
    }

    pub fn types(&self) -> impl Iterator<Item = &TypeElement> {
        self.types.values()
    }
}
impl ElementModel for SourceModel {
    fn type_element(&self, ty: &TypeRef) -> Option<&TypeElement> {
        self.types.get(ty.name()?)
    }

    fn enclosed_types(&self, ty: &TypeRef) -> Vec<&TypeElement> {
        let erasure = ty.erasure();
        self.types
            .values()
            .filter(|t| t.enclosing.as_ref().map(TypeRef::erasure).as_ref() == Some(&erasure))
            .collect()
    }
}

pub struct SourceModelBuilder {
    types: IndexMap<Arc<str>, TypeElement>,
    duplicates: Vec<TypeRef>,
}
impl Default for SourceModelBuilder {
    fn default() -> Self {
        Self::new()
    }
}
impl SourceModelBuilder {
    pub fn new() -> Self {
        SourceModelBuilder {
            types: IndexMap::new(),
            duplicates: Vec::new(),
        }
    }

    pub fn add_type(mut self, element: TypeElement) -> Self {
        let name: Arc<str> = Arc::from(element.name());
        if let Some(existing) = self.types.insert(name, element) {
            self.duplicates.push(existing.ty.erasure());
        }
        self
    }

    pub fn build(self) -> Result<SourceModel, ModelError> {
        if let Some(duplicate) = self.duplicates.into_iter().next() {
            return Err(ModelError::DuplicateType(duplicate));
        }
        Ok(SourceModel { types: self.types })
    }
}
