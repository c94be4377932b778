use std::{collections::HashMap, fmt::Display, sync::Arc};

/// Names of the framework types the resolver gives meaning to
pub mod names {
    pub const OBJECT: &str = "Object";
    pub const PROVIDER: &str = "Provider";
    pub const LAZY: &str = "Lazy";
    pub const PRODUCER: &str = "Producer";
    pub const PRODUCED: &str = "Produced";
    pub const FUTURE: &str = "Future";
    pub const MEMBERS_INJECTOR: &str = "MembersInjector";
    pub const SET: &str = "Set";
    pub const MAP: &str = "Map";
    pub const OPTIONAL: &str = "Optional";
    pub const NAMED: &str = "Named";
    pub const REUSABLE: &str = "Reusable";
    pub const SINGLETON: &str = "Singleton";
    pub const PRODUCTION_SCOPE: &str = "ProductionScope";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Primitive {
    Boolean,
    Byte,
    Short,
    Char,
    Int,
    Long,
    Float,
    Double,
}
impl Primitive {
    /// Name of the reference type a primitive is boxed to
    pub fn boxed_name(self) -> &'static str {
        match self {
            Primitive::Boolean => "Boolean",
            Primitive::Byte => "Byte",
            Primitive::Short => "Short",
            Primitive::Char => "Character",
            Primitive::Int => "Integer",
            Primitive::Long => "Long",
            Primitive::Float => "Float",
            Primitive::Double => "Double",
        }
    }

    fn keyword(self) -> &'static str {
        match self {
            Primitive::Boolean => "boolean",
            Primitive::Byte => "byte",
            Primitive::Short => "short",
            Primitive::Char => "char",
            Primitive::Int => "int",
            Primitive::Long => "long",
            Primitive::Float => "float",
            Primitive::Double => "double",
        }
    }
}

/// A structurally comparable reference to a type.
///
/// Two references naming the same declared type with equal arguments are equal,
/// no matter where they were obtained.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TypeRef {
    Void,
    Primitive(Primitive),
    Declared { name: Arc<str>, args: Vec<TypeRef> },
    Variable(Arc<str>),
}

impl TypeRef {
    pub fn declared(name: &str) -> Self {
        TypeRef::Declared {
            name: Arc::from(name),
            args: Vec::new(),
        }
    }

    pub fn generic(name: &str, args: Vec<TypeRef>) -> Self {
        TypeRef::Declared {
            name: Arc::from(name),
            args,
        }
    }

    pub fn variable(name: &str) -> Self {
        TypeRef::Variable(Arc::from(name))
    }

    pub fn wrap(wrapper: &str, inner: TypeRef) -> Self {
        Self::generic(wrapper, vec![inner])
    }

    pub fn set_of(element: TypeRef) -> Self {
        Self::wrap(names::SET, element)
    }

    pub fn map_of(key: TypeRef, value: TypeRef) -> Self {
        Self::generic(names::MAP, vec![key, value])
    }

    pub fn provider_of(inner: TypeRef) -> Self {
        Self::wrap(names::PROVIDER, inner)
    }

    pub fn lazy_of(inner: TypeRef) -> Self {
        Self::wrap(names::LAZY, inner)
    }

    pub fn producer_of(inner: TypeRef) -> Self {
        Self::wrap(names::PRODUCER, inner)
    }

    pub fn produced_of(inner: TypeRef) -> Self {
        Self::wrap(names::PRODUCED, inner)
    }

    pub fn optional_of(inner: TypeRef) -> Self {
        Self::wrap(names::OPTIONAL, inner)
    }

    pub fn future_of(inner: TypeRef) -> Self {
        Self::wrap(names::FUTURE, inner)
    }

    pub fn members_injector_of(inner: TypeRef) -> Self {
        Self::wrap(names::MEMBERS_INJECTOR, inner)
    }

    /// Name of a declared type, without arguments
    pub fn name(&self) -> Option<&str> {
        match self {
            TypeRef::Declared { name, .. } => Some(name),
            _ => None,
        }
    }

    pub fn args(&self) -> &[TypeRef] {
        match self {
            TypeRef::Declared { args, .. } => args,
            _ => &[],
        }
    }

    pub fn is_void(&self) -> bool {
        matches!(self, TypeRef::Void)
    }

    pub fn is_primitive(&self) -> bool {
        matches!(self, TypeRef::Primitive(_))
    }

    /// Whether this is the declared type `name`, with any arguments
    pub fn is_type_of(&self, name: &str) -> bool {
        self.name() == Some(name)
    }

    /// Returns `T` if this is `wrapper<T>`
    pub fn unwrap_if(&self, wrapper: &str) -> Option<&TypeRef> {
        match self {
            TypeRef::Declared { name, args } if &**name == wrapper && args.len() == 1 => {
                args.first()
            }
            _ => None,
        }
    }

    /// Element type of `Set<T>`
    pub fn set_element(&self) -> Option<&TypeRef> {
        self.unwrap_if(names::SET)
    }

    /// Key and value types of `Map<K, V>`
    pub fn map_entry(&self) -> Option<(&TypeRef, &TypeRef)> {
        match self {
            TypeRef::Declared { name, args } if &**name == names::MAP && args.len() == 2 => {
                Some((&args[0], &args[1]))
            }
            _ => None,
        }
    }

    /// `Set` or `Map` without type arguments
    pub fn is_raw_collection(&self) -> bool {
        (self.is_type_of(names::SET) || self.is_type_of(names::MAP)) && self.args().is_empty()
    }

    /// The same type with every primitive replaced by its boxed form
    pub fn boxed(&self) -> TypeRef {
        match self {
            TypeRef::Primitive(p) => TypeRef::declared(p.boxed_name()),
            TypeRef::Declared { name, args } => TypeRef::Declared {
                name: name.clone(),
                args: args.iter().map(TypeRef::boxed).collect(),
            },
            other => other.clone(),
        }
    }

    /// The declared type without its arguments
    pub fn erasure(&self) -> TypeRef {
        match self {
            TypeRef::Declared { name, .. } => TypeRef::Declared {
                name: name.clone(),
                args: Vec::new(),
            },
            other => other.clone(),
        }
    }

    /// Replaces type variables that appear in `bindings`
    pub fn substitute(&self, bindings: &HashMap<Arc<str>, TypeRef>) -> TypeRef {
        if bindings.is_empty() {
            return self.clone();
        }
        match self {
            TypeRef::Variable(var) => bindings.get(var).cloned().unwrap_or_else(|| self.clone()),
            TypeRef::Declared { name, args } => TypeRef::Declared {
                name: name.clone(),
                args: args.iter().map(|arg| arg.substitute(bindings)).collect(),
            },
            other => other.clone(),
        }
    }

    pub fn has_variables(&self) -> bool {
        match self {
            TypeRef::Variable(_) => true,
            TypeRef::Declared { args, .. } => args.iter().any(TypeRef::has_variables),
            _ => false,
        }
    }
}

impl Display for TypeRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TypeRef::Void => f.write_str("void"),
            TypeRef::Primitive(p) => f.write_str(p.keyword()),
            TypeRef::Variable(name) => f.write_str(name),
            TypeRef::Declared { name, args } => {
                f.write_str(name)?;
                if args.is_empty() {
                    return Ok(());
                }
                let args = args.iter().map(ToString::to_string).collect::<Vec<_>>();
                write!(f, "<{}>", args.join(", "))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Qualifier {
    name: Arc<str>,
    value: Option<Arc<str>>,
}
impl Qualifier {
    pub fn new(name: &str) -> Self {
        Self {
            name: Arc::from(name),
            value: None,
        }
    }

    pub fn with_value(name: &str, value: &str) -> Self {
        Self {
            name: Arc::from(name),
            value: Some(Arc::from(value)),
        }
    }

    /// `@Named("value")`
    pub fn named(value: &str) -> Self {
        Self::with_value(names::NAMED, value)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }
}
impl Display for Qualifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.value {
            Some(value) => write!(f, "@{}(\"{}\")", self.name, value),
            None => write!(f, "@{}", self.name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Scope {
    name: Arc<str>,
}
impl Scope {
    pub fn new(name: &str) -> Self {
        Self {
            name: Arc::from(name),
        }
    }

    pub fn singleton() -> Self {
        Self::new(names::SINGLETON)
    }

    pub fn reusable() -> Self {
        Self::new(names::REUSABLE)
    }

    pub fn production() -> Self {
        Self::new(names::PRODUCTION_SCOPE)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Cacheable, but not tied to any one component
    pub fn is_reusable(&self) -> bool {
        &*self.name == names::REUSABLE
    }

    pub fn is_production_scope(&self) -> bool {
        &*self.name == names::PRODUCTION_SCOPE
    }
}
impl Display for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "@{}", self.name)
    }
}

/// The key of a map contribution, e.g. `@StringKey("espresso")`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MapKey {
    annotation: Arc<str>,
    value: Arc<str>,
    key_type: TypeRef,
}
impl MapKey {
    pub fn new(annotation: &str, value: &str, key_type: TypeRef) -> Self {
        Self {
            annotation: Arc::from(annotation),
            value: Arc::from(value),
            key_type,
        }
    }

    pub fn string(value: &str) -> Self {
        Self::new("StringKey", value, TypeRef::declared("String"))
    }

    pub fn class(value: &str) -> Self {
        Self::new("ClassKey", value, TypeRef::declared("Class"))
    }

    pub fn annotation(&self) -> &str {
        &self.annotation
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn key_type(&self) -> &TypeRef {
        &self.key_type
    }
}
impl Display for MapKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "@{}(\"{}\")", self.annotation, self.value)
    }
}

/// Where something was declared
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SiteRef {
    Type(Arc<str>),
    Method {
        owner: Arc<str>,
        name: Arc<str>,
    },
    Parameter {
        owner: Arc<str>,
        method: Arc<str>,
        index: usize,
    },
    Field {
        owner: Arc<str>,
        name: Arc<str>,
    },
}
impl SiteRef {
    pub fn of_type(ty: &TypeRef) -> Self {
        SiteRef::Type(Arc::from(ty.erasure().to_string()))
    }

    pub fn method(owner: &TypeRef, name: &str) -> Self {
        SiteRef::Method {
            owner: Arc::from(owner.erasure().to_string()),
            name: Arc::from(name),
        }
    }

    pub fn parameter(owner: &TypeRef, method: &str, index: usize) -> Self {
        SiteRef::Parameter {
            owner: Arc::from(owner.erasure().to_string()),
            method: Arc::from(method),
            index,
        }
    }

    pub fn field(owner: &TypeRef, name: &str) -> Self {
        SiteRef::Field {
            owner: Arc::from(owner.erasure().to_string()),
            name: Arc::from(name),
        }
    }

    /// The type the site is declared in
    pub fn owner(&self) -> &str {
        match self {
            SiteRef::Type(owner)
            | SiteRef::Method { owner, .. }
            | SiteRef::Parameter { owner, .. }
            | SiteRef::Field { owner, .. } => owner,
        }
    }
}
impl Display for SiteRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SiteRef::Type(owner) => f.write_str(owner),
            SiteRef::Method { owner, name } => write!(f, "{owner}.{name}()"),
            SiteRef::Parameter {
                owner,
                method,
                index,
            } => write!(f, "{owner}.{method}(#{index})"),
            SiteRef::Field { owner, name } => write!(f, "{owner}.{name}"),
        }
    }
}
