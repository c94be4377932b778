use std::fmt::Display;

use indexmap::IndexSet;

use crate::types::{names, Qualifier, SiteRef, TypeRef};

/// Identifies one contribution to a multibinding, so that several contributions
/// to the same `Set<T>` or `Map<K, V>` keep distinct keys
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContributionId {
    pub module: TypeRef,
    pub element: SiteRef,
}
impl Display for ContributionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.element)
    }
}

/// Identity of an injectable value: a type and an optional qualifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Key {
    qualifier: Option<Qualifier>,
    ty: TypeRef,
    contribution_id: Option<ContributionId>,
}

impl Key {
    /// Primitive types are boxed
    pub fn new(ty: TypeRef) -> Self {
        Self::qualified(None, ty)
    }

    pub fn qualified(qualifier: Option<Qualifier>, ty: TypeRef) -> Self {
        Key {
            qualifier,
            ty: ty.boxed(),
            contribution_id: None,
        }
    }

    pub fn qualifier(&self) -> Option<&Qualifier> {
        self.qualifier.as_ref()
    }

    pub fn ty(&self) -> &TypeRef {
        &self.ty
    }

    pub fn contribution_id(&self) -> Option<&ContributionId> {
        self.contribution_id.as_ref()
    }

    /// Same qualifier and contribution id, different type
    pub fn with_type(&self, ty: TypeRef) -> Key {
        Key {
            qualifier: self.qualifier.clone(),
            ty: ty.boxed(),
            contribution_id: self.contribution_id.clone(),
        }
    }

    pub fn with_contribution_id(mut self, id: ContributionId) -> Key {
        self.contribution_id = Some(id);
        self
    }

    pub fn without_contribution_id(&self) -> Key {
        Key {
            qualifier: self.qualifier.clone(),
            ty: self.ty.clone(),
            contribution_id: None,
        }
    }

    /// `Set<wrapper<T>>` becomes `Set<T>`
    pub fn unwrap_set(&self, wrapper: &str) -> Option<Key> {
        let element = self.ty.set_element()?;
        let inner = element.unwrap_if(wrapper)?;
        Some(self.with_type(TypeRef::set_of(inner.clone())))
    }

    /// `Map<K, from<V>>` becomes `Map<K, to<V>>`
    pub fn rewrap_map(&self, from: &str, to: &str) -> Option<Key> {
        let (key, value) = self.ty.map_entry()?;
        let inner = value.unwrap_if(from)?;
        Some(self.with_type(TypeRef::map_of(
            key.clone(),
            TypeRef::wrap(to, inner.clone()),
        )))
    }

    /// `Map<K, V>` becomes `Map<K, wrapper<V>>`, unless `V` is already wrapped by it
    pub fn wrap_map_value(&self, wrapper: &str) -> Option<Key> {
        let (key, value) = self.ty.map_entry()?;
        if value.is_type_of(wrapper) {
            return None;
        }
        Some(self.with_type(TypeRef::map_of(
            key.clone(),
            TypeRef::wrap(wrapper, value.clone()),
        )))
    }

    /// `Map<K, Provider<V>>` and `Map<K, Producer<V>>` become `Map<K, V>`. Other keys are unchanged.
    pub fn unwrap_map_value(&self) -> Key {
        let unwrapped = self.ty.map_entry().and_then(|(key, value)| {
            [names::PROVIDER, names::PRODUCER]
                .into_iter()
                .find_map(|wrapper| value.unwrap_if(wrapper))
                .map(|inner| TypeRef::map_of(key.clone(), inner.clone()))
        });
        match unwrapped {
            Some(ty) => self.with_type(ty),
            None => self.clone(),
        }
    }

    /// `Optional<T>` becomes the key for `T`, looking through one framework wrapper
    pub fn unwrap_optional(&self) -> Option<Key> {
        let value = self.ty.unwrap_if(names::OPTIONAL)?;
        let (_, inner) = crate::request::RequestKind::extract(value);
        Some(Key::qualified(self.qualifier.clone(), inner))
    }

    /// Keys that may contribute to a request for this key.
    ///
    /// `Map<K, V>` is also satisfied by contributions to `Map<K, Provider<V>>` and
    /// `Map<K, Producer<V>>` and the framework map types satisfy each other.
    pub fn keys_matching_request(&self) -> Vec<Key> {
        let mut keys = IndexSet::new();
        keys.insert(self.clone());
        keys.extend(self.unwrap_set(names::PRODUCED));
        keys.extend(self.rewrap_map(names::PRODUCED, names::PRODUCER));
        keys.extend(self.rewrap_map(names::PRODUCER, names::PROVIDER));
        keys.extend(self.rewrap_map(names::PROVIDER, names::PRODUCER));
        keys.extend(self.implicit_framework_map_keys());
        keys.into_iter().collect()
    }

    /// `Map<K, V>` becomes `Map<K, Provider<V>>` and `Map<K, Producer<V>>`
    pub fn implicit_framework_map_keys(&self) -> Vec<Key> {
        let Some((_, value)) = self.ty.map_entry() else {
            return Vec::new();
        };
        if value.is_type_of(names::PROVIDER)
            || value.is_type_of(names::PRODUCER)
            || value.is_type_of(names::PRODUCED)
        {
            return Vec::new();
        }
        [names::PROVIDER, names::PRODUCER]
            .into_iter()
            .filter_map(|wrapper| self.wrap_map_value(wrapper))
            .collect()
    }
}

impl Display for Key {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(qualifier) = &self.qualifier {
            write!(f, "{qualifier} ")?;
        }
        write!(f, "{}", self.ty)?;
        if let Some(id) = &self.contribution_id {
            write!(f, " [{id}]")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BindingKeyKind {
    Contribution,
    MembersInjection,
}

/// The unit of resolution.
///
/// Every request for an instance, a `Provider` or a `Lazy` of one key resolves
/// through the same binding key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BindingKey {
    kind: BindingKeyKind,
    key: Key,
}
impl BindingKey {
    pub fn contribution(key: Key) -> Self {
        Self {
            kind: BindingKeyKind::Contribution,
            key,
        }
    }

    pub fn members_injection(key: Key) -> Self {
        debug_assert!(
            key.qualifier().is_none(),
            "members injection keys are never qualified"
        );
        Self {
            kind: BindingKeyKind::MembersInjection,
            key,
        }
    }

    pub fn kind(&self) -> BindingKeyKind {
        self.kind
    }

    pub fn key(&self) -> &Key {
        &self.key
    }

    pub fn is_contribution(&self) -> bool {
        self.kind == BindingKeyKind::Contribution
    }
}
impl Display for BindingKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.kind {
            BindingKeyKind::Contribution => write!(f, "{}", self.key),
            BindingKeyKind::MembersInjection => write!(f, "members of {}", self.key),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Primitive;

    fn string() -> TypeRef {
        TypeRef::declared("String")
    }

    #[test]
    fn primitives_are_boxed_in_keys() {
        assert_eq!(
            Key::new(TypeRef::Primitive(Primitive::Int)),
            Key::new(TypeRef::declared("Integer"))
        );
    }

    #[test]
    fn qualifier_distinguishes_keys() {
        let a = Key::qualified(Some(Qualifier::named("a")), string());
        let b = Key::qualified(Some(Qualifier::named("b")), string());
        assert_ne!(a, b);
        assert_eq!(a.to_string(), "@Named(\"a\") String");
    }

    #[test]
    fn with_type_keeps_qualifier() {
        let key = Key::qualified(Some(Qualifier::named("a")), string());
        let changed = key.with_type(TypeRef::declared("Foo"));
        assert_eq!(changed.qualifier(), Some(&Qualifier::named("a")));
        assert_eq!(changed.ty(), &TypeRef::declared("Foo"));
    }

    #[test]
    fn plain_map_request_matches_framework_maps() {
        let key = Key::new(TypeRef::map_of(string(), TypeRef::declared("Foo")));
        let matching: Vec<String> = key
            .keys_matching_request()
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(
            matching,
            [
                "Map<String, Foo>",
                "Map<String, Provider<Foo>>",
                "Map<String, Producer<Foo>>"
            ]
        );
    }

    #[test]
    fn produced_set_request_matches_plain_set() {
        let key = Key::new(TypeRef::set_of(TypeRef::produced_of(string())));
        assert!(key
            .keys_matching_request()
            .contains(&Key::new(TypeRef::set_of(string()))));
    }

    #[test]
    fn unwrapping_map_values_keeps_contribution_id() {
        let id = ContributionId {
            module: TypeRef::declared("M"),
            element: SiteRef::method(&TypeRef::declared("M"), "foo"),
        };
        let key = Key::new(TypeRef::map_of(
            string(),
            TypeRef::provider_of(TypeRef::declared("Foo")),
        ))
        .with_contribution_id(id.clone());
        let unwrapped = key.unwrap_map_value();
        assert_eq!(unwrapped.ty().to_string(), "Map<String, Foo>");
        assert_eq!(unwrapped.contribution_id(), Some(&id));
    }

    #[test]
    fn optional_unwraps_through_provider() {
        let key = Key::new(TypeRef::optional_of(TypeRef::provider_of(string())));
        assert_eq!(key.unwrap_optional(), Some(Key::new(string())));
    }
}
