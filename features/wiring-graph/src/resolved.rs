use std::sync::Arc;

use indexmap::IndexMap;

use crate::{
    binding::{
        BindingType, ContributionBinding, MembersInjectionBinding, MultibindingDeclaration,
        OptionalBindingDeclaration, SubcomponentDeclaration,
    },
    key::{BindingKey, Key},
    types::TypeRef,
};

/// What resolution found for a binding key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BindingStatus {
    /// Nothing binds the key
    Missing,
    /// Exactly one binding
    Unique,
    /// One synthetic binding gathering set or map contributions
    Multibinding,
    /// More than one binding competes for the key
    Duplicate,
}

/// Every binding found for one key in one component, with the component owning each.
///
/// Missing and duplicate bindings are represented here rather than reported,
/// so one resolution pass can surface all of them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedBindings {
    binding_key: BindingKey,
    component: TypeRef,
    contribution_bindings: IndexMap<Arc<ContributionBinding>, TypeRef>,
    members_injection_binding: Option<Arc<MembersInjectionBinding>>,
    multibinding_declarations: Vec<Arc<MultibindingDeclaration>>,
    subcomponent_declarations: Vec<Arc<SubcomponentDeclaration>>,
    optional_declarations: Vec<Arc<OptionalBindingDeclaration>>,
    inherited: bool,
}

impl ResolvedBindings {
    pub(crate) fn for_contribution_bindings(
        binding_key: BindingKey,
        component: TypeRef,
        contribution_bindings: IndexMap<Arc<ContributionBinding>, TypeRef>,
        multibinding_declarations: Vec<Arc<MultibindingDeclaration>>,
        subcomponent_declarations: Vec<Arc<SubcomponentDeclaration>>,
        optional_declarations: Vec<Arc<OptionalBindingDeclaration>>,
    ) -> Self {
        Self {
            binding_key,
            component,
            contribution_bindings,
            members_injection_binding: None,
            multibinding_declarations,
            subcomponent_declarations,
            optional_declarations,
            inherited: false,
        }
    }

    pub(crate) fn for_members_injection_binding(
        binding_key: BindingKey,
        component: TypeRef,
        binding: Arc<MembersInjectionBinding>,
    ) -> Self {
        Self {
            members_injection_binding: Some(binding),
            ..Self::no_bindings(binding_key, component)
        }
    }

    pub(crate) fn no_bindings(binding_key: BindingKey, component: TypeRef) -> Self {
        Self {
            binding_key,
            component,
            contribution_bindings: IndexMap::new(),
            members_injection_binding: None,
            multibinding_declarations: Vec::new(),
            subcomponent_declarations: Vec::new(),
            optional_declarations: Vec::new(),
            inherited: false,
        }
    }

    /// A view of an ancestor's resolution from `component`. Owners are kept.
    pub(crate) fn as_inherited_in(&self, component: &TypeRef) -> Self {
        Self {
            component: component.clone(),
            inherited: true,
            ..self.clone()
        }
    }

    pub fn binding_key(&self) -> &BindingKey {
        &self.binding_key
    }

    pub fn key(&self) -> &Key {
        self.binding_key.key()
    }

    /// The component this resolution was made for
    pub fn component(&self) -> &TypeRef {
        &self.component
    }

    /// Whether this entry only repeats what an ancestor resolved
    pub fn is_inherited(&self) -> bool {
        self.inherited
    }

    pub fn contribution_bindings(&self) -> impl Iterator<Item = &Arc<ContributionBinding>> {
        self.contribution_bindings.keys()
    }

    /// The single contribution binding, if there is exactly one
    pub fn contribution_binding(&self) -> Option<&Arc<ContributionBinding>> {
        match self.contribution_bindings.len() {
            1 => self.contribution_bindings.keys().next(),
            _ => None,
        }
    }

    pub fn members_injection_binding(&self) -> Option<&Arc<MembersInjectionBinding>> {
        self.members_injection_binding.as_ref()
    }

    pub fn multibinding_declarations(&self) -> &[Arc<MultibindingDeclaration>] {
        &self.multibinding_declarations
    }

    pub fn subcomponent_declarations(&self) -> &[Arc<SubcomponentDeclaration>] {
        &self.subcomponent_declarations
    }

    pub fn optional_declarations(&self) -> &[Arc<OptionalBindingDeclaration>] {
        &self.optional_declarations
    }

    pub fn contains(&self, binding: &ContributionBinding) -> bool {
        self.contribution_bindings.contains_key(binding)
    }

    pub fn owning_component(&self, binding: &ContributionBinding) -> Option<&TypeRef> {
        self.contribution_bindings.get(binding)
    }

    pub fn bindings_owned_by<'a>(
        &'a self,
        component: &'a TypeRef,
    ) -> impl Iterator<Item = &'a Arc<ContributionBinding>> + 'a {
        self.contribution_bindings
            .iter()
            .filter(move |(_, owner)| *owner == component)
            .map(|(binding, _)| binding)
    }

    /// Contribution bindings grouped by owning component, in discovery order
    pub fn bindings_by_owner(&self) -> IndexMap<&TypeRef, Vec<&Arc<ContributionBinding>>> {
        let mut owners: IndexMap<&TypeRef, Vec<&Arc<ContributionBinding>>> = IndexMap::new();
        for (binding, owner) in &self.contribution_bindings {
            owners.entry(owner).or_default().push(binding);
        }
        owners
    }

    /// Whether `component` owns any binding for this key, or this is a members injection for it
    pub fn is_owned_by(&self, component: &TypeRef) -> bool {
        match self.binding_key.is_contribution() {
            true => self.contribution_bindings.values().any(|owner| owner == component),
            false => &self.component == component,
        }
    }

    pub fn status(&self) -> BindingStatus {
        if !self.binding_key.is_contribution() {
            return match self.members_injection_binding {
                Some(_) => BindingStatus::Unique,
                None => BindingStatus::Missing,
            };
        }
        match self.contribution_bindings.len() {
            0 => BindingStatus::Missing,
            1 => match self.contribution_bindings.keys().all(|b| b.kind().is_multibinding()) {
                true => BindingStatus::Multibinding,
                false => BindingStatus::Unique,
            },
            _ => BindingStatus::Duplicate,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.contribution_bindings.is_empty() && self.members_injection_binding.is_none()
    }

    /// Production if any contribution binding is. Members injection is always a provision.
    pub fn binding_type(&self) -> Option<BindingType> {
        if self.members_injection_binding.is_some() {
            return Some(BindingType::Provision);
        }
        let mut types = self.contribution_bindings.keys().map(|b| b.binding_type());
        let first = types.next()?;
        Some(match types.any(|t| t == BindingType::Production) {
            true => BindingType::Production,
            false => first,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::BindingKind;

    fn binding(ty: &str, kind: BindingKind) -> Arc<ContributionBinding> {
        Arc::new(ContributionBinding::new(
            Key::new(TypeRef::declared(ty)),
            kind,
            BindingType::Provision,
        ))
    }

    fn resolved(bindings: Vec<(Arc<ContributionBinding>, &str)>) -> ResolvedBindings {
        ResolvedBindings::for_contribution_bindings(
            BindingKey::contribution(Key::new(TypeRef::declared("Foo"))),
            TypeRef::declared("Child"),
            bindings
                .into_iter()
                .map(|(binding, owner)| (binding, TypeRef::declared(owner)))
                .collect(),
            Vec::new(),
            Vec::new(),
            Vec::new(),
        )
    }

    #[test]
    fn status_reflects_binding_count() {
        assert_eq!(resolved(vec![]).status(), BindingStatus::Missing);
        assert_eq!(
            resolved(vec![(binding("Foo", BindingKind::Provision), "Child")]).status(),
            BindingStatus::Unique
        );
        assert_eq!(
            resolved(vec![(binding("Foo", BindingKind::MultiboundSet), "Child")]).status(),
            BindingStatus::Multibinding
        );
        assert_eq!(
            resolved(vec![
                (binding("Foo", BindingKind::Provision), "Child"),
                (binding("Foo", BindingKind::Injection), "Root"),
            ])
            .status(),
            BindingStatus::Duplicate
        );
    }

    #[test]
    fn bindings_are_grouped_by_owner() {
        let provision = binding("Foo", BindingKind::Provision);
        let injection = binding("Foo", BindingKind::Injection);
        let resolved = resolved(vec![(provision.clone(), "Root"), (injection.clone(), "Child")]);

        let child = TypeRef::declared("Child");
        let owned: Vec<_> = resolved.bindings_owned_by(&child).collect();
        assert_eq!(owned, [&injection]);
        assert_eq!(
            resolved.owning_component(&provision),
            Some(&TypeRef::declared("Root"))
        );
        assert_eq!(resolved.bindings_by_owner().len(), 2);
    }

    #[test]
    fn inherited_views_keep_owners() {
        let provision = binding("Foo", BindingKind::Provision);
        let root = resolved(vec![(provision.clone(), "Root")]);
        let grandchild = TypeRef::declared("Grandchild");
        let inherited = root.as_inherited_in(&grandchild);

        assert!(inherited.is_inherited());
        assert_eq!(inherited.component(), &grandchild);
        assert!(!inherited.is_owned_by(&grandchild));
        assert_eq!(
            inherited.owning_component(&provision),
            Some(&TypeRef::declared("Root"))
        );
    }
}
