use std::{collections::HashMap, sync::Arc};

use indexmap::IndexMap;

use crate::{
    binding::{ContributionBinding, MembersInjectionBinding},
    binding_factory,
    errors::ModelError,
    key::Key,
    model::{Annotation, ElementModel},
    types::names,
};

/// Finds and memoizes bindings implied by `@Inject` constructors and members.
///
/// Bindings are only created when a key is looked up and nothing else binds it.
pub struct InjectBindingRegistry<'m> {
    model: &'m dyn ElementModel,
    provision_bindings: HashMap<Key, Option<Arc<ContributionBinding>>>,
    members_injection_bindings: HashMap<Key, Option<Arc<MembersInjectionBinding>>>,
    errors: IndexMap<Key, Vec<ModelError>>,
}

impl<'m> InjectBindingRegistry<'m> {
    pub fn new(model: &'m dyn ElementModel) -> Self {
        Self {
            model,
            provision_bindings: HashMap::new(),
            members_injection_bindings: HashMap::new(),
            errors: IndexMap::new(),
        }
    }

    /// Errors found while creating bindings so far
    pub fn errors(&self) -> impl Iterator<Item = &ModelError> {
        self.errors.values().flatten()
    }

    /// Errors found while looking up `key`
    pub fn errors_for(&self, key: &Key) -> &[ModelError] {
        self.errors.get(key).map(Vec::as_slice).unwrap_or_default()
    }

    fn record(&mut self, key: &Key, error: ModelError) {
        tracing::warn!("Cannot bind '{}': {}", key, error);
        self.errors.entry(key.clone()).or_default().push(error);
    }

    /// The `@Inject` constructor binding for an unqualified key
    pub fn get_or_find_provision_binding(&mut self, key: &Key) -> Option<Arc<ContributionBinding>> {
        if key.qualifier().is_some() || key.contribution_id().is_some() {
            return None;
        }
        if let Some(cached) = self.provision_bindings.get(key) {
            return cached.clone();
        }
        let binding = self.find_provision_binding(key);
        self.provision_bindings.insert(key.clone(), binding.clone());
        binding
    }

    fn find_provision_binding(&mut self, key: &Key) -> Option<Arc<ContributionBinding>> {
        let model = self.model;
        let element = model.type_element(key.ty())?;
        let constructors: Vec<_> = element
            .constructors
            .iter()
            .filter(|c| c.has(&Annotation::Inject))
            .collect();
        let constructor = match constructors.as_slice() {
            [] => return None,
            [constructor] => *constructor,
            _ => {
                self.record(key, ModelError::MultipleInjectConstructors(key.ty().erasure()));
                return None;
            }
        };
        if element.is_abstract {
            return None;
        }

        let has_injected_members = self
            .get_or_find_members_injection_binding(&Key::new(key.ty().clone()))
            .is_some_and(|binding| binding.has_injection_sites());
        match binding_factory::injection_binding(element, constructor, key.ty(), has_injected_members)
        {
            Ok(binding) => {
                tracing::debug!("Created injection binding for '{}'", key);
                Some(Arc::new(binding))
            }
            Err(error) => {
                self.record(key, error);
                None
            }
        }
    }

    /// The members injection binding of a known type
    pub fn get_or_find_members_injection_binding(
        &mut self,
        key: &Key,
    ) -> Option<Arc<MembersInjectionBinding>> {
        if let Some(cached) = self.members_injection_bindings.get(key) {
            return cached.clone();
        }
        let model = self.model;
        let binding = match model.type_element(key.ty()) {
            None => None,
            Some(_) => match binding_factory::members_injection_binding(model, key.ty()) {
                Ok(binding) => Some(Arc::new(binding)),
                Err(error) => {
                    self.record(key, error);
                    None
                }
            },
        };
        self.members_injection_bindings
            .insert(key.clone(), binding.clone());
        binding
    }

    /// A binding for `MembersInjector<T>`
    pub fn get_or_find_members_injector_provision_binding(
        &mut self,
        key: &Key,
    ) -> Option<Arc<ContributionBinding>> {
        if key.qualifier().is_some() {
            return None;
        }
        let injected = key.ty().unwrap_if(names::MEMBERS_INJECTOR)?.clone();
        let members = self.get_or_find_members_injection_binding(&Key::new(injected))?;
        Some(Arc::new(binding_factory::members_injector_binding(
            key, &members,
        )))
    }
}
