use std::{
    collections::HashMap,
    hash::{Hash, Hasher},
    sync::Arc,
};

use indexmap::IndexSet;

use crate::{
    binding::{
        BindingType, ContributionBinding, DelegateDeclaration,
        MultibindingDeclaration, OptionalBindingDeclaration, SubcomponentDeclaration,
    },
    binding_factory,
    errors::ModelError,
    key::Key,
    model::{all_methods, Annotation, ElementModel, TypeElement},
    types::TypeRef,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModuleKind {
    Module,
    ProducerModule,
}

/// Everything one module contributes. Equal by module type.
#[derive(Debug, Clone)]
pub struct ModuleDescriptor {
    module_type: TypeRef,
    kind: ModuleKind,
    included_modules: IndexSet<Arc<ModuleDescriptor>>,
    bindings: Vec<Arc<ContributionBinding>>,
    multibinding_declarations: Vec<Arc<MultibindingDeclaration>>,
    delegate_declarations: Vec<Arc<DelegateDeclaration>>,
    optional_declarations: Vec<Arc<OptionalBindingDeclaration>>,
    subcomponent_declarations: Vec<Arc<SubcomponentDeclaration>>,
    errors: Vec<ModelError>,
}

impl PartialEq for ModuleDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.module_type == other.module_type
    }
}
impl Eq for ModuleDescriptor {}
impl Hash for ModuleDescriptor {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.module_type.hash(state);
    }
}

impl ModuleDescriptor {
    pub fn module_type(&self) -> &TypeRef {
        &self.module_type
    }

    pub fn kind(&self) -> ModuleKind {
        self.kind
    }

    pub fn included_modules(&self) -> &IndexSet<Arc<ModuleDescriptor>> {
        &self.included_modules
    }

    pub fn bindings(&self) -> &[Arc<ContributionBinding>] {
        &self.bindings
    }

    pub fn multibinding_declarations(&self) -> &[Arc<MultibindingDeclaration>] {
        &self.multibinding_declarations
    }

    pub fn delegate_declarations(&self) -> &[Arc<DelegateDeclaration>] {
        &self.delegate_declarations
    }

    pub fn optional_declarations(&self) -> &[Arc<OptionalBindingDeclaration>] {
        &self.optional_declarations
    }

    pub fn subcomponent_declarations(&self) -> &[Arc<SubcomponentDeclaration>] {
        &self.subcomponent_declarations
    }

    /// Declaration errors found while scanning the module
    pub fn errors(&self) -> &[ModelError] {
        &self.errors
    }

    /// Every key this module makes requestable, without contribution ids
    pub fn all_binding_keys(&self) -> IndexSet<Key> {
        let mut keys = IndexSet::new();
        keys.extend(self.bindings.iter().map(|b| b.key().without_contribution_id()));
        keys.extend(
            self.multibinding_declarations
                .iter()
                .map(|d| d.key.without_contribution_id()),
        );
        keys.extend(
            self.delegate_declarations
                .iter()
                .map(|d| d.key.without_contribution_id()),
        );
        keys.extend(
            self.optional_declarations
                .iter()
                .map(|d| d.key.with_type(TypeRef::optional_of(d.key.ty().clone()))),
        );
        keys.extend(self.subcomponent_declarations.iter().map(|d| d.key.clone()));
        keys
    }

    /// `roots` and every module they include, depth first
    pub fn transitive_closure<'a>(
        roots: impl IntoIterator<Item = &'a Arc<ModuleDescriptor>>,
    ) -> IndexSet<Arc<ModuleDescriptor>> {
        let mut modules = IndexSet::new();
        for root in roots {
            collect(root, &mut modules);
        }
        return modules;

        fn collect(module: &Arc<ModuleDescriptor>, modules: &mut IndexSet<Arc<ModuleDescriptor>>) {
            if !modules.insert(module.clone()) {
                return;
            }
            for included in &module.included_modules {
                collect(included, modules);
            }
        }
    }
}

/// Builds module descriptors, once per module type
pub struct ModuleDescriptorFactory<'m> {
    model: &'m dyn ElementModel,
    cache: HashMap<TypeRef, Arc<ModuleDescriptor>>,
    in_progress: Vec<TypeRef>,
}

impl<'m> ModuleDescriptorFactory<'m> {
    pub fn new(model: &'m dyn ElementModel) -> Self {
        Self {
            model,
            cache: HashMap::new(),
            in_progress: Vec::new(),
        }
    }

    /// Number of distinct modules built so far
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    pub fn create(&mut self, module: &TypeRef) -> Result<Arc<ModuleDescriptor>, ModelError> {
        if let Some(cached) = self.cache.get(module) {
            return Ok(cached.clone());
        }
        if self.in_progress.contains(module) {
            return Err(ModelError::ModuleIncludeCycle(module.clone()));
        }
        let model = self.model;
        let element = model
            .type_element(module)
            .ok_or_else(|| ModelError::UnknownType(module.clone()))?;
        let Some((kind, includes, subcomponents)) = module_annotation(element) else {
            return Err(ModelError::NotAModule(module.clone()));
        };

        self.in_progress.push(module.clone());
        let descriptor = self.build(element, module, kind, includes, subcomponents);
        self.in_progress.pop();

        tracing::debug!(
            "Built module '{}' with {} bindings",
            module,
            descriptor.bindings.len()
        );
        let descriptor = Arc::new(descriptor);
        self.cache.insert(module.clone(), descriptor.clone());
        Ok(descriptor)
    }

    /// Descriptors of `roots` and everything they include, depth first.
    /// Modules that cannot be built are returned as errors.
    pub fn transitive_modules<'a>(
        &mut self,
        roots: impl IntoIterator<Item = &'a TypeRef>,
    ) -> (IndexSet<Arc<ModuleDescriptor>>, Vec<ModelError>) {
        let mut descriptors = Vec::new();
        let mut errors = Vec::new();
        for root in roots {
            match self.create(root) {
                Ok(descriptor) => descriptors.push(descriptor),
                Err(error) => errors.push(error),
            }
        }
        (ModuleDescriptor::transitive_closure(&descriptors), errors)
    }

    fn build(
        &mut self,
        element: &TypeElement,
        module: &TypeRef,
        kind: ModuleKind,
        includes: Vec<TypeRef>,
        subcomponents: Vec<TypeRef>,
    ) -> ModuleDescriptor {
        let mut descriptor = ModuleDescriptor {
            module_type: module.clone(),
            kind,
            included_modules: IndexSet::new(),
            bindings: Vec::new(),
            multibinding_declarations: Vec::new(),
            delegate_declarations: Vec::new(),
            optional_declarations: Vec::new(),
            subcomponent_declarations: Vec::new(),
            errors: Vec::new(),
        };
        let framework = match kind {
            ModuleKind::Module => BindingType::Provision,
            ModuleKind::ProducerModule => BindingType::Production,
        };

        for member in all_methods(self.model, module) {
            let method = &member.method;
            let outcome = if method.has(&Annotation::Provides) {
                binding_factory::provides_method(element, &member)
                    .map(|b| descriptor.bindings.push(Arc::new(b)))
            } else if method.has(&Annotation::Produces) {
                binding_factory::produces_method(element, &member)
                    .map(|b| descriptor.bindings.push(Arc::new(b)))
            } else if method.has(&Annotation::Binds) {
                binding_factory::delegate_declaration(element, &member)
                    .map(|d| descriptor.delegate_declarations.push(Arc::new(d)))
            } else if method.has(&Annotation::Multibinds) {
                binding_factory::multibinds_declaration(element, &member, framework)
                    .map(|d| descriptor.multibinding_declarations.push(Arc::new(d)))
            } else if method.has(&Annotation::BindsOptionalOf) {
                binding_factory::optional_declaration(element, &member)
                    .map(|d| descriptor.optional_declarations.push(Arc::new(d)))
            } else {
                Ok(())
            };
            if let Err(error) = outcome {
                tracing::warn!("Skipping binding method: {}", error);
                descriptor.errors.push(error);
            }
        }

        let mut included = IndexSet::new();
        self.collect_superclass_includes(element, &mut included);
        included.extend(includes);
        for included_module in &included {
            match self.create(included_module) {
                Ok(included) => {
                    descriptor.included_modules.insert(included);
                }
                Err(error) => descriptor.errors.push(error),
            }
        }

        for subcomponent in subcomponents {
            let builder = self
                .model
                .enclosed_types(&subcomponent)
                .into_iter()
                .find(|t| t.has(&Annotation::SubcomponentBuilder))
                .map(|t| t.ty.clone());
            match builder {
                Some(builder) => descriptor.subcomponent_declarations.push(Arc::new(
                    binding_factory::subcomponent_declaration(module, &subcomponent, &builder),
                )),
                None => descriptor
                    .errors
                    .push(ModelError::MissingSubcomponentBuilder(subcomponent)),
            }
        }

        descriptor
    }

    /// Includes declared by module superclasses, up to the root object type
    fn collect_superclass_includes(&self, element: &TypeElement, included: &mut IndexSet<TypeRef>) {
        let mut superclass = element.superclass.clone();
        while let Some(current) = superclass {
            let Some(super_element) = self.model.type_element(&current) else {
                break;
            };
            if let Some((_, includes, _)) = module_annotation(super_element) {
                included.extend(includes);
            }
            superclass = super_element.superclass.clone();
            if superclass.as_ref() == Some(&element.ty) {
                break;
            }
        }
    }
}

fn module_annotation(element: &TypeElement) -> Option<(ModuleKind, Vec<TypeRef>, Vec<TypeRef>)> {
    element.annotations.iter().find_map(|a| match a {
        Annotation::Module {
            includes,
            subcomponents,
        } => Some((ModuleKind::Module, includes.clone(), subcomponents.clone())),
        Annotation::ProducerModule {
            includes,
            subcomponents,
        } => Some((
            ModuleKind::ProducerModule,
            includes.clone(),
            subcomponents.clone(),
        )),
        _ => None,
    })
}
