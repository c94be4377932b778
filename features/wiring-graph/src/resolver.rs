use std::{
    collections::{HashMap, HashSet, VecDeque},
    sync::Arc,
};

use indexmap::{IndexMap, IndexSet};
use wiring_config::{ResolverOptions, UndeclaredMultibindings};

use crate::{
    binding::{
        index_by_key, BindingKind, BindingType, ContributionBinding, DelegateDeclaration,
        MultibindingDeclaration, OptionalBindingDeclaration, SubcomponentDeclaration,
    },
    binding_factory,
    component::ComponentDescriptor,
    inject::InjectBindingRegistry,
    key::{BindingKey, Key},
    module::ModuleDescriptor,
    resolved::ResolvedBindings,
    types::{names, TypeRef},
};

/// Counters collected while resolving, one set per graph factory
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolutionStats {
    /// Calls looking up the bindings of a key
    pub lookups: usize,
    /// Components resolved, subcomponents included
    pub components: usize,
}

/// State shared by every resolver of one graph
pub(crate) struct ResolveContext<'a, 'm> {
    pub registry: &'a mut InjectBindingRegistry<'m>,
    pub options: &'a ResolverOptions,
    pub stats: &'a mut ResolutionStats,
}

/// Keys and bindings already visited by one local dependency check
#[derive(Default)]
struct LocalVisits {
    keys: HashSet<BindingKey>,
    bindings: HashSet<Arc<ContributionBinding>>,
    /// Revisits answered `false` without looking. Results they fed are not cached.
    cut_short: usize,
}

/// Resolves binding keys for one component.
///
/// A subcomponent's resolver owns its parent's, so resolving in a child can
/// ask the ancestors to resolve too. Children are created after the parent
/// has resolved its entry points and hand the parent back when done.
pub(crate) struct Resolver {
    parent: Option<Box<Resolver>>,
    component: Arc<ComponentDescriptor>,
    explicit_bindings: IndexMap<Key, IndexSet<Arc<ContributionBinding>>>,
    explicit_bindings_set: HashSet<Arc<ContributionBinding>>,
    /// Contributions by the key of the set or map they contribute to
    explicit_multibindings: IndexMap<Key, IndexSet<Arc<ContributionBinding>>>,
    multibinding_declarations: IndexMap<Key, Vec<Arc<MultibindingDeclaration>>>,
    subcomponent_declarations: IndexMap<Key, Vec<Arc<SubcomponentDeclaration>>>,
    delegate_declarations: IndexMap<Key, Vec<Arc<DelegateDeclaration>>>,
    delegate_multibinding_declarations: IndexMap<Key, Vec<Arc<DelegateDeclaration>>>,
    optional_binding_declarations: IndexMap<Key, Vec<Arc<OptionalBindingDeclaration>>>,
    resolved: IndexMap<BindingKey, Arc<ResolvedBindings>>,
    cycle_stack: Vec<BindingKey>,
    key_depends_on_local_cache: HashMap<BindingKey, bool>,
    binding_depends_on_local_cache: HashMap<Arc<ContributionBinding>, bool>,
    subcomponents_to_resolve: VecDeque<Arc<ComponentDescriptor>>,
}

impl Resolver {
    /// `bindings` are the explicit bindings not coming from modules. Module bindings and
    /// declarations are read from the component's transitive modules.
    pub(crate) fn new(
        parent: Option<Box<Resolver>>,
        component: Arc<ComponentDescriptor>,
        bindings: Vec<Arc<ContributionBinding>>,
    ) -> Self {
        let modules = component.transitive_modules();
        let module_bindings = modules.iter().flat_map(|m| m.bindings().iter().cloned());
        let all_bindings: Vec<_> = bindings.into_iter().chain(module_bindings).collect();

        let mut explicit_bindings: IndexMap<Key, IndexSet<Arc<ContributionBinding>>> =
            IndexMap::new();
        for binding in &all_bindings {
            explicit_bindings
                .entry(binding.key().clone())
                .or_default()
                .insert(binding.clone());
        }
        let mut explicit_multibindings: IndexMap<Key, IndexSet<Arc<ContributionBinding>>> =
            IndexMap::new();
        for binding in all_bindings.iter().filter(|b| b.key().contribution_id().is_some()) {
            explicit_multibindings
                .entry(binding.key().without_contribution_id())
                .or_default()
                .insert(binding.clone());
        }

        let delegates: Vec<_> = declarations(modules, ModuleDescriptor::delegate_declarations);
        let mut delegate_multibinding_declarations: IndexMap<Key, Vec<_>> = IndexMap::new();
        for delegate in delegates.iter().filter(|d| d.key.contribution_id().is_some()) {
            delegate_multibinding_declarations
                .entry(delegate.key.without_contribution_id())
                .or_default()
                .push(delegate.clone());
        }

        let subcomponents_to_resolve = component.subcomponents().values().cloned().collect();

        return Self {
            parent,
            explicit_bindings_set: all_bindings.iter().cloned().collect(),
            explicit_bindings,
            explicit_multibindings,
            multibinding_declarations: index_by_key(declarations(
                modules,
                ModuleDescriptor::multibinding_declarations,
            )),
            subcomponent_declarations: index_by_key(declarations(
                modules,
                ModuleDescriptor::subcomponent_declarations,
            )),
            delegate_declarations: index_by_key(delegates),
            delegate_multibinding_declarations,
            optional_binding_declarations: index_by_key(declarations(
                modules,
                ModuleDescriptor::optional_declarations,
            )),
            resolved: IndexMap::new(),
            cycle_stack: Vec::new(),
            key_depends_on_local_cache: HashMap::new(),
            binding_depends_on_local_cache: HashMap::new(),
            subcomponents_to_resolve,
            component,
        };

        fn declarations<D>(
            modules: &IndexSet<Arc<ModuleDescriptor>>,
            of: fn(&ModuleDescriptor) -> &[Arc<D>],
        ) -> Vec<Arc<D>> {
            modules
                .iter()
                .flat_map(|module| of(module).iter().cloned())
                .collect()
        }
    }

    pub(crate) fn component_type(&self) -> &TypeRef {
        self.component.component_type()
    }

    /// Component types from the root down to this one
    pub(crate) fn component_lineage(&self) -> Vec<TypeRef> {
        self.lineage()
            .into_iter()
            .map(|resolver| resolver.component_type().clone())
            .collect()
    }

    #[cfg(test)]
    pub(crate) fn resolved(&self) -> &IndexMap<BindingKey, Arc<ResolvedBindings>> {
        &self.resolved
    }

    /// The next subcomponent found to need a graph, in discovery order
    pub(crate) fn next_subcomponent(&mut self) -> Option<Arc<ComponentDescriptor>> {
        self.subcomponents_to_resolve.pop_front()
    }

    /// Hands back the resolved bindings and the parent resolver
    pub(crate) fn finish(
        self,
    ) -> (
        IndexMap<BindingKey, Arc<ResolvedBindings>>,
        Option<Box<Resolver>>,
    ) {
        (self.resolved, self.parent)
    }

    /// Modules installed by some ancestor
    fn inherited_modules(&self) -> IndexSet<Arc<ModuleDescriptor>> {
        let mut modules = IndexSet::new();
        let mut ancestor = self.parent.as_deref();
        while let Some(resolver) = ancestor {
            modules.extend(resolver.component.transitive_modules().iter().cloned());
            ancestor = resolver.parent.as_deref();
        }
        modules
    }

    pub(crate) fn owned_modules(&self) -> IndexSet<Arc<ModuleDescriptor>> {
        let inherited = self.inherited_modules();
        self.component
            .transitive_modules()
            .iter()
            .filter(|module| !inherited.contains(*module))
            .cloned()
            .collect()
    }

    pub(crate) fn resolve(&mut self, binding_key: &BindingKey, cx: &mut ResolveContext) {
        // The key that started the cycle records it once its own resolution completes
        if self.cycle_stack.contains(binding_key) {
            tracing::trace!("'{}' is already being resolved", binding_key);
            return;
        }
        if self.resolved.contains_key(binding_key) {
            return;
        }
        if !binding_key.is_contribution() {
            self.resolve_members_injection(binding_key, cx);
            return;
        }

        if self.previously_resolved(binding_key).is_some() {
            // Resolved in an ancestor. Resolve in the parent in case components in between
            // contribute to it, then reuse that resolution if nothing here changes it.
            if let Some(parent) = self.parent.as_deref_mut() {
                parent.resolve(binding_key, cx);
            }
            if !self.key_depends_on_local_bindings(binding_key)
                && !self.has_local_explicit_bindings(binding_key.key())
            {
                if let Some(previous) = self.previously_resolved(binding_key) {
                    tracing::trace!(
                        "'{}' is inherited by '{}'",
                        binding_key,
                        self.component_type()
                    );
                    let inherited = previous.as_inherited_in(self.component_type());
                    self.resolved.insert(binding_key.clone(), Arc::new(inherited));
                    return;
                }
            }
        }

        self.cycle_stack.push(binding_key.clone());
        let resolved = Arc::new(self.look_up_bindings(binding_key.key(), cx));
        self.resolved.insert(binding_key.clone(), resolved.clone());
        self.resolve_dependencies(&resolved, cx);
        self.cycle_stack.pop();
    }

    fn resolve_members_injection(&mut self, binding_key: &BindingKey, cx: &mut ResolveContext) {
        cx.stats.lookups += 1;
        let component = self.component_type().clone();
        let resolved = Arc::new(
            match cx
                .registry
                .get_or_find_members_injection_binding(binding_key.key())
            {
                Some(binding) => ResolvedBindings::for_members_injection_binding(
                    binding_key.clone(),
                    component,
                    binding,
                ),
                None => ResolvedBindings::no_bindings(binding_key.clone(), component),
            },
        );
        self.resolved.insert(binding_key.clone(), resolved.clone());

        self.cycle_stack.push(binding_key.clone());
        self.resolve_dependencies(&resolved, cx);
        self.cycle_stack.pop();
    }

    /// Resolves the dependencies of the bindings this component owns
    fn resolve_dependencies(&mut self, resolved: &ResolvedBindings, cx: &mut ResolveContext) {
        let component = self.component_type().clone();
        let mut dependencies: Vec<BindingKey> = resolved
            .bindings_owned_by(&component)
            .flat_map(|binding| binding.dependencies().iter().map(|d| d.binding_key()))
            .collect();
        if let Some(binding) = resolved.members_injection_binding() {
            dependencies.extend(binding.dependencies().map(|d| d.binding_key()));
        }
        for dependency in dependencies {
            self.resolve(&dependency, cx);
        }
    }

    /// Every binding matching `key` visible from this component, with their owners
    fn look_up_bindings(&mut self, key: &Key, cx: &mut ResolveContext) -> ResolvedBindings {
        cx.stats.lookups += 1;
        let mut bindings = self.explicit_bindings(key, cx);

        let matching = key.keys_matching_request();
        let mut contributions = IndexSet::new();
        for matching_key in &matching {
            contributions.extend(self.explicit_multibindings(matching_key, cx));
        }
        let multibinding_declarations = self.matching_multibinding_declarations(&matching);
        if !contributions.is_empty() || !multibinding_declarations.is_empty() {
            let contributions: Vec<_> = contributions.into_iter().collect();
            bindings.insert(Arc::new(binding_factory::synthetic_multibinding(
                key,
                &contributions,
            )));
        }

        let optional_declarations = self.optional_binding_declarations_for(key);
        if !optional_declarations.is_empty() {
            let binding = self.synthetic_optional_binding(key, cx);
            bindings.insert(Arc::new(binding));
        }

        let subcomponent_declarations = self.subcomponent_declarations_for(key);
        if let Some(binding) =
            binding_factory::module_subcomponent_builder_binding(&subcomponent_declarations)
        {
            let binding = Arc::new(binding);
            self.add_subcomponent_to_owning_resolver(&binding);
            bindings.insert(binding);
        }

        if key.ty().is_type_of(names::MEMBERS_INJECTOR) {
            bindings.extend(
                cx.registry
                    .get_or_find_members_injector_provision_binding(key),
            );
        }

        if bindings.is_empty()
            && cx.options.undeclared_multibindings == UndeclaredMultibindings::Empty
            && (key.ty().set_element().is_some() || key.ty().map_entry().is_some())
        {
            bindings.insert(Arc::new(binding_factory::synthetic_multibinding(key, &[])));
        }

        if bindings.is_empty() {
            bindings.extend(cx.registry.get_or_find_provision_binding(key));
        }

        let mut owners = IndexMap::new();
        for binding in bindings {
            let owner = self.owning_component(key, &binding, cx);
            owners.insert(binding, owner);
        }
        ResolvedBindings::for_contribution_bindings(
            BindingKey::contribution(key.clone()),
            self.component_type().clone(),
            owners,
            multibinding_declarations,
            subcomponent_declarations,
            optional_declarations,
        )
    }

    /// `Optional<T>`, present when `T` has any binding
    fn synthetic_optional_binding(&mut self, key: &Key, cx: &mut ResolveContext) -> ContributionBinding {
        let underlying = match key.unwrap_optional() {
            Some(unwrapped) => {
                let resolved = self.look_up_bindings(&unwrapped, cx);
                resolved.binding_type()
            }
            None => None,
        };
        binding_factory::synthetic_optional_binding(key, underlying)
    }

    /// Queues the subcomponent a module-declared builder creates on the resolver owning it
    fn add_subcomponent_to_owning_resolver(&mut self, binding: &ContributionBinding) {
        let Some(depth) = self.owning_depth(binding) else {
            return;
        };
        let builder = binding.key().ty().clone();
        let Some(owner) = self.at_depth_mut(depth) else {
            return;
        };
        match owner.component.subcomponent_for_builder(&builder).cloned() {
            Some(subcomponent) => owner.subcomponents_to_resolve.push_back(subcomponent),
            None => tracing::warn!(
                "'{}' declares no subcomponent built by '{}'",
                owner.component_type(),
                builder
            ),
        }
    }

    /// The component that should hold `binding`.
    ///
    /// This component, unless an ancestor owns the binding and it does not depend on
    /// bindings local to this component.
    fn owning_component(
        &mut self,
        request_key: &Key,
        binding: &Arc<ContributionBinding>,
        cx: &mut ResolveContext,
    ) -> TypeRef {
        if self.is_resolved_in_parent(request_key, binding, cx)
            && !self.binding_depends_on_local_bindings(binding)
        {
            let owner = self.parent.as_deref().and_then(|parent| {
                parent
                    .resolved
                    .get(&BindingKey::contribution(request_key.clone()))
                    .and_then(|resolved| resolved.owning_component(binding))
            });
            if let Some(owner) = owner {
                return owner.clone();
            }
        }
        self.component_type().clone()
    }

    /// Whether an ancestor owns `binding`. If so, the key is resolved in the parent, not
    /// directly in the owner, so components in between see their own contributions.
    fn is_resolved_in_parent(
        &mut self,
        request_key: &Key,
        binding: &ContributionBinding,
        cx: &mut ResolveContext,
    ) -> bool {
        let depth = self.depth();
        match self.owning_depth(binding) {
            Some(owner) if owner != depth => {
                if let Some(parent) = self.parent.as_deref_mut() {
                    parent.resolve(&BindingKey::contribution(request_key.clone()), cx);
                }
                true
            }
            _ => false,
        }
    }

    /// Depth of the resolver owning `binding`, the root being 0
    fn owning_depth(&self, binding: &ContributionBinding) -> Option<usize> {
        let lineage = self.lineage();
        let scope = binding.scope();

        if scope.is_some_and(|s| s.is_production_scope()) || binding.is_production() {
            for (depth, resolver) in lineage.iter().enumerate() {
                // Injected production bindings live in the highest production component
                if binding.kind() == BindingKind::Injection && resolver.component.is_production() {
                    return Some(depth);
                }
                if resolver.contains_explicit_binding(binding) {
                    return Some(depth);
                }
            }
        }

        if scope.is_some_and(|s| s.is_reusable()) {
            let binding_key = BindingKey::contribution(binding.key().clone());
            return lineage.iter().position(|resolver| {
                resolver
                    .resolved
                    .get(&binding_key)
                    .is_some_and(|resolved| resolved.contains(binding))
            });
        }

        if let Some(depth) = lineage
            .iter()
            .position(|resolver| resolver.contains_explicit_binding(binding))
        {
            return Some(depth);
        }

        // The same scope may be declared at more than one level
        let scope = scope?;
        lineage
            .iter()
            .position(|resolver| resolver.component.scopes().contains(scope))
    }

    fn contains_explicit_binding(&self, binding: &ContributionBinding) -> bool {
        if self.explicit_bindings_set.contains(binding) {
            return true;
        }
        if binding.kind() == BindingKind::Delegate {
            let declared = self
                .delegate_declarations
                .get(&binding.key().unwrap_map_value())
                .into_iter()
                .flatten()
                .any(|declaration| {
                    Some(&declaration.contributing_module) == binding.contributing_module()
                        && Some(&declaration.binding_element) == binding.binding_element()
                });
            if declared {
                return true;
            }
        }
        self.subcomponent_declarations.contains_key(binding.key())
    }

    /// This resolver and its ancestors, root first
    fn lineage(&self) -> Vec<&Resolver> {
        let mut lineage = match self.parent.as_deref() {
            Some(parent) => parent.lineage(),
            None => Vec::new(),
        };
        lineage.push(self);
        lineage
    }

    fn depth(&self) -> usize {
        self.parent.as_deref().map_or(0, |parent| parent.depth() + 1)
    }

    fn at_depth_mut(&mut self, depth: usize) -> Option<&mut Resolver> {
        if self.depth() == depth {
            return Some(self);
        }
        self.parent.as_deref_mut()?.at_depth_mut(depth)
    }

    /// The resolution of `binding_key` here or in the closest ancestor having one
    fn previously_resolved(&self, binding_key: &BindingKey) -> Option<Arc<ResolvedBindings>> {
        match self.resolved.get(binding_key) {
            Some(resolved) => Some(resolved.clone()),
            None => self.parent.as_deref()?.previously_resolved(binding_key),
        }
    }

    /// Explicit bindings for `key` in this component and its ancestors, root first
    fn explicit_bindings(
        &mut self,
        key: &Key,
        cx: &mut ResolveContext,
    ) -> IndexSet<Arc<ContributionBinding>> {
        let mut bindings = match self.parent.as_deref_mut() {
            Some(parent) => parent.explicit_bindings(key, cx),
            None => IndexSet::new(),
        };
        bindings.extend(self.local_explicit_bindings(key, cx));
        bindings
    }

    fn local_explicit_bindings(
        &mut self,
        key: &Key,
        cx: &mut ResolveContext,
    ) -> IndexSet<Arc<ContributionBinding>> {
        let mut bindings = self.explicit_bindings.get(key).cloned().unwrap_or_default();
        // `@Binds @IntoMap` declarations use `Map<K, V>` keys
        let delegates = self
            .delegate_declarations
            .get(&key.unwrap_map_value())
            .cloned()
            .unwrap_or_default();
        bindings.extend(self.create_delegate_bindings(&delegates, cx));
        bindings
    }

    fn has_local_explicit_bindings(&self, key: &Key) -> bool {
        self.explicit_bindings.get(key).is_some_and(|b| !b.is_empty())
            || self
                .delegate_declarations
                .contains_key(&key.unwrap_map_value())
    }

    /// Contributions to the set or map `key` in this component and its ancestors, root first
    fn explicit_multibindings(
        &mut self,
        key: &Key,
        cx: &mut ResolveContext,
    ) -> IndexSet<Arc<ContributionBinding>> {
        let mut bindings = match self.parent.as_deref_mut() {
            Some(parent) => parent.explicit_multibindings(key, cx),
            None => IndexSet::new(),
        };
        bindings.extend(self.local_explicit_multibindings(key, cx));
        bindings
    }

    fn local_explicit_multibindings(
        &mut self,
        key: &Key,
        cx: &mut ResolveContext,
    ) -> IndexSet<Arc<ContributionBinding>> {
        let mut bindings = self
            .explicit_multibindings
            .get(key)
            .cloned()
            .unwrap_or_default();
        if reaches_delegate_multibindings(key) {
            let delegates = self
                .delegate_multibinding_declarations
                .get(&key.unwrap_map_value())
                .cloned()
                .unwrap_or_default();
            bindings.extend(self.create_delegate_bindings(&delegates, cx));
        }
        bindings
    }

    fn has_local_multibinding_contributions(&self, key: &Key) -> bool {
        key.keys_matching_request().iter().any(|matching| {
            self.explicit_multibindings
                .get(matching)
                .is_some_and(|b| !b.is_empty())
                || (reaches_delegate_multibindings(matching)
                    && self
                        .delegate_multibinding_declarations
                        .contains_key(&matching.unwrap_map_value()))
        })
    }

    fn create_delegate_bindings(
        &mut self,
        declarations: &[Arc<DelegateDeclaration>],
        cx: &mut ResolveContext,
    ) -> Vec<Arc<ContributionBinding>> {
        declarations
            .iter()
            .map(|declaration| Arc::new(self.create_delegate_binding(declaration, cx)))
            .collect()
    }

    /// One binding per delegate declaration, typed after whichever binding of the aliased
    /// key comes first. Competing bindings there are reported as duplicates of that key.
    fn create_delegate_binding(
        &mut self,
        declaration: &DelegateDeclaration,
        cx: &mut ResolveContext,
    ) -> ContributionBinding {
        let delegate_key = declaration.delegate_request.binding_key();
        if self.cycle_stack.contains(&delegate_key) {
            return binding_factory::unresolved_delegate_binding(declaration);
        }

        self.cycle_stack.push(delegate_key.clone());
        let resolved = self.look_up_bindings(delegate_key.key(), cx);
        self.cycle_stack.pop();

        let target_type = resolved
            .contribution_bindings()
            .next()
            .map(|target| target.binding_type());
        match target_type {
            Some(binding_type) => binding_factory::delegate_binding(declaration, binding_type),
            None => binding_factory::unresolved_delegate_binding(declaration),
        }
    }

    fn matching_multibinding_declarations(
        &self,
        matching: &[Key],
    ) -> Vec<Arc<MultibindingDeclaration>> {
        let mut found = IndexSet::new();
        for resolver in self.lineage() {
            for key in matching {
                found.extend(
                    resolver
                        .multibinding_declarations
                        .get(key)
                        .into_iter()
                        .flatten()
                        .cloned(),
                );
            }
        }
        found.into_iter().collect()
    }

    fn subcomponent_declarations_for(&self, key: &Key) -> Vec<Arc<SubcomponentDeclaration>> {
        let mut found = IndexSet::new();
        for resolver in self.lineage() {
            found.extend(
                resolver
                    .subcomponent_declarations
                    .get(key)
                    .into_iter()
                    .flatten()
                    .cloned(),
            );
        }
        found.into_iter().collect()
    }

    fn optional_binding_declarations_for(&self, key: &Key) -> Vec<Arc<OptionalBindingDeclaration>> {
        let Some(unwrapped) = key.unwrap_optional() else {
            return Vec::new();
        };
        let mut found = IndexSet::new();
        for resolver in self.lineage() {
            found.extend(
                resolver
                    .optional_binding_declarations
                    .get(&unwrapped)
                    .into_iter()
                    .flatten()
                    .cloned(),
            );
        }
        found.into_iter().collect()
    }

    /// Whether the resolution of `binding_key` must differ here from the one in an ancestor
    fn key_depends_on_local_bindings(&mut self, binding_key: &BindingKey) -> bool {
        self.check_key(binding_key, &mut LocalVisits::default())
    }

    fn binding_depends_on_local_bindings(&mut self, binding: &Arc<ContributionBinding>) -> bool {
        self.check_binding(binding, &mut LocalVisits::default())
    }

    /// True if the key has multibinding contributions or a present optional declared in this
    /// component, or if any of its unscoped bindings depend on such a key
    fn check_key(&mut self, binding_key: &BindingKey, visits: &mut LocalVisits) -> bool {
        if !binding_key.is_contribution() {
            return false;
        }
        // Legal cycles through `Provider` or `Lazy` end here
        if !visits.keys.insert(binding_key.clone()) {
            visits.cut_short += 1;
            return false;
        }
        if let Some(&cached) = self.key_depends_on_local_cache.get(binding_key) {
            return cached;
        }
        let Some(previous) = self.previously_resolved(binding_key) else {
            return false;
        };

        let cut_short = visits.cut_short;
        let depends = self.has_local_multibinding_contributions(binding_key.key())
            || self.has_local_optional_binding_contribution(&previous)
            || previous
                .contribution_bindings()
                .any(|binding| self.check_binding(binding, visits));
        if depends || visits.cut_short == cut_short {
            self.key_depends_on_local_cache
                .insert(binding_key.clone(), depends);
        }
        depends
    }

    /// Scoped bindings other than reusable ones never depend on subcomponent bindings
    fn check_binding(&mut self, binding: &Arc<ContributionBinding>, visits: &mut LocalVisits) -> bool {
        if !visits.bindings.insert(binding.clone()) {
            visits.cut_short += 1;
            return false;
        }
        if let Some(&cached) = self.binding_depends_on_local_cache.get(binding) {
            return cached;
        }

        let unscoped = match binding.scope() {
            None => true,
            Some(scope) => scope.is_reusable(),
        };
        let cut_short = visits.cut_short;
        let depends = unscoped
            && binding.binding_type() != BindingType::Production
            && binding
                .dependencies()
                .iter()
                .any(|dependency| self.check_key(&dependency.binding_key(), visits));
        if depends || visits.cut_short == cut_short {
            self.binding_depends_on_local_cache
                .insert(binding.clone(), depends);
        }
        depends
    }

    /// An `Optional<T>` whose `T` is bound here, or an optional declared here
    fn has_local_optional_binding_contribution(&self, resolved: &ResolvedBindings) -> bool {
        let synthetic = resolved
            .contribution_bindings()
            .any(|binding| binding.kind() == BindingKind::Optional);
        match (synthetic, resolved.key().unwrap_optional()) {
            (true, Some(unwrapped)) => self.has_local_explicit_bindings(&unwrapped),
            (_, Some(unwrapped)) => self.optional_binding_declarations.contains_key(&unwrapped),
            (_, None) => false,
        }
    }
}

/// `@Binds @IntoMap` contributions are found through framework-valued map keys only,
/// so a `Map<K, V>` request does not see them twice
fn reaches_delegate_multibindings(key: &Key) -> bool {
    match key.ty().map_entry() {
        None => true,
        Some((_, value)) => {
            key.ty().is_raw_collection()
                || value.is_type_of(names::PROVIDER)
                || value.is_type_of(names::PRODUCER)
                || value.is_type_of(names::PRODUCED)
        }
    }
}
