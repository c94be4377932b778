use std::{collections::HashSet, sync::Arc};

use indexmap::{IndexMap, IndexSet};
use wiring_config::ResolverOptions;

use crate::{
    binding::ContributionBinding,
    binding_factory,
    component::{ComponentDescriptor, ComponentMethodKind, ComponentRequirement},
    errors::ModelError,
    inject::InjectBindingRegistry,
    key::{BindingKey, Key},
    model::ElementModel,
    module::ModuleDescriptor,
    resolved::ResolvedBindings,
    resolver::{ResolutionStats, ResolveContext, Resolver},
    types::{SiteRef, TypeRef},
};

/// The resolved bindings of a component and, recursively, of its subcomponents.
///
/// Built once by [`BindingGraphFactory`] and immutable afterwards.
#[derive(Debug, Clone)]
pub struct BindingGraph {
    component: Arc<ComponentDescriptor>,
    resolved_bindings: IndexMap<BindingKey, Arc<ResolvedBindings>>,
    subgraphs: IndexMap<SiteRef, BindingGraph>,
    owned_modules: IndexSet<Arc<ModuleDescriptor>>,
    inject_errors: Vec<ModelError>,
    full_binding_graph: bool,
}

impl BindingGraph {
    pub fn component(&self) -> &Arc<ComponentDescriptor> {
        &self.component
    }

    pub fn component_type(&self) -> &TypeRef {
        self.component.component_type()
    }

    /// Every key resolved in this component, in resolution order. Keys reused from an
    /// ancestor are included as inherited entries.
    pub fn resolved_bindings(&self) -> &IndexMap<BindingKey, Arc<ResolvedBindings>> {
        &self.resolved_bindings
    }

    pub fn resolved(&self, binding_key: &BindingKey) -> Option<&ResolvedBindings> {
        self.resolved_bindings.get(binding_key).map(Arc::as_ref)
    }

    pub fn contribution(&self, key: &Key) -> Option<&ResolvedBindings> {
        self.resolved(&BindingKey::contribution(key.clone()))
    }

    pub fn members_injection(&self, key: &Key) -> Option<&ResolvedBindings> {
        self.resolved(&BindingKey::members_injection(key.clone()))
    }

    /// Child graphs by the component method creating them. Subcomponents only declared by
    /// modules are keyed by their type.
    pub fn subgraphs(&self) -> &IndexMap<SiteRef, BindingGraph> {
        &self.subgraphs
    }

    /// The child graph for the component `ty`, searching the whole tree
    pub fn subgraph_for(&self, ty: &TypeRef) -> Option<&BindingGraph> {
        self.graphs()
            .into_iter()
            .find(|graph| graph.component_type() == ty)
    }

    /// Transitive modules of the component not installed by an ancestor
    pub fn owned_modules(&self) -> &IndexSet<Arc<ModuleDescriptor>> {
        &self.owned_modules
    }

    pub fn is_full_binding_graph(&self) -> bool {
        self.full_binding_graph
    }

    /// This graph and every graph below it, parents before children
    pub fn graphs(&self) -> Vec<&BindingGraph> {
        let mut graphs = vec![self];
        for subgraph in self.subgraphs.values() {
            graphs.extend(subgraph.graphs());
        }
        graphs
    }

    /// Errors found while creating `@Inject` bindings for keys of this graph
    pub fn inject_errors(&self) -> &[ModelError] {
        &self.inject_errors
    }

    /// Declaration errors of the component, its owned modules and its inject bindings
    pub fn declaration_errors(&self) -> Vec<&ModelError> {
        let mut errors: Vec<&ModelError> = self.component.errors().iter().collect();
        errors.extend(self.owned_modules.iter().flat_map(|m| m.errors()));
        errors.extend(&self.inject_errors);
        errors
    }

    /// Contribution bindings this component holds, with their keys
    pub fn owned_bindings(&self) -> impl Iterator<Item = (&BindingKey, &Arc<ContributionBinding>)> {
        let component = self.component_type();
        self.resolved_bindings
            .iter()
            .filter(|(_, resolved)| !resolved.is_inherited())
            .flat_map(move |(key, resolved)| {
                resolved
                    .bindings_owned_by(component)
                    .map(move |binding| (key, binding))
            })
    }

    /// What the instantiator of the component must supply: owned modules holding bindings
    /// that need a module instance, component dependencies, then bound instances
    pub fn component_requirements(&self) -> IndexSet<ComponentRequirement> {
        let mut requirements = IndexSet::new();

        let instance_modules: HashSet<&TypeRef> = match self.full_binding_graph {
            true => self
                .owned_modules
                .iter()
                .flat_map(|m| m.bindings())
                .filter(|b| b.requires_module_instance())
                .filter_map(|b| b.contributing_module())
                .collect(),
            false => self
                .owned_bindings()
                .map(|(_, binding)| binding)
                .filter(|b| b.requires_module_instance())
                .filter_map(|b| b.contributing_module())
                .collect(),
        };
        requirements.extend(
            self.owned_modules
                .iter()
                .map(|m| m.module_type())
                .filter(|ty| instance_modules.contains(ty))
                .map(|ty| ComponentRequirement::module(ty.clone())),
        );
        requirements.extend(
            self.component
                .dependencies()
                .iter()
                .map(|ty| ComponentRequirement::dependency(ty.clone())),
        );
        requirements.extend(
            self.component
                .bound_instances()
                .map(|(key, _)| ComponentRequirement::bound_instance(key.clone())),
        );
        requirements
    }

    /// Keys owned by this component, each after the owned keys it depends on
    pub fn initialization_order(&self) -> Vec<&BindingKey> {
        let mut order = IndexSet::new();
        let mut visiting = HashSet::new();
        for key in self.resolved_bindings.keys() {
            visit(self, key, &mut visiting, &mut order);
        }
        return order.into_iter().collect();

        fn visit<'g>(
            graph: &'g BindingGraph,
            key: &'g BindingKey,
            visiting: &mut HashSet<&'g BindingKey>,
            order: &mut IndexSet<&'g BindingKey>,
        ) {
            if order.contains(key) || !visiting.insert(key) {
                return;
            }
            let Some((key, resolved)) = graph.resolved_bindings.get_key_value(key) else {
                return;
            };
            if resolved.is_inherited() || !resolved.is_owned_by(graph.component_type()) {
                return;
            }

            let component = graph.component_type();
            let mut dependencies: Vec<BindingKey> = resolved
                .bindings_owned_by(component)
                .flat_map(|binding| binding.dependencies().iter().map(|d| d.binding_key()))
                .collect();
            if let Some(binding) = resolved.members_injection_binding() {
                dependencies.extend(binding.dependencies().map(|d| d.binding_key()));
            }
            for dependency in dependencies {
                if let Some((dependency, _)) = graph.resolved_bindings.get_key_value(&dependency) {
                    visit(graph, dependency, visiting, order);
                }
            }
            order.insert(key);
        }
    }
}

/// Creates binding graphs for root components.
///
/// The `@Inject` bindings found are cached for the lifetime of the factory.
pub struct BindingGraphFactory<'m> {
    registry: InjectBindingRegistry<'m>,
    options: ResolverOptions,
    stats: ResolutionStats,
}

impl<'m> BindingGraphFactory<'m> {
    pub fn new(model: &'m dyn ElementModel, options: ResolverOptions) -> Self {
        Self {
            registry: InjectBindingRegistry::new(model),
            options,
            stats: ResolutionStats::default(),
        }
    }

    pub fn options(&self) -> &ResolverOptions {
        &self.options
    }

    pub fn stats(&self) -> ResolutionStats {
        self.stats
    }

    pub fn registry(&self) -> &InjectBindingRegistry<'m> {
        &self.registry
    }

    pub fn create(&mut self, component: Arc<ComponentDescriptor>) -> BindingGraph {
        let (mut graph, _) = self.create_graph(None, component);
        self.attach_inject_errors(&mut graph);
        graph
    }

    fn create_graph(
        &mut self,
        parent: Option<Box<Resolver>>,
        component: Arc<ComponentDescriptor>,
    ) -> (BindingGraph, Option<Box<Resolver>>) {
        let bindings = explicit_bindings(&component);
        let mut resolver = Resolver::new(parent, component.clone(), bindings);

        {
            let mut cx = ResolveContext {
                registry: &mut self.registry,
                options: &self.options,
                stats: &mut self.stats,
            };
            cx.stats.components += 1;
            for entry_point in component.entry_points() {
                resolver.resolve(&entry_point.binding_key(), &mut cx);
            }
            if self.options.full_binding_graph {
                // Contribution ids are stripped, so the multibindings themselves are resolved
                for module in component.transitive_modules() {
                    for key in module.all_binding_keys() {
                        resolver.resolve(&BindingKey::contribution(key), &mut cx);
                    }
                }
            }
        }

        // Building a subgraph can queue more subcomponents here
        let mut subgraphs = IndexMap::new();
        let mut built = HashSet::new();
        while let Some(subcomponent) = resolver.next_subcomponent() {
            if !built.insert(subcomponent.clone()) {
                continue;
            }
            let site = subgraph_site(&component, &subcomponent);
            let (subgraph, parent) = self.create_graph(Some(Box::new(resolver)), subcomponent);
            resolver = *parent.expect("a subcomponent resolver hands back its parent");
            subgraphs.insert(site, subgraph);
        }

        let owned_modules = resolver.owned_modules();
        let lineage = resolver.component_lineage();
        let (resolved_bindings, parent) = resolver.finish();
        for resolved in resolved_bindings.values() {
            assert_eq!(
                resolved.component(),
                component.component_type(),
                "'{}' was resolved for another component",
                resolved.binding_key()
            );
            // Owners are this component or one of its ancestors, never a sibling or child
            for owner in resolved.bindings_by_owner().keys() {
                assert!(
                    lineage.contains(*owner),
                    "'{}' in '{}' is owned by '{}' outside its lineage",
                    resolved.binding_key(),
                    component.component_type(),
                    owner
                );
            }
        }
        tracing::debug!(
            "Resolved {} keys in '{}'",
            resolved_bindings.len(),
            component.component_type()
        );

        let graph = BindingGraph {
            component,
            resolved_bindings,
            subgraphs,
            owned_modules,
            inject_errors: Vec::new(),
            full_binding_graph: self.options.full_binding_graph,
        };
        (graph, parent)
    }

    fn attach_inject_errors(&self, graph: &mut BindingGraph) {
        let mut errors = Vec::new();
        for key in graph.resolved_bindings.keys() {
            for error in self.registry.errors_for(key.key()) {
                if !errors.contains(error) {
                    errors.push(error.clone());
                }
            }
        }
        graph.inject_errors = errors;
        for subgraph in graph.subgraphs.values_mut() {
            self.attach_inject_errors(subgraph);
        }
    }
}

/// Explicit bindings a component has besides those of its modules
fn explicit_bindings(component: &ComponentDescriptor) -> Vec<Arc<ContributionBinding>> {
    let mut bindings = vec![binding_factory::component_binding(component.component_type())];
    for dependency in component.dependencies() {
        bindings.push(binding_factory::component_dependency_binding(dependency));
    }
    for method in component.dependency_methods() {
        bindings.push(binding_factory::component_method_binding(method));
    }
    for (key, method) in component.bound_instances() {
        bindings.push(binding_factory::bound_instance_binding(key, method));
    }
    // Builders of subcomponents also declared by modules are bound through the declaration
    for (method, child) in component.subcomponents() {
        let Some(request) = &method.request else {
            continue;
        };
        if method.kind == ComponentMethodKind::SubcomponentBuilder
            && !component.subcomponents_from_modules().contains(child)
        {
            bindings.push(binding_factory::subcomponent_builder_binding(
                request.key(),
                &method.method,
            ));
        }
    }
    bindings.into_iter().map(Arc::new).collect()
}

fn subgraph_site(parent: &ComponentDescriptor, child: &Arc<ComponentDescriptor>) -> SiteRef {
    parent
        .subcomponents()
        .iter()
        .find(|(_, subcomponent)| *subcomponent == child)
        .map(|(method, _)| method.method.clone())
        .unwrap_or_else(|| SiteRef::of_type(child.component_type()))
}
