#![allow(dead_code)]

use wiring_graph::{
    model::{Annotation, MethodElement, SourceModel},
    types::TypeRef,
    BindingGraph, BindingGraphFactory, BindingKey, ComponentDescriptorFactory, Key,
    ResolverOptions,
};

pub fn ty(name: &str) -> TypeRef {
    TypeRef::declared(name)
}

pub fn key(name: &str) -> Key {
    Key::new(ty(name))
}

pub fn contribution(name: &str) -> BindingKey {
    BindingKey::contribution(key(name))
}

/// `@Provides` method taking no parameters
pub fn provides(name: &str, returns: TypeRef) -> MethodElement {
    MethodElement::new(name, returns)
        .static_method()
        .annotated(Annotation::Provides)
}

/// Abstract component method returning `returns`
pub fn entry(name: &str, returns: TypeRef) -> MethodElement {
    MethodElement::abstract_method(name, returns)
}

pub fn create(model: &SourceModel, component: &str) -> BindingGraph {
    create_with(model, component, ResolverOptions::default())
}

pub fn create_with(model: &SourceModel, component: &str, options: ResolverOptions) -> BindingGraph {
    let component = ComponentDescriptorFactory::new(model)
        .for_component(&ty(component))
        .expect("component descriptor");
    BindingGraphFactory::new(model, options).create(component)
}

/// Keys of a graph in resolution order, rendered
pub fn keys(graph: &BindingGraph) -> Vec<String> {
    graph
        .resolved_bindings()
        .keys()
        .map(ToString::to_string)
        .collect()
}
