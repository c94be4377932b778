//! Wiring Graph resolves the binding graph of a dependency injection component at build time.
//!
//! A front end describes the program as an [`ElementModel`](model::ElementModel): types with their annotations,
//! constructors, methods and fields. From it the descriptor factories build what a component
//! declares, and the [`BindingGraphFactory`] resolves every key the component needs into a
//! [`BindingGraph`], one per component and subcomponent.
//!
//! # Examples
//!
//! ```rust
//! use wiring_graph::{
//!     model::{Annotation, MethodElement, ParameterElement, SourceModel, TypeElement},
//!     types::TypeRef,
//!     validate, BindingGraphFactory, ComponentDescriptorFactory, ResolverOptions,
//! };
//!
//! let heater = TypeRef::declared("Heater");
//! let model = SourceModel::builder()
//!     .add_type(TypeElement::class("Heater").with_inject_constructor(vec![]))
//!     .add_type(
//!         TypeElement::class("CoffeeMaker")
//!             .with_inject_constructor(vec![ParameterElement::new("heater", heater)]),
//!     )
//!     .add_type(
//!         TypeElement::interface("CoffeeShop")
//!             .annotated(Annotation::component(vec![]))
//!             .with_method(MethodElement::abstract_method(
//!                 "maker",
//!                 TypeRef::declared("CoffeeMaker"),
//!             )),
//!     )
//!     .build()?;
//!
//! let component = ComponentDescriptorFactory::new(&model)
//!     .for_component(&TypeRef::declared("CoffeeShop"))?;
//! let options = ResolverOptions::default();
//! let graph = BindingGraphFactory::new(&model, options.clone()).create(component);
//!
//! assert_eq!(graph.resolved_bindings().len(), 2);
//! assert!(validate(&graph, &options).is_clean());
//! # Ok::<(), wiring_graph::ModelError>(())
//! ```
//!
//! Wiring Graph consists of the following components:
//!
//! 1. Types, Keys and Requests - the identity of what can be injected and how it is asked for
//! 2. Model - the element model read by the factories
//! 3. Bindings - recipes for keys and the declarations shaping them
//! 4. Descriptors - what modules and components declare
//! 5. Resolver - per-component resolution, chained to the ancestors
//! 6. Graph - the resolved tree handed to code generation
//! 7. Validation - reports every problem of a resolved tree at once

pub mod binding;
pub mod binding_factory;
pub mod component;
pub mod errors;
pub mod graph;
pub mod inject;
pub mod key;
pub mod model;
pub mod module;
pub mod request;
pub mod resolved;
mod resolver;
pub mod types;
pub mod validation;

pub use component::{ComponentDescriptor, ComponentDescriptorFactory, ComponentRequirement};
pub use errors::{BindingGraphError, BindingGraphErrors, ModelError};
pub use graph::{BindingGraph, BindingGraphFactory};
pub use key::{BindingKey, Key};
pub use module::{ModuleDescriptor, ModuleDescriptorFactory};
pub use request::{DependencyRequest, RequestKind};
pub use resolved::{BindingStatus, ResolvedBindings};
pub use resolver::ResolutionStats;
pub use validation::{validate, ValidationReport};
pub use wiring_config::{
    ConfigError, OptionsLoader, ResolverOptions, Severity, UndeclaredMultibindings,
};
