//! Graphviz output for resolved binding graphs.
//!
//! ```rust
//! use wiring_dot::{DotStrategy, GraphStrategy, RankDirection};
//! use wiring_graph::{
//!     model::{Annotation, MethodElement, SourceModel, TypeElement},
//!     types::TypeRef,
//!     BindingGraphFactory, ComponentDescriptorFactory, ResolverOptions,
//! };
//!
//! let model = SourceModel::builder()
//!     .add_type(TypeElement::class("Heater").with_inject_constructor(vec![]))
//!     .add_type(
//!         TypeElement::interface("CoffeeShop")
//!             .annotated(Annotation::component(vec![]))
//!             .with_method(MethodElement::abstract_method("heater", TypeRef::declared("Heater"))),
//!     )
//!     .build()?;
//! let component = ComponentDescriptorFactory::new(&model)
//!     .for_component(&TypeRef::declared("CoffeeShop"))?;
//! let graph = BindingGraphFactory::new(&model, ResolverOptions::default()).create(component);
//!
//! let dot = DotStrategy::builder()
//!     .rank_direction(RankDirection::LeftToRight)
//!     .build()
//!     .render(&graph)?;
//! assert!(dot.contains("\"CoffeeShop/Heater\" [label=\"Heater\"];"));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod builder;
pub mod render;
pub mod traits;

pub use builder::DotStrategyBuilder;
pub use render::{DotStrategy, RankDirection};
pub use traits::{GraphStrategy, RenderError};
