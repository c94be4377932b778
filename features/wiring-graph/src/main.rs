use std::error::Error;

use tracing_subscriber::EnvFilter;
use wiring_graph::{
    model::{Annotation, MethodElement, ParameterElement, SourceModel, TypeElement},
    types::{Scope, TypeRef},
    validate, BindingGraphFactory, ComponentDescriptorFactory, OptionsLoader,
};

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // An optional TOML file with resolver options, e.g. `full_binding_graph = true`
    let mut loader = OptionsLoader::new();
    if let Some(path) = std::env::args().nth(1) {
        loader = loader.with_config_path(path);
    }
    let options = loader.load()?;

    let model = coffee_shop()?;
    let component = ComponentDescriptorFactory::new(&model).for_component(&ty("CoffeeShop"))?;
    let mut factory = BindingGraphFactory::new(&model, options.clone());
    let graph = factory.create(component);
    tracing::info!(
        "Resolved {} components with {} lookups",
        factory.stats().components,
        factory.stats().lookups
    );

    for graph in graph.graphs() {
        let order: Vec<String> = graph
            .initialization_order()
            .iter()
            .map(ToString::to_string)
            .collect();
        tracing::info!(
            "'{}' initializes {}",
            graph.component_type(),
            order.join(", ")
        );
        for requirement in graph.component_requirements() {
            tracing::info!(
                "'{}' requires {:?} '{}'",
                graph.component_type(),
                requirement.kind,
                requirement.ty
            );
        }
    }

    let report = validate(&graph, &options);
    for warning in &report.warnings {
        tracing::warn!("{}", warning);
    }
    report.into_result()?;
    Ok(())
}

fn ty(name: &str) -> TypeRef {
    TypeRef::declared(name)
}

fn coffee_shop() -> Result<SourceModel, wiring_graph::ModelError> {
    let singleton = Annotation::Scope(Scope::singleton());

    SourceModel::builder()
        .add_type(
            TypeElement::class("DripCoffeeModule")
                .abstract_type()
                .annotated(Annotation::module(vec![]))
                .with_method(
                    MethodElement::new("heater", ty("Heater"))
                        .static_method()
                        .annotated(Annotation::Provides)
                        .annotated(singleton.clone()),
                )
                .with_method(
                    MethodElement::abstract_method("pump", ty("Pump"))
                        .with_param("pump", ty("Thermosiphon"))
                        .annotated(Annotation::Binds),
                )
                .with_method(
                    MethodElement::new("espresso", ty("Recipe"))
                        .static_method()
                        .annotated(Annotation::Provides)
                        .annotated(Annotation::IntoSet),
                ),
        )
        .add_type(
            TypeElement::class("SeasonalModule")
                .annotated(Annotation::module(vec![]))
                .with_method(
                    MethodElement::new("pumpkinSpice", ty("Recipe"))
                        .annotated(Annotation::Provides)
                        .annotated(Annotation::IntoSet),
                ),
        )
        .add_type(TypeElement::class("Heater"))
        .add_type(TypeElement::interface("Pump"))
        .add_type(TypeElement::class("Recipe"))
        .add_type(
            TypeElement::class("Thermosiphon")
                .with_inject_constructor(vec![ParameterElement::new("heater", ty("Heater"))]),
        )
        .add_type(TypeElement::class("CoffeeMaker").with_inject_constructor(vec![
            ParameterElement::new("heater", TypeRef::lazy_of(ty("Heater"))),
            ParameterElement::new("pump", ty("Pump")),
        ]))
        .add_type(TypeElement::class("Barista").with_inject_constructor(vec![
            ParameterElement::new("maker", ty("CoffeeMaker")),
            ParameterElement::new("recipes", TypeRef::set_of(ty("Recipe"))),
        ]))
        .add_type(
            TypeElement::interface("CoffeeShop")
                .annotated(Annotation::component(vec![ty("DripCoffeeModule")]))
                .annotated(singleton)
                .with_method(MethodElement::abstract_method("maker", ty("CoffeeMaker")))
                .with_method(MethodElement::abstract_method(
                    "menu",
                    TypeRef::set_of(ty("Recipe")),
                ))
                .with_method(MethodElement::abstract_method("shift", ty("Shift"))),
        )
        .add_type(
            TypeElement::interface("Shift")
                .annotated(Annotation::subcomponent(vec![ty("SeasonalModule")]))
                .with_method(MethodElement::abstract_method("barista", ty("Barista"))),
        )
        .build()
}
