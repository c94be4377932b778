mod common;

use common::{contribution, create, create_with, entry, key, keys, provides, ty};
use wiring_graph::{
    binding::{BindingKind, BindingType},
    model::{Annotation, FieldElement, MethodElement, ParameterElement, SourceModel, TypeElement},
    types::{MapKey, Qualifier, Scope, TypeRef},
    validate, BindingGraphError, BindingGraphFactory, BindingStatus, ComponentDescriptorFactory,
    ComponentRequirement, Key, ModelError, RequestKind, ResolverOptions, Severity,
    UndeclaredMultibindings,
};

fn component(name: &str, modules: &[&str]) -> TypeElement {
    TypeElement::interface(name)
        .annotated(Annotation::component(modules.iter().map(|m| ty(m)).collect()))
}

fn module(name: &str) -> TypeElement {
    TypeElement::class(name).annotated(Annotation::module(vec![]))
}

fn injectable(name: &str, parameters: Vec<ParameterElement>) -> TypeElement {
    TypeElement::class(name).with_inject_constructor(parameters)
}

fn param(name: &str, ty: TypeRef) -> ParameterElement {
    ParameterElement::new(name, ty)
}

#[test]
fn simple_provision_is_owned_by_the_component() {
    let model = SourceModel::builder()
        .add_type(module("M").with_method(provides("foo", ty("Foo"))))
        .add_type(TypeElement::class("Foo"))
        .add_type(component("C", &["M"]).with_method(entry("getFoo", ty("Foo"))))
        .build()
        .unwrap();

    let graph = create(&model, "C");
    assert_eq!(keys(&graph), ["Foo"]);

    let resolved = graph.contribution(&key("Foo")).unwrap();
    assert_eq!(resolved.status(), BindingStatus::Unique);
    assert!(resolved.is_owned_by(&ty("C")));
    let binding = resolved.contribution_binding().unwrap();
    assert_eq!(binding.kind(), BindingKind::Provision);
    assert!(binding.dependencies().is_empty());
    assert_eq!(resolved.owning_component(binding), Some(&ty("C")));

    // Static binding methods need no module instance
    assert!(graph.component_requirements().is_empty());
    assert!(validate(&graph, &ResolverOptions::default()).is_clean());
}

#[test]
fn instance_binding_methods_require_their_module() {
    let model = SourceModel::builder()
        .add_type(
            module("M").with_method(MethodElement::new("foo", ty("Foo")).annotated(Annotation::Provides)),
        )
        .add_type(component("C", &["M"]).with_method(entry("foo", ty("Foo"))))
        .build()
        .unwrap();

    let graph = create(&model, "C");
    let requirements: Vec<_> = graph.component_requirements().into_iter().collect();
    assert_eq!(requirements, [ComponentRequirement::module(ty("M"))]);
}

#[test]
fn missing_bindings_are_resolved_not_thrown() {
    let model = SourceModel::builder()
        .add_type(TypeElement::class("Bar"))
        .add_type(component("C", &[]).with_method(entry("getBar", ty("Bar"))))
        .build()
        .unwrap();

    let graph = create(&model, "C");
    let resolved = graph.contribution(&key("Bar")).unwrap();
    assert_eq!(resolved.status(), BindingStatus::Missing);
    assert!(resolved.is_empty());

    let report = validate(&graph, &ResolverOptions::default());
    assert_eq!(
        report.errors,
        [BindingGraphError::MissingBinding {
            key: contribution("Bar"),
            component: ty("C"),
            requested_by: vec!["C.getBar()".to_string()],
        }]
    );
    let message = report.into_result().unwrap_err().to_string();
    assert!(message.starts_with("The binding graph had one or more errors:\n- 'Bar'"));
}

#[test]
fn qualifiers_keep_keys_apart() {
    let model = SourceModel::builder()
        .add_type(
            module("M")
                .with_method(provides("a", ty("String")).annotated(Annotation::named("a")))
                .with_method(provides("b", ty("String")).annotated(Annotation::named("b"))),
        )
        .add_type(
            component("C", &["M"])
                .with_method(entry("a", ty("String")).annotated(Annotation::named("a")))
                .with_method(entry("b", ty("String")).annotated(Annotation::named("b"))),
        )
        .build()
        .unwrap();

    let graph = create(&model, "C");
    let a = Key::qualified(Some(Qualifier::named("a")), ty("String"));
    let b = Key::qualified(Some(Qualifier::named("b")), ty("String"));
    assert_ne!(a, b);

    let resolved_a = graph.contribution(&a).unwrap();
    let resolved_b = graph.contribution(&b).unwrap();
    assert_eq!(resolved_a.status(), BindingStatus::Unique);
    assert_eq!(resolved_b.status(), BindingStatus::Unique);
    assert_ne!(resolved_a.contribution_binding(), resolved_b.contribution_binding());
    assert!(graph.contribution(&key("String")).is_none());
}

#[test]
fn set_contributions_are_gathered_by_one_binding() {
    let into_set = |name: &str| provides(name, ty("Plugin")).annotated(Annotation::IntoSet);
    let model = SourceModel::builder()
        .add_type(module("P1").with_method(into_set("a")).with_method(into_set("b")))
        .add_type(module("P2").with_method(into_set("c")))
        .add_type(
            component("C", &["P1", "P2"])
                .with_method(entry("plugins", TypeRef::set_of(ty("Plugin")))),
        )
        .build()
        .unwrap();

    let graph = create(&model, "C");
    let plugins = graph
        .contribution(&Key::new(TypeRef::set_of(ty("Plugin"))))
        .unwrap();
    assert_eq!(plugins.status(), BindingStatus::Multibinding);

    let binding = plugins.contribution_binding().unwrap();
    assert_eq!(binding.kind(), BindingKind::MultiboundSet);
    assert_eq!(binding.dependencies().len(), 3);
    for request in binding.dependencies() {
        let contribution = graph.resolved(&request.binding_key()).unwrap();
        assert_eq!(contribution.status(), BindingStatus::Unique);
    }
    assert_eq!(graph.resolved_bindings().len(), 4);
}

#[test]
fn declared_multibindings_may_be_empty() {
    let model = SourceModel::builder()
        .add_type(
            TypeElement::class("M")
                .abstract_type()
                .annotated(Annotation::module(vec![]))
                .with_method(
                    MethodElement::abstract_method("plugins", TypeRef::set_of(ty("Plugin")))
                        .annotated(Annotation::Multibinds),
                ),
        )
        .add_type(
            component("C", &["M"]).with_method(entry("plugins", TypeRef::set_of(ty("Plugin")))),
        )
        .build()
        .unwrap();

    let graph = create(&model, "C");
    let plugins = graph
        .contribution(&Key::new(TypeRef::set_of(ty("Plugin"))))
        .unwrap();
    assert_eq!(plugins.status(), BindingStatus::Multibinding);
    assert_eq!(plugins.multibinding_declarations().len(), 1);
    assert!(plugins.contribution_binding().unwrap().dependencies().is_empty());
}

#[test]
fn undeclared_multibindings_follow_the_policy() {
    let model = SourceModel::builder()
        .add_type(component("C", &[]).with_method(entry("plugins", TypeRef::set_of(ty("Plugin")))))
        .build()
        .unwrap();
    let plugins = Key::new(TypeRef::set_of(ty("Plugin")));

    let graph = create(&model, "C");
    assert_eq!(
        graph.contribution(&plugins).unwrap().status(),
        BindingStatus::Missing
    );

    let options =
        ResolverOptions::default().with_undeclared_multibindings(UndeclaredMultibindings::Empty);
    let graph = create_with(&model, "C", options);
    assert_eq!(
        graph.contribution(&plugins).unwrap().status(),
        BindingStatus::Multibinding
    );
}

#[test]
fn cycles_through_providers_are_legal() {
    let model = SourceModel::builder()
        .add_type(injectable("A", vec![param("b", TypeRef::provider_of(ty("B")))]))
        .add_type(injectable("B", vec![param("a", ty("A"))]))
        .add_type(component("C", &[]).with_method(entry("a", ty("A"))))
        .build()
        .unwrap();

    let graph = create(&model, "C");
    assert_eq!(keys(&graph), ["A", "B"]);
    assert!(validate(&graph, &ResolverOptions::default()).is_clean());
}

#[test]
fn direct_cycles_are_reported_once() {
    let model = SourceModel::builder()
        .add_type(injectable("X", vec![param("y", ty("Y"))]))
        .add_type(injectable("Y", vec![param("x", ty("X"))]))
        .add_type(
            component("C", &[])
                .with_method(entry("x", ty("X")))
                .with_method(entry("y", ty("Y"))),
        )
        .build()
        .unwrap();

    let graph = create(&model, "C");
    let cycle = BindingGraphError::DependencyCycle {
        component: ty("C"),
        chain: vec![contribution("X"), contribution("Y"), contribution("X")],
    };

    let report = validate(&graph, &ResolverOptions::default());
    assert_eq!(report.errors, [cycle.clone()]);

    let warn = ResolverOptions::default().with_cycle_validation(Severity::Warning);
    let report = validate(&graph, &warn);
    assert!(report.errors.is_empty());
    assert_eq!(report.warnings, [cycle]);
    assert!(report.into_result().is_ok());

    let off = ResolverOptions::default().with_cycle_validation(Severity::Off);
    assert!(validate(&graph, &off).is_clean());
}

#[test]
fn delegates_resolve_their_target() {
    let model = SourceModel::builder()
        .add_type(
            TypeElement::class("M")
                .abstract_type()
                .annotated(Annotation::module(vec![]))
                .with_method(
                    MethodElement::abstract_method("pump", ty("Pump"))
                        .with_param("pump", ty("Thermosiphon"))
                        .annotated(Annotation::Binds),
                ),
        )
        .add_type(TypeElement::interface("Pump"))
        .add_type(injectable("Thermosiphon", vec![]))
        .add_type(component("C", &["M"]).with_method(entry("pump", ty("Pump"))))
        .build()
        .unwrap();

    let graph = create(&model, "C");
    assert_eq!(keys(&graph), ["Pump", "Thermosiphon"]);

    let pump = graph.contribution(&key("Pump")).unwrap();
    let delegate = pump.contribution_binding().unwrap();
    assert_eq!(delegate.kind(), BindingKind::Delegate);
    assert_eq!(delegate.dependencies()[0].key(), &key("Thermosiphon"));

    let target = graph.contribution(&key("Thermosiphon")).unwrap();
    assert_eq!(
        target.contribution_binding().unwrap().kind(),
        BindingKind::Injection
    );
}

#[test]
fn delegates_without_a_target_report_the_target_as_missing() {
    let model = SourceModel::builder()
        .add_type(
            TypeElement::class("M")
                .abstract_type()
                .annotated(Annotation::module(vec![]))
                .with_method(
                    MethodElement::abstract_method("pump", ty("Pump"))
                        .with_param("pump", ty("Thermosiphon"))
                        .annotated(Annotation::Binds),
                ),
        )
        .add_type(TypeElement::interface("Pump"))
        .add_type(TypeElement::class("Thermosiphon"))
        .add_type(component("C", &["M"]).with_method(entry("pump", ty("Pump"))))
        .build()
        .unwrap();

    let graph = create(&model, "C");
    assert_eq!(keys(&graph), ["Pump", "Thermosiphon"]);

    let pump = graph.contribution(&key("Pump")).unwrap();
    assert_eq!(pump.status(), BindingStatus::Unique);
    let delegate = pump.contribution_binding().unwrap();
    assert_eq!(delegate.kind(), BindingKind::Delegate);
    assert_eq!(delegate.binding_type(), BindingType::Provision);
    assert_eq!(
        graph.contribution(&key("Thermosiphon")).unwrap().status(),
        BindingStatus::Missing
    );

    let report = validate(&graph, &ResolverOptions::default());
    assert_eq!(
        report.errors,
        [BindingGraphError::MissingBinding {
            key: contribution("Thermosiphon"),
            component: ty("C"),
            requested_by: vec!["M.pump(#0)".to_string()],
        }]
    );
}

#[test]
fn optionals_are_present_only_when_bound() {
    let optional_module = TypeElement::class("OptionalModule")
        .abstract_type()
        .annotated(Annotation::module(vec![]))
        .with_method(
            MethodElement::abstract_method("heater", ty("Heater"))
                .annotated(Annotation::BindsOptionalOf),
        );
    let shop = |modules: &[&str]| {
        component("C", modules).with_method(entry("heater", TypeRef::optional_of(ty("Heater"))))
    };
    let optional_heater = Key::new(TypeRef::optional_of(ty("Heater")));

    let absent = SourceModel::builder()
        .add_type(optional_module.clone())
        .add_type(TypeElement::class("Heater"))
        .add_type(shop(&["OptionalModule"]))
        .build()
        .unwrap();
    let graph = create(&absent, "C");
    let binding = graph
        .contribution(&optional_heater)
        .unwrap()
        .contribution_binding()
        .unwrap()
        .clone();
    assert_eq!(binding.kind(), BindingKind::Optional);
    assert!(binding.dependencies().is_empty());
    assert_eq!(keys(&graph), ["Optional<Heater>"]);

    let present = SourceModel::builder()
        .add_type(optional_module)
        .add_type(module("HeaterModule").with_method(provides("heater", ty("Heater"))))
        .add_type(TypeElement::class("Heater"))
        .add_type(shop(&["OptionalModule", "HeaterModule"]))
        .build()
        .unwrap();
    let graph = create(&present, "C");
    let binding = graph
        .contribution(&optional_heater)
        .unwrap()
        .contribution_binding()
        .unwrap()
        .clone();
    assert_eq!(binding.dependencies().len(), 1);
    assert_eq!(keys(&graph), ["Optional<Heater>", "Heater"]);
}

#[test]
fn members_injection_methods_resolve_injected_members() {
    let model = SourceModel::builder()
        .add_type(injectable("Engine", vec![]))
        .add_type(
            TypeElement::class("Target")
                .with_field(FieldElement::new("engine", ty("Engine")).annotated(Annotation::Inject)),
        )
        .add_type(
            component("C", &[]).with_method(
                MethodElement::abstract_method("inject", TypeRef::Void)
                    .with_param("target", ty("Target")),
            ),
        )
        .build()
        .unwrap();

    let graph = create(&model, "C");
    assert_eq!(keys(&graph), ["members of Target", "Engine"]);

    let members = graph.members_injection(&key("Target")).unwrap();
    assert_eq!(members.status(), BindingStatus::Unique);
    assert_eq!(
        members
            .members_injection_binding()
            .unwrap()
            .injection_sites()
            .len(),
        1
    );
}

#[test]
fn injected_types_with_members_depend_on_their_members_injection() {
    let model = SourceModel::builder()
        .add_type(injectable("Engine", vec![]))
        .add_type(
            injectable("Car", vec![])
                .with_field(FieldElement::new("engine", ty("Engine")).annotated(Annotation::Inject)),
        )
        .add_type(component("C", &[]).with_method(entry("car", ty("Car"))))
        .build()
        .unwrap();

    let graph = create(&model, "C");
    assert_eq!(keys(&graph), ["Car", "members of Car", "Engine"]);

    let car = graph.contribution(&key("Car")).unwrap();
    let kinds: Vec<_> = car
        .contribution_binding()
        .unwrap()
        .dependencies()
        .iter()
        .map(|d| d.kind())
        .collect();
    assert_eq!(kinds, [RequestKind::MembersInjector]);
}

#[test]
fn maps_are_satisfied_by_framework_map_contributions() {
    let into_map = |name: &str, key: &str| {
        provides(name, ty("Coffee"))
            .annotated(Annotation::IntoMap)
            .annotated(Annotation::MapKey(MapKey::string(key)))
    };
    let model = SourceModel::builder()
        .add_type(
            module("M")
                .with_method(into_map("espresso", "espresso"))
                .with_method(into_map("latte", "latte")),
        )
        .add_type(
            component("C", &["M"])
                .with_method(entry("menu", TypeRef::map_of(ty("String"), ty("Coffee"))))
                .with_method(entry(
                    "recipes",
                    TypeRef::map_of(ty("String"), TypeRef::provider_of(ty("Coffee"))),
                )),
        )
        .build()
        .unwrap();

    let graph = create(&model, "C");
    let menu = graph
        .contribution(&Key::new(TypeRef::map_of(ty("String"), ty("Coffee"))))
        .unwrap()
        .contribution_binding()
        .unwrap()
        .clone();
    assert_eq!(menu.kind(), BindingKind::MultiboundMap);
    assert_eq!(menu.dependencies().len(), 2);
    assert!(menu
        .dependencies()
        .iter()
        .all(|d| d.kind() == RequestKind::Instance));

    let recipes = graph
        .contribution(&Key::new(TypeRef::map_of(
            ty("String"),
            TypeRef::provider_of(ty("Coffee")),
        )))
        .unwrap()
        .contribution_binding()
        .unwrap()
        .clone();
    assert_eq!(recipes.dependencies().len(), 2);
    assert!(recipes
        .dependencies()
        .iter()
        .all(|d| d.kind() == RequestKind::Provider));
    assert!(validate(&graph, &ResolverOptions::default()).is_clean());
}

#[test]
fn duplicate_map_keys_are_reported() {
    let into_map = |name: &str| {
        provides(name, ty("Coffee"))
            .annotated(Annotation::IntoMap)
            .annotated(Annotation::MapKey(MapKey::string("espresso")))
    };
    let menu = TypeRef::map_of(ty("String"), ty("Coffee"));
    let model = SourceModel::builder()
        .add_type(module("M").with_method(into_map("a")).with_method(into_map("b")))
        .add_type(component("C", &["M"]).with_method(entry("menu", menu.clone())))
        .build()
        .unwrap();

    let graph = create(&model, "C");
    let report = validate(&graph, &ResolverOptions::default());
    assert_eq!(
        report.errors,
        [BindingGraphError::DuplicateMapKeys {
            key: wiring_graph::BindingKey::contribution(Key::new(menu)),
            map_key: MapKey::string("espresso"),
            component: ty("C"),
        }]
    );
}

#[test]
fn duplicate_bindings_are_reported() {
    let model = SourceModel::builder()
        .add_type(module("M1").with_method(provides("foo", ty("Foo"))))
        .add_type(module("M2").with_method(provides("foo", ty("Foo"))))
        .add_type(component("C", &["M1", "M2"]).with_method(entry("foo", ty("Foo"))))
        .build()
        .unwrap();

    let graph = create(&model, "C");
    assert_eq!(
        graph.contribution(&key("Foo")).unwrap().status(),
        BindingStatus::Duplicate
    );
    let report = validate(&graph, &ResolverOptions::default());
    assert!(matches!(
        report.errors.as_slice(),
        [BindingGraphError::DuplicateBindings { bindings, .. }] if bindings.len() == 2
    ));
}

#[test]
fn scoped_bindings_need_the_scope_on_their_component() {
    let singleton = Annotation::Scope(Scope::singleton());
    let heater = injectable("Heater", vec![]).annotated(singleton.clone());
    let unscoped = SourceModel::builder()
        .add_type(heater.clone())
        .add_type(component("C", &[]).with_method(entry("heater", ty("Heater"))))
        .build()
        .unwrap();

    let graph = create(&unscoped, "C");
    let report = validate(&graph, &ResolverOptions::default());
    assert_eq!(
        report.errors,
        [BindingGraphError::IncompatiblyScopedBinding {
            key: contribution("Heater"),
            scope: Scope::singleton(),
            component: ty("C"),
        }]
    );
    let off = ResolverOptions::default().with_scope_validation(Severity::Off);
    assert!(validate(&graph, &off).is_clean());

    let scoped = SourceModel::builder()
        .add_type(heater)
        .add_type(
            component("C", &[])
                .annotated(singleton)
                .with_method(entry("heater", ty("Heater"))),
        )
        .build()
        .unwrap();
    let graph = create(&scoped, "C");
    assert!(validate(&graph, &ResolverOptions::default()).is_clean());
}

#[test]
fn component_dependencies_provide_their_methods() {
    let model = SourceModel::builder()
        .add_type(TypeElement::interface("Store").with_method(entry("beans", ty("Beans"))))
        .add_type(
            TypeElement::interface("C")
                .annotated(Annotation::Component {
                    modules: vec![],
                    dependencies: vec![ty("Store")],
                })
                .with_method(entry("beans", ty("Beans")))
                .with_method(entry("store", ty("Store"))),
        )
        .build()
        .unwrap();

    let graph = create(&model, "C");
    let kind = |name: &str| {
        graph
            .contribution(&key(name))
            .and_then(|resolved| resolved.contribution_binding())
            .map(|binding| binding.kind())
    };
    assert_eq!(kind("Beans"), Some(BindingKind::ComponentProvision));
    assert_eq!(kind("Store"), Some(BindingKind::ComponentDependency));

    let requirements: Vec<_> = graph.component_requirements().into_iter().collect();
    assert_eq!(requirements, [ComponentRequirement::dependency(ty("Store"))]);
}

#[test]
fn full_binding_graphs_resolve_every_module_key() {
    let model = SourceModel::builder()
        .add_type(
            module("M")
                .with_method(provides("foo", ty("Foo")))
                .with_method(provides("bar", ty("Bar"))),
        )
        .add_type(component("C", &["M"]).with_method(entry("foo", ty("Foo"))))
        .build()
        .unwrap();

    let graph = create(&model, "C");
    assert_eq!(keys(&graph), ["Foo"]);

    let full = ResolverOptions::default().with_full_binding_graph(true);
    let graph = create_with(&model, "C", full);
    assert!(graph.is_full_binding_graph());
    assert_eq!(keys(&graph), ["Foo", "Bar"]);
}

#[test]
fn dependencies_initialize_first() {
    let model = SourceModel::builder()
        .add_type(
            module("M").with_method(provides("foo", ty("Foo")).with_param("bar", ty("Bar"))),
        )
        .add_type(injectable("Bar", vec![param("baz", ty("Baz"))]))
        .add_type(injectable("Baz", vec![]))
        .add_type(component("C", &["M"]).with_method(entry("foo", ty("Foo"))))
        .build()
        .unwrap();

    let graph = create(&model, "C");
    let order: Vec<String> = graph
        .initialization_order()
        .iter()
        .map(ToString::to_string)
        .collect();
    assert_eq!(order, ["Baz", "Bar", "Foo"]);
}

#[test]
fn conflicting_inject_constructors_are_declaration_errors() {
    let twice = TypeElement::class("Twice")
        .with_inject_constructor(vec![])
        .with_inject_constructor(vec![param("other", ty("Other"))]);
    let model = SourceModel::builder()
        .add_type(twice)
        .add_type(component("C", &[]).with_method(entry("twice", ty("Twice"))))
        .build()
        .unwrap();

    let graph = create(&model, "C");
    let error = ModelError::MultipleInjectConstructors(ty("Twice"));
    assert_eq!(graph.inject_errors(), [error.clone()]);

    let report = validate(&graph, &ResolverOptions::default());
    assert!(report.errors.contains(&BindingGraphError::Declaration(error)));
    assert!(report
        .errors
        .iter()
        .any(|e| matches!(e, BindingGraphError::MissingBinding { .. })));
}

#[test]
fn the_factory_counts_its_work() {
    let model = SourceModel::builder()
        .add_type(injectable("Foo", vec![]))
        .add_type(component("C", &[]).with_method(entry("foo", ty("Foo"))))
        .build()
        .unwrap();
    let component = ComponentDescriptorFactory::new(&model)
        .for_component(&ty("C"))
        .unwrap();

    let mut factory = BindingGraphFactory::new(&model, ResolverOptions::default());
    factory.create(component.clone());
    assert_eq!(factory.stats().components, 1);
    assert_eq!(factory.stats().lookups, 1);

    factory.create(component);
    assert_eq!(factory.stats().components, 2);
    assert_eq!(factory.registry().errors().count(), 0);
}

fn production_component(name: &str, modules: &[&str]) -> TypeElement {
    TypeElement::interface(name).annotated(Annotation::ProductionComponent {
        modules: modules.iter().map(|m| ty(m)).collect(),
        dependencies: vec![],
    })
}

fn producer_module(name: &str) -> TypeElement {
    TypeElement::class(name).annotated(Annotation::ProducerModule {
        includes: vec![],
        subcomponents: vec![],
    })
}

fn produces(name: &str, returns: TypeRef) -> MethodElement {
    MethodElement::new(name, returns)
        .static_method()
        .annotated(Annotation::Produces)
}

#[test]
fn producer_maps_and_produced_sets_resolve_in_production_components() {
    let coffees = TypeRef::map_of(ty("String"), TypeRef::producer_of(ty("Coffee")));
    let orders = TypeRef::set_of(TypeRef::produced_of(ty("Order")));
    let model = SourceModel::builder()
        .add_type(
            producer_module("ShopModule")
                .with_method(
                    produces("espresso", ty("Coffee"))
                        .annotated(Annotation::IntoMap)
                        .annotated(Annotation::MapKey(MapKey::string("espresso"))),
                )
                .with_method(produces("order", ty("Order")).annotated(Annotation::IntoSet)),
        )
        .add_type(
            production_component("Shop", &["ShopModule"])
                .with_method(entry("coffees", TypeRef::future_of(coffees.clone())))
                .with_method(entry("orders", TypeRef::future_of(orders.clone()))),
        )
        .build()
        .unwrap();

    let graph = create(&model, "Shop");
    for multibound in [coffees, orders] {
        let resolved = graph.contribution(&Key::new(multibound)).unwrap();
        assert_eq!(resolved.status(), BindingStatus::Multibinding);
        assert!(resolved.is_owned_by(&ty("Shop")));

        let binding = resolved.contribution_binding().unwrap();
        assert_eq!(binding.binding_type(), BindingType::Production);
        assert_eq!(binding.dependencies().len(), 1);
        let contribution = graph
            .resolved(&binding.dependencies()[0].binding_key())
            .and_then(|resolved| resolved.contribution_binding())
            .unwrap();
        assert_eq!(contribution.kind(), BindingKind::Production);
    }
    assert!(validate(&graph, &ResolverOptions::default()).is_clean());
}
