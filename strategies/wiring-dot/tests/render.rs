use wiring_dot::{DotStrategy, GraphStrategy, RankDirection, RenderError};
use wiring_graph::{
    model::{Annotation, MethodElement, ParameterElement, SourceModel, TypeElement},
    types::TypeRef,
    BindingGraph, BindingGraphFactory, ComponentDescriptorFactory, ResolverOptions,
};

fn ty(name: &str) -> TypeRef {
    TypeRef::declared(name)
}

fn injectable(name: &str, parameters: Vec<(&str, TypeRef)>) -> TypeElement {
    TypeElement::class(name).with_inject_constructor(
        parameters
            .into_iter()
            .map(|(name, ty)| ParameterElement::new(name, ty))
            .collect(),
    )
}

fn graph_of(model: &SourceModel, component: &str) -> BindingGraph {
    let component = ComponentDescriptorFactory::new(model)
        .for_component(&ty(component))
        .unwrap();
    BindingGraphFactory::new(model, ResolverOptions::default()).create(component)
}

fn root_and_child() -> BindingGraph {
    let model = SourceModel::builder()
        .add_type(injectable("Foo", vec![]))
        .add_type(injectable("Local", vec![("foo", ty("Foo"))]))
        .add_type(
            TypeElement::interface("Root")
                .annotated(Annotation::component(vec![]))
                .with_method(MethodElement::abstract_method("foo", ty("Foo")))
                .with_method(MethodElement::abstract_method("child", ty("Child"))),
        )
        .add_type(
            TypeElement::interface("Child")
                .annotated(Annotation::subcomponent(vec![]))
                .with_method(MethodElement::abstract_method("foo", ty("Foo")))
                .with_method(MethodElement::abstract_method("local", ty("Local"))),
        )
        .build()
        .unwrap();
    graph_of(&model, "Root")
}

#[test]
fn missing_keys_are_highlighted() {
    let model = SourceModel::builder()
        .add_type(
            TypeElement::interface("C")
                .annotated(Annotation::component(vec![]))
                .with_method(MethodElement::abstract_method("getBar", ty("Bar"))),
        )
        .build()
        .unwrap();

    let dot = DotStrategy::builder().build().render(&graph_of(&model, "C")).unwrap();
    assert!(dot.starts_with("digraph \"C\" {\n  rankdir=TB;\n"));
    assert!(dot.contains("\"C/Bar\" [label=\"Bar\", color=red, fontcolor=red];"));
    assert!(dot.ends_with("}\n"));
}

#[test]
fn framework_requests_are_dashed() {
    let model = SourceModel::builder()
        .add_type(injectable("Bar", vec![]))
        .add_type(injectable("Foo", vec![("bar", TypeRef::provider_of(ty("Bar")))]))
        .add_type(injectable("Baz", vec![("bar", ty("Bar"))]))
        .add_type(
            TypeElement::interface("C")
                .annotated(Annotation::component(vec![]))
                .with_method(MethodElement::abstract_method("foo", ty("Foo")))
                .with_method(MethodElement::abstract_method("baz", ty("Baz"))),
        )
        .build()
        .unwrap();

    let dot = DotStrategy::builder()
        .rank_direction(RankDirection::LeftToRight)
        .build()
        .render(&graph_of(&model, "C"))
        .unwrap();
    assert!(dot.contains("  rankdir=LR;\n"));
    assert!(dot.contains("  \"C/Foo\" -> \"C/Bar\" [style=dashed];\n"));
    assert!(dot.contains("  \"C/Baz\" -> \"C/Bar\";\n"));
}

#[test]
fn hidden_inherited_keys_point_at_the_ancestor() {
    let dot = DotStrategy::builder().build().render(&root_and_child()).unwrap();

    assert!(dot.contains("    subgraph \"cluster_1\" {\n      label=\"Child\";\n"));
    assert!(!dot.contains("\"Child/Foo\" ["));
    assert!(dot.contains("  \"Child/Local\" -> \"Root/Foo\";\n"));
}

#[test]
fn inherited_keys_can_be_shown() {
    let dot = DotStrategy::builder()
        .show_inherited(true)
        .build()
        .render(&root_and_child())
        .unwrap();

    assert!(dot.contains("\"Child/Foo\" [label=\"Foo\", style=dotted];"));
    assert!(dot.contains("  \"Child/Local\" -> \"Child/Foo\";\n"));
}

#[test]
fn subcomponents_can_be_drawn_side_by_side() {
    let dot = DotStrategy::builder()
        .cluster_subcomponents(false)
        .build()
        .render(&root_and_child())
        .unwrap();

    assert!(dot.contains("\n  subgraph \"cluster_0\" {\n"));
    assert!(dot.contains("\n  subgraph \"cluster_1\" {\n"));
    assert!(dot.contains("  \"Child/Local\" -> \"Root/Foo\";\n"));
}

#[test]
fn writes_to_any_writer() {
    let graph = root_and_child();
    let strategy = DotStrategy::builder().build();
    let mut out = Vec::new();
    strategy.write_to(&graph, &mut out).unwrap();
    assert_eq!(String::from_utf8(out).unwrap(), strategy.render(&graph).unwrap());
}

#[test]
fn functions_are_strategies() {
    let count = |graph: &BindingGraph| Ok::<usize, RenderError>(graph.graphs().len());
    assert_eq!(count.render(&root_and_child()).unwrap(), 2);
}
