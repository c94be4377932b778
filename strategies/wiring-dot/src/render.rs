use std::fmt::Write;

use indexmap::IndexSet;
use wiring_graph::{BindingGraph, BindingKey, BindingStatus, DependencyRequest, ResolvedBindings};

use crate::{
    builder::DotStrategyBuilder,
    traits::{GraphStrategy, RenderError},
};

/// Graphviz `rankdir`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RankDirection {
    #[default]
    TopToBottom,
    LeftToRight,
    BottomToTop,
    RightToLeft,
}
impl RankDirection {
    fn as_dot(self) -> &'static str {
        match self {
            RankDirection::TopToBottom => "TB",
            RankDirection::LeftToRight => "LR",
            RankDirection::BottomToTop => "BT",
            RankDirection::RightToLeft => "RL",
        }
    }
}

/// Renders a binding graph tree as one Graphviz digraph.
///
/// Every component becomes a cluster holding a node per resolved key. Missing keys are drawn
/// red, duplicated keys orange, and requests through `Provider`, `Lazy` or `Producer` as
/// dashed edges.
#[derive(Debug, Clone)]
pub struct DotStrategy {
    pub(crate) rank_direction: RankDirection,
    pub(crate) show_inherited: bool,
    pub(crate) cluster_subcomponents: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct Edge {
    from: String,
    to: String,
    dashed: bool,
}

impl DotStrategy {
    pub fn builder() -> DotStrategyBuilder {
        DotStrategyBuilder::new()
    }

    /// Renders `graph` and writes it to `out`
    pub fn write_to(
        &self,
        graph: &BindingGraph,
        out: &mut impl std::io::Write,
    ) -> Result<(), RenderError> {
        let dot = self.render(graph)?;
        out.write_all(dot.as_bytes())?;
        Ok(())
    }

    fn write_cluster(
        &self,
        out: &mut String,
        graph: &BindingGraph,
        ancestors: &[&BindingGraph],
        depth: usize,
        clusters: &mut usize,
        edges: &mut IndexSet<Edge>,
    ) -> Result<(), RenderError> {
        let indent = "  ".repeat(depth);
        writeln!(out, "{indent}subgraph {} {{", quote(&format!("cluster_{clusters}")))?;
        *clusters += 1;
        writeln!(out, "{indent}  label={};", quote(&graph.component_type().to_string()))?;

        for (key, resolved) in graph.resolved_bindings() {
            if resolved.is_inherited() && !self.show_inherited {
                continue;
            }
            let attributes = match resolved.status() {
                BindingStatus::Missing => ", color=red, fontcolor=red",
                BindingStatus::Duplicate => ", color=orange",
                _ if resolved.is_inherited() => ", style=dotted",
                _ => "",
            };
            writeln!(
                out,
                "{indent}  {} [label={}{}];",
                quote(&node_id(graph, key)),
                quote(&key.to_string()),
                attributes
            )?;

            for request in dependencies(resolved) {
                let Some(to) = self.target(graph, ancestors, &request.binding_key()) else {
                    continue;
                };
                edges.insert(Edge {
                    from: node_id(graph, key),
                    to,
                    dashed: request.kind().breaks_cycles(),
                });
            }
        }

        let mut lineage = ancestors.to_vec();
        lineage.push(graph);
        if self.cluster_subcomponents {
            for subgraph in graph.subgraphs().values() {
                self.write_cluster(out, subgraph, &lineage, depth + 1, clusters, edges)?;
            }
        }
        writeln!(out, "{indent}}}")?;

        if !self.cluster_subcomponents {
            for subgraph in graph.subgraphs().values() {
                self.write_cluster(out, subgraph, &lineage, depth, clusters, edges)?;
            }
        }
        Ok(())
    }

    /// The node an edge to `key` from `graph` ends at. Hidden inherited entries are drawn
    /// by the closest ancestor resolving the key itself.
    fn target(
        &self,
        graph: &BindingGraph,
        ancestors: &[&BindingGraph],
        key: &BindingKey,
    ) -> Option<String> {
        let resolved = graph.resolved(key)?;
        if !resolved.is_inherited() || self.show_inherited {
            return Some(node_id(graph, key));
        }
        ancestors
            .iter()
            .rev()
            .find(|ancestor| ancestor.resolved(key).is_some_and(|r| !r.is_inherited()))
            .map(|ancestor| node_id(ancestor, key))
    }
}

impl GraphStrategy for DotStrategy {
    type Output = String;

    fn render(&self, graph: &BindingGraph) -> Result<String, RenderError> {
        let mut out = String::new();
        writeln!(out, "digraph {} {{", quote(&graph.component_type().to_string()))?;
        writeln!(out, "  rankdir={};", self.rank_direction.as_dot())?;
        writeln!(out, "  node [shape=box];")?;

        let mut clusters = 0;
        let mut edges = IndexSet::new();
        self.write_cluster(&mut out, graph, &[], 1, &mut clusters, &mut edges)?;

        for edge in &edges {
            let style = match edge.dashed {
                true => " [style=dashed]",
                false => "",
            };
            writeln!(out, "  {} -> {}{};", quote(&edge.from), quote(&edge.to), style)?;
        }
        writeln!(out, "}}")?;

        tracing::debug!(
            "Rendered '{}' as {} clusters with {} edges",
            graph.component_type(),
            clusters,
            edges.len()
        );
        Ok(out)
    }
}

fn dependencies(resolved: &ResolvedBindings) -> Vec<&DependencyRequest> {
    let mut dependencies: Vec<&DependencyRequest> = resolved
        .contribution_bindings()
        .flat_map(|binding| binding.dependencies().iter())
        .collect();
    if let Some(binding) = resolved.members_injection_binding() {
        dependencies.extend(binding.dependencies());
    }
    dependencies
}

fn node_id(graph: &BindingGraph, key: &BindingKey) -> String {
    format!("{}/{}", graph.component_type(), key)
}

fn quote(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quote_escapes() {
        assert_eq!(quote(r#"Map<"a", B>"#), r#""Map<\"a\", B>""#);
        assert_eq!(quote(r"a\b"), r#""a\\b""#);
    }

    #[test]
    fn rank_directions() {
        assert_eq!(RankDirection::default().as_dot(), "TB");
        assert_eq!(RankDirection::LeftToRight.as_dot(), "LR");
    }
}
