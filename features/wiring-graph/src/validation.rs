use std::collections::HashSet;

use wiring_config::{ResolverOptions, Severity};

use crate::{
    binding::{BindingKind, BindingType, ContributionBinding},
    errors::{BindingGraphError, BindingGraphErrors},
    graph::BindingGraph,
    key::BindingKey,
    request::DependencyRequest,
    resolved::{BindingStatus, ResolvedBindings},
};

/// Everything wrong with a binding graph tree, split by severity
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    pub errors: Vec<BindingGraphError>,
    pub warnings: Vec<BindingGraphError>,
}

impl ValidationReport {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty() && self.warnings.is_empty()
    }

    /// Fails with every error; warnings are dropped
    pub fn into_result(self) -> Result<(), BindingGraphErrors> {
        if !self.errors.is_empty() {
            return Err(BindingGraphErrors {
                errors: self.errors,
            });
        }
        Ok(())
    }

    fn report(&mut self, severity: Severity, error: BindingGraphError) {
        let bucket = match severity {
            Severity::Error => &mut self.errors,
            Severity::Warning => &mut self.warnings,
            Severity::Off => return,
        };
        if !bucket.contains(&error) {
            bucket.push(error);
        }
    }
}

/// Validate the graph and all of its subgraphs
///
/// Entries a subgraph inherits are reported by the graph that resolved them.
pub fn validate(graph: &BindingGraph, options: &ResolverOptions) -> ValidationReport {
    let mut report = ValidationReport::default();
    for graph in graph.graphs() {
        check_graph(graph, options, &mut report);
    }
    tracing::debug!(
        "Validated '{}': {} errors, {} warnings",
        graph.component_type(),
        report.errors.len(),
        report.warnings.len()
    );
    report
}

fn check_graph(graph: &BindingGraph, options: &ResolverOptions, report: &mut ValidationReport) {
    for error in graph.declaration_errors() {
        report.report(Severity::Error, error.clone().into());
    }

    for (binding_key, resolved) in graph.resolved_bindings() {
        if resolved.is_inherited() {
            continue;
        }
        match resolved.status() {
            BindingStatus::Missing => report.report(
                Severity::Error,
                BindingGraphError::MissingBinding {
                    key: binding_key.clone(),
                    component: graph.component_type().clone(),
                    requested_by: requesters(graph, binding_key),
                },
            ),
            BindingStatus::Duplicate => report.report(
                Severity::Error,
                BindingGraphError::DuplicateBindings {
                    key: binding_key.clone(),
                    component: graph.component_type().clone(),
                    bindings: resolved
                        .contribution_bindings()
                        .map(|binding| describe(binding))
                        .collect(),
                },
            ),
            BindingStatus::Unique | BindingStatus::Multibinding => {}
        }
    }

    for (binding_key, binding) in graph.owned_bindings() {
        check_scope(graph, binding_key, binding, options, report);
        check_map_keys(graph, binding_key, binding, report);
        check_production_dependencies(graph, binding_key, binding, report);
    }

    check_cycles(graph, options, report);
}

/// Where each request for `binding_key` in the graph was made
fn requesters(graph: &BindingGraph, binding_key: &BindingKey) -> Vec<String> {
    let mut requesters = Vec::new();
    let mut add = |requester: String| {
        if !requesters.contains(&requester) {
            requesters.push(requester);
        }
    };

    for method in graph.component().component_methods() {
        if let Some(request) = &method.request {
            if &request.binding_key() == binding_key {
                add(method.method.to_string());
            }
        }
    }
    for resolved in graph.resolved_bindings().values() {
        for binding in resolved.contribution_bindings() {
            for request in binding.dependencies() {
                if &request.binding_key() == binding_key {
                    add(request_site(request, binding));
                }
            }
        }
        if let Some(binding) = resolved.members_injection_binding() {
            for request in binding.dependencies() {
                if &request.binding_key() == binding_key {
                    add(
                        request
                            .origin()
                            .map_or_else(|| binding.key().to_string(), ToString::to_string),
                    );
                }
            }
        }
    }
    requesters
}

fn request_site(request: &DependencyRequest, binding: &ContributionBinding) -> String {
    match request.origin() {
        Some(origin) => origin.to_string(),
        None => describe(binding),
    }
}

fn describe(binding: &ContributionBinding) -> String {
    match binding.binding_element() {
        Some(element) => format!("{} ({})", element, binding.kind()),
        None => format!("{} ({})", binding.key(), binding.kind()),
    }
}

fn check_scope(
    graph: &BindingGraph,
    binding_key: &BindingKey,
    binding: &ContributionBinding,
    options: &ResolverOptions,
    report: &mut ValidationReport,
) {
    let Some(scope) = binding.scope() else {
        return;
    };
    let component = graph.component();
    let allowed = scope.is_reusable()
        || component.scopes().contains(scope)
        || (scope.is_production_scope() && component.is_production());
    if !allowed {
        report.report(
            options.scope_validation,
            BindingGraphError::IncompatiblyScopedBinding {
                key: binding_key.clone(),
                scope: scope.clone(),
                component: graph.component_type().clone(),
            },
        );
    }
}

fn check_map_keys(
    graph: &BindingGraph,
    binding_key: &BindingKey,
    binding: &ContributionBinding,
    report: &mut ValidationReport,
) {
    if binding.kind() != BindingKind::MultiboundMap {
        return;
    }
    let mut seen = HashSet::new();
    for request in binding.dependencies() {
        let Some(contribution) = graph
            .resolved(&request.binding_key())
            .and_then(ResolvedBindings::contribution_binding)
        else {
            continue;
        };
        let Some(map_key) = contribution.map_key() else {
            continue;
        };
        if !seen.insert(map_key) {
            report.report(
                Severity::Error,
                BindingGraphError::DuplicateMapKeys {
                    key: binding_key.clone(),
                    map_key: map_key.clone(),
                    component: graph.component_type().clone(),
                },
            );
        }
    }
}

fn check_production_dependencies(
    graph: &BindingGraph,
    binding_key: &BindingKey,
    binding: &ContributionBinding,
    report: &mut ValidationReport,
) {
    if binding.binding_type() != BindingType::Provision {
        return;
    }
    for request in binding.dependencies() {
        let dependency = request.binding_key();
        let Some(resolved) = graph.resolved(&dependency) else {
            continue;
        };
        if resolved.binding_type() == Some(BindingType::Production) {
            report.report(
                Severity::Error,
                BindingGraphError::ProvisionDependsOnProduction {
                    key: binding_key.clone(),
                    dependency,
                    component: graph.component_type().clone(),
                },
            );
        }
    }
}

/// Reports each cycle through requests that need the dependency while constructing the dependent
fn check_cycles(graph: &BindingGraph, options: &ResolverOptions, report: &mut ValidationReport) {
    if options.cycle_validation == Severity::Off {
        return;
    }
    let mut checked = HashSet::new();
    let mut cycles: HashSet<Vec<BindingKey>> = HashSet::new();
    let mut dependency_chain = Vec::new();
    for binding_key in graph.resolved_bindings().keys() {
        check_recurse(
            graph,
            &mut checked,
            &mut cycles,
            &mut dependency_chain,
            binding_key,
        );
    }

    let mut cycles: Vec<_> = cycles.into_iter().collect();
    cycles.sort_by_key(|chain| chain.iter().map(ToString::to_string).collect::<Vec<_>>());
    for chain in cycles {
        report.report(
            options.cycle_validation,
            BindingGraphError::DependencyCycle {
                component: graph.component_type().clone(),
                chain,
            },
        );
    }

    fn check_recurse<'g>(
        graph: &'g BindingGraph,
        checked: &mut HashSet<&'g BindingKey>,
        cycles: &mut HashSet<Vec<BindingKey>>,
        dependency_chain: &mut Vec<&'g BindingKey>,
        binding_key: &'g BindingKey,
    ) {
        if let Some(start) = dependency_chain.iter().position(|k| *k == binding_key) {
            let mut chain: Vec<BindingKey> =
                dependency_chain[start..].iter().map(|k| (*k).clone()).collect();
            // Rotate so the same cycle found from another key is recorded once
            let first = (0..chain.len())
                .min_by_key(|i| chain[*i].to_string())
                .unwrap_or_default();
            chain.rotate_left(first);
            chain.push(chain[0].clone());
            cycles.insert(chain);
            return;
        }

        // Skip other checks if already checked
        if checked.contains(binding_key) {
            return;
        }
        let Some((binding_key, resolved)) = graph.resolved_bindings().get_key_value(binding_key)
        else {
            return;
        };
        if resolved.is_inherited() {
            return;
        }

        // Bindings owned by an ancestor are checked in the ancestor's graph
        dependency_chain.push(binding_key);
        let requests = resolved
            .bindings_owned_by(graph.component_type())
            .flat_map(|binding| binding.dependencies().iter())
            .chain(
                resolved
                    .members_injection_binding()
                    .into_iter()
                    .flat_map(|binding| binding.dependencies()),
            );
        for request in requests {
            if request.kind().breaks_cycles() {
                continue;
            }
            let dependency = request.binding_key();
            if let Some((dependency, _)) = graph.resolved_bindings().get_key_value(&dependency) {
                check_recurse(graph, checked, cycles, dependency_chain, dependency);
            }
        }
        dependency_chain.pop();
        checked.insert(binding_key);
    }
}
