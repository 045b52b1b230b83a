//! Dashboard assembly for each supported component, plus the catalog that
//! maps dashboard names to their builders.

use crate::dashboard::*;
use crate::error::BuildError;
use crate::promql::{self, LabelMatcher};

mod alertmanager;
mod etcd;
mod kubernetes;
mod node_exporter;
mod perses;
mod prometheus;

pub const DEFAULT_PROJECT: &str = "perses-dev";
pub const DEFAULT_DATASOURCE: &str = "prometheus-datasource";

/// Parameters shared by every dashboard in the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardOptions {
    pub project: String,
    pub datasource: String,
    /// Label distinguishing clusters in a shared Prometheus. Empty disables
    /// the cluster variable and matcher.
    pub cluster_label_name: String,
    pub duration: String,
}

impl Default for DashboardOptions {
    fn default() -> Self {
        Self {
            project: DEFAULT_PROJECT.to_string(),
            datasource: DEFAULT_DATASOURCE.to_string(),
            cluster_label_name: String::new(),
            duration: DEFAULT_DURATION.to_string(),
        }
    }
}

impl DashboardOptions {
    /// `<label>="$<label>"` when a cluster label is configured.
    pub fn cluster_matcher(&self) -> Option<LabelMatcher> {
        if self.cluster_label_name.is_empty() {
            return None;
        }

        let label = &self.cluster_label_name;
        Some(LabelMatcher::eq(label.as_str(), format!("${label}")))
    }

    /// Builder preloaded with the project, duration and display name.
    fn dashboard(&self, name: &str, display_name: &str) -> DashboardBuilder {
        DashboardBuilder::new(name)
            .display_name(display_name)
            .project(&self.project)
            .duration(&self.duration)
    }
}

/// Cascading label-value variables over one metric.
///
/// Every variable's values are filtered by the cluster matcher, by the fixed
/// matchers, and by every variable declared before it. The accumulated
/// matchers are what the dashboard passes to its panels.
pub(crate) struct VariableChain<'a> {
    options: &'a DashboardOptions,
    metric: String,
    variables: Vec<Variable>,
    matchers: Vec<LabelMatcher>,
}

impl<'a> VariableChain<'a> {
    pub fn new(options: &'a DashboardOptions, metric: impl Into<String>) -> Self {
        let mut chain = Self {
            options,
            metric: metric.into(),
            variables: Vec::new(),
            matchers: Vec::new(),
        };

        if let Some(matcher) = options.cluster_matcher() {
            let variable = ListVariableBuilder::label_values(
                matcher.name.as_str(),
                &options.datasource,
                matcher.name.as_str(),
                vec![chain.selector()],
            )
            .display_name(matcher.name.as_str())
            .build();

            chain.variables.push(variable);
            chain.matchers.push(matcher);
        }

        chain
    }

    /// Constrain the variables and panels without exposing a variable,
    /// e.g. `job="kubelet"`.
    pub fn fixed(mut self, matcher: LabelMatcher) -> Self {
        self.matchers.push(matcher);
        self
    }

    /// Multi-select variable over the values of `label`.
    pub fn label(mut self, label: &str) -> Self {
        let variable = ListVariableBuilder::label_values(
            label,
            &self.options.datasource,
            label,
            vec![self.selector()],
        )
        .display_name(label)
        .multi()
        .all_value()
        .build();

        self.variables.push(variable);
        self.matchers.push(LabelMatcher::variable(label));
        self
    }

    pub fn matchers(&self) -> &[LabelMatcher] {
        &self.matchers
    }

    pub fn build(self) -> (Vec<Variable>, Vec<LabelMatcher>) {
        (self.variables, self.matchers)
    }

    fn selector(&self) -> String {
        promql::render(&promql::metric(self.metric.as_str()).into(), &self.matchers)
    }
}

/// One dashboard the tool knows how to build.
pub struct DashboardEntry {
    pub component: &'static str,
    pub name: &'static str,
    pub display: &'static str,
    build: fn(&DashboardOptions) -> Result<Dashboard, BuildError>,
}

impl DashboardEntry {
    pub fn build(&self, options: &DashboardOptions) -> Result<Dashboard, BuildError> {
        (self.build)(options)
    }
}

macro_rules! entry {
    ($component:literal, $name:literal, $display:literal, $build:path) => {
        DashboardEntry {
            component: $component,
            name: $name,
            display: $display,
            build: $build,
        }
    };
}

static CATALOG: [DashboardEntry; 11] = [
    entry!("prometheus", "prometheus-overview", "Prometheus / Overview", prometheus::overview),
    entry!("prometheus", "prometheus-remote-write", "Prometheus / Remote Write", prometheus::remote_write),
    entry!("alertmanager", "alertmanager-overview", "Alertmanager / Overview", alertmanager::overview),
    entry!("etcd", "etcd-overview", "Etcd / Overview", etcd::overview),
    entry!("kubernetes", "kubernetes-api-server", "Kubernetes / API server", kubernetes::api_server),
    entry!(
        "kubernetes",
        "kubernetes-controller-manager",
        "Kubernetes / Controller Manager",
        kubernetes::controller_manager
    ),
    entry!("kubernetes", "kubernetes-scheduler", "Kubernetes / Scheduler", kubernetes::scheduler),
    entry!("kubernetes", "kubernetes-kubelet", "Kubernetes / Kubelet", kubernetes::kubelet),
    entry!("kubernetes", "kubernetes-proxy", "Kubernetes / Proxy", kubernetes::proxy),
    entry!("node-exporter", "node-exporter-nodes", "Node Exporter / Nodes", node_exporter::nodes),
    entry!("perses", "perses-overview", "Perses / Overview", perses::overview),
];

pub fn catalog() -> &'static [DashboardEntry] {
    &CATALOG
}

/// Component names in catalog order, without duplicates.
pub fn components() -> Vec<&'static str> {
    let mut components: Vec<&'static str> = Vec::new();
    for entry in catalog() {
        if !components.contains(&entry.component) {
            components.push(entry.component);
        }
    }
    components
}

/// Build a specific dashboard by name. `None` when the name is unknown.
pub fn get_dashboard(name: &str, options: &DashboardOptions) -> Option<Result<Dashboard, BuildError>> {
    catalog()
        .iter()
        .find(|entry| entry.name == name)
        .map(|entry| entry.build(options))
}

/// Build every dashboard in the catalog.
pub fn generate_all_dashboards(options: &DashboardOptions) -> Vec<Result<Dashboard, BuildError>> {
    catalog().iter().map(|entry| entry.build(options)).collect()
}

/// Build the dashboards of the given components. An empty slice selects
/// every component.
pub fn generate_for_components<S: AsRef<str>>(
    components: &[S],
    options: &DashboardOptions,
) -> Vec<Result<Dashboard, BuildError>> {
    if components.is_empty() {
        return generate_all_dashboards(options);
    }

    catalog()
        .iter()
        .filter(|entry| components.iter().any(|c| c.as_ref() == entry.component))
        .map(|entry| entry.build(options))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_cluster() -> DashboardOptions {
        DashboardOptions {
            cluster_label_name: "cluster".to_string(),
            ..Default::default()
        }
    }

    fn build_all(options: &DashboardOptions) -> Vec<Dashboard> {
        generate_all_dashboards(options)
            .into_iter()
            .map(|result| result.expect("catalog dashboard builds"))
            .collect()
    }

    fn all_queries(dashboard: &Dashboard) -> impl Iterator<Item = &Query> {
        dashboard.spec.panels.values().flat_map(|panel| panel.queries())
    }

    #[test]
    fn test_catalog_names_are_unique_and_valid() {
        let mut names: Vec<&str> = catalog().iter().map(|e| e.name).collect();
        assert!(names.iter().all(|name| is_valid_resource_name(name)));
        names.sort();
        names.dedup();
        assert_eq!(names.len(), catalog().len());
    }

    #[test]
    fn test_components() {
        assert_eq!(
            components(),
            vec!["prometheus", "alertmanager", "etcd", "kubernetes", "node-exporter", "perses"]
        );
    }

    #[test]
    fn test_every_dashboard_builds_without_cluster_label() {
        let options = DashboardOptions::default();
        for dashboard in build_all(&options) {
            assert_eq!(dashboard.metadata.project, "perses-dev");
            assert!(
                dashboard.spec.variables.iter().all(|v| v.name() != "cluster"),
                "{} has a cluster variable",
                dashboard.metadata.name
            );
            for query in all_queries(&dashboard) {
                assert_eq!(query.datasource().name, "prometheus-datasource");
                assert!(!query.expr().contains("$cluster"), "{}", query.expr());
            }
        }
    }

    #[test]
    fn test_every_query_carries_cluster_matcher() {
        let options = with_cluster();
        for dashboard in build_all(&options) {
            assert_eq!(
                dashboard.spec.variables[0].name(),
                "cluster",
                "{} should start with the cluster variable",
                dashboard.metadata.name
            );
            for query in all_queries(&dashboard) {
                assert!(
                    query.expr().contains("cluster=\"$cluster\""),
                    "{}: {}",
                    dashboard.metadata.name,
                    query.expr()
                );
            }
        }
    }

    #[test]
    fn test_every_layout_item_references_a_panel() {
        for dashboard in build_all(&with_cluster()) {
            let mut referenced = 0;
            for Layout::Grid(grid) in &dashboard.spec.layouts {
                for item in &grid.items {
                    let key = item.content.key().expect("panel reference");
                    assert!(dashboard.spec.panels.contains_key(key));
                    assert!(item.x + item.width <= GRID_WIDTH);
                    referenced += 1;
                }
            }
            assert_eq!(referenced, dashboard.spec.panels.len());
        }
    }

    #[test]
    fn test_get_dashboard() {
        let options = DashboardOptions {
            project: "monitoring".to_string(),
            datasource: "thanos".to_string(),
            ..with_cluster()
        };
        let dashboard = get_dashboard("etcd-overview", &options)
            .expect("known dashboard")
            .expect("builds");
        assert_eq!(dashboard.metadata.name, "etcd-overview");
        assert_eq!(dashboard.metadata.project, "monitoring");
        assert_eq!(dashboard.spec.display.name, "Etcd / Overview");
        assert!(all_queries(&dashboard).all(|q| q.datasource().name == "thanos"));

        assert!(get_dashboard("does-not-exist", &options).is_none());
    }

    #[test]
    fn test_invalid_project_fails_every_dashboard() {
        let options = DashboardOptions {
            project: "not a project".to_string(),
            ..Default::default()
        };
        for result in generate_all_dashboards(&options) {
            assert!(matches!(result, Err(BuildError::InvalidProject { .. })));
        }
    }

    #[test]
    fn test_generate_for_components() {
        let options = DashboardOptions::default();
        let names: Vec<String> = generate_for_components(&["kubernetes"], &options)
            .into_iter()
            .map(|r| r.expect("builds").metadata.name)
            .collect();
        assert_eq!(
            names,
            vec![
                "kubernetes-api-server",
                "kubernetes-controller-manager",
                "kubernetes-scheduler",
                "kubernetes-kubelet",
                "kubernetes-proxy",
            ]
        );

        let none: [&str; 0] = [];
        assert_eq!(generate_for_components(&none, &options).len(), catalog().len());
    }

    #[test]
    fn test_variable_chain_cascades() {
        let options = with_cluster();
        let (variables, matchers) = VariableChain::new(&options, "up")
            .fixed(LabelMatcher::eq("job", "kubelet"))
            .label("instance")
            .build();

        let value = serde_json::to_value(&variables).expect("serializes");
        assert_eq!(value[0]["spec"]["plugin"]["spec"]["matchers"][0], "up");
        assert_eq!(
            value[1]["spec"]["plugin"]["spec"]["matchers"][0],
            "up{cluster=\"$cluster\", job=\"kubelet\"}"
        );
        assert_eq!(value[1]["spec"]["allowMultiple"], true);
        assert_eq!(
            matchers.iter().map(|m| m.to_string()).collect::<Vec<_>>(),
            vec!["cluster=\"$cluster\"", "job=\"kubelet\"", "instance=~\"$instance\""]
        );
    }
}
