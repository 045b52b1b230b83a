use super::*;
use crate::panels::node_exporter;

pub fn nodes(options: &DashboardOptions) -> Result<Dashboard, BuildError> {
    let (variables, matchers) = VariableChain::new(options, "node_uname_info")
        .fixed(LabelMatcher::eq("job", "node"))
        .label("instance")
        .build();
    let ds = options.datasource.as_str();

    options
        .dashboard("node-exporter-nodes", "Node Exporter / Nodes")
        .variables(variables)
        .group(
            GroupConfig::new("CPU")
                .panel(node_exporter::cpu_usage(ds, &matchers))
                .panel(node_exporter::load_average(ds, &matchers)),
        )
        .group(
            GroupConfig::new("Memory")
                .panel(node_exporter::memory_usage(ds, &matchers))
                .panel(node_exporter::memory_usage_gauge(ds, &matchers)),
        )
        .group(
            GroupConfig::new("Disk")
                .panels_per_line(3)
                .panel(node_exporter::disk_io_bytes(ds, &matchers))
                .panel(node_exporter::disk_io_seconds(ds, &matchers))
                .panel(node_exporter::filesystem_usage(ds, &matchers)),
        )
        .group(
            GroupConfig::new("Network")
                .panel(node_exporter::network_received(ds, &matchers))
                .panel(node_exporter::network_transmitted(ds, &matchers)),
        )
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nodes_variables_and_groups() {
        let dashboard = nodes(&DashboardOptions::default()).expect("builds");
        let names: Vec<&str> = dashboard.spec.variables.iter().map(|v| v.name()).collect();
        assert_eq!(names, vec!["instance"]);
        assert_eq!(dashboard.spec.layouts.len(), 4);

        let titles: Vec<&str> = dashboard.spec.layouts.iter().map(|Layout::Grid(g)| g.display.title.as_str()).collect();
        assert_eq!(titles, vec!["CPU", "Memory", "Disk", "Network"]);
        assert_eq!(dashboard.spec.panels.len(), 9);
    }

    #[test]
    fn test_cluster_variable_comes_first() {
        let options = DashboardOptions {
            cluster_label_name: "cluster".to_string(),
            ..Default::default()
        };
        let dashboard = nodes(&options).expect("builds");
        let names: Vec<&str> = dashboard.spec.variables.iter().map(|v| v.name()).collect();
        assert_eq!(names, vec!["cluster", "instance"]);
    }
}
