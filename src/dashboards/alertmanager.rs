use super::*;
use crate::panels::{alertmanager, process};

pub fn overview(options: &DashboardOptions) -> Result<Dashboard, BuildError> {
    let (variables, matchers) = VariableChain::new(options, "alertmanager_alerts")
        .label("job")
        .label("instance")
        .build();
    let ds = options.datasource.as_str();

    options
        .dashboard("alertmanager-overview", "Alertmanager / Overview")
        .variables(variables)
        .group(
            GroupConfig::new("Alerts")
                .panel(alertmanager::alerts(ds, &matchers))
                .panel(alertmanager::alerts_receive_rate(ds, &matchers)),
        )
        .group(
            GroupConfig::new("Notifications")
                .panel(alertmanager::notifications_send_rate(ds, &matchers))
                .panel(alertmanager::notification_duration(ds, &matchers)),
        )
        .group(
            GroupConfig::new("Cluster")
                .panel_height(4)
                .panel(alertmanager::cluster_members(ds, &matchers))
                .panel(alertmanager::config_reload(ds, &matchers)),
        )
        .group(
            GroupConfig::new("Resource Usage")
                .panels_per_line(3)
                .panels(process::resource_panels(ds, &matchers)),
        )
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overview_variables_and_groups() {
        let dashboard = overview(&DashboardOptions::default()).expect("builds");
        let names: Vec<&str> = dashboard.spec.variables.iter().map(|v| v.name()).collect();
        assert_eq!(names, vec!["job", "instance"]);
        assert_eq!(dashboard.spec.layouts.len(), 4);

        let titles: Vec<&str> = dashboard.spec.layouts.iter().map(|Layout::Grid(g)| g.display.title.as_str()).collect();
        assert_eq!(titles, vec!["Alerts", "Notifications", "Cluster", "Resource Usage"]);

        let Layout::Grid(cluster) = &dashboard.spec.layouts[2];
        assert!(cluster.items.iter().all(|item| item.height == 4));
    }
}
