use super::*;
use crate::panels::{etcd, process};

pub fn overview(options: &DashboardOptions) -> Result<Dashboard, BuildError> {
    let (variables, matchers) = VariableChain::new(options, "etcd_server_has_leader")
        .label("job")
        .build();
    let ds = options.datasource.as_str();

    options
        .dashboard("etcd-overview", "Etcd / Overview")
        .variables(variables)
        .group(
            GroupConfig::new("Etcd Status")
                .panels_per_line(4)
                .panel(etcd::up(ds, &matchers))
                .panel(etcd::rpc_rate(ds, &matchers))
                .panel(etcd::active_streams(ds, &matchers))
                .panel(etcd::db_size(ds, &matchers)),
        )
        .group(
            GroupConfig::new("Disk and Memory")
                .panels_per_line(3)
                .panel(etcd::disk_sync_duration(ds, &matchers))
                .panel(etcd::memory(ds, &matchers))
                .panel(process::goroutines(ds, &matchers)),
        )
        .group(
            GroupConfig::new("Traffic")
                .panels_per_line(4)
                .panel(etcd::client_traffic_in(ds, &matchers))
                .panel(etcd::client_traffic_out(ds, &matchers))
                .panel(etcd::peer_traffic_in(ds, &matchers))
                .panel(etcd::peer_traffic_out(ds, &matchers)),
        )
        .group(
            GroupConfig::new("Raft")
                .panels_per_line(3)
                .panel(etcd::raft_proposals(ds, &matchers))
                .panel(etcd::leader_elections_per_day(ds, &matchers))
                .panel(etcd::peer_round_trip_time(ds, &matchers)),
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
        assert_eq!(names, vec!["job"]);
        assert_eq!(dashboard.spec.layouts.len(), 4);

        let titles: Vec<&str> = dashboard.spec.layouts.iter().map(|Layout::Grid(g)| g.display.title.as_str()).collect();
        assert_eq!(titles, vec!["Etcd Status", "Disk and Memory", "Traffic", "Raft"]);
        assert_eq!(dashboard.spec.panels.len(), 14);
    }
}
