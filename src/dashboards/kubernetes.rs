use super::*;
use crate::panels::kubernetes::{self as shared, apiserver, kubelet, proxy, scheduler};
use crate::panels::process;

/// Variables for a control-plane component scraped under `job`.
fn component_scope(options: &DashboardOptions, job: &str) -> (Vec<Variable>, Vec<LabelMatcher>) {
    VariableChain::new(options, "up")
        .fixed(LabelMatcher::eq("job", job))
        .label("instance")
        .build()
}

/// Work queue, API client and resource groups every client-go based
/// component shares.
fn client_groups(builder: DashboardBuilder, ds: &str, matchers: &[LabelMatcher]) -> DashboardBuilder {
    builder
        .group(
            GroupConfig::new("Work Queue")
                .panels_per_line(3)
                .panel(shared::work_queue_add_rate(ds, matchers))
                .panel(shared::work_queue_depth(ds, matchers))
                .panel(shared::work_queue_latency(ds, matchers)),
        )
        .group(
            GroupConfig::new("Kube API Requests")
                .panels_per_line(3)
                .panel(shared::kube_api_request_rate(ds, matchers))
                .panel(shared::post_request_latency(ds, matchers))
                .panel(shared::get_request_latency(ds, matchers)),
        )
        .group(
            GroupConfig::new("Resource Usage")
                .panels_per_line(3)
                .panels(process::resource_panels(ds, matchers)),
        )
}

pub fn api_server(options: &DashboardOptions) -> Result<Dashboard, BuildError> {
    let (variables, matchers) = VariableChain::new(options, "up")
        .fixed(LabelMatcher::eq("job", "kube-apiserver"))
        .build();
    // The SLO recording rules aggregate away job and instance.
    let slo_matchers: Vec<LabelMatcher> = options.cluster_matcher().into_iter().collect();
    let ds = options.datasource.as_str();

    let mut builder = options
        .dashboard("kubernetes-api-server", "Kubernetes / API server")
        .variables(variables)
        .group(
            GroupConfig::new("Notice")
                .panels_per_line(1)
                .panel_height(3)
                .panel(apiserver::notice()),
        )
        .group(
            GroupConfig::new("Availability")
                .panels_per_line(2)
                .panel(apiserver::availability(ds, &slo_matchers))
                .panel(apiserver::error_budget(ds, &slo_matchers)),
        );

    for verb in [apiserver::Verb::Read, apiserver::Verb::Write] {
        builder = builder.group(
            GroupConfig::new(format!("{} SLI", verb.title()))
                .panels_per_line(4)
                .panel(apiserver::sli_availability(verb, ds, &slo_matchers))
                .panel(apiserver::sli_requests(verb, ds, &slo_matchers))
                .panel(apiserver::sli_errors(verb, ds, &slo_matchers))
                .panel(apiserver::sli_duration(verb, ds, &slo_matchers)),
        );
    }

    builder
        .group(
            GroupConfig::new("Resource Usage")
                .panels_per_line(3)
                .panel(shared::up(ds, &matchers))
                .panel(process::memory_usage(ds, &matchers))
                .panel(process::cpu_usage(ds, &matchers)),
        )
        .build()
}

pub fn controller_manager(options: &DashboardOptions) -> Result<Dashboard, BuildError> {
    let (variables, matchers) = component_scope(options, "kube-controller-manager");
    let ds = options.datasource.as_str();

    let builder = options
        .dashboard("kubernetes-controller-manager", "Kubernetes / Controller Manager")
        .variables(variables)
        .group(
            GroupConfig::new("Overview")
                .panels_per_line(1)
                .panel_height(4)
                .panel(shared::up(ds, &matchers)),
        );

    client_groups(builder, ds, &matchers).build()
}

pub fn scheduler(options: &DashboardOptions) -> Result<Dashboard, BuildError> {
    let (variables, matchers) = component_scope(options, "kube-scheduler");
    let ds = options.datasource.as_str();

    let builder = options
        .dashboard("kubernetes-scheduler", "Kubernetes / Scheduler")
        .variables(variables)
        .group(
            GroupConfig::new("Overview")
                .panels_per_line(3)
                .panel(shared::up(ds, &matchers))
                .panel(scheduler::scheduling_rate(ds, &matchers))
                .panel(scheduler::scheduling_latency(ds, &matchers)),
        );

    client_groups(builder, ds, &matchers).build()
}

pub fn kubelet(options: &DashboardOptions) -> Result<Dashboard, BuildError> {
    let (variables, matchers) = VariableChain::new(options, "up")
        .fixed(LabelMatcher::eq("job", "kubelet"))
        .fixed(LabelMatcher::eq("metrics_path", "/metrics"))
        .label("instance")
        .build();
    let ds = options.datasource.as_str();

    options
        .dashboard("kubernetes-kubelet", "Kubernetes / Kubelet")
        .variables(variables)
        .group(
            GroupConfig::new("Kubelet Stats")
                .panels_per_line(6)
                .panel_height(4)
                .panel(kubelet::running_kubelets(ds, &matchers))
                .panel(kubelet::running_pods(ds, &matchers))
                .panel(kubelet::running_containers(ds, &matchers))
                .panel(kubelet::actual_volume_count(ds, &matchers))
                .panel(kubelet::desired_volume_count(ds, &matchers))
                .panel(kubelet::config_error_count(ds, &matchers)),
        )
        .group(
            GroupConfig::new("Operations")
                .panels_per_line(3)
                .panel(kubelet::operation_rate(ds, &matchers))
                .panel(kubelet::operation_error_rate(ds, &matchers))
                .panel(kubelet::operation_duration(ds, &matchers)),
        )
        .group(
            GroupConfig::new("Pod Lifecycle")
                .panel(kubelet::pod_start_rate(ds, &matchers))
                .panel(kubelet::pod_start_duration(ds, &matchers))
                .panel(kubelet::pleg_relist_rate(ds, &matchers))
                .panel(kubelet::pleg_relist_duration(ds, &matchers)),
        )
        .group(
            GroupConfig::new("Kube API Requests")
                .panels_per_line(3)
                .panel(shared::kube_api_request_rate(ds, &matchers))
                .panel(shared::post_request_latency(ds, &matchers))
                .panel(shared::get_request_latency(ds, &matchers)),
        )
        .group(
            GroupConfig::new("Resource Usage")
                .panels_per_line(3)
                .panels(process::resource_panels(ds, &matchers)),
        )
        .build()
}

pub fn proxy(options: &DashboardOptions) -> Result<Dashboard, BuildError> {
    let (variables, matchers) = component_scope(options, "kube-proxy");
    let ds = options.datasource.as_str();

    options
        .dashboard("kubernetes-proxy", "Kubernetes / Proxy")
        .variables(variables)
        .group(
            GroupConfig::new("Overview")
                .panels_per_line(3)
                .panel(shared::up(ds, &matchers))
                .panel(proxy::rules_sync_rate(ds, &matchers))
                .panel(proxy::rules_sync_latency(ds, &matchers)),
        )
        .group(
            GroupConfig::new("Network Programming")
                .panel(proxy::network_programming_rate(ds, &matchers))
                .panel(proxy::network_programming_latency(ds, &matchers)),
        )
        .group(
            GroupConfig::new("Kube API Requests")
                .panels_per_line(3)
                .panel(shared::kube_api_request_rate(ds, &matchers))
                .panel(shared::post_request_latency(ds, &matchers))
                .panel(shared::get_request_latency(ds, &matchers)),
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
    fn test_kubelet_fixed_matchers() {
        let dashboard = kubelet(&DashboardOptions::default()).expect("builds");
        let names: Vec<&str> = dashboard.spec.variables.iter().map(|v| v.name()).collect();
        assert_eq!(names, vec!["instance"]);

        for panel in dashboard.spec.panels.values() {
            for query in panel.queries() {
                assert!(query.expr().contains("job=\"kubelet\""), "{}", query.expr());
                assert!(query.expr().contains("metrics_path=\"/metrics\""), "{}", query.expr());
            }
        }
    }

    #[test]
    fn test_api_server_slo_panels_skip_job_matcher() {
        let options = DashboardOptions {
            cluster_label_name: "k8s_cluster".to_string(),
            ..Default::default()
        };
        let dashboard = api_server(&options).expect("builds");
        let availability = dashboard
            .spec
            .panels
            .values()
            .find(|p| p.title() == "Availability (30d) > 99.000%")
            .expect("availability panel");
        assert_eq!(
            availability.queries()[0].expr(),
            "apiserver_request:availability30d{verb=\"all\", k8s_cluster=\"$k8s_cluster\"}"
        );

        let titles: Vec<&str> = dashboard.spec.layouts.iter().map(|Layout::Grid(g)| g.display.title.as_str()).collect();
        assert_eq!(
            titles,
            vec!["Notice", "Availability", "Read SLI", "Write SLI", "Resource Usage"]
        );
    }

    #[test]
    fn test_controller_manager_groups() {
        let dashboard = controller_manager(&DashboardOptions::default()).expect("builds");
        assert_eq!(dashboard.spec.layouts.len(), 4);
        // up + 3 work queue + 3 API + 3 resource
        assert_eq!(dashboard.spec.panels.len(), 10);
    }
}
