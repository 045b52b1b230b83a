//! Kubelet panels.

use crate::dashboard::*;
use crate::panels::{chart, query, stacked_chart, table_chart};
use crate::promql::*;
use once_cell::sync::Lazy;

static RUNNING_KUBELETS: Lazy<Expr> = Lazy::new(|| sum(metric("kubelet_node_name")));

// Newer kubelets renamed the *_count gauges.
static RUNNING_PODS: Lazy<Expr> = Lazy::new(|| {
    sum(metric("kubelet_running_pods")).or(sum(metric("kubelet_running_pod_count")))
});

static RUNNING_CONTAINERS: Lazy<Expr> = Lazy::new(|| {
    sum(metric("kubelet_running_containers")).or(sum(metric("kubelet_running_container_count")))
});

static ACTUAL_VOLUMES: Lazy<Expr> = Lazy::new(|| {
    sum(metric("volume_manager_total_volumes").eq("state", "actual_state_of_world"))
});

static DESIRED_VOLUMES: Lazy<Expr> = Lazy::new(|| {
    sum(metric("volume_manager_total_volumes").eq("state", "desired_state_of_world"))
});

static CONFIG_ERRORS: Lazy<Expr> = Lazy::new(|| {
    sum(rate(metric("kubelet_node_config_error").over(Range::minutes(5))))
});

static OPERATION_RATE: Lazy<Expr> = Lazy::new(|| {
    sum_by(
        &["operation_type", "instance"],
        rate(metric("kubelet_runtime_operations_total").over(Range::minutes(5))),
    )
});

static OPERATION_ERRORS: Lazy<Expr> = Lazy::new(|| {
    sum_by(
        &["instance", "operation_type"],
        rate(metric("kubelet_runtime_operations_errors_total").over(Range::minutes(5))),
    )
});

static OPERATION_DURATION: Lazy<Expr> = Lazy::new(|| {
    histogram_quantile(
        0.99,
        sum_by(
            &["instance", "operation_type", "le"],
            rate(metric("kubelet_runtime_operations_duration_seconds_bucket").over(Range::minutes(5))),
        ),
    )
});

fn rate_by_instance(counter: &str) -> Expr {
    sum_by(&["instance"], rate(metric(counter).over(Range::minutes(5))))
}

fn p99_by_instance(histogram: &str) -> Expr {
    histogram_quantile(
        0.99,
        sum_by(&["instance", "le"], rate(metric(histogram).over(Range::minutes(5)))),
    )
}

static POD_START_RATE: Lazy<Expr> =
    Lazy::new(|| rate_by_instance("kubelet_pod_start_duration_seconds_count"));
static POD_WORKER_RATE: Lazy<Expr> =
    Lazy::new(|| rate_by_instance("kubelet_pod_worker_duration_seconds_count"));
static POD_START_DURATION: Lazy<Expr> =
    Lazy::new(|| p99_by_instance("kubelet_pod_start_duration_seconds_bucket"));
static POD_WORKER_DURATION: Lazy<Expr> =
    Lazy::new(|| p99_by_instance("kubelet_pod_worker_duration_seconds_bucket"));
static PLEG_RELIST_RATE: Lazy<Expr> =
    Lazy::new(|| rate_by_instance("kubelet_pleg_relist_duration_seconds_count"));
static PLEG_RELIST_DURATION: Lazy<Expr> =
    Lazy::new(|| p99_by_instance("kubelet_pleg_relist_duration_seconds_bucket"));

fn count_stat(title: &str, description: &str, datasource: &str, template: &Expr, matchers: &[LabelMatcher]) -> Panel {
    PanelBuilder::stat(title, StatChartSpec::new(Calculation::LastNumber, Unit::Decimal))
        .description(description)
        .query(query(datasource, template, matchers, ""))
        .build()
}

pub fn running_kubelets(datasource: &str, matchers: &[LabelMatcher]) -> Panel {
    count_stat("Running Kubelets", "Number of kubelets reporting a node name", datasource, &RUNNING_KUBELETS, matchers)
}

pub fn running_pods(datasource: &str, matchers: &[LabelMatcher]) -> Panel {
    count_stat("Running Pods", "Pods running on the selected nodes", datasource, &RUNNING_PODS, matchers)
}

pub fn running_containers(datasource: &str, matchers: &[LabelMatcher]) -> Panel {
    count_stat("Running Containers", "Containers running on the selected nodes", datasource, &RUNNING_CONTAINERS, matchers)
}

pub fn actual_volume_count(datasource: &str, matchers: &[LabelMatcher]) -> Panel {
    count_stat("Actual Volume Count", "Volumes mounted by the volume manager", datasource, &ACTUAL_VOLUMES, matchers)
}

pub fn desired_volume_count(datasource: &str, matchers: &[LabelMatcher]) -> Panel {
    count_stat("Desired Volume Count", "Volumes the volume manager intends to mount", datasource, &DESIRED_VOLUMES, matchers)
}

pub fn config_error_count(datasource: &str, matchers: &[LabelMatcher]) -> Panel {
    count_stat("Config Error Count", "Rate of node configuration errors", datasource, &CONFIG_ERRORS, matchers)
}

pub fn operation_rate(datasource: &str, matchers: &[LabelMatcher]) -> Panel {
    PanelBuilder::time_series("Operation Rate", stacked_chart(Unit::OpsPerSecond))
        .description("Container runtime operations per type")
        .query(query(datasource, &OPERATION_RATE, matchers, "{{operation_type}} {{instance}}"))
        .build()
}

pub fn operation_error_rate(datasource: &str, matchers: &[LabelMatcher]) -> Panel {
    PanelBuilder::time_series("Operation Error Rate", stacked_chart(Unit::OpsPerSecond))
        .description("Failed container runtime operations per type")
        .query(query(datasource, &OPERATION_ERRORS, matchers, "{{instance}} {{operation_type}}"))
        .build()
}

pub fn operation_duration(datasource: &str, matchers: &[LabelMatcher]) -> Panel {
    PanelBuilder::time_series("Operation Duration 99th Quantile", table_chart(Unit::Seconds))
        .query(query(datasource, &OPERATION_DURATION, matchers, "{{instance}} {{operation_type}}"))
        .build()
}

pub fn pod_start_rate(datasource: &str, matchers: &[LabelMatcher]) -> Panel {
    PanelBuilder::time_series("Pod Start Rate", chart(Unit::OpsPerSecond))
        .query(query(datasource, &POD_START_RATE, matchers, "{{instance}} pod"))
        .query(query(datasource, &POD_WORKER_RATE, matchers, "{{instance}} worker"))
        .build()
}

pub fn pod_start_duration(datasource: &str, matchers: &[LabelMatcher]) -> Panel {
    PanelBuilder::time_series("Pod Start Duration", table_chart(Unit::Seconds))
        .description("99th percentile time from pod admission to running")
        .query(query(datasource, &POD_START_DURATION, matchers, "{{instance}} pod"))
        .query(query(datasource, &POD_WORKER_DURATION, matchers, "{{instance}} worker"))
        .build()
}

pub fn pleg_relist_rate(datasource: &str, matchers: &[LabelMatcher]) -> Panel {
    PanelBuilder::time_series("PLEG Relist Rate", chart(Unit::OpsPerSecond))
        .description("Pod lifecycle event generator relists")
        .query(query(datasource, &PLEG_RELIST_RATE, matchers, "{{instance}}"))
        .build()
}

pub fn pleg_relist_duration(datasource: &str, matchers: &[LabelMatcher]) -> Panel {
    PanelBuilder::time_series("PLEG Relist Duration", table_chart(Unit::Seconds))
        .query(query(datasource, &PLEG_RELIST_DURATION, matchers, "{{instance}}"))
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::panels::tests::{assert_queries_carry, matchers};

    #[test]
    fn test_running_pods_handles_renamed_metric() {
        let panel = running_pods("prom", &[LabelMatcher::variable("instance")]);
        assert_eq!(
            panel.queries()[0].expr(),
            "sum(kubelet_running_pods{instance=~\"$instance\"}) or sum(kubelet_running_pod_count{instance=~\"$instance\"})"
        );
    }

    #[test]
    fn test_panels_carry_matchers() {
        let builders: Vec<fn(&str, &[LabelMatcher]) -> Panel> = vec![
            running_kubelets,
            running_pods,
            running_containers,
            actual_volume_count,
            desired_volume_count,
            config_error_count,
            operation_rate,
            operation_error_rate,
            operation_duration,
            pod_start_rate,
            pod_start_duration,
            pleg_relist_rate,
            pleg_relist_duration,
        ];
        for build in builders {
            assert_queries_carry(&build("prom", &matchers()), "prom", &matchers());
        }
    }
}
