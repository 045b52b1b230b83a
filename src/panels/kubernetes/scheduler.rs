//! Scheduler panels.

use crate::dashboard::*;
use crate::panels::{query, table_chart};
use crate::promql::*;
use once_cell::sync::Lazy;

/// (histogram, legend suffix) for each scheduling phase.
const PHASES: [(&str, &str); 4] = [
    ("scheduler_e2e_scheduling_duration_seconds", "e2e"),
    ("scheduler_scheduling_algorithm_duration_seconds", "scheduling algorithm"),
    ("scheduler_volume_scheduling_duration_seconds", "volume"),
    ("scheduler_binding_duration_seconds", "binding"),
];

static SCHEDULING_RATES: Lazy<Vec<(Expr, String)>> = Lazy::new(|| {
    PHASES
        .iter()
        .map(|(histogram, phase)| {
            (
                sum_by(
                    &["instance"],
                    rate(metric(format!("{histogram}_count")).over(Range::minutes(5))),
                ),
                format!("{{{{instance}}}} {phase}"),
            )
        })
        .collect()
});

static SCHEDULING_LATENCIES: Lazy<Vec<(Expr, String)>> = Lazy::new(|| {
    PHASES
        .iter()
        .map(|(histogram, phase)| {
            (
                histogram_quantile(
                    0.99,
                    sum_by(
                        &["instance", "le"],
                        rate(metric(format!("{histogram}_bucket")).over(Range::minutes(5))),
                    ),
                ),
                format!("{{{{instance}}}} {phase}"),
            )
        })
        .collect()
});

pub fn scheduling_rate(datasource: &str, matchers: &[LabelMatcher]) -> Panel {
    PanelBuilder::time_series("Scheduling Rate", table_chart(Unit::OpsPerSecond))
        .description("Rate of scheduling attempts per phase")
        .queries(
            SCHEDULING_RATES
                .iter()
                .map(|(template, legend)| query(datasource, template, matchers, legend)),
        )
        .build()
}

pub fn scheduling_latency(datasource: &str, matchers: &[LabelMatcher]) -> Panel {
    PanelBuilder::time_series("Scheduling Latency 99th Quantile", table_chart(Unit::Seconds))
        .description("99th percentile latency of each scheduling phase")
        .queries(
            SCHEDULING_LATENCIES
                .iter()
                .map(|(template, legend)| query(datasource, template, matchers, legend)),
        )
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::panels::tests::{assert_queries_carry, matchers};

    #[test]
    fn test_scheduling_rate_legends() {
        let panel = scheduling_rate("prom", &matchers());
        assert_queries_carry(&panel, "prom", &matchers());

        let value = serde_json::to_value(&panel).expect("serializes");
        let legend = &value["spec"]["queries"][0]["spec"]["plugin"]["spec"]["seriesNameFormat"];
        assert_eq!(legend, "{{instance}} e2e");
    }

    #[test]
    fn test_scheduling_latency_query() {
        let panel = scheduling_latency("prom", &[]);
        assert_queries_carry(&panel, "prom", &[]);
        assert_eq!(
            panel.queries()[3].expr(),
            "histogram_quantile(0.99, sum by (instance, le) (rate(scheduler_binding_duration_seconds_bucket[5m])))"
        );
    }
}
