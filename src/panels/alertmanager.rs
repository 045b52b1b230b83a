//! Alertmanager panels.

use super::*;
use crate::promql::*;
use once_cell::sync::Lazy;

static ALERTS: Lazy<Expr> = Lazy::new(|| sum_by(&["instance"], metric("alertmanager_alerts")));

static RECEIVED_ALERTS: Lazy<Expr> = Lazy::new(|| {
    sum_by(
        &["instance"],
        rate(metric("alertmanager_alerts_received_total").over(Range::minutes(5))),
    )
});

static INVALID_ALERTS: Lazy<Expr> = Lazy::new(|| {
    sum_by(
        &["instance"],
        rate(metric("alertmanager_alerts_invalid_total").over(Range::minutes(5))),
    )
});

static NOTIFICATIONS: Lazy<Expr> = Lazy::new(|| {
    sum_by(
        &["integration", "instance"],
        rate(metric("alertmanager_notifications_total").over(Range::minutes(5))),
    )
});

static FAILED_NOTIFICATIONS: Lazy<Expr> = Lazy::new(|| {
    sum_by(
        &["integration", "instance"],
        rate(metric("alertmanager_notifications_failed_total").over(Range::minutes(5))),
    )
});

fn notification_latency_quantile(quantile: f64) -> Expr {
    histogram_quantile(
        quantile,
        sum_by(
            &["le", "integration", "instance"],
            rate(metric("alertmanager_notification_latency_seconds_bucket").over(Range::minutes(5))),
        ),
    )
}

static NOTIFICATION_P99: Lazy<Expr> = Lazy::new(|| notification_latency_quantile(0.99));

static NOTIFICATION_P50: Lazy<Expr> = Lazy::new(|| notification_latency_quantile(0.5));

static NOTIFICATION_AVERAGE: Lazy<Expr> = Lazy::new(|| {
    sum_by(
        &["integration", "instance"],
        rate(metric("alertmanager_notification_latency_seconds_sum").over(Range::minutes(5))),
    ) / sum_by(
        &["integration", "instance"],
        rate(metric("alertmanager_notification_latency_seconds_count").over(Range::minutes(5))),
    )
});

static CLUSTER_MEMBERS: Lazy<Expr> =
    Lazy::new(|| max_by(&["instance"], metric("alertmanager_cluster_members")));

static CONFIG_RELOAD: Lazy<Expr> = Lazy::new(|| {
    max_by(&["instance"], metric("alertmanager_config_last_reload_successful"))
});

pub fn alerts(datasource: &str, matchers: &[LabelMatcher]) -> Panel {
    PanelBuilder::time_series("Alerts", stacked_chart(Unit::Decimal))
        .description("Current set of alerts stored in the Alertmanager")
        .query(query(datasource, &ALERTS, matchers, "{{instance}}"))
        .build()
}

pub fn alerts_receive_rate(datasource: &str, matchers: &[LabelMatcher]) -> Panel {
    PanelBuilder::time_series("Alerts Receive Rate", stacked_chart(Unit::OpsPerSecond))
        .description("Rate of successful and invalid alerts received by the Alertmanager")
        .query(query(datasource, &RECEIVED_ALERTS, matchers, "{{instance}} received"))
        .query(query(datasource, &INVALID_ALERTS, matchers, "{{instance}} invalid"))
        .build()
}

pub fn notifications_send_rate(datasource: &str, matchers: &[LabelMatcher]) -> Panel {
    PanelBuilder::time_series("Notifications Send Rate", stacked_chart(Unit::OpsPerSecond))
        .description("Rate of successful and failed notifications per integration")
        .query(query(datasource, &NOTIFICATIONS, matchers, "{{integration}} {{instance}} total"))
        .query(query(datasource, &FAILED_NOTIFICATIONS, matchers, "{{integration}} {{instance}} failed"))
        .build()
}

pub fn notification_duration(datasource: &str, matchers: &[LabelMatcher]) -> Panel {
    PanelBuilder::time_series("Notification Duration", table_chart(Unit::Seconds))
        .description("Latency of notifications sent per integration")
        .query(query(datasource, &NOTIFICATION_P99, matchers, "{{integration}} {{instance}} 99th percentile"))
        .query(query(datasource, &NOTIFICATION_P50, matchers, "{{integration}} {{instance}} median"))
        .query(query(datasource, &NOTIFICATION_AVERAGE, matchers, "{{integration}} {{instance}} average"))
        .build()
}

pub fn cluster_members(datasource: &str, matchers: &[LabelMatcher]) -> Panel {
    PanelBuilder::stat(
        "Cluster Members",
        StatChartSpec::new(Calculation::LastNumber, Unit::Decimal),
    )
    .description("Peers each Alertmanager instance sees in its gossip cluster")
    .query(query(datasource, &CLUSTER_MEMBERS, matchers, "{{instance}}"))
    .build()
}

pub fn config_reload(datasource: &str, matchers: &[LabelMatcher]) -> Panel {
    PanelBuilder::stat(
        "Last Config Reload",
        StatChartSpec::new(Calculation::LastNumber, Unit::Decimal)
            .thresholds(Thresholds::steps("red", &[(1.0, "green")])),
    )
    .description("1 when the last configuration reload succeeded")
    .query(query(datasource, &CONFIG_RELOAD, matchers, "{{instance}}"))
    .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::panels::tests::{assert_queries_carry, matchers};

    #[test]
    fn test_notification_duration_queries() {
        let panel = notification_duration("prom", &[LabelMatcher::variable("job")]);
        let exprs: Vec<&str> = panel.queries().iter().map(|q| q.expr()).collect();
        assert_eq!(
            exprs[0],
            "histogram_quantile(0.99, sum by (le, integration, instance) (rate(alertmanager_notification_latency_seconds_bucket{job=~\"$job\"}[5m])))"
        );
        assert!(exprs[1].starts_with("histogram_quantile(0.5, "));
        assert_eq!(exprs[2].matches("job=~\"$job\"").count(), 2);
    }

    #[test]
    fn test_panels_carry_matchers() {
        let panels = vec![
            alerts("prom", &matchers()),
            alerts_receive_rate("prom", &matchers()),
            notifications_send_rate("prom", &matchers()),
            notification_duration("prom", &matchers()),
            cluster_members("prom", &matchers()),
            config_reload("prom", &matchers()),
        ];
        for panel in &panels {
            assert_queries_carry(panel, "prom", &matchers());
        }
    }
}
