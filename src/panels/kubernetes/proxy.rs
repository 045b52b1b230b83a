//! kube-proxy panels.

use crate::dashboard::*;
use crate::panels::{chart, query, table_chart};
use crate::promql::*;
use once_cell::sync::Lazy;

static RULES_SYNC_RATE: Lazy<Expr> = Lazy::new(|| {
    sum(rate(
        metric("kubeproxy_sync_proxy_rules_duration_seconds_count").over(Range::minutes(5)),
    ))
});

static RULES_SYNC_LATENCY: Lazy<Expr> = Lazy::new(|| {
    histogram_quantile(
        0.99,
        rate(metric("kubeproxy_sync_proxy_rules_duration_seconds_bucket").over(Range::minutes(5))),
    )
});

static NETWORK_PROGRAMMING_RATE: Lazy<Expr> = Lazy::new(|| {
    sum(rate(
        metric("kubeproxy_network_programming_duration_seconds_count").over(Range::minutes(5)),
    ))
});

static NETWORK_PROGRAMMING_LATENCY: Lazy<Expr> = Lazy::new(|| {
    histogram_quantile(
        0.99,
        sum_by(
            &["instance", "le"],
            rate(metric("kubeproxy_network_programming_duration_seconds_bucket").over(Range::minutes(5))),
        ),
    )
});

pub fn rules_sync_rate(datasource: &str, matchers: &[LabelMatcher]) -> Panel {
    PanelBuilder::time_series("Rules Sync Rate", chart(Unit::OpsPerSecond))
        .query(query(datasource, &RULES_SYNC_RATE, matchers, "rate"))
        .build()
}

pub fn rules_sync_latency(datasource: &str, matchers: &[LabelMatcher]) -> Panel {
    PanelBuilder::time_series("Rules Sync Latency 99th Quantile", table_chart(Unit::Seconds))
        .query(query(datasource, &RULES_SYNC_LATENCY, matchers, "{{instance}}"))
        .build()
}

pub fn network_programming_rate(datasource: &str, matchers: &[LabelMatcher]) -> Panel {
    PanelBuilder::time_series("Network Programming Rate", chart(Unit::OpsPerSecond))
        .query(query(datasource, &NETWORK_PROGRAMMING_RATE, matchers, "rate"))
        .build()
}

pub fn network_programming_latency(datasource: &str, matchers: &[LabelMatcher]) -> Panel {
    PanelBuilder::time_series("Network Programming Latency 99th Quantile", table_chart(Unit::Seconds))
        .query(query(datasource, &NETWORK_PROGRAMMING_LATENCY, matchers, "{{instance}}"))
        .build()
}
