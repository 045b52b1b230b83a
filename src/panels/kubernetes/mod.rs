//! Kubernetes control-plane panels.
//!
//! The panels here are shared by every control-plane component that embeds
//! client-go: work queues and the REST client it uses to talk to the API
//! server. Component-specific panels live in the submodules.

pub mod apiserver;
pub mod kubelet;
pub mod proxy;
pub mod scheduler;

use super::*;
use crate::promql::*;
use once_cell::sync::Lazy;

static UP: Lazy<Expr> = Lazy::new(|| sum(metric("up")));

static WORK_QUEUE_ADDS: Lazy<Expr> = Lazy::new(|| {
    sum_by(
        &["instance", "name"],
        rate(metric("workqueue_adds_total").over(Range::minutes(5))),
    )
});

static WORK_QUEUE_DEPTH: Lazy<Expr> =
    Lazy::new(|| sum_by(&["instance", "name"], metric("workqueue_depth")));

static WORK_QUEUE_LATENCY: Lazy<Expr> = Lazy::new(|| {
    histogram_quantile(
        0.99,
        sum_by(
            &["instance", "name", "le"],
            rate(metric("workqueue_queue_duration_seconds_bucket").over(Range::minutes(5))),
        ),
    )
});

/// (status class regex, legend) for the request rate panel.
const STATUS_CLASSES: [(&str, &str); 4] = [("2..", "2xx"), ("3..", "3xx"), ("4..", "4xx"), ("5..", "5xx")];

static REQUEST_RATES: Lazy<Vec<(Expr, &'static str)>> = Lazy::new(|| {
    STATUS_CLASSES
        .iter()
        .map(|(code, legend)| {
            (
                sum(rate(
                    metric("rest_client_requests_total")
                        .re("code", *code)
                        .over(Range::minutes(5)),
                )),
                *legend,
            )
        })
        .collect()
});

fn request_latency(verb: &str, labels: &[&str]) -> Expr {
    histogram_quantile(
        0.99,
        sum_by(
            labels,
            rate(
                metric("rest_client_request_duration_seconds_bucket")
                    .eq("verb", verb)
                    .over(Range::minutes(5)),
            ),
        ),
    )
}

static POST_LATENCY: Lazy<Expr> = Lazy::new(|| request_latency("POST", &["verb", "le"]));

static GET_LATENCY: Lazy<Expr> = Lazy::new(|| request_latency("GET", &["verb", "url", "le"]));

pub fn up(datasource: &str, matchers: &[LabelMatcher]) -> Panel {
    PanelBuilder::stat("Up", StatChartSpec::new(Calculation::LastNumber, Unit::Decimal))
        .description("Number of scrape targets reporting up")
        .query(query(datasource, &UP, matchers, ""))
        .build()
}

pub fn work_queue_add_rate(datasource: &str, matchers: &[LabelMatcher]) -> Panel {
    PanelBuilder::time_series("Work Queue Add Rate", table_chart(Unit::OpsPerSecond))
        .description("Rate of items added to each work queue")
        .query(query(datasource, &WORK_QUEUE_ADDS, matchers, "{{instance}} {{name}}"))
        .build()
}

pub fn work_queue_depth(datasource: &str, matchers: &[LabelMatcher]) -> Panel {
    PanelBuilder::time_series("Work Queue Depth", table_chart(Unit::Decimal))
        .description("Items waiting in each work queue")
        .query(query(datasource, &WORK_QUEUE_DEPTH, matchers, "{{instance}} {{name}}"))
        .build()
}

pub fn work_queue_latency(datasource: &str, matchers: &[LabelMatcher]) -> Panel {
    PanelBuilder::time_series("Work Queue Latency", table_chart(Unit::Seconds))
        .description("99th percentile time items wait in a work queue before processing")
        .query(query(datasource, &WORK_QUEUE_LATENCY, matchers, "{{instance}} {{name}}"))
        .build()
}

pub fn kube_api_request_rate(datasource: &str, matchers: &[LabelMatcher]) -> Panel {
    PanelBuilder::time_series("Kube API Request Rate", stacked_chart(Unit::OpsPerSecond))
        .description("Requests to the API server by status class")
        .queries(
            REQUEST_RATES
                .iter()
                .map(|(template, legend)| query(datasource, template, matchers, legend)),
        )
        .build()
}

pub fn post_request_latency(datasource: &str, matchers: &[LabelMatcher]) -> Panel {
    PanelBuilder::time_series("Post Request Latency 99th Quantile", chart(Unit::Seconds))
        .query(query(datasource, &POST_LATENCY, matchers, "{{verb}}"))
        .build()
}

pub fn get_request_latency(datasource: &str, matchers: &[LabelMatcher]) -> Panel {
    PanelBuilder::time_series("Get Request Latency 99th Quantile", table_chart(Unit::Seconds))
        .query(query(datasource, &GET_LATENCY, matchers, "{{verb}} {{url}}"))
        .build()
}
