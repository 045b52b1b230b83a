//! Perses server panels.

use super::*;
use crate::promql::*;
use once_cell::sync::Lazy;

static BUILD_INFO: Lazy<Expr> = Lazy::new(|| {
    count_by(&["job", "instance", "version", "commit"], metric("perses_build_info"))
});

static REQUEST_LATENCY: Lazy<Expr> = Lazy::new(|| {
    histogram_quantile(
        0.99,
        sum_by(
            &["handler", "method", "le"],
            rate(metric("perses_http_request_duration_second_bucket").over(Range::minutes(5))),
        ),
    )
});

static REQUEST_RATE: Lazy<Expr> = Lazy::new(|| {
    sum_by(
        &["handler", "method"],
        rate(metric("perses_http_request_total").over(Range::minutes(5))),
    )
});

static ERROR_RATE: Lazy<Expr> = Lazy::new(|| {
    sum_by(
        &["handler", "method", "code"],
        rate(
            metric("perses_http_request_total")
                .re("code", "4..|5..")
                .over(Range::minutes(5)),
        ),
    )
});

static SCHEMA_LOADS: Lazy<Expr> = Lazy::new(|| {
    sum_by(
        &["schema", "status"],
        increase(metric("perses_plugin_schemas_load_attempts").over(Range::minutes(5))),
    )
});

pub fn stats_table(datasource: &str, matchers: &[LabelMatcher]) -> Panel {
    PanelBuilder::table(
        "Perses Stats",
        TableSpec::new()
            .density(TableDensity::Compact)
            .column(ColumnSettings::header("job", "Job"))
            .column(ColumnSettings::header("instance", "Instance"))
            .column(ColumnSettings::header("version", "Version"))
            .column(ColumnSettings::header("commit", "Commit"))
            .column(ColumnSettings::hidden("value"))
            .column(ColumnSettings::hidden("timestamp")),
    )
    .description("Version and commit of each running Perses instance")
    .query(query(datasource, &BUILD_INFO, matchers, ""))
    .build()
}

pub fn http_request_latency(datasource: &str, matchers: &[LabelMatcher]) -> Panel {
    PanelBuilder::time_series("HTTP Requests Latency", table_chart(Unit::Seconds))
        .description("99th percentile latency of API requests per handler")
        .query(query(datasource, &REQUEST_LATENCY, matchers, "{{handler}} {{method}}"))
        .build()
}

pub fn http_request_rate(datasource: &str, matchers: &[LabelMatcher]) -> Panel {
    PanelBuilder::time_series("HTTP Requests Rate", table_chart(Unit::RequestsPerSecond))
        .query(query(datasource, &REQUEST_RATE, matchers, "{{handler}} {{method}}"))
        .build()
}

pub fn http_error_rate(datasource: &str, matchers: &[LabelMatcher]) -> Panel {
    PanelBuilder::time_series("HTTP Errors Rate", table_chart(Unit::RequestsPerSecond))
        .description("Requests answered with a 4xx or 5xx status")
        .query(query(datasource, &ERROR_RATE, matchers, "{{handler}} {{method}} {{code}}"))
        .build()
}

pub fn plugin_schema_loads(datasource: &str, matchers: &[LabelMatcher]) -> Panel {
    PanelBuilder::time_series("Plugin Schema Loads", stacked_chart(Unit::Decimal))
        .description("Plugin schema load attempts by outcome")
        .query(query(datasource, &SCHEMA_LOADS, matchers, "{{schema}} {{status}}"))
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::panels::tests::{assert_queries_carry, matchers};

    #[test]
    fn test_error_rate_query() {
        let panel = http_error_rate("prom", &[LabelMatcher::variable("job")]);
        assert_eq!(
            panel.queries()[0].expr(),
            "sum by (handler, method, code) (rate(perses_http_request_total{code=~\"4..|5..\", job=~\"$job\"}[5m]))"
        );
    }

    #[test]
    fn test_panels_carry_matchers() {
        let panels = vec![
            stats_table("prom", &matchers()),
            http_request_latency("prom", &matchers()),
            http_request_rate("prom", &matchers()),
            http_error_rate("prom", &matchers()),
            plugin_schema_loads("prom", &matchers()),
        ];
        for panel in &panels {
            assert_queries_carry(panel, "prom", &matchers());
        }
    }
}
