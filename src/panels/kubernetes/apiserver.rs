//! API server SLO panels built on the kubernetes-mixin recording rules.

use crate::dashboard::*;
use crate::panels::{chart, query, table_chart};
use crate::promql::*;
use once_cell::sync::Lazy;

/// Availability objective the error budget is measured against.
pub const AVAILABILITY_TARGET: f64 = 0.99;

const NOTICE: &str = "The SLO (service level objective) and other metrics displayed on this dashboard are for informational purposes only.";

static AVAILABILITY: Lazy<Expr> =
    Lazy::new(|| metric("apiserver_request:availability30d").eq("verb", "all").into());

static ERROR_BUDGET: Lazy<Expr> = Lazy::new(|| {
    number(100.0)
        * paren(
            Expr::from(metric("apiserver_request:availability30d").eq("verb", "all"))
                - AVAILABILITY_TARGET,
        )
});

/// Read or write request class as labelled by the recording rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    Read,
    Write,
}

impl Verb {
    fn label(self) -> &'static str {
        match self {
            Verb::Read => "read",
            Verb::Write => "write",
        }
    }

    pub(crate) fn title(self) -> &'static str {
        match self {
            Verb::Read => "Read",
            Verb::Write => "Write",
        }
    }
}

fn verb_availability(verb: Verb) -> Expr {
    metric("apiserver_request:availability30d")
        .eq("verb", verb.label())
        .into()
}

fn requests_by_code(verb: Verb) -> Expr {
    sum_by(
        &["code"],
        metric("code_resource:apiserver_request_total:rate5m").eq("verb", verb.label()),
    )
}

fn error_ratio(verb: Verb) -> Expr {
    sum_by(
        &["resource"],
        metric("code_resource:apiserver_request_total:rate5m")
            .eq("verb", verb.label())
            .re("code", "5.."),
    ) / sum_by(
        &["resource"],
        metric("code_resource:apiserver_request_total:rate5m").eq("verb", verb.label()),
    )
}

fn duration_quantile(verb: Verb) -> Expr {
    metric("cluster_quantile:apiserver_request_sli_duration_seconds:histogram_quantile")
        .eq("verb", verb.label())
        .into()
}

static READ_AVAILABILITY: Lazy<Expr> = Lazy::new(|| verb_availability(Verb::Read));
static WRITE_AVAILABILITY: Lazy<Expr> = Lazy::new(|| verb_availability(Verb::Write));
static READ_REQUESTS: Lazy<Expr> = Lazy::new(|| requests_by_code(Verb::Read));
static WRITE_REQUESTS: Lazy<Expr> = Lazy::new(|| requests_by_code(Verb::Write));
static READ_ERRORS: Lazy<Expr> = Lazy::new(|| error_ratio(Verb::Read));
static WRITE_ERRORS: Lazy<Expr> = Lazy::new(|| error_ratio(Verb::Write));
static READ_DURATION: Lazy<Expr> = Lazy::new(|| duration_quantile(Verb::Read));
static WRITE_DURATION: Lazy<Expr> = Lazy::new(|| duration_quantile(Verb::Write));

fn template(verb: Verb, read: &'static Lazy<Expr>, write: &'static Lazy<Expr>) -> &'static Expr {
    match verb {
        Verb::Read => Lazy::force(read),
        Verb::Write => Lazy::force(write),
    }
}

pub fn notice() -> Panel {
    PanelBuilder::markdown("Notice", NOTICE).build()
}

fn percent_stat() -> StatChartSpec {
    StatChartSpec::new(Calculation::LastNumber, Unit::PercentDecimal)
        .format(Format::from(Unit::PercentDecimal).decimal_places(3))
        .thresholds(Thresholds::steps("red", &[(AVAILABILITY_TARGET, "green")]))
}

pub fn availability(datasource: &str, matchers: &[LabelMatcher]) -> Panel {
    PanelBuilder::stat("Availability (30d) > 99.000%", percent_stat())
        .description("How many percent of requests (both read and write) in 30 days have been answered successfully and fast enough")
        .query(query(datasource, &AVAILABILITY, matchers, ""))
        .build()
}

pub fn error_budget(datasource: &str, matchers: &[LabelMatcher]) -> Panel {
    PanelBuilder::time_series(
        "ErrorBudget (30d) > 99.000%",
        chart(Unit::Decimal).thresholds(Thresholds::steps("green", &[(0.0, "red")])),
    )
    .description("How much error budget is left looking at our 99.000% availability guarantees")
    .query(query(datasource, &ERROR_BUDGET, matchers, "errorbudget"))
    .build()
}

pub fn sli_availability(verb: Verb, datasource: &str, matchers: &[LabelMatcher]) -> Panel {
    PanelBuilder::stat(format!("{} Availability (30d)", verb.title()), percent_stat())
        .description(format!(
            "How many percent of {} requests in 30 days have been answered successfully and fast enough",
            verb.label()
        ))
        .query(query(
            datasource,
            template(verb, &READ_AVAILABILITY, &WRITE_AVAILABILITY),
            matchers,
            "",
        ))
        .build()
}

pub fn sli_requests(verb: Verb, datasource: &str, matchers: &[LabelMatcher]) -> Panel {
    PanelBuilder::time_series(
        format!("{} SLI - Requests", verb.title()),
        chart(Unit::RequestsPerSecond).stacked(),
    )
    .description(format!("How many {} requests per second the apiservers are serving, by status code", verb.label()))
    .query(query(datasource, template(verb, &READ_REQUESTS, &WRITE_REQUESTS), matchers, "{{code}}"))
    .build()
}

pub fn sli_errors(verb: Verb, datasource: &str, matchers: &[LabelMatcher]) -> Panel {
    PanelBuilder::time_series(
        format!("{} SLI - Errors", verb.title()),
        table_chart(Unit::PercentDecimal),
    )
    .description(format!("How many percent of {} requests per second are returned with errors", verb.label()))
    .query(query(datasource, template(verb, &READ_ERRORS, &WRITE_ERRORS), matchers, "{{resource}}"))
    .build()
}

pub fn sli_duration(verb: Verb, datasource: &str, matchers: &[LabelMatcher]) -> Panel {
    PanelBuilder::time_series(
        format!("{} SLI - Duration", verb.title()),
        table_chart(Unit::Seconds),
    )
    .description(format!("How many seconds the 99th percentile takes to return a {} request", verb.label()))
    .query(query(datasource, template(verb, &READ_DURATION, &WRITE_DURATION), matchers, "{{resource}}"))
    .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::panels::tests::{assert_queries_carry, matchers};

    #[test]
    fn test_error_budget_query() {
        let panel = error_budget("prom", &[LabelMatcher::eq("cluster", "$cluster")]);
        assert_eq!(
            panel.queries()[0].expr(),
            "100 * (apiserver_request:availability30d{verb=\"all\", cluster=\"$cluster\"} - 0.99)"
        );
    }

    #[test]
    fn test_sli_errors_per_verb() {
        let read = sli_errors(Verb::Read, "prom", &[]);
        let write = sli_errors(Verb::Write, "prom", &[]);
        assert_eq!(read.title(), "Read SLI - Errors");
        assert_eq!(write.title(), "Write SLI - Errors");
        assert_eq!(
            write.queries()[0].expr(),
            "sum by (resource) (code_resource:apiserver_request_total:rate5m{verb=\"write\", code=~\"5..\"}) / sum by (resource) (code_resource:apiserver_request_total:rate5m{verb=\"write\"})"
        );
    }

    #[test]
    fn test_notice_has_no_queries() {
        let panel = notice();
        assert!(panel.queries().is_empty());
        assert!(matches!(panel.spec.plugin, PanelPlugin::Markdown(_)));
    }

    #[test]
    fn test_panels_carry_matchers() {
        let mut panels = vec![
            availability("prom", &matchers()),
            error_budget("prom", &matchers()),
        ];
        for verb in [Verb::Read, Verb::Write] {
            panels.push(sli_availability(verb, "prom", &matchers()));
            panels.push(sli_requests(verb, "prom", &matchers()));
            panels.push(sli_errors(verb, "prom", &matchers()));
            panels.push(sli_duration(verb, "prom", &matchers()));
        }
        for panel in &panels {
            assert_queries_carry(panel, "prom", &matchers());
        }
    }
}
