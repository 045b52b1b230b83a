//! Process and Go runtime panels shared by every component that exposes the
//! standard client_golang collectors.

use super::*;
use crate::promql::*;
use once_cell::sync::Lazy;

static RESIDENT_MEMORY: Lazy<Expr> = Lazy::new(|| metric("process_resident_memory_bytes").into());

static HEAP_IN_USE: Lazy<Expr> = Lazy::new(|| metric("go_memstats_heap_inuse_bytes").into());

static CPU_USAGE: Lazy<Expr> =
    Lazy::new(|| rate(metric("process_cpu_seconds_total").over(Range::minutes(5))));

static GOROUTINES: Lazy<Expr> = Lazy::new(|| metric("go_goroutines").into());

static OPEN_FDS: Lazy<Expr> = Lazy::new(|| metric("process_open_fds").into());

static MAX_FDS: Lazy<Expr> = Lazy::new(|| metric("process_max_fds").into());

pub fn memory_usage(datasource: &str, matchers: &[LabelMatcher]) -> Panel {
    PanelBuilder::time_series("Memory Usage", chart(Unit::Bytes))
        .description("Resident memory and Go heap in use per instance")
        .query(query(datasource, &RESIDENT_MEMORY, matchers, "{{instance}} resident"))
        .query(query(datasource, &HEAP_IN_USE, matchers, "{{instance}} heap in use"))
        .build()
}

pub fn cpu_usage(datasource: &str, matchers: &[LabelMatcher]) -> Panel {
    PanelBuilder::time_series("CPU Usage", chart(Unit::Decimal))
        .description("CPU cores consumed per instance")
        .query(query(datasource, &CPU_USAGE, matchers, "{{instance}}"))
        .build()
}

pub fn goroutines(datasource: &str, matchers: &[LabelMatcher]) -> Panel {
    PanelBuilder::time_series("Goroutines", chart(Unit::Decimal))
        .description("Number of goroutines per instance")
        .query(query(datasource, &GOROUTINES, matchers, "{{instance}}"))
        .build()
}

pub fn file_descriptors(datasource: &str, matchers: &[LabelMatcher]) -> Panel {
    PanelBuilder::time_series("File Descriptors", chart(Unit::Decimal))
        .description("Open file descriptors against the process limit")
        .query(query(datasource, &OPEN_FDS, matchers, "{{instance}} open"))
        .query(query(datasource, &MAX_FDS, matchers, "{{instance}} max"))
        .build()
}

/// Memory, CPU and goroutines, in that order.
pub fn resource_panels(datasource: &str, matchers: &[LabelMatcher]) -> Vec<Panel> {
    vec![
        memory_usage(datasource, matchers),
        cpu_usage(datasource, matchers),
        goroutines(datasource, matchers),
    ]
}
