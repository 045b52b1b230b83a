//! Prometheus server panels: overview and remote write.

use super::*;
use crate::promql::*;
use once_cell::sync::Lazy;

// === Overview templates ===

static BUILD_INFO: Lazy<Expr> = Lazy::new(|| {
    count_by(&["job", "instance", "version"], metric("prometheus_build_info"))
});

static TARGET_SYNC: Lazy<Expr> = Lazy::new(|| {
    sum_by(
        &["job", "scrape_job", "instance"],
        rate(metric("prometheus_target_sync_length_seconds_sum").over(Range::minutes(5))),
    )
});

static DISCOVERED_TARGETS: Lazy<Expr> = Lazy::new(|| {
    sum_by(&["job", "instance"], metric("prometheus_sd_discovered_targets"))
});

static SCRAPE_INTERVAL: Lazy<Expr> = Lazy::new(|| {
    rate(metric("prometheus_target_interval_length_seconds_sum").over(Range::minutes(5)))
        / rate(metric("prometheus_target_interval_length_seconds_count").over(Range::minutes(5)))
});

/// (counter, legend) pairs for the scrape failure panel.
static SCRAPE_FAILURES: Lazy<Vec<(Expr, &'static str)>> = Lazy::new(|| {
    [
        ("prometheus_target_scrapes_exceeded_body_size_limit_total", "exceeded body size limit: {{job}}"),
        ("prometheus_target_scrapes_exceeded_sample_limit_total", "exceeded sample limit: {{job}}"),
        ("prometheus_target_scrapes_sample_duplicate_timestamp_total", "duplicate timestamp: {{job}}"),
        ("prometheus_target_scrapes_sample_out_of_bounds_total", "out of bounds: {{job}}"),
        ("prometheus_target_scrapes_sample_out_of_order_total", "out of order: {{job}}"),
    ]
    .into_iter()
    .map(|(counter, legend)| {
        (
            sum_by(&["job"], rate(metric(counter).over(Range::minutes(1)))),
            legend,
        )
    })
    .collect()
});

static APPENDED_SAMPLES: Lazy<Expr> = Lazy::new(|| {
    rate(metric("prometheus_tsdb_head_samples_appended_total").over(Range::minutes(5)))
});

static HEAD_SERIES: Lazy<Expr> = Lazy::new(|| metric("prometheus_tsdb_head_series").into());

static HEAD_CHUNKS: Lazy<Expr> = Lazy::new(|| metric("prometheus_tsdb_head_chunks").into());

static QUERY_RATE: Lazy<Expr> = Lazy::new(|| {
    rate(
        metric("prometheus_engine_query_duration_seconds_count")
            .eq("slice", "inner_eval")
            .over(Range::minutes(5)),
    )
});

static QUERY_STAGE_DURATION: Lazy<Expr> = Lazy::new(|| {
    max_by(
        &["slice"],
        metric("prometheus_engine_query_duration_seconds").eq("quantile", "0.9"),
    )
});

// === Remote write templates ===

// Ingest-side series are per instance and carry no `remote_name` or `url`;
// queue-side series carry both. Each side takes its own matchers.

static HIGHEST_TIMESTAMP_IN: Lazy<Expr> =
    Lazy::new(|| metric("prometheus_remote_storage_highest_timestamp_in_seconds").into());

static HIGHEST_TIMESTAMP_SENT: Lazy<Expr> =
    Lazy::new(|| metric("prometheus_remote_storage_queue_highest_sent_timestamp_seconds").into());

static HIGHEST_TIMESTAMP_IN_RATE: Lazy<Expr> = Lazy::new(|| {
    rate(metric("prometheus_remote_storage_highest_timestamp_in_seconds").over(Range::minutes(5)))
});

static HIGHEST_TIMESTAMP_SENT_RATE: Lazy<Expr> = Lazy::new(|| {
    rate(metric("prometheus_remote_storage_queue_highest_sent_timestamp_seconds").over(Range::minutes(5)))
});

static SAMPLES_IN_RATE: Lazy<Expr> = Lazy::new(|| {
    rate(metric("prometheus_remote_storage_samples_in_total").over(Range::minutes(5)))
});

static SAMPLES_SENT_RATE: Lazy<Expr> = Lazy::new(|| {
    counter_rate_or(
        "prometheus_remote_storage_succeeded_samples_total",
        "prometheus_remote_storage_samples_total",
    )
});

/// `ingest - queue`, matching each instance-level series against every
/// queue of that instance.
fn ingest_minus_queue(ingest: Expr, queue: Expr) -> Expr {
    (ingest - queue)
        .ignoring(&["remote_name", "url"])
        .group_right(&["instance"])
}

static CURRENT_SHARDS: Lazy<Expr> = Lazy::new(|| metric("prometheus_remote_storage_shards").into());
static MAX_SHARDS: Lazy<Expr> = Lazy::new(|| metric("prometheus_remote_storage_shards_max").into());
static MIN_SHARDS: Lazy<Expr> = Lazy::new(|| metric("prometheus_remote_storage_shards_min").into());
static DESIRED_SHARDS: Lazy<Expr> =
    Lazy::new(|| metric("prometheus_remote_storage_shards_desired").into());
static SHARD_CAPACITY: Lazy<Expr> =
    Lazy::new(|| metric("prometheus_remote_storage_shard_capacity").into());
static PENDING_SAMPLES: Lazy<Expr> = Lazy::new(|| {
    Expr::from(metric("prometheus_remote_storage_pending_samples"))
        .or(metric("prometheus_remote_storage_samples_pending"))
});
static TSDB_SEGMENT: Lazy<Expr> = Lazy::new(|| metric("prometheus_tsdb_wal_segment_current").into());
static REMOTE_WRITE_SEGMENT: Lazy<Expr> =
    Lazy::new(|| metric("prometheus_wal_watcher_current_segment").into());

fn counter_rate_or(current: &str, legacy: &str) -> Expr {
    rate(metric(current).over(Range::minutes(5))).or(rate(metric(legacy).over(Range::minutes(5))))
}

static DROPPED_SAMPLES: Lazy<Expr> = Lazy::new(|| {
    counter_rate_or(
        "prometheus_remote_storage_dropped_samples_total",
        "prometheus_remote_storage_samples_dropped_total",
    )
});
static FAILED_SAMPLES: Lazy<Expr> = Lazy::new(|| {
    counter_rate_or(
        "prometheus_remote_storage_failed_samples_total",
        "prometheus_remote_storage_samples_failed_total",
    )
});
static RETRIED_SAMPLES: Lazy<Expr> = Lazy::new(|| {
    counter_rate_or(
        "prometheus_remote_storage_retried_samples_total",
        "prometheus_remote_storage_samples_retried_total",
    )
});
static ENQUEUE_RETRIES: Lazy<Expr> = Lazy::new(|| {
    rate(metric("prometheus_remote_storage_enqueue_retries_total").over(Range::minutes(5)))
});

const REMOTE_LEGEND: &str = "{{instance}} {{remote_name}}:{{url}}";

// === Overview panels ===

pub fn stats_table(datasource: &str, matchers: &[LabelMatcher]) -> Panel {
    PanelBuilder::table(
        "Prometheus Stats",
        TableSpec::new()
            .density(TableDensity::Compact)
            .column(ColumnSettings::header("job", "Job"))
            .column(ColumnSettings::header("instance", "Instance"))
            .column(ColumnSettings::header("version", "Version"))
            .column(ColumnSettings::hidden("value"))
            .column(ColumnSettings::hidden("timestamp")),
    )
    .description("Displays version and instance information for each Prometheus server")
    .query(query(datasource, &BUILD_INFO, matchers, ""))
    .build()
}

pub fn target_sync(datasource: &str, matchers: &[LabelMatcher]) -> Panel {
    PanelBuilder::time_series("Target Sync", table_chart(Unit::Seconds))
        .description("Time spent synchronizing scrape pools with service discovery")
        .query(query(datasource, &TARGET_SYNC, matchers, "{{job}} {{scrape_job}} {{instance}}"))
        .build()
}

pub fn targets(datasource: &str, matchers: &[LabelMatcher]) -> Panel {
    PanelBuilder::time_series("Targets", chart(Unit::Decimal))
        .description("Number of targets discovered by service discovery")
        .query(query(datasource, &DISCOVERED_TARGETS, matchers, "{{job}} {{instance}}"))
        .build()
}

pub fn average_scrape_interval(datasource: &str, matchers: &[LabelMatcher]) -> Panel {
    PanelBuilder::time_series("Average Scrape Interval Duration", table_chart(Unit::Seconds))
        .description("Actual interval between scrapes, averaged over five minutes")
        .query(query(datasource, &SCRAPE_INTERVAL, matchers, "{{job}} {{instance}} {{interval}} configured"))
        .build()
}

pub fn scrape_failures(datasource: &str, matchers: &[LabelMatcher]) -> Panel {
    PanelBuilder::time_series("Scrape Failures", table_chart(Unit::Decimal))
        .description("Scrapes rejected for exceeding limits or carrying invalid samples")
        .queries(
            SCRAPE_FAILURES
                .iter()
                .map(|(template, legend)| query(datasource, template, matchers, legend)),
        )
        .build()
}

pub fn appended_samples(datasource: &str, matchers: &[LabelMatcher]) -> Panel {
    PanelBuilder::time_series("Appended Samples", chart(Unit::CountsPerSecond))
        .description("Rate of samples appended to the head block")
        .query(query(datasource, &APPENDED_SAMPLES, matchers, "{{job}} {{instance}}"))
        .build()
}

pub fn head_series(datasource: &str, matchers: &[LabelMatcher]) -> Panel {
    PanelBuilder::time_series("Head Series", chart(Unit::Decimal))
        .description("Series held in the head block")
        .query(query(datasource, &HEAD_SERIES, matchers, "{{job}} {{instance}} head series"))
        .build()
}

pub fn head_chunks(datasource: &str, matchers: &[LabelMatcher]) -> Panel {
    PanelBuilder::time_series("Head Chunks", chart(Unit::Decimal))
        .description("Chunks held in the head block")
        .query(query(datasource, &HEAD_CHUNKS, matchers, "{{job}} {{instance}} head chunks"))
        .build()
}

pub fn query_rate(datasource: &str, matchers: &[LabelMatcher]) -> Panel {
    PanelBuilder::time_series("Query Rate", chart(Unit::RequestsPerSecond))
        .description("Rate of query evaluations")
        .query(query(datasource, &QUERY_RATE, matchers, "{{job}} {{instance}}"))
        .build()
}

pub fn query_stage_duration(datasource: &str, matchers: &[LabelMatcher]) -> Panel {
    PanelBuilder::time_series("Stage Duration", stacked_chart(Unit::Seconds))
        .description("90th percentile time spent in each query engine stage")
        .query(query(datasource, &QUERY_STAGE_DURATION, matchers, "{{slice}}"))
        .build()
}

// === Remote write panels ===

pub fn timestamp_lag(datasource: &str, instance: &[LabelMatcher], queue: &[LabelMatcher]) -> Panel {
    let expr = ingest_minus_queue(
        set_label_matchers(&HIGHEST_TIMESTAMP_IN, instance),
        paren(set_label_matchers(&HIGHEST_TIMESTAMP_SENT, queue).not_equal(0.0)),
    );

    PanelBuilder::time_series("Highest Timestamp In vs. Highest Timestamp Sent", table_chart(Unit::Seconds))
        .description("How far remote write is behind the newest sample ingested")
        .query(Query::prometheus(datasource, expr.to_string(), REMOTE_LEGEND))
        .build()
}

pub fn timestamp_rate(datasource: &str, instance: &[LabelMatcher], queue: &[LabelMatcher]) -> Panel {
    let expr = clamp_min(
        ingest_minus_queue(
            set_label_matchers(&HIGHEST_TIMESTAMP_IN_RATE, instance),
            set_label_matchers(&HIGHEST_TIMESTAMP_SENT_RATE, queue),
        ),
        0.0,
    );

    PanelBuilder::time_series("Rate[5m]", table_chart(Unit::Decimal))
        .description("Whether remote write is catching up (negative) or falling behind (positive)")
        .query(Query::prometheus(datasource, expr.to_string(), REMOTE_LEGEND))
        .build()
}

pub fn sample_rate(datasource: &str, instance: &[LabelMatcher], queue: &[LabelMatcher]) -> Panel {
    let expr = ingest_minus_queue(
        set_label_matchers(&SAMPLES_IN_RATE, instance),
        paren(set_label_matchers(&SAMPLES_SENT_RATE, queue)),
    ) - paren(set_label_matchers(&DROPPED_SAMPLES, queue));

    PanelBuilder::time_series("Rate, in vs. succeeded or dropped [5m]", table_chart(Unit::CountsPerSecond))
        .description("Samples ingested minus samples sent or dropped")
        .query(Query::prometheus(datasource, expr.to_string(), REMOTE_LEGEND))
        .build()
}

pub fn current_shards(datasource: &str, matchers: &[LabelMatcher]) -> Panel {
    PanelBuilder::time_series("Current Shards", table_chart(Unit::Decimal))
        .query(query(datasource, &CURRENT_SHARDS, matchers, REMOTE_LEGEND))
        .build()
}

pub fn max_shards(datasource: &str, matchers: &[LabelMatcher]) -> Panel {
    PanelBuilder::time_series("Max Shards", chart(Unit::Decimal))
        .query(query(datasource, &MAX_SHARDS, matchers, REMOTE_LEGEND))
        .build()
}

pub fn min_shards(datasource: &str, matchers: &[LabelMatcher]) -> Panel {
    PanelBuilder::time_series("Min Shards", chart(Unit::Decimal))
        .query(query(datasource, &MIN_SHARDS, matchers, REMOTE_LEGEND))
        .build()
}

pub fn desired_shards(datasource: &str, matchers: &[LabelMatcher]) -> Panel {
    PanelBuilder::time_series("Desired Shards", chart(Unit::Decimal))
        .query(query(datasource, &DESIRED_SHARDS, matchers, REMOTE_LEGEND))
        .build()
}

pub fn shard_capacity(datasource: &str, matchers: &[LabelMatcher]) -> Panel {
    PanelBuilder::time_series("Shard Capacity", chart(Unit::Decimal))
        .query(query(datasource, &SHARD_CAPACITY, matchers, REMOTE_LEGEND))
        .build()
}

pub fn pending_samples(datasource: &str, matchers: &[LabelMatcher]) -> Panel {
    PanelBuilder::time_series("Pending Samples", chart(Unit::Decimal))
        .query(query(datasource, &PENDING_SAMPLES, matchers, REMOTE_LEGEND))
        .build()
}

pub fn tsdb_current_segment(datasource: &str, matchers: &[LabelMatcher]) -> Panel {
    PanelBuilder::time_series("TSDB Current Segment", chart(Unit::Decimal))
        .description("Write-ahead log segment currently written by the TSDB")
        .query(query(datasource, &TSDB_SEGMENT, matchers, "{{instance}}"))
        .build()
}

pub fn remote_write_current_segment(datasource: &str, matchers: &[LabelMatcher]) -> Panel {
    PanelBuilder::time_series("Remote Write Current Segment", chart(Unit::Decimal))
        .description("Write-ahead log segment currently read by remote write")
        .query(query(datasource, &REMOTE_WRITE_SEGMENT, matchers, "{{instance}} {{consumer}}"))
        .build()
}

pub fn dropped_samples(datasource: &str, matchers: &[LabelMatcher]) -> Panel {
    PanelBuilder::time_series("Dropped Samples", chart(Unit::CountsPerSecond))
        .query(query(datasource, &DROPPED_SAMPLES, matchers, REMOTE_LEGEND))
        .build()
}

pub fn failed_samples(datasource: &str, matchers: &[LabelMatcher]) -> Panel {
    PanelBuilder::time_series("Failed Samples", chart(Unit::CountsPerSecond))
        .query(query(datasource, &FAILED_SAMPLES, matchers, REMOTE_LEGEND))
        .build()
}

pub fn retried_samples(datasource: &str, matchers: &[LabelMatcher]) -> Panel {
    PanelBuilder::time_series("Retried Samples", chart(Unit::CountsPerSecond))
        .query(query(datasource, &RETRIED_SAMPLES, matchers, REMOTE_LEGEND))
        .build()
}

pub fn enqueue_retries(datasource: &str, matchers: &[LabelMatcher]) -> Panel {
    PanelBuilder::time_series("Enqueue Retries", chart(Unit::CountsPerSecond))
        .query(query(datasource, &ENQUEUE_RETRIES, matchers, REMOTE_LEGEND))
        .build()
}
