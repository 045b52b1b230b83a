use super::*;
use crate::panels::{process, prometheus};

pub fn overview(options: &DashboardOptions) -> Result<Dashboard, BuildError> {
    let (variables, matchers) = VariableChain::new(options, "prometheus_build_info")
        .label("job")
        .label("instance")
        .build();
    let ds = options.datasource.as_str();

    options
        .dashboard("prometheus-overview", "Prometheus / Overview")
        .variables(variables)
        .group(
            GroupConfig::new("Prometheus Stats")
                .panels_per_line(1)
                .panel(prometheus::stats_table(ds, &matchers)),
        )
        .group(
            GroupConfig::new("Discovery")
                .panel(prometheus::target_sync(ds, &matchers))
                .panel(prometheus::targets(ds, &matchers)),
        )
        .group(
            GroupConfig::new("Retrieval")
                .panels_per_line(3)
                .panel(prometheus::average_scrape_interval(ds, &matchers))
                .panel(prometheus::scrape_failures(ds, &matchers))
                .panel(prometheus::appended_samples(ds, &matchers)),
        )
        .group(
            GroupConfig::new("Storage")
                .panel(prometheus::head_series(ds, &matchers))
                .panel(prometheus::head_chunks(ds, &matchers)),
        )
        .group(
            GroupConfig::new("Query")
                .panel(prometheus::query_rate(ds, &matchers))
                .panel(prometheus::query_stage_duration(ds, &matchers)),
        )
        .group(
            GroupConfig::new("Resource Usage")
                .panels_per_line(3)
                .panels(process::resource_panels(ds, &matchers)),
        )
        .build()
}

pub fn remote_write(options: &DashboardOptions) -> Result<Dashboard, BuildError> {
    let chain = VariableChain::new(options, "prometheus_remote_storage_shards").label("instance");
    // Ingest and WAL segment series carry no remote url, so those selectors
    // stop at the instance filter.
    let instance_matchers = chain.matchers().to_vec();
    let (variables, matchers) = chain.label("url").build();
    let ds = options.datasource.as_str();

    options
        .dashboard("prometheus-remote-write", "Prometheus / Remote Write")
        .variables(variables)
        .group(
            GroupConfig::new("Timestamps")
                .panel(prometheus::timestamp_lag(ds, &instance_matchers, &matchers))
                .panel(prometheus::timestamp_rate(ds, &instance_matchers, &matchers)),
        )
        .group(
            GroupConfig::new("Samples")
                .panels_per_line(1)
                .panel(prometheus::sample_rate(ds, &instance_matchers, &matchers)),
        )
        .group(
            GroupConfig::new("Shards")
                .panels_per_line(4)
                .panel(prometheus::current_shards(ds, &matchers))
                .panel(prometheus::max_shards(ds, &matchers))
                .panel(prometheus::min_shards(ds, &matchers))
                .panel(prometheus::desired_shards(ds, &matchers)),
        )
        .group(
            GroupConfig::new("Shard Details")
                .panel(prometheus::shard_capacity(ds, &matchers))
                .panel(prometheus::pending_samples(ds, &matchers)),
        )
        .group(
            GroupConfig::new("Segments")
                .panel(prometheus::tsdb_current_segment(ds, &instance_matchers))
                .panel(prometheus::remote_write_current_segment(ds, &instance_matchers)),
        )
        .group(
            GroupConfig::new("Misc. Rates")
                .panels_per_line(4)
                .panel(prometheus::dropped_samples(ds, &matchers))
                .panel(prometheus::failed_samples(ds, &matchers))
                .panel(prometheus::retried_samples(ds, &matchers))
                .panel(prometheus::enqueue_retries(ds, &matchers)),
        )
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overview_variables() {
        let dashboard = overview(&DashboardOptions::default()).expect("builds");
        let names: Vec<&str> = dashboard.spec.variables.iter().map(|v| v.name()).collect();
        assert_eq!(names, vec!["job", "instance"]);
        assert_eq!(dashboard.spec.layouts.len(), 6);
    }

    #[test]
    fn test_segment_panels_skip_url_matcher() {
        let dashboard = remote_write(&DashboardOptions::default()).expect("builds");
        let segments = dashboard
            .spec
            .panels
            .values()
            .find(|p| p.title() == "TSDB Current Segment")
            .expect("segment panel");
        assert!(!segments.queries()[0].expr().contains("$url"));

        let shards = dashboard
            .spec
            .panels
            .values()
            .find(|p| p.title() == "Current Shards")
            .expect("shards panel");
        assert_eq!(
            shards.queries()[0].expr(),
            "prometheus_remote_storage_shards{instance=~\"$instance\", url=~\"$url\"}"
        );
    }

    #[test]
    fn test_ingest_series_skip_url_matcher() {
        let options = DashboardOptions {
            cluster_label_name: "cluster".to_string(),
            ..Default::default()
        };
        let dashboard = remote_write(&options).expect("builds");

        for title in [
            "Highest Timestamp In vs. Highest Timestamp Sent",
            "Rate[5m]",
            "Rate, in vs. succeeded or dropped [5m]",
        ] {
            let panel = dashboard
                .spec
                .panels
                .values()
                .find(|p| p.title() == title)
                .expect("remote write panel");
            let expr = panel.queries()[0].expr();
            let ingest = if expr.contains("samples_in_total") {
                "prometheus_remote_storage_samples_in_total{cluster=\"$cluster\", instance=~\"$instance\"}"
            } else {
                "prometheus_remote_storage_highest_timestamp_in_seconds{cluster=\"$cluster\", instance=~\"$instance\"}"
            };
            assert!(expr.contains(ingest), "{title}: {expr}");
            assert!(expr.contains("url=~\"$url\""), "{title}: {expr}");
        }
    }
}
