//! Node exporter host panels.

use super::*;
use crate::promql::*;
use once_cell::sync::Lazy;

/// Physical and virtual block devices; loop and ram devices are left out.
const DISK_DEVICES: &str = "(/dev/)?(mmcblk.p.+|nvme.+|rbd.+|sd.+|vd.+|xvd.+|dm-.+|md.+|dasd.+)";

static CPU_USAGE: Lazy<Expr> = Lazy::new(|| {
    ((number(1.0)
        - sum_without(
            &["mode"],
            rate(
                metric("node_cpu_seconds_total")
                    .re("mode", "idle|iowait|steal")
                    .over(Range::minutes(5)),
            ),
        ))
        / count_without(&["cpu", "mode"], metric("node_cpu_seconds_total").eq("mode", "idle")))
    .ignoring(&["cpu"])
    .group_left(&[])
});

static LOAD_1: Lazy<Expr> = Lazy::new(|| metric("node_load1").into());
static LOAD_5: Lazy<Expr> = Lazy::new(|| metric("node_load5").into());
static LOAD_15: Lazy<Expr> = Lazy::new(|| metric("node_load15").into());
static LOGICAL_CORES: Lazy<Expr> =
    Lazy::new(|| count(metric("node_cpu_seconds_total").eq("mode", "idle")));

static MEMORY_USED: Lazy<Expr> = Lazy::new(|| {
    Expr::from(metric("node_memory_MemTotal_bytes"))
        - metric("node_memory_MemFree_bytes")
        - metric("node_memory_Buffers_bytes")
        - metric("node_memory_Cached_bytes")
});
static MEMORY_BUFFERS: Lazy<Expr> = Lazy::new(|| metric("node_memory_Buffers_bytes").into());
static MEMORY_CACHED: Lazy<Expr> = Lazy::new(|| metric("node_memory_Cached_bytes").into());
static MEMORY_FREE: Lazy<Expr> = Lazy::new(|| metric("node_memory_MemFree_bytes").into());

static MEMORY_USED_PERCENT: Lazy<Expr> = Lazy::new(|| {
    number(100.0)
        - avg(metric("node_memory_MemAvailable_bytes")) / avg(metric("node_memory_MemTotal_bytes"))
            * 100.0
});

fn disk_rate(counter: &str) -> Expr {
    rate(
        metric(counter)
            .re("device", DISK_DEVICES)
            .over(Range::minutes(5)),
    )
}

static DISK_READ_BYTES: Lazy<Expr> = Lazy::new(|| disk_rate("node_disk_read_bytes_total"));
static DISK_WRITTEN_BYTES: Lazy<Expr> = Lazy::new(|| disk_rate("node_disk_written_bytes_total"));
static DISK_IO_TIME: Lazy<Expr> = Lazy::new(|| disk_rate("node_disk_io_time_seconds_total"));

static FILESYSTEM_USAGE: Lazy<Expr> = Lazy::new(|| {
    sort_desc(
        number(1.0)
            - max_without(
                &["mountpoint", "fstype"],
                metric("node_filesystem_avail_bytes").ne("fstype", ""),
            ) / max_without(
                &["mountpoint", "fstype"],
                metric("node_filesystem_size_bytes").ne("fstype", ""),
            ),
    )
});

fn network_bits(counter: &str) -> Expr {
    rate(metric(counter).ne("device", "lo").over(Range::minutes(5))) * 8.0
}

static NETWORK_RECEIVED: Lazy<Expr> = Lazy::new(|| network_bits("node_network_receive_bytes_total"));
static NETWORK_TRANSMITTED: Lazy<Expr> =
    Lazy::new(|| network_bits("node_network_transmit_bytes_total"));

pub fn cpu_usage(datasource: &str, matchers: &[LabelMatcher]) -> Panel {
    PanelBuilder::time_series("CPU Usage", stacked_chart(Unit::PercentDecimal).max(1.0))
        .description("Share of each CPU spent outside idle, iowait and steal")
        .query(query(datasource, &CPU_USAGE, matchers, "{{cpu}}"))
        .build()
}

pub fn load_average(datasource: &str, matchers: &[LabelMatcher]) -> Panel {
    PanelBuilder::time_series("Load Average", chart(Unit::Decimal))
        .description("System load against the number of logical cores")
        .query(query(datasource, &LOAD_1, matchers, "1m load average"))
        .query(query(datasource, &LOAD_5, matchers, "5m load average"))
        .query(query(datasource, &LOAD_15, matchers, "15m load average"))
        .query(query(datasource, &LOGICAL_CORES, matchers, "logical cores"))
        .build()
}

pub fn memory_usage(datasource: &str, matchers: &[LabelMatcher]) -> Panel {
    PanelBuilder::time_series("Memory Usage", stacked_chart(Unit::Bytes))
        .query(query(datasource, &MEMORY_USED, matchers, "memory used"))
        .query(query(datasource, &MEMORY_BUFFERS, matchers, "memory buffers"))
        .query(query(datasource, &MEMORY_CACHED, matchers, "memory cached"))
        .query(query(datasource, &MEMORY_FREE, matchers, "memory free"))
        .build()
}

pub fn memory_usage_gauge(datasource: &str, matchers: &[LabelMatcher]) -> Panel {
    PanelBuilder::gauge(
        "Memory Usage",
        GaugeChartSpec::new(Calculation::LastNumber, Unit::Percent)
            .max(100.0)
            .thresholds(Thresholds::steps("green", &[(80.0, "orange"), (90.0, "red")])),
    )
    .description("Memory in use as a percentage of total memory")
    .query(query(datasource, &MEMORY_USED_PERCENT, matchers, ""))
    .build()
}

pub fn disk_io_bytes(datasource: &str, matchers: &[LabelMatcher]) -> Panel {
    PanelBuilder::time_series("Disk I/O Bytes", chart(Unit::BytesPerSecond))
        .query(query(datasource, &DISK_READ_BYTES, matchers, "{{device}} read"))
        .query(query(datasource, &DISK_WRITTEN_BYTES, matchers, "{{device}} written"))
        .build()
}

pub fn disk_io_seconds(datasource: &str, matchers: &[LabelMatcher]) -> Panel {
    PanelBuilder::time_series("Disk I/O Seconds", chart(Unit::PercentDecimal))
        .description("Share of time each device spent doing I/O")
        .query(query(datasource, &DISK_IO_TIME, matchers, "{{device}} io time"))
        .build()
}

pub fn filesystem_usage(datasource: &str, matchers: &[LabelMatcher]) -> Panel {
    PanelBuilder::time_series("Filesystem Usage", table_chart(Unit::PercentDecimal).max(1.0))
        .query(query(datasource, &FILESYSTEM_USAGE, matchers, "{{device}}"))
        .build()
}

pub fn network_received(datasource: &str, matchers: &[LabelMatcher]) -> Panel {
    PanelBuilder::time_series("Network Received", chart(Unit::BitsPerSecond))
        .description("Network traffic received per interface, loopback excluded")
        .query(query(datasource, &NETWORK_RECEIVED, matchers, "{{device}}"))
        .build()
}

pub fn network_transmitted(datasource: &str, matchers: &[LabelMatcher]) -> Panel {
    PanelBuilder::time_series("Network Transmitted", chart(Unit::BitsPerSecond))
        .description("Network traffic transmitted per interface, loopback excluded")
        .query(query(datasource, &NETWORK_TRANSMITTED, matchers, "{{device}}"))
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::panels::tests::{assert_queries_carry, matchers};

    #[test]
    fn test_cpu_usage_query() {
        let panel = cpu_usage("prom", &[LabelMatcher::variable("instance")]);
        assert_eq!(
            panel.queries()[0].expr(),
            "(1 - sum without (mode) (rate(node_cpu_seconds_total{mode=~\"idle|iowait|steal\", instance=~\"$instance\"}[5m]))) / ignoring (cpu) group_left count without (cpu, mode) (node_cpu_seconds_total{mode=\"idle\", instance=~\"$instance\"})"
        );
    }

    #[test]
    fn test_memory_used_subtracts_left_to_right() {
        let panel = memory_usage("prom", &[]);
        assert_eq!(
            panel.queries()[0].expr(),
            "node_memory_MemTotal_bytes - node_memory_MemFree_bytes - node_memory_Buffers_bytes - node_memory_Cached_bytes"
        );
    }

    #[test]
    fn test_network_excludes_loopback() {
        let panel = network_received("prom", &[]);
        assert_eq!(
            panel.queries()[0].expr(),
            "rate(node_network_receive_bytes_total{device!=\"lo\"}[5m]) * 8"
        );
    }

    #[test]
    fn test_panels_carry_matchers() {
        let builders: Vec<fn(&str, &[LabelMatcher]) -> Panel> = vec![
            cpu_usage,
            load_average,
            memory_usage,
            memory_usage_gauge,
            disk_io_bytes,
            disk_io_seconds,
            filesystem_usage,
            network_received,
            network_transmitted,
        ];
        for build in builders {
            assert_queries_carry(&build("prom", &matchers()), "prom", &matchers());
        }
    }
}
