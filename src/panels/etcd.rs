//! etcd cluster panels.

use super::*;
use crate::promql::*;
use once_cell::sync::Lazy;

static HAS_LEADER: Lazy<Expr> = Lazy::new(|| max(metric("etcd_server_has_leader")));

static RPC_RATE: Lazy<Expr> = Lazy::new(|| {
    sum(rate(
        metric("grpc_server_started_total")
            .eq("grpc_type", "unary")
            .over(Range::minutes(5)),
    ))
});

static RPC_FAILED_RATE: Lazy<Expr> = Lazy::new(|| {
    sum(rate(
        metric("grpc_server_handled_total")
            .eq("grpc_type", "unary")
            .ne("grpc_code", "OK")
            .over(Range::minutes(5)),
    ))
});

fn stream_count(service: &str) -> Expr {
    let started = metric("grpc_server_started_total")
        .eq("grpc_service", service)
        .eq("grpc_type", "bidi_stream");
    let handled = metric("grpc_server_handled_total")
        .eq("grpc_service", service)
        .eq("grpc_type", "bidi_stream");
    sum(started) - sum(handled)
}

static WATCH_STREAMS: Lazy<Expr> = Lazy::new(|| stream_count("etcdserverpb.Watch"));

static LEASE_STREAMS: Lazy<Expr> = Lazy::new(|| stream_count("etcdserverpb.Lease"));

static DB_SIZE: Lazy<Expr> =
    Lazy::new(|| metric("etcd_mvcc_db_total_size_in_bytes").into());

fn sync_duration(histogram: &str) -> Expr {
    histogram_quantile(
        0.99,
        sum_by(&["instance", "le"], rate(metric(histogram).over(Range::minutes(5)))),
    )
}

static WAL_FSYNC: Lazy<Expr> =
    Lazy::new(|| sync_duration("etcd_disk_wal_fsync_duration_seconds_bucket"));

static BACKEND_COMMIT: Lazy<Expr> =
    Lazy::new(|| sync_duration("etcd_disk_backend_commit_duration_seconds_bucket"));

static MEMORY: Lazy<Expr> = Lazy::new(|| metric("process_resident_memory_bytes").into());

static CLIENT_TRAFFIC_IN: Lazy<Expr> = Lazy::new(|| {
    rate(metric("etcd_network_client_grpc_received_bytes_total").over(Range::minutes(5)))
});

static CLIENT_TRAFFIC_OUT: Lazy<Expr> = Lazy::new(|| {
    rate(metric("etcd_network_client_grpc_sent_bytes_total").over(Range::minutes(5)))
});

static PEER_TRAFFIC_IN: Lazy<Expr> = Lazy::new(|| {
    sum_by(
        &["instance"],
        rate(metric("etcd_network_peer_received_bytes_total").over(Range::minutes(5))),
    )
});

static PEER_TRAFFIC_OUT: Lazy<Expr> = Lazy::new(|| {
    sum_by(
        &["instance"],
        rate(metric("etcd_network_peer_sent_bytes_total").over(Range::minutes(5))),
    )
});

fn proposal_rate(counter: &str) -> Expr {
    sum(rate(metric(counter).over(Range::minutes(5))))
}

static PROPOSALS_FAILED: Lazy<Expr> =
    Lazy::new(|| proposal_rate("etcd_server_proposals_failed_total"));
static PROPOSALS_PENDING: Lazy<Expr> =
    Lazy::new(|| sum(metric("etcd_server_proposals_pending")));
static PROPOSALS_COMMITTED: Lazy<Expr> =
    Lazy::new(|| proposal_rate("etcd_server_proposals_committed_total"));
static PROPOSALS_APPLIED: Lazy<Expr> =
    Lazy::new(|| proposal_rate("etcd_server_proposals_applied_total"));

static LEADER_ELECTIONS: Lazy<Expr> = Lazy::new(|| {
    changes(metric("etcd_server_leader_changes_seen_total").over(Range::days(1)))
});

static PEER_ROUND_TRIP: Lazy<Expr> = Lazy::new(|| {
    histogram_quantile(
        0.99,
        sum_by(
            &["instance", "le"],
            rate(metric("etcd_network_peer_round_trip_time_seconds_bucket").over(Range::minutes(5))),
        ),
    )
});

pub fn up(datasource: &str, matchers: &[LabelMatcher]) -> Panel {
    PanelBuilder::stat(
        "Up",
        StatChartSpec::new(Calculation::LastNumber, Unit::Decimal)
            .thresholds(Thresholds::steps("red", &[(1.0, "green")])),
    )
    .description("Whether the cluster currently has a leader")
    .query(query(datasource, &HAS_LEADER, matchers, ""))
    .build()
}

pub fn rpc_rate(datasource: &str, matchers: &[LabelMatcher]) -> Panel {
    PanelBuilder::time_series("RPC Rate", chart(Unit::OpsPerSecond))
        .description("Rate of unary gRPC requests and of those that failed")
        .query(query(datasource, &RPC_RATE, matchers, "RPC rate"))
        .query(query(datasource, &RPC_FAILED_RATE, matchers, "RPC failed rate"))
        .build()
}

pub fn active_streams(datasource: &str, matchers: &[LabelMatcher]) -> Panel {
    PanelBuilder::time_series("Active Streams", chart(Unit::Decimal))
        .description("Open watch and lease bidirectional streams")
        .query(query(datasource, &WATCH_STREAMS, matchers, "Watch streams"))
        .query(query(datasource, &LEASE_STREAMS, matchers, "Lease streams"))
        .build()
}

pub fn db_size(datasource: &str, matchers: &[LabelMatcher]) -> Panel {
    PanelBuilder::time_series("DB Size", chart(Unit::Bytes))
        .description("Physically allocated size of the backend database")
        .query(query(datasource, &DB_SIZE, matchers, "{{instance}} DB size"))
        .build()
}

pub fn disk_sync_duration(datasource: &str, matchers: &[LabelMatcher]) -> Panel {
    PanelBuilder::time_series("Disk Sync Duration", chart(Unit::Seconds))
        .description("99th percentile of WAL fsync and backend commit latency")
        .query(query(datasource, &WAL_FSYNC, matchers, "{{instance}} WAL fsync"))
        .query(query(datasource, &BACKEND_COMMIT, matchers, "{{instance}} DB fsync"))
        .build()
}

pub fn memory(datasource: &str, matchers: &[LabelMatcher]) -> Panel {
    PanelBuilder::time_series("Memory", chart(Unit::Bytes))
        .description("Resident memory of each etcd member")
        .query(query(datasource, &MEMORY, matchers, "{{instance}} resident memory"))
        .build()
}

pub fn client_traffic_in(datasource: &str, matchers: &[LabelMatcher]) -> Panel {
    PanelBuilder::time_series("Client Traffic In", stacked_chart(Unit::BytesPerSecond))
        .query(query(datasource, &CLIENT_TRAFFIC_IN, matchers, "{{instance}} client traffic in"))
        .build()
}

pub fn client_traffic_out(datasource: &str, matchers: &[LabelMatcher]) -> Panel {
    PanelBuilder::time_series("Client Traffic Out", stacked_chart(Unit::BytesPerSecond))
        .query(query(datasource, &CLIENT_TRAFFIC_OUT, matchers, "{{instance}} client traffic out"))
        .build()
}

pub fn peer_traffic_in(datasource: &str, matchers: &[LabelMatcher]) -> Panel {
    PanelBuilder::time_series("Peer Traffic In", stacked_chart(Unit::BytesPerSecond))
        .query(query(datasource, &PEER_TRAFFIC_IN, matchers, "{{instance}} peer traffic in"))
        .build()
}

pub fn peer_traffic_out(datasource: &str, matchers: &[LabelMatcher]) -> Panel {
    PanelBuilder::time_series("Peer Traffic Out", stacked_chart(Unit::BytesPerSecond))
        .query(query(datasource, &PEER_TRAFFIC_OUT, matchers, "{{instance}} peer traffic out"))
        .build()
}

pub fn raft_proposals(datasource: &str, matchers: &[LabelMatcher]) -> Panel {
    PanelBuilder::time_series("Raft Proposals", chart(Unit::Decimal))
        .description("Failed, pending, committed and applied raft proposals")
        .query(query(datasource, &PROPOSALS_FAILED, matchers, "Proposal failure rate"))
        .query(query(datasource, &PROPOSALS_PENDING, matchers, "Proposal pending total"))
        .query(query(datasource, &PROPOSALS_COMMITTED, matchers, "Proposal commit rate"))
        .query(query(datasource, &PROPOSALS_APPLIED, matchers, "Proposal apply rate"))
        .build()
}

pub fn leader_elections_per_day(datasource: &str, matchers: &[LabelMatcher]) -> Panel {
    PanelBuilder::time_series("Total Leader Elections Per Day", chart(Unit::Decimal))
        .query(query(datasource, &LEADER_ELECTIONS, matchers, "{{instance}} total leader elections per day"))
        .build()
}

pub fn peer_round_trip_time(datasource: &str, matchers: &[LabelMatcher]) -> Panel {
    PanelBuilder::time_series("Peer Round Trip Time", chart(Unit::Seconds))
        .description("99th percentile round trip time between members")
        .query(query(datasource, &PEER_ROUND_TRIP, matchers, "{{instance}} peer round trip time"))
        .build()
}
