//! PromQL expression AST used for dashboard query templates.
//!
//! Templates are constructed with the helpers in `builder` and rendered with
//! `Display`. Label matchers supplied by a dashboard are merged into every
//! vector selector of a template before rendering (see `matchers`).

use std::fmt;
use std::time::Duration;

mod builder;
mod matchers;

pub use builder::*;
pub use matchers::*;

/// PromQL expression AST
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Instant vector selector: metric_name{label1="value1", label2=~"value2"}
    Selector(VectorSelector),
    /// Range vector: metric[5m]
    Matrix {
        selector: VectorSelector,
        range: Range,
    },
    /// Function call: rate(metric[5m])
    Call {
        func: &'static str,
        args: Vec<Expr>,
    },
    /// Aggregation: sum by (label) (expr)
    Aggregate {
        op: AggregateOp,
        grouping: Option<Grouping>,
        expr: Box<Expr>,
    },
    /// Binary operation: expr1 + expr2
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
        matching: Option<VectorMatching>,
    },
    /// Explicit parentheses
    Paren(Box<Expr>),
    /// Scalar value
    Number(f64),
}

#[derive(Debug, Clone, PartialEq)]
pub struct VectorSelector {
    pub metric: String,
    pub matchers: Vec<LabelMatcher>,
}

/// Range of a matrix selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Range(Duration);

impl Range {
    pub const fn minutes(n: u64) -> Self {
        Range(Duration::from_secs(n * 60))
    }

    pub const fn days(n: u64) -> Self {
        Range(Duration::from_secs(n * 86_400))
    }
}

impl From<Duration> for Range {
    fn from(duration: Duration) -> Self {
        Range(duration)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateOp {
    Sum,
    Max,
    Avg,
    Count,
}

impl AggregateOp {
    fn name(self) -> &'static str {
        match self {
            AggregateOp::Sum => "sum",
            AggregateOp::Max => "max",
            AggregateOp::Avg => "avg",
            AggregateOp::Count => "count",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grouping {
    pub by: bool, // true for "by", false for "without"
    pub labels: Vec<String>,
}

impl Grouping {
    pub fn by(labels: &[&str]) -> Self {
        Self {
            by: true,
            labels: labels.iter().map(|l| l.to_string()).collect(),
        }
    }

    pub fn without(labels: &[&str]) -> Self {
        Self {
            by: false,
            labels: labels.iter().map(|l| l.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Or,
    NotEqual,
}

impl BinaryOp {
    fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Or => "or",
            BinaryOp::NotEqual => "!=",
        }
    }

    fn precedence(self) -> u8 {
        match self {
            BinaryOp::Or => 1,
            BinaryOp::NotEqual => 3,
            BinaryOp::Add | BinaryOp::Sub => 4,
            BinaryOp::Mul | BinaryOp::Div => 5,
        }
    }
}

/// `ignoring` label list plus optional many-to-one grouping.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct VectorMatching {
    pub ignoring: Vec<String>,
    pub card: Option<Cardinality>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cardinality {
    GroupLeft(Vec<String>),
    GroupRight(Vec<String>),
}

// === Rendering ===

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Selector(selector) => write!(f, "{selector}"),
            Expr::Matrix { selector, range } => write!(f, "{selector}[{range}]"),
            Expr::Call { func, args } => {
                write!(f, "{func}(")?;
                write_joined(f, args)?;
                f.write_str(")")
            }
            Expr::Aggregate { op, grouping, expr } => {
                f.write_str(op.name())?;
                if let Some(grouping) = grouping {
                    let keyword = if grouping.by { "by" } else { "without" };
                    write!(f, " {keyword} (")?;
                    write_joined(f, &grouping.labels)?;
                    f.write_str(") ")?;
                }
                write!(f, "({expr})")
            }
            Expr::Binary {
                op,
                lhs,
                rhs,
                matching,
            } => {
                write_operand(f, lhs, *op, false)?;
                write!(f, " {}", op.symbol())?;
                if let Some(matching) = matching {
                    f.write_str(" ignoring (")?;
                    write_joined(f, &matching.ignoring)?;
                    f.write_str(")")?;
                    match &matching.card {
                        Some(Cardinality::GroupLeft(labels)) => write_group(f, "group_left", labels)?,
                        Some(Cardinality::GroupRight(labels)) => write_group(f, "group_right", labels)?,
                        None => {}
                    }
                }
                f.write_str(" ")?;
                write_operand(f, rhs, *op, true)
            }
            Expr::Paren(expr) => write!(f, "({expr})"),
            Expr::Number(value) => write!(f, "{value}"),
        }
    }
}

impl fmt::Display for VectorSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.metric)?;
        if !self.matchers.is_empty() || self.metric.is_empty() {
            f.write_str("{")?;
            write_joined(f, &self.matchers)?;
            f.write_str("}")?;
        }
        Ok(())
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_duration(f, self.0)
    }
}

fn write_joined<T: fmt::Display>(f: &mut fmt::Formatter<'_>, items: &[T]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

fn write_group(f: &mut fmt::Formatter<'_>, keyword: &str, labels: &[String]) -> fmt::Result {
    write!(f, " {keyword}")?;
    if !labels.is_empty() {
        f.write_str(" (")?;
        write_joined(f, labels)?;
        f.write_str(")")?;
    }
    Ok(())
}

fn write_operand(f: &mut fmt::Formatter<'_>, operand: &Expr, parent: BinaryOp, right: bool) -> fmt::Result {
    let wrap = match operand {
        Expr::Binary { op, .. } => {
            // Every operator is left-associative.
            op.precedence() < parent.precedence() || (op.precedence() == parent.precedence() && right)
        }
        _ => false,
    };

    if wrap {
        write!(f, "({operand})")
    } else {
        write!(f, "{operand}")
    }
}

pub(crate) fn write_escaped(f: &mut fmt::Formatter<'_>, value: &str) -> fmt::Result {
    for c in value.chars() {
        match c {
            '\\' => f.write_str("\\\\")?,
            '"' => f.write_str("\\\"")?,
            '\n' => f.write_str("\\n")?,
            _ => write!(f, "{c}")?,
        }
    }
    Ok(())
}

/// Prometheus duration notation: largest units first, zero units skipped.
fn write_duration(f: &mut fmt::Formatter<'_>, duration: Duration) -> fmt::Result {
    const UNITS: [(&str, u128); 7] = [
        ("y", 365 * 86_400_000),
        ("w", 7 * 86_400_000),
        ("d", 86_400_000),
        ("h", 3_600_000),
        ("m", 60_000),
        ("s", 1_000),
        ("ms", 1),
    ];

    let mut ms = duration.as_millis();
    if ms == 0 {
        return f.write_str("0s");
    }

    for (unit, size) in UNITS {
        if ms >= size {
            write!(f, "{}{unit}", ms / size)?;
            ms %= size;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selector_rendering() {
        assert_eq!(metric("up").to_string(), "up");
        assert_eq!(
            metric("up").eq("job", "prometheus").re("instance", "$instance").to_string(),
            "up{job=\"prometheus\", instance=~\"$instance\"}"
        );
        assert_eq!(metric("").eq("job", "x").to_string(), "{job=\"x\"}");
    }

    #[test]
    fn test_escaping() {
        let selector = metric("up").eq("path", "C:\\tmp \"quoted\"");
        assert_eq!(selector.to_string(), r#"up{path="C:\\tmp \"quoted\""}"#);
    }

    #[test]
    fn test_durations() {
        let cases = vec![
            (Range::from(Duration::from_secs(30)), "30s"),
            (Range::minutes(5), "5m"),
            (Range::from(Duration::from_secs(90)), "1m30s"),
            (Range::minutes(60), "1h"),
            (Range::days(1), "1d"),
            (Range::days(7), "1w"),
            (Range::from(Duration::from_millis(1500)), "1s500ms"),
            (Range::from(Duration::ZERO), "0s"),
        ];

        for (range, expected) in cases {
            assert_eq!(range.to_string(), expected, "Failed for range: {:?}", range);
        }
    }

    #[test]
    fn test_aggregation_rendering() {
        let expr = sum_by(&["job", "instance"], rate(metric("http_requests_total").over(Range::minutes(5))));
        assert_eq!(expr.to_string(), "sum by (job, instance) (rate(http_requests_total[5m]))");

        let expr = sum(metric("up"));
        assert_eq!(expr.to_string(), "sum(up)");

        let expr = max_without(&["mode"], avg(metric("node_load1")));
        assert_eq!(expr.to_string(), "max without (mode) (avg(node_load1))");

        let expr = count_without(&["cpu", "mode"], metric("node_cpu_seconds_total").eq("mode", "idle"));
        assert_eq!(
            expr.to_string(),
            "count without (cpu, mode) (node_cpu_seconds_total{mode=\"idle\"})"
        );
    }

    #[test]
    fn test_histogram_quantile() {
        let expr = histogram_quantile(
            0.99,
            sum_by(&["le"], rate(metric("request_duration_seconds_bucket").over(Range::minutes(5)))),
        );
        assert_eq!(
            expr.to_string(),
            "histogram_quantile(0.99, sum by (le) (rate(request_duration_seconds_bucket[5m])))"
        );
    }

    #[test]
    fn test_precedence() {
        let a = || Expr::from(metric("a"));
        let b = || Expr::from(metric("b"));
        let c = || Expr::from(metric("c"));

        assert_eq!(((a() + b()) * c()).to_string(), "(a + b) * c");
        assert_eq!((a() + b() * c()).to_string(), "a + b * c");
        assert_eq!((a() - (b() - c())).to_string(), "a - (b - c)");
        assert_eq!((a() - b() - c()).to_string(), "a - b - c");
        assert_eq!((a() / b() * 100.0).to_string(), "a / b * 100");
        assert_eq!(((a() + b()).not_equal(0.5)).to_string(), "a + b != 0.5");
        assert_eq!((a().or(b()) / c()).to_string(), "(a or b) / c");
    }

    #[test]
    fn test_vector_matching() {
        let expr = (Expr::from(metric("a")) - Expr::from(metric("b")))
            .ignoring(&["remote_name", "url"])
            .group_right(&["instance"]);
        assert_eq!(
            expr.to_string(),
            "a - ignoring (remote_name, url) group_right (instance) b"
        );

        let expr = (Expr::from(metric("a")) / Expr::from(metric("b")))
            .ignoring(&["cpu"])
            .group_left(&[]);
        assert_eq!(expr.to_string(), "a / ignoring (cpu) group_left b");
    }

    #[test]
    fn test_numbers() {
        assert_eq!(number(1e9).to_string(), "1000000000");
        assert_eq!(number(0.99).to_string(), "0.99");
        assert_eq!(number(-1.0).to_string(), "-1");
    }
}
