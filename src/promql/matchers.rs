use super::*;
use once_cell::sync::Lazy;
use regex::Regex;

static LABEL_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z_][a-zA-Z0-9_]*$").expect("valid label name regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatchOp {
    Equal,
    NotEqual,
    Regex,
}

impl MatchOp {
    fn symbol(self) -> &'static str {
        match self {
            MatchOp::Equal => "=",
            MatchOp::NotEqual => "!=",
            MatchOp::Regex => "=~",
        }
    }
}

/// A (name, operator, value) triple used to filter a time-series query.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LabelMatcher {
    pub name: String,
    pub op: MatchOp,
    pub value: String,
}

impl LabelMatcher {
    pub fn new(name: impl Into<String>, op: MatchOp, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            op,
            value: value.into(),
        }
    }

    pub fn eq(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(name, MatchOp::Equal, value)
    }

    pub fn ne(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(name, MatchOp::NotEqual, value)
    }

    pub fn re(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(name, MatchOp::Regex, value)
    }

    /// Matcher bound to the dashboard variable of the same name, e.g.
    /// `job=~"$job"`. Regex so multi-value and "All" selections work.
    pub fn variable(name: &str) -> Self {
        Self::re(name, format!("${name}"))
    }
}

impl fmt::Display for LabelMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}\"", self.name, self.op.symbol())?;
        write_escaped(f, &self.value)?;
        f.write_str("\"")
    }
}

impl VectorSelector {
    /// Merge `overrides` into the selector. A matcher for a label the
    /// selector already filters on replaces the existing one in place,
    /// anything else is appended in the order given.
    pub fn merge_matchers(&mut self, overrides: &[LabelMatcher]) {
        for matcher in overrides {
            match self.matchers.iter_mut().find(|m| m.name == matcher.name) {
                Some(existing) => *existing = matcher.clone(),
                None => self.matchers.push(matcher.clone()),
            }
        }
    }
}

impl Expr {
    /// Visit every vector selector, including those inside range vectors.
    pub fn visit_selectors_mut(&mut self, visit: &mut impl FnMut(&mut VectorSelector)) {
        match self {
            Expr::Selector(selector) => visit(selector),
            Expr::Matrix { selector, .. } => visit(selector),
            Expr::Call { args, .. } => {
                for arg in args {
                    arg.visit_selectors_mut(visit);
                }
            }
            Expr::Aggregate { expr, .. } | Expr::Paren(expr) => expr.visit_selectors_mut(visit),
            Expr::Binary { lhs, rhs, .. } => {
                lhs.visit_selectors_mut(visit);
                rhs.visit_selectors_mut(visit);
            }
            Expr::Number(_) => {}
        }
    }
}

/// Copy `template` with `matchers` merged into every vector selector.
pub fn set_label_matchers(template: &Expr, matchers: &[LabelMatcher]) -> Expr {
    let mut expr = template.clone();
    expr.visit_selectors_mut(&mut |selector| selector.merge_matchers(matchers));
    expr
}

/// Substitute `matchers` into `template` and render it as PromQL.
pub fn render(template: &Expr, matchers: &[LabelMatcher]) -> String {
    set_label_matchers(template, matchers).to_string()
}

pub fn is_valid_label_name(name: &str) -> bool {
    LABEL_NAME.is_match(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn template() -> Expr {
        sum_by(
            &["job"],
            rate(metric("prometheus_target_sync_length_seconds_sum").eq("job", "prometheus").over(Range::minutes(5))),
        ) / sum(metric("up"))
    }

    #[test]
    fn test_matchers_appended_to_every_selector() {
        let rendered = render(&template(), &[LabelMatcher::variable("instance")]);
        assert_eq!(
            rendered,
            "sum by (job) (rate(prometheus_target_sync_length_seconds_sum{job=\"prometheus\", instance=~\"$instance\"}[5m])) / sum(up{instance=~\"$instance\"})"
        );
    }

    #[test]
    fn test_existing_label_replaced_in_place() {
        let rendered = render(
            &template(),
            &[LabelMatcher::variable("job"), LabelMatcher::eq("cluster", "$cluster")],
        );
        assert_eq!(
            rendered,
            "sum by (job) (rate(prometheus_target_sync_length_seconds_sum{job=~\"$job\", cluster=\"$cluster\"}[5m])) / sum(up{job=~\"$job\", cluster=\"$cluster\"})"
        );
    }

    #[test]
    fn test_no_duplicate_label_names() {
        let mut expr = set_label_matchers(
            &template(),
            &[
                LabelMatcher::eq("instance", "a"),
                LabelMatcher::eq("instance", "b"),
                LabelMatcher::eq("job", "c"),
            ],
        );

        expr.visit_selectors_mut(&mut |selector| {
            let mut names: Vec<&str> = selector.matchers.iter().map(|m| m.name.as_str()).collect();
            let total = names.len();
            names.sort();
            names.dedup();
            assert_eq!(names.len(), total, "duplicate matcher in {selector}");

            let instance = selector.matchers.iter().find(|m| m.name == "instance");
            assert_eq!(instance.map(|m| m.value.as_str()), Some("b"));
        });
    }

    #[test]
    fn test_template_untouched() {
        let original = template();
        let _ = set_label_matchers(&original, &[LabelMatcher::eq("cluster", "x")]);
        assert_eq!(original, template());
        assert!(!original.to_string().contains("cluster"));
    }

    #[test]
    fn test_empty_matchers_render_template() {
        assert_eq!(render(&template(), &[]), template().to_string());
    }

    #[test]
    fn test_label_name_validation() {
        assert!(is_valid_label_name("cluster"));
        assert!(is_valid_label_name("_private"));
        assert!(is_valid_label_name("k8s_cluster_1"));
        assert!(!is_valid_label_name(""));
        assert!(!is_valid_label_name("1cluster"));
        assert!(!is_valid_label_name("cluster-name"));
    }
}
