use super::*;

/// Start a vector selector for `name`.
pub fn metric(name: impl Into<String>) -> VectorSelector {
    VectorSelector {
        metric: name.into(),
        matchers: Vec::new(),
    }
}

impl VectorSelector {
    fn matcher(mut self, matcher: LabelMatcher) -> Self {
        self.matchers.push(matcher);
        self
    }

    pub fn eq(self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.matcher(LabelMatcher::eq(name, value))
    }

    pub fn ne(self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.matcher(LabelMatcher::ne(name, value))
    }

    pub fn re(self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.matcher(LabelMatcher::re(name, value))
    }

    /// Turn the selector into a range vector.
    pub fn over(self, range: impl Into<Range>) -> Expr {
        Expr::Matrix {
            selector: self,
            range: range.into(),
        }
    }
}

impl From<VectorSelector> for Expr {
    fn from(selector: VectorSelector) -> Self {
        Expr::Selector(selector)
    }
}

impl From<f64> for Expr {
    fn from(value: f64) -> Self {
        Expr::Number(value)
    }
}

pub fn number(value: f64) -> Expr {
    Expr::Number(value)
}

pub fn paren(expr: impl Into<Expr>) -> Expr {
    Expr::Paren(Box::new(expr.into()))
}

// === Functions ===

pub fn call(func: &'static str, args: Vec<Expr>) -> Expr {
    Expr::Call { func, args }
}

macro_rules! unary_functions {
    ($($name:ident),* $(,)?) => {
        $(
            pub fn $name(expr: impl Into<Expr>) -> Expr {
                call(stringify!($name), vec![expr.into()])
            }
        )*
    };
}

unary_functions!(rate, increase, changes, sort_desc);

pub fn histogram_quantile(quantile: f64, expr: impl Into<Expr>) -> Expr {
    call("histogram_quantile", vec![number(quantile), expr.into()])
}

pub fn clamp_min(expr: impl Into<Expr>, min: f64) -> Expr {
    call("clamp_min", vec![expr.into(), number(min)])
}

// === Aggregations ===

pub fn aggregate(op: AggregateOp, grouping: Option<Grouping>, expr: impl Into<Expr>) -> Expr {
    Expr::Aggregate {
        op,
        grouping,
        expr: Box::new(expr.into()),
    }
}

macro_rules! aggregations {
    ($($name:ident, $by:ident, $without:ident => $op:ident;)*) => {
        $(
            pub fn $name(expr: impl Into<Expr>) -> Expr {
                aggregate(AggregateOp::$op, None, expr)
            }

            pub fn $by(labels: &[&str], expr: impl Into<Expr>) -> Expr {
                aggregate(AggregateOp::$op, Some(Grouping::by(labels)), expr)
            }

            pub fn $without(labels: &[&str], expr: impl Into<Expr>) -> Expr {
                aggregate(AggregateOp::$op, Some(Grouping::without(labels)), expr)
            }
        )*
    };
}

aggregations! {
    sum, sum_by, sum_without => Sum;
    max, max_by, max_without => Max;
    count, count_by, count_without => Count;
}

pub fn avg(expr: impl Into<Expr>) -> Expr {
    aggregate(AggregateOp::Avg, None, expr)
}

// === Binary operations ===

pub fn binary(op: BinaryOp, lhs: impl Into<Expr>, rhs: impl Into<Expr>) -> Expr {
    Expr::Binary {
        op,
        lhs: Box::new(lhs.into()),
        rhs: Box::new(rhs.into()),
        matching: None,
    }
}

macro_rules! arithmetic {
    ($($trait:ident, $method:ident => $op:ident;)*) => {
        $(
            impl<T: Into<Expr>> std::ops::$trait<T> for Expr {
                type Output = Expr;

                fn $method(self, rhs: T) -> Expr {
                    binary(BinaryOp::$op, self, rhs)
                }
            }
        )*
    };
}

arithmetic! {
    Add, add => Add;
    Sub, sub => Sub;
    Mul, mul => Mul;
    Div, div => Div;
}

impl Expr {
    pub fn not_equal(self, rhs: impl Into<Expr>) -> Expr {
        binary(BinaryOp::NotEqual, self, rhs)
    }

    pub fn or(self, rhs: impl Into<Expr>) -> Expr {
        binary(BinaryOp::Or, self, rhs)
    }

    pub fn ignoring(self, labels: &[&str]) -> Expr {
        self.with_matching(|matching| {
            matching.ignoring = labels.iter().map(|l| l.to_string()).collect();
        })
    }

    pub fn group_left(self, labels: &[&str]) -> Expr {
        self.with_matching(|matching| {
            matching.card = Some(Cardinality::GroupLeft(
                labels.iter().map(|l| l.to_string()).collect(),
            ));
        })
    }

    pub fn group_right(self, labels: &[&str]) -> Expr {
        self.with_matching(|matching| {
            matching.card = Some(Cardinality::GroupRight(
                labels.iter().map(|l| l.to_string()).collect(),
            ));
        })
    }

    fn with_matching(mut self, update: impl FnOnce(&mut VectorMatching)) -> Expr {
        if let Expr::Binary { matching, .. } = &mut self {
            update(matching.get_or_insert_with(VectorMatching::default));
        } else {
            debug_assert!(false, "vector matching applies to binary expressions only");
        }
        self
    }
}
