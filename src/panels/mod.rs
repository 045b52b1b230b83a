//! Panel builders, one function per panel.
//!
//! Every builder takes the datasource name and the dashboard's label
//! matchers, substitutes the matchers into a fixed query template and wraps
//! the result in pre-built widget options.

pub mod alertmanager;
pub mod etcd;
pub mod kubernetes;
pub mod node_exporter;
pub mod perses;
pub mod process;
pub mod prometheus;

use crate::dashboard::*;
use crate::promql::{self, Expr, LabelMatcher};

/// Query `template` with `matchers` merged into every selector.
pub(crate) fn query(datasource: &str, template: &Expr, matchers: &[LabelMatcher], legend: &str) -> Query {
    Query::prometheus(datasource, promql::render(template, matchers), legend)
}

/// Line chart with a bottom legend, the default for rate and gauge panels.
pub(crate) fn chart(unit: Unit) -> TimeSeriesChartSpec {
    TimeSeriesChartSpec::new()
        .unit(unit)
        .legend(Legend::bottom())
        .visual(Visual::line(1.25, 0.1))
}

/// Line chart with a table legend showing mean and max, used where many
/// series are expected.
pub(crate) fn table_chart(unit: Unit) -> TimeSeriesChartSpec {
    TimeSeriesChartSpec::new()
        .unit(unit)
        .legend(Legend::table(&[Calculation::Mean, Calculation::Max]))
        .visual(Visual::line(1.25, 0.1))
}

pub(crate) fn stacked_chart(unit: Unit) -> TimeSeriesChartSpec {
    TimeSeriesChartSpec::new()
        .unit(unit)
        .legend(Legend::table(&[Calculation::Mean, Calculation::Max]))
        .visual(Visual::line(0.25, 0.5).stacked())
}
