use serde::Serialize;
use std::collections::BTreeMap;

pub const PROMETHEUS_DATASOURCE_KIND: &str = "PrometheusDatasource";

/// Perses dashboard resource
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dashboard {
    pub kind: DashboardKind,
    pub metadata: ProjectMetadata,
    pub spec: DashboardSpec,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum DashboardKind {
    #[default]
    Dashboard,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectMetadata {
    pub name: String,
    pub project: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSpec {
    pub display: Display,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub variables: Vec<Variable>,
    pub panels: BTreeMap<String, Panel>,
    pub layouts: Vec<Layout>,
    pub duration: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Display {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Display {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DatasourceSelector {
    pub kind: String,
    pub name: String,
}

impl DatasourceSelector {
    pub fn prometheus(name: impl Into<String>) -> Self {
        Self {
            kind: PROMETHEUS_DATASOURCE_KIND.to_string(),
            name: name.into(),
        }
    }
}

// === Layouts ===

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "spec")]
pub enum Layout {
    Grid(GridLayoutSpec),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GridLayoutSpec {
    pub display: GridDisplay,
    pub items: Vec<GridItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GridDisplay {
    pub title: String,
    pub collapse: Collapse,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Collapse {
    pub open: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GridItem {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    pub content: PanelRef,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PanelRef {
    #[serde(rename = "$ref")]
    pub reference: String,
}

impl PanelRef {
    pub fn new(key: &str) -> Self {
        Self {
            reference: format!("#/spec/panels/{key}"),
        }
    }

    /// Panel key this reference points at.
    pub fn key(&self) -> Option<&str> {
        self.reference.strip_prefix("#/spec/panels/")
    }
}

// === Panels ===

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum PanelKind {
    #[default]
    Panel,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Panel {
    pub kind: PanelKind,
    pub spec: PanelSpec,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PanelSpec {
    pub display: Display,
    pub plugin: PanelPlugin,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub queries: Vec<Query>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "spec")]
pub enum PanelPlugin {
    TimeSeriesChart(TimeSeriesChartSpec),
    StatChart(StatChartSpec),
    GaugeChart(GaugeChartSpec),
    Table(TableSpec),
    Markdown(MarkdownSpec),
}

/// Unit types for panel values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Unit {
    #[serde(rename = "decimal")]
    Decimal,
    #[serde(rename = "percent")]
    Percent,
    #[serde(rename = "percent-decimal")]
    PercentDecimal,
    #[serde(rename = "bytes")]
    Bytes,
    #[serde(rename = "bytes/sec")]
    BytesPerSecond,
    #[serde(rename = "bits/sec")]
    BitsPerSecond,
    #[serde(rename = "seconds")]
    Seconds,
    #[serde(rename = "ops/sec")]
    OpsPerSecond,
    #[serde(rename = "requests/sec")]
    RequestsPerSecond,
    #[serde(rename = "counts/sec")]
    CountsPerSecond,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Format {
    pub unit: Unit,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decimal_places: Option<u8>,
}

impl From<Unit> for Format {
    fn from(unit: Unit) -> Self {
        Self {
            unit,
            decimal_places: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Calculation {
    LastNumber,
    Mean,
    Max,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Thresholds {
    pub mode: ThresholdMode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_color: Option<String>,
    pub steps: Vec<ThresholdStep>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ThresholdMode {
    Absolute,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ThresholdStep {
    pub value: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

// TimeSeriesChart

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSeriesChartSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub legend: Option<Legend>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y_axis: Option<YAxis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visual: Option<Visual>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thresholds: Option<Thresholds>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Legend {
    pub position: LegendPosition,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<LegendMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<LegendSize>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<Calculation>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LegendPosition {
    Bottom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LegendMode {
    List,
    Table,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LegendSize {
    Small,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct YAxis {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<Format>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Visual {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display: Option<VisualDisplay>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_width: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub area_opacity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub palette: Option<Palette>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack: Option<Stack>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VisualDisplay {
    Line,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Palette {
    pub mode: PaletteMode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PaletteMode {
    Auto,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stack {
    All,
}

// StatChart / GaugeChart

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatChartSpec {
    pub calculation: Calculation,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<Format>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thresholds: Option<Thresholds>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GaugeChartSpec {
    pub calculation: Calculation,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<Format>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thresholds: Option<Thresholds>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
}

// Table

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub density: Option<TableDensity>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub column_settings: Vec<ColumnSettings>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TableDensity {
    Compact,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnSettings {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub header: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hide: Option<bool>,
}

impl ColumnSettings {
    pub fn header(name: impl Into<String>, header: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            header: Some(header.into()),
            hide: None,
        }
    }

    pub fn hidden(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            header: None,
            hide: Some(true),
        }
    }
}

// Markdown

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarkdownSpec {
    pub text: String,
}

// === Queries ===

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "spec")]
pub enum Query {
    TimeSeriesQuery(TimeSeriesQuerySpec),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeSeriesQuerySpec {
    pub plugin: QueryPlugin,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "spec")]
pub enum QueryPlugin {
    PrometheusTimeSeriesQuery(PrometheusQuerySpec),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrometheusQuerySpec {
    pub datasource: DatasourceSelector,
    pub query: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub series_name_format: Option<String>,
}

impl Query {
    /// Prometheus time series query against the named datasource.
    pub fn prometheus(datasource: &str, query: impl Into<String>, series_name_format: &str) -> Self {
        Query::TimeSeriesQuery(TimeSeriesQuerySpec {
            plugin: QueryPlugin::PrometheusTimeSeriesQuery(PrometheusQuerySpec {
                datasource: DatasourceSelector::prometheus(datasource),
                query: query.into(),
                series_name_format: (!series_name_format.is_empty())
                    .then(|| series_name_format.to_string()),
            }),
        })
    }

    pub fn expr(&self) -> &str {
        match self {
            Query::TimeSeriesQuery(spec) => match &spec.plugin {
                QueryPlugin::PrometheusTimeSeriesQuery(spec) => &spec.query,
            },
        }
    }

    pub fn datasource(&self) -> &DatasourceSelector {
        match self {
            Query::TimeSeriesQuery(spec) => match &spec.plugin {
                QueryPlugin::PrometheusTimeSeriesQuery(spec) => &spec.datasource,
            },
        }
    }
}

// === Variables ===

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "spec")]
pub enum Variable {
    ListVariable(ListVariableSpec),
}

impl Variable {
    pub fn name(&self) -> &str {
        match self {
            Variable::ListVariable(spec) => &spec.name,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct VariableDisplay {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub hidden: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum VariableSort {
    AlphabeticalAsc,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListVariableSpec {
    pub name: String,
    pub display: VariableDisplay,
    pub allow_all_value: bool,
    pub allow_multiple: bool,
    pub sort: VariableSort,
    pub plugin: VariablePlugin,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "spec")]
pub enum VariablePlugin {
    PrometheusLabelValuesVariable(LabelValuesSpec),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelValuesSpec {
    pub datasource: DatasourceSelector,
    pub label_name: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub matchers: Vec<String>,
}
