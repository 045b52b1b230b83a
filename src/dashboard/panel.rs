use super::common::*;

pub struct PanelBuilder {
    display: Display,
    plugin: PanelPlugin,
    queries: Vec<Query>,
}

impl PanelBuilder {
    fn new(title: impl Into<String>, plugin: PanelPlugin) -> Self {
        Self {
            display: Display::new(title),
            plugin,
            queries: Vec::new(),
        }
    }

    pub fn time_series(title: impl Into<String>, spec: TimeSeriesChartSpec) -> Self {
        Self::new(title, PanelPlugin::TimeSeriesChart(spec))
    }

    pub fn stat(title: impl Into<String>, spec: StatChartSpec) -> Self {
        Self::new(title, PanelPlugin::StatChart(spec))
    }

    pub fn gauge(title: impl Into<String>, spec: GaugeChartSpec) -> Self {
        Self::new(title, PanelPlugin::GaugeChart(spec))
    }

    pub fn table(title: impl Into<String>, spec: TableSpec) -> Self {
        Self::new(title, PanelPlugin::Table(spec))
    }

    pub fn markdown(title: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(title, PanelPlugin::Markdown(MarkdownSpec { text: text.into() }))
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.display.description = Some(description.into());
        self
    }

    pub fn query(mut self, query: Query) -> Self {
        self.queries.push(query);
        self
    }

    pub fn queries(mut self, queries: impl IntoIterator<Item = Query>) -> Self {
        self.queries.extend(queries);
        self
    }

    pub fn build(self) -> Panel {
        Panel {
            kind: PanelKind::Panel,
            spec: PanelSpec {
                display: self.display,
                plugin: self.plugin,
                queries: self.queries,
            },
        }
    }
}

impl Panel {
    pub fn title(&self) -> &str {
        &self.spec.display.name
    }

    pub fn queries(&self) -> &[Query] {
        &self.spec.queries
    }
}

// === Plugin option helpers ===

impl TimeSeriesChartSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn unit(mut self, unit: Unit) -> Self {
        self.y_axis.get_or_insert_with(YAxis::default).format = Some(unit.into());
        self
    }

    pub fn max(mut self, max: f64) -> Self {
        self.y_axis.get_or_insert_with(YAxis::default).max = Some(max);
        self
    }

    pub fn legend(mut self, legend: Legend) -> Self {
        self.legend = Some(legend);
        self
    }

    pub fn visual(mut self, visual: Visual) -> Self {
        self.visual = Some(visual);
        self
    }

    pub fn stacked(mut self) -> Self {
        self.visual.get_or_insert_with(Visual::default).stack = Some(Stack::All);
        self
    }

    pub fn thresholds(mut self, thresholds: Thresholds) -> Self {
        self.thresholds = Some(thresholds);
        self
    }
}

impl Legend {
    pub fn bottom() -> Self {
        Self {
            position: LegendPosition::Bottom,
            mode: Some(LegendMode::List),
            size: None,
            values: Vec::new(),
        }
    }

    /// Table legend under the chart showing the given calculations.
    pub fn table(values: &[Calculation]) -> Self {
        Self {
            position: LegendPosition::Bottom,
            mode: Some(LegendMode::Table),
            size: Some(LegendSize::Small),
            values: values.to_vec(),
        }
    }
}

impl Visual {
    pub fn line(line_width: f64, area_opacity: f64) -> Self {
        Self {
            display: Some(VisualDisplay::Line),
            line_width: Some(line_width),
            area_opacity: Some(area_opacity),
            palette: Some(Palette {
                mode: PaletteMode::Auto,
            }),
            ..Default::default()
        }
    }

    pub fn stacked(mut self) -> Self {
        self.stack = Some(Stack::All);
        self
    }
}

impl Thresholds {
    /// Absolute thresholds from `(value, color)` pairs.
    pub fn steps(default_color: &str, steps: &[(f64, &str)]) -> Self {
        Self {
            mode: ThresholdMode::Absolute,
            default_color: Some(default_color.to_string()),
            steps: steps
                .iter()
                .map(|(value, color)| ThresholdStep {
                    value: *value,
                    color: Some(color.to_string()),
                })
                .collect(),
        }
    }
}

impl StatChartSpec {
    pub fn new(calculation: Calculation, unit: Unit) -> Self {
        Self {
            calculation,
            format: Some(unit.into()),
            thresholds: None,
        }
    }

    pub fn format(mut self, format: Format) -> Self {
        self.format = Some(format);
        self
    }

    pub fn thresholds(mut self, thresholds: Thresholds) -> Self {
        self.thresholds = Some(thresholds);
        self
    }
}

impl GaugeChartSpec {
    pub fn new(calculation: Calculation, unit: Unit) -> Self {
        Self {
            calculation,
            format: Some(unit.into()),
            thresholds: None,
            max: None,
        }
    }

    pub fn max(mut self, max: f64) -> Self {
        self.max = Some(max);
        self
    }

    pub fn thresholds(mut self, thresholds: Thresholds) -> Self {
        self.thresholds = Some(thresholds);
        self
    }
}

impl TableSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn density(mut self, density: TableDensity) -> Self {
        self.density = Some(density);
        self
    }

    pub fn column(mut self, column: ColumnSettings) -> Self {
        self.column_settings.push(column);
        self
    }
}

impl Format {
    pub fn decimal_places(mut self, places: u8) -> Self {
        self.decimal_places = Some(places);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_time_series_panel_json() {
        let panel = PanelBuilder::time_series(
            "Head Series",
            TimeSeriesChartSpec::new()
                .unit(Unit::Decimal)
                .legend(Legend::table(&[Calculation::Mean, Calculation::Max]))
                .visual(Visual::line(0.25, 0.5)),
        )
        .description("Series in the head block")
        .query(Query::prometheus("prom", "prometheus_tsdb_head_series", "{{instance}}"))
        .build();

        let value = serde_json::to_value(&panel).expect("serializes");
        assert_eq!(
            value,
            json!({
                "kind": "Panel",
                "spec": {
                    "display": {
                        "name": "Head Series",
                        "description": "Series in the head block"
                    },
                    "plugin": {
                        "kind": "TimeSeriesChart",
                        "spec": {
                            "legend": {
                                "position": "bottom",
                                "mode": "table",
                                "size": "small",
                                "values": ["mean", "max"]
                            },
                            "yAxis": { "format": { "unit": "decimal" } },
                            "visual": {
                                "display": "line",
                                "lineWidth": 0.25,
                                "areaOpacity": 0.5,
                                "palette": { "mode": "auto" }
                            }
                        }
                    },
                    "queries": [{
                        "kind": "TimeSeriesQuery",
                        "spec": {
                            "plugin": {
                                "kind": "PrometheusTimeSeriesQuery",
                                "spec": {
                                    "datasource": { "kind": "PrometheusDatasource", "name": "prom" },
                                    "query": "prometheus_tsdb_head_series",
                                    "seriesNameFormat": "{{instance}}"
                                }
                            }
                        }
                    }]
                }
            })
        );
    }

    #[test]
    fn test_stat_and_table_plugins() {
        let stat = PanelBuilder::stat(
            "Up",
            StatChartSpec::new(Calculation::LastNumber, Unit::Decimal)
                .thresholds(Thresholds::steps("green", &[(1.0, "red")])),
        )
        .build();
        let value = serde_json::to_value(&stat).expect("serializes");
        assert_eq!(value["spec"]["plugin"]["kind"], "StatChart");
        assert_eq!(value["spec"]["plugin"]["spec"]["calculation"], "last-number");
        assert_eq!(value["spec"]["plugin"]["spec"]["thresholds"]["steps"][0]["color"], "red");
        assert!(value["spec"].get("queries").is_none());

        let table = PanelBuilder::table(
            "Stats",
            TableSpec::new()
                .density(TableDensity::Compact)
                .column(ColumnSettings::header("job", "Job"))
                .column(ColumnSettings::hidden("value")),
        )
        .build();
        let value = serde_json::to_value(&table).expect("serializes");
        let spec = &value["spec"]["plugin"]["spec"];
        assert_eq!(spec["density"], "compact");
        assert_eq!(spec["columnSettings"][1], json!({"name": "value", "hide": true}));
        assert!(spec.get("transforms").is_none());
    }

    #[test]
    fn test_units_serialize_as_perses_names() {
        let cases = vec![
            (Unit::PercentDecimal, "percent-decimal"),
            (Unit::BytesPerSecond, "bytes/sec"),
            (Unit::BitsPerSecond, "bits/sec"),
            (Unit::RequestsPerSecond, "requests/sec"),
        ];
        for (unit, expected) in cases {
            assert_eq!(serde_json::to_value(unit).expect("serializes"), json!(expected));
        }
    }

    #[test]
    fn test_empty_series_name_format_omitted() {
        let query = Query::prometheus("prom", "up", "");
        let value = serde_json::to_value(&query).expect("serializes");
        assert!(value["spec"]["plugin"]["spec"].get("seriesNameFormat").is_none());
        assert_eq!(query.expr(), "up");
        assert_eq!(query.datasource().name, "prom");
    }
}
