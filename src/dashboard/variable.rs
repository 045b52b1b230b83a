use super::common::*;

pub struct ListVariableBuilder {
    spec: ListVariableSpec,
}

impl ListVariableBuilder {
    /// Values of `label_name` across the series selected by `matchers`.
    pub fn label_values(
        name: impl Into<String>,
        datasource: &str,
        label_name: impl Into<String>,
        matchers: Vec<String>,
    ) -> Self {
        Self {
            spec: ListVariableSpec {
                name: name.into(),
                display: VariableDisplay::default(),
                allow_all_value: false,
                allow_multiple: false,
                sort: VariableSort::AlphabeticalAsc,
                plugin: VariablePlugin::PrometheusLabelValuesVariable(LabelValuesSpec {
                    datasource: DatasourceSelector::prometheus(datasource),
                    label_name: label_name.into(),
                    matchers,
                }),
            },
        }
    }

    pub fn display_name(mut self, name: impl Into<String>) -> Self {
        self.spec.display.name = Some(name.into());
        self
    }

    pub fn multi(mut self) -> Self {
        self.spec.allow_multiple = true;
        self
    }

    /// Offer an "All" entry that expands to every option.
    pub fn all_value(mut self) -> Self {
        self.spec.allow_all_value = true;
        self
    }

    pub fn build(self) -> Variable {
        Variable::ListVariable(self.spec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_label_values_variable_json() {
        let variable = ListVariableBuilder::label_values(
            "job",
            "prometheus-datasource",
            "job",
            vec!["prometheus_build_info{}".to_string()],
        )
        .display_name("job")
        .multi()
        .all_value()
        .build();

        assert_eq!(variable.name(), "job");
        assert_eq!(
            serde_json::to_value(&variable).expect("serializes"),
            json!({
                "kind": "ListVariable",
                "spec": {
                    "name": "job",
                    "display": { "name": "job", "hidden": false },
                    "allowAllValue": true,
                    "allowMultiple": true,
                    "sort": "alphabetical-asc",
                    "plugin": {
                        "kind": "PrometheusLabelValuesVariable",
                        "spec": {
                            "datasource": { "kind": "PrometheusDatasource", "name": "prometheus-datasource" },
                            "labelName": "job",
                            "matchers": ["prometheus_build_info{}"]
                        }
                    }
                }
            })
        );
    }

    #[test]
    fn test_single_value_variable() {
        let variable = ListVariableBuilder::label_values("cluster", "prom", "cluster", Vec::new()).build();
        let value = serde_json::to_value(&variable).expect("serializes");
        assert_eq!(value["spec"]["allowAllValue"], json!(false));
        assert_eq!(value["spec"]["allowMultiple"], json!(false));
        assert!(value["spec"]["display"].get("name").is_none());
        assert!(value["spec"]["plugin"]["spec"].get("matchers").is_none());
    }
}
