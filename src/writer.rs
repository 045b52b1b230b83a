//! Serializes built dashboards to disk.

use crate::dashboard::{Dashboard, DashboardSpec};
use crate::error::{BuildError, Error};
use ringlog::*;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

pub const OPERATOR_API_VERSION: &str = "perses.dev/v1alpha1";

/// Shape of the files written for each dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// The Perses dashboard resource, as accepted by the API and `percli`.
    #[default]
    Json,
    /// A `PersesDashboard` custom resource for the Perses operator.
    Operator,
}

impl OutputFormat {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "json" => Some(OutputFormat::Json),
            "operator" => Some(OutputFormat::Operator),
            _ => None,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PersesDashboard<'a> {
    api_version: &'static str,
    kind: &'static str,
    metadata: ResourceMetadata<'a>,
    spec: &'a DashboardSpec,
}

#[derive(Serialize)]
struct ResourceMetadata<'a> {
    name: &'a str,
    namespace: &'a str,
    labels: BTreeMap<&'static str, &'a str>,
}

impl<'a> PersesDashboard<'a> {
    fn new(dashboard: &'a Dashboard) -> Self {
        let name = dashboard.metadata.name.as_str();
        let labels = BTreeMap::from([
            ("app.kubernetes.io/name", "perses-dashboard"),
            ("app.kubernetes.io/instance", name),
            ("app.kubernetes.io/part-of", "perses-operator"),
        ]);

        Self {
            api_version: OPERATOR_API_VERSION,
            kind: "PersesDashboard",
            metadata: ResourceMetadata {
                name,
                namespace: dashboard.metadata.project.as_str(),
                labels,
            },
            spec: &dashboard.spec,
        }
    }
}

/// Collects build results and writes the successful ones to `output_dir`.
pub struct DashboardWriter {
    output_dir: PathBuf,
    format: OutputFormat,
    dashboards: Vec<Dashboard>,
    failures: Vec<BuildError>,
}

impl DashboardWriter {
    pub fn new(output_dir: impl Into<PathBuf>, format: OutputFormat) -> Self {
        Self {
            output_dir: output_dir.into(),
            format,
            dashboards: Vec::new(),
            failures: Vec::new(),
        }
    }

    pub fn add(&mut self, result: Result<Dashboard, BuildError>) {
        match result {
            Ok(dashboard) => {
                debug!("built dashboard {}", dashboard.metadata.name);
                self.dashboards.push(dashboard);
            }
            Err(e) => {
                error!("{e}");
                self.failures.push(e);
            }
        }
    }

    pub fn failures(&self) -> &[BuildError] {
        &self.failures
    }

    /// Write every collected dashboard to `<output_dir>/<name>.json`.
    ///
    /// Dashboards that built are written even when others failed; the
    /// failures are then reported as `Error::Build`.
    pub fn write(&self) -> Result<Vec<PathBuf>, Error> {
        fs::create_dir_all(&self.output_dir).map_err(|source| Error::CreateDir {
            path: self.output_dir.clone(),
            source,
        })?;

        let mut written = Vec::with_capacity(self.dashboards.len());
        for dashboard in &self.dashboards {
            let path = self.output_dir.join(format!("{}.json", dashboard.metadata.name));
            self.write_one(dashboard, &path)?;
            info!("wrote {}", path.display());
            written.push(path);
        }

        info!(
            "wrote {} dashboard(s) to {}",
            written.len(),
            self.output_dir.display()
        );

        if !self.failures.is_empty() {
            return Err(Error::Build(self.failures.len()));
        }

        Ok(written)
    }

    fn write_one(&self, dashboard: &Dashboard, path: &Path) -> Result<(), Error> {
        let serialized = match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(dashboard),
            OutputFormat::Operator => serde_json::to_string_pretty(&PersesDashboard::new(dashboard)),
        };
        let mut contents = serialized.map_err(|source| Error::Serialize {
            name: dashboard.metadata.name.clone(),
            source,
        })?;
        contents.push('\n');

        fs::write(path, contents).map_err(|source| Error::Write {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::{DashboardBuilder, GroupConfig, PanelBuilder};
    use crate::dashboards::{get_dashboard, DashboardOptions};
    use serde_json::Value;

    fn read_json(path: &Path) -> Value {
        let contents = fs::read_to_string(path).expect("file exists");
        assert!(contents.ends_with('\n'));
        serde_json::from_str(&contents).expect("valid json")
    }

    fn sample(name: &str) -> Result<Dashboard, BuildError> {
        DashboardBuilder::new(name)
            .project("perses-dev")
            .group(GroupConfig::new("Notes").panel(PanelBuilder::markdown("Note", "hello").build()))
            .build()
    }

    #[test]
    fn test_output_format_parse() {
        assert_eq!(OutputFormat::parse("json"), Some(OutputFormat::Json));
        assert_eq!(OutputFormat::parse("operator"), Some(OutputFormat::Operator));
        assert_eq!(OutputFormat::parse("yaml"), None);
    }

    #[test]
    fn test_write_json() {
        let dir = tempfile::tempdir().expect("tempdir");
        let output = dir.path().join("built");

        let mut writer = DashboardWriter::new(&output, OutputFormat::Json);
        writer.add(get_dashboard("perses-overview", &DashboardOptions::default()).expect("known"));
        writer.add(sample("notes"));

        let written = writer.write().expect("writes");
        assert_eq!(written, vec![output.join("perses-overview.json"), output.join("notes.json")]);

        let value = read_json(&written[0]);
        assert_eq!(value["kind"], "Dashboard");
        assert_eq!(value["metadata"]["name"], "perses-overview");
        assert_eq!(value["metadata"]["project"], "perses-dev");
        assert_eq!(value["spec"]["display"]["name"], "Perses / Overview");
    }

    #[test]
    fn test_write_operator_resource() {
        let dir = tempfile::tempdir().expect("tempdir");

        let mut writer = DashboardWriter::new(dir.path(), OutputFormat::Operator);
        writer.add(sample("notes"));
        let written = writer.write().expect("writes");

        let value = read_json(&written[0]);
        assert_eq!(value["apiVersion"], "perses.dev/v1alpha1");
        assert_eq!(value["kind"], "PersesDashboard");
        assert_eq!(value["metadata"]["name"], "notes");
        assert_eq!(value["metadata"]["namespace"], "perses-dev");
        assert_eq!(value["metadata"]["labels"]["app.kubernetes.io/instance"], "notes");
        assert_eq!(value["spec"]["display"]["name"], "notes");
        assert!(value["spec"]["layouts"].is_array());
    }

    #[test]
    fn test_failures_still_write_successes() {
        let dir = tempfile::tempdir().expect("tempdir");

        let mut writer = DashboardWriter::new(dir.path(), OutputFormat::Json);
        writer.add(sample("notes"));
        writer.add(sample("bad name"));
        assert_eq!(writer.failures().len(), 1);

        let result = writer.write();
        assert!(matches!(result, Err(Error::Build(1))));
        assert!(dir.path().join("notes.json").exists());
    }

    #[test]
    fn test_unwritable_output_dir() {
        let dir = tempfile::tempdir().expect("tempdir");
        let file = dir.path().join("occupied");
        fs::write(&file, "").expect("create file");

        let mut writer = DashboardWriter::new(&file, OutputFormat::Json);
        writer.add(sample("notes"));
        assert!(matches!(writer.write(), Err(Error::CreateDir { .. })));
    }
}
