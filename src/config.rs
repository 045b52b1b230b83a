use crate::dashboard::{is_valid_duration, is_valid_resource_name};
use crate::dashboards::{self, DashboardOptions, DEFAULT_DATASOURCE, DEFAULT_PROJECT};
use crate::error::ConfigError;
use crate::promql::is_valid_label_name;
use crate::writer::OutputFormat;
use clap::{Arg, ArgAction, ArgMatches, Command};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Generator configuration. Every field is optional in the file; flags given
/// on the command line take precedence over the file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub project: String,
    pub datasource: String,
    pub cluster_label_name: String,
    pub output_dir: PathBuf,
    pub output: String,
    pub duration: String,
    /// Components to generate; empty means all of them.
    pub components: Vec<String>,
    pub verbose: u8,
    #[serde(skip)]
    pub list: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            project: DEFAULT_PROJECT.to_string(),
            datasource: DEFAULT_DATASOURCE.to_string(),
            cluster_label_name: String::new(),
            output_dir: PathBuf::from("built"),
            output: "json".to_string(),
            duration: crate::dashboard::DEFAULT_DURATION.to_string(),
            components: Vec::new(),
            verbose: 0,
            list: false,
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        toml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.project.is_empty() {
            return Err(ConfigError::Empty("project"));
        }

        if self.datasource.is_empty() {
            return Err(ConfigError::Empty("datasource"));
        }

        if !is_valid_resource_name(&self.project) {
            return Err(ConfigError::InvalidProject(self.project.clone()));
        }

        if !self.cluster_label_name.is_empty() && !is_valid_label_name(&self.cluster_label_name) {
            return Err(ConfigError::InvalidClusterLabel(self.cluster_label_name.clone()));
        }

        if !is_valid_duration(&self.duration) {
            return Err(ConfigError::InvalidDuration(self.duration.clone()));
        }

        let known = dashboards::components();
        if let Some(unknown) = self.components.iter().find(|c| !known.contains(&c.as_str())) {
            return Err(ConfigError::UnknownComponent(unknown.clone()));
        }

        self.output_format()?;

        Ok(())
    }

    pub fn output_format(&self) -> Result<OutputFormat, ConfigError> {
        OutputFormat::parse(&self.output).ok_or_else(|| ConfigError::UnknownOutput(self.output.clone()))
    }

    pub fn dashboard_options(&self) -> DashboardOptions {
        DashboardOptions {
            project: self.project.clone(),
            datasource: self.datasource.clone(),
            cluster_label_name: self.cluster_label_name.clone(),
            duration: self.duration.clone(),
        }
    }

    pub fn level(&self) -> ringlog::Level {
        match self.verbose {
            0 => ringlog::Level::Info,
            1 => ringlog::Level::Debug,
            _ => ringlog::Level::Trace,
        }
    }
}

impl TryFrom<ArgMatches> for Config {
    type Error = ConfigError;

    fn try_from(args: ArgMatches) -> Result<Self, ConfigError> {
        let mut config = match args.get_one::<PathBuf>("CONFIG") {
            Some(path) => Config::load(path)?,
            None => Config::default(),
        };

        if let Some(project) = args.get_one::<String>("PROJECT") {
            config.project = project.clone();
        }
        if let Some(datasource) = args.get_one::<String>("DATASOURCE") {
            config.datasource = datasource.clone();
        }
        if let Some(label) = args.get_one::<String>("CLUSTER_LABEL_NAME") {
            config.cluster_label_name = label.clone();
        }
        if let Some(dir) = args.get_one::<PathBuf>("OUTPUT_DIR") {
            config.output_dir = dir.clone();
        }
        if let Some(output) = args.get_one::<String>("OUTPUT") {
            config.output = output.clone();
        }
        if let Some(duration) = args.get_one::<String>("DURATION") {
            config.duration = duration.clone();
        }
        if let Some(components) = args.get_many::<String>("COMPONENT") {
            config.components = components.cloned().collect();
        }

        let verbose = *args.get_one::<u8>("VERBOSE").unwrap_or(&0);
        config.verbose = config.verbose.max(verbose);
        config.list = args.get_flag("LIST");

        config.validate()?;
        Ok(config)
    }
}

pub fn command() -> Command {
    Command::new("community-dashboards")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Generates Perses dashboards for common infrastructure components")
        .arg(
            Arg::new("CONFIG")
                .long("config")
                .value_name("FILE")
                .help("TOML configuration file")
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("PROJECT")
                .long("project")
                .value_name("NAME")
                .help("Perses project the dashboards belong to"),
        )
        .arg(
            Arg::new("DATASOURCE")
                .long("datasource")
                .value_name("NAME")
                .help("Name of the Prometheus datasource every query targets"),
        )
        .arg(
            Arg::new("CLUSTER_LABEL_NAME")
                .long("cluster-label-name")
                .value_name("LABEL")
                .help("Label distinguishing clusters; adds a cluster variable when set"),
        )
        .arg(
            Arg::new("OUTPUT_DIR")
                .long("output-dir")
                .value_name("DIR")
                .help("Directory the dashboards are written to")
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("OUTPUT")
                .long("output")
                .value_name("FORMAT")
                .help("Output format")
                .value_parser(["json", "operator"]),
        )
        .arg(
            Arg::new("DURATION")
                .long("duration")
                .value_name("DURATION")
                .help("Default time range of the dashboards, e.g. 1h or 30m"),
        )
        .arg(
            Arg::new("COMPONENT")
                .long("component")
                .value_name("NAME")
                .help("Only generate dashboards for this component (repeatable)")
                .action(ArgAction::Append),
        )
        .arg(
            Arg::new("LIST")
                .long("list")
                .help("List the available dashboards and exit")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("VERBOSE")
                .long("verbose")
                .short('v')
                .help("Increase verbosity")
                .action(ArgAction::Count),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Config, ConfigError> {
        let matches = command()
            .try_get_matches_from(std::iter::once("community-dashboards").chain(args.iter().copied()))
            .expect("arguments parse");
        Config::try_from(matches)
    }

    #[test]
    fn test_defaults() {
        let config = parse(&[]).expect("valid");
        assert_eq!(config, Config::default());
        assert_eq!(config.output_format().expect("format"), OutputFormat::Json);
        assert_eq!(config.level(), ringlog::Level::Info);
    }

    #[test]
    fn test_flags_override_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("dashboards.toml");
        std::fs::write(
            &path,
            "project = \"monitoring\"\ndatasource = \"thanos\"\ncluster_label_name = \"cluster\"\ncomponents = [\"etcd\"]\n",
        )
        .expect("write config");

        let config = parse(&[
            "--config",
            path.to_str().expect("utf-8 path"),
            "--datasource",
            "victoria",
            "--component",
            "perses",
            "--component",
            "node-exporter",
            "-vv",
        ])
        .expect("valid");

        assert_eq!(config.project, "monitoring");
        assert_eq!(config.datasource, "victoria");
        assert_eq!(config.cluster_label_name, "cluster");
        assert_eq!(config.components, vec!["perses", "node-exporter"]);
        assert_eq!(config.level(), ringlog::Level::Trace);

        let options = config.dashboard_options();
        assert_eq!(options.project, "monitoring");
        assert_eq!(options.datasource, "victoria");
    }

    #[test]
    fn test_validation_failures() {
        let cases = vec![
            (vec!["--cluster-label-name", "1cluster"], "invalid cluster label name"),
            (vec!["--duration", "an hour"], "invalid duration"),
            (vec!["--duration", "30min"], "invalid duration"),
            (vec!["--duration", "2hours"], "invalid duration"),
            (vec!["--duration", "1h 30m"], "invalid duration"),
            (vec!["--duration", "15 days"], "invalid duration"),
            (vec!["--component", "grafana"], "unknown component"),
            (vec!["--project", "my project"], "invalid project"),
            (vec!["--datasource", ""], "must not be empty"),
        ];

        for (args, expected) in cases {
            let err = parse(&args).expect_err("invalid config");
            assert!(
                err.to_string().contains(expected),
                "Failed for {:?}: {}",
                args,
                err
            );
        }
    }

    #[test]
    fn test_file_errors() {
        let dir = tempfile::tempdir().expect("tempdir");

        let missing = dir.path().join("missing.toml");
        assert!(matches!(Config::load(&missing), Err(ConfigError::Read { .. })));

        let unknown = dir.path().join("unknown.toml");
        std::fs::write(&unknown, "dashboards = 3\n").expect("write config");
        assert!(matches!(Config::load(&unknown), Err(ConfigError::Parse { .. })));

        let output = dir.path().join("output.toml");
        std::fs::write(&output, "output = \"yaml\"\n").expect("write config");
        let config = Config::load(&output).expect("parses");
        assert!(matches!(config.validate(), Err(ConfigError::UnknownOutput(_))));
    }
}
