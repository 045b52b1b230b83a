use anyhow::Context;
use ringlog::*;

mod config;
mod dashboard;
mod dashboards;
mod error;
mod panels;
mod promql;
mod writer;

use config::Config;
use writer::DashboardWriter;

fn main() {
    let matches = config::command().get_matches();

    let config = match Config::try_from(matches) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    };

    // configure debug log
    let debug_output: Box<dyn Output> = Box::new(Stderr::new());
    let level = config.level();
    let debug_log = if level <= Level::Info {
        LogBuilder::new().format(ringlog::default_format)
    } else {
        LogBuilder::new()
    }
    .output(debug_output)
    .build()
    .expect("failed to initialize debug log");

    let mut log = MultiLogBuilder::new()
        .level_filter(level.to_level_filter())
        .default(debug_log)
        .build()
        .start();

    if config.list {
        for entry in dashboards::catalog() {
            println!("{:<14} {:<31} {}", entry.component, entry.name, entry.display);
        }
        let _ = log.flush();
        return;
    }

    let result = run(&config);
    if let Err(e) = &result {
        error!("{e:#}");
    }
    let _ = log.flush();

    if result.is_err() {
        std::process::exit(1);
    }
}

fn run(config: &Config) -> anyhow::Result<()> {
    let options = config.dashboard_options();
    let format = config.output_format()?;

    info!(
        "generating dashboards for project {} using datasource {}",
        options.project, options.datasource
    );
    if options.cluster_label_name.is_empty() {
        debug!("no cluster label configured, skipping cluster variable");
    }

    let mut writer = DashboardWriter::new(&config.output_dir, format);
    for result in dashboards::generate_for_components(&config.components, &options) {
        writer.add(result);
    }

    writer
        .write()
        .with_context(|| format!("failed to write dashboards to {}", config.output_dir.display()))?;

    Ok(())
}
