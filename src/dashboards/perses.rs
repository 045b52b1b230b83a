use super::*;
use crate::panels::{perses, process};

pub fn overview(options: &DashboardOptions) -> Result<Dashboard, BuildError> {
    let (variables, matchers) = VariableChain::new(options, "perses_build_info")
        .label("job")
        .label("instance")
        .build();
    let ds = options.datasource.as_str();

    options
        .dashboard("perses-overview", "Perses / Overview")
        .variables(variables)
        .group(
            GroupConfig::new("Perses Stats")
                .panels_per_line(1)
                .panel(perses::stats_table(ds, &matchers)),
        )
        .group(
            GroupConfig::new("API Requests")
                .panels_per_line(3)
                .panel(perses::http_request_latency(ds, &matchers))
                .panel(perses::http_request_rate(ds, &matchers))
                .panel(perses::http_error_rate(ds, &matchers)),
        )
        .group(
            GroupConfig::new("Resource Usage")
                .panels_per_line(4)
                .panel(process::memory_usage(ds, &matchers))
                .panel(process::cpu_usage(ds, &matchers))
                .panel(process::goroutines(ds, &matchers))
                .panel(process::file_descriptors(ds, &matchers)),
        )
        .group(
            GroupConfig::new("Plugins Usage")
                .panels_per_line(1)
                .panel(perses::plugin_schema_loads(ds, &matchers)),
        )
        .build()
}
