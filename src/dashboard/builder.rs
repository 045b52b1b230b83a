use super::common::*;
use crate::error::BuildError;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{BTreeMap, HashSet};

/// Width of the Perses grid layout.
pub const GRID_WIDTH: u32 = 24;

pub const DEFAULT_DURATION: &str = "1h";
pub const DEFAULT_PANELS_PER_LINE: u32 = 2;
pub const DEFAULT_PANEL_HEIGHT: u32 = 8;

const MAX_NAME_LENGTH: usize = 75;

static RESOURCE_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9_.-]+$").expect("valid resource name regex"));

static DURATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d+y)?(\d+w)?(\d+d)?(\d+h)?(\d+m)?(\d+s)?(\d+ms)?$").expect("valid duration regex")
});

pub fn is_valid_resource_name(name: &str) -> bool {
    name.len() <= MAX_NAME_LENGTH && RESOURCE_NAME.is_match(name)
}

/// Non-zero duration in the Prometheus form Perses accepts, e.g. `1d12h`.
pub fn is_valid_duration(duration: &str) -> bool {
    DURATION.is_match(duration)
        && humantime::parse_duration(duration).is_ok_and(|duration| !duration.is_zero())
}

/// Declarative dashboard builder. Groups are laid out top to bottom in the
/// order they are added.
pub struct DashboardBuilder {
    name: String,
    display_name: String,
    project: String,
    duration: String,
    variables: Vec<Variable>,
    groups: Vec<GroupConfig>,
}

impl DashboardBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            display_name: name.clone(),
            name,
            project: String::new(),
            duration: DEFAULT_DURATION.to_string(),
            variables: Vec::new(),
            groups: Vec::new(),
        }
    }

    pub fn display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = display_name.into();
        self
    }

    pub fn project(mut self, project: impl Into<String>) -> Self {
        self.project = project.into();
        self
    }

    pub fn duration(mut self, duration: impl Into<String>) -> Self {
        self.duration = duration.into();
        self
    }

    pub fn variables(mut self, variables: impl IntoIterator<Item = Variable>) -> Self {
        self.variables.extend(variables);
        self
    }

    pub fn group(mut self, group: GroupConfig) -> Self {
        self.groups.push(group);
        self
    }

    pub fn build(self) -> Result<Dashboard, BuildError> {
        if !is_valid_resource_name(&self.name) {
            return Err(BuildError::InvalidName(self.name));
        }

        if !is_valid_resource_name(&self.project) {
            return Err(BuildError::InvalidProject {
                dashboard: self.name,
                project: self.project,
            });
        }

        if self.display_name.trim().is_empty() {
            return Err(BuildError::MissingDisplayName(self.name));
        }

        if !is_valid_duration(&self.duration) {
            return Err(BuildError::InvalidDuration {
                dashboard: self.name,
                duration: self.duration,
            });
        }

        let mut seen = HashSet::new();
        for variable in &self.variables {
            if !seen.insert(variable.name()) {
                return Err(BuildError::DuplicateVariable {
                    dashboard: self.name.clone(),
                    variable: variable.name().to_string(),
                });
            }
        }

        let mut panels = BTreeMap::new();
        let mut layouts = Vec::with_capacity(self.groups.len());

        for (group_index, group) in self.groups.into_iter().enumerate() {
            if group.panels.is_empty() {
                return Err(BuildError::EmptyGroup {
                    dashboard: self.name,
                    group: group.title,
                });
            }

            if group.panels_per_line == 0 || group.panels_per_line > GRID_WIDTH {
                return Err(BuildError::InvalidPanelsPerLine {
                    dashboard: self.name,
                    group: group.title,
                    per_line: group.panels_per_line,
                });
            }

            layouts.push(group.layout(group_index, &mut panels));
        }

        Ok(Dashboard {
            kind: DashboardKind::Dashboard,
            metadata: ProjectMetadata {
                name: self.name,
                project: self.project,
            },
            spec: DashboardSpec {
                display: Display::new(self.display_name),
                variables: self.variables,
                panels,
                layouts,
                duration: self.duration,
            },
        })
    }
}

/// A named, ordered collection of panels rendered as one grid.
pub struct GroupConfig {
    title: String,
    panels_per_line: u32,
    panel_height: u32,
    panels: Vec<Panel>,
}

impl GroupConfig {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            panels_per_line: DEFAULT_PANELS_PER_LINE,
            panel_height: DEFAULT_PANEL_HEIGHT,
            panels: Vec::new(),
        }
    }

    pub fn panels_per_line(mut self, per_line: u32) -> Self {
        self.panels_per_line = per_line;
        self
    }

    pub fn panel_height(mut self, height: u32) -> Self {
        self.panel_height = height;
        self
    }

    pub fn panel(mut self, panel: Panel) -> Self {
        self.panels.push(panel);
        self
    }

    pub fn panels(mut self, panels: impl IntoIterator<Item = Panel>) -> Self {
        self.panels.extend(panels);
        self
    }

    /// Move the panels into `panels` under `<group>_<panel>` keys and return
    /// the grid that references them.
    fn layout(self, group_index: usize, panels: &mut BTreeMap<String, Panel>) -> Layout {
        let width = GRID_WIDTH / self.panels_per_line;
        let height = self.panel_height;

        let items = self
            .panels
            .into_iter()
            .enumerate()
            .map(|(panel_index, panel)| {
                let key = format!("{group_index}_{panel_index}");
                let i = panel_index as u32;
                let item = GridItem {
                    x: (i % self.panels_per_line) * width,
                    y: (i / self.panels_per_line) * height,
                    width,
                    height,
                    content: PanelRef::new(&key),
                };
                panels.insert(key, panel);
                item
            })
            .collect();

        Layout::Grid(GridLayoutSpec {
            display: GridDisplay {
                title: self.title,
                collapse: Collapse { open: true },
            },
            items,
        })
    }
}
