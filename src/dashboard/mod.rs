//! Serializable Perses dashboard model and the builders used to assemble it.

pub mod builder;
pub mod common;
pub mod panel;
pub mod variable;

pub use self::builder::{is_valid_duration, is_valid_resource_name, DashboardBuilder, GroupConfig, DEFAULT_DURATION, GRID_WIDTH};
pub use self::common::*;
pub use self::panel::PanelBuilder;
pub use self::variable::ListVariableBuilder;
