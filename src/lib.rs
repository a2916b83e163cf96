pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use config::{cli::LocalStorage, toml_config::TomlConfig};
pub use core::{engine::FormationEngine, formation::TeamFormation, pipeline::SurveyPipeline};
pub use core::policy::FormationPolicy;
pub use utils::error::{FormationError, Result};
