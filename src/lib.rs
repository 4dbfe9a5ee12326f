pub mod apps;
pub mod config;
pub mod core;
pub mod domain;
pub mod output;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use config::{cli::LocalStorage, toml_config::SystemConfig};
pub use core::generator::{GeneratorOptions, Topology, TopologyGenerator};
pub use core::system::{Application, System};
pub use utils::error::{Result, TopologyError};
