pub mod cli;
pub mod toml_config;

#[cfg(feature = "cli")]
use crate::utils::error::Result;
#[cfg(feature = "cli")]
use crate::utils::validation::{validate_path, Validate};
#[cfg(feature = "cli")]
use clap::Parser;

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "daq-topology")]
#[command(about = "Generates DAQ application topologies and their run control documents")]
pub struct CliConfig {
    #[arg(long, short = 'c', help = "TOML system description")]
    pub config: String,

    #[arg(long, short = 'o', default_value = "./daq_config")]
    pub output: String,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Generate and validate without writing any file")]
    pub dry_run: bool,

    #[arg(long, help = "Also write a Graphviz .dot file per application")]
    pub dot: bool,

    #[arg(long, help = "Log as JSON lines")]
    pub json_logs: bool,
}

#[cfg(feature = "cli")]
impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validate_path("config", &self.config)?;
        validate_path("output", &self.output)?;
        Ok(())
    }
}

#[cfg(all(test, feature = "cli"))]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cli_flags() {
        let config = CliConfig::parse_from([
            "daq-topology",
            "--config",
            "minidaq.toml",
            "--dry-run",
            "--dot",
        ]);
        assert_eq!(config.output, "./daq_config");
        assert!(config.dry_run && config.dot);
        assert!(!config.json_logs);
        assert!(config.validate().is_ok());
    }
}
