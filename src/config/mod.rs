pub mod toml_config;

pub use toml_config::{ToolchainKind, TomlConfig};

#[cfg(feature = "cli")]
use crate::domain::model::Stages;
#[cfg(feature = "cli")]
use crate::utils::logger::LogFormat;
#[cfg(feature = "cli")]
use clap::Parser;
#[cfg(feature = "cli")]
use std::path::PathBuf;

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ReportFormat {
    Text,
    Json,
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum StageArg {
    Asm,
    Obj,
    #[value(alias = "final")]
    Link,
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "opifex")]
#[command(about = "Configure and run a GNU or MSVC toolchain in stages")]
pub struct CliConfig {
    /// Path to the build file
    #[arg(short, long, default_value = "opifex.toml")]
    pub config: PathBuf,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    /// Print the commands without running them
    #[arg(long)]
    pub dry_run: bool,

    #[arg(long, value_enum, default_value_t = ReportFormat::Text)]
    pub report: ReportFormat,

    #[arg(long, value_enum, default_value_t = LogFormat::Compact)]
    pub log_format: LogFormat,

    /// Override the stages from the build file, e.g. `asm,obj,link`
    #[arg(long, value_enum, value_delimiter = ',')]
    pub stages: Option<Vec<StageArg>>,

    /// Link dynamically regardless of the build file
    #[arg(long)]
    pub dynamic: bool,
}

#[cfg(feature = "cli")]
impl CliConfig {
    pub fn apply_overrides(&self, config: &mut TomlConfig) {
        if let Some(stages) = &self.stages {
            config.build.settings.stages = Stages::new(
                stages.contains(&StageArg::Asm),
                stages.contains(&StageArg::Obj),
                stages.contains(&StageArg::Link),
            );
            tracing::info!("🔧 Stages overridden to: {:?}", config.build.settings.stages);
        }
        if self.dynamic {
            config.build.settings.static_link = Some(false);
            tracing::info!("🔧 Dynamic linking forced");
        }
    }
}

#[cfg(all(test, feature = "cli"))]
mod tests {
    use super::*;

    const BUILD_FILE: &str = r#"
[toolchain]
kind = "gnu"
path = "/usr/bin/g++"
name = "gcc"

[build]
sources = ["main.cpp"]
"#;

    #[test]
    fn parses_defaults() {
        let cli = CliConfig::parse_from(["opifex"]);
        assert_eq!(cli.config, PathBuf::from("opifex.toml"));
        assert_eq!(cli.report, ReportFormat::Text);
        assert_eq!(cli.log_format, LogFormat::Compact);
        assert!(cli.stages.is_none());
    }

    #[test]
    fn stage_override_replaces_build_file_stages() {
        let cli = CliConfig::parse_from(["opifex", "--stages", "asm,final", "--dynamic"]);
        let mut config = TomlConfig::from_toml_str(BUILD_FILE).unwrap();
        cli.apply_overrides(&mut config);

        assert_eq!(config.build.settings.stages, Stages::new(true, false, true));
        assert_eq!(config.build.settings.static_link, Some(false));
    }

    #[test]
    fn no_flags_leave_build_file_alone() {
        let cli = CliConfig::parse_from(["opifex", "-c", "other.toml", "--report", "json"]);
        let mut config = TomlConfig::from_toml_str(BUILD_FILE).unwrap();
        cli.apply_overrides(&mut config);

        assert_eq!(cli.report, ReportFormat::Json);
        assert_eq!(config.build.settings.stages, Stages::default());
        assert_eq!(config.build.settings.static_link, None);
    }
}
