use crate::domain::model::Stages;
use crate::domain::ports::Toolchain;
use crate::toolchain::{Gnu, Msvc, ToolchainSettings};
use crate::utils::error::{OpifexError, Result};
use crate::utils::validation::{
    validate_no_spaces, validate_non_empty_list, validate_non_empty_string, validate_path, Validate,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolchainKind {
    Gnu,
    Msvc,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    pub toolchain: ToolchainSection,
    /// Top-level `[stages]`. Folded into `build.settings.stages` on load.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    stages: Option<Stages>,
    pub build: BuildSection,
    #[serde(flatten)]
    pub unknown: BTreeMap<String, toml::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolchainSection {
    pub kind: ToolchainKind,
    /// Compiler binary for gnu, `vcvars64.bat` for msvc.
    pub path: PathBuf,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildSection {
    pub sources: Vec<PathBuf>,
    #[serde(flatten)]
    pub settings: ToolchainSettings,
    /// Keys `settings` did not claim, usually typos.
    #[serde(flatten)]
    pub unknown: BTreeMap<String, toml::Value>,
}

impl TomlConfig {
    /// Loads an `opifex.toml` build file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        Self::from_toml_str_with(content, |name| std::env::var(name).ok())
    }

    /// Parses `content`, resolving `${VAR}` through `lookup` instead of the
    /// process environment.
    pub fn from_toml_str_with<F>(content: &str, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let processed_content = Self::substitute_vars(content, lookup)?;

        let mut config: Self =
            toml::from_str(&processed_content).map_err(|e| OpifexError::ConfigValidationError {
                field: "toml_parsing".to_string(),
                message: format!("TOML parsing error: {}", e),
            })?;

        // [stages] wins over [build.stages]
        if let Some(stages) = config.stages.take() {
            config.build.settings.stages = stages;
        }
        Ok(config)
    }

    /// Replaces `${VAR}` with the looked-up value. Unknown variables are left
    /// as written.
    fn substitute_vars<F>(content: &str, lookup: F) -> Result<String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| OpifexError::ConfigValidationError {
            field: "env_substitution".to_string(),
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            lookup(var_name).unwrap_or_else(|| format!("${{{}}}", var_name))
        });

        Ok(result.into_owned())
    }

    pub fn validate_config(&self) -> Result<()> {
        reject_unknown("opifex.toml", &self.unknown)?;
        reject_unknown("build", &self.build.unknown)?;

        validate_path(
            "toolchain.path",
            &self.toolchain.path.display().to_string(),
        )?;
        validate_non_empty_string("toolchain.name", &self.toolchain.name)?;
        validate_no_spaces("toolchain.name", &self.toolchain.name)?;
        validate_non_empty_list("build.sources", &self.build.sources)?;

        if let Some(build_dir) = &self.build.settings.build_dir {
            validate_path("build.build_dir", &build_dir.display().to_string())?;
        }
        if let Some(target) = &self.build.settings.target {
            validate_non_empty_string("build.target", target)?;
        }
        if self.toolchain.kind == ToolchainKind::Gnu
            && !(self.build.settings.default_libs.is_empty()
                && self.build.settings.no_default_libs.is_empty())
        {
            return Err(OpifexError::InvalidConfigValueError {
                field: "build.default_libs".to_string(),
                value: "gnu".to_string(),
                reason: "default_libs and no_default_libs only apply to msvc".to_string(),
            });
        }

        Ok(())
    }

    pub fn stages(&self) -> Stages {
        self.build.settings.stages
    }

    pub fn sources(&self) -> &[PathBuf] {
        &self.build.sources
    }

    pub fn into_toolchain(&self) -> Result<Box<dyn Toolchain>> {
        let section = &self.toolchain;
        let toolchain: Box<dyn Toolchain> = match section.kind {
            ToolchainKind::Gnu => Box::new(Gnu::with_settings(
                &section.path,
                section.name.clone(),
                &self.build.settings,
            )?),
            ToolchainKind::Msvc => Box::new(Msvc::with_settings(
                &section.path,
                section.name.clone(),
                &self.build.settings,
            )?),
        };
        Ok(toolchain)
    }
}

fn reject_unknown(section: &str, unknown: &BTreeMap<String, toml::Value>) -> Result<()> {
    if unknown.is_empty() {
        return Ok(());
    }
    for key in unknown.keys() {
        tracing::warn!("Unknown key in {}: {}", section, key);
    }
    Err(OpifexError::InvalidConfigValueError {
        field: section.to_string(),
        value: unknown.keys().cloned().collect::<Vec<_>>().join(", "),
        reason: "unknown key(s)".to_string(),
    })
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const BASIC: &str = r#"
[toolchain]
kind = "gnu"
path = "/usr/bin/g++"
name = "gcc"

[build]
sources = ["src/main.cpp", "src/app.cpp"]
static = false
libs = ["m"]
options = ["-O2", "-Wall"]

[build.stages]
asm = true
final = true
"#;

    #[test]
    fn test_parse_basic_toml_config() {
        let config = TomlConfig::from_toml_str(BASIC).unwrap();

        assert_eq!(config.toolchain.kind, ToolchainKind::Gnu);
        assert_eq!(config.toolchain.name, "gcc");
        assert_eq!(config.sources().len(), 2);
        assert_eq!(config.build.settings.stages, Stages::new(true, false, true));
        assert_eq!(config.build.settings.static_link, Some(false));
        assert_eq!(config.build.settings.libs, vec!["m"]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_stages_use_defaults() {
        let config = TomlConfig::from_toml_str(
            r#"
[toolchain]
kind = "msvc"
path = "vcvars64.bat"
name = "msvc64"

[build]
sources = ["main.cpp"]
default_libs = ["User32"]
"#,
        )
        .unwrap();
        assert_eq!(config.build.settings.stages, Stages::default());
        assert_eq!(config.build.settings.options, None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_var_substitution() {
        let content = r#"
[toolchain]
kind = "gnu"
path = "${OPIFEX_TEST_CXX}"
name = "${OPIFEX_TEST_UNSET_NAME}"

[build]
sources = ["main.cpp"]
"#;
        let config = TomlConfig::from_toml_str_with(content, |name| {
            (name == "OPIFEX_TEST_CXX").then(|| "/opt/gcc/bin/g++".to_string())
        })
        .unwrap();

        assert_eq!(config.toolchain.path, PathBuf::from("/opt/gcc/bin/g++"));
        assert_eq!(config.toolchain.name, "${OPIFEX_TEST_UNSET_NAME}");
    }

    #[test]
    fn test_unset_process_variable_is_kept() {
        let config = TomlConfig::from_toml_str(
            &BASIC.replace("\"gcc\"", "\"${OPIFEX_TEST_NEVER_SET_A7Q}\""),
        )
        .unwrap();
        assert_eq!(config.toolchain.name, "${OPIFEX_TEST_NEVER_SET_A7Q}");
    }

    #[test]
    fn test_top_level_stages_table() {
        let config = TomlConfig::from_toml_str(
            r#"
[toolchain]
kind = "gnu"
path = "/usr/bin/g++"
name = "gcc"

[stages]
asm = true
obj = true

[build]
sources = ["main.cpp"]
"#,
        )
        .unwrap();

        assert_eq!(config.stages(), Stages::new(true, true, true));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_top_level_stages_win_over_build_stages() {
        let content = BASIC.replace("[build]", "[stages]\nobj = true\nfinal = false\n\n[build]");
        let config = TomlConfig::from_toml_str(&content).unwrap();
        assert_eq!(config.stages(), Stages::new(false, true, false));
    }

    #[test]
    fn test_misspelled_keys_are_rejected() {
        let content = BASIC.replace("libs = [\"m\"]", "include = [\"/nonexistent\"]");
        let config = TomlConfig::from_toml_str(&content).unwrap();
        assert!(config.build.unknown.contains_key("include"));
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("include"), "{}", err);

        let content = format!("{}\n[stage]\nasm = true\n", BASIC);
        let config = TomlConfig::from_toml_str(&content).unwrap();
        assert!(config.unknown.contains_key("stage"));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation() {
        let mut config = TomlConfig::from_toml_str(BASIC).unwrap();
        config.build.sources.clear();
        assert!(config.validate().is_err());

        let mut config = TomlConfig::from_toml_str(BASIC).unwrap();
        config.toolchain.name = "my gcc".to_string();
        assert!(config.validate().is_err());

        let mut config = TomlConfig::from_toml_str(BASIC).unwrap();
        config.build.settings.default_libs.push("User32".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unknown_kind_is_rejected() {
        let err = TomlConfig::from_toml_str(&BASIC.replace("\"gnu\"", "\"icc\"")).unwrap_err();
        assert!(matches!(err, OpifexError::ConfigValidationError { .. }));
    }

    #[test]
    fn test_config_from_file_and_into_toolchain() {
        let compiler = NamedTempFile::new().unwrap();
        let mut temp_file = NamedTempFile::new().unwrap();
        let content = BASIC.replace("/usr/bin/g++", &compiler.path().display().to_string());
        temp_file.write_all(content.as_bytes()).unwrap();

        let config = TomlConfig::from_file(temp_file.path()).unwrap();
        let toolchain = config.into_toolchain().unwrap();
        assert_eq!(toolchain.name(), "gcc");
    }
}
