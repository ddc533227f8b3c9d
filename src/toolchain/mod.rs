//! Compiler toolchains: configuration, validation and command construction.
//!
//! A toolchain never runs anything itself. It turns a list of sources into a
//! [`BuildPlan`](crate::domain::model::BuildPlan) that the build engine
//! executes.

pub mod gnu;
pub mod msvc;

pub use gnu::Gnu;
pub use msvc::Msvc;

use crate::domain::model::Stages;
use crate::utils::error::{OpifexError, Result};
use crate::utils::validation::validate_no_spaces;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// Ordered set of command-line entries. Adding an entry twice is a no-op,
/// discarding an absent entry is an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntrySet<T: Ord> {
    label: &'static str,
    entries: BTreeSet<T>,
}

impl<T: Ord> EntrySet<T> {
    pub fn new(label: &'static str) -> Self {
        Self {
            label,
            entries: BTreeSet::new(),
        }
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    pub fn insert(&mut self, entry: T) -> bool {
        self.entries.insert(entry)
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, entry: &T) -> bool {
        self.entries.contains(entry)
    }
}

pub trait Entry: Ord {
    fn describe(&self) -> String;
}

impl Entry for String {
    fn describe(&self) -> String {
        self.clone()
    }
}

impl Entry for PathBuf {
    fn describe(&self) -> String {
        self.display().to_string()
    }
}

impl<T: Entry> EntrySet<T> {
    pub fn discard(&mut self, entry: &T) -> Result<()> {
        if self.entries.remove(entry) {
            Ok(())
        } else {
            Err(OpifexError::EntryNotPresent {
                set: self.label,
                entry: entry.describe(),
            })
        }
    }
}

/// Everything a build file may override on a toolchain. `None` keeps the
/// toolchain's default.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolchainSettings {
    pub stages: Stages,
    #[serde(rename = "static")]
    pub static_link: Option<bool>,
    pub target: Option<String>,
    pub build_dir: Option<PathBuf>,
    pub includes: Vec<PathBuf>,
    pub lib_paths: Vec<PathBuf>,
    pub libs: Vec<String>,
    pub options: Option<Vec<String>>,
    pub default_libs: Vec<String>,
    pub no_default_libs: Vec<String>,
}

/// Double-quoted path with forward slashes, for POSIX-style shells.
pub fn quote_posix(path: &Path) -> String {
    format!("\"{}\"", path.display().to_string().replace('\\', "/"))
}

/// Double-quoted path with backslashes. `cl` parses forward slashes as
/// switches.
pub fn quote_windows(path: &Path) -> String {
    format!("\"{}\"", windows_path(path))
}

pub(crate) fn windows_path(path: &Path) -> String {
    path.display().to_string().replace('/', "\\")
}

pub(crate) fn check_compiler(path: &Path, name: &str) -> Result<()> {
    if !path.is_file() {
        return Err(OpifexError::InvalidToolchainPath {
            path: path.to_path_buf(),
        });
    }
    if name.contains(' ') {
        return Err(OpifexError::InvalidToolchainName {
            name: name.to_string(),
        });
    }
    Ok(())
}

/// `<current dir name, spaces replaced by '_'>_<toolchain name>`.
pub fn default_target(name: &str) -> Result<String> {
    let cwd = std::env::current_dir()?;
    let stem = cwd
        .file_stem()
        .map(|s| s.to_string_lossy().replace(' ', "_"))
        .unwrap_or_else(|| "opifex".to_string());
    Ok(format!("{}_{}", stem, name))
}

pub fn default_build_dir() -> Result<PathBuf> {
    Ok(std::env::current_dir()?.join("build"))
}

pub(crate) fn add_names(set: &mut EntrySet<String>, names: &[&str]) -> Result<()> {
    for name in names {
        validate_no_spaces(set.label(), name)?;
    }
    for name in names {
        set.insert((*name).to_string());
    }
    Ok(())
}

pub(crate) fn discard_names(set: &mut EntrySet<String>, names: &[&str]) -> Result<()> {
    for name in names {
        set.discard(&(*name).to_string())?;
    }
    Ok(())
}

pub(crate) fn add_dirs<P: AsRef<Path>>(set: &mut EntrySet<PathBuf>, dirs: &[P]) -> Result<()> {
    for dir in dirs {
        crate::utils::validation::validate_directory(set.label(), dir.as_ref())?;
    }
    for dir in dirs {
        set.insert(dir.as_ref().to_path_buf());
    }
    Ok(())
}

pub(crate) fn discard_dirs<P: AsRef<Path>>(set: &mut EntrySet<PathBuf>, dirs: &[P]) -> Result<()> {
    for dir in dirs {
        set.discard(&dir.as_ref().to_path_buf())?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quote_posix_uses_forward_slashes() {
        assert_eq!(
            quote_posix(Path::new("\\test path\\with backslash and spaces")),
            "\"/test path/with backslash and spaces\""
        );
    }

    #[test]
    fn quote_windows_uses_backslashes() {
        assert_eq!(
            quote_windows(Path::new("/test path/with fwd-slash and spaces")),
            "\"\\test path\\with fwd-slash and spaces\""
        );
    }

    #[test]
    fn entry_set_ignores_duplicates() {
        let mut set = EntrySet::new("libs");
        assert!(set.insert("m".to_string()));
        assert!(!set.insert("m".to_string()));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn discarding_missing_entry_fails() {
        let mut set: EntrySet<String> = EntrySet::new("libs");
        let err = set.discard(&"pthread".to_string()).unwrap_err();
        assert_eq!(err.to_string(), "libs does not contain [pthread]");
    }

    #[test]
    fn add_names_is_all_or_nothing() {
        let mut set = EntrySet::new("libs");
        assert!(add_names(&mut set, &["m", "bad name"]).is_err());
        assert!(set.is_empty());
    }

    #[test]
    fn compiler_must_exist_and_name_has_no_spaces() {
        let file = tempfile::NamedTempFile::new().unwrap();
        assert!(check_compiler(file.path(), "mingw64").is_ok());
        assert!(matches!(
            check_compiler(file.path(), "ming w64"),
            Err(OpifexError::InvalidToolchainName { .. })
        ));
        assert!(matches!(
            check_compiler(Path::new("/no/such/g++"), "gcc"),
            Err(OpifexError::InvalidToolchainPath { .. })
        ));
    }
}
