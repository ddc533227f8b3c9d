use crate::utils::error::{OpifexError, Result};
use std::path::Path;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(OpifexError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path cannot be empty".to_string(),
        });
    }

    if path.contains('\0') {
        return Err(OpifexError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path contains null bytes".to_string(),
        });
    }

    Ok(())
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(OpifexError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

pub fn validate_non_empty_list<T>(field_name: &str, values: &[T]) -> Result<()> {
    if values.is_empty() {
        return Err(OpifexError::MissingConfigError {
            field: field_name.to_string(),
        });
    }
    Ok(())
}

pub fn validate_no_spaces(set: &'static str, value: &str) -> Result<()> {
    if value.contains(' ') {
        return Err(OpifexError::InvalidEntry {
            set,
            entry: value.to_string(),
            reason: "must not contain spaces".to_string(),
        });
    }
    Ok(())
}

/// Options are single tokens introduced by the toolchain's switch character.
pub fn validate_option(set: &'static str, option: &str, prefix: char) -> Result<()> {
    if !option.starts_with(prefix) {
        return Err(OpifexError::InvalidEntry {
            set,
            entry: option.to_string(),
            reason: format!("must start with {}", prefix),
        });
    }
    validate_no_spaces(set, option)
}

pub fn validate_directory(set: &'static str, dir: &Path) -> Result<()> {
    if !dir.is_dir() {
        return Err(OpifexError::InvalidEntry {
            set,
            entry: dir.display().to_string(),
            reason: "must be an existing directory".to_string(),
        });
    }
    Ok(())
}
