use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OpifexError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error in {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value for {field}: [{value}] ({reason})")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing configuration field: {field}")]
    MissingConfigError { field: String },

    #[error("Toolchain path must be an existing file: {} was not found", path.display())]
    InvalidToolchainPath { path: PathBuf },

    #[error("Toolchain name must not contain spaces: [{name}]")]
    InvalidToolchainName { name: String },

    #[error("Invalid {set} entry [{entry}]: {reason}")]
    InvalidEntry {
        set: &'static str,
        entry: String,
        reason: String,
    },

    #[error("{set} does not contain [{entry}]")]
    EntryNotPresent { set: &'static str, entry: String },

    #[error("No source files given for the {stage} stage")]
    NoSources { stage: &'static str },

    #[error("Build task failed: {message}")]
    TaskError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Io,
    Configuration,
    Toolchain,
    Input,
    Runtime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl ErrorSeverity {
    /// Process exit status used by the driver CLI.
    pub fn exit_code(self) -> i32 {
        match self {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        }
    }
}

impl OpifexError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            OpifexError::IoError(_) => ErrorCategory::Io,
            OpifexError::SerializationError(_) => ErrorCategory::Runtime,
            OpifexError::ConfigValidationError { .. }
            | OpifexError::InvalidConfigValueError { .. }
            | OpifexError::MissingConfigError { .. } => ErrorCategory::Configuration,
            OpifexError::InvalidToolchainPath { .. } | OpifexError::InvalidToolchainName { .. } => {
                ErrorCategory::Toolchain
            }
            OpifexError::InvalidEntry { .. }
            | OpifexError::EntryNotPresent { .. }
            | OpifexError::NoSources { .. } => ErrorCategory::Input,
            OpifexError::TaskError { .. } => ErrorCategory::Runtime,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            OpifexError::EntryNotPresent { .. } => ErrorSeverity::Low,
            OpifexError::IoError(_) => ErrorSeverity::Medium,
            OpifexError::TaskError { .. } | OpifexError::SerializationError(_) => {
                ErrorSeverity::Critical
            }
            _ => ErrorSeverity::High,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            OpifexError::IoError(e) => format!("A file or process operation failed: {}", e),
            OpifexError::InvalidToolchainPath { path } => {
                format!("Compiler not found at {}", path.display())
            }
            OpifexError::NoSources { .. } => "There is nothing to compile".to_string(),
            other => other.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Io => "Check that the paths exist and that the compiler is executable",
            ErrorCategory::Configuration => "Fix the build file and run again",
            ErrorCategory::Toolchain => {
                "Point [toolchain].path at the compiler binary (or vcvars64.bat for msvc)"
            }
            ErrorCategory::Input => "Check the include dirs, libraries, options and sources",
            ErrorCategory::Runtime => "Re-run with --verbose and report the log",
        }
    }
}

pub type Result<T> = std::result::Result<T, OpifexError>;
