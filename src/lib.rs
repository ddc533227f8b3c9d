pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod toolchain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use config::TomlConfig;
pub use crate::core::build::BuildEngine;
pub use toolchain::{Gnu, Msvc};
pub use utils::error::{OpifexError, Result};
