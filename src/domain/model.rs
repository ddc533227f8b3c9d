use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};

/// Which intermediate stages a build stops at and emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Stages {
    pub asm: bool,
    pub obj: bool,
    #[serde(alias = "final")]
    pub link: bool,
}

impl Default for Stages {
    fn default() -> Self {
        Self {
            asm: false,
            obj: false,
            link: true,
        }
    }
}

impl Stages {
    pub fn new(asm: bool, obj: bool, link: bool) -> Self {
        Self { asm, obj, link }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Asm,
    Obj,
    /// Single `cl` pass that emits assembly and objects together.
    Compile,
    Link,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Asm => "asm",
            Stage::Obj => "obj",
            Stage::Compile => "compile",
            Stage::Link => "link",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fully built process command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub env: BTreeMap<String, OsString>,
    /// Arguments are already quoted for the target and must be passed
    /// through untouched (Windows `raw_arg`).
    pub verbatim: bool,
}

impl Invocation {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            env: BTreeMap::new(),
            verbatim: false,
        }
    }

    pub fn verbatim(mut self) -> Self {
        self.verbatim = true;
        self
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<OsString>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Shell-like rendering for logs and dry runs. Arguments containing
    /// spaces are double-quoted unless the invocation is verbatim.
    pub fn render(&self) -> String {
        std::iter::once(self.program.display().to_string())
            .chain(self.args.iter().cloned())
            .map(|part| {
                if !self.verbatim && part.contains(' ') && !part.starts_with('"') {
                    format!("\"{}\"", part)
                } else {
                    part
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub stage: Stage,
    pub invocation: Invocation,
    pub outputs: Vec<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildPlan {
    pub steps: Vec<Step>,
    /// Files the build leaves behind when every step succeeds.
    pub artifacts: Vec<PathBuf>,
}

impl BuildPlan {
    pub fn output_dirs(&self) -> Vec<&Path> {
        let mut dirs: Vec<&Path> = self
            .steps
            .iter()
            .flat_map(|step| step.outputs.iter())
            .filter_map(|output| output.parent())
            .collect();
        dirs.sort();
        dirs.dedup();
        dirs
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepLog {
    pub stage: Stage,
    pub command: String,
    /// Exit status, `-1` when the process was terminated by a signal.
    pub status: i32,
    pub stdout: String,
    pub stderr: String,
}

impl StepLog {
    pub fn succeeded(&self) -> bool {
        self.status == 0
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildReport {
    pub toolchain: String,
    pub succeeded: bool,
    pub artifacts: Vec<PathBuf>,
    pub logs: Vec<StepLog>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl BuildReport {
    pub fn failed_step(&self) -> Option<&StepLog> {
        self.logs.iter().find(|log| !log.succeeded())
    }
}
