use crate::domain::model::{BuildPlan, Invocation, Stage, Stages, Step};
use crate::domain::ports::Toolchain;
use crate::toolchain::{
    add_dirs, add_names, check_compiler, default_build_dir, default_target, discard_dirs,
    discard_names, EntrySet, ToolchainSettings,
};
use crate::utils::error::{OpifexError, Result};
use crate::utils::validation::validate_option;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

const DEFAULT_OPTIONS: [&str; 4] = ["-Wall", "-Wextra", "-pedantic", "-Werror"];

/// A GNU compiler driver (`g++`, `gcc`, `clang++` and friends).
#[derive(Debug, Clone)]
pub struct Gnu {
    path: PathBuf,
    name: String,
    stages: Stages,
    static_link: bool,
    includes: EntrySet<PathBuf>,
    lib_paths: EntrySet<PathBuf>,
    libs: EntrySet<String>,
    options: EntrySet<String>,
    target: String,
    build_dir: PathBuf,
}

impl Gnu {
    /// `path` must point at the compiler binary; `name` labels the build
    /// subdirectory and the default target and may not contain spaces.
    pub fn new(path: impl Into<PathBuf>, name: impl Into<String>) -> Result<Self> {
        let path = path.into();
        let name = name.into();
        check_compiler(&path, &name)?;

        let mut options = EntrySet::new("options");
        for option in DEFAULT_OPTIONS {
            options.insert(option.to_string());
        }

        Ok(Self {
            target: default_target(&name)?,
            build_dir: default_build_dir()?,
            path,
            name,
            stages: Stages::default(),
            static_link: true,
            includes: EntrySet::new("includes"),
            lib_paths: EntrySet::new("lib_paths"),
            libs: EntrySet::new("libs"),
            options,
        })
    }

    pub fn with_settings(
        path: impl Into<PathBuf>,
        name: impl Into<String>,
        settings: &ToolchainSettings,
    ) -> Result<Self> {
        let mut gnu = Self::new(path, name)?;
        gnu.set_stages(settings.stages);
        if let Some(static_link) = settings.static_link {
            gnu.set_static(static_link);
        }
        if let Some(target) = &settings.target {
            gnu.set_target(target.clone());
        }
        if let Some(build_dir) = &settings.build_dir {
            gnu.set_build_dir(build_dir.clone());
        }
        if let Some(options) = &settings.options {
            gnu.options = EntrySet::new("options");
            gnu.add_options(&options.iter().map(String::as_str).collect::<Vec<_>>())?;
        }
        gnu.add_includes(&settings.includes)?
            .add_lib_paths(&settings.lib_paths)?
            .add_libs(&settings.libs.iter().map(String::as_str).collect::<Vec<_>>())?;
        Ok(gnu)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn stages(&self) -> Stages {
        self.stages
    }

    pub fn is_static(&self) -> bool {
        self.static_link
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn includes(&self) -> &EntrySet<PathBuf> {
        &self.includes
    }

    pub fn lib_paths(&self) -> &EntrySet<PathBuf> {
        &self.lib_paths
    }

    pub fn libs(&self) -> &EntrySet<String> {
        &self.libs
    }

    pub fn options(&self) -> &EntrySet<String> {
        &self.options
    }

    pub fn set_stages(&mut self, stages: Stages) -> &mut Self {
        self.stages = stages;
        self
    }

    /// Static by default so the output does not depend on runtime libraries
    /// being present on the target machine.
    pub fn set_static(&mut self, static_link: bool) -> &mut Self {
        self.static_link = static_link;
        self
    }

    pub fn set_target(&mut self, target: impl Into<String>) -> &mut Self {
        self.target = target.into();
        self
    }

    pub fn set_build_dir(&mut self, build_dir: impl Into<PathBuf>) -> &mut Self {
        self.build_dir = build_dir.into();
        self
    }

    pub fn add_includes<P: AsRef<Path>>(&mut self, includes: &[P]) -> Result<&mut Self> {
        add_dirs(&mut self.includes, includes)?;
        Ok(self)
    }

    pub fn discard_includes<P: AsRef<Path>>(&mut self, includes: &[P]) -> Result<&mut Self> {
        discard_dirs(&mut self.includes, includes)?;
        Ok(self)
    }

    pub fn add_lib_paths<P: AsRef<Path>>(&mut self, lib_paths: &[P]) -> Result<&mut Self> {
        add_dirs(&mut self.lib_paths, lib_paths)?;
        Ok(self)
    }

    pub fn discard_lib_paths<P: AsRef<Path>>(&mut self, lib_paths: &[P]) -> Result<&mut Self> {
        discard_dirs(&mut self.lib_paths, lib_paths)?;
        Ok(self)
    }

    pub fn add_libs(&mut self, libs: &[&str]) -> Result<&mut Self> {
        add_names(&mut self.libs, libs)?;
        Ok(self)
    }

    pub fn discard_libs(&mut self, libs: &[&str]) -> Result<&mut Self> {
        discard_names(&mut self.libs, libs)?;
        Ok(self)
    }

    pub fn add_options(&mut self, options: &[&str]) -> Result<&mut Self> {
        for option in options {
            validate_option(self.options.label(), option, '-')?;
        }
        for option in options {
            self.options.insert((*option).to_string());
        }
        Ok(self)
    }

    pub fn discard_options(&mut self, options: &[&str]) -> Result<&mut Self> {
        discard_names(&mut self.options, options)?;
        Ok(self)
    }

    fn stage_dir(&self, stage: &str) -> PathBuf {
        self.build_dir.join(&self.name).join(stage)
    }

    fn include_args(&self) -> Vec<String> {
        self.includes
            .iter()
            .map(|include| format!("-I{}", include.display()))
            .collect()
    }

    fn option_args(&self) -> Vec<String> {
        self.options.iter().cloned().collect()
    }

    /// `PATH` with the compiler's own directory in front, so the driver finds
    /// its assembler and linker next to it.
    pub fn search_path(&self) -> Result<OsString> {
        let compiler = self.path.canonicalize()?;
        let mut dirs: Vec<PathBuf> = compiler.parent().map(Path::to_path_buf).into_iter().collect();
        if let Some(path) = std::env::var_os("PATH") {
            dirs.extend(std::env::split_paths(&path));
        }
        std::env::join_paths(dirs).map_err(|e| OpifexError::InvalidConfigValueError {
            field: "PATH".to_string(),
            value: self.path.display().to_string(),
            reason: e.to_string(),
        })
    }

    /// One `-S` invocation per file; returns the `.s` files they will write.
    pub fn asm_commands(&self, files: &[PathBuf]) -> Result<(Vec<PathBuf>, Vec<Invocation>)> {
        if files.is_empty() {
            return Err(OpifexError::NoSources { stage: "asm" });
        }

        let dir = self.stage_dir("asm");
        let mut outputs = Vec::with_capacity(files.len());
        let mut invocations = Vec::with_capacity(files.len());
        for file in files {
            let output = dir.join(stem(file)).with_extension("s");
            invocations.push(
                Invocation::new(&self.path)
                    .arg("-S")
                    .arg(file.display().to_string())
                    .args(self.include_args())
                    .arg("-o")
                    .arg(output.display().to_string())
                    .args(self.option_args()),
            );
            outputs.push(output);
        }
        Ok((outputs, invocations))
    }

    /// One `-c` invocation per file. Include dirs are dropped when the inputs
    /// are assembly from the previous stage.
    pub fn obj_commands(&self, files: &[PathBuf]) -> Result<(Vec<PathBuf>, Vec<Invocation>)> {
        if files.is_empty() {
            return Err(OpifexError::NoSources { stage: "obj" });
        }

        let dir = self.stage_dir("obj");
        let includes = if self.stages.asm {
            Vec::new()
        } else {
            self.include_args()
        };
        let mut outputs = Vec::with_capacity(files.len());
        let mut invocations = Vec::with_capacity(files.len());
        for file in files {
            let output = dir.join(stem(file)).with_extension("o");
            invocations.push(
                Invocation::new(&self.path)
                    .arg("-c")
                    .arg(file.display().to_string())
                    .args(includes.iter().cloned())
                    .arg("-o")
                    .arg(output.display().to_string())
                    .args(self.option_args()),
            );
            outputs.push(output);
        }
        Ok((outputs, invocations))
    }

    pub fn link_command(&self, files: &[PathBuf]) -> Result<(PathBuf, Invocation)> {
        if files.is_empty() {
            return Err(OpifexError::NoSources { stage: "link" });
        }

        let output = self.build_dir.join(&self.target);
        let includes = if self.stages.asm || self.stages.obj {
            Vec::new()
        } else {
            self.include_args()
        };
        let invocation = Invocation::new(&self.path)
            .args(files.iter().map(|file| file.display().to_string()))
            .args(includes)
            .arg("-o")
            .arg(output.display().to_string())
            .args(self.option_args())
            .args(
                self.lib_paths
                    .iter()
                    .map(|dir| format!("-L{}", dir.display())),
            )
            .args(self.libs.iter().map(|lib| format!("-l{}", lib)))
            .args(self.static_link.then(|| "-static".to_string()));
        Ok((output, invocation))
    }
}

fn stem(file: &Path) -> PathBuf {
    file.file_stem().map(PathBuf::from).unwrap_or_default()
}

impl Toolchain for Gnu {
    fn name(&self) -> &str {
        &self.name
    }

    fn build_dir(&self) -> &Path {
        &self.build_dir
    }

    fn plan(&self, sources: &[PathBuf]) -> Result<BuildPlan> {
        if sources.is_empty() {
            return Err(OpifexError::NoSources { stage: "build" });
        }

        let search_path = self.search_path()?;
        let mut plan = BuildPlan::default();
        let mut files = sources.to_vec();

        if self.stages.asm {
            let (outputs, invocations) = self.asm_commands(&files)?;
            push_steps(&mut plan, Stage::Asm, &outputs, invocations, &search_path);
            files = outputs;
        }
        if self.stages.obj {
            let (outputs, invocations) = self.obj_commands(&files)?;
            push_steps(&mut plan, Stage::Obj, &outputs, invocations, &search_path);
            files = outputs;
        }
        if self.stages.link {
            let (output, invocation) = self.link_command(&files)?;
            push_steps(&mut plan, Stage::Link, &[output], vec![invocation], &search_path);
        }

        tracing::debug!("{}: planned {} step(s)", self.name, plan.steps.len());
        Ok(plan)
    }
}

fn push_steps(
    plan: &mut BuildPlan,
    stage: Stage,
    outputs: &[PathBuf],
    invocations: Vec<Invocation>,
    search_path: &OsString,
) {
    for (output, invocation) in outputs.iter().zip(invocations) {
        plan.steps.push(Step {
            stage,
            invocation: invocation.env("PATH", search_path.clone()),
            outputs: vec![output.clone()],
        });
        plan.artifacts.push(output.clone());
    }
}
