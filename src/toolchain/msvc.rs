use crate::domain::model::{BuildPlan, Invocation, Stage, Stages, Step};
use crate::domain::ports::Toolchain;
use crate::toolchain::{
    add_dirs, add_names, check_compiler, default_build_dir, default_target, discard_dirs,
    discard_names, quote_windows, windows_path, EntrySet, ToolchainSettings,
};
use crate::utils::error::{OpifexError, Result};
use crate::utils::validation::validate_option;
use std::path::{Path, PathBuf};

const DEFAULT_OPTIONS: [&str; 3] = ["/W4", "/EHsc", "/options:strict"];

/// The MSVC toolchain, driven through `vcvars64.bat` so `cl` and `link` see
/// the developer environment.
#[derive(Debug, Clone)]
pub struct Msvc {
    path: PathBuf,
    name: String,
    stages: Stages,
    static_link: bool,
    includes: EntrySet<PathBuf>,
    lib_paths: EntrySet<PathBuf>,
    default_libs: EntrySet<String>,
    no_default_libs: EntrySet<String>,
    options: EntrySet<String>,
    target: String,
    build_dir: PathBuf,
}

impl Msvc {
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
            default_libs: EntrySet::new("default_libs"),
            no_default_libs: EntrySet::new("no_default_libs"),
            options,
        })
    }

    pub fn with_settings(
        path: impl Into<PathBuf>,
        name: impl Into<String>,
        settings: &ToolchainSettings,
    ) -> Result<Self> {
        let mut msvc = Self::new(path, name)?;
        msvc.set_stages(settings.stages);
        if let Some(static_link) = settings.static_link {
            msvc.set_static(static_link);
        }
        if let Some(target) = &settings.target {
            msvc.set_target(target.clone());
        }
        if let Some(build_dir) = &settings.build_dir {
            msvc.set_build_dir(build_dir.clone());
        }
        if let Some(options) = &settings.options {
            msvc.options = EntrySet::new("options");
            msvc.add_options(&as_strs(options))?;
        }
        if !settings.libs.is_empty() {
            tracing::warn!("msvc ignores [build].libs; use default_libs instead");
        }
        msvc.add_includes(&settings.includes)?
            .add_lib_paths(&settings.lib_paths)?
            .add_default_libs(&as_strs(&settings.default_libs))?
            .add_no_default_libs(&as_strs(&settings.no_default_libs))?;
        Ok(msvc)
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

    pub fn includes(&self) -> &EntrySet<PathBuf> {
        &self.includes
    }

    pub fn lib_paths(&self) -> &EntrySet<PathBuf> {
        &self.lib_paths
    }

    pub fn default_libs(&self) -> &EntrySet<String> {
        &self.default_libs
    }

    pub fn no_default_libs(&self) -> &EntrySet<String> {
        &self.no_default_libs
    }

    pub fn options(&self) -> &EntrySet<String> {
        &self.options
    }

    pub fn set_stages(&mut self, stages: Stages) -> &mut Self {
        self.stages = stages;
        self
    }

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

    pub fn add_default_libs(&mut self, libs: &[&str]) -> Result<&mut Self> {
        add_names(&mut self.default_libs, libs)?;
        Ok(self)
    }

    pub fn discard_default_libs(&mut self, libs: &[&str]) -> Result<&mut Self> {
        discard_names(&mut self.default_libs, libs)?;
        Ok(self)
    }

    pub fn add_no_default_libs(&mut self, libs: &[&str]) -> Result<&mut Self> {
        add_names(&mut self.no_default_libs, libs)?;
        Ok(self)
    }

    pub fn discard_no_default_libs(&mut self, libs: &[&str]) -> Result<&mut Self> {
        discard_names(&mut self.no_default_libs, libs)?;
        Ok(self)
    }

    pub fn add_options(&mut self, options: &[&str]) -> Result<&mut Self> {
        for option in options {
            validate_option(self.options.label(), option, '/')?;
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

    /// `/Fa<dir>\` when assembly output is enabled, with the `.asm` files it
    /// will produce.
    pub fn asm_output(&self, files: &[PathBuf]) -> (Vec<PathBuf>, Vec<String>) {
        if !self.stages.asm {
            return (Vec::new(), Vec::new());
        }
        let dir = self.stage_dir("asm");
        let asms = files
            .iter()
            .map(|file| dir.join(stem(file)).with_extension("asm"))
            .collect();
        (asms, vec![format!("/Fa{}\\", windows_path(&dir))])
    }

    /// `/Fo<dir>\` and the `.obj` files it will produce. Objects are always
    /// written here because the link step consumes them.
    pub fn obj_output(&self, files: &[PathBuf]) -> (Vec<PathBuf>, Vec<String>) {
        let dir = self.stage_dir("obj");
        let objs = files
            .iter()
            .map(|file| dir.join(stem(file)).with_extension("obj"))
            .collect();
        (objs, vec![format!("/Fo{}\\", windows_path(&dir))])
    }

    /// `/OUT:<build>\<target>.exe`, pinning the static CRT when linking
    /// statically.
    pub fn link_output(&self, objs: &[PathBuf]) -> (PathBuf, Vec<String>) {
        let exe = self.build_dir.join(format!("{}.exe", self.target));
        let mut command = vec![format!("/OUT:{}", windows_path(&exe))];
        if self.static_link {
            command.push("/DEFAULTLIB:LIBCMT".to_string());
            command.push("/NODEFAULTLIB:MSVCRT".to_string());
        }
        command.extend(objs.iter().map(|obj| windows_path(obj)));
        (exe, command)
    }

    pub fn includes_command(&self) -> Vec<String> {
        self.includes
            .iter()
            .map(|include| format!("/I{}", windows_path(include)))
            .collect()
    }

    pub fn lib_paths_command(&self) -> Vec<String> {
        self.lib_paths
            .iter()
            .map(|dir| format!("/LIBPATH:{}", windows_path(dir)))
            .collect()
    }

    pub fn default_libs_command(&self) -> Vec<String> {
        self.default_libs
            .iter()
            .map(|lib| format!("/DEFAULTLIB:{}", lib))
            .collect()
    }

    pub fn no_default_libs_command(&self) -> Vec<String> {
        self.no_default_libs
            .iter()
            .map(|lib| format!("/NODEFAULTLIB:{}", lib))
            .collect()
    }

    /// `cmd /S /C ""<vcvars>" && <tool> /nologo <args>"`, passed to cmd
    /// verbatim. Arguments containing spaces are quoted.
    fn through_vcvars<I>(&self, tool: &str, args: I) -> Invocation
    where
        I: IntoIterator<Item = String>,
    {
        let mut line = format!("{} && {} /nologo", quote_windows(&self.path), tool);
        for arg in args {
            line.push(' ');
            if arg.contains(' ') {
                line.push_str(&format!("\"{}\"", arg));
            } else {
                line.push_str(&arg);
            }
        }
        Invocation::new("cmd")
            .args(["/S", "/C"])
            .arg(format!("\"{}\"", line))
            .verbatim()
    }

    pub fn compile_command(&self, files: &[PathBuf]) -> Result<(Vec<PathBuf>, Vec<PathBuf>, Invocation)> {
        if files.is_empty() {
            return Err(OpifexError::NoSources { stage: "compile" });
        }
        let (asms, fa) = self.asm_output(files);
        let (objs, fo) = self.obj_output(files);
        let args = std::iter::once("/c".to_string())
            .chain(fa)
            .chain(fo)
            .chain(self.includes_command())
            .chain(self.options.iter().cloned())
            .chain(files.iter().map(|file| windows_path(file)));
        Ok((asms, objs, self.through_vcvars("cl", args)))
    }

    pub fn link_command(&self, objs: &[PathBuf]) -> Result<(PathBuf, Invocation)> {
        if objs.is_empty() {
            return Err(OpifexError::NoSources { stage: "link" });
        }
        let (exe, out) = self.link_output(objs);
        let args = out
            .into_iter()
            .chain(self.lib_paths_command())
            .chain(self.default_libs_command())
            .chain(self.no_default_libs_command());
        Ok((exe, self.through_vcvars("link", args)))
    }
}

fn stem(file: &Path) -> PathBuf {
    file.file_stem().map(PathBuf::from).unwrap_or_default()
}

fn as_strs(values: &[String]) -> Vec<&str> {
    values.iter().map(String::as_str).collect()
}

impl Toolchain for Msvc {
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

        let mut plan = BuildPlan::default();
        if !(self.stages.asm || self.stages.obj || self.stages.link) {
            return Ok(plan);
        }

        let (asms, objs, invocation) = self.compile_command(sources)?;
        plan.steps.push(Step {
            stage: Stage::Compile,
            invocation,
            outputs: asms.iter().chain(objs.iter()).cloned().collect(),
        });
        plan.artifacts.extend(asms);
        if self.stages.obj {
            plan.artifacts.extend(objs.iter().cloned());
        }

        if self.stages.link {
            let (exe, invocation) = self.link_command(&objs)?;
            plan.steps.push(Step {
                stage: Stage::Link,
                invocation,
                outputs: vec![exe.clone()],
            });
            plan.artifacts.push(exe);
        }

        tracing::debug!("{}: planned {} step(s)", self.name, plan.steps.len());
        Ok(plan)
    }
}
