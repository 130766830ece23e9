//! .NET toolchain command generation.
//!
//! Commands are argument vectors run inside build stages, never shell strings.

/// A command to run inside a stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    /// The program to run (e.g., "dotnet")
    pub program: String,
    /// Command arguments
    pub args: Vec<String>,
}

impl CommandSpec {
    /// Create a new command spec.
    pub fn new(program: impl Into<String>) -> Self {
        CommandSpec {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Add an argument.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Add multiple arguments.
    pub fn args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.args.extend(args.into_iter().map(|a| a.into()));
        self
    }

    /// The full argument vector, program first.
    pub fn argv(&self) -> Vec<String> {
        std::iter::once(self.program.clone())
            .chain(self.args.iter().cloned())
            .collect()
    }
}

/// Generates `dotnet` CLI invocations.
#[derive(Debug, Clone)]
pub struct DotnetCli {
    launcher: String,
}

impl DotnetCli {
    pub fn new(launcher: impl Into<String>) -> Self {
        DotnetCli {
            launcher: launcher.into(),
        }
    }

    /// `dotnet restore <project>`
    pub fn restore(&self, project: &str) -> CommandSpec {
        CommandSpec::new(&self.launcher).args(["restore", project])
    }

    /// `dotnet build <project> -c <configuration> -o <output>`
    pub fn build(&self, project: &str, configuration: &str, output: &str) -> CommandSpec {
        CommandSpec::new(&self.launcher).args(["build", project, "-c", configuration, "-o", output])
    }

    /// `dotnet publish <project> -c <configuration> -o <output>`
    pub fn publish(&self, project: &str, configuration: &str, output: &str) -> CommandSpec {
        CommandSpec::new(&self.launcher).args([
            "publish",
            project,
            "-c",
            configuration,
            "-o",
            output,
        ])
    }

    /// Run `target` of the project with an extra targets file imported.
    ///
    /// The file is hooked in through both the single- and cross-targeting
    /// extension points, and writes its result to `output`.
    pub fn probe(&self, targets: &str, output: &str, project: &str, target: &str) -> CommandSpec {
        CommandSpec::new(&self.launcher).args([
            "build".to_string(),
            format!("/t:{}", target),
            format!("/p:CustomAfterMicrosoftCommonTargets={}", targets),
            format!("/p:CustomAfterMicrosoftCommonCrossTargetingTargets={}", targets),
            format!("/p:InfoOutputPath={}", output),
            project.to_string(),
        ])
    }
}
