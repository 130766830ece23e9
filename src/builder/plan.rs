//! Stage plan - the multi-stage restore, compile, publish and package graph.
//!
//! ```text
//! sdk ── copy project ── restore ── copy context ── build ── publish ──┐
//! runtime ─────────────────────────────────── copy publish output ◄──┘
//! ```
//!
//! The source-preparation prefix copies only the project file before
//! restoring, so the restore layer stays valid while sources change.

use crate::builder::graph::{Definition, GraphError, Platform, State};
use crate::builder::toolchain::DotnetCli;
use crate::core::params::ResolvedBuildParameters;
use crate::util::config::FrontendConfig;

/// The states of an assembled build.
#[derive(Debug, Clone)]
pub struct StagePlan {
    /// SDK image with restored packages and the full context
    pub source: State,

    /// Compiled output
    pub build: State,

    /// Published output
    pub publish: State,

    /// Runtime image with the published application
    pub package: State,
}

impl StagePlan {
    /// Build the source-preparation prefix shared by the plan and the probe.
    pub fn prepare_source(project: &str, context: &State, config: &FrontendConfig) -> State {
        let cli = DotnetCli::new(&config.launcher);

        State::image(&config.sdk_image)
            .dir(&config.source_dir)
            .copy_from(context, project, "./")
            .run(&cli.restore(project))
            .copy_all(context, ".")
    }

    /// Assemble the full plan for resolved parameters.
    pub fn assemble(
        params: &ResolvedBuildParameters,
        context: &State,
        config: &FrontendConfig,
    ) -> Self {
        let cli = DotnetCli::new(&config.launcher);
        let source = Self::prepare_source(params.project(), context, config);

        let build = source.clone().run(&cli.build(
            params.project(),
            params.configuration(),
            &config.build_dir(),
        ));
        let publish = build.clone().run(&cli.publish(
            params.project(),
            params.configuration(),
            &config.publish_dir(),
        ));

        let package = State::image(&config.runtime_image)
            .dir(&config.app_dir)
            .copy_from(&publish, &config.publish_dir(), ".");

        tracing::debug!(package = %package.digest(), "assembled stage plan");

        StagePlan {
            source,
            build,
            publish,
            package,
        }
    }

    /// Marshal the package state.
    pub fn definition(&self, platform: &Platform) -> Result<Definition, GraphError> {
        Definition::marshal(&self.package, platform)
    }
}
