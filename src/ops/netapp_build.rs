//! Implementation of a frontend build invocation.
//!
//! Manifest, resolution (with the probe as its last resort for the assembly),
//! graph assembly, image config synthesis and finally submission of the main
//! graph. Any failure ends the invocation without a result.

use std::collections::BTreeMap;

use crate::builder::executor::{Gateway, Session};
use crate::builder::graph::{Definition, State};
use crate::builder::image::{self, ImageConfig};
use crate::builder::plan::StagePlan;
use crate::builder::probe::MetadataProbe;
use crate::core::error::{BuildFailure, FrontendError, Stage};
use crate::core::manifest::Manifest;
use crate::core::options::BuildOpts;
use crate::core::params::ResolvedBuildParameters;
use crate::resolver::Resolver;
use crate::sources::LocalSource;
use crate::util::config::FrontendConfig;

/// Metadata key the image config is exported under.
pub const EXPORTER_IMAGE_CONFIG_KEY: &str = "containerimage.config";

/// Outcome of a successful build.
#[derive(Debug)]
pub struct BuildResult<R> {
    /// Reference to the packaged filesystem
    pub reference: R,

    /// Exporter metadata
    pub metadata: BTreeMap<String, Vec<u8>>,

    /// Parameters the build ran with
    pub params: ResolvedBuildParameters,

    /// The submitted main graph
    pub definition: Definition,

    /// The synthesized image config
    pub image: ImageConfig,
}

impl<R> BuildResult<R> {
    /// Raw image config JSON attached to the result.
    pub fn image_config(&self) -> Option<&[u8]> {
        self.metadata
            .get(EXPORTER_IMAGE_CONFIG_KEY)
            .map(Vec::as_slice)
    }
}

/// Run one build invocation.
pub fn build<G: Gateway>(
    gateway: &G,
    session: &Session,
    opts: &BuildOpts,
    config: &FrontendConfig,
) -> Result<BuildResult<G::Ref>, BuildFailure> {
    let manifest =
        Manifest::fetch(gateway, session, opts, config).map_err(BuildFailure::at(Stage::Manifest))?;

    let context = context_state(session, opts, config);

    let params = resolve(gateway, session, opts, config, &manifest, &context)?;
    tracing::info!(
        project = params.project(),
        configuration = params.configuration(),
        assembly = params.assembly(),
        "resolved build parameters"
    );

    let plan = StagePlan::assemble(&params, &context, config);
    let definition = plan.definition(&config.platform).map_err(|e| {
        BuildFailure::new(
            Stage::Assemble,
            FrontendError::GraphSubmissionError {
                reason: format!("failed to marshal stage graph: {}", e),
            },
        )
    })?;

    let image = image::synthesize(params.assembly(), gateway, session, config)
        .map_err(BuildFailure::at(Stage::ImageConfig))?;
    let image_json = image.to_json().map_err(|e| {
        BuildFailure::new(
            Stage::ImageConfig,
            FrontendError::ImageConfigResolutionError {
                image: config.runtime_image.clone(),
                reason: format!("failed to serialize image config: {}", e),
            },
        )
    })?;

    let reference = submit(gateway, session, &definition).map_err(BuildFailure::at(Stage::Solve))?;

    let mut metadata = BTreeMap::new();
    metadata.insert(EXPORTER_IMAGE_CONFIG_KEY.to_string(), image_json);

    Ok(BuildResult {
        reference,
        metadata,
        params,
        definition,
        image,
    })
}

/// Fetch the manifest and resolve parameters, without assembling the main graph.
pub fn resolve_parameters<G: Gateway>(
    gateway: &G,
    session: &Session,
    opts: &BuildOpts,
    config: &FrontendConfig,
) -> Result<ResolvedBuildParameters, BuildFailure> {
    let manifest =
        Manifest::fetch(gateway, session, opts, config).map_err(BuildFailure::at(Stage::Manifest))?;
    let context = context_state(session, opts, config);

    resolve(gateway, session, opts, config, &manifest, &context)
}

/// The build context as the root of a chain.
fn context_state(session: &Session, opts: &BuildOpts, config: &FrontendConfig) -> State {
    State::local(LocalSource::new(opts.context_name(config), session.id()))
}

/// Resolve parameters against an already loaded manifest.
pub fn resolve<G: Gateway>(
    gateway: &G,
    session: &Session,
    opts: &BuildOpts,
    config: &FrontendConfig,
    manifest: &Manifest,
    context: &State,
) -> Result<ResolvedBuildParameters, BuildFailure> {
    let probe = MetadataProbe::new(gateway, session, config);

    Resolver::new(gateway, session, opts, config)
        .resolve(manifest, |project| probe.run(context, project))
        .map_err(|error| {
            let stage = if error.is_probe_error() {
                Stage::Probe
            } else {
                Stage::Resolve
            };
            BuildFailure::new(stage, error)
        })
}

fn submit<G: Gateway>(
    gateway: &G,
    session: &Session,
    definition: &Definition,
) -> Result<G::Ref, FrontendError> {
    session.check().map_err(|_| FrontendError::Cancelled)?;

    tracing::debug!(
        terminal = %definition.terminal,
        nodes = definition.len(),
        "submitting stage graph"
    );

    gateway.solve(definition).map_err(|e| {
        FrontendError::from_gateway(e, |e| FrontendError::GraphSubmissionError {
            reason: e.to_string(),
        })
    })
}
