//! Resolution of project, configuration and assembly.

use crate::builder::executor::{Gateway, Session};
use crate::core::error::{FrontendError, Result};
use crate::core::manifest::Manifest;
use crate::core::options::BuildOpts;
use crate::core::params::ResolvedBuildParameters;
use crate::resolver::fallback::{Fallbacks, Origin, Resolved};
use crate::sources::{ContentSource, LocalSource};
use crate::util::config::FrontendConfig;

/// Resolves build parameters for one invocation.
pub struct Resolver<'a, G: Gateway> {
    gateway: &'a G,
    session: &'a Session,
    opts: &'a BuildOpts,
    config: &'a FrontendConfig,
}

impl<'a, G: Gateway> Resolver<'a, G> {
    pub fn new(
        gateway: &'a G,
        session: &'a Session,
        opts: &'a BuildOpts,
        config: &'a FrontendConfig,
    ) -> Self {
        Resolver {
            gateway,
            session,
            opts,
            config,
        }
    }

    /// Resolve all parameters.
    ///
    /// `probe` is called with the resolved project only when neither options
    /// nor manifest name the assembly.
    pub fn resolve<P>(&self, manifest: &Manifest, probe: P) -> Result<ResolvedBuildParameters>
    where
        P: FnOnce(&str) -> Result<String>,
    {
        let project = self.resolve_project(manifest)?;
        let configuration = self.resolve_configuration(manifest);
        let assembly = self.resolve_assembly(manifest, &project.value, || probe(&project.value))?;

        ResolvedBuildParameters::new(project, configuration, assembly)
    }

    /// option `project` > manifest > inference
    pub fn resolve_project(&self, manifest: &Manifest) -> Result<Resolved> {
        let project = Fallbacks::new("project")
            .layer(Origin::Option, self.opts.project())
            .layer(Origin::Manifest, manifest.project())
            .or_else_try(Origin::Inferred, || self.infer_project())?;

        if project.value.is_empty() {
            return Err(FrontendError::ProjectUnresolved);
        }
        Ok(project)
    }

    /// option `configuration` > manifest > configured default
    ///
    /// A present but empty option skips the manifest.
    pub fn resolve_configuration(&self, manifest: &Manifest) -> Resolved {
        Fallbacks::new("configuration")
            .overriding(Origin::Option, self.opts.configuration())
            .layer(Origin::Manifest, manifest.configuration())
            .or_default(Origin::Default, &self.config.default_configuration)
    }

    /// option `assembly` > manifest > probe
    ///
    /// A present but empty option skips the manifest and runs the probe.
    pub fn resolve_assembly<P>(&self, manifest: &Manifest, project: &str, probe: P) -> Result<Resolved>
    where
        P: FnOnce() -> Result<String>,
    {
        let assembly = Fallbacks::new("assembly")
            .overriding(Origin::Option, self.opts.assembly())
            .layer(Origin::Manifest, manifest.assembly())
            .or_else_try(Origin::Probe, probe)?;

        if assembly.value.is_empty() {
            return Err(FrontendError::AssemblyUnresolved {
                project: project.to_string(),
            });
        }
        Ok(assembly)
    }

    /// Pick the first regular file matching the project pattern in the
    /// dockerfile source.
    pub fn infer_project(&self) -> Result<String> {
        let source_name = self.opts.dockerfile_name(self.config);
        let pattern = &self.config.project_pattern;
        let unavailable = |reason: String| FrontendError::SourceUnavailable {
            source_name: source_name.to_string(),
            reason,
        };

        self.session.check().map_err(|_| FrontendError::Cancelled)?;
        let source = self
            .gateway
            .resolve_local(&LocalSource::new(source_name, self.session.id()))
            .map_err(|e| FrontendError::from_gateway(e, |e| unavailable(e.to_string())))?;

        self.session.check().map_err(|_| FrontendError::Cancelled)?;
        let entries = source.read_dir(".", pattern).map_err(|e| {
            FrontendError::from_gateway(e, |e| unavailable(format!("failed to list `.`: {}", e)))
        })?;

        let project = entries
            .into_iter()
            .find(|e| e.is_regular())
            .map(|e| e.path)
            .ok_or_else(|| FrontendError::NoProjectInferable {
                source_name: source_name.to_string(),
                pattern: pattern.clone(),
            })?;

        tracing::info!(project = %project, source = source_name, "inferred project");
        Ok(project)
    }
}
