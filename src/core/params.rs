//! Resolved build parameters.

use serde::Serialize;

use crate::core::error::{FrontendError, Result};
use crate::resolver::fallback::{Origin, Resolved};

/// The project, configuration and assembly a build runs with.
///
/// All three values are non-empty. Instances are only created through
/// [`ResolvedBuildParameters::new`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedBuildParameters {
    project: Resolved,
    configuration: Resolved,
    assembly: Resolved,
}

impl ResolvedBuildParameters {
    /// Validate and bundle resolved values.
    pub fn new(project: Resolved, configuration: Resolved, assembly: Resolved) -> Result<Self> {
        if project.value.is_empty() {
            return Err(FrontendError::ProjectUnresolved);
        }
        if configuration.value.is_empty() {
            return Err(FrontendError::ConfigurationUnresolved);
        }
        if assembly.value.is_empty() {
            return Err(FrontendError::AssemblyUnresolved {
                project: project.value,
            });
        }

        Ok(ResolvedBuildParameters {
            project,
            configuration,
            assembly,
        })
    }

    /// Project file, relative to the build context.
    pub fn project(&self) -> &str {
        &self.project.value
    }

    pub fn configuration(&self) -> &str {
        &self.configuration.value
    }

    /// Entry assembly passed to the launcher.
    pub fn assembly(&self) -> &str {
        &self.assembly.value
    }

    /// Origins of project, configuration and assembly.
    pub fn origins(&self) -> (Origin, Origin, Origin) {
        (
            self.project.origin,
            self.configuration.origin,
            self.assembly.origin,
        )
    }
}
