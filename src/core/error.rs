//! Build failure taxonomy.
//!
//! Every failure is terminal for the invocation. Components return a
//! [`FrontendError`]; orchestration wraps it in a [`BuildFailure`] naming the
//! stage that produced it.

use std::fmt;

use miette::Diagnostic as MietteDiagnostic;
use thiserror::Error;

use crate::builder::executor::GatewayError;
use crate::builder::template::TemplateError;
use crate::util::diagnostic::{suggestions, Diagnostic};

/// Result type used throughout the frontend.
pub type Result<T, E = FrontendError> = std::result::Result<T, E>;

/// An error raised by one of the frontend components.
#[derive(Debug, Error, MietteDiagnostic)]
pub enum FrontendError {
    #[error("source `{source_name}` is unavailable: {reason}")]
    #[diagnostic(code(netapp::source::unavailable))]
    SourceUnavailable { source_name: String, reason: String },

    #[error("manifest `{filename}` is empty")]
    #[diagnostic(code(netapp::manifest::empty))]
    EmptyManifest { filename: String },

    #[error("failed to parse manifest `{filename}`: {reason}")]
    #[diagnostic(code(netapp::manifest::parse))]
    ManifestParseError { filename: String, reason: String },

    #[error("no project could be resolved")]
    #[diagnostic(code(netapp::resolve::project))]
    ProjectUnresolved,

    #[error("no build configuration could be resolved")]
    #[diagnostic(code(netapp::resolve::configuration))]
    ConfigurationUnresolved,

    #[error("no project could be inferred from source `{source_name}` (pattern `{pattern}`)")]
    #[diagnostic(code(netapp::resolve::infer))]
    NoProjectInferable { source_name: String, pattern: String },

    #[error("unable to determine the assembly for `{project}`")]
    #[diagnostic(code(netapp::resolve::assembly))]
    AssemblyUnresolved { project: String },

    #[error("failed to execute metadata probe: {reason}")]
    #[diagnostic(code(netapp::probe::execute))]
    ProbeExecutionError { reason: String },

    #[error("failed to read metadata probe output `{path}`: {reason}")]
    #[diagnostic(code(netapp::probe::output))]
    ProbeOutputMissing { path: String, reason: String },

    #[error("failed to parse metadata probe output: {reason}")]
    #[diagnostic(code(netapp::probe::parse))]
    ProbeOutputParseError { reason: String },

    #[error("failed to resolve image config for `{image}`: {reason}")]
    #[diagnostic(code(netapp::image::config))]
    ImageConfigResolutionError { image: String, reason: String },

    #[error("failed to submit stage graph: {reason}")]
    #[diagnostic(code(netapp::solve::submit))]
    GraphSubmissionError { reason: String },

    #[error(transparent)]
    #[diagnostic(code(netapp::template))]
    Template(#[from] TemplateError),

    #[error("build cancelled")]
    #[diagnostic(code(netapp::cancelled))]
    Cancelled,
}

impl FrontendError {
    /// Map a gateway failure, keeping cancellation distinct from every other cause.
    pub fn from_gateway(err: GatewayError, f: impl FnOnce(GatewayError) -> Self) -> Self {
        match err {
            GatewayError::Cancelled => FrontendError::Cancelled,
            other => f(other),
        }
    }

    /// Whether this error came out of the metadata probe.
    pub fn is_probe_error(&self) -> bool {
        matches!(
            self,
            FrontendError::ProbeExecutionError { .. }
                | FrontendError::ProbeOutputMissing { .. }
                | FrontendError::ProbeOutputParseError { .. }
                | FrontendError::Template(_)
        )
    }

    /// Convert to a user-friendly diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        let diag = Diagnostic::error(self.to_string());

        match self {
            FrontendError::SourceUnavailable { .. } => {
                diag.with_suggestion(suggestions::SOURCE_UNAVAILABLE)
            }
            FrontendError::EmptyManifest { .. } => diag.with_suggestion(suggestions::EMPTY_MANIFEST),
            FrontendError::ManifestParseError { .. } => {
                diag.with_suggestion(suggestions::MANIFEST_FORMAT)
            }
            FrontendError::ProjectUnresolved => diag.with_suggestion(suggestions::NO_PROJECT),
            FrontendError::ConfigurationUnresolved => {
                diag.with_suggestion(suggestions::NO_CONFIGURATION)
            }
            FrontendError::NoProjectInferable { pattern, .. } => diag
                .with_context(format!("no regular file matched `{}`", pattern))
                .with_suggestion(suggestions::NO_PROJECT),
            FrontendError::AssemblyUnresolved { .. } => {
                diag.with_suggestion(suggestions::NO_ASSEMBLY)
            }
            FrontendError::ProbeExecutionError { .. }
            | FrontendError::ProbeOutputMissing { .. }
            | FrontendError::ProbeOutputParseError { .. } => diag
                .with_context("the assembly name is probed because neither options nor manifest set it")
                .with_suggestion(suggestions::NO_ASSEMBLY),
            FrontendError::ImageConfigResolutionError { .. } => {
                diag.with_suggestion(suggestions::IMAGE_CONFIG)
            }
            FrontendError::GraphSubmissionError { .. } => {
                diag.with_suggestion(suggestions::SUBMISSION_FAILED)
            }
            FrontendError::Template(_) | FrontendError::Cancelled => diag,
        }
    }
}

/// The phase of a build invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Fetching and parsing the manifest
    Manifest,
    /// Resolving project, configuration and assembly
    Resolve,
    /// Running the metadata probe
    Probe,
    /// Assembling and marshalling the stage graph
    Assemble,
    /// Synthesizing the image configuration
    ImageConfig,
    /// Submitting the stage graph to the executor
    Solve,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Manifest => "manifest",
            Stage::Resolve => "resolve",
            Stage::Probe => "probe",
            Stage::Assemble => "assemble",
            Stage::ImageConfig => "image config",
            Stage::Solve => "solve",
        };
        f.write_str(name)
    }
}

/// A failed build invocation: the error plus the stage it surfaced in.
#[derive(Debug, Error)]
#[error("{stage}: {error}")]
pub struct BuildFailure {
    pub stage: Stage,
    pub error: FrontendError,
}

impl BuildFailure {
    /// Wrap an error with the stage that produced it.
    pub fn new(stage: Stage, error: FrontendError) -> Self {
        BuildFailure { stage, error }
    }

    /// Returns a closure suitable for `map_err`.
    pub fn at(stage: Stage) -> impl FnOnce(FrontendError) -> BuildFailure {
        move |error| BuildFailure::new(stage, error)
    }

    /// Whether the invocation was cancelled rather than failing.
    pub fn is_cancelled(&self) -> bool {
        matches!(self.error, FrontendError::Cancelled)
    }

    /// Convert to a user-friendly diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        let mut diag = self.error.to_diagnostic();
        diag.message = self.to_string();
        diag
    }
}
