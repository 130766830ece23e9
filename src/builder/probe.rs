//! Metadata probe - asks the project's build system for its assembly name.
//!
//! The probe is a build within the build: it extends the source-preparation
//! stage with an MSBuild targets file, runs a target that writes
//! `assembly: "<AssemblyName>.dll"` to a known path, submits that stage on its
//! own and reads the file back.

use serde::Deserialize;
use serde_yaml::Value;

use crate::builder::executor::{Gateway, Session};
use crate::builder::graph::{Definition, State, DEFAULT_FILE_MODE};
use crate::builder::plan::StagePlan;
use crate::builder::template::{self, PROJECT_PROPERTIES_TARGET};
use crate::builder::toolchain::DotnetCli;
use crate::core::error::{FrontendError, Result};
use crate::sources::ContentSource;
use crate::util::config::FrontendConfig;

#[derive(Debug, Default, Deserialize)]
struct ProbeOutput {
    #[serde(default, alias = "Assembly")]
    assembly: Option<Value>,
}

/// Runs the metadata probe against a gateway.
pub struct MetadataProbe<'a, G: Gateway> {
    gateway: &'a G,
    session: &'a Session,
    config: &'a FrontendConfig,
}

impl<'a, G: Gateway> MetadataProbe<'a, G> {
    pub fn new(gateway: &'a G, session: &'a Session, config: &'a FrontendConfig) -> Self {
        MetadataProbe {
            gateway,
            session,
            config,
        }
    }

    /// Build the probe stage for a project.
    pub fn probe_state(&self, context: &State, project: &str) -> Result<State> {
        let targets = template::project_properties_targets()?;
        let targets_path = self.config.probe_targets_path();
        let cli = DotnetCli::new(&self.config.launcher);

        Ok(StagePlan::prepare_source(project, context, self.config)
            .mkdir(&self.config.meta_dir, DEFAULT_FILE_MODE)
            .mkfile(&targets_path, DEFAULT_FILE_MODE, targets.into_bytes())
            .run(&cli.probe(
                &targets_path,
                &self.config.probe_output_path(),
                project,
                PROJECT_PROPERTIES_TARGET,
            )))
    }

    /// Run the probe and return the assembly it reports.
    ///
    /// The returned value may be empty; the caller decides whether that is fatal.
    pub fn run(&self, context: &State, project: &str) -> Result<String> {
        let state = self.probe_state(context, project)?;
        let definition = Definition::marshal(&state, &self.config.platform).map_err(|e| {
            FrontendError::ProbeExecutionError {
                reason: e.to_string(),
            }
        })?;

        tracing::info!(project, "probing project for its assembly name");

        self.session.check().map_err(|_| FrontendError::Cancelled)?;
        let reference = self.gateway.solve(&definition).map_err(|e| {
            FrontendError::from_gateway(e, |e| FrontendError::ProbeExecutionError {
                reason: e.to_string(),
            })
        })?;

        let output_path = self.config.probe_output_path();
        self.session.check().map_err(|_| FrontendError::Cancelled)?;
        let content = reference.read_file(&output_path).map_err(|e| {
            FrontendError::from_gateway(e, |e| FrontendError::ProbeOutputMissing {
                path: output_path.clone(),
                reason: e.to_string(),
            })
        })?;

        let assembly = parse_probe_output(&content)?;
        tracing::debug!(project, assembly = %assembly, "probe finished");
        Ok(assembly)
    }
}

/// Parse the YAML line written by the probe target.
pub fn parse_probe_output(content: &[u8]) -> Result<String> {
    let parse_error = |reason: String| FrontendError::ProbeOutputParseError { reason };

    let value: Value = serde_yaml::from_slice(content).map_err(|e| parse_error(e.to_string()))?;
    let output: ProbeOutput = match value {
        Value::Null => ProbeOutput::default(),
        Value::Mapping(_) => serde_yaml::from_value(value).map_err(|e| parse_error(e.to_string()))?,
        _ => return Err(parse_error("expected a mapping".to_string())),
    };

    match output.assembly {
        None | Some(Value::Null) => Ok(String::new()),
        Some(Value::String(s)) => Ok(s),
        Some(Value::Number(n)) => Ok(n.to_string()),
        Some(_) => Err(parse_error("`assembly` must be a string".to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::graph::{FileAction, Op};
    use crate::sources::LocalSource;
    use crate::test_support::MockGateway;

    fn context() -> State {
        State::local(LocalSource::new("context", "s1"))
    }

    #[test]
    fn test_parse_probe_output() {
        assert_eq!(parse_probe_output(b"assembly: \"svc.dll\"\n").unwrap(), "svc.dll");
        assert_eq!(parse_probe_output(b"Assembly: svc.dll").unwrap(), "svc.dll");
        assert_eq!(parse_probe_output(b"").unwrap(), "");
        assert!(matches!(
            parse_probe_output(b"assembly: [x"),
            Err(FrontendError::ProbeOutputParseError { .. })
        ));
        assert!(matches!(
            parse_probe_output(b"just text"),
            Err(FrontendError::ProbeOutputParseError { .. })
        ));
    }

    #[test]
    fn test_probe_state_extends_source_prefix() {
        let gateway = MockGateway::new();
        let session = Session::new("s1");
        let config = FrontendConfig::default();
        let probe = MetadataProbe::new(&gateway, &session, &config);

        let state = probe.probe_state(&context(), "svc.csproj").unwrap();
        let def = Definition::marshal(&state, &config.platform).unwrap();
        let prefix = StagePlan::prepare_source("svc.csproj", &context(), &config);

        let chain = def.primary_chain();
        assert_eq!(chain.len(), 7);
        assert_eq!(chain[3].digest, prefix.digest());

        match &chain[4].op {
            Op::File { actions } => {
                assert_eq!(
                    actions[0],
                    FileAction::Mkdir {
                        path: "/meta".to_string(),
                        mode: 0o600
                    }
                )
            }
            other => panic!("unexpected op {:?}", other),
        }
        match &chain[5].op {
            Op::File { actions } => match &actions[0] {
                FileAction::Mkfile { path, data, .. } => {
                    assert_eq!(path, "/meta/GetProjectProperties.targets");
                    assert!(String::from_utf8_lossy(data).contains("GetProjectProperties"));
                }
                other => panic!("unexpected action {:?}", other),
            },
            other => panic!("unexpected op {:?}", other),
        }
        match &chain[6].op {
            Op::Exec { exec } => {
                assert_eq!(exec.args.first().map(String::as_str), Some("dotnet"));
                assert_eq!(exec.args.last().map(String::as_str), Some("svc.csproj"));
                assert!(exec.args.contains(&"/p:InfoOutputPath=/app/meta.out".to_string()));
            }
            other => panic!("unexpected op {:?}", other),
        }
    }

    #[test]
    fn test_run_reads_back_output() {
        let gateway = MockGateway::new().with_solve_output("/app/meta.out", "assembly: \"svc.dll\"\n");
        let session = Session::new("s1");
        let config = FrontendConfig::default();

        let assembly = MetadataProbe::new(&gateway, &session, &config)
            .run(&context(), "svc.csproj")
            .unwrap();
        assert_eq!(assembly, "svc.dll");
        assert_eq!(gateway.solved().len(), 1);
    }

    #[test]
    fn test_run_submission_failure() {
        let gateway = MockGateway::new().fail_solve("executor offline");
        let session = Session::new("s1");
        let config = FrontendConfig::default();

        let err = MetadataProbe::new(&gateway, &session, &config)
            .run(&context(), "svc.csproj")
            .unwrap_err();
        assert!(matches!(err, FrontendError::ProbeExecutionError { ref reason } if reason.contains("executor offline")));
    }

    #[test]
    fn test_run_missing_output() {
        let gateway = MockGateway::new();
        let session = Session::new("s1");
        let config = FrontendConfig::default();

        let err = MetadataProbe::new(&gateway, &session, &config)
            .run(&context(), "svc.csproj")
            .unwrap_err();
        assert!(matches!(err, FrontendError::ProbeOutputMissing { ref path, .. } if path == "/app/meta.out"));
    }

    #[test]
    fn test_run_cancelled_before_submission() {
        let gateway = MockGateway::new();
        let session = Session::new("s1");
        session.cancel();
        let config = FrontendConfig::default();

        let err = MetadataProbe::new(&gateway, &session, &config)
            .run(&context(), "svc.csproj")
            .unwrap_err();
        assert!(matches!(err, FrontendError::Cancelled));
        assert!(gateway.solved().is_empty());
    }
}
