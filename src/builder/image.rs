//! Image configuration synthesis.
//!
//! The produced image runs the published assembly with the runtime image's
//! launcher. Its environment and exposed ports come from the runtime image's
//! live config, fetched through the gateway on every build.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::builder::executor::{Gateway, Session};
use crate::core::error::{FrontendError, Result};
use crate::util::config::FrontendConfig;

/// OCI image configuration of the produced image.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageConfig {
    pub architecture: String,
    pub os: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant: Option<String>,
    pub config: ContainerConfig,
}

/// Runtime settings of a container.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ContainerConfig {
    #[serde(default)]
    pub entrypoint: Vec<String>,

    #[serde(default)]
    pub env: Vec<String>,

    #[serde(default, with = "port_set")]
    pub exposed_ports: BTreeSet<String>,

    #[serde(default)]
    pub working_dir: String,
}

/// The parts of a base image config the synthesizer reads.
///
/// Every field is optional; images without a config section are valid.
#[derive(Debug, Default, Deserialize)]
struct BaseImage {
    #[serde(default)]
    config: Option<BaseContainerConfig>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct BaseContainerConfig {
    #[serde(default)]
    env: Option<Vec<String>>,

    #[serde(default, deserialize_with = "port_set::deserialize_opt")]
    exposed_ports: Option<BTreeSet<String>>,
}

impl ImageConfig {
    /// Serialize as compact JSON for result metadata.
    pub fn to_json(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }
}

/// Build the image config for an assembly on top of the runtime image.
pub fn synthesize<G: Gateway>(
    assembly: &str,
    gateway: &G,
    session: &Session,
    config: &FrontendConfig,
) -> Result<ImageConfig> {
    let image = config.runtime_image.as_str();
    let resolution_error = |reason: String| FrontendError::ImageConfigResolutionError {
        image: image.to_string(),
        reason,
    };

    session.check().map_err(|_| FrontendError::Cancelled)?;
    let raw = gateway
        .resolve_image_config(image, &config.platform)
        .map_err(|e| FrontendError::from_gateway(e, |e| resolution_error(e.to_string())))?;

    let base: BaseImage =
        serde_json::from_slice(&raw).map_err(|e| resolution_error(e.to_string()))?;
    let base = base.config.unwrap_or_default();

    let mut exposed_ports = base.exposed_ports.unwrap_or_default();
    exposed_ports.insert(config.exposed_port.clone());

    tracing::debug!(
        image,
        env = base.env.as_ref().map_or(0, Vec::len),
        ports = exposed_ports.len(),
        "resolved runtime image config"
    );

    Ok(ImageConfig {
        architecture: config.platform.architecture.clone(),
        os: config.platform.os.clone(),
        variant: config.platform.variant.clone(),
        config: ContainerConfig {
            entrypoint: vec![config.launcher.clone(), assembly.to_string()],
            env: base.env.unwrap_or_default(),
            exposed_ports,
            working_dir: config.app_dir.clone(),
        },
    })
}

/// `ExposedPorts` is a JSON object whose keys are the ports and whose values are `{}`.
mod port_set {
    use std::collections::{BTreeMap, BTreeSet};

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    #[derive(Serialize, Deserialize)]
    struct Empty {}

    pub fn serialize<S: Serializer>(ports: &BTreeSet<String>, s: S) -> Result<S::Ok, S::Error> {
        let map: BTreeMap<&str, Empty> = ports.iter().map(|p| (p.as_str(), Empty {})).collect();
        map.serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<BTreeSet<String>, D::Error> {
        Ok(deserialize_opt(d)?.unwrap_or_default())
    }

    pub fn deserialize_opt<'de, D: Deserializer<'de>>(
        d: D,
    ) -> Result<Option<BTreeSet<String>>, D::Error> {
        let map: Option<BTreeMap<String, serde::de::IgnoredAny>> = Option::deserialize(d)?;
        Ok(map.map(|m| m.into_keys().collect()))
    }
}
