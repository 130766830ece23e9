//! `netapp plan` command
//!
//! Runs a full build against local directories without executing anything and
//! prints the main stage graph together with the synthesized image config.

use std::path::Path;

use anyhow::{bail, Result};
use serde_json::json;

use netapp::ops::build;
use netapp::Session;

use crate::cli::PlanArgs;
use crate::commands::LocalBuild;

pub fn execute(args: PlanArgs, config_file: Option<&Path>, color: bool) -> Result<()> {
    let mut local = LocalBuild::new(&args.build, config_file, color)?;

    let runtime_config = local.ctx.resolve_path(&args.runtime_config);
    if !runtime_config.is_file() {
        bail!("runtime config `{}` does not exist", runtime_config.display());
    }
    local.gateway = local
        .gateway
        .register_image_config(&local.config.runtime_image, runtime_config);

    let session = Session::new(local.opts.session_id());
    let result = build(&local.gateway, &session, &local.opts, &local.config)?;

    tracing::debug!(
        nodes = result.definition.len(),
        submitted = local.gateway.solved().len(),
        "planned build"
    );

    let output = json!({
        "parameters": result.params,
        "definition": result.definition,
        "image": result.image,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);

    Ok(())
}
