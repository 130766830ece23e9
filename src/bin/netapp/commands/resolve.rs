//! `netapp resolve` command
//!
//! Loads the manifest from local directories and prints the parameters the
//! build would run with.

use std::path::Path;

use anyhow::Result;

use netapp::ops::resolve_parameters;
use netapp::Session;

use crate::cli::ResolveArgs;
use crate::commands::LocalBuild;

pub fn execute(args: ResolveArgs, config_file: Option<&Path>, color: bool) -> Result<()> {
    let local = LocalBuild::new(&args.build, config_file, color)?;
    let session = Session::new(local.opts.session_id());

    let params = resolve_parameters(&local.gateway, &session, &local.opts, &local.config)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&params)?);
        return Ok(());
    }

    let (project, configuration, assembly) = params.origins();
    println!("{:>14}: {} ({})", "project", params.project(), project);
    println!("{:>14}: {} ({})", "configuration", params.configuration(), configuration);
    println!("{:>14}: {} ({})", "assembly", params.assembly(), assembly);

    Ok(())
}
