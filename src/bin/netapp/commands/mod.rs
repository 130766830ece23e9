//! Command implementations

pub mod completions;
pub mod plan;
pub mod resolve;

use std::path::Path;

use anyhow::{bail, Result};

use netapp::core::options::{
    is_known_key, BuildOpts, KEY_ASSEMBLY, KEY_CONFIGURATION, KEY_FILENAME, KEY_PROJECT,
};
use netapp::util::diagnostic::{emit, Diagnostic};
use netapp::{FrontendConfig, GlobalContext, LocalGateway};

use crate::cli::BuildArgs;

/// Everything a build command needs to run against local directories.
pub struct LocalBuild {
    pub ctx: GlobalContext,
    pub config: FrontendConfig,
    pub opts: BuildOpts,
    pub gateway: LocalGateway,
}

impl LocalBuild {
    /// Load configuration and map the local directories onto sources.
    ///
    /// `--opt` keys the frontend never reads are reported as warnings.
    pub fn new(args: &BuildArgs, config_file: Option<&Path>, color: bool) -> Result<Self> {
        let ctx = GlobalContext::new()?;
        let config = ctx.load_config(config_file)?;

        let context = ctx.resolve_path(&args.context);
        let dockerfile = args
            .dockerfile
            .as_ref()
            .map(|d| ctx.resolve_path(d))
            .unwrap_or_else(|| context.clone());

        for (name, dir) in [("context", &context), ("dockerfile", &dockerfile)] {
            if !dir.is_dir() {
                bail!("{} directory `{}` does not exist", name, dir.display());
            }
        }

        for (key, _) in args.opts.iter().filter(|(k, _)| !is_known_key(k)) {
            emit(&Diagnostic::warning(format!("unused option `{}`", key)), color);
        }

        // Raw options first, so the dedicated flags win.
        let mut opts = BuildOpts::new(&args.session).extend(args.opts.iter().cloned());
        for (key, value) in [
            (KEY_FILENAME, &args.filename),
            (KEY_PROJECT, &args.project),
            (KEY_CONFIGURATION, &args.configuration),
            (KEY_ASSEMBLY, &args.assembly),
        ] {
            if let Some(value) = value {
                opts = opts.with(key, value.as_str());
            }
        }

        let gateway = LocalGateway::new()
            .register_local(opts.context_name(&config), context)
            .register_local(opts.dockerfile_name(&config), dockerfile);

        Ok(LocalBuild {
            ctx,
            config,
            opts,
            gateway,
        })
    }
}
