use anyhow::Result;
use ctxprop_cli::{build_tracer, command, render_summary, CliOptions};
use ctxprop_core::init_tracing;
use tracing::debug;

fn main() -> Result<()> {
    // Initialize logging
    init_tracing();

    // Wrong usage prints the usage text and exits non-zero
    let matches = command().get_matches();
    let options = CliOptions::from_matches(&matches)?;
    let config = options.to_config()?;
    debug!(?config, "configuration");

    let dry_run = config.dry_run;
    let mut tracer = build_tracer(config)?;
    let summary = tracer.transform_directory(&options.directory)?;

    println!();
    println!("{}", render_summary(&summary, dry_run));
    Ok(())
}
