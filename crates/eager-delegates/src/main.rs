use std::{
    io::{self, Write},
    path::PathBuf,
    process::ExitCode,
};

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use eager_delegates::{BuildManifest, DelegateModulesPlugin, DelegateOptions, OptimizeOutcome};
use log::{LevelFilter, error, info};

#[derive(Parser, Debug)]
#[command(
    name = "eager-delegates",
    version,
    about = "Place delegate modules and their dependencies into runtime chunks"
)]
struct Cli {
    /// Build manifest (TOML) describing modules, chunks and plugin options
    manifest: PathBuf,

    /// Standalone options file, replacing the manifest's [options] table
    #[arg(short, long)]
    options: Option<PathBuf>,

    /// Log every attach/detach decision
    #[arg(long)]
    debug: bool,

    /// Increase verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let loaded = load(&cli);
    // Options can only turn on debug output once they are loaded
    let debug = loaded.as_ref().is_ok_and(|(_, options)| options.debug);
    init_logging(cli.verbose, debug);

    match loaded.and_then(|(manifest, options)| run(&manifest, options)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: u8, debug: bool) {
    let level = default_log_level(verbose, debug);
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level.as_str()))
        .format_timestamp(None)
        .init();
}

/// Verbosity picks the level; the `debug` option never lets it drop below debug
fn default_log_level(verbose: u8, debug: bool) -> LevelFilter {
    let from_verbosity = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    if debug {
        from_verbosity.max(LevelFilter::Debug)
    } else {
        from_verbosity
    }
}

fn load(cli: &Cli) -> Result<(BuildManifest, DelegateOptions)> {
    let manifest = BuildManifest::load(&cli.manifest)?;
    let mut options = match &cli.options {
        Some(path) => DelegateOptions::load(path)?,
        None => manifest.options.clone(),
    };
    options.debug |= cli.debug;
    Ok((manifest, options))
}

fn run(manifest: &BuildManifest, options: DelegateOptions) -> Result<()> {
    let mut compilation = manifest.to_compilation()?;
    let mut plugin = DelegateModulesPlugin::new(options);
    match compilation.run(&mut plugin)? {
        OptimizeOutcome::Skipped(reason) => info!("Delegate placement skipped: {reason:?}"),
        OptimizeOutcome::Applied {
            targets,
            attached,
            pruned,
        } => info!(
            "Placed {} delegate(s) into {targets} chunk(s): {attached} added, {pruned} pruned",
            plugin.registry().len()
        ),
    }

    let mut stdout = io::stdout().lock();
    stdout
        .write_all(compilation.placement_report().as_bytes())
        .context("Failed to write placement report")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_verbosity_levels() {
        assert_eq!(default_log_level(0, false), LevelFilter::Warn);
        assert_eq!(default_log_level(1, false), LevelFilter::Info);
        assert_eq!(default_log_level(2, false), LevelFilter::Debug);
        assert_eq!(default_log_level(5, false), LevelFilter::Trace);
    }

    #[test]
    fn test_debug_option_keeps_diagnostics_visible() {
        assert_eq!(default_log_level(0, true), LevelFilter::Debug);
        assert_eq!(default_log_level(1, true), LevelFilter::Debug);
        assert_eq!(default_log_level(3, true), LevelFilter::Trace);
    }
}
