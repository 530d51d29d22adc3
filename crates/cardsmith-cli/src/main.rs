//! Cardsmith CLI - Generate flashcards from study notes.

use anyhow::Context;
use cardsmith_cli::commands;
use cardsmith_cli::{Cli, Command, Config, Formatter};
use clap::Parser;
use tracing_subscriber::EnvFilter;

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config_path = Config::resolve_path(cli.config.as_deref())?;
    let mut config = Config::load(&config_path)
        .with_context(|| format!("Failed to load {}", config_path.display()))?;

    // Override profile if specified
    if let Some(profile_name) = cli.profile {
        config.switch_profile(profile_name)?;
    }

    // Determine output format
    let format = cli
        .format
        .map(Into::into)
        .unwrap_or(config.settings.format);

    // Determine color setting
    let color_enabled = !cli.no_color && config.settings.color;

    let formatter = Formatter::new(format, color_enabled);

    match cli.command {
        Command::Generate(args) => commands::execute_generate(args, &config, &formatter)?,
        Command::Stats(args) => commands::execute_stats(args, &formatter)?,
        Command::Export(args) => commands::execute_export(args, &formatter)?,
        Command::Profile(args) => commands::execute_profile(args, &mut config, &config_path, &formatter)?,
        Command::Config(args) => commands::execute_config(args, &config, &config_path)?,
    }

    Ok(())
}
