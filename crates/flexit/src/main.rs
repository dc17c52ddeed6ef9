mod cli;
mod commands;
mod config;
mod error;
mod output;

use clap::parser::ValueSource;
use clap::{ArgMatches, CommandFactory, FromArgMatches, ValueEnum};
use tracing_subscriber::EnvFilter;

use flexit_core::FlexitConfig;

use crate::cli::{Cli, ColorMode, Command, GlobalOpts, OutputFormat};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    let matches = Cli::command().get_matches();
    let mut cli = Cli::from_arg_matches(&matches).unwrap_or_else(|e| e.exit());

    init_tracing(cli.global.verbose);
    apply_config_defaults(&mut cli.global, &matches);

    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        // Config commands never touch the cloud
        Command::Config(args) => commands::config_cmd::handle(args, &cli.global),

        Command::Completions(args) => {
            use clap_complete::generate;

            let mut cmd = Cli::command();
            generate(args.shell, &mut cmd, "flexit", &mut std::io::stdout());
            Ok(())
        }

        cmd => {
            let flexit_config = build_flexit_config(&cli.global)?;
            tracing::debug!(command = ?cmd, "dispatching command");
            commands::dispatch(cmd, flexit_config, &cli.global).await
        }
    }
}

/// Fill `--output` / `--color` from `[defaults]` when neither the flag nor
/// its env var was given.
fn apply_config_defaults(global: &mut GlobalOpts, matches: &ArgMatches) {
    let from_default = |id: &str| matches.value_source(id) == Some(ValueSource::DefaultValue);
    if !from_default("output") && !from_default("color") {
        return;
    }

    let defaults = config::load_config_or_default().defaults;
    if from_default("output") {
        match OutputFormat::from_str(&defaults.output, true) {
            Ok(format) => global.output = format,
            Err(_) => tracing::warn!(value = %defaults.output, "ignoring invalid defaults.output"),
        }
    }
    if from_default("color") {
        match ColorMode::from_str(&defaults.color, true) {
            Ok(mode) => global.color = mode,
            Err(_) => tracing::warn!(value = %defaults.color, "ignoring invalid defaults.color"),
        }
    }
}

/// Build a `FlexitConfig` from the config file, profile, and CLI overrides.
fn build_flexit_config(global: &cli::GlobalOpts) -> Result<FlexitConfig, CliError> {
    let cfg = config::load_config_or_default();
    let profile_name = config::active_profile_name(global, &cfg);

    if let Some(profile) = cfg.profiles.get(&profile_name) {
        return config::resolve_profile(profile, &profile_name, &cfg.defaults, global)
            .map_err(|e| e.with_profile(&profile_name));
    }

    // An explicitly requested profile must exist
    if global.profile.is_some() && global.username.is_none() {
        return Err(CliError::ProfileNotFound {
            name: profile_name,
            available: if cfg.profiles.is_empty() {
                "(none)".into()
            } else {
                cfg.profiles.keys().cloned().collect::<Vec<_>>().join(", ")
            },
        });
    }

    config::config_from_flags(global, &profile_name).map_err(|e| e.with_profile(&profile_name))
}
