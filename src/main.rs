//! Apertium Native - command line front end
//!
//! Runs setup on every start, the same way a host would when loading the
//! plugin, then executes the requested command.

use anyhow::Result;
use clap::Parser;
use std::io::Read;
use std::path::Path;
use tracing::{info, warn, Level};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use tracing_appender::{non_blocking, rolling};

use apertium_native::cli::{Args, Commands};
use apertium_native::config::Config;
use apertium_native::installer::ScriptInstaller;
use apertium_native::language::language_name;
use apertium_native::settings::FileSettings;
use apertium_native::setup::default_data_dir;
use apertium_native::ApertiumNative;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = match &args.config {
        Some(config_path) => Config::from_file(config_path)?,
        None => {
            if Path::new("config.toml").exists() {
                Config::from_file("config.toml")?
            } else {
                Config::default()
            }
        }
    };

    let data_dir = match &config.data_dir {
        Some(dir) => dir.clone(),
        None => default_data_dir()?,
    };
    setup_logging(args.verbose, &data_dir.join("log"))?;

    let settings = FileSettings::open(config.settings_path())?;
    info!("Using settings file {}", settings.path().display());

    let mut native = ApertiumNative::new(config, settings);
    let outcome = native.init()?;

    match args.command {
        Commands::Setup => {
            println!("Root:            {}", outcome.root.display());
            println!("OS:              {}", outcome.profile.os);
            println!("Package manager: {}", outcome.profile.pkg);
            println!("Modes:           {}", native.modes().len());
        }
        Commands::Modes { json } => {
            let modes = native.modes();
            if json {
                let list: Vec<_> = modes.iter().collect();
                println!("{}", serde_json::to_string_pretty(&list)?);
            } else if modes.is_empty() {
                println!("No modes installed.");
            } else {
                println!("{:<12} {:<40} {:<20}", "Pair", "Languages", "File");
                println!("{}", "-".repeat(72));
                for mode in modes.iter() {
                    let languages = format!(
                        "{} → {}",
                        language_name(&mode.source).unwrap_or(mode.source.as_str()),
                        language_name(&mode.target).unwrap_or(mode.target.as_str())
                    );
                    println!("{:<12} {:<40} {:<20}", mode.pair_key, languages, mode.file_name);
                }
            }
        }
        Commands::Translate { source, target, text, strict } => {
            let text = match text {
                Some(text) => text,
                None => {
                    let mut buffer = String::new();
                    std::io::stdin().read_to_string(&mut buffer)?;
                    buffer
                }
            };

            let translation = if strict {
                native.translate_checked(&source, &target, &text).await?
            } else {
                native.translate(&source, &target, &text).await?
            };
            print!("{}", translation);
        }
        Commands::Install { script } => {
            let installer = ScriptInstaller::new(script);
            let count = native.reinstall(&installer).await?;
            if count == 0 {
                warn!("Installation finished but no modes were found");
            }
            println!("Installed modes: {}", count);
        }
    }

    Ok(())
}

/// Setup logging to console and, when the log folder can be created, to file.
///
/// A data folder that cannot be created is reported by setup, so logging only
/// warns about it here.
fn setup_logging(verbose: bool, log_dir: &Path) -> Result<()> {
    let log_level = if verbose { Level::DEBUG } else { Level::INFO };

    // Console output goes to stderr so translations on stdout stay clean
    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_file(true)
        .with_line_number(true);

    let (file_layer, file_error) = match std::fs::create_dir_all(log_dir) {
        Ok(()) => {
            // Set up file appender with daily rotation
            let file_appender = rolling::daily(log_dir, "apertium-native.log");
            let (non_blocking_file, guard) = non_blocking(file_appender);
            // Keep the guard alive for the duration of the program
            std::mem::forget(guard);

            let layer = fmt::layer()
                .with_writer(non_blocking_file)
                .with_target(false)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true)
                .with_ansi(false);
            (Some(layer), None)
        }
        Err(e) => (None, Some(e)),
    };

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    match file_error {
        None => info!("Logging initialized - console: {}, file: {}",
                      log_level, log_dir.join("apertium-native.log").display()),
        Some(e) => warn!("Logging to console only, cannot create {}: {}", log_dir.display(), e),
    }

    Ok(())
}
