use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use songdex::cli::commands::{directories, init, levels};
use songdex::cli::{Cli, Commands};
use songdex::{Settings, SettingsStore, SongLoader, logging};

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config_path = cli
        .config
        .clone()
        .or_else(Settings::find_workspace_config)
        .unwrap_or_else(Settings::default_config_path);

    if let Commands::Init { force } = cli.command {
        return init::run_init(&config_path, force);
    }

    let (mut settings, loaded) = match Settings::load_from(&config_path) {
        Ok(settings) => (settings, true),
        Err(e) => {
            eprintln!("Configuration error: {e}");
            (Settings::default(), false)
        }
    };
    if cli.info {
        settings.logging.default = "info".to_string();
    }
    logging::init_with_config(&settings.logging);

    if matches!(cli.command, Commands::Config) {
        return init::run_config(&settings);
    }

    // Defaults must never overwrite a settings file that failed to load
    let store = if loaded {
        SettingsStore::new(settings, PathBuf::from(&config_path))
    } else if matches!(cli.command, Commands::AddPath { .. } | Commands::RemovePath { .. }) {
        anyhow::bail!(
            "{} could not be loaded, fix it before changing level paths",
            config_path.display()
        );
    } else {
        SettingsStore::in_memory(settings)
    };
    let store = Arc::new(store);
    let loader = || SongLoader::new(Arc::clone(&store));
    match cli.command {
        Commands::Init { .. } | Commands::Config => Ok(()),
        Commands::AddPath { path, wip } => directories::run_add_path(&store, &path, wip),
        Commands::RemovePath { path, wip } => directories::run_remove_path(&store, &path, wip),
        Commands::ListPaths => {
            directories::run_list_paths(&store);
            Ok(())
        }
        Commands::Refresh { full } => levels::run_refresh(&loader(), full, cli.info),
        Commands::List { wip } => levels::run_list(&loader(), wip),
        Commands::Find { id, hash, path } => {
            levels::run_find(&loader(), id.as_deref(), hash.as_deref(), path.as_deref())
        }
        Commands::Delete { path } => levels::run_delete(&loader(), &path),
    }
}
