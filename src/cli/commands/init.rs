//! Init and Config commands.

use std::path::Path;

use anyhow::{Context, bail};

use crate::config::Settings;

/// Run init command - create configuration file.
pub fn run_init(config_path: &Path, force: bool) -> anyhow::Result<()> {
    if config_path.exists() && !force {
        bail!(
            "Configuration file already exists at: {}\nUse --force to overwrite",
            config_path.display()
        );
    }

    let path = Settings::init_config_file(config_path, force)
        .with_context(|| format!("creating {}", config_path.display()))?;
    println!("Created configuration file at: {}", path.display());
    println!("Edit this file to customize your settings.");
    Ok(())
}

/// Run config command - display current configuration.
pub fn run_config(config: &Settings) -> anyhow::Result<()> {
    println!("Current Configuration:");
    println!("{}", "=".repeat(50));
    println!("{}", toml::to_string_pretty(config)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_init_refuses_to_overwrite_without_force() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(".songdex/settings.toml");

        run_init(&path, false).unwrap();
        assert!(path.is_file());
        assert!(run_init(&path, false).is_err());
        run_init(&path, true).unwrap();
    }
}
