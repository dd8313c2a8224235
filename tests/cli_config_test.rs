use std::process::Command;
use tempfile::TempDir;

fn songdex(dir: &std::path::Path) -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_songdex"));
    command.current_dir(dir);
    command
}

#[test]
fn test_init_command() {
    let temp_dir = TempDir::new().unwrap();
    let temp_path = temp_dir.path();

    let output = songdex(temp_path)
        .arg("init")
        .output()
        .expect("Failed to run init command");
    assert!(output.status.success());

    let config_path = temp_path.join(".songdex/settings.toml");
    assert!(config_path.exists());

    let content = std::fs::read_to_string(&config_path).unwrap();
    assert!(content.contains("version = 1"));
    assert!(content.contains("[songs]"));
    assert!(content.contains("[indexing]"));

    // A second init without --force fails
    let output = songdex(temp_path).arg("init").output().unwrap();
    assert!(!output.status.success());
}

#[test]
fn test_config_command() {
    let temp_dir = TempDir::new().unwrap();
    let temp_path = temp_dir.path();

    let config_dir = temp_path.join(".songdex");
    std::fs::create_dir_all(&config_dir).unwrap();
    let config_content = r#"
version = 2
[indexing]
parallel_threads = 99
"#;
    std::fs::write(config_dir.join("settings.toml"), config_content).unwrap();

    let output = songdex(temp_path)
        .arg("config")
        .output()
        .expect("Failed to run config command");
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("version = 2"));
    assert!(stdout.contains("parallel_threads = 99"));
}

#[test]
fn test_refresh_and_list_commands() {
    let temp_dir = TempDir::new().unwrap();
    let temp_path = temp_dir.path();
    let stable = temp_path.join("levels");
    let wip = temp_path.join("wip");

    let level = stable.join("MySong");
    std::fs::create_dir_all(&level).unwrap();
    std::fs::write(
        level.join("Info.dat"),
        r#"{"_songName": "My Song", "_songAuthorName": "Someone"}"#,
    )
    .unwrap();

    let config_dir = temp_path.join(".songdex");
    std::fs::create_dir_all(&config_dir).unwrap();
    let config_content = format!(
        "[songs]\nroot_level_paths = []\nroot_wip_level_paths = []\n\
         preferred_level_path = {:?}\npreferred_wip_level_path = {:?}\n",
        stable.display().to_string(),
        wip.display().to_string()
    );
    std::fs::write(config_dir.join("settings.toml"), config_content).unwrap();

    let output = songdex(temp_path).args(["refresh", "--full"]).output().unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("Loaded:     1"));
    // The preferred WIP directory is created on demand
    assert!(wip.is_dir());

    let output = songdex(temp_path).arg("list").output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("Custom Levels (1 levels)"));
    assert!(stdout.contains("My Song - Someone"));

    let output = songdex(temp_path)
        .args(["find", "--path"])
        .arg(&level)
        .output()
        .unwrap();
    assert!(output.status.success());
    assert!(String::from_utf8(output.stdout).unwrap().contains("custom_level_"));
}

#[test]
fn test_add_path_keeps_broken_config_intact() {
    let temp_dir = TempDir::new().unwrap();
    let temp_path = temp_dir.path();

    let config_dir = temp_path.join(".songdex");
    std::fs::create_dir_all(&config_dir).unwrap();
    let config_path = config_dir.join("settings.toml");
    let config_content = "[songs]\nroot_level_paths = [\"/my/levels\"]\npreferred_level_path = 5\n";
    std::fs::write(&config_path, config_content).unwrap();

    let output = songdex(temp_path)
        .args(["add-path", "extra"])
        .output()
        .unwrap();
    assert!(!output.status.success());
    assert_eq!(std::fs::read_to_string(&config_path).unwrap(), config_content);
}

#[test]
fn test_find_with_relative_roots() {
    let temp_dir = TempDir::new().unwrap();
    let temp_path = temp_dir.path();

    let level = temp_path.join("levels").join("Relative");
    std::fs::create_dir_all(&level).unwrap();
    std::fs::write(level.join("Info.dat"), r#"{"_songName": "Relative"}"#).unwrap();

    let config_dir = temp_path.join(".songdex");
    std::fs::create_dir_all(&config_dir).unwrap();
    std::fs::write(
        config_dir.join("settings.toml"),
        "[songs]\nroot_level_paths = [\"levels\"]\nroot_wip_level_paths = []\n\
         preferred_level_path = \"levels\"\npreferred_wip_level_path = \"wip\"\n",
    )
    .unwrap();

    let output = songdex(temp_path)
        .args(["find", "--path", "levels/Relative"])
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert!(String::from_utf8(output.stdout).unwrap().contains("Relative"));
}
