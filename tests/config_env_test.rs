use songdex::Settings;
use std::env;
use tempfile::TempDir;

#[test]
fn test_env_override_with_custom_format() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("settings.toml");
    std::fs::write(
        &config_path,
        "[indexing]\nparallel_threads = 3\n\n[logging]\ndefault = \"info\"\n",
    )
    .unwrap();

    unsafe {
        // Use double underscore to separate nested levels
        env::set_var("SONGDEX_INDEXING__PARALLEL_THREADS", "42");
        env::set_var("SONGDEX_INDEXING__FOLLOW_LINKS", "true");
    }

    let settings = Settings::load_from(&config_path).unwrap();

    unsafe {
        env::remove_var("SONGDEX_INDEXING__PARALLEL_THREADS");
        env::remove_var("SONGDEX_INDEXING__FOLLOW_LINKS");
    }

    // Env beats the file, the file beats defaults
    assert_eq!(settings.indexing.parallel_threads, 42);
    assert!(settings.indexing.follow_links);
    assert_eq!(settings.logging.default, "info");
    assert_eq!(settings.indexing.descriptor_files, vec!["Info.dat", "info.dat"]);
}
