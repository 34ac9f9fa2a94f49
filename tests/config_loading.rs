// tests/config_loading.rs

use std::io::Write;

use tempfile::NamedTempFile;
use mqtt_exec::config::load_and_validate;
use mqtt_exec::errors::DispatchError;

#[test]
fn loads_entries_keyed_by_name() {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
[entry.build]
topic = "ci/build"
command = "/usr/bin/make"
args = ["-j4", "all"]
working_directory = "/srv/project"
qos = 1

[entry.notify]
topic = "alerts/#"
command = "notify-send"
multiple_instance = true
"#
    )
    .unwrap();

    let cfg = load_and_validate(file.path()).unwrap();

    let names: Vec<_> = cfg.entry.keys().cloned().collect();
    assert_eq!(names, vec!["build".to_string(), "notify".to_string()]);

    let build = &cfg.entry["build"];
    assert_eq!(build.args, vec!["-j4".to_string(), "all".to_string()]);
    assert_eq!(build.qos, Some(1));
    assert!(!build.allow_concurrent);

    assert!(cfg.entry["notify"].allow_concurrent);
}

#[test]
fn accepts_lowercased_legacy_keys() {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
[entry.backup]
topic = "nightly/backup"
command = "rsync"
workingdirectory = "/var/backups"
multipleinstance = true
"#
    )
    .unwrap();

    let cfg = load_and_validate(file.path()).unwrap();
    let backup = &cfg.entry["backup"];

    assert!(backup.allow_concurrent);
    assert_eq!(
        backup.working_directory.as_deref(),
        Some(std::path::Path::new("/var/backups"))
    );
}

#[test]
fn file_without_entries_is_valid_and_empty() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "# nothing configured yet").unwrap();

    let cfg = load_and_validate(file.path()).unwrap();
    assert!(cfg.is_empty());
}

#[test]
fn missing_file_returns_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let result = load_and_validate(dir.path().join("nope.toml"));

    match result {
        Err(DispatchError::IoError(_)) => {}
        Err(e) => panic!("Expected IoError, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn malformed_toml_returns_toml_error() {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
[entry.build]
topic = "ci/build"
"#
    )
    .unwrap();

    // `command` is required.
    match load_and_validate(file.path()) {
        Err(DispatchError::TomlError(_)) => {}
        Err(e) => panic!("Expected TomlError, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn invalid_topic_filter_returns_config_error() {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
[entry.bad]
topic = "a/#/b"
command = "true"
"#
    )
    .unwrap();

    match load_and_validate(file.path()) {
        Err(DispatchError::ConfigError(msg)) => {
            assert!(msg.contains("bad"));
            assert!(msg.contains("a/#/b"));
        }
        Err(e) => panic!("Expected ConfigError, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}
