// src/config/validate.rs

use crate::bus::router::is_valid_filter;
use crate::config::model::{ConfigFile, EntryConfig, RawConfigFile};
use crate::errors::{DispatchError, Result};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = DispatchError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw.entry))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    for (name, entry) in cfg.entry.iter() {
        validate_entry(name, entry)?;
    }
    Ok(())
}

fn validate_entry(name: &str, entry: &EntryConfig) -> Result<()> {
    if entry.topic.is_empty() {
        return Err(DispatchError::ConfigError(format!(
            "entry '{}' has an empty `topic`",
            name
        )));
    }
    if !is_valid_filter(&entry.topic) {
        return Err(DispatchError::ConfigError(format!(
            "entry '{}' has invalid topic filter '{}'",
            name, entry.topic
        )));
    }
    if entry.command.trim().is_empty() {
        return Err(DispatchError::ConfigError(format!(
            "entry '{}' has an empty `command`",
            name
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(toml_src: &str) -> RawConfigFile {
        toml::from_str(toml_src).unwrap()
    }

    #[test]
    fn empty_document_is_a_valid_empty_config() {
        let cfg = ConfigFile::try_from(raw("")).unwrap();
        assert!(cfg.is_empty());
    }

    #[test]
    fn defaults_are_applied() {
        let cfg = ConfigFile::try_from(raw(
            r#"
[entry.build]
topic = "ci/build"
command = "make"
"#,
        ))
        .unwrap();

        let e = &cfg.entry["build"];
        assert!(e.args.is_empty());
        assert!(e.working_directory.is_none());
        assert!(!e.allow_concurrent);
        assert_eq!(e.qos, None);
    }

    #[test]
    fn multiple_instance_is_an_alias_for_allow_concurrent() {
        let cfg = ConfigFile::try_from(raw(
            r#"
[entry.notify]
topic = "alerts/#"
command = "notify-send"
multiple_instance = true
"#,
        ))
        .unwrap();
        assert!(cfg.entry["notify"].allow_concurrent);
    }

    #[test]
    fn out_of_range_qos_is_not_a_config_error() {
        let cfg = ConfigFile::try_from(raw(
            r#"
[entry.a]
topic = "a"
command = "true"
qos = 7
"#,
        ))
        .unwrap();
        assert_eq!(cfg.entry["a"].qos, Some(7));
    }

    #[test]
    fn empty_command_is_rejected() {
        let err = ConfigFile::try_from(raw(
            r#"
[entry.a]
topic = "a"
command = "  "
"#,
        ))
        .unwrap_err();

        match err {
            DispatchError::ConfigError(msg) => assert!(msg.contains("empty `command`")),
            other => panic!("expected ConfigError, got {other:?}"),
        }
    }

    #[test]
    fn malformed_filter_is_rejected() {
        let err = ConfigFile::try_from(raw(
            r#"
[entry.a]
topic = "sensors/#/temp"
command = "true"
"#,
        ))
        .unwrap_err();

        match err {
            DispatchError::ConfigError(msg) => {
                assert!(msg.contains("invalid topic filter"));
                assert!(msg.contains("sensors/#/temp"));
            }
            other => panic!("expected ConfigError, got {other:?}"),
        }
    }
}
