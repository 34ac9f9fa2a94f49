#![allow(dead_code)]

use std::collections::BTreeMap;
use std::path::Path;

use mqtt_exec::config::{ConfigFile, EntryConfig, RawConfigFile};

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile {
                entry: BTreeMap::new(),
            },
        }
    }

    pub fn with_entry(mut self, name: &str, entry: EntryConfig) -> Self {
        self.config.entry.insert(name.to_string(), entry);
        self
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `EntryConfig`.
pub struct EntryConfigBuilder {
    entry: EntryConfig,
}

impl EntryConfigBuilder {
    pub fn new(topic: &str, command: &str) -> Self {
        Self {
            entry: EntryConfig {
                topic: topic.to_string(),
                command: command.to_string(),
                args: vec![],
                working_directory: None,
                allow_concurrent: false,
                qos: None,
            },
        }
    }

    /// Convenience for `sh -c <script>` entries.
    pub fn shell(topic: &str, script: &str) -> Self {
        Self::new(topic, "sh").arg("-c").arg(script)
    }

    pub fn arg(mut self, arg: &str) -> Self {
        self.entry.args.push(arg.to_string());
        self
    }

    pub fn working_directory(mut self, dir: &Path) -> Self {
        self.entry.working_directory = Some(dir.to_path_buf());
        self
    }

    pub fn allow_concurrent(mut self, val: bool) -> Self {
        self.entry.allow_concurrent = val;
        self
    }

    pub fn qos(mut self, val: u8) -> Self {
        self.entry.qos = Some(val);
        self
    }

    pub fn build(self) -> EntryConfig {
        self.entry
    }
}
