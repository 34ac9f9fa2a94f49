// src/config/model.rs

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Deserialize;

/// Configuration exactly as deserialized from TOML, before validation.
///
/// ```toml
/// [entry.build]
/// topic = "ci/build"
/// command = "/usr/bin/make"
/// args = ["all"]
/// working_directory = "/srv/project"
/// allow_concurrent = false
/// qos = 1
/// ```
///
/// Keys of `entry` are the entry names used to tag log events.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub entry: BTreeMap<String, EntryConfig>,
}

/// Validated configuration. Build it with `ConfigFile::try_from(raw)` or
/// [`crate::config::load_and_validate`].
#[derive(Debug, Clone, Default)]
pub struct ConfigFile {
    pub entry: BTreeMap<String, EntryConfig>,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(entry: BTreeMap<String, EntryConfig>) -> Self {
        Self { entry }
    }

    pub fn is_empty(&self) -> bool {
        self.entry.is_empty()
    }
}

/// `[entry.<name>]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct EntryConfig {
    /// MQTT topic filter to subscribe to. `+` and `#` wildcards are allowed.
    pub topic: String,

    /// Executable to run. Resolved through `PATH` when not a path.
    pub command: String,

    #[serde(default)]
    pub args: Vec<String>,

    /// Directory the command runs in. Inherits the dispatcher's cwd if unset.
    #[serde(default, alias = "workingdirectory")]
    pub working_directory: Option<PathBuf>,

    /// Whether overlapping invocations of this entry are permitted.
    #[serde(default, alias = "multiple_instance", alias = "multipleinstance")]
    pub allow_concurrent: bool,

    /// Requested QoS. Values outside 0..=2 fall back to the CLI default.
    #[serde(default)]
    pub qos: Option<u8>,
}
