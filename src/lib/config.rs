//! Bootstrap configuration
//!
//! One explicit value carries everything the calling script declares. It is
//! threaded through every stage instead of being read from ambient state.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::defaults::Slot;

/// Caller-declared configuration for one bootstrap run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BootstrapConfig {
    /// Invocation name, used in usage text and the log file name
    pub program: String,
    /// Base path the slot defaults are derived from
    pub home: PathBuf,
    /// Help text appended after the program name
    pub usage_text: String,
    /// Storage root; defaults to `<home>/resources`
    pub resources_dir: Option<PathBuf>,
    /// Log directory; defaults to `<home>/log`
    pub log_dir: Option<PathBuf>,
    /// Temporary directory; defaults to `<home>/tmp`
    pub temp_dir: Option<PathBuf>,
    /// getopts-style flag grammar, e.g. `d:f:v`
    pub flags: String,
    /// Require effective uid 0
    pub require_root: bool,
    /// Write output to a generated log file
    pub enable_log: bool,
    /// Names of variables that must hold existing directories
    pub require_dirs: Vec<String>,
    /// Names of variables that must hold existing files
    pub require_files: Vec<String>,
    /// Kind of the positional arguments (`file` or `directory`)
    pub args_type: Option<String>,
    /// Filenames under the storage root, bound as `resource1`, `resource2`, ...
    pub resources: Vec<String>,
    /// Values for the names in `require_dirs` and `require_files`
    pub variables: BTreeMap<String, String>,
}

impl BootstrapConfig {
    pub fn new(program: impl Into<String>, home: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            home: home.into(),
            ..Default::default()
        }
    }

    /// Current value of a slot; an empty path counts as unset
    pub fn slot(&self, slot: Slot) -> Option<&Path> {
        let value = match slot {
            Slot::ResourcesDir => &self.resources_dir,
            Slot::LogDir => &self.log_dir,
            Slot::TempDir => &self.temp_dir,
        };
        value
            .as_deref()
            .filter(|path| !path.as_os_str().is_empty())
    }

    pub fn set_slot(&mut self, slot: Slot, value: PathBuf) {
        match slot {
            Slot::ResourcesDir => self.resources_dir = Some(value),
            Slot::LogDir => self.log_dir = Some(value),
            Slot::TempDir => self.temp_dir = Some(value),
        }
    }

    /// Value bound to a variable name; an empty value counts as unset
    pub fn variable(&self, name: &str) -> Option<&str> {
        self.variables
            .get(name)
            .map(String::as_str)
            .filter(|value| !value.is_empty())
    }

    pub fn set_variable(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.variables.insert(name.into(), value.into());
    }

    /// Declared positional argument kind, if any
    pub fn args_type(&self) -> Option<&str> {
        self.args_type.as_deref().filter(|kind| !kind.is_empty())
    }
}

/// Split a whitespace-separated declaration list into names
pub fn split_names(list: &str) -> Vec<String> {
    list.split_whitespace().map(String::from).collect()
}

/// Final path component of an invocation name (`/usr/local/bin/backup.sh`
/// becomes `backup.sh`)
pub fn program_base_name(program: &str) -> String {
    Path::new(program)
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| program.to_string())
}
