//! Default Resolver
//!
//! Fills unset configuration slots from defaults derived from the home path
//! and makes sure every slot names an existing directory.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::config::BootstrapConfig;
use crate::error::Result;
use crate::resource::{check_resource, ResourceKind};

/// Label used when a slot directory fails its check
pub const CORE_RESOURCE_LABEL: &str = "Core resource";

/// A configuration slot with a computed default
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    ResourcesDir,
    LogDir,
    TempDir,
}

impl Slot {
    /// Resolution order
    pub const ALL: [Slot; 3] = [Slot::ResourcesDir, Slot::LogDir, Slot::TempDir];

    /// Variable name the slot is exposed under
    pub fn name(&self) -> &'static str {
        match self {
            Slot::ResourcesDir => "resources_dir",
            Slot::LogDir => "log_dir",
            Slot::TempDir => "temp_dir",
        }
    }

    /// Directory name of the default under the home path
    fn default_dir_name(&self) -> &'static str {
        match self {
            Slot::ResourcesDir => "resources",
            Slot::LogDir => "log",
            Slot::TempDir => "tmp",
        }
    }

    pub fn default_path(&self, home: &Path) -> PathBuf {
        home.join(self.default_dir_name())
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Value of a slot, or its default when unset
pub fn slot_path(config: &BootstrapConfig, slot: Slot) -> PathBuf {
    config
        .slot(slot)
        .map(Path::to_path_buf)
        .unwrap_or_else(|| slot.default_path(&config.home))
}

/// Assign defaults to unset slots and check each slot as a directory, in
/// the fixed slot order
pub fn resolve_defaults(mut config: BootstrapConfig) -> Result<BootstrapConfig> {
    for slot in Slot::ALL {
        let path = slot_path(&config, slot);
        if config.slot(slot).is_none() {
            tracing::debug!(slot = slot.name(), path = %path.display(), "using default");
            config.set_slot(slot, path.clone());
        }
        check_resource(ResourceKind::Directory, &path, CORE_RESOURCE_LABEL)?;
    }
    Ok(config)
}
