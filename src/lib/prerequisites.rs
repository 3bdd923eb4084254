//! Prerequisite Declarer
//!
//! Callers declare required directories and files by variable name. A name
//! whose variable is unset means a flag was never supplied and is reported
//! with usage text; a supplied path that fails its check is a validation
//! error.

use std::path::Path;

use crate::config::BootstrapConfig;
use crate::error::{PreflightError, Result};
use crate::resource::{check_resource, ResourceKind};

/// Label used when a required path fails its check
pub const REQUIRED_LABEL: &str = "Required";

/// Required variable names, split by the kind their value must have
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Prerequisites {
    pub dirs: Vec<String>,
    pub files: Vec<String>,
}

impl Prerequisites {
    pub fn from_config(config: &BootstrapConfig) -> Self {
        Self {
            dirs: config.require_dirs.clone(),
            files: config.require_files.clone(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.dirs.is_empty() && self.files.is_empty()
    }

    fn declared(&self) -> impl Iterator<Item = (&str, ResourceKind)> {
        self.dirs
            .iter()
            .map(|name| (name.as_str(), ResourceKind::Directory))
            .chain(
                self.files
                    .iter()
                    .map(|name| (name.as_str(), ResourceKind::File)),
            )
    }
}

/// Check that every declared variable is set, then that every value exists
/// with the declared kind.
///
/// The presence pass covers both lists before any filesystem access, so a
/// missing flag never surfaces as a misleading filesystem error.
pub fn check_prerequisites(prerequisites: &Prerequisites, config: &BootstrapConfig) -> Result<()> {
    for (name, _) in prerequisites.declared() {
        if config.variable(name).is_none() {
            tracing::debug!(variable = name, "required variable is unset");
            return Err(PreflightError::usage());
        }
    }

    for (name, kind) in prerequisites.declared() {
        if let Some(value) = config.variable(name) {
            check_resource(kind, Path::new(value), REQUIRED_LABEL)?;
        }
    }
    Ok(())
}
