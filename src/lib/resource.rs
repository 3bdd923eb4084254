//! Resource Existence Checker
//!
//! Decides whether a declared file or directory is present, present with
//! the wrong kind, or absent. An absent directory whose parent exists is
//! created; that is the only mutation this module performs.

use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{PreflightError, Result};

/// Kind of a declared resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    File,
    Directory,
}

impl ResourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::File => "file",
            ResourceKind::Directory => "directory",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ResourceKind {
    type Err = PreflightError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "file" => Ok(ResourceKind::File),
            "directory" => Ok(ResourceKind::Directory),
            other => Err(PreflightError::validation(format!(
                "Unknown resource type: {}",
                other
            ))),
        }
    }
}

/// Outcome of a successful check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceCheck {
    /// The resource already existed with the expected kind
    Present,
    /// The directory was missing and has been created
    Created,
}

/// Check a resource of the given kind, creating a missing directory when its
/// parent exists
pub fn check_resource(kind: ResourceKind, path: &Path, label: &str) -> Result<ResourceCheck> {
    match kind {
        ResourceKind::File => check_file(path, label),
        ResourceKind::Directory => check_directory(path, label),
    }
}

/// Same as [`check_resource`] with the kind given as text, as callers
/// declare it
pub fn check_resource_named(kind: &str, path: &Path, label: &str) -> Result<ResourceCheck> {
    check_resource(kind.parse()?, path, label)
}

fn check_file(path: &Path, label: &str) -> Result<ResourceCheck> {
    if path.is_file() {
        return Ok(ResourceCheck::Present);
    }
    if path.is_dir() {
        return Err(PreflightError::validation(format!(
            "{} file is a directory: {}",
            label,
            path.display()
        )));
    }
    Err(PreflightError::validation(format!(
        "{} file does not exist: {}",
        label,
        path.display()
    )))
}

fn check_directory(path: &Path, label: &str) -> Result<ResourceCheck> {
    if path.is_dir() {
        return Ok(ResourceCheck::Present);
    }
    if path.exists() {
        return Err(PreflightError::validation(format!(
            "{} directory is a file: {}",
            label,
            path.display()
        )));
    }

    if !parent_exists(path) {
        return Err(PreflightError::validation(format!(
            "{} directory does not exist: {}",
            label,
            path.display()
        )));
    }

    fs::create_dir_all(path).map_err(|e| {
        PreflightError::validation(format!(
            "Could not create {} directory {}: {}",
            label,
            path.display(),
            e
        ))
    })?;
    tracing::info!(path = %path.display(), label, "created missing directory");
    Ok(ResourceCheck::Created)
}

// A bare relative name ("logs") has the current directory as its parent.
fn parent_exists(path: &Path) -> bool {
    match path.parent() {
        Some(parent) if parent.as_os_str().is_empty() => true,
        Some(parent) => parent.is_dir(),
        None => false,
    }
}
