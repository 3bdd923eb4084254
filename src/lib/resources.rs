//! Named Resource List Expander
//!
//! Resolves declared resource filenames under the storage root and binds
//! them to `resource1`, `resource2`, ... in declaration order.

use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{PreflightError, Result};
use crate::resource::{check_resource, ResourceKind};

/// Label used when a named resource fails its check
pub const RESOURCE_LABEL: &str = "Resource";

/// Validated resources, indexed from 1
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceBindings {
    paths: Vec<PathBuf>,
}

impl ResourceBindings {
    /// Resource bound to `index` (1-based)
    pub fn get(&self, index: usize) -> Option<&Path> {
        index
            .checked_sub(1)
            .and_then(|i| self.paths.get(i))
            .map(PathBuf::as_path)
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Variable name for a 1-based index
    pub fn variable_name(index: usize) -> String {
        format!("resource{}", index)
    }

    /// `(variable name, path)` pairs in binding order
    pub fn iter(&self) -> impl Iterator<Item = (String, &Path)> {
        self.paths
            .iter()
            .enumerate()
            .map(|(i, path)| (Self::variable_name(i + 1), path.as_path()))
    }
}

/// Path of `name` under `resources_dir`. Names that are absolute or climb
/// out with `..` are rejected.
fn resource_path(resources_dir: &Path, name: &str) -> Result<PathBuf> {
    let escapes = Path::new(name)
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
    if escapes {
        return Err(PreflightError::validation(format!(
            "Invalid resource name: \"{}\". Resources must stay under {}",
            name,
            resources_dir.display()
        )));
    }
    Ok(resources_dir.join(name))
}

/// Check each named resource as a file under `resources_dir` and bind it to
/// the next index. Stops at the first failure.
pub fn expand_resources(resources_dir: &Path, names: &[String]) -> Result<ResourceBindings> {
    let mut bindings = ResourceBindings::default();
    for name in names {
        let path = resource_path(resources_dir, name)?;
        check_resource(ResourceKind::File, &path, RESOURCE_LABEL)?;
        tracing::debug!(
            variable = %ResourceBindings::variable_name(bindings.len() + 1),
            path = %path.display(),
            "bound resource"
        );
        bindings.paths.push(path);
    }
    Ok(bindings)
}
