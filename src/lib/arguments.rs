//! Positional Argument Validator

use std::path::{Path, PathBuf};

use crate::error::{PreflightError, Result};
use crate::resource::{check_resource, ResourceKind};

/// Label used when a positional argument fails its check
pub const INPUT_LABEL: &str = "Input";

/// Validate the positional arguments against the declared kind.
///
/// No declared kind means nothing to check. At least one argument is
/// required once a kind is declared; each is checked in order and the first
/// failure wins.
pub fn validate_arguments(args_type: Option<&str>, args: &[String]) -> Result<Vec<PathBuf>> {
    let Some(args_type) = args_type else {
        return Ok(Vec::new());
    };
    let kind: ResourceKind = args_type.parse()?;

    if args.is_empty() {
        return Err(PreflightError::usage_with(format!(
            "No input {} specified.",
            kind
        )));
    }

    let mut inputs = Vec::with_capacity(args.len());
    for arg in args {
        let path = Path::new(arg);
        check_resource(kind, path, INPUT_LABEL)?;
        inputs.push(path.to_path_buf());
    }
    tracing::debug!(count = inputs.len(), %kind, "validated positional arguments");
    Ok(inputs)
}
